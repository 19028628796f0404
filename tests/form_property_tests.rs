use heat_risk_tui::error::ValidationError;
use heat_risk_tui::form::{LocationStrategy, RiskInputForm};
use heat_risk_tui::models::LocationInput;
use proptest::prelude::*;

fn latitude_strategy() -> impl Strategy<Value = f64> {
    -90.0..=90.0
}

fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

/// Non-blank city names, possibly padded with whitespace.
fn city_strategy() -> impl Strategy<Value = String> {
    "[ ]{0,2}[A-Za-z][A-Za-z -]{0,20}[ ]{0,2}"
}

fn blank_strategy() -> impl Strategy<Value = String> {
    "[ \t]{0,4}"
}

proptest! {
    /// A non-empty city is always sent alone, coordinates or not.
    #[test]
    fn city_always_takes_precedence(
        age in 1u32..120,
        city in city_strategy(),
        lat in latitude_strategy(),
        lon in longitude_strategy(),
        with_coords in any::<bool>(),
    ) {
        let form = RiskInputForm {
            age: age.to_string(),
            condition: "asthma".into(),
            city_name: city.clone(),
            lat: if with_coords { lat.to_string() } else { String::new() },
            lon: if with_coords { lon.to_string() } else { String::new() },
        };
        let request = form.resolve(LocationStrategy::Either).unwrap();
        prop_assert_eq!(request.age, age);
        prop_assert_eq!(request.location, LocationInput::City { city_name: city.trim().to_string() });
    }

    /// Without a city, finite coordinates are sent and round-trip exactly.
    #[test]
    fn coordinates_used_without_city(
        city in blank_strategy(),
        lat in latitude_strategy(),
        lon in longitude_strategy(),
    ) {
        let form = RiskInputForm {
            age: "40".into(),
            condition: "none".into(),
            city_name: city,
            lat: lat.to_string(),
            lon: lon.to_string(),
        };
        let request = form.resolve(LocationStrategy::Either).unwrap();
        prop_assert_eq!(request.location, LocationInput::Coordinates { lat, lon });
    }

    /// Blank age or condition is rejected before location is looked at.
    #[test]
    fn blank_required_fields_rejected(
        blank in blank_strategy(),
        blank_age in any::<bool>(),
        city in city_strategy(),
    ) {
        let form = RiskInputForm {
            age: if blank_age { blank.clone() } else { "30".into() },
            condition: if blank_age { "asthma".into() } else { blank },
            city_name: city,
            ..RiskInputForm::default()
        };
        prop_assert_eq!(form.resolve(LocationStrategy::Either), Err(ValidationError::MissingRequired));
    }
}
