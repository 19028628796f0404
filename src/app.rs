use crate::error::SubmitError;
use crate::form::RiskInputForm;
use crate::location::{Acquisition, AcquisitionFailure};
use crate::models::RiskResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const SUBMIT_LABEL: &str = "View results";
pub const SUBMITTING_LABEL: &str = "Calculating…";

pub const STATUS_ACQUIRING: &str = "Acquiring current location…";
pub const STATUS_ACQUIRED: &str = "Location acquired";
pub const STATUS_CALCULATING: &str = "Calculating risk…";
pub const STATUS_UNAVAILABLE: &str = "Location is unavailable. Please enter a city name.";
pub const STATUS_UNSUPPORTED: &str =
    "Location is not supported here. Please enter a city name.";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ViewMode {
    #[default]
    Form,
    Results,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Field {
    #[default]
    Age,
    Condition,
    CityName,
}

/// Work the main loop has to start on the app's behalf.
#[derive(Debug, PartialEq)]
pub enum Action {
    Submit(RiskInputForm),
}

#[derive(Debug)]
pub struct App {
    pub view_mode: ViewMode,
    pub form: RiskInputForm,
    pub focus: Field,
    pub manual_input_visible: bool,
    pub status: Option<String>,
    /// Status shown before the in-flight submission replaced it.
    status_before_submit: Option<String>,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub alert: Option<String>,
    pub result: Option<RiskResult>,
    pub tick_count: usize,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            view_mode: ViewMode::Form,
            form: RiskInputForm::default(),
            focus: Field::Age,
            manual_input_visible: true,
            status: None,
            status_before_submit: None,
            submit_enabled: true,
            submit_label: SUBMIT_LABEL,
            alert: None,
            result: None,
            tick_count: 0,
            should_quit: false,
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    /// Called right before the acquirer is spawned.
    pub fn begin_geolocation(&mut self, available: bool) {
        if available {
            self.status = Some(STATUS_ACQUIRING.to_string());
        }
    }

    pub fn on_geolocation(&mut self, outcome: Acquisition) {
        match outcome {
            Acquisition::Acquired(coords) => {
                self.form.set_coordinates(coords);
                self.manual_input_visible = false;
                if self.focus == Field::CityName {
                    self.focus = Field::Age;
                }
                self.status = Some(STATUS_ACQUIRED.to_string());
            }
            Acquisition::Unavailable(failure) => {
                self.manual_input_visible = true;
                let text = match failure {
                    AcquisitionFailure::Unsupported => STATUS_UNSUPPORTED,
                    AcquisitionFailure::TimedOut | AcquisitionFailure::Failed(_) => {
                        STATUS_UNAVAILABLE
                    }
                };
                self.status = Some(text.to_string());
            }
        }
    }

    pub fn on_submission_finished(&mut self, outcome: Result<RiskResult, SubmitError>) {
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.view_mode = ViewMode::Results;
                self.status = None;
            }
            // Rejected before anything was sent: put back what was showing.
            Err(e) if e.is_validation() => {
                self.status = self.status_before_submit.take();
                self.alert = Some(e.user_message());
            }
            Err(e) => {
                self.status = None;
                self.alert = Some(e.user_message());
            }
        }
        self.status_before_submit = None;
        self.submit_enabled = true;
        self.submit_label = SUBMIT_LABEL;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        // An open alert swallows input until dismissed.
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return None;
        }

        match self.view_mode {
            ViewMode::Form => self.handle_form_key(key),
            ViewMode::Results => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
                    KeyCode::Char('b') | KeyCode::Backspace => self.view_mode = ViewMode::Form,
                    _ => {}
                }
                None
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.focus = self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.prev_field(),
            KeyCode::Enter => return self.submit(),
            KeyCode::Backspace => {
                self.focused_text().pop();
            }
            KeyCode::Char(c) => self.focused_text().push(c),
            _ => {}
        }
        None
    }

    /// Disables the submit control and hands a snapshot of the form to the
    /// main loop. Does nothing while a submission is in flight.
    pub fn submit(&mut self) -> Option<Action> {
        if !self.submit_enabled {
            return None;
        }
        self.submit_enabled = false;
        self.submit_label = SUBMITTING_LABEL;
        self.status_before_submit = self.status.replace(STATUS_CALCULATING.to_string());
        Some(Action::Submit(self.form.clone()))
    }

    fn focusable(&self) -> Vec<Field> {
        let mut fields = vec![Field::Age, Field::Condition];
        if self.manual_input_visible {
            fields.push(Field::CityName);
        }
        fields
    }

    fn next_field(&self) -> Field {
        let fields = self.focusable();
        let i = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        fields[(i + 1) % fields.len()]
    }

    fn prev_field(&self) -> Field {
        let fields = self.focusable();
        let i = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        fields[i.checked_sub(1).unwrap_or(fields.len() - 1)]
    }

    fn focused_text(&mut self) -> &mut String {
        match self.focus {
            Field::Age => &mut self.form.age,
            Field::Condition => &mut self.form.condition,
            Field::CityName => &mut self.form.city_name,
        }
    }
}
