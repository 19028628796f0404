use color_eyre::Result;
use heat_risk_tui::{
    api::RiskClient,
    app::{Action, App},
    config::Config,
    controller::SubmissionController,
    db::ResultStore,
    events::{Event, EventHandler},
    location::{self, IpApiSource, PositionSource},
    logging, ui,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging(logging::LOG_DIR);
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    let store = ResultStore::open(&config.storage.path)?;
    let client = RiskClient::new(&config.api)?;
    info!("Submitting to {}", client.endpoint());
    let controller = Arc::new(SubmissionController::new(
        client,
        store,
        config.location.strategy,
    ));

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new();
    let mut events = EventHandler::new(150);

    // One geolocation attempt in the background
    let source = IpApiSource::new(&config.location);
    let geo_timeout = config.location.acquisition_timeout();
    app.begin_geolocation(source.is_available());
    let geo_tx = events.tx.clone();
    tokio::spawn(async move {
        let outcome = location::acquire(&source, geo_timeout).await;
        let _ = geo_tx.send(Event::Geolocated(outcome));
    });

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Tick => app.on_tick(),
            Event::Input(key) => {
                if let Some(Action::Submit(form)) = app.handle_key(key) {
                    let controller = Arc::clone(&controller);
                    let tx = events.tx.clone();
                    tokio::spawn(async move {
                        let outcome = controller.submit(&form).await;
                        let _ = tx.send(Event::SubmissionFinished(outcome));
                    });
                }
            }
            Event::Geolocated(outcome) => app.on_geolocation(outcome),
            Event::SubmissionFinished(outcome) => app.on_submission_finished(outcome),
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}
