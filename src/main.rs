use anyhow::Result;

mod app;
mod backend;
mod config;
mod handler;
mod transcript;
mod tui;
mod ui;

use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_init().unwrap_or_else(|_| Config::new());
    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;
    tui::restore()?;
    result?;

    if app.logout_requested {
        // Terminal is back to normal; end the server-side session on the way out
        match app.backend.logout().await {
            Ok(()) => println!("Logged out."),
            Err(e) => eprintln!("Logout failed: {}", e),
        }
    }

    Ok(())
}

async fn run(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        // Apply the outcome of a finished exchange, if any
        app.poll_exchange().await;
    }
    Ok(())
}
