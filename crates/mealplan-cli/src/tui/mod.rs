//! Interactive dashboard for editing the plan and browsing recipes.

pub mod app;
mod ui;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use mealplan_core::RecipeSource;
use mealplan_store::{KeyValueStore, PlanStore};

use app::{App, AppEvent};

/// Launch the interactive dashboard.
pub async fn run_dashboard<S: KeyValueStore>(
    store: PlanStore<S>,
    source: Arc<dyn RecipeSource>,
) -> Result<()> {
    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut app, mut events) = App::new(store, source);

    let result = run_event_loop(&mut terminal, &mut app, &mut events);

    // Restore terminal.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    events: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let tick_rate = app.tick_rate;

    loop {
        // Apply finished recipe fetches before drawing.
        while let Ok(completion) = events.try_recv() {
            app.handle_event(completion);
        }

        terminal.draw(|f| {
            app.frame_area = f.area();
            ui::render(f, app);
        })?;

        // Poll for input with a timeout matching the tick rate.
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Clear status message on any keypress.
                    app.status_message = None;
                    app.handle_key(key);
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
