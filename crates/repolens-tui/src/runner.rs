// TUI event loop and terminal management
use crate::app::{Action, App};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use repolens_core::{ReadmeController, SearchController};
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

/// How long to wait for a key before redrawing with fresh snapshots
const TICK: Duration = Duration::from_millis(50);

pub async fn run_tui(
    mut app: App,
    search: SearchController,
    readme: ReadmeController,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &search, &readme).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    search: &SearchController,
    readme: &ReadmeController,
) -> anyhow::Result<()> {
    let mut submitted = app.query_params().clone();
    search.update(submitted.clone());
    // Only newly published snapshots replace the app's results
    let mut snapshots = search.subscribe();

    loop {
        if matches!(snapshots.has_changed(), Ok(true)) {
            app.set_results(snapshots.borrow_and_update().clone());
        }
        app.set_readme(readme.snapshot());
        terminal.draw(|f| crate::ui::render(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key) {
                        Action::None => {}
                        Action::OpenReadme(name) => readme.open(name),
                        Action::RefetchReadme => readme.refetch(),
                        Action::OpenBrowser(url) => {
                            if let Err(e) = open::that(&url) {
                                warn!("Failed to open {}: {}", url, e);
                                app.error_message = Some(format!("Failed to open browser: {}", e));
                            }
                        }
                    }
                }
            }
        } else {
            // Let the controller tasks run between polls
            tokio::task::yield_now().await;
        }

        if app.query_params() != &submitted {
            submitted = app.query_params().clone();
            debug!(term = %submitted.search_term, page = submitted.page, "Form changed");
            search.update(submitted.clone());
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
