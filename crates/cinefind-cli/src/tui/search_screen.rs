//! Search screen TUI main loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cinefind_api::store::SearchCountStore;
use cinefind_api::tmdb::{MovieApi, MovieDetails};
use cinefind_core::fetch::FetchContainer;
use cinefind_core::search::SearchController;
use cinefind_core::tracker::PopularityTracker;
use cinefind_core::view::{SearchBody, TrendingCard};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::state::{DetailPane, ScreenAction, SearchScreenState, Snapshot};
use super::ui;

/// Pause between input polls; background searches progress meanwhile.
const TICK: Duration = Duration::from_millis(50);

/// Runs the interactive search screen until the user quits.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub async fn run_search_screen<A, S>(
    api: Arc<A>,
    tracker: Arc<PopularityTracker<S>>,
    debounce: Duration,
    trending: Vec<TrendingCard>,
) -> Result<()>
where
    A: MovieApi + Send + Sync + 'static,
    S: SearchCountStore + Send + Sync + 'static,
{
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let mut controller = SearchController::new(Arc::clone(&api), tracker, debounce);
    let result = run_event_loop(&mut terminal, &mut controller, &api, &trending).await;
    controller.shutdown();

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
async fn run_event_loop<A, S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut SearchController<S>,
    api: &Arc<A>,
    trending: &[TrendingCard],
) -> Result<()>
where
    A: MovieApi + Send + Sync + 'static,
    S: SearchCountStore + Send + Sync + 'static,
{
    let mut state = SearchScreenState::new();
    let mut details: Option<FetchContainer<MovieDetails>> = None;

    loop {
        let body = SearchBody::from_state(&state.query, &controller.results());
        let result_ids: Vec<u64> = match &body {
            SearchBody::Results { cards, .. } => cards.iter().map(|c| c.id).collect(),
            _ => Vec::new(),
        };
        state.clamp_cursor(result_ids.len());
        let snapshot = Snapshot {
            body,
            phase: controller.phase(),
            details: details
                .as_ref()
                .map(|d| DetailPane::from_state(&d.snapshot())),
        };

        terminal
            .draw(|frame| ui::draw(frame, &state, &snapshot, trending))
            .context("failed to draw TUI")?;

        if !event::poll(Duration::ZERO).context("failed to poll events")? {
            tokio::time::sleep(TICK).await;
            continue;
        }
        let Event::Key(key) = event::read().context("failed to read event")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.handle_key(key.code, key.modifiers, &result_ids) {
            ScreenAction::Quit => return Ok(()),
            ScreenAction::QueryChanged(query) => controller.on_query_changed(query),
            ScreenAction::OpenDetails(movie_id) => {
                details = Some(details_container(Arc::clone(api), movie_id));
            }
            ScreenAction::CloseDetails => details = None,
            ScreenAction::None => {}
        }
    }
}

/// Starts loading details for `movie_id`.
fn details_container<A>(api: Arc<A>, movie_id: u64) -> FetchContainer<MovieDetails>
where
    A: MovieApi + Send + Sync + 'static,
{
    tracing::debug!(movie_id, "loading movie details");
    FetchContainer::new(
        move || {
            let api = Arc::clone(&api);
            async move { api.movie_details(movie_id).await }
        },
        true,
    )
}
