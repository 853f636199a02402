//! Search screen state and key handling.

use cinefind_core::fetch::FetchState;
use cinefind_core::search::SearchPhase;
use cinefind_core::view::{DetailView, SearchBody, error_text};
use crossterm::event::{KeyCode, KeyModifiers};

use cinefind_api::tmdb::MovieDetails;

/// Which pane fills the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenView {
    /// Query results.
    Results,
    /// Detail view of one movie.
    Details(u64),
}

/// What the event loop must do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenAction {
    /// Nothing beyond a redraw.
    None,
    /// The query text changed.
    QueryChanged(String),
    /// Load details for the movie.
    OpenDetails(u64),
    /// Back to the results.
    CloseDetails,
    /// Leave the screen.
    Quit,
}

/// Detail pane contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPane {
    /// Request in flight.
    Loading,
    /// Request failed.
    Error(String),
    /// Details loaded.
    Ready(Box<DetailView>),
}

impl DetailPane {
    /// Chooses the pane for a details fetch state.
    pub fn from_state(state: &FetchState<MovieDetails>) -> Self {
        if state.loading {
            return Self::Loading;
        }
        match (&state.data, &state.error) {
            (_, Some(err)) => Self::Error(error_text(err)),
            (Some(details), None) => Self::Ready(Box::new(DetailView::from_details(details))),
            (None, None) => Self::Loading,
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Results area.
    pub body: SearchBody,
    /// Controller phase.
    pub phase: SearchPhase,
    /// Detail pane, when open.
    pub details: Option<DetailPane>,
}

/// Search screen state.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchScreenState {
    /// Query as typed.
    pub query: String,
    /// Highlighted result index.
    pub cursor: usize,
    /// Active pane.
    pub view: ScreenView,
}

impl SearchScreenState {
    /// Creates an empty state.
    pub const fn new() -> Self {
        Self {
            query: String::new(),
            cursor: 0,
            view: ScreenView::Results,
        }
    }

    /// Handles one key press. `result_ids` are the movie IDs currently listed.
    pub fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        result_ids: &[u64],
    ) -> ScreenAction {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return ScreenAction::Quit;
        }
        match self.view {
            ScreenView::Details(_) => self.handle_details_key(code),
            ScreenView::Results => self.handle_results_key(code, result_ids),
        }
    }

    fn handle_details_key(&mut self, code: KeyCode) -> ScreenAction {
        match code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Enter => {
                self.view = ScreenView::Results;
                ScreenAction::CloseDetails
            }
            _ => ScreenAction::None,
        }
    }

    fn handle_results_key(&mut self, code: KeyCode, result_ids: &[u64]) -> ScreenAction {
        match code {
            KeyCode::Esc if self.query.is_empty() => ScreenAction::Quit,
            KeyCode::Esc => self.set_query(String::new()),
            KeyCode::Backspace => {
                let mut query = self.query.clone();
                if query.pop().is_none() {
                    return ScreenAction::None;
                }
                self.set_query(query)
            }
            KeyCode::Char(c) => {
                let mut query = self.query.clone();
                query.push(c);
                self.set_query(query)
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                ScreenAction::None
            }
            KeyCode::Down => {
                if self.cursor.saturating_add(1) < result_ids.len() {
                    self.cursor = self.cursor.saturating_add(1);
                }
                ScreenAction::None
            }
            KeyCode::Enter => result_ids
                .get(self.cursor)
                .map_or(ScreenAction::None, |id| {
                    self.view = ScreenView::Details(*id);
                    ScreenAction::OpenDetails(*id)
                }),
            _ => ScreenAction::None,
        }
    }

    fn set_query(&mut self, query: String) -> ScreenAction {
        self.query.clone_from(&query);
        self.cursor = 0;
        ScreenAction::QueryChanged(query)
    }

    /// Keeps the cursor inside a list of `len` results.
    pub const fn clamp_cursor(&mut self, len: usize) {
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

impl Default for SearchScreenState {
    fn default() -> Self {
        Self::new()
    }
}
