//! Display state for recipe search and the detail overlay.
//!
//! Re-triggering a search while one is pending follows a last-request-wins
//! rule: each request carries a [`Ticket`], issuing a new ticket cancels
//! the previous request, and completions for stale tickets are dropped.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{RecipeDetail, RecipeError, RecipeSummary};

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Identifies one in-flight request.
#[derive(Debug, Clone)]
pub struct Ticket {
    seq: u64,
    cancel: CancellationToken,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` unless the ticket is superseded first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

/// Issues tickets and remembers which one is current.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
    in_flight: Option<CancellationToken>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, cancelling the one in flight.
    pub fn issue(&mut self) -> Ticket {
        self.cancel();
        self.latest += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        Ticket {
            seq: self.latest,
            cancel,
        }
    }

    /// Abandon the in-flight request, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest && self.in_flight.is_some()
    }

    /// Accept a completion if it belongs to the current request.
    pub fn settle(&mut self, seq: u64) -> bool {
        if self.is_current(seq) {
            self.in_flight = None;
            true
        } else {
            debug!(seq, latest = self.latest, "dropping stale recipe response");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Search results region
// ---------------------------------------------------------------------------

/// What the search results region shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchPanel {
    #[default]
    Idle,
    /// The query was blank.
    Prompt,
    Searching {
        query: String,
    },
    Results(Vec<RecipeSummary>),
    NoMatches,
    Failed,
}

impl SearchPanel {
    /// Status line for non-result states.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Idle | Self::Results(_) => None,
            Self::Prompt => Some("Please enter a search term."),
            Self::Searching { .. } => Some("Searching..."),
            Self::NoMatches => Some("No recipes found."),
            Self::Failed => Some("Error fetching recipes."),
        }
    }

    pub fn results(&self) -> &[RecipeSummary] {
        match self {
            Self::Results(items) => items,
            _ => &[],
        }
    }
}

/// Search region state plus its request tracker.
#[derive(Debug, Default)]
pub struct RecipeSearch {
    panel: SearchPanel,
    tracker: RequestTracker,
}

impl RecipeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> &SearchPanel {
        &self.panel
    }

    /// Start searching for `query`. A blank query shows the prompt and
    /// returns `None`; otherwise returns the trimmed query and its ticket.
    pub fn begin(&mut self, query: &str) -> Option<(String, Ticket)> {
        let query = query.trim();
        if query.is_empty() {
            self.tracker.cancel();
            self.panel = SearchPanel::Prompt;
            return None;
        }
        let ticket = self.tracker.issue();
        self.panel = SearchPanel::Searching {
            query: query.to_owned(),
        };
        Some((query.to_owned(), ticket))
    }

    /// Apply a finished search. Returns `false` when the result was stale.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<Vec<RecipeSummary>, RecipeError>,
    ) -> bool {
        if !self.tracker.settle(seq) {
            return false;
        }
        self.panel = match result {
            Ok(items) if items.is_empty() => SearchPanel::NoMatches,
            Ok(items) => SearchPanel::Results(items),
            Err(e) => {
                warn!(error = %e, "recipe search failed");
                SearchPanel::Failed
            }
        };
        true
    }

    /// Empty the results region and abandon any pending search.
    pub fn clear(&mut self) {
        self.tracker.cancel();
        self.panel = SearchPanel::Idle;
    }
}

// ---------------------------------------------------------------------------
// Detail overlay
// ---------------------------------------------------------------------------

/// What the recipe detail overlay shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailOverlay {
    #[default]
    Hidden,
    Loading {
        id: String,
    },
    Loaded(RecipeDetail),
    /// The service answered but had no such recipe.
    Unavailable,
    Failed,
}

impl DetailOverlay {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Hidden | Self::Loaded(_) => None,
            Self::Loading { .. } => Some("Loading..."),
            Self::Unavailable => Some("Could not load recipe details."),
            Self::Failed => Some("Error loading recipe details."),
        }
    }

    pub fn detail(&self) -> Option<&RecipeDetail> {
        match self {
            Self::Loaded(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Overlay state plus its request tracker.
#[derive(Debug, Default)]
pub struct RecipeDetailView {
    overlay: DetailOverlay,
    tracker: RequestTracker,
}

impl RecipeDetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self) -> &DetailOverlay {
        &self.overlay
    }

    /// Show the overlay in its loading state for recipe `id`.
    pub fn open(&mut self, id: &str) -> Ticket {
        self.overlay = DetailOverlay::Loading { id: id.to_owned() };
        self.tracker.issue()
    }

    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<Option<RecipeDetail>, RecipeError>,
    ) -> bool {
        if !self.tracker.settle(seq) {
            return false;
        }
        self.overlay = match result {
            Ok(Some(detail)) => DetailOverlay::Loaded(detail),
            Ok(None) => DetailOverlay::Unavailable,
            Err(e) => {
                warn!(error = %e, "recipe lookup failed");
                DetailOverlay::Failed
            }
        };
        true
    }

    /// Close the overlay (close control, outside click or escape).
    pub fn dismiss(&mut self) {
        self.tracker.cancel();
        self.overlay = DetailOverlay::Hidden;
    }
}
