//! Dashboard state and key handling.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use tokio::sync::mpsc;
use tracing::debug;

use mealplan_core::{
    DetailOverlay, Notice, PlanView, RecipeDetail, RecipeDetailView, RecipeError, RecipeSearch,
    RecipeSelection, RecipeSource, RecipeSummary, ViewError,
};
use mealplan_store::{Category, EntryId, KeyValueStore, PlanStore};

/// What keystrokes currently mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Typing the name of a new meal for the selected category.
    Adding { input: String },
    /// Typing into the draft of the active edit session.
    Editing,
    /// Typing a recipe search query.
    Searching { input: String },
    /// Waiting for y/n before clearing the plan.
    ConfirmClear,
    Help,
}

/// Which pane the movement keys act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Plan,
    Results,
}

/// Completions posted back by background recipe fetches.
#[derive(Debug)]
pub enum AppEvent {
    SearchDone {
        seq: u64,
        result: Result<Vec<RecipeSummary>, RecipeError>,
    },
    LookupDone {
        seq: u64,
        result: Result<Option<RecipeDetail>, RecipeError>,
    },
}

/// Application state for the dashboard.
pub struct App<S> {
    pub store: PlanStore<S>,
    pub view: PlanView,
    /// Category that adds and imports target; also holds the row cursor.
    pub category: Category,
    pub selected_row: usize,
    pub mode: Mode,
    pub focus: Focus,
    pub search: RecipeSearch,
    pub selected_result: usize,
    pub detail: RecipeDetailView,
    /// Last drawn frame size, for mouse hit-testing.
    pub frame_area: Rect,
    pub tick_rate: Duration,
    pub should_quit: bool,
    pub status_message: Option<String>,
    source: Arc<dyn RecipeSource>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(
        store: PlanStore<S>,
        source: Arc<dyn RecipeSource>,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let app = Self {
            store,
            view: PlanView::new(),
            category: Category::default(),
            selected_row: 0,
            mode: Mode::Browse,
            focus: Focus::Plan,
            search: RecipeSearch::new(),
            selected_result: 0,
            detail: RecipeDetailView::new(),
            frame_area: Rect::default(),
            tick_rate: Duration::from_millis(100),
            should_quit: false,
            status_message: None,
            source,
            events_tx,
        };
        (app, events_rx)
    }

    // -- Input dispatch --

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.detail.overlay().is_visible() {
            self.handle_overlay_key(key.code);
            return;
        }

        match self.mode.clone() {
            Mode::Browse => self.handle_browse_key(key.code),
            Mode::Adding { input } => self.handle_adding_key(key.code, input),
            Mode::Editing => self.handle_editing_key(key.code),
            Mode::Searching { input } => self.handle_search_key(key.code, input),
            Mode::ConfirmClear => self.handle_confirm_key(key.code),
            Mode::Help => self.mode = Mode::Browse,
        }
    }

    /// A left click outside the detail overlay closes it.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return;
        }
        if !self.detail.overlay().is_visible() {
            return;
        }
        let overlay = super::ui::overlay_area(self.frame_area);
        if !overlay.contains(Position::new(mouse.column, mouse.row)) {
            self.detail.dismiss();
        }
    }

    /// Apply a completed background fetch. Stale completions are dropped.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SearchDone { seq, result } => {
                if self.search.complete(seq, result) {
                    self.selected_result = 0;
                    if !self.search.panel().results().is_empty() {
                        self.focus = Focus::Results;
                    }
                }
            }
            AppEvent::LookupDone { seq, result } => {
                self.detail.complete(seq, result);
            }
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Tab => self.select_category(self.category.next()),
            KeyCode::BackTab => self.select_category(self.category.prev()),
            KeyCode::Char('h') | KeyCode::Left => self.focus = Focus::Plan,
            KeyCode::Char('l') | KeyCode::Right => {
                if !self.search.panel().results().is_empty() {
                    self.focus = Focus::Results;
                }
            }
            KeyCode::Char('a') => {
                self.mode = Mode::Adding {
                    input: String::new(),
                }
            }
            KeyCode::Char('e') => self.begin_edit_selected(),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('C') => self.mode = Mode::ConfirmClear,
            KeyCode::Char('/') => {
                self.mode = Mode::Searching {
                    input: String::new(),
                }
            }
            KeyCode::Char('x') => {
                self.clear_results();
                self.status_message = Some(Notice::ResultsCleared.to_string());
            }
            KeyCode::Enter if self.focus == Focus::Results => self.open_selected_result(),
            KeyCode::Char('i') if self.focus == Focus::Results => self.import_selected_result(),
            KeyCode::Esc if self.focus == Focus::Results => self.focus = Focus::Plan,
            KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
    }

    fn handle_adding_key(&mut self, code: KeyCode, mut input: String) {
        match code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => {
                let result = self.view.add(&mut self.store, self.category, &input);
                match self.report(result) {
                    Some(notice) if notice.is_rejection() => {}
                    _ => {
                        self.mode = Mode::Browse;
                        self.selected_row = self.rows_in_category().saturating_sub(1);
                    }
                }
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::Adding { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::Adding { input };
            }
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.view.cancel_edit();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => {
                let result = self.view.save_edit(&mut self.store);
                self.report(result);
                if !self.view.is_editing() {
                    self.mode = Mode::Browse;
                }
            }
            // Moving to another row starts editing it, which abandons
            // the current draft.
            KeyCode::Up => {
                let before = self.selected_row;
                self.move_up();
                if self.selected_row != before {
                    self.begin_edit_selected();
                }
            }
            KeyCode::Down => {
                let before = self.selected_row;
                self.move_down();
                if self.selected_row != before {
                    self.begin_edit_selected();
                }
            }
            KeyCode::Backspace => {
                if let Some(draft) = self.view.draft_mut() {
                    draft.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(draft) = self.view.draft_mut() {
                    draft.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode, mut input: String) {
        match code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.start_search(&input);
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::Searching { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::Searching { input };
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        let answer = match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };
        self.mode = Mode::Browse;
        let result = self.view.clear(&mut self.store, &mut |_: &str| answer);
        if let Some(Notice::PlanCleared) = self.report(result) {
            self.clear_results();
            self.selected_row = 0;
        }
    }

    fn handle_overlay_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.detail.dismiss(),
            KeyCode::Char('i') => {
                let selection = self.detail.overlay().detail().map(RecipeSelection::from);
                if let Some(selection) = selection {
                    self.import(selection);
                    self.detail.dismiss();
                }
            }
            _ => {}
        }
    }

    // -- Navigation --

    fn rows_in_category(&self) -> usize {
        self.store.plan().entries(self.category).len()
    }

    fn select_category(&mut self, category: Category) {
        self.category = category;
        self.selected_row = 0;
        self.focus = Focus::Plan;
    }

    pub fn move_up(&mut self) {
        match self.focus {
            Focus::Plan => self.selected_row = self.selected_row.saturating_sub(1),
            Focus::Results => self.selected_result = self.selected_result.saturating_sub(1),
        }
    }

    pub fn move_down(&mut self) {
        match self.focus {
            Focus::Plan => {
                if self.selected_row + 1 < self.rows_in_category() {
                    self.selected_row += 1;
                }
            }
            Focus::Results => {
                if self.selected_result + 1 < self.search.panel().results().len() {
                    self.selected_result += 1;
                }
            }
        }
    }

    fn clamp_selection(&mut self) {
        self.selected_row = self
            .selected_row
            .min(self.rows_in_category().saturating_sub(1));
    }

    fn selected_entry(&self) -> Option<EntryId> {
        self.store
            .plan()
            .entries(self.category)
            .get(self.selected_row)
            .map(|e| e.id.clone())
    }

    // -- Plan actions --

    fn begin_edit_selected(&mut self) {
        let Some(id) = self.selected_entry() else {
            return;
        };
        self.focus = Focus::Plan;
        match self.view.begin_edit(self.store.plan(), self.category, &id) {
            Ok(_) => self.mode = Mode::Editing,
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_entry() else {
            return;
        };
        let result = self.view.delete(&mut self.store, self.category, &id);
        self.report(result);
        self.clamp_selection();
    }

    fn import(&mut self, selection: RecipeSelection) {
        let result = self
            .view
            .import_recipe(&mut self.store, self.category, selection);
        self.report(result);
    }

    /// Show the outcome of a plan mutation in the status bar.
    fn report(&mut self, result: Result<Notice, ViewError>) -> Option<Notice> {
        match result {
            Ok(notice) => {
                self.status_message = Some(notice.to_string());
                Some(notice)
            }
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                None
            }
        }
    }

    // -- Recipe actions --

    fn start_search(&mut self, query: &str) {
        let Some((query, ticket)) = self.search.begin(query) else {
            return;
        };
        self.selected_result = 0;
        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            if let Some(result) = ticket.run(source.search(&query)).await {
                let _ = tx.send(AppEvent::SearchDone {
                    seq: ticket.seq(),
                    result,
                });
            } else {
                debug!(seq = ticket.seq(), "search superseded");
            }
        });
    }

    fn clear_results(&mut self) {
        self.search.clear();
        self.selected_result = 0;
        self.focus = Focus::Plan;
    }

    fn highlighted_result(&self) -> Option<&RecipeSummary> {
        self.search.panel().results().get(self.selected_result)
    }

    fn open_selected_result(&mut self) {
        let Some(id) = self.highlighted_result().map(|r| r.id.clone()) else {
            return;
        };
        let ticket = self.detail.open(&id);
        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            if let Some(result) = ticket.run(source.lookup(&id)).await {
                let _ = tx.send(AppEvent::LookupDone {
                    seq: ticket.seq(),
                    result,
                });
            }
        });
    }

    fn import_selected_result(&mut self) {
        if let Some(selection) = self.highlighted_result().map(RecipeSelection::from) {
            self.import(selection);
        }
    }

    /// Whether the overlay is waiting on a lookup.
    pub fn overlay_loading(&self) -> bool {
        matches!(self.detail.overlay(), DetailOverlay::Loading { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use crossterm::event::KeyEventState;
    use mealplan_core::{Ingredient, SearchPanel};
    use mealplan_store::{MemoryStore, SequentialIds};

    use super::*;

    struct Catalogue;

    #[async_trait]
    impl RecipeSource for Catalogue {
        async fn search(&self, query: &str) -> Result<Vec<RecipeSummary>, RecipeError> {
            if query == "none" {
                return Ok(vec![]);
            }
            Ok(vec![RecipeSummary {
                id: "52772".into(),
                name: "Teriyaki Chicken Casserole".into(),
                thumbnail: None,
            }])
        }

        async fn lookup(&self, id: &str) -> Result<Option<RecipeDetail>, RecipeError> {
            Ok(Some(RecipeDetail {
                id: id.into(),
                name: "Teriyaki Chicken Casserole".into(),
                thumbnail: None,
                ingredients: vec![Ingredient {
                    name: "soy sauce".into(),
                    measure: "3/4 cup".into(),
                }],
                instructions: "Preheat oven to 350F.".into(),
            }))
        }
    }

    fn app() -> (App<MemoryStore>, mpsc::UnboundedReceiver<AppEvent>) {
        let store = PlanStore::open_with_ids(MemoryStore::new(), Box::new(SequentialIds::new("m")));
        App::new(store, Arc::new(Catalogue))
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn names(app: &App<MemoryStore>, category: Category) -> Vec<String> {
        app.store
            .plan()
            .entries(category)
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn add_through_keys() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Soup");
        press(&mut app, KeyCode::Enter);

        assert_eq!(names(&app, Category::Lunch), ["Soup"]);
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.status_message.as_deref(), Some("Meal added"));
    }

    #[test]
    fn blank_add_keeps_prompt_open() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "  ");
        press(&mut app, KeyCode::Enter);

        assert!(app.store.plan().is_empty());
        assert!(matches!(app.mode, Mode::Adding { .. }));
        assert_eq!(app.status_message.as_deref(), Some("Enter a meal name"));
    }

    #[test]
    fn moving_while_editing_reverts_the_first_row() {
        let (mut app, _rx) = app();
        app.store.add(Category::Breakfast, "Eggs").unwrap();
        app.store.add(Category::Breakfast, "Toast").unwrap();

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "!!!");
        press(&mut app, KeyCode::Down);

        let listing = app.view.render(app.store.plan());
        assert_eq!(listing.editing_rows(), 1);
        let rows = listing.group(Category::Breakfast).rows();
        assert_eq!(rows[0].text(), "Eggs");
        assert!(rows[1].is_editing());

        press(&mut app, KeyCode::Esc);
        assert_eq!(names(&app, Category::Breakfast), ["Eggs", "Toast"]);
    }

    #[test]
    fn moving_past_the_edge_keeps_the_draft() {
        let (mut app, _rx) = app();
        app.store.add(Category::Breakfast, "Eggs").unwrap();

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, " Benedict");
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Down);

        assert_eq!(app.mode, Mode::Editing);
        assert_eq!(app.view.session().unwrap().draft(), "Eggs Benedict");

        press(&mut app, KeyCode::Enter);
        assert_eq!(names(&app, Category::Breakfast), ["Eggs Benedict"]);
    }

    #[test]
    fn blank_save_stays_in_editing() {
        let (mut app, _rx) = app();
        app.store.add(Category::Snack, "Apple").unwrap();
        app.category = Category::Snack;

        press(&mut app, KeyCode::Char('e'));
        for _ in 0.."Apple".len() {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Editing);
        assert_eq!(app.status_message.as_deref(), Some("Name cannot be empty"));

        type_text(&mut app, "Pear");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(names(&app, Category::Snack), ["Pear"]);
    }

    #[test]
    fn delete_and_confirmed_clear() {
        let (mut app, _rx) = app();
        app.store.add(Category::Breakfast, "Eggs").unwrap();
        app.store.add(Category::Breakfast, "Toast").unwrap();
        app.store.add(Category::Dinner, "Stew").unwrap();

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(names(&app, Category::Breakfast), ["Eggs"]);
        assert_eq!(app.selected_row, 0);

        press(&mut app, KeyCode::Char('C'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.plan().len(), 2);
        assert_eq!(app.status_message.as_deref(), Some("Plan left unchanged"));

        press(&mut app, KeyCode::Char('C'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.plan().is_empty());
        assert_eq!(app.status_message.as_deref(), Some("Plan cleared"));
    }

    #[tokio::test]
    async fn search_then_import_into_selected_category() {
        let (mut app, mut rx) = app();
        app.category = Category::Dinner;

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "chicken");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.search.panel(), SearchPanel::Searching { .. }));

        let event = rx.recv().await.unwrap();
        app.handle_event(event);
        assert_eq!(app.focus, Focus::Results);
        assert_eq!(app.search.panel().results().len(), 1);

        press(&mut app, KeyCode::Char('i'));
        let dinner = app.store.plan().entries(Category::Dinner);
        assert_eq!(dinner[0].name, "Teriyaki Chicken Casserole");
        assert_eq!(dinner[0].recipe_ref.as_deref(), Some("52772"));
        assert_eq!(
            app.status_message.as_deref(),
            Some("Added \"Teriyaki Chicken Casserole\" to Dinner")
        );
    }

    #[tokio::test]
    async fn detail_overlay_opens_and_closes_on_outside_click() {
        let (mut app, mut rx) = app();
        app.frame_area = Rect::new(0, 0, 100, 40);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "chicken");
        press(&mut app, KeyCode::Enter);
        app.handle_event(rx.recv().await.unwrap());

        press(&mut app, KeyCode::Enter);
        assert!(app.overlay_loading());
        app.handle_event(rx.recv().await.unwrap());
        let detail = app.detail.overlay().detail().unwrap();
        assert_eq!(detail.ingredients[0].measure, "3/4 cup");

        // Click inside: stays open.
        let inside = crate::tui::ui::overlay_area(app.frame_area);
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: inside.x + 1,
            row: inside.y + 1,
            modifiers: KeyModifiers::NONE,
        });
        assert!(app.detail.overlay().is_visible());

        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(!app.detail.overlay().is_visible());
    }

    #[tokio::test]
    async fn clearing_the_plan_clears_results() {
        let (mut app, mut rx) = app();
        app.store.add(Category::Lunch, "Soup").unwrap();

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "chicken");
        press(&mut app, KeyCode::Enter);
        app.handle_event(rx.recv().await.unwrap());
        assert!(!app.search.panel().results().is_empty());

        press(&mut app, KeyCode::Char('C'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.search.panel(), &SearchPanel::Idle);
        assert_eq!(app.focus, Focus::Plan);
    }

    #[tokio::test]
    async fn clearing_results_shows_a_notice() {
        let (mut app, mut rx) = app();
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "chicken");
        press(&mut app, KeyCode::Enter);
        app.handle_event(rx.recv().await.unwrap());

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.search.panel(), &SearchPanel::Idle);
        assert_eq!(app.focus, Focus::Plan);
        assert_eq!(app.status_message.as_deref(), Some("Results cleared"));
    }

    #[test]
    fn stale_search_completion_is_ignored() {
        let (mut app, _rx) = app();
        let (_, first) = app.search.begin("chicken").unwrap();
        let (_, second) = app.search.begin("salmon").unwrap();

        app.handle_event(AppEvent::SearchDone {
            seq: first.seq(),
            result: Ok(vec![]),
        });
        assert!(matches!(app.search.panel(), SearchPanel::Searching { .. }));

        app.handle_event(AppEvent::SearchDone {
            seq: second.seq(),
            result: Err(RecipeError::Status(500)),
        });
        assert_eq!(app.search.panel(), &SearchPanel::Failed);
    }

    #[test]
    fn quit_and_help() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode, Mode::Browse);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
