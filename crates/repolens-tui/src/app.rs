// TUI application state and key handling
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use repolens_core::{Pagination, QueryParams, ReadmeState, RepositorySummary, ResultPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,      // Navigating results
    Searching,   // Typing in search box, every key is a new query
    EditingDate(DateField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    From,
    To,
}

impl DateField {
    pub fn label(&self) -> &'static str {
        match self {
            DateField::From => "From",
            DateField::To => "To",
        }
    }
}

/// Side effects the runner performs after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    OpenReadme(String),
    RefetchReadme,
    OpenBrowser(String),
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub params: QueryParams,
    pub results: ResultPage,
    pub pagination: Pagination,
    pub selected_index: usize,
    pub list_state: ListState,
    /// Text being typed into a date field, committed on Enter
    pub date_edit_buffer: String,
    /// Local notices (bad date, browser failure); search errors live in `results`
    pub error_message: Option<String>,
    pub show_readme: bool,
    pub readme: ReadmeState,
    pub readme_scroll: u16,
}

impl App {
    pub fn new(params: QueryParams, pagination: Pagination) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Searching,
            params,
            results: ResultPage::default(),
            pagination,
            selected_index: 0,
            list_state,
            date_edit_buffer: String::new(),
            error_message: None,
            show_readme: false,
            readme: ReadmeState::default(),
            readme_scroll: 0,
        }
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.params
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return Action::None;
        }

        match self.input_mode {
            InputMode::Searching => {
                match key.code {
                    KeyCode::Char(c) => {
                        self.params.search_term.push(c);
                        self.params.page = 1;
                        self.reset_selection();
                    }
                    KeyCode::Backspace => {
                        if self.params.search_term.pop().is_some() {
                            self.params.page = 1;
                            self.reset_selection();
                        }
                    }
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Down => self.enter_normal_mode(),
                    _ => {}
                }
                Action::None
            }
            InputMode::EditingDate(field) => {
                match key.code {
                    KeyCode::Enter => self.save_date_edit(field),
                    KeyCode::Esc => self.cancel_date_edit(),
                    KeyCode::Char(c) => self.date_edit_buffer.push(c),
                    KeyCode::Backspace => {
                        self.date_edit_buffer.pop();
                    }
                    _ => {}
                }
                Action::None
            }
            InputMode::Normal if self.show_readme => self.handle_readme_key(key),
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Action {
        self.clear_error();
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('/') => self.enter_search_mode(),
            KeyCode::Char('f') => self.enter_date_edit(DateField::From),
            KeyCode::Char('t') => self.enter_date_edit(DateField::To),
            KeyCode::Char('s') => self.cycle_sort(),
            KeyCode::Char('o') => self.toggle_order(),
            KeyCode::Char('n') | KeyCode::Right => self.next_page(),
            KeyCode::Char('p') | KeyCode::Left => self.previous_page(),
            KeyCode::Char('j') | KeyCode::Down => self.next_result(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_result(),
            KeyCode::Char('r') => return self.open_readme(),
            KeyCode::Enter => {
                if let Some(repo) = self.selected_repository() {
                    match &repo.html_url {
                        Some(url) => return Action::OpenBrowser(url.clone()),
                        None => self.error_message = Some("Repository unavailable".to_string()),
                    }
                }
            }
            _ => {}
        }
        Action::None
    }

    fn handle_readme_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('r') | KeyCode::Esc => self.show_readme = false,
            KeyCode::Char('R') => return Action::RefetchReadme,
            KeyCode::Char('j') | KeyCode::Down => self.scroll_readme_down(),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_readme_up(),
            _ => {}
        }
        Action::None
    }

    fn open_readme(&mut self) -> Action {
        match self.selected_repository() {
            Some(repo) => {
                let name = repo.full_name.clone();
                self.show_readme = true;
                self.reset_readme_scroll();
                Action::OpenReadme(name)
            }
            None => Action::None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Searching;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn enter_date_edit(&mut self, field: DateField) {
        self.input_mode = InputMode::EditingDate(field);
        // Load current value into edit buffer
        self.date_edit_buffer = self.date(field).format("%Y-%m-%d").to_string();
    }

    pub fn save_date_edit(&mut self, field: DateField) {
        match NaiveDate::parse_from_str(self.date_edit_buffer.trim(), "%Y-%m-%d") {
            Ok(date) => {
                if date != self.date(field) {
                    match field {
                        DateField::From => self.params.created_from = date,
                        DateField::To => self.params.created_to = date,
                    }
                    self.params.page = 1;
                    self.reset_selection();
                }
                self.clear_error();
            }
            Err(_) => {
                self.error_message = Some(format!(
                    "Invalid {} date \"{}\" (expected YYYY-MM-DD)",
                    field.label(),
                    self.date_edit_buffer.trim()
                ));
            }
        }
        self.date_edit_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn cancel_date_edit(&mut self) {
        self.date_edit_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn date(&self, field: DateField) -> NaiveDate {
        match field {
            DateField::From => self.params.created_from,
            DateField::To => self.params.created_to,
        }
    }

    pub fn cycle_sort(&mut self) {
        self.params.sort_by = self.params.sort_by.next();
        self.params.page = 1;
        self.reset_selection();
    }

    pub fn toggle_order(&mut self) {
        self.params.order_by = self.params.order_by.toggle();
        self.params.page = 1;
        self.reset_selection();
    }

    pub fn next_page(&mut self) {
        if !self.results.is_loading
            && self
                .pagination
                .can_go_forward(self.params.page, self.results.total_count)
        {
            self.params.page += 1;
            self.await_page();
        }
    }

    pub fn previous_page(&mut self) {
        if !self.results.is_loading && self.pagination.can_go_back(self.params.page) {
            self.params.page -= 1;
            self.await_page();
        }
    }

    /// Hold paging until the controller publishes a snapshot for the new page
    fn await_page(&mut self) {
        self.results.is_loading = true;
    }

    pub fn next_result(&mut self) {
        if !self.results.repositories.is_empty() {
            self.selected_index =
                (self.selected_index + 1).min(self.results.repositories.len() - 1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn previous_result(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn reset_selection(&mut self) {
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    pub fn selected_repository(&self) -> Option<&RepositorySummary> {
        self.results.repositories.get(self.selected_index)
    }

    /// Take the controller's latest snapshot, keeping the selection in range
    pub fn set_results(&mut self, results: ResultPage) {
        self.results = results;
        let len = self.results.repositories.len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn set_readme(&mut self, readme: ReadmeState) {
        self.readme = readme;
    }

    /// Text shown in place of the result list, if any
    pub fn placeholder(&self) -> Option<String> {
        if self.results.is_loading && self.results.repositories.is_empty() {
            return Some("Loading repositories…".to_string());
        }
        if let Some(error) = &self.results.error {
            return Some(error.clone());
        }
        if self.results.repositories.is_empty() {
            let term = self.params.trimmed_term();
            return Some(if term.is_empty() {
                "Search for repositories using the form above.".to_string()
            } else {
                format!("No repositories found for \"{}\".", term)
            });
        }
        None
    }

    pub fn pagination_summary(&self) -> String {
        self.pagination
            .summary(self.params.page, self.results.total_count)
    }

    pub fn scroll_readme_down(&mut self) {
        self.readme_scroll = self.readme_scroll.saturating_add(1);
    }

    pub fn scroll_readme_up(&mut self) {
        self.readme_scroll = self.readme_scroll.saturating_sub(1);
    }

    pub fn reset_readme_scroll(&mut self) {
        self.readme_scroll = 0;
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(QueryParams::default(), Pagination::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolens_core::{OrderBy, SortBy};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn repo(full_name: &str, url: Option<&str>) -> RepositorySummary {
        RepositorySummary {
            full_name: full_name.to_string(),
            html_url: url.map(String::from),
            ..RepositorySummary::default()
        }
    }

    fn loaded(app: &mut App, total_count: u64, names: &[&str]) {
        app.set_results(ResultPage {
            repositories: names.iter().map(|n| repo(n, Some("https://github.com/x"))).collect(),
            total_count,
            is_loading: false,
            error: None,
        });
    }

    #[test]
    fn test_typing_updates_term_and_resets_page() {
        let mut app = App::default();
        app.params.page = 3;
        type_str(&mut app, "tokio");
        assert_eq!(app.params.search_term, "tokio");
        assert_eq!(app.params.page, 1);

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.params.search_term, "toki");
    }

    #[test]
    fn test_normal_mode_keys_change_filters() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);

        app.params.page = 2;
        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.params.sort_by, SortBy::Stars);
        assert_eq!(app.params.page, 1);

        app.params.page = 2;
        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.params.order_by, OrderBy::Asc);
        assert_eq!(app.params.page, 1);
    }

    #[test]
    fn test_date_edit_commits_on_enter() {
        let mut app = App::default();
        app.enter_normal_mode();

        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.input_mode, InputMode::EditingDate(DateField::From));
        app.date_edit_buffer.clear();
        type_str(&mut app, "2024-01-15");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.params.created_from, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.error_message.is_none());
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let mut app = App::default();
        app.enter_normal_mode();
        let before = app.params.created_to;

        app.handle_key(key(KeyCode::Char('t')));
        app.date_edit_buffer = "next tuesday".into();
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.params.created_to, before);
        assert!(app.error_message.as_deref().unwrap().starts_with("Invalid To date"));
    }

    #[test]
    fn test_paging_respects_bounds() {
        let mut app = App::default();
        app.enter_normal_mode();
        loaded(&mut app, 45, &["a/a"]);

        app.handle_key(key(KeyCode::Char('p')));
        assert_eq!(app.params.page, 1);

        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.params.page, 2);
        loaded(&mut app, 45, &["a/a", "b/b"]);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.params.page, 2, "only two pages of 30 for 45 results");

        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.params.page, 1);
    }

    #[test]
    fn test_paging_waits_for_the_next_snapshot() {
        let mut app = App::default();
        app.enter_normal_mode();
        loaded(&mut app, 500, &["a/a"]);

        app.handle_key(key(KeyCode::Char('n')));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.params.page, 2);
        assert!(app.results.is_loading);

        loaded(&mut app, 500, &["a/a", "b/b"]);
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.params.page, 3);

        app.set_results(ResultPage {
            is_loading: true,
            total_count: 500,
            ..ResultPage::default()
        });
        app.handle_key(key(KeyCode::Char('p')));
        assert_eq!(app.params.page, 3, "no paging back while a page is loading");

        loaded(&mut app, 500, &["a/a", "b/b", "c/c"]);
        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.params.page, 2);
    }

    #[test]
    fn test_selection_and_readme_actions() {
        let mut app = App::default();
        app.enter_normal_mode();
        loaded(&mut app, 2, &["a/one", "b/two"]);

        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_repository().unwrap().full_name, "b/two");

        assert_eq!(
            app.handle_key(key(KeyCode::Char('r'))),
            Action::OpenReadme("b/two".into())
        );
        assert!(app.show_readme);
        assert_eq!(app.handle_key(key(KeyCode::Char('R'))), Action::RefetchReadme);

        app.handle_key(key(KeyCode::Esc));
        assert!(!app.show_readme);
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Action::OpenBrowser("https://github.com/x".into())
        );
    }

    #[test]
    fn test_enter_on_unavailable_repository() {
        let mut app = App::default();
        app.enter_normal_mode();
        app.set_results(ResultPage {
            repositories: vec![repo("gone/away", None)],
            total_count: 1,
            ..ResultPage::default()
        });

        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.error_message.as_deref(), Some("Repository unavailable"));
    }

    #[test]
    fn test_placeholder_messages() {
        let mut app = App::default();
        assert_eq!(
            app.placeholder().as_deref(),
            Some("Search for repositories using the form above.")
        );

        type_str(&mut app, "zzz");
        assert_eq!(
            app.placeholder().as_deref(),
            Some("No repositories found for \"zzz\".")
        );

        app.set_results(ResultPage::loading());
        assert_eq!(app.placeholder().as_deref(), Some("Loading repositories…"));

        app.set_results(ResultPage::failed("Failed to fetch repositories: boom".into()));
        assert_eq!(
            app.placeholder().as_deref(),
            Some("Failed to fetch repositories: boom")
        );

        loaded(&mut app, 1, &["a/a"]);
        assert!(app.placeholder().is_none());
    }

    #[test]
    fn test_selection_clamped_when_results_shrink() {
        let mut app = App::default();
        app.enter_normal_mode();
        loaded(&mut app, 3, &["a/a", "b/b", "c/c"]);
        app.next_result();
        app.next_result();
        assert_eq!(app.selected_index, 2);

        loaded(&mut app, 1, &["a/a"]);
        assert_eq!(app.selected_index, 0);
    }
}
