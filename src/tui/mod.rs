//! Terminal front end: input handling here, drawing in `render`.

pub mod render;

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;

use crate::dashboard::filter::Filters;
use crate::dashboard::scrape::{ScrapeKind, ScrapeRequest};
use crate::dashboard::state::{Dashboard, HealthProbe, Request, Tone};

/// Hint messages (bad input, nothing selected) stay up this long.
const HINT_SECS: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Filters,
}

/// What the event loop must do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Send(Request),
    ToggleSaved(String),
}

pub const FILTER_LABELS: [&str; 5] = ["Zip code", "Distance (mi)", "Max price", "Min year", "Min profit"];

/// Editable text form over `Filters`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterForm {
    pub fields: [String; 5],
    pub focus: usize,
}

impl FilterForm {
    pub fn from_filters(f: &Filters) -> Self {
        Self {
            fields: [
                f.zip_code.clone().unwrap_or_default(),
                f.distance.map(|d| d.to_string()).unwrap_or_default(),
                f.price_max.map(|p| p.to_string()).unwrap_or_default(),
                f.year_min.map(|y| y.to_string()).unwrap_or_default(),
                f.min_profit.map(|p| p.to_string()).unwrap_or_default(),
            ],
            focus: 0,
        }
    }

    /// Blank fields are unset; anything unparsable names the offending field.
    pub fn to_filters(&self) -> Result<Filters, String> {
        let zip = self.fields[0].trim();
        Ok(Filters {
            zip_code: (!zip.is_empty()).then(|| zip.to_string()),
            distance: parse_field(&self.fields[1], FILTER_LABELS[1])?,
            price_max: parse_field(&self.fields[2], FILTER_LABELS[2])?,
            year_min: parse_field(&self.fields[3], FILTER_LABELS[3])?,
            min_profit: parse_field(&self.fields[4], FILTER_LABELS[4])?,
        })
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, label: &str) -> Result<Option<T>, String> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<T>()
        .map(Some)
        .map_err(|_| format!("{label}: {raw:?} is not a number"))
}

#[derive(Debug)]
pub struct UiState {
    pub mode: InputMode,
    /// Last entered search text; also the query for scrapes.
    pub query: String,
    pub form: FilterForm,
    pub table: TableState,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            mode: InputMode::Normal,
            query: String::new(),
            form: FilterForm::default(),
            table: TableState::default(),
        }
    }

    /// Id of the highlighted row in the visible list.
    pub fn selected_id(&self, dash: &Dashboard) -> Option<String> {
        let i = self.table.selected()?;
        dash.visible_vehicles().get(i).map(|v| v.id.clone())
    }

    /// Keep the selection inside the visible list after it changes.
    pub fn clamp_selection(&mut self, visible_len: usize) {
        match (self.table.selected(), visible_len) {
            (_, 0) => self.table.select(None),
            (None, _) => self.table.select(Some(0)),
            (Some(i), n) if i >= n => self.table.select(Some(n - 1)),
            _ => {}
        }
    }
}

pub fn handle_key(ui: &mut UiState, dash: &mut Dashboard, key: KeyEvent) -> Vec<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![Command::Quit];
    }
    match ui.mode {
        InputMode::Normal => normal_key(ui, dash, key),
        InputMode::Search => search_key(ui, dash, key),
        InputMode::Filters => filter_key(ui, dash, key),
    }
}

fn hint(dash: &mut Dashboard, text: &str) {
    dash.notify(text.to_string(), Tone::Failure, Some(Duration::from_secs(HINT_SECS)));
}

fn normal_key(ui: &mut UiState, dash: &mut Dashboard, key: KeyEvent) -> Vec<Command> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => vec![Command::Quit],
        KeyCode::Char('r') | KeyCode::Char('R') => {
            vec![
                Command::Send(Request::Deals),
                Command::Send(Request::Trending),
                Command::Send(Request::Stats),
            ]
        }
        KeyCode::Char('/') => {
            ui.mode = InputMode::Search;
            vec![]
        }
        KeyCode::Char('f') => {
            ui.form = FilterForm::from_filters(&dash.filters);
            ui.mode = InputMode::Filters;
            vec![]
        }
        KeyCode::Char('s') => {
            dash.set_sort(dash.sort.field.next());
            vec![]
        }
        KeyCode::Char('d') => {
            dash.set_sort(dash.sort.field);
            vec![]
        }
        KeyCode::Char('v') => {
            dash.toggle_view_mode();
            vec![]
        }
        KeyCode::Char('o') => {
            dash.toggle_saved_only();
            vec![]
        }
        KeyCode::Char(' ') | KeyCode::Char('b') => match ui.selected_id(dash) {
            Some(id) => vec![Command::ToggleSaved(id)],
            None => vec![],
        },
        KeyCode::Char('t') => {
            let visible = dash.visible_vehicles();
            let Some(v) = ui.table.selected().and_then(|i| visible.get(i)) else {
                return vec![];
            };
            let request = Request::UpdateStatus { id: v.id.clone(), status: v.status.next() };
            vec![Command::Send(request)]
        }
        KeyCode::Char(c @ '1'..='4') => {
            let kind = match c {
                '1' => ScrapeKind::Quick,
                '2' => ScrapeKind::Comprehensive,
                '3' => ScrapeKind::Enthusiast,
                _ => ScrapeKind::PrivateParty,
            };
            if ui.query.trim().is_empty() {
                hint(dash, "Enter a search with / before scraping");
                return vec![];
            }
            let req = ScrapeRequest::new(kind, ui.query.clone(), dash.filters.zip_code.clone());
            vec![Command::Send(Request::Scrape(req))]
        }
        KeyCode::Char('a') => vec![Command::Send(Request::Health(HealthProbe::Sources))],
        KeyCode::Char('h') => vec![Command::Send(Request::Health(HealthProbe::Test))],
        KeyCode::Down | KeyCode::Char('j') => {
            let max = dash.visible_vehicles().len().saturating_sub(1);
            let next = ui.table.selected().map_or(0, |i| (i + 1).min(max));
            ui.table.select(Some(next));
            vec![]
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let prev = ui.table.selected().map_or(0, |i| i.saturating_sub(1));
            ui.table.select(Some(prev));
            vec![]
        }
        _ => vec![],
    }
}

fn search_key(ui: &mut UiState, dash: &mut Dashboard, key: KeyEvent) -> Vec<Command> {
    match key.code {
        KeyCode::Esc => {
            ui.mode = InputMode::Normal;
            vec![]
        }
        KeyCode::Enter => {
            ui.mode = InputMode::Normal;
            ui.table.select(Some(0));
            vec![Command::Send(Request::Search {
                query: ui.query.trim().to_string(),
                filters: dash.filters.clone(),
            })]
        }
        KeyCode::Backspace => {
            ui.query.pop();
            vec![]
        }
        KeyCode::Char(c) => {
            ui.query.push(c);
            vec![]
        }
        _ => vec![],
    }
}

fn filter_key(ui: &mut UiState, dash: &mut Dashboard, key: KeyEvent) -> Vec<Command> {
    let n = ui.form.fields.len();
    match key.code {
        KeyCode::Esc => {
            ui.mode = InputMode::Normal;
            vec![]
        }
        KeyCode::Tab | KeyCode::Down => {
            ui.form.focus = (ui.form.focus + 1) % n;
            vec![]
        }
        KeyCode::BackTab | KeyCode::Up => {
            ui.form.focus = (ui.form.focus + n - 1) % n;
            vec![]
        }
        KeyCode::Backspace => {
            ui.form.fields[ui.form.focus].pop();
            vec![]
        }
        KeyCode::Char(c) => {
            ui.form.fields[ui.form.focus].push(c);
            vec![]
        }
        KeyCode::Enter => match ui.form.to_filters() {
            Ok(filters) => {
                ui.mode = InputMode::Normal;
                dash.set_filters(filters.clone());
                if ui.query.trim().is_empty() {
                    vec![]
                } else {
                    vec![Command::Send(Request::Search { query: ui.query.trim().to_string(), filters })]
                }
            }
            Err(e) => {
                hint(dash, &e);
                vec![]
            }
        },
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventKind;
    use serde_json::json;

    use super::*;
    use crate::db::local_store::tests::temp_store;
    use crate::db::SavedVehicles;
    use crate::dashboard::sort::{SortDirection, SortField};
    use crate::types::ListingStatus;

    async fn dashboard() -> (tempfile::TempDir, Dashboard) {
        let (dir, store) = temp_store().await;
        let mut d = Dashboard::new(SavedVehicles::load(store).await);
        d.vehicles = serde_json::from_value(json!([
            {"id": "a", "flip_score": 9.1, "status": "watching"},
            {"id": "b", "flip_score": 4.0}
        ]))
        .unwrap();
        (dir, d)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn type_str(ui: &mut UiState, d: &mut Dashboard, s: &str) {
        for c in s.chars() {
            handle_key(ui, d, press(KeyCode::Char(c)));
        }
    }

    #[tokio::test]
    async fn search_prompt_sends_search_with_filters() {
        let (_dir, mut d) = dashboard().await;
        d.filters.year_min = Some(2018);
        let mut ui = UiState::new();

        handle_key(&mut ui, &mut d, press(KeyCode::Char('/')));
        assert_eq!(ui.mode, InputMode::Search);
        type_str(&mut ui, &mut d, "ram trxx");
        handle_key(&mut ui, &mut d, press(KeyCode::Backspace));
        let cmds = handle_key(&mut ui, &mut d, press(KeyCode::Enter));

        assert_eq!(ui.mode, InputMode::Normal);
        assert_eq!(
            cmds,
            vec![Command::Send(Request::Search {
                query: "ram trx".to_string(),
                filters: Filters { year_min: Some(2018), ..Default::default() },
            })]
        );
    }

    #[tokio::test]
    async fn scrape_requires_query_and_uses_zip_as_location() {
        let (_dir, mut d) = dashboard().await;
        let mut ui = UiState::new();

        assert!(handle_key(&mut ui, &mut d, press(KeyCode::Char('1'))).is_empty());
        assert_eq!(d.message.as_ref().unwrap().tone, Tone::Failure);

        ui.query = "miata".to_string();
        d.filters.zip_code = Some("97201".to_string());
        let cmds = handle_key(&mut ui, &mut d, press(KeyCode::Char('4')));
        match &cmds[..] {
            [Command::Send(Request::Scrape(req))] => {
                assert_eq!(req.kind, ScrapeKind::PrivateParty);
                assert_eq!(req.location.as_deref(), Some("97201"));
                assert_eq!(req.max_results, 25);
            }
            other => panic!("expected scrape command, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_key_advances_selected_vehicle() {
        let (_dir, mut d) = dashboard().await;
        let mut ui = UiState::new();
        ui.table.select(Some(0));

        let cmds = handle_key(&mut ui, &mut d, press(KeyCode::Char('t')));
        assert_eq!(
            cmds,
            vec![Command::Send(Request::UpdateStatus {
                id: "a".to_string(),
                status: ListingStatus::Contacted,
            })]
        );
    }

    #[tokio::test]
    async fn save_key_targets_visible_row() {
        let (_dir, mut d) = dashboard().await;
        let mut ui = UiState::new();
        handle_key(&mut ui, &mut d, press(KeyCode::Char('j')));
        handle_key(&mut ui, &mut d, press(KeyCode::Char('j')));
        assert_eq!(ui.table.selected(), Some(1));
        assert_eq!(
            handle_key(&mut ui, &mut d, press(KeyCode::Char(' '))),
            vec![Command::ToggleSaved("b".to_string())]
        );
    }

    #[tokio::test]
    async fn sort_keys() {
        let (_dir, mut d) = dashboard().await;
        let mut ui = UiState::new();
        handle_key(&mut ui, &mut d, press(KeyCode::Char('d')));
        assert_eq!(d.sort.direction, SortDirection::Asc);
        handle_key(&mut ui, &mut d, press(KeyCode::Char('s')));
        assert_eq!(d.sort.field, SortField::EstProfit);
        assert_eq!(d.sort.direction, SortDirection::Desc);
    }

    #[tokio::test]
    async fn filter_form_applies_or_reports() {
        let (_dir, mut d) = dashboard().await;
        let mut ui = UiState::new();
        handle_key(&mut ui, &mut d, press(KeyCode::Char('f')));
        assert_eq!(ui.mode, InputMode::Filters);

        handle_key(&mut ui, &mut d, press(KeyCode::Tab));
        handle_key(&mut ui, &mut d, press(KeyCode::Tab));
        type_str(&mut ui, &mut d, "$50,000");
        handle_key(&mut ui, &mut d, press(KeyCode::Tab));
        type_str(&mut ui, &mut d, "20x8");
        assert!(handle_key(&mut ui, &mut d, press(KeyCode::Enter)).is_empty());
        assert_eq!(ui.mode, InputMode::Filters);
        assert!(d.message.as_ref().unwrap().text.starts_with("Min year"));

        handle_key(&mut ui, &mut d, press(KeyCode::Backspace));
        handle_key(&mut ui, &mut d, press(KeyCode::Backspace));
        type_str(&mut ui, &mut d, "18");
        let cmds = handle_key(&mut ui, &mut d, press(KeyCode::Enter));
        assert!(cmds.is_empty(), "no query, so nothing to re-run");
        assert_eq!(ui.mode, InputMode::Normal);
        assert_eq!(d.filters.price_max, Some(50000.0));
        assert_eq!(d.filters.year_min, Some(2018));
    }

    #[test]
    fn clamp_selection_tracks_list_length() {
        let mut ui = UiState::new();
        ui.clamp_selection(3);
        assert_eq!(ui.table.selected(), Some(0));
        ui.table.select(Some(7));
        ui.clamp_selection(3);
        assert_eq!(ui.table.selected(), Some(2));
        ui.clamp_selection(0);
        assert_eq!(ui.table.selected(), None);
    }
}
