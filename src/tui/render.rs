use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::dashboard::state::{Activity, Dashboard, HealthProbe, Tone, ViewMode};
use crate::format::{
    format_age, format_count, format_currency, format_mileage, format_percent, format_score,
    format_signed_currency, truncate,
};
use crate::tui::{InputMode, UiState, FILTER_LABELS};
use crate::types::{ListingStatus, SellerType, Vehicle};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

pub fn render(f: &mut Frame, dash: &Dashboard, ui: &mut UiState) {
    let area = f.area();

    // header | body | input | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, dash, chunks[0]);
    render_body(f, dash, ui, chunks[1]);
    render_input(f, dash, ui, chunks[2]);
    render_footer(f, dash, chunks[3]);
}

fn render_header(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let busy = [
        (Activity::Vehicles, "loading"),
        (Activity::Scrape, "scraping"),
        (Activity::Sources, "probing"),
    ]
    .iter()
    .filter(|(a, _)| dash.is_busy(*a))
    .map(|(_, label)| *label)
    .collect::<Vec<_>>();

    let (sync_text, sync_color) = if !busy.is_empty() {
        (format!("◌ {}", busy.join(", ")), Color::Yellow)
    } else {
        match dash.last_sync {
            Some(t) => (format!("● synced {}", format_age(t.elapsed())), Color::Green),
            None => ("○ not loaded".to_string(), Color::DarkGray),
        }
    };

    let mut spans = vec![
        Span::styled(
            " FlipBot AI  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(sync_text, Style::default().fg(sync_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} deals", format_count(dash.stats.deal_opportunities)),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} vehicles tracked", format_count(dash.stats.total_vehicles)),
            Style::default().fg(Color::White),
        ),
    ];
    if let Some(avg) = dash.stats.avg_profit {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("{} avg profit", format_currency(Some(avg))),
            Style::default().fg(Color::White),
        ));
    }
    if let Some(n) = dash.stats.sources_tracked {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("{} sources", format_count(Some(n))),
            Style::default().fg(Color::White),
        ));
    }
    if let Some(updated) = &dash.stats.last_updated {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("updated {}", truncate(updated, 19)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::raw("  │  "));
    spans.push(Span::styled(
        format!("★ {} saved", dash.saved.len()),
        Style::default().fg(Color::Magenta),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, dash: &Dashboard, ui: &mut UiState, area: Rect) {
    // vehicles (70%) | trends + scrapers (30%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let visible = dash.visible_vehicles();
    ui.clamp_selection(visible.len());

    match dash.view_mode {
        ViewMode::Compact => render_vehicle_table(f, dash, &visible, ui, halves[0]),
        ViewMode::Detailed => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(6), Constraint::Length(8)])
                .split(halves[0]);
            render_vehicle_table(f, dash, &visible, ui, split[0]);
            let selected = ui.table.selected().and_then(|i| visible.get(i).copied());
            render_vehicle_detail(f, dash, selected, split[1]);
        }
    }

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(halves[1]);
    render_trends(f, dash, side[0]);
    render_scrapers(f, dash, side[1]);
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

fn render_vehicle_table(f: &mut Frame, dash: &Dashboard, visible: &[&Vehicle], ui: &mut UiState, area: Rect) {
    let detailed = dash.view_mode == ViewMode::Detailed;
    let headers: &[&str] = if detailed {
        &["", "Vehicle", "Price", "Market", "Profit", "ROI", "Score", "Miles", "Location", "Source", "Seller", "Status"]
    } else {
        &["", "Vehicle", "Price", "Profit", "ROI", "Score", "Status"]
    };
    let header = Row::new(
        headers
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
    )
    .height(1);

    let rows: Vec<Row> = visible
        .iter()
        .map(|v| {
            let saved = if dash.saved.contains(&v.id) { "★" } else { " " };
            let profit = v.est_profit.unwrap_or(0.0);
            let profit_color = if profit > 0.0 { Color::Green } else if profit < 0.0 { Color::Red } else { Color::White };
            let mut cells = vec![
                Cell::from(saved).style(Style::default().fg(Color::Magenta)),
                Cell::from(truncate(&v.title(), 30)),
                Cell::from(format_currency(v.asking_price)),
            ];
            if detailed {
                cells.push(Cell::from(format_currency(v.market_value)).style(Style::default().fg(Color::DarkGray)));
            }
            cells.push(Cell::from(format_signed_currency(v.est_profit)).style(Style::default().fg(profit_color)));
            cells.push(Cell::from(format_percent(v.roi_percent)).style(Style::default().fg(profit_color)));
            cells.push(Cell::from(format_score(v.flip_score)).style(Style::default().fg(score_color(v.flip_score))));
            if detailed {
                cells.push(Cell::from(format_mileage(v.mileage)));
                cells.push(Cell::from(truncate(v.location.as_deref().unwrap_or("N/A"), 16)));
                cells.push(Cell::from(truncate(v.source_label(), 12)).style(Style::default().fg(Color::DarkGray)));
                cells.push(Cell::from(v.seller_label().to_string()).style(Style::default().fg(seller_color(v.seller_label()))));
            }
            cells.push(Cell::from(v.status.as_str()).style(Style::default().fg(status_color(v.status))));
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = if detailed {
        vec![
            Constraint::Length(1),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(12),
        ]
    } else {
        vec![
            Constraint::Length(1),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(12),
        ]
    };

    let mut title = format!(
        " VEHICLES ({}/{}) · sort: {} {} ",
        visible.len(),
        dash.vehicles.len(),
        dash.sort.field.label(),
        dash.sort.direction.arrow(),
    );
    if dash.saved_only {
        title.push_str("· saved only ");
    }
    if !dash.filters.is_empty() {
        title.push_str("· filtered ");
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, &mut ui.table);
}

fn render_vehicle_detail(f: &mut Frame, dash: &Dashboard, v: Option<&Vehicle>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" DETAIL ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));

    let Some(v) = v else {
        f.render_widget(Paragraph::new("No vehicle selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(vec![
            Span::styled(v.title(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                if dash.saved.contains(&v.id) { "★ saved" } else { "" },
                Style::default().fg(Color::Magenta),
            ),
        ]),
        Line::from(vec![
            Span::styled("asking ", label),
            Span::raw(format_currency(v.asking_price)),
            Span::styled("  market ", label),
            Span::raw(format_currency(v.market_value)),
            Span::styled("  transport ", label),
            Span::raw(format_currency(v.transport_cost)),
            Span::styled("  profit ", label),
            Span::raw(format_signed_currency(v.est_profit)),
            Span::styled("  ROI ", label),
            Span::raw(format_percent(v.roi_percent)),
        ]),
        Line::from(vec![
            Span::styled("mileage ", label),
            Span::raw(format_mileage(v.mileage)),
            Span::styled("  location ", label),
            Span::raw(or_na(v.location.as_deref())),
            Span::styled("  distance ", label),
            Span::raw(distance_label(v)),
            Span::styled("  vin ", label),
            Span::raw(or_na(v.vin.as_deref())),
        ]),
        Line::from(vec![
            Span::styled("status ", label),
            Span::styled(v.status.as_str(), Style::default().fg(status_color(v.status))),
            Span::styled("  flip score ", label),
            Span::styled(format!("{}/10", format_score(v.flip_score)), Style::default().fg(score_color(v.flip_score))),
            Span::styled("  listed ", label),
            Span::raw(or_na(v.date_listed.as_deref())),
            Span::styled("  photos ", label),
            Span::raw(v.images.len().to_string()),
        ]),
        Line::from(vec![
            Span::styled("notes ", label),
            Span::raw(v.notes.clone().unwrap_or_else(|| "—".to_string())),
        ]),
        Line::from(vec![
            Span::styled("url ", label),
            Span::raw(or_na(v.url.as_deref())),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn or_na(s: Option<&str>) -> String {
    s.unwrap_or("N/A").to_string()
}

/// "42 mi from 97201", or whichever half the listing carries.
fn distance_label(v: &Vehicle) -> String {
    match (v.distance_miles, v.zip_code.as_deref()) {
        (Some(d), Some(zip)) => format!("{d} mi from {zip}"),
        (Some(d), None) => format!("{d} mi"),
        (None, Some(zip)) => format!("zip {zip}"),
        (None, None) => "N/A".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Side panels
// ---------------------------------------------------------------------------

fn render_trends(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let header = Row::new(
        ["Make/Model", "Avg", "Chg", "#", "Days"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
    );

    let rows: Vec<Row> = dash
        .trending
        .iter()
        .map(|t| {
            let (arrow, color) = if t.is_rising() { ("▲", Color::Green) } else { ("▼", Color::Red) };
            Row::new(vec![
                Cell::from(truncate(&t.make_model, 18)),
                Cell::from(format_currency(t.avg_price)),
                Cell::from(format!("{arrow}{}", format_percent(t.price_change_percent))).style(Style::default().fg(color)),
                Cell::from(format_count(t.total_listings)).style(Style::default().fg(Color::Cyan)),
                Cell::from(t.avg_days_on_market.map_or("—".to_string(), |d| format!("{d}d"))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(" MARKET TRENDS ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
    );
    f.render_widget(table, area);
}

fn render_scrapers(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let title = match dash.health_probe {
        Some(HealthProbe::Test) => " SCRAPERS (tested) ",
        Some(HealthProbe::Sources) => " SCRAPERS (available) ",
        None => " SCRAPERS ",
    };
    let lines: Vec<Line> = if dash.scraper_health.is_empty() {
        vec![Line::from(Span::styled(
            "[a] sources  [h] test",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        dash.scraper_health
            .iter()
            .map(|(name, h)| {
                let (mark, color) = if h.available { ("●", Color::Green) } else { ("✗", Color::Red) };
                let mut spans = vec![
                    Span::styled(format!("{mark} "), Style::default().fg(color)),
                    Span::raw(name.clone()),
                ];
                if let Some(d) = &h.detail {
                    spans.push(Span::styled(format!("  {}", truncate(d, 20)), Style::default().fg(Color::DarkGray)));
                }
                Line::from(spans)
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
    );
    f.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Input & footer
// ---------------------------------------------------------------------------

fn render_input(f: &mut Frame, dash: &Dashboard, ui: &UiState, area: Rect) {
    let active = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let label = Style::default().fg(Color::DarkGray);

    let line = match ui.mode {
        InputMode::Filters => {
            let mut spans = Vec::new();
            for (i, (name, value)) in FILTER_LABELS.iter().zip(ui.form.fields.iter()).enumerate() {
                let style = if i == ui.form.focus { active } else { label };
                spans.push(Span::styled(format!("{name}: "), style));
                spans.push(Span::raw(format!("[{value}]  ")));
            }
            Line::from(spans)
        }
        InputMode::Search => Line::from(vec![
            Span::styled("search: ", active),
            Span::raw(ui.query.clone()),
            Span::styled("▏", active),
        ]),
        InputMode::Normal => {
            let query = if ui.query.is_empty() { "—".to_string() } else { ui.query.clone() };
            let filters = &dash.filters;
            Line::from(vec![
                Span::styled("query ", label),
                Span::raw(query),
                Span::styled("  zip ", label),
                Span::raw(filters.zip_code.clone().unwrap_or_else(|| "—".to_string())),
                Span::styled("  within ", label),
                Span::raw(filters.distance.map_or("—".to_string(), |d| format!("{d} mi"))),
                Span::styled("  max ", label),
                Span::raw(filters.price_max.map_or("—".to_string(), |p| format_currency(Some(p)))),
                Span::styled("  from ", label),
                Span::raw(filters.year_min.map_or("—".to_string(), |y| y.to_string())),
                Span::styled("  min profit ", label),
                Span::raw(filters.min_profit.map_or("—".to_string(), |p| format_currency(Some(p)))),
            ])
        }
    };

    let title = match ui.mode {
        InputMode::Filters => " FILTERS · Tab next · Enter apply · Esc cancel ",
        InputMode::Search => " SEARCH · Enter run · Esc cancel ",
        InputMode::Normal => " SEARCH ",
    };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title),
    );
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, dash: &Dashboard, area: Rect) {
    let line = match &dash.message {
        Some(msg) => {
            let color = match msg.tone {
                Tone::Info => Color::Yellow,
                Tone::Success => Color::Green,
                Tone::Failure => Color::Red,
            };
            Line::from(Span::styled(format!(" {}", msg.text), Style::default().fg(color)))
        }
        None => {
            let key = Style::default().fg(Color::Yellow);
            Line::from(vec![
                Span::styled(" [q] ", key),
                Span::raw("quit  "),
                Span::styled("[/] ", key),
                Span::raw("search  "),
                Span::styled("[f] ", key),
                Span::raw("filters  "),
                Span::styled("[1-4] ", key),
                Span::raw("scrape quick/full/enthusiast/private  "),
                Span::styled("[s/d] ", key),
                Span::raw("sort  "),
                Span::styled("[t] ", key),
                Span::raw("status  "),
                Span::styled("[space] ", key),
                Span::raw("save  "),
                Span::styled("[o] ", key),
                Span::raw("saved only  "),
                Span::styled("[v] ", key),
                Span::raw("view  "),
                Span::styled("[r] ", key),
                Span::raw("reload"),
            ])
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub fn status_color(status: ListingStatus) -> Color {
    match status {
        ListingStatus::New => Color::Cyan,
        ListingStatus::Watching => Color::Yellow,
        ListingStatus::Contacted => Color::LightBlue,
        ListingStatus::Negotiating => Color::LightMagenta,
        ListingStatus::Purchased | ListingStatus::ListedForSale => Color::Green,
        ListingStatus::Sold => Color::LightGreen,
        ListingStatus::Passed => Color::DarkGray,
    }
}

fn seller_color(seller: SellerType) -> Color {
    match seller {
        SellerType::Private => Color::Green,
        SellerType::Dealer => Color::Blue,
        SellerType::Auction => Color::Magenta,
        SellerType::Unknown => Color::DarkGray,
    }
}

fn score_color(score: Option<f64>) -> Color {
    match score {
        Some(s) if s >= 7.0 => Color::Green,
        Some(s) if s >= 4.0 => Color::Yellow,
        Some(_) => Color::Red,
        None => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    use super::*;
    use crate::db::local_store::tests::temp_store;
    use crate::db::SavedVehicles;

    async fn dashboard_with(vehicles: serde_json::Value) -> (tempfile::TempDir, Dashboard) {
        let (dir, store) = temp_store().await;
        let mut d = Dashboard::new(SavedVehicles::load(store).await);
        d.vehicles = serde_json::from_value(vehicles).unwrap();
        (dir, d)
    }

    fn draw(dash: &Dashboard, ui: &mut UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(240, 40)).unwrap();
        terminal.draw(|f| render(f, dash, ui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn vehicle_without_status_renders_as_new() {
        let (_dir, mut d) = dashboard_with(json!([{"id": "bare", "make": "Ford", "model": "Bronco"}])).await;
        assert_eq!(d.vehicles[0].status, ListingStatus::New);
        assert_eq!(status_color(d.vehicles[0].status), status_color(ListingStatus::New));

        d.view_mode = ViewMode::Detailed;
        let mut ui = UiState::new();
        let screen = draw(&d, &mut ui);
        assert!(screen.contains("Ford Bronco"));
        assert!(screen.contains("new"));
        assert!(screen.contains("N/A"));
    }

    #[tokio::test]
    async fn empty_dashboard_renders() {
        let (_dir, d) = dashboard_with(json!([])).await;
        let mut ui = UiState::new();
        let screen = draw(&d, &mut ui);
        assert!(screen.contains("VEHICLES (0/0)"));
        assert_eq!(ui.table.selected(), None);
    }

    #[tokio::test]
    async fn optional_stats_trend_and_listing_fields_are_shown() {
        let (_dir, mut d) = dashboard_with(json!([{
            "id": "full",
            "year": 2019,
            "make": "Toyota",
            "model": "Tacoma",
            "transport_cost": 850,
            "distance_miles": 42,
            "zip_code": "97201",
            "notes": "needs tires",
            "date_listed": "2026-10-01",
            "images": ["a.jpg", "b.jpg", "c.jpg"]
        }]))
        .await;
        d.stats = serde_json::from_value(json!({
            "deal_opportunities": 3,
            "sources_tracked": 7,
            "last_updated": "2026-10-18T09:00:00"
        }))
        .unwrap();
        d.trending = serde_json::from_value(json!([
            {"make_model": "Toyota Tacoma", "avg_price": 31000, "price_change_percent": 2.5, "avg_days_on_market": 23}
        ]))
        .unwrap();
        d.view_mode = ViewMode::Detailed;

        let mut ui = UiState::new();
        let screen = draw(&d, &mut ui);
        assert!(screen.contains("7 sources"));
        assert!(screen.contains("updated 2026-10-18T09:00:00"));
        assert!(screen.contains("23d"));
        assert!(screen.contains("transport $850"));
        assert!(screen.contains("42 mi from 97201"));
        assert!(screen.contains("listed 2026-10-01"));
        assert!(screen.contains("photos 3"));
        assert!(screen.contains("notes needs tires"));
    }
}
