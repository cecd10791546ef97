use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::DEALS_PAGE_SIZE;
use crate::dashboard::filter::{filter_vehicles, Filters};
use crate::dashboard::scrape::{self, ScrapeKind, ScrapeRequest};
use crate::dashboard::sort::{sort_vehicles, SortField, SortState};
use crate::db::SavedVehicles;
use crate::error::Result;
use crate::types::{ListingStatus, ScrapeResponse, ScraperHealth, Stats, TrendTile, Vehicle, VehicleUpdate};

// ---------------------------------------------------------------------------
// Requests & outcomes
// ---------------------------------------------------------------------------

/// Action classes with independent busy indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Deals, search and status updates.
    Vehicles,
    Scrape,
    Trending,
    Stats,
    Sources,
}

impl Activity {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        match self {
            Activity::Vehicles => 0,
            Activity::Scrape => 1,
            Activity::Trending => 2,
            Activity::Stats => 3,
            Activity::Sources => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthProbe {
    /// `/scrape/sources`: what the backend has configured.
    Sources,
    /// `/scrape/test`: live probe of each scraper.
    Test,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Deals,
    Trending,
    Stats,
    Search { query: String, filters: Filters },
    UpdateStatus { id: String, status: ListingStatus },
    Scrape(ScrapeRequest),
    Health(HealthProbe),
}

impl Request {
    fn activity(&self) -> Activity {
        match self {
            Request::Deals | Request::Search { .. } | Request::UpdateStatus { .. } => Activity::Vehicles,
            Request::Scrape(_) => Activity::Scrape,
            Request::Trending => Activity::Trending,
            Request::Stats => Activity::Stats,
            Request::Health(_) => Activity::Sources,
        }
    }

    /// Whether a successful response replaces the vehicle list.
    fn replaces_list(&self) -> bool {
        matches!(self, Request::Deals | Request::Search { .. } | Request::Scrape(_))
    }
}

#[derive(Debug)]
pub enum Outcome {
    Vehicles(Result<Vec<Vehicle>>),
    Trending(Result<Vec<TrendTile>>),
    Stats(Result<Stats>),
    StatusUpdated { id: String, status: ListingStatus, result: Result<()> },
    Scraped { kind: ScrapeKind, result: Result<ScrapeResponse> },
    Health { probe: HealthProbe, result: Result<ScraperHealth> },
}

/// Issued by `Dashboard::dispatch`, handed back to `Dashboard::complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// List sequence number; 0 for requests that never touch the list.
    pub seq: u64,
    activity: Activity,
}

#[derive(Debug)]
pub struct Pending {
    pub ticket: Ticket,
    pub request: Request,
}

/// Perform one request against the backend. Pure I/O: no dashboard state.
pub async fn execute(api: &ApiClient, request: Request) -> Outcome {
    match request {
        Request::Deals => Outcome::Vehicles(api.deals(DEALS_PAGE_SIZE).await),
        Request::Search { query, filters } => Outcome::Vehicles(api.search(&query, &filters).await),
        Request::Trending => Outcome::Trending(api.trending().await),
        Request::Stats => Outcome::Stats(api.stats().await),
        Request::UpdateStatus { id, status } => {
            let update = VehicleUpdate { status: Some(status) };
            let result = api.update_vehicle(&id, &update).await;
            Outcome::StatusUpdated { id, status, result }
        }
        Request::Scrape(req) => {
            let result = api.scrape(&req).await;
            Outcome::Scraped { kind: req.kind, result }
        }
        Request::Health(probe) => {
            let result = match probe {
                HealthProbe::Sources => api.scrape_sources().await,
                HealthProbe::Test => api.scrape_test().await,
            };
            Outcome::Health { probe, result }
        }
    }
}

// ---------------------------------------------------------------------------
// Status message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
    /// `None` while the action it describes is still running.
    pub expires_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Compact,
    Detailed,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// All client state. Mutated only from the UI loop; network work happens in
/// `execute` and comes back through `complete`.
#[derive(Debug)]
pub struct Dashboard {
    pub vehicles: Vec<Vehicle>,
    pub trending: Vec<TrendTile>,
    pub stats: Stats,
    pub scraper_health: ScraperHealth,
    pub health_probe: Option<HealthProbe>,
    pub saved: SavedVehicles,
    pub filters: Filters,
    pub sort: SortState,
    pub view_mode: ViewMode,
    pub saved_only: bool,
    pub message: Option<StatusMessage>,
    pub last_sync: Option<Instant>,
    /// In-progress text of the latest running scrape. Shown again whenever a
    /// shorter-lived message expires before the scrape finishes.
    scrape_note: Option<String>,
    in_flight: [u32; Activity::COUNT],
    /// Latest issued list sequence number.
    list_seq: u64,
}

impl Dashboard {
    pub fn new(saved: SavedVehicles) -> Self {
        Self {
            vehicles: Vec::new(),
            trending: Vec::new(),
            stats: Stats::default(),
            scraper_health: ScraperHealth::new(),
            health_probe: None,
            saved,
            filters: Filters::default(),
            sort: SortState::default(),
            view_mode: ViewMode::Compact,
            saved_only: false,
            message: None,
            last_sync: None,
            scrape_note: None,
            in_flight: [0; Activity::COUNT],
            list_seq: 0,
        }
    }

    pub fn is_busy(&self, activity: Activity) -> bool {
        self.in_flight[activity.index()] > 0
    }

    /// Loaded vehicles after local filters, the saved-only toggle and sorting.
    pub fn visible_vehicles(&self) -> Vec<&Vehicle> {
        let mut list = filter_vehicles(&self.vehicles, &self.filters);
        if self.saved_only {
            list.retain(|v| self.saved.contains(&v.id));
        }
        sort_vehicles(&mut list, self.sort);
        list
    }

    pub fn set_sort(&mut self, field: SortField) {
        self.sort.select(field);
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Compact => ViewMode::Detailed,
            ViewMode::Detailed => ViewMode::Compact,
        };
    }

    pub fn toggle_saved_only(&mut self) {
        self.saved_only = !self.saved_only;
    }

    /// Drop the status message once its time is up. While a scrape runs the
    /// status area falls back to its in-progress text instead of going blank.
    pub fn tick(&mut self, now: Instant) {
        if let Some(StatusMessage { expires_at: Some(at), .. }) = &self.message {
            if *at <= now {
                self.message = None;
            }
        }
        if self.message.is_none() {
            if let Some(note) = &self.scrape_note {
                self.message = Some(StatusMessage {
                    text: note.clone(),
                    tone: Tone::Info,
                    expires_at: None,
                });
            }
        }
    }

    /// Show `text` in the status area; `ttl: None` keeps it until replaced.
    pub fn notify(&mut self, text: String, tone: Tone, ttl: Option<Duration>) {
        self.message = Some(StatusMessage {
            text,
            tone,
            expires_at: ttl.map(|d| Instant::now() + d),
        });
    }

    /// Register a request as in flight and stamp it. An empty search becomes a deals load.
    pub fn dispatch(&mut self, request: Request) -> Pending {
        let request = match request {
            Request::Search { query, .. } if query.trim().is_empty() => Request::Deals,
            other => other,
        };

        let activity = request.activity();
        self.in_flight[activity.index()] += 1;

        let seq = if request.replaces_list() {
            self.list_seq += 1;
            self.list_seq
        } else {
            0
        };

        match &request {
            Request::Scrape(req) => {
                info!(kind = %req.kind, query = %req.query, seq, "scrape started");
                let note = scrape::in_progress_message(req);
                self.scrape_note = Some(note.clone());
                self.notify(note, Tone::Info, None);
            }
            Request::Search { query, filters } => {
                info!(query = %query.trim(), filters = ?filters, seq, "search started");
            }
            Request::UpdateStatus { id, status } => {
                info!(vehicle_id = %id, status = %status, "status update started");
            }
            other => debug!(request = ?other, seq, "request started"),
        }

        Pending { ticket: Ticket { seq, activity }, request }
    }

    /// Apply a finished request. Returns follow-up requests to run.
    pub fn complete(&mut self, ticket: Ticket, outcome: Outcome) -> Vec<Request> {
        let slot = &mut self.in_flight[ticket.activity.index()];
        *slot = slot.saturating_sub(1);

        let current = ticket.seq == self.list_seq;
        let mut follow_ups = Vec::new();

        match outcome {
            Outcome::Vehicles(Ok(list)) => {
                if current {
                    info!(count = list.len(), seq = ticket.seq, "vehicle list replaced");
                    self.vehicles = list;
                    self.last_sync = Some(Instant::now());
                } else {
                    debug!(seq = ticket.seq, latest = self.list_seq, "dropping stale vehicle list");
                }
            }
            Outcome::Vehicles(Err(e)) => warn!("Failed to load vehicles: {e}"),
            Outcome::Trending(Ok(tiles)) => self.trending = tiles,
            Outcome::Trending(Err(e)) => warn!("Failed to load trending: {e}"),
            Outcome::Stats(Ok(stats)) => self.stats = stats,
            Outcome::Stats(Err(e)) => warn!("Failed to load stats: {e}"),
            Outcome::StatusUpdated { id, status, result } => match result {
                Ok(()) => {
                    info!(vehicle_id = %id, status = %status, "status updated, reloading deals");
                    follow_ups.push(Request::Deals);
                }
                Err(e) => warn!(vehicle_id = %id, "Failed to update status to {status}: {e}"),
            },
            Outcome::Scraped { kind, result } => {
                if !self.is_busy(Activity::Scrape) {
                    self.scrape_note = None;
                }
                match result {
                    Ok(resp) => {
                        let mut text = scrape::success_message(kind, &resp);
                        info!(
                            kind = %kind,
                            vehicles_found = resp.vehicle_count(),
                            sources = resp.source_count(),
                            duration_s = resp.duration.unwrap_or(0.0),
                            "scrape finished"
                        );
                        for (source, err) in &resp.errors {
                            warn!(kind = %kind, source = %source, "scraper reported error: {err}");
                        }
                        if current {
                            self.vehicles = scrape::normalize(kind, resp.vehicles);
                            self.last_sync = Some(Instant::now());
                        } else {
                            debug!(seq = ticket.seq, latest = self.list_seq, "dropping stale scrape result");
                            text.push_str(" (superseded, list not replaced)");
                        }
                        self.notify(text, Tone::Success, Some(kind.message_ttl()));
                    }
                    Err(e) => {
                        warn!(kind = %kind, "Scrape failed: {e}");
                        self.notify(scrape::failure_message(kind), Tone::Failure, Some(kind.message_ttl()));
                    }
                }
            }
            Outcome::Health { probe, result } => match result {
                Ok(health) => {
                    info!(probe = ?probe, sources = health.len(), "scraper health loaded");
                    self.scraper_health = health;
                    self.health_probe = Some(probe);
                }
                Err(e) => warn!(probe = ?probe, "Failed to load scraper health: {e}"),
            },
        }

        follow_ups
    }

    /// Run a request and its follow-ups to completion, in order.
    pub async fn run(&mut self, api: &ApiClient, request: Request) {
        let mut queue = VecDeque::from([request]);
        while let Some(next) = queue.pop_front() {
            let pending = self.dispatch(next);
            let outcome = execute(api, pending.request).await;
            queue.extend(self.complete(pending.ticket, outcome));
        }
    }

    pub async fn load_deals(&mut self, api: &ApiClient) {
        self.run(api, Request::Deals).await;
    }

    pub async fn load_trending(&mut self, api: &ApiClient) {
        self.run(api, Request::Trending).await;
    }

    pub async fn load_stats(&mut self, api: &ApiClient) {
        self.run(api, Request::Stats).await;
    }

    pub async fn search(&mut self, api: &ApiClient, query: &str, filters: Filters) {
        self.run(api, Request::Search { query: query.to_string(), filters }).await;
    }

    pub async fn update_status(&mut self, api: &ApiClient, vehicle_id: &str, status: ListingStatus) {
        self.run(api, Request::UpdateStatus { id: vehicle_id.to_string(), status }).await;
    }

    pub async fn scrape(&mut self, api: &ApiClient, request: ScrapeRequest) {
        self.run(api, Request::Scrape(request)).await;
    }

    pub async fn scrape_quick(&mut self, api: &ApiClient, query: &str, location: Option<String>, max_results: Option<u32>) {
        self.scrape(api, scrape_request(ScrapeKind::Quick, query, location, max_results)).await;
    }

    pub async fn scrape_comprehensive(&mut self, api: &ApiClient, query: &str, location: Option<String>, max_results: Option<u32>) {
        self.scrape(api, scrape_request(ScrapeKind::Comprehensive, query, location, max_results)).await;
    }

    pub async fn scrape_enthusiast(&mut self, api: &ApiClient, query: &str, max_results: Option<u32>) {
        self.scrape(api, scrape_request(ScrapeKind::Enthusiast, query, None, max_results)).await;
    }

    pub async fn scrape_private_party(&mut self, api: &ApiClient, query: &str, location: Option<String>, max_results: Option<u32>) {
        self.scrape(api, scrape_request(ScrapeKind::PrivateParty, query, location, max_results)).await;
    }

    pub async fn load_available_sources(&mut self, api: &ApiClient) {
        self.run(api, Request::Health(HealthProbe::Sources)).await;
    }

    pub async fn test_scrapers(&mut self, api: &ApiClient) {
        self.run(api, Request::Health(HealthProbe::Test)).await;
    }

    /// Flip the bookmark on `vehicle_id`. Storage failures are logged only.
    pub async fn toggle_saved(&mut self, vehicle_id: &str) {
        match self.saved.toggle(vehicle_id).await {
            Ok(saved) => debug!(vehicle_id, saved, "saved set toggled"),
            Err(e) => warn!(vehicle_id, "Failed to persist saved vehicles: {e}"),
        }
    }
}

fn scrape_request(kind: ScrapeKind, query: &str, location: Option<String>, max_results: Option<u32>) -> ScrapeRequest {
    let req = ScrapeRequest::new(kind, query, location);
    match max_results {
        Some(n) => req.with_max_results(n),
        None => req,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
