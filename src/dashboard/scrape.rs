use std::time::Duration;

use crate::config::{QUICK_SCRAPE_MESSAGE_SECS, SCRAPE_MESSAGE_SECS};
use crate::types::{ScrapeResponse, SellerType, Vehicle};

/// The live-scrape endpoints the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeKind {
    /// Fast pass over the main marketplaces.
    Quick,
    /// Every configured platform; reports per-platform counts.
    Comprehensive,
    /// Enthusiast auction sites. Nationwide, so no location.
    Enthusiast,
    /// Private-party classifieds only.
    PrivateParty,
}

impl ScrapeKind {
    pub fn path(&self) -> &'static str {
        match self {
            ScrapeKind::Quick => "/scrape/quick",
            ScrapeKind::Comprehensive => "/scrape/comprehensive",
            ScrapeKind::Enthusiast => "/scrape/enthusiast",
            ScrapeKind::PrivateParty => "/scrape/private-party",
        }
    }

    pub fn default_max_results(&self) -> u32 {
        match self {
            ScrapeKind::Quick => 15,
            ScrapeKind::Comprehensive => 20,
            ScrapeKind::Enthusiast => 15,
            ScrapeKind::PrivateParty => 25,
        }
    }

    /// Seller type assumed for scraped records that arrive without one.
    pub fn default_seller_type(&self) -> SellerType {
        match self {
            ScrapeKind::Quick | ScrapeKind::Comprehensive => SellerType::Unknown,
            ScrapeKind::Enthusiast => SellerType::Auction,
            ScrapeKind::PrivateParty => SellerType::Private,
        }
    }

    pub fn uses_location(&self) -> bool {
        !matches!(self, ScrapeKind::Enthusiast)
    }

    /// How long the outcome message stays up.
    pub fn message_ttl(&self) -> Duration {
        match self {
            ScrapeKind::Quick => Duration::from_secs(QUICK_SCRAPE_MESSAGE_SECS),
            _ => Duration::from_secs(SCRAPE_MESSAGE_SECS),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScrapeKind::Quick => "Quick",
            ScrapeKind::Comprehensive => "Comprehensive",
            ScrapeKind::Enthusiast => "Enthusiast",
            ScrapeKind::PrivateParty => "Private-party",
        }
    }
}

impl std::fmt::Display for ScrapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScrapeKind::Quick => "quick",
            ScrapeKind::Comprehensive => "comprehensive",
            ScrapeKind::Enthusiast => "enthusiast",
            ScrapeKind::PrivateParty => "private-party",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    pub kind: ScrapeKind,
    pub query: String,
    pub location: Option<String>,
    pub max_results: u32,
}

impl ScrapeRequest {
    pub fn new(kind: ScrapeKind, query: impl Into<String>, location: Option<String>) -> Self {
        Self {
            kind,
            query: query.into().trim().to_string(),
            location: location.filter(|_| kind.uses_location()),
            max_results: kind.default_max_results(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.query.clone())];
        if let Some(loc) = self.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            params.push(("location", loc.to_string()));
        }
        params.push(("max_results", self.max_results.to_string()));
        params
    }
}

/// Fill the fields scraped records commonly lack.
pub fn normalize(kind: ScrapeKind, vehicles: Vec<Vehicle>) -> Vec<Vehicle> {
    vehicles
        .into_iter()
        .map(|mut v| {
            if v.seller_type.is_none() {
                v.seller_type = Some(kind.default_seller_type());
            }
            if v.source.as_deref().map_or(true, |s| s.trim().is_empty()) {
                v.source = Some("unknown".to_string());
            }
            v
        })
        .collect()
}

pub fn in_progress_message(req: &ScrapeRequest) -> String {
    match req.location.as_deref().filter(|l| !l.trim().is_empty()) {
        Some(loc) => format!("{} scrape for \"{}\" near {} in progress…", req.kind.label(), req.query, loc),
        None => format!("{} scrape for \"{}\" in progress…", req.kind.label(), req.query),
    }
}

pub fn success_message(kind: ScrapeKind, resp: &ScrapeResponse) -> String {
    format!(
        "{} scrape: {} vehicles from {} sources in {:.1}s",
        kind.label(),
        resp.vehicle_count(),
        resp.source_count(),
        resp.duration.unwrap_or(0.0),
    )
}

pub fn failure_message(kind: ScrapeKind) -> String {
    format!("{} scrape failed; keeping current results", kind.label())
}
