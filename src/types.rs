use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// A listing as served by `/api/deals`, `/api/search` and the scrape endpoints.
/// Every field decodes leniently: the backend owns the schema and scraped
/// records are frequently partial.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Vehicle {
    #[serde(default, deserialize_with = "de::opaque_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub make: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub model: String,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub distance_miles: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_seller_type")]
    pub seller_type: Option<SellerType>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub asking_price: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub market_value: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub transport_cost: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub est_profit: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub roi_percent: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub flip_score: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_status")]
    pub status: ListingStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date_listed: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub images: Vec<String>,
}

impl Vehicle {
    /// "2021 Ram 1500 TRX", skipping whatever is missing.
    pub fn title(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if let Some(y) = self.year {
            parts.push(y.to_string());
        }
        for s in [self.make.as_str(), self.model.as_str(), self.trim.as_deref().unwrap_or("")] {
            if !s.trim().is_empty() {
                parts.push(s.trim().to_string());
            }
        }
        parts.join(" ")
    }

    pub fn source_label(&self) -> &str {
        self.source.as_deref().filter(|s| !s.is_empty()).unwrap_or("unknown")
    }

    pub fn seller_label(&self) -> SellerType {
        self.seller_type.unwrap_or(SellerType::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerType {
    Private,
    Dealer,
    Auction,
    Unknown,
}

impl SellerType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "private" | "private_party" | "private party" => SellerType::Private,
            "dealer" | "dealership" => SellerType::Dealer,
            "auction" => SellerType::Auction,
            _ => SellerType::Unknown,
        }
    }
}

impl std::fmt::Display for SellerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SellerType::Private => "private",
            SellerType::Dealer => "dealer",
            SellerType::Auction => "auction",
            SellerType::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Workflow status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    New,
    Watching,
    Contacted,
    Negotiating,
    Purchased,
    ListedForSale,
    Sold,
    Passed,
}

impl ListingStatus {
    /// Statuses a user can pick from the dashboard, in workflow order.
    pub const SELECTABLE: [ListingStatus; 6] = [
        ListingStatus::New,
        ListingStatus::Watching,
        ListingStatus::Contacted,
        ListingStatus::Negotiating,
        ListingStatus::Purchased,
        ListingStatus::Passed,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let status = match s.trim().to_lowercase().as_str() {
            "new" => ListingStatus::New,
            "watching" => ListingStatus::Watching,
            "contacted" => ListingStatus::Contacted,
            "negotiating" => ListingStatus::Negotiating,
            "purchased" => ListingStatus::Purchased,
            "listed_for_sale" => ListingStatus::ListedForSale,
            "sold" => ListingStatus::Sold,
            "passed" => ListingStatus::Passed,
            _ => return None,
        };
        Some(status)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::New => "new",
            ListingStatus::Watching => "watching",
            ListingStatus::Contacted => "contacted",
            ListingStatus::Negotiating => "negotiating",
            ListingStatus::Purchased => "purchased",
            ListingStatus::ListedForSale => "listed_for_sale",
            ListingStatus::Sold => "sold",
            ListingStatus::Passed => "passed",
        }
    }

    /// Next selectable status, wrapping. Backend-only statuses step back to `Watching`.
    pub fn next(self) -> Self {
        match Self::SELECTABLE.iter().position(|s| *s == self) {
            Some(i) => Self::SELECTABLE[(i + 1) % Self::SELECTABLE.len()],
            None => ListingStatus::Watching,
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of `PUT /api/vehicles/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VehicleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
}

// ---------------------------------------------------------------------------
// Trends & stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrendTile {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub make_model: String,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub total_listings: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub avg_price: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub price_change_percent: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub avg_days_on_market: Option<i64>,
}

impl TrendTile {
    pub fn is_rising(&self) -> bool {
        self.price_change_percent.unwrap_or(0.0) >= 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stats {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub deal_opportunities: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub total_vehicles: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub avg_profit: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub sources_tracked: Option<i64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

// ---------------------------------------------------------------------------
// Scrapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub vehicles_found: Option<i64>,
    /// Seconds the backend spent scraping.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub vehicles: Vec<Vehicle>,
    /// Platform → vehicles contributed (or a richer object on some backends).
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub source_results: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub errors: BTreeMap<String, Value>,
}

impl ScrapeResponse {
    pub fn source_count(&self) -> usize {
        self.source_results.len()
    }

    pub fn vehicle_count(&self) -> usize {
        match self.vehicles_found {
            Some(n) if n >= 0 => n as usize,
            _ => self.vehicles.len(),
        }
    }
}

/// One row of scraper availability, from either `/scrape/test` or `/scrape/sources`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceHealth {
    pub available: bool,
    pub detail: Option<String>,
}

/// Source name → availability, ordered by name.
pub type ScraperHealth = BTreeMap<String, SourceHealth>;

/// Accepts the shapes the backend has served for scraper health:
/// `{source: bool}`, `{source: {..metadata..}}`, `{"sources": [...]}` and bare arrays.
pub fn parse_scraper_health(v: &Value) -> ScraperHealth {
    let mut out = ScraperHealth::new();
    match v {
        Value::Object(map) => {
            if let Some(inner) = map.get("sources").filter(|s| s.is_array() || s.is_object()) {
                return parse_scraper_health(inner);
            }
            for (name, entry) in map {
                out.insert(name.clone(), source_health_entry(entry));
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(name) => {
                        out.insert(name.clone(), SourceHealth { available: true, detail: None });
                    }
                    Value::Object(obj) => {
                        let name = obj
                            .get("name")
                            .or_else(|| obj.get("source"))
                            .and_then(|n| n.as_str());
                        if let Some(name) = name {
                            out.insert(name.to_string(), source_health_entry(item));
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    out
}

fn source_health_entry(entry: &Value) -> SourceHealth {
    match entry {
        Value::Bool(b) => SourceHealth { available: *b, detail: None },
        Value::Object(obj) => {
            let available = ["available", "working", "enabled", "status"]
                .iter()
                .find_map(|k| obj.get(*k))
                .map(|v| match v {
                    Value::Bool(b) => *b,
                    Value::String(s) => matches!(s.as_str(), "ok" | "available" | "working" | "active"),
                    _ => true,
                })
                .unwrap_or(true);
            let detail = ["description", "type", "category", "display_name"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
                .map(|s| s.to_string());
            SourceHealth { available, detail }
        }
        Value::String(s) => SourceHealth { available: true, detail: Some(s.clone()) },
        _ => SourceHealth { available: false, detail: None },
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{ListingStatus, SellerType};

    /// Number coercion: null is absent, numeric strings parse, anything else is 0.
    pub fn number(v: &Value) -> Option<f64> {
        match v {
            Value::Null => None,
            Value::Number(n) => n.as_f64(),
            Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(0.0)),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => Some(0.0),
        }
    }

    pub fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(number(&v).filter(|n| n.is_finite()))
    }

    pub fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(number(&v).filter(|n| n.is_finite()).map(|n| n as i64))
    }

    pub fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Ids are opaque: `7` and `"7"` are the same vehicle.
    pub fn opaque_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        lenient_string(d)
    }

    pub fn lenient_status<'de, D: Deserializer<'de>>(d: D) -> Result<ListingStatus, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str().and_then(ListingStatus::parse).unwrap_or_default())
    }

    pub fn lenient_seller_type<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<SellerType>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(SellerType::parse(&s)),
            _ => Some(SellerType::Unknown),
        })
    }

    pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}
