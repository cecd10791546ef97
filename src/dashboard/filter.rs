use crate::types::Vehicle;

/// User-entered filters. `search` forwards all of them to the backend; the
/// price/year/profit subset is also applied locally to whatever list is loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub zip_code: Option<String>,
    /// Radius around `zip_code`, in miles.
    pub distance: Option<u32>,
    pub price_max: Option<f64>,
    pub year_min: Option<i64>,
    pub min_profit: Option<f64>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        *self == Filters::default()
    }

    /// Query parameters for `/api/search`; unset filters are omitted.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(zip) = self.zip_code.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
            params.push(("zip_code", zip.to_string()));
        }
        if let Some(d) = self.distance {
            params.push(("distance", d.to_string()));
        }
        if let Some(p) = self.price_max {
            params.push(("price_max", p.to_string()));
        }
        if let Some(y) = self.year_min {
            params.push(("year_min", y.to_string()));
        }
        if let Some(m) = self.min_profit {
            params.push(("min_profit", m.to_string()));
        }
        params
    }

    /// Local predicate. Zip code and distance are server-only.
    pub fn matches(&self, v: &Vehicle) -> bool {
        if let (Some(max), Some(price)) = (self.price_max, v.asking_price) {
            if price > max {
                return false;
            }
        }
        if let (Some(min), Some(year)) = (self.year_min, v.year) {
            if year < min {
                return false;
            }
        }
        if let Some(min) = self.min_profit {
            if v.est_profit.unwrap_or(0.0) < min {
                return false;
            }
        }
        true
    }
}

/// Keep the vehicles that pass `filters`, preserving order.
pub fn filter_vehicles<'a>(list: &'a [Vehicle], filters: &Filters) -> Vec<&'a Vehicle> {
    list.iter().filter(|v| filters.matches(v)).collect()
}
