pub mod filter;
pub mod scrape;
pub mod sort;
pub mod state;

pub use filter::Filters;
pub use sort::{SortDirection, SortField, SortState};
pub use state::Dashboard;
