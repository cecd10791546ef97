pub mod local_store;
pub mod models;
pub mod saved;

pub use local_store::LocalStore;
pub use saved::SavedVehicles;
