use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::config::SAVED_VEHICLES_KEY;
use crate::db::local_store::LocalStore;
use crate::error::Result;

/// Personal bookmarks. Client-only: never sent to the backend and independent
/// of a vehicle's workflow status.
#[derive(Debug, Clone)]
pub struct SavedVehicles {
    ids: BTreeSet<String>,
    store: LocalStore,
}

impl SavedVehicles {
    /// Read the persisted set once. A missing or unreadable entry starts empty.
    pub async fn load(store: LocalStore) -> Self {
        let ids = match store.get(SAVED_VEHICLES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    warn!("Saved vehicles entry is not a JSON array of ids, starting empty: {e}");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read saved vehicles, starting empty: {e}");
                BTreeSet::new()
            }
        };
        info!("Loaded {} saved vehicles", ids.len());
        Self { ids, store }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flip membership of `id` and persist the whole set.
    /// Returns whether `id` is saved afterwards. The in-memory flip stands even
    /// if the write fails.
    pub async fn toggle(&mut self, id: &str) -> Result<bool> {
        let saved = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        };
        self.persist().await?;
        Ok(saved)
    }

    /// An empty set drops the key, so a never-used store and a cleared one look alike.
    async fn persist(&self) -> Result<()> {
        if self.ids.is_empty() {
            return self.store.remove(SAVED_VEHICLES_KEY).await;
        }
        let ids: Vec<&String> = self.ids.iter().collect();
        let raw = serde_json::to_string(&ids)?;
        self.store.set(SAVED_VEHICLES_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::local_store::tests::temp_store;

    #[tokio::test]
    async fn toggle_twice_round_trips_memory_and_storage() {
        let (_dir, store) = temp_store().await;
        store.set(SAVED_VEHICLES_KEY, r#"["keep"]"#).await.unwrap();
        let mut saved = SavedVehicles::load(store.clone()).await;

        assert!(saved.toggle("veh-1").await.unwrap());
        assert!(saved.contains("veh-1"));
        assert_eq!(
            store.get(SAVED_VEHICLES_KEY).await.unwrap().as_deref(),
            Some(r#"["keep","veh-1"]"#)
        );

        assert!(!saved.toggle("veh-1").await.unwrap());
        assert!(!saved.contains("veh-1"));
        assert!(saved.contains("keep"));
        assert_eq!(
            store.get(SAVED_VEHICLES_KEY).await.unwrap().as_deref(),
            Some(r#"["keep"]"#)
        );
    }

    #[tokio::test]
    async fn emptied_set_leaves_no_entry_behind() {
        let (_dir, store) = temp_store().await;
        let mut saved = SavedVehicles::load(store.clone()).await;

        saved.toggle("veh-9").await.unwrap();
        assert_eq!(
            store.get(SAVED_VEHICLES_KEY).await.unwrap().as_deref(),
            Some(r#"["veh-9"]"#)
        );
        saved.toggle("veh-9").await.unwrap();
        assert!(saved.is_empty());
        assert_eq!(store.get(SAVED_VEHICLES_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn survives_reload() {
        let (_dir, store) = temp_store().await;
        let mut saved = SavedVehicles::load(store.clone()).await;
        saved.toggle("a").await.unwrap();
        saved.toggle("b").await.unwrap();

        let reloaded = SavedVehicles::load(store).await;
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("a") && reloaded.contains("b"));
    }

    #[tokio::test]
    async fn corrupt_entry_starts_empty() {
        let (_dir, store) = temp_store().await;
        store.set(SAVED_VEHICLES_KEY, "{not json").await.unwrap();
        let saved = SavedVehicles::load(store).await;
        assert!(saved.is_empty());
    }
}
