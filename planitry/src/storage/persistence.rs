//! Collection persistence
//!
//! Stores a whole collection as one JSON array under a fixed key.
//! Saves are handed to a background writer task that waits for a quiet
//! period before writing, so bursts of edits cost one write.
//!
//! Loading never fails: unreadable data is dropped from the store and the
//! collection starts empty.

use super::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

enum WriteCommand {
    Write(Vec<u8>),
    Flush(oneshot::Sender<()>),
}

/// One persisted collection of `T`
pub struct PersistedCollection<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    writer: mpsc::UnboundedSender<WriteCommand>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PersistedCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create the adapter and start its writer task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str, debounce: Duration) -> Self {
        let (writer, commands) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&store), key, debounce, commands));

        Self {
            store,
            key,
            writer,
            _marker: PhantomData,
        }
    }

    /// Load the stored collection, or an empty one if nothing usable is stored
    pub async fn load(&self) -> Vec<T> {
        let bytes = match self.store.get(self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("No stored data for {}", self.key);
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.key, e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) => {
                tracing::debug!("Loaded {} records from {}", items.len(), self.key);
                items
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable data in {}: {}", self.key, e);
                if let Err(e) = self.store.remove(self.key).await {
                    tracing::error!("Failed to clear {}: {}", self.key, e);
                }
                Vec::new()
            }
        }
    }

    /// Schedule a write of `items`; replaces any snapshot still waiting
    pub fn save(&self, items: &[T]) {
        let bytes = match serde_json::to_vec(items) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to encode {}: {}", self.key, e);
                return;
            }
        };

        if self.writer.send(WriteCommand::Write(bytes)).is_err() {
            tracing::error!("Writer for {} has stopped; change not saved", self.key);
        }
    }

    /// Write any waiting snapshot now. The returned future resolves once it
    /// is stored and does not borrow the adapter.
    pub fn flush(&self) -> impl Future<Output = ()> + Send + 'static {
        let (ack, done) = oneshot::channel();
        let sent = self.writer.send(WriteCommand::Flush(ack)).is_ok();
        async move {
            if sent {
                let _ = done.await;
            }
        }
    }
}

async fn run_writer(
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    debounce: Duration,
    mut commands: mpsc::UnboundedReceiver<WriteCommand>,
) {
    let mut pending: Option<Vec<u8>> = None;

    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(debounce, commands.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    write(&*store, key, pending.take()).await;
                    continue;
                }
            }
        } else {
            commands.recv().await
        };

        match command {
            Some(WriteCommand::Write(bytes)) => pending = Some(bytes),
            Some(WriteCommand::Flush(ack)) => {
                write(&*store, key, pending.take()).await;
                let _ = ack.send(());
            }
            None => {
                // Adapter dropped
                write(&*store, key, pending.take()).await;
                break;
            }
        }
    }
}

async fn write(store: &dyn KeyValueStore, key: &str, bytes: Option<Vec<u8>>) {
    let Some(bytes) = bytes else {
        return;
    };

    match store.set(key, &bytes).await {
        Ok(()) => tracing::debug!("Wrote {} ({} bytes)", key, bytes.len()),
        Err(e) => tracing::error!("Failed to write {}: {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use crate::storage::MemoryStore;

    const KEY: &str = "testItems";

    fn create_test_collection() -> (PersistedCollection<Ingredient>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let collection = PersistedCollection::new(store.clone(), KEY, Duration::from_millis(500));
        (collection, store)
    }

    #[tokio::test]
    async fn test_missing_key_loads_empty() {
        let (collection, _store) = create_test_collection();
        assert!(collection.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let (collection, store) = create_test_collection();
        let items = vec![
            Ingredient::new("Rice", 2.0, "cups"),
            Ingredient::new("Beans", 1.5, "cans"),
        ];

        collection.save(&items);
        collection.flush().await;
        let first_write = store.get(KEY).await.unwrap().unwrap();

        let loaded = collection.load().await;
        assert_eq!(loaded, items);

        // Saving what was loaded stores the same bytes
        collection.save(&loaded);
        collection.flush().await;
        assert_eq!(store.get(KEY).await.unwrap().unwrap(), first_write);
    }

    #[tokio::test]
    async fn test_corrupt_data_loads_empty_and_is_cleared() {
        let (collection, store) = create_test_collection();
        store.set(KEY, b"{not valid json").await.unwrap();

        assert!(collection.load().await.is_empty());
        assert_eq!(store.get(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_schema_mismatch_loads_empty() {
        let (collection, store) = create_test_collection();
        store
            .set(KEY, br#"[{"name":"Rice","qty":"lots"}]"#)
            .await
            .unwrap();

        assert!(collection.load().await.is_empty());
        assert_eq!(store.get(KEY).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_saves_coalesce_into_one_write() {
        let (collection, store) = create_test_collection();
        let mut items = Vec::new();

        for name in ["Salt", "Pepper", "Oregano"] {
            items.push(Ingredient::new(name, 1.0, "jar"));
            collection.save(&items);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(store.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(collection.load().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_after_quiet_period_write_again() {
        let (collection, store) = create_test_collection();

        collection.save(&[Ingredient::new("Flour", 1.0, "kg")]);
        tokio::time::sleep(Duration::from_millis(600)).await;
        collection.save(&[]);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(store.write_count(), 2);
        assert!(collection.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_drop_writes_pending_snapshot() {
        let (collection, store) = create_test_collection();

        collection.save(&[Ingredient::new("Butter", 250.0, "g")]);
        drop(collection);

        for _ in 0..50 {
            if store.write_count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.write_count(), 1);
    }
}
