use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::lifecycle::{commit, is_terminal};
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

const ORDERS_KEY: &str = "orders";

/// Opaque key/value persistence. No transactions, no durability promises.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    fn clear(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.blobs.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        self.blobs.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), AppError> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|err| {
            AppError::Internal(format!("failed to create {}: {err}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Internal(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|err| AppError::Internal(format!("failed to write {}: {err}", path.display())))
    }

    fn clear(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(AppError::Internal(
                format!("failed to clear {key}: {err}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Registry of placed orders. Status writes only ever move forward.
#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn get(&self, id: &Uuid) -> Result<Order, AppError> {
        self.orders
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))
    }

    pub fn list(&self) -> Vec<Order> {
        self.orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn active(&self) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|entry| !is_terminal(entry.value().status))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|entry| !is_terminal(entry.value().status))
            .count()
    }

    /// Records `computed` if it is ahead of the cached status. Returns the
    /// previous status when a transition was written.
    pub fn commit_status(
        &self,
        id: &Uuid,
        computed: OrderStatus,
    ) -> Result<Option<OrderStatus>, AppError> {
        let mut entry = self
            .orders
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

        let previous = entry.status;
        let next = commit(previous, computed);
        if next == previous {
            return Ok(None);
        }

        entry.status = next;
        Ok(Some(previous))
    }

    pub fn save_to(&self, blobs: &dyn BlobStore) -> Result<(), AppError> {
        let orders = self.list();
        let raw = serde_json::to_string(&orders)
            .map_err(|err| AppError::Internal(format!("failed to encode orders: {err}")))?;
        blobs.set(ORDERS_KEY, raw)?;

        info!(orders = orders.len(), "orders saved");
        Ok(())
    }

    /// Restores saved orders one record at a time, skipping any that fail validation.
    pub fn load_from(&self, blobs: &dyn BlobStore) -> Result<usize, AppError> {
        let Some(raw) = blobs.get(ORDERS_KEY)? else {
            return Ok(0);
        };

        let records: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|err| AppError::Internal(format!("failed to decode orders: {err}")))?;

        let mut restored = 0;
        for record in records {
            let order = match serde_json::from_value::<Order>(record) {
                Ok(order) => order,
                Err(err) => {
                    warn!(error = %err, "skipping undecodable saved order");
                    continue;
                }
            };
            if let Err(err) = order.validate() {
                warn!(order_id = %order.id, error = %err, "skipping malformed saved order");
                continue;
            }
            self.insert(order);
            restored += 1;
        }

        info!(orders = restored, "orders restored");
        Ok(restored)
    }

    pub fn clear_saved(blobs: &dyn BlobStore) -> Result<(), AppError> {
        blobs.clear(ORDERS_KEY)
    }
}
