pub mod disk;
pub mod memory;

use crate::core::config::{AppConfig, StorageBackend};
use crate::core::store::PositionStore;
use anyhow::Result;
use async_trait::async_trait;
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tracing::info;

/// HTTP session storage backed by the same backend as the positions.
#[derive(Debug, Clone)]
pub enum SessionBackend {
    Memory(MemoryStore),
    Disk(Arc<DiskStore>),
}

#[async_trait]
impl SessionStore for SessionBackend {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        match self {
            SessionBackend::Memory(store) => store.create(record).await,
            SessionBackend::Disk(store) => store.create(record).await,
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            SessionBackend::Memory(store) => store.save(record).await,
            SessionBackend::Disk(store) => store.save(record).await,
        }
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            SessionBackend::Memory(store) => store.load(id).await,
            SessionBackend::Disk(store) => store.load(id).await,
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        match self {
            SessionBackend::Memory(store) => store.delete(id).await,
            SessionBackend::Disk(store) => store.delete(id).await,
        }
    }
}

#[async_trait]
impl ExpiredDeletion for SessionBackend {
    async fn delete_expired(&self) -> session_store::Result<()> {
        match self {
            SessionBackend::Memory(store) => store.delete_expired().await,
            SessionBackend::Disk(store) => store.delete_expired().await,
        }
    }
}

/// Position and session storage opened from one backend.
pub struct Stores {
    pub positions: Arc<dyn PositionStore>,
    pub sessions: SessionBackend,
}

impl Stores {
    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Stores {
            positions: Arc::new(store.clone()),
            sessions: SessionBackend::Memory(store),
        }
    }
}

/// Opens the store selected by the configuration.
pub fn open(config: &AppConfig) -> Result<Stores> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store, data is lost on exit");
            Ok(Stores::memory())
        }
        StorageBackend::Disk => {
            let path = config.default_data_path()?.join("store");
            info!("Using disk store at {}", path.display());
            let store = Arc::new(DiskStore::open(&path)?);
            Ok(Stores {
                positions: store.clone(),
                sessions: SessionBackend::Disk(store),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = AppConfig {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            ..Default::default()
        };
        let stores = open(&config).unwrap();
        assert!(stores.positions.get_user("missing").await.unwrap().is_none());
        assert!(matches!(stores.sessions, SessionBackend::Memory(_)));
    }

    #[tokio::test]
    async fn test_open_disk_backend_under_data_path() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            data_path: Some(dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let stores = open(&config).unwrap();
        assert!(
            stores
                .positions
                .get_lending_positions("u1")
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(stores.sessions, SessionBackend::Disk(_)));
        assert!(dir.path().join("store").exists());
    }
}
