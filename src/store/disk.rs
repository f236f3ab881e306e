//! Persistent store on top of a fjall keyspace.
//!
//! Each table lives in its own partition. Rows are JSON encoded. Position and
//! transaction keys are `user id | 0x00 | row id (big endian)`, so a prefix
//! scan over one user yields rows in id order. HTTP sessions live in their
//! own partition keyed by session id.
use crate::core::models::{
    BorrowingPosition, LendingPosition, NewPosition, NewTransaction, PositionId, Transaction,
    UpsertUser, User,
};
use crate::core::store::PositionStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tracing::debug;

const USERS: &str = "users";
const LENDING: &str = "lending_positions";
const BORROWING: &str = "borrowing_positions";
const TRANSACTIONS: &str = "transactions";
const SEQUENCES: &str = "sequences";
const SESSIONS: &str = "sessions";

const KEY_SEPARATOR: u8 = 0;

pub struct DiskStore {
    keyspace: Arc<Keyspace>,
    users: PartitionHandle,
    lending: PartitionHandle,
    borrowing: PartitionHandle,
    transactions: PartitionHandle,
    sequences: PartitionHandle,
    sessions: PartitionHandle,
    // Serializes id allocation, read-modify-write updates and deletes
    write_lock: Mutex<()>,
}

impl fmt::Debug for DiskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskStore").finish_non_exhaustive()
    }
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let open = |name: &str| {
            keyspace
                .open_partition(name, PartitionCreateOptions::default())
                .with_context(|| format!("Failed to open partition {name}"))
        };

        let store = Self {
            users: open(USERS)?,
            lending: open(LENDING)?,
            borrowing: open(BORROWING)?,
            transactions: open(TRANSACTIONS)?,
            sequences: open(SEQUENCES)?,
            sessions: open(SESSIONS)?,
            keyspace: Arc::new(keyspace),
            write_lock: Mutex::new(()),
        };
        debug!("Opened disk store at {}", path.display());
        Ok(store)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Disk store write lock poisoned"))
    }

    fn next_id(&self, table: &str) -> Result<PositionId> {
        let current = match self.sequences.get(table.as_bytes())? {
            Some(bytes) => {
                let raw = <[u8; 8]>::try_from(&bytes[..])
                    .with_context(|| format!("Corrupt sequence for {table}"))?;
                PositionId::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        self.sequences
            .insert(table.as_bytes().to_vec(), next.to_be_bytes().to_vec())?;
        Ok(next)
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist keyspace")
    }

    fn insert_row<V: Serialize>(
        &self,
        partition: &PartitionHandle,
        table: &str,
        user_id: &str,
        build: impl FnOnce(PositionId) -> V,
    ) -> Result<V> {
        let row = {
            let _guard = self.lock()?;
            let id = self.next_id(table)?;
            let row = build(id);
            partition.insert(row_key(user_id, id), serde_json::to_vec(&row)?)?;
            debug!("{} INSERT id: {} for user: {}", table, id, user_id);
            row
        };
        self.persist()?;
        Ok(row)
    }

    fn remove_row(
        &self,
        partition: &PartitionHandle,
        table: &str,
        user_id: &str,
        id: PositionId,
    ) -> Result<bool> {
        let key = row_key(user_id, id);
        let removed = {
            let _guard = self.lock()?;
            if partition.contains_key(&key)? {
                partition.remove(key)?;
                true
            } else {
                false
            }
        };
        if removed {
            self.persist()?;
        }
        debug!("{} DELETE id: {} for user: {} (removed: {})", table, id, user_id, removed);
        Ok(removed)
    }

    fn create_session(&self, record: &mut Record) -> Result<()> {
        {
            let _guard = self.lock()?;
            while self.sessions.contains_key(session_key(&record.id))? {
                record.id = Id::default();
            }
            self.sessions
                .insert(session_key(&record.id), serde_json::to_vec(record)?)?;
        }
        self.persist()
    }

    fn save_session(&self, record: &Record) -> Result<()> {
        {
            let _guard = self.lock()?;
            self.sessions
                .insert(session_key(&record.id), serde_json::to_vec(record)?)?;
        }
        self.persist()
    }

    fn load_session(&self, id: &Id) -> Result<Option<Record>> {
        let Some(bytes) = self.sessions.get(session_key(id))? else {
            return Ok(None);
        };
        let record: Record =
            serde_json::from_slice(&bytes).context("Failed to decode stored session")?;
        if record.expiry_date > OffsetDateTime::now_utc() {
            Ok(Some(record))
        } else {
            self.delete_session(id)?;
            Ok(None)
        }
    }

    fn delete_session(&self, id: &Id) -> Result<()> {
        {
            let _guard = self.lock()?;
            self.sessions.remove(session_key(id))?;
        }
        self.persist()
    }

    fn purge_expired_sessions(&self) -> Result<usize> {
        let now = OffsetDateTime::now_utc();
        let purged = {
            let _guard = self.lock()?;
            let mut expired = Vec::new();
            for item in self.sessions.iter() {
                let (key, value) = item?;
                let record: Record =
                    serde_json::from_slice(&value).context("Failed to decode stored session")?;
                if record.expiry_date <= now {
                    expired.push(key.to_vec());
                }
            }
            for key in &expired {
                self.sessions.remove(key.clone())?;
            }
            expired.len()
        };
        if purged > 0 {
            self.persist()?;
        }
        Ok(purged)
    }
}

fn session_key(id: &Id) -> Vec<u8> {
    id.0.to_be_bytes().to_vec()
}

fn backend_error(error: anyhow::Error) -> session_store::Error {
    session_store::Error::Backend(format!("{error:#}"))
}

fn user_prefix(user_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.len() + 9);
    key.extend_from_slice(user_id.as_bytes());
    key.push(KEY_SEPARATOR);
    key
}

fn row_key(user_id: &str, id: PositionId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn scan_user<V: DeserializeOwned>(partition: &PartitionHandle, user_id: &str) -> Result<Vec<V>> {
    partition
        .prefix(user_prefix(user_id))
        .map(|item| {
            let (_, value) = item?;
            serde_json::from_slice(&value).context("Failed to decode stored row")
        })
        .collect()
}

#[async_trait]
impl PositionStore for DiskStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        match self.users.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Failed to decode stored user")?,
            )),
            None => Ok(None),
        }
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User> {
        let record = {
            let _guard = self.lock()?;
            let existing: Option<User> = match self.users.get(user.id.as_bytes())? {
                Some(bytes) => Some(serde_json::from_slice(&bytes)?),
                None => None,
            };
            let record = User::from_upsert(user, existing.as_ref(), Utc::now());
            self.users
                .insert(record.id.as_bytes().to_vec(), serde_json::to_vec(&record)?)?;
            record
        };
        self.persist()?;
        debug!("User UPSERT for id: {}", record.id);
        Ok(record)
    }

    async fn create_lending_position(
        &self,
        user_id: &str,
        position: NewPosition,
    ) -> Result<LendingPosition> {
        let now = Utc::now();
        self.insert_row(&self.lending, LENDING, user_id, |id| {
            LendingPosition::new(id, user_id, position, now)
        })
    }

    async fn get_lending_positions(&self, user_id: &str) -> Result<Vec<LendingPosition>> {
        scan_user(&self.lending, user_id)
    }

    async fn delete_lending_position(&self, user_id: &str, id: PositionId) -> Result<bool> {
        self.remove_row(&self.lending, LENDING, user_id, id)
    }

    async fn create_borrowing_position(
        &self,
        user_id: &str,
        position: NewPosition,
    ) -> Result<BorrowingPosition> {
        let now = Utc::now();
        self.insert_row(&self.borrowing, BORROWING, user_id, |id| {
            BorrowingPosition::new(id, user_id, position, now)
        })
    }

    async fn get_borrowing_positions(&self, user_id: &str) -> Result<Vec<BorrowingPosition>> {
        scan_user(&self.borrowing, user_id)
    }

    async fn delete_borrowing_position(&self, user_id: &str, id: PositionId) -> Result<bool> {
        self.remove_row(&self.borrowing, BORROWING, user_id, id)
    }

    async fn create_transaction(
        &self,
        user_id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction> {
        let now = Utc::now();
        self.insert_row(&self.transactions, TRANSACTIONS, user_id, |id| {
            Transaction::new(id, user_id, transaction, now)
        })
    }

    async fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut txns: Vec<Transaction> = scan_user(&self.transactions, user_id)?;
        txns.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(txns)
    }
}

#[async_trait]
impl SessionStore for DiskStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.create_session(record).map_err(backend_error)
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.save_session(record).map_err(backend_error)
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        self.load_session(id).map_err(backend_error)
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.delete_session(id).map_err(backend_error)
    }
}

#[async_trait]
impl ExpiredDeletion for DiskStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let purged = self.purge_expired_sessions().map_err(backend_error)?;
        debug!("Purged {} expired sessions", purged);
        Ok(())
    }
}
