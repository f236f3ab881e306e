use crate::core::models::{
    BorrowingPosition, LendingPosition, NewPosition, NewTransaction, PositionId, Transaction,
    UpsertUser, User,
};
use crate::core::store::PositionStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    sessions: HashMap<Id, Record>,
    lending: BTreeMap<PositionId, LendingPosition>,
    borrowing: BTreeMap<PositionId, BorrowingPosition>,
    transactions: BTreeMap<PositionId, Transaction>,
    lending_seq: PositionId,
    borrowing_seq: PositionId,
    transactions_seq: PositionId,
}

fn next_id(seq: &mut PositionId) -> PositionId {
    *seq += 1;
    *seq
}

/// In-memory store implementation using BTreeMaps behind a single Mutex
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Creates a new, empty MemoryStore
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let tables = self.inner.lock().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User> {
        let mut tables = self.inner.lock().await;
        let existing = tables.users.get(&user.id).cloned();
        let record = User::from_upsert(user, existing.as_ref(), Utc::now());
        debug!("User UPSERT for id: {}", record.id);
        tables.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn create_lending_position(
        &self,
        user_id: &str,
        position: NewPosition,
    ) -> Result<LendingPosition> {
        let mut tables = self.inner.lock().await;
        let id = next_id(&mut tables.lending_seq);
        let row = LendingPosition::new(id, user_id, position, Utc::now());
        debug!("Lending INSERT id: {} for user: {}", id, user_id);
        tables.lending.insert(id, row.clone());
        Ok(row)
    }

    async fn get_lending_positions(&self, user_id: &str) -> Result<Vec<LendingPosition>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .lending
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_lending_position(&self, user_id: &str, id: PositionId) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        let owned = tables.lending.get(&id).is_some_and(|p| p.user_id == user_id);
        if owned {
            tables.lending.remove(&id);
        }
        debug!("Lending DELETE id: {} for user: {} (removed: {})", id, user_id, owned);
        Ok(owned)
    }

    async fn create_borrowing_position(
        &self,
        user_id: &str,
        position: NewPosition,
    ) -> Result<BorrowingPosition> {
        let mut tables = self.inner.lock().await;
        let id = next_id(&mut tables.borrowing_seq);
        let row = BorrowingPosition::new(id, user_id, position, Utc::now());
        debug!("Borrowing INSERT id: {} for user: {}", id, user_id);
        tables.borrowing.insert(id, row.clone());
        Ok(row)
    }

    async fn get_borrowing_positions(&self, user_id: &str) -> Result<Vec<BorrowingPosition>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .borrowing
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_borrowing_position(&self, user_id: &str, id: PositionId) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        let owned = tables
            .borrowing
            .get(&id)
            .is_some_and(|p| p.user_id == user_id);
        if owned {
            tables.borrowing.remove(&id);
        }
        debug!("Borrowing DELETE id: {} for user: {} (removed: {})", id, user_id, owned);
        Ok(owned)
    }

    async fn create_transaction(
        &self,
        user_id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction> {
        let mut tables = self.inner.lock().await;
        let id = next_id(&mut tables.transactions_seq);
        let row = Transaction::new(id, user_id, transaction, Utc::now());
        debug!("Transaction INSERT id: {} ({}) for user: {}", id, row.kind, user_id);
        tables.transactions.insert(id, row.clone());
        Ok(row)
    }

    async fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let tables = self.inner.lock().await;
        let mut txns: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        txns.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(txns)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut tables = self.inner.lock().await;
        while tables.sessions.contains_key(&record.id) {
            record.id = Id::default();
        }
        tables.sessions.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut tables = self.inner.lock().await;
        tables.sessions.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let mut tables = self.inner.lock().await;
        match tables.sessions.get(id) {
            Some(record) if record.expiry_date > OffsetDateTime::now_utc() => {
                Ok(Some(record.clone()))
            }
            Some(_) => {
                tables.sessions.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.inner.lock().await.sessions.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemoryStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut tables = self.inner.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, record| record.expiry_date > now);
        debug!("Purged {} expired sessions", before - tables.sessions.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TransactionKind;
    use rust_decimal_macros::dec;

    fn position(asset: &str) -> NewPosition {
        NewPosition {
            asset: asset.to_string(),
            amount: dec!(1.00000000),
            apy: dec!(2.00),
            health_factor: Some(dec!(1.50)),
        }
    }

    #[tokio::test]
    async fn test_upsert_user_inserts_then_updates() {
        let store = MemoryStore::new();
        assert!(store.get_user("u1").await.unwrap().is_none());

        let created = store
            .upsert_user(UpsertUser {
                id: "u1".to_string(),
                email: Some("a@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let updated = store
            .upsert_user(UpsertUser {
                id: "u1".to_string(),
                email: Some("b@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(
            store.get_user("u1").await.unwrap().unwrap().email.as_deref(),
            Some("b@example.com")
        );
    }

    #[tokio::test]
    async fn test_positions_listed_in_creation_order() {
        let store = MemoryStore::new();
        store.create_lending_position("u1", position("ETH")).await.unwrap();
        store.create_lending_position("u2", position("DAI")).await.unwrap();
        store.create_lending_position("u1", position("USDC")).await.unwrap();

        let assets: Vec<_> = store
            .get_lending_positions("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| (p.id, p.asset))
            .collect();
        assert_eq!(assets, vec![(1, "ETH".to_string()), (3, "USDC".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let row = store
            .create_borrowing_position("u1", position("USDC"))
            .await
            .unwrap();
        assert_eq!(row.health_factor, Some(dec!(1.50)));

        assert!(!store.delete_borrowing_position("u2", row.id).await.unwrap());
        assert_eq!(store.get_borrowing_positions("u1").await.unwrap().len(), 1);

        assert!(store.delete_borrowing_position("u1", row.id).await.unwrap());
        assert!(!store.delete_borrowing_position("u1", row.id).await.unwrap());
        assert!(store.get_borrowing_positions("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sequences_are_per_table() {
        let store = MemoryStore::new();
        let lend = store.create_lending_position("u1", position("ETH")).await.unwrap();
        let borrow = store
            .create_borrowing_position("u1", position("ETH"))
            .await
            .unwrap();
        let txn = store
            .create_transaction(
                "u1",
                NewTransaction {
                    kind: TransactionKind::Supply,
                    asset: "ETH".to_string(),
                    amount: dec!(1),
                },
            )
            .await
            .unwrap();
        assert_eq!((lend.id, borrow.id, txn.id), (1, 1, 1));
    }

    fn session(expires_in: time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_expired_sessions_are_purged() {
        let store = MemoryStore::new();
        let mut active = session(time::Duration::hours(1));
        let mut expired = session(time::Duration::minutes(-1));
        store.create(&mut active).await.unwrap();
        store.create(&mut expired).await.unwrap();
        assert_eq!(store.inner.lock().await.sessions.len(), 2);

        store.delete_expired().await.unwrap();

        let tables = store.inner.lock().await;
        assert_eq!(tables.sessions.len(), 1);
        assert!(tables.sessions.contains_key(&active.id));
    }

    #[tokio::test]
    async fn test_loading_expired_session_drops_it() {
        let store = MemoryStore::new();
        let mut expired = session(time::Duration::seconds(-5));
        store.create(&mut expired).await.unwrap();

        assert!(store.load(&expired.id).await.unwrap().is_none());
        assert!(store.inner.lock().await.sessions.is_empty());
    }
}
