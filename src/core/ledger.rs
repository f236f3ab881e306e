//! Position lifecycle operations shared by the HTTP handlers and the CLI.
use crate::core::models::{
    BorrowingPosition, Dashboard, LendingPosition, NewPosition, NewTransaction, TransactionKind,
};
use crate::core::store::PositionStore;
use anyhow::{Context, Result};
use tracing::info;

/// Records a supply: stores the lending position and logs a `supply` entry.
pub async fn supply(
    store: &dyn PositionStore,
    user_id: &str,
    position: NewPosition,
) -> Result<LendingPosition> {
    let entry = NewTransaction {
        kind: TransactionKind::Supply,
        asset: position.asset.clone(),
        amount: position.amount,
    };
    let created = store
        .create_lending_position(user_id, position)
        .await
        .context("Failed to store lending position")?;
    store
        .create_transaction(user_id, entry)
        .await
        .context("Failed to log supply transaction")?;
    info!(user_id, id = created.id, asset = %created.asset, amount = %created.amount, "Supplied");
    Ok(created)
}

/// Records a borrow: stores the borrowing position and logs a `borrow` entry.
pub async fn borrow(
    store: &dyn PositionStore,
    user_id: &str,
    position: NewPosition,
) -> Result<BorrowingPosition> {
    let entry = NewTransaction {
        kind: TransactionKind::Borrow,
        asset: position.asset.clone(),
        amount: position.amount,
    };
    let created = store
        .create_borrowing_position(user_id, position)
        .await
        .context("Failed to store borrowing position")?;
    store
        .create_transaction(user_id, entry)
        .await
        .context("Failed to log borrow transaction")?;
    info!(user_id, id = created.id, asset = %created.asset, amount = %created.amount, "Borrowed");
    Ok(created)
}

/// Loads the three dashboard lists concurrently.
pub async fn load_dashboard(store: &dyn PositionStore, user_id: &str) -> Result<Dashboard> {
    let (lending, borrowing, transactions) = futures::try_join!(
        store.get_lending_positions(user_id),
        store.get_borrowing_positions(user_id),
        store.get_transactions(user_id),
    )
    .context("Failed to load dashboard")?;

    Ok(Dashboard {
        lending,
        borrowing,
        transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    fn eth(amount: rust_decimal::Decimal) -> NewPosition {
        NewPosition {
            asset: "ETH".to_string(),
            amount,
            apy: dec!(3.20),
            health_factor: None,
        }
    }

    #[tokio::test]
    async fn test_supply_logs_one_transaction() {
        let store = MemoryStore::new();
        let created = supply(&store, "u1", eth(dec!(2.5))).await.unwrap();

        let txns = store.get_transactions("u1").await.unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].kind, TransactionKind::Supply);
        assert_eq!(txns[0].asset, "ETH");
        assert_eq!(txns[0].amount, created.amount);
    }

    #[tokio::test]
    async fn test_borrow_logs_one_transaction() {
        let store = MemoryStore::new();
        borrow(&store, "u1", eth(dec!(1))).await.unwrap();

        let txns = store.get_transactions("u1").await.unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].kind, TransactionKind::Borrow);
    }

    #[tokio::test]
    async fn test_load_dashboard_is_per_user() {
        let store = MemoryStore::new();
        supply(&store, "u1", eth(dec!(1))).await.unwrap();
        borrow(&store, "u1", eth(dec!(0.5))).await.unwrap();
        supply(&store, "u2", eth(dec!(9))).await.unwrap();

        let dashboard = load_dashboard(&store, "u1").await.unwrap();
        assert_eq!(dashboard.lending.len(), 1);
        assert_eq!(dashboard.borrowing.len(), 1);
        assert_eq!(dashboard.transactions.len(), 2);
        assert_eq!(
            dashboard.transactions[0].kind,
            TransactionKind::Supply,
            "transactions are ordered oldest first"
        );

        let empty = load_dashboard(&store, "nobody").await.unwrap();
        assert_eq!(empty, Dashboard::default());
    }
}
