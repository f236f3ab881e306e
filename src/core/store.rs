//! Persistence abstraction for users, positions and the transaction log

use crate::core::models::{
    BorrowingPosition, LendingPosition, NewPosition, NewTransaction, PositionId, Transaction,
    UpsertUser, User,
};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Inserts the user or refreshes its profile fields.
    async fn upsert_user(&self, user: UpsertUser) -> Result<User>;

    async fn create_lending_position(
        &self,
        user_id: &str,
        position: NewPosition,
    ) -> Result<LendingPosition>;

    /// Positions in creation order.
    async fn get_lending_positions(&self, user_id: &str) -> Result<Vec<LendingPosition>>;

    /// Returns false if the user owns no position with this id.
    async fn delete_lending_position(&self, user_id: &str, id: PositionId) -> Result<bool>;

    async fn create_borrowing_position(
        &self,
        user_id: &str,
        position: NewPosition,
    ) -> Result<BorrowingPosition>;

    async fn get_borrowing_positions(&self, user_id: &str) -> Result<Vec<BorrowingPosition>>;

    async fn delete_borrowing_position(&self, user_id: &str, id: PositionId) -> Result<bool>;

    async fn create_transaction(
        &self,
        user_id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction>;

    /// Transactions ordered by creation time, oldest first.
    async fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;
}
