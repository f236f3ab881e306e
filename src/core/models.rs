//! Row types shared by the stores, the HTTP API and the terminal views.
//!
//! All types serialize with camelCase keys. Decimal columns serialize as
//! strings carrying their column scale, so an amount of one hundred is
//! rendered as `"100.00000000"` and an APY of five as `"5.00"`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Fractional digits kept for asset amounts.
pub const AMOUNT_SCALE: u32 = 8;
/// Fractional digits kept for APY and health factor values.
pub const RATE_SCALE: u32 = 2;

pub type PositionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds the stored record for an identity. An existing record keeps its
    /// creation time, everything else is replaced.
    pub fn from_upsert(identity: UpsertUser, existing: Option<&User>, now: DateTime<Utc>) -> Self {
        User {
            id: identity.id,
            email: identity.email,
            first_name: identity.first_name,
            last_name: identity.last_name,
            profile_image_url: identity.profile_image_url,
            created_at: existing.map_or(now, |user| user.created_at),
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone().unwrap_or_else(|| self.id.clone()),
        }
    }
}

/// Identity claims received on login.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingPosition {
    pub id: PositionId,
    pub user_id: String,
    pub asset: String,
    pub amount: Decimal,
    pub apy: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LendingPosition {
    pub fn new(id: PositionId, user_id: &str, position: NewPosition, now: DateTime<Utc>) -> Self {
        LendingPosition {
            id,
            user_id: user_id.to_string(),
            asset: position.asset,
            amount: position.amount,
            apy: position.apy,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingPosition {
    pub id: PositionId,
    pub user_id: String,
    pub asset: String,
    pub amount: Decimal,
    pub apy: Decimal,
    pub health_factor: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BorrowingPosition {
    pub fn new(id: PositionId, user_id: &str, position: NewPosition, now: DateTime<Utc>) -> Self {
        BorrowingPosition {
            id,
            user_id: user_id.to_string(),
            asset: position.asset,
            amount: position.amount,
            apy: position.apy,
            health_factor: position.health_factor,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated position ready to be stored. Decimals already carry their
/// column scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPosition {
    pub asset: String,
    pub amount: Decimal,
    pub apy: Decimal,
    pub health_factor: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Supply,
    Borrow,
    Repay,
    Withdraw,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TransactionKind::Supply => "supply",
                TransactionKind::Borrow => "borrow",
                TransactionKind::Repay => "repay",
                TransactionKind::Withdraw => "withdraw",
            }
        )
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supply" => Ok(TransactionKind::Supply),
            "borrow" => Ok(TransactionKind::Borrow),
            "repay" => Ok(TransactionKind::Repay),
            "withdraw" => Ok(TransactionKind::Withdraw),
            _ => Err(anyhow::anyhow!("Invalid transaction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: PositionId,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub asset: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: PositionId,
        user_id: &str,
        transaction: NewTransaction,
        now: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id,
            user_id: user_id.to_string(),
            kind: transaction.kind,
            asset: transaction.asset,
            amount: transaction.amount,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub asset: String,
    pub amount: Decimal,
}

/// Everything the dashboard shows for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub lending: Vec<LendingPosition>,
    pub borrowing: Vec<BorrowingPosition>,
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lending_position_serializes_with_column_scale() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut amount = dec!(100);
        amount.rescale(AMOUNT_SCALE);
        let mut apy = dec!(5);
        apy.rescale(RATE_SCALE);
        let position = LendingPosition::new(
            7,
            "user-1",
            NewPosition {
                asset: "ETH".to_string(),
                amount,
                apy,
                health_factor: None,
            },
            now,
        );

        let json = serde_json::to_value(&position).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["amount"], "100.00000000");
        assert_eq!(json["apy"], "5.00");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_transaction_kind_uses_type_key() {
        let now = Utc::now();
        let txn = Transaction::new(
            1,
            "user-1",
            NewTransaction {
                kind: TransactionKind::Borrow,
                asset: "USDC".to_string(),
                amount: dec!(25.5),
            },
            now,
        );
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["type"], "borrow");
        assert_eq!(json["asset"], "USDC");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, txn);
    }

    #[test]
    fn test_transaction_kind_from_str() {
        assert_eq!("Supply".parse::<TransactionKind>().unwrap(), TransactionKind::Supply);
        assert_eq!("repay".parse::<TransactionKind>().unwrap(), TransactionKind::Repay);
        assert!("deposit".parse::<TransactionKind>().is_err());
        assert_eq!(TransactionKind::Withdraw.to_string(), "withdraw");
    }

    #[test]
    fn test_upsert_keeps_creation_time() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let identity = UpsertUser {
            id: "abc".to_string(),
            email: Some("alex@example.com".to_string()),
            ..Default::default()
        };
        let created = User::from_upsert(identity.clone(), None, first);
        let updated = User::from_upsert(
            UpsertUser {
                first_name: Some("Alex".to_string()),
                ..identity
            },
            Some(&created),
            later,
        );

        assert_eq!(updated.created_at, first);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.display_name(), "Alex");
        assert_eq!(created.display_name(), "alex@example.com");
    }
}
