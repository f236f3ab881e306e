//! Derived dashboard figures computed from a user's positions.
use crate::core::models::{BorrowingPosition, Dashboard, LendingPosition};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Share of supplied value that counts towards collateral.
pub const LIQUIDATION_THRESHOLD: Decimal = Decimal::from_parts(75, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_supplied: Decimal,
    pub total_borrowed: Decimal,
    pub net_worth: Decimal,
    pub supply_apy: Decimal,
    pub borrow_apy: Decimal,
    pub net_apy: Decimal,
    pub health_factor: Decimal,
}

impl DashboardMetrics {
    /// Aggregates amounts and rates over the dashboard rows.
    ///
    /// Rates are plain means over positions, not weighted by amount. The health
    /// factor is zero when nothing is borrowed.
    pub fn calculate(dashboard: &Dashboard) -> Self {
        Self::from_positions(&dashboard.lending, &dashboard.borrowing)
    }

    pub fn from_positions(lending: &[LendingPosition], borrowing: &[BorrowingPosition]) -> Self {
        let total_supplied: Decimal = lending.iter().map(|p| p.amount).sum();
        let total_borrowed: Decimal = borrowing.iter().map(|p| p.amount).sum();

        let supply_apy = mean(lending.iter().map(|p| p.apy));
        let borrow_apy = mean(borrowing.iter().map(|p| p.apy));

        let health_factor = if total_borrowed > Decimal::ZERO {
            (total_supplied * LIQUIDATION_THRESHOLD) / total_borrowed
        } else {
            Decimal::ZERO
        };

        let metrics = DashboardMetrics {
            total_supplied: total_supplied.normalize(),
            total_borrowed: total_borrowed.normalize(),
            net_worth: (total_supplied - total_borrowed).normalize(),
            supply_apy: supply_apy.normalize(),
            borrow_apy: borrow_apy.normalize(),
            net_apy: (supply_apy - borrow_apy).normalize(),
            health_factor: health_factor.normalize(),
        };
        debug!(?metrics, "Calculated dashboard metrics");
        metrics
    }
}

fn mean(values: impl Iterator<Item = Decimal>) -> Decimal {
    let (sum, count) = values.fold((Decimal::ZERO, 0usize), |(sum, count), v| {
        (sum + v, count + 1)
    });
    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count)
    }
}
