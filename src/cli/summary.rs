use super::ui;
use crate::core::{Dashboard, DashboardMetrics, PositionStore, ledger};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl Dashboard {
    pub fn display_as_tables(&self) -> String {
        let mut lending = ui::new_styled_table();
        lending.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Asset"),
            ui::header_cell("Supplied"),
            ui::header_cell("APY"),
        ]);
        for position in &self.lending {
            lending.add_row(vec![
                Cell::new(position.id),
                Cell::new(&position.asset),
                ui::amount_cell(position.amount),
                ui::rate_cell(position.apy),
            ]);
        }

        let mut borrowing = ui::new_styled_table();
        borrowing.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Asset"),
            ui::header_cell("Borrowed"),
            ui::header_cell("APY"),
            ui::header_cell("Health"),
        ]);
        for position in &self.borrowing {
            borrowing.add_row(vec![
                Cell::new(position.id),
                Cell::new(&position.asset),
                ui::amount_cell(position.amount),
                ui::rate_cell(position.apy),
                ui::format_optional_cell(position.health_factor, |h| format!("{h:.2}")),
            ]);
        }

        let mut output = format!("{}\n", ui::style_text("Supplied", ui::StyleType::Title));
        output.push_str(&lending.to_string());
        output.push_str(&format!(
            "\n\n{}\n",
            ui::style_text("Borrowed", ui::StyleType::Title)
        ));
        output.push_str(&borrowing.to_string());

        if let Some(latest) = self.transactions.last() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(
                    &format!(
                        "{} transactions, latest {} {} {} at {}",
                        self.transactions.len(),
                        latest.kind,
                        latest.amount.normalize(),
                        latest.asset,
                        latest.created_at.format("%Y-%m-%d %H:%M")
                    ),
                    ui::StyleType::Subtle
                )
            ));
        }
        output
    }
}

impl DashboardMetrics {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Supplied"),
            ui::header_cell("Borrowed"),
            ui::header_cell("Supply APY"),
            ui::header_cell("Borrow APY"),
            ui::header_cell("Net APY"),
            ui::header_cell("Health Factor"),
        ]);
        table.add_row(vec![
            ui::amount_cell(self.total_supplied),
            ui::amount_cell(self.total_borrowed),
            ui::rate_cell(self.supply_apy),
            ui::rate_cell(self.borrow_apy),
            ui::rate_cell(self.net_apy),
            ui::health_factor_cell(self.health_factor),
        ]);

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Net Worth", ui::StyleType::TotalLabel),
            ui::style_text(&self.net_worth.to_string(), ui::StyleType::TotalValue)
        ));
        output
    }
}

/// Prints the stored positions and derived metrics of one user.
pub async fn run(store: &dyn PositionStore, user_id: &str) -> Result<()> {
    let user = store
        .get_user(user_id)
        .await
        .with_context(|| format!("Failed to look up user {user_id}"))?;
    let dashboard = ledger::load_dashboard(store, user_id).await?;
    let metrics = DashboardMetrics::calculate(&dashboard);

    let name = user.map_or_else(|| user_id.to_string(), |u| u.display_name());
    println!(
        "Dashboard: {}\n",
        ui::style_text(&name, ui::StyleType::Title)
    );
    println!("{}", dashboard.display_as_tables());
    ui::print_separator();
    println!("{}", metrics.display_as_table());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewPosition;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    fn position(asset: &str, amount: rust_decimal::Decimal) -> NewPosition {
        NewPosition {
            asset: asset.to_string(),
            amount,
            apy: dec!(3.20),
            health_factor: None,
        }
    }

    #[tokio::test]
    async fn test_dashboard_tables_list_positions() -> Result<()> {
        let store = MemoryStore::new();
        ledger::supply(&store, "u1", position("ETH", dec!(2.5))).await?;
        ledger::borrow(&store, "u1", position("USDC", dec!(1000))).await?;

        let dashboard = ledger::load_dashboard(&store, "u1").await?;
        let output = dashboard.display_as_tables();
        assert!(output.contains("ETH"));
        assert!(output.contains("2.5"));
        assert!(output.contains("USDC"));
        assert!(output.contains("2 transactions"));
        Ok(())
    }

    #[test]
    fn test_metrics_table_shows_net_worth() {
        let metrics = DashboardMetrics::from_positions(&[], &[]);
        let output = metrics.display_as_table();
        assert!(output.contains("Health Factor"));
        assert!(output.contains("Net Worth"));
    }
}
