use super::ui;
use crate::core::{Market, MarketDataProvider};
use anyhow::Result;
use comfy_table::Cell;

pub fn display_markets(markets: &[Market]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Name"),
        ui::header_cell("Price"),
        ui::header_cell("Supply APY"),
        ui::header_cell("Borrow APY"),
        ui::header_cell("Liquidity"),
    ]);

    for market in markets {
        table.add_row(vec![
            Cell::new(&market.symbol),
            Cell::new(&market.name),
            ui::amount_cell(market.price),
            ui::rate_cell(market.supply_apy),
            ui::rate_cell(market.borrow_apy),
            ui::amount_cell(market.liquidity),
        ]);
    }

    format!(
        "{}\n{}",
        ui::style_text("Markets", ui::StyleType::Title),
        table
    )
}

pub async fn run(provider: &dyn MarketDataProvider) -> Result<()> {
    let markets = provider.markets().await?;
    println!("{}", display_markets(&markets));
    Ok(())
}
