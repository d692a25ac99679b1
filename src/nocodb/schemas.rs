//! Column layouts for every table the migration manages.

use super::types::{ColumnDef, ColumnType, TableSchema};
use crate::ingestion::normalize::{SECTORS, SYMBOL_STRATEGIES};

pub const SYMBOLS: &str = "symbols";
pub const TRANSACTIONS: &str = "transactions";
pub const OPTIONS: &str = "options";
pub const DEPOSITS: &str = "deposits";
pub const DIVIDENDS: &str = "dividends";
pub const MONTHLY_SNAPSHOTS: &str = "monthly_snapshots";
pub const PRICE_HISTORY: &str = "price_history";
pub const SETTINGS: &str = "settings";

/// Canonical platform names as produced by the platform normalizer.
pub const PLATFORMS: &[&str] = &["IBKR", "Trading 212", "Freetrade", "Stake", "eToro", "Robinhood"];

const STRATEGY_TYPES: &[&str] = &["Wheel", "Collar", "VPCS", "PMCC", "LEAPS", "BET", "Hedge", "Spread"];

fn text(name: &str) -> ColumnDef {
    ColumnDef::new(name, ColumnType::SingleLineText)
}

fn decimal(name: &str) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Decimal)
}

fn number(name: &str) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Number)
}

fn date(name: &str) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Date)
}

pub fn symbols() -> TableSchema {
    TableSchema::new(
        SYMBOLS,
        vec![
            text("symbol"),
            text("name"),
            ColumnDef::select("sector", SECTORS),
            ColumnDef::select("strategy", SYMBOL_STRATEGIES),
            decimal("current_price"),
            decimal("previous_close"),
            decimal("change_pct"),
            decimal("day_high"),
            decimal("day_low"),
            decimal("year_high"),
            decimal("year_low"),
            number("market_cap"),
            decimal("pe_ratio"),
            decimal("eps"),
            decimal("dividend_yield"),
            number("avg_volume"),
            ColumnDef::new("last_price_update", ColumnType::DateTime),
        ],
    )
}

pub fn transactions() -> TableSchema {
    TableSchema::new(
        TRANSACTIONS,
        vec![
            text("symbol"),
            text("name"),
            ColumnDef::select("type", &["Buy", "Sell"]),
            decimal("price"),
            decimal("shares"),
            decimal("amount"),
            decimal("eps"),
            date("date"),
            ColumnDef::select("platform", PLATFORMS),
        ],
    )
}

pub fn options() -> TableSchema {
    TableSchema::new(
        OPTIONS,
        vec![
            text("ticker"),
            date("opened"),
            ColumnDef::select("strategy_type", STRATEGY_TYPES),
            ColumnDef::select("call_put", &["Call", "Put"]),
            ColumnDef::select("buy_sell", &["Buy", "Sell"]),
            date("expiration"),
            decimal("strike"),
            decimal("delta"),
            decimal("iv_pct"),
            ColumnDef::select("moneyness", &["OTM", "ATM", "ITM"]),
            number("qty"),
            decimal("premium"),
            decimal("collateral"),
            ColumnDef::select("status", &["Open", "Closed", "Expired", "Rolled", "Assigned"]),
            date("close_date"),
            decimal("close_premium"),
            decimal("profit"),
            number("days_held"),
            decimal("return_pct"),
            decimal("annualised_return_pct"),
            decimal("outer_strike"),
            decimal("commission"),
            ColumnDef::select("platform", PLATFORMS),
            ColumnDef::new("notes", ColumnType::LongText),
        ],
    )
}

pub fn deposits() -> TableSchema {
    TableSchema::new(
        DEPOSITS,
        vec![
            date("month"),
            decimal("amount"),
            ColumnDef::select("platform", PLATFORMS),
            decimal("amount_usd"),
        ],
    )
}

pub fn dividends() -> TableSchema {
    TableSchema::new(
        DIVIDENDS,
        vec![
            text("symbol"),
            decimal("amount"),
            date("date"),
            ColumnDef::select("platform", PLATFORMS),
        ],
    )
}

pub fn monthly_snapshots() -> TableSchema {
    TableSchema::new(
        MONTHLY_SNAPSHOTS,
        vec![
            date("month"),
            decimal("total_invested"),
            decimal("portfolio_value"),
            decimal("gain_loss"),
            decimal("gain_loss_pct"),
            decimal("dividend_income"),
            decimal("options_premium"),
            decimal("options_capital_gains"),
            decimal("total_deposits"),
        ],
    )
}

pub fn price_history() -> TableSchema {
    TableSchema::new(
        PRICE_HISTORY,
        vec![text("symbol"), date("date"), decimal("close_price"), number("volume")],
    )
}

pub fn settings() -> TableSchema {
    TableSchema::new(SETTINGS, vec![text("key"), text("value"), text("description")])
}

/// All managed tables, in creation order.
pub fn table_schemas() -> Vec<TableSchema> {
    vec![
        symbols(),
        transactions(),
        options(),
        deposits(),
        dividends(),
        monthly_snapshots(),
        price_history(),
        settings(),
    ]
}
