use std::collections::HashMap;

use rust_decimal::Decimal;

use super::sheet::Cell;

/// Strategy forced whenever a position carries an outer strike.
pub const OUTER_STRIKE_STRATEGY: &str = "VPCS";

/// Strategy used when the sheet leaves the column blank.
pub const DEFAULT_STRATEGY: &str = "Wheel";

const PLATFORM_ALIASES: &[(&str, &str)] = &[
    ("Etoro", "eToro"),
    ("etoro", "eToro"),
    ("eToro", "eToro"),
    ("Hood", "Robinhood"),
    ("hood", "Robinhood"),
    ("Robinhood", "Robinhood"),
    ("Trading 212", "Trading 212"),
    ("trading 212", "Trading 212"),
    ("IBKR", "IBKR"),
    ("ibkr", "IBKR"),
    ("Freetrade", "Freetrade"),
    ("freetrade", "Freetrade"),
    ("Stake", "Stake"),
    ("stake", "Stake"),
];

const OPTION_STRATEGIES: &[&str] = &["Wheel", "Collar", "VPCS", "PMCC", "LEAPS", "BET", "Hedge"];

const OPTION_STATUSES: &[&str] = &["Open", "Closed", "Expired", "Rolled", "Assigned"];

pub const SECTORS: &[&str] = &[
    "Tech",
    "Financial",
    "Retail",
    "Communication",
    "Healthcare",
    "Energy",
    "Industrial",
    "Real Estate",
    "ETF",
    "Crypto",
    "Consumer",
    "Technology",
];

pub const SYMBOL_STRATEGIES: &[&str] = &["Growth", "Value", "Risky"];

/// Canonical-value tables for the free-text categorical columns.
///
/// Pure lookup data; build one and pass it to the record builders.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Exact (trimmed) spelling → canonical platform.
    platforms: HashMap<String, String>,
    /// Lower-cased keys → canonical value for the remaining maps.
    strategies: HashMap<String, String>,
    statuses: HashMap<String, String>,
    sectors: HashMap<String, String>,
    symbol_strategies: HashMap<String, String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            platforms: PLATFORM_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            strategies: lowercase_index(OPTION_STRATEGIES),
            statuses: lowercase_index(OPTION_STATUSES),
            sectors: lowercase_index(SECTORS),
            symbol_strategies: lowercase_index(SYMBOL_STRATEGIES),
        }
    }
}

fn lowercase_index(values: &[&str]) -> HashMap<String, String> {
    values
        .iter()
        .map(|v| (v.to_lowercase(), v.to_string()))
        .collect()
}

impl Normalizer {
    /// Replace the platform alias table (exact-match keys).
    pub fn with_platforms(mut self, aliases: HashMap<String, String>) -> Self {
        self.platforms = aliases;
        self
    }

    /// Replace the option strategy table. Keys are matched lower-cased.
    pub fn with_strategies(mut self, aliases: HashMap<String, String>) -> Self {
        self.strategies = aliases
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        self
    }

    pub fn platform(&self, raw: &Cell) -> Option<String> {
        let s = raw.as_text()?;
        Some(self.platforms.get(&s).cloned().unwrap_or(s))
    }

    pub fn strategy(&self, raw: &Cell, outer_strike: Option<Decimal>) -> String {
        if outer_strike.is_some() {
            return OUTER_STRIKE_STRATEGY.to_string();
        }
        match raw.as_text() {
            None => DEFAULT_STRATEGY.to_string(),
            Some(s) => self.strategies.get(&s.to_lowercase()).cloned().unwrap_or(s),
        }
    }

    pub fn status(&self, raw: &Cell) -> Option<String> {
        let s = raw.as_text()?;
        Some(self.statuses.get(&s.to_lowercase()).cloned().unwrap_or(s))
    }

    /// Sector from the fixed set, matched case-insensitively.
    pub fn sector(&self, raw: &Cell) -> Option<String> {
        let s = raw.as_text()?;
        self.sectors.get(&s.to_lowercase()).cloned()
    }

    pub fn symbol_strategy(&self, raw: &Cell) -> Option<String> {
        let s = raw.as_text()?;
        self.symbol_strategies.get(&s.to_lowercase()).cloned()
    }
}

pub fn call_put(raw: &Cell) -> Option<String> {
    let s = raw.as_text()?;
    Some(match s.to_lowercase().as_str() {
        "call" | "c" => "Call".to_string(),
        "put" | "p" => "Put".to_string(),
        _ => s,
    })
}

pub fn buy_sell(raw: &Cell) -> Option<String> {
    let s = raw.as_text()?;
    Some(match s.to_lowercase().as_str() {
        "buy" | "b" => "Buy".to_string(),
        "sell" | "s" => "Sell".to_string(),
        _ => s,
    })
}

/// OTM/ATM/ITM or nothing. The sheet uses "-" and stray numbers for unset.
pub fn moneyness(raw: &Cell) -> Option<String> {
    let s = raw.as_text()?.to_uppercase();
    match s.as_str() {
        "OTM" | "ATM" | "ITM" => Some(s),
        _ => None,
    }
}
