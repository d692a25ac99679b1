//! Historical FX backfill for `deposits.amount_usd`.
//!
//! Pure planning logic: given the persisted deposits and a rate table, decide
//! which records need a new converted amount. Network I/O lives in the
//! deposit backfill service.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;

use crate::ingestion::coerce::to_decimal;
use crate::ingestion::sheet::Cell;
use crate::nocodb::types::{record_id, Record, ID_FIELD};

/// Calendar days to walk back from a date with no quote (weekends, holidays).
pub const MAX_LOOKBACK_DAYS: u64 = 5;

/// Days fetched before the earliest deposit so its lookback has data.
pub const WINDOW_LEAD_DAYS: u64 = 7;

/// Stored values closer than this to the computed value are left alone.
pub const CHANGE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

// ---------------------------------------------------------------------------
// RateTable
// ---------------------------------------------------------------------------

/// Daily closing rates keyed by calendar day. Built once, read-only after.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<NaiveDate, Decimal>,
}

impl FromIterator<(NaiveDate, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

impl RateTable {
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn exact(&self, date: NaiveDate) -> Option<Decimal> {
        self.rates.get(&date).copied()
    }

    /// Rate on `date`, else the nearest earlier day within
    /// [`MAX_LOOKBACK_DAYS`].
    pub fn lookup(&self, date: NaiveDate) -> Option<Decimal> {
        (0..=MAX_LOOKBACK_DAYS)
            .filter_map(|offset| date.checked_sub_days(Days::new(offset)))
            .find_map(|day| self.exact(day))
    }
}

// ---------------------------------------------------------------------------
// Deposits
// ---------------------------------------------------------------------------

/// A deposit as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDeposit {
    pub id: i64,
    pub month: Option<NaiveDate>,
    pub amount: Decimal,
    pub platform: Option<String>,
    pub amount_usd: Option<Decimal>,
}

impl StoredDeposit {
    /// `None` when the record has no usable `Id`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record_id(record)?;
        let field = |name: &str| record.get(name).map(Cell::from).unwrap_or_default();

        let month = record
            .get("month")
            .and_then(|v| v.as_str())
            .and_then(|s| s.get(..10))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        Some(Self {
            id,
            month,
            amount: to_decimal(&field("amount"), Some(Decimal::ZERO)).unwrap_or_default(),
            platform: field("platform").as_text(),
            amount_usd: to_decimal(&field("amount_usd"), None),
        })
    }
}

/// Outcome of converting one stored deposit at a given rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// New value to write.
    Update(Decimal),
    /// Stored value is already within [`CHANGE_EPSILON`].
    Unchanged,
    /// `amount × rate` does not fit in a `Decimal`.
    Overflow,
}

pub fn compute_update(deposit: &StoredDeposit, rate: Decimal) -> Conversion {
    let Some(converted) = deposit.amount.checked_mul(rate) else {
        return Conversion::Overflow;
    };
    let converted = converted.round_dp(2);
    match deposit.amount_usd.and_then(|old| old.checked_sub(converted)) {
        Some(diff) if diff.abs() < CHANGE_EPSILON => Conversion::Unchanged,
        _ => Conversion::Update(converted),
    }
}

/// Date range for the single bulk rate fetch: a week before the earliest
/// deposit month through `today`. `None` when no deposit has a month.
pub fn fetch_window(deposits: &[StoredDeposit], today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let earliest = deposits.iter().filter_map(|d| d.month).min()?;
    let start = earliest
        .checked_sub_days(Days::new(WINDOW_LEAD_DAYS))
        .unwrap_or(earliest);
    Some((start, today))
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DepositUpdate {
    pub id: i64,
    pub month: NaiveDate,
    pub platform: Option<String>,
    pub amount: Decimal,
    pub rate: Decimal,
    pub amount_usd: Decimal,
}

impl DepositUpdate {
    /// Partial-update body: identity plus the converted amount only.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(ID_FIELD.into(), json!(self.id));
        record.insert("amount_usd".into(), json!(self.amount_usd));
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoMonth,
    NoRate,
    Overflow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDeposit {
    pub id: i64,
    pub month: Option<NaiveDate>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillPlan {
    pub updates: Vec<DepositUpdate>,
    /// Deposits whose stored value is already correct.
    pub unchanged: usize,
    pub skipped: Vec<SkippedDeposit>,
    /// Rate resolved for each distinct deposit month.
    pub month_rates: BTreeMap<NaiveDate, Option<Decimal>>,
    pub total_amount: Decimal,
    /// New value where updated, else the stored value.
    pub total_converted: Decimal,
    /// Deposits that contribute nothing to `total_converted`.
    pub unconverted: usize,
    /// A total hit the `Decimal` range and stopped accumulating.
    pub totals_overflowed: bool,
}

impl BackfillPlan {
    pub fn update_records(&self) -> Vec<Record> {
        self.updates.iter().map(DepositUpdate::to_record).collect()
    }

    pub fn matched_months(&self) -> usize {
        self.month_rates.values().filter(|r| r.is_some()).count()
    }

    fn add_amount(&mut self, value: Decimal) {
        match self.total_amount.checked_add(value) {
            Some(total) => self.total_amount = total,
            None => self.totals_overflowed = true,
        }
    }

    fn add_converted(&mut self, value: Decimal) {
        match self.total_converted.checked_add(value) {
            Some(total) => self.total_converted = total,
            None => self.totals_overflowed = true,
        }
    }

    fn skip(&mut self, deposit: &StoredDeposit, reason: SkipReason) {
        self.skipped.push(SkippedDeposit {
            id: deposit.id,
            month: deposit.month,
            reason,
        });
        match deposit.amount_usd {
            Some(old) => self.add_converted(old),
            None => self.unconverted += 1,
        }
    }
}

pub fn plan_backfill(deposits: &[StoredDeposit], rates: &RateTable) -> BackfillPlan {
    let mut plan = BackfillPlan::default();

    for month in deposits.iter().filter_map(|d| d.month) {
        plan.month_rates.entry(month).or_insert_with(|| rates.lookup(month));
    }

    for deposit in deposits {
        plan.add_amount(deposit.amount);

        let rate = deposit
            .month
            .and_then(|m| plan.month_rates.get(&m).copied().flatten());

        let (month, rate) = match (deposit.month, rate) {
            (Some(month), Some(rate)) => (month, rate),
            (None, _) => {
                plan.skip(deposit, SkipReason::NoMonth);
                continue;
            }
            (Some(_), None) => {
                plan.skip(deposit, SkipReason::NoRate);
                continue;
            }
        };

        match compute_update(deposit, rate) {
            Conversion::Update(amount_usd) => {
                plan.add_converted(amount_usd);
                plan.updates.push(DepositUpdate {
                    id: deposit.id,
                    month,
                    platform: deposit.platform.clone(),
                    amount: deposit.amount,
                    rate,
                    amount_usd,
                });
            }
            Conversion::Unchanged => {
                plan.unchanged += 1;
                plan.add_converted(deposit.amount_usd.unwrap_or_default());
            }
            Conversion::Overflow => plan.skip(deposit, SkipReason::Overflow),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deposit(id: i64, month: Option<NaiveDate>, amount: &str, usd: Option<&str>) -> StoredDeposit {
        StoredDeposit {
            id,
            month,
            amount: dec(amount),
            platform: Some("IBKR".into()),
            amount_usd: usd.map(dec),
        }
    }

    #[test]
    fn test_lookup_walks_back_to_prior_trading_day() {
        // 2024-06-01 is a Saturday.
        let rates: RateTable = [(day(2024, 5, 31), dec("1.2740"))].into_iter().collect();
        assert_eq!(rates.lookup(day(2024, 6, 1)), Some(dec("1.2740")));
        assert_eq!(rates.lookup(day(2024, 6, 5)), Some(dec("1.2740")));
        assert_eq!(rates.lookup(day(2024, 6, 6)), None);
        assert_eq!(rates.lookup(day(2024, 5, 30)), None);
    }

    #[test]
    fn test_compute_update_rounds_to_cents() {
        let d = deposit(1, Some(day(2024, 1, 1)), "1000.00", None);
        assert_eq!(compute_update(&d, dec("1.3456")), Conversion::Update(dec("1345.60")));
    }

    #[test]
    fn test_compute_update_epsilon() {
        let month = Some(day(2024, 1, 1));
        let rate = dec("1.3456");
        assert_eq!(
            compute_update(&deposit(1, month, "1000", Some("1345.59")), rate),
            Conversion::Update(dec("1345.60"))
        );
        assert_eq!(
            compute_update(&deposit(1, month, "1000", Some("1345.601")), rate),
            Conversion::Unchanged
        );
        assert_eq!(
            compute_update(&deposit(1, month, "1000", Some("1345.60")), rate),
            Conversion::Unchanged
        );
    }

    #[test]
    fn test_negative_amount_converts() {
        let d = deposit(1, Some(day(2024, 1, 1)), "-250.00", None);
        assert_eq!(compute_update(&d, dec("1.25")), Conversion::Update(dec("-312.50")));
    }

    #[test]
    fn test_compute_update_overflow() {
        let mut d = deposit(1, Some(day(2024, 1, 1)), "1", None);
        d.amount = Decimal::MAX;
        assert_eq!(compute_update(&d, dec("1.25")), Conversion::Overflow);

        // Stored value far from the new one, subtraction would overflow.
        let mut d = deposit(2, Some(day(2024, 1, 1)), "1000", None);
        d.amount_usd = Some(Decimal::MIN);
        assert_eq!(
            compute_update(&d, dec("1.3456")),
            Conversion::Update(dec("1345.60"))
        );
    }

    #[test]
    fn test_plan_survives_extreme_amounts() {
        let rates: RateTable = [(day(2024, 1, 1), dec("1.25"))].into_iter().collect();
        let mut huge = deposit(1, Some(day(2024, 1, 1)), "1", None);
        huge.amount = Decimal::MAX;
        let mut stored = deposit(2, Some(day(2024, 1, 1)), "1", None);
        stored.amount = Decimal::MAX;
        stored.amount_usd = Some(Decimal::MAX);
        let deposits = vec![huge, stored, deposit(3, Some(day(2024, 1, 1)), "100", None)];

        let plan = plan_backfill(&deposits, &rates);

        assert_eq!(plan.skipped.len(), 2);
        assert!(plan.skipped.iter().all(|s| s.reason == SkipReason::Overflow));
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, 3);
        assert_eq!(plan.unconverted, 1);
        assert!(plan.totals_overflowed);
        assert_eq!(plan.total_amount, Decimal::MAX);
    }

    #[test]
    fn test_fetch_window() {
        let deposits = vec![
            deposit(1, Some(day(2024, 3, 1)), "10", None),
            deposit(2, Some(day(2023, 1, 1)), "10", None),
            deposit(3, None, "10", None),
        ];
        let today = day(2024, 6, 1);
        assert_eq!(fetch_window(&deposits, today), Some((day(2022, 12, 25), today)));
        assert_eq!(fetch_window(&[deposit(4, None, "1", None)], today), None);
    }

    #[test]
    fn test_plan_counts_and_totals() {
        let rates: RateTable = [(day(2024, 1, 1), dec("1.25"))].into_iter().collect();
        let deposits = vec![
            deposit(1, Some(day(2024, 1, 1)), "100", None),
            deposit(2, Some(day(2024, 1, 1)), "200", Some("250.00")),
            deposit(3, Some(day(2020, 1, 1)), "50", Some("60.00")),
            deposit(4, None, "10", None),
        ];

        let plan = plan_backfill(&deposits, &rates);

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, 1);
        assert_eq!(plan.updates[0].amount_usd, dec("125.00"));
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.skipped.len(), 2);
        assert_eq!(plan.skipped[0].reason, SkipReason::NoRate);
        assert_eq!(plan.skipped[1].reason, SkipReason::NoMonth);
        assert_eq!(plan.matched_months(), 1);
        assert_eq!(plan.total_amount, dec("360"));
        assert_eq!(plan.total_converted, dec("435.00"));
        assert_eq!(plan.unconverted, 1);
    }

    #[test]
    fn test_stored_deposit_from_record() {
        let record: Record = serde_json::from_value(json!({
            "Id": 7,
            "month": "2024-02-01T00:00:00.000Z",
            "amount": "1,500.50",
            "platform": "Trading 212",
            "amount_usd": null
        }))
        .unwrap();

        let d = StoredDeposit::from_record(&record).unwrap();
        assert_eq!(d.id, 7);
        assert_eq!(d.month, Some(day(2024, 2, 1)));
        assert_eq!(d.amount, dec("1500.50"));
        assert_eq!(d.amount_usd, None);

        let no_id: Record = serde_json::from_value(json!({"month": "2024-02-01"})).unwrap();
        assert!(StoredDeposit::from_record(&no_id).is_none());
    }

    #[test]
    fn test_update_record_body() {
        let update = DepositUpdate {
            id: 3,
            month: day(2024, 1, 1),
            platform: None,
            amount: dec("1000"),
            rate: dec("1.3456"),
            amount_usd: dec("1345.60"),
        };
        let record = update.to_record();
        assert_eq!(record.len(), 2);
        assert_eq!(record[ID_FIELD], json!(3));
        assert_eq!(record["amount_usd"].as_f64(), Some(1345.6));
    }
}
