use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use folio_sync::backfill::RateTable;
use folio_sync::ingestion::JsonWorkbook;
use folio_sync::nocodb::{record_id, PageParams, Record, RecordPage, StoreError, TableMeta, TableSchema, TableStore, ID_FIELD};
use folio_sync::tiingo::{RateClientError, RateSource};

// ---------------------------------------------------------------------------
// In-memory table store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemTable {
    title: String,
    rows: Vec<Record>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, MemTable>,
    next_table: u32,
    create_calls: usize,
    get_calls: usize,
    insert_calls: usize,
    update_calls: usize,
    delete_calls: usize,
    fail_insert_on_call: Option<usize>,
}

/// A `TableStore` that keeps every table in memory and counts calls.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

fn not_found(table_id: &str) -> StoreError {
    StoreError::Status {
        method: "GET".into(),
        path: format!("/api/v2/tables/{table_id}/records"),
        status: 404,
        body: "table not found".into(),
    }
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&self, title: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_table += 1;
        let id = format!("m{:03}", state.next_table);
        state.tables.insert(
            id.clone(),
            MemTable {
                title: title.into(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
        id
    }

    /// Append raw records, assigning ids like the real store.
    pub fn seed(&self, table_id: &str, records: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        let table = state.tables.get_mut(table_id).expect("seeded table exists");
        for value in records {
            let Value::Object(mut record) = value else {
                panic!("seed records must be objects");
            };
            record.insert(ID_FIELD.into(), json!(table.next_id));
            table.next_id += 1;
            table.rows.push(record);
        }
    }

    pub fn records(&self, table_id: &str) -> Vec<Record> {
        let state = self.state.lock().unwrap();
        state.tables.get(table_id).map(|t| t.rows.clone()).unwrap_or_default()
    }

    pub fn table_id(&self, title: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .iter()
            .find(|(_, t)| t.title == title)
            .map(|(id, _)| id.clone())
    }

    pub fn records_by_title(&self, title: &str) -> Vec<Record> {
        self.table_id(title).map(|id| self.records(&id)).unwrap_or_default()
    }

    pub fn table_count(&self) -> usize {
        self.state.lock().unwrap().tables.len()
    }

    /// Fail the n-th insert call (1-based) with a 500.
    pub fn fail_insert_on_call(&self, n: usize) {
        self.state.lock().unwrap().fail_insert_on_call = Some(n);
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn list_tables(&self) -> Result<Vec<TableMeta>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .iter()
            .map(|(id, t)| TableMeta {
                id: id.clone(),
                title: t.title.clone(),
            })
            .collect())
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<TableMeta, StoreError> {
        self.state.lock().unwrap().create_calls += 1;
        let id = self.add_table(&schema.table_name);
        Ok(TableMeta {
            id,
            title: schema.table_name.clone(),
        })
    }

    async fn get_records(&self, table_id: &str, params: &PageParams) -> Result<RecordPage, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        let table = state.tables.get(table_id).ok_or_else(|| not_found(table_id))?;

        let total = table.rows.len();
        let start = (params.offset as usize).min(total);
        let end = (start + params.limit as usize).min(total);
        let list: Vec<_> = table.rows[start..end]
            .iter()
            .map(|row| match &params.fields {
                Some(fields) => row
                    .iter()
                    .filter(|(k, _)| fields.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                None => row.clone(),
            })
            .collect();

        let page: RecordPage = serde_json::from_value(json!({
            "list": list,
            "pageInfo": {
                "totalRows": total,
                "page": start / params.limit.max(1) as usize + 1,
                "pageSize": params.limit,
                "isFirstPage": start == 0,
                "isLastPage": end >= total
            }
        }))?;
        Ok(page)
    }

    async fn insert_records(&self, table_id: &str, records: &[Record]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_insert_on_call == Some(state.insert_calls) {
            return Err(StoreError::Status {
                method: "POST".into(),
                path: format!("/api/v2/tables/{table_id}/records"),
                status: 500,
                body: "boom".into(),
            });
        }

        let table = state.tables.get_mut(table_id).ok_or_else(|| not_found(table_id))?;
        for record in records {
            let mut row = record.clone();
            row.insert(ID_FIELD.into(), json!(table.next_id));
            table.next_id += 1;
            table.rows.push(row);
        }
        Ok(())
    }

    async fn update_records(&self, table_id: &str, records: &[Record]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        let table = state.tables.get_mut(table_id).ok_or_else(|| not_found(table_id))?;

        for update in records {
            let id = record_id(update).ok_or_else(|| StoreError::Unexpected("update without Id".into()))?;
            let row = table
                .rows
                .iter_mut()
                .find(|r| record_id(r) == Some(id))
                .ok_or_else(|| StoreError::Unexpected(format!("no record {id}")))?;
            for (k, v) in update {
                row.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    async fn delete_records(&self, table_id: &str, ids: &[i64]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        let table = state.tables.get_mut(table_id).ok_or_else(|| not_found(table_id))?;
        table.rows.retain(|r| record_id(r).is_none_or(|id| !ids.contains(&id)));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake rate source
// ---------------------------------------------------------------------------

#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeRates {
    rates: Vec<(NaiveDate, Decimal)>,
    calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

#[allow(dead_code)]
impl FakeRates {
    pub fn new(rates: &[(&str, &str)]) -> Self {
        Self {
            rates: rates
                .iter()
                .map(|(d, r)| (date(d), Decimal::from_str(r).unwrap()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateSource for FakeRates {
    async fn fetch_historical_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<RateTable, RateClientError> {
        self.calls.lock().unwrap().push((start, end));
        Ok(self
            .rates
            .iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .copied()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Workbook JSON with every table the migration reads.
#[allow(dead_code)]
pub fn workbook_json() -> Value {
    json!({
        "sheets": [
            {
                "name": "Portfolio",
                "tables": [{
                    "name": "Table 1",
                    "rows": [
                        ["Company Name", "Symbol", "Sector", "Strategy"],
                        ["Apple Inc", "AAPL", "Tech", "Growth"],
                        ["Microsoft", "MSFT", "technology", "value"],
                        ["Odd Co", "ODD", "Biotech", "Yolo"]
                    ]
                }]
            },
            {
                "name": "Transactions",
                "tables": [
                    {
                        "name": "Transactions",
                        "rows": [
                            ["Symbol", "Name", "Price", "Shares", "EPS", "Date", "Platform", "Amount"],
                            ["AAPL", "Apple Inc", 190.5, 10, 6.1, "2024-01-15", "Hood", 1905],
                            ["aapl", null, 200, -4, "-", "16/02/2024", "IBKR", "800.00"],
                            ["TSLA", "Tesla", 250, 2, null, "2024-03-01", "etoro", 500],
                            [null, null, null, null, null, null, null, null],
                            ["  ", "Blank", 1, 1, null, null, null, 1]
                        ]
                    },
                    {
                        "name": "Deposited",
                        "rows": [
                            ["Month", "Total", "IBKR", null, "Trading 212", "Freetrade", "Stake", "Etoro", "Hood"],
                            ["2024-01-01", 1500, 1000, null, 500, null, 0, "-", null],
                            [{"datetime": "2024-02-01T00:00:00"}, 300, null, null, null, null, null, null, 300],
                            ["Total", 1800, 1000, null, 500, null, null, null, 300]
                        ]
                    },
                    {
                        "name": "Montly Tracker",
                        "rows": [
                            ["Month", null, "Invested so far", "Portfolio Value", "Gain/Loss", "Dividend", "Options Capital", "Premium"],
                            ["2024-01-01", null, 1000, 1100, 100, 5, 20, 30],
                            ["2024-02-01", null, 2000, 1900, -100, 0, 0, 10],
                            ["Summary", null, 2000, 1900, -100, 5, 20, 40]
                        ]
                    }
                ]
            },
            {
                "name": "Options",
                "tables": [
                    {
                        "name": "Options Wheel Strategy",
                        "rows": [
                            ["Ticker", "Opened", "Strategy", "C / P", "Buy/Sell", "Expiration", "Strike", "Outer Strike",
                             "Qty", "Premium", "Collateral", "Status", "Commision", "Notes"],
                            ["TSLA", "2024-02-01", "Wheel", "P", "s", "2024-03-15", 180, null, 1, 3.4, 18000, "closed", 1.05, null],
                            ["NVDA", "2024-02-05", "Collar", "C", "b", "2024-04-19", 700, 650, 1, 5, null, "open", null, "hedged"]
                        ]
                    },
                    {
                        "name": "Options LEAPS",
                        "rows": [
                            ["Ticker", "Opened", "Strategy", "C/P", "Buy/Sell", "Strike", "Qty", "Profit Yield", "Status"],
                            ["msft", "2023-06-01", "leaps", "Call", "Buy", 300, 1, 0.25, "Open"]
                        ]
                    }
                ]
            }
        ]
    })
}

#[allow(dead_code)]
pub fn workbook() -> JsonWorkbook {
    JsonWorkbook::from_value(workbook_json()).unwrap()
}
