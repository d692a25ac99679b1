use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as the store sees it: column name → JSON value.
pub type Record = Map<String, Value>;

/// Name of the auto-incrementing identity column on every table.
pub const ID_FIELD: &str = "Id";

// ---------------------------------------------------------------------------
// Schema (meta API)
// ---------------------------------------------------------------------------

/// NocoDB UI data type tag for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "ID")]
    Id,
    SingleLineText,
    LongText,
    SingleSelect,
    Decimal,
    Number,
    Date,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub uidt: ColumnType,
    /// Physical type, only set for the identity column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<String>,
    /// Select options, formatted as `'A','B'`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtxp: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pk: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ai: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rqd: bool,
}

impl ColumnDef {
    pub fn new(name: &str, uidt: ColumnType) -> Self {
        Self {
            column_name: name.into(),
            title: None,
            uidt,
            dt: None,
            dtxp: None,
            pk: false,
            ai: false,
            rqd: false,
        }
    }

    /// Auto-incrementing primary key column.
    pub fn identity() -> Self {
        Self {
            title: Some(ID_FIELD.into()),
            dt: Some("int4".into()),
            pk: true,
            ai: true,
            rqd: true,
            ..Self::new(ID_FIELD, ColumnType::Id)
        }
    }

    pub fn select(name: &str, options: &[&str]) -> Self {
        let dtxp = options
            .iter()
            .map(|o| format!("'{o}'"))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            dtxp: Some(dtxp),
            ..Self::new(name, ColumnType::SingleSelect)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Schema with the identity column prepended.
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        let mut all = vec![ColumnDef::identity()];
        all.extend(columns);
        Self {
            table_name: name.into(),
            columns: all,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableMeta {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableList {
    #[serde(default)]
    pub list: Vec<TableMeta>,
}

// ---------------------------------------------------------------------------
// Records (data API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: u32,
    pub offset: u32,
    pub fields: Option<Vec<String>>,
}

impl PageParams {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.limit.to_string()), ("offset", self.offset.to_string())];
        if let Some(fields) = &self.fields {
            query.push(("fields", fields.join(",")));
        }
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub is_first_page: Option<bool>,
    #[serde(default)]
    pub is_last_page: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub list: Vec<Record>,
    #[serde(default, rename = "pageInfo")]
    pub page_info: PageInfo,
}

impl RecordPage {
    pub fn is_last(&self) -> bool {
        self.list.is_empty() || self.page_info.is_last_page == Some(true)
    }
}

/// Identity of a record, pulled from its `Id` field.
pub fn record_id(record: &Record) -> Option<i64> {
    match record.get(ID_FIELD)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
