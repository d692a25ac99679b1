use serde::Deserialize;

/// One resampled bar from the FX prices endpoint. Only the fields the
/// backfill reads are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct FxBar {
    /// ISO timestamp, e.g. `2024-01-31T00:00:00.000Z`.
    pub date: String,
    pub close: f64,
    #[serde(default)]
    pub ticker: Option<String>,
}

impl FxBar {
    /// Calendar-day key: the first ten characters of the timestamp.
    pub fn day_key(&self) -> Option<&str> {
        self.date.get(..10)
    }
}
