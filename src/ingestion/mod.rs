pub mod builders;
pub mod coerce;
pub mod normalize;
pub mod row_accessor;
pub mod sheet;

pub use builders::{extract_all, extract_options, Extraction, OptionsExtract, SourceLayout};
pub use normalize::Normalizer;
pub use row_accessor::HeaderMap;
pub use sheet::{Cell, JsonWorkbook, SheetSource, SourceError, Table};
