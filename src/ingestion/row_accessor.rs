use std::collections::HashMap;

use super::sheet::Cell;

static EMPTY_CELL: Cell = Cell::Empty;

/// Header name → column index, tolerant of case and surrounding whitespace.
///
/// Lookups take a list of synonyms because the same logical column is
/// spelled differently across tables and sheet revisions ("C / P" vs "C/P").
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_header_row(header: &[Cell]) -> Self {
        let mut columns = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(name) = cell.as_text() {
                columns.insert(name.to_lowercase(), idx);
            }
        }
        Self { columns }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(&name.trim().to_lowercase())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.get(&name.trim().to_lowercase()).copied()
    }

    /// First candidate whose column exists and is in range for this row.
    pub fn get<'r>(&self, row: &'r [Cell], candidates: &[&str]) -> Option<&'r Cell> {
        candidates
            .iter()
            .filter_map(|name| self.index_of(name))
            .find_map(|idx| row.get(idx))
    }

    pub fn get_or<'r>(&self, row: &'r [Cell], candidates: &[&str], default: &'r Cell) -> &'r Cell {
        self.get(row, candidates).unwrap_or(default)
    }

    /// Like [`get_or`](Self::get_or) with an empty cell as the default.
    pub fn cell<'r>(&self, row: &'r [Cell], candidates: &[&str]) -> &'r Cell {
        self.get(row, candidates).unwrap_or(&EMPTY_CELL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> HeaderMap {
        HeaderMap::from_header_row(&[
            Cell::text(" Ticker "),
            Cell::Empty,
            Cell::text("C / P"),
            Cell::text("Notes"),
            Cell::text(""),
        ])
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let map = header();
        assert_eq!(map.index_of("ticker"), Some(0));
        assert_eq!(map.index_of("TICKER"), Some(0));
        assert!(map.contains("c / p"));
        assert!(!map.contains(""));
    }

    #[test]
    fn test_synonyms_in_order() {
        let map = header();
        let row = vec![Cell::text("AAPL"), Cell::Empty, Cell::text("P")];
        assert_eq!(map.get(&row, &["c/p", "c / p"]), Some(&Cell::text("P")));
        assert_eq!(map.get(&row, &["strategy"]), None);
    }

    #[test]
    fn test_out_of_range_falls_back_to_default() {
        let map = header();
        let short_row = vec![Cell::text("AAPL")];
        let default = Cell::text("n/a");
        assert_eq!(map.get_or(&short_row, &["notes"], &default), &default);
        assert_eq!(map.cell(&short_row, &["notes"]), &Cell::Empty);
    }

    #[test]
    fn test_later_duplicate_header_wins() {
        let map = HeaderMap::from_header_row(&[Cell::text("Premium"), Cell::text("premium")]);
        assert_eq!(map.index_of("premium"), Some(1));
    }
}
