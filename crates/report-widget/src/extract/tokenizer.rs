/// Cells of one CSV line, quotes already removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// True when every cell is empty or whitespace; `",,,"` is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.trim().is_empty())
    }
}

/// Splits a payload into rows, one per line.
pub fn split_rows(payload: &str) -> Vec<RawRow> {
    let payload = payload.strip_prefix('\u{feff}').unwrap_or(payload);
    payload.lines().map(tokenize_line).collect()
}

/// Single-pass scanner: `"` flips the quoted state and is dropped, a comma
/// separates cells only outside quotes.
pub fn tokenize_line(line: &str) -> RawRow {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => inside_quotes = !inside_quotes,
            ',' if !inside_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    cells.push(current);

    RawRow::new(cells)
}
