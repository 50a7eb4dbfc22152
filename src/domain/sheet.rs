use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Displayed text of the cell, as a spreadsheet would render it.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Inclusive, zero-based bounds of the cells a sheet declares as used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl UsedRange {
    pub fn row_count(&self) -> usize {
        (self.end_row - self.start_row + 1) as usize
    }

    pub fn col_count(&self) -> usize {
        (self.end_col - self.start_col + 1) as usize
    }

    /// Parses an A1-style reference such as `A1:D12` or `B3`.
    pub fn parse(reference: &str) -> Option<Self> {
        let mut parts = reference.split(':');
        let (start_row, start_col) = parse_cell_ref(parts.next()?)?;
        let (end_row, end_col) = match parts.next() {
            Some(end) => parse_cell_ref(end)?,
            None => (start_row, start_col),
        };
        if parts.next().is_some() || end_row < start_row || end_col < start_col {
            return None;
        }
        Some(Self {
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    pub fn union(self, other: UsedRange) -> UsedRange {
        UsedRange {
            start_row: self.start_row.min(other.start_row),
            start_col: self.start_col.min(other.start_col),
            end_row: self.end_row.max(other.end_row),
            end_col: self.end_col.max(other.end_col),
        }
    }
}

impl fmt::Display for UsedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = cell_ref(self.start_row, self.start_col);
        if self.start_row == self.end_row && self.start_col == self.end_col {
            write!(f, "{}", start)
        } else {
            write!(f, "{}:{}", start, cell_ref(self.end_row, self.end_col))
        }
    }
}

/// `(row, col)` of an A1-style cell reference, zero-based. `$` anchors are ignored.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

pub fn column_name(col: u32) -> String {
    let mut n = col + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// A rectangular grid of typed cells anchored at the top-left corner of its
/// used range. Row 0 of the grid is the header row; every row holds exactly
/// `width` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    origin: (u32, u32),
    width: usize,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: (0, 0),
            width: 0,
            rows: Vec::new(),
        }
    }

    /// Builds a sheet whose used range starts at `origin`; rows are padded to
    /// the widest one.
    pub fn from_rows(name: impl Into<String>, origin: (u32, u32), rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self::with_width(name, origin, width, rows)
    }

    pub fn with_width(
        name: impl Into<String>,
        origin: (u32, u32),
        width: usize,
        mut rows: Vec<Vec<Cell>>,
    ) -> Self {
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self {
            name: name.into(),
            origin,
            width,
            rows,
        }
    }

    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn used_range(&self) -> Option<UsedRange> {
        if self.rows.is_empty() || self.width == 0 {
            return None;
        }
        let (start_row, start_col) = self.origin;
        Some(UsedRange {
            start_row,
            start_col,
            end_row: start_row + self.rows.len() as u32 - 1,
            end_col: start_col + self.width as u32 - 1,
        })
    }

    /// Replaces every row below the header.
    pub fn replace_body(&mut self, body: Vec<Vec<Cell>>) {
        self.rows.truncate(1);
        for row in body {
            self.push_row(row);
        }
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.width, Cell::Text(String::new()));
        self.rows.push(row);
    }
}
