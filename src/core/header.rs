use crate::domain::sheet::Cell;

/// Canonical form of a header or record key: line breaks and whitespace runs
/// collapsed to single spaces, trimmed, lowercased.
pub fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized text of a header cell; blank cells normalize to "".
pub fn normalize_cell(cell: &Cell) -> String {
    normalize_header(&cell.display())
}
