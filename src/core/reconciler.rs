use crate::core::header::{normalize_cell, normalize_header};
use crate::domain::model::FormRecord;
use crate::domain::ports::SheetStorage;
use crate::domain::sheet::{Cell, Sheet, UsedRange};
use crate::utils::error::{FormError, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupStats {
    pub kept: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub cleanup: CleanupStats,
    pub appended: usize,
    pub range: Option<UsedRange>,
}

/// For each header column, the record key whose normalized form equals the
/// normalized header, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    columns: Vec<Option<String>>,
}

impl HeaderMapping {
    pub fn build(header: &[Cell], record: &FormRecord) -> Self {
        // 第一個正規化後相同的欄位名稱優先
        let mut by_normalized: HashMap<String, &str> = HashMap::new();
        for key in record.keys() {
            by_normalized
                .entry(normalize_header(key))
                .or_insert(key.as_str());
        }

        let columns = header
            .iter()
            .map(|cell| {
                let normalized = normalize_cell(cell);
                if normalized.is_empty() {
                    return None;
                }
                by_normalized.get(&normalized).map(|key| key.to_string())
            })
            .collect();

        Self { columns }
    }

    pub fn key_for(&self, column: usize) -> Option<&str> {
        self.columns.get(column).and_then(|k| k.as_deref())
    }

    pub fn matched(&self) -> usize {
        self.columns.iter().filter(|k| k.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Cell written for a record value: numeric values stay numeric, everything
/// else is written as text.
pub fn value_to_cell(value: &Value) -> Cell {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => Cell::Number(f),
            None => Cell::Text(n.to_string()),
        },
        Value::String(s) => Cell::Text(s.clone()),
        Value::Bool(b) => Cell::Text(b.to_string()),
        Value::Null => Cell::Text(String::new()),
        other => Cell::Text(other.to_string()),
    }
}

/// Drops every blank row below the header and packs the remaining rows
/// directly under it, keeping their order and values. The header row is left
/// untouched; blank cells of kept rows become empty text.
pub fn cleanup(sheet: &mut Sheet) -> Result<CleanupStats> {
    if sheet.header().is_none() {
        return Err(FormError::ReconciliationError {
            message: format!("sheet '{}' has no header row", sheet.name),
        });
    }

    let mut stats = CleanupStats::default();
    let mut body = Vec::with_capacity(sheet.row_count().saturating_sub(1));

    for row in sheet.rows().iter().skip(1) {
        if row.iter().all(Cell::is_blank) {
            stats.dropped += 1;
            continue;
        }
        stats.kept += 1;
        body.push(
            row.iter()
                .map(|cell| match cell {
                    Cell::Empty => Cell::Text(String::new()),
                    other => other.clone(),
                })
                .collect(),
        );
    }

    sheet.replace_body(body);
    Ok(stats)
}

/// Appends one row per record below the last row, in record order. Only the
/// sheet's existing columns are written; record keys without a matching
/// header are dropped.
pub fn append(sheet: &mut Sheet, records: &[FormRecord]) -> Result<usize> {
    let header: Vec<Cell> = match sheet.header() {
        Some(header) => header.to_vec(),
        None => {
            return Err(FormError::ReconciliationError {
                message: format!("sheet '{}' has no header row", sheet.name),
            })
        }
    };

    for record in records {
        let mapping = HeaderMapping::build(&header, record);
        tracing::debug!(
            "Matched {}/{} columns for record with {} fields",
            mapping.matched(),
            mapping.len(),
            record.len()
        );

        let row = (0..header.len())
            .map(|col| {
                mapping
                    .key_for(col)
                    .and_then(|key| record.get(key))
                    .map(value_to_cell)
                    .unwrap_or_else(|| Cell::Text(String::new()))
            })
            .collect();
        sheet.push_row(row);
    }

    Ok(records.len())
}

pub struct SheetReconciler<'a, W: SheetStorage> {
    storage: &'a W,
}

impl<'a, W: SheetStorage> SheetReconciler<'a, W> {
    pub fn new(storage: &'a W) -> Self {
        Self { storage }
    }

    /// Cleans the sheet, appends `records` and saves it once. Any failure
    /// aborts the whole reconciliation.
    pub async fn reconcile(
        &self,
        path: &str,
        sheet_name: &str,
        records: &[FormRecord],
    ) -> Result<ReconcileReport> {
        let mut sheet = self
            .storage
            .load_sheet(path, sheet_name)
            .await
            .map_err(|e| reconciliation_error("read", path, e))?;

        let cleanup_stats = cleanup(&mut sheet)?;
        if cleanup_stats.dropped > 0 {
            tracing::info!(
                "🧹 Removed {} empty row(s) from '{}'",
                cleanup_stats.dropped,
                sheet.name
            );
        }

        let appended = append(&mut sheet, records)?;

        self.storage
            .save_sheet(path, &sheet)
            .await
            .map_err(|e| reconciliation_error("write", path, e))?;

        Ok(ReconcileReport {
            cleanup: cleanup_stats,
            appended,
            range: sheet.used_range(),
        })
    }
}

fn reconciliation_error(action: &str, path: &str, source: FormError) -> FormError {
    match source {
        FormError::ReconciliationError { .. } => source,
        other => FormError::ReconciliationError {
            message: format!("could not {} '{}': {}", action, path, other),
        },
    }
}
