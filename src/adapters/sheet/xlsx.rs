//! Office Open XML workbooks.
//!
//! Reading resolves the named worksheet through `xl/workbook.xml` and its
//! relationships, then decodes the cells of that worksheet. Saving rewrites
//! only the `<sheetData>` and `<dimension>` of that worksheet part and copies
//! every other zip entry as is, so the style table and the other sheets
//! survive. Rows carried over from the original keep their `<row>`
//! attributes and the `s` style index of their cells.

use crate::domain::sheet::{cell_ref, parse_cell_ref, Cell, Sheet, UsedRange};
use crate::utils::error::{FormError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Largest grid a sheet may span. A declared dimension beyond it is ignored
/// in favor of the cells actually present; cells beyond it fail the load.
const MAX_SHEET_CELLS: usize = 4_000_000;

fn sheet_error(message: impl Into<String>) -> FormError {
    FormError::ReconciliationError {
        message: message.into(),
    }
}

pub fn read_sheet(bytes: &[u8], sheet_name: &str) -> Result<Sheet> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let part = sheet_part(&mut archive, sheet_name)?;
    let shared = read_shared_strings(&mut archive)?;

    let worksheet = parse_worksheet(&read_entry(&mut archive, &part)?, &shared)?;
    build_sheet(sheet_name, worksheet.dimension, &worksheet.cells)
}

pub fn write_sheet(original: &[u8], sheet: &Sheet) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let part = sheet_part(&mut archive, &sheet.name)?;
    let shared = read_shared_strings(&mut archive)?;

    let xml = read_entry(&mut archive, &part)?;
    let source = parse_worksheet(&xml, &shared)?;
    let previous = build_sheet(&sheet.name, source.dimension, &source.cells)?;
    let layout = Layout {
        source: &source,
        rows: source_rows(&previous, sheet),
    };
    let worksheet = splice_worksheet(&xml, sheet, &layout)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.name() == part {
            drop(entry);
            zip.start_file::<_, ()>(part.as_str(), FileOptions::default())?;
            zip.write_all(worksheet.as_bytes())?;
        } else {
            zip.raw_copy_file(entry)?;
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

fn read_shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    if archive.index_for_name(SHARED_STRINGS_PART).is_none() {
        return Ok(Vec::new());
    }
    parse_shared_strings(&read_entry(archive, SHARED_STRINGS_PART)?)
}

fn attribute(element: &BytesStart<'_>, local_name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Zip path of the worksheet part holding `sheet_name`.
fn sheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>, sheet_name: &str) -> Result<String> {
    let workbook = read_entry(archive, WORKBOOK_PART)?;
    let rel_id = find_sheet_relationship(&workbook, sheet_name)?
        .ok_or_else(|| sheet_error(format!("worksheet '{}' not found", sheet_name)))?;

    let rels = read_entry(archive, WORKBOOK_RELS_PART)?;
    let target = find_relationship_target(&rels, &rel_id)?.ok_or_else(|| {
        sheet_error(format!(
            "relationship '{}' of worksheet '{}' not found",
            rel_id, sheet_name
        ))
    })?;

    Ok(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    })
}

fn find_sheet_relationship(workbook: &str, sheet_name: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(workbook);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if attribute(&e, b"name")?.as_deref() == Some(sheet_name) {
                    return attribute(&e, b"id");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn find_relationship_target(rels: &str, rel_id: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"Id")?.as_deref() == Some(rel_id) {
                    return attribute(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

struct PendingCell {
    row: u32,
    col: u32,
    kind: Option<String>,
    text: String,
}

impl PendingCell {
    fn into_cell(self, shared: &[String]) -> Result<Cell> {
        let text = self.text;
        Ok(match self.kind.as_deref() {
            Some("s") => {
                let index: usize = text
                    .trim()
                    .parse()
                    .map_err(|_| sheet_error(format!("bad shared string index '{}'", text)))?;
                let value = shared.get(index).ok_or_else(|| {
                    sheet_error(format!("shared string {} out of range", index))
                })?;
                Cell::text(value.as_str())
            }
            Some("b") => Cell::Bool(text.trim() == "1"),
            Some("str") | Some("inlineStr") | Some("e") | Some("d") => Cell::Text(text),
            _ if text.is_empty() => Cell::Empty,
            _ => match text.trim().parse::<f64>() {
                Ok(n) => Cell::Number(n),
                Err(_) => Cell::Text(text),
            },
        })
    }
}

type PlacedCell = (u32, u32, Cell);

/// Content of a worksheet part, with the formatting the rewrite carries over.
#[derive(Debug, Default)]
struct Worksheet {
    dimension: Option<UsedRange>,
    cells: Vec<PlacedCell>,
    /// `s` attribute of every cell that has one, by absolute position.
    styles: HashMap<(u32, u32), String>,
    /// `<row>` attributes other than `r` and `spans`, by absolute row.
    row_attrs: HashMap<u32, Vec<(String, String)>>,
}

fn row_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if matches!(attr.key.local_name().as_ref(), b"r" | b"spans") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attrs.push((key, attr.unescape_value()?.into_owned()));
    }
    Ok(attrs)
}

fn parse_worksheet(xml: &str, shared: &[String]) -> Result<Worksheet> {
    let mut reader = Reader::from_str(xml);
    let mut sheet = Worksheet::default();

    let mut row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Empty(e) if e.local_name().as_ref() == b"dimension" => {
                sheet.dimension = attribute(&e, b"ref")?.and_then(|r| UsedRange::parse(&r));
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                row = attribute(&e, b"r")?
                    .and_then(|r| r.trim().parse::<u32>().ok())
                    .filter(|r| *r > 0)
                    .map(|r| r - 1)
                    .unwrap_or(next_row);
                next_row = row + 1;
                next_col = 0;
                let attrs = row_attributes(&e)?;
                if !attrs.is_empty() {
                    sheet.row_attrs.insert(row, attrs);
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (r, c) = attribute(&e, b"r")?
                    .and_then(|r| parse_cell_ref(&r))
                    .unwrap_or((row, next_col));
                next_col = c + 1;
                if let Some(style) = attribute(&e, b"s")? {
                    sheet.styles.insert((r, c), style);
                }
                pending = Some(PendingCell {
                    row: r,
                    col: c,
                    kind: attribute(&e, b"t")?,
                    text: String::new(),
                });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let (r, c) = attribute(&e, b"r")?
                    .and_then(|r| parse_cell_ref(&r))
                    .unwrap_or((row, next_col));
                next_col = c + 1;
                if let Some(style) = attribute(&e, b"s")? {
                    sheet.styles.insert((r, c), style);
                }
            }
            Event::Start(e) => match e.local_name().as_ref() {
                b"v" => in_value = pending.is_some(),
                b"t" => in_value = pending.is_some() && !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Text(t) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        let (r, c) = (cell.row, cell.col);
                        let value = cell.into_cell(shared)?;
                        if value != Cell::Empty {
                            sheet.cells.push((r, c, value));
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}

fn build_sheet(name: &str, dimension: Option<UsedRange>, cells: &[PlacedCell]) -> Result<Sheet> {
    let dimension = dimension.filter(|d| {
        let declared = d.row_count().saturating_mul(d.col_count());
        if declared > MAX_SHEET_CELLS {
            tracing::warn!("⚠️ Ignoring oversized dimension {} of sheet '{}'", d, name);
            false
        } else {
            true
        }
    });

    let present = cells
        .iter()
        .map(|&(row, col, _)| UsedRange {
            start_row: row,
            start_col: col,
            end_row: row,
            end_col: col,
        })
        .reduce(UsedRange::union);

    let range = match (dimension, present) {
        (Some(d), Some(p)) => d.union(p),
        (Some(d), None) => d,
        (None, Some(p)) => p,
        (None, None) => return Ok(Sheet::new(name)),
    };

    let spanned = range.row_count().saturating_mul(range.col_count());
    if spanned > MAX_SHEET_CELLS {
        return Err(sheet_error(format!(
            "sheet '{}' spans {} ({} cells), more than the {} supported",
            name, range, spanned, MAX_SHEET_CELLS
        )));
    }

    let mut rows = vec![vec![Cell::Empty; range.col_count()]; range.row_count()];
    for (row, col, cell) in cells {
        rows[(row - range.start_row) as usize][(col - range.start_col) as usize] = cell.clone();
    }

    Ok(Sheet::with_width(
        name,
        (range.start_row, range.start_col),
        range.col_count(),
        rows,
    ))
}

fn same_cell(a: &Cell, b: &Cell) -> bool {
    match (a, b) {
        (Cell::Empty, Cell::Text(t)) | (Cell::Text(t), Cell::Empty) => t.is_empty(),
        _ => a == b,
    }
}

/// For each row of `updated`, the absolute row of `previous` it was carried
/// over from. Cleanup keeps the non-blank rows in order, so they are matched
/// in sequence; appended rows have no source.
fn source_rows(previous: &Sheet, updated: &Sheet) -> Vec<Option<u32>> {
    if previous.origin() != updated.origin() || previous.width() != updated.width() {
        return vec![None; updated.row_count()];
    }

    let (start_row, _) = previous.origin();
    let mut kept = previous
        .rows()
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| !row.iter().all(Cell::is_blank))
        .peekable();

    updated
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if i == 0 {
                return previous.header().map(|_| start_row);
            }
            match kept.peek() {
                Some((j, source)) if source.iter().zip(row).all(|(a, b)| same_cell(a, b)) => {
                    let source_row = start_row + *j as u32;
                    kept.next();
                    Some(source_row)
                }
                _ => None,
            }
        })
        .collect()
}

struct Layout<'a> {
    source: &'a Worksheet,
    rows: Vec<Option<u32>>,
}

impl Layout<'_> {
    fn source_row(&self, row: usize) -> Option<u32> {
        self.rows.get(row).copied().flatten()
    }

    fn row_attrs(&self, row: usize) -> String {
        self.source_row(row)
            .and_then(|r| self.source.row_attrs.get(&r))
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(key, value)| format!(" {}=\"{}\"", key, xml_text(value)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn style(&self, row: usize, col: u32) -> Option<&str> {
        self.source_row(row)
            .and_then(|r| self.source.styles.get(&(r, col)))
            .map(String::as_str)
    }
}

fn xml_text(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

fn render_sheet_data(sheet: &Sheet, layout: &Layout<'_>) -> String {
    let (start_row, start_col) = sheet.origin();
    let mut out = String::from("<sheetData>");

    for (i, row) in sheet.rows().iter().enumerate() {
        let r = start_row + i as u32;
        let attrs = layout.row_attrs(i);
        let styled = (0..row.len()).any(|j| layout.style(i, start_col + j as u32).is_some());
        if attrs.is_empty() && !styled && row.iter().all(|cell| *cell == Cell::Empty) {
            continue;
        }

        out.push_str(&format!("<row r=\"{}\"{}>", r + 1, attrs));
        for (j, cell) in row.iter().enumerate() {
            let col = start_col + j as u32;
            let head = match layout.style(i, col) {
                Some(style) => format!("<c r=\"{}\" s=\"{}\"", cell_ref(r, col), xml_text(style)),
                None => format!("<c r=\"{}\"", cell_ref(r, col)),
            };
            match cell {
                Cell::Empty if layout.style(i, col).is_some() => {
                    out.push_str(&format!("{}/>", head))
                }
                Cell::Empty => {}
                Cell::Text(s) => out.push_str(&format!(
                    "{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    head,
                    xml_text(s)
                )),
                Cell::Number(n) if n.is_finite() => {
                    out.push_str(&format!("{}><v>{}</v></c>", head, n))
                }
                Cell::Number(n) => {
                    out.push_str(&format!("{} t=\"str\"><v>{}</v></c>", head, n))
                }
                Cell::Bool(b) => out.push_str(&format!(
                    "{} t=\"b\"><v>{}</v></c>",
                    head,
                    u8::from(*b)
                )),
            }
        }
        out.push_str("</row>");
    }

    out.push_str("</sheetData>");
    out
}

fn splice_worksheet(xml: &str, sheet: &Sheet, layout: &Layout<'_>) -> Result<String> {
    let start = xml
        .find("<sheetData")
        .ok_or_else(|| sheet_error("worksheet has no sheetData element"))?;
    let open_end = xml[start..]
        .find('>')
        .map(|i| start + i)
        .ok_or_else(|| sheet_error("unterminated sheetData element"))?;

    let end = if xml[..=open_end].ends_with("/>") {
        open_end + 1
    } else {
        const CLOSE: &str = "</sheetData>";
        xml[open_end..]
            .find(CLOSE)
            .map(|i| open_end + i + CLOSE.len())
            .ok_or_else(|| sheet_error("unterminated sheetData element"))?
    };

    let mut spliced = String::with_capacity(xml.len());
    spliced.push_str(&xml[..start]);
    spliced.push_str(&render_sheet_data(sheet, layout));
    spliced.push_str(&xml[end..]);

    let Some(range) = sheet.used_range() else {
        return Ok(spliced);
    };
    let dimension = Regex::new(r#"<dimension\s+ref="[^"]*"\s*/>"#)
        .map_err(|e| sheet_error(e.to_string()))?;
    Ok(dimension
        .replace(&spliced, format!("<dimension ref=\"{}\"/>", range).as_str())
        .into_owned())
}
