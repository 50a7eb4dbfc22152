#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, StringFormat};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

pub fn pdf_text(value: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

pub fn text_field(name: &str, value: &str) -> Dictionary {
    dictionary! {
        "FT" => "Tx",
        "T" => pdf_text(name),
        "V" => pdf_text(value),
    }
}

pub fn checkbox(name: &str, checked: bool) -> Dictionary {
    let state = if checked { "Yes" } else { "Off" };
    dictionary! {
        "FT" => "Btn",
        "T" => pdf_text(name),
        "V" => Object::Name(state.as_bytes().to_vec()),
        "AS" => Object::Name(state.as_bytes().to_vec()),
    }
}

/// A one-page PDF whose AcroForm holds `fields` as top-level terminal fields.
pub fn form_pdf(fields: Vec<Dictionary>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => Object::Integer(1),
        }),
    );

    let field_refs: Vec<Object> = fields
        .into_iter()
        .map(|field| doc.add_object(field).into())
        .collect();
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! { "Fields" => field_refs },
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn signup_form(nom: &str, prenom: &str, date: &str) -> Vec<u8> {
    form_pdf(vec![
        text_field("Nom", nom),
        text_field("Prénom", prenom),
        text_field("Date3_af_date", date),
        checkbox("Majeur", true),
    ])
}

fn inline_cell(reference: &str, text: &str) -> String {
    format!(
        "<c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
        reference, text
    )
}

/// A single-sheet workbook named `sheet_name` holding `rows` of inline
/// strings starting at A1. Empty strings leave the cell out.
pub fn workbook(sheet_name: &str, rows: &[&[&str]]) -> Vec<u8> {
    let mut sheet_data = String::new();
    let mut width = 1;
    for (r, row) in rows.iter().enumerate() {
        width = width.max(row.len());
        sheet_data.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                sheet_data.push_str(&inline_cell(&reference, value));
            }
        }
        sheet_data.push_str("</row>");
    }
    let dimension = format!(
        "A1:{}{}",
        (b'A' + width as u8 - 1) as char,
        rows.len().max(1)
    );

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                sheet_name
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="{}"/><sheetData>{}</sheetData></worksheet>"#,
                dimension, sheet_data
            ),
        ),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file::<_, ()>(name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn write(dir: &Path, name: &str, data: &[u8]) {
    std::fs::write(dir.join(name), data).unwrap();
}

pub fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}
