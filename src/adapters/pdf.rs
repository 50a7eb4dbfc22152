//! AcroForm reader backed by [lopdf](https://crates.io/crates/lopdf).
//!
//! The field tree under `/Root /AcroForm /Fields` is flattened into terminal
//! fields with fully qualified names. Inheritable attributes (`/FT`, `/Ff`,
//! `/V`) are resolved while walking down, so reading a field afterwards does
//! not need the parsed document any more.

use crate::core::{DocumentLoader, FormDocument};
use crate::domain::model::FieldKind;
use crate::utils::error::{FormError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

/// Field flag bits (`/Ff`) that decide the kind of button and choice fields.
pub mod field_flags {
    pub const RADIO: i64 = 1 << 15;
    pub const PUSHBUTTON: i64 = 1 << 16;
    pub const COMBO: i64 = 1 << 17;
}

const MAX_REFERENCE_DEPTH: usize = 32;

#[derive(Debug, Clone, Default)]
struct Inherited {
    field_type: Option<Vec<u8>>,
    flags: i64,
    value: Option<Object>,
}

#[derive(Debug, Clone)]
struct FieldNode {
    name: String,
    field_type: Option<Vec<u8>>,
    flags: i64,
    value: Option<Object>,
    /// `/AS` states of the field's widgets.
    widget_states: Vec<Vec<u8>>,
}

impl FieldNode {
    fn kind(&self) -> Result<FieldKind> {
        match self.field_type.as_deref() {
            Some(b"Tx") => self.text_kind(),
            Some(b"Btn") if self.flags & field_flags::PUSHBUTTON != 0 => Ok(FieldKind::Other),
            Some(b"Btn") if self.flags & field_flags::RADIO != 0 => self.radio_kind(),
            Some(b"Btn") => self.checkbox_kind(),
            Some(b"Ch") => {
                let selected = self.selected_options()?;
                if self.flags & field_flags::COMBO != 0 {
                    Ok(FieldKind::Dropdown { selected })
                } else {
                    Ok(FieldKind::OptionList { selected })
                }
            }
            _ => Ok(FieldKind::Other),
        }
    }

    fn text_kind(&self) -> Result<FieldKind> {
        match &self.value {
            None | Some(Object::Null) => Ok(FieldKind::Text(None)),
            Some(Object::String(bytes, _)) => Ok(FieldKind::Text(Some(decode_text_string(bytes)))),
            Some(other) => Err(self.unexpected(other)),
        }
    }

    fn radio_kind(&self) -> Result<FieldKind> {
        let selected = match &self.value {
            None | Some(Object::Null) => None,
            Some(Object::Name(name)) => Some(decode_name(name)),
            Some(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
            Some(other) => return Err(self.unexpected(other)),
        };
        Ok(FieldKind::RadioGroup {
            selected: selected.filter(|s| s != "Off"),
        })
    }

    fn checkbox_kind(&self) -> Result<FieldKind> {
        let checked = match &self.value {
            Some(Object::Name(name)) => name.as_slice() != b"Off",
            None | Some(Object::Null) => self
                .widget_states
                .iter()
                .any(|state| state.as_slice() != b"Off"),
            Some(other) => return Err(self.unexpected(other)),
        };
        Ok(FieldKind::CheckBox { checked })
    }

    fn selected_options(&self) -> Result<Vec<String>> {
        match &self.value {
            None | Some(Object::Null) => Ok(Vec::new()),
            Some(Object::String(bytes, _)) => Ok(vec![decode_text_string(bytes)]),
            Some(Object::Name(name)) => Ok(vec![decode_name(name)]),
            Some(Object::Array(items)) => Ok(items
                .iter()
                .filter_map(|item| match item {
                    Object::String(bytes, _) => Some(decode_text_string(bytes)),
                    Object::Name(name) => Some(decode_name(name)),
                    _ => None,
                })
                .collect()),
            Some(other) => Err(self.unexpected(other)),
        }
    }

    fn unexpected(&self, value: &Object) -> FormError {
        FormError::FieldExtractionError {
            field: self.name.clone(),
            message: format!("unexpected value type {}", object_type(value)),
        }
    }
}

fn object_type(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) => "integer",
        Object::Real(_) => "real",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}

/// The interactive fields of one PDF, detached from the parsed document.
#[derive(Debug, Clone, Default)]
pub struct PdfForm {
    fields: Vec<FieldNode>,
}

impl PdfForm {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let root = doc.trailer.get(b"Root")?;
        let catalog = resolve(doc, root)?.as_dict()?;

        let acroform = match catalog.get(b"AcroForm") {
            Ok(obj) => resolve(doc, obj)?.as_dict()?,
            Err(_) => {
                tracing::debug!("Document has no AcroForm");
                return Ok(Self::default());
            }
        };

        let fields = match acroform.get(b"Fields") {
            Ok(obj) => resolve(doc, obj)?.as_array()?,
            Err(_) => return Ok(Self::default()),
        };

        let mut walker = Walker {
            doc,
            visited: HashSet::new(),
            names: HashMap::new(),
            out: Vec::new(),
        };
        for field in fields {
            walker.walk(field, "", &Inherited::default(), 0);
        }

        Ok(Self { fields: walker.out })
    }
}

impl FormDocument for PdfForm {
    fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    fn read_field(&self, name: &str) -> Result<FieldKind> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FormError::FieldExtractionError {
                field: name.to_string(),
                message: "no such field".to_string(),
            })?
            .kind()
    }
}

struct Walker<'a> {
    doc: &'a Document,
    visited: HashSet<ObjectId>,
    /// Position in `out` of every full name seen so far.
    names: HashMap<String, usize>,
    out: Vec<FieldNode>,
}

impl<'a> Walker<'a> {
    fn walk(
        &mut self,
        obj: &'a Object,
        parent_name: &str,
        parent: &Inherited,
        depth: usize,
    ) {
        if let Object::Reference(id) = obj {
            if !self.visited.insert(*id) {
                tracing::warn!("⚠️ Field tree loops back to object {:?}, skipped", id);
                return;
            }
        }
        if depth > MAX_REFERENCE_DEPTH {
            tracing::warn!("⚠️ Field tree deeper than {} levels, truncated", depth);
            return;
        }

        let resolved = match resolve(self.doc, obj) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("⚠️ Skipping unreadable field node {:?}: {}", obj, e);
                return;
            }
        };
        let Ok(dict) = resolved.as_dict() else {
            return;
        };

        let partial_name = dict
            .get(b"T")
            .ok()
            .and_then(|t| resolve(self.doc, t).ok())
            .and_then(|t| match t {
                Object::String(bytes, _) => Some(decode_text_string(bytes)),
                _ => None,
            })
            .unwrap_or_default();

        let full_name = match (parent_name.is_empty(), partial_name.is_empty()) {
            (true, _) => partial_name,
            (false, true) => parent_name.to_string(),
            (false, false) => format!("{}.{}", parent_name, partial_name),
        };

        let inherited = self.inherit(dict, parent);
        let kids = self.kids(dict);
        let field_kids: Vec<&'a Object> = kids
            .iter()
            .copied()
            .filter(|kid| self.is_named(kid))
            .collect();

        if !field_kids.is_empty() {
            for kid in field_kids {
                self.walk(kid, &full_name, &inherited, depth + 1);
            }
            return;
        }

        if full_name.is_empty() {
            return;
        }

        let mut widget_states = Vec::new();
        for widget in std::iter::once(dict).chain(
            kids.iter()
                .filter_map(|kid| resolve(self.doc, kid).ok())
                .filter_map(|kid| kid.as_dict().ok()),
        ) {
            if let Ok(Object::Name(state)) = widget.get(b"AS") {
                widget_states.push(state.clone());
            }
        }

        let node = FieldNode {
            name: full_name,
            field_type: inherited.field_type,
            flags: inherited.flags,
            value: inherited.value,
            widget_states,
        };
        match self.names.get(&node.name) {
            Some(&index) => {
                tracing::debug!("Duplicate field name '{}', keeping the last value", node.name);
                self.out[index] = node;
            }
            None => {
                self.names.insert(node.name.clone(), self.out.len());
                self.out.push(node);
            }
        }
    }

    fn inherit(&self, dict: &Dictionary, parent: &Inherited) -> Inherited {
        let field_type = match dict.get(b"FT").ok().and_then(|o| resolve(self.doc, o).ok()) {
            Some(Object::Name(name)) => Some(name.clone()),
            _ => parent.field_type.clone(),
        };
        let flags = match dict.get(b"Ff").ok().and_then(|o| resolve(self.doc, o).ok()) {
            Some(Object::Integer(flags)) => *flags,
            _ => parent.flags,
        };
        let value = match dict.get(b"V").ok().and_then(|o| resolve(self.doc, o).ok()) {
            Some(value) => Some(value.clone()),
            None => parent.value.clone(),
        };
        Inherited {
            field_type,
            flags,
            value,
        }
    }

    fn kids(&self, dict: &'a Dictionary) -> Vec<&'a Object> {
        dict.get(b"Kids")
            .ok()
            .and_then(|k| resolve(self.doc, k).ok())
            .and_then(|k| k.as_array().ok())
            .map(|kids| kids.iter().collect())
            .unwrap_or_default()
    }

    /// Kids carrying a `/T` entry are fields; the others are widgets.
    fn is_named(&self, kid: &Object) -> bool {
        resolve(self.doc, kid)
            .ok()
            .and_then(|k| k.as_dict().ok())
            .is_some_and(|k| k.has(b"T"))
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id)?,
            other => return Ok(other),
        }
    }
    Err(FormError::DocumentLoadError {
        file: String::new(),
        message: "reference chain too long".to_string(),
    })
}

fn decode_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Decodes a PDF text string: UTF-16BE or UTF-8 with a byte order mark,
/// PDFDocEncoding otherwise.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        bytes.iter().map(|&b| pdfdoc_char(b)).collect()
    }
}

fn pdfdoc_char(byte: u8) -> char {
    const HIGH: [char; 31] = [
        '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}',
        '\u{2044}', '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}',
        '\u{201D}', '\u{2018}', '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}',
        '\u{0141}', '\u{0152}', '\u{0160}', '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}',
        '\u{0153}', '\u{0161}', '\u{017E}',
    ];
    const ACCENTS: [char; 8] = [
        '\u{02D8}', '\u{02C7}', '\u{02C6}', '\u{02D9}', '\u{02DD}', '\u{02DB}', '\u{02DA}',
        '\u{02DC}',
    ];
    match byte {
        0x18..=0x1F => ACCENTS[(byte - 0x18) as usize],
        0x80..=0x9E => HIGH[(byte - 0x80) as usize],
        0xA0 => '\u{20AC}',
        _ => byte as char,
    }
}

/// Loads PDF bytes with lopdf and collects their form fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFormLoader;

impl DocumentLoader for PdfFormLoader {
    type Document = PdfForm;

    fn load(&self, bytes: &[u8]) -> Result<PdfForm> {
        let doc = Document::load_mem(bytes)?;
        PdfForm::from_document(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    fn text(s: &str) -> Object {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    fn name(s: &str) -> Object {
        Object::Name(s.as_bytes().to_vec())
    }

    fn form_pdf(build: impl FnOnce(&mut Document) -> Vec<Object>) -> Vec<u8> {
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
        let fields = build(&mut doc);
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => dictionary! { "Fields" => fields },
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn load(bytes: &[u8]) -> PdfForm {
        PdfFormLoader.load(bytes).unwrap()
    }

    #[test]
    fn test_reads_every_field_kind() {
        let bytes = form_pdf(|doc| {
            vec![
                doc.add_object(dictionary! {
                    "FT" => "Tx", "T" => text("Prénom"), "V" => text("Élodie"),
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Btn", "T" => text("Majeur"), "V" => name("Yes"), "AS" => name("Yes"),
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Btn", "T" => text("Sexe"),
                    "Ff" => Object::Integer(field_flags::RADIO), "V" => name("F"),
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Ch", "T" => text("Ville"),
                    "Ff" => Object::Integer(field_flags::COMBO), "V" => text("Lyon"),
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Ch", "T" => text("Options"),
                    "V" => Object::Array(vec![text("B"), text("C")]),
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Btn", "T" => text("Envoyer"),
                    "Ff" => Object::Integer(field_flags::PUSHBUTTON),
                })
                .into(),
                doc.add_object(dictionary! { "FT" => "Sig", "T" => text("Signature") }).into(),
            ]
        });

        let form = load(&bytes);

        assert_eq!(
            form.field_names(),
            vec!["Prénom", "Majeur", "Sexe", "Ville", "Options", "Envoyer", "Signature"]
        );
        assert_eq!(
            form.read_field("Prénom").unwrap(),
            FieldKind::Text(Some("Élodie".to_string()))
        );
        assert_eq!(
            form.read_field("Majeur").unwrap(),
            FieldKind::CheckBox { checked: true }
        );
        assert_eq!(
            form.read_field("Sexe").unwrap(),
            FieldKind::RadioGroup {
                selected: Some("F".to_string())
            }
        );
        assert_eq!(
            form.read_field("Ville").unwrap(),
            FieldKind::Dropdown {
                selected: vec!["Lyon".to_string()]
            }
        );
        assert_eq!(
            form.read_field("Options").unwrap(),
            FieldKind::OptionList {
                selected: vec!["B".to_string(), "C".to_string()]
            }
        );
        assert_eq!(form.read_field("Envoyer").unwrap(), FieldKind::Other);
        assert_eq!(form.read_field("Signature").unwrap(), FieldKind::Other);
    }

    #[test]
    fn test_unchecked_and_unselected_buttons() {
        let bytes = form_pdf(|doc| {
            let widget = doc.add_object(dictionary! { "Subtype" => "Widget", "AS" => name("Off") });
            vec![
                doc.add_object(dictionary! {
                    "FT" => "Btn", "T" => text("Majeur"), "Kids" => vec![widget.into()],
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Btn", "T" => text("Sexe"),
                    "Ff" => Object::Integer(field_flags::RADIO), "V" => name("Off"),
                })
                .into(),
            ]
        });

        let form = load(&bytes);
        assert_eq!(
            form.read_field("Majeur").unwrap(),
            FieldKind::CheckBox { checked: false }
        );
        assert_eq!(
            form.read_field("Sexe").unwrap(),
            FieldKind::RadioGroup { selected: None }
        );
    }

    #[test]
    fn test_hierarchical_names_inherit_type() {
        let bytes = form_pdf(|doc| {
            let parent_id = doc.new_object_id();
            let nom = doc.add_object(dictionary! {
                "T" => text("nom"), "Parent" => parent_id, "V" => text("Durand"),
            });
            let ville = doc.add_object(dictionary! {
                "T" => text("ville"), "Parent" => parent_id,
            });
            doc.objects.insert(
                parent_id,
                Object::Dictionary(dictionary! {
                    "T" => text("identite"),
                    "FT" => "Tx",
                    "Kids" => vec![nom.into(), ville.into()],
                }),
            );
            vec![parent_id.into()]
        });

        let form = load(&bytes);
        assert_eq!(form.field_names(), vec!["identite.nom", "identite.ville"]);
        assert_eq!(
            form.read_field("identite.nom").unwrap(),
            FieldKind::Text(Some("Durand".to_string()))
        );
        assert_eq!(
            form.read_field("identite.ville").unwrap(),
            FieldKind::Text(None)
        );
    }

    #[test]
    fn test_malformed_value_fails_only_that_field() {
        let bytes = form_pdf(|doc| {
            vec![
                doc.add_object(dictionary! {
                    "FT" => "Tx", "T" => text("Age"), "V" => Object::Integer(3),
                })
                .into(),
                doc.add_object(dictionary! {
                    "FT" => "Tx", "T" => text("Nom"), "V" => text("Durand"),
                })
                .into(),
            ]
        });

        let form = load(&bytes);
        assert!(matches!(
            form.read_field("Age"),
            Err(FormError::FieldExtractionError { .. })
        ));
        assert!(form.read_field("Nom").is_ok());
    }

    #[test]
    fn test_duplicate_names_keep_first_position_and_last_value() {
        let bytes = form_pdf(|doc| {
            vec![
                doc.add_object(dictionary! { "FT" => "Tx", "T" => text("Nom"), "V" => text("A") })
                    .into(),
                doc.add_object(dictionary! { "FT" => "Tx", "T" => text("Ville"), "V" => text("Lyon") })
                    .into(),
                doc.add_object(dictionary! { "FT" => "Tx", "T" => text("Nom"), "V" => text("B") })
                    .into(),
            ]
        });

        let form = load(&bytes);
        assert_eq!(form.field_names(), vec!["Nom", "Ville"]);
        assert_eq!(
            form.read_field("Nom").unwrap(),
            FieldKind::Text(Some("B".to_string()))
        );
    }

    #[test]
    fn test_dangling_field_reference_is_skipped() {
        let bytes = form_pdf(|doc| {
            vec![
                Object::Reference((9999, 0)),
                doc.add_object(dictionary! { "FT" => "Tx", "T" => text("Nom"), "V" => text("Durand") })
                    .into(),
            ]
        });

        let form = load(&bytes);
        assert_eq!(form.field_names(), vec!["Nom"]);
        assert_eq!(
            form.read_field("Nom").unwrap(),
            FieldKind::Text(Some("Durand".to_string()))
        );
    }

    #[test]
    fn test_document_without_form() {
        let bytes = form_pdf(|_| Vec::new());
        assert!(load(&bytes).field_names().is_empty());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(PdfFormLoader.load(b"not a pdf").is_err());
    }

    #[test]
    fn test_text_string_encodings() {
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0xC9, 0x00, 0x74]), "Ét");
        assert_eq!(decode_text_string(&[0xEF, 0xBB, 0xBF, 0xC3, 0xA9]), "é");
        assert_eq!(decode_text_string(&[0x44, 0xE9, 0x80]), "Dé\u{2022}");
    }
}
