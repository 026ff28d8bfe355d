//! Interactive form (AcroForm) access
//!
//! Walks the field hierarchy under the catalog's `/AcroForm`, resolving
//! inherited attributes (`/FT`, `/DA`) and fully qualified names, and writes
//! values into text, choice and checkbox fields.

use crate::document::PdfDocument;
use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Field hierarchies deeper than this are treated as malformed
const MAX_FIELD_DEPTH: usize = 32;

/// Field type as declared by `/FT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FormFieldKind {
    fn from_type(field_type: Option<&[u8]>) -> Self {
        match field_type {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") => Self::Button,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

/// A terminal form field
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name (`parent.child`)
    pub name: String,
    pub kind: FormFieldKind,
    /// Current value, if any
    pub value: Option<String>,
    /// Rectangle of the first widget as `[llx, lly, urx, ury]` in PDF space
    pub rect: Option<[f64; 4]>,
    /// Page (1-indexed) holding the first widget
    pub page: Option<usize>,
    /// Font size from the default appearance string; `None` for auto-size
    pub font_size: Option<f64>,
}

/// Value written into a field by [`PdfDocument::fill_form`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl FieldValue {
    /// Text written into text and choice fields
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Checked(true) => "Yes".to_string(),
            Self::Checked(false) => String::new(),
        }
    }

    /// State applied to checkbox fields
    pub fn is_checked(&self) -> bool {
        match self {
            Self::Checked(checked) => *checked,
            Self::Text(text) => !text.trim().is_empty(),
        }
    }
}

/// Terminal field together with its object and widget IDs
struct FieldNode {
    id: ObjectId,
    field: FormField,
    widgets: Vec<ObjectId>,
}

/// Attributes inherited down the field tree
#[derive(Clone, Default)]
struct Inherited {
    name: String,
    field_type: Option<Vec<u8>>,
    appearance: Option<String>,
}

impl PdfDocument {
    /// Whether the catalog carries an `/AcroForm` entry
    pub fn has_form(&self) -> bool {
        self.acro_form().is_some()
    }

    /// List the terminal fields of the interactive form
    ///
    /// # Errors
    /// [`PdfError::NoForm`] if the document has no `/AcroForm`
    pub fn form_fields(&self) -> Result<Vec<FormField>> {
        Ok(self
            .collect_fields()?
            .into_iter()
            .map(|node| node.field)
            .collect())
    }

    /// Write values into matching form fields
    ///
    /// Text and choice fields receive `/V` and lose their cached appearance,
    /// and the form is marked `/NeedAppearances` so viewers regenerate it.
    /// Checkboxes get `/V` and `/AS` set to their on-state or `/Off`.
    /// Signature fields and fields without a value are left untouched.
    ///
    /// # Returns
    /// Number of fields filled
    pub fn fill_form(&mut self, values: &HashMap<String, FieldValue>) -> Result<usize> {
        let nodes = self.collect_fields()?;
        let mut filled = 0;
        let mut needs_appearances = false;

        for node in nodes {
            let Some(value) = values.get(&node.field.name) else {
                continue;
            };

            match node.field.kind {
                FormFieldKind::Text | FormFieldKind::Choice => {
                    let text = text_string(&value.as_text());
                    self.field_dict_mut(node.id)?.set("V", text);
                    for widget in &node.widgets {
                        self.field_dict_mut(*widget)?.remove(b"AP");
                    }
                    needs_appearances = true;
                }
                FormFieldKind::Button => {
                    let checked = value.is_checked();
                    let mut field_state = None;
                    for widget in &node.widgets {
                        let state = if checked {
                            self.on_state(*widget)
                        } else {
                            b"Off".to_vec()
                        };
                        self.field_dict_mut(*widget)?
                            .set("AS", Object::Name(state.clone()));
                        field_state.get_or_insert(state);
                    }
                    let state = field_state.unwrap_or_else(|| {
                        if checked {
                            b"Yes".to_vec()
                        } else {
                            b"Off".to_vec()
                        }
                    });
                    self.field_dict_mut(node.id)?.set("V", Object::Name(state));
                }
                FormFieldKind::Signature | FormFieldKind::Unknown => continue,
            }

            debug!("Filled form field '{}'", node.field.name);
            filled += 1;
        }

        if needs_appearances {
            self.set_form_entry("NeedAppearances", Object::Boolean(true))?;
        }

        Ok(filled)
    }

    /// Reduce the document to its first page
    ///
    /// Fields whose widgets all sat on the dropped pages leave
    /// `/AcroForm /Fields`, and unreachable objects are pruned.
    pub fn trim_to_first_page(&mut self) -> Result<()> {
        if self.page_count() <= 1 {
            return Ok(());
        }

        let dropped: BTreeSet<ObjectId> = self
            .widget_pages()
            .into_iter()
            .filter(|(_, page)| *page > 1)
            .map(|(id, _)| id)
            .collect();

        self.retain_first_page();
        if !dropped.is_empty() && self.has_form() {
            self.prune_fields(&dropped)?;
        }
        self.inner_mut().prune_objects();
        Ok(())
    }

    fn prune_fields(&mut self, dropped: &BTreeSet<ObjectId>) -> Result<()> {
        let Some(form) = self.acro_form() else {
            return Ok(());
        };
        let fields = form
            .get(b"Fields")
            .ok()
            .and_then(|f| self.resolve(f).ok())
            .and_then(|f| f.as_array().ok())
            .cloned()
            .unwrap_or_default();

        let mut visited = BTreeSet::new();
        let mut kept = Vec::new();
        for field in fields {
            let keep = match field {
                Object::Reference(id) => self.prune_field(id, dropped, &mut visited, 0)?,
                _ => true,
            };
            if keep {
                kept.push(field);
            }
        }

        debug!("Kept {} top-level form fields on the first page", kept.len());
        self.set_form_entry("Fields", Object::Array(kept))
    }

    /// Drop dropped-page widgets below `id`; `false` when nothing remains
    fn prune_field(
        &mut self,
        id: ObjectId,
        dropped: &BTreeSet<ObjectId>,
        visited: &mut BTreeSet<ObjectId>,
        depth: usize,
    ) -> Result<bool> {
        if dropped.contains(&id) {
            return Ok(false);
        }
        if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
            return Ok(true);
        }

        let kids = self
            .resolve_dict(&Object::Reference(id))
            .and_then(|dict| {
                dict.get(b"Kids")
                    .ok()
                    .and_then(|k| self.resolve(k).ok())
                    .and_then(|k| k.as_array().ok())
                    .cloned()
            })
            .unwrap_or_default();
        if kids.is_empty() {
            return Ok(true);
        }

        let mut kept = Vec::new();
        for kid in kids {
            let keep = match kid {
                Object::Reference(kid_id) => {
                    self.prune_field(kid_id, dropped, visited, depth + 1)?
                }
                _ => true,
            };
            if keep {
                kept.push(kid);
            }
        }
        if kept.is_empty() {
            return Ok(false);
        }
        self.field_dict_mut(id)?.set("Kids", kept);
        Ok(true)
    }

    /// The `/AcroForm` dictionary, resolved and cloned
    fn acro_form(&self) -> Option<Dictionary> {
        let catalog_id = self.catalog_id().ok()?;
        let catalog = self.inner().get_object(catalog_id).ok()?.as_dict().ok()?;
        let form = catalog.get(b"AcroForm").ok()?;
        self.resolve_dict(form)
    }

    fn collect_fields(&self) -> Result<Vec<FieldNode>> {
        let form = self.acro_form().ok_or(PdfError::NoForm)?;

        let root = Inherited {
            appearance: form
                .get(b"DA")
                .ok()
                .and_then(|da| self.resolve(da).ok())
                .and_then(decode_text),
            ..Inherited::default()
        };

        let fields = form
            .get(b"Fields")
            .ok()
            .and_then(|f| self.resolve(f).ok())
            .and_then(|f| f.as_array().ok())
            .cloned()
            .unwrap_or_default();

        let pages = self.widget_pages();
        let mut visited = BTreeSet::new();
        let mut nodes = Vec::new();
        for field in fields {
            if let Object::Reference(id) = field {
                self.walk_field(id, &root, &pages, &mut visited, &mut nodes, 0);
            }
        }
        Ok(nodes)
    }

    fn walk_field(
        &self,
        id: ObjectId,
        parent: &Inherited,
        pages: &BTreeMap<ObjectId, usize>,
        visited: &mut BTreeSet<ObjectId>,
        nodes: &mut Vec<FieldNode>,
        depth: usize,
    ) {
        if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
            return;
        }
        let Some(dict) = self.resolve_dict(&Object::Reference(id)) else {
            return;
        };

        let partial = dict
            .get(b"T")
            .ok()
            .and_then(|t| self.resolve(t).ok())
            .and_then(decode_text);
        let name = match partial {
            Some(partial) if parent.name.is_empty() => partial,
            Some(partial) => format!("{}.{}", parent.name, partial),
            None => parent.name.clone(),
        };

        let inherited = Inherited {
            name,
            field_type: dict
                .get(b"FT")
                .ok()
                .and_then(|ft| ft.as_name().ok())
                .map(<[u8]>::to_vec)
                .or_else(|| parent.field_type.clone()),
            appearance: dict
                .get(b"DA")
                .ok()
                .and_then(|da| self.resolve(da).ok())
                .and_then(decode_text)
                .or_else(|| parent.appearance.clone()),
        };

        let kids: Vec<ObjectId> = dict
            .get(b"Kids")
            .ok()
            .and_then(|k| self.resolve(k).ok())
            .and_then(|k| k.as_array().ok())
            .map(|kids| kids.iter().filter_map(|k| k.as_reference().ok()).collect())
            .unwrap_or_default();

        let child_fields: Vec<ObjectId> = kids
            .iter()
            .copied()
            .filter(|kid| {
                self.resolve_dict(&Object::Reference(*kid))
                    .map(|d| d.has(b"T"))
                    .unwrap_or(false)
            })
            .collect();

        if !child_fields.is_empty() {
            for child in child_fields {
                self.walk_field(child, &inherited, pages, visited, nodes, depth + 1);
            }
            return;
        }

        let widgets = if kids.is_empty() { vec![id] } else { kids };
        let first_widget = widgets.iter().find_map(|w| {
            let rect = self
                .resolve_dict(&Object::Reference(*w))?
                .get(b"Rect")
                .ok()
                .and_then(|r| self.resolve(r).ok())
                .and_then(|r| r.as_array().ok())
                .and_then(|r| parse_rect(r))?;
            Some((*w, rect))
        });

        let value = dict
            .get(b"V")
            .ok()
            .and_then(|v| self.resolve(v).ok())
            .and_then(|v| match v {
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                other => decode_text(other),
            });

        let field = FormField {
            name: inherited.name,
            kind: FormFieldKind::from_type(inherited.field_type.as_deref()),
            value,
            rect: first_widget.map(|(_, rect)| rect),
            page: first_widget
                .and_then(|(w, _)| pages.get(&w).copied())
                .or_else(|| widgets.iter().find_map(|w| pages.get(w).copied())),
            font_size: inherited
                .appearance
                .as_deref()
                .and_then(font_size_from_appearance),
        };

        nodes.push(FieldNode {
            id,
            field,
            widgets,
        });
    }

    /// Map each annotation ID to the page (1-indexed) listing it
    fn widget_pages(&self) -> BTreeMap<ObjectId, usize> {
        let mut pages = BTreeMap::new();
        for (number, page_id) in self.inner().get_pages() {
            let annots = self
                .inner()
                .get_object(page_id)
                .ok()
                .and_then(|p| p.as_dict().ok())
                .and_then(|p| p.get(b"Annots").ok())
                .and_then(|a| self.resolve(a).ok())
                .and_then(|a| a.as_array().ok());
            for annot in annots.into_iter().flatten() {
                if let Ok(id) = annot.as_reference() {
                    pages.entry(id).or_insert(number as usize);
                }
            }
        }
        pages
    }

    /// Name of a checkbox widget's on-state, from its normal appearances
    fn on_state(&self, widget: ObjectId) -> Vec<u8> {
        self.resolve_dict(&Object::Reference(widget))
            .and_then(|w| w.get(b"AP").ok().and_then(|ap| self.resolve_dict(ap)))
            .and_then(|ap| ap.get(b"N").ok().and_then(|n| self.resolve_dict(n)))
            .and_then(|normal| {
                normal
                    .iter()
                    .map(|(key, _)| key.clone())
                    .find(|key| key.as_slice() != b"Off")
            })
            .unwrap_or_else(|| b"Yes".to_vec())
    }

    fn field_dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.inner_mut()
            .get_object_mut(id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Form field is not a dictionary".to_string()))
    }

    /// Set an entry of the `/AcroForm` dictionary, direct or referenced
    fn set_form_entry(&mut self, key: &str, value: Object) -> Result<()> {
        let entry = self.catalog_mut()?.get(b"AcroForm").ok().cloned();
        match entry {
            Some(Object::Reference(id)) => {
                self.field_dict_mut(id)?.set(key, value);
            }
            Some(Object::Dictionary(mut form)) => {
                form.set(key, value);
                self.catalog_mut()?.set("AcroForm", form);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte-wise)
fn decode_text(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Encode a text string, switching to UTF-16BE for non-ASCII content
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn parse_rect(values: &[Object]) -> Option<[f64; 4]> {
    if values.len() < 4 {
        return None;
    }
    let num = |o: &Object| {
        o.as_f32()
            .map(|v| v as f64)
            .ok()
            .or_else(|| o.as_i64().ok().map(|v| v as f64))
    };
    let (x1, y1, x2, y2) = (
        num(&values[0])?,
        num(&values[1])?,
        num(&values[2])?,
        num(&values[3])?,
    );
    Some([x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)])
}

/// Font size operand of the `Tf` operator in a default appearance string
///
/// A size of zero means auto-size and yields `None`.
fn font_size_from_appearance(appearance: &str) -> Option<f64> {
    let tokens: Vec<&str> = appearance.split_whitespace().collect();
    let index = tokens.iter().position(|t| *t == "Tf")?;
    let size: f64 = tokens.get(index.checked_sub(1)?)?.parse().ok()?;
    (size > 0.0).then_some(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageSpec;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    /// Page with a text field, a checkbox and a nested `addr.city` field
    fn form_document() -> PdfDocument {
        let mut doc = PdfDocument::single_page(&PageSpec::new(612.0, 792.0), &[]).unwrap();
        let page_id = doc.first_page_id().unwrap();

        let on = doc
            .inner_mut()
            .add_object(lopdf::Stream::new(Dictionary::new(), Vec::new()));
        let name = doc.inner_mut().add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("Customer Name"),
            "DA" => Object::string_literal("/Helv 11 Tf 0 g"),
            "Rect" => vec![100.into(), 672.into(), 300.into(), 692.into()],
            "AP" => dictionary! { "N" => on },
        });
        let agree = doc.inner_mut().add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal("agree"),
            "Rect" => vec![50.into(), 600.into(), 70.into(), 620.into()],
            "AP" => dictionary! { "N" => dictionary! { "On" => on, "Off" => on } },
        });
        let city = doc.inner_mut().add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "T" => Object::string_literal("city"),
            "Rect" => vec![100.into(), 500.into(), 200.into(), 520.into()],
        });
        let addr = doc.inner_mut().add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("addr"),
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "Kids" => vec![Object::Reference(city)],
        });

        doc.page_dict_mut(page_id).unwrap().set(
            "Annots",
            vec![
                Object::Reference(name),
                Object::Reference(agree),
                Object::Reference(city),
            ],
        );
        let form = doc.inner_mut().add_object(dictionary! {
            "Fields" => vec![
                Object::Reference(name),
                Object::Reference(agree),
                Object::Reference(addr),
            ],
        });
        doc.catalog_mut().unwrap().set("AcroForm", form);
        doc
    }

    #[test]
    fn test_form_fields_listing() {
        let doc = form_document();
        let fields = doc.form_fields().unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Customer Name", "agree", "addr.city"]);

        assert_eq!(fields[0].kind, FormFieldKind::Text);
        assert_eq!(fields[0].rect, Some([100.0, 672.0, 300.0, 692.0]));
        assert_eq!(fields[0].font_size, Some(11.0));
        assert_eq!(fields[0].page, Some(1));

        assert_eq!(fields[1].kind, FormFieldKind::Button);
        assert_eq!(fields[2].kind, FormFieldKind::Text);
        assert_eq!(fields[2].font_size, None);
    }

    #[test]
    fn test_no_form() {
        let doc = PdfDocument::single_page(&PageSpec::new(100.0, 100.0), &[]).unwrap();
        assert!(!doc.has_form());
        assert!(matches!(doc.form_fields(), Err(PdfError::NoForm)));
    }

    #[test]
    fn test_fill_form_sets_values() {
        let mut doc = form_document();
        let values = HashMap::from([
            ("Customer Name".to_string(), FieldValue::Text("Ada".to_string())),
            ("agree".to_string(), FieldValue::Checked(true)),
            ("unrelated".to_string(), FieldValue::Text("x".to_string())),
        ]);
        assert_eq!(doc.fill_form(&values).unwrap(), 2);

        let fields = doc.form_fields().unwrap();
        assert_eq!(fields[0].value.as_deref(), Some("Ada"));
        assert_eq!(fields[1].value.as_deref(), Some("On"));
        assert_eq!(fields[2].value, None);

        let form = doc.acro_form().unwrap();
        assert_eq!(form.get(b"NeedAppearances").unwrap().as_bool().unwrap(), true);
    }

    #[test]
    fn test_fill_unchecked_box() {
        let mut doc = form_document();
        let values = HashMap::from([("agree".to_string(), FieldValue::Checked(false))]);
        assert_eq!(doc.fill_form(&values).unwrap(), 1);
        assert_eq!(doc.form_fields().unwrap()[1].value.as_deref(), Some("Off"));
    }

    #[test]
    fn test_text_string_encoding() {
        assert_eq!(decode_text(&text_string("plain")).unwrap(), "plain");
        assert_eq!(decode_text(&text_string("café")).unwrap(), "café");
    }

    #[test]
    fn test_font_size_from_appearance() {
        assert_eq!(font_size_from_appearance("/Helv 12 Tf 0 g"), Some(12.0));
        assert_eq!(font_size_from_appearance("/Helv 0 Tf 0 g"), None);
        assert_eq!(font_size_from_appearance("0 g"), None);
    }
}
