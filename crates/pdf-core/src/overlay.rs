//! Overlay merging
//!
//! Composites the first page of a freshly rendered overlay document onto the
//! first page of a background document. Two independent techniques are
//! provided behind [`MergeBackend`]:
//!
//! - [`ContentAppendMerge`] decodes the overlay's content stream, renames its
//!   resources to avoid collisions and appends it to the background page's
//!   content list. It flattens the result as part of the merge.
//! - [`FormXObjectMerge`] wraps the overlay page in a Form XObject with its
//!   own resources and paints it with a single `Do`. It leaves flattening to
//!   a separate [`crate::flatten`] pass.
//!
//! In both cases the background's existing content is bracketed with `q`/`Q`
//! and the overlay is appended after it, so overlay marks paint on top.

use crate::document::PdfDocument;
use crate::{PdfError, Result};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// One technique for compositing an overlay page onto a background page
pub trait MergeBackend: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Merge `overlay` (a single-page PDF) on top of the first page of
    /// `background`, returning a complete single-page PDF.
    fn merge(&self, background: &[u8], overlay: &[u8]) -> Result<Vec<u8>>;
}

/// Resource categories whose names are rewritten in overlay content,
/// paired with the operators that reference them by name.
const RENAMED_CATEGORIES: &[(&[u8], &[&str])] = &[
    (b"Font", &["Tf"]),
    (b"XObject", &["Do"]),
    (b"ExtGState", &["gs"]),
    (b"ColorSpace", &["cs", "CS"]),
    (b"Shading", &["sh"]),
];

/// Overlay page extracted from its own document
struct OverlayPage {
    doc: PdfDocument,
    content: Vec<u8>,
    resources: Dictionary,
    size: (f64, f64),
}

impl OverlayPage {
    fn load(overlay: &[u8]) -> Result<Self> {
        let doc = PdfDocument::open_from_bytes(overlay)?;
        let page_id = doc.first_page_id()?;
        let content = doc.page_content(1)?;
        let resources = doc.effective_resources(page_id)?;
        let size = doc.page_size(1)?;
        Ok(Self {
            doc,
            content,
            resources,
            size,
        })
    }
}

/// Background document prepared for compositing
struct BackgroundPage {
    doc: PdfDocument,
    page_id: ObjectId,
    resources: Dictionary,
}

impl BackgroundPage {
    fn load(background: &[u8]) -> Result<Self> {
        let mut doc = PdfDocument::open_from_bytes(background)?;
        doc.retain_first_page();
        let page_id = doc.first_page_id()?;
        let resources = doc.effective_resources(page_id)?;
        Ok(Self {
            doc,
            page_id,
            resources,
        })
    }

    /// Resource sub-dictionary for a category, created if absent
    fn category(&self, key: &[u8]) -> Dictionary {
        self.resources
            .get(key)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the page's content list with
    /// `q <background...> Q <overlay>` and install the merged resources.
    fn install(&mut self, overlay_content: Vec<u8>) -> Result<()> {
        let existing = self.doc.normalized_content_refs(self.page_id)?;

        let save = self.doc.add_content_stream(b"q\n".to_vec());
        let restore = self.doc.add_content_stream(b"\nQ\n".to_vec());
        let overlay = self.doc.add_content_stream(overlay_content);

        let mut contents = Vec::with_capacity(existing.len() + 3);
        contents.push(Object::Reference(save));
        contents.extend(existing);
        contents.push(Object::Reference(restore));
        contents.push(Object::Reference(overlay));

        let resources = std::mem::take(&mut self.resources);
        let page = self.doc.page_dict_mut(self.page_id)?;
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }
}

/// Pick a key not yet present in `dict`, starting from `base`
fn unique_name(dict: &Dictionary, base: &[u8]) -> Vec<u8> {
    if !dict.has(base) {
        return base.to_vec();
    }
    (1u32..)
        .map(|n| {
            let mut candidate = base.to_vec();
            candidate.extend_from_slice(n.to_string().as_bytes());
            candidate
        })
        .find(|candidate| !dict.has(candidate))
        .unwrap_or_else(|| base.to_vec())
}

/// Back-end A: inline the overlay's operators into the background page
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentAppendMerge;

impl ContentAppendMerge {
    /// Copy the overlay's resources into the background page, returning
    /// the rename map per category.
    fn merge_resources(
        background: &mut BackgroundPage,
        overlay: &OverlayPage,
    ) -> Result<HashMap<(Vec<u8>, Vec<u8>), Vec<u8>>> {
        let mut renames = HashMap::new();
        let mut imported = BTreeMap::new();

        for (category, entries) in overlay.resources.iter() {
            let Ok(entries) = entries.as_dict() else {
                continue;
            };
            let renamed = RENAMED_CATEGORIES
                .iter()
                .any(|(name, _)| *name == category.as_slice());
            let mut target = background.category(category);

            for (key, value) in entries.iter() {
                let new_key = if renamed {
                    let mut base = b"Ov".to_vec();
                    base.extend_from_slice(key);
                    unique_name(&target, &base)
                } else if target.has(key) {
                    return Err(PdfError::MergeError(format!(
                        "Resource name collision in /{}",
                        String::from_utf8_lossy(category)
                    )));
                } else {
                    key.clone()
                };

                let copied =
                    background
                        .doc
                        .import_object(overlay.doc.inner(), value, &mut imported)?;
                target.set(new_key.clone(), copied);
                if new_key != *key {
                    renames.insert((category.clone(), key.clone()), new_key);
                }
            }

            background
                .resources
                .set(category.clone(), Object::Dictionary(target));
        }

        Ok(renames)
    }

    /// Rewrite resource names referenced by the overlay's operators
    fn rename_operands(
        content: &[u8],
        renames: &HashMap<(Vec<u8>, Vec<u8>), Vec<u8>>,
    ) -> Result<Vec<u8>> {
        if renames.is_empty() {
            return Ok(content.to_vec());
        }

        let mut decoded = Content::decode(content)?;
        for operation in decoded.operations.iter_mut() {
            let Some((category, _)) = RENAMED_CATEGORIES
                .iter()
                .find(|(_, ops)| ops.contains(&operation.operator.as_str()))
            else {
                continue;
            };
            if let Some(Object::Name(name)) = operation.operands.first_mut() {
                if let Some(new_name) = renames.get(&(category.to_vec(), name.clone())) {
                    *name = new_name.clone();
                }
            }
        }
        Ok(decoded.encode()?)
    }
}

impl MergeBackend for ContentAppendMerge {
    fn name(&self) -> &'static str {
        "content-append"
    }

    fn merge(&self, background: &[u8], overlay: &[u8]) -> Result<Vec<u8>> {
        let overlay = OverlayPage::load(overlay)?;
        let mut background = BackgroundPage::load(background)?;

        let renames = Self::merge_resources(&mut background, &overlay)?;
        let content = Self::rename_operands(&overlay.content, &renames)?;
        debug!(
            "content-append: {} renamed resources, {} bytes of overlay content",
            renames.len(),
            content.len()
        );

        background.install(content)?;

        let mut doc = background.doc;
        doc.flatten_form()?;
        doc.inner_mut().prune_objects();
        doc.to_bytes()
    }
}

/// Back-end B: stamp the overlay page as a Form XObject
#[derive(Debug, Default, Clone, Copy)]
pub struct FormXObjectMerge;

impl MergeBackend for FormXObjectMerge {
    fn name(&self) -> &'static str {
        "form-xobject"
    }

    fn merge(&self, background: &[u8], overlay: &[u8]) -> Result<Vec<u8>> {
        let overlay = OverlayPage::load(overlay)?;
        let mut background = BackgroundPage::load(background)?;

        let mut imported = BTreeMap::new();
        let resources = background.doc.import_object(
            overlay.doc.inner(),
            &Object::Dictionary(overlay.resources.clone()),
            &mut imported,
        )?;

        let (width, height) = overlay.size;
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "FormType" => 1,
                "BBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                "Resources" => resources,
            },
            overlay.content,
        );
        let form_id = background.doc.inner_mut().add_object(form);

        let mut xobjects = background.category(b"XObject");
        let name = unique_name(&xobjects, b"Overlay");
        xobjects.set(name.clone(), Object::Reference(form_id));
        background
            .resources
            .set("XObject", Object::Dictionary(xobjects));

        let mut stamp = b"q /".to_vec();
        stamp.extend_from_slice(&name);
        stamp.extend_from_slice(b" Do Q\n");
        debug!("form-xobject: overlay stamped as /{}", String::from_utf8_lossy(&name));

        background.install(stamp)?;
        background.doc.to_bytes()
    }
}
