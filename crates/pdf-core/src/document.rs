//! PDF Document wrapper

use crate::content::{compress, encode_ops, DrawOp};
use crate::font::BuiltinFont;
use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};

/// Page setup for a freshly assembled single-page document
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Document title written to the Info dictionary
    pub title: Option<String>,
    /// Flate-compress the page content stream
    pub compress: bool,
}

impl PageSpec {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            title: None,
            compress: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
}

impl PdfDocument {
    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Assemble a complete single-page document from drawing primitives
    ///
    /// Only the built-in fonts actually referenced by `ops` are added to the
    /// page resources. The page paints nothing besides `ops`, so the result
    /// can serve both as a stand-alone page and as a transparent overlay.
    pub fn single_page(spec: &PageSpec, ops: &[DrawOp]) -> Result<Self> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let fonts: BTreeSet<BuiltinFont> = ops.iter().filter_map(DrawOp::font).collect();
        let mut font_dict = Dictionary::new();
        for font in fonts {
            let font_id = doc.add_object(font.to_dictionary());
            font_dict.set(font.resource_name(), Object::Reference(font_id));
        }

        let body = encode_ops(ops);
        let content = if spec.compress {
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, compress(&body)?)
        } else {
            Stream::new(Dictionary::new(), body)
        };
        let content_id = doc.add_object(content);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), spec.width.into(), spec.height.into()],
            "Resources" => dictionary! { "Font" => font_dict },
            "Contents" => content_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &spec.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
                "Producer" => Object::string_literal("pdfill"),
            });
            doc.trailer.set("Info", info_id);
        }

        Ok(Self { inner: doc })
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Object ID of a page (1-indexed)
    pub fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Object ID of the first page
    pub fn first_page_id(&self) -> Result<ObjectId> {
        self.page_id(1)
    }

    /// Get all page object IDs in order
    pub fn get_page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    /// Object ID of the document catalog
    pub(crate) fn catalog_id(&self) -> Result<ObjectId> {
        self.inner
            .trailer
            .get(b"Root")
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?
            .as_reference()
            .map_err(|_| PdfError::ParseError("Root is not a reference".to_string()))
    }

    /// Mutable access to the document catalog
    pub(crate) fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        let catalog_id = self.catalog_id()?;
        self.inner
            .get_object_mut(catalog_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))
    }

    /// Follow indirect references until a direct object is reached
    pub(crate) fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        let mut current = object;
        // Reference chains longer than this are malformed
        for _ in 0..32 {
            match current {
                Object::Reference(id) => current = self.inner.get_object(*id)?,
                _ => return Ok(current),
            }
        }
        Err(PdfError::ParseError("Reference chain too deep".to_string()))
    }

    /// Resolve an object expected to be a dictionary, cloning it
    pub(crate) fn resolve_dict(&self, object: &Object) -> Option<Dictionary> {
        self.resolve(object)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
    }

    /// Page width and height in points
    ///
    /// Extracts the size from the MediaBox or CropBox, following the
    /// parent chain for inherited boxes.
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;
        let media_box = self.get_inherited_media_box(page_id)?;
        extract_size_from_media_box(&media_box)
    }

    /// Get MediaBox, following parent inheritance chain if needed
    fn get_inherited_media_box(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let obj = self.inner.get_object(current_id)?;
            let dict = obj
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
                let media_box_array = self
                    .resolve(media_box)?
                    .as_array()
                    .map_err(|_| PdfError::ParseError("MediaBox is not an array".to_string()))?
                    .clone();
                return Ok(media_box_array);
            }

            if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
                current_id = *parent_id;
                continue;
            }

            break;
        }

        // Fallback: assume US Letter
        Ok(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ])
    }

    /// Resources dictionary in effect for a page, with inheritance resolved
    /// and each resource category made direct.
    pub(crate) fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut current_id = page_id;
        let mut resources = Dictionary::new();

        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(found) = dict.get(b"Resources") {
                if let Some(found) = self.resolve_dict(found) {
                    resources = found;
                }
                break;
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        let categories: Vec<Vec<u8>> = resources.iter().map(|(k, _)| k.clone()).collect();
        for key in categories {
            let direct = resources
                .get(&key)
                .ok()
                .and_then(|value| self.resolve(value).ok())
                .cloned();
            if let Some(direct) = direct {
                resources.set(key, direct);
            }
        }

        Ok(resources)
    }

    /// Decoded content of a page (all content streams concatenated)
    pub fn page_content(&self, page: usize) -> Result<Vec<u8>> {
        let page_id = self.page_id(page)?;
        let mut combined = Vec::new();
        for item in self.content_refs(page_id)? {
            if let Ok(Object::Stream(stream)) = self.resolve(&item) {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                combined.extend_from_slice(&data);
                combined.push(b'\n');
            }
        }
        Ok(combined)
    }

    /// A page's `/Contents` as a sequence of entries
    ///
    /// A missing entry yields an empty sequence, a single stream or reference
    /// becomes a one-element sequence, and a reference to an array is
    /// expanded. Entries are returned as stored (references or direct
    /// streams).
    pub(crate) fn content_refs(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(Vec::new()),
        };

        let items = match contents {
            Object::Array(arr) => arr.clone(),
            Object::Reference(id) => match self.inner.get_object(*id)? {
                Object::Array(arr) => arr.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Object::Stream(_) => vec![contents.clone()],
            Object::Null => Vec::new(),
            _ => {
                return Err(PdfError::ParseError(
                    "Page Contents is neither a stream nor an array".to_string(),
                ))
            }
        };
        Ok(items)
    }

    /// Normalized content list for a page: every entry an indirect stream
    ///
    /// Direct streams are promoted to indirect objects so the list can be
    /// extended with further references.
    pub(crate) fn normalized_content_refs(&mut self, page_id: ObjectId) -> Result<Vec<Object>> {
        let items = self.content_refs(page_id)?;
        let mut normalized = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Object::Stream(stream) => {
                    let id = self.inner.add_object(stream);
                    normalized.push(Object::Reference(id));
                }
                Object::Reference(_) => normalized.push(item),
                _ => {
                    return Err(PdfError::ParseError(
                        "Page Contents array holds a non-stream entry".to_string(),
                    ))
                }
            }
        }
        Ok(normalized)
    }

    /// Add an uncompressed content stream object
    pub(crate) fn add_content_stream(&mut self, content: Vec<u8>) -> ObjectId {
        self.inner
            .add_object(Stream::new(Dictionary::new(), content))
    }

    /// Mutable access to a page dictionary
    pub(crate) fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
    }

    /// Deep-copy an object from another document into this one
    ///
    /// Referenced objects are copied once and remapped to fresh IDs;
    /// `imported` memoizes the mapping across calls. `/Parent` entries are
    /// dropped so that importing never drags in a foreign page tree.
    pub(crate) fn import_object(
        &mut self,
        source: &Document,
        object: &Object,
        imported: &mut BTreeMap<ObjectId, ObjectId>,
    ) -> Result<Object> {
        Ok(match object {
            Object::Reference(id) => {
                if let Some(mapped) = imported.get(id) {
                    return Ok(Object::Reference(*mapped));
                }
                let new_id = self.inner.new_object_id();
                imported.insert(*id, new_id);
                let copied = match source.get_object(*id) {
                    Ok(target) => self.import_object(source, target, imported)?,
                    Err(_) => Object::Null,
                };
                self.inner.objects.insert(new_id, copied);
                Object::Reference(new_id)
            }
            Object::Dictionary(dict) => {
                Object::Dictionary(self.import_dictionary(source, dict, imported)?)
            }
            Object::Array(items) => {
                let mut copied = Vec::with_capacity(items.len());
                for item in items {
                    copied.push(self.import_object(source, item, imported)?);
                }
                Object::Array(copied)
            }
            Object::Stream(stream) => {
                let dict = self.import_dictionary(source, &stream.dict, imported)?;
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        })
    }

    fn import_dictionary(
        &mut self,
        source: &Document,
        dict: &Dictionary,
        imported: &mut BTreeMap<ObjectId, ObjectId>,
    ) -> Result<Dictionary> {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.import_object(source, value, imported)?);
        }
        Ok(copied)
    }

    /// Drop every page after the first one
    pub(crate) fn retain_first_page(&mut self) {
        let count = self.page_count() as u32;
        if count > 1 {
            let extra: Vec<u32> = (2..=count).collect();
            self.inner.delete_pages(&extra);
        }
    }
}

/// Extract width and height from a MediaBox array
fn extract_size_from_media_box(media_box_array: &[Object]) -> Result<(f64, f64)> {
    if media_box_array.len() < 4 {
        return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
    }

    let num = |index: usize| -> Result<f64> {
        let value = &media_box_array[index];
        value
            .as_f32()
            .map(|v| v as f64)
            .ok()
            .or_else(|| value.as_i64().ok().map(|v| v as f64))
            .ok_or_else(|| PdfError::ParseError(format!("Invalid MediaBox entry {index}")))
    };

    let (x1, y1, x2, y2) = (num(0)?, num(1)?, num(2)?, num(3)?);
    Ok(((x2 - x1).abs(), (y2 - y1).abs()))
}
