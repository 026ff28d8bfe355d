//! Form flattening
//!
//! Widget annotations paint above page content, so any overlay merged onto
//! a fillable PDF is hidden behind them unless they are removed. Flattening
//! strips the widgets from every page and drops the catalog's `/AcroForm`,
//! leaving only static page marks.

use crate::document::PdfDocument;
use crate::Result;
use lopdf::Object;
use log::debug;

/// Flatten a serialized PDF: strip form widgets and the form definition
pub fn flatten(pdf: &[u8]) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::open_from_bytes(pdf)?;
    doc.flatten_form()?;
    doc.to_bytes()
}

impl PdfDocument {
    /// Remove widget annotations from every page and the interactive form
    pub fn flatten_form(&mut self) -> Result<()> {
        let removed = self.strip_widgets()?;
        let had_form = self.remove_acro_form()?;
        debug!("Flattened form: {removed} widgets removed, AcroForm present: {had_form}");
        Ok(())
    }

    /// Remove widget annotations from every page
    ///
    /// Non-widget annotations (links, comments) are kept. An `/Annots`
    /// entry that cannot be resolved is dropped entirely.
    ///
    /// # Returns
    /// Number of widget annotations removed
    pub fn strip_widgets(&mut self) -> Result<usize> {
        let mut removed = 0;

        for page_id in self.get_page_ids() {
            let annots = {
                let page = self.inner().get_object(page_id)?;
                match page.as_dict().ok().and_then(|d| d.get(b"Annots").ok()) {
                    Some(annots) => annots.clone(),
                    None => continue,
                }
            };

            let kept = match self.resolve(&annots).and_then(|a| Ok(a.as_array()?.clone())) {
                Ok(entries) => {
                    let before = entries.len();
                    let kept: Vec<Object> = entries
                        .into_iter()
                        .filter(|entry| !self.is_widget(entry))
                        .collect();
                    removed += before - kept.len();
                    kept
                }
                Err(_) => Vec::new(),
            };

            let page_dict = self.page_dict_mut(page_id)?;
            if kept.is_empty() {
                page_dict.remove(b"Annots");
            } else {
                page_dict.set("Annots", Object::Array(kept));
            }
        }

        Ok(removed)
    }

    /// Remove the catalog's `/AcroForm` entry
    ///
    /// # Returns
    /// Whether the document had an interactive form
    pub fn remove_acro_form(&mut self) -> Result<bool> {
        Ok(self.catalog_mut()?.remove(b"AcroForm").is_some())
    }

    fn is_widget(&self, annotation: &Object) -> bool {
        self.resolve(annotation)
            .ok()
            .and_then(|a| a.as_dict().ok())
            .and_then(|d| d.get(b"Subtype").ok())
            .and_then(|s| s.as_name().ok())
            .map(|name| name == b"Widget")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageSpec;
    use lopdf::dictionary;

    fn doc_with_annotations() -> PdfDocument {
        let mut doc = PdfDocument::single_page(&PageSpec::new(612.0, 792.0), &[]).unwrap();
        let page_id = doc.first_page_id().unwrap();

        let widget = doc.inner_mut().add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("name"),
            "Rect" => vec![100.into(), 500.into(), 300.into(), 520.into()],
        });
        let link = doc.inner_mut().add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        });
        doc.page_dict_mut(page_id)
            .unwrap()
            .set("Annots", vec![Object::Reference(widget), Object::Reference(link)]);

        let form = doc.inner_mut().add_object(dictionary! {
            "Fields" => vec![Object::Reference(widget)],
        });
        doc.catalog_mut().unwrap().set("AcroForm", form);
        doc
    }

    #[test]
    fn test_strip_widgets_keeps_links() {
        let mut doc = doc_with_annotations();
        assert_eq!(doc.strip_widgets().unwrap(), 1);

        let page_id = doc.first_page_id().unwrap();
        let page = doc.inner().get_object(page_id).unwrap().as_dict().unwrap();
        assert_eq!(page.get(b"Annots").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_flatten_removes_form() {
        let mut doc = doc_with_annotations();
        let bytes = doc.to_bytes().unwrap();

        let flat = flatten(&bytes).unwrap();
        let mut reopened = PdfDocument::open_from_bytes(&flat).unwrap();
        assert!(!reopened.remove_acro_form().unwrap());
        assert_eq!(reopened.strip_widgets().unwrap(), 0);
    }

    #[test]
    fn test_flatten_plain_document_is_harmless() {
        let mut doc = PdfDocument::single_page(&PageSpec::new(100.0, 100.0), &[]).unwrap();
        let bytes = doc.to_bytes().unwrap();
        let flat = flatten(&bytes).unwrap();
        assert_eq!(PdfDocument::open_from_bytes(&flat).unwrap().page_count(), 1);
    }
}
