//! Document handle: load, page access, save.

use log::{debug, warn};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use super::canvas::PageCanvas;
use super::fonts::{resolve, FontCatalog};
use super::forms::FormCatalog;
use super::geometry::{object_to_f64, PageFrame, Rect};
use super::text_page::TextPage;
use crate::errors::DocumentError;

/// Limit on `/Parent` hops when resolving inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Look up a page attribute, walking up the page tree when the page
/// itself does not define it. References are resolved.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value).clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> PageFrame {
    let values: Option<Vec<f64>> = match inherited_attribute(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) => items.iter().map(|o| object_to_f64(resolve(doc, o))).collect(),
        _ => None,
    };
    match values.as_deref() {
        Some([x0, y0, x1, y1]) => PageFrame::new(Rect::new(*x0, *y0, *x1, *y1)),
        _ => {
            debug!("Page {:?} has no usable MediaBox, assuming US Letter", page_id);
            PageFrame::LETTER
        }
    }
}

/// An opened PDF document
#[derive(Debug)]
pub struct PdfDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    /// Parse a document from bytes
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        let inner = Document::load_mem(bytes)?;
        if inner.trailer.get(b"Root").is_err() {
            return Err(DocumentError::Format("document has no catalog".to_string()));
        }
        let page_ids = inner.get_pages().into_values().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Open a page for reading and editing.
    ///
    /// The returned canvas holds a copy of the page content; edits reach the
    /// document only through [`commit_page`](Self::commit_page).
    pub fn page(&self, index: usize) -> Result<PageCanvas, DocumentError> {
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or_else(|| DocumentError::Format(format!("page index {} out of range", index)))?;

        let content = match self.inner.get_page_content(page_id) {
            Ok(content) => content,
            Err(e) => {
                warn!("Page {}: unreadable content stream ({}), treating as empty", index + 1, e);
                Vec::new()
            }
        };
        let operations = Content::decode(&content)?.operations;

        let resources = inherited_attribute(&self.inner, page_id, b"Resources");
        let resources = resources.as_ref().and_then(|r| r.as_dict().ok());
        let fonts = FontCatalog::from_resources(&self.inner, resources);
        let forms = FormCatalog::from_resources(&self.inner, resources, &fonts);

        Ok(PageCanvas::new(
            page_id,
            index,
            media_box(&self.inner, page_id),
            operations,
            fonts,
            forms,
        ))
    }

    /// Extract the text geometry of a page without editing it
    pub fn text_page(&self, index: usize) -> Result<TextPage, DocumentError> {
        Ok(self.page(index)?.text_page())
    }

    /// Write a page's edits back into the document
    pub fn commit_page(&mut self, canvas: PageCanvas) -> Result<(), DocumentError> {
        canvas.commit(&mut self.inner)
    }

    /// Serialize the document
    pub fn save(&mut self) -> Result<Vec<u8>, DocumentError> {
        let mut output = Vec::new();
        self.inner
            .save_to(&mut output)
            .map_err(|e| DocumentError::Write(e.to_string()))?;
        Ok(output)
    }
}
