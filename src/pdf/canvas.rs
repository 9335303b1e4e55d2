//! Page write model.
//!
//! A [`PageCanvas`] owns a decoded copy of a page's content stream. Text is
//! erased by redaction: glyphs whose centre falls inside a redaction
//! rectangle are removed from their show operator (the pen advance is kept
//! as a `TJ` adjustment so the remaining glyphs do not move) and the area
//! is painted white. Glyphs drawn by a Form XObject that the page paints
//! directly are removed from a page-local copy of the form, and the page's
//! `Do` is pointed at the copy. Text in forms nested inside other forms is
//! only covered by the white fill. Inserted text uses a standard Helvetica
//! font registered under a resource name the page does not already use.

use log::debug;
use std::collections::BTreeMap;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::document::inherited_attribute;
use super::encoding::{encode_win_ansi, helvetica_width, HELVETICA_FIRST_CHAR};
use super::fonts::{FontCatalog, FontInfo};
use super::forms::FormCatalog;
use super::geometry::{PageFrame, Point, Rect};
use super::interpreter::{collect_show_events, ShowEvent, ShowItem, StreamLocation};
use super::text_page::TextPage;
use crate::errors::DocumentError;

const INSERT_FONT_PREFIX: &str = "FPdfTrans";
const FORM_COPY_PREFIX: &str = "XPdfTrans";
const HELVETICA_LAST_CHAR: u8 = 126;

fn write_error(error: lopdf::Error) -> DocumentError {
    DocumentError::Write(error.to_string())
}

fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// Mutable view of one page's content
#[derive(Debug)]
pub struct PageCanvas {
    page_id: ObjectId,
    index: usize,
    frame: PageFrame,
    operations: Vec<Operation>,
    fonts: FontCatalog,
    forms: FormCatalog,
    redactions: Vec<Rect>,
    insert_font: String,
    font_used: bool,
    wrapped: bool,
    modified: bool,
}

impl PageCanvas {
    pub(crate) fn new(
        page_id: ObjectId,
        index: usize,
        frame: PageFrame,
        operations: Vec<Operation>,
        fonts: FontCatalog,
        forms: FormCatalog,
    ) -> Self {
        let insert_font = fonts.unused_name(INSERT_FONT_PREFIX);
        Self {
            page_id,
            index,
            frame,
            operations,
            fonts,
            forms,
            redactions: Vec::new(),
            insert_font,
            font_used: false,
            wrapped: false,
            modified: false,
        }
    }

    /// Whether anything has been erased or inserted
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Extract the current text geometry of the page
    pub fn text_page(&self) -> TextPage {
        TextPage::from_events(&self.show_events())
    }

    fn show_events(&self) -> Vec<ShowEvent> {
        collect_show_events(&self.operations, &self.fonts, &self.forms, &self.frame)
    }

    /// Mark an area for erasure; nothing changes until [`apply_redactions`](Self::apply_redactions)
    pub fn add_redaction(&mut self, rect: Rect) {
        self.redactions.push(rect);
    }

    /// Erase every pending redaction.
    ///
    /// Returns the number of glyphs removed from the content stream.
    pub fn apply_redactions(&mut self) -> usize {
        if self.redactions.is_empty() {
            return 0;
        }
        self.ensure_wrapped();
        let redactions = std::mem::take(&mut self.redactions);

        let (mut events, form_events): (Vec<ShowEvent>, Vec<ShowEvent>) = self
            .show_events()
            .into_iter()
            .partition(|event| event.location == StreamLocation::Page);

        // Renaming a `Do` operand leaves page op indices unchanged
        let mut removed = self.erase_in_forms(&form_events, &redactions);

        // Splice from the back so earlier op indices stay valid
        events.sort_by(|a, b| b.op_index.cmp(&a.op_index));
        for event in &events {
            if let Some((replacement, count)) = rebuild_show(event, &self.operations[event.op_index], &redactions) {
                removed += count;
                self.operations.splice(event.op_index..=event.op_index, replacement);
            }
        }

        for rect in &redactions {
            let (x, y, w, h) = self.frame.rect_to_user_space(rect);
            self.operations.extend([
                Operation::new("q", vec![]),
                Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
                Operation::new("re", vec![real(x), real(y), real(w), real(h)]),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }

        debug!(
            "Page {}: applied {} redaction(s), removed {} glyph(s)",
            self.index + 1,
            redactions.len(),
            removed
        );
        self.modified = true;
        removed
    }

    /// Remove covered glyphs from forms painted by the page.
    ///
    /// Each edited form becomes a copy under a fresh name so that other pages
    /// sharing the original stream are unaffected.
    fn erase_in_forms(&mut self, events: &[ShowEvent], redactions: &[Rect]) -> usize {
        let mut by_invocation: BTreeMap<usize, Vec<&ShowEvent>> = BTreeMap::new();
        for event in events {
            match event.location {
                StreamLocation::Form(do_index) => by_invocation.entry(do_index).or_default().push(event),
                _ => {
                    if event.glyphs().any(|g| redactions.iter().any(|r| r.contains(g.bbox.center()))) {
                        debug!("Page {}: text in a nested form is covered but kept", self.index + 1);
                    }
                }
            }
        }

        let mut removed = 0;
        for (do_index, mut form_events) in by_invocation {
            let name = match self.operations[do_index].operands.first() {
                Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
                _ => continue,
            };
            let Some(form) = self.forms.get(&name) else {
                continue;
            };

            let mut operations = form.operations.clone();
            let mut count = 0;
            form_events.sort_by(|a, b| b.op_index.cmp(&a.op_index));
            for event in form_events {
                if let Some((replacement, n)) = rebuild_show(event, &operations[event.op_index], redactions) {
                    count += n;
                    operations.splice(event.op_index..=event.op_index, replacement);
                }
            }
            if count == 0 {
                continue;
            }

            let copy = form.edited(operations);
            let target = if form.is_copy() {
                name
            } else {
                self.forms.unused_name(FORM_COPY_PREFIX)
            };
            debug!("Page {}: removed {} glyph(s) from form {}", self.index + 1, count, target);
            self.operations[do_index].operands[0] = Object::Name(target.as_bytes().to_vec());
            self.forms.insert(target, copy);
            removed += count;
        }
        removed
    }

    /// Insert a single line of text with its baseline starting at `point`
    pub fn insert_text(&mut self, point: Point, text: &str, size: f64) {
        self.ensure_wrapped();
        let (x, y) = self.frame.to_user_space(point);
        let (bytes, replaced) = encode_win_ansi(text);
        if replaced > 0 {
            debug!(
                "Page {}: {} character(s) not representable in the default font were replaced",
                self.index + 1,
                replaced
            );
        }

        if !self.font_used {
            self.fonts.insert(self.insert_font.clone(), FontInfo::helvetica());
            self.font_used = true;
        }

        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("g", vec![real(0.0)]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(self.insert_font.as_bytes().to_vec()), real(size)],
            ),
            Operation::new(
                "Tm",
                vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x), real(y)],
            ),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self.modified = true;
    }

    /// Isolate the original content's graphics state from appended operators
    fn ensure_wrapped(&mut self) {
        if self.wrapped {
            return;
        }
        self.operations.insert(0, Operation::new("q", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
        self.wrapped = true;
    }

    /// Write the page's content and resources back into the document
    pub(crate) fn commit(self, doc: &mut Document) -> Result<(), DocumentError> {
        if !self.modified {
            return Ok(());
        }
        let content = Content { operations: self.operations }
            .encode()
            .map_err(write_error)?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        {
            let page = doc.get_object_mut(self.page_id).map_err(write_error)?;
            let page_dict = page.as_dict_mut().map_err(write_error)?;
            page_dict.set("Contents", Object::Reference(content_id));
        }

        for (name, form) in self.forms.copies() {
            let content = Content {
                operations: form.operations.clone(),
            }
            .encode()
            .map_err(write_error)?;
            let form_id = doc.add_object(Stream::new(form.stream_dict(), content));
            register_resource(doc, self.page_id, "XObject", name, form_id)?;
        }

        if self.font_used {
            let font_id = doc.add_object(helvetica_font_dict());
            register_resource(doc, self.page_id, "Font", &self.insert_font, font_id)?;
        }
        Ok(())
    }
}

/// Rebuild a show operator without the glyphs covered by `redactions`.
///
/// Returns `None` when no glyph is covered.
fn rebuild_show(event: &ShowEvent, original: &Operation, redactions: &[Rect]) -> Option<(Vec<Operation>, usize)> {
    let covered = |bbox: &Rect| redactions.iter().any(|r| r.contains(bbox.center()));
    if !event.glyphs().any(|g| covered(&g.bbox)) {
        return None;
    }

    let mut array = Vec::new();
    let mut pending_bytes: Vec<u8> = Vec::new();
    let mut pending_adjust = 0.0;
    let mut removed = 0;

    fn flush_bytes(array: &mut Vec<Object>, bytes: &mut Vec<u8>) {
        if !bytes.is_empty() {
            array.push(Object::String(std::mem::take(bytes), StringFormat::Hexadecimal));
        }
    }
    fn flush_adjust(array: &mut Vec<Object>, adjust: &mut f64) {
        if *adjust != 0.0 {
            array.push(real(*adjust));
            *adjust = 0.0;
        }
    }

    for item in &event.items {
        match item {
            ShowItem::Adjust(n) => {
                flush_bytes(&mut array, &mut pending_bytes);
                pending_adjust += n;
            }
            ShowItem::Glyph(glyph) if covered(&glyph.bbox) => {
                flush_bytes(&mut array, &mut pending_bytes);
                pending_adjust += event.advance_to_adjustment(glyph.advance);
                removed += 1;
            }
            ShowItem::Glyph(glyph) => {
                flush_adjust(&mut array, &mut pending_adjust);
                pending_bytes.extend_from_slice(&glyph.bytes);
            }
        }
    }
    flush_bytes(&mut array, &mut pending_bytes);
    flush_adjust(&mut array, &mut pending_adjust);

    let show = Operation::new("TJ", vec![Object::Array(array)]);
    let replacement = match original.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), show],
        "\"" => {
            let mut ops = Vec::new();
            if let [aw, ac, ..] = original.operands.as_slice() {
                ops.push(Operation::new("Tw", vec![aw.clone()]));
                ops.push(Operation::new("Tc", vec![ac.clone()]));
            }
            ops.push(Operation::new("T*", vec![]));
            ops.push(show);
            ops
        }
        _ => vec![show],
    };
    Some((replacement, removed))
}

fn helvetica_font_dict() -> Dictionary {
    let widths = (HELVETICA_FIRST_CHAR..=HELVETICA_LAST_CHAR)
        .map(|c| Object::Integer(helvetica_width(c) as i64))
        .collect();
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ("FirstChar", Object::Integer(HELVETICA_FIRST_CHAR as i64)),
        ("LastChar", Object::Integer(HELVETICA_LAST_CHAR as i64)),
        ("Widths", Object::Array(widths)),
    ])
}

/// Add `name → id` to the page's `/Resources /<category>` dictionary.
///
/// Shared resource dictionaries are edited in place. Inherited resources
/// are copied onto the page first so siblings are left untouched.
fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    id: ObjectId,
) -> Result<(), DocumentError> {
    let location = {
        let page = doc.get_object(page_id).and_then(Object::as_dict).map_err(write_error)?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => ResourcesLocation::Shared(*id),
            Ok(Object::Dictionary(_)) => ResourcesLocation::Inline,
            _ => ResourcesLocation::Missing,
        }
    };

    let resources_ref = match location {
        ResourcesLocation::Shared(id) => Some(id),
        ResourcesLocation::Inline => None,
        ResourcesLocation::Missing => {
            let inherited = match inherited_attribute(doc, page_id, b"Resources") {
                Some(Object::Dictionary(dict)) => dict,
                _ => Dictionary::new(),
            };
            let page_dict = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(write_error)?;
            page_dict.set("Resources", Object::Dictionary(inherited));
            None
        }
    };

    let key = category.as_bytes();
    let shared_entries = {
        let resources = resources_mut(doc, page_id, resources_ref)?;
        let shared = match resources.get(key) {
            Ok(Object::Reference(entries_id)) => Some(*entries_id),
            _ => None,
        };
        if shared.is_none() {
            if !matches!(resources.get(key), Ok(Object::Dictionary(_))) {
                resources.set(category, Dictionary::new());
            }
            if let Ok(Object::Dictionary(entries)) = resources.get_mut(key) {
                entries.set(name, Object::Reference(id));
            }
        }
        shared
    };

    if let Some(entries_id) = shared_entries {
        let entries = doc
            .get_object_mut(entries_id)
            .and_then(Object::as_dict_mut)
            .map_err(write_error)?;
        entries.set(name, Object::Reference(id));
    }
    Ok(())
}

enum ResourcesLocation {
    Shared(ObjectId),
    Inline,
    Missing,
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    resources_ref: Option<ObjectId>,
) -> Result<&mut Dictionary, DocumentError> {
    match resources_ref {
        Some(id) => doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(write_error),
        None => doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .and_then(|page| page.get_mut(b"Resources"))
            .and_then(Object::as_dict_mut)
            .map_err(write_error),
    }
}
