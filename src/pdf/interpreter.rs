//! Content stream interpretation.
//!
//! Walks a page's operators tracking the graphics and text state, and
//! reports every glyph painted by a text-showing operator together with its
//! page-space box. Both text extraction and glyph removal work from these
//! events, so they always agree on which bytes produced which glyph.
//! Form XObjects painted with `Do` are interpreted in place, inside the
//! current transformation matrix.

use log::debug;
use lopdf::content::Operation;
use lopdf::Object;

use super::fonts::{FontCatalog, FontInfo};
use super::forms::FormCatalog;
use super::geometry::{object_to_f64, transform_from_operands, PageFrame, PdfTransform, Point, Rect};

/// One glyph painted by a show operator
#[derive(Debug, Clone)]
pub struct GlyphEvent {
    /// Raw string bytes for this glyph's code
    pub bytes: Vec<u8>,
    pub code: u32,
    /// Unicode text, possibly empty or several chars for ligatures
    pub text: String,
    /// Glyph box in page coordinates
    pub bbox: Rect,
    /// Pen position before the glyph, in page coordinates
    pub origin: Point,
    /// Horizontal displacement in text space
    pub advance: f64,
    /// Font size after text and CTM scaling
    pub size: f64,
}

/// An element of a show operator, in operand order
#[derive(Debug, Clone)]
pub enum ShowItem {
    /// A `TJ` number, in thousandths of text space units
    Adjust(f64),
    Glyph(GlyphEvent),
}

/// Content stream a show operator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLocation {
    Page,
    /// A form painted directly by the page; holds the index of its `Do`
    Form(usize),
    /// A form painted from inside another form
    NestedForm,
}

/// Everything painted by one `Tj`, `TJ`, `'` or `"` operator
#[derive(Debug, Clone)]
pub struct ShowEvent {
    pub location: StreamLocation,
    /// Index of the operator in its stream's operation list
    pub op_index: usize,
    /// Font resource name in effect
    pub font_name: String,
    /// `Tf` size operand
    pub font_size: f64,
    /// `Tz` as a fraction
    pub horizontal_scaling: f64,
    pub items: Vec<ShowItem>,
}

impl ShowEvent {
    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphEvent> {
        self.items.iter().filter_map(|item| match item {
            ShowItem::Glyph(glyph) => Some(glyph),
            ShowItem::Adjust(_) => None,
        })
    }

    /// Converts a text-space displacement to the equivalent `TJ` number
    pub fn advance_to_adjustment(&self, advance: f64) -> f64 {
        let scale = self.font_size * self.horizontal_scaling;
        if scale.abs() < f64::EPSILON {
            0.0
        } else {
            -advance * 1000.0 / scale
        }
    }
}

#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    font_name: Option<String>,
    font_size: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            font_name: None,
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: PdfTransform,
    text: TextState,
}

struct Interpreter<'a> {
    fonts: &'a FontCatalog,
    forms: &'a FormCatalog,
    frame: &'a PageFrame,
    location: StreamLocation,
    depth: usize,
    fallback: FontInfo,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: PdfTransform,
    line_matrix: PdfTransform,
    events: Vec<ShowEvent>,
}

/// Form nesting depth past which `Do` is ignored
const MAX_DO_DEPTH: usize = 8;

/// Interpret a page's operations and collect its show events.
pub fn collect_show_events(
    operations: &[Operation],
    fonts: &FontCatalog,
    forms: &FormCatalog,
    frame: &PageFrame,
) -> Vec<ShowEvent> {
    let state = GraphicsState {
        ctm: PdfTransform::identity(),
        text: TextState::default(),
    };
    let mut interpreter = Interpreter::new(fonts, forms, frame, StreamLocation::Page, 0, state);
    interpreter.run(operations);
    interpreter.events
}

fn number(operands: &[Object], i: usize) -> Option<f64> {
    operands.get(i).and_then(object_to_f64)
}

impl<'a> Interpreter<'a> {
    fn new(
        fonts: &'a FontCatalog,
        forms: &'a FormCatalog,
        frame: &'a PageFrame,
        location: StreamLocation,
        depth: usize,
        state: GraphicsState,
    ) -> Self {
        Self {
            fonts,
            forms,
            frame,
            location,
            depth,
            fallback: FontInfo::helvetica(),
            state,
            stack: Vec::new(),
            text_matrix: PdfTransform::identity(),
            line_matrix: PdfTransform::identity(),
            events: Vec::new(),
        }
    }

    fn run(&mut self, operations: &[Operation]) {
        for (index, op) in operations.iter().enumerate() {
            self.apply(index, op);
        }
    }

    fn apply(&mut self, index: usize, op: &Operation) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = transform_from_operands(operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = PdfTransform::identity();
                self.line_matrix = PdfTransform::identity();
            }
            "Tc" => {
                if let Some(v) = number(operands, 0) {
                    self.state.text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = number(operands, 0) {
                    self.state.text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = number(operands, 0) {
                    self.state.text.horizontal_scaling = v / 100.0;
                }
            }
            "TL" => {
                if let Some(v) = number(operands, 0) {
                    self.state.text.leading = v;
                }
            }
            "Ts" => {
                if let Some(v) = number(operands, 0) {
                    self.state.text.rise = v;
                }
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.state.text.font_name = Some(String::from_utf8_lossy(name).into_owned());
                }
                if let Some(size) = number(operands, 1) {
                    self.state.text.font_size = size;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.state.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = transform_from_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let items = self.show_string(bytes);
                    self.push_event(index, items);
                }
            }
            "TJ" => {
                if let Some(Object::Array(array)) = operands.first() {
                    let items = self.show_array(array);
                    self.push_event(index, items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let items = self.show_string(bytes);
                    self.push_event(index, items);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (number(operands, 0), number(operands, 1)) {
                    self.state.text.word_spacing = aw;
                    self.state.text.char_spacing = ac;
                }
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let items = self.show_string(bytes);
                    self.push_event(index, items);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.paint_form(index, &String::from_utf8_lossy(name));
                }
            }
            _ => {}
        }
    }

    fn paint_form(&mut self, index: usize, name: &str) {
        let forms = self.forms;
        let Some(form) = forms.get(name) else {
            return;
        };
        if self.depth >= MAX_DO_DEPTH {
            debug!("Form {} nested too deeply, not interpreted", name);
            return;
        }

        let location = match self.location {
            StreamLocation::Page => StreamLocation::Form(index),
            _ => StreamLocation::NestedForm,
        };
        let state = GraphicsState {
            ctm: form.matrix.then(&self.state.ctm),
            text: self.state.text.clone(),
        };
        let mut nested = Interpreter::new(&form.fonts, &form.forms, self.frame, location, self.depth + 1, state);
        nested.run(&form.operations);
        self.events.append(&mut nested.events);
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = PdfTransform::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn push_event(&mut self, op_index: usize, items: Vec<ShowItem>) {
        let text = &self.state.text;
        self.events.push(ShowEvent {
            location: self.location,
            op_index,
            font_name: text.font_name.clone().unwrap_or_default(),
            font_size: text.font_size,
            horizontal_scaling: text.horizontal_scaling,
            items,
        });
    }

    fn current_font(&self) -> &FontInfo {
        match self.state.text.font_name.as_deref().and_then(|name| self.fonts.get(name)) {
            Some(font) => font,
            None => {
                debug!(
                    "Font {:?} not in page resources, measuring with Helvetica",
                    self.state.text.font_name
                );
                &self.fallback
            }
        }
    }

    fn show_array(&mut self, array: &[Object]) -> Vec<ShowItem> {
        let mut items = Vec::new();
        for element in array {
            match element {
                Object::String(bytes, _) => items.extend(self.show_string(bytes)),
                other => {
                    if let Some(n) = object_to_f64(other) {
                        let text = &self.state.text;
                        let tx = -n / 1000.0 * text.font_size * text.horizontal_scaling;
                        self.text_matrix = PdfTransform::translation(tx, 0.0).then(&self.text_matrix);
                        items.push(ShowItem::Adjust(n));
                    }
                }
            }
        }
        items
    }

    fn show_string(&mut self, bytes: &[u8]) -> Vec<ShowItem> {
        let font = self.current_font().clone();
        let text = self.state.text.clone();
        let ctm = self.state.ctm;

        let mut items = Vec::new();
        let mut offset = 0;
        for (code, len) in font.codes(bytes) {
            let glyph_bytes = bytes[offset..offset + len].to_vec();
            offset += len;

            let render = PdfTransform::new(
                text.font_size * text.horizontal_scaling,
                0.0,
                0.0,
                text.font_size,
                0.0,
                text.rise,
            )
            .then(&self.text_matrix)
            .then(&ctm);

            let width = font.width(code);
            let corners = [
                (0.0, font.descent),
                (width, font.descent),
                (width, font.ascent),
                (0.0, font.ascent),
            ]
            .map(|(x, y)| self.frame.to_page(render.transform_point(euclid::point2(x, y))));
            let bbox = Rect::from_points(&corners).unwrap_or_default();
            let origin = self.frame.to_page(render.transform_point(euclid::point2(0.0, 0.0)));

            let device = self.text_matrix.then(&ctm);
            let size = text.font_size * device.m21.hypot(device.m22);

            let word_spacing = if font.is_word_space(code, len) { text.word_spacing } else { 0.0 };
            let advance = (width * text.font_size + text.char_spacing + word_spacing) * text.horizontal_scaling;
            self.text_matrix = PdfTransform::translation(advance, 0.0).then(&self.text_matrix);

            items.push(ShowItem::Glyph(GlyphEvent {
                bytes: glyph_bytes,
                code,
                text: font.decode(code),
                bbox,
                origin,
                advance,
                size,
            }));
        }
        items
    }
}
