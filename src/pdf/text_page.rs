//! Structured text geometry: blocks → lines → spans.
//!
//! Glyphs are grouped in content-stream order. A line ends when the
//! baseline moves, when the pen jumps backward, or when a horizontal gap is
//! too wide to be a word space. Spans split on font or size changes, and
//! blocks split on large vertical gaps.

use super::geometry::{Point, Rect};
use super::interpreter::{GlyphEvent, ShowEvent};

/// Baseline shift, as a fraction of font size, that starts a new line
const BASELINE_TOLERANCE: f64 = 0.5;
/// Backward pen jump, as a fraction of font size, that starts a new line
const BACKWARD_TOLERANCE: f64 = 0.5;
/// Forward gap, as a fraction of font size, that starts a new line
const LINE_GAP_FACTOR: f64 = 3.0;
/// Forward gap, as a fraction of font size, treated as a word space
const WORD_GAP_FACTOR: f64 = 0.25;
const SIZE_EPSILON: f64 = 0.01;

/// Run of text with uniform font and size
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub bbox: Rect,
    /// Baseline origin of the first glyph
    pub origin: Point,
    pub font: String,
    pub size: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// Span texts joined by a single space
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the line has no visible text
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

/// Text geometry of one page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextPage {
    pub blocks: Vec<TextBlock>,
}

impl TextPage {
    /// Group the glyphs of a page's show events
    pub fn from_events(events: &[ShowEvent]) -> Self {
        let mut builder = Builder::default();
        for event in events {
            for glyph in event.glyphs() {
                builder.push(&event.font_name, glyph);
            }
        }
        builder.finish()
    }

    /// Every line on the page, in block order
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|block| block.lines.iter())
    }

    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines.len()).sum()
    }
}

#[derive(Default)]
struct Builder {
    blocks: Vec<TextBlock>,
    lines: Vec<TextLine>,
    spans: Vec<TextSpan>,
    span: Option<TextSpan>,
    last: Option<GlyphEvent>,
}

impl Builder {
    fn push(&mut self, font: &str, glyph: &GlyphEvent) {
        let mut needs_space = false;
        if let Some(last) = &self.last {
            let size = last.size.max(glyph.size).max(1.0);
            let baseline_shift = (glyph.origin.y - last.origin.y).abs();
            let gap = glyph.origin.x - last.bbox.x1;

            if baseline_shift > BASELINE_TOLERANCE * size
                || glyph.origin.x < last.origin.x - BACKWARD_TOLERANCE * size
                || gap > LINE_GAP_FACTOR * size
            {
                self.end_line();
            } else if gap > WORD_GAP_FACTOR * size
                && !ends_with_whitespace(&last.text)
                && !starts_with_whitespace(&glyph.text)
            {
                needs_space = true;
            }
        }

        let same_style = self
            .span
            .as_ref()
            .is_some_and(|span| span.font == font && (span.size - glyph.size).abs() < SIZE_EPSILON);

        match self.span.as_mut() {
            Some(span) if same_style => {
                if needs_space {
                    span.text.push(' ');
                }
                span.text.push_str(&glyph.text);
                span.bbox = span.bbox.union(&glyph.bbox);
            }
            _ => {
                if let Some(span) = self.span.take() {
                    self.spans.push(span);
                }
                self.span = Some(TextSpan {
                    bbox: glyph.bbox,
                    origin: glyph.origin,
                    font: font.to_string(),
                    size: glyph.size,
                    text: glyph.text.clone(),
                });
            }
        }
        self.last = Some(glyph.clone());
    }

    fn end_line(&mut self) {
        if let Some(span) = self.span.take() {
            self.spans.push(span);
        }
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let bbox = spans
            .iter()
            .skip(1)
            .fold(spans[0].bbox, |acc, span| acc.union(&span.bbox));
        let line = TextLine { bbox, spans };

        if let Some(previous) = self.lines.last() {
            let gap = line.bbox.y0 - previous.bbox.y1;
            let moved_up = line.bbox.y0 < previous.bbox.y0;
            if moved_up || gap > previous.bbox.height() || !line.bbox.overlaps_horizontally(&previous.bbox) {
                self.end_block();
            }
        }
        self.lines.push(line);
    }

    fn end_block(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.lines);
        let bbox = lines
            .iter()
            .skip(1)
            .fold(lines[0].bbox, |acc, line| acc.union(&line.bbox));
        self.blocks.push(TextBlock { bbox, lines });
    }

    fn finish(mut self) -> TextPage {
        self.end_line();
        self.end_block();
        TextPage { blocks: self.blocks }
    }
}

fn ends_with_whitespace(text: &str) -> bool {
    text.chars().last().is_some_and(char::is_whitespace)
}

fn starts_with_whitespace(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_whitespace)
}
