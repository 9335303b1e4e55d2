//! Font decoding for text extraction.
//!
//! A [`FontInfo`] turns the raw bytes of a text-showing operator into
//! character codes, Unicode text and advance widths. Simple fonts use one
//! byte per code; Type0 fonts are treated as two-byte (Identity) encodings.

use log::{debug, warn};
use lopdf::{Dictionary, Document, Object};
use std::collections::{BTreeMap, HashMap};

use super::encoding::{glyph_name_to_char, helvetica_width, win_ansi_to_char, HELVETICA_DEFAULT_WIDTH};
use super::geometry::object_to_f64;

const DEFAULT_ASCENT: f64 = 0.8;
const DEFAULT_DESCENT: f64 = -0.2;
const DEFAULT_SIMPLE_WIDTH: f64 = 500.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;
const GLYPH_SPACE_SCALE: f64 = 0.001;

/// Follow an indirect reference, returning the object itself otherwise.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Resolve a dictionary entry to a dictionary, following references.
pub fn get_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let obj = resolve(doc, dict.get(key).ok()?);
    obj.as_dict().ok()
}

fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    dict.get(key).ok().and_then(|o| object_to_f64(resolve(doc, o)))
}

fn get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match resolve(doc, dict.get(key).ok()?) {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// How codes are read from a string operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeWidth {
    OneByte,
    TwoBytes,
}

/// Decoded font resources needed to interpret text-showing operators
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// BaseFont name, for logging
    pub base_font: String,
    code_width: CodeWidth,
    widths: HashMap<u32, f64>,
    default_width: f64,
    /// Multiplier from font width units to text space
    width_scale: f64,
    /// Ascent as a fraction of the font size
    pub ascent: f64,
    /// Descent as a fraction of the font size (negative)
    pub descent: f64,
    to_unicode: Option<HashMap<u32, String>>,
    differences: HashMap<u8, char>,
}

impl FontInfo {
    /// The standard Helvetica font with WinAnsi encoding.
    ///
    /// Used for inserted text and for operators naming a font that the page
    /// resources do not define.
    pub fn helvetica() -> Self {
        Self {
            base_font: "Helvetica".to_string(),
            code_width: CodeWidth::OneByte,
            widths: (32u8..=126).map(|c| (c as u32, helvetica_width(c))).collect(),
            default_width: HELVETICA_DEFAULT_WIDTH,
            width_scale: GLYPH_SPACE_SCALE,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            to_unicode: None,
            differences: HashMap::new(),
        }
    }

    /// Build a font from its dictionary
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = get_name(doc, dict, b"BaseFont").unwrap_or_else(|| "Unknown".to_string());
        let subtype = get_name(doc, dict, b"Subtype").unwrap_or_default();
        let to_unicode = load_to_unicode(doc, dict, &base_font);

        let mut font = if subtype == "Type0" {
            Self::composite(doc, dict, base_font)
        } else {
            Self::simple(doc, dict, base_font, subtype == "Type3")
        };
        font.to_unicode = to_unicode;
        font
    }

    fn simple(doc: &Document, dict: &Dictionary, base_font: String, is_type3: bool) -> Self {
        let descriptor = get_dict(doc, dict, b"FontDescriptor");
        let mut widths = HashMap::new();

        let first_char = get_number(doc, dict, b"FirstChar").unwrap_or(0.0) as u32;
        let explicit_widths = dict
            .get(b"Widths")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok());

        let default_width = descriptor
            .and_then(|d| get_number(doc, d, b"MissingWidth"))
            .filter(|w| *w > 0.0);

        let default_width = if let Some(array) = explicit_widths {
            for (i, w) in array.iter().enumerate() {
                if let Some(w) = object_to_f64(resolve(doc, w)) {
                    widths.insert(first_char + i as u32, w);
                }
            }
            default_width.unwrap_or(DEFAULT_SIMPLE_WIDTH)
        } else if is_helvetica_like(&base_font) {
            widths.extend((32u8..=126).map(|c| (c as u32, helvetica_width(c))));
            default_width.unwrap_or(HELVETICA_DEFAULT_WIDTH)
        } else if base_font.contains("Courier") {
            default_width.unwrap_or(600.0)
        } else {
            debug!("No widths for font {}, using default advance", base_font);
            default_width.unwrap_or(DEFAULT_SIMPLE_WIDTH)
        };

        let width_scale = if is_type3 {
            dict.get(b"FontMatrix")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
                .and_then(|m| m.first())
                .and_then(object_to_f64)
                .unwrap_or(GLYPH_SPACE_SCALE)
        } else {
            GLYPH_SPACE_SCALE
        };

        let (ascent, descent) = metrics_from_descriptor(doc, descriptor);

        Self {
            base_font,
            code_width: CodeWidth::OneByte,
            widths,
            default_width,
            width_scale,
            ascent,
            descent,
            to_unicode: None,
            differences: load_differences(doc, dict),
        }
    }

    fn composite(doc: &Document, dict: &Dictionary, base_font: String) -> Self {
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|a| a.first())
            .and_then(|o| resolve(doc, o).as_dict().ok());

        let mut widths = HashMap::new();
        let mut default_width = DEFAULT_CID_WIDTH;
        let mut descriptor = None;

        if let Some(cid_font) = descendant {
            default_width = get_number(doc, cid_font, b"DW").unwrap_or(DEFAULT_CID_WIDTH);
            descriptor = get_dict(doc, cid_font, b"FontDescriptor");
            if let Some(w) = cid_font.get(b"W").ok().and_then(|o| resolve(doc, o).as_array().ok()) {
                load_cid_widths(doc, w, &mut widths);
            }
        } else {
            warn!("Type0 font {} has no descendant font", base_font);
        }

        let (ascent, descent) = metrics_from_descriptor(doc, descriptor);

        Self {
            base_font,
            code_width: CodeWidth::TwoBytes,
            widths,
            default_width,
            width_scale: GLYPH_SPACE_SCALE,
            ascent,
            descent,
            to_unicode: None,
            differences: HashMap::new(),
        }
    }

    pub fn code_width(&self) -> CodeWidth {
        self.code_width
    }

    /// Split string bytes into `(code, byte_length)` pairs
    pub fn codes(&self, bytes: &[u8]) -> Vec<(u32, usize)> {
        match self.code_width {
            CodeWidth::OneByte => bytes.iter().map(|&b| (b as u32, 1)).collect(),
            CodeWidth::TwoBytes => bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => (u16::from_be_bytes([*hi, *lo]) as u32, 2),
                    [single] => (*single as u32, 1),
                    _ => (0, c.len()),
                })
                .collect(),
        }
    }

    /// Unicode text for a code; empty when the code cannot be mapped
    pub fn decode(&self, code: u32) -> String {
        if let Some(map) = &self.to_unicode {
            if let Some(s) = map.get(&code) {
                return s.clone();
            }
        }
        match self.code_width {
            CodeWidth::OneByte => {
                let byte = code as u8;
                self.differences
                    .get(&byte)
                    .copied()
                    .or_else(|| win_ansi_to_char(byte))
                    .map(String::from)
                    .unwrap_or_default()
            }
            CodeWidth::TwoBytes => String::from('\u{FFFD}'),
        }
    }

    /// Advance width of a code in text space units (per unit font size)
    pub fn width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width) * self.width_scale
    }

    /// Word spacing applies to the single-byte code 32 only
    pub fn is_word_space(&self, code: u32, byte_len: usize) -> bool {
        code == 32 && byte_len == 1
    }
}

fn is_helvetica_like(base_font: &str) -> bool {
    base_font.contains("Helvetica") || base_font.contains("Arial")
}

fn metrics_from_descriptor(doc: &Document, descriptor: Option<&Dictionary>) -> (f64, f64) {
    let Some(descriptor) = descriptor else {
        return (DEFAULT_ASCENT, DEFAULT_DESCENT);
    };
    let ascent = get_number(doc, descriptor, b"Ascent")
        .map(|a| a / 1000.0)
        .filter(|a| *a > 0.0 && *a <= 1.5)
        .unwrap_or(DEFAULT_ASCENT);
    let descent = get_number(doc, descriptor, b"Descent")
        .map(|d| d / 1000.0)
        .filter(|d| *d < 0.0 && *d >= -1.0)
        .unwrap_or(DEFAULT_DESCENT);
    (ascent, descent)
}

/// Parse a CIDFont `/W` array: `c [w1 w2 ...]` or `c_first c_last w`.
fn load_cid_widths(doc: &Document, array: &[Object], widths: &mut HashMap<u32, f64>) {
    let mut i = 0;
    while i < array.len() {
        let Some(first) = object_to_f64(resolve(doc, &array[i])) else {
            break;
        };
        match array.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = object_to_f64(resolve(doc, w)) {
                        widths.insert(first as u32 + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    object_to_f64(last),
                    array.get(i + 2).and_then(|o| object_to_f64(resolve(doc, o))),
                ) else {
                    break;
                };
                for code in first as u32..=last as u32 {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
}

/// Read `/Encoding << /Differences [...] >>` into a code → char map
fn load_differences(doc: &Document, dict: &Dictionary) -> HashMap<u8, char> {
    let mut map = HashMap::new();
    let Some(encoding) = get_dict(doc, dict, b"Encoding") else {
        return map;
    };
    let Some(differences) = encoding
        .get(b"Differences")
        .ok()
        .and_then(|o| resolve(doc, o).as_array().ok())
    else {
        return map;
    };

    let mut code: i64 = 0;
    for item in differences {
        match resolve(doc, item) {
            Object::Integer(start) => code = *start,
            Object::Name(name) => {
                if let (Ok(byte), Some(c)) = (
                    u8::try_from(code),
                    glyph_name_to_char(&String::from_utf8_lossy(name)),
                ) {
                    map.insert(byte, c);
                }
                code += 1;
            }
            _ => {}
        }
    }
    map
}

fn load_to_unicode(doc: &Document, dict: &Dictionary, base_font: &str) -> Option<HashMap<u32, String>> {
    let stream = match resolve(doc, dict.get(b"ToUnicode").ok()?) {
        Object::Stream(stream) => stream,
        _ => return None,
    };
    let contents = if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())
    } else {
        stream.content.clone()
    };

    let cmap = match adobe_cmap_parser::get_unicode_map(&contents) {
        Ok(cmap) => cmap,
        Err(_) => {
            warn!("Invalid ToUnicode CMap for font {}", base_font);
            return None;
        }
    };

    let mut unicode_map = HashMap::new();
    for (&code, bytes) in cmap.iter() {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        match String::from_utf16(&units) {
            Ok(s) => {
                unicode_map.insert(code, s);
            }
            Err(_) => debug!("Invalid UTF-16 sequence for code {} in font {}", code, base_font),
        }
    }
    Some(unicode_map)
}

/// Fonts available to a page, keyed by resource name
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    fonts: BTreeMap<String, FontInfo>,
}

impl FontCatalog {
    /// Load every font from a resources dictionary's `/Font` entry
    pub fn from_resources(doc: &Document, resources: Option<&Dictionary>) -> Self {
        let mut fonts = BTreeMap::new();
        if let Some(font_dict) = resources.and_then(|r| get_dict(doc, r, b"Font")) {
            for (name, obj) in font_dict.iter() {
                if let Ok(dict) = resolve(doc, obj).as_dict() {
                    fonts.insert(
                        String::from_utf8_lossy(name).into_owned(),
                        FontInfo::from_dict(doc, dict),
                    );
                }
            }
        }
        Self { fonts }
    }

    pub fn get(&self, name: &str) -> Option<&FontInfo> {
        self.fonts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, font: FontInfo) {
        self.fonts.insert(name.into(), font);
    }

    /// A resource name not yet used by the page
    pub fn unused_name(&self, prefix: &str) -> String {
        if !self.contains(prefix) {
            return prefix.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", prefix, i))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| prefix.to_string())
    }
}
