//! Form XObjects reachable from a page.
//!
//! Each form keeps its decoded operations, its `/Matrix`, and the fonts and
//! nested forms of its own resources. Forms edited by a redaction become
//! page-local copies that are written out on commit; the original stream
//! may be shared with other pages and is never changed.

use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::{BTreeMap, BTreeSet};

use super::fonts::{get_dict, resolve, FontCatalog};
use super::geometry::{transform_from_operands, PdfTransform};

/// Nesting depth past which forms are not loaded (guards against cycles)
const MAX_FORM_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct FormXObject {
    pub matrix: PdfTransform,
    pub operations: Vec<Operation>,
    pub fonts: FontCatalog,
    pub forms: FormCatalog,
    /// Stream dictionary of the form, reused for edited copies
    dict: Dictionary,
    /// Whether this is an edited copy not yet in the document
    copy: bool,
}

impl FormXObject {
    fn load(doc: &Document, stream: &Stream, parent_fonts: &FontCatalog, depth: usize) -> Option<Self> {
        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Form" => {}
            _ => return None,
        }

        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let operations = match Content::decode(&content) {
            Ok(content) => content.operations,
            Err(e) => {
                debug!("Unreadable form content stream ({}), ignoring it", e);
                return None;
            }
        };

        let matrix = match stream.dict.get(b"Matrix").map(|m| resolve(doc, m)) {
            Ok(Object::Array(values)) => transform_from_operands(values).unwrap_or_else(PdfTransform::identity),
            _ => PdfTransform::identity(),
        };

        let resources = get_dict(doc, &stream.dict, b"Resources");
        // A form without resources draws with its parent's fonts
        let fonts = match resources {
            Some(_) => FontCatalog::from_resources(doc, resources),
            None => parent_fonts.clone(),
        };
        let forms = FormCatalog::load(doc, resources, &fonts, depth + 1);

        Some(Self {
            matrix,
            operations,
            fonts,
            forms,
            dict: stream.dict.clone(),
            copy: false,
        })
    }

    /// A page-local copy of this form drawing `operations` instead
    pub fn edited(&self, operations: Vec<Operation>) -> Self {
        Self {
            operations,
            copy: true,
            ..self.clone()
        }
    }

    pub fn is_copy(&self) -> bool {
        self.copy
    }

    /// Stream dictionary for writing the form back, without stale filters
    pub fn stream_dict(&self) -> Dictionary {
        let mut dict = self.dict.clone();
        dict.remove(b"Filter");
        dict.remove(b"DecodeParms");
        dict.remove(b"Length");
        dict
    }
}

/// Form XObjects keyed by resource name
#[derive(Debug, Clone, Default)]
pub struct FormCatalog {
    forms: BTreeMap<String, FormXObject>,
    /// Names of images and unreadable XObjects
    others: BTreeSet<String>,
}

impl FormCatalog {
    /// Load every form from a resources dictionary's `/XObject` entry
    pub fn from_resources(doc: &Document, resources: Option<&Dictionary>, fonts: &FontCatalog) -> Self {
        Self::load(doc, resources, fonts, 0)
    }

    fn load(doc: &Document, resources: Option<&Dictionary>, fonts: &FontCatalog, depth: usize) -> Self {
        let mut catalog = Self::default();
        if depth >= MAX_FORM_DEPTH {
            return catalog;
        }
        if let Some(xobjects) = resources.and_then(|r| get_dict(doc, r, b"XObject")) {
            for (name, obj) in xobjects.iter() {
                let name = String::from_utf8_lossy(name).into_owned();
                let form = resolve(doc, obj)
                    .as_stream()
                    .ok()
                    .and_then(|stream| FormXObject::load(doc, stream, fonts, depth));
                match form {
                    Some(form) => {
                        catalog.forms.insert(name, form);
                    }
                    None => {
                        catalog.others.insert(name);
                    }
                }
            }
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&FormXObject> {
        self.forms.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, form: FormXObject) {
        self.forms.insert(name.into(), form);
    }

    fn contains(&self, name: &str) -> bool {
        self.forms.contains_key(name) || self.others.contains(name)
    }

    /// An XObject name not yet used by the page
    pub fn unused_name(&self, prefix: &str) -> String {
        if !self.contains(prefix) {
            return prefix.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", prefix, i))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Edited copies, in name order
    pub fn copies(&self) -> impl Iterator<Item = (&String, &FormXObject)> {
        self.forms.iter().filter(|(_, form)| form.copy)
    }
}
