//! ZIP package access for Office Open XML workbooks.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Relationship kind pointing from the package root to the main workbook part.
pub const REL_OFFICE_DOCUMENT: &str = "officeDocument";

/// A relationship entry from a .rels part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path, relative to the source part unless it starts with '/'
    pub target: String,
}

impl Relationship {
    /// True when the relationship type URI ends with the given short name
    /// (e.g. "worksheet" or "officeDocument").
    pub fn is_kind(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == kind)
    }
}

/// Relationships parsed from one .rels part, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
    in_order: Vec<String>,
}

impl Relationships {
    /// Look up a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// First relationship whose type ends with `kind`, in document order.
    pub fn first_of_kind(&self, kind: &str) -> Option<&Relationship> {
        self.in_order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .find(|rel| rel.is_kind(kind))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn insert(&mut self, rel: Relationship) {
        if !self.by_id.contains_key(&rel.id) {
            self.in_order.push(rel.id.clone());
        }
        self.by_id.insert(rel.id.clone(), rel);
    }
}

/// Decode XML bytes to a string, honouring UTF-8 and UTF-16 byte order marks.
///
/// Parts decoded from UTF-16 get their XML declaration rewritten to UTF-8 so
/// quick-xml does not try to re-decode the already converted text.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec())
            .map_err(|e| Error::InvalidData(format!("invalid UTF-8 in XML part: {}", e))),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes).map(|s| declare_utf8(&s)),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes).map(|s| declare_utf8(&s)),
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => {
                decode_utf16(bytes, u16::from_le_bytes).map(|s| declare_utf8(&s))
            }
            Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => {
                decode_utf16(bytes, u16::from_be_bytes).map(|s| declare_utf8(&s))
            }
            Err(e) => Err(Error::InvalidData(format!(
                "XML part is neither UTF-8 nor UTF-16: {}",
                e
            ))),
        },
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::InvalidData(format!("invalid UTF-16 in XML part: {}", e)))
}

fn declare_utf8(content: &str) -> String {
    let Some(rest) = content.strip_prefix("<?xml") else {
        return content.to_string();
    };
    let Some(end) = rest.find("?>") else {
        return content.to_string();
    };
    let decl = &rest[..end];
    let mut fixed = String::with_capacity(content.len());
    fixed.push_str("<?xml");
    for quote in ['"', '\''] {
        for spelling in ["UTF-16", "utf-16"] {
            let from = format!("encoding={quote}{spelling}{quote}");
            if decl.contains(&from) {
                fixed.push_str(&decl.replace(&from, "encoding=\"UTF-8\""));
                fixed.push_str(&rest[end..]);
                return fixed;
            }
        }
    }
    content.to_string()
}

/// An opened workbook package (a ZIP archive of XML parts).
pub struct Package {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl Package {
    /// Open a package held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Read an XML part as text.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        decode_xml_bytes(&bytes)
    }

    /// Read an XML part if present; `Ok(None)` when the part is absent.
    pub fn read_optional_xml(&self, path: &str) -> Result<Option<String>> {
        if !self.exists(path) {
            return Ok(None);
        }
        self.read_xml(path).map(Some)
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        self.archive.borrow().file_names().any(|n| n == path)
    }

    /// Names of all parts in the archive.
    pub fn part_names(&self) -> Vec<String> {
        self.archive
            .borrow()
            .file_names()
            .map(String::from)
            .collect()
    }

    /// Relationships of a part (`xl/workbook.xml` reads
    /// `xl/_rels/workbook.xml.rels`). An empty path reads the package root.
    ///
    /// A missing .rels part yields an empty collection.
    pub fn relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part_path);
        match self.read_optional_xml(&rels_path)? {
            Some(xml) => parse_relationships(&xml),
            None => Ok(Relationships::default()),
        }
    }

    /// Resolve a relationship target against the part that owns it.
    pub fn resolve_path(base: &str, target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }

        let mut segments: Vec<&str> = base.split('/').collect();
        segments.pop();
        for segment in target.split('/') {
            match segment {
                ".." => {
                    segments.pop();
                }
                "." | "" => {}
                s => segments.push(s),
            }
        }
        segments.join("/")
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.archive.borrow().len())
            .finish()
    }
}

fn rels_path_for(part_path: &str) -> String {
    let part_path = part_path.trim_start_matches('/');
    if part_path.is_empty() {
        return "_rels/.rels".to_string();
    }
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

fn parse_relationships(xml: &str) -> Result<Relationships> {
    let mut rels = Relationships::default();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };

                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }

                if !rel.id.is_empty() {
                    rels.insert(rel);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}
