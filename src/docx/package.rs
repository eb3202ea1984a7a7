//! DOCX package loading and saving.
//!
//! A `.docx` file is a ZIP archive. The main document part and every header
//! and footer part referenced from it are parsed into [`Part`]s; all other
//! entries are carried through byte-for-byte.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::tree::Body;
use super::xml::{Element, XmlDocument, XmlError};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_HEADER: &str = "/header";
const REL_FOOTER: &str = "/footer";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("invalid ZIP container")]
    Zip(#[from] ZipError),
    #[error("invalid XML in part '{part}'")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },
    #[error("part not found in package: {0}")]
    MissingPart(String),
    #[error("part '{0}' has no body element")]
    MissingBody(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Main,
    Header,
    Footer,
}

/// An editable story of the document: the main body, a header or a footer.
#[derive(Debug, Clone)]
pub struct Part {
    pub path: String,
    pub kind: PartKind,
    pub body: Body,
    /// The part's XML with the story container emptied; `body` is put back on save.
    xml: XmlDocument,
}

impl Part {
    fn parse(path: &str, kind: PartKind, bytes: &[u8]) -> Result<Self, PackageError> {
        let mut xml = XmlDocument::parse(bytes).map_err(|source| PackageError::Xml {
            part: path.to_string(),
            source,
        })?;
        let container = story_container_mut(&mut xml.root, kind)
            .ok_or_else(|| PackageError::MissingBody(path.to_string()))?;
        let body = Body::from_nodes(std::mem::take(&mut container.children));
        Ok(Self {
            path: path.to_string(),
            kind,
            body,
            xml,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut xml = self.xml.clone();
        let container = story_container_mut(&mut xml.root, self.kind)
            .ok_or_else(|| PackageError::MissingBody(self.path.clone()))?;
        container.children = self.body.clone().into_nodes();
        xml.to_bytes().map_err(|source| PackageError::Xml {
            part: self.path.clone(),
            source,
        })
    }
}

fn story_container_mut(root: &mut Element, kind: PartKind) -> Option<&mut Element> {
    match kind {
        PartKind::Main => root.child_mut("w:body"),
        PartKind::Header | PartKind::Footer => Some(root),
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// A loaded `.docx` document.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<Entry>,
    main: Part,
    headers_footers: Vec<Part>,
}

impl DocxPackage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackageError> {
        let file = File::open(path.as_ref())?;
        let mut archive = ZipArchive::new(file)?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut zipped = archive.by_index(i)?;
            let mut data = Vec::with_capacity(zipped.size() as usize);
            zipped.read_to_end(&mut data)?;
            entries.push(Entry {
                name: zipped.name().to_string(),
                is_dir: zipped.is_dir(),
                data,
            });
        }

        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<Entry>) -> Result<Self, PackageError> {
        let find = |name: &str| entries.iter().find(|e| e.name == name && !e.is_dir);

        let main_path = match find(PACKAGE_RELS) {
            Some(rels) => relationship_targets(PACKAGE_RELS, &rels.data, "", REL_OFFICE_DOCUMENT)?
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()),
            None => DEFAULT_MAIN_PART.to_string(),
        };
        let main_entry = find(&main_path).ok_or_else(|| PackageError::MissingPart(main_path.clone()))?;
        let main = Part::parse(&main_path, PartKind::Main, &main_entry.data)?;

        let (dir, file_name) = split_part_path(&main_path);
        let rels_path = format!("{dir}_rels/{file_name}.rels");
        let mut headers_footers = Vec::new();
        if let Some(rels) = find(&rels_path) {
            for (suffix, kind) in [(REL_HEADER, PartKind::Header), (REL_FOOTER, PartKind::Footer)] {
                for target in relationship_targets(&rels_path, &rels.data, dir, suffix)? {
                    match find(&target) {
                        Some(entry) => headers_footers.push(Part::parse(&target, kind, &entry.data)?),
                        None => log::warn!("Referenced part '{}' is missing from the package", target),
                    }
                }
            }
        }

        Ok(Self {
            entries,
            main,
            headers_footers,
        })
    }

    pub fn main(&self) -> &Part {
        &self.main
    }

    pub fn body(&self) -> &Body {
        &self.main.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.main.body
    }

    /// Header and footer parts, in relationship order.
    pub fn headers_footers(&self) -> &[Part] {
        &self.headers_footers
    }

    pub fn headers_footers_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        self.headers_footers.iter_mut()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        self.write_zip(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Save to `path` through a temporary file in the same directory, so a
    /// failed save never leaves a partial document behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PackageError> {
        let path = path.as_ref();
        let dir = parent_dir(path);
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        self.write_zip(tmp.as_file_mut())?;
        tmp.as_file_mut().flush()?;
        tmp.persist(path).map_err(|e| PackageError::Io(e.error))?;
        Ok(())
    }

    fn write_zip<W: Write + std::io::Seek>(&self, writer: W) -> Result<(), PackageError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            let data = match self.edited_part(&entry.name) {
                Some(part) => part.to_bytes()?,
                None => entry.data.clone(),
            };
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&data)?;
        }

        zip.finish()?;
        Ok(())
    }

    fn edited_part(&self, name: &str) -> Option<&Part> {
        std::iter::once(&self.main)
            .chain(self.headers_footers.iter())
            .find(|p| p.path == name)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Split `word/document.xml` into (`word/`, `document.xml`).
fn split_part_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Internal targets of relationships whose type ends with `type_suffix`,
/// resolved against `base_dir`.
fn relationship_targets(
    rels_path: &str,
    xml: &[u8],
    base_dir: &str,
    type_suffix: &str,
) -> Result<Vec<String>, PackageError> {
    let doc = XmlDocument::parse(xml).map_err(|source| PackageError::Xml {
        part: rels_path.to_string(),
        source,
    })?;
    Ok(doc
        .root
        .child_elements()
        .filter(|rel| rel.name == "Relationship")
        .filter(|rel| rel.attribute("TargetMode") != Some("External"))
        .filter(|rel| rel.attribute("Type").is_some_and(|t| t.ends_with(type_suffix)))
        .filter_map(|rel| rel.attribute("Target"))
        .map(|target| resolve_target(base_dir, target))
        .collect())
}

fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/", "header1.xml"), "word/header1.xml");
        assert_eq!(resolve_target("word/", "/word/footer1.xml"), "word/footer1.xml");
        assert_eq!(resolve_target("word/", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_split_part_path() {
        assert_eq!(split_part_path("word/document.xml"), ("word/", "document.xml"));
        assert_eq!(split_part_path("document.xml"), ("", "document.xml"));
    }

    #[test]
    fn test_relationship_targets_filter_by_type() {
        let rels = br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;
        let headers = relationship_targets("rels", rels, "word/", REL_HEADER).unwrap();
        assert_eq!(headers, vec!["word/header1.xml".to_string()]);
        let footers = relationship_targets("rels", rels, "word/", REL_FOOTER).unwrap();
        assert_eq!(footers, vec!["word/footer1.xml".to_string()]);
    }

    #[test]
    fn test_missing_main_part_is_reported() {
        let result = DocxPackage::from_entries(vec![Entry {
            name: "[Content_Types].xml".into(),
            data: b"<Types/>".to_vec(),
            is_dir: false,
        }]);
        assert!(matches!(result, Err(PackageError::MissingPart(p)) if p == DEFAULT_MAIN_PART));
    }
}
