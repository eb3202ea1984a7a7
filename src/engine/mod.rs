//! Template rendering engine.
//!
//! Opens a DOCX template, expands the item table to fit the items, fills
//! every tag in the body, headers and footers, then writes the result next
//! to its final location and renames it into place.

pub mod expand;
pub mod substitute;
pub mod tags;

pub use expand::{expand_item_rows, ExpansionOutcome};
pub use substitute::{substitute_body, with_header_aliases, ReplacementMap};

use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::docx::format::apply_base_font;
use crate::docx::{BaseFont, DocxPackage, PackageError};

/// One line item of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    /// Placement channel, e.g. a channel link or name.
    pub channel: String,
    /// Service period as free text; may contain a `dd.mm.yyyy` date.
    pub period: String,
    /// Raw amount; only its digits are used.
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<String>,
}

/// Renderer settings taken from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Highest item index that still gets its own table row.
    pub max_items: usize,
    pub base_font: BaseFont,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_items: 50,
            base_font: BaseFont::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateMissing(PathBuf),
    #[error("document package error")]
    Package(#[from] PackageError),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Summary of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub expansion: ExpansionOutcome,
    pub body_paragraphs_changed: usize,
    pub header_footer_paragraphs_changed: usize,
}

pub struct DocumentRenderer {
    settings: RenderSettings,
}

impl DocumentRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `template` into `output`. Returns `false` on any failure, after
    /// logging it.
    pub fn render(
        &self,
        template: &Path,
        output: &Path,
        replacements: &ReplacementMap,
        items: &[Item],
        enable_dynamic: bool,
    ) -> bool {
        match self.try_render(template, output, replacements, items, enable_dynamic) {
            Ok(outcome) => {
                log::info!(
                    "Rendered {} -> {} ({:?}, {} body / {} header-footer paragraphs)",
                    template.display(),
                    output.display(),
                    outcome.expansion,
                    outcome.body_paragraphs_changed,
                    outcome.header_footer_paragraphs_changed
                );
                true
            }
            Err(e) => {
                log::error!("Failed to render {}: {}", template.display(), error_chain(&e));
                false
            }
        }
    }

    pub fn try_render(
        &self,
        template: &Path,
        output: &Path,
        replacements: &ReplacementMap,
        items: &[Item],
        enable_dynamic: bool,
    ) -> Result<RenderOutcome, RenderError> {
        if !template.is_file() {
            return Err(RenderError::TemplateMissing(template.to_path_buf()));
        }
        let mut package = DocxPackage::open(template)?;

        let expansion = if enable_dynamic {
            expand_item_rows(
                package.body_mut(),
                items.len(),
                self.settings.max_items,
                &self.settings.base_font,
            )
        } else {
            ExpansionOutcome::Skipped(expand::SkipReason::Disabled)
        };

        let body_paragraphs_changed = substitute_body(package.body_mut(), replacements);

        let aliased = with_header_aliases(replacements);
        let mut header_footer_paragraphs_changed = 0;
        for part in package.headers_footers_mut() {
            header_footer_paragraphs_changed += substitute_body(&mut part.body, &aliased);
        }

        for table in package.body_mut().tables_mut() {
            for row in table.rows_mut() {
                for cell in row.cells_mut() {
                    apply_base_font(cell, &self.settings.base_font);
                }
            }
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        package.save(output)?;

        Ok(RenderOutcome {
            expansion,
            body_paragraphs_changed,
            header_footer_paragraphs_changed,
        })
    }
}

/// `outer: inner: innermost` for an error and its sources.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = DocumentRenderer::new(RenderSettings::default());
        let template = dir.path().join("absent.docx");
        let output = dir.path().join("out.docx");

        let err = renderer
            .try_render(&template, &output, &ReplacementMap::new(), &[], true)
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateMissing(ref p) if p == &template));
        assert!(!renderer.render(&template, &output, &ReplacementMap::new(), &[], true));
        assert!(!output.exists());
    }

    #[test]
    fn test_corrupt_template_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("broken.docx");
        std::fs::write(&template, b"not a zip archive").unwrap();
        let output = dir.path().join("out.docx");

        let renderer = DocumentRenderer::new(RenderSettings::default());
        assert!(!renderer.render(&template, &output, &ReplacementMap::new(), &[], false));
        assert!(!output.exists());
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = RenderError::Package(PackageError::Io(std::io::Error::other("disk full")));
        assert_eq!(error_chain(&err), "document package error: I/O error: disk full");
    }

    #[test]
    fn test_error_chain_names_each_cause_once() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("broken.docx");
        std::fs::write(&template, b"not a zip archive").unwrap();

        let renderer = DocumentRenderer::new(RenderSettings::default());
        let err = renderer
            .try_render(&template, &dir.path().join("out.docx"), &ReplacementMap::new(), &[], false)
            .unwrap_err();
        let chain = error_chain(&err);
        assert!(chain.starts_with("document package error: invalid ZIP container: "));

        let segments: Vec<&str> = chain.split(": ").collect();
        for (i, segment) in segments.iter().enumerate() {
            assert!(!segments[i + 1..].contains(segment), "{}", chain);
        }
    }
}
