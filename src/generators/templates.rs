//! Template file selection with fallback to an existing alternative.

use std::path::{Path, PathBuf};

use super::GeneratorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub invoice_single: PathBuf,
    pub invoice_multi: PathBuf,
    pub invoice_multi_pro: PathBuf,
    pub contract_single: PathBuf,
    pub contract_multi: PathBuf,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            invoice_single: PathBuf::from("templates/schet-oferta.docx"),
            invoice_multi: PathBuf::from("templates/schet-oferta2-multi.docx"),
            invoice_multi_pro: PathBuf::from("templates/schet-oferta2-multiPRO.docx"),
            contract_single: PathBuf::from("templates/dogovor_rim.docx"),
            contract_multi: PathBuf::from("templates/dogovor_rim2-multi.docx"),
        }
    }
}

impl TemplateSet {
    /// All templates under `dir`, with their default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let file = |p: PathBuf| match p.file_name() {
            Some(name) => dir.join(name),
            None => dir.join(p),
        };
        let defaults = Self::default();
        Self {
            invoice_single: file(defaults.invoice_single),
            invoice_multi: file(defaults.invoice_multi),
            invoice_multi_pro: file(defaults.invoice_multi_pro),
            contract_single: file(defaults.contract_single),
            contract_multi: file(defaults.contract_multi),
        }
    }

    /// Pro template first when requested, then multi, then single. Without
    /// the pro flag only the other of multi/single is tried.
    pub fn resolve_invoice(&self, use_multi: bool, use_pro: bool) -> Result<PathBuf, GeneratorError> {
        let candidates: Vec<&PathBuf> = if use_pro {
            vec![&self.invoice_multi_pro, &self.invoice_multi, &self.invoice_single]
        } else if use_multi {
            vec![&self.invoice_multi, &self.invoice_single]
        } else {
            vec![&self.invoice_single, &self.invoice_multi]
        };
        first_existing("invoice", &candidates)
    }

    pub fn resolve_contract(&self, use_multi: bool) -> Result<PathBuf, GeneratorError> {
        let candidates = if use_multi {
            [&self.contract_multi, &self.contract_single]
        } else {
            [&self.contract_single, &self.contract_multi]
        };
        first_existing("contract", &candidates)
    }
}

fn first_existing(kind: &str, candidates: &[&PathBuf]) -> Result<PathBuf, GeneratorError> {
    let preferred = candidates
        .first()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    for (i, path) in candidates.iter().enumerate() {
        if path.is_file() {
            if i > 0 {
                log::warn!(
                    "Template {} not found, using {} instead",
                    preferred,
                    path.display()
                );
            }
            return Ok(path.to_path_buf());
        }
    }
    Err(GeneratorError::TemplateNotFound(format!(
        "no {} template found (looked for {})",
        kind, preferred
    )))
}
