//! Generators module - business logic for creating DOCX documents from templates.
//!
//! - `InvoiceGenerator` - счёт-оферта (invoice with public offer terms)
//! - `ContractGenerator` - договор РИМ (advertising placement contract)

pub mod common;
pub mod contract;
pub mod invoice;
pub mod templates;
pub mod validation;

pub use contract::{ContractGenerator, ContractRequest};
pub use invoice::{InvoiceGenerator, InvoiceRequest, ManualItem};
pub use templates::TemplateSet;

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::caption::DocumentKind;
use crate::engine::DocumentRenderer;
use crate::store::{SequenceStore, StoreError};

/// Errors that can occur during document generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("{0}")]
    Validation(String),
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("failed to issue document number")]
    Sequence(#[from] StoreError),
    #[error("document rendering failed")]
    RenderFailed,
    #[error("generation task failed: {0}")]
    Join(String),
}

/// Result of a successful document generation.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub filename: String,
    pub path: PathBuf,
    pub number: String,
    pub date: String,
    pub caption: String,
    pub total_sum: u64,
    pub items_count: usize,
}

/// Everything a generator needs besides the request.
pub struct GeneratorContext {
    pub renderer: DocumentRenderer,
    pub templates: TemplateSet,
    pub sequences: SequenceStore,
    pub output_dir: PathBuf,
    pub caption_limit: usize,
    pub utc_offset: FixedOffset,
}

impl GeneratorContext {
    pub fn now(&self) -> DateTime<FixedOffset> {
        common::now_at(self.utc_offset)
    }
}

/// Request body of a generation call.
pub trait DocumentRequest {
    /// All problems with the request, one `[field] message` line each.
    fn validate(&self) -> Result<(), String>;

    /// Owner of the numbering sequence the document is counted in.
    fn user_id(&self) -> &str;
}

/// Turns a request into a rendered document.
///
/// Implementors provide `build`; validation always runs first, so a rejected
/// request never issues a number or touches the output directory.
pub trait Generator {
    type Request: DocumentRequest;

    /// Clock used by `generate`.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Number, render and caption a request that already passed validation.
    fn build(
        &self,
        request: Self::Request,
        now: DateTime<FixedOffset>,
    ) -> Result<GeneratedDocument, GeneratorError>;

    /// Generate with an explicit clock reading.
    fn generate_at(
        &self,
        request: Self::Request,
        now: DateTime<FixedOffset>,
    ) -> Result<GeneratedDocument, GeneratorError> {
        request.validate().map_err(GeneratorError::Validation)?;
        self.build(request, now)
    }

    fn generate(&self, request: Self::Request) -> Result<GeneratedDocument, GeneratorError> {
        let now = self.now();
        self.generate_at(request, now)
    }
}
