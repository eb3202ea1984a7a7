use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::caption::DocumentKind;
use crate::generators::GeneratedDocument;

/// Everything but the unreserved URI characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Download route for a generated file, with the name percent-encoded.
pub fn download_url(filename: &str) -> String {
    format!("/api/documents/{}", utf8_percent_encode(filename, PATH_SEGMENT))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedDocumentResponse {
    pub kind: DocumentKind,
    pub filename: String,
    /// Document number, `DD-MM-SS`.
    pub number: String,
    /// Document date, `DD.MM.YYYY`.
    pub date: String,
    /// Markdown summary of the document.
    pub caption: String,
    pub total_sum: u64,
    pub items_count: usize,
    pub download_url: String,
}

impl From<GeneratedDocument> for GeneratedDocumentResponse {
    fn from(doc: GeneratedDocument) -> Self {
        let download_url = download_url(&doc.filename);
        Self {
            kind: doc.kind,
            filename: doc.filename,
            number: doc.number,
            date: doc.date,
            caption: doc.caption,
            total_sum: doc.total_sum,
            items_count: doc.items_count,
            download_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetSequenceRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetSequenceResponse {
    pub user_id: String,
    /// Day whose counter was reset, `YYYY-MM-DD`.
    pub date: String,
    /// Counter value before the reset.
    pub previous: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_is_percent_encoded() {
        assert_eq!(download_url("a-b_c.docx"), "/api/documents/a-b_c.docx");
        assert_eq!(download_url("Счет 1.docx"), "/api/documents/%D0%A1%D1%87%D0%B5%D1%82%201.docx");
    }
}
