//! Generator for счёт-оферта (invoice).
//!
//! Single-item invoices use the plain template; several items or a manual
//! item (ПНЦ) switch to the multi-row templates.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{first_service_date, insert_item_tags, safe_name_part};
use super::validation::{validate_amount, validate_inn, validate_items, validate_required, ValidationErrors};
use super::{DocumentRequest, GeneratedDocument, Generator, GeneratorContext, GeneratorError};
use crate::caption::{build_caption, CaptionFields, DocumentKind};
use crate::engine::tags::*;
use crate::engine::{Item, ReplacementMap};
use crate::numerals::{amount_to_words, capitalize_first, group_digits, normalize_service_date, only_digits};
use crate::store::sequence::document_date;

/// Free-text invoice position with its own amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ManualItem {
    pub text: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceRequest {
    /// Identifies whose daily numbering sequence is used.
    pub user_id: String,
    pub customer_name: String,
    pub customer_inn: String,
    pub items: Vec<Item>,
    #[serde(default)]
    pub manual_item: Option<ManualItem>,
    #[serde(default)]
    pub use_pro_template: bool,
}

impl DocumentRequest for InvoiceRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();

        validate_required(&self.user_id, "user_id", "Идентификатор пользователя", &mut errors);
        validate_required(&self.customer_name, "customer_name", "Наименование заказчика", &mut errors);
        validate_inn(&self.customer_inn, "customer_inn", &mut errors);
        validate_items(&self.items, &mut errors);
        if let Some(manual) = &self.manual_item {
            if !manual.amount.trim().is_empty() {
                validate_amount(&manual.amount, "manual_item.amount", &mut errors);
            }
        }

        errors.into_result()
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl InvoiceRequest {
    fn uses_multi_template(&self) -> bool {
        self.items.len() > 1 || self.use_pro_template
    }

    fn manual_text(&self) -> &str {
        self.manual_item.as_ref().map(|m| m.text.trim()).unwrap_or("")
    }

    fn manual_amount(&self) -> &str {
        self.manual_item.as_ref().map(|m| m.amount.trim()).unwrap_or("")
    }

    /// Sum of item amounts plus the manual item amount.
    pub fn total_sum(&self) -> u64 {
        self.items
            .iter()
            .map(|item| only_digits(&item.amount))
            .fold(only_digits(self.manual_amount()), u64::saturating_add)
    }
}

/// Tag values of an invoice numbered `number` and dated `date`.
pub fn invoice_replacements(request: &InvoiceRequest, number: &str, date: &str) -> ReplacementMap {
    let total = request.total_sum();
    let total_signed = i64::try_from(total).unwrap_or(i64::MAX);
    let words = capitalize_first(&amount_to_words(total_signed));
    let first_date = first_service_date(&request.items, date);

    let mut map = ReplacementMap::new();
    map.insert(TAG_INVOICE_NUMBER.to_string(), number.to_string());
    map.insert(TAG_DATE.to_string(), date.to_string());
    map.insert(TAG_CUSTOMER_NAME.to_string(), request.customer_name.clone());
    map.insert(TAG_CUSTOMER_INN.to_string(), request.customer_inn.clone());
    map.insert(TAG_TOTAL_SUM.to_string(), group_digits(total_signed));
    map.insert(TAG_TOTAL_SUM_WORDS.to_string(), words.clone());
    map.insert(TAG_AMOUNT_WORDS.to_string(), words);
    map.insert(TAG_SERVICE_DATE.to_string(), first_date.clone());

    if !request.manual_text().is_empty() {
        map.insert(TAG_MANUAL_TEXT.to_string(), request.manual_text().to_string());
    }
    if !request.manual_amount().is_empty() {
        map.insert(TAG_MANUAL_AMOUNT.to_string(), request.manual_amount().to_string());
    }

    for (i, item) in request.items.iter().enumerate() {
        let service_date = normalize_service_date(&item.period).unwrap_or_else(|| first_date.clone());
        insert_item_tags(&mut map, i + 1, item, service_date);
    }
    map
}

pub struct InvoiceGenerator {
    ctx: Arc<GeneratorContext>,
}

impl InvoiceGenerator {
    pub fn new(ctx: Arc<GeneratorContext>) -> Self {
        Self { ctx }
    }
}

impl Generator for InvoiceGenerator {
    type Request = InvoiceRequest;

    fn now(&self) -> DateTime<FixedOffset> {
        self.ctx.now()
    }

    fn build(
        &self,
        request: InvoiceRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<GeneratedDocument, GeneratorError> {
        let use_multi = request.uses_multi_template();
        let template = self
            .ctx
            .templates
            .resolve_invoice(use_multi, request.use_pro_template)?;

        let number = self.ctx.sequences.document_number(&now, &request.user_id)?;
        let date = document_date(&now);
        let replacements = invoice_replacements(&request, &number, &date);

        let filename = format!(
            "Счет-оферта_{}_{}.docx",
            safe_name_part(&request.customer_name),
            number
        );
        let path = self.ctx.output_dir.join(&filename);

        let rendered = self
            .ctx
            .renderer
            .render(&template, &path, &replacements, &request.items, use_multi);
        if !rendered || !path.is_file() {
            return Err(GeneratorError::RenderFailed);
        }

        let total_sum = request.total_sum();
        let caption = build_caption(
            &CaptionFields {
                kind: DocumentKind::Invoice,
                number: number.clone(),
                date: date.clone(),
                customer_name: request.customer_name.clone(),
                inn: request.customer_inn.clone(),
                ogrn: String::new(),
                period: request.items.first().map(|i| i.period.clone()).unwrap_or_default(),
                services_count: request.items.len(),
                total_sum,
            },
            self.ctx.caption_limit,
        );

        log::info!("Generated invoice {} for user {}", filename, request.user_id);
        Ok(GeneratedDocument {
            kind: DocumentKind::Invoice,
            filename,
            path,
            number,
            date,
            caption,
            total_sum,
            items_count: request.items.len(),
        })
    }
}
