//! Generator for договор РИМ (advertising placement contract).

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{first_service_date, insert_item_tags, safe_name_part};
use super::validation::{validate_inn, validate_items, validate_ogrn, validate_required, ValidationErrors};
use super::{DocumentRequest, GeneratedDocument, Generator, GeneratorContext, GeneratorError};
use crate::caption::{build_caption, CaptionFields, DocumentKind};
use crate::engine::tags::*;
use crate::engine::{Item, ReplacementMap};
use crate::numerals::{amount_to_words, capitalize_first, group_digits, normalize_service_date, only_digits};
use crate::store::sequence::document_date;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContractRequest {
    pub user_id: String,
    pub customer_name: String,
    pub customer_inn: String,
    /// OGRN/OGRNIP, or `нет` when the customer has none.
    pub customer_ogrn: String,
    pub items: Vec<Item>,
}

impl DocumentRequest for ContractRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();

        validate_required(&self.user_id, "user_id", "Идентификатор пользователя", &mut errors);
        validate_required(&self.customer_name, "customer_name", "Наименование заказчика", &mut errors);
        validate_inn(&self.customer_inn, "customer_inn", &mut errors);
        validate_ogrn(&self.customer_ogrn, "customer_ogrn", &mut errors);
        validate_items(&self.items, &mut errors);

        errors.into_result()
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl ContractRequest {
    pub fn total_sum(&self) -> u64 {
        self.items
            .iter()
            .map(|item| only_digits(&item.amount))
            .fold(0, u64::saturating_add)
    }

    /// Items with amounts rewritten as grouped digits (`15000 р.` -> `15 000`).
    fn normalized_items(&self) -> Vec<Item> {
        self.items
            .iter()
            .map(|item| Item {
                amount: group_digits(i64::try_from(only_digits(&item.amount)).unwrap_or(i64::MAX)),
                ..item.clone()
            })
            .collect()
    }
}

/// Tag values of a contract numbered `number` and dated `date`.
pub fn contract_replacements(request: &ContractRequest, number: &str, date: &str) -> ReplacementMap {
    let total = i64::try_from(request.total_sum()).unwrap_or(i64::MAX);
    let words = capitalize_first(&amount_to_words(total));
    let first_date = first_service_date(&request.items, date);

    let mut map = ReplacementMap::new();
    map.insert(TAG_CONTRACT_NUMBER.to_string(), number.to_string());
    map.insert(TAG_CONTRACT_DATE.to_string(), date.to_string());
    map.insert(TAG_CUSTOMER_NAME.to_string(), request.customer_name.clone());
    map.insert(TAG_CUSTOMER_INN.to_string(), request.customer_inn.clone());
    map.insert(TAG_CUSTOMER_OGRN.to_string(), request.customer_ogrn.clone());
    map.insert(TAG_TOTAL_SUM.to_string(), group_digits(total));
    map.insert(TAG_TOTAL_SUM_WORDS.to_string(), words.clone());
    map.insert(TAG_AMOUNT_WORDS.to_string(), words);
    map.insert(TAG_SERVICE_DATE.to_string(), first_date.clone());

    for (i, item) in request.normalized_items().iter().enumerate() {
        let service_date = normalize_service_date(&item.period)
            .or_else(|| item.service_date.clone().filter(|d| !d.trim().is_empty()))
            .unwrap_or_else(|| first_date.clone());
        insert_item_tags(&mut map, i + 1, item, service_date);
    }
    map
}

pub struct ContractGenerator {
    ctx: Arc<GeneratorContext>,
}

impl ContractGenerator {
    pub fn new(ctx: Arc<GeneratorContext>) -> Self {
        Self { ctx }
    }
}

impl Generator for ContractGenerator {
    type Request = ContractRequest;

    fn now(&self) -> DateTime<FixedOffset> {
        self.ctx.now()
    }

    fn build(
        &self,
        request: ContractRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<GeneratedDocument, GeneratorError> {
        let use_multi = request.items.len() >= 2;
        let template = self.ctx.templates.resolve_contract(use_multi)?;

        let number = self.ctx.sequences.document_number(&now, &request.user_id)?;
        let date = document_date(&now);
        let replacements = contract_replacements(&request, &number, &date);

        let filename = format!(
            "Договор_РИМ_{}_{}.docx",
            safe_name_part(&request.customer_name),
            number
        );
        let path = self.ctx.output_dir.join(&filename);

        let items = request.normalized_items();
        let rendered = self
            .ctx
            .renderer
            .render(&template, &path, &replacements, &items, use_multi);
        if !rendered || !path.is_file() {
            return Err(GeneratorError::RenderFailed);
        }

        let total_sum = request.total_sum();
        let caption = build_caption(
            &CaptionFields {
                kind: DocumentKind::Contract,
                number: number.clone(),
                date: date.clone(),
                customer_name: request.customer_name.clone(),
                inn: request.customer_inn.clone(),
                ogrn: request.customer_ogrn.clone(),
                period: request.items.first().map(|i| i.period.clone()).unwrap_or_default(),
                services_count: request.items.len(),
                total_sum,
            },
            self.ctx.caption_limit,
        );

        log::info!("Generated contract {} for user {}", filename, request.user_id);
        Ok(GeneratedDocument {
            kind: DocumentKind::Contract,
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
