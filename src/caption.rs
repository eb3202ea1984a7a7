//! Short Markdown summary sent alongside a generated document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::numerals::{amount_to_words, capitalize_first, group_digits};

const EMPTY_FIELD: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Contract,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Contract => "contract",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFields {
    pub kind: DocumentKind,
    pub number: String,
    pub date: String,
    pub customer_name: String,
    pub inn: String,
    pub ogrn: String,
    pub period: String,
    pub services_count: usize,
    pub total_sum: u64,
}

/// Backslash-escape the characters Markdown treats as markup: `_ * ` [`.
pub fn markdown_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn field(value: &str) -> String {
    if value.is_empty() {
        markdown_escape(EMPTY_FIELD)
    } else {
        markdown_escape(value)
    }
}

/// Build the caption and cut it to `limit` characters.
pub fn build_caption(fields: &CaptionFields, limit: usize) -> String {
    let number = markdown_escape(&fields.number);
    let date = markdown_escape(&fields.date);
    let total = i64::try_from(fields.total_sum).unwrap_or(i64::MAX);
    let words = markdown_escape(&capitalize_first(&amount_to_words(total)));

    let first_line = match fields.kind {
        DocumentKind::Contract => format!("🧾 Договор №РИМ/{number} от {date}"),
        DocumentKind::Invoice => format!("🧾 Счёт-оферта №{number} от {date}"),
    };

    let caption = format!(
        "*{first_line}*\n\
         Заказчик: {name}\n\
         ИНН: `{inn}`\n\
         ОГРН|ОГРНИП: {ogrn}\n\
         Период: {period}\n\
         ╰⪼Кол-во услуг в ЭДО: {count} шт.\n\n\
         💲 *Общая сумма:* {total_fmt} ₽\n\
         _{words} руб., 00 коп._",
        name = field(&fields.customer_name),
        inn = field(&fields.inn),
        ogrn = field(&fields.ogrn),
        period = field(&fields.period),
        count = fields.services_count,
        total_fmt = group_digits(total),
    );

    match caption.char_indices().nth(limit) {
        Some((cut, _)) => caption[..cut].to_string(),
        None => caption,
    }
}
