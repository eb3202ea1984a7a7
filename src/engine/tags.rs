//! Placeholder names used by the document templates.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BASE_TAG_RX: Regex = Regex::new(r"^\{\{([A-Z0-9_]+)\}\}$").expect("valid tag regex");
}

pub const TAG_CHANNEL: &str = "{{PLACEMENT_CHANNEL}}";
pub const TAG_PERIOD: &str = "{{SERVICE_PERIOD}}";
pub const TAG_AMOUNT: &str = "{{AMOUNT}}";
pub const TAG_SERVICE_DATE: &str = "{{SERVICE_DATE}}";

pub const TAG_CUSTOMER_NAME: &str = "{{CUSTOMER_NAME}}";
pub const TAG_CUSTOMER_INN: &str = "{{CUSTOMER_INN}}";
pub const TAG_CUSTOMER_OGRN: &str = "{{CUSTOMER_OGRN}}";
pub const TAG_TOTAL_SUM: &str = "{{TOTAL_SUM}}";
pub const TAG_TOTAL_SUM_WORDS: &str = "{{TOTAL_SUM_WORDS}}";
pub const TAG_AMOUNT_WORDS: &str = "{{AMOUNT_WORDS}}";
pub const TAG_INVOICE_NUMBER: &str = "{{INVOICE_NUMBER}}";
pub const TAG_CONTRACT_NUMBER: &str = "{{CONTRACT_NUMBER}}";
pub const TAG_DATE: &str = "{{DATE}}";
pub const TAG_CONTRACT_DATE: &str = "{{CONTRACT_DATE}}";
pub const TAG_MANUAL_TEXT: &str = "{{PNC}}";
pub const TAG_MANUAL_AMOUNT: &str = "{{AMOUNT_PNC}}";

/// Short tags usable in headers and footers, keyed by the body tag they mirror.
pub const HEADER_ALIASES: [(&str, &str); 4] = [
    (TAG_CONTRACT_NUMBER, "<<CN>>"),
    (TAG_CONTRACT_DATE, "<<CD>>"),
    (TAG_INVOICE_NUMBER, "<<IN>>"),
    (TAG_DATE, "<<DT>>"),
];

/// Placeholder for the `index`-th item (1-based).
///
/// `indexed_tag("{{AMOUNT}}", 1) == "{{AMOUNT}}"`, `indexed_tag("{{AMOUNT}}", 3) == "{{AMOUNT3}}"`.
pub fn indexed_tag(base: &str, index: usize) -> String {
    if index == 1 {
        return base.to_string();
    }
    match BASE_TAG_RX.captures(base) {
        Some(caps) => format!("{{{{{}{}}}}}", &caps[1], index),
        None => format!("{base}{index}"),
    }
}
