//! Input validation for document requests.
//!
//! Errors are collected per field so a caller sees every problem at once.

use std::fmt;

use crate::engine::Item;

/// Words accepted in place of an OGRN when the customer has none.
const NO_OGRN_WORDS: [&str; 2] = ["нет", "отсутствует"];

/// Validation error with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path of the failing field, e.g. `items[2].amount`.
    pub field: String,
    pub message: String,
    /// How to fix the value.
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} не может быть пустым", label))
    }

    pub fn invalid_inn(field: &str) -> Self {
        Self::new(field, "ИНН должен содержать 10 или 12 цифр")
            .with_suggestion("Пример: 7701234567")
    }

    pub fn invalid_ogrn(field: &str) -> Self {
        Self::new(field, "ОГРН/ОГРНИП должен содержать 13 или 15 цифр")
            .with_suggestion("Если номера нет, укажите «нет»")
    }

    pub fn invalid_amount(field: &str, value: &str) -> Self {
        Self::new(field, format!("Сумма '{}' не содержит цифр", value))
            .with_suggestion("Пример: 15000")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Numbered list of all errors.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!("Проверка не пройдена, ошибок: {}", self.errors.len())];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.join("\n")
    }

    /// Ok if no errors, Err with the formatted message otherwise.
    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_message())
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

pub fn validate_inn(value: &str, field: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, "ИНН"));
        return;
    }
    if !is_digits(trimmed) || !matches!(trimmed.len(), 10 | 12) {
        errors.add(ValidationError::invalid_inn(field));
    }
}

pub fn validate_ogrn(value: &str, field: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, "ОГРН/ОГРНИП"));
        return;
    }
    if NO_OGRN_WORDS.contains(&trimmed.to_lowercase().as_str()) {
        return;
    }
    if !is_digits(trimmed) || !matches!(trimmed.len(), 13 | 15) {
        errors.add(ValidationError::invalid_ogrn(field));
    }
}

pub fn validate_amount(value: &str, field: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, "Сумма"));
        return;
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        errors.add(ValidationError::invalid_amount(field, value));
    }
}

pub fn validate_items(items: &[Item], errors: &mut ValidationErrors) {
    if items.is_empty() {
        errors.add(
            ValidationError::new("items", "Нужен хотя бы один пункт")
                .with_suggestion("Добавьте канал размещения, период и сумму"),
        );
        return;
    }
    for (i, item) in items.iter().enumerate() {
        let prefix = format!("items[{}]", i);
        validate_required(&item.channel, &format!("{prefix}.channel"), "Канал размещения", errors);
        validate_required(&item.period, &format!("{prefix}.period"), "Период", errors);
        validate_amount(&item.amount, &format!("{prefix}.amount"), errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(f: impl FnOnce(&mut ValidationErrors)) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        f(&mut errors);
        errors
    }

    #[test]
    fn test_inn() {
        assert!(collect(|e| validate_inn("7701234567", "inn", e)).is_empty());
        assert!(collect(|e| validate_inn(" 770123456789 ", "inn", e)).is_empty());
        assert_eq!(collect(|e| validate_inn("77012345", "inn", e)).len(), 1);
        assert_eq!(collect(|e| validate_inn("77012345ab", "inn", e)).len(), 1);
        assert_eq!(collect(|e| validate_inn("", "inn", e)).errors()[0].message, "ИНН не может быть пустым");
    }

    #[test]
    fn test_ogrn() {
        assert!(collect(|e| validate_ogrn("1027700132195", "ogrn", e)).is_empty());
        assert!(collect(|e| validate_ogrn("304500116000157", "ogrn", e)).is_empty());
        assert!(collect(|e| validate_ogrn("Нет", "ogrn", e)).is_empty());
        assert!(collect(|e| validate_ogrn("отсутствует", "ogrn", e)).is_empty());
        assert_eq!(collect(|e| validate_ogrn("12345", "ogrn", e)).len(), 1);
    }

    #[test]
    fn test_items() {
        assert_eq!(collect(|e| validate_items(&[], e)).len(), 1);

        let items = vec![
            Item { channel: "t.me/a".into(), period: "март".into(), amount: "15 000".into(), service_date: None },
            Item { channel: "".into(), period: "".into(), amount: "бесплатно".into(), service_date: None },
        ];
        let errors = collect(|e| validate_items(&items, e));
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items[1].channel", "items[1].period", "items[1].amount"]);
    }

    #[test]
    fn test_message_lists_every_error() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::invalid_inn("customer_inn"));
        errors.add(ValidationError::empty_field("customer_name", "Наименование"));
        let message = errors.into_result().unwrap_err();
        assert!(message.starts_with("Проверка не пройдена, ошибок: 2\n1. [customer_inn]"));
        assert!(message.contains("2. [customer_name] Наименование не может быть пустым"));
    }
}
