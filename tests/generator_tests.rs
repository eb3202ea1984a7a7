mod common;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use promopro_docs::caption::DocumentKind;
use promopro_docs::engine::Item;
use promopro_docs::generators::{
    ContractGenerator, ContractRequest, Generator, GeneratorError, InvoiceGenerator, InvoiceRequest,
    ManualItem,
};

use common::*;

fn moscow_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 3, 5, 10, 0, 0)
        .unwrap()
}

fn invoice_request(items: Vec<Item>) -> InvoiceRequest {
    InvoiceRequest {
        user_id: "42".into(),
        customer_name: "ООО «Ромашка»".into(),
        customer_inn: "7701234567".into(),
        items,
        manual_item: None,
        use_pro_template: false,
    }
}

fn contract_request(items: Vec<Item>) -> ContractRequest {
    ContractRequest {
        user_id: "7".into(),
        customer_name: "ИП Иванов".into(),
        customer_inn: "770123456789".into(),
        customer_ogrn: "304500116000157".into(),
        items,
    }
}

fn three_items() -> Vec<Item> {
    vec![
        item("t.me/first", "с 10.03.2025 по 20.03.2025", "10 000"),
        item("t.me/second", "весь март", "5000 руб."),
        item("t.me/third", "21.03.25", "1000"),
    ]
}

#[test]
fn test_invoice_with_several_items() {
    let (_dir, state) = test_state();
    let generator = InvoiceGenerator::new(state.generators.clone());

    let doc = generator
        .generate_at(invoice_request(three_items()), moscow_morning())
        .unwrap();
    assert_eq!(doc.kind, DocumentKind::Invoice);
    assert_eq!(doc.number, "05-03-01");
    assert_eq!(doc.date, "05.03.2025");
    assert_eq!(doc.filename, "Счет-оферта_ООО_Ромашка_05-03-01.docx");
    assert_eq!(doc.total_sum, 16_000);
    assert_eq!(doc.items_count, 3);
    assert!(doc.path.is_file());
    assert!(doc.caption.starts_with("*🧾 Счёт-оферта №05-03-01 от 05.03.2025*"));

    let package = open(&doc.path);
    assert_eq!(header_text(&package), "Счёт 05-03-01 от 05.03.2025");
    let rows = table_texts(&package);
    assert_eq!(rows.len(), 5);
    assert_eq!(
        rows[1],
        vec!["1.", "t.me/first", "с 10.03.2025 по 20.03.2025", "10.03.2025", "10 000"]
    );
    assert_eq!(rows[2], vec!["2.", "t.me/second", "весь март", "10.03.2025", "5000 руб."]);
    assert_eq!(rows[3], vec!["3.", "t.me/third", "21.03.25", "21.03.2025", "1000"]);
    assert_eq!(rows[4][4], "16 000");
}

#[test]
fn test_invoice_numbers_increase_per_user() {
    let (_dir, state) = test_state();
    let generator = InvoiceGenerator::new(state.generators.clone());
    let now = moscow_morning();

    let first = generator.generate_at(invoice_request(three_items()), now).unwrap();
    let second = generator.generate_at(invoice_request(three_items()), now).unwrap();
    let mut other_user = invoice_request(three_items());
    other_user.user_id = "43".into();
    let third = generator.generate_at(other_user, now).unwrap();

    assert_eq!(first.number, "05-03-01");
    assert_eq!(second.number, "05-03-02");
    assert_eq!(third.number, "05-03-01");
    assert_ne!(first.filename, second.filename);
}

#[test]
fn test_single_item_invoice_uses_single_template() {
    let (_dir, state) = test_state();
    let generator = InvoiceGenerator::new(state.generators.clone());

    let request = invoice_request(vec![item("t.me/a", "март", "1000")]);
    let doc = generator.generate_at(request, moscow_morning()).unwrap();

    let paragraphs = body_paragraphs(&open(&doc.path));
    assert_eq!(paragraphs[1], "Заказчик: ООО «Ромашка», ИНН 7701234567");
    assert_eq!(paragraphs[2], "Канал: t.me/a, период: март");
    assert!(paragraphs[3].starts_with("Сумма: 1000 ("));
    assert!(!paragraphs[3].contains("{{"));
}

#[test]
fn test_pro_invoice_with_manual_item() {
    let (_dir, state) = test_state();
    let generator = InvoiceGenerator::new(state.generators.clone());

    let mut request = invoice_request(vec![item("t.me/a", "март", "1000")]);
    request.use_pro_template = true;
    request.manual_item = Some(ManualItem {
        text: "Подготовка креатива".into(),
        amount: "500".into(),
    });
    let doc = generator.generate_at(request, moscow_morning()).unwrap();
    assert_eq!(doc.total_sum, 1500);

    let package = open(&doc.path);
    assert_eq!(header_text(&package), "PRO счёт 05-03-01 от 05.03.2025");
    let paragraphs = body_paragraphs(&package);
    assert_eq!(paragraphs[3], "Дополнительно: Подготовка креатива");
}

#[test]
fn test_missing_multi_template_falls_back_to_single() {
    let (_dir, config) = test_config();
    std::fs::remove_file(&config.templates.invoice_multi).unwrap();
    let state = promopro_docs::AppState::from_config(&config).unwrap();
    let generator = InvoiceGenerator::new(state.generators.clone());

    let doc = generator
        .generate_at(invoice_request(three_items()), moscow_morning())
        .unwrap();
    let paragraphs = body_paragraphs(&open(&doc.path));
    assert_eq!(paragraphs[2], "Канал: t.me/first, период: с 10.03.2025 по 20.03.2025");
}

#[test]
fn test_missing_templates_do_not_consume_a_number() {
    let (_dir, config) = test_config();
    std::fs::remove_file(&config.templates.invoice_single).unwrap();
    std::fs::remove_file(&config.templates.invoice_multi).unwrap();
    let state = promopro_docs::AppState::from_config(&config).unwrap();
    let generator = InvoiceGenerator::new(state.generators.clone());

    let result = generator.generate_at(invoice_request(three_items()), moscow_morning());
    assert!(matches!(result, Err(GeneratorError::TemplateNotFound(_))));

    let day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    assert_eq!(state.generators.sequences.current(day, "42"), 0);
}

#[test]
fn test_invalid_invoice_is_rejected_before_rendering() {
    let (_dir, state) = test_state();
    let generator = InvoiceGenerator::new(state.generators.clone());

    let mut request = invoice_request(vec![item("t.me/a", "март", "бесплатно")]);
    request.customer_inn = "12345".into();
    let result = generator.generate_at(request, moscow_morning());

    match result {
        Err(GeneratorError::Validation(message)) => {
            assert!(message.contains("[customer_inn]"));
            assert!(message.contains("[items[0].amount]"));
        }
        other => panic!("expected a validation error, got {:?}", other.map(|d| d.filename)),
    }
    let generated: Vec<_> = std::fs::read_dir(&state.generators.output_dir).unwrap().collect();
    assert!(generated.is_empty());
}

#[test]
fn test_contract_with_several_items() {
    let (_dir, state) = test_state();
    let generator = ContractGenerator::new(state.generators.clone());

    let items = vec![
        item("t.me/a", "24 часа", "15000р"),
        item("t.me/b", "с 02.04.25", "1 500 000"),
        item("t.me/c", "неделя", "500"),
    ];
    let doc = generator
        .generate_at(contract_request(items), moscow_morning())
        .unwrap();
    assert_eq!(doc.kind, DocumentKind::Contract);
    assert_eq!(doc.filename, "Договор_РИМ_ИП_Иванов_05-03-01.docx");
    assert_eq!(doc.total_sum, 1_515_500);
    assert!(doc.caption.starts_with("*🧾 Договор №РИМ/05-03-01 от 05.03.2025*"));

    let package = open(&doc.path);
    assert_eq!(header_text(&package), "Договор 05-03-01 от 05.03.2025");
    let paragraphs = body_paragraphs(&package);
    assert_eq!(paragraphs[0], "Договор № РИМ/05-03-01 от 05.03.2025");
    assert_eq!(paragraphs[1], "ИП Иванов, ИНН 770123456789, ОГРН 304500116000157");
    assert!(paragraphs[2].starts_with("Общая стоимость: 1 515 500 ("));

    let rows = table_texts(&package);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[1][4], "15 000");
    assert_eq!(rows[2], vec!["2.", "t.me/b", "с 02.04.25", "02.04.2025", "1 500 000"]);
    assert_eq!(rows[3][1], "t.me/c");
    assert_eq!(rows[3][4], "500");
}

#[test]
fn test_single_item_contract_uses_item_service_date() {
    let (_dir, state) = test_state();
    let generator = ContractGenerator::new(state.generators.clone());

    let mut only = item("t.me/a", "24 часа", "15000");
    only.service_date = Some("01.04.2025".into());
    let doc = generator
        .generate_at(contract_request(vec![only]), moscow_morning())
        .unwrap();

    let paragraphs = body_paragraphs(&open(&doc.path));
    assert_eq!(paragraphs[2], "Канал t.me/a на срок 24 часа, дата 01.04.2025");
    assert_eq!(paragraphs[3], "Стоимость: 15 000 рублей");
}

#[test]
fn test_contract_accepts_missing_ogrn_word() {
    let (_dir, state) = test_state();
    let generator = ContractGenerator::new(state.generators.clone());

    let mut request = contract_request(vec![item("t.me/a", "24 часа", "15000")]);
    request.customer_ogrn = "нет".into();
    assert!(generator.generate_at(request.clone(), moscow_morning()).is_ok());

    request.customer_ogrn = "123".into();
    assert!(matches!(
        generator.generate_at(request, moscow_morning()),
        Err(GeneratorError::Validation(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invoices_get_distinct_numbers() {
    let (_dir, state) = test_state();
    let now = moscow_morning();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = InvoiceGenerator::new(state.generators.clone());
            tokio::task::spawn_blocking(move || generator.generate_at(invoice_request(three_items()), now))
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().number);
    }
    numbers.sort();
    let expected: Vec<String> = (1..=8).map(|n| format!("05-03-{:02}", n)).collect();
    assert_eq!(numbers, expected);
}
