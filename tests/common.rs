#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::Path;

use promopro_docs::config::AppConfig;
use promopro_docs::docx::DocxPackage;
use promopro_docs::engine::Item;
use promopro_docs::generators::TemplateSet;
use promopro_docs::AppState;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults/></w:styles>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape(text))
}

pub fn cell(text: &str) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="2000" w:type="dxa"/><w:vAlign w:val="center"/></w:tcPr>{}</w:tc>"#,
        paragraph(text)
    )
}

pub fn row(cells: &[&str]) -> String {
    let inner: String = cells.iter().map(|c| cell(c)).collect();
    format!("<w:tr>{}</w:tr>", inner)
}

/// Item table with a heading row, the two template rows and a totals row.
pub fn item_table() -> String {
    [
        "<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>".to_string(),
        row(&["№", "Канал", "Срок размещения", "Дата", "Сумма"]),
        row(&[
            "1.",
            "{{PLACEMENT_CHANNEL}}",
            "{{SERVICE_PERIOD}}",
            "{{SERVICE_DATE}}",
            "{{AMOUNT}}",
        ]),
        row(&[
            "2.",
            "{{PLACEMENT_CHANNEL2}}",
            "{{SERVICE_PERIOD2}}",
            "{{SERVICE_DATE2}}",
            "{{AMOUNT2}}",
        ]),
        row(&["", "Итого", "", "", "{{TOTAL_SUM}}"]),
        "</w:tbl>".to_string(),
    ]
    .concat()
}

pub fn invoice_multi_body() -> String {
    [
        paragraph("Счёт-оферта № {{INVOICE_NUMBER}} от {{DATE}}"),
        paragraph("Заказчик: {{CUSTOMER_NAME}}, ИНН {{CUSTOMER_INN}}"),
        item_table(),
        paragraph("Итого: {{TOTAL_SUM_WORDS}} рублей"),
        paragraph("Дополнительно: {{PNC}}"),
    ]
    .concat()
}

pub fn invoice_single_body() -> String {
    [
        paragraph("Счёт-оферта № {{INVOICE_NUMBER}} от {{DATE}}"),
        paragraph("Заказчик: {{CUSTOMER_NAME}}, ИНН {{CUSTOMER_INN}}"),
        paragraph("Канал: {{PLACEMENT_CHANNEL}}, период: {{SERVICE_PERIOD}}"),
        paragraph("Сумма: {{AMOUNT}} ({{AMOUNT_WORDS}})"),
    ]
    .concat()
}

pub fn contract_multi_body() -> String {
    [
        paragraph("Договор № РИМ/{{CONTRACT_NUMBER}} от {{CONTRACT_DATE}}"),
        paragraph("{{CUSTOMER_NAME}}, ИНН {{CUSTOMER_INN}}, ОГРН {{CUSTOMER_OGRN}}"),
        item_table(),
        paragraph("Общая стоимость: {{TOTAL_SUM}} ({{TOTAL_SUM_WORDS}}) рублей"),
    ]
    .concat()
}

pub fn contract_single_body() -> String {
    [
        paragraph("Договор № РИМ/{{CONTRACT_NUMBER}} от {{CONTRACT_DATE}}"),
        paragraph("{{CUSTOMER_NAME}}, ИНН {{CUSTOMER_INN}}, ОГРН {{CUSTOMER_OGRN}}"),
        paragraph("Канал {{PLACEMENT_CHANNEL}} на срок {{SERVICE_PERIOD}}, дата {{SERVICE_DATE}}"),
        paragraph("Стоимость: {{AMOUNT}} рублей"),
    ]
    .concat()
}

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{body}<w:sectPr><w:headerReference w:type="default" r:id="rId1"/></w:sectPr></w:body></w:document>"#
    )
}

fn header_xml(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="{W_NS}">{}</w:hdr>"#,
        paragraph(text)
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Write a minimal DOCX template with `body` as its main story and
/// `header` as its only header paragraph.
pub fn write_docx(path: &Path, body: &str, header: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    let entries = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(body)),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/header1.xml", header_xml(header)),
        ("word/styles.xml", STYLES_XML.to_string()),
    ];
    for (name, data) in entries {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Write all five templates under `dir` with their default file names.
pub fn write_all_templates(dir: &Path) -> TemplateSet {
    let set = TemplateSet::in_dir(dir);
    write_docx(&set.invoice_single, &invoice_single_body(), "Счёт <<IN>> от <<DT>>");
    write_docx(&set.invoice_multi, &invoice_multi_body(), "Счёт <<IN>> от <<DT>>");
    write_docx(&set.invoice_multi_pro, &invoice_multi_body(), "PRO счёт <<IN>> от <<DT>>");
    write_docx(&set.contract_single, &contract_single_body(), "Договор <<CN>> от <<CD>>");
    write_docx(&set.contract_multi, &contract_multi_body(), "Договор <<CN>> от <<CD>>");
    set
}

pub fn read_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = String::new();
    entry.read_to_string(&mut out).unwrap();
    out
}

pub fn open(path: &Path) -> DocxPackage {
    DocxPackage::open(path).unwrap()
}

/// Text of every direct paragraph of the main body.
pub fn body_paragraphs(package: &DocxPackage) -> Vec<String> {
    package.body().paragraphs().map(|p| p.text()).collect()
}

/// Cell texts of the first table, row by row.
pub fn table_texts(package: &DocxPackage) -> Vec<Vec<String>> {
    let table = package.body().tables().next().unwrap();
    table
        .rows()
        .map(|r| r.cells().map(|c| c.text()).collect())
        .collect()
}

pub fn header_text(package: &DocxPackage) -> String {
    package.headers_footers()[0]
        .body
        .paragraphs()
        .map(|p| p.text())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn item(channel: &str, period: &str, amount: &str) -> Item {
    Item {
        channel: channel.to_string(),
        period: period.to_string(),
        amount: amount.to_string(),
        service_date: None,
    }
}

/// Test configuration rooted in a temporary directory, with every template present.
pub fn test_config() -> (TempDir, AppConfig) {
    let dir = tempfile::tempdir().unwrap();
    let templates_dir = dir.path().join("templates");
    std::fs::create_dir_all(&templates_dir).unwrap();
    let templates = write_all_templates(&templates_dir);

    let config = AppConfig {
        output_dir: dir.path().join("generated"),
        counters_file: dir.path().join("counters.json"),
        metrics_file: dir.path().join("metrics.json"),
        templates,
        ..AppConfig::default()
    };
    (dir, config)
}

pub fn test_state() -> (TempDir, AppState) {
    let (dir, config) = test_config();
    let state = AppState::from_config(&config).unwrap();
    (dir, state)
}
