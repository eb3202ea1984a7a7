//! Literal placeholder substitution across a document tree.

use std::collections::BTreeMap;

use crate::docx::{Body, Paragraph};

use super::tags::HEADER_ALIASES;

/// Tag -> replacement. Keys are applied in lexical order.
pub type ReplacementMap = BTreeMap<String, String>;

/// Apply `map` to one paragraph. Returns whether the paragraph changed.
///
/// When no tag matches, the paragraph is left exactly as it was, run
/// boundaries and formatting included. Otherwise the new text goes into the
/// first run and the remaining runs are emptied.
pub fn substitute_paragraph(paragraph: &mut Paragraph, map: &ReplacementMap) -> bool {
    if map.is_empty() {
        return false;
    }
    let original = paragraph.text();
    let mut text = original.clone();
    for (tag, value) in map {
        if text.contains(tag.as_str()) {
            text = text.replace(tag.as_str(), value);
        }
    }
    if text == original {
        return false;
    }
    paragraph.set_text(&text);
    true
}

/// Apply `map` to every paragraph reachable from `body`, nested tables
/// included. Returns the number of paragraphs changed.
pub fn substitute_body(body: &mut Body, map: &ReplacementMap) -> usize {
    if map.is_empty() {
        return 0;
    }
    let mut changed = 0;
    body.visit_paragraphs_mut(&mut |p| {
        if substitute_paragraph(p, map) {
            changed += 1;
        }
    });
    changed
}

/// The body map plus the short header/footer aliases (`<<IN>>`, `<<DT>>`,
/// `<<CN>>`, `<<CD>>`) for every long tag present in it.
pub fn with_header_aliases(map: &ReplacementMap) -> ReplacementMap {
    let mut aliased = map.clone();
    for (long, short) in HEADER_ALIASES {
        if let Some(value) = map.get(long) {
            aliased.insert(short.to_string(), value.clone());
        }
    }
    aliased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::XmlDocument;

    fn body(inner: &str) -> Body {
        let xml = format!(r#"<w:body xmlns:w="urn:w">{inner}</w:body>"#);
        Body::from_nodes(XmlDocument::parse(xml.as_bytes()).unwrap().root.children)
    }

    fn map(pairs: &[(&str, &str)]) -> ReplacementMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const SAMPLE: &str = "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">Customer: </w:t></w:r>\
        <w:r><w:t>{{CUSTOMER_NAME}}</w:t></w:r></w:p>\
        <w:p><w:r><w:t>static</w:t></w:r><w:r><w:t> text</w:t></w:r></w:p>\
        <w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{TOTAL_SUM}} руб.</w:t></w:r></w:p>\
        <w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{DATE}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
        </w:tc></w:tr></w:tbl>";

    #[test]
    fn test_replaces_tags_and_collapses_runs() {
        let mut b = body(SAMPLE);
        let changed = substitute_body(
            &mut b,
            &map(&[("{{CUSTOMER_NAME}}", "ООО «Ромашка»"), ("{{TOTAL_SUM}}", "15 000")]),
        );
        assert_eq!(changed, 2);

        let first = b.paragraphs().next().unwrap();
        assert_eq!(first.text(), "Customer: ООО «Ромашка»");
        let runs: Vec<_> = first.runs().collect();
        assert_eq!(runs[0].text(), "Customer: ООО «Ромашка»");
        assert!(runs[0].properties.is_some());
        assert_eq!(runs[1].text(), "");

        let cell_text = b.tables().next().unwrap().row(0).unwrap().cell(0).unwrap().text();
        assert_eq!(cell_text, "15 000 руб.");
    }

    #[test]
    fn test_nested_tables_are_visited() {
        let mut b = body(SAMPLE);
        assert_eq!(substitute_body(&mut b, &map(&[("{{DATE}}", "01.02.2025")])), 1);
        let outer = b.tables().next().unwrap().row(0).unwrap().cell(0).unwrap();
        let inner = outer.body.tables().next().unwrap().row(0).unwrap().cell(0).unwrap();
        assert_eq!(inner.text(), "01.02.2025");
    }

    #[test]
    fn test_empty_map_is_a_no_op() {
        let mut b = body(SAMPLE);
        let before = b.clone();
        substitute_body(&mut b, &ReplacementMap::new());
        substitute_body(&mut b, &ReplacementMap::new());
        assert_eq!(b, before);
    }

    #[test]
    fn test_unmatched_tags_keep_run_structure() {
        let mut b = body(SAMPLE);
        let before = b.clone();
        assert_eq!(substitute_body(&mut b, &map(&[("{{MISSING}}", "x")])), 0);
        assert_eq!(b, before);
    }

    #[test]
    fn test_header_aliases_only_for_present_keys() {
        let aliased = with_header_aliases(&map(&[
            ("{{INVOICE_NUMBER}}", "05-03-01"),
            ("{{DATE}}", "05.03.2025"),
        ]));
        assert_eq!(aliased.get("<<IN>>").map(String::as_str), Some("05-03-01"));
        assert_eq!(aliased.get("<<DT>>").map(String::as_str), Some("05.03.2025"));
        assert!(!aliased.contains_key("<<CN>>"));
        assert!(!aliased.contains_key("<<CD>>"));
        assert_eq!(aliased.len(), 4);
    }
}
