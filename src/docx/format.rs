//! Cell styling used when item rows are cloned and when a render finishes.

use serde::{Deserialize, Serialize};

use super::tree::{Cell, Paragraph};
use super::xml::Element;

/// Schema order of `w:rPr` children.
const RPR_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps",
    "w:strike", "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof",
    "w:snapToGrid", "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern",
    "w:position", "w:sz", "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd",
    "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout",
    "w:specVanish", "w:oMath",
];

/// Schema order of `w:pPr` children.
const PPR_ORDER: &[&str] = &[
    "w:pStyle", "w:keepNext", "w:keepLines", "w:pageBreakBefore", "w:framePr",
    "w:widowControl", "w:numPr", "w:suppressLineNumbers", "w:pBdr", "w:shd", "w:tabs",
    "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap", "w:overflowPunct", "w:topLinePunct",
    "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi", "w:adjustRightInd", "w:snapToGrid",
    "w:spacing", "w:ind", "w:contextualSpacing", "w:mirrorIndents", "w:suppressOverlap",
    "w:jc", "w:textDirection", "w:textAlignment", "w:textboxTightWrap", "w:outlineLvl",
    "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr", "w:pPrChange",
];

/// Schema order of `w:tcPr` children.
const TCPR_ORDER: &[&str] = &[
    "w:cnfStyle", "w:tcW", "w:gridSpan", "w:hMerge", "w:vMerge", "w:tcBorders", "w:shd",
    "w:noWrap", "w:tcMar", "w:textDirection", "w:tcFitText", "w:vAlign", "w:hideMark",
];

/// Paragraph properties carried over from a template cell.
const COPIED_PARAGRAPH_PROPS: [&str; 3] = ["w:jc", "w:ind", "w:spacing"];

const THEME_FONT_ATTRS: [&str; 4] = ["w:asciiTheme", "w:hAnsiTheme", "w:cstheme", "w:eastAsiaTheme"];

/// Font forced onto every table cell of a rendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFont {
    pub family: String,
    pub size_pt: f32,
}

impl Default for BaseFont {
    fn default() -> Self {
        Self {
            family: "Times New Roman".to_string(),
            size_pt: 12.0,
        }
    }
}

impl BaseFont {
    /// Size in the half-points unit used by `w:sz`.
    pub fn half_points(&self) -> u32 {
        (self.size_pt * 2.0).round().max(1.0) as u32
    }
}

/// Set font family and size on every run of every direct paragraph of `cell`.
pub fn apply_base_font(cell: &mut Cell, font: &BaseFont) {
    let size = font.half_points().to_string();
    for paragraph in cell.body.paragraphs_mut() {
        for run in paragraph.runs_mut() {
            let rpr = run.properties_mut();

            let mut fonts = rpr.child("w:rFonts").cloned().unwrap_or_else(|| Element::new("w:rFonts"));
            fonts.attributes.retain(|(k, _)| !THEME_FONT_ATTRS.contains(&k.as_str()));
            fonts.set_attribute("w:ascii", font.family.as_str());
            fonts.set_attribute("w:hAnsi", font.family.as_str());
            fonts.set_attribute("w:cs", font.family.as_str());
            rpr.set_child_ordered(fonts, RPR_ORDER);

            rpr.set_child_ordered(Element::new("w:sz").with_attribute("w:val", size.as_str()), RPR_ORDER);
            rpr.set_child_ordered(Element::new("w:szCs").with_attribute("w:val", size.as_str()), RPR_ORDER);
        }
    }
}

/// Copy justification, indentation and spacing of `src` onto `dst`.
///
/// A property absent on `src` is removed from `dst`.
pub fn copy_paragraph_format(src: &Paragraph, dst: &mut Paragraph) {
    for name in COPIED_PARAGRAPH_PROPS {
        let source = src.properties.as_ref().and_then(|p| p.child(name)).cloned();
        match source {
            Some(prop) => dst.properties_mut().set_child_ordered(prop, PPR_ORDER),
            None => {
                if let Some(props) = dst.properties.as_mut() {
                    props.remove_children_named(name);
                }
            }
        }
    }
}

/// Copy the vertical alignment of `src` and the paragraph format of its first
/// paragraph onto `dst`.
pub fn copy_cell_alignment(src: &Cell, dst: &mut Cell) {
    let valign = src.properties.as_ref().and_then(|p| p.child("w:vAlign")).cloned();
    match valign {
        Some(v) => dst.properties_mut().set_child_ordered(v, TCPR_ORDER),
        None => {
            if let Some(props) = dst.properties.as_mut() {
                props.remove_children_named("w:vAlign");
            }
        }
    }

    if let (Some(sp), Some(dp)) = (src.body.paragraphs().next(), dst.body.paragraphs_mut().next()) {
        copy_paragraph_format(sp, dp);
    }
}
