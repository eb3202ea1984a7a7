//! Typed document tree: bodies, paragraphs, runs, tables, rows and cells.
//!
//! Every node owns its children. A `Body` is lifted from the children of a
//! `w:body`, `w:hdr`, `w:ftr` or `w:tc` element and lowered back into plain
//! XML nodes on save. Anything that is not one of the typed nodes is carried
//! through untouched as [`Node`].

use super::xml::{Element, Node};

pub const W_P: &str = "w:p";
pub const W_PPR: &str = "w:pPr";
pub const W_R: &str = "w:r";
pub const W_RPR: &str = "w:rPr";
pub const W_T: &str = "w:t";
pub const W_TAB: &str = "w:tab";
pub const W_BR: &str = "w:br";
pub const W_CR: &str = "w:cr";
pub const W_TBL: &str = "w:tbl";
pub const W_TR: &str = "w:tr";
pub const W_TC: &str = "w:tc";
pub const W_TCPR: &str = "w:tcPr";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Other(Node),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<Element>,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Other(Node),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<Element>,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub attributes: Vec<(String, String)>,
    pub content: Vec<TableChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableChild {
    Row(Row),
    Other(Node),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub attributes: Vec<(String, String)>,
    pub content: Vec<RowChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowChild {
    Cell(Cell),
    Other(Node),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<Element>,
    pub body: Body,
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

impl Body {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let blocks = nodes
            .into_iter()
            .map(|node| match node {
                Node::Element(e) if e.name == W_P => Block::Paragraph(Paragraph::from_element(e)),
                Node::Element(e) if e.name == W_TBL => Block::Table(Table::from_element(e)),
                other => Block::Other(other),
            })
            .collect();
        Self { blocks }
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.blocks
            .into_iter()
            .map(|block| match block {
                Block::Paragraph(p) => Node::Element(p.into_element()),
                Block::Table(t) => Node::Element(t.into_element()),
                Block::Other(node) => node,
            })
            .collect()
    }

    /// Direct paragraphs of this body (not those nested in tables).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Direct tables of this body.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Visit every paragraph reachable from this body, descending into tables.
    pub fn visit_paragraphs_mut<F: FnMut(&mut Paragraph)>(&mut self, f: &mut F) {
        for block in &mut self.blocks {
            match block {
                Block::Paragraph(p) => f(p),
                Block::Table(t) => {
                    for row in t.rows_mut() {
                        for cell in row.cells_mut() {
                            cell.body.visit_paragraphs_mut(f);
                        }
                    }
                }
                Block::Other(_) => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Paragraph / Run
// ---------------------------------------------------------------------------

impl Paragraph {
    pub fn from_element(element: Element) -> Self {
        let mut paragraph = Paragraph {
            attributes: element.attributes,
            ..Default::default()
        };
        for node in element.children {
            match node {
                Node::Element(e) if e.name == W_PPR && paragraph.properties.is_none() => {
                    paragraph.properties = Some(e)
                }
                Node::Element(e) if e.name == W_R => {
                    paragraph.content.push(Inline::Run(Run::from_element(e)))
                }
                other => paragraph.content.push(Inline::Other(other)),
            }
        }
        paragraph
    }

    pub fn into_element(self) -> Element {
        let mut element = Element::new(W_P);
        element.attributes = self.attributes;
        if let Some(props) = self.properties {
            element.children.push(Node::Element(props));
        }
        element.children.extend(self.content.into_iter().map(|inline| match inline {
            Inline::Run(r) => Node::Element(r.into_element()),
            Inline::Other(node) => node,
        }));
        element
    }

    /// A paragraph holding a single run with `text`.
    pub fn with_text(text: &str) -> Self {
        let mut run = Run::default();
        run.set_text(text);
        Paragraph {
            content: vec![Inline::Run(run)],
            ..Default::default()
        }
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.content.iter_mut().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Logical text: the concatenation of the runs' text.
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Put `text` into the first run and empty every following run.
    ///
    /// The first run keeps its formatting. A run is added when the paragraph
    /// has none.
    pub fn set_text(&mut self, text: &str) {
        if self.runs().next().is_none() {
            let mut run = Run::default();
            run.set_text(text);
            self.content.push(Inline::Run(run));
            return;
        }
        for (i, run) in self.runs_mut().enumerate() {
            run.set_text(if i == 0 { text } else { "" });
        }
    }

    pub fn properties_mut(&mut self) -> &mut Element {
        self.properties.get_or_insert_with(|| Element::new(W_PPR))
    }
}

impl Run {
    pub fn from_element(element: Element) -> Self {
        let mut run = Run {
            attributes: element.attributes,
            ..Default::default()
        };
        for node in element.children {
            match node {
                Node::Element(e) if e.name == W_RPR && run.properties.is_none() => {
                    run.properties = Some(e)
                }
                other => run.content.push(other),
            }
        }
        run
    }

    pub fn into_element(self) -> Element {
        let mut element = Element::new(W_R);
        element.attributes = self.attributes;
        if let Some(props) = self.properties {
            element.children.push(Node::Element(props));
        }
        element.children.extend(self.content);
        element
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for element in self.content.iter().filter_map(Node::as_element) {
            match element.name.as_str() {
                W_T => text.push_str(&element.text()),
                W_TAB => text.push('\t'),
                W_BR | W_CR => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    /// Replace the run's content with `text`; tabs and line breaks become
    /// `w:tab` / `w:br` elements. Run properties are kept.
    pub fn set_text(&mut self, text: &str) {
        self.content.clear();
        let mut pending = String::new();
        for ch in text.chars() {
            match ch {
                '\t' | '\n' | '\r' => {
                    self.flush_text(&mut pending);
                    let name = if ch == '\t' { W_TAB } else { W_BR };
                    self.content.push(Node::Element(Element::new(name)));
                }
                _ => pending.push(ch),
            }
        }
        self.flush_text(&mut pending);
    }

    fn flush_text(&mut self, pending: &mut String) {
        if pending.is_empty() {
            return;
        }
        let mut t = Element::new(W_T);
        if pending.starts_with(char::is_whitespace) || pending.ends_with(char::is_whitespace) {
            t.set_attribute("xml:space", "preserve");
        }
        t.children.push(Node::Text(std::mem::take(pending)));
        self.content.push(Node::Element(t));
    }

    pub fn properties_mut(&mut self) -> &mut Element {
        self.properties.get_or_insert_with(|| Element::new(W_RPR))
    }
}

// ---------------------------------------------------------------------------
// Table / Row / Cell
// ---------------------------------------------------------------------------

impl Table {
    pub fn from_element(element: Element) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|node| match node {
                Node::Element(e) if e.name == W_TR => TableChild::Row(Row::from_element(e)),
                other => TableChild::Other(other),
            })
            .collect();
        Table {
            attributes: element.attributes,
            content,
        }
    }

    pub fn into_element(self) -> Element {
        let mut element = Element::new(W_TBL);
        element.attributes = self.attributes;
        element.children = self
            .content
            .into_iter()
            .map(|child| match child {
                TableChild::Row(r) => Node::Element(r.into_element()),
                TableChild::Other(node) => node,
            })
            .collect();
        element
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.content.iter().filter_map(|c| match c {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.content.iter_mut().filter_map(|c| match c {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows().nth(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// Insert `row` directly after the row at `index`; returns `false` when
    /// there is no such row.
    pub fn insert_row_after(&mut self, index: usize, row: Row) -> bool {
        let position = self
            .content
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, TableChild::Row(_)))
            .nth(index)
            .map(|(pos, _)| pos);
        match position {
            Some(pos) => {
                self.content.insert(pos + 1, TableChild::Row(row));
                true
            }
            None => false,
        }
    }
}

impl Row {
    pub fn from_element(element: Element) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|node| match node {
                Node::Element(e) if e.name == W_TC => RowChild::Cell(Cell::from_element(e)),
                other => RowChild::Other(other),
            })
            .collect();
        Row {
            attributes: element.attributes,
            content,
        }
    }

    pub fn into_element(self) -> Element {
        let mut element = Element::new(W_TR);
        element.attributes = self.attributes;
        element.children = self
            .content
            .into_iter()
            .map(|child| match child {
                RowChild::Cell(c) => Node::Element(c.into_element()),
                RowChild::Other(node) => node,
            })
            .collect();
        element
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.content.iter().filter_map(|c| match c {
            RowChild::Cell(cell) => Some(cell),
            _ => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.content.iter_mut().filter_map(|c| match c {
            RowChild::Cell(cell) => Some(cell),
            _ => None,
        })
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells().nth(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells_mut().nth(index)
    }

    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.cells().any(|c| c.text().contains(needle))
    }
}

impl Cell {
    pub fn from_element(element: Element) -> Self {
        let mut properties = None;
        let mut rest = Vec::with_capacity(element.children.len());
        for node in element.children {
            match node {
                Node::Element(e) if e.name == W_TCPR && properties.is_none() => properties = Some(e),
                other => rest.push(other),
            }
        }
        Cell {
            attributes: element.attributes,
            properties,
            body: Body::from_nodes(rest),
        }
    }

    pub fn into_element(self) -> Element {
        let mut element = Element::new(W_TC);
        element.attributes = self.attributes;
        if let Some(props) = self.properties {
            element.children.push(Node::Element(props));
        }
        element.children.extend(self.body.into_nodes());
        element
    }

    /// Direct paragraph texts joined with `\n`.
    pub fn text(&self) -> String {
        self.body
            .paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace all cell content with a single unformatted paragraph holding
    /// `text`. Cell properties are kept.
    pub fn set_text(&mut self, text: &str) {
        self.body.blocks = vec![Block::Paragraph(Paragraph::with_text(text))];
    }

    pub fn properties_mut(&mut self) -> &mut Element {
        self.properties.get_or_insert_with(|| Element::new(W_TCPR))
    }
}
