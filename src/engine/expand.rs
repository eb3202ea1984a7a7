//! Dynamic item rows.
//!
//! Multi-item templates carry two pre-built item rows: row 1 with the plain
//! item tags and row 2 with the index-2 tags. Row 2 doubles as the template
//! for items 3..N: each clone gets its own number and its tags rewritten to
//! the item's index, so the regular substitution pass can fill it in.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::docx::format::{apply_base_font, copy_cell_alignment};
use crate::docx::{BaseFont, Body, Row};

use super::tags::{indexed_tag, TAG_AMOUNT, TAG_CHANNEL, TAG_PERIOD, TAG_SERVICE_DATE};

lazy_static! {
    static ref AFFIXED_NUMBER_RX: Regex = Regex::new(r"(\D*)(\d+)(\D*)").expect("valid number regex");
}

/// Heading text that marks the period column when its tag cannot be found.
pub const PERIOD_HEADING_HINT: &str = "Срок размещения";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotEnoughItems,
    TemplatePairNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    Skipped(SkipReason),
    Expanded { rows_added: usize },
}

/// A failed copy/format step on one cell of a cloned row.
#[derive(Debug, Error)]
pub enum CellOperationError {
    #[error("row has no cell at column {0}")]
    MissingCell(usize),
    #[error("template row has no cell at column {0}")]
    MissingTemplateCell(usize),
}

/// How row numbers are printed in the numbering column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberFormat {
    /// `3.`
    Dotted,
    /// `3`
    Plain,
    /// The digits of row 1 with its surrounding text, e.g. `№3)`.
    Affixed { prefix: String, suffix: String },
}

impl NumberFormat {
    /// Infer the format from the numbering cells of row 1 and row 2.
    pub fn infer(row1: &str, row2: &str) -> Self {
        let (r1, r2) = (row1.trim(), row2.trim());
        if r1.ends_with('.') && r2.ends_with('.') {
            return NumberFormat::Dotted;
        }
        if is_plain_number(r1) && is_plain_number(r2) {
            return NumberFormat::Plain;
        }
        match AFFIXED_NUMBER_RX.captures(row1) {
            Some(caps) => NumberFormat::Affixed {
                prefix: caps[1].to_string(),
                suffix: caps[3].to_string(),
            },
            None => NumberFormat::Dotted,
        }
    }

    pub fn render(&self, n: usize) -> String {
        match self {
            NumberFormat::Dotted => format!("{n}."),
            NumberFormat::Plain => n.to_string(),
            NumberFormat::Affixed { prefix, suffix } => format!("{prefix}{n}{suffix}"),
        }
    }
}

fn is_plain_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Columns of row 2 holding each index-2 item tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub channel: Option<usize>,
    pub period: Option<usize>,
    pub amount: Option<usize>,
    pub service_date: Option<usize>,
}

/// Location of the item rows inside the main body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePair {
    pub table: usize,
    pub row1: usize,
    pub row2: usize,
    pub columns: ColumnMap,
    pub number_column: usize,
}

impl fmt::Display for TemplatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table {} rows {}/{} numbering column {}",
            self.table, self.row1, self.row2, self.number_column
        )
    }
}

fn looks_like_number(text: &str, n: usize) -> bool {
    let s = text.trim();
    s == n.to_string() || s == format!("{n}.") || s.starts_with(&format!("{n} "))
}

/// Find the first top-level table holding the row1/row2 template pair.
pub fn locate_template_pair(body: &Body) -> Option<TemplatePair> {
    let channel2 = indexed_tag(TAG_CHANNEL, 2);

    for (table_index, table) in body.tables().enumerate() {
        let mut row1 = None;
        let mut row2 = None;
        for (ri, row) in table.rows().enumerate() {
            if row.contains_text(TAG_CHANNEL) {
                row1 = Some(ri);
            }
            if row.contains_text(&channel2) {
                row2 = Some(ri);
            }
        }
        let (Some(row1), Some(row2)) = (row1, row2) else {
            continue;
        };

        let mut columns = ColumnMap::default();
        if let Some(row) = table.row(row2) {
            let (period2, amount2, date2) = (
                indexed_tag(TAG_PERIOD, 2),
                indexed_tag(TAG_AMOUNT, 2),
                indexed_tag(TAG_SERVICE_DATE, 2),
            );
            for (ci, cell) in row.cells().enumerate() {
                let text = cell.text();
                if text.contains(&channel2) {
                    columns.channel = Some(ci);
                }
                if text.contains(&period2) {
                    columns.period = Some(ci);
                }
                if text.contains(&amount2) {
                    columns.amount = Some(ci);
                }
                if text.contains(&date2) {
                    columns.service_date = Some(ci);
                }
            }
        }

        let number_column = table
            .row(row1)
            .and_then(|row| row.cells().position(|c| looks_like_number(&c.text(), 1)))
            .unwrap_or(0);

        return Some(TemplatePair {
            table: table_index,
            row1,
            row2,
            columns,
            number_column,
        });
    }
    None
}

/// Clone row 2 for items 3..=min(`max_items`, `item_count`).
///
/// Never fails: a cell that cannot be written or styled is skipped and the
/// row is still inserted.
pub fn expand_item_rows(
    body: &mut Body,
    item_count: usize,
    max_items: usize,
    font: &BaseFont,
) -> ExpansionOutcome {
    if item_count <= 2 {
        return ExpansionOutcome::Skipped(SkipReason::NotEnoughItems);
    }
    let Some(pair) = locate_template_pair(body) else {
        log::debug!("No item table with a row1/row2 template pair, skipping row expansion");
        return ExpansionOutcome::Skipped(SkipReason::TemplatePairNotFound);
    };
    let Some(table) = body.tables_mut().nth(pair.table) else {
        return ExpansionOutcome::Skipped(SkipReason::TemplatePairNotFound);
    };

    let number_text = |row: usize| {
        table
            .row(row)
            .and_then(|r| r.cell(pair.number_column))
            .map(|c| c.text())
            .unwrap_or_default()
    };
    let format = NumberFormat::infer(&number_text(pair.row1), &number_text(pair.row2));
    let Some(template) = table.row(pair.row2).cloned() else {
        return ExpansionOutcome::Skipped(SkipReason::TemplatePairNotFound);
    };

    log::debug!("Expanding item rows using {} ({:?})", pair, format);

    let last = max_items.min(item_count);
    let mut insert_after = pair.row2;
    let mut rows_added = 0;
    for k in 3..=last {
        let row = build_item_row(&template, &pair, &format, k, font);
        if table.insert_row_after(insert_after, row) {
            insert_after += 1;
            rows_added += 1;
        }
    }

    if item_count > last {
        log::info!(
            "Item table capped at {} rows, {} items not shown",
            last,
            item_count - last
        );
    }
    ExpansionOutcome::Expanded { rows_added }
}

fn build_item_row(
    template: &Row,
    pair: &TemplatePair,
    format: &NumberFormat,
    k: usize,
    font: &BaseFont,
) -> Row {
    let mut row = template.clone();

    if let Err(e) = write_cell(&mut row, template, pair.number_column, font, |_| format.render(k)) {
        log::debug!("Item row {}: numbering skipped: {}", k, e);
    }

    let tracked = [
        (pair.columns.channel, TAG_CHANNEL),
        (pair.columns.period, TAG_PERIOD),
        (pair.columns.amount, TAG_AMOUNT),
        (pair.columns.service_date, TAG_SERVICE_DATE),
    ];
    for (column, base) in tracked {
        let from = indexed_tag(base, 2);
        let to = indexed_tag(base, k);
        let column = column.or_else(|| {
            row.cells().position(|c| {
                let text = c.text();
                text.contains(&from) || (base == TAG_PERIOD && text.contains(PERIOD_HEADING_HINT))
            })
        });
        let Some(column) = column else {
            continue;
        };
        if let Err(e) = write_cell(&mut row, template, column, font, |text| text.replace(&from, &to)) {
            log::debug!("Item row {}: tag {} not rewritten: {}", k, from, e);
        }
    }

    for (ci, cell) in row.cells_mut().enumerate() {
        apply_base_font(cell, font);
        if let Some(src) = template.cell(ci) {
            copy_cell_alignment(src, cell);
        }
    }
    row
}

/// Rewrite the text of one cell, then restore the template cell's alignment
/// and the base font.
fn write_cell<F>(
    row: &mut Row,
    template: &Row,
    column: usize,
    font: &BaseFont,
    rewrite: F,
) -> Result<(), CellOperationError>
where
    F: FnOnce(&str) -> String,
{
    let src = template
        .cell(column)
        .ok_or(CellOperationError::MissingTemplateCell(column))?;
    let cell = row
        .cell_mut(column)
        .ok_or(CellOperationError::MissingCell(column))?;
    let text = rewrite(&cell.text());
    cell.set_text(&text);
    copy_cell_alignment(src, cell);
    apply_base_font(cell, font);
    Ok(())
}
