use crate::core::{DateValue, InvoiceRecord, StructuralError};
use crate::xlsx::{Cell, TableColumn, Worksheet};

use super::{
    COL_CATEGORY, COL_INCOME_TAX, COL_INVOICE_NUMBER, COL_ISSUE_DATE, COL_LOCAL_TAX,
    COL_OPERATION_TYPE, COL_SUPPLIER_NAME, COL_SUPPLIER_NIT, COL_TAXABLE_BASE, COL_TOTAL_AMOUNT,
    InsertStrategy, OPERATION_TYPE_LABEL, TOTALS_LABEL,
};

/// Row index of the sentinel cell, by full linear scan.
///
/// Matches any text cell equal to `label` after trimming, case-insensitive.
/// Re-run before every insertion; the sentinel moves, so its position is
/// never cached.
pub fn find_sentinel(sheet: &Worksheet, label: &str) -> Option<u32> {
    for (index, row) in sheet.rows() {
        for cell in row.cells.values() {
            if let Some(text) = cell.as_text() {
                if text.trim().eq_ignore_ascii_case(label) {
                    return Some(index);
                }
            }
        }
    }
    None
}

/// Insert one invoice record into the row directly above the sentinel.
///
/// Structural preconditions (a table object, a sentinel row) are checked
/// before any mutation; on error the sheet is untouched. `date_style` is the
/// cell-format index applied to parsed issue dates.
pub fn insert_record(
    sheet: &mut Worksheet,
    record: &InvoiceRecord,
    strategy: InsertStrategy,
    date_style: Option<u32>,
) -> Result<(), StructuralError> {
    if sheet.tables.is_empty() {
        return Err(StructuralError::NoTableDefined(sheet.name().to_string()));
    }
    let sentinel = find_sentinel(sheet, TOTALS_LABEL)
        .ok_or_else(|| StructuralError::SentinelNotFound(TOTALS_LABEL.to_string()))?;

    match strategy {
        InsertStrategy::Swap => insert_swap(sheet, record, sentinel, date_style),
        InsertStrategy::Shift => insert_shift(sheet, record, sentinel, date_style),
    }
    Ok(())
}

fn insert_swap(
    sheet: &mut Worksheet,
    record: &InvoiceRecord,
    sentinel: u32,
    date_style: Option<u32>,
) {
    sheet.copy_row(sentinel, sentinel + 1);
    sheet.clear_row_values(sentinel);
    write_record(sheet, sentinel, record, false, date_style);

    // Rebuild the column list from the header row before borrowing the table.
    let range = sheet.tables[0].range;
    let header_row = range.start.row;
    let mut columns = Vec::with_capacity(range.column_count() as usize);
    for (ordinal, col) in (range.start.col..=range.end.col).enumerate() {
        let ordinal = ordinal as u32 + 1;
        let name = sheet
            .cell(header_row, col)
            .and_then(Cell::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Column{ordinal}"));
        columns.push(TableColumn { id: ordinal, name });
    }

    let table = &mut sheet.tables[0];
    table.range.end.row = sentinel;
    table.columns = columns;
    table.autofilter = Some(table.range);
    table.header_row_count = 1;
}

fn insert_shift(
    sheet: &mut Worksheet,
    record: &InvoiceRecord,
    sentinel: u32,
    date_style: Option<u32>,
) {
    sheet.shift_rows_down(sentinel);
    write_record(sheet, sentinel, record, true, date_style);

    // Legacy behavior: only the range ref grows, nothing else is rewritten.
    sheet.tables[0].range.end.row += 1;
}

/// Write the record's cells into `row` at the fixed column offsets, taking
/// each cell's style from the row above (the last data row).
fn write_record(
    sheet: &mut Worksheet,
    row: u32,
    record: &InvoiceRecord,
    wide: bool,
    date_style: Option<u32>,
) {
    let style_above =
        |sheet: &Worksheet, col: u32| sheet.cell(row - 1, col).and_then(|c| c.style);

    let put = |sheet: &mut Worksheet, col: u32, cell: Cell| {
        let style = style_above(sheet, col);
        sheet.set_cell(row, col, cell.with_style(style));
    };

    put(sheet, COL_SUPPLIER_NAME, Cell::text(&record.supplier_name));
    put(sheet, COL_SUPPLIER_NIT, Cell::text(&record.supplier_tax_id));
    put(
        sheet,
        COL_INVOICE_NUMBER,
        Cell::text(&record.invoice_number),
    );
    put(sheet, COL_TOTAL_AMOUNT, Cell::number(record.total_amount));
    put(sheet, COL_TAXABLE_BASE, Cell::number(record.taxable_base));
    put(sheet, COL_CATEGORY, Cell::text(&record.category_label));

    match &record.issue_date {
        DateValue::Date(date) => {
            let style = date_style.or_else(|| style_above(sheet, COL_ISSUE_DATE));
            sheet.set_cell(row, COL_ISSUE_DATE, Cell::date(*date).with_style(style));
        }
        DateValue::Text(text) => put(sheet, COL_ISSUE_DATE, Cell::text(text)),
    }

    if wide {
        put(sheet, COL_OPERATION_TYPE, Cell::text(OPERATION_TYPE_LABEL));
        put(sheet, COL_LOCAL_TAX, Cell::number(record.withheld_local_tax));
        put(
            sheet,
            COL_INCOME_TAX,
            Cell::number(record.withheld_income_tax),
        );
    }
}
