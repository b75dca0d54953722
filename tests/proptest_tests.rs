//! Property tests: reference round-trips and the one-row-per-insertion
//! ledger invariant.
#![cfg(feature = "convert")]

mod common;

use chrono::NaiveDate;
use proptest::prelude::*;
use retenciones::ledger::{InsertStrategy, TOTALS_LABEL, find_sentinel, insert_record};
use retenciones::xlsx::{CellRef, Range, Workbook, column_index, column_letters};
use retenciones::{CATEGORY_LABEL, DateValue, InvoiceRecord};
use rust_decimal::Decimal;

fn strategy() -> impl Strategy<Value = InsertStrategy> {
    prop_oneof![Just(InsertStrategy::Swap), Just(InsertStrategy::Shift)]
}

fn record(name: String, number: u32, cents: i64) -> InvoiceRecord {
    let total = Decimal::new(cents, 2);
    InvoiceRecord {
        supplier_tax_id: "900123456".into(),
        supplier_name: name,
        invoice_number: format!("FE-{number}"),
        issue_date: DateValue::Date(NaiveDate::from_ymd_opt(2025, 8, 14).unwrap()),
        total_amount: total,
        taxable_base: total,
        withheld_income_tax: Decimal::ZERO,
        withheld_local_tax: Decimal::ZERO,
        category_label: CATEGORY_LABEL.into(),
    }
}

proptest! {
    #[test]
    fn column_letters_round_trip(col in 1u32..=20_000) {
        let letters = column_letters(col);
        prop_assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
        prop_assert_eq!(column_index(&letters).unwrap(), col);
    }

    #[test]
    fn cell_references_round_trip(row in 1u32..=1_000_000, col in 1u32..=16_384) {
        let cell = CellRef::new(row, col);
        prop_assert_eq!(CellRef::parse(&cell.to_string()).unwrap(), cell);
    }

    #[test]
    fn ranges_round_trip(
        r1 in 1u32..=1_000, c1 in 1u32..=100,
        r2 in 1u32..=1_000, c2 in 1u32..=100,
    ) {
        let range = Range::new(
            CellRef::new(r1.min(r2), c1.min(c2)),
            CellRef::new(r1.max(r2), c1.max(c2)),
        );
        prop_assert_eq!(Range::parse(&range.to_string()).unwrap(), range);
    }

    #[test]
    fn date_parse_never_panics(raw in ".{0,40}") {
        let _ = DateValue::parse(&raw);
    }

    #[test]
    fn each_insertion_moves_the_sentinel_exactly_one_row(
        n in 1usize..=6,
        strategy in strategy(),
        name in "[A-Za-z][A-Za-z ]{0,18}",
        cents in 1i64..=10_000_000_000,
    ) {
        let mut wb = Workbook::from_bytes(common::ledger_workbook()).unwrap();
        let sheet = wb.sheet_mut(common::SHEET_NAME).unwrap();
        let end_before = sheet.tables[0].range.end.row;

        for i in 0..n {
            let rec = record(name.clone(), i as u32, cents);
            insert_record(sheet, &rec, strategy, None).unwrap();
        }

        prop_assert_eq!(
            find_sentinel(sheet, TOTALS_LABEL),
            Some(common::SENTINEL_ROW + n as u32)
        );
        prop_assert_eq!(sheet.tables[0].range.end.row, end_before + n as u32);
        // Header row untouched
        prop_assert_eq!(
            sheet.cell(common::HEADER_ROW, 2).unwrap().as_text(),
            Some("Proveedor")
        );

        // The model survives serialization
        let again = Workbook::from_bytes(wb.to_bytes().unwrap()).unwrap();
        let sheet = again.sheet(common::SHEET_NAME).unwrap();
        prop_assert_eq!(
            find_sentinel(sheet, TOTALS_LABEL),
            Some(common::SENTINEL_ROW + n as u32)
        );
    }
}
