use std::path::{Path, PathBuf};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::{
    error::Error,
    report::{Report, Value},
};

pub const CURRENCY_FORMAT: &str = "[$$-409]#,##0.00";

/// Widths of columns A..F.
const COLUMN_WIDTHS: [f64; 6] = [25.0, 12.0, 12.0, 12.0, 15.0, 12.0];

fn to_f64(value: Decimal) -> Result<f64, Error> {
    value
        .to_f64()
        .ok_or_else(|| Error::Report(format!("{} does not fit a spreadsheet number", value)))
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value, money: &Format) -> Result<(), Error> {
    let written = match value {
        Value::Text(s) => worksheet.write_string(row, col, s),
        Value::Integer(n) => worksheet.write_number(row, col, *n as f64),
        Value::Number(n) => worksheet.write_number(row, col, to_f64(*n)?),
        Value::Money(n) => worksheet.write_number_with_format(row, col, to_f64(*n)?, money),
    };
    written.map_err(|e| Error::Report(format!("cell ({}, {}): {}", row, col, e)))?;
    Ok(())
}

/// Write `report` as `<dir>/<file_stem>.xlsx`, returning the path written.
pub fn write_report(report: &Report, dir: &Path) -> Result<PathBuf, Error> {
    let path = dir.join(format!("{}.xlsx", report.file_stem));
    let money = Format::new().set_num_format(CURRENCY_FORMAT);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (row, report_row) in report.rows.iter().enumerate() {
        for (col, value) in report_row.cells() {
            write_value(worksheet, row as u32, col, &value, &money)?;
        }
    }
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet
            .set_column_width(col as u16, *width)
            .map_err(|e| Error::Report(format!("column {} width: {}", col, e)))?;
    }

    workbook
        .save(&path)
        .map_err(|e| Error::Report(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::aggregate::{DateRange, MerchantAggregate};
    use crate::partner::PartnerConfig;
    use crate::render::write_report;
    use crate::report::{compose, REPORT_TITLE};
    use crate::table::{Cell, Table};
    use crate::transaction::{CustomerKey, TransactionRecord};
    use crate::workbook::open_data_sheet;

    #[test]
    fn written_report_reads_back() {
        let partner = PartnerConfig {
            appears_as: "ACME".to_string(),
            retailer_name: "Acme Corp".to_string(),
            contact_name: "Wile E.".to_string(),
            contact_phone: "555-0199".to_string(),
            contact_email: "wile@example.com".to_string(),
            customer_discount: dec!(0.05),
            arg_fee: dec!(0.02),
        };
        let mut merchant = MerchantAggregate::default();
        merchant.add(
            CustomerKey::new("Jane Doe", "1234"),
            TransactionRecord {
                trans_date: "01/02/2021".to_string(),
                trans_time: 1015,
                cleared_date: "01/03/2021".to_string(),
                amount: dec!(18.00),
            },
        );
        let mut range = DateRange::default();
        range.record(NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        let report = compose(&partner, &merchant, range);

        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&report, dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "Acme Corp_summary_20210131_20210131.xlsx"
        );

        let sheet = open_data_sheet(&path, 0).unwrap();
        assert_eq!(sheet.cell(0, 0), &Cell::Text(REPORT_TITLE.to_string()));
        assert_eq!(sheet.cell(2, 1), &Cell::Text("ACME".to_string()));
        assert_eq!(sheet.cell(9, 0), &Cell::Text("Jane Doe".to_string()));
        assert_eq!(sheet.cell(10, 3), &Cell::Number(1015.0));
        assert_eq!(sheet.cell(10, 5), &Cell::Number(18.0));
        assert_eq!(sheet.cell(12, 5), &Cell::Number(0.9));
        let last = sheet.height() - 1;
        assert_eq!(sheet.cell(last, 0), &Cell::Text("Total bill:".to_string()));
        assert_eq!(sheet.cell(last, 1).as_decimal(), Some(dec!(1.56)));
    }
}
