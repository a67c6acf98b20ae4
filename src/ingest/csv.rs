//! Bank statement CSV reader
//!
//! Column headers differ between banks, so each logical column is located
//! through a list of aliases; the first alias present in the header wins.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::str::FromStr;

use crate::ingest::Statement;
use crate::types::*;

/// Header aliases for the booking date
pub const DATE_ALIASES: &[&str] = &["日期", "交易日期", "记账日期", "发生日期"];
/// Header aliases for the description
pub const SUMMARY_ALIASES: &[&str] = &["摘要", "附言", "用途", "说明"];
/// Header aliases for the debit amount column
pub const DEBIT_ALIASES: &[&str] = &["借方金额", "借方", "收入"];
/// Header aliases for the credit amount column
pub const CREDIT_ALIASES: &[&str] = &["贷方金额", "贷方", "支出"];

const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y%m%d %H:%M:%S",
];

/// Positions of the columns the reader needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    date: usize,
    summary: usize,
    debit: Option<usize>,
    credit: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> VoucherResult<Self> {
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| headers.iter().position(|header| header == *alias))
        };

        let date = find(DATE_ALIASES);
        let summary = find(SUMMARY_ALIASES);
        let debit = find(DEBIT_ALIASES);
        let credit = find(CREDIT_ALIASES);

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push("date (日期)");
        }
        if summary.is_none() {
            missing.push("summary (摘要)");
        }
        if debit.is_none() && credit.is_none() {
            missing.push("debit or credit amount (借方金额/贷方金额)");
        }

        match (date, summary) {
            (Some(date), Some(summary)) if missing.is_empty() => Ok(Self {
                date,
                summary,
                debit,
                credit,
            }),
            _ => Err(VoucherError::MissingColumns(missing.join(", "))),
        }
    }
}

/// Parse decoded CSV text into a statement.
///
/// With `filter_zero` set, rows whose amounts are both zero are dropped and
/// counted in [`Statement::skipped_rows`].
pub fn parse_statement(text: &str, filter_zero: bool) -> VoucherResult<Statement> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let columns = ColumnMap::resolve(reader.headers()?)?;
    let mut transactions = Vec::new();
    let mut skipped_rows = 0;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(row + 2);

        let field = |index: Option<usize>| index.and_then(|i| record.get(i)).unwrap_or("");

        let date = parse_date(field(Some(columns.date))).map_err(|message| VoucherError::Ingest {
            line,
            message,
        })?;
        let description = field(Some(columns.summary)).to_string();
        let debit_amount = parse_amount(field(columns.debit), line);
        let credit_amount = parse_amount(field(columns.credit), line);

        let transaction =
            Transaction::new(date, description, debit_amount, credit_amount).with_line(line);

        if filter_zero && transaction.is_zero() {
            skipped_rows += 1;
            continue;
        }
        transactions.push(transaction);
    }

    tracing::debug!(
        rows = transactions.len(),
        skipped_rows,
        "parsed statement rows"
    );

    Ok(Statement {
        transactions,
        skipped_rows,
        encoding: "UTF-8".to_string(),
    })
}

/// Parse a statement date in any of the accepted formats
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("date is empty".to_string());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|datetime| datetime.date())
        })
        .ok_or_else(|| format!("unrecognized date {:?}", raw))
}

/// Parse an amount cell; blank or non-numeric cells count as zero
pub fn parse_amount(raw: &str, line: usize) -> BigDecimal {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return BigDecimal::from(0);
    }

    match BigDecimal::from_str(&cleaned) {
        Ok(amount) => amount,
        Err(err) => {
            tracing::warn!(line, value = raw, error = %err, "non-numeric amount treated as zero");
            BigDecimal::from(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_standard_headers() {
        let text = "日期,摘要,借方金额,贷方金额\n\
                    2024-01-05,工资发放,,5000.004\n\
                    2024/01/06,利息收入,12.5,\n";

        let statement = parse_statement(text, true).unwrap();
        assert_eq!(statement.transactions.len(), 2);

        let salary = &statement.transactions[0];
        assert_eq!(salary.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(salary.description, "工资发放");
        assert_eq!(salary.debit_amount, dec("0"));
        assert_eq!(salary.credit_amount, dec("5000.004"));
        assert_eq!(salary.line, 2);

        assert_eq!(statement.transactions[1].debit_amount, dec("12.5"));
        assert_eq!(statement.transactions[1].line, 3);
    }

    #[test]
    fn test_header_aliases_and_whitespace() {
        let text = " 交易日期 , 用途 ,支出\n20240107,房租,\"3,000.00\"\n";

        let statement = parse_statement(text, true).unwrap();
        let rent = &statement.transactions[0];
        assert_eq!(rent.date, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(rent.description, "房租");
        assert_eq!(rent.debit_amount, dec("0"));
        assert_eq!(rent.credit_amount, dec("3000.00"));
    }

    #[test]
    fn test_first_alias_wins() {
        let text = "日期,交易日期,摘要,借方\n2024.02.01,2024.03.01,手续费,2\n";

        let statement = parse_statement(text, true).unwrap();
        assert_eq!(
            statement.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_zero_rows_filtered_and_counted() {
        let text = "日期,摘要,借方金额,贷方金额\n\
                    2024-01-01,a,0,0\n\
                    2024-01-02,b,,\n\
                    2024-01-03,c,1,0\n";

        let filtered = parse_statement(text, true).unwrap();
        assert_eq!(filtered.transactions.len(), 1);
        assert_eq!(filtered.skipped_rows, 2);

        let unfiltered = parse_statement(text, false).unwrap();
        assert_eq!(unfiltered.transactions.len(), 3);
        assert_eq!(unfiltered.skipped_rows, 0);
    }

    #[test]
    fn test_missing_columns() {
        let text = "日期,借方金额\n2024-01-01,1\n";
        match parse_statement(text, true) {
            Err(VoucherError::MissingColumns(missing)) => assert!(missing.contains("summary")),
            other => panic!("unexpected result: {other:?}"),
        }

        let no_amounts = "日期,摘要\n2024-01-01,x\n";
        assert!(matches!(
            parse_statement(no_amounts, true),
            Err(VoucherError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_bad_date_reports_line() {
        let text = "日期,摘要,借方金额\n2024-01-01,ok,1\nyesterday,bad,2\n";
        assert!(matches!(
            parse_statement(text, true),
            Err(VoucherError::Ingest { line: 3, .. })
        ));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        for raw in [
            "2024/03/09",
            "2024-03-09",
            "2024.03.09",
            "20240309",
            "2024-03-09 14:30:00",
            " 2024/03/09 ",
        ] {
            assert_eq!(parse_date(raw), Ok(expected), "format {raw:?}");
        }
        assert!(parse_date("").is_err());
        assert!(parse_date("03/09/2024").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56", 2), dec("1234.56"));
        assert_eq!(parse_amount("  ", 2), dec("0"));
        assert_eq!(parse_amount("n/a", 2), dec("0"));
        assert_eq!(parse_amount("-8.00", 2), dec("-8.00"));
    }
}
