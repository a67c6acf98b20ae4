//! Bank statement ingestion

pub mod csv;
pub mod encoding;

pub use self::csv::{parse_amount, parse_date, parse_statement};
pub use self::encoding::decode_statement;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::*;

/// Rows read from one bank export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Rows in file order
    pub transactions: Vec<Transaction>,
    /// Rows dropped because both amounts were zero
    pub skipped_rows: usize,
    /// Encoding the file was decoded with
    pub encoding: String,
}

impl Statement {
    /// Wrap rows that were built in memory
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            skipped_rows: 0,
            encoding: "UTF-8".to_string(),
        }
    }
}

/// Decode and parse raw statement bytes
pub fn read_statement_bytes(bytes: &[u8], filter_zero: bool) -> VoucherResult<Statement> {
    let (text, encoding) = decode_statement(bytes)?;
    let mut statement = parse_statement(&text, filter_zero)?;
    statement.encoding = encoding.to_string();
    Ok(statement)
}

/// Read a bank statement CSV from disk
pub fn read_statement(path: impl AsRef<Path>, filter_zero: bool) -> VoucherResult<Statement> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let statement = read_statement_bytes(&bytes, filter_zero)?;

    tracing::info!(
        path = %path.display(),
        encoding = %statement.encoding,
        rows = statement.transactions.len(),
        skipped_rows = statement.skipped_rows,
        "read bank statement"
    );
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;

    #[test]
    fn test_read_gbk_statement_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");
        let (bytes, _, _) = GBK.encode("记账日期,附言,收入,支出\n2024-01-05,工资发放,,5000\n");
        fs::write(&path, &bytes).unwrap();

        let statement = read_statement(&path, true).unwrap();
        assert_eq!(statement.encoding, "GBK");
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].description, "工资发放");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_statement(dir.path().join("absent.csv"), true),
            Err(VoucherError::Io(_))
        ));
    }
}
