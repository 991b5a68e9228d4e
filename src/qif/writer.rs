use std::io::Write;

use log::debug;

use crate::errors::ConvertResult;
use crate::types::Transaction;

const ACCOUNT_HEADER: &[u8] = b"\n!Type:Bank\n\n";

/// Writes transactions as a QIF bank register.
///
/// Field text is written as is; unset fields leave their prefix letter alone
/// on the line.
pub struct QifWriter<W: Write> {
    sink: W,
}

impl<W: Write> QifWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Header block followed by every transaction, then a flush.
    pub fn write_statement(&mut self, transactions: &[Transaction]) -> ConvertResult<()> {
        self.sink.write_all(ACCOUNT_HEADER)?;
        for (i, transaction) in transactions.iter().enumerate() {
            debug!("Writing transaction {}: {:?}", i + 1, transaction);
            self.write_transaction(transaction)?;
        }
        self.sink.flush()?;
        Ok(())
    }

    fn write_transaction(&mut self, transaction: &Transaction) -> ConvertResult<()> {
        write!(
            self.sink,
            "D{}\nT{}\nM{}\n^\n\n",
            transaction.date.as_deref().unwrap_or_default(),
            transaction.amount.as_deref().unwrap_or_default(),
            transaction.memo.as_deref().unwrap_or_default(),
        )?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Renders a whole statement into a `String`.
pub fn to_qif_string(transactions: &[Transaction]) -> ConvertResult<String> {
    let mut writer = QifWriter::new(Vec::new());
    writer.write_statement(transactions)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn transaction(date: &str, amount: &str, memo: &str) -> Transaction {
        Transaction {
            transaction_type: Some("DEBIT".to_string()),
            date: Some(date.to_string()),
            amount: Some(amount.to_string()),
            memo: Some(memo.to_string()),
        }
    }

    #[test]
    fn test_empty_statement_is_header_only() {
        assert_eq!(to_qif_string(&[]).unwrap(), "\n!Type:Bank\n\n");
    }

    #[test]
    fn test_single_transaction() {
        let qif = to_qif_string(&[transaction("15/01/2013", "1.024,00", "ACME CORP: INVOICE 42")])
            .unwrap();
        assert_eq!(
            qif,
            "\n!Type:Bank\n\nD15/01/2013\nT1.024,00\nMACME CORP: INVOICE 42\n^\n\n"
        );
    }

    #[test]
    fn test_unset_fields_are_blank() {
        let qif = to_qif_string(&[Transaction::default()]).unwrap();
        assert_eq!(qif, "\n!Type:Bank\n\nD\nT\nM\n^\n\n");
    }

    #[test]
    fn test_keeps_list_order() {
        let qif = to_qif_string(&[
            transaction("01/01/2020", "1,00", "A: "),
            transaction("02/01/2020", "2,00", "B: "),
        ])
        .unwrap();

        let first = qif.find("D01/01/2020").unwrap();
        let second = qif.find("D02/01/2020").unwrap();
        assert!(first < second);
        assert_eq!(qif.matches("^\n").count(), 2);
    }

    #[test]
    fn test_type_is_not_written() {
        let qif = to_qif_string(&[transaction("15/01/2013", "5", "X")]).unwrap();
        assert!(!qif.contains("DEBIT"));
    }

    #[test]
    fn test_write_error_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let result = QifWriter::new(Broken).write_statement(&[]);
        assert!(matches!(result, Err(crate::errors::ConvertError::ReadContentFailed(_))));
    }
}
