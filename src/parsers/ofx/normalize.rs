//! Field normalization from raw OFX element text to the QIF conventions.

use chrono::NaiveDate;

use crate::errors::{ConvertError, ConvertResult};

/// Raw OFX date text such as `20130115` or `20130115120000[-5:EST]`.
#[derive(Debug, Clone)]
pub struct OfxDate(String);

impl From<&str> for OfxDate {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<OfxDate> for NaiveDate {
    type Error = ConvertError;

    /// Only the leading `yyyyMMdd` is read; a time or zone suffix is ignored.
    fn try_from(date: OfxDate) -> Result<Self, Self::Error> {
        let raw = date.0.trim();
        let invalid = || ConvertError::DateInvalidFormat(raw.to_string());

        let ymd = raw.get(..8).ok_or_else(invalid)?;
        if !ymd.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        NaiveDate::parse_from_str(ymd, "%Y%m%d").map_err(|_| invalid())
    }
}

/// `debit` -> `DEBIT`
pub fn normalize_type(raw: &str) -> String {
    raw.to_uppercase()
}

/// `20130115` -> `15/01/2013`
pub fn normalize_date(raw: &str) -> ConvertResult<String> {
    let date: NaiveDate = OfxDate::from(raw).try_into()?;
    Ok(date.format("%d/%m/%Y").to_string().to_uppercase())
}

/// Rewrites an amount so that its rightmost separator becomes the decimal
/// comma and every other separator a thousands dot: `1,024.00` and
/// `1.024,00` both give `1.024,00`. Amounts without separators pass through.
pub fn normalize_amount(raw: &str) -> String {
    let mut amount = raw.replace(',', ".").to_uppercase();
    if let Some(idx) = amount.rfind('.') {
        amount.replace_range(idx..idx + 1, ",");
    }
    amount
}

/// Payee name, which opens the memo: `Acme Corp. ` -> `ACME CORP: `.
///
/// The last character is assumed to be a trailing period and is dropped
/// whatever it is.
pub fn normalize_name(raw: &str) -> String {
    let collapsed = collapse(raw);
    let mut chars = collapsed.chars();
    chars.next_back();
    format!("{}: ", chars.as_str()).to_uppercase()
}

/// Memo text, appended after the payee: `invoice  42` -> `INVOICE 42`.
pub fn normalize_memo(raw: &str) -> String {
    collapse(raw).to_uppercase()
}

fn collapse(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(". ", ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("20130115", "15/01/2013")]
    #[case("20251231", "31/12/2025")]
    #[case("20240229", "29/02/2024")]
    #[case("20130115120000", "15/01/2013")]
    #[case("20130115120000.000[-5:EST]", "15/01/2013")]
    #[case(" 20130115 ", "15/01/2013")]
    fn test_normalize_date(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_date(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("abcdefgh")]
    #[case("")]
    #[case("2013011")]
    #[case("20131301")] // month 13
    #[case("20250229")] // not a leap year
    #[case("20130132")]
    #[case("+2013011")]
    #[case("2013-01-15")]
    fn test_normalize_date_invalid(#[case] raw: &str) {
        let err = normalize_date(raw).unwrap_err();
        assert!(matches!(err, ConvertError::DateInvalidFormat(_)));
    }

    #[rstest]
    #[case("20130115")]
    #[case("20130115120000[0:GMT]")]
    #[case(" 20130115 ")]
    fn test_ofx_date_into_naive_date(#[case] raw: &str) {
        let date: NaiveDate = OfxDate::from(raw).try_into().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2013, 1, 15).unwrap());
    }

    #[rstest]
    #[case("1,024.00", "1.024,00")]
    #[case("1.024,00", "1.024,00")]
    #[case("1024.00", "1024,00")]
    #[case("-50.25", "-50,25")]
    #[case("1,000,000.99", "1.000.000,99")]
    #[case("50", "50")]
    #[case("", "")]
    fn test_normalize_amount(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_amount(raw), expected);
    }

    #[rstest]
    #[case("DEBIT", "DEBIT")]
    #[case("credit", "CREDIT")]
    #[case("xfer", "XFER")]
    fn test_normalize_type(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_type(raw), expected);
    }

    #[rstest]
    #[case("Acme Corp. ", "ACME CORP: ")]
    #[case("Acme Corp.", "ACME CORP: ")]
    #[case("  Acme    Corp.  ", "ACME CORP: ")]
    #[case("Dr. Who Ltd.", "DR.WHO LTD: ")]
    #[case("Coffee Shop", "COFFEE SHO: ")]
    #[case("Café.", "CAFÉ: ")]
    #[case("", ": ")]
    fn test_normalize_name(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(raw), expected);
    }

    #[rstest]
    #[case("invoice 42", "INVOICE 42")]
    #[case("  invoice\t\t42 \n", "INVOICE 42")]
    #[case("ref. 7. paid", "REF.7.PAID")]
    #[case("", "")]
    fn test_normalize_memo(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_memo(raw), expected);
    }
}
