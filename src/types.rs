use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConvertResult;
use crate::parsers::prelude::Node;

/// One bank statement entry, already normalized for QIF output.
///
/// Every field starts unset when a transaction aggregate opens and is filled
/// in as its child elements arrive. Unset fields render as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// `dd/MM/yyyy`
    pub date: Option<String>,
    /// Comma as decimal separator, dot as thousands separator
    pub amount: Option<String>,
    /// `"PAYEE: MEMO TEXT"`
    pub memo: Option<String>,
}

/// What to do with a DTUSER value that is not a valid `yyyyMMdd` date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePolicy {
    /// Leave the date unset, log a warning and keep going
    #[default]
    Skip,
    /// Abort the conversion
    Strict,
}

/// Knobs for a conversion run.
///
/// Can be loaded from a JSON file; missing keys keep their defaults:
///
/// ```json
/// { "transaction_aggregate": "CCSTMTTRN", "date_policy": "strict" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Aggregate name that delimits one transaction, compared case-insensitively
    pub transaction_aggregate: String,
    pub date_policy: DatePolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            transaction_aggregate: "STMTTRN".to_string(),
            date_policy: DatePolicy::Skip,
        }
    }
}

impl ConvertOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> ConvertResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Everything one parse pass produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub headers: BTreeMap<String, String>,
    pub document: Node,
    pub transactions: Vec<Transaction>,
}

#[derive(Serialize)]
struct TreeDump<'a> {
    headers: &'a BTreeMap<String, String>,
    document: &'a Node,
}

impl Conversion {
    /// Pretty JSON of the headers and the generic document tree, for inspecting
    /// what was read from the OFX file.
    pub fn tree_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&TreeDump {
            headers: &self.headers,
            document: &self.document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConvertError;

    #[test]
    fn test_transaction_default_is_unset() {
        let transaction = Transaction::default();
        assert_eq!(transaction.transaction_type, None);
        assert_eq!(transaction.date, None);
        assert_eq!(transaction.amount, None);
        assert_eq!(transaction.memo, None);
    }

    #[test]
    fn test_transaction_serialization() {
        let transaction = Transaction {
            transaction_type: Some("DEBIT".to_string()),
            date: Some("15/01/2013".to_string()),
            amount: Some("1.024,00".to_string()),
            memo: Some("ACME CORP: INVOICE 42".to_string()),
        };

        let json = serde_json::to_string(&transaction).unwrap();
        assert!(json.contains("\"type\":\"DEBIT\""));
        assert!(json.contains("ACME CORP: INVOICE 42"));

        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, transaction);
    }

    #[test]
    fn test_options_default() {
        let options = ConvertOptions::default();
        assert_eq!(options.transaction_aggregate, "STMTTRN");
        assert_eq!(options.date_policy, DatePolicy::Skip);
    }

    #[test]
    fn test_options_partial_deserialization() {
        let options: ConvertOptions = serde_json::from_str(r#"{"date_policy":"strict"}"#).unwrap();
        assert_eq!(options.date_policy, DatePolicy::Strict);
        assert_eq!(options.transaction_aggregate, "STMTTRN");
    }

    #[test]
    fn test_options_from_json_file() {
        let path = std::env::temp_dir().join(format!("ofx2qif-{}-options.json", std::process::id()));
        fs::write(&path, r#"{"transaction_aggregate":"CCSTMTTRN","date_policy":"strict"}"#).unwrap();

        let options = ConvertOptions::from_json_file(&path);
        fs::remove_file(&path).unwrap();

        assert_eq!(
            options.unwrap(),
            ConvertOptions {
                transaction_aggregate: "CCSTMTTRN".to_string(),
                date_policy: DatePolicy::Strict,
            }
        );
    }

    #[test]
    fn test_options_from_bad_json_file() {
        let path = std::env::temp_dir().join(format!("ofx2qif-{}-bad-options.json", std::process::id()));
        fs::write(&path, r#"{"date_policy":"sometimes"}"#).unwrap();

        let err = ConvertOptions::from_json_file(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConvertError::InvalidOptions(_)));
    }

    #[test]
    fn test_options_from_missing_file() {
        let err = ConvertOptions::from_json_file("/nonexistent/ofx2qif-options.json").unwrap_err();
        assert!(matches!(err, ConvertError::ReadContentFailed(_)));
    }

    #[test]
    fn test_conversion_tree_json() {
        let mut document = BTreeMap::new();
        document.insert("CODE".to_string(), Node::Leaf("0".to_string()));
        let conversion = Conversion {
            headers: BTreeMap::from([("VERSION".to_string(), "102".to_string())]),
            document: Node::Aggregate(document),
            transactions: vec![Transaction::default()],
        };

        let json: serde_json::Value = serde_json::from_str(&conversion.tree_json().unwrap()).unwrap();
        assert_eq!(json["headers"]["VERSION"], "102");
        assert_eq!(json["document"]["CODE"], "0");
        assert!(json.get("transactions").is_none());
    }
}
