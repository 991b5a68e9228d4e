use std::collections::BTreeMap;

use log::{debug, info, warn};

use super::normalize::{
    normalize_amount, normalize_date, normalize_memo, normalize_name, normalize_type,
};
use super::tree::AggregateStack;
use crate::errors::ConvertResult;
use crate::parsers::traits::OfxHandler;
use crate::types::{Conversion, ConvertOptions, DatePolicy, Transaction};

/// Finished transactions in the order their aggregates closed.
#[derive(Debug, Default)]
pub struct TransactionAccumulator {
    transactions: Vec<Transaction>,
}

impl TransactionAccumulator {
    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_inner(self) -> Vec<Transaction> {
        self.transactions
    }
}

/// Follows the aggregate nesting of an OFX document and builds one
/// [`Transaction`] per transaction aggregate, while recording every value in
/// the generic document tree.
#[derive(Debug)]
pub struct AggregateTracker {
    options: ConvertOptions,
    headers: BTreeMap<String, String>,
    stack: AggregateStack,
    current: Option<Transaction>,
    accumulator: TransactionAccumulator,
}

impl Default for AggregateTracker {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl AggregateTracker {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            headers: BTreeMap::new(),
            stack: AggregateStack::new(),
            current: None,
            accumulator: TransactionAccumulator::default(),
        }
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.accumulator.as_slice()
    }

    /// Ends the pass. Fails if any aggregate is still open.
    pub fn finish(self) -> ConvertResult<Conversion> {
        let document = self.stack.into_root()?;
        info!("Collected {} transaction(s)", self.accumulator.len());

        Ok(Conversion {
            headers: self.headers,
            document,
            transactions: self.accumulator.into_inner(),
        })
    }

    fn is_transaction_aggregate(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.options.transaction_aggregate)
    }

    fn indent(&self) -> usize {
        self.stack.depth() * 2
    }
}

impl OfxHandler for AggregateTracker {
    fn on_header(&mut self, name: &str, value: &str) -> ConvertResult<()> {
        debug!("{name}:{value}");
        self.headers.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn on_element(&mut self, name: &str, value: &str) -> ConvertResult<()> {
        if let Some(transaction) = self.current.as_mut() {
            apply_field(transaction, self.options.date_policy, name, value)?;
        }

        debug!("{:indent$}{name}={value}", "", indent = self.indent());
        self.stack.insert_leaf(name, value);
        Ok(())
    }

    fn start_aggregate(&mut self, name: &str) -> ConvertResult<()> {
        debug!("{:indent$}{name} {{", "", indent = self.indent());
        if self.is_transaction_aggregate(name) {
            if self.current.is_some() {
                warn!("{name} opened inside another {name}; dropping the outer one");
            }
            self.current = Some(Transaction::default());
        }

        self.stack.push(name);
        Ok(())
    }

    fn end_aggregate(&mut self, name: &str) -> ConvertResult<()> {
        self.stack.pop(name)?;
        if self.is_transaction_aggregate(name) {
            if let Some(transaction) = self.current.take() {
                debug!("Finished transaction {:?}", transaction);
                self.accumulator.push(transaction);
            }
        }

        debug!("{:indent$}}}", "", indent = self.indent());
        Ok(())
    }

    fn is_aggregate(&self, name: &str) -> bool {
        self.is_transaction_aggregate(name)
    }
}

fn apply_field(
    transaction: &mut Transaction,
    date_policy: DatePolicy,
    name: &str,
    value: &str,
) -> ConvertResult<()> {
    match name.to_lowercase().as_str() {
        "trntype" => transaction.transaction_type = Some(normalize_type(value)),
        "dtuser" => match normalize_date(value) {
            Ok(date) => transaction.date = Some(date),
            Err(err) if date_policy == DatePolicy::Skip => {
                warn!("Leaving transaction date unset: {err}");
            }
            Err(err) => return Err(err),
        },
        "trnamt" => transaction.amount = Some(normalize_amount(value)),
        "name" => transaction.memo = Some(normalize_name(value)),
        "memo" => transaction
            .memo
            .get_or_insert_with(String::new)
            .push_str(&normalize_memo(value)),
        _ => {}
    }
    Ok(())
}
