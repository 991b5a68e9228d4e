use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{ConvertError, ConvertResult};

/// Generic OFX document tree. Keys are sorted; a repeated name at the same
/// level keeps only the last value seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(String),
    Aggregate(BTreeMap<String, Node>),
}

impl Node {
    pub fn get(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Aggregate(children) => children.get(name),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value),
            Node::Aggregate(_) => None,
        }
    }
}

/// Stack of currently open aggregates on top of a root mapping that stays
/// for the whole pass.
///
/// An aggregate's mapping is owned by its frame while open and moved into the
/// parent when it closes, which leaves the same tree as attaching it up front.
#[derive(Debug, Default)]
pub struct AggregateStack {
    root: BTreeMap<String, Node>,
    open: Vec<(String, BTreeMap<String, Node>)>,
}

impl AggregateStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mappings on the stack, root included. Never below 1.
    pub fn depth(&self) -> usize {
        self.open.len() + 1
    }

    pub fn push(&mut self, name: &str) {
        self.open.push((name.to_string(), BTreeMap::new()));
    }

    pub fn pop(&mut self, name: &str) -> ConvertResult<()> {
        let (open_name, children) =
            self.open
                .pop()
                .ok_or_else(|| ConvertError::UnbalancedAggregate {
                    name: name.to_string(),
                })?;
        self.top_mut().insert(open_name, Node::Aggregate(children));
        Ok(())
    }

    pub fn insert_leaf(&mut self, name: &str, value: &str) {
        self.top_mut()
            .insert(name.to_string(), Node::Leaf(value.to_string()));
    }

    pub fn top(&self) -> &BTreeMap<String, Node> {
        self.open
            .last()
            .map(|(_, children)| children)
            .unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut BTreeMap<String, Node> {
        match self.open.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        }
    }

    /// Hands back the finished tree; every aggregate must have been closed.
    pub fn into_root(self) -> ConvertResult<Node> {
        if !self.open.is_empty() {
            return Err(ConvertError::UnclosedAggregates {
                open: self.open.len(),
            });
        }
        Ok(Node::Aggregate(self.root))
    }
}
