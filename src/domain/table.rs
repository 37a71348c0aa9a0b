use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Quote, TargetId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("target {0} already has a quote in this run")]
pub struct DuplicateQuote(pub TargetId);

/// Latest quote per target for one run, in insertion order.
///
/// A row, once inserted, is never replaced.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<Quote>,
    index: HashMap<TargetId, usize>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quote: Quote) -> Result<(), DuplicateQuote> {
        if self.index.contains_key(&quote.target) {
            return Err(DuplicateQuote(quote.target));
        }
        self.index.insert(quote.target.clone(), self.rows.len());
        self.rows.push(quote);
        Ok(())
    }

    pub fn get(&self, id: &TargetId) -> Option<&Quote> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    /// Lookup for a cell of a name × variant matrix.
    pub fn get_variant(&self, name: &str, variant: &str) -> Option<&Quote> {
        self.get(&TargetId::for_variant(name, variant))
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        self.rows.iter()
    }

    pub fn available_count(&self) -> usize {
        self.rows.iter().filter(|q| q.is_available()).count()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a Quote;
    type IntoIter = std::slice::Iter<'a, Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
