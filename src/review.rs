use crate::error::{parse_answer, ValidationError};
use crate::session::WrongAnswer;

/// Second look at the questions missed in a run. Nothing here is persisted
/// or counted toward the daily total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    items: Vec<WrongAnswer>,
    index: usize,
    last_check: Option<bool>,
}

impl Review {
    /// `None` when there is nothing to review
    pub fn new(items: Vec<WrongAnswer>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self {
            items,
            index: 0,
            last_check: None,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &WrongAnswer {
        &self.items[self.index]
    }

    /// Result of the latest check on the current item
    pub fn last_check(&self) -> Option<bool> {
        self.last_check
    }

    pub fn check(&mut self, raw: &str) -> Result<bool, ValidationError> {
        let value = parse_answer(raw)?;
        let ok = value == self.current().correct as f64;
        self.last_check = Some(ok);
        Ok(ok)
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.items.len()
    }

    /// Moves to the next item; returns false once the end has been reached.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        self.last_check = None;
        true
    }
}
