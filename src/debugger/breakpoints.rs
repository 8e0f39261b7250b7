use crate::ast::Expr;
use std::collections::BTreeMap;

/// Description shown by `list` for a breakpoint without a condition.
pub const UNCONDITIONAL: &str = "empty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub condition: Expr,
    pub description: String,
}

impl Breakpoint {
    /// A breakpoint whose condition always holds.
    pub fn unconditional() -> Self {
        Self {
            condition: Expr::Literal { value: 1, line: 0 },
            description: UNCONDITIONAL.to_string(),
        }
    }

    pub fn conditional(condition: Expr, description: impl Into<String>) -> Self {
        Self {
            condition,
            description: description.into(),
        }
    }
}

/// At most one breakpoint per source line, iterated in line order.
#[derive(Debug, Default)]
pub struct Breakpoints {
    entries: BTreeMap<usize, Breakpoint>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `breakpoint` on `line`. Returns true if it replaced another.
    pub fn insert(&mut self, line: usize, breakpoint: Breakpoint) -> bool {
        self.entries.insert(line, breakpoint).is_some()
    }

    /// Returns false if there was nothing on `line`.
    pub fn remove(&mut self, line: usize) -> bool {
        self.entries.remove(&line).is_some()
    }

    pub fn get(&self, line: usize) -> Option<&Breakpoint> {
        self.entries.get(&line)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Breakpoint)> {
        self.entries.iter().map(|(line, breakpoint)| (*line, breakpoint))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
