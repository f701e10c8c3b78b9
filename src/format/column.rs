//! Entity-line formatters: one line per column inside an entity block.

use super::{Formatter, FormatterChain};
use crate::model::{Column, Constraint, PrimaryKey, Table};
use std::cmp::Reverse;

/// A column together with the key of the relation that owns it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnContext<'a> {
    pub column: &'a Column,
    pub primary_key: Option<&'a PrimaryKey>,
}

impl<'a> ColumnContext<'a> {
    pub fn for_table(table: &'a Table, column: &'a Column) -> Self {
        Self {
            column,
            primary_key: table.primary_key(),
        }
    }

    /// Context for relations without keys (views).
    pub fn keyless(column: &'a Column) -> Self {
        Self {
            column,
            primary_key: None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
            .is_some_and(|pk| pk.contains(self.column.name()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormatter {
    /// `name: type` or `name: type(length)`.
    Base,
    /// `**…**` around primary-key columns.
    PrimaryKeyEmphasis,
    /// ` <<LABEL,…>>` listing the column's constraints.
    ConstraintAnnotation,
}

impl ColumnFormatter {
    pub fn standard_chain() -> FormatterChain<ColumnFormatter> {
        FormatterChain::new(vec![
            Self::Base,
            Self::PrimaryKeyEmphasis,
            Self::ConstraintAnnotation,
        ])
    }
}

impl Formatter<ColumnContext<'_>> for ColumnFormatter {
    fn format(&self, ctx: &ColumnContext<'_>, text: Option<String>) -> Option<String> {
        match self {
            Self::Base => Some(text.unwrap_or_else(|| base_text(ctx.column))),
            Self::PrimaryKeyEmphasis => text.map(|t| {
                if ctx.is_primary_key() {
                    format!("**{}**", t)
                } else {
                    t
                }
            }),
            Self::ConstraintAnnotation => text.map(|t| {
                let labels = constraint_labels(ctx.column);
                if labels.is_empty() {
                    t
                } else {
                    format!("{} <<{}>>", t, labels.join(","))
                }
            }),
        }
    }
}

fn base_text(column: &Column) -> String {
    match column.bounded_length() {
        Some(len) => format!("{}: {}({})", column.name(), column.data_type(), len),
        None => format!("{}: {}", column.name(), column.data_type()),
    }
}

/// Labels by display priority, highest first. The set iterates in declaration
/// order and the sort is stable, so equal priorities keep that order.
pub fn constraint_labels(column: &Column) -> Vec<String> {
    let mut constraints: Vec<Constraint> = column.constraints().iter().copied().collect();
    constraints.sort_by_key(|c| Reverse(c.display_priority()));

    constraints
        .into_iter()
        .map(|c| match (c, column.composite_unique()) {
            (Constraint::Unique, Some(group)) => format!("{}:{}", c.label(), group),
            _ => c.label().to_string(),
        })
        .collect()
}
