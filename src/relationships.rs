//! Deterministic ordering of relationship lines.
//!
//! Foreign keys are grouped by the table they point at. Groups come out in
//! lexical order of that table name, keys within a group in declaration order
//! (table order first, then key order inside each table). The result does not
//! depend on the order in which the catalog returned its rows.

use crate::format::{FormatterChain, RelationshipContext, RelationshipFormatter};
use crate::model::{ForeignKey, Schema};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipGroup<'a> {
    pub target_table: &'a str,
    pub lines: Vec<String>,
}

pub fn group_by_target(schema: &Schema) -> BTreeMap<&str, Vec<&ForeignKey>> {
    let mut groups: BTreeMap<&str, Vec<&ForeignKey>> = BTreeMap::new();
    for fk in schema.tables().iter().flat_map(|t| t.foreign_keys()) {
        groups.entry(fk.target_table()).or_default().push(fk);
    }
    groups
}

pub fn resolve<'a>(
    schema: &'a Schema,
    chain: &FormatterChain<RelationshipFormatter>,
) -> Vec<RelationshipGroup<'a>> {
    group_by_target(schema)
        .into_iter()
        .map(|(target_table, fks)| RelationshipGroup {
            target_table,
            lines: fks
                .into_iter()
                .filter_map(|fk| chain.apply(&RelationshipContext::new(fk, schema.name()), None))
                .collect(),
        })
        .filter(|group| !group.lines.is_empty())
        .collect()
}

/// Write every group followed by a blank line.
pub fn write_relationships(
    output: &mut String,
    schema: &Schema,
    chain: &FormatterChain<RelationshipFormatter>,
) {
    for group in resolve(schema, chain) {
        for line in &group.lines {
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');
    }
}
