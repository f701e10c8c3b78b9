//! Enrichers deriving facts from raw catalog rows.
//!
//! All functions take ownership of their inputs and return new values.

use crate::model::{
    Column, Constraint, ForeignKey, MaterializedView, ModelError, PrimaryKey, Table, View,
};

/// Copy each source column's nullability onto its foreign key.
///
/// The column match is exact and case-sensitive. Keys without a matching
/// column come back unchanged.
pub fn enrich_foreign_key_nullability(
    foreign_keys: Vec<ForeignKey>,
    columns: &[Column],
) -> Vec<ForeignKey> {
    foreign_keys
        .into_iter()
        .map(|fk| {
            match columns.iter().find(|c| c.name() == fk.source_column()) {
                Some(column) => {
                    let nullable = column.is_nullable();
                    fk.with_nullable(nullable)
                }
                None => fk,
            }
        })
        .collect()
}

/// Tag every column referenced by a foreign key with `FK`.
///
/// Unlike nullability enrichment, this match ignores ASCII case.
pub fn tag_foreign_key_columns(columns: Vec<Column>, foreign_keys: &[ForeignKey]) -> Vec<Column> {
    columns
        .into_iter()
        .map(|column| {
            let referenced = foreign_keys
                .iter()
                .any(|fk| fk.source_column().eq_ignore_ascii_case(column.name()));
            if referenced {
                column.with_constraint(Constraint::ForeignKey)
            } else {
                column
            }
        })
        .collect()
}

/// Partition metadata for a table, passed through assembly untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitioning {
    pub strategy: Option<String>,
    pub children: Vec<String>,
}

/// Build a complete table out of separately fetched parts.
pub fn assemble_table(
    name: impl Into<String>,
    columns: Vec<Column>,
    primary_key: Option<PrimaryKey>,
    foreign_keys: Vec<ForeignKey>,
    partitioning: Partitioning,
) -> Result<Table, ModelError> {
    let columns = by_ordinal(columns);
    let foreign_keys = enrich_foreign_key_nullability(foreign_keys, &columns);
    let columns = tag_foreign_key_columns(columns, &foreign_keys);

    Table::new(name, columns)?
        .with_primary_key(primary_key)
        .with_foreign_keys(foreign_keys)
        .with_partitioning(partitioning.strategy, partitioning.children)
}

pub fn assemble_view(name: impl Into<String>, columns: Vec<Column>) -> Result<View, ModelError> {
    View::new(name, by_ordinal(columns))
}

pub fn assemble_materialized_view(
    name: impl Into<String>,
    columns: Vec<Column>,
) -> Result<MaterializedView, ModelError> {
    MaterializedView::new(name, by_ordinal(columns))
}

// Stable, so rows sharing a position keep their fetch order.
fn by_ordinal(mut columns: Vec<Column>) -> Vec<Column> {
    columns.sort_by_key(|c| c.ordinal_position());
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk(source_column: &str) -> ForeignKey {
        ForeignKey::new("orders_user_fk", "orders", source_column, "users", "id").unwrap()
    }

    #[test]
    fn test_nullability_copied_from_column() {
        let columns = vec![Column::new("user_id", 2, true, "uuid").unwrap()];
        let enriched = enrich_foreign_key_nullability(vec![fk("user_id")], &columns);
        assert!(enriched[0].is_nullable());
    }

    #[test]
    fn test_nullability_match_is_case_sensitive() {
        let columns = vec![Column::new("User_Id", 2, true, "uuid").unwrap()];
        let original = fk("user_id");
        let enriched = enrich_foreign_key_nullability(vec![original.clone()], &columns);
        assert_eq!(enriched[0], original);
        assert!(!enriched[0].is_nullable());
    }

    #[test]
    fn test_fk_tagging_ignores_case() {
        let columns = vec![
            Column::new("User_Id", 2, true, "uuid").unwrap(),
            Column::new("total", 3, false, "numeric").unwrap(),
        ];
        let tagged = tag_foreign_key_columns(columns, &[fk("user_id")]);
        assert!(tagged[0].has_constraint(Constraint::ForeignKey));
        assert!(!tagged[1].has_constraint(Constraint::ForeignKey));
    }

    #[test]
    fn test_fk_tagging_keeps_existing_constraints() {
        let columns = vec![Column::new("user_id", 2, false, "uuid")
            .unwrap()
            .with_constraint(Constraint::Unique)];
        let tagged = tag_foreign_key_columns(columns, &[fk("user_id")]);
        assert!(tagged[0].has_constraint(Constraint::Unique));
        assert!(tagged[0].has_constraint(Constraint::ForeignKey));
    }

    #[test]
    fn test_assemble_table() {
        let columns = vec![
            Column::new("user_id", 2, true, "uuid").unwrap(),
            Column::new("id", 1, false, "uuid").unwrap(),
        ];
        let pk = PrimaryKey::new("orders_pkey", vec!["id".into()]).unwrap();
        let partitioning = Partitioning {
            strategy: Some("RANGE".into()),
            children: vec!["orders_2024".into()],
        };

        let table =
            assemble_table("orders", columns, Some(pk), vec![fk("user_id")], partitioning).unwrap();

        let names: Vec<&str> = table.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["id", "user_id"]);
        assert!(table.foreign_keys()[0].is_nullable());
        assert!(table.columns()[1].has_constraint(Constraint::ForeignKey));
        assert!(table.is_primary_key_column("id"));
        assert_eq!(table.partition_strategy(), Some("RANGE"));
        assert_eq!(table.partitions().to_vec(), vec!["orders_2024".to_string()]);
    }

    #[test]
    fn test_assemble_table_rejects_blank_name() {
        let err = assemble_table(" ", vec![], None, vec![], Partitioning::default()).unwrap_err();
        assert_eq!(err, ModelError::Blank { field: "table.name" });
    }

    #[test]
    fn test_assemble_view_orders_columns() {
        let view = assemble_view(
            "active_users",
            vec![
                Column::new("email", 2, true, "varchar").unwrap(),
                Column::new("id", 1, true, "uuid").unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(view.columns()[0].name(), "id");
    }
}
