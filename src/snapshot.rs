//! Catalog snapshots: raw catalog rows as JSON, and their conversion into
//! validated [`Schema`] aggregates.
//!
//! This is where the database kind is decided and where UDT resolution and
//! the enrichers run, so everything handed to the renderer is complete.

use crate::dialect::DatabaseKind;
use crate::enrich::{assemble_materialized_view, assemble_table, assemble_view, Partitioning};
use crate::model::{
    Column, ColumnKey, Constraint, DbCompositeType, DbEnum, EnumKey, ForeignKey, ModelError,
    PrimaryKey, ReferentialAction, Schema, UdtReference,
};
use crate::resolve::{enum_index, ColumnMappingContext, TypeResolver};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown database kind: {0}")]
    UnknownDatabase(String),
    #[error("Unknown constraint {label:?} on column {column}")]
    UnknownConstraint { column: String, label: String },
    #[error("Unknown referential action {action:?} on foreign key {foreign_key}")]
    UnknownAction { foreign_key: String, action: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schemas: Vec<SchemaRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRow {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableRow>,
    #[serde(default)]
    pub views: Vec<RelationRow>,
    #[serde(default)]
    pub materialized_views: Vec<RelationRow>,
    #[serde(default)]
    pub enums: Vec<EnumRow>,
    #[serde(default)]
    pub composite_types: Vec<CompositeRow>,
    /// Columns of this schema's tables that are declared with a user-defined type.
    #[serde(default)]
    pub udt_columns: Vec<UdtColumnRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnRow>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKeyRow>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRow>,
    #[serde(default)]
    pub partition_strategy: Option<String>,
    #[serde(default)]
    pub partitions: Vec<String>,
}

/// A view or materialized view.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationRow {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRow {
    pub name: String,
    #[serde(default)]
    pub ordinal_position: i32,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    pub data_type: String,
    #[serde(default)]
    pub max_length: Option<i64>,
    #[serde(default)]
    pub composite_unique: Option<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryKeyRow {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForeignKeyRow {
    pub name: String,
    /// Defaults to the table the row is listed under.
    #[serde(default)]
    pub source_table: Option<String>,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(default)]
    pub target_schema: Option<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumRow {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompositeRow {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldRow {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UdtColumnRow {
    pub table: String,
    pub column: String,
    pub udt_schema: String,
    pub udt_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Overrides the kind recorded in the snapshot.
    pub database: Option<DatabaseKind>,
    /// Replace verbose catalog type names with their short spelling.
    pub short_types: bool,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn database_kind(&self, options: &LoadOptions) -> Result<DatabaseKind, SnapshotError> {
        if let Some(kind) = options.database {
            return Ok(kind);
        }
        match self.database.as_deref() {
            None => Ok(DatabaseKind::default()),
            Some(name) => DatabaseKind::from_str(name)
                .ok_or_else(|| SnapshotError::UnknownDatabase(name.to_string())),
        }
    }

    /// Resolve, enrich and assemble every schema in declaration order.
    pub fn into_schemas(self, options: &LoadOptions) -> Result<Vec<Schema>, SnapshotError> {
        let kind = self.database_kind(options)?;
        let loader = Loader {
            kind,
            short_types: options.short_types,
            resolver: TypeResolver::new(kind.udt_placeholder()),
        };

        // Enums are indexed across all schemas: a table may use one defined elsewhere.
        let enums_by_schema = self
            .schemas
            .iter()
            .map(|s| loader.enums(s))
            .collect::<Result<Vec<_>, _>>()?;
        let enums = enum_index(enums_by_schema.iter().flatten());

        let schemas = self
            .schemas
            .into_iter()
            .zip(enums_by_schema)
            .map(|(row, schema_enums)| loader.schema(row, schema_enums, &enums))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            database = ?kind,
            schemas = schemas.len(),
            tables = schemas.iter().map(|s| s.tables().len()).sum::<usize>(),
            "catalog snapshot loaded"
        );
        Ok(schemas)
    }
}

struct Loader {
    kind: DatabaseKind,
    short_types: bool,
    resolver: TypeResolver,
}

impl Loader {
    fn enums(&self, schema: &SchemaRow) -> Result<Vec<DbEnum>, SnapshotError> {
        schema
            .enums
            .iter()
            .map(|e| -> Result<DbEnum, SnapshotError> {
                Ok(DbEnum::new(&schema.name, &e.name, e.values.clone())?
                    .with_columns(e.columns.iter().cloned()))
            })
            .collect()
    }

    fn schema(
        &self,
        row: SchemaRow,
        schema_enums: Vec<DbEnum>,
        enums: &HashMap<EnumKey, DbEnum>,
    ) -> Result<Schema, SnapshotError> {
        let udt_columns: HashMap<ColumnKey, UdtReference> = row
            .udt_columns
            .iter()
            .map(|u| {
                (
                    ColumnKey::new(&u.table, &u.column),
                    UdtReference::new(&u.udt_schema, &u.udt_name),
                )
            })
            .collect();
        let schema_name = row.name.as_str();

        let mut tables = Vec::with_capacity(row.tables.len());
        for table in &row.tables {
            let ctx = ColumnMappingContext::new(&udt_columns, enums, &table.name, schema_name);
            let columns = self.columns(&table.columns, &ctx)?;
            let primary_key = table
                .primary_key
                .as_ref()
                .map(|pk| PrimaryKey::new(&pk.name, pk.columns.clone()))
                .transpose()?;
            let foreign_keys = table
                .foreign_keys
                .iter()
                .map(|fk| foreign_key(&table.name, fk))
                .collect::<Result<Vec<_>, _>>()?;
            let partitioning = Partitioning {
                strategy: table.partition_strategy.clone(),
                children: table.partitions.clone(),
            };
            tables.push(assemble_table(
                &table.name,
                columns,
                primary_key,
                foreign_keys,
                partitioning,
            )?);
        }

        let mut views = Vec::with_capacity(row.views.len());
        for view in &row.views {
            let ctx = ColumnMappingContext::new(&udt_columns, enums, &view.name, schema_name);
            views.push(assemble_view(&view.name, self.columns(&view.columns, &ctx)?)?);
        }

        let mut materialized_views = Vec::with_capacity(row.materialized_views.len());
        for view in &row.materialized_views {
            let ctx = ColumnMappingContext::new(&udt_columns, enums, &view.name, schema_name);
            materialized_views.push(assemble_materialized_view(
                &view.name,
                self.columns(&view.columns, &ctx)?,
            )?);
        }

        let composite_types = row
            .composite_types
            .iter()
            .map(|c| {
                let fields = c
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), self.type_name(&f.data_type)))
                    .collect();
                DbCompositeType::new(&c.name, fields)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Schema::new(schema_name)?
            .with_tables(tables)
            .with_views(views)
            .with_materialized_views(materialized_views)
            .with_enums(schema_enums)
            .with_composite_types(composite_types))
    }

    fn columns(
        &self,
        rows: &[ColumnRow],
        ctx: &ColumnMappingContext<'_>,
    ) -> Result<Vec<Column>, SnapshotError> {
        let columns = rows
            .iter()
            .map(|row| self.column(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.resolver.resolve_all(columns, ctx))
    }

    fn column(&self, row: &ColumnRow) -> Result<Column, SnapshotError> {
        let constraints = row
            .constraints
            .iter()
            .map(|label| {
                Constraint::from_label(label).ok_or_else(|| SnapshotError::UnknownConstraint {
                    column: row.name.clone(),
                    label: label.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Column::new(
            &row.name,
            row.ordinal_position,
            row.nullable,
            self.type_name(&row.data_type),
        )?
        .with_max_length(row.max_length)
        .with_composite_unique(row.composite_unique.clone())
        .with_constraints(constraints))
    }

    fn type_name(&self, data_type: &str) -> String {
        if self.short_types {
            self.kind.short_type_name(data_type)
        } else {
            data_type.to_string()
        }
    }
}

fn foreign_key(table: &str, row: &ForeignKeyRow) -> Result<ForeignKey, SnapshotError> {
    let action = |value: &Option<String>| -> Result<ReferentialAction, SnapshotError> {
        match value.as_deref() {
            None => Ok(ReferentialAction::NoAction),
            Some(s) => ReferentialAction::from_str(s).ok_or_else(|| SnapshotError::UnknownAction {
                foreign_key: row.name.clone(),
                action: s.to_string(),
            }),
        }
    };

    Ok(ForeignKey::new(
        &row.name,
        row.source_table.as_deref().unwrap_or(table),
        &row.source_column,
        &row.target_table,
        &row.target_column,
    )?
    .with_target_schema(row.target_schema.clone())
    .with_actions(action(&row.on_delete)?, action(&row.on_update)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "database": "postgresql",
        "schemas": [
            {
                "name": "types",
                "enums": [{ "name": "order_status", "values": ["open", "shipped"] }]
            },
            {
                "name": "sales",
                "tables": [{
                    "name": "orders",
                    "columns": [
                        { "name": "status", "ordinal_position": 3, "nullable": false, "data_type": "USER-DEFINED" },
                        { "name": "user_id", "ordinal_position": 2, "data_type": "uuid" },
                        { "name": "id", "ordinal_position": 1, "nullable": false, "data_type": "uuid" },
                        { "name": "note", "ordinal_position": 4, "data_type": "character varying", "max_length": 80 }
                    ],
                    "primary_key": { "name": "orders_pkey", "columns": ["id"] },
                    "foreign_keys": [{
                        "name": "orders_user_id_fkey",
                        "source_column": "user_id",
                        "target_table": "users",
                        "target_column": "id",
                        "target_schema": "sales",
                        "on_delete": "CASCADE"
                    }]
                }],
                "udt_columns": [
                    { "table": "orders", "column": "status", "udt_schema": "types", "udt_name": "order_status" }
                ]
            }
        ]
    }"#;

    fn load(json: &str, options: &LoadOptions) -> Result<Vec<Schema>, SnapshotError> {
        CatalogSnapshot::from_json(json)?.into_schemas(options)
    }

    #[test]
    fn test_load_resolves_and_enriches() {
        let schemas = load(SNAPSHOT, &LoadOptions::default()).unwrap();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].enums()[0].schema(), "types");

        let orders = &schemas[1].tables()[0];
        let names: Vec<&str> = orders.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["id", "user_id", "status", "note"]);
        assert_eq!(orders.columns()[2].data_type(), "order_status");
        assert_eq!(orders.columns()[3].data_type(), "character varying");
        assert!(orders.columns()[1].has_constraint(Constraint::ForeignKey));

        let fk = &orders.foreign_keys()[0];
        assert_eq!(fk.source_table(), "orders");
        assert!(fk.is_nullable());
        assert_eq!(fk.on_delete(), ReferentialAction::Cascade);
        assert_eq!(fk.on_update(), ReferentialAction::NoAction);
    }

    #[test]
    fn test_short_types() {
        let options = LoadOptions {
            short_types: true,
            ..LoadOptions::default()
        };
        let schemas = load(SNAPSHOT, &options).unwrap();
        assert_eq!(schemas[1].tables()[0].columns()[3].data_type(), "varchar");
    }

    #[test]
    fn test_database_override_changes_placeholder() {
        let options = LoadOptions {
            database: Some(DatabaseKind::MySQL),
            ..LoadOptions::default()
        };
        let schemas = load(SNAPSHOT, &options).unwrap();
        assert_eq!(schemas[1].tables()[0].columns()[2].data_type(), "USER-DEFINED");
    }

    #[test]
    fn test_unknown_database() {
        let err = load(r#"{ "database": "oracle", "schemas": [] }"#, &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownDatabase(ref name) if name == "oracle"));
    }

    #[test]
    fn test_unknown_constraint() {
        let json = r#"{ "schemas": [{ "name": "public", "tables": [{ "name": "t", "columns": [
            { "name": "c", "data_type": "int4", "constraints": ["SPARKLY"] }
        ] }] }] }"#;
        let err = load(json, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown constraint \"SPARKLY\" on column c");
    }

    #[test]
    fn test_unknown_action() {
        let json = r#"{ "schemas": [{ "name": "public", "tables": [{ "name": "t",
            "foreign_keys": [{ "name": "fk", "source_column": "a", "target_table": "u",
                               "target_column": "id", "on_update": "EXPLODE" }] }] }] }"#;
        let err = load(json, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownAction { .. }));
    }

    #[test]
    fn test_blank_schema_name_fails() {
        let err = load(r#"{ "schemas": [{ "name": "" }] }"#, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "schema.name must not be blank");
    }

    #[test]
    fn test_invalid_json() {
        let err = load("{", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
