//! Cross-schema resolution of user-defined column types.

use crate::model::{Column, ColumnKey, DbEnum, EnumKey, UdtReference};
use std::collections::HashMap;

/// Lookup tables for one table being resolved.
///
/// The maps are borrowed, so a single set of maps serves every table of a
/// catalog; only `table` and `schema` change between calls.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMappingContext<'a> {
    udt_columns: &'a HashMap<ColumnKey, UdtReference>,
    enums: &'a HashMap<EnumKey, DbEnum>,
    table: &'a str,
    schema: &'a str,
}

impl<'a> ColumnMappingContext<'a> {
    pub fn new(
        udt_columns: &'a HashMap<ColumnKey, UdtReference>,
        enums: &'a HashMap<EnumKey, DbEnum>,
        table: &'a str,
        schema: &'a str,
    ) -> Self {
        Self {
            udt_columns,
            enums,
            table,
            schema,
        }
    }

    pub fn table(&self) -> &str {
        self.table
    }

    pub fn schema(&self) -> &str {
        self.schema
    }

    pub fn udt_reference(&self, column: &str) -> Option<&'a UdtReference> {
        self.udt_columns.get(&ColumnKey::new(self.table, column))
    }

    /// Enum backing a column. The lookup goes through the schema that defines
    /// the type, which need not be the table's own schema.
    pub fn enum_for(&self, column: &str) -> Option<&'a DbEnum> {
        let udt = self.udt_reference(column)?;
        self.enums.get(&udt.enum_key())
    }
}

/// Resolves columns typed with a user-defined-type placeholder.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    placeholder: String,
}

impl TypeResolver {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Replace the placeholder with the enum's name. A miss keeps the column as it was.
    pub fn resolve(&self, column: Column, ctx: &ColumnMappingContext<'_>) -> Column {
        if column.data_type() != self.placeholder {
            return column;
        }
        match ctx.enum_for(column.name()) {
            Some(db_enum) => column.retyped(db_enum.display_name()),
            None => column,
        }
    }

    pub fn resolve_all(&self, columns: Vec<Column>, ctx: &ColumnMappingContext<'_>) -> Vec<Column> {
        columns
            .into_iter()
            .map(|c| self.resolve(c, ctx))
            .collect()
    }
}

/// Index enums by their schema-qualified key.
pub fn enum_index<'a>(enums: impl IntoIterator<Item = &'a DbEnum>) -> HashMap<EnumKey, DbEnum> {
    enums
        .into_iter()
        .map(|e| (e.key(), e.clone()))
        .collect()
}
