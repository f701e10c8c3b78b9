//! Catalog model: immutable value types describing schema objects.
//!
//! Every type is built through a validating constructor and never mutated
//! afterwards. The `with_*` methods consume the value and hand back a new one,
//! which is how the enrichers derive facts without editing anything in place.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must list at least one column")]
    EmptyKey { field: &'static str },
}

fn required(field: &'static str, value: impl Into<String>) -> Result<String, ModelError> {
    let value = value.into();
    if value.trim().is_empty() {
        Err(ModelError::Blank { field })
    } else {
        Ok(value)
    }
}

fn required_all(field: &'static str, values: Vec<String>) -> Result<Vec<String>, ModelError> {
    values.into_iter().map(|v| required(field, v)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    tables: Vec<Table>,
    views: Vec<View>,
    materialized_views: Vec<MaterializedView>,
    enums: Vec<DbEnum>,
    composite_types: Vec<DbCompositeType>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        Ok(Self {
            name: required("schema.name", name)?,
            tables: Vec::new(),
            views: Vec::new(),
            materialized_views: Vec::new(),
            enums: Vec::new(),
            composite_types: Vec::new(),
        })
    }

    pub fn with_tables(self, tables: Vec<Table>) -> Self {
        Self { tables, ..self }
    }

    pub fn with_views(self, views: Vec<View>) -> Self {
        Self { views, ..self }
    }

    pub fn with_materialized_views(self, materialized_views: Vec<MaterializedView>) -> Self {
        Self {
            materialized_views,
            ..self
        }
    }

    pub fn with_enums(self, enums: Vec<DbEnum>) -> Self {
        Self { enums, ..self }
    }

    pub fn with_composite_types(self, composite_types: Vec<DbCompositeType>) -> Self {
        Self {
            composite_types,
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn materialized_views(&self) -> &[MaterializedView] {
        &self.materialized_views
    }

    pub fn enums(&self) -> &[DbEnum] {
        &self.enums
    }

    pub fn composite_types(&self) -> &[DbCompositeType] {
        &self.composite_types
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<PrimaryKey>,
    foreign_keys: Vec<ForeignKey>,
    partition_strategy: Option<String>,
    partitions: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, ModelError> {
        Ok(Self {
            name: required("table.name", name)?,
            columns,
            primary_key: None,
            foreign_keys: Vec::new(),
            partition_strategy: None,
            partitions: Vec::new(),
        })
    }

    pub fn with_primary_key(self, primary_key: Option<PrimaryKey>) -> Self {
        Self {
            primary_key,
            ..self
        }
    }

    pub fn with_foreign_keys(self, foreign_keys: Vec<ForeignKey>) -> Self {
        Self {
            foreign_keys,
            ..self
        }
    }

    /// Partition metadata is carried as-is; `partitions` names the child tables.
    pub fn with_partitioning(
        self,
        strategy: Option<String>,
        partitions: Vec<String>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            partition_strategy: strategy.filter(|s| !s.trim().is_empty()),
            partitions: required_all("table.partitions", partitions)?,
            ..self
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn partition_strategy(&self) -> Option<&str> {
        self.partition_strategy.as_deref()
    }

    pub fn partitions(&self) -> &[String] {
        &self.partitions
    }

    pub fn is_primary_key_column(&self, column: &str) -> bool {
        self.primary_key
            .as_ref()
            .is_some_and(|pk| pk.contains(column))
    }
}

/// A view exposes columns only; it can never own keys.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    columns: Vec<Column>,
}

impl View {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, ModelError> {
        Ok(Self {
            name: required("view.name", name)?,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedView {
    name: String,
    columns: Vec<Column>,
}

impl MaterializedView {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, ModelError> {
        Ok(Self {
            name: required("materialized_view.name", name)?,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ordinal_position: i32,
    nullable: bool,
    data_type: String,
    max_length: Option<i64>,
    composite_unique: Option<String>,
    constraints: BTreeSet<Constraint>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        ordinal_position: i32,
        nullable: bool,
        data_type: impl Into<String>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            name: required("column.name", name)?,
            ordinal_position,
            nullable,
            data_type: required("column.data_type", data_type)?,
            max_length: None,
            composite_unique: None,
            constraints: BTreeSet::new(),
        })
    }

    pub fn with_max_length(self, max_length: Option<i64>) -> Self {
        Self { max_length, ..self }
    }

    /// Name of the multi-column unique constraint this column takes part in.
    pub fn with_composite_unique(self, constraint: Option<String>) -> Self {
        Self {
            composite_unique: constraint.filter(|c| !c.trim().is_empty()),
            ..self
        }
    }

    pub fn with_constraints(self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self {
            constraints: constraints.into_iter().collect(),
            ..self
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.insert(constraint);
        self
    }

    /// Swap the data type for one that is already known to be valid.
    pub(crate) fn retyped(self, data_type: &str) -> Self {
        Self {
            data_type: data_type.to_string(),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal_position(&self) -> i32 {
        self.ordinal_position
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn max_length(&self) -> Option<i64> {
        self.max_length
    }

    /// The maximum length, only when it actually bounds the column.
    pub fn bounded_length(&self) -> Option<i64> {
        self.max_length.filter(|len| *len > 0)
    }

    pub fn composite_unique(&self) -> Option<&str> {
        self.composite_unique.as_deref()
    }

    pub fn constraints(&self) -> &BTreeSet<Constraint> {
        &self.constraints
    }

    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }
}

/// Column constraints. Declaration order is the tie-break for equal priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constraint {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Default,
    AutoIncrement,
    Nullable,
}

impl Constraint {
    pub const ALL: [Constraint; 7] = [
        Self::PrimaryKey,
        Self::ForeignKey,
        Self::Unique,
        Self::Check,
        Self::Default,
        Self::AutoIncrement,
        Self::Nullable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::PrimaryKey => "PK",
            Self::ForeignKey => "FK",
            Self::Unique => "UNIQUE",
            Self::Check => "CHECK",
            Self::Default => "DEFAULT",
            Self::AutoIncrement => "AUTO_INCREMENT",
            Self::Nullable => "NULLABLE",
        }
    }

    /// Higher renders first.
    pub fn display_priority(self) -> u8 {
        match self {
            Self::PrimaryKey => 100,
            Self::ForeignKey => 90,
            Self::Unique => 80,
            Self::AutoIncrement => 70,
            Self::Default => 60,
            Self::Nullable => 60,
            Self::Check => 40,
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase().replace(' ', "_");
        match upper.as_str() {
            "PK" | "PRIMARY_KEY" => Some(Self::PrimaryKey),
            "FK" | "FOREIGN_KEY" => Some(Self::ForeignKey),
            "UNIQUE" => Some(Self::Unique),
            "CHECK" => Some(Self::Check),
            "DEFAULT" => Some(Self::Default),
            "AUTO_INCREMENT" | "IDENTITY" => Some(Self::AutoIncrement),
            "NULLABLE" => Some(Self::Nullable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    name: String,
    columns: Vec<String>,
}

impl PrimaryKey {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Result<Self, ModelError> {
        if columns.is_empty() {
            return Err(ModelError::EmptyKey {
                field: "primary_key.columns",
            });
        }
        Ok(Self {
            name: required("primary_key.name", name)?,
            columns: required_all("primary_key.columns", columns)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// What the database does to referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Accepts SQL spellings and the single-letter `pg_constraint` codes.
    pub fn from_str(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase().replace('_', " ");
        match upper.as_str() {
            "" | "NO ACTION" | "A" => Some(Self::NoAction),
            "RESTRICT" | "R" => Some(Self::Restrict),
            "CASCADE" | "C" => Some(Self::Cascade),
            "SET NULL" | "N" => Some(Self::SetNull),
            "SET DEFAULT" | "D" => Some(Self::SetDefault),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }

    pub fn is_default(self) -> bool {
        self == Self::NoAction
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    name: String,
    source_table: String,
    source_column: String,
    target_table: String,
    target_column: String,
    target_schema: Option<String>,
    nullable: bool,
    on_delete: ReferentialAction,
    on_update: ReferentialAction,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            name: required("foreign_key.name", name)?,
            source_table: required("foreign_key.source_table", source_table)?,
            source_column: required("foreign_key.source_column", source_column)?,
            target_table: required("foreign_key.target_table", target_table)?,
            target_column: required("foreign_key.target_column", target_column)?,
            target_schema: None,
            nullable: false,
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        })
    }

    /// Schema of the referenced table. `None` means the source table's schema.
    pub fn with_target_schema(self, schema: Option<String>) -> Self {
        Self {
            target_schema: schema.filter(|s| !s.trim().is_empty()),
            ..self
        }
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        Self { nullable, ..self }
    }

    pub fn with_actions(self, on_delete: ReferentialAction, on_update: ReferentialAction) -> Self {
        Self {
            on_delete,
            on_update,
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn target_schema(&self) -> Option<&str> {
        self.target_schema.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn on_delete(&self) -> ReferentialAction {
        self.on_delete
    }

    pub fn on_update(&self) -> ReferentialAction {
        self.on_update
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbEnum {
    schema: String,
    name: String,
    columns: BTreeSet<String>,
    values: Vec<String>,
}

impl DbEnum {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        values: Vec<String>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            schema: required("enum.schema", schema)?,
            name: required("enum.name", name)?,
            columns: BTreeSet::new(),
            values,
        })
    }

    /// Columns known to be declared with this enum type.
    pub fn with_columns(self, columns: impl IntoIterator<Item = String>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            ..self
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name shown as a column's data type once resolved.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn key(&self) -> EnumKey {
        EnumKey::new(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCompositeType {
    name: String,
    fields: Vec<(String, String)>,
}

impl DbCompositeType {
    pub fn new(name: impl Into<String>, fields: Vec<(String, String)>) -> Result<Self, ModelError> {
        let fields = fields
            .into_iter()
            .map(|(field, typ)| -> Result<(String, String), ModelError> {
                Ok((
                    required("composite.field.name", field)?,
                    required("composite.field.type", typ)?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: required("composite.name", name)?,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// (table, column) identity used for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub table: String,
    pub column: String,
}

impl ColumnKey {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// (schema, enum) identity; same-named enums in different schemas stay apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumKey {
    pub schema: String,
    pub name: String,
}

impl EnumKey {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Where a user-defined type actually lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdtReference {
    pub schema: String,
    pub type_name: String,
}

impl UdtReference {
    pub fn new(schema: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            type_name: type_name.into(),
        }
    }

    pub fn enum_key(&self) -> EnumKey {
        EnumKey::new(&self.schema, &self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_names_are_rejected() {
        assert_eq!(
            Schema::new("  ").unwrap_err(),
            ModelError::Blank {
                field: "schema.name"
            }
        );
        assert_eq!(
            Column::new("id", 1, false, "").unwrap_err(),
            ModelError::Blank {
                field: "column.data_type"
            }
        );
        assert!(ForeignKey::new("fk", "orders", "user_id", "", "id").is_err());
    }

    #[test]
    fn test_error_names_field() {
        let err = Table::new("", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "table.name must not be blank");
    }

    #[test]
    fn test_primary_key_needs_columns() {
        assert_eq!(
            PrimaryKey::new("users_pkey", vec![]).unwrap_err(),
            ModelError::EmptyKey {
                field: "primary_key.columns"
            }
        );
        let pk = PrimaryKey::new("users_pkey", vec!["id".into(), "tenant".into()]).unwrap();
        assert!(pk.contains("tenant"));
        assert!(!pk.contains("Tenant"));
    }

    #[test]
    fn test_with_returns_new_value() {
        let column = Column::new("email", 2, true, "varchar").unwrap();
        let tagged = column.clone().with_constraint(Constraint::Unique);
        assert!(column.constraints().is_empty());
        assert!(tagged.has_constraint(Constraint::Unique));
    }

    #[test]
    fn test_bounded_length() {
        let column = Column::new("code", 1, false, "char").unwrap();
        assert_eq!(column.clone().with_max_length(Some(3)).bounded_length(), Some(3));
        assert_eq!(column.clone().with_max_length(Some(0)).bounded_length(), None);
        assert_eq!(column.with_max_length(Some(-1)).bounded_length(), None);
    }

    #[test]
    fn test_referential_action_parsing() {
        assert_eq!(
            ReferentialAction::from_str("set null"),
            Some(ReferentialAction::SetNull)
        );
        assert_eq!(
            ReferentialAction::from_str("SET_DEFAULT"),
            Some(ReferentialAction::SetDefault)
        );
        assert_eq!(ReferentialAction::from_str("c"), Some(ReferentialAction::Cascade));
        assert_eq!(ReferentialAction::from_str(""), Some(ReferentialAction::NoAction));
        assert_eq!(ReferentialAction::from_str("explode"), None);
        assert!(ReferentialAction::default().is_default());
    }

    #[test]
    fn test_constraint_labels_round_trip() {
        for constraint in Constraint::ALL {
            assert_eq!(Constraint::from_label(constraint.label()), Some(constraint));
        }
        assert_eq!(
            Constraint::from_label("primary key"),
            Some(Constraint::PrimaryKey)
        );
    }

    #[test]
    fn test_enum_key_is_schema_qualified() {
        let a = DbEnum::new("public", "status", vec![]).unwrap();
        let b = DbEnum::new("billing", "status", vec![]).unwrap();
        assert_ne!(a.key(), b.key());
        assert_eq!(
            UdtReference::new("billing", "status").enum_key(),
            b.key()
        );
    }
}
