//! Multiplicity formatters: one line per foreign key.

use super::{Formatter, FormatterChain};
use crate::model::{ForeignKey, ReferentialAction};

/// Generic connector emitted by [`RelationshipFormatter::Connector`].
pub const CONNECTOR: &str = " -- ";
/// Exactly one parent, zero or more children.
pub const ONE_TO_ZERO_OR_MANY: &str = " ||--o{ ";
/// Exactly one parent, at least one child.
pub const ONE_TO_ONE_OR_MANY: &str = " ||--|{ ";

/// A foreign key seen from the schema whose tables declare it.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipContext<'a> {
    pub foreign_key: &'a ForeignKey,
    pub schema: &'a str,
}

impl<'a> RelationshipContext<'a> {
    pub fn new(foreign_key: &'a ForeignKey, schema: &'a str) -> Self {
        Self {
            foreign_key,
            schema,
        }
    }

    /// An unset target schema counts as crossing schemas.
    pub fn is_cross_schema(&self) -> bool {
        self.foreign_key.target_schema() != Some(self.schema)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipFormatter {
    /// `target -- source`, schema-qualified across schemas.
    Connector,
    /// Swaps the connector for crow's-foot notation.
    Cardinality,
    /// ` : "ON DELETE …"` for non-default referential actions.
    ReferentialActions,
}

impl RelationshipFormatter {
    /// `Cardinality` rewrites the connector that `ReferentialActions` appends
    /// after, so the order here is fixed.
    pub fn standard_chain() -> FormatterChain<RelationshipFormatter> {
        FormatterChain::new(vec![
            Self::Connector,
            Self::Cardinality,
            Self::ReferentialActions,
        ])
    }
}

impl Formatter<RelationshipContext<'_>> for RelationshipFormatter {
    fn format(&self, ctx: &RelationshipContext<'_>, text: Option<String>) -> Option<String> {
        match self {
            Self::Connector => Some(text.unwrap_or_else(|| connector(ctx))),
            Self::Cardinality => text.map(|t| {
                let token = if ctx.foreign_key.is_nullable() {
                    ONE_TO_ZERO_OR_MANY
                } else {
                    ONE_TO_ONE_OR_MANY
                };
                t.replacen(CONNECTOR, token, 1)
            }),
            Self::ReferentialActions => text.map(|t| {
                let actions = action_labels(ctx.foreign_key);
                if actions.is_empty() {
                    t
                } else {
                    format!("{} : \"{}\"", t, actions.join(" / "))
                }
            }),
        }
    }
}

fn connector(ctx: &RelationshipContext<'_>) -> String {
    let fk = ctx.foreign_key;
    if ctx.is_cross_schema() {
        let target_schema = fk.target_schema().unwrap_or(ctx.schema);
        format!(
            "{}.{}{}{}.{}",
            target_schema,
            fk.target_table(),
            CONNECTOR,
            ctx.schema,
            fk.source_table()
        )
    } else {
        format!("{}{}{}", fk.target_table(), CONNECTOR, fk.source_table())
    }
}

fn action_labels(fk: &ForeignKey) -> Vec<String> {
    [("ON DELETE", fk.on_delete()), ("ON UPDATE", fk.on_update())]
        .into_iter()
        .filter(|(_, action)| !action.is_default())
        .map(|(event, action): (&str, ReferentialAction)| format!("{} {}", event, action.sql()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_fk(nullable: bool) -> ForeignKey {
        ForeignKey::new("orders_user_id_fkey", "orders", "user_id", "users", "id")
            .unwrap()
            .with_target_schema(Some("public".into()))
            .with_nullable(nullable)
    }

    fn render(fk: &ForeignKey, schema: &str) -> String {
        RelationshipFormatter::standard_chain()
            .apply(&RelationshipContext::new(fk, schema), None)
            .unwrap_or_default()
    }

    #[test]
    fn test_nullable_renders_zero_or_many() {
        assert_eq!(render(&orders_fk(true), "public"), "users ||--o{ orders");
    }

    #[test]
    fn test_required_renders_one_or_many() {
        assert_eq!(render(&orders_fk(false), "public"), "users ||--|{ orders");
    }

    #[test]
    fn test_on_delete_label() {
        let fk = orders_fk(true).with_actions(ReferentialAction::Cascade, ReferentialAction::NoAction);
        assert_eq!(
            render(&fk, "public"),
            "users ||--o{ orders : \"ON DELETE CASCADE\""
        );
    }

    #[test]
    fn test_both_actions_joined() {
        let fk = orders_fk(false).with_actions(ReferentialAction::SetNull, ReferentialAction::Restrict);
        assert_eq!(
            render(&fk, "public"),
            "users ||--|{ orders : \"ON DELETE SET NULL / ON UPDATE RESTRICT\""
        );
    }

    #[test]
    fn test_cross_schema_is_qualified() {
        let fk = ForeignKey::new("orders_user_id_fkey", "orders", "user_id", "users", "id")
            .unwrap()
            .with_target_schema(Some("auth".into()));
        assert_eq!(render(&fk, "sales"), "auth.users ||--|{ sales.orders");
    }

    #[test]
    fn test_unset_schema_is_qualified_with_current() {
        let fk = ForeignKey::new("orders_user_id_fkey", "orders", "user_id", "users", "id").unwrap();
        assert_eq!(render(&fk, "sales"), "sales.users ||--|{ sales.orders");
    }

    #[test]
    fn test_actions_noop_when_default() {
        let fk = orders_fk(true);
        let ctx = RelationshipContext::new(&fk, "public");
        let text = Some("users ||--o{ orders".to_string());
        assert_eq!(
            RelationshipFormatter::ReferentialActions.format(&ctx, text.clone()),
            text
        );
    }

    #[test]
    fn test_cardinality_needs_connector_first() {
        let fk = orders_fk(true);
        let ctx = RelationshipContext::new(&fk, "public");
        assert_eq!(RelationshipFormatter::Cardinality.format(&ctx, None), None);
    }
}
