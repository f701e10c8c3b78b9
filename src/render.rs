//! PlantUML document assembly.

use crate::format::{
    ColumnContext, ColumnFormatter, FormatterChain, RelationshipFormatter,
};
use crate::model::{Column, DbCompositeType, DbEnum, Schema, Table};
use crate::relationships::write_relationships;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the relationship section after the packages.
    pub relationships: bool,
    pub title: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            relationships: true,
            title: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stereotype {
    Enum,
    Composite,
    View,
    MaterializedView,
}

impl Stereotype {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Enum => "<<enum>>",
            Self::Composite => "<<composite>>",
            Self::View => "<<view>>",
            Self::MaterializedView => "<<materialized_view>>",
        }
    }
}

pub struct PlantUmlRenderer {
    options: RenderOptions,
    column_chain: FormatterChain<ColumnFormatter>,
    relationship_chain: FormatterChain<RelationshipFormatter>,
}

impl Default for PlantUmlRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl PlantUmlRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            column_chain: ColumnFormatter::standard_chain(),
            relationship_chain: RelationshipFormatter::standard_chain(),
        }
    }

    pub fn with_column_chain(self, column_chain: FormatterChain<ColumnFormatter>) -> Self {
        Self {
            column_chain,
            ..self
        }
    }

    pub fn with_relationship_chain(
        self,
        relationship_chain: FormatterChain<RelationshipFormatter>,
    ) -> Self {
        Self {
            relationship_chain,
            ..self
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, schemas: &[Schema]) -> String {
        let mut output = String::new();

        output.push_str("@startuml\n");
        output.push_str("hide methods\n");
        output.push_str("hide stereotypes\n");
        if let Some(title) = &self.options.title {
            output.push_str(&format!("title {}\n", title));
        }
        output.push('\n');

        for schema in schemas {
            self.render_package(&mut output, schema);
        }

        if self.options.relationships {
            for schema in schemas {
                write_relationships(&mut output, schema, &self.relationship_chain);
            }
        }

        output.push_str("@enduml\n");
        output
    }

    fn render_package(&self, output: &mut String, schema: &Schema) {
        output.push_str(&format!("package \"{}\" {{\n", schema.name()));

        for db_enum in schema.enums() {
            render_enum(output, db_enum);
        }
        for composite in schema.composite_types() {
            render_composite(output, composite);
        }
        for view in schema.views() {
            let lines = self.flat_lines(view.columns());
            write_entity(output, view.name(), Some(Stereotype::View), &lines);
        }
        for view in schema.materialized_views() {
            let lines = self.flat_lines(view.columns());
            write_entity(output, view.name(), Some(Stereotype::MaterializedView), &lines);
        }
        for table in schema.tables() {
            self.render_table(output, table);
        }

        output.push_str("}\n\n");
    }

    fn render_table(&self, output: &mut String, table: &Table) {
        let (keys, rest): (Vec<&Column>, Vec<&Column>) = table
            .columns()
            .iter()
            .partition(|c| table.is_primary_key_column(c.name()));

        let format = |column: &Column| {
            self.column_chain
                .apply(&ColumnContext::for_table(table, column), None)
        };
        let key_lines: Vec<String> = keys.into_iter().filter_map(format).collect();
        let rest_lines: Vec<String> = rest.into_iter().filter_map(format).collect();

        let mut lines = key_lines;
        if !lines.is_empty() && !rest_lines.is_empty() {
            lines.push("--".to_string());
        }
        lines.extend(rest_lines);

        write_entity(output, table.name(), None, &lines);
    }

    /// Views have no keys, so columns go out in one run without a separator.
    fn flat_lines(&self, columns: &[Column]) -> Vec<String> {
        columns
            .iter()
            .filter_map(|c| self.column_chain.apply(&ColumnContext::keyless(c), None))
            .collect()
    }
}

fn render_enum(output: &mut String, db_enum: &DbEnum) {
    write_entity(output, db_enum.name(), Some(Stereotype::Enum), db_enum.values());
}

fn render_composite(output: &mut String, composite: &DbCompositeType) {
    let lines: Vec<String> = composite
        .fields()
        .iter()
        .map(|(name, typ)| format!("{}: {}", name, typ))
        .collect();
    write_entity(output, composite.name(), Some(Stereotype::Composite), &lines);
}

fn write_entity(output: &mut String, name: &str, stereotype: Option<Stereotype>, lines: &[String]) {
    match stereotype {
        Some(s) => output.push_str(&format!("entity \"{}\" {} {{\n", name, s.tag())),
        None => output.push_str(&format!("entity \"{}\" {{\n", name)),
    }
    for line in lines {
        output.push('\t');
        output.push_str(line);
        output.push('\n');
    }
    output.push_str("}\n\n");
}
