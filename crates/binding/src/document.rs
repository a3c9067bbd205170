use std::fmt::Write;

use async_graphql::{Name, Value};
use indexmap::IndexMap;
use tracing::trace;

use crate::error::OperationKind;
use crate::fragment::ParsedReplacement;
use crate::info::SelectedField;
use crate::type_index::{TypeIndex, TypeShape};

/// Renders forwarded operations against the data-access schema
pub(crate) struct DocumentBuilder<'a> {
    pub index: &'a TypeIndex,
    pub replacements: &'a [ParsedReplacement],
}

impl DocumentBuilder<'_> {
    /// `<kind> { <field>(<args>) { <selection> } }`
    pub fn render<'v>(
        &self,
        kind: OperationKind,
        field: &str,
        type_name: &str,
        arguments: impl IntoIterator<Item = (&'v Name, &'v Value)>,
        selection: &[SelectedField],
    ) -> String {
        let mut out = String::new();
        let _ = write!(out, "{kind} {{ {field}");
        write_arguments(&mut out, arguments);
        let selection = self.prepare(type_name, selection);
        write_selection(&mut out, &selection);
        out.push_str(" }");
        out
    }

    /// Merge fields sharing a response key, add fragment replacements and
    /// `__typename` on abstract types, recursively.
    ///
    /// On abstract types, fields selected under another type's condition stay
    /// grouped after the direct fields so they render as `... on T { }`.
    fn prepare(&self, type_name: &str, selection: &[SelectedField]) -> Vec<SelectedField> {
        let is_abstract = self.index.shape(type_name) == TypeShape::Abstract;
        // Type condition -> response key -> field; `None` holds direct fields
        let mut groups: IndexMap<Option<String>, IndexMap<String, SelectedField>> = IndexMap::new();
        groups.insert(None, IndexMap::new());
        for field in selection {
            let condition = field
                .type_condition
                .as_deref()
                .filter(|condition| is_abstract && *condition != type_name)
                .map(str::to_string);
            let group = groups.entry(condition.clone()).or_default();
            merge_field(group, field, condition);
        }

        for (condition, fields) in groups.iter_mut() {
            let owner = condition.as_deref().unwrap_or(type_name);
            let selected: Vec<String> = fields.values().map(|field| field.name.clone()).collect();
            for replacement in self
                .replacements
                .iter()
                .filter(|r| r.type_name == owner && selected.contains(&r.field_name))
            {
                for extra in &replacement.selection {
                    merge_field(fields, extra, condition.clone());
                }
            }
        }

        if is_abstract {
            let direct = groups.entry(None).or_default();
            if !direct.contains_key("__typename") {
                direct.insert("__typename".to_string(), SelectedField::new("__typename"));
            }
        }

        let mut prepared = Vec::new();
        for (condition, fields) in groups {
            let owner = condition.as_deref().unwrap_or(type_name);
            for mut field in fields.into_values() {
                if !field.selection.is_empty() {
                    let child_type = self
                        .index
                        .field_type(owner, &field.name)
                        .unwrap_or_default()
                        .to_string();
                    field.selection = self.prepare(&child_type, &field.selection);
                }
                prepared.push(field);
            }
        }
        prepared
    }
}

/// Fields with the same response key, name and arguments are merged; a
/// field whose key is already taken by a different field is left out.
fn merge_field(
    fields: &mut IndexMap<String, SelectedField>,
    field: &SelectedField,
    type_condition: Option<String>,
) {
    let key = field.response_key().to_string();
    match fields.get_mut(&key) {
        Some(existing) if existing.name == field.name && existing.arguments == field.arguments => {
            existing.selection.extend(field.selection.iter().cloned());
        }
        Some(existing) => {
            trace!(%key, kept = %existing.name, skipped = %field.name, "Conflicting selection skipped");
        }
        None => {
            let mut field = field.clone();
            field.type_condition = type_condition;
            fields.insert(key, field);
        }
    }
}

fn write_arguments<'v>(out: &mut String, arguments: impl IntoIterator<Item = (&'v Name, &'v Value)>) {
    let mut arguments = arguments.into_iter().peekable();
    if arguments.peek().is_none() {
        return;
    }
    out.push('(');
    for (i, (name, value)) in arguments.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{name}: {value}");
    }
    out.push(')');
}

fn write_selection(out: &mut String, selection: &[SelectedField]) {
    if selection.is_empty() {
        return;
    }
    out.push_str(" {");
    let mut open: Option<&str> = None;
    for field in selection {
        let condition = field.type_condition.as_deref();
        if condition != open {
            if open.is_some() {
                out.push_str(" }");
            }
            if let Some(condition) = condition {
                let _ = write!(out, " ... on {condition} {{");
            }
            open = condition;
        }
        out.push(' ');
        if field.response_key() != field.name {
            let _ = write!(out, "{}: ", field.response_key());
        }
        out.push_str(&field.name);
        write_arguments(out, field.arguments.iter().map(|(name, value)| (name, value)));
        write_selection(out, &field.selection);
    }
    if open.is_some() {
        out.push_str(" }");
    }
    out.push_str(" }");
}
