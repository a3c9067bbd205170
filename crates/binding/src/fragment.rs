use async_graphql::parser::parse_query;
use async_graphql::parser::types::{DocumentOperations, Selection, SelectionSet};
use async_graphql::Value;

use crate::error::BindingError;
use crate::info::SelectedField;

/// Extra selection the binding fetches whenever `type_name.field_name` is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentReplacement {
    pub type_name: String,
    pub field_name: String,
    /// Fragment text, e.g. `fragment Fragment on User { id }`
    pub fragment: String,
}

impl FragmentReplacement {
    pub fn new(
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
            fragment: fragment.into(),
        }
    }
}

/// Fragment replacement with its selection already parsed
#[derive(Debug, Clone)]
pub(crate) struct ParsedReplacement {
    pub type_name: String,
    pub field_name: String,
    pub selection: Vec<SelectedField>,
}

impl ParsedReplacement {
    pub fn parse(replacement: &FragmentReplacement) -> Result<Self, BindingError> {
        let selection = parse_selection(&replacement.fragment).map_err(|message| {
            BindingError::InvalidFragment {
                type_name: replacement.type_name.clone(),
                field_name: replacement.field_name.clone(),
                message,
            }
        })?;
        Ok(Self {
            type_name: replacement.type_name.clone(),
            field_name: replacement.field_name.clone(),
            selection,
        })
    }
}

/// Parse a selection given either as a bare selection set (`{ id }`) or as
/// a fragment definition (`fragment F on User { id }`).
///
/// Fragment spreads are not resolved; fields of inline fragments carry the
/// fragment's type condition.
pub fn parse_selection(text: &str) -> Result<Vec<SelectedField>, String> {
    let text = text.trim();
    let body = if text.starts_with("fragment") {
        let start = text
            .find('{')
            .ok_or_else(|| format!("fragment has no selection set: {text}"))?;
        &text[start..]
    } else {
        text
    };

    let document = parse_query(body).map_err(|e| e.to_string())?;
    match &document.operations {
        DocumentOperations::Single(operation) => Ok(convert(&operation.node.selection_set.node, None)),
        DocumentOperations::Multiple(_) => Err(format!("expected a single selection set: {text}")),
    }
}

fn convert(selection_set: &SelectionSet, type_condition: Option<&str>) -> Vec<SelectedField> {
    let mut fields = Vec::new();
    for item in &selection_set.items {
        match &item.node {
            Selection::Field(field) => {
                let field = &field.node;
                fields.push(SelectedField {
                    name: field.name.node.to_string(),
                    alias: field.alias.as_ref().map(|alias| alias.node.to_string()),
                    arguments: field
                        .arguments
                        .iter()
                        .filter_map(|(name, value)| {
                            value
                                .node
                                .clone()
                                .into_const()
                                .map(|value: Value| (name.node.clone(), value))
                        })
                        .collect(),
                    type_condition: type_condition.map(str::to_string),
                    selection: convert(&field.selection_set.node, None),
                });
            }
            Selection::InlineFragment(fragment) => {
                let condition = fragment
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.as_str())
                    .or(type_condition);
                fields.extend(convert(&fragment.node.selection_set.node, condition));
            }
            Selection::FragmentSpread(_) => {}
        }
    }
    fields
}
