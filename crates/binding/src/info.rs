use async_graphql::{Name, Value};
use indexmap::IndexMap;

/// Arguments of a field invocation
pub type Args = IndexMap<Name, Value>;

/// Owned snapshot of one selected field and its sub-selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedField {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<(Name, Value)>,
    /// Type named by the inline fragment or fragment spread the field was
    /// selected under
    pub type_condition: Option<String>,
    pub selection: Vec<SelectedField>,
}

impl SelectedField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: Vec::new(),
            type_condition: None,
            selection: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on(mut self, type_condition: impl Into<String>) -> Self {
        self.type_condition = Some(type_condition.into());
        self
    }

    pub fn with_selection(mut self, selection: Vec<SelectedField>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_argument(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.arguments.push((Name::new(name), value.into()));
        self
    }

    /// Key the field's value is returned under
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// What a resolver knows about the field it resolves
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveInfo {
    pub parent_type: String,
    pub field_name: String,
    /// Alias the client selected the field under
    pub alias: Option<String>,
    /// Printed return type, e.g. `[User!]!`
    pub return_type: String,
    pub selection: Vec<SelectedField>,
}

impl ResolveInfo {
    pub fn new(
        parent_type: impl Into<String>,
        field_name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            parent_type: parent_type.into(),
            field_name: field_name.into(),
            alias: None,
            return_type: return_type.into(),
            selection: Vec::new(),
        }
    }

    pub fn with_selection(mut self, selection: Vec<SelectedField>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    /// Key the field's value is returned under
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field_name)
    }

    /// Named type at the core of the return type (`[User!]!` -> `User`)
    pub fn return_type_name(&self) -> &str {
        self.return_type.trim_matches(|c| c == '[' || c == ']' || c == '!')
    }
}
