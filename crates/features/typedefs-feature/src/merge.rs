use async_graphql::parser::parse_schema;
use async_graphql::parser::types::{SchemaDefinition, TypeSystemDefinition};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::TypeDefsError;
use crate::model::{DirectiveUse, EnumValueDef, TypeDef, TypeDefKind};

/// Names of the root operation types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNames {
    pub query: String,
    pub mutation: String,
    pub subscription: String,
}

impl Default for RootNames {
    fn default() -> Self {
        Self {
            query: "Query".to_string(),
            mutation: "Mutation".to_string(),
            subscription: "Subscription".to_string(),
        }
    }
}

impl RootNames {
    pub fn is_default(&self) -> bool {
        *self == RootNames::default()
    }

    fn apply(&mut self, schema: &SchemaDefinition) {
        if let Some(name) = &schema.query {
            self.query = name.node.to_string();
        }
        if let Some(name) = &schema.mutation {
            self.mutation = name.node.to_string();
        }
        if let Some(name) = &schema.subscription {
            self.subscription = name.node.to_string();
        }
    }
}

/// Merged type definitions
///
/// Every type of every source is kept. When two sources define the same
/// type, fields of the later source replace same-named fields of the
/// earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefs {
    types: IndexMap<String, TypeDef>,
    roots: RootNames,
}

impl TypeDefs {
    /// Parse a single SDL source
    pub fn parse(source: &str) -> Result<Self, TypeDefsError> {
        Self::merge([source])
    }

    /// Parse and merge SDL sources in order
    pub fn merge<I, S>(sources: I) -> Result<Self, TypeDefsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged = TypeDefs::default();
        for (index, source) in sources.into_iter().enumerate() {
            merged.merge_source(index, source.as_ref())?;
        }
        debug!(types = merged.types.len(), "Type definitions merged");
        Ok(merged)
    }

    fn merge_source(&mut self, index: usize, source: &str) -> Result<(), TypeDefsError> {
        let document = parse_schema(source).map_err(|e| TypeDefsError::Parse {
            index,
            message: e.to_string(),
        })?;

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => self.roots.apply(&schema.node),
                TypeSystemDefinition::Type(ty) => {
                    if ty.node.extend && !self.types.contains_key(ty.node.name.node.as_str()) {
                        debug!(type_name = %ty.node.name.node, "Extension of an undefined type");
                    }
                    self.merge_type(TypeDef::from(&ty.node));
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }
        Ok(())
    }

    /// Merge another set of definitions over this one
    pub fn merge_with(&mut self, other: TypeDefs) {
        if !other.roots.is_default() {
            self.roots = other.roots;
        }
        for ty in other.types.into_values() {
            self.merge_type(ty);
        }
    }

    fn merge_type(&mut self, incoming: TypeDef) {
        let Some(existing) = self.types.get_mut(&incoming.name) else {
            self.types.insert(incoming.name.clone(), incoming);
            return;
        };

        if std::mem::discriminant(&existing.kind) != std::mem::discriminant(&incoming.kind) {
            warn!(
                type_name = %incoming.name,
                from = existing.kind.keyword(),
                to = incoming.kind.keyword(),
                "Type redefined with a different kind, replacing"
            );
            *existing = incoming;
            return;
        }

        if incoming.description.is_some() {
            existing.description = incoming.description;
        }
        merge_directives(&mut existing.directives, incoming.directives);

        match (&mut existing.kind, incoming.kind) {
            (
                TypeDefKind::Object { implements, fields },
                TypeDefKind::Object {
                    implements: more,
                    fields: incoming,
                },
            )
            | (
                TypeDefKind::Interface { implements, fields },
                TypeDefKind::Interface {
                    implements: more,
                    fields: incoming,
                },
            ) => {
                union(implements, more);
                fields.extend(incoming);
            }
            (TypeDefKind::Union { members }, TypeDefKind::Union { members: more }) => {
                union(members, more);
            }
            (TypeDefKind::Enum { values }, TypeDefKind::Enum { values: more }) => {
                merge_enum_values(values, more);
            }
            (TypeDefKind::InputObject { fields }, TypeDefKind::InputObject { fields: incoming }) => {
                fields.extend(incoming);
            }
            _ => {}
        }
    }

    /// Types in merge order
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn roots(&self) -> &RootNames {
        &self.roots
    }

    /// Object types, root operation types included
    pub fn object_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values().filter(|ty| ty.is_object())
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }
}

fn union(target: &mut Vec<String>, more: Vec<String>) {
    for name in more {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

fn merge_directives(target: &mut Vec<DirectiveUse>, more: Vec<DirectiveUse>) {
    for directive in more {
        match target.iter_mut().find(|d| d.name == directive.name) {
            Some(existing) => *existing = directive,
            None => target.push(directive),
        }
    }
}

fn merge_enum_values(target: &mut Vec<EnumValueDef>, more: Vec<EnumValueDef>) {
    for value in more {
        match target.iter_mut().find(|v| v.name == value.name) {
            Some(existing) => *existing = value,
            None => target.push(value),
        }
    }
}
