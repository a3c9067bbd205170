use std::collections::HashMap;

use async_graphql::parser::types::{
    BaseType, FieldDefinition, ServiceDocument, Type, TypeKind, TypeSystemDefinition,
};
use async_graphql::Positioned;

/// Shape of a named type, as far as document rendering cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Object,
    Abstract,
    Leaf,
}

/// A root field of the data-access schema
#[derive(Debug, Clone)]
pub struct RootField {
    pub name: String,
    pub return_type: String,
    pub type_name: String,
}

/// Field-to-type lookup over the data-access schema
#[derive(Debug, Default)]
pub struct TypeIndex {
    shapes: HashMap<String, TypeShape>,
    fields: HashMap<String, HashMap<String, String>>,
    pub query: Vec<RootField>,
    pub mutation: Vec<RootField>,
    pub subscription: Vec<RootField>,
}

impl TypeIndex {
    pub fn from_document(document: &ServiceDocument) -> Self {
        let mut index = TypeIndex::default();
        let mut roots = (
            "Query".to_string(),
            "Mutation".to_string(),
            "Subscription".to_string(),
        );

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = &schema.node;
                    if let Some(name) = &schema.query {
                        roots.0 = name.node.to_string();
                    }
                    if let Some(name) = &schema.mutation {
                        roots.1 = name.node.to_string();
                    }
                    if let Some(name) = &schema.subscription {
                        roots.2 = name.node.to_string();
                    }
                }
                TypeSystemDefinition::Type(ty) => {
                    let name = ty.node.name.node.to_string();
                    let (shape, fields) = match &ty.node.kind {
                        TypeKind::Object(object) => (TypeShape::Object, Some(&object.fields)),
                        TypeKind::Interface(interface) => {
                            (TypeShape::Abstract, Some(&interface.fields))
                        }
                        TypeKind::Union(_) => (TypeShape::Abstract, None),
                        _ => (TypeShape::Leaf, None),
                    };
                    index.shapes.insert(name.clone(), shape);
                    if let Some(fields) = fields {
                        let entry = index.fields.entry(name).or_default();
                        for field in fields {
                            entry.insert(
                                field.node.name.node.to_string(),
                                named_type(&field.node.ty.node).to_string(),
                            );
                        }
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        index.query = root_fields(document, &roots.0);
        index.mutation = root_fields(document, &roots.1);
        index.subscription = root_fields(document, &roots.2);
        index
    }

    /// Named return type of `type_name.field_name`
    pub fn field_type(&self, type_name: &str, field_name: &str) -> Option<&str> {
        self.fields
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .map(String::as_str)
    }

    pub fn shape(&self, type_name: &str) -> TypeShape {
        self.shapes.get(type_name).copied().unwrap_or(TypeShape::Leaf)
    }
}

/// Fields of every definition (including extensions) of a root type
fn root_fields(document: &ServiceDocument, root: &str) -> Vec<RootField> {
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            TypeSystemDefinition::Type(ty) if ty.node.name.node == root => match &ty.node.kind {
                TypeKind::Object(object) => Some(object.fields.iter().map(root_field)),
                _ => None,
            },
            _ => None,
        })
        .flatten()
        .collect()
}

fn root_field(field: &Positioned<FieldDefinition>) -> RootField {
    RootField {
        name: field.node.name.node.to_string(),
        return_type: field.node.ty.node.to_string(),
        type_name: named_type(&field.node.ty.node).to_string(),
    }
}

/// Innermost named type of a possibly wrapped type
pub fn named_type(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(inner) => named_type(inner),
    }
}
