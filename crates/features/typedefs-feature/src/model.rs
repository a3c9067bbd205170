use async_graphql::parser::types::{
    ConstDirective, EnumValueDefinition, FieldDefinition, InputValueDefinition, Type,
    TypeDefinition, TypeKind,
};
use async_graphql::{Name, Positioned, Value};
use indexmap::IndexMap;

/// A directive applied to a type, field or value
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveUse {
    pub name: String,
    pub arguments: Vec<(Name, Value)>,
}

/// Argument or input-object field
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<DirectiveUse>,
}

/// Field of an object or interface type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDef>,
    pub ty: Type,
    pub directives: Vec<DirectiveUse>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveUse>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    Scalar,
    Object {
        implements: Vec<String>,
        fields: IndexMap<String, FieldDef>,
    },
    Interface {
        implements: Vec<String>,
        fields: IndexMap<String, FieldDef>,
    },
    Union {
        members: Vec<String>,
    },
    Enum {
        values: Vec<EnumValueDef>,
    },
    InputObject {
        fields: IndexMap<String, InputValueDef>,
    },
}

impl TypeDefKind {
    /// SDL keyword of the kind
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeDefKind::Scalar => "scalar",
            TypeDefKind::Object { .. } => "type",
            TypeDefKind::Interface { .. } => "interface",
            TypeDefKind::Union { .. } => "union",
            TypeDefKind::Enum { .. } => "enum",
            TypeDefKind::InputObject { .. } => "input",
        }
    }
}

/// A named type of the merged type definitions
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveUse>,
    pub kind: TypeDefKind,
}

impl TypeDef {
    /// Output fields of object and interface types
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match &self.kind {
            TypeDefKind::Object { fields, .. } | TypeDefKind::Interface { fields, .. } => {
                Some(fields)
            }
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields().and_then(|fields| fields.get(name))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeDefKind::Object { .. })
    }
}

impl From<&TypeDefinition> for TypeDef {
    fn from(definition: &TypeDefinition) -> Self {
        let kind = match &definition.kind {
            TypeKind::Scalar => TypeDefKind::Scalar,
            TypeKind::Object(object) => TypeDefKind::Object {
                implements: names(&object.implements),
                fields: output_fields(&object.fields),
            },
            TypeKind::Interface(interface) => TypeDefKind::Interface {
                implements: names(&interface.implements),
                fields: output_fields(&interface.fields),
            },
            TypeKind::Union(union) => TypeDefKind::Union {
                members: names(&union.members),
            },
            TypeKind::Enum(enum_type) => TypeDefKind::Enum {
                values: enum_type.values.iter().map(|v| enum_value(&v.node)).collect(),
            },
            TypeKind::InputObject(input) => TypeDefKind::InputObject {
                fields: input
                    .fields
                    .iter()
                    .map(|f| (f.node.name.node.to_string(), input_value(&f.node)))
                    .collect(),
            },
        };

        TypeDef {
            name: definition.name.node.to_string(),
            description: text(&definition.description),
            directives: directives(&definition.directives),
            kind,
        }
    }
}

fn names(names: &[Positioned<Name>]) -> Vec<String> {
    names.iter().map(|name| name.node.to_string()).collect()
}

fn text(description: &Option<Positioned<String>>) -> Option<String> {
    description.as_ref().map(|d| d.node.clone())
}

fn directives(directives: &[Positioned<ConstDirective>]) -> Vec<DirectiveUse> {
    directives
        .iter()
        .map(|directive| DirectiveUse {
            name: directive.node.name.node.to_string(),
            arguments: directive
                .node
                .arguments
                .iter()
                .map(|(name, value)| (name.node.clone(), value.node.clone()))
                .collect(),
        })
        .collect()
}

fn output_fields(fields: &[Positioned<FieldDefinition>]) -> IndexMap<String, FieldDef> {
    fields
        .iter()
        .map(|field| {
            let field = &field.node;
            (
                field.name.node.to_string(),
                FieldDef {
                    name: field.name.node.to_string(),
                    description: text(&field.description),
                    arguments: field.arguments.iter().map(|a| input_value(&a.node)).collect(),
                    ty: field.ty.node.clone(),
                    directives: directives(&field.directives),
                },
            )
        })
        .collect()
}

fn input_value(value: &InputValueDefinition) -> InputValueDef {
    InputValueDef {
        name: value.name.node.to_string(),
        description: text(&value.description),
        ty: value.ty.node.clone(),
        default_value: value.default_value.as_ref().map(|v| v.node.clone()),
        directives: directives(&value.directives),
    }
}

fn enum_value(value: &EnumValueDefinition) -> EnumValueDef {
    EnumValueDef {
        name: value.value.node.to_string(),
        description: text(&value.description),
        directives: directives(&value.directives),
    }
}
