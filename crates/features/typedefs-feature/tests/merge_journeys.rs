//! Type definition merge tests
//!
//! These tests verify how datamodel, data-access and extra SDL sources
//! combine into one set of type definitions.

use async_graphql::{value, Name};
use typedefs_feature::{TypeDefKind, TypeDefs, TypeDefsError};

const DATAMODEL: &str = r#"
    type User {
        id: ID!
        name: String
    }
"#;

const PRISMA: &str = r#"
    type Query {
        users: [User!]!
    }
    type User {
        id: ID!
        name: String
        email: String
    }
    enum UserOrderByInput { name_ASC name_DESC }
"#;

fn field_type(type_defs: &TypeDefs, type_name: &str, field: &str) -> String {
    type_defs
        .get(type_name)
        .and_then(|ty| ty.field(field))
        .map(|field| field.ty.to_string())
        .unwrap_or_else(|| panic!("{type_name}.{field} missing"))
}

// =============================================================================
// Field Overrides
// =============================================================================

#[test]
fn later_source_overrides_field_definition() {
    // Given a datamodel with a nullable name and an extra source making it non-null
    let extra = "type User { name: String! }";

    // When the sources are merged in order
    let merged = TypeDefs::merge([DATAMODEL, PRISMA, extra]).unwrap();

    // Then the later definition wins
    assert_eq!(field_type(&merged, "User", "name"), "String!");
    // And fields from every source are kept
    assert_eq!(field_type(&merged, "User", "id"), "ID!");
    assert_eq!(field_type(&merged, "User", "email"), "String");
}

#[test]
fn earlier_field_order_is_preserved_on_override() {
    let merged = TypeDefs::merge([PRISMA, "type User { name: String! }"]).unwrap();

    let names: Vec<_> = merged
        .get("User")
        .and_then(|ty| ty.fields())
        .unwrap()
        .keys()
        .cloned()
        .collect();

    assert_eq!(names, vec!["id", "name", "email"]);
}

#[test]
fn all_types_are_kept_in_merge_order() {
    let merged = TypeDefs::merge([DATAMODEL, PRISMA, "type Post { title: String }"]).unwrap();

    let names: Vec<_> = merged.types().map(|ty| ty.name.as_str()).collect();

    assert_eq!(names, vec!["User", "Query", "UserOrderByInput", "Post"]);
}

// =============================================================================
// Type-Level Merges
// =============================================================================

#[test]
fn extend_type_adds_fields() {
    let merged = TypeDefs::merge([
        PRISMA,
        "extend type Query { me: User }",
    ])
    .unwrap();

    assert_eq!(field_type(&merged, "Query", "users"), "[User!]!");
    assert_eq!(field_type(&merged, "Query", "me"), "User");
}

#[test]
fn enum_values_and_union_members_are_unioned() {
    let merged = TypeDefs::merge([
        "enum Role { ADMIN } union Result = User",
        "enum Role { ADMIN USER } union Result = Post",
    ])
    .unwrap();

    match &merged.get("Role").unwrap().kind {
        TypeDefKind::Enum { values } => {
            let values: Vec<_> = values.iter().map(|v| v.name.as_str()).collect();
            assert_eq!(values, vec!["ADMIN", "USER"]);
        }
        other => panic!("expected enum, got {other:?}"),
    }
    match &merged.get("Result").unwrap().kind {
        TypeDefKind::Union { members } => assert_eq!(members, &vec!["User", "Post"]),
        other => panic!("expected union, got {other:?}"),
    }
}

#[test]
fn implements_lists_are_unioned() {
    let merged = TypeDefs::merge([
        "interface Node { id: ID! } type User implements Node { id: ID! }",
        "interface Named { name: String } type User implements Named { name: String }",
    ])
    .unwrap();

    match &merged.get("User").unwrap().kind {
        TypeDefKind::Object { implements, .. } => {
            assert_eq!(implements, &vec!["Node", "Named"]);
        }
        other => panic!("expected object, got {other:?}"),
    }
}

#[test]
fn kind_change_replaces_the_type() {
    let merged = TypeDefs::merge(["type Timestamp { value: Int }", "scalar Timestamp"]).unwrap();

    assert_eq!(merged.get("Timestamp").unwrap().kind, TypeDefKind::Scalar);
}

#[test]
fn schema_definition_renames_roots() {
    let merged = TypeDefs::merge([
        "type RootQuery { ok: Boolean }",
        "schema { query: RootQuery }",
    ])
    .unwrap();

    assert_eq!(merged.roots().query, "RootQuery");
    assert_eq!(merged.roots().mutation, "Mutation");
}

#[test]
fn directive_definitions_are_ignored() {
    let merged = TypeDefs::merge([
        "directive @isAuthenticated on FIELD_DEFINITION",
        "type Query { me: String @isAuthenticated }",
    ])
    .unwrap();

    assert_eq!(merged.len(), 1);
    let field = merged.get("Query").and_then(|ty| ty.field("me")).unwrap();
    assert_eq!(field.directives[0].name, "isAuthenticated");
}

#[test]
fn directive_arguments_and_defaults_are_kept_as_values() {
    let merged = TypeDefs::merge([r#"
        type Query {
            users(first: Int = 10): [User!]! @cached(ttl: 30, scope: "user")
        }
        type User { id: ID! }
    "#])
    .unwrap();

    let users = merged.get("Query").and_then(|ty| ty.field("users")).unwrap();
    assert_eq!(users.arguments[0].default_value, Some(value!(10)));
    assert_eq!(users.directives[0].name, "cached");
    assert_eq!(
        users.directives[0].arguments,
        vec![(Name::new("ttl"), value!(30)), (Name::new("scope"), value!("user"))]
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn parse_error_names_the_failing_source() {
    let result = TypeDefs::merge([DATAMODEL, "type Broken {"]);

    match result {
        Err(TypeDefsError::Parse { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn merge_with_applies_later_definitions() {
    let mut base = TypeDefs::parse(DATAMODEL).unwrap();

    base.merge_with(TypeDefs::parse("type User { name: String! }").unwrap());

    assert_eq!(field_type(&base, "User", "name"), "String!");
}
