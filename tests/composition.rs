use apollo_compiler::name;
use federation_core::merge::{merge_subgraphs, MergeFailure, MergeSuccess};
use federation_core::schema::position::ObjectFieldDefinitionPosition;
use federation_core::values::Value;
use federation_core::{ErrorCode, Subgraph};

fn subgraph(name: &str, type_defs: &str) -> Subgraph {
    Subgraph::parse(name, &format!("https://{}", name), type_defs).expect("valid subgraph")
}

fn compose(subgraphs: &[Subgraph]) -> MergeSuccess {
    merge_subgraphs(subgraphs).expect("composition should succeed")
}

fn compose_err(subgraphs: &[Subgraph]) -> MergeFailure {
    merge_subgraphs(subgraphs).expect_err("composition should fail")
}

fn field(type_name: &str, field_name: &str) -> ObjectFieldDefinitionPosition {
    ObjectFieldDefinitionPosition {
        type_name: apollo_compiler::schema::Name::new(type_name).unwrap(),
        field_name: apollo_compiler::schema::Name::new(field_name).unwrap(),
    }
}

/// The graph enum values of the `@join__field` applications on a field, paired with their
/// `external:` argument.
fn join_fields(result: &MergeSuccess, position: &ObjectFieldDefinitionPosition) -> Vec<(String, bool)> {
    position
        .get(&result.schema)
        .expect("field exists")
        .directives
        .get_all(&name!("join__field"))
        .map(|directive| {
            (
                directive
                    .enum_argument(&name!("graph"))
                    .expect("graph argument")
                    .to_string(),
                directive.argument(&name!("external")) == Some(&Value::Boolean(true)),
            )
        })
        .collect()
}

#[test]
fn emits_the_core_and_join_scaffolding() {
    let result = compose(&[
        subgraph("Subgraph1", "type Query { t: T }\ntype T @key(fields: \"k\") { k: ID }"),
        subgraph("Subgraph2", "type T @key(fields: \"k\") { k: ID b: String }"),
    ]);
    let sdl = &result.supergraph_sdl;
    assert!(sdl.contains(r#"@core(feature: "https://specs.apollo.dev/core/v0.2")"#));
    assert!(sdl.contains(r#"@core(feature: "https://specs.apollo.dev/join/v0.1", for: EXECUTION)"#));
    assert!(sdl.contains("scalar join__FieldSet"));
    assert!(sdl.contains("enum core__Purpose"));
    assert!(sdl.contains("enum join__Graph"));
    assert!(sdl.contains(r#"SUBGRAPH1 @join__graph(name: "Subgraph1", url: "https://Subgraph1")"#));
    assert!(sdl.contains(r#"SUBGRAPH2 @join__graph(name: "Subgraph2", url: "https://Subgraph2")"#));
    assert!(sdl.contains("directive @join__field"));
    assert!(sdl.contains("directive @join__type"));
    assert!(sdl.contains(r#"@join__type(graph: SUBGRAPH1, key: "k")"#));
    assert!(sdl.contains(r#"@join__type(graph: SUBGRAPH2, key: "k")"#));
}

// Scenario 1: a plain valid override moves resolution to the overriding subgraph.
#[test]
fn override_moves_field_resolution() {
    let result = compose(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int
              b: String
            }
            "#,
        ),
    ]);
    assert_eq!(
        join_fields(&result, &field("T", "a")),
        vec![("SUBGRAPH1".to_owned(), false)]
    );
    assert_eq!(
        join_fields(&result, &field("T", "b")),
        vec![("SUBGRAPH2".to_owned(), false)]
    );
    // Key fields resolvable by both subgraphs get no @join__field.
    assert_eq!(join_fields(&result, &field("T", "k")), vec![]);
    // The API surface keeps all three fields.
    for field_name in ["k", "a", "b"] {
        assert!(field("T", field_name).try_get(&result.schema).is_some());
    }
    assert!(result
        .hints
        .iter()
        .any(|hint| hint.code == "OVERRIDDEN_FIELD_CAN_BE_REMOVED"
            && hint.message.contains("Subgraph2")));
}

// Scenario 2: overriding from the declaring subgraph itself.
#[test]
fn override_from_self_is_an_error() {
    let failure = compose_err(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph1")
            }
            "#,
        ),
        subgraph("Subgraph2", "type S @key(fields: \"id\") { id: ID }"),
    ]);
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(failure.errors[0].code(), ErrorCode::OverrideFromSelfError);
    let message = failure.errors[0].to_string();
    assert!(message.contains("T.a"));
    assert!(message.contains("Subgraph1"));
}

// Scenario 3: a two-way override is reported once per side, and since neither override
// takes effect both subgraphs still resolve the field, which is then an invalid share.
#[test]
fn mutual_overrides_produce_three_errors() {
    let failure = compose_err(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph1")
            }
            "#,
        ),
    ]);
    let codes: Vec<ErrorCode> = failure.errors.iter().map(|error| error.code()).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::OverrideSourceHasOverride,
            ErrorCode::OverrideSourceHasOverride,
            ErrorCode::InvalidFieldSharing,
        ]
    );
    assert!(failure.errors[2].to_string().contains("T.a"));
}

// Scenario 4: overriding a key field keeps it advertised (but external) in the overridden
// subgraph, so that subgraph can still be reached through its key.
#[test]
fn overriding_a_key_field_keeps_it_external_in_the_source() {
    let result = compose(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID @override(from: "Subgraph2")
              a: Int
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              b: String
            }
            "#,
        ),
    ]);
    assert_eq!(
        join_fields(&result, &field("T", "k")),
        vec![
            ("SUBGRAPH1".to_owned(), false),
            ("SUBGRAPH2".to_owned(), true),
        ]
    );
    assert_eq!(
        join_fields(&result, &field("T", "a")),
        vec![("SUBGRAPH1".to_owned(), false)]
    );
    assert_eq!(
        join_fields(&result, &field("T", "b")),
        vec![("SUBGRAPH2".to_owned(), false)]
    );
}

// Scenario 5: the overridden counterpart is @external.
#[test]
fn overriding_an_external_field_is_a_collision() {
    let failure = compose_err(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int @external
            }
            "#,
        ),
    ]);
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(
        failure.errors[0].code(),
        ErrorCode::OverrideCollisionWithAnotherDirective
    );
    assert!(failure.errors[0].to_string().contains("@external"));
}

// Scenario 6: the overriding declaration itself is @external.
#[test]
fn override_on_an_external_declaration_is_a_collision() {
    let failure = compose_err(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @external @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int
            }
            "#,
        ),
    ]);
    assert!(failure.errors.iter().any(|error| {
        error.code() == ErrorCode::OverrideCollisionWithAnotherDirective
            && error.to_string().contains("Subgraph1")
    }));
}

// Scenario 7: declaration mismatches silently favor the overriding subgraph.
#[test]
fn override_type_mismatch_favors_the_overriding_subgraph() {
    let result = compose(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: String
            }
            "#,
        ),
    ]);
    let a = field("T", "a").get(&result.schema).unwrap();
    assert_eq!(
        a.ty,
        Some(federation_core::schema::definitions::Type::Named(name!("Int")))
    );
    assert_eq!(
        join_fields(&result, &field("T", "a")),
        vec![("SUBGRAPH1".to_owned(), false)]
    );
}

#[test]
fn non_shareable_fields_cannot_be_resolved_twice() {
    let failure = compose_err(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int
            }
            "#,
        ),
    ]);
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(failure.errors[0].code(), ErrorCode::InvalidFieldSharing);
    let message = failure.errors[0].to_string();
    assert!(message.contains("T.a"));
    assert!(message.contains("all of them"));
}

#[test]
fn shareable_fields_can_be_resolved_twice() {
    let result = compose(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @shareable
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int @shareable
            }
            "#,
        ),
    ]);
    assert_eq!(
        join_fields(&result, &field("T", "a")),
        vec![
            ("SUBGRAPH1".to_owned(), false),
            ("SUBGRAPH2".to_owned(), false),
        ]
    );
}

#[test]
fn requires_and_provides_are_threaded_into_join_field() {
    let result = compose(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { u: User }
            type User @key(fields: "id") {
              id: ID
              name: String
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type User @key(fields: "id") {
              id: ID
              name: String @external
              reviews: [Review] @requires(fields: "name")
            }
            type Review @key(fields: "rid") {
              rid: ID
              author: User @provides(fields: "name")
            }
            "#,
        ),
    ]);
    let sdl = &result.supergraph_sdl;
    assert!(sdl.contains(r#"reviews: [Review] @join__field(graph: SUBGRAPH2, requires: "name")"#));
    assert!(sdl.contains(r#"author: User @join__field(graph: SUBGRAPH2, provides: "name")"#));
}

#[test]
fn overriding_a_field_still_used_by_requires_warns_differently() {
    let result = compose(&[
        subgraph(
            "Subgraph1",
            r#"
            type Query { u: User }
            type User @key(fields: "id") {
              id: ID
              name: String @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type User @key(fields: "id") {
              id: ID
              name: String
              reviews: Int @requires(fields: "name")
            }
            "#,
        ),
    ]);
    assert!(result
        .hints
        .iter()
        .any(|hint| hint.code == "OVERRIDDEN_FIELD_STILL_USED"
            && hint.message.contains("User.name")));
}

#[test]
fn root_fields_carry_their_source_subgraph() {
    let result = compose(&[
        subgraph("Subgraph1", "type Query { a: Int }"),
        subgraph("Subgraph2", "type Query { b: Int }"),
    ]);
    assert_eq!(
        join_fields(&result, &field("Query", "a")),
        vec![("SUBGRAPH1".to_owned(), false)]
    );
    assert_eq!(
        join_fields(&result, &field("Query", "b")),
        vec![("SUBGRAPH2".to_owned(), false)]
    );
}
