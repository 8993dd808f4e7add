use apollo_compiler::name;
use federation_core::schema::definitions::Type;
use federation_core::schema::position::{
    ObjectFieldDefinitionPosition, ObjectTypeDefinitionPosition, ScalarTypeDefinitionPosition,
    UnionTypeDefinitionPosition,
};
use federation_core::schema::FederationSchema;
use federation_core::{FederationError, SingleFederationError};

fn unsupported(result: Result<FederationSchema, FederationError>) -> String {
    match result {
        Err(FederationError::SingleFederationError(
            SingleFederationError::UnsupportedFeature { message },
        )) => message,
        other => panic!("expected an unsupported-feature error, got {:?}", other),
    }
}

#[test]
fn parse_rejects_interface_enum_non_null_and_extensions() {
    assert!(unsupported(FederationSchema::parse("interface I { x: Int }")).contains("Interface"));
    assert!(unsupported(FederationSchema::parse("enum E { A B }")).contains("Enum"));
    assert!(
        unsupported(FederationSchema::parse("type T { x: Int! }")).contains("Non-null"),
    );
    assert!(unsupported(FederationSchema::parse(
        "type T { x: Int }\nextend type T { y: Int }"
    ))
    .contains("extensions"));
}

#[test]
fn add_scalar_type_rejects_built_in_names() {
    let mut schema = FederationSchema::new();
    let error = schema.add_scalar_type(name!("Int")).expect_err("collision");
    assert!(error.to_string().contains("built-in"));
    schema.add_scalar_type(name!("DateTime")).expect("fresh scalar");
}

#[test]
fn add_object_type_returns_existing_position_but_rejects_kind_conflicts() {
    let mut schema = FederationSchema::new();
    schema.add_object_type(name!("T")).unwrap();
    // Same kind: returns the existing type.
    schema.add_object_type(name!("T")).unwrap();
    let error = schema.add_union_type(name!("T")).expect_err("kind conflict");
    assert!(error.to_string().contains("already exists with kind"));
}

#[test]
fn field_insertion_rejects_duplicates_and_unknown_types() {
    let mut schema = FederationSchema::parse("type T { f: Int }").unwrap();
    let position = ObjectTypeDefinitionPosition {
        type_name: name!("T"),
    };
    let duplicate = position.field(name!("f")).insert(
        &mut schema,
        federation_core::schema::definitions::FieldDefinition {
            name: name!("f"),
            ty: Some(Type::Named(name!("Int"))),
            arguments: Default::default(),
            directives: Default::default(),
        },
    );
    assert!(duplicate.unwrap_err().to_string().contains("already exists"));

    let unknown = position.field(name!("g")).insert(
        &mut schema,
        federation_core::schema::definitions::FieldDefinition {
            name: name!("g"),
            ty: Some(Type::Named(name!("Missing"))),
            arguments: Default::default(),
            directives: Default::default(),
        },
    );
    assert!(unknown
        .unwrap_err()
        .to_string()
        .contains("not in this schema"));
}

#[test]
fn set_type_updates_referencers_and_rejects_unknown_types() {
    let mut schema = FederationSchema::parse("type T { f: Int }\nscalar S").unwrap();
    let field = ObjectFieldDefinitionPosition {
        type_name: name!("T"),
        field_name: name!("f"),
    };
    field
        .set_type(&mut schema, Type::Named(name!("S")))
        .unwrap();
    assert_eq!(
        field.get(&schema).unwrap().ty,
        Some(Type::Named(name!("S")))
    );
    assert!(field
        .set_type(&mut schema, Type::Named(name!("Nope")))
        .is_err());

    // Now that S is referenced, removing it must surface T.f as a referencer and clear the
    // field's type.
    let scalar = ScalarTypeDefinitionPosition {
        type_name: name!("S"),
    };
    let referencers = scalar.remove(&mut schema).unwrap().expect("was present");
    assert!(referencers.object_fields.contains(&field));
    assert_eq!(field.get(&schema).unwrap().ty, None);
}

#[test]
fn removing_a_type_detaches_every_referencer() {
    let mut schema = FederationSchema::parse(
        r#"
        schema {
          query: A
        }

        type A {
          id: ID
          other: B
        }

        type B {
          a: A
        }

        union U = A | B
        "#,
    )
    .unwrap();
    let a = ObjectTypeDefinitionPosition {
        type_name: name!("A"),
    };
    let referencers = a.remove(&mut schema).unwrap().expect("was present");

    // The full referencer list comes back so callers can repair or report.
    assert_eq!(referencers.schema_roots.len(), 1);
    assert!(referencers.object_fields.contains(&ObjectFieldDefinitionPosition {
        type_name: name!("B"),
        field_name: name!("a"),
    }));
    assert!(referencers.union_types.contains(&UnionTypeDefinitionPosition {
        type_name: name!("U"),
    }));

    // The type is gone, the root binding dropped, the union member removed, and the
    // referencing field's type cleared.
    assert!(schema.try_get_type(&name!("A")).is_none());
    assert_eq!(schema.schema_definition().query, None);
    let union_ = UnionTypeDefinitionPosition {
        type_name: name!("U"),
    };
    assert!(!union_.get(&schema).unwrap().members.contains(&name!("A")));
    let dangling = ObjectFieldDefinitionPosition {
        type_name: name!("B"),
        field_name: name!("a"),
    };
    assert_eq!(dangling.get(&schema).unwrap().ty, None);

    // Removing an already-removed type is a no-op.
    assert!(a.remove(&mut schema).unwrap().is_none());
}

#[test]
fn freeze_and_thaw_round_trip_structurally() {
    let schema = FederationSchema::parse(
        r#"
        directive @tag(name: String) repeatable on FIELD_DEFINITION | OBJECT

        type Query {
          user(id: ID = "1"): User
        }

        type User @tag(name: "accounts") {
          id: ID
          friends: [User]
        }

        input Filter {
          limit: Int = 10
        }
        "#,
    )
    .unwrap();
    let frozen = schema.clone().freeze();
    let thawed = frozen.to_mutable();
    assert_eq!(thawed, schema);

    // Frozen copies are independent: mutating the thawed schema doesn't affect them.
    let mut thawed = thawed;
    ObjectTypeDefinitionPosition {
        type_name: name!("User"),
    }
    .remove(&mut thawed)
    .unwrap();
    assert_eq!(frozen.to_mutable(), schema);
    assert_ne!(thawed, schema);
}

#[test]
fn parse_print_parse_round_trips() {
    let source = r#"
        schema {
          query: MyQuery
        }

        directive @tag(name: String) repeatable on FIELD_DEFINITION | OBJECT

        scalar DateTime

        type MyQuery {
          user(id: ID = "1"): User
          at(when: DateTime): User
        }

        type User @tag(name: "accounts") {
          id: ID
          friends: [User]
        }

        union Account = User

        input Filter {
          limit: Int = 10
        }
    "#;
    let schema = FederationSchema::parse(source).unwrap();
    let printed = schema.to_string();
    let reparsed = FederationSchema::parse(&printed).unwrap();
    assert_eq!(reparsed, schema);
    assert_eq!(reparsed.to_string(), printed);
}

#[test]
fn join_directive_applications_survive_a_round_trip_byte_identically() {
    let source = r#"
        schema @core(feature: "https://specs.apollo.dev/core/v0.2") @core(feature: "https://specs.apollo.dev/join/v0.1", for: EXECUTION) {
          query: Query
        }

        type Query {
          t: T @join__field(graph: SUBGRAPH1)
        }

        type T @join__type(graph: SUBGRAPH1, key: "k") @join__type(graph: SUBGRAPH2, key: "k") {
          k: ID
          a: Int @join__field(graph: SUBGRAPH2)
          b: String @join__field(graph: SUBGRAPH2, external: true)
        }
        "#;
    let schema = FederationSchema::parse(source).unwrap();
    let printed = schema.to_string();
    for application in [
        r#"@join__type(graph: SUBGRAPH1, key: "k")"#,
        r#"@join__type(graph: SUBGRAPH2, key: "k")"#,
        "@join__field(graph: SUBGRAPH1)",
        "@join__field(graph: SUBGRAPH2)",
        "@join__field(graph: SUBGRAPH2, external: true)",
    ] {
        assert!(printed.contains(application), "missing {}", application);
    }
    let reparsed = FederationSchema::parse(&printed).unwrap();
    assert_eq!(reparsed, schema);
}

#[test]
fn printing_matches_the_canonical_form() {
    let schema = FederationSchema::parse(
        "schema { query: MyQuery } type MyQuery { user(id: ID = \"1\"): User } type User @tag(name: \"x\") { id: ID friends: [User] } union Account = User",
    )
    .unwrap();
    insta::assert_snapshot!(schema.to_string(), @r###"
    schema {
      query: MyQuery
    }

    type MyQuery {
      user(id: ID = "1"): User
    }

    type User @tag(name: "x") {
      id: ID
      friends: [User]
    }

    union Account = User
    "###);
}
