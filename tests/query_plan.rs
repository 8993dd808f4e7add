use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::schema::Name;
use apollo_compiler::Node;
use federation_core::merge::merge_subgraphs;
use federation_core::query_plan::collect::{
    collect_fields, key_fields, provided_fields, required_fields,
};
use federation_core::query_plan::context::QueryPlanningContext;
use federation_core::query_plan::scope::Scope;
use federation_core::query_plan::FieldSet;
use federation_core::schema::position::{
    CompositeTypeDefinitionPosition, ObjectFieldDefinitionPosition, ObjectTypeDefinitionPosition,
};
use federation_core::schema::{FederationSchema, FrozenFederationSchema};
use federation_core::values::{Directive, Value};
use federation_core::Subgraph;
use std::rc::Rc;

fn test_supergraph() -> FrozenFederationSchema {
    let accounts = Subgraph::parse(
        "Subgraph1",
        "https://Subgraph1",
        r#"
        type Query {
          me: User
          user(id: ID): User
          account: Account
        }

        type User @key(fields: "id") {
          id: ID
          name: String
        }

        type Admin @key(fields: "aid") {
          aid: ID
          level: Int
        }

        union Account = User | Admin
        "#,
    )
    .expect("valid subgraph");
    let reviews = Subgraph::parse(
        "Subgraph2",
        "https://Subgraph2",
        r#"
        type User @key(fields: "id") @key(fields: "sku") {
          id: ID
          sku: ID
          name: String @external
          reviews: [Review] @requires(fields: "name")
        }

        type Review @key(fields: "rid") {
          rid: ID
          body: String
          author: User @provides(fields: "name")
        }
        "#,
    )
    .expect("valid subgraph");
    merge_subgraphs(&[accounts, reviews])
        .expect("composition should succeed")
        .schema
}

fn composite(schema: &FederationSchema, name: &str) -> CompositeTypeDefinitionPosition {
    schema
        .get_type(&Name::new(name).unwrap())
        .unwrap()
        .try_into()
        .unwrap()
}

fn parse_operation(source: &str) -> (ast::Document, Vec<Node<ast::FragmentDefinition>>) {
    let document = ast::Document::parse(source, "op.graphql").expect("valid operation");
    let fragments = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::Definition::FragmentDefinition(fragment) => Some(fragment.clone()),
            _ => None,
        })
        .collect();
    (document, fragments)
}

fn operation(document: &ast::Document) -> &Node<ast::OperationDefinition> {
    document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            ast::Definition::OperationDefinition(operation) => Some(operation),
            _ => None,
        })
        .expect("operation present")
}

fn field_names(fields: &FieldSet) -> Vec<&str> {
    fields.iter().map(|field| field.node.name.as_str()).collect()
}

const OPERATION: &str = r#"
    query Me($id: ID) {
      me {
        name
      }
      user(id: $id) {
        id
      }
      account {
        ... on User {
          name
        }
        ...adminFields
      }
    }

    fragment adminFields on Admin {
      level
    }
"#;

#[test]
fn context_indexes_variables_and_resolves_field_defs() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation(OPERATION);
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    assert!(context.variable_definition(&name!("id")).is_some());
    assert!(context.variable_definition(&name!("other")).is_none());

    let query = composite(&schema, "Query");
    let ast::Selection::Field(me) = &operation.selection_set[0] else {
        panic!("expected a field");
    };
    let me_def = context.field_def(&query, me).unwrap();
    assert_eq!(
        me_def.ty.as_ref().map(|ty| ty.inner_named_type().as_str()),
        Some("User")
    );

    let usages = context.variable_usages(&operation.selection_set).unwrap();
    assert_eq!(usages.keys().map(|name| name.as_str()).collect::<Vec<_>>(), vec!["id"]);
}

#[test]
fn field_def_folds_in_meta_fields_and_rejects_unknown_fields() {
    let schema = test_supergraph();
    let (document, fragments) =
        parse_operation("{ __typename __schema { description } nope }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let query = composite(&schema, "Query");
    let account = composite(&schema, "Account");

    let ast::Selection::Field(typename) = &operation.selection_set[0] else {
        panic!("expected a field");
    };
    let ast::Selection::Field(schema_field) = &operation.selection_set[1] else {
        panic!("expected a field");
    };
    let ast::Selection::Field(nope) = &operation.selection_set[2] else {
        panic!("expected a field");
    };

    // __typename works on any composite type, unions included.
    assert!(context.field_def(&account, typename).is_ok());
    assert!(context.field_def(&query, schema_field).is_ok());
    // __schema only exists on the query root.
    assert!(context.field_def(&account, schema_field).is_err());
    let error = context.field_def(&query, nope).unwrap_err();
    assert!(error.to_string().starts_with("Cannot query field"));
}

#[test]
fn unknown_variable_references_fail() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ user(id: $missing) { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let error = context
        .variable_usages(&operation.selection_set)
        .unwrap_err();
    assert!(error.to_string().contains("$missing"));
}

#[test]
fn possible_types_of_objects_and_unions() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    let account_types = context.possible_types(&name!("Account")).unwrap();
    assert_eq!(
        account_types.iter().map(|name| name.as_str()).collect::<Vec<_>>(),
        vec!["User", "Admin"]
    );
    let user_types = context.possible_types(&name!("User")).unwrap();
    assert_eq!(
        user_types.iter().map(|name| name.as_str()).collect::<Vec<_>>(),
        vec!["User"]
    );
}

#[test]
fn service_ownership_follows_join_directives() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    let user = ObjectTypeDefinitionPosition {
        type_name: name!("User"),
    };
    let review = ObjectTypeDefinitionPosition {
        type_name: name!("Review"),
    };
    assert_eq!(context.base_service(&user).unwrap(), "Subgraph1");
    assert_eq!(context.base_service(&review).unwrap(), "Subgraph2");

    let reviews_def = ObjectFieldDefinitionPosition {
        type_name: name!("User"),
        field_name: name!("reviews"),
    }
    .get(&schema)
    .unwrap()
    .clone();
    assert_eq!(
        context.owning_service(&user, &reviews_def).unwrap(),
        "Subgraph2"
    );

    // A field with no @join__field falls back to the type's base service.
    let id_def = ObjectFieldDefinitionPosition {
        type_name: name!("User"),
        field_name: name!("id"),
    }
    .get(&schema)
    .unwrap()
    .clone();
    assert_eq!(context.owning_service(&user, &id_def).unwrap(), "Subgraph1");
}

#[test]
fn collecting_an_empty_selection_set_yields_no_fields() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let scope = Scope::create(composite(&schema, "Query"));
    assert!(collect_fields(&context, scope, &[]).unwrap().is_empty());
}

#[test]
fn collect_fields_refines_scopes_through_fragments() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation(OPERATION);
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    let ast::Selection::Field(account_field) = &operation.selection_set[2] else {
        panic!("expected a field");
    };
    let scope = Scope::create(composite(&schema, "Account"));
    let fields = collect_fields(&context, scope, &account_field.selection_set).unwrap();
    assert_eq!(field_names(&fields), vec!["name", "level"]);
    assert_eq!(fields[0].scope.parent_type().type_name().as_str(), "User");
    assert_eq!(fields[1].scope.parent_type().type_name().as_str(), "Admin");
}

#[test]
fn fragments_disjoint_from_the_scope_are_pruned() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ ... on Admin { level } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    // Scope narrowed to User; an Admin fragment can't produce any runtime type.
    let scope = Scope::create(composite(&schema, "Account"))
        .refine(&context, composite(&schema, "User"), None)
        .unwrap();
    let fields = collect_fields(&context, scope, &operation.selection_set).unwrap();
    assert!(fields.is_empty());
}

#[test]
fn unresolved_fragment_spreads_are_skipped() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ ...nope }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let scope = Scope::create(composite(&schema, "Query"));
    let fields = collect_fields(&context, scope, &operation.selection_set).unwrap();
    assert!(fields.is_empty());
}

#[test]
fn key_fields_start_with_typename_and_respect_fetch_all() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let scope = Scope::create(composite(&schema, "User"));

    let all = key_fields(&context, &scope, "Subgraph2", true).unwrap();
    assert_eq!(field_names(&all), vec!["__typename", "id", "sku"]);

    let first = key_fields(&context, &scope, "Subgraph2", false).unwrap();
    assert_eq!(field_names(&first), vec!["__typename", "id"]);

    // fetch_all = true always yields a superset (by coordinate) of fetch_all = false.
    let all_names = field_names(&all);
    for name in field_names(&first) {
        assert!(all_names.contains(&name));
    }
}

#[test]
fn required_fields_append_the_requires_selection() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let scope = Scope::create(composite(&schema, "User"));
    let reviews_def = ObjectFieldDefinitionPosition {
        type_name: name!("User"),
        field_name: name!("reviews"),
    }
    .get(&schema)
    .unwrap()
    .clone();

    let fields = required_fields(&context, &scope, &reviews_def, "Subgraph2").unwrap();
    assert_eq!(field_names(&fields), vec!["__typename", "id", "name"]);
}

#[test]
fn provided_fields_cover_all_keys_plus_the_provides_selection() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();
    let author_def = ObjectFieldDefinitionPosition {
        type_name: name!("Review"),
        field_name: name!("author"),
    }
    .get(&schema)
    .unwrap()
    .clone();

    let fields = provided_fields(&context, &author_def, "Subgraph2").unwrap();
    assert_eq!(field_names(&fields), vec!["__typename", "id", "sku", "name"]);

    // Leaf return types provide nothing.
    let body_def = ObjectFieldDefinitionPosition {
        type_name: name!("Review"),
        field_name: name!("body"),
    }
    .get(&schema)
    .unwrap()
    .clone();
    assert!(provided_fields(&context, &body_def, "Subgraph2")
        .unwrap()
        .is_empty());
}

#[test]
fn refinement_only_narrows_possible_runtime_types() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    let account = Scope::create(composite(&schema, "Account"));
    let account_types = account.possible_runtime_types(&context).unwrap().clone();
    let user = account
        .refine(&context, composite(&schema, "User"), None)
        .unwrap();
    let user_types = user.possible_runtime_types(&context).unwrap();
    assert!(user_types.is_subset(&account_types));

    // Refining by a super-type without directives is a no-op.
    let unchanged = user
        .refine(&context, composite(&schema, "Account"), None)
        .unwrap();
    assert!(Rc::ptr_eq(&unchanged, &user));
}

#[test]
fn equal_scopes_share_identity_keys_and_hashes() {
    let schema = test_supergraph();
    let (document, fragments) = parse_operation("{ me { id } }");
    let operation = operation(&document);
    let context = QueryPlanningContext::new(&schema, operation, &fragments).unwrap();

    let mut first = Directive::new(name!("custom"));
    first.arguments.insert(name!("a"), Value::Int(1));
    first.arguments.insert(name!("b"), Value::Int(2));
    let mut second = Directive::new(name!("custom"));
    second.arguments.insert(name!("b"), Value::Int(2));
    second.arguments.insert(name!("a"), Value::Int(1));

    let left = Scope::create(composite(&schema, "Account"))
        .refine(&context, composite(&schema, "User"), Some(vec![first]))
        .unwrap();
    let right = Scope::create(composite(&schema, "Account"))
        .refine(&context, composite(&schema, "User"), Some(vec![second]))
        .unwrap();

    assert!(left.equals(&right));
    assert_eq!(
        left.identity_key(&context).unwrap(),
        right.identity_key(&context).unwrap()
    );
    assert_eq!(left.hash_code(), right.hash_code());

    let other = Scope::create(composite(&schema, "Account"))
        .refine(&context, composite(&schema, "User"), None)
        .unwrap();
    assert!(!left.equals(&other));
}
