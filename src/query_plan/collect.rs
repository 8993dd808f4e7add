use crate::error::FederationError;
use crate::link::join_spec::{
    JOIN_GRAPH_ARGUMENT_NAME, JOIN_KEY_ARGUMENT_NAME, JOIN_PROVIDES_ARGUMENT_NAME,
    JOIN_REQUIRES_ARGUMENT_NAME, JOIN_TYPE_DIRECTIVE_NAME,
};
use crate::query_plan::context::{QueryPlanningContext, TYPENAME_FIELD_NAME};
use crate::query_plan::scope::Scope;
use crate::query_plan::{CollectedField, FieldSet};
use crate::schema::definitions::FieldDefinition;
use crate::schema::field_set::parse_field_set;
use crate::schema::position::{CompositeTypeDefinitionPosition, ObjectTypeDefinitionPosition};
use crate::values::Directive;
use apollo_compiler::ast;
use apollo_compiler::schema::Name;
use apollo_compiler::Node;
use std::rc::Rc;

/// Walks a selection set against a scope, producing the flat, ordered field set.
///
/// Inline fragments refine the scope by their type condition (defaulting to the scope's
/// parent type); fragment spreads resolve through the context's fragment map, and spreads
/// with no matching fragment are skipped. Either way, a refined scope with no possible
/// runtime types prunes the whole branch.
pub fn collect_fields(
    context: &QueryPlanningContext,
    scope: Rc<Scope>,
    selections: &[ast::Selection],
) -> Result<FieldSet, FederationError> {
    let mut fields = FieldSet::new();
    collect_fields_into(context, &scope, selections, &mut fields)?;
    Ok(fields)
}

fn collect_fields_into(
    context: &QueryPlanningContext,
    scope: &Rc<Scope>,
    selections: &[ast::Selection],
    fields: &mut FieldSet,
) -> Result<(), FederationError> {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                let definition = context.field_def(scope.parent_type(), field)?;
                fields.push(CollectedField {
                    scope: Rc::clone(scope),
                    node: field.clone(),
                    definition,
                });
            }
            ast::Selection::InlineFragment(fragment) => {
                let condition = fragment
                    .type_condition
                    .clone()
                    .unwrap_or_else(|| scope.parent_type().type_name().clone());
                let refined =
                    refine_scope(context, scope, &condition, &fragment.directives)?;
                if !refined.possible_runtime_types(context)?.is_empty() {
                    collect_fields_into(context, &refined, &fragment.selection_set, fields)?;
                }
            }
            ast::Selection::FragmentSpread(spread) => {
                let Some(fragment) = context.fragment(&spread.fragment_name) else {
                    continue;
                };
                let refined = refine_scope(
                    context,
                    scope,
                    &fragment.type_condition,
                    &spread.directives,
                )?;
                if !refined.possible_runtime_types(context)?.is_empty() {
                    collect_fields_into(context, &refined, &fragment.selection_set, fields)?;
                }
            }
        }
    }
    Ok(())
}

fn refine_scope(
    context: &QueryPlanningContext,
    scope: &Rc<Scope>,
    condition: &Name,
    directives: &ast::DirectiveList,
) -> Result<Rc<Scope>, FederationError> {
    let refined_type: CompositeTypeDefinitionPosition =
        context.schema().get_type(condition)?.try_into()?;
    let directives = if directives.is_empty() {
        None
    } else {
        Some(
            directives
                .iter()
                .map(|directive| Directive::from_ast(directive))
                .collect::<Result<Vec<_>, _>>()?,
        )
    };
    scope.refine(context, refined_type, directives)
}

/// The fields a fetch to `service` needs in order to identify the entities a scope may
/// produce: `__typename`, then for each possible runtime type the fields of its
/// `@join__type(graph:, key:)` applications for that service. With `fetch_all` every key is
/// included, otherwise only the first.
pub fn key_fields(
    context: &QueryPlanningContext,
    scope: &Rc<Scope>,
    service: &str,
    fetch_all: bool,
) -> Result<FieldSet, FederationError> {
    let mut fields = vec![CollectedField {
        scope: Rc::clone(scope),
        node: typename_node(),
        definition: context.typename_field_def(),
    }];
    let possible_types = scope.possible_runtime_types(context)?.clone();
    for type_name in possible_types {
        let position = ObjectTypeDefinitionPosition {
            type_name: type_name.clone(),
        };
        let type_ = position.get(context.schema())?;
        let mut keys = type_
            .directives
            .get_all(&JOIN_TYPE_DIRECTIVE_NAME)
            .filter(|join_type| {
                join_type
                    .enum_argument(&JOIN_GRAPH_ARGUMENT_NAME)
                    .is_some_and(|graph| context.graph_matches_service(graph, service))
            })
            .filter_map(|join_type| join_type.string_argument(&JOIN_KEY_ARGUMENT_NAME))
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if !fetch_all {
            keys.truncate(1);
        }
        for key in keys {
            let selections = parse_field_set(&key)?;
            let type_scope = scope.refine(context, position.clone().into(), None)?;
            collect_fields_into(context, &type_scope, &selections, &mut fields)?;
        }
    }
    Ok(fields)
}

/// The fields that must be fetched before `service` can resolve the given field: the
/// scope's key fields followed by the field's `@join__field(requires:)` selection.
pub fn required_fields(
    context: &QueryPlanningContext,
    scope: &Rc<Scope>,
    field_definition: &FieldDefinition,
    service: &str,
) -> Result<FieldSet, FederationError> {
    let mut fields = key_fields(context, scope, service, false)?;
    if let Some(join_field) = context.join_field_for_service(field_definition, service) {
        if let Some(requires) = join_field.string_argument(&JOIN_REQUIRES_ARGUMENT_NAME) {
            let selections = parse_field_set(requires)?;
            collect_fields_into(context, scope, &selections, &mut fields)?;
        }
    }
    Ok(fields)
}

/// The fields `service` can provide when resolving the given field: for a composite return
/// type, all of its key fields plus the field's `@join__field(provides:)` selection. Empty
/// for leaf return types.
pub fn provided_fields(
    context: &QueryPlanningContext,
    field_definition: &FieldDefinition,
    service: &str,
) -> Result<FieldSet, FederationError> {
    let Some(return_type) = field_definition
        .ty
        .as_ref()
        .map(|ty| ty.inner_named_type().clone())
    else {
        return Ok(FieldSet::new());
    };
    let Some(position) = context.schema().try_get_type(&return_type) else {
        return Ok(FieldSet::new());
    };
    let Ok(composite) = CompositeTypeDefinitionPosition::try_from(position) else {
        return Ok(FieldSet::new());
    };
    let scope = Scope::create(composite);
    let mut fields = key_fields(context, &scope, service, true)?;
    if let Some(join_field) = context.join_field_for_service(field_definition, service) {
        if let Some(provides) = join_field.string_argument(&JOIN_PROVIDES_ARGUMENT_NAME) {
            let selections = parse_field_set(provides)?;
            collect_fields_into(context, &scope, &selections, &mut fields)?;
        }
    }
    Ok(fields)
}

fn typename_node() -> Node<ast::Field> {
    Node::new(ast::Field {
        alias: None,
        name: TYPENAME_FIELD_NAME,
        arguments: Vec::new(),
        directives: Default::default(),
        selection_set: Vec::new(),
    })
}
