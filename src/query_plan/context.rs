use crate::error::{FederationError, SingleFederationError};
use crate::link::join_spec::{
    JOIN_FIELD_DIRECTIVE_NAME, JOIN_GRAPH_ARGUMENT_NAME, JOIN_GRAPH_DIRECTIVE_NAME,
    JOIN_GRAPH_ENUM_NAME, JOIN_NAME_ARGUMENT_NAME, JOIN_TYPE_DIRECTIVE_NAME,
};
use crate::schema::definitions::{FieldDefinition, Type, TypeDefinition};
use crate::schema::position::{CompositeTypeDefinitionPosition, ObjectTypeDefinitionPosition};
use crate::schema::FederationSchema;
use crate::values::Directive;
use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::schema::Name;
use apollo_compiler::Node;
use indexmap::{IndexMap, IndexSet};

pub(crate) const TYPENAME_FIELD_NAME: Name = name!("__typename");
const SCHEMA_FIELD_NAME: Name = name!("__schema");
const TYPE_FIELD_NAME: Name = name!("__type");

/// Everything the field collector needs about one incoming operation: the composed schema,
/// the operation, its fragments by name, the variable-definition index, and the mapping
/// from `join__Graph` enum values to service names.
///
/// The operation is assumed to have passed GraphQL validation already; in particular
/// variable shadowing rules are not re-checked here.
pub struct QueryPlanningContext<'a> {
    schema: &'a FederationSchema,
    operation: &'a ast::OperationDefinition,
    fragments: IndexMap<Name, &'a Node<ast::FragmentDefinition>>,
    variable_definitions: IndexMap<Name, &'a Node<ast::VariableDefinition>>,
    graph_services: IndexMap<Name, String>,
}

impl<'a> QueryPlanningContext<'a> {
    pub fn new(
        schema: &'a FederationSchema,
        operation: &'a ast::OperationDefinition,
        fragments: &'a [Node<ast::FragmentDefinition>],
    ) -> Result<QueryPlanningContext<'a>, FederationError> {
        let mut variable_definitions = IndexMap::new();
        for variable in &operation.variables {
            variable_definitions.insert(variable.name.clone(), variable);
        }
        let fragments = fragments
            .iter()
            .map(|fragment| (fragment.name.clone(), fragment))
            .collect();

        // The join__Graph enum carries the graph-name -> service-name mapping via its
        // @join__graph applications. A supergraph without it (hand-written fixtures) falls
        // back to the bare enum names.
        let mut graph_services = IndexMap::new();
        if let Some(TypeDefinition::Enum(graph_enum)) = schema.types.get(&JOIN_GRAPH_ENUM_NAME) {
            for value in graph_enum.values.values() {
                if let Some(join_graph) = value.directives.get(&JOIN_GRAPH_DIRECTIVE_NAME) {
                    if let Some(service_name) = join_graph.string_argument(&JOIN_NAME_ARGUMENT_NAME)
                    {
                        graph_services.insert(value.value.clone(), service_name.to_owned());
                    }
                }
            }
        }

        Ok(QueryPlanningContext {
            schema,
            operation,
            fragments,
            variable_definitions,
            graph_services,
        })
    }

    pub fn schema(&self) -> &'a FederationSchema {
        self.schema
    }

    pub fn operation(&self) -> &'a ast::OperationDefinition {
        self.operation
    }

    pub fn fragment(&self, name: &Name) -> Option<&'a Node<ast::FragmentDefinition>> {
        self.fragments.get(name).copied()
    }

    pub fn variable_definition(&self, name: &Name) -> Option<&'a Node<ast::VariableDefinition>> {
        self.variable_definitions.get(name).copied()
    }

    /// Looks up the definition a field node resolves to on the given parent type, folding in
    /// the `__typename` / `__schema` / `__type` meta-fields.
    pub fn field_def(
        &self,
        parent_type: &CompositeTypeDefinitionPosition,
        field: &ast::Field,
    ) -> Result<FieldDefinition, FederationError> {
        if field.name == TYPENAME_FIELD_NAME {
            return Ok(self.typename_field_def());
        }
        let is_query_root = self
            .schema
            .schema_definition()
            .query
            .as_ref()
            .is_some_and(|query| query == parent_type.type_name());
        if is_query_root && field.name == SCHEMA_FIELD_NAME {
            return Ok(meta_field(SCHEMA_FIELD_NAME, name!("__Schema")));
        }
        if is_query_root && field.name == TYPE_FIELD_NAME {
            return Ok(meta_field(TYPE_FIELD_NAME, name!("__Type")));
        }
        let definition = match parent_type {
            CompositeTypeDefinitionPosition::Object(position) => {
                position.get(self.schema)?.fields.get(&field.name).cloned()
            }
            // Union types only carry the __typename meta-field handled above.
            CompositeTypeDefinitionPosition::Union(_) => None,
        };
        definition.ok_or_else(|| {
            SingleFederationError::CannotQueryField {
                field_name: field.name.to_string(),
                type_name: parent_type.type_name().to_string(),
            }
            .into()
        })
    }

    pub(crate) fn typename_field_def(&self) -> FieldDefinition {
        meta_field(TYPENAME_FIELD_NAME, name!("String"))
    }

    /// The possible runtime object types of a named composite type: the type itself for an
    /// object type, the member set for a union.
    pub fn possible_types(&self, type_name: &Name) -> Result<IndexSet<Name>, FederationError> {
        let position: CompositeTypeDefinitionPosition =
            self.schema.get_type(type_name)?.try_into()?;
        Ok(self
            .schema
            .possible_runtime_types(position)?
            .into_iter()
            .map(|object| object.type_name)
            .collect())
    }

    /// Collects the variables used anywhere in a sub-operation, resolved to their
    /// definitions. A usage with no matching definition is a planner error.
    pub fn variable_usages(
        &self,
        selections: &[ast::Selection],
    ) -> Result<IndexMap<Name, &'a Node<ast::VariableDefinition>>, FederationError> {
        let mut used = IndexSet::new();
        let mut seen_fragments = IndexSet::new();
        self.collect_variables_in_selections(selections, &mut used, &mut seen_fragments);
        let mut usages = IndexMap::new();
        for name in used {
            let definition = self.variable_definitions.get(&name).ok_or_else(|| {
                SingleFederationError::UnknownVariable {
                    name: name.to_string(),
                }
            })?;
            usages.insert(name, *definition);
        }
        Ok(usages)
    }

    fn collect_variables_in_selections(
        &self,
        selections: &[ast::Selection],
        used: &mut IndexSet<Name>,
        seen_fragments: &mut IndexSet<Name>,
    ) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => {
                    for argument in &field.arguments {
                        collect_variables_in_value(&argument.value, used);
                    }
                    collect_variables_in_directives(&field.directives, used);
                    self.collect_variables_in_selections(
                        &field.selection_set,
                        used,
                        seen_fragments,
                    );
                }
                ast::Selection::InlineFragment(fragment) => {
                    collect_variables_in_directives(&fragment.directives, used);
                    self.collect_variables_in_selections(
                        &fragment.selection_set,
                        used,
                        seen_fragments,
                    );
                }
                ast::Selection::FragmentSpread(spread) => {
                    collect_variables_in_directives(&spread.directives, used);
                    if !seen_fragments.insert(spread.fragment_name.clone()) {
                        continue;
                    }
                    if let Some(fragment) = self.fragment(&spread.fragment_name) {
                        collect_variables_in_directives(&fragment.directives, used);
                        self.collect_variables_in_selections(
                            &fragment.selection_set,
                            used,
                            seen_fragments,
                        );
                    }
                }
            }
        }
    }

    /// The service owning a type: the graph of its first `@join__type` application.
    pub fn base_service(
        &self,
        type_position: &ObjectTypeDefinitionPosition,
    ) -> Result<String, FederationError> {
        let type_ = type_position.get(self.schema)?;
        let join_type = type_
            .directives
            .get(&JOIN_TYPE_DIRECTIVE_NAME)
            .ok_or_else(|| {
                SingleFederationError::InvalidSupergraph {
                    message: format!(
                        "Type \"{}\" has no @join__type application",
                        type_position
                    ),
                }
            })?;
        let graph = join_type
            .enum_argument(&JOIN_GRAPH_ARGUMENT_NAME)
            .ok_or_else(|| {
                SingleFederationError::InvalidSupergraph {
                    message: format!(
                        "@join__type on type \"{}\" is missing its graph argument",
                        type_position
                    ),
                }
            })?;
        Ok(self.service_name(graph))
    }

    /// The service resolving a field: its declared `@join__field(graph:)`, falling back to
    /// the parent type's base service.
    pub fn owning_service(
        &self,
        type_position: &ObjectTypeDefinitionPosition,
        field_definition: &FieldDefinition,
    ) -> Result<String, FederationError> {
        if let Some(graph) = field_definition
            .directives
            .get(&JOIN_FIELD_DIRECTIVE_NAME)
            .and_then(|join_field| join_field.enum_argument(&JOIN_GRAPH_ARGUMENT_NAME))
        {
            return Ok(self.service_name(graph));
        }
        self.base_service(type_position)
    }

    pub(crate) fn service_name(&self, graph: &Name) -> String {
        self.graph_services
            .get(graph)
            .cloned()
            .unwrap_or_else(|| graph.to_string())
    }

    /// Whether a `join__Graph` enum value designates the given service (by mapped service
    /// name, or by the bare enum name for hand-written supergraphs).
    pub(crate) fn graph_matches_service(&self, graph: &Name, service: &str) -> bool {
        if graph.as_str() == service {
            return true;
        }
        self.graph_services
            .get(graph)
            .is_some_and(|name| name == service)
    }

    /// The `@join__field` application on this field for the given service, if any.
    pub(crate) fn join_field_for_service<'d>(
        &self,
        field_definition: &'d FieldDefinition,
        service: &str,
    ) -> Option<&'d Directive> {
        field_definition
            .directives
            .get_all(&JOIN_FIELD_DIRECTIVE_NAME)
            .find(|join_field| {
                join_field
                    .enum_argument(&JOIN_GRAPH_ARGUMENT_NAME)
                    .is_some_and(|graph| self.graph_matches_service(graph, service))
            })
    }
}

fn meta_field(name: Name, type_name: Name) -> FieldDefinition {
    FieldDefinition {
        name,
        ty: Some(Type::Named(type_name).non_null()),
        arguments: IndexMap::new(),
        directives: Default::default(),
    }
}

fn collect_variables_in_value(value: &ast::Value, used: &mut IndexSet<Name>) {
    match value {
        ast::Value::Variable(name) => {
            used.insert(name.clone());
        }
        ast::Value::List(values) => {
            for value in values {
                collect_variables_in_value(value, used);
            }
        }
        ast::Value::Object(entries) => {
            for (_, value) in entries {
                collect_variables_in_value(value, used);
            }
        }
        _ => {}
    }
}

fn collect_variables_in_directives(directives: &ast::DirectiveList, used: &mut IndexSet<Name>) {
    for directive in directives.iter() {
        for argument in &directive.arguments {
            collect_variables_in_value(&argument.value, used);
        }
    }
}
