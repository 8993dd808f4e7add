use crate::error::{CompositionError, CompositionHint, FederationError};
use crate::link::federation_spec::{
    fields_argument, key_directive_arguments, FEDERATION_KEY_DIRECTIVE_NAME,
    FEDERATION_PROVIDES_DIRECTIVE_NAME, FEDERATION_REQUIRES_DIRECTIVE_NAME,
};
use crate::link::join_spec::{
    add_core_feature_core, add_core_feature_join, graph_enum_name, join_field_directive,
    join_type_directive,
};
use crate::merge::overrides::{analyze_overrides, FieldCoordinate, OverrideDecision};
use crate::schema::definitions::{
    FieldDefinition, InputObjectType, ObjectType, SchemaRootDefinitionKind, TypeDefinition,
    TypeDefinitionKind, UnionType,
};
use crate::schema::position::{
    InputObjectTypeDefinitionPosition, ObjectFieldDefinitionPosition,
    ObjectTypeDefinitionPosition, ScalarTypeDefinitionPosition, SchemaRootDefinitionPosition,
    UnionTypeDefinitionPosition,
};
use crate::schema::{FederationSchema, FrozenFederationSchema};
use crate::subgraph::Subgraph;
use apollo_compiler::schema::Name;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use std::fmt::{Debug, Formatter};
use strum::IntoEnumIterator;

pub(crate) mod overrides;

/// A successful composition: the printed supergraph SDL, the frozen supergraph schema, and
/// any hints produced along the way.
#[derive(Debug)]
pub struct MergeSuccess {
    pub supergraph_sdl: String,
    pub schema: FrozenFederationSchema,
    pub hints: Vec<CompositionHint>,
}

/// A failed composition. The error list is never empty and is deterministic for a given
/// subgraph list; composition accumulates every recoverable error before giving up.
pub struct MergeFailure {
    pub errors: Vec<CompositionError>,
    pub hints: Vec<CompositionHint>,
}

impl Debug for MergeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("MergeFailure")
            .field("errors", &self.errors)
            .field("hints", &self.hints)
            .finish()
    }
}

pub fn merge_subgraphs(subgraphs: &[Subgraph]) -> Result<MergeSuccess, MergeFailure> {
    Merger::new(subgraphs).merge()
}

struct Merger<'a> {
    subgraphs: &'a [Subgraph],
    graph_names: Vec<Name>,
    root_type_names: IndexSet<Name>,
    overrides: IndexMap<FieldCoordinate, OverrideDecision>,
    /// Which subgraphs effectively resolve each field, after override rewriting and
    /// excluding @external declarations. Input to the field-sharing validation.
    resolvers: IndexMap<FieldCoordinate, Vec<usize>>,
    errors: Vec<CompositionError>,
    hints: Vec<CompositionHint>,
    supergraph: FederationSchema,
}

impl<'a> Merger<'a> {
    fn new(subgraphs: &'a [Subgraph]) -> Self {
        Merger {
            subgraphs,
            graph_names: subgraphs
                .iter()
                .map(|subgraph| graph_enum_name(&subgraph.name))
                .collect(),
            root_type_names: IndexSet::new(),
            overrides: IndexMap::new(),
            resolvers: IndexMap::new(),
            errors: Vec::new(),
            hints: Vec::new(),
            supergraph: FederationSchema::new(),
        }
    }

    fn merge(mut self) -> Result<MergeSuccess, MergeFailure> {
        if let Err(error) = self.check_subgraph_names() {
            return Err(MergeFailure {
                errors: vec![error.into()],
                hints: self.hints,
            });
        }

        let analysis = analyze_overrides(self.subgraphs);
        self.overrides = analysis.decisions;
        self.errors.extend(analysis.errors);
        self.hints.extend(analysis.hints);

        if let Err(error) = self.build_supergraph() {
            self.errors.push(error.into());
        }
        self.validate_field_sharing();

        if !self.errors.is_empty() {
            return Err(MergeFailure {
                errors: self.errors,
                hints: self.hints,
            });
        }
        let supergraph_sdl = self.supergraph.to_string();
        Ok(MergeSuccess {
            supergraph_sdl,
            schema: self.supergraph.freeze(),
            hints: self.hints,
        })
    }

    fn check_subgraph_names(&self) -> Result<(), FederationError> {
        if self.subgraphs.is_empty() {
            return Err(FederationError::internal(
                "Cannot compose an empty list of subgraphs",
            ));
        }
        for ((left, left_graph), (right, right_graph)) in self
            .subgraphs
            .iter()
            .zip(&self.graph_names)
            .tuple_combinations()
        {
            if left.name == right.name || left_graph == right_graph {
                return Err(FederationError::internal(format!(
                    "Subgraph names \"{}\" and \"{}\" are not distinct",
                    left.name, right.name
                )));
            }
        }
        Ok(())
    }

    fn build_supergraph(&mut self) -> Result<(), FederationError> {
        add_core_feature_core(&mut self.supergraph)?;
        add_core_feature_join(&mut self.supergraph, self.subgraphs)?;
        self.add_type_shells()?;
        self.merge_schema_roots()?;
        for index in 0..self.subgraphs.len() {
            self.merge_subgraph(index)?;
        }
        Ok(())
    }

    /// One shell per type name, so every cross-type reference resolves no matter which
    /// subgraph contributes it first. Merge order is subgraph order, with each subgraph's
    /// types in their insertion order.
    fn add_type_shells(&mut self) -> Result<(), FederationError> {
        for subgraph in self.subgraphs {
            for (type_name, type_) in &subgraph.schema.types {
                if !is_mergeable_type(type_name) {
                    continue;
                }
                let existing = self.supergraph.type_kind(type_name);
                match (existing, type_.kind()) {
                    (None, TypeDefinitionKind::Scalar) => {
                        self.supergraph.add_scalar_type(type_name.clone())?;
                    }
                    (None, TypeDefinitionKind::Object) => {
                        self.supergraph.add_object_type(type_name.clone())?;
                    }
                    (None, TypeDefinitionKind::Union) => {
                        self.supergraph.add_union_type(type_name.clone())?;
                    }
                    (None, TypeDefinitionKind::InputObject) => {
                        self.supergraph.add_input_object_type(type_name.clone())?;
                    }
                    (None, TypeDefinitionKind::Enum) | (Some(_), _) => {
                        // Same-kind re-declarations merge below.
                        // TODO: report a dedicated composition error when two subgraphs
                        // declare the same type name with different kinds; the error
                        // taxonomy doesn't cover that case yet, so the first kind wins.
                    }
                }
            }
        }
        Ok(())
    }

    fn merge_schema_roots(&mut self) -> Result<(), FederationError> {
        for root_kind in SchemaRootDefinitionKind::iter() {
            let position = SchemaRootDefinitionPosition { root_kind };
            for subgraph in self.subgraphs {
                let Some(root_type) = subgraph.schema.schema_definition().root(root_kind) else {
                    continue;
                };
                self.root_type_names.insert(root_type.clone());
                if position.try_get(&self.supergraph).is_none() {
                    position.insert(&mut self.supergraph, root_type.clone())?;
                }
                // TODO: report a mismatch when another subgraph binds this root to a
                // differently-named type; for now the first binding wins.
            }
        }
        Ok(())
    }

    fn merge_subgraph(&mut self, index: usize) -> Result<(), FederationError> {
        let subgraph = &self.subgraphs[index];
        for (type_name, type_) in &subgraph.schema.types {
            if !is_mergeable_type(type_name) {
                continue;
            }
            match type_ {
                TypeDefinition::Object(object) => {
                    self.merge_object_type(index, object)?;
                }
                TypeDefinition::Union(union_) => {
                    self.merge_union_type(index, union_)?;
                }
                TypeDefinition::InputObject(input_object) => {
                    self.merge_input_object_type(index, input_object)?;
                }
                TypeDefinition::Scalar(_) => {
                    let position = ScalarTypeDefinitionPosition {
                        type_name: type_name.clone(),
                    };
                    if position.try_get(&self.supergraph).is_some()
                        && !self.supergraph.is_builtin_scalar(type_name)
                    {
                        position.insert_directive(
                            &mut self.supergraph,
                            join_type_directive(&self.graph_names[index], None),
                        )?;
                    }
                }
                TypeDefinition::Enum(_) => {
                    // The parser rejects enum definitions, so subgraph schemas never get
                    // here unless built programmatically; those types are not merged.
                }
            }
        }
        Ok(())
    }

    fn merge_object_type(
        &mut self,
        index: usize,
        object: &ObjectType,
    ) -> Result<(), FederationError> {
        let graph = self.graph_names[index].clone();
        let subgraph = &self.subgraphs[index];
        let position = ObjectTypeDefinitionPosition {
            type_name: object.name.clone(),
        };
        if position.try_get(&self.supergraph).is_none() {
            return Ok(());
        }

        let key_directives: Vec<_> = object
            .directives
            .get_all(&FEDERATION_KEY_DIRECTIVE_NAME)
            .collect();
        if key_directives.is_empty() {
            position.insert_directive(&mut self.supergraph, join_type_directive(&graph, None))?;
        } else {
            for key_directive in &key_directives {
                let arguments = key_directive_arguments(key_directive)?;
                position.insert_directive(
                    &mut self.supergraph,
                    join_type_directive(&graph, Some(arguments.fields)),
                )?;
            }
        }
        let is_entity = !key_directives.is_empty();
        let is_root = self.root_type_names.contains(&object.name);

        for (field_name, field) in &object.fields {
            let coordinate = FieldCoordinate {
                type_name: object.name.clone(),
                field_name: field_name.clone(),
            };
            let field_position = position.field(field_name.clone());
            let decision = self.overrides.get(&coordinate).copied();
            let is_override_loser = decision.is_some_and(|decision| decision.loser == index);
            let is_override_winner = decision.is_some_and(|decision| decision.winner == index);
            let is_key_field = subgraph.metadata().is_key_field(&field_position);
            let is_external = subgraph.metadata().is_external(&field_position);

            if is_override_loser {
                // The overridden subgraph no longer resolves this field. A key field still
                // has to be advertised so the subgraph can be reached through its key, so it
                // stays in the supergraph marked external for this graph.
                if is_key_field {
                    self.ensure_field(&field_position, field)?;
                    field_position.insert_directive(
                        &mut self.supergraph,
                        join_field_directive(&graph, None, None, true),
                    )?;
                }
                continue;
            }

            self.ensure_field(&field_position, field)?;
            if is_override_winner {
                // On declaration mismatches the overriding subgraph's declaration wins.
                self.force_field_type(&field_position, field)?;
            }
            if !is_external {
                self.resolvers.entry(coordinate).or_default().push(index);
            }

            let emits_join_field = (is_entity || is_root) && (!is_key_field || is_override_winner);
            if emits_join_field {
                let requires = field
                    .directives
                    .get(&FEDERATION_REQUIRES_DIRECTIVE_NAME)
                    .map(fields_argument)
                    .transpose()?;
                let provides = field
                    .directives
                    .get(&FEDERATION_PROVIDES_DIRECTIVE_NAME)
                    .map(fields_argument)
                    .transpose()?;
                field_position.insert_directive(
                    &mut self.supergraph,
                    join_field_directive(&graph, requires, provides, is_external),
                )?;
            }
        }
        Ok(())
    }

    /// Inserts the field declaration into the supergraph if no subgraph contributed it yet.
    /// Supergraph fields carry only join directives, so the subgraph's own applied
    /// directives are not copied over.
    fn ensure_field(
        &mut self,
        field_position: &ObjectFieldDefinitionPosition,
        field: &FieldDefinition,
    ) -> Result<(), FederationError> {
        if field_position.try_get(&self.supergraph).is_some() {
            return Ok(());
        }
        let arguments = field
            .arguments
            .values()
            .map(|argument| {
                (
                    argument.name.clone(),
                    crate::schema::definitions::ArgumentDefinition {
                        name: argument.name.clone(),
                        ty: argument.ty.clone(),
                        default_value: argument.default_value.clone(),
                        directives: Default::default(),
                    },
                )
            })
            .collect();
        field_position.insert(
            &mut self.supergraph,
            FieldDefinition {
                name: field.name.clone(),
                ty: field.ty.clone(),
                arguments,
                directives: Default::default(),
            },
        )
    }

    fn force_field_type(
        &mut self,
        field_position: &ObjectFieldDefinitionPosition,
        field: &FieldDefinition,
    ) -> Result<(), FederationError> {
        let Some(ty) = field.ty.clone() else {
            return Ok(());
        };
        let current = field_position.get(&self.supergraph)?;
        if current.ty.as_ref() != Some(&ty) {
            field_position.set_type(&mut self.supergraph, ty)?;
        }
        Ok(())
    }

    fn merge_union_type(&mut self, index: usize, union_: &UnionType) -> Result<(), FederationError> {
        let position = UnionTypeDefinitionPosition {
            type_name: union_.name.clone(),
        };
        if position.try_get(&self.supergraph).is_none() {
            return Ok(());
        }
        position.insert_directive(
            &mut self.supergraph,
            join_type_directive(&self.graph_names[index], None),
        )?;
        for member in &union_.members {
            let already_member = position.get(&self.supergraph)?.members.contains(member);
            if !already_member {
                position.insert_member(&mut self.supergraph, member.clone())?;
            }
        }
        Ok(())
    }

    fn merge_input_object_type(
        &mut self,
        index: usize,
        input_object: &InputObjectType,
    ) -> Result<(), FederationError> {
        let position = InputObjectTypeDefinitionPosition {
            type_name: input_object.name.clone(),
        };
        if position.try_get(&self.supergraph).is_none() {
            return Ok(());
        }
        position.insert_directive(
            &mut self.supergraph,
            join_type_directive(&self.graph_names[index], None),
        )?;
        for (field_name, field) in &input_object.fields {
            let field_position = position.field(field_name.clone());
            if field_position.try_get(&self.supergraph).is_some() {
                // TODO: check for type and default-value mismatches between subgraphs once
                // the error taxonomy covers input objects.
                continue;
            }
            field_position.insert(
                &mut self.supergraph,
                crate::schema::definitions::InputFieldDefinition {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    default_value: field.default_value.clone(),
                    directives: Default::default(),
                },
            )?;
        }
        Ok(())
    }

    /// After override rewriting, a field resolved by more than one subgraph must be
    /// shareable in every subgraph that resolves it.
    fn validate_field_sharing(&mut self) {
        for (coordinate, resolver_indices) in &self.resolvers {
            if resolver_indices.len() <= 1 {
                continue;
            }
            let field_position = ObjectFieldDefinitionPosition {
                type_name: coordinate.type_name.clone(),
                field_name: coordinate.field_name.clone(),
            };
            let non_shareable: Vec<usize> = resolver_indices
                .iter()
                .copied()
                .filter(|index| {
                    !self.subgraphs[*index]
                        .metadata()
                        .is_shareable(&field_position)
                })
                .collect();
            if non_shareable.is_empty() {
                continue;
            }
            let resolved_from = resolver_indices
                .iter()
                .map(|index| format!("\"{}\"", self.subgraphs[*index].name))
                .join(" and ");
            let non_shareable_in = if non_shareable.len() == resolver_indices.len() {
                "all of them".to_owned()
            } else {
                format!(
                    "subgraph{} {}",
                    if non_shareable.len() == 1 { "" } else { "s" },
                    non_shareable
                        .iter()
                        .map(|index| format!("\"{}\"", self.subgraphs[*index].name))
                        .join(" and ")
                )
            };
            self.errors.push(CompositionError::InvalidFieldSharing {
                message: format!(
                    "Non-shareable field \"{}\" is resolved from multiple subgraphs: it is resolved from subgraphs {} and defined as non-shareable in {}",
                    coordinate, resolved_from, non_shareable_in,
                ),
            });
        }
    }
}

const FEDERATION_RESERVED_TYPES: [&str; 3] = ["_Any", "_Entity", "_Service"];

fn is_mergeable_type(type_name: &Name) -> bool {
    let name = type_name.as_str();
    if name.starts_with("federation__")
        || name.starts_with("link__")
        || name.starts_with("join__")
        || name.starts_with("core__")
    {
        return false;
    }
    !FEDERATION_RESERVED_TYPES.contains(&name)
}
