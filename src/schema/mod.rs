use crate::error::{FederationError, SingleFederationError};
use crate::schema::definitions::{
    InputObjectType, ObjectType, ScalarType, SchemaDefinition, TypeDefinition, TypeDefinitionKind,
    UnionType,
};
use crate::schema::position::{
    CompositeTypeDefinitionPosition, InputObjectTypeDefinitionPosition,
    ObjectTypeDefinitionPosition, ScalarTypeDefinitionPosition, TypeDefinitionPosition,
    UnionTypeDefinitionPosition,
};
use crate::schema::referencer::Referencers;
use apollo_compiler::name;
use apollo_compiler::schema::Name;
use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use std::ops::Deref;
use std::sync::Arc;

mod build;
pub mod definitions;
pub(crate) mod field_set;
pub mod position;
pub mod print;
pub mod referencer;
pub(crate) mod subgraph_metadata;

lazy_static! {
    static ref BUILT_IN_SCALAR_NAMES: IndexSet<Name> = IndexSet::from([
        name!("Int"),
        name!("Float"),
        name!("String"),
        name!("Boolean"),
        name!("ID"),
    ]);
}

/// The mutable view of a schema. All structural mutation goes through the typed positions in
/// [`position`]; the schema itself owns every element, and this ownership is what makes
/// [`FederationSchema::freeze`] a total deep copy.
#[derive(Debug, Clone)]
pub struct FederationSchema {
    pub(crate) schema_definition: SchemaDefinition,
    pub(crate) types: IndexMap<Name, TypeDefinition>,
    pub(crate) directive_definitions: IndexMap<Name, definitions::DirectiveDefinition>,
    pub(crate) builtin_scalars: IndexMap<Name, ScalarType>,
    pub(crate) referencers: Referencers,
}

impl Default for FederationSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl FederationSchema {
    pub fn new() -> Self {
        let mut builtin_scalars = IndexMap::new();
        let mut referencers = Referencers::default();
        for name in BUILT_IN_SCALAR_NAMES.iter() {
            builtin_scalars.insert(
                name.clone(),
                ScalarType {
                    name: name.clone(),
                    directives: Default::default(),
                },
            );
            referencers
                .scalar_types
                .insert(name.clone(), Default::default());
        }
        Self {
            schema_definition: SchemaDefinition::default(),
            types: IndexMap::new(),
            directive_definitions: IndexMap::new(),
            builtin_scalars,
            referencers,
        }
    }

    pub fn schema_definition(&self) -> &SchemaDefinition {
        &self.schema_definition
    }

    pub(crate) fn referencers(&self) -> &Referencers {
        &self.referencers
    }

    pub fn is_builtin_scalar(&self, name: &Name) -> bool {
        self.builtin_scalars.contains_key(name)
    }

    /// The kind of the named type, looking through both the user-type map and the built-in
    /// scalars. `None` when the schema has no such type.
    pub(crate) fn type_kind(&self, name: &Name) -> Option<TypeDefinitionKind> {
        if self.builtin_scalars.contains_key(name) {
            return Some(TypeDefinitionKind::Scalar);
        }
        self.types.get(name).map(|type_| type_.kind())
    }

    pub fn get_type(&self, name: &Name) -> Result<TypeDefinitionPosition, FederationError> {
        self.try_get_type(name).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no type \"{}\"", name),
            }
            .into()
        })
    }

    pub fn try_get_type(&self, name: &Name) -> Option<TypeDefinitionPosition> {
        let kind = self.type_kind(name)?;
        Some(match kind {
            TypeDefinitionKind::Scalar => ScalarTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinitionKind::Object => ObjectTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinitionKind::Union => UnionTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinitionKind::InputObject => InputObjectTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinitionKind::Enum => position::EnumTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
        })
    }

    pub fn get_types(&self) -> impl Iterator<Item = TypeDefinitionPosition> + '_ {
        self.types.iter().map(|(name, type_)| match type_ {
            TypeDefinition::Scalar(_) => ScalarTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinition::Object(_) => ObjectTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinition::Union(_) => UnionTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinition::InputObject(_) => InputObjectTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
            TypeDefinition::Enum(_) => position::EnumTypeDefinitionPosition {
                type_name: name.clone(),
            }
            .into(),
        })
    }

    pub fn get_directive_definition(
        &self,
        name: &Name,
    ) -> Option<&definitions::DirectiveDefinition> {
        self.directive_definitions.get(name)
    }

    /// Adds an empty object type, or returns the existing one if a type of the same kind is
    /// already there; a type of another kind under that name is an error.
    pub fn add_object_type(
        &mut self,
        name: Name,
    ) -> Result<ObjectTypeDefinitionPosition, FederationError> {
        let position = ObjectTypeDefinitionPosition {
            type_name: name.clone(),
        };
        match self.types.get(&name) {
            Some(TypeDefinition::Object(_)) => Ok(position),
            Some(other) => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Cannot add object type \"{}\": type already exists with kind {}",
                    name,
                    other.kind()
                ),
            }
            .into()),
            None => {
                position.pre_insert(self)?;
                position.insert(
                    self,
                    ObjectType {
                        name,
                        directives: Default::default(),
                        fields: IndexMap::new(),
                    },
                )?;
                Ok(position)
            }
        }
    }

    /// Adds a scalar type. Fails if the name collides with a built-in scalar, or with an
    /// existing type of another kind.
    pub fn add_scalar_type(
        &mut self,
        name: Name,
    ) -> Result<ScalarTypeDefinitionPosition, FederationError> {
        let position = ScalarTypeDefinitionPosition {
            type_name: name.clone(),
        };
        match self.types.get(&name) {
            Some(TypeDefinition::Scalar(_)) => Ok(position),
            Some(other) => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Cannot add scalar type \"{}\": type already exists with kind {}",
                    name,
                    other.kind()
                ),
            }
            .into()),
            None => {
                position.pre_insert(self)?;
                position.insert(
                    self,
                    ScalarType {
                        name,
                        directives: Default::default(),
                    },
                )?;
                Ok(position)
            }
        }
    }

    pub fn add_union_type(
        &mut self,
        name: Name,
    ) -> Result<UnionTypeDefinitionPosition, FederationError> {
        let position = UnionTypeDefinitionPosition {
            type_name: name.clone(),
        };
        match self.types.get(&name) {
            Some(TypeDefinition::Union(_)) => Ok(position),
            Some(other) => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Cannot add union type \"{}\": type already exists with kind {}",
                    name,
                    other.kind()
                ),
            }
            .into()),
            None => {
                position.pre_insert(self)?;
                position.insert(
                    self,
                    UnionType {
                        name,
                        directives: Default::default(),
                        members: IndexSet::new(),
                    },
                )?;
                Ok(position)
            }
        }
    }

    pub fn add_input_object_type(
        &mut self,
        name: Name,
    ) -> Result<InputObjectTypeDefinitionPosition, FederationError> {
        let position = InputObjectTypeDefinitionPosition {
            type_name: name.clone(),
        };
        match self.types.get(&name) {
            Some(TypeDefinition::InputObject(_)) => Ok(position),
            Some(other) => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Cannot add input object type \"{}\": type already exists with kind {}",
                    name,
                    other.kind()
                ),
            }
            .into()),
            None => {
                position.pre_insert(self)?;
                position.insert(
                    self,
                    InputObjectType {
                        name,
                        directives: Default::default(),
                        fields: IndexMap::new(),
                    },
                )?;
                Ok(position)
            }
        }
    }

    /// The set of object types a value of the given composite type may have at runtime.
    pub fn possible_runtime_types(
        &self,
        composite_type_definition_position: CompositeTypeDefinitionPosition,
    ) -> Result<IndexSet<ObjectTypeDefinitionPosition>, FederationError> {
        Ok(match composite_type_definition_position {
            CompositeTypeDefinitionPosition::Object(position) => IndexSet::from([position]),
            CompositeTypeDefinitionPosition::Union(position) => position
                .get(self)?
                .members
                .iter()
                .map(|member| ObjectTypeDefinitionPosition {
                    type_name: member.clone(),
                })
                .collect::<IndexSet<_>>(),
        })
    }

    /// Produces the immutable view: an independent frozen snapshot. The two views never
    /// share mutable state afterwards.
    pub fn freeze(self) -> FrozenFederationSchema {
        FrozenFederationSchema {
            schema: Arc::new(self),
        }
    }
}

/// Structural equality: same types, fields, arguments, directive applications, and roots.
/// Referencer sets are derived data and deliberately not compared.
impl PartialEq for FederationSchema {
    fn eq(&self, other: &Self) -> bool {
        self.schema_definition == other.schema_definition
            && self.types == other.types
            && self.directive_definitions == other.directive_definitions
    }
}

/// The immutable view of a schema. Shares nothing mutable: conversion in either direction is
/// a deep copy, so concurrent reads are safe and a frozen schema can never be changed out
/// from under a reader.
#[derive(Debug, Clone)]
pub struct FrozenFederationSchema {
    schema: Arc<FederationSchema>,
}

impl FrozenFederationSchema {
    /// Produces the mutable view: an independent deep copy of this snapshot.
    pub fn to_mutable(&self) -> FederationSchema {
        self.schema.as_ref().clone()
    }
}

impl Deref for FrozenFederationSchema {
    type Target = FederationSchema;

    fn deref(&self) -> &Self::Target {
        &self.schema
    }
}

impl PartialEq for FrozenFederationSchema {
    fn eq(&self, other: &Self) -> bool {
        *self.schema == *other.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::position::ObjectFieldDefinitionPosition;

    /// Referencer symmetry: every element that references a type appears in that type's
    /// referencer set, and every referencer-set entry resolves back to an element that
    /// still references the type.
    fn assert_referencer_symmetry(schema: &FederationSchema) {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            for (field_name, field) in &object.fields {
                let position = ObjectFieldDefinitionPosition {
                    type_name: type_name.clone(),
                    field_name: field_name.clone(),
                };
                let Some(target) = field.ty.as_ref().map(|ty| ty.inner_named_type()) else {
                    continue;
                };
                let tracked = match schema.type_kind(target) {
                    Some(TypeDefinitionKind::Scalar) => schema
                        .referencers
                        .get_scalar_type(target)
                        .unwrap()
                        .object_fields
                        .contains(&position),
                    Some(TypeDefinitionKind::Object) => schema
                        .referencers
                        .get_object_type(target)
                        .unwrap()
                        .object_fields
                        .contains(&position),
                    Some(TypeDefinitionKind::Union) => schema
                        .referencers
                        .get_union_type(target)
                        .unwrap()
                        .object_fields
                        .contains(&position),
                    other => panic!("unexpected field target kind {:?}", other),
                };
                assert!(tracked, "field \"{}\" is not tracked by \"{}\"", position, target);
            }
        }
        for (type_name, referencers) in &schema.referencers.object_types {
            for field in &referencers.object_fields {
                let field = field.get(schema).unwrap();
                assert_eq!(
                    field.ty.as_ref().map(|ty| ty.inner_named_type()),
                    Some(type_name),
                );
            }
            for union_ in &referencers.union_types {
                assert!(union_.get(schema).unwrap().members.contains(type_name));
            }
            for root in &referencers.schema_roots {
                assert_eq!(root.get(schema).unwrap(), type_name);
            }
        }
    }

    #[test]
    fn parsing_establishes_referencer_symmetry() {
        let schema = FederationSchema::parse(
            r#"
            type Query {
              users(limit: Int = 10): [User]
              accounts: [Account]
            }

            type User {
              id: ID
              best: User
            }

            type Admin {
              id: ID
            }

            union Account = User | Admin
            "#,
        )
        .unwrap();
        assert_referencer_symmetry(&schema);
    }

    #[test]
    fn mutation_preserves_referencer_symmetry() {
        let mut schema = FederationSchema::parse(
            r#"
            type Query {
              user: User
            }

            type User {
              id: ID
              other: Admin
            }

            type Admin {
              id: ID
            }
            "#,
        )
        .unwrap();
        let field = ObjectFieldDefinitionPosition {
            type_name: name!("User"),
            field_name: name!("other"),
        };
        field
            .set_type(&mut schema, definitions::Type::Named(name!("User")))
            .unwrap();
        assert_referencer_symmetry(&schema);
        assert!(schema
            .referencers
            .get_object_type(&name!("Admin"))
            .unwrap()
            .is_empty());

        field.remove(&mut schema).unwrap();
        assert_referencer_symmetry(&schema);
        assert!(!schema
            .referencers
            .get_object_type(&name!("User"))
            .unwrap()
            .object_fields
            .contains(&field));
    }
}
