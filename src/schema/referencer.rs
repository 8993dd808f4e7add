use crate::error::{FederationError, SingleFederationError};
use crate::schema::position::{
    DirectiveArgumentDefinitionPosition, InputObjectFieldDefinitionPosition,
    InputObjectTypeDefinitionPosition, ObjectFieldArgumentDefinitionPosition,
    ObjectFieldDefinitionPosition, ObjectTypeDefinitionPosition, SchemaDefinitionPosition,
    SchemaRootDefinitionPosition, ScalarTypeDefinitionPosition, UnionTypeDefinitionPosition,
};
use apollo_compiler::schema::Name;
use indexmap::{IndexMap, IndexSet};

/// A schema element whose definition textually depends on some named type. `remove` on a type
/// returns these so callers can repair or report the now-dangling references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TypeDefinitionReferencer {
    SchemaRoot(SchemaRootDefinitionPosition),
    ObjectField(ObjectFieldDefinitionPosition),
    ObjectFieldArgument(ObjectFieldArgumentDefinitionPosition),
    Union(UnionTypeDefinitionPosition),
    InputObjectField(InputObjectFieldDefinitionPosition),
    DirectiveArgument(DirectiveArgumentDefinitionPosition),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Referencers {
    pub(crate) scalar_types: IndexMap<Name, ScalarTypeReferencers>,
    pub(crate) object_types: IndexMap<Name, ObjectTypeReferencers>,
    pub(crate) union_types: IndexMap<Name, UnionTypeReferencers>,
    pub(crate) input_object_types: IndexMap<Name, InputObjectTypeReferencers>,
    pub(crate) enum_types: IndexMap<Name, EnumTypeReferencers>,
    pub(crate) directives: IndexMap<Name, DirectiveReferencers>,
}

impl Referencers {
    pub(crate) fn contains_type_name(&self, name: &Name) -> bool {
        self.scalar_types.contains_key(name)
            || self.object_types.contains_key(name)
            || self.union_types.contains_key(name)
            || self.input_object_types.contains_key(name)
            || self.enum_types.contains_key(name)
    }

    pub(crate) fn get_scalar_type(
        &self,
        name: &Name,
    ) -> Result<&ScalarTypeReferencers, FederationError> {
        self.scalar_types.get(name).ok_or_else(|| {
            SingleFederationError::Internal {
                message: "Scalar type referencers unexpectedly missing type".to_owned(),
            }
            .into()
        })
    }

    pub(crate) fn get_object_type(
        &self,
        name: &Name,
    ) -> Result<&ObjectTypeReferencers, FederationError> {
        self.object_types.get(name).ok_or_else(|| {
            SingleFederationError::Internal {
                message: "Object type referencers unexpectedly missing type".to_owned(),
            }
            .into()
        })
    }

    pub(crate) fn get_union_type(
        &self,
        name: &Name,
    ) -> Result<&UnionTypeReferencers, FederationError> {
        self.union_types.get(name).ok_or_else(|| {
            SingleFederationError::Internal {
                message: "Union type referencers unexpectedly missing type".to_owned(),
            }
            .into()
        })
    }

    pub(crate) fn get_input_object_type(
        &self,
        name: &Name,
    ) -> Result<&InputObjectTypeReferencers, FederationError> {
        self.input_object_types.get(name).ok_or_else(|| {
            SingleFederationError::Internal {
                message: "Input object type referencers unexpectedly missing type".to_owned(),
            }
            .into()
        })
    }

    pub(crate) fn get_directive(
        &self,
        name: &Name,
    ) -> Result<&DirectiveReferencers, FederationError> {
        self.directives.get(name).ok_or_else(|| {
            SingleFederationError::Internal {
                message: "Directive referencers unexpectedly missing directive".to_owned(),
            }
            .into()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarTypeReferencers {
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}

impl ScalarTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.object_fields.is_empty()
            && self.object_field_arguments.is_empty()
            && self.input_object_fields.is_empty()
            && self.directive_arguments.is_empty()
    }
}

impl From<ScalarTypeReferencers> for IndexSet<TypeDefinitionReferencer> {
    fn from(referencers: ScalarTypeReferencers) -> Self {
        referencers
            .object_fields
            .into_iter()
            .map(TypeDefinitionReferencer::ObjectField)
            .chain(
                referencers
                    .object_field_arguments
                    .into_iter()
                    .map(TypeDefinitionReferencer::ObjectFieldArgument),
            )
            .chain(
                referencers
                    .input_object_fields
                    .into_iter()
                    .map(TypeDefinitionReferencer::InputObjectField),
            )
            .chain(
                referencers
                    .directive_arguments
                    .into_iter()
                    .map(TypeDefinitionReferencer::DirectiveArgument),
            )
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTypeReferencers {
    pub schema_roots: IndexSet<SchemaRootDefinitionPosition>,
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub union_types: IndexSet<UnionTypeDefinitionPosition>,
}

impl ObjectTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.schema_roots.is_empty() && self.object_fields.is_empty() && self.union_types.is_empty()
    }
}

impl From<ObjectTypeReferencers> for IndexSet<TypeDefinitionReferencer> {
    fn from(referencers: ObjectTypeReferencers) -> Self {
        referencers
            .schema_roots
            .into_iter()
            .map(TypeDefinitionReferencer::SchemaRoot)
            .chain(
                referencers
                    .object_fields
                    .into_iter()
                    .map(TypeDefinitionReferencer::ObjectField),
            )
            .chain(
                referencers
                    .union_types
                    .into_iter()
                    .map(TypeDefinitionReferencer::Union),
            )
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionTypeReferencers {
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
}

impl UnionTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.object_fields.is_empty()
    }
}

impl From<UnionTypeReferencers> for IndexSet<TypeDefinitionReferencer> {
    fn from(referencers: UnionTypeReferencers) -> Self {
        referencers
            .object_fields
            .into_iter()
            .map(TypeDefinitionReferencer::ObjectField)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputObjectTypeReferencers {
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}

impl InputObjectTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.object_field_arguments.is_empty()
            && self.input_object_fields.is_empty()
            && self.directive_arguments.is_empty()
    }
}

impl From<InputObjectTypeReferencers> for IndexSet<TypeDefinitionReferencer> {
    fn from(referencers: InputObjectTypeReferencers) -> Self {
        referencers
            .object_field_arguments
            .into_iter()
            .map(TypeDefinitionReferencer::ObjectFieldArgument)
            .chain(
                referencers
                    .input_object_fields
                    .into_iter()
                    .map(TypeDefinitionReferencer::InputObjectField),
            )
            .chain(
                referencers
                    .directive_arguments
                    .into_iter()
                    .map(TypeDefinitionReferencer::DirectiveArgument),
            )
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumTypeReferencers {
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}

impl From<EnumTypeReferencers> for IndexSet<TypeDefinitionReferencer> {
    fn from(referencers: EnumTypeReferencers) -> Self {
        referencers
            .object_fields
            .into_iter()
            .map(TypeDefinitionReferencer::ObjectField)
            .chain(
                referencers
                    .object_field_arguments
                    .into_iter()
                    .map(TypeDefinitionReferencer::ObjectFieldArgument),
            )
            .chain(
                referencers
                    .input_object_fields
                    .into_iter()
                    .map(TypeDefinitionReferencer::InputObjectField),
            )
            .chain(
                referencers
                    .directive_arguments
                    .into_iter()
                    .map(TypeDefinitionReferencer::DirectiveArgument),
            )
            .collect()
    }
}

/// Elements carrying an application of a given directive definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveReferencers {
    pub schema: Option<SchemaDefinitionPosition>,
    pub scalar_types: IndexSet<ScalarTypeDefinitionPosition>,
    pub object_types: IndexSet<ObjectTypeDefinitionPosition>,
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub union_types: IndexSet<UnionTypeDefinitionPosition>,
    pub input_object_types: IndexSet<InputObjectTypeDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}
