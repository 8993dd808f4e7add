use crate::error::{FederationError, SingleFederationError};
use crate::values::{DirectiveList, Value};
use apollo_compiler::ast;
use apollo_compiler::schema::Name;
use indexmap::{IndexMap, IndexSet};
use std::fmt::{Display, Formatter};

/// A type reference: a named type, possibly wrapped. The schema of a wrapped type is that of
/// its eventual base type.
///
/// `NonNull` exists so the join spec's directive surface can be declared on emitted
/// supergraphs; the parser does not accept it (see `build.rs`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Named(Name),
    List(Box<Type>),
    NonNull(Box<Type>),
}

impl Type {
    /// The base named type, unwrapping any list or non-null wrappers.
    pub fn inner_named_type(&self) -> &Name {
        match self {
            Type::Named(name) => name,
            Type::List(inner) => inner.inner_named_type(),
            Type::NonNull(inner) => inner.inner_named_type(),
        }
    }

    pub fn list(self) -> Type {
        Type::List(Box::new(self))
    }

    pub fn non_null(self) -> Type {
        Type::NonNull(Box::new(self))
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{}", name),
            Type::List(inner) => write!(f, "[{}]", inner),
            Type::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// Reads a possibly-cleared type reference, raising a construction error when the reference
/// was cleared by a removal.
pub(crate) fn resolved_type<'t>(
    ty: &'t Option<Type>,
    element: impl Display,
) -> Result<&'t Type, FederationError> {
    ty.as_ref().ok_or_else(|| {
        SingleFederationError::TypeDefinitionInvalid {
            message: format!("Type reference of \"{}\" was cleared by a removal", element),
        }
        .into()
    })
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum TypeDefinitionKind {
    #[strum(to_string = "ScalarType")]
    Scalar,
    #[strum(to_string = "ObjectType")]
    Object,
    #[strum(to_string = "UnionType")]
    Union,
    #[strum(to_string = "InputObjectType")]
    InputObject,
    #[strum(to_string = "EnumType")]
    Enum,
}

/// A named type owned by a schema. Interface types are not implemented; enum types exist only
/// for the join spec scaffolding that composition emits (user documents are rejected).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    Scalar(ScalarType),
    Object(ObjectType),
    Union(UnionType),
    InputObject(InputObjectType),
    Enum(EnumType),
}

impl TypeDefinition {
    pub fn name(&self) -> &Name {
        match self {
            TypeDefinition::Scalar(type_) => &type_.name,
            TypeDefinition::Object(type_) => &type_.name,
            TypeDefinition::Union(type_) => &type_.name,
            TypeDefinition::InputObject(type_) => &type_.name,
            TypeDefinition::Enum(type_) => &type_.name,
        }
    }

    pub fn kind(&self) -> TypeDefinitionKind {
        match self {
            TypeDefinition::Scalar(_) => TypeDefinitionKind::Scalar,
            TypeDefinition::Object(_) => TypeDefinitionKind::Object,
            TypeDefinition::Union(_) => TypeDefinitionKind::Union,
            TypeDefinition::InputObject(_) => TypeDefinitionKind::InputObject,
            TypeDefinition::Enum(_) => TypeDefinitionKind::Enum,
        }
    }

    pub fn directives(&self) -> &DirectiveList {
        match self {
            TypeDefinition::Scalar(type_) => &type_.directives,
            TypeDefinition::Object(type_) => &type_.directives,
            TypeDefinition::Union(type_) => &type_.directives,
            TypeDefinition::InputObject(type_) => &type_.directives,
            TypeDefinition::Enum(type_) => &type_.directives,
        }
    }

    pub(crate) fn directives_mut(&mut self) -> &mut DirectiveList {
        match self {
            TypeDefinition::Scalar(type_) => &mut type_.directives,
            TypeDefinition::Object(type_) => &mut type_.directives,
            TypeDefinition::Union(type_) => &mut type_.directives,
            TypeDefinition::InputObject(type_) => &mut type_.directives,
            TypeDefinition::Enum(type_) => &mut type_.directives,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub name: Name,
    pub directives: DirectiveList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: Name,
    pub directives: DirectiveList,
    pub fields: IndexMap<Name, FieldDefinition>,
}

/// An output field, owned by exactly one object type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: Name,
    /// `None` is the detached state: the referenced type was removed out from under this
    /// field. Reading it through [`resolved_type`] raises a construction error.
    pub ty: Option<Type>,
    pub arguments: IndexMap<Name, ArgumentDefinition>,
    pub directives: DirectiveList,
}

/// An argument definition, owned by a field or directive definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    pub name: Name,
    pub ty: Option<Type>,
    pub default_value: Option<Value>,
    pub directives: DirectiveList,
}

/// An input field, owned by exactly one input object type. Same shape as an argument
/// definition, but a distinct element kind.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFieldDefinition {
    pub name: Name,
    pub ty: Option<Type>,
    pub default_value: Option<Value>,
    pub directives: DirectiveList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: Name,
    pub directives: DirectiveList,
    pub members: IndexSet<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectType {
    pub name: Name,
    pub directives: DirectiveList,
    pub fields: IndexMap<Name, InputFieldDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: Name,
    pub directives: DirectiveList,
    pub values: IndexMap<Name, EnumValueDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    pub value: Name,
    pub directives: DirectiveList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    pub name: Name,
    pub arguments: IndexMap<Name, ArgumentDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

/// The schema definition: applied directives plus the root-operation assignments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDefinition {
    pub directives: DirectiveList,
    pub query: Option<Name>,
    pub mutation: Option<Name>,
    pub subscription: Option<Name>,
}

impl SchemaDefinition {
    pub fn root(&self, kind: SchemaRootDefinitionKind) -> Option<&Name> {
        match kind {
            SchemaRootDefinitionKind::Query => self.query.as_ref(),
            SchemaRootDefinitionKind::Mutation => self.mutation.as_ref(),
            SchemaRootDefinitionKind::Subscription => self.subscription.as_ref(),
        }
    }

    pub(crate) fn root_mut(&mut self, kind: SchemaRootDefinitionKind) -> &mut Option<Name> {
        match kind {
            SchemaRootDefinitionKind::Query => &mut self.query,
            SchemaRootDefinitionKind::Mutation => &mut self.mutation,
            SchemaRootDefinitionKind::Subscription => &mut self.subscription,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum SchemaRootDefinitionKind {
    #[strum(to_string = "query")]
    Query,
    #[strum(to_string = "mutation")]
    Mutation,
    #[strum(to_string = "subscription")]
    Subscription,
}

impl From<ast::OperationType> for SchemaRootDefinitionKind {
    fn from(value: ast::OperationType) -> Self {
        match value {
            ast::OperationType::Query => SchemaRootDefinitionKind::Query,
            ast::OperationType::Mutation => SchemaRootDefinitionKind::Mutation,
            ast::OperationType::Subscription => SchemaRootDefinitionKind::Subscription,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum DirectiveLocation {
    #[strum(to_string = "QUERY")]
    Query,
    #[strum(to_string = "MUTATION")]
    Mutation,
    #[strum(to_string = "SUBSCRIPTION")]
    Subscription,
    #[strum(to_string = "FIELD")]
    Field,
    #[strum(to_string = "FRAGMENT_DEFINITION")]
    FragmentDefinition,
    #[strum(to_string = "FRAGMENT_SPREAD")]
    FragmentSpread,
    #[strum(to_string = "INLINE_FRAGMENT")]
    InlineFragment,
    #[strum(to_string = "VARIABLE_DEFINITION")]
    VariableDefinition,
    #[strum(to_string = "SCHEMA")]
    Schema,
    #[strum(to_string = "SCALAR")]
    Scalar,
    #[strum(to_string = "OBJECT")]
    Object,
    #[strum(to_string = "FIELD_DEFINITION")]
    FieldDefinition,
    #[strum(to_string = "ARGUMENT_DEFINITION")]
    ArgumentDefinition,
    #[strum(to_string = "INTERFACE")]
    Interface,
    #[strum(to_string = "UNION")]
    Union,
    #[strum(to_string = "ENUM")]
    Enum,
    #[strum(to_string = "ENUM_VALUE")]
    EnumValue,
    #[strum(to_string = "INPUT_OBJECT")]
    InputObject,
    #[strum(to_string = "INPUT_FIELD_DEFINITION")]
    InputFieldDefinition,
}

impl From<ast::DirectiveLocation> for DirectiveLocation {
    fn from(value: ast::DirectiveLocation) -> Self {
        match value {
            ast::DirectiveLocation::Query => DirectiveLocation::Query,
            ast::DirectiveLocation::Mutation => DirectiveLocation::Mutation,
            ast::DirectiveLocation::Subscription => DirectiveLocation::Subscription,
            ast::DirectiveLocation::Field => DirectiveLocation::Field,
            ast::DirectiveLocation::FragmentDefinition => DirectiveLocation::FragmentDefinition,
            ast::DirectiveLocation::FragmentSpread => DirectiveLocation::FragmentSpread,
            ast::DirectiveLocation::InlineFragment => DirectiveLocation::InlineFragment,
            ast::DirectiveLocation::VariableDefinition => DirectiveLocation::VariableDefinition,
            ast::DirectiveLocation::Schema => DirectiveLocation::Schema,
            ast::DirectiveLocation::Scalar => DirectiveLocation::Scalar,
            ast::DirectiveLocation::Object => DirectiveLocation::Object,
            ast::DirectiveLocation::FieldDefinition => DirectiveLocation::FieldDefinition,
            ast::DirectiveLocation::ArgumentDefinition => DirectiveLocation::ArgumentDefinition,
            ast::DirectiveLocation::Interface => DirectiveLocation::Interface,
            ast::DirectiveLocation::Union => DirectiveLocation::Union,
            ast::DirectiveLocation::Enum => DirectiveLocation::Enum,
            ast::DirectiveLocation::EnumValue => DirectiveLocation::EnumValue,
            ast::DirectiveLocation::InputObject => DirectiveLocation::InputObject,
            ast::DirectiveLocation::InputFieldDefinition => {
                DirectiveLocation::InputFieldDefinition
            }
        }
    }
}
