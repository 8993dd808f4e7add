use crate::error::{FederationError, SingleFederationError};
use crate::schema::definitions::{
    ArgumentDefinition, DirectiveDefinition, EnumType, FieldDefinition, InputFieldDefinition,
    InputObjectType, ObjectType, ScalarType, SchemaDefinition, SchemaRootDefinitionKind, Type,
    TypeDefinition, TypeDefinitionKind, UnionType,
};
use crate::schema::referencer::{
    DirectiveReferencers, InputObjectTypeReferencers, ObjectTypeReferencers, ScalarTypeReferencers,
    UnionTypeReferencers,
};
use crate::schema::FederationSchema;
use crate::values::Directive;
use apollo_compiler::schema::Name;
use std::fmt::{Display, Formatter};

/// A stable identifier for a named type in a schema. Every cross-element reference in the
/// schema is one of these paths rather than a pointer, which is what makes removal and deep
/// copies tractable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDefinitionPosition {
    Scalar(ScalarTypeDefinitionPosition),
    Object(ObjectTypeDefinitionPosition),
    Union(UnionTypeDefinitionPosition),
    InputObject(InputObjectTypeDefinitionPosition),
    Enum(EnumTypeDefinitionPosition),
}

impl TypeDefinitionPosition {
    pub fn type_name(&self) -> &Name {
        match self {
            TypeDefinitionPosition::Scalar(position) => &position.type_name,
            TypeDefinitionPosition::Object(position) => &position.type_name,
            TypeDefinitionPosition::Union(position) => &position.type_name,
            TypeDefinitionPosition::InputObject(position) => &position.type_name,
            TypeDefinitionPosition::Enum(position) => &position.type_name,
        }
    }

    pub fn kind(&self) -> TypeDefinitionKind {
        match self {
            TypeDefinitionPosition::Scalar(_) => TypeDefinitionKind::Scalar,
            TypeDefinitionPosition::Object(_) => TypeDefinitionKind::Object,
            TypeDefinitionPosition::Union(_) => TypeDefinitionKind::Union,
            TypeDefinitionPosition::InputObject(_) => TypeDefinitionKind::InputObject,
            TypeDefinitionPosition::Enum(_) => TypeDefinitionKind::Enum,
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema TypeDefinition, FederationError> {
        schema.types.get(self.type_name()).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no type \"{}\"", self.type_name()),
            }
            .into()
        })
    }
}

impl Display for TypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl From<ScalarTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(value: ScalarTypeDefinitionPosition) -> Self {
        TypeDefinitionPosition::Scalar(value)
    }
}

impl From<ObjectTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(value: ObjectTypeDefinitionPosition) -> Self {
        TypeDefinitionPosition::Object(value)
    }
}

impl From<UnionTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(value: UnionTypeDefinitionPosition) -> Self {
        TypeDefinitionPosition::Union(value)
    }
}

impl From<InputObjectTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(value: InputObjectTypeDefinitionPosition) -> Self {
        TypeDefinitionPosition::InputObject(value)
    }
}

impl From<EnumTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(value: EnumTypeDefinitionPosition) -> Self {
        TypeDefinitionPosition::Enum(value)
    }
}

/// A composite type: one with runtime object types behind it (interfaces being unsupported,
/// that's object and union types).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompositeTypeDefinitionPosition {
    Object(ObjectTypeDefinitionPosition),
    Union(UnionTypeDefinitionPosition),
}

impl CompositeTypeDefinitionPosition {
    pub fn type_name(&self) -> &Name {
        match self {
            CompositeTypeDefinitionPosition::Object(position) => &position.type_name,
            CompositeTypeDefinitionPosition::Union(position) => &position.type_name,
        }
    }
}

impl Display for CompositeTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl From<ObjectTypeDefinitionPosition> for CompositeTypeDefinitionPosition {
    fn from(value: ObjectTypeDefinitionPosition) -> Self {
        CompositeTypeDefinitionPosition::Object(value)
    }
}

impl From<UnionTypeDefinitionPosition> for CompositeTypeDefinitionPosition {
    fn from(value: UnionTypeDefinitionPosition) -> Self {
        CompositeTypeDefinitionPosition::Union(value)
    }
}

impl TryFrom<TypeDefinitionPosition> for CompositeTypeDefinitionPosition {
    type Error = FederationError;

    fn try_from(value: TypeDefinitionPosition) -> Result<Self, Self::Error> {
        match value {
            TypeDefinitionPosition::Object(position) => Ok(position.into()),
            TypeDefinitionPosition::Union(position) => Ok(position.into()),
            other => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Type \"{}\" is not a composite type", other.type_name()),
            }
            .into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaDefinitionPosition;

impl SchemaDefinitionPosition {
    pub fn get<'schema>(&self, schema: &'schema FederationSchema) -> &'schema SchemaDefinition {
        &schema.schema_definition
    }

    pub fn insert_directive(
        &self,
        schema: &mut FederationSchema,
        directive: Directive,
    ) -> Result<(), FederationError> {
        schema
            .referencers
            .directives
            .entry(directive.name.clone())
            .or_default()
            .schema = Some(self.clone());
        schema.schema_definition.directives.push(directive);
        Ok(())
    }

    pub fn remove_directive_name(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.schema = None;
        }
        schema
            .schema_definition
            .directives
            .retain(|directive| directive.name != *name);
    }
}

impl Display for SchemaDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("schema")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRootDefinitionPosition {
    pub root_kind: SchemaRootDefinitionKind,
}

impl SchemaRootDefinitionPosition {
    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema Name, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::Internal {
                message: format!("Schema definition has no root {} type", self.root_kind),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(&self, schema: &'schema FederationSchema) -> Option<&'schema Name> {
        schema.schema_definition.root(self.root_kind)
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        root_type: Name,
    ) -> Result<(), FederationError> {
        if self.try_get(schema).is_some() {
            return Err(SingleFederationError::Internal {
                message: format!("Root {} operation type is already set", self.root_kind),
            }
            .into());
        }
        let Some(TypeDefinition::Object(_)) = schema.types.get(&root_type) else {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Root {} operation type \"{}\" must be an object type of this schema",
                    self.root_kind, root_type
                ),
            }
            .into());
        };
        schema
            .referencers
            .object_types
            .get_mut(&root_type)
            .ok_or_else(|| {
                FederationError::internal(format!(
                    "Schema missing referencers for type \"{}\"",
                    root_type
                ))
            })?
            .schema_roots
            .insert(self.clone());
        *schema.schema_definition.root_mut(self.root_kind) = Some(root_type);
        Ok(())
    }

    pub fn remove(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        let Some(root_type) = self.try_get(schema).cloned() else {
            return Ok(());
        };
        if let Some(object_type_referencers) = schema.referencers.object_types.get_mut(&root_type)
        {
            object_type_referencers.schema_roots.shift_remove(self);
        }
        *schema.schema_definition.root_mut(self.root_kind) = None;
        Ok(())
    }
}

impl Display for SchemaRootDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root_kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarTypeDefinitionPosition {
    pub type_name: Name,
}

impl ScalarTypeDefinitionPosition {
    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema ScalarType, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no scalar type \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema ScalarType> {
        if let Some(type_) = schema.builtin_scalars.get(&self.type_name) {
            return Some(type_);
        }
        match schema.types.get(&self.type_name) {
            Some(TypeDefinition::Scalar(type_)) => Some(type_),
            _ => None,
        }
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut ScalarType, FederationError> {
        if schema.builtin_scalars.contains_key(&self.type_name) {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Cannot modify built-in scalar type \"{}\"", self),
            }
            .into());
        }
        match schema.types.get_mut(&self.type_name) {
            Some(TypeDefinition::Scalar(type_)) => Ok(type_),
            _ => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no scalar type \"{}\"", self),
            }
            .into()),
        }
    }

    pub fn pre_insert(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        pre_insert_checks(schema, &self.type_name)?;
        schema
            .referencers
            .scalar_types
            .insert(self.type_name.clone(), Default::default());
        Ok(())
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        type_: ScalarType,
    ) -> Result<(), FederationError> {
        insert_checks(schema, &self.type_name, &type_.name, "scalar")?;
        if !schema
            .referencers
            .scalar_types
            .contains_key(&self.type_name)
        {
            return Err(FederationError::internal(format!(
                "Type \"{}\" was not pre-inserted",
                self
            )));
        }
        for directive in type_.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        schema
            .types
            .insert(self.type_name.clone(), TypeDefinition::Scalar(type_));
        Ok(())
    }

    /// Removes this type. Fields and arguments typed by it get their type reference cleared;
    /// the referencer set is returned so callers can repair or report.
    pub fn remove(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<ScalarTypeReferencers>, FederationError> {
        let Some(referencers) = self.remove_internal(schema)? else {
            return Ok(None);
        };
        for field in &referencers.object_fields {
            field.clear_type(schema);
        }
        for argument in &referencers.object_field_arguments {
            argument.clear_type(schema);
        }
        for field in &referencers.input_object_fields {
            field.clear_type(schema);
        }
        for argument in &referencers.directive_arguments {
            argument.clear_type(schema);
        }
        Ok(Some(referencers))
    }

    fn remove_internal(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<ScalarTypeReferencers>, FederationError> {
        if schema.builtin_scalars.contains_key(&self.type_name) {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Cannot remove built-in scalar type \"{}\"", self),
            }
            .into());
        }
        let Some(type_) = self.try_get(schema) else {
            return Ok(None);
        };
        let type_ = type_.clone();
        for directive in type_.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
        schema.types.shift_remove(&self.type_name);
        Ok(Some(
            schema
                .referencers
                .scalar_types
                .shift_remove(&self.type_name)
                .ok_or_else(|| {
                    FederationError::internal(format!(
                        "Schema missing referencers for type \"{}\"",
                        self
                    ))
                })?,
        ))
    }

    pub fn insert_directive(
        &self,
        schema: &mut FederationSchema,
        directive: Directive,
    ) -> Result<(), FederationError> {
        self.insert_directive_name_references(schema, &directive.name);
        self.make_mut(schema)?.directives.push(directive);
        Ok(())
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .scalar_types
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.scalar_types.shift_remove(self);
        }
    }
}

impl Display for ScalarTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectTypeDefinitionPosition {
    pub type_name: Name,
}

impl ObjectTypeDefinitionPosition {
    pub fn field(&self, field_name: Name) -> ObjectFieldDefinitionPosition {
        ObjectFieldDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name,
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema ObjectType, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no object type \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema ObjectType> {
        match schema.types.get(&self.type_name) {
            Some(TypeDefinition::Object(type_)) => Some(type_),
            _ => None,
        }
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut ObjectType, FederationError> {
        match schema.types.get_mut(&self.type_name) {
            Some(TypeDefinition::Object(type_)) => Ok(type_),
            _ => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no object type \"{}\"", self),
            }
            .into()),
        }
    }

    pub fn pre_insert(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        pre_insert_checks(schema, &self.type_name)?;
        schema
            .referencers
            .object_types
            .insert(self.type_name.clone(), Default::default());
        Ok(())
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        type_: ObjectType,
    ) -> Result<(), FederationError> {
        insert_checks(schema, &self.type_name, &type_.name, "object")?;
        if !schema
            .referencers
            .object_types
            .contains_key(&self.type_name)
        {
            return Err(FederationError::internal(format!(
                "Type \"{}\" was not pre-inserted",
                self
            )));
        }
        for directive in type_.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        let fields: Vec<FieldDefinition> = type_.fields.values().cloned().collect();
        schema
            .types
            .insert(self.type_name.clone(), TypeDefinition::Object(type_));
        for field in fields {
            let position = self.field(field.name.clone());
            position.insert_references(&field, schema)?;
        }
        Ok(())
    }

    /// Removes this type. Referencing fields get their type cleared, referencing unions drop
    /// the member, and root bindings pointing at it are dropped; the referencer set is
    /// returned so callers can repair or report.
    pub fn remove(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<ObjectTypeReferencers>, FederationError> {
        let Some(referencers) = self.remove_internal(schema)? else {
            return Ok(None);
        };
        for root in &referencers.schema_roots {
            root.remove(schema)?;
        }
        for field in &referencers.object_fields {
            field.clear_type(schema);
        }
        for union_ in &referencers.union_types {
            union_.remove_member(schema, &self.type_name);
        }
        Ok(Some(referencers))
    }

    fn remove_internal(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<ObjectTypeReferencers>, FederationError> {
        let Some(type_) = self.try_get(schema) else {
            return Ok(None);
        };
        let type_ = type_.clone();
        for directive in type_.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
        for field in type_.fields.values() {
            let position = self.field(field.name.clone());
            position.remove_references(field, schema);
        }
        schema.types.shift_remove(&self.type_name);
        Ok(Some(
            schema
                .referencers
                .object_types
                .shift_remove(&self.type_name)
                .ok_or_else(|| {
                    FederationError::internal(format!(
                        "Schema missing referencers for type \"{}\"",
                        self
                    ))
                })?,
        ))
    }

    pub fn insert_directive(
        &self,
        schema: &mut FederationSchema,
        directive: Directive,
    ) -> Result<(), FederationError> {
        self.insert_directive_name_references(schema, &directive.name);
        self.make_mut(schema)?.directives.push(directive);
        Ok(())
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .object_types
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.object_types.shift_remove(self);
        }
    }
}

impl Display for ObjectTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectFieldDefinitionPosition {
    pub type_name: Name,
    pub field_name: Name,
}

impl ObjectFieldDefinitionPosition {
    pub fn parent(&self) -> ObjectTypeDefinitionPosition {
        ObjectTypeDefinitionPosition {
            type_name: self.type_name.clone(),
        }
    }

    pub fn argument(&self, argument_name: Name) -> ObjectFieldArgumentDefinitionPosition {
        ObjectFieldArgumentDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name: self.field_name.clone(),
            argument_name,
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema FieldDefinition, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no object field \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema FieldDefinition> {
        self.parent().try_get(schema)?.fields.get(&self.field_name)
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut FieldDefinition, FederationError> {
        self.parent()
            .make_mut(schema)?
            .fields
            .get_mut(&self.field_name)
            .ok_or_else(|| {
                SingleFederationError::TypeDefinitionInvalid {
                    message: format!("Schema has no object field \"{}\"", self),
                }
                .into()
            })
    }

    /// Adds a field to its parent object type. Fails if the name is taken, or if the field's
    /// type (or any argument type) does not belong to this schema; a detached (cleared) type
    /// is also rejected since attachment is what wires the referencers.
    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        field: FieldDefinition,
    ) -> Result<(), FederationError> {
        if field.name != self.field_name {
            return Err(FederationError::internal(format!(
                "Object field \"{}\" given field named \"{}\"",
                self, field.name
            )));
        }
        let parent = self.parent().get(schema)?;
        if parent.fields.contains_key(&self.field_name) {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Object field \"{}\" already exists in schema", self),
            }
            .into());
        }
        self.insert_references(&field, schema)?;
        self.parent()
            .make_mut(schema)?
            .fields
            .insert(self.field_name.clone(), field);
        Ok(())
    }

    pub fn remove(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        let Some(field) = self.try_get(schema) else {
            return Ok(());
        };
        let field = field.clone();
        self.remove_references(&field, schema);
        self.parent()
            .make_mut(schema)?
            .fields
            .shift_remove(&self.field_name);
        Ok(())
    }

    /// Rebinds the field's output type, keeping the old and new types' referencer sets in
    /// sync. Fails on detached fields and on types from outside this schema.
    pub fn set_type(
        &self,
        schema: &mut FederationSchema,
        ty: Type,
    ) -> Result<(), FederationError> {
        let Some(field) = self.try_get(schema) else {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Cannot set the type of detached object field \"{}\"", self),
            }
            .into());
        };
        let old_type = field.ty.clone();
        insert_output_type_reference(schema, ty.inner_named_type(), self)?;
        if let Some(old_type) = old_type {
            remove_output_type_reference(schema, old_type.inner_named_type(), self);
        }
        self.make_mut(schema)?.ty = Some(ty);
        Ok(())
    }

    /// Clears the type reference without touching referencer sets. Used when the referenced
    /// type is being removed out from under this field.
    pub(crate) fn clear_type(&self, schema: &mut FederationSchema) {
        if let Ok(field) = self.make_mut(schema) {
            field.ty = None;
        }
    }

    pub fn insert_directive(
        &self,
        schema: &mut FederationSchema,
        directive: Directive,
    ) -> Result<(), FederationError> {
        self.insert_directive_name_references(schema, &directive.name);
        self.make_mut(schema)?.directives.push(directive);
        Ok(())
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    pub(crate) fn insert_references(
        &self,
        field: &FieldDefinition,
        schema: &mut FederationSchema,
    ) -> Result<(), FederationError> {
        let Some(ty) = &field.ty else {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Object field \"{}\" cannot be added with a detached type reference",
                    self
                ),
            }
            .into());
        };
        insert_output_type_reference(schema, ty.inner_named_type(), self)?;
        for directive in field.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        for argument in field.arguments.values() {
            let position = self.argument(argument.name.clone());
            position.insert_references(argument, schema)?;
        }
        Ok(())
    }

    pub(crate) fn remove_references(
        &self,
        field: &FieldDefinition,
        schema: &mut FederationSchema,
    ) {
        if let Some(ty) = &field.ty {
            remove_output_type_reference(schema, ty.inner_named_type(), self);
        }
        for directive in field.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
        for argument in field.arguments.values() {
            let position = self.argument(argument.name.clone());
            position.remove_references(argument, schema);
        }
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .object_fields
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.object_fields.shift_remove(self);
        }
    }
}

impl Display for ObjectFieldDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectFieldArgumentDefinitionPosition {
    pub type_name: Name,
    pub field_name: Name,
    pub argument_name: Name,
}

impl ObjectFieldArgumentDefinitionPosition {
    pub fn field(&self) -> ObjectFieldDefinitionPosition {
        ObjectFieldDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name: self.field_name.clone(),
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema ArgumentDefinition, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no object field argument \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema ArgumentDefinition> {
        self.field()
            .try_get(schema)?
            .arguments
            .get(&self.argument_name)
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut ArgumentDefinition, FederationError> {
        self.field()
            .make_mut(schema)?
            .arguments
            .get_mut(&self.argument_name)
            .ok_or_else(|| {
                SingleFederationError::TypeDefinitionInvalid {
                    message: format!("Schema has no object field argument \"{}\"", self),
                }
                .into()
            })
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        argument: ArgumentDefinition,
    ) -> Result<(), FederationError> {
        if argument.name != self.argument_name {
            return Err(FederationError::internal(format!(
                "Object field argument \"{}\" given argument named \"{}\"",
                self, argument.name
            )));
        }
        if self.field().get(schema)?.arguments.contains_key(&self.argument_name) {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Argument \"{}\" already exists in schema", self),
            }
            .into());
        }
        self.insert_references(&argument, schema)?;
        self.field()
            .make_mut(schema)?
            .arguments
            .insert(self.argument_name.clone(), argument);
        Ok(())
    }

    pub fn remove(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        let Some(argument) = self.try_get(schema) else {
            return Ok(());
        };
        let argument = argument.clone();
        self.remove_references(&argument, schema);
        self.field()
            .make_mut(schema)?
            .arguments
            .shift_remove(&self.argument_name);
        Ok(())
    }

    pub(crate) fn clear_type(&self, schema: &mut FederationSchema) {
        if let Ok(argument) = self.make_mut(schema) {
            argument.ty = None;
        }
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    pub(crate) fn insert_references(
        &self,
        argument: &ArgumentDefinition,
        schema: &mut FederationSchema,
    ) -> Result<(), FederationError> {
        let Some(ty) = &argument.ty else {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Argument \"{}\" cannot be added with a detached type reference",
                    self
                ),
            }
            .into());
        };
        let target = ty.inner_named_type().clone();
        match input_type_kind(schema, &target, self)? {
            TypeDefinitionKind::Scalar => {
                schema
                    .referencers
                    .scalar_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .object_field_arguments
                    .insert(self.clone());
            }
            TypeDefinitionKind::InputObject => {
                schema
                    .referencers
                    .input_object_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .object_field_arguments
                    .insert(self.clone());
            }
            TypeDefinitionKind::Enum => {
                schema
                    .referencers
                    .enum_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .object_field_arguments
                    .insert(self.clone());
            }
            _ => unreachable!("input_type_kind only returns input kinds"),
        }
        for directive in argument.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        Ok(())
    }

    pub(crate) fn remove_references(
        &self,
        argument: &ArgumentDefinition,
        schema: &mut FederationSchema,
    ) {
        if let Some(ty) = &argument.ty {
            let target = ty.inner_named_type();
            if let Some(referencers) = schema.referencers.scalar_types.get_mut(target) {
                referencers.object_field_arguments.shift_remove(self);
            }
            if let Some(referencers) = schema.referencers.input_object_types.get_mut(target) {
                referencers.object_field_arguments.shift_remove(self);
            }
            if let Some(referencers) = schema.referencers.enum_types.get_mut(target) {
                referencers.object_field_arguments.shift_remove(self);
            }
        }
        for directive in argument.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .object_field_arguments
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers
                .object_field_arguments
                .shift_remove(self);
        }
    }
}

impl Display for ObjectFieldArgumentDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}({}:)",
            self.type_name, self.field_name, self.argument_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionTypeDefinitionPosition {
    pub type_name: Name,
}

impl UnionTypeDefinitionPosition {
    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema UnionType, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no union type \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(&self, schema: &'schema FederationSchema) -> Option<&'schema UnionType> {
        match schema.types.get(&self.type_name) {
            Some(TypeDefinition::Union(type_)) => Some(type_),
            _ => None,
        }
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut UnionType, FederationError> {
        match schema.types.get_mut(&self.type_name) {
            Some(TypeDefinition::Union(type_)) => Ok(type_),
            _ => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no union type \"{}\"", self),
            }
            .into()),
        }
    }

    pub fn pre_insert(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        pre_insert_checks(schema, &self.type_name)?;
        schema
            .referencers
            .union_types
            .insert(self.type_name.clone(), Default::default());
        Ok(())
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        type_: UnionType,
    ) -> Result<(), FederationError> {
        insert_checks(schema, &self.type_name, &type_.name, "union")?;
        if !schema.referencers.union_types.contains_key(&self.type_name) {
            return Err(FederationError::internal(format!(
                "Type \"{}\" was not pre-inserted",
                self
            )));
        }
        for directive in type_.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        let members: Vec<Name> = type_.members.iter().cloned().collect();
        schema
            .types
            .insert(self.type_name.clone(), TypeDefinition::Union(type_));
        for member in members {
            self.insert_member_references(schema, &member)?;
        }
        Ok(())
    }

    pub fn remove(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<UnionTypeReferencers>, FederationError> {
        let Some(referencers) = self.remove_internal(schema)? else {
            return Ok(None);
        };
        for field in &referencers.object_fields {
            field.clear_type(schema);
        }
        Ok(Some(referencers))
    }

    fn remove_internal(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<UnionTypeReferencers>, FederationError> {
        let Some(type_) = self.try_get(schema) else {
            return Ok(None);
        };
        let type_ = type_.clone();
        for directive in type_.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
        for member in &type_.members {
            self.remove_member_references(schema, member);
        }
        schema.types.shift_remove(&self.type_name);
        Ok(Some(
            schema
                .referencers
                .union_types
                .shift_remove(&self.type_name)
                .ok_or_else(|| {
                    FederationError::internal(format!(
                        "Schema missing referencers for type \"{}\"",
                        self
                    ))
                })?,
        ))
    }

    pub fn insert_member(
        &self,
        schema: &mut FederationSchema,
        member: Name,
    ) -> Result<(), FederationError> {
        self.insert_member_references(schema, &member)?;
        self.make_mut(schema)?.members.insert(member);
        Ok(())
    }

    /// Drops a member from the union, tolerating members that are already gone (as happens
    /// when the member type itself was removed).
    pub fn remove_member(&self, schema: &mut FederationSchema, member: &Name) {
        self.remove_member_references(schema, member);
        if let Ok(type_) = self.make_mut(schema) {
            type_.members.shift_remove(member);
        }
    }

    fn insert_member_references(
        &self,
        schema: &mut FederationSchema,
        member: &Name,
    ) -> Result<(), FederationError> {
        let Some(TypeDefinition::Object(_)) = schema.types.get(member) else {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Union type \"{}\" member \"{}\" must be an object type of this schema",
                    self, member
                ),
            }
            .into());
        };
        schema
            .referencers
            .object_types
            .get_mut(member)
            .expect("type verified above has referencers")
            .union_types
            .insert(self.clone());
        Ok(())
    }

    fn remove_member_references(&self, schema: &mut FederationSchema, member: &Name) {
        if let Some(referencers) = schema.referencers.object_types.get_mut(member) {
            referencers.union_types.shift_remove(self);
        }
    }

    pub fn insert_directive(
        &self,
        schema: &mut FederationSchema,
        directive: Directive,
    ) -> Result<(), FederationError> {
        self.insert_directive_name_references(schema, &directive.name);
        self.make_mut(schema)?.directives.push(directive);
        Ok(())
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .union_types
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.union_types.shift_remove(self);
        }
    }
}

impl Display for UnionTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputObjectTypeDefinitionPosition {
    pub type_name: Name,
}

impl InputObjectTypeDefinitionPosition {
    pub fn field(&self, field_name: Name) -> InputObjectFieldDefinitionPosition {
        InputObjectFieldDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name,
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema InputObjectType, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no input object type \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema InputObjectType> {
        match schema.types.get(&self.type_name) {
            Some(TypeDefinition::InputObject(type_)) => Some(type_),
            _ => None,
        }
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut InputObjectType, FederationError> {
        match schema.types.get_mut(&self.type_name) {
            Some(TypeDefinition::InputObject(type_)) => Ok(type_),
            _ => Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no input object type \"{}\"", self),
            }
            .into()),
        }
    }

    pub fn pre_insert(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        pre_insert_checks(schema, &self.type_name)?;
        schema
            .referencers
            .input_object_types
            .insert(self.type_name.clone(), Default::default());
        Ok(())
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        type_: InputObjectType,
    ) -> Result<(), FederationError> {
        insert_checks(schema, &self.type_name, &type_.name, "input object")?;
        if !schema
            .referencers
            .input_object_types
            .contains_key(&self.type_name)
        {
            return Err(FederationError::internal(format!(
                "Type \"{}\" was not pre-inserted",
                self
            )));
        }
        for directive in type_.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        let fields: Vec<InputFieldDefinition> = type_.fields.values().cloned().collect();
        schema
            .types
            .insert(self.type_name.clone(), TypeDefinition::InputObject(type_));
        for field in fields {
            let position = self.field(field.name.clone());
            position.insert_references(&field, schema)?;
        }
        Ok(())
    }

    pub fn remove(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<InputObjectTypeReferencers>, FederationError> {
        let Some(referencers) = self.remove_internal(schema)? else {
            return Ok(None);
        };
        for argument in &referencers.object_field_arguments {
            argument.clear_type(schema);
        }
        for field in &referencers.input_object_fields {
            field.clear_type(schema);
        }
        for argument in &referencers.directive_arguments {
            argument.clear_type(schema);
        }
        Ok(Some(referencers))
    }

    fn remove_internal(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<InputObjectTypeReferencers>, FederationError> {
        let Some(type_) = self.try_get(schema) else {
            return Ok(None);
        };
        let type_ = type_.clone();
        for directive in type_.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
        for field in type_.fields.values() {
            let position = self.field(field.name.clone());
            position.remove_references(field, schema);
        }
        schema.types.shift_remove(&self.type_name);
        Ok(Some(
            schema
                .referencers
                .input_object_types
                .shift_remove(&self.type_name)
                .ok_or_else(|| {
                    FederationError::internal(format!(
                        "Schema missing referencers for type \"{}\"",
                        self
                    ))
                })?,
        ))
    }

    pub fn insert_directive(
        &self,
        schema: &mut FederationSchema,
        directive: Directive,
    ) -> Result<(), FederationError> {
        self.insert_directive_name_references(schema, &directive.name);
        self.make_mut(schema)?.directives.push(directive);
        Ok(())
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .input_object_types
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.input_object_types.shift_remove(self);
        }
    }
}

impl Display for InputObjectTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputObjectFieldDefinitionPosition {
    pub type_name: Name,
    pub field_name: Name,
}

impl InputObjectFieldDefinitionPosition {
    pub fn parent(&self) -> InputObjectTypeDefinitionPosition {
        InputObjectTypeDefinitionPosition {
            type_name: self.type_name.clone(),
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema InputFieldDefinition, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no input object field \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema InputFieldDefinition> {
        self.parent().try_get(schema)?.fields.get(&self.field_name)
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut InputFieldDefinition, FederationError> {
        self.parent()
            .make_mut(schema)?
            .fields
            .get_mut(&self.field_name)
            .ok_or_else(|| {
                SingleFederationError::TypeDefinitionInvalid {
                    message: format!("Schema has no input object field \"{}\"", self),
                }
                .into()
            })
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        field: InputFieldDefinition,
    ) -> Result<(), FederationError> {
        if field.name != self.field_name {
            return Err(FederationError::internal(format!(
                "Input object field \"{}\" given field named \"{}\"",
                self, field.name
            )));
        }
        if self.parent().get(schema)?.fields.contains_key(&self.field_name) {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!("Input object field \"{}\" already exists in schema", self),
            }
            .into());
        }
        self.insert_references(&field, schema)?;
        self.parent()
            .make_mut(schema)?
            .fields
            .insert(self.field_name.clone(), field);
        Ok(())
    }

    pub fn remove(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        let Some(field) = self.try_get(schema) else {
            return Ok(());
        };
        let field = field.clone();
        self.remove_references(&field, schema);
        self.parent()
            .make_mut(schema)?
            .fields
            .shift_remove(&self.field_name);
        Ok(())
    }

    pub(crate) fn clear_type(&self, schema: &mut FederationSchema) {
        if let Ok(field) = self.make_mut(schema) {
            field.ty = None;
        }
    }

    pub fn remove_directive_name(
        &self,
        schema: &mut FederationSchema,
        name: &Name,
    ) -> Result<(), FederationError> {
        self.remove_directive_name_references(schema, name);
        self.make_mut(schema)?
            .directives
            .retain(|directive| directive.name != *name);
        Ok(())
    }

    pub(crate) fn insert_references(
        &self,
        field: &InputFieldDefinition,
        schema: &mut FederationSchema,
    ) -> Result<(), FederationError> {
        let Some(ty) = &field.ty else {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Input object field \"{}\" cannot be added with a detached type reference",
                    self
                ),
            }
            .into());
        };
        let target = ty.inner_named_type().clone();
        match input_type_kind(schema, &target, self)? {
            TypeDefinitionKind::Scalar => {
                schema
                    .referencers
                    .scalar_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .input_object_fields
                    .insert(self.clone());
            }
            TypeDefinitionKind::InputObject => {
                schema
                    .referencers
                    .input_object_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .input_object_fields
                    .insert(self.clone());
            }
            TypeDefinitionKind::Enum => {
                schema
                    .referencers
                    .enum_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .input_object_fields
                    .insert(self.clone());
            }
            _ => unreachable!("input_type_kind only returns input kinds"),
        }
        for directive in field.directives.iter() {
            self.insert_directive_name_references(schema, &directive.name);
        }
        Ok(())
    }

    pub(crate) fn remove_references(
        &self,
        field: &InputFieldDefinition,
        schema: &mut FederationSchema,
    ) {
        if let Some(ty) = &field.ty {
            let target = ty.inner_named_type();
            if let Some(referencers) = schema.referencers.scalar_types.get_mut(target) {
                referencers.input_object_fields.shift_remove(self);
            }
            if let Some(referencers) = schema.referencers.input_object_types.get_mut(target) {
                referencers.input_object_fields.shift_remove(self);
            }
            if let Some(referencers) = schema.referencers.enum_types.get_mut(target) {
                referencers.input_object_fields.shift_remove(self);
            }
        }
        for directive in field.directives.iter() {
            self.remove_directive_name_references(schema, &directive.name);
        }
    }

    fn insert_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        schema
            .referencers
            .directives
            .entry(name.clone())
            .or_default()
            .input_object_fields
            .insert(self.clone());
    }

    fn remove_directive_name_references(&self, schema: &mut FederationSchema, name: &Name) {
        if let Some(directive_referencers) = schema.referencers.directives.get_mut(name) {
            directive_referencers.input_object_fields.shift_remove(self);
        }
    }
}

impl Display for InputObjectFieldDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumTypeDefinitionPosition {
    pub type_name: Name,
}

impl EnumTypeDefinitionPosition {
    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema EnumType, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::TypeDefinitionInvalid {
                message: format!("Schema has no enum type \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(&self, schema: &'schema FederationSchema) -> Option<&'schema EnumType> {
        match schema.types.get(&self.type_name) {
            Some(TypeDefinition::Enum(type_)) => Some(type_),
            _ => None,
        }
    }

    pub fn pre_insert(&self, schema: &mut FederationSchema) -> Result<(), FederationError> {
        pre_insert_checks(schema, &self.type_name)?;
        schema
            .referencers
            .enum_types
            .insert(self.type_name.clone(), Default::default());
        Ok(())
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        type_: EnumType,
    ) -> Result<(), FederationError> {
        insert_checks(schema, &self.type_name, &type_.name, "enum")?;
        if !schema.referencers.enum_types.contains_key(&self.type_name) {
            return Err(FederationError::internal(format!(
                "Type \"{}\" was not pre-inserted",
                self
            )));
        }
        schema
            .types
            .insert(self.type_name.clone(), TypeDefinition::Enum(type_));
        Ok(())
    }
}

impl Display for EnumTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveDefinitionPosition {
    pub directive_name: Name,
}

impl DirectiveDefinitionPosition {
    pub fn argument(&self, argument_name: Name) -> DirectiveArgumentDefinitionPosition {
        DirectiveArgumentDefinitionPosition {
            directive_name: self.directive_name.clone(),
            argument_name,
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema DirectiveDefinition, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::DirectiveDefinitionInvalid {
                message: format!("Schema has no directive definition \"@{}\"", self.directive_name),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema DirectiveDefinition> {
        schema.directive_definitions.get(&self.directive_name)
    }

    pub fn insert(
        &self,
        schema: &mut FederationSchema,
        definition: DirectiveDefinition,
    ) -> Result<(), FederationError> {
        if definition.name != self.directive_name {
            return Err(FederationError::internal(format!(
                "Directive definition \"@{}\" given definition named \"@{}\"",
                self.directive_name, definition.name
            )));
        }
        if schema
            .directive_definitions
            .contains_key(&self.directive_name)
        {
            return Err(SingleFederationError::DirectiveDefinitionInvalid {
                message: format!(
                    "Directive definition \"@{}\" already exists in schema",
                    self.directive_name
                ),
            }
            .into());
        }
        let arguments: Vec<ArgumentDefinition> = definition.arguments.values().cloned().collect();
        schema
            .directive_definitions
            .insert(self.directive_name.clone(), definition);
        schema
            .referencers
            .directives
            .entry(self.directive_name.clone())
            .or_default();
        for argument in arguments {
            let position = self.argument(argument.name.clone());
            position.insert_references(&argument, schema)?;
        }
        Ok(())
    }

    /// Removes the definition along with every application of it; the referencer set of
    /// applying elements is returned.
    pub fn remove(
        &self,
        schema: &mut FederationSchema,
    ) -> Result<Option<DirectiveReferencers>, FederationError> {
        let Some(definition) = self.try_get(schema) else {
            return Ok(None);
        };
        let definition = definition.clone();
        for argument in definition.arguments.values() {
            let position = self.argument(argument.name.clone());
            position.remove_references(argument, schema);
        }
        schema.directive_definitions.shift_remove(&self.directive_name);
        let Some(referencers) = schema
            .referencers
            .directives
            .shift_remove(&self.directive_name)
        else {
            return Ok(None);
        };
        if referencers.schema.is_some() {
            SchemaDefinitionPosition.remove_directive_name(schema, &self.directive_name);
        }
        for position in &referencers.scalar_types {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        for position in &referencers.object_types {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        for position in &referencers.object_fields {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        for position in &referencers.object_field_arguments {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        for position in &referencers.union_types {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        for position in &referencers.input_object_types {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        for position in &referencers.input_object_fields {
            position.remove_directive_name(schema, &self.directive_name)?;
        }
        Ok(Some(referencers))
    }
}

impl Display for DirectiveDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.directive_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveArgumentDefinitionPosition {
    pub directive_name: Name,
    pub argument_name: Name,
}

impl DirectiveArgumentDefinitionPosition {
    pub fn parent(&self) -> DirectiveDefinitionPosition {
        DirectiveDefinitionPosition {
            directive_name: self.directive_name.clone(),
        }
    }

    pub fn get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Result<&'schema ArgumentDefinition, FederationError> {
        self.try_get(schema).ok_or_else(|| {
            SingleFederationError::DirectiveDefinitionInvalid {
                message: format!("Schema has no directive argument \"{}\"", self),
            }
            .into()
        })
    }

    pub fn try_get<'schema>(
        &self,
        schema: &'schema FederationSchema,
    ) -> Option<&'schema ArgumentDefinition> {
        self.parent()
            .try_get(schema)?
            .arguments
            .get(&self.argument_name)
    }

    pub(crate) fn make_mut<'schema>(
        &self,
        schema: &'schema mut FederationSchema,
    ) -> Result<&'schema mut ArgumentDefinition, FederationError> {
        schema
            .directive_definitions
            .get_mut(&self.directive_name)
            .and_then(|definition| definition.arguments.get_mut(&self.argument_name))
            .ok_or_else(|| {
                SingleFederationError::DirectiveDefinitionInvalid {
                    message: format!("Schema has no directive argument \"{}\"", self),
                }
                .into()
            })
    }

    pub(crate) fn clear_type(&self, schema: &mut FederationSchema) {
        if let Ok(argument) = self.make_mut(schema) {
            argument.ty = None;
        }
    }

    pub(crate) fn insert_references(
        &self,
        argument: &ArgumentDefinition,
        schema: &mut FederationSchema,
    ) -> Result<(), FederationError> {
        let Some(ty) = &argument.ty else {
            return Err(SingleFederationError::DirectiveDefinitionInvalid {
                message: format!(
                    "Directive argument \"{}\" cannot be added with a detached type reference",
                    self
                ),
            }
            .into());
        };
        let target = ty.inner_named_type().clone();
        match input_type_kind(schema, &target, self)? {
            TypeDefinitionKind::Scalar => {
                schema
                    .referencers
                    .scalar_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .directive_arguments
                    .insert(self.clone());
            }
            TypeDefinitionKind::InputObject => {
                schema
                    .referencers
                    .input_object_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .directive_arguments
                    .insert(self.clone());
            }
            TypeDefinitionKind::Enum => {
                schema
                    .referencers
                    .enum_types
                    .get_mut(&target)
                    .expect("referencers verified by input_type_kind")
                    .directive_arguments
                    .insert(self.clone());
            }
            _ => unreachable!("input_type_kind only returns input kinds"),
        }
        Ok(())
    }

    pub(crate) fn remove_references(
        &self,
        argument: &ArgumentDefinition,
        schema: &mut FederationSchema,
    ) {
        if let Some(ty) = &argument.ty {
            let target = ty.inner_named_type();
            if let Some(referencers) = schema.referencers.scalar_types.get_mut(target) {
                referencers.directive_arguments.shift_remove(self);
            }
            if let Some(referencers) = schema.referencers.input_object_types.get_mut(target) {
                referencers.directive_arguments.shift_remove(self);
            }
            if let Some(referencers) = schema.referencers.enum_types.get_mut(target) {
                referencers.directive_arguments.shift_remove(self);
            }
        }
    }
}

impl Display for DirectiveArgumentDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}({}:)", self.directive_name, self.argument_name)
    }
}

fn pre_insert_checks(
    schema: &mut FederationSchema,
    type_name: &Name,
) -> Result<(), FederationError> {
    if schema.builtin_scalars.contains_key(type_name) {
        return Err(SingleFederationError::TypeDefinitionInvalid {
            message: format!(
                "Cannot add type \"{}\": it collides with a built-in scalar type",
                type_name
            ),
        }
        .into());
    }
    if schema.referencers.contains_type_name(type_name) {
        return Err(SingleFederationError::TypeDefinitionInvalid {
            message: format!("Type \"{}\" has already been pre-inserted", type_name),
        }
        .into());
    }
    Ok(())
}

fn insert_checks(
    schema: &FederationSchema,
    position_name: &Name,
    type_name: &Name,
    kind: &str,
) -> Result<(), FederationError> {
    if position_name != type_name {
        return Err(FederationError::internal(format!(
            "Expected {} type \"{}\", but given type named \"{}\"",
            kind, position_name, type_name
        )));
    }
    if schema.types.contains_key(position_name) {
        return Err(SingleFederationError::TypeDefinitionInvalid {
            message: format!("Type \"{}\" already exists in schema", position_name),
        }
        .into());
    }
    Ok(())
}

/// Registers an output-type reference (an object field's type). The target must be a
/// scalar, object, union, or enum type of this schema; referencing a type that is not in
/// the schema (including types belonging to other schemas, which can only ever arrive here
/// by name) is an error.
fn insert_output_type_reference(
    schema: &mut FederationSchema,
    target: &Name,
    referencer: &ObjectFieldDefinitionPosition,
) -> Result<(), FederationError> {
    let Some(kind) = schema.type_kind(target) else {
        return Err(SingleFederationError::TypeDefinitionInvalid {
            message: format!(
                "Object field \"{}\" references type \"{}\", which is not in this schema",
                referencer, target
            ),
        }
        .into());
    };
    match kind {
        TypeDefinitionKind::Scalar => {
            schema
                .referencers
                .scalar_types
                .get_mut(target)
                .expect("kind implies referencers entry")
                .object_fields
                .insert(referencer.clone());
        }
        TypeDefinitionKind::Object => {
            schema
                .referencers
                .object_types
                .get_mut(target)
                .expect("kind implies referencers entry")
                .object_fields
                .insert(referencer.clone());
        }
        TypeDefinitionKind::Union => {
            schema
                .referencers
                .union_types
                .get_mut(target)
                .expect("kind implies referencers entry")
                .object_fields
                .insert(referencer.clone());
        }
        TypeDefinitionKind::Enum => {
            schema
                .referencers
                .enum_types
                .get_mut(target)
                .expect("kind implies referencers entry")
                .object_fields
                .insert(referencer.clone());
        }
        TypeDefinitionKind::InputObject => {
            return Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "Object field \"{}\" cannot reference input object type \"{}\"",
                    referencer, target
                ),
            }
            .into());
        }
    }
    Ok(())
}

fn remove_output_type_reference(
    schema: &mut FederationSchema,
    target: &Name,
    referencer: &ObjectFieldDefinitionPosition,
) {
    if let Some(referencers) = schema.referencers.scalar_types.get_mut(target) {
        referencers.object_fields.shift_remove(referencer);
    }
    if let Some(referencers) = schema.referencers.object_types.get_mut(target) {
        referencers.object_fields.shift_remove(referencer);
    }
    if let Some(referencers) = schema.referencers.union_types.get_mut(target) {
        referencers.object_fields.shift_remove(referencer);
    }
    if let Some(referencers) = schema.referencers.enum_types.get_mut(target) {
        referencers.object_fields.shift_remove(referencer);
    }
}

/// Verifies an input-type reference target and returns its kind. The target must be a
/// scalar, input object, or enum type of this schema.
fn input_type_kind(
    schema: &FederationSchema,
    target: &Name,
    referencer: impl Display,
) -> Result<TypeDefinitionKind, FederationError> {
    let Some(kind) = schema.type_kind(target) else {
        return Err(SingleFederationError::TypeDefinitionInvalid {
            message: format!(
                "\"{}\" references type \"{}\", which is not in this schema",
                referencer, target
            ),
        }
        .into());
    };
    match kind {
        TypeDefinitionKind::Scalar | TypeDefinitionKind::InputObject | TypeDefinitionKind::Enum => {
            Ok(kind)
        }
        TypeDefinitionKind::Object | TypeDefinitionKind::Union => {
            Err(SingleFederationError::TypeDefinitionInvalid {
                message: format!(
                    "\"{}\" cannot reference output type \"{}\"",
                    referencer, target
                ),
            }
            .into())
        }
    }
}
