use crate::error::{FederationError, SingleFederationError};
use crate::schema::definitions::{
    ArgumentDefinition, DirectiveDefinition, FieldDefinition, InputFieldDefinition,
    InputObjectType, ObjectType, ScalarType, SchemaRootDefinitionKind, Type, TypeDefinition,
    UnionType,
};
use crate::schema::position::{
    DirectiveDefinitionPosition, InputObjectTypeDefinitionPosition, ObjectTypeDefinitionPosition,
    ScalarTypeDefinitionPosition, SchemaDefinitionPosition, SchemaRootDefinitionPosition,
    UnionTypeDefinitionPosition,
};
use crate::schema::FederationSchema;
use crate::values::{Directive, DirectiveList, Value};
use apollo_compiler::ast;
use apollo_compiler::name;
use indexmap::IndexMap;
use strum::IntoEnumIterator;

impl FederationSchema {
    pub fn parse(source: &str) -> Result<FederationSchema, FederationError> {
        let document = ast::Document::parse(source, "schema.graphql")?;
        Self::from_ast(&document)
    }

    /// Builds a schema from a parsed type-system document, in two passes: the first creates
    /// empty shells for every supported type definition so forward references resolve, the
    /// second fills in fields, arguments, applied directives, union members, and root
    /// operations.
    pub fn from_ast(document: &ast::Document) -> Result<FederationSchema, FederationError> {
        let mut schema = FederationSchema::new();
        let mut has_schema_definition = false;

        for definition in &document.definitions {
            match definition {
                ast::Definition::SchemaDefinition(_) => {
                    has_schema_definition = true;
                }
                ast::Definition::DirectiveDefinition(_) => {}
                ast::Definition::ScalarTypeDefinition(type_) => {
                    let position = ScalarTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    position.pre_insert(&mut schema)?;
                    position.insert(
                        &mut schema,
                        ScalarType {
                            name: type_.name.clone(),
                            directives: Default::default(),
                        },
                    )?;
                }
                ast::Definition::ObjectTypeDefinition(type_) => {
                    if !type_.implements_interfaces.is_empty() {
                        return Err(unsupported(format!(
                            "Type \"{}\" implements interfaces; interface types are not supported",
                            type_.name
                        )));
                    }
                    let position = ObjectTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    position.pre_insert(&mut schema)?;
                    position.insert(
                        &mut schema,
                        ObjectType {
                            name: type_.name.clone(),
                            directives: Default::default(),
                            fields: IndexMap::new(),
                        },
                    )?;
                }
                ast::Definition::UnionTypeDefinition(type_) => {
                    let position = UnionTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    position.pre_insert(&mut schema)?;
                    position.insert(
                        &mut schema,
                        UnionType {
                            name: type_.name.clone(),
                            directives: Default::default(),
                            members: Default::default(),
                        },
                    )?;
                }
                ast::Definition::InputObjectTypeDefinition(type_) => {
                    let position = InputObjectTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    position.pre_insert(&mut schema)?;
                    position.insert(
                        &mut schema,
                        InputObjectType {
                            name: type_.name.clone(),
                            directives: Default::default(),
                            fields: IndexMap::new(),
                        },
                    )?;
                }
                ast::Definition::InterfaceTypeDefinition(type_) => {
                    return Err(unsupported(format!(
                        "Interface types are not supported (found \"{}\")",
                        type_.name
                    )));
                }
                ast::Definition::EnumTypeDefinition(type_) => {
                    return Err(unsupported(format!(
                        "Enum types are not supported (found \"{}\")",
                        type_.name
                    )));
                }
                ast::Definition::SchemaExtension(_)
                | ast::Definition::ScalarTypeExtension(_)
                | ast::Definition::ObjectTypeExtension(_)
                | ast::Definition::InterfaceTypeExtension(_)
                | ast::Definition::UnionTypeExtension(_)
                | ast::Definition::EnumTypeExtension(_)
                | ast::Definition::InputObjectTypeExtension(_) => {
                    return Err(unsupported(
                        "Type system extensions are not supported".to_owned(),
                    ));
                }
                ast::Definition::OperationDefinition(_)
                | ast::Definition::FragmentDefinition(_) => {
                    return Err(SingleFederationError::InvalidGraphQL {
                        message: "Executable definitions are not allowed in type system documents"
                            .to_owned(),
                    }
                    .into());
                }
            }
        }

        for definition in &document.definitions {
            match definition {
                ast::Definition::SchemaDefinition(schema_definition) => {
                    for directive in schema_definition.directives.iter() {
                        SchemaDefinitionPosition
                            .insert_directive(&mut schema, Directive::from_ast(directive)?)?;
                    }
                    for root_operation in &schema_definition.root_operations {
                        let (operation_type, root_type) = &**root_operation;
                        SchemaRootDefinitionPosition {
                            root_kind: (*operation_type).into(),
                        }
                        .insert(&mut schema, root_type.clone())?;
                    }
                }
                ast::Definition::DirectiveDefinition(definition) => {
                    let position = DirectiveDefinitionPosition {
                        directive_name: definition.name.clone(),
                    };
                    position.insert(&mut schema, convert_directive_definition(definition)?)?;
                }
                ast::Definition::ScalarTypeDefinition(type_) => {
                    let position = ScalarTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    for directive in type_.directives.iter() {
                        position.insert_directive(&mut schema, Directive::from_ast(directive)?)?;
                    }
                }
                ast::Definition::ObjectTypeDefinition(type_) => {
                    let position = ObjectTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    for directive in type_.directives.iter() {
                        position.insert_directive(&mut schema, Directive::from_ast(directive)?)?;
                    }
                    for field in &type_.fields {
                        position
                            .field(field.name.clone())
                            .insert(&mut schema, convert_field_definition(field)?)?;
                    }
                }
                ast::Definition::UnionTypeDefinition(type_) => {
                    let position = UnionTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    for directive in type_.directives.iter() {
                        position.insert_directive(&mut schema, Directive::from_ast(directive)?)?;
                    }
                    for member in &type_.members {
                        position.insert_member(&mut schema, member.clone())?;
                    }
                }
                ast::Definition::InputObjectTypeDefinition(type_) => {
                    let position = InputObjectTypeDefinitionPosition {
                        type_name: type_.name.clone(),
                    };
                    for directive in type_.directives.iter() {
                        position.insert_directive(&mut schema, Directive::from_ast(directive)?)?;
                    }
                    for field in &type_.fields {
                        position.field(field.name.clone()).insert(
                            &mut schema,
                            InputFieldDefinition {
                                name: field.name.clone(),
                                ty: Some(convert_type(&field.ty, &field.name)?),
                                default_value: field
                                    .default_value
                                    .as_ref()
                                    .map(|value| Value::from_ast(value))
                                    .transpose()?,
                                directives: DirectiveList::from_ast(&field.directives)?,
                            },
                        )?;
                    }
                }
                _ => {}
            }
        }

        // Without an explicit schema definition, roots bind to the conventionally-named
        // object types.
        if !has_schema_definition {
            for root_kind in SchemaRootDefinitionKind::iter() {
                let default_name = match root_kind {
                    SchemaRootDefinitionKind::Query => name!("Query"),
                    SchemaRootDefinitionKind::Mutation => name!("Mutation"),
                    SchemaRootDefinitionKind::Subscription => name!("Subscription"),
                };
                if let Some(TypeDefinition::Object(_)) = schema.types.get(&default_name) {
                    SchemaRootDefinitionPosition { root_kind }
                        .insert(&mut schema, default_name)?;
                }
            }
        }

        Ok(schema)
    }
}

fn convert_type(ty: &ast::Type, element: &apollo_compiler::schema::Name) -> Result<Type, FederationError> {
    match ty {
        ast::Type::Named(name) => Ok(Type::Named(name.clone())),
        ast::Type::List(inner) => Ok(convert_type(inner, element)?.list()),
        ast::Type::NonNullNamed(_) | ast::Type::NonNullList(_) => Err(unsupported(format!(
            "Non-null types are not supported (in type of \"{}\")",
            element
        ))),
    }
}

fn convert_field_definition(
    field: &ast::FieldDefinition,
) -> Result<FieldDefinition, FederationError> {
    let mut arguments = IndexMap::new();
    for argument in &field.arguments {
        arguments.insert(
            argument.name.clone(),
            convert_argument_definition(argument)?,
        );
    }
    Ok(FieldDefinition {
        name: field.name.clone(),
        ty: Some(convert_type(&field.ty, &field.name)?),
        arguments,
        directives: DirectiveList::from_ast(&field.directives)?,
    })
}

fn convert_argument_definition(
    argument: &ast::InputValueDefinition,
) -> Result<ArgumentDefinition, FederationError> {
    Ok(ArgumentDefinition {
        name: argument.name.clone(),
        ty: Some(convert_type(&argument.ty, &argument.name)?),
        default_value: argument
            .default_value
            .as_ref()
            .map(|value| Value::from_ast(value))
            .transpose()?,
        directives: DirectiveList::from_ast(&argument.directives)?,
    })
}

fn convert_directive_definition(
    definition: &ast::DirectiveDefinition,
) -> Result<DirectiveDefinition, FederationError> {
    let mut arguments = IndexMap::new();
    for argument in &definition.arguments {
        arguments.insert(
            argument.name.clone(),
            convert_argument_definition(argument)?,
        );
    }
    Ok(DirectiveDefinition {
        name: definition.name.clone(),
        arguments,
        repeatable: definition.repeatable,
        locations: definition
            .locations
            .iter()
            .map(|location| (*location).into())
            .collect(),
    })
}

fn unsupported(message: String) -> FederationError {
    SingleFederationError::UnsupportedFeature { message }.into()
}
