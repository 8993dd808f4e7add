use crate::error::FederationError;
use crate::schema::definitions::{
    ArgumentDefinition, DirectiveDefinition, DirectiveLocation, EnumType, EnumValueDefinition,
    Type,
};
use crate::schema::position::{
    DirectiveDefinitionPosition, EnumTypeDefinitionPosition, SchemaDefinitionPosition,
};
use crate::schema::FederationSchema;
use crate::subgraph::Subgraph;
use crate::values::{Directive, DirectiveList, Value};
use apollo_compiler::name;
use apollo_compiler::schema::Name;
use apollo_compiler::NodeStr;
use indexmap::IndexMap;

pub(crate) const CORE_DIRECTIVE_NAME: Name = name!("core");
pub(crate) const CORE_FEATURE_ARGUMENT_NAME: Name = name!("feature");
pub(crate) const CORE_AS_ARGUMENT_NAME: Name = name!("as");
pub(crate) const CORE_FOR_ARGUMENT_NAME: Name = name!("for");
pub(crate) const CORE_PURPOSE_ENUM_NAME: Name = name!("core__Purpose");

pub(crate) const JOIN_GRAPH_DIRECTIVE_NAME: Name = name!("join__graph");
pub(crate) const JOIN_TYPE_DIRECTIVE_NAME: Name = name!("join__type");
pub(crate) static JOIN_FIELD_DIRECTIVE_NAME: Name = name!("join__field");
pub(crate) const JOIN_IMPLEMENTS_DIRECTIVE_NAME: Name = name!("join__implements");
pub(crate) const JOIN_GRAPH_ENUM_NAME: Name = name!("join__Graph");
pub(crate) const JOIN_FIELD_SET_SCALAR_NAME: Name = name!("join__FieldSet");

pub(crate) const JOIN_GRAPH_ARGUMENT_NAME: Name = name!("graph");
pub(crate) const JOIN_KEY_ARGUMENT_NAME: Name = name!("key");
pub(crate) const JOIN_EXTENSION_ARGUMENT_NAME: Name = name!("extension");
pub(crate) const JOIN_REQUIRES_ARGUMENT_NAME: Name = name!("requires");
pub(crate) const JOIN_PROVIDES_ARGUMENT_NAME: Name = name!("provides");
pub(crate) const JOIN_TYPE_ARGUMENT_NAME: Name = name!("type");
pub(crate) const JOIN_EXTERNAL_ARGUMENT_NAME: Name = name!("external");
pub(crate) const JOIN_NAME_ARGUMENT_NAME: Name = name!("name");
pub(crate) const JOIN_URL_ARGUMENT_NAME: Name = name!("url");
pub(crate) const JOIN_INTERFACE_ARGUMENT_NAME: Name = name!("interface");

pub(crate) const CORE_FEATURE_URL: &str = "https://specs.apollo.dev/core/v0.2";
pub(crate) const JOIN_FEATURE_URL: &str = "https://specs.apollo.dev/join/v0.1";

/// The enum value naming a subgraph inside the `join__Graph` enum: upper-cased, with every
/// character outside `[A-Za-z0-9]` mapped to `_`, and a leading `_` when the name would
/// otherwise start with a digit.
pub(crate) fn graph_enum_name(subgraph_name: &str) -> Name {
    let mut sanitized: String = subgraph_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    Name::new_unchecked(NodeStr::new(&sanitized))
}

/// `@core` applications and supporting definitions: the `@core` directive itself, the
/// `core__Purpose` enum, and the feature applications for the core and join specs.
pub(crate) fn add_core_feature_core(schema: &mut FederationSchema) -> Result<(), FederationError> {
    let purpose_position = EnumTypeDefinitionPosition {
        type_name: CORE_PURPOSE_ENUM_NAME,
    };
    purpose_position.pre_insert(schema)?;
    purpose_position.insert(
        schema,
        EnumType {
            name: CORE_PURPOSE_ENUM_NAME,
            directives: Default::default(),
            values: IndexMap::from([
                (
                    name!("SECURITY"),
                    EnumValueDefinition {
                        value: name!("SECURITY"),
                        directives: Default::default(),
                    },
                ),
                (
                    name!("EXECUTION"),
                    EnumValueDefinition {
                        value: name!("EXECUTION"),
                        directives: Default::default(),
                    },
                ),
            ]),
        },
    )?;

    DirectiveDefinitionPosition {
        directive_name: CORE_DIRECTIVE_NAME,
    }
    .insert(
        schema,
        DirectiveDefinition {
            name: CORE_DIRECTIVE_NAME,
            arguments: arguments([
                required_argument(CORE_FEATURE_ARGUMENT_NAME, Type::Named(name!("String"))),
                optional_argument(CORE_AS_ARGUMENT_NAME, Type::Named(name!("String"))),
                optional_argument(CORE_FOR_ARGUMENT_NAME, Type::Named(CORE_PURPOSE_ENUM_NAME)),
            ]),
            repeatable: true,
            locations: vec![DirectiveLocation::Schema],
        },
    )?;

    let mut core_feature = Directive::new(CORE_DIRECTIVE_NAME);
    core_feature.arguments.insert(
        CORE_FEATURE_ARGUMENT_NAME,
        Value::String(CORE_FEATURE_URL.to_owned()),
    );
    SchemaDefinitionPosition.insert_directive(schema, core_feature)?;

    let mut join_feature = Directive::new(CORE_DIRECTIVE_NAME);
    join_feature.arguments.insert(
        CORE_FEATURE_ARGUMENT_NAME,
        Value::String(JOIN_FEATURE_URL.to_owned()),
    );
    join_feature
        .arguments
        .insert(CORE_FOR_ARGUMENT_NAME, Value::Enum(name!("EXECUTION")));
    SchemaDefinitionPosition.insert_directive(schema, join_feature)?;
    Ok(())
}

/// Join spec definitions: `join__FieldSet`, the `join__Graph` enum (one value per subgraph,
/// each annotated with `@join__graph(name:, url:)`), and the `@join__*` directives.
pub(crate) fn add_core_feature_join(
    schema: &mut FederationSchema,
    subgraphs: &[Subgraph],
) -> Result<(), FederationError> {
    schema.add_scalar_type(JOIN_FIELD_SET_SCALAR_NAME)?;

    let mut graph_values = IndexMap::new();
    for subgraph in subgraphs {
        let value = graph_enum_name(&subgraph.name);
        graph_values.insert(
            value.clone(),
            EnumValueDefinition {
                value,
                directives: DirectiveList(vec![join_graph_directive(
                    &subgraph.name,
                    &subgraph.url,
                )]),
            },
        );
    }
    let graph_position = EnumTypeDefinitionPosition {
        type_name: JOIN_GRAPH_ENUM_NAME,
    };
    graph_position.pre_insert(schema)?;
    graph_position.insert(
        schema,
        EnumType {
            name: JOIN_GRAPH_ENUM_NAME,
            directives: Default::default(),
            values: graph_values,
        },
    )?;

    DirectiveDefinitionPosition {
        directive_name: JOIN_FIELD_DIRECTIVE_NAME.clone(),
    }
    .insert(
        schema,
        DirectiveDefinition {
            name: JOIN_FIELD_DIRECTIVE_NAME.clone(),
            arguments: arguments([
                required_argument(JOIN_GRAPH_ARGUMENT_NAME, Type::Named(JOIN_GRAPH_ENUM_NAME)),
                optional_argument(
                    JOIN_REQUIRES_ARGUMENT_NAME,
                    Type::Named(JOIN_FIELD_SET_SCALAR_NAME),
                ),
                optional_argument(
                    JOIN_PROVIDES_ARGUMENT_NAME,
                    Type::Named(JOIN_FIELD_SET_SCALAR_NAME),
                ),
                optional_argument(JOIN_TYPE_ARGUMENT_NAME, Type::Named(name!("String"))),
                optional_argument(JOIN_EXTERNAL_ARGUMENT_NAME, Type::Named(name!("Boolean"))),
            ]),
            repeatable: true,
            locations: vec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::InputFieldDefinition,
            ],
        },
    )?;

    DirectiveDefinitionPosition {
        directive_name: JOIN_GRAPH_DIRECTIVE_NAME,
    }
    .insert(
        schema,
        DirectiveDefinition {
            name: JOIN_GRAPH_DIRECTIVE_NAME,
            arguments: arguments([
                required_argument(JOIN_NAME_ARGUMENT_NAME, Type::Named(name!("String"))),
                required_argument(JOIN_URL_ARGUMENT_NAME, Type::Named(name!("String"))),
            ]),
            repeatable: false,
            locations: vec![DirectiveLocation::EnumValue],
        },
    )?;

    DirectiveDefinitionPosition {
        directive_name: JOIN_IMPLEMENTS_DIRECTIVE_NAME,
    }
    .insert(
        schema,
        DirectiveDefinition {
            name: JOIN_IMPLEMENTS_DIRECTIVE_NAME,
            arguments: arguments([
                required_argument(JOIN_GRAPH_ARGUMENT_NAME, Type::Named(JOIN_GRAPH_ENUM_NAME)),
                required_argument(JOIN_INTERFACE_ARGUMENT_NAME, Type::Named(name!("String"))),
            ]),
            repeatable: true,
            locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
        },
    )?;

    DirectiveDefinitionPosition {
        directive_name: JOIN_TYPE_DIRECTIVE_NAME,
    }
    .insert(
        schema,
        DirectiveDefinition {
            name: JOIN_TYPE_DIRECTIVE_NAME,
            arguments: arguments([
                required_argument(JOIN_GRAPH_ARGUMENT_NAME, Type::Named(JOIN_GRAPH_ENUM_NAME)),
                optional_argument(
                    JOIN_KEY_ARGUMENT_NAME,
                    Type::Named(JOIN_FIELD_SET_SCALAR_NAME),
                ),
                ArgumentDefinition {
                    name: JOIN_EXTENSION_ARGUMENT_NAME,
                    ty: Some(Type::Named(name!("Boolean")).non_null()),
                    default_value: Some(Value::Boolean(false)),
                    directives: Default::default(),
                },
            ]),
            repeatable: true,
            locations: vec![
                DirectiveLocation::Object,
                DirectiveLocation::Interface,
                DirectiveLocation::Union,
                DirectiveLocation::Enum,
                DirectiveLocation::InputObject,
                DirectiveLocation::Scalar,
            ],
        },
    )?;
    Ok(())
}

pub(crate) fn join_graph_directive(name: &str, url: &str) -> Directive {
    let mut directive = Directive::new(JOIN_GRAPH_DIRECTIVE_NAME);
    directive
        .arguments
        .insert(JOIN_NAME_ARGUMENT_NAME, Value::String(name.to_owned()));
    directive
        .arguments
        .insert(JOIN_URL_ARGUMENT_NAME, Value::String(url.to_owned()));
    directive
}

pub(crate) fn join_type_directive(graph: &Name, key: Option<&str>) -> Directive {
    let mut directive = Directive::new(JOIN_TYPE_DIRECTIVE_NAME);
    directive
        .arguments
        .insert(JOIN_GRAPH_ARGUMENT_NAME, Value::Enum(graph.clone()));
    if let Some(key) = key {
        directive
            .arguments
            .insert(JOIN_KEY_ARGUMENT_NAME, Value::String(key.to_owned()));
    }
    directive
}

pub(crate) fn join_field_directive(
    graph: &Name,
    requires: Option<&str>,
    provides: Option<&str>,
    external: bool,
) -> Directive {
    let mut directive = Directive::new(JOIN_FIELD_DIRECTIVE_NAME.clone());
    directive
        .arguments
        .insert(JOIN_GRAPH_ARGUMENT_NAME, Value::Enum(graph.clone()));
    if let Some(requires) = requires {
        directive.arguments.insert(
            JOIN_REQUIRES_ARGUMENT_NAME,
            Value::String(requires.to_owned()),
        );
    }
    if let Some(provides) = provides {
        directive.arguments.insert(
            JOIN_PROVIDES_ARGUMENT_NAME,
            Value::String(provides.to_owned()),
        );
    }
    if external {
        directive
            .arguments
            .insert(JOIN_EXTERNAL_ARGUMENT_NAME, Value::Boolean(true));
    }
    directive
}

fn required_argument(name: Name, ty: Type) -> ArgumentDefinition {
    ArgumentDefinition {
        name,
        ty: Some(ty.non_null()),
        default_value: None,
        directives: Default::default(),
    }
}

fn optional_argument(name: Name, ty: Type) -> ArgumentDefinition {
    ArgumentDefinition {
        name,
        ty: Some(ty),
        default_value: None,
        directives: Default::default(),
    }
}

fn arguments(
    arguments: impl IntoIterator<Item = ArgumentDefinition>,
) -> IndexMap<Name, ArgumentDefinition> {
    arguments
        .into_iter()
        .map(|argument| (argument.name.clone(), argument))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_enum_names_are_sanitized() {
        assert_eq!(graph_enum_name("Subgraph1").as_str(), "SUBGRAPH1");
        assert_eq!(graph_enum_name("my-reviews").as_str(), "MY_REVIEWS");
        assert_eq!(graph_enum_name("1shop").as_str(), "_1SHOP");
    }
}
