use crate::schema::definitions::{
    ArgumentDefinition, DirectiveDefinition, EnumType, FieldDefinition, InputFieldDefinition,
    InputObjectType, ObjectType, ScalarType, TypeDefinition, UnionType,
};
use crate::schema::{FederationSchema, FrozenFederationSchema};
use crate::values::DirectiveList;
use itertools::Itertools;
use std::fmt::{Display, Formatter, Write};

/// Prints the canonical SDL form. Types and directive definitions appear in insertion order,
/// which is what makes composition output deterministic.
impl Display for FederationSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        if let Some(block) = schema_definition_block(self) {
            f.write_str(&block)?;
            first = false;
        }
        for definition in self.directive_definitions.values() {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write_directive_definition(f, definition)?;
        }
        for type_ in self.types.values() {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            match type_ {
                TypeDefinition::Scalar(type_) => write_scalar_type(f, type_)?,
                TypeDefinition::Object(type_) => write_object_type(f, type_)?,
                TypeDefinition::Union(type_) => write_union_type(f, type_)?,
                TypeDefinition::InputObject(type_) => write_input_object_type(f, type_)?,
                TypeDefinition::Enum(type_) => write_enum_type(f, type_)?,
            }
        }
        Ok(())
    }
}

impl Display for FrozenFederationSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&**self, f)
    }
}

fn schema_definition_block(schema: &FederationSchema) -> Option<String> {
    let definition = &schema.schema_definition;
    let conventional = |root: &Option<apollo_compiler::schema::Name>, name: &str| {
        root.as_ref().map_or(true, |root| root.as_str() == name)
    };
    let all_conventional = conventional(&definition.query, "Query")
        && conventional(&definition.mutation, "Mutation")
        && conventional(&definition.subscription, "Subscription");
    let has_roots = definition.query.is_some()
        || definition.mutation.is_some()
        || definition.subscription.is_some();
    if (definition.directives.is_empty() && all_conventional) || !has_roots {
        return None;
    }
    let mut out = String::from("schema");
    if !definition.directives.is_empty() {
        out.push(' ');
        out.push_str(&definition.directives.to_string());
    }
    out.push_str(" {\n");
    if let Some(query) = &definition.query {
        let _ = writeln!(out, "  query: {}", query);
    }
    if let Some(mutation) = &definition.mutation {
        let _ = writeln!(out, "  mutation: {}", mutation);
    }
    if let Some(subscription) = &definition.subscription {
        let _ = writeln!(out, "  subscription: {}", subscription);
    }
    out.push_str("}\n");
    Some(out)
}

fn directives_suffix(directives: &DirectiveList) -> String {
    if directives.is_empty() {
        String::new()
    } else {
        format!(" {}", directives)
    }
}

fn write_directive_definition(
    f: &mut Formatter<'_>,
    definition: &DirectiveDefinition,
) -> std::fmt::Result {
    write!(f, "directive @{}", definition.name)?;
    if !definition.arguments.is_empty() {
        write!(
            f,
            "({})",
            definition
                .arguments
                .values()
                .map(argument_string)
                .join(", ")
        )?;
    }
    if definition.repeatable {
        f.write_str(" repeatable")?;
    }
    writeln!(
        f,
        " on {}",
        definition
            .locations
            .iter()
            .map(|location| location.to_string())
            .join(" | ")
    )
}

fn argument_string(argument: &ArgumentDefinition) -> String {
    let mut out = format!("{}: {}", argument.name, type_string(&argument.ty));
    if let Some(default_value) = &argument.default_value {
        let _ = write!(out, " = {}", default_value);
    }
    if !argument.directives.is_empty() {
        let _ = write!(out, " {}", argument.directives);
    }
    out
}

fn type_string(ty: &Option<crate::schema::definitions::Type>) -> String {
    match ty {
        Some(ty) => ty.to_string(),
        // A cleared reference has no printable form; this keeps printing total for
        // debugging, though such a schema is no longer parseable.
        None => "<detached>".to_owned(),
    }
}

fn write_scalar_type(f: &mut Formatter<'_>, type_: &ScalarType) -> std::fmt::Result {
    writeln!(
        f,
        "scalar {}{}",
        type_.name,
        directives_suffix(&type_.directives)
    )
}

fn write_object_type(f: &mut Formatter<'_>, type_: &ObjectType) -> std::fmt::Result {
    writeln!(
        f,
        "type {}{} {{",
        type_.name,
        directives_suffix(&type_.directives)
    )?;
    for field in type_.fields.values() {
        write_field_definition(f, field)?;
    }
    writeln!(f, "}}")
}

fn write_field_definition(f: &mut Formatter<'_>, field: &FieldDefinition) -> std::fmt::Result {
    write!(f, "  {}", field.name)?;
    if !field.arguments.is_empty() {
        write!(
            f,
            "({})",
            field.arguments.values().map(argument_string).join(", ")
        )?;
    }
    writeln!(
        f,
        ": {}{}",
        type_string(&field.ty),
        directives_suffix(&field.directives)
    )
}

fn write_union_type(f: &mut Formatter<'_>, type_: &UnionType) -> std::fmt::Result {
    writeln!(
        f,
        "union {}{} = {}",
        type_.name,
        directives_suffix(&type_.directives),
        type_.members.iter().join(" | ")
    )
}

fn write_input_object_type(f: &mut Formatter<'_>, type_: &InputObjectType) -> std::fmt::Result {
    writeln!(
        f,
        "input {}{} {{",
        type_.name,
        directives_suffix(&type_.directives)
    )?;
    for field in type_.fields.values() {
        write_input_field_definition(f, field)?;
    }
    writeln!(f, "}}")
}

fn write_input_field_definition(
    f: &mut Formatter<'_>,
    field: &InputFieldDefinition,
) -> std::fmt::Result {
    write!(f, "  {}: {}", field.name, type_string(&field.ty))?;
    if let Some(default_value) = &field.default_value {
        write!(f, " = {}", default_value)?;
    }
    writeln!(f, "{}", directives_suffix(&field.directives))
}

fn write_enum_type(f: &mut Formatter<'_>, type_: &EnumType) -> std::fmt::Result {
    writeln!(
        f,
        "enum {}{} {{",
        type_.name,
        directives_suffix(&type_.directives)
    )?;
    for value in type_.values.values() {
        writeln!(
            f,
            "  {}{}",
            value.value,
            directives_suffix(&value.directives)
        )?;
    }
    writeln!(f, "}}")
}
