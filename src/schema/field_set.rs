use crate::error::{FederationError, SingleFederationError};
use crate::schema::position::{ObjectFieldDefinitionPosition, ObjectTypeDefinitionPosition};
use crate::schema::FederationSchema;
use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::schema::Name;

/// Parses the string value of a `fields:` argument (`@key`, `@requires`, `@provides`) into a
/// selection set using the external parser. Curly braces are added when the value doesn't
/// already have them.
pub(crate) fn parse_field_set(value: &str) -> Result<Vec<ast::Selection>, FederationError> {
    let trimmed = value.trim();
    let source = if trimmed.starts_with('{') {
        trimmed.to_owned()
    } else {
        format!("{{ {} }}", trimmed)
    };
    let document = ast::Document::parse(source, "field_set.graphql")?;
    for definition in &document.definitions {
        if let ast::Definition::OperationDefinition(operation) = definition {
            return Ok(operation.selection_set.clone());
        }
    }
    Err(SingleFederationError::InvalidGraphQL {
        message: format!("Invalid field set \"{}\"", value),
    }
    .into())
}

/// Resolves every field a `fields:` argument selects, as positions in the given schema.
/// Nested selections descend into the named field's base type.
pub(crate) fn collect_target_fields_from_field_set(
    schema: &FederationSchema,
    parent_type_name: Name,
    value: &str,
) -> Result<Vec<ObjectFieldDefinitionPosition>, FederationError> {
    let selections = parse_field_set(value)?;
    let mut fields = vec![];
    collect_from_selections(schema, &parent_type_name, &selections, value, &mut fields)?;
    Ok(fields)
}

fn collect_from_selections(
    schema: &FederationSchema,
    parent_type_name: &Name,
    selections: &[ast::Selection],
    field_set: &str,
    out: &mut Vec<ObjectFieldDefinitionPosition>,
) -> Result<(), FederationError> {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                if field.name == name!("__typename") {
                    continue;
                }
                let parent = ObjectTypeDefinitionPosition {
                    type_name: parent_type_name.clone(),
                };
                let object = parent.get(schema)?;
                let Some(definition) = object.fields.get(&field.name) else {
                    return Err(SingleFederationError::CannotQueryField {
                        field_name: field.name.to_string(),
                        type_name: parent_type_name.to_string(),
                    }
                    .into());
                };
                out.push(parent.field(field.name.clone()));
                if !field.selection_set.is_empty() {
                    let field_type_name = crate::schema::definitions::resolved_type(
                        &definition.ty,
                        parent.field(field.name.clone()),
                    )?
                    .inner_named_type()
                    .clone();
                    collect_from_selections(
                        schema,
                        &field_type_name,
                        &field.selection_set,
                        field_set,
                        out,
                    )?;
                }
            }
            ast::Selection::InlineFragment(fragment) => {
                let fragment_type_name = fragment
                    .type_condition
                    .clone()
                    .unwrap_or_else(|| parent_type_name.clone());
                collect_from_selections(
                    schema,
                    &fragment_type_name,
                    &fragment.selection_set,
                    field_set,
                    out,
                )?;
            }
            ast::Selection::FragmentSpread(_) => {
                return Err(SingleFederationError::InvalidGraphQL {
                    message: format!(
                        "Fragment spreads are not allowed in field set \"{}\"",
                        field_set
                    ),
                }
                .into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_nested_target_fields() {
        let schema = FederationSchema::parse(
            r#"
            type T {
              id: ID
              org: Org
            }

            type Org {
              id: ID
            }
            "#,
        )
        .unwrap();
        let fields =
            collect_target_fields_from_field_set(&schema, name!("T"), "id org { id }").unwrap();
        let coordinates: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
        assert_eq!(coordinates, vec!["T.id", "T.org", "Org.id"]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let schema = FederationSchema::parse("type T { id: ID }").unwrap();
        let result = collect_target_fields_from_field_set(&schema, name!("T"), "missing");
        assert!(result.is_err());
    }
}
