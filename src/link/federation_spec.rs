use crate::error::{FederationError, SingleFederationError};
use crate::link::join_spec::{CORE_DIRECTIVE_NAME, CORE_FEATURE_ARGUMENT_NAME};
use crate::link::{FeatureUrl, Identity};
use crate::schema::FederationSchema;
use crate::values::Directive;
use apollo_compiler::name;
use apollo_compiler::schema::Name;

pub(crate) static FEDERATION_KEY_DIRECTIVE_NAME: Name = name!("key");
pub(crate) const FEDERATION_SHAREABLE_DIRECTIVE_NAME: Name = name!("shareable");
pub(crate) const FEDERATION_OVERRIDE_DIRECTIVE_NAME: Name = name!("override");
pub(crate) const FEDERATION_EXTERNAL_DIRECTIVE_NAME: Name = name!("external");
pub(crate) const FEDERATION_PROVIDES_DIRECTIVE_NAME: Name = name!("provides");
pub(crate) const FEDERATION_REQUIRES_DIRECTIVE_NAME: Name = name!("requires");

pub(crate) const FEDERATION_FIELDS_ARGUMENT_NAME: Name = name!("fields");
pub(crate) const FEDERATION_FROM_ARGUMENT_NAME: Name = name!("from");
pub(crate) const FEDERATION_RESOLVABLE_ARGUMENT_NAME: Name = name!("resolvable");

pub(crate) const LINK_DIRECTIVE_NAME: Name = name!("link");
pub(crate) const LINK_URL_ARGUMENT_NAME: Name = name!("url");

pub(crate) struct KeyDirectiveArguments<'doc> {
    pub(crate) fields: &'doc str,
    pub(crate) resolvable: bool,
}

pub(crate) fn key_directive_arguments(
    directive: &Directive,
) -> Result<KeyDirectiveArguments<'_>, FederationError> {
    Ok(KeyDirectiveArguments {
        fields: fields_argument(directive)?,
        resolvable: directive
            .boolean_argument(&FEDERATION_RESOLVABLE_ARGUMENT_NAME)
            .unwrap_or(true),
    })
}

pub(crate) struct OverrideDirectiveArguments<'doc> {
    pub(crate) from: &'doc str,
}

pub(crate) fn override_directive_arguments(
    directive: &Directive,
) -> Result<OverrideDirectiveArguments<'_>, FederationError> {
    let from = directive
        .string_argument(&FEDERATION_FROM_ARGUMENT_NAME)
        .ok_or_else(|| missing_argument(directive, &FEDERATION_FROM_ARGUMENT_NAME))?;
    Ok(OverrideDirectiveArguments { from })
}

/// Reads the `fields:` argument shared by `@key`, `@provides` and `@requires`.
pub(crate) fn fields_argument(directive: &Directive) -> Result<&str, FederationError> {
    directive
        .string_argument(&FEDERATION_FIELDS_ARGUMENT_NAME)
        .ok_or_else(|| missing_argument(directive, &FEDERATION_FIELDS_ARGUMENT_NAME))
}

fn missing_argument(directive: &Directive, argument: &Name) -> FederationError {
    SingleFederationError::DirectiveDefinitionInvalid {
        message: format!(
            "Directive \"@{}\" is missing required argument \"{}\"",
            directive.name, argument
        ),
    }
    .into()
}

/// Finds the federation feature URL declared on the schema definition, through either
/// `@link(url:)` or `@core(feature:)`. Returns `None` when the schema doesn't declare one
/// (in which case federation directives are still recognized by their spec names).
pub(crate) fn federation_link_url(schema: &FederationSchema) -> Option<FeatureUrl> {
    let directives = &schema.schema_definition().directives;
    for directive in directives.iter() {
        let url = if directive.name == LINK_DIRECTIVE_NAME {
            directive.string_argument(&LINK_URL_ARGUMENT_NAME)
        } else if directive.name == CORE_DIRECTIVE_NAME {
            directive.string_argument(&CORE_FEATURE_ARGUMENT_NAME)
        } else {
            None
        };
        let Some(url) = url else {
            continue;
        };
        let Ok(feature_url) = FeatureUrl::parse(url) else {
            continue;
        };
        if feature_url.identity == Identity::federation_identity() {
            return Some(feature_url);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Version;

    #[test]
    fn detects_federation_link() {
        let schema = FederationSchema::parse(
            r#"
            schema @link(url: "https://specs.apollo.dev/federation/v2.3", import: ["@key"]) {
              query: Query
            }

            type Query {
              x: Int
            }
            "#,
        )
        .unwrap();
        let url = federation_link_url(&schema).expect("federation link");
        assert_eq!(url.version, Version { major: 2, minor: 3 });
    }

    #[test]
    fn ignores_non_federation_links() {
        let schema = FederationSchema::parse(
            r#"
            schema @link(url: "https://specs.apollo.dev/link/v1.0") {
              query: Query
            }

            type Query {
              x: Int
            }
            "#,
        )
        .unwrap();
        assert!(federation_link_url(&schema).is_none());
    }
}
