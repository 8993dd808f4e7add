#![allow(dead_code)] // TODO: Narrow the position API once the planner grows more callers.

pub mod error;
pub mod link;
pub mod merge;
pub mod query_plan;
pub mod schema;
pub mod subgraph;
pub mod values;

pub use crate::error::{
    CompositionError, CompositionHint, ErrorCode, FederationError, SingleFederationError,
};
pub use crate::merge::{merge_subgraphs, MergeFailure, MergeSuccess};
pub use crate::schema::{FederationSchema, FrozenFederationSchema};
pub use crate::subgraph::Subgraph;

use crate::link::federation_spec::{LINK_DIRECTIVE_NAME, LINK_URL_ARGUMENT_NAME};
use crate::link::join_spec::{CORE_DIRECTIVE_NAME, CORE_FEATURE_ARGUMENT_NAME};
use crate::link::{FeatureUrl, Identity};

/// Checks that the schema declares the join feature (through `@core` or `@link`), which is
/// what makes it a supergraph rather than a plain schema.
pub(crate) fn validate_supergraph(schema: &FederationSchema) -> Result<(), FederationError> {
    let has_join_feature = schema
        .schema_definition()
        .directives
        .iter()
        .filter_map(|directive| {
            if directive.name == CORE_DIRECTIVE_NAME {
                directive.string_argument(&CORE_FEATURE_ARGUMENT_NAME)
            } else if directive.name == LINK_DIRECTIVE_NAME {
                directive.string_argument(&LINK_URL_ARGUMENT_NAME)
            } else {
                None
            }
        })
        .filter_map(|url| FeatureUrl::parse(url).ok())
        .any(|url| url.identity == Identity::join_identity());
    if !has_join_feature {
        return Err(SingleFederationError::InvalidSupergraph {
            message: "must be a core schema using the join spec".to_owned(),
        }
        .into());
    }
    Ok(())
}

#[derive(Debug)]
pub struct Supergraph {
    pub schema: FrozenFederationSchema,
}

impl Supergraph {
    pub fn new(schema_str: &str) -> Result<Self, FederationError> {
        let schema = FederationSchema::parse(schema_str)?;
        Self::from_schema(schema)
    }

    pub fn from_schema(schema: FederationSchema) -> Result<Self, FederationError> {
        validate_supergraph(&schema)?;
        Ok(Self {
            schema: schema.freeze(),
        })
    }

    pub fn compose(subgraphs: &[Subgraph]) -> Result<Self, MergeFailure> {
        let schema = merge_subgraphs(subgraphs)?.schema;
        Ok(Self { schema })
    }

    pub fn print_sdl(&self) -> String {
        self.schema.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_schemas_without_the_join_spec() {
        let error = Supergraph::new(
            r#"
            type Query {
              x: Int
            }
            "#,
        )
        .expect_err("not a supergraph");
        assert!(error.to_string().contains("join spec"));
    }

    #[test]
    fn accepts_join_annotated_supergraphs() {
        let supergraph = Supergraph::new(
            r#"
            schema @core(feature: "https://specs.apollo.dev/core/v0.2") @core(feature: "https://specs.apollo.dev/join/v0.1", for: EXECUTION) {
              query: Query
            }

            type Query {
              t: T @join__field(graph: SUBGRAPH1)
            }

            type T @join__type(graph: SUBGRAPH1, key: "k") @join__type(graph: SUBGRAPH2, key: "k") {
              k: ID
              a: Int @join__field(graph: SUBGRAPH2)
            }
            "#,
        )
        .expect("valid supergraph");
        let sdl = supergraph.print_sdl();
        assert!(sdl.contains("@join__type(graph: SUBGRAPH1, key: \"k\")"));
    }
}
