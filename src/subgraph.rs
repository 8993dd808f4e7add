use crate::error::{FederationError, SingleFederationError};
use crate::link::federation_spec::federation_link_url;
use crate::link::FeatureUrl;
use crate::schema::subgraph_metadata::SubgraphMetadata;
use crate::schema::FederationSchema;
use std::fmt::{Display, Formatter};

/// One subgraph going into composition: a service name, its routing URL, and its schema.
///
/// Federation metadata (the key/shareable predicates) is computed at construction and is
/// not refreshed if the schema is mutated afterwards.
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: String,
    pub url: String,
    pub schema: FederationSchema,
    pub(crate) metadata: SubgraphMetadata,
}

impl Subgraph {
    pub fn parse(name: &str, url: &str, type_defs: &str) -> Result<Subgraph, FederationError> {
        let schema = FederationSchema::parse(type_defs)?;
        Self::new(name, url, schema)
    }

    pub fn new(
        name: &str,
        url: &str,
        schema: FederationSchema,
    ) -> Result<Subgraph, FederationError> {
        if name.is_empty() {
            return Err(SingleFederationError::InvalidSubgraph {
                message: "subgraph name cannot be empty".to_owned(),
            }
            .into());
        }
        let metadata = SubgraphMetadata::new(&schema)?;
        Ok(Subgraph {
            name: name.to_owned(),
            url: url.to_owned(),
            schema,
            metadata,
        })
    }

    pub(crate) fn metadata(&self) -> &SubgraphMetadata {
        &self.metadata
    }

    /// The federation feature URL this subgraph `@link`s, when it declares one.
    pub fn federation_feature(&self) -> Option<FeatureUrl> {
        federation_link_url(&self.schema)
    }
}

impl Display for Subgraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}
