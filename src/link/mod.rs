pub(crate) mod federation_spec;
pub(crate) mod join_spec;

use crate::error::{FederationError, SingleFederationError};
use std::fmt::{Display, Formatter};

/// The identity of a feature: the URL prefix that designates it, minus the version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub domain: String,
    pub name: String,
}

impl Identity {
    pub fn core_identity() -> Identity {
        Identity {
            domain: "https://specs.apollo.dev".to_owned(),
            name: "core".to_owned(),
        }
    }

    pub fn join_identity() -> Identity {
        Identity {
            domain: "https://specs.apollo.dev".to_owned(),
            name: "join".to_owned(),
        }
    }

    pub fn federation_identity() -> Identity {
        Identity {
            domain: "https://specs.apollo.dev".to_owned(),
            name: "federation".to_owned(),
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

impl Version {
    pub fn satisfies(&self, required: &Version) -> bool {
        self.major == required.major && self.minor >= required.minor
    }
}

/// A fully-versioned feature URL, e.g. `https://specs.apollo.dev/federation/v2.5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureUrl {
    pub identity: Identity,
    pub version: Version,
}

impl FeatureUrl {
    pub fn parse(value: &str) -> Result<FeatureUrl, FederationError> {
        let url = url::Url::parse(value).map_err(|_| invalid_feature_url(value))?;
        let mut segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(|| invalid_feature_url(value))?
            .filter(|segment| !segment.is_empty())
            .collect();
        let version = segments.pop().ok_or_else(|| invalid_feature_url(value))?;
        let name = segments.pop().ok_or_else(|| invalid_feature_url(value))?;
        let mut domain = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        for segment in segments {
            domain.push('/');
            domain.push_str(segment);
        }
        Ok(FeatureUrl {
            identity: Identity {
                domain,
                name: name.to_owned(),
            },
            version: parse_version(version).ok_or_else(|| invalid_feature_url(value))?,
        })
    }
}

impl Display for FeatureUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.identity, self.version)
    }
}

fn parse_version(value: &str) -> Option<Version> {
    let value = value.strip_prefix('v')?;
    let (major, minor) = value.split_once('.')?;
    Some(Version {
        major: major.parse().ok()?,
        minor: minor.parse().ok()?,
    })
}

fn invalid_feature_url(value: &str) -> FederationError {
    SingleFederationError::InvalidGraphQL {
        message: format!("Invalid feature URL \"{}\"", value),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feature_urls() {
        let url = FeatureUrl::parse("https://specs.apollo.dev/federation/v2.5").unwrap();
        assert_eq!(url.identity, Identity::federation_identity());
        assert_eq!(url.version, Version { major: 2, minor: 5 });
        assert_eq!(url.to_string(), "https://specs.apollo.dev/federation/v2.5");
    }

    #[test]
    fn rejects_malformed_feature_urls() {
        assert!(FeatureUrl::parse("not a url").is_err());
        assert!(FeatureUrl::parse("https://specs.apollo.dev/v2.5").is_err());
        assert!(FeatureUrl::parse("https://specs.apollo.dev/federation/2.5").is_err());
    }
}
