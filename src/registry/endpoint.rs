// src/registry/endpoint.rs
use serde::{Deserialize, Deserializer, Serialize};

/// A named HTTP URL tracked in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Ordered list of endpoints as persisted on disk.
///
/// Edits return a new registry rather than mutating in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(rename = "Servers", default, deserialize_with = "null_as_empty")]
    servers: Vec<Endpoint>,
}

impl Registry {
    pub fn new(servers: Vec<Endpoint>) -> Self {
        Self { servers }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.servers
    }

    pub fn into_endpoints(self) -> Vec<Endpoint> {
        self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Registry with `(name, url)` appended at the end.
    pub fn with_added(&self, name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut servers = self.servers.clone();
        servers.push(Endpoint::new(name, url));
        Self { servers }
    }

    /// Registry without any entry called `name`. Unknown names leave it unchanged.
    pub fn without(&self, name: &str) -> Self {
        Self {
            servers: self
                .servers
                .iter()
                .filter(|endpoint| endpoint.name != name)
                .cloned()
                .collect(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Endpoint>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Endpoint>>::deserialize(deserializer)?.unwrap_or_default())
}
