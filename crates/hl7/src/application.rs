//! HL7 applications and where to reach them.
//!
//! An application is named `APPLICATION|FACILITY`, the form carried in
//! MSH-3/4 and MSH-5/6. The local [`Hl7Device`] owns the applications this
//! node sends from; remote applications are looked up through an
//! [`Hl7ApplicationCache`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, TransportError};

fn default_true() -> bool {
    true
}

/// A network endpoint of an HL7 application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hl7Connection {
    pub hostname: String,
    /// Listening port. Connections without a port can only initiate.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_true")]
    pub installed: bool,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
}

impl Hl7Connection {
    pub fn new(hostname: &str, port: Option<u16>) -> Self {
        Hl7Connection {
            hostname: hostname.to_string(),
            port,
            installed: true,
            connect_timeout_ms: None,
            response_timeout_ms: None,
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    /// `hostname:port`, if the connection listens. IPv6 literals are
    /// bracketed.
    pub fn address(&self) -> Option<String> {
        let port = self.port?;
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            Some(format!("[{}]:{}", self.hostname, port))
        } else {
            Some(format!("{}:{}", self.hostname, port))
        }
    }
}

/// A local/remote connection pair that can talk to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleConnection {
    pub local: Hl7Connection,
    pub remote: Hl7Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hl7Application {
    /// `APPLICATION|FACILITY`.
    pub name: String,
    /// MSH-18 value used for outgoing messages, absent for ASCII.
    #[serde(default)]
    pub default_charset: Option<String>,
    #[serde(default)]
    pub connections: Vec<Hl7Connection>,
}

impl Hl7Application {
    pub fn new(name: &str) -> Self {
        Hl7Application {
            name: name.to_string(),
            default_charset: None,
            connections: Vec::new(),
        }
    }

    pub fn with_charset(mut self, charset: &str) -> Self {
        self.default_charset = Some(charset.to_string());
        self
    }

    pub fn with_connection(mut self, connection: Hl7Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn default_charset(&self) -> Option<&str> {
        self.default_charset.as_deref()
    }

    /// Pick the first installed local connection and the first installed,
    /// listening remote connection.
    pub fn find_compatible_connection(
        &self,
        remote: &Hl7Application,
    ) -> Result<CompatibleConnection, TransportError> {
        let local = self.connections.iter().find(|c| c.installed);
        let remote_conn = remote
            .connections
            .iter()
            .find(|c| c.installed && c.port.is_some());
        match (local, remote_conn) {
            (Some(l), Some(r)) => Ok(CompatibleConnection {
                local: l.clone(),
                remote: r.clone(),
            }),
            _ => Err(TransportError::Incompatible {
                local: self.name.clone(),
                remote: remote.name.clone(),
            }),
        }
    }
}

/// The applications hosted by this node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hl7Device {
    #[serde(default)]
    pub applications: Vec<Hl7Application>,
}

impl Hl7Device {
    pub fn new(applications: Vec<Hl7Application>) -> Self {
        Hl7Device { applications }
    }

    pub fn application(&self, name: &str) -> Option<&Hl7Application> {
        self.applications.iter().find(|a| a.name == name)
    }

    /// Like [`Hl7Device::application`] but with a configuration error for unknown names.
    pub fn require_application(&self, name: &str) -> Result<&Hl7Application, ConfigurationError> {
        self.application(name)
            .ok_or_else(|| ConfigurationError::UnknownLocalApplication {
                name: name.to_string(),
            })
    }
}

/// Lookup of remote HL7 applications by name.
#[async_trait]
pub trait Hl7ApplicationCache: Send + Sync {
    async fn find_application(&self, name: &str) -> Result<Hl7Application, ConfigurationError>;
}

/// Application cache backed by a fixed list, e.g. from the node configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticApplicationCache {
    applications: HashMap<String, Hl7Application>,
}

impl StaticApplicationCache {
    pub fn new(applications: impl IntoIterator<Item = Hl7Application>) -> Self {
        StaticApplicationCache {
            applications: applications
                .into_iter()
                .map(|a| (a.name.clone(), a))
                .collect(),
        }
    }
}

#[async_trait]
impl Hl7ApplicationCache for StaticApplicationCache {
    async fn find_application(&self, name: &str) -> Result<Hl7Application, ConfigurationError> {
        self.applications
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownRemoteApplication {
                name: name.to_string(),
            })
    }
}
