//! Transport collaborator interface
//!
//! The engine talks to the controller only through [`AdsTransport`]. The wire
//! protocol lives behind it; the engine owns the transport exclusively and
//! never calls it concurrently.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::error::{AdsSyncError, Result};
use crate::store::ValueMap;

/// Default AMS port of the first TwinCAT 3 PLC runtime
pub const DEFAULT_ADS_PORT: u16 = 851;

/// AMS net id, six dot-separated octets (`5.80.201.232.1.1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AmsNetId([u8; 6]);

impl AmsNetId {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for AmsNetId {
    type Err = AdsSyncError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 6 {
            return Err(AdsSyncError::config(format!(
                "AMS net id '{}' must have 6 octets, found {}",
                s,
                parts.len()
            )));
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            *slot = part.parse::<u8>().map_err(|_| {
                AdsSyncError::config(format!("AMS net id '{}' has invalid octet '{}'", s, part))
            })?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for AmsNetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{}.{}.{}.{}.{}.{}", a, b, c, d, e, g)
    }
}

/// Session parameters handed to a transport
///
/// The credentials are opaque to the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct AdsTarget {
    pub net_id: AmsNetId,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl AdsTarget {
    pub fn new(net_id: AmsNetId, port: u16) -> Self {
        Self {
            net_id,
            port,
            username: String::new(),
            password: String::new(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }
}

impl fmt::Debug for AdsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsTarget")
            .field("net_id", &self.net_id.to_string())
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for AdsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.net_id, self.port)
    }
}

/// Symbol-level access to one controller
#[async_trait]
pub trait AdsTransport: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether a session is currently open
    fn is_open(&self) -> bool;

    /// Establish the session
    async fn open(&mut self) -> Result<()>;

    /// Release the session; closing a closed transport is a no-op
    async fn close(&mut self) -> Result<()>;

    /// Whether the controller exposes `name`
    async fn symbol_exists(&mut self, name: &str) -> Result<bool>;

    /// Read every named symbol in one batch
    async fn read_batch(&mut self, names: &[String]) -> Result<ValueMap>;

    /// Write every entry in one batch
    async fn write_batch(&mut self, values: &ValueMap) -> Result<()>;
}
