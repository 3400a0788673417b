//! Versioned configuration key schema.
//!
//! Different node releases manage different key sets for the same concern
//! (`ETHEREUM_RPC_URL` in older releases, `ETHEREUM_HOSTS` in newer ones).
//! The key set is therefore data: callers pick a version explicitly or
//! detect it from an existing store, and no set is assumed authoritative.

use crate::envfile::EnvFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V1,
    V2,
}

impl SchemaVersion {
    /// The newest schema, used when nothing else decides.
    pub fn latest() -> Self {
        SchemaVersion::V2
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "v1" | "V1" | "1" => Some(SchemaVersion::V1),
            "v2" | "V2" | "2" => Some(SchemaVersion::V2),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of configuration keys managed for one schema version.
#[derive(Debug, Clone, Copy)]
pub struct KeySchema {
    version: SchemaVersion,
}

impl KeySchema {
    // Keys shared by every schema version.
    pub const COINBASE: &'static str = "COINBASE";
    pub const P2P_IP: &'static str = "P2P_IP";
    pub const P2P_PORT: &'static str = "P2P_PORT";
    pub const PORT: &'static str = "PORT";
    pub const DATA_DIRECTORY: &'static str = "DATA_DIRECTORY";
    pub const LOG_LEVEL: &'static str = "LOG_LEVEL";

    pub fn new(version: SchemaVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Key naming the upstream execution-layer endpoint(s).
    pub fn ethereum_hosts(&self) -> &'static str {
        match self.version {
            SchemaVersion::V1 => "ETHEREUM_RPC_URL",
            SchemaVersion::V2 => "ETHEREUM_HOSTS",
        }
    }

    /// Key naming the upstream consensus-layer endpoint(s).
    pub fn consensus_hosts(&self) -> &'static str {
        match self.version {
            SchemaVersion::V1 => "CONSENSUS_BEACON_URL",
            SchemaVersion::V2 => "L1_CONSENSUS_HOST_URLS",
        }
    }

    /// Key holding the validator signing key material.
    pub fn validator_keys(&self) -> &'static str {
        match self.version {
            SchemaVersion::V1 => "VALIDATOR_PRIVATE_KEY",
            SchemaVersion::V2 => "VALIDATOR_PRIVATE_KEYS",
        }
    }

    /// Every key this schema manages, in the order it is written to a
    /// fresh store.
    pub fn managed_keys(&self) -> Vec<&'static str> {
        vec![
            self.ethereum_hosts(),
            self.consensus_hosts(),
            self.validator_keys(),
            Self::COINBASE,
            Self::P2P_IP,
            Self::P2P_PORT,
            Self::PORT,
            Self::DATA_DIRECTORY,
            Self::LOG_LEVEL,
        ]
    }

    /// Detect which schema an existing store uses, preferring the newer
    /// version when both leave traces. Returns `None` for a store with no
    /// version-specific keys.
    pub fn detect(store: &EnvFile) -> Option<SchemaVersion> {
        let v2 = KeySchema::new(SchemaVersion::V2);
        if store.get(v2.ethereum_hosts()).is_some()
            || store.get(v2.consensus_hosts()).is_some()
            || store.get(v2.validator_keys()).is_some()
        {
            return Some(SchemaVersion::V2);
        }

        let v1 = KeySchema::new(SchemaVersion::V1);
        if store.get(v1.ethereum_hosts()).is_some()
            || store.get(v1.consensus_hosts()).is_some()
            || store.get(v1.validator_keys()).is_some()
        {
            return Some(SchemaVersion::V1);
        }

        None
    }
}
