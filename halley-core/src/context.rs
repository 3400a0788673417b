//! Explicit per-run operations context.
//!
//! All paths, names, and external-command settings an operation needs are
//! gathered here once at startup and passed by reference, instead of being
//! read from the working directory or process environment mid-run.

use std::path::PathBuf;

use crate::manifest::{ManifestTemplate, PortBinding, VolumeBinding};
use crate::runner::ComposeCommand;
use crate::schema::KeySchema;

/// Default image repository for the node.
pub const DEFAULT_IMAGE: &str = "aztecprotocol/aztec";
/// Default known-good image tag; operators override it to roll forward.
pub const DEFAULT_IMAGE_TAG: &str = "2.1.2";
/// Default network the node joins.
pub const DEFAULT_NETWORK: &str = "alpha-testnet";

const NODE_PORT: u16 = 8080;
const ADMIN_PORT: u16 = 8880;
const P2P_PORT: u16 = 40400;
const CONTAINER_DATA_DIR: &str = "/data";

#[derive(Debug, Clone)]
pub struct OpsContext {
    /// Directory holding the `.env` store, the manifest, and their backups.
    pub base_dir: PathBuf,
    /// Compose service (and container) name.
    pub service_name: String,
    /// How to invoke the compose CLI.
    pub compose: ComposeCommand,
    pub image: String,
    pub tag: String,
    pub network: String,
    /// Local JSON-RPC admin endpoint of the running node.
    pub admin_endpoint: String,
    /// Host directory mounted as the node's data volume.
    pub data_dir: PathBuf,
}

impl OpsContext {
    pub fn new(base_dir: PathBuf) -> Self {
        let data_dir = base_dir.join("data");
        Self {
            base_dir,
            service_name: "sequencer".to_string(),
            compose: ComposeCommand::default(),
            image: DEFAULT_IMAGE.to_string(),
            tag: DEFAULT_IMAGE_TAG.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            admin_endpoint: format!("http://localhost:{ADMIN_PORT}"),
            data_dir,
        }
    }

    /// Default base directory: `~/.halley`.
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".halley")
    }

    pub fn env_path(&self) -> PathBuf {
        self.base_dir.join(".env")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join("docker-compose.yml")
    }

    /// Build the manifest template for this context.
    ///
    /// The environment block references every key the schema manages; the
    /// optional snapshot URL is only passed for the initial sync.
    pub fn template(&self, schema: &KeySchema, snapshot_url: Option<&str>) -> ManifestTemplate {
        let mut command = vec![
            "start".to_string(),
            "--node".to_string(),
            "--archiver".to_string(),
            "--sequencer".to_string(),
            "--network".to_string(),
            self.network.clone(),
            "--port".to_string(),
            NODE_PORT.to_string(),
        ];
        if let Some(url) = snapshot_url {
            command.push("--snapshot-sync-url".to_string());
            command.push(url.to_string());
        }

        ManifestTemplate {
            service_name: self.service_name.clone(),
            image: self.image.clone(),
            tag: self.tag.clone(),
            ports: vec![
                PortBinding::tcp(NODE_PORT),
                PortBinding::tcp(ADMIN_PORT),
                PortBinding::tcp(P2P_PORT),
                PortBinding::udp(P2P_PORT),
            ],
            volumes: vec![VolumeBinding::new(
                self.data_dir.clone(),
                CONTAINER_DATA_DIR,
            )],
            env_keys: schema
                .managed_keys()
                .into_iter()
                .map(str::to_string)
                .collect(),
            env_file: PathBuf::from(".env"),
            restart: "unless-stopped".to_string(),
            command,
        }
    }

    /// Defaults written into a fresh store for keys the operator is not
    /// prompted for.
    pub fn default_settings(&self) -> Vec<(&'static str, String)> {
        vec![
            (KeySchema::P2P_PORT, P2P_PORT.to_string()),
            (KeySchema::PORT, NODE_PORT.to_string()),
            (KeySchema::DATA_DIRECTORY, CONTAINER_DATA_DIR.to_string()),
            (KeySchema::LOG_LEVEL, "info".to_string()),
        ]
    }
}
