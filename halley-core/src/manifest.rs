//! Typed service-manifest template and renderer.
//!
//! The manifest is a derived artifact: every render produces the complete
//! compose document from the template plus the configured key names, never
//! a patch of a previous file. Environment entries reference the store's
//! keys as `${KEY}` so the compose CLI resolves them against the `.env`
//! file at launch time and secret values are never duplicated into the
//! manifest. Going through serde rather than string templating means a
//! value can never break the document structure.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::backup::backup_rename;
use crate::errors::{CoreError, Result};
use crate::fsio::write_secure_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A host:container port binding, with a `/udp` suffix where needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host: u16,
    pub container: u16,
    pub protocol: Protocol,
}

impl PortBinding {
    pub fn tcp(port: u16) -> Self {
        Self {
            host: port,
            container: port,
            protocol: Protocol::Tcp,
        }
    }

    pub fn udp(port: u16) -> Self {
        Self {
            host: port,
            container: port,
            protocol: Protocol::Udp,
        }
    }

    fn render(&self) -> String {
        match self.protocol {
            Protocol::Tcp => format!("{}:{}", self.host, self.container),
            Protocol::Udp => format!("{}:{}/udp", self.host, self.container),
        }
    }
}

/// A host-path:container-path volume binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub host: PathBuf,
    pub container: PathBuf,
}

impl VolumeBinding {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    fn render(&self) -> String {
        format!("{}:{}", self.host.display(), self.container.display())
    }
}

/// Fixed structural template for the service manifest.
///
/// The image tag is an explicit input so operators pin to a known-good
/// release; drift between the declared and running tag is checked
/// externally, not here.
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    pub service_name: String,
    pub image: String,
    pub tag: String,
    pub ports: Vec<PortBinding>,
    pub volumes: Vec<VolumeBinding>,
    /// Config store keys referenced (not inlined) by the environment block.
    pub env_keys: Vec<String>,
    /// Env file the compose CLI resolves those references against.
    pub env_file: PathBuf,
    pub restart: String,
    pub command: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ComposeDocument {
    services: IndexMap<String, ComposeService>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ComposeService {
    image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    env_file: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    environment: IndexMap<String, String>,
    restart: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    command: Vec<String>,
}

/// Render the complete manifest text from the template.
///
/// Pure and total: identical templates produce byte-identical output, and
/// no part of a previous manifest is consulted.
pub fn render(template: &ManifestTemplate) -> Result<String> {
    let mut environment = IndexMap::new();
    for key in &template.env_keys {
        environment.insert(key.clone(), format!("${{{key}}}"));
    }

    let service = ComposeService {
        image: format!("{}:{}", template.image, template.tag),
        ports: template.ports.iter().map(PortBinding::render).collect(),
        volumes: template.volumes.iter().map(VolumeBinding::render).collect(),
        env_file: vec![template.env_file.display().to_string()],
        environment,
        restart: template.restart.clone(),
        command: template.command.clone(),
    };

    let mut services = IndexMap::new();
    services.insert(template.service_name.clone(), service);

    serde_yaml::to_string(&ComposeDocument { services }).map_err(CoreError::from)
}

/// Write the manifest, moving any existing file aside to a timestamped
/// backup first. Returns the backup path when one was taken.
pub fn write_manifest(path: &Path, text: &str) -> Result<Option<PathBuf>> {
    let backup = backup_rename(path)?;
    write_secure_file(path, text.as_bytes())?;
    Ok(backup)
}

/// Restore the manifest from a backup taken by [`write_manifest`].
///
/// Copies rather than renames: backups are additive and never consumed.
pub fn restore_manifest(path: &Path, backup: &Path) -> Result<()> {
    std::fs::copy(backup, path).map_err(|source| CoreError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Read the image repository and tag declared by an existing manifest, so
/// operations that regenerate it keep the current version pin.
pub fn read_image_tag(path: &Path) -> Result<Option<(String, String)>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| CoreError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: ComposeDocument = serde_yaml::from_str(&content)?;

    Ok(doc.services.values().next().and_then(|service| {
        service
            .image
            .rsplit_once(':')
            .map(|(image, tag)| (image.to_string(), tag.to_string()))
    }))
}

#[cfg(test)]
mod tests;
