//! The operations behind each subcommand.
//!
//! Every operation is a sequence over the core interfaces: check
//! prerequisites, back up, mutate the store, regenerate the manifest,
//! reconcile the running service. Fatal errors stop the run before any
//! further mutation; advisory steps degrade to warnings.

use std::time::Duration;

use colored::Colorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::info;

use halley_core::admin::AdminClient;
use halley_core::backup::{backup_file, diff_lines};
use halley_core::context::OpsContext;
use halley_core::envfile::{resolved_values, EnvFile};
use halley_core::errors::CoreError;
use halley_core::manifest::{self, read_image_tag};
use halley_core::reconcile::{ReconcileReport, Reconciler};
use halley_core::runner::{
    probe_compose, run_program, ComposeCli, ServiceController, ServiceState,
};
use halley_core::schema::{KeySchema, SchemaVersion};

use crate::errors::{CliError, Result};
use crate::prompt;

/// Print an operator-facing warning. Warnings never change the exit
/// status.
pub fn warn(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// Parse a `--schema` flag value.
pub fn parse_schema_flag(flag: Option<&str>) -> Result<Option<SchemaVersion>> {
    match flag {
        None => Ok(None),
        Some(s) => SchemaVersion::parse(s)
            .map(Some)
            .ok_or_else(|| CliError::UnknownSchema(s.to_string())),
    }
}

fn parse_set_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidSetPair(pair.to_string())),
    }
}

/// Schema precedence: explicit flag, then detection from the existing
/// store, then the latest version.
fn resolve_schema(requested: Option<SchemaVersion>, store: &EnvFile) -> KeySchema {
    let version = requested
        .or_else(|| KeySchema::detect(store))
        .unwrap_or_else(SchemaVersion::latest);
    KeySchema::new(version)
}

/// Verify the container runtime and compose plugin exist before touching
/// anything on disk.
async fn check_prerequisites(ctx: &OpsContext) -> Result<()> {
    which::which(&ctx.compose.program).map_err(|_| {
        CliError::Core(CoreError::MissingPrerequisite(format!(
            "'{}' not found on PATH",
            ctx.compose.program
        )))
    })?;
    probe_compose(&ctx.compose).await?;
    Ok(())
}

fn build_reconciler(ctx: &OpsContext, no_verify: bool) -> Reconciler<ComposeCli> {
    let reconciler = Reconciler::new(ComposeCli::new(ctx));
    if no_verify {
        reconciler.with_verification(0, Duration::ZERO)
    } else {
        reconciler
    }
}

/// Back up the store, apply every upsert, save, and show the diff.
fn apply_settings(store: &mut EnvFile, settings: &[(String, String)]) -> Result<()> {
    let before = if store.path().exists() {
        Some(std::fs::read_to_string(store.path()).map_err(CliError::Io)?)
    } else {
        None
    };

    let backup = backup_file(store.path())?;

    for (key, value) in settings {
        store.upsert(key, value)?;
    }
    store.save()?;

    if let Some(backup_path) = backup {
        info!("Config backed up to {}", backup_path.display());
    }
    if let Some(before) = before {
        let diff = diff_lines(&before, &store.render());
        if !diff.is_empty() {
            println!("Config changes:");
            for line in diff {
                println!("  {line}");
            }
        }
    }

    Ok(())
}

/// Interactive settings collection, reusing existing values as defaults.
async fn prompt_settings(
    ctx: &OpsContext,
    schema: &KeySchema,
    store: &EnvFile,
) -> Result<Vec<(String, String)>> {
    let http = reqwest::Client::new();
    let mut settings = Vec::new();

    let ethereum = match store.get(schema.ethereum_hosts()) {
        Some(current) => prompt::prompt_with_default("Ethereum RPC URL(s)", current)?,
        None => prompt::prompt_required("Ethereum RPC URL(s)")?,
    };
    settings.push((schema.ethereum_hosts().to_string(), ethereum));

    let consensus = match store.get(schema.consensus_hosts()) {
        Some(current) => prompt::prompt_with_default("Consensus host URL(s)", current)?,
        None => prompt::prompt_required("Consensus host URL(s)")?,
    };
    settings.push((schema.consensus_hosts().to_string(), consensus));

    // Key material is only prompted for when absent; rotating it goes
    // through `configure --set`.
    if store.get(schema.validator_keys()).is_none() {
        settings.push((
            schema.validator_keys().to_string(),
            prompt::prompt_secret("Validator private key")?,
        ));
    }

    let coinbase = match store.get(KeySchema::COINBASE) {
        Some(current) => prompt::prompt_with_default("Coinbase address", current)?,
        None => prompt::prompt_required("Coinbase address")?,
    };
    settings.push((KeySchema::COINBASE.to_string(), coinbase));

    let p2p_ip = match store.get(KeySchema::P2P_IP) {
        Some(current) => prompt::prompt_with_default("Public IP for P2P", current)?,
        None => prompt::public_ip_or_prompt(&http).await?,
    };
    settings.push((KeySchema::P2P_IP.to_string(), p2p_ip));

    for (key, value) in ctx.default_settings() {
        if store.get(key).is_none() {
            settings.push((key.to_string(), value));
        }
    }

    Ok(settings)
}

fn report_outcome(report: &ReconcileReport) {
    for warning in &report.warnings {
        warn(warning);
    }
    if report.verified == Some(true) {
        println!("Service is running");
    } else if report.started {
        println!("Service started");
    }
}

/// Soft post-start step: push the governance payload to the node's admin
/// endpoint. The node is already running, so every failure here is a
/// warning.
async fn push_admin_update(ctx: &OpsContext) {
    let values = match resolved_values(&ctx.env_path()) {
        Ok(values) => values,
        Err(e) => {
            warn(&format!("Admin endpoint update skipped: {e}"));
            return;
        }
    };
    let coinbase = match values.get(KeySchema::COINBASE) {
        Some(coinbase) => coinbase,
        None => return,
    };

    let client = AdminClient::new(ctx.admin_endpoint.clone());
    match client
        .push(
            "node_setConfig",
            json!([{ "governanceProposerPayload": coinbase }]),
        )
        .await
    {
        Ok(()) => println!("Pushed governance payload to {}", client.endpoint()),
        Err(e) => warn(&format!("Admin endpoint update skipped: {e}")),
    }
}

pub async fn install(
    ctx: &OpsContext,
    schema_flag: Option<SchemaVersion>,
    snapshot_url: Option<String>,
    no_verify: bool,
) -> Result<()> {
    check_prerequisites(ctx).await?;

    std::fs::create_dir_all(&ctx.base_dir)?;
    std::fs::create_dir_all(&ctx.data_dir)?;

    let mut store = EnvFile::load(&ctx.env_path())?;
    let schema = resolve_schema(schema_flag, &store);
    info!("Using config schema {}", schema.version());

    let settings = prompt_settings(ctx, &schema, &store).await?;
    apply_settings(&mut store, &settings)?;

    let manifest_text = manifest::render(&ctx.template(&schema, snapshot_url.as_deref()))?;
    let manifest_backup = manifest::write_manifest(&ctx.manifest_path(), &manifest_text)?;

    let reconciler = build_reconciler(ctx, no_verify);
    reconciler
        .validate_manifest(&ctx.manifest_path(), manifest_backup.as_deref())
        .await?;

    reconciler.controller().pull().await?;
    let report = reconciler.reconcile().await?;
    report_outcome(&report);

    push_admin_update(ctx).await;

    println!("Node installed in {}", ctx.base_dir.display());
    Ok(())
}

pub async fn configure(
    ctx: &OpsContext,
    set: Vec<String>,
    schema_flag: Option<SchemaVersion>,
    no_verify: bool,
) -> Result<()> {
    check_prerequisites(ctx).await?;

    let mut store = EnvFile::load(&ctx.env_path())?;
    let schema = resolve_schema(schema_flag, &store);

    let settings = if set.is_empty() {
        prompt_settings(ctx, &schema, &store).await?
    } else {
        set.iter()
            .map(|pair| parse_set_pair(pair))
            .collect::<Result<Vec<_>>>()?
    };
    apply_settings(&mut store, &settings)?;

    // Keep the current version pin when regenerating the manifest.
    let mut render_ctx = ctx.clone();
    if let Some((image, tag)) = read_image_tag(&ctx.manifest_path())? {
        render_ctx.image = image;
        render_ctx.tag = tag;
    }
    let manifest_text = manifest::render(&render_ctx.template(&schema, None))?;
    let backup = manifest::write_manifest(&ctx.manifest_path(), &manifest_text)?;

    let reconciler = build_reconciler(ctx, no_verify);
    reconciler
        .validate_manifest(&ctx.manifest_path(), backup.as_deref())
        .await?;
    let report = reconciler.reconcile().await?;
    report_outcome(&report);

    push_admin_update(ctx).await;
    Ok(())
}

pub async fn update(ctx: &OpsContext, no_verify: bool) -> Result<()> {
    check_prerequisites(ctx).await?;

    if !ctx.manifest_path().exists() {
        return Err(CliError::NotInstalled(ctx.base_dir.clone()));
    }

    let store = EnvFile::load(&ctx.env_path())?;
    let schema = resolve_schema(None, &store);

    let previous = read_image_tag(&ctx.manifest_path())?;

    let manifest_text = manifest::render(&ctx.template(&schema, None))?;
    let backup = manifest::write_manifest(&ctx.manifest_path(), &manifest_text)?;

    let reconciler = build_reconciler(ctx, no_verify);
    reconciler
        .validate_manifest(&ctx.manifest_path(), backup.as_deref())
        .await?;

    reconciler.controller().pull().await?;
    let report = reconciler.reconcile().await?;
    report_outcome(&report);

    // Advisory: reclaim superseded image layers.
    let prune = run_program(&ctx.compose.program, &["image", "prune", "-f"])
        .await
        .and_then(|output| output.into_result());
    if let Err(e) = prune {
        warn(&format!("Image cache prune failed: {e}"));
    }

    match previous {
        Some((_, old_tag)) if old_tag != ctx.tag => {
            println!("Updated image tag {} -> {}", old_tag, ctx.tag);
        }
        _ => println!("Pinned image tag {}", ctx.tag),
    }
    Ok(())
}

pub async fn remove(ctx: &OpsContext, purge: bool, force: bool) -> Result<()> {
    let controller = ComposeCli::new(ctx);

    match controller.state().await? {
        ServiceState::Absent => {
            info!("Service already absent, nothing to stop");
        }
        _ => {
            controller.down().await?;
            println!("Service stopped and removed");
        }
    }

    if purge {
        if ctx.data_dir.exists() {
            let confirmed = force
                || prompt::confirm(&format!(
                    "Delete node data at {}?",
                    ctx.data_dir.display()
                ))?;
            if !confirmed {
                return Err(CliError::Aborted);
            }
            std::fs::remove_dir_all(&ctx.data_dir)?;
            println!("Deleted {}", ctx.data_dir.display());
        } else {
            info!("Data directory {} not present", ctx.data_dir.display());
        }
    }

    // The config store, manifest, and their backups stay on disk.
    Ok(())
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "SERVICE")]
    service: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "IMAGE")]
    image: String,
    #[tabled(rename = "CONFIG")]
    config: String,
}

pub async fn status(ctx: &OpsContext) -> Result<()> {
    let controller = ComposeCli::new(ctx);
    let state = controller.state().await?;

    let image = read_image_tag(&ctx.manifest_path())?
        .map(|(image, tag)| format!("{image}:{tag}"))
        .unwrap_or_else(|| "-".to_string());
    let config = if ctx.env_path().exists() {
        ctx.env_path().display().to_string()
    } else {
        "-".to_string()
    };

    let row = StatusRow {
        service: ctx.service_name.clone(),
        state: state.as_str().to_string(),
        image,
        config,
    };
    let table = Table::new(vec![row]).with(Style::blank()).to_string();
    println!("{table}");

    if state != ServiceState::Absent {
        let ps = controller.ps().await?;
        let listing = ps.stdout.trim_end();
        if !listing.is_empty() {
            println!("{listing}");
        }
    }

    Ok(())
}

pub async fn logs(ctx: &OpsContext, follow: bool, tail: Option<usize>) -> Result<()> {
    if !ctx.manifest_path().exists() {
        return Err(CliError::NotInstalled(ctx.base_dir.clone()));
    }

    let controller = ComposeCli::new(ctx);
    controller.logs(follow, tail).await?;
    Ok(())
}
