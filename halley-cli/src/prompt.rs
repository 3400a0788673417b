//! Interactive prompts for the values the node needs.
//!
//! Required fields reject empty input with a fatal error before anything
//! on disk is touched. Secrets are read without echo. The public IP is
//! auto-detected with an interactive fallback when the probe fails.

use std::io::{self, Write};
use std::time::Duration;

use crate::errors::{CliError, Result};

const IP_PROBE_URL: &str = "https://api.ipify.org";
const IP_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt for a required value; empty input is a fatal error.
pub fn prompt_required(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let value = read_line()?;
    require(label, value)
}

/// Prompt with a default taken when the operator just presses enter.
pub fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    print!("{label} [{default}]: ");
    io::stdout().flush()?;

    let value = read_line()?;
    if value.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(value)
    }
}

/// Prompt for secret material without echoing it.
pub fn prompt_secret(label: &str) -> Result<String> {
    let value = rpassword::prompt_password(format!("{label}: "))?;
    require(label, value.trim().to_string())
}

/// Yes/no confirmation, defaulting to no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush()?;

    Ok(is_affirmative(&read_line()?))
}

fn require(label: &str, value: String) -> Result<String> {
    if value.is_empty() {
        Err(CliError::EmptyInput(label.to_string()))
    } else {
        Ok(value)
    }
}

fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Probe an IP echo service for the host's public address.
pub async fn detect_public_ip(http: &reqwest::Client) -> Option<String> {
    let response = http
        .get(IP_PROBE_URL)
        .timeout(IP_PROBE_TIMEOUT)
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }

    let text = response.text().await.ok()?;
    let ip = text.trim();
    if ip.is_empty() {
        None
    } else {
        Some(ip.to_string())
    }
}

/// Auto-detected public IP, falling back to an interactive prompt.
pub async fn public_ip_or_prompt(http: &reqwest::Client) -> Result<String> {
    match detect_public_ip(http).await {
        Some(ip) => {
            println!("Detected public IP: {ip}");
            Ok(ip)
        }
        None => prompt_required("Public IP for P2P"),
    }
}
