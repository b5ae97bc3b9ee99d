//! Prints what the compatibility layer sees for a described host.
//!
//! Usage: `compat-report <host-profile.yaml> [--settings <file>] [--probe <path>]...`
//!
//! Log verbosity follows `RUST_LOG`.

use anyhow::{bail, Context};
use host_compat::host::HostProfile;
use host_compat::{Compat, CompatSettings, SimulatedHost, MIDNIGHT_THRESHOLD};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let mut profile_path = None;
    let mut settings_path = None;
    let mut probes = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => settings_path = Some(args.next().context("--settings needs a file")?),
            "--probe" => probes.push(args.next().context("--probe needs a path")?),
            _ if profile_path.is_none() => profile_path = Some(arg),
            other => bail!("unexpected argument '{}'", other),
        }
    }
    let Some(profile_path) = profile_path else {
        bail!("usage: compat-report <host-profile.yaml> [--settings <file>] [--probe <path>]...");
    };

    let profile_text = std::fs::read_to_string(&profile_path)
        .with_context(|| format!("reading host profile {}", profile_path))?;
    let profile = HostProfile::from_yaml_str(&profile_text)?;

    let settings = match settings_path {
        Some(path) => CompatSettings::from_file(&path)
            .with_context(|| format!("loading settings {}", path))?,
        None => CompatSettings::default(),
    }
    .apply_env()?;

    let host = Arc::new(SimulatedHost::from_profile(&profile));
    let compat = Compat::builder(host).settings(settings).build()?;

    let version = compat.interface_version();
    println!("Interface version: {} ({})", version, version.raw());
    if compat.oracle().used_fallback() {
        println!("  (host has no version primitive; minimum known version assumed)");
    }
    println!(
        "At or after {}: {}",
        MIDNIGHT_THRESHOLD,
        compat.is_midnight_or_later()
    );
    let opacity = if compat.guard().has_opacity_primitive() {
        "present"
    } else {
        "absent"
    };
    println!("Opacity primitive: {}", opacity);

    if !probes.is_empty() {
        println!("\n=== Surface probes ===");
        for path in &probes {
            let status = if compat.has(path.as_str()) {
                "callable"
            } else if compat.probe().exists(path.as_str()) {
                "present, not callable"
            } else {
                "absent"
            };
            println!("{:<48} {}", path, status);
        }
    }

    Ok(())
}
