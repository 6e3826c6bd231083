// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `apphost manifest`: write the publish-mode deployment manifest.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use apphost_core::domain::app_config::AppHostConfigManifest;
use apphost_core::domain::execution::ExecutionMode;

use crate::topology::build_topology;

pub async fn execute(config_override: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = AppHostConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let app_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let app = build_topology(&config, ExecutionMode::Publish, &app_dir)?;
    let manifest = app.publish_manifest()?;
    let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write manifest to {:?}", path))?;
            println!(
                "{}",
                format!("✓ Manifest written: {}", path.display()).green()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
