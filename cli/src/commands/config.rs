// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use apphost_core::domain::app_config::AppHostConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./apphost.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

fn port_label(port: Option<u16>) -> String {
    match port {
        Some(port) => port.to_string(),
        None => "(ephemeral)".to_string(),
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = AppHostConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. APPHOST_CONFIG_PATH: {}",
            std::env::var("APPHOST_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./apphost.yaml");
        println!("  4. ~/.apphost/config.yaml");
        println!("  5. /etc/apphost/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Application: {}", config.metadata.name);
    println!();

    let keycloak = &config.spec.keycloak;
    println!("{}", "Keycloak:".bold());
    println!("  Name: {}", keycloak.name);
    println!("  HTTP port: {}", port_label(keycloak.http_port));
    println!("  HTTPS port: {}", port_label(keycloak.https_port));
    match keycloak.data_volume.as_deref() {
        Some("") => println!("  Data volume: (derived)"),
        Some(volume) => println!("  Data volume: {}", volume),
        None => println!("  Data volume: {}", "(none)".dimmed()),
    }
    if let Some(directory) = &keycloak.realm_import {
        println!("  Realm import: {}", directory.display());
    }
    println!();

    if let Some(api) = &config.spec.api_service {
        println!("{}", "API service:".bold());
        println!("  Name: {}", api.name);
        println!("  Image: {}:{}", api.image, api.tag);
        println!("  Port: {} -> {}", port_label(api.port), api.target_port);
        println!("  Health: {}", api.health_path);
        println!();
    }

    println!("{}", "Developer certificates:".bold());
    println!("  Use for HTTPS: {}", config.spec.dev_certs.use_for_https);
    match config.spec.dev_certs.resolved_directory() {
        Some(dir) => println!("  Directory: {}", dir.display()),
        None => println!("  Directory: {}", "(unresolved)".dimmed()),
    }
    println!();

    println!("{}", "Runtime:".bold());
    println!(
        "  Docker socket: {}",
        config.spec.runtime.docker_socket_path.as_deref().unwrap_or("(auto-detect)")
    );
    println!("  Autopull: {}", config.spec.runtime.autopull);
    println!("  Health timeout: {}s", config.spec.runtime.health_timeout_seconds);
    println!();

    if !config.spec.parameters.is_empty() {
        println!("{}", "Parameters:".bold());
        let mut names: Vec<_> = config.spec.parameters.keys().collect();
        names.sort();
        for name in names {
            println!("  {}: {}", name, "(set)".dimmed());
        }
        println!();
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = AppHostConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    let sample = include_str!("../../templates/apphost.yaml");

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
