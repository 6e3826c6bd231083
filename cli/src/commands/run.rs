// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `apphost run`: start every resource on Docker and keep it running until
//! Ctrl-C.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use apphost_core::application::runner::{AppHostRunner, RunOptions, RunningApplication};
use apphost_core::domain::app_config::AppHostConfigManifest;
use apphost_core::domain::endpoint::UrlDisplayLocation;
use apphost_core::domain::execution::ExecutionMode;
use apphost_core::infrastructure::{
    DockerContainerRuntime, EphemeralPortAllocator, EventBus, FileDeveloperCertificateService, HttpHealthChecker,
};

use crate::topology::build_topology;

const HEALTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn execute(config_override: Option<PathBuf>) -> Result<()> {
    let config = AppHostConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let app_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let app = build_topology(&config, ExecutionMode::Run, &app_dir)?;

    let runtime = DockerContainerRuntime::new(
        config.spec.runtime.docker_socket_path.clone(),
        config.spec.runtime.autopull,
    )
    .context("Failed to connect to Docker")?;
    runtime
        .healthcheck()
        .await
        .context("Docker daemon is not reachable")?;

    let runner = AppHostRunner::new(
        Arc::new(runtime),
        Arc::new(FileDeveloperCertificateService::from_config(&config.spec.dev_certs)),
        Arc::new(EphemeralPortAllocator::new()),
        Arc::new(HttpHealthChecker::new(HEALTH_REQUEST_TIMEOUT)?),
        EventBus::with_default_capacity(),
        RunOptions {
            health_timeout: Duration::from_secs(config.spec.runtime.health_timeout_seconds),
            ..RunOptions::default()
        },
    );

    let cancellation = CancellationToken::new();
    let ctrl_c = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
        }
        ctrl_c.cancel();
    });

    let running = runner
        .start(&app, &cancellation)
        .await
        .context("Failed to start application")?;

    print_urls(&running);

    let unhealthy = runner.wait_for_health(&running, &cancellation).await;
    if unhealthy.is_empty() {
        println!("{}", "✓ All resources healthy".green());
    } else {
        for name in &unhealthy {
            warn!("Resource '{}' did not become healthy", name);
        }
        println!("{} {}", "⚠ Unhealthy:".yellow(), unhealthy.join(", "));
    }

    println!("{}", "Press Ctrl-C to stop".dimmed());
    cancellation.cancelled().await;

    runner.shutdown(running).await;
    println!("{}", "✓ Resources removed".green());

    Ok(())
}

fn print_urls(running: &RunningApplication) {
    println!();
    println!("{}", "Resources:".bold());
    for (spec, id) in running.containers() {
        println!("  {} ({})", spec.resource_name.bold(), id.as_str().chars().take(12).collect::<String>());
        for url in &spec.urls {
            match url.display_location {
                UrlDisplayLocation::SummaryAndDetails => println!("    {}: {}", url.endpoint_name, url.url),
                UrlDisplayLocation::DetailsOnly => {
                    info!("{} {}: {}", spec.resource_name, url.endpoint_name, url.url)
                }
            }
        }
    }
    println!();
}
