// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::runtime::{HealthChecker, HealthProbe, RuntimeError};

/// Probes HTTP(S) health endpoints of local containers.
///
/// Developer certificates are usually not trusted by the system store, so
/// certificate validation is disabled for these localhost probes.
pub struct HttpHealthChecker {
    client: reqwest::Client,
}

impl HttpHealthChecker {
    pub fn new(request_timeout: Duration) -> Result<Self, RuntimeError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| RuntimeError::ConnectionFailed(format!("health check client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthChecker for HttpHealthChecker {
    async fn check(&self, probe: &HealthProbe) -> bool {
        match self.client.get(&probe.url).send().await {
            Ok(response) => {
                debug!("Health probe {} -> {}", probe.url, response.status());
                response.status().is_success()
            }
            Err(e) => {
                debug!("Health probe {} failed: {}", probe.url, e);
                false
            }
        }
    }
}
