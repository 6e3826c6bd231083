// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::endpoint::ResourceUrl;
use crate::domain::runtime::ContainerId;

/// Resource state changes published while the application runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceEvent {
    Starting {
        resource: String,
        image: String,
        at: DateTime<Utc>,
    },
    Running {
        resource: String,
        container_id: ContainerId,
        urls: Vec<ResourceUrl>,
        at: DateTime<Utc>,
    },
    Healthy {
        resource: String,
        at: DateTime<Utc>,
    },
    Unhealthy {
        resource: String,
        probe_url: String,
        at: DateTime<Utc>,
    },
    FailedToStart {
        resource: String,
        error: String,
        at: DateTime<Utc>,
    },
    Stopped {
        resource: String,
        at: DateTime<Utc>,
    },
}

impl ResourceEvent {
    pub fn resource(&self) -> &str {
        match self {
            Self::Starting { resource, .. }
            | Self::Running { resource, .. }
            | Self::Healthy { resource, .. }
            | Self::Unhealthy { resource, .. }
            | Self::FailedToStart { resource, .. }
            | Self::Stopped { resource, .. } => resource,
        }
    }
}
