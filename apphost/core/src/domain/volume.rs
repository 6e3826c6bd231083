// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::execution::ApplicationIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    /// Named volume managed by the container engine.
    Volume,
    /// Host path bound into the container.
    Bind,
}

/// A volume or bind mount attached to a container resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub kind: VolumeKind,
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

impl VolumeMount {
    pub fn volume(name: impl Into<String>, target: impl Into<String>, read_only: bool) -> Self {
        Self {
            kind: VolumeKind::Volume,
            source: name.into(),
            target: target.into(),
            read_only,
        }
    }

    pub fn bind(source: impl Into<String>, target: impl Into<String>, read_only: bool) -> Self {
        Self {
            kind: VolumeKind::Bind,
            source: source.into(),
            target: target.into(),
            read_only,
        }
    }

    /// Docker `Binds` entry: `source:target[:ro]`.
    pub fn to_bind_spec(&self) -> String {
        if self.read_only {
            format!("{}:{}:ro", self.source, self.target)
        } else {
            format!("{}:{}", self.source, self.target)
        }
    }
}

/// Derive a volume name that is stable for the same application and resource:
/// `{app}-{app-hash}-{resource}-{suffix}`.
pub fn generate_volume_name(identity: &ApplicationIdentity, resource_name: &str, suffix: &str) -> String {
    format!(
        "{}-{}-{}-{}",
        sanitize(identity.name()),
        identity.hash(),
        resource_name,
        suffix
    )
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
