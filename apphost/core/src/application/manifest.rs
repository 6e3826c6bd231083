// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Publish-mode output: a static JSON description of the graph in which
//! parameter references are left as `{name.value}` expressions.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::application::builder::DistributedApplication;
use crate::domain::environment::EnvironmentContext;
use crate::domain::error::AppHostError;
use crate::domain::parameter::{GenerateParameterDefault, ParameterResource, ParameterSource};
use crate::domain::resource::ContainerResource;
use crate::domain::volume::VolumeKind;

pub const MANIFEST_SCHEMA: &str = "apphost.dev/v1/manifest";

#[derive(Debug, Clone, Serialize)]
pub struct PublishManifest {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub resources: BTreeMap<String, ManifestResource>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ManifestResource {
    #[serde(rename = "container.v0")]
    Container {
        image: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        bindings: BTreeMap<String, ManifestBinding>,
        #[serde(rename = "volumes", skip_serializing_if = "Vec::is_empty")]
        volumes: Vec<ManifestVolume>,
        #[serde(rename = "bindMounts", skip_serializing_if = "Vec::is_empty")]
        bind_mounts: Vec<ManifestBindMount>,
    },
    #[serde(rename = "parameter.v0")]
    Parameter {
        value: String,
        inputs: BTreeMap<String, ManifestInput>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBinding {
    pub scheme: String,
    pub protocol: String,
    pub transport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub target_port: u16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestVolume {
    pub name: String,
    pub target: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBindMount {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestInput {
    #[serde(rename = "type")]
    pub input_type: String,
    pub secret: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ManifestInputDefault>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestInputDefault {
    pub generate: GenerateParameterDefault,
}

impl DistributedApplication {
    pub fn publish_manifest(&self) -> Result<PublishManifest, AppHostError> {
        if !self.execution_context.is_publish_mode() {
            return Err(AppHostError::InvalidArgument(
                "a manifest can only be published in publish mode".to_string(),
            ));
        }

        let mut resources = BTreeMap::new();

        for parameter in &self.parameters {
            resources.insert(parameter.name().to_string(), parameter_entry(parameter));
        }

        for resource in &self.resources {
            let resource = resource.read();
            let container = resource.container();
            resources.insert(
                container.name().to_string(),
                container_entry(container)?,
            );
        }

        info!("Published manifest with {} resource(s)", resources.len());

        Ok(PublishManifest {
            schema: MANIFEST_SCHEMA.to_string(),
            resources,
        })
    }
}

fn parameter_entry(parameter: &ParameterResource) -> ManifestResource {
    let default = match parameter.source() {
        ParameterSource::Generated { policy, .. } => Some(ManifestInputDefault { generate: policy.clone() }),
        ParameterSource::Configuration => None,
    };

    ManifestResource::Parameter {
        value: format!("{{{}.inputs.value}}", parameter.name()),
        inputs: BTreeMap::from([(
            "value".to_string(),
            ManifestInput {
                input_type: "string".to_string(),
                secret: parameter.is_secret(),
                default,
            },
        )]),
    }
}

fn container_entry(container: &ContainerResource) -> Result<ManifestResource, AppHostError> {
    let mut env = EnvironmentContext::new();
    for callback in container.environment_callbacks() {
        callback(&mut env)?;
    }
    for endpoint in container.endpoints() {
        if let Some(var) = &endpoint.env {
            env.set(var.clone(), endpoint.target_port.to_string());
        }
    }

    let bindings = container
        .endpoints()
        .iter()
        .map(|e| {
            (
                e.name.clone(),
                ManifestBinding {
                    scheme: e.scheme.to_string(),
                    protocol: "tcp".to_string(),
                    transport: "http".to_string(),
                    port: e.port,
                    target_port: e.target_port,
                },
            )
        })
        .collect();

    let (named, bound): (Vec<_>, Vec<_>) = container
        .volumes
        .iter()
        .partition(|v| v.kind == VolumeKind::Volume);

    Ok(ManifestResource::Container {
        image: container.image.reference(),
        args: container.args.clone(),
        env: env
            .environment_variables
            .iter()
            .map(|(k, v)| (k.clone(), v.manifest_expression()))
            .collect(),
        bindings,
        volumes: named
            .into_iter()
            .map(|v| ManifestVolume {
                name: v.source.clone(),
                target: v.target.clone(),
                read_only: v.read_only,
            })
            .collect(),
        bind_mounts: bound
            .into_iter()
            .map(|v| ManifestBindMount {
                source: v.source.clone(),
                target: v.target.clone(),
                read_only: v.read_only,
            })
            .collect(),
    })
}
