// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    Http,
    Https,
}

impl UriScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named network endpoint declared on a resource.
///
/// `port` is the host port. `None` means the host port is allocated
/// ephemerally at startup; `Some` pins it exactly. The target port is the
/// port the container listens on and is never checked against the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub scheme: UriScheme,
    pub target_port: u16,
    pub port: Option<u16>,
    /// Environment variable that receives the target port, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, scheme: UriScheme, target_port: u16, port: Option<u16>) -> Self {
        Self {
            name: name.into(),
            scheme,
            target_port,
            port,
            env: None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.port.is_some()
    }
}

/// An endpoint after host-port allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedEndpoint {
    pub name: String,
    pub scheme: UriScheme,
    pub host: String,
    pub host_port: u16,
    pub target_port: u16,
}

impl AllocatedEndpoint {
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.host_port)
    }
}

/// Where a resource URL is surfaced in status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlDisplayLocation {
    SummaryAndDetails,
    DetailsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAnnotation {
    pub endpoint_name: String,
    pub display_location: UrlDisplayLocation,
}

/// A concrete URL for a started resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUrl {
    pub endpoint_name: String,
    pub url: String,
    pub display_location: UrlDisplayLocation,
}
