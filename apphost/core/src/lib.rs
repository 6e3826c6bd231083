// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Keycloak AppHost core
//!
//! A small resource-graph hosting layer for local development topologies and
//! the Keycloak extension that pins the HTTPS host port.
//!
//! # Architecture
//!
//! - **Domain:** resources, endpoints, parameters, certificates, config
//! - **Application:** builders, eventing, launch preparation, manifest, runner
//! - **Infrastructure:** Docker runtime, developer certificates, ports, health

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
