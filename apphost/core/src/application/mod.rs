// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod builder;
pub mod eventing;
pub mod keycloak;
pub mod launch;
pub mod manifest;
pub mod runner;

pub use builder::{DistributedApplication, DistributedApplicationBuilder, ResourceBuilder, SharedResource};
pub use eventing::{BeforeStartEvent, Eventing};
pub use keycloak::KeycloakHostingExt;
pub use runner::{AppHostRunner, RunOptions, RunningApplication};
