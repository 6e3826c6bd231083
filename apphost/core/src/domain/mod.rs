// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain types of the resource graph.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Resource records and the values they carry

pub mod error;
pub mod execution;
pub mod endpoint;
pub mod parameter;
pub mod environment;
pub mod certificate;
pub mod volume;
pub mod resource;
pub mod keycloak;
pub mod runtime;
pub mod events;
pub mod app_config;

pub use error::AppHostError;
