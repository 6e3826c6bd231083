// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AppHost CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Turns configuration into an application graph and drives
//!   it in run or publish mode

pub mod commands;
pub mod topology;
