// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod docker;
pub mod dev_certs;
pub mod ports;
pub mod health;

pub use docker::DockerContainerRuntime;
pub use dev_certs::FileDeveloperCertificateService;
pub use event_bus::EventBus;
pub use health::HttpHealthChecker;
pub use ports::EphemeralPortAllocator;
