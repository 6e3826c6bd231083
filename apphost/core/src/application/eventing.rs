// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::certificate::DeveloperCertificateService;
use crate::domain::error::AppHostError;

/// Raised once per run, after the graph is built and before any host port is
/// allocated or any container is started.
pub struct BeforeStartEvent {
    developer_certificates: Arc<dyn DeveloperCertificateService>,
}

impl BeforeStartEvent {
    pub fn new(developer_certificates: Arc<dyn DeveloperCertificateService>) -> Self {
        Self { developer_certificates }
    }

    pub fn developer_certificates(&self) -> &dyn DeveloperCertificateService {
        self.developer_certificates.as_ref()
    }
}

pub type BeforeStartHandler =
    Box<dyn FnOnce(&BeforeStartEvent) -> Result<(), AppHostError> + Send>;

/// Lifecycle event subscriptions of an application.
#[derive(Default)]
pub struct Eventing {
    before_start: Mutex<Vec<BeforeStartHandler>>,
}

impl Eventing {
    pub fn subscribe_before_start<F>(&self, handler: F)
    where
        F: FnOnce(&BeforeStartEvent) -> Result<(), AppHostError> + Send + 'static,
    {
        self.before_start.lock().push(Box::new(handler));
    }

    pub fn pending_before_start(&self) -> usize {
        self.before_start.lock().len()
    }

    /// Run every before-start handler in subscription order. Handlers are
    /// drained, so a second publish runs nothing. The first error aborts the
    /// remaining handlers; a cancelled token drops them.
    pub fn publish_before_start(
        &self,
        event: &BeforeStartEvent,
        cancellation: &CancellationToken,
    ) -> Result<(), AppHostError> {
        let handlers = std::mem::take(&mut *self.before_start.lock());
        debug!("Publishing before-start event to {} handler(s)", handlers.len());

        for handler in handlers {
            if cancellation.is_cancelled() {
                return Err(AppHostError::Cancelled);
            }
            handler(event)?;
        }
        Ok(())
    }
}
