// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use parking_lot::Mutex;
use std::collections::HashSet;
use std::net::{Ipv4Addr, TcpListener};

use crate::domain::runtime::{PortAllocator, RuntimeError};

/// Asks the OS for a free port by binding to port 0. Ports handed out once
/// are not handed out again by the same allocator.
#[derive(Default)]
pub struct EphemeralPortAllocator {
    issued: Mutex<HashSet<u16>>,
}

impl EphemeralPortAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

const MAX_ATTEMPTS: usize = 16;

impl PortAllocator for EphemeralPortAllocator {
    fn allocate(&self) -> Result<u16, RuntimeError> {
        let mut issued = self.issued.lock();
        for _ in 0..MAX_ATTEMPTS {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
                .map_err(|e| RuntimeError::PortAllocationFailed(e.to_string()))?;
            let port = listener
                .local_addr()
                .map_err(|e| RuntimeError::PortAllocationFailed(e.to_string()))?
                .port();
            if issued.insert(port) {
                return Ok(port);
            }
        }
        Err(RuntimeError::PortAllocationFailed(format!(
            "no unused port after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}
