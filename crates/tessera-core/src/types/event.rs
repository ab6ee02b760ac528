use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::crypto::Hash;
use crate::types::address::Address;

/// Ledger events emitted while transactions execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    TokenMinted {
        token: Hash,
        to: Address,
        amount: u64,
    },
    TokenBurned {
        token: Hash,
        from: Address,
        amount: u64,
    },
    TokenTransferred {
        token: Hash,
        from: Address,
        to: Address,
        amount: u64,
    },
    NftCreated {
        token: Hash,
        id: u64,
    },
    NftDestroyed {
        token: Hash,
        id: u64,
    },
}

/// Injected sink for ledger events; blocks carry one, plugins provide one
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &Event);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: &Event) {}
}

/// Sink that buffers events for later inspection
#[derive(Debug, Default)]
pub struct BufferSink {
    events: Mutex<Vec<Event>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<Event> {
        self.locked().clone()
    }

    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.locked())
    }
}

impl EventSink for BufferSink {
    fn notify(&self, event: &Event) {
        self.locked().push(event.clone());
    }
}
