//! Model-call accounting.
//!
//! A [`CallLedger`] is owned by whoever builds the agent and shared through
//! an `Arc`. Increments are lock-free so concurrent operations can record
//! calls without serializing on business logic.

use crate::provider::Usage;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter of successful model invocations.
#[derive(Debug, Default)]
pub struct CallLedger {
    calls: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

/// Point-in-time copy of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl CallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful invocation and its token usage.
    pub fn record(&self, usage: Option<&Usage>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(u) = usage {
            self.input_tokens
                .fetch_add(u64::from(u.prompt_tokens), Ordering::Relaxed);
            self.output_tokens
                .fetch_add(u64::from(u.completion_tokens), Ordering::Relaxed);
        }
    }

    /// Number of successful invocations so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            calls: self.calls(),
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }
}
