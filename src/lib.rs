//! # chanlease
//!
//! Per-channel leader election over a shared key-value store:
//! - Exactly one leader per channel, resolved inside the store
//! - TTL leases that lapse when a leader crashes or is partitioned
//! - Fencing tokens checked on every refresh and release
//! - A small TCP store server, or an in-process store for embedding
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Leader-work subsystem (caller)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ acquire_or_inspect / inspect / refresh / release
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │        StoreLeaderManager  (KeyNamespace + result mapping)   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Procedure (get-or-create / refresh / clean)
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │LocalExecutor│          │  RemoteExecutor  │──TCP──┐
//!   └──────┬──────┘          └──────────────────┘       │
//!          │                                     ┌──────▼──────┐
//!          │                                     │   Server    │
//!          │                                     └──────┬──────┘
//!          ▼                                            ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │  Engine (atomic procedures)  ──▶  LeaseTable (TTL)       │
//!   └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chanlease::{Context, Engine, LeaderManager, LocalExecutor, StoreLeaderManager};
//!
//! let engine = Arc::new(Engine::new());
//! let manager = StoreLeaderManager::new(
//!     LocalExecutor::new(engine),
//!     "leader.",
//!     Duration::from_secs(10),
//! ).unwrap();
//!
//! let ctx = Context::background();
//! let leader = manager.acquire_or_inspect(&ctx, "news", "A", "tok1").unwrap();
//! assert_eq!(leader.node_id, "A");
//! assert!(manager.refresh(&ctx, "news", "tok1").unwrap());
//! assert!(manager.release(&ctx, "news", "tok1").unwrap());
//! assert!(manager.inspect(&ctx, "news").unwrap().is_none());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod context;

pub mod table;
pub mod engine;
pub mod reaper;
pub mod protocol;
pub mod network;
pub mod leader;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, DEFAULT_LEASE_TTL};
pub use context::{CancelHandle, Context};
pub use engine::Engine;
pub use error::{LeaderError, Result};
pub use leader::{
    FakeLeaderManager, LeaderInfo, LeaderManager, LeadershipId, LocalExecutor, Procedure,
    ProcedureExecutor, StoreLeaderManager,
};
pub use network::RemoteExecutor;
pub use reaper::Reaper;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of chanlease
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
