//! Process-orchestration client for llamacpp-manager
//!
//! This crate drives the external `llamacpp-manager` CLI on behalf of the
//! llamabar indicator. It never manages llama-server processes itself; the
//! manager is the only source of truth and every view is rebuilt by asking
//! it again.
//!
//! # Components
//!
//! - [`ExecutableLocator`]: finds the manager binary
//! - [`ManagerBackend`] / [`SystemBackend`]: spawns it
//! - [`decode`]: validates `status --json` output
//! - [`FleetClient`]: start/stop/restart/ensure-running/status
//! - [`StatusPoller`]: keeps a fresh [`FleetSnapshot`] published
//!
//! # Example
//!
//! ```ignore
//! use llamabar_core::{FleetClient, StatusPoller};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let client = Arc::new(FleetClient::system());
//! let poller = StatusPoller::new(client.clone());
//! poller.start(Duration::from_secs(2));
//!
//! client.start("m1").await?;
//! poller.refresh();
//! ```

pub mod client;
pub mod decoder;
pub mod error;
pub mod invoker;
pub mod locator;
pub mod logs;
pub mod model;
pub mod poller;

pub use client::FleetClient;
pub use decoder::decode;
pub use error::{DecodeError, ErrorKind, FleetError, InvokeError, Result};
pub use invoker::{ManagerBackend, SystemBackend};
pub use locator::{ExecutableLocator, MANAGER_BINARY};
pub use logs::tail_log;
pub use model::{FleetSnapshot, StatusRecord};
pub use poller::{PollState, PollerStats, PollerView, StatusPoller, StatusSource};
