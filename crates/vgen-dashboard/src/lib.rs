//! Operator dashboard core.
//!
//! This crate provides:
//! - The idea collection view-model (filter, selection, counters)
//! - A queue observer polling job status for ideas the backend is working on
//! - The pipeline controller issuing every operator command
//! - A refresher that keeps the collection in sync with the backend
//! - The `vgen` command-line front end

pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod observer;
pub mod refresh;
pub mod session;

pub use collection::{filter_ideas, IdeaCollection, RefreshReport, ResolvedIds, StatusCounts};
pub use config::DashboardConfig;
pub use controller::{actions_for, BatchReport, BulkStartReport, IdeaAction, PipelineController, SkipReason};
pub use error::{DashboardError, DashboardResult};
pub use logging::{init_tracing, IdeaLogger};
pub use observer::QueueObserver;
pub use refresh::{CollectionRefresher, RefreshHandle};
pub use session::{DashboardSession, IdeaView};
