//! Data layer for a browser-style to-do list.
//!
//! Tasks are short text items with a completion flag and two timestamps.
//! The whole collection lives as one JSON array under a single key of a
//! string key-value medium shaped after `localStorage`, and several
//! independent handles ("tabs") can share that medium and hear about each
//! other's writes.
//!
//! # Overview
//!
//! ```text
//! TaskBoard  ──▶  TaskService  ──▶  TaskStorage  ──▶  StorageBackend
//! (snapshot)      (operations)      (load/save)       (memory, file, ...)
//!      ▲                                 │
//!      └──── change subscription ◀───────┘
//! ```
//!
//! # Module Organization
//!
//! - [`validation`] - Description, identifier and timestamp checks
//! - [`domain`] - The [`Task`] entity, clocks, id generation, ordering, stats
//! - [`error`] - [`TaskError`] and its classifiers
//! - [`store`] - Storage media and whole-collection persistence
//! - [`service`] - [`TaskService`], the operations API
//! - [`board`] - [`TaskBoard`], a snapshot-holding view-model
//! - [`config`] - [`TaskListConfig`] loaded from TOML
//! - [`constants`] - Storage key, limits and error codes
//!
//! # Example
//!
//! ```
//! use tasklist::store::MemoryStorage;
//! use tasklist::TaskService;
//!
//! let service = TaskService::new(MemoryStorage::new().open_tab());
//! service.create("Buy milk").unwrap();
//! service.create("Walk dog").unwrap();
//!
//! let stats = service.stats().unwrap();
//! assert_eq!(stats.total, 2);
//! assert_eq!(stats.completion_rate, 0);
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod service;
pub mod store;
pub mod validation;

// Re-exports for ergonomic access
pub use board::TaskBoard;
pub use config::{ConfigError, TaskListConfig};
pub use constants::DEFAULT_STORAGE_KEY;
pub use domain::{Task, TaskPatch, TaskStats};
pub use error::{Result, StorageOperation, TaskError};
pub use service::TaskService;
pub use store::{StorageBackend, Subscription, TaskStorage};
