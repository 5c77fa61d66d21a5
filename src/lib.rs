//! # Hotfix Sweeper
//!
//! Periodically removes stale hotfix branches from GitLab projects.
//!
//! ## Usage
//!
//! ```bash
//! GITLAB_TOKEN=... GROUP_FILTER=payments hotfix-sweeper [serve | run [--dry-run] | preview]
//! ```
//!
//! ## Modules
//!
//! - `cleanup` - Project filtering, hotfix branch selection and the cleanup executor
//! - `config` - Environment-driven configuration
//! - `error` - Crate-level error type
//! - `host` - Project host trait, GitLab client and in-memory mock
//! - `scheduler` - Daily and startup triggers for cleanup runs
pub mod cleanup;
pub mod config;
pub mod error;
pub mod host;
pub mod scheduler;
