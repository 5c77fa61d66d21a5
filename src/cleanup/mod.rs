//! Hotfix branch cleanup
//!
//! - `filter` narrows accessible projects to the configured groups
//! - `selector` picks hotfix branches and applies the retention window
//! - `executor` runs the per-project and run-wide cleanup
//! - `report` builds the operator preview

pub mod executor;
pub mod filter;
pub mod report;
pub mod selector;

pub use executor::{CleanupExecutor, CleanupOutcome, CleanupSettings, CleanupStats};
pub use filter::GroupFilter;
pub use report::{build_preview, PreviewReport};
pub use selector::{AgeFilter, BranchInfo, HotfixPolicy, HotfixSelector};
