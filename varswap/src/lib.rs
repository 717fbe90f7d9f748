//! Varswap: variable reference scanner and batch editor for animation scripts
//!
//! An animation script is a list of sequences (patterns) made of frames, each
//! frame holding condition (IF) and effect (EF) blocks with fixed-width
//! integer parameters. Many of those parameters name a script variable, either
//! directly or packed together with a small delta as `id * base + remainder`.
//!
//! This crate finds every such reference, decodes it, groups references per
//! variable and lets a caller queue edits and commit them as one batch.
//!
//! # Layers
//!
//! - [`codec`]: composite value decode/encode
//! - [`occurrence`]: recognised instruction table and reference extraction
//! - [`metadata`]: labels, search text and shared-register detection
//! - [`summary`]: per-variable rollups
//! - [`Workbench`]: filters, queued edits, batch apply and global replace
//! - [`batch`]: non-interactive scan/replace with audit records
//!
//! # Usage
//!
//! ```ignore
//! use varswap::{Category, NoHooks, SummaryKey, Workbench};
//!
//! let script: varswap::Script = serde_json::from_str(&text)?;
//! let mut workbench = Workbench::new(script);
//!
//! let key = SummaryKey::new(5, Category::Projectile, false);
//! let queued = workbench.global_replace(&key, 9)?;
//! let report = workbench.apply_pending(&mut NoHooks)?;
//! println!("{} rows queued, {} sequences touched", queued, report.touched.len());
//! ```

pub mod batch;
pub mod codec;
mod error;
pub mod metadata;
pub mod occurrence;
mod pending;
mod planner;
mod script;
pub mod summary;
mod workbench;

#[cfg(test)]
mod test_support;

pub use batch::{AuditRecord, ScanEntry, ScanReport, replace_var, scan, write_audit};
pub use codec::{Decoded, Encoding};
pub use error::{EditError, PlanError, WorkbenchError};
pub use metadata::OccurrenceMetadata;
pub use occurrence::{Category, Occurrence, OccurrenceKind, collect_occurrences};
pub use pending::{JumpEdit, PendingEdits, RowState, RowStatus, describe_edits};
pub use planner::plan_global_replace;
pub use script::{
    BlockKind, CONDITION_PARAMS, Condition, EFFECT_PARAMS, Effect, Frame, Script, Sequence,
    SlotRef,
};
pub use summary::{SortColumn, SortDirection, SortSpec, SummaryEntry, SummaryKey};
pub use workbench::{
    ApplyReport, Filter, NoHooks, RowSortColumn, RowSortSpec, Workbench, WorkbenchHooks,
};
