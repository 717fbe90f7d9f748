//! Error types for queued edits, replace planning and batch apply

use crate::occurrence::Category;

/// Why a single queued sub-edit could not be committed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Non-numeric text for a raw value edit
    #[error("Invalid")]
    Invalid(String),
    /// Primary slot no longer resolves
    #[error("Read-only")]
    ReadOnly,
    #[error("Delta unsupported")]
    DeltaUnsupported,
    #[error("Amount unsupported")]
    AmountUnsupported,
    #[error("Compare unsupported")]
    CompareUnsupported,
    #[error("Mode unsupported")]
    CompareModeUnsupported,
    #[error("Value unsupported")]
    ChangeValueUnsupported,
    #[error("Mode unsupported")]
    ChangeModeUnsupported,
    #[error("Jump unsupported")]
    JumpUnsupported,
}

/// Global replace rejected before anything was queued
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("{0} entries have no numeric id to replace")]
    UnsupportedCategory(Category),
    #[error("Choose a different target value")]
    UnchangedTarget,
    #[error("No matching occurrences available to queue")]
    NoMatches,
}

/// Batch-level failure of the workbench
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkbenchError {
    /// The script changed shape after the occurrence index was built
    #[error("occurrence index is stale (built at generation {built}, script at {current}); rescan first")]
    Stale { built: u64, current: u64 },
}
