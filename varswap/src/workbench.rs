//! Editing session over one script
//!
//! [`Workbench`] owns the script together with everything derived from it:
//! the occurrence index, the metadata cache, one [`RowState`] per occurrence,
//! the active filter and a versioned summary cache. Edits are queued per row
//! and committed together by [`Workbench::apply_pending`].
//!
//! The occurrence index is positional. It records the script generation it
//! was built at and refuses to apply edits once the script has changed shape
//! underneath it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use hashbrown::HashSet;

use crate::error::{PlanError, WorkbenchError};
use crate::metadata::{OccurrenceMetadata, build_metadata};
use crate::occurrence::{Category, Occurrence, collect_occurrences};
use crate::pending::{JumpEdit, RowState, RowStatus, apply_row, describe_edits};
use crate::planner::plan_global_replace;
use crate::script::Script;
use crate::summary::{SortDirection, SummaryEntry, SummaryKey, build_summary};

/// Callbacks into the host document
pub trait WorkbenchHooks {
    /// Once per apply batch that wrote anything
    fn on_modified(&mut self) {}

    /// Before the first write to `sequence` within a batch
    fn on_save_undo(&mut self, sequence: usize) {
        let _ = sequence;
    }
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl WorkbenchHooks for NoHooks {}

/// Row visibility rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Visible categories, indexed by [`Category::index`]
    pub categories: [bool; Category::ALL.len()],
    pub search: String,
    pub pending_only: bool,
    pub globals_only: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            categories: [true; Category::ALL.len()],
            search: String::new(),
            pending_only: false,
            globals_only: false,
        }
    }
}

impl Filter {
    pub fn shows(&self, category: Category) -> bool {
        self.categories[category.index()]
    }
}

/// Outcome of one apply batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Rows whose queued edits all committed
    pub applied: usize,
    /// Rows that stopped on an error
    pub failed: usize,
    /// Sequences written during the batch
    pub touched: BTreeSet<usize>,
}

impl ApplyReport {
    pub fn mutated(&self) -> bool {
        !self.touched.is_empty()
    }
}

/// Occurrence listing column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSortColumn {
    Var,
    Category,
    Pattern,
    Frame,
    Node,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSortSpec {
    pub column: RowSortColumn,
    pub direction: SortDirection,
}

#[derive(Debug)]
struct SummaryCache {
    version: u64,
    entries: Vec<SummaryEntry>,
}

#[derive(Debug)]
pub struct Workbench {
    script: Script,
    /// Script generation the occurrence index was built at
    indexed_generation: u64,
    occurrences: Vec<Occurrence>,
    metadata: Vec<OccurrenceMetadata>,
    rows: Vec<RowState>,
    filter: Filter,
    /// Bumped whenever the visible set or the indexed values may have changed
    view_version: u64,
    summary_cache: Option<SummaryCache>,
}

impl Workbench {
    pub fn new(script: Script) -> Self {
        let mut workbench = Self {
            script,
            indexed_generation: 0,
            occurrences: Vec::new(),
            metadata: Vec::new(),
            rows: Vec::new(),
            filter: Filter::default(),
            view_version: 0,
            summary_cache: None,
        };
        workbench.rescan();
        workbench
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Direct script access. Structural changes made through
    /// [`Script::sequences_mut`] mark the index stale until [`Self::rescan`].
    pub fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }

    pub fn into_script(self) -> Script {
        self.script
    }

    pub fn is_stale(&self) -> bool {
        self.script.generation() != self.indexed_generation
    }

    /// Rebuild the occurrence index from scratch, dropping all row state
    pub fn rescan(&mut self) {
        self.occurrences = collect_occurrences(&self.script);
        self.metadata = build_metadata(&self.script, &self.occurrences);
        self.rows = vec![RowState::default(); self.occurrences.len()];
        self.indexed_generation = self.script.generation();
        self.invalidate_view();
        tracing::debug!(
            occurrences = self.occurrences.len(),
            generation = self.indexed_generation,
            "rescanned script"
        );
    }

    /// Rebuild occurrences and metadata after value-only writes, keeping rows
    fn reindex(&mut self) {
        self.occurrences = collect_occurrences(&self.script);
        self.metadata = build_metadata(&self.script, &self.occurrences);
        self.rows.resize(self.occurrences.len(), RowState::default());
        self.indexed_generation = self.script.generation();
        self.invalidate_view();
    }

    fn invalidate_view(&mut self) {
        self.view_version += 1;
        self.summary_cache = None;
    }

    /// Monotonic counter identifying the current visible set
    pub fn view_version(&self) -> u64 {
        self.view_version
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn occurrence(&self, row: usize) -> Option<&Occurrence> {
        self.occurrences.get(row)
    }

    pub fn metadata(&self, row: usize) -> Option<&OccurrenceMetadata> {
        self.metadata.get(row)
    }

    pub fn row(&self, row: usize) -> Option<&RowState> {
        self.rows.get(row)
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if filter != self.filter {
            self.filter = filter;
            self.invalidate_view();
        }
    }

    pub fn set_category_visible(&mut self, category: Category, visible: bool) {
        let mut filter = self.filter.clone();
        filter.categories[category.index()] = visible;
        self.set_filter(filter);
    }

    pub fn set_search(&mut self, search: &str) {
        let mut filter = self.filter.clone();
        filter.search = search.to_string();
        self.set_filter(filter);
    }

    pub fn set_pending_only(&mut self, pending_only: bool) {
        let mut filter = self.filter.clone();
        filter.pending_only = pending_only;
        self.set_filter(filter);
    }

    pub fn set_globals_only(&mut self, globals_only: bool) {
        let mut filter = self.filter.clone();
        filter.globals_only = globals_only;
        self.set_filter(filter);
    }

    /// Row indices passing the current filter, in extraction order
    pub fn visible_rows(&self) -> Vec<usize> {
        let needle = self.filter.search.trim().to_lowercase();
        self.occurrences
            .iter()
            .zip(&self.metadata)
            .zip(&self.rows)
            .enumerate()
            .filter(|(_, ((occ, meta), row))| {
                self.filter.shows(occ.category)
                    && (!self.filter.pending_only || row.has_pending())
                    && (!self.filter.globals_only || meta.is_global)
                    && meta.matches(&needle)
            })
            .map(|(i, _)| i)
            .collect()
    }

    // =========================================================================
    // Summary
    // =========================================================================

    /// Summary of the visible rows, rebuilt only when the view version moved
    pub fn summary(&mut self) -> &[SummaryEntry] {
        let fresh = self
            .summary_cache
            .as_ref()
            .is_some_and(|cache| cache.version == self.view_version);
        if !fresh {
            let entries = self.summary_for(&self.visible_rows());
            self.summary_cache = Some(SummaryCache {
                version: self.view_version,
                entries,
            });
        }
        self.summary_cache
            .as_ref()
            .map(|cache| cache.entries.as_slice())
            .unwrap_or_default()
    }

    /// Uncached summary of an arbitrary row set
    pub fn summary_for(&self, rows: &[usize]) -> Vec<SummaryEntry> {
        build_summary(&self.script, &self.occurrences, &self.metadata, rows)
    }

    pub fn find_summary(&mut self, key: &SummaryKey) -> Option<&SummaryEntry> {
        self.summary().iter().find(|entry| entry.key == *key)
    }

    /// `(sequence, count)` pairs for one summary group, most references first
    pub fn sequence_counts(&mut self, key: &SummaryKey) -> Vec<(usize, usize)> {
        self.find_summary(key)
            .map(SummaryEntry::sorted_sequences)
            .unwrap_or_default()
    }

    // =========================================================================
    // Queueing
    // =========================================================================

    fn edit_row(&mut self, row: usize, edit: impl FnOnce(&mut RowState)) -> bool {
        let Some(state) = self.rows.get_mut(row) else {
            return false;
        };
        edit(state);
        state.mark_edited();
        if self.filter.pending_only {
            self.invalidate_view();
        }
        true
    }

    /// Queue a replacement id; blank text clears the queued value
    pub fn queue_raw(&mut self, row: usize, text: &str) -> bool {
        let text = text.trim();
        let value = (!text.is_empty()).then(|| text.to_string());
        self.edit_row(row, |state| state.edits.raw = value)
    }

    pub fn queue_delta(&mut self, row: usize, delta: i32) -> bool {
        self.edit_row(row, |state| state.edits.delta = Some(delta))
    }

    pub fn queue_amount(&mut self, row: usize, amount: i32) -> bool {
        self.edit_row(row, |state| state.edits.amount = Some(amount))
    }

    pub fn queue_compare_value(&mut self, row: usize, value: i32) -> bool {
        self.edit_row(row, |state| state.edits.compare_value = Some(value))
    }

    pub fn queue_compare_mode(&mut self, row: usize, mode: i32) -> bool {
        self.edit_row(row, |state| state.edits.compare_mode = Some(mode))
    }

    pub fn queue_change_value(&mut self, row: usize, value: i32) -> bool {
        self.edit_row(row, |state| state.edits.change_value = Some(value))
    }

    pub fn queue_change_mode(&mut self, row: usize, mode: i32) -> bool {
        self.edit_row(row, |state| state.edits.change_mode = Some(mode))
    }

    pub fn queue_jump(&mut self, row: usize, target: i32, as_frame: bool) -> bool {
        self.edit_row(row, |state| {
            state.edits.jump = Some(JumpEdit { target, as_frame })
        })
    }

    pub fn has_pending(&self) -> bool {
        self.rows.iter().any(RowState::has_pending)
    }

    pub fn pending_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.has_pending())
            .map(|(i, _)| i)
            .collect()
    }

    /// Reset every row to clean
    pub fn clear_pending(&mut self) {
        self.rows.iter_mut().for_each(RowState::clear);
        if self.filter.pending_only {
            self.invalidate_view();
        }
    }

    pub fn describe_pending(&self, row: usize) -> Option<String> {
        let occ = self.occurrences.get(row)?;
        let state = self.rows.get(row)?;
        Some(describe_edits(&self.script, occ, &state.edits))
    }

    /// Queue `key`'s id to be replaced by `target` on every matching row.
    ///
    /// Returns the number of rows queued. Nothing is written until
    /// [`Self::apply_pending`].
    pub fn global_replace(&mut self, key: &SummaryKey, target: i32) -> Result<usize, PlanError> {
        let rows = plan_global_replace(
            &self.script,
            &self.occurrences,
            &self.metadata,
            key,
            target,
        )?;
        let text = target.to_string();
        for &row in &rows {
            if let Some(state) = self.rows.get_mut(row) {
                state.edits.raw = Some(text.clone());
                state.mark_edited();
            }
        }
        self.invalidate_view();
        Ok(rows.len())
    }

    // =========================================================================
    // Apply
    // =========================================================================

    /// Commit every queued edit.
    ///
    /// Rows are processed independently; a failing row keeps whatever it
    /// committed before the failure. The undo hook fires once per sequence
    /// before its first write, `on_modified` once if anything was written.
    pub fn apply_pending(
        &mut self,
        hooks: &mut dyn WorkbenchHooks,
    ) -> Result<ApplyReport, WorkbenchError> {
        if self.is_stale() {
            tracing::warn!(
                built = self.indexed_generation,
                current = self.script.generation(),
                "refusing to apply edits to a stale occurrence index"
            );
            return Err(WorkbenchError::Stale {
                built: self.indexed_generation,
                current: self.script.generation(),
            });
        }

        let mut report = ApplyReport::default();
        let pending = self.pending_rows();
        if pending.is_empty() {
            return Ok(report);
        }

        let mut saved: HashSet<usize> = HashSet::new();
        for row in pending {
            let (Some(occ), Some(state)) = (self.occurrences.get(row), self.rows.get_mut(row))
            else {
                continue;
            };
            let outcome = apply_row(&mut self.script, occ, &mut state.edits, &mut |sequence| {
                if saved.insert(sequence) {
                    hooks.on_save_undo(sequence);
                }
            });
            if outcome.mutated {
                report.touched.insert(occ.sequence());
            }
            match outcome.error {
                Some(err) => {
                    tracing::warn!(
                        row,
                        sequence = occ.sequence(),
                        reason = %err,
                        "pending edit failed"
                    );
                    state.status = RowStatus::Error(err);
                    report.failed += 1;
                }
                None => {
                    state.status = RowStatus::Applied;
                    report.applied += 1;
                }
            }
        }

        if report.mutated() {
            self.reindex();
            hooks.on_modified();
        }
        tracing::info!(
            applied = report.applied,
            failed = report.failed,
            sequences = report.touched.len(),
            "applied pending edits"
        );
        Ok(report)
    }

    // =========================================================================
    // Listing order
    // =========================================================================

    fn compare_rows(&self, a: usize, b: usize, column: RowSortColumn) -> Ordering {
        let (Some(oa), Some(ob)) = (self.occurrences.get(a), self.occurrences.get(b)) else {
            return Ordering::Equal;
        };
        let (Some(ma), Some(mb)) = (self.metadata.get(a), self.metadata.get(b)) else {
            return Ordering::Equal;
        };
        match column {
            RowSortColumn::Var => oa.var_id(&self.script).cmp(&ob.var_id(&self.script)),
            RowSortColumn::Category => oa.category.cmp(&ob.category),
            RowSortColumn::Pattern => ma.pattern_label.cmp(&mb.pattern_label),
            RowSortColumn::Frame => oa.frame().cmp(&ob.frame()),
            RowSortColumn::Node => ma.node_label.cmp(&mb.node_label),
            RowSortColumn::Raw => oa.raw(&self.script).cmp(&ob.raw(&self.script)),
        }
    }

    /// Order row indices for display; ties fall back to extraction order
    pub fn sort_rows(&self, rows: &mut [usize], specs: &[RowSortSpec]) {
        rows.sort_by(|&a, &b| {
            for spec in specs {
                let ord = self.compare_rows(a, b, spec.column);
                if ord != Ordering::Equal {
                    return match spec.direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    };
                }
            }
            a.cmp(&b)
        });
    }
}
