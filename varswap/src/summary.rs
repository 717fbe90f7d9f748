//! Per-variable rollups
//!
//! Occurrences are grouped by `(normalized id, category, is-global)` where the
//! global flag only distinguishes projectile groups. Each group counts its
//! members, keeps a per-sequence histogram, and totals the remainders of
//! shared-register increase/decrease ops.

use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::metadata::{OccurrenceMetadata, describe_projectile_var, is_global_register_id};
use crate::occurrence::{Category, Occurrence};
use crate::script::Script;

/// Group identity of a summary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    /// Decoded id, or 0 for categories without a numeric id
    pub var_id: i32,
    pub category: Category,
    /// Shared projectile register group (always false outside `Projectile`)
    pub is_global: bool,
}

impl SummaryKey {
    pub fn new(var_id: i32, category: Category, is_global: bool) -> Self {
        Self {
            var_id: if category.has_numeric_id() { var_id } else { 0 },
            category,
            is_global: category == Category::Projectile && is_global,
        }
    }

    fn for_occurrence(script: &Script, occ: &Occurrence, meta: &OccurrenceMetadata) -> Self {
        Self::new(occ.var_id(script), occ.category, meta.is_global)
    }
}

/// Display label for a summary id: two-digit padding below 100
pub fn format_var_label(var_id: i32) -> String {
    if (0..100).contains(&var_id) {
        format!("{:02}", var_id)
    } else {
        var_id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub key: SummaryKey,
    pub count: usize,
    /// Occurrences per sequence index
    pub sequence_counts: HashMap<usize, usize>,
    pub global_op_count: usize,
    pub global_increase_total: i64,
    pub global_decrease_total: i64,
    /// Shown as a shared register: any global member, any global op, or an
    /// id in the well-known register range
    pub is_global: bool,
    pub label: String,
    /// Register bank a projectile id belongs to
    pub register_bank: Option<&'static str>,
}

impl SummaryEntry {
    fn empty(key: SummaryKey) -> Self {
        Self {
            key,
            count: 0,
            sequence_counts: HashMap::new(),
            global_op_count: 0,
            global_increase_total: 0,
            global_decrease_total: 0,
            is_global: false,
            label: String::new(),
            register_bank: None,
        }
    }

    pub fn var_id(&self) -> i32 {
        self.key.var_id
    }

    pub fn category(&self) -> Category {
        self.key.category
    }

    pub fn has_numeric_id(&self) -> bool {
        self.key.category.has_numeric_id()
    }

    /// `(sequence, count)` pairs, most references first, then by sequence index
    pub fn sorted_sequences(&self) -> Vec<(usize, usize)> {
        let mut list: Vec<_> = self.sequence_counts.iter().map(|(&s, &c)| (s, c)).collect();
        list.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        list
    }
}

/// Summary table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Var,
    Category,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// Group the `visible` occurrences into summary entries, in default order
pub fn build_summary(
    script: &Script,
    occurrences: &[Occurrence],
    metadata: &[OccurrenceMetadata],
    visible: &[usize],
) -> Vec<SummaryEntry> {
    let mut groups: HashMap<SummaryKey, SummaryEntry> = HashMap::with_capacity(visible.len());

    for &row in visible {
        let (Some(occ), Some(meta)) = (occurrences.get(row), metadata.get(row)) else {
            continue;
        };
        let key = SummaryKey::for_occurrence(script, occ, meta);
        let entry = groups.entry(key).or_insert_with(|| SummaryEntry::empty(key));
        entry.count += 1;
        *entry.sequence_counts.entry(occ.sequence()).or_default() += 1;
        if occ.category == Category::Projectile {
            entry.is_global |= meta.is_global;
        }
        if meta.is_global {
            entry.global_op_count += 1;
            if meta.global_decrement {
                entry.global_decrease_total += i64::from(meta.global_delta);
            } else {
                entry.global_increase_total += i64::from(meta.global_delta);
            }
        }
    }

    let mut entries: Vec<_> = groups
        .into_values()
        .map(|mut entry| {
            let projectile = entry.category() == Category::Projectile;
            entry.is_global = projectile
                && (entry.is_global
                    || entry.global_op_count > 0
                    || is_global_register_id(entry.var_id()));
            entry.label = if entry.has_numeric_id() {
                format_var_label(entry.var_id())
            } else {
                entry.category().label().to_string()
            };
            entry.register_bank = projectile.then(|| describe_projectile_var(entry.var_id()));
            entry
        })
        .collect();
    sort_entries(&mut entries, &[]);
    tracing::debug!(
        visible = visible.len(),
        groups = entries.len(),
        "built variable summary"
    );
    entries
}

fn compare_column(lhs: &SummaryEntry, rhs: &SummaryEntry, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Var => match (lhs.has_numeric_id(), rhs.has_numeric_id()) {
            (true, true) => lhs.var_id().cmp(&rhs.var_id()),
            (false, false) => lhs.label.cmp(&rhs.label),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        },
        SortColumn::Category => {
            let ord = lhs.category().cmp(&rhs.category());
            if ord == Ordering::Equal && lhs.category() == Category::Projectile {
                // global first
                rhs.is_global.cmp(&lhs.is_global)
            } else {
                ord
            }
        }
        SortColumn::Count => lhs.count.cmp(&rhs.count),
    }
}

fn fallback(lhs: &SummaryEntry, rhs: &SummaryEntry) -> Ordering {
    lhs.var_id()
        .cmp(&rhs.var_id())
        .then_with(|| lhs.label.cmp(&rhs.label))
        .then_with(|| lhs.category().cmp(&rhs.category()))
        .then_with(|| lhs.key.is_global.cmp(&rhs.key.is_global))
}

/// Stable multi-key sort. Empty `specs` means ascending id, then label.
pub fn sort_entries(entries: &mut [SummaryEntry], specs: &[SortSpec]) {
    entries.sort_by(|lhs, rhs| {
        for spec in specs {
            let ord = compare_column(lhs, rhs, spec.column);
            if ord != Ordering::Equal {
                return match spec.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                };
            }
        }
        fallback(lhs, rhs)
    });
}
