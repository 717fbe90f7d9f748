//! Non-interactive scan and replace
//!
//! These run straight against a [`Script`] without a [`Workbench`]:
//! [`scan`] lists references (optionally for a single id) and [`replace_var`]
//! rewrites every reference to one id, returning an [`AuditRecord`] per change.
//!
//! [`Workbench`]: crate::Workbench

use std::fmt;
use std::io::{self, Write};

use crate::codec::Encoding;
use crate::occurrence::{
    Category, KIND_COUNT, KIND_TABLE, Occurrence, OccurrenceKind, collect_occurrences,
};
use crate::script::Script;

/// One listed reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub kind: OccurrenceKind,
    pub pattern_label: String,
    pub frame: usize,
    pub category: Category,
    pub node_label: String,
    pub var_id: i32,
    pub raw: i32,
    /// Low digit of a tens composite value
    pub value_digit: Option<i32>,
}

impl ScanEntry {
    fn new(script: &Script, occ: &Occurrence) -> Self {
        let raw = occ.raw(script);
        let position = match occ.effect_number {
            Some(number) => format!("[EF #{}, no {}]", occ.block_index(), number),
            None => format!("[IF #{}]", occ.block_index()),
        };
        Self {
            kind: occ.kind,
            pattern_label: script.decorated_name(occ.sequence()),
            frame: occ.frame(),
            category: occ.category,
            node_label: format!("{} [{}] {}", occ.kind.label(), occ.category, position),
            var_id: occ.var_id(script),
            raw,
            value_digit: (occ.encoding == Encoding::TensComposite)
                .then(|| occ.encoding.remainder(raw)),
        }
    }
}

impl fmt::Display for ScanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- Pattern {}, Frame {}, {}, var {}, raw {}",
            self.pattern_label, self.frame, self.node_label, self.var_id, self.raw
        )?;
        if let Some(digit) = self.value_digit {
            write!(f, " (value digit {})", digit)?;
        }
        Ok(())
    }
}

/// Listing plus per-kind counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
    /// Non-zero counts in kind table order
    pub breakdown: Vec<(OccurrenceKind, usize)>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// e.g. `Breakdown: IF02=1 EF6-100=2`
    pub fn breakdown_line(&self) -> String {
        let parts: Vec<_> = self
            .breakdown
            .iter()
            .map(|(kind, count)| format!("{}={}", kind.code(), count))
            .collect();
        format!("Breakdown: {}", parts.join(" "))
    }
}

/// List every reference, or only those whose decoded id equals `var`
pub fn scan(script: &Script, var: Option<i32>) -> ScanReport {
    let mut counts = [0usize; KIND_COUNT];
    let entries: Vec<_> = collect_occurrences(script)
        .iter()
        .filter(|occ| var.is_none_or(|id| occ.var_id(script) == id))
        .map(|occ| {
            counts[occ.kind as usize] += 1;
            ScanEntry::new(script, occ)
        })
        .collect();

    let breakdown = KIND_TABLE
        .iter()
        .map(|desc| (desc.kind, counts[desc.kind as usize]))
        .filter(|&(_, count)| count > 0)
        .collect();
    ScanReport { entries, breakdown }
}

/// One rewritten reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub from: i32,
    pub to: i32,
    pub sequence: usize,
    pub pattern_label: String,
    pub frame: usize,
    pub node_label: String,
    pub raw_before: i32,
    pub raw_after: i32,
}

/// Rewrite every reference to `from` as `to`, keeping remainders.
///
/// With `dry_run` the script is left untouched but the records describe what
/// would have been written.
pub fn replace_var(script: &mut Script, from: i32, to: i32, dry_run: bool) -> Vec<AuditRecord> {
    let occurrences = collect_occurrences(script);
    let mut records = Vec::new();
    for occ in &occurrences {
        if occ.var_id(script) != from {
            continue;
        }
        let raw_before = occ.raw(script);
        let raw_after = occ.encoding.with_id(raw_before, to);
        records.push(AuditRecord {
            from,
            to,
            sequence: occ.sequence(),
            pattern_label: script.decorated_name(occ.sequence()),
            frame: occ.frame(),
            node_label: occ.node_label(),
            raw_before,
            raw_after,
        });
        if !dry_run {
            script.set_slot(&occ.value, raw_after);
        }
    }
    tracing::info!(from, to, dry_run, changes = records.len(), "replaced variable");
    records
}

// =============================================================================
// Audit log
// =============================================================================

/// Column names of the audit log
pub const AUDIT_HEADER: &str =
    "file,from,to,sequence,pattern,frame,node,raw_before,raw_after";

/// Quote a CSV text field, doubling inner quotes
pub fn csv_escape(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

impl AuditRecord {
    pub fn to_csv_row(&self, file_label: &str) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            csv_escape(file_label),
            self.from,
            self.to,
            self.sequence,
            csv_escape(&self.pattern_label),
            self.frame,
            csv_escape(&self.node_label),
            self.raw_before,
            self.raw_after
        )
    }
}

/// Write audit rows, preceded by the header when `with_header` is set
pub fn write_audit<W: Write>(
    mut out: W,
    file_label: &str,
    records: &[AuditRecord],
    with_header: bool,
) -> io::Result<()> {
    if with_header {
        writeln!(out, "{}", AUDIT_HEADER)?;
    }
    for record in records {
        writeln!(out, "{}", record.to_csv_row(file_label))?;
    }
    out.flush()
}
