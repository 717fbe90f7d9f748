//! Per-occurrence queued edits and their commit order

use crate::codec::with_remainder;
use crate::error::EditError;
use crate::occurrence::Occurrence;
use crate::script::{Script, SlotRef};

/// Queued jump rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpEdit {
    pub target: i32,
    /// Frame jump; pattern jump otherwise (only on pattern-capable slots)
    pub as_frame: bool,
}

/// Independent optional sub-edits for one occurrence.
///
/// Committed in field order: raw, delta, amount, compare value, compare mode,
/// change value, change mode, jump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdits {
    /// Replacement id as entered (decimal text)
    pub raw: Option<String>,
    pub delta: Option<i32>,
    pub amount: Option<i32>,
    pub compare_value: Option<i32>,
    pub compare_mode: Option<i32>,
    pub change_value: Option<i32>,
    pub change_mode: Option<i32>,
    pub jump: Option<JumpEdit>,
}

impl PendingEdits {
    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
            && self.delta.is_none()
            && self.amount.is_none()
            && self.compare_value.is_none()
            && self.compare_mode.is_none()
            && self.change_value.is_none()
            && self.change_mode.is_none()
            && self.jump.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RowStatus {
    #[default]
    Clean,
    Pending,
    Applied,
    Error(EditError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowState {
    pub edits: PendingEdits,
    pub status: RowStatus,
}

impl RowState {
    pub fn has_pending(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Reset to a clean row with nothing queued
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Status after a queue change; an errored row becomes pending again
    pub(crate) fn mark_edited(&mut self) {
        self.status = if self.has_pending() {
            RowStatus::Pending
        } else {
            RowStatus::Clean
        };
    }
}

/// Result of committing one row
#[derive(Debug, Default)]
pub(crate) struct RowOutcome {
    /// At least one sub-edit was written
    pub mutated: bool,
    pub error: Option<EditError>,
}

fn parse_id(text: &str) -> Result<i32, EditError> {
    text.trim()
        .parse::<i32>()
        .map_err(|_| EditError::Invalid(text.to_string()))
}

fn resolved(script: &Script, slot: Option<SlotRef>) -> Option<SlotRef> {
    slot.filter(|s| script.slot(s).is_some())
}

/// Commit the queued sub-edits of one row in order.
///
/// `before_write` runs ahead of every write with the owning sequence index.
/// Committed sub-edits are cleared from `edits`; on the first failure the
/// remaining ones (the failing one included) stay queued.
pub(crate) fn apply_row(
    script: &mut Script,
    occ: &Occurrence,
    edits: &mut PendingEdits,
    before_write: &mut dyn FnMut(usize),
) -> RowOutcome {
    let mut outcome = RowOutcome::default();
    if let Err(err) = apply_steps(script, occ, edits, before_write, &mut outcome.mutated) {
        outcome.error = Some(err);
    }
    outcome
}

fn apply_steps(
    script: &mut Script,
    occ: &Occurrence,
    edits: &mut PendingEdits,
    before_write: &mut dyn FnMut(usize),
    mutated: &mut bool,
) -> Result<(), EditError> {
    let sequence = occ.sequence();
    // Delta bounds come from the value as it was before this row was touched
    let pre_raw = script.slot(&occ.value);

    if let Some(text) = &edits.raw {
        let id = parse_id(text)?;
        if pre_raw.is_none() {
            return Err(EditError::ReadOnly);
        }
        before_write(sequence);
        occ.set_var_id(script, id);
        *mutated = true;
        edits.raw = None;
    }

    if let Some(delta) = edits.delta {
        let Some(raw) = pre_raw.filter(|_| occ.kind.supports_delta()) else {
            return Err(EditError::DeltaUnsupported);
        };
        let base = occ.encoding.delta_base(raw);
        let current = script.slot(&occ.value).unwrap_or(raw);
        before_write(sequence);
        script.set_slot(&occ.value, with_remainder(current, delta, base));
        *mutated = true;
        edits.delta = None;
    }

    if let Some(amount) = edits.amount {
        if !occ.kind.supports_amount() || pre_raw.is_none() {
            return Err(EditError::AmountUnsupported);
        }
        before_write(sequence);
        script.set_slot(&occ.value, amount);
        *mutated = true;
        edits.amount = None;
    }

    let secondaries = [
        (&mut edits.compare_value, occ.compare_value, EditError::CompareUnsupported),
        (&mut edits.compare_mode, occ.compare_mode, EditError::CompareModeUnsupported),
        (&mut edits.change_value, occ.change_value, EditError::ChangeValueUnsupported),
        (&mut edits.change_mode, occ.change_mode, EditError::ChangeModeUnsupported),
    ];
    for (queued, slot, unsupported) in secondaries {
        let Some(value) = *queued else {
            continue;
        };
        let Some(slot) = resolved(script, slot) else {
            return Err(unsupported);
        };
        before_write(sequence);
        script.set_slot(&slot, value);
        *mutated = true;
        *queued = None;
    }

    if let Some(jump) = edits.jump {
        if resolved(script, occ.jump_target).is_none() {
            return Err(EditError::JumpUnsupported);
        }
        before_write(sequence);
        occ.set_jump(script, jump.target, jump.as_frame);
        *mutated = true;
        edits.jump = None;
    }

    Ok(())
}

fn jump_text(value: i32, is_frame: bool) -> String {
    format!("{} {}", if is_frame { "Frame" } else { "Pattern" }, value)
}

/// Human-readable list of the queued changes, e.g.
/// `Value: 4 -> 9, Delta: 3 -> 5, Jump: Frame 2 -> Pattern 7`
pub fn describe_edits(script: &Script, occ: &Occurrence, edits: &PendingEdits) -> String {
    let current = |slot: Option<SlotRef>| {
        slot.and_then(|s| script.slot(&s))
            .map_or_else(|| "?".to_string(), |v| v.to_string())
    };
    let mut parts = Vec::new();

    if let Some(text) = &edits.raw {
        parts.push(format!("Value: {} -> {}", occ.var_id(script), text.trim()));
    }
    if let Some(amount) = edits.amount {
        let label = if edits.raw.is_some() { "Amount" } else { "Value" };
        parts.push(format!("{}: {} -> {}", label, occ.var_id(script), amount));
    }
    if let Some(delta) = edits.delta {
        parts.push(format!("Delta: {} -> {}", occ.remainder(script), delta));
    }
    if let Some(v) = edits.compare_value {
        parts.push(format!("Compare value: {} -> {}", current(occ.compare_value), v));
    }
    if let Some(v) = edits.compare_mode {
        parts.push(format!("Compare mode: {} -> {}", current(occ.compare_mode), v));
    }
    if let Some(v) = edits.change_value {
        parts.push(format!("Change value: {} -> {}", current(occ.change_value), v));
    }
    if let Some(v) = edits.change_mode {
        parts.push(format!("Change mode: {} -> {}", current(occ.change_mode), v));
    }
    if let Some(jump) = edits.jump {
        let before = occ
            .jump(script)
            .map_or_else(|| "?".to_string(), |(v, frame)| jump_text(v, frame));
        let as_frame = jump.as_frame || !occ.jump_supports_pattern;
        parts.push(format!(
            "Jump: {} -> {}",
            before,
            jump_text(jump.target.max(0), as_frame)
        ));
    }
    if parts.is_empty() {
        return "Pending change".to_string();
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::collect_occurrences;
    use crate::test_support::{ScriptBuilder, cond, effect};

    fn run(script: &mut Script, occ: &Occurrence, edits: &mut PendingEdits) -> (RowOutcome, Vec<usize>) {
        let mut writes = Vec::new();
        let outcome = apply_row(script, occ, edits, &mut |seq| writes.push(seq));
        (outcome, writes)
    }

    #[test]
    fn test_raw_and_delta_use_pre_edit_base() {
        // 45 is narrow (base 10); moving the id to 60 yields 605, but the
        // delta stays bounded by the starting base
        let mut script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .effect(effect(6, 100, &[45]))
            .build();
        let occ = collect_occurrences(&script).remove(0);
        let mut edits = PendingEdits {
            raw: Some("60".to_string()),
            delta: Some(25),
            ..Default::default()
        };
        let (outcome, writes) = run(&mut script, &occ, &mut edits);
        assert!(outcome.mutated);
        assert_eq!(outcome.error, None);
        assert!(edits.is_empty());
        assert_eq!(writes, vec![0, 0]);
        assert_eq!(occ.raw(&script), 609);
    }

    #[test]
    fn test_partial_failure_keeps_committed_edits() {
        let mut script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(24, &[2, 47]))
            .build();
        let occ = collect_occurrences(&script).remove(0);
        let mut edits = PendingEdits {
            raw: Some("9".to_string()),
            amount: Some(3),
            jump: Some(JumpEdit {
                target: 5,
                as_frame: true,
            }),
            ..Default::default()
        };
        let (outcome, _) = run(&mut script, &occ, &mut edits);
        assert!(outcome.mutated);
        assert_eq!(outcome.error, Some(EditError::AmountUnsupported));
        assert_eq!(occ.raw(&script), 97);
        assert_eq!(edits.raw, None);
        assert_eq!(edits.amount, Some(3));
        assert!(edits.jump.is_some());
        assert_eq!(occ.jump(&script), Some((2, true)));
    }

    #[test]
    fn test_invalid_text_writes_nothing() {
        let mut script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(2, &[0, 0, 0, 47]))
            .build();
        let occ = collect_occurrences(&script).remove(0);
        let mut edits = PendingEdits {
            raw: Some("abc".to_string()),
            ..Default::default()
        };
        let (outcome, writes) = run(&mut script, &occ, &mut edits);
        assert!(!outcome.mutated);
        assert_eq!(outcome.error, Some(EditError::Invalid("abc".to_string())));
        assert!(writes.is_empty());
        assert!(!script.sequences()[0].modified);
    }

    #[test]
    fn test_secondary_slots() {
        let mut script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(25, &[0, 12, 5, 2]))
            .condition(cond(31, &[0, 4, 1]))
            .build();
        let occs = collect_occurrences(&script);

        let mut edits = PendingEdits {
            compare_value: Some(8),
            compare_mode: Some(1),
            jump: Some(JumpEdit {
                target: 3,
                as_frame: false,
            }),
            ..Default::default()
        };
        let (outcome, _) = run(&mut script, &occs[0], &mut edits);
        assert_eq!(outcome.error, None);
        assert_eq!(script.slot(&occs[0].compare_value.unwrap()), Some(8));
        assert_eq!(script.slot(&occs[0].compare_mode.unwrap()), Some(1));
        assert_eq!(occs[0].jump(&script), Some((3, false)));

        let mut edits = PendingEdits {
            change_value: Some(6),
            change_mode: Some(2),
            ..Default::default()
        };
        let (outcome, _) = run(&mut script, &occs[1], &mut edits);
        assert!(outcome.mutated);
        assert_eq!(outcome.error, Some(EditError::ChangeModeUnsupported));
        assert_eq!(script.slot(&occs[1].change_value.unwrap()), Some(6));
        assert_eq!(edits.change_mode, Some(2));
    }

    #[test]
    fn test_amount_on_dash() {
        let mut script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .effect(effect(6, 102, &[3]))
            .build();
        let occ = collect_occurrences(&script).remove(0);
        let mut edits = PendingEdits {
            amount: Some(7),
            delta: Some(1),
            ..Default::default()
        };
        let (outcome, _) = run(&mut script, &occ, &mut edits);
        // delta comes first and fails before the amount is reached
        assert_eq!(outcome.error, Some(EditError::DeltaUnsupported));
        assert!(!outcome.mutated);

        edits.delta = None;
        let (outcome, _) = run(&mut script, &occ, &mut edits);
        assert_eq!(outcome.error, None);
        assert_eq!(occ.raw(&script), 7);
    }

    #[test]
    fn test_row_state_transitions() {
        let mut row = RowState::default();
        assert_eq!(row.status, RowStatus::Clean);

        row.edits.delta = Some(1);
        row.mark_edited();
        assert_eq!(row.status, RowStatus::Pending);

        row.status = RowStatus::Error(EditError::DeltaUnsupported);
        row.edits.amount = Some(2);
        row.mark_edited();
        assert_eq!(row.status, RowStatus::Pending);

        row.clear();
        assert!(!row.has_pending());
        assert_eq!(row.status, RowStatus::Clean);
    }

    #[test]
    fn test_describe_edits() {
        let script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(3, &[2, 0, 0, 43]))
            .build();
        let occ = collect_occurrences(&script).remove(0);
        let edits = PendingEdits {
            raw: Some(" 9 ".to_string()),
            delta: Some(5),
            jump: Some(JumpEdit {
                target: 7,
                as_frame: false,
            }),
            ..Default::default()
        };
        assert_eq!(
            describe_edits(&script, &occ, &edits),
            "Value: 4 -> 9, Delta: 3 -> 5, Jump: Frame 2 -> Pattern 7"
        );
        assert_eq!(
            describe_edits(&script, &occ, &PendingEdits::default()),
            "Pending change"
        );
    }
}
