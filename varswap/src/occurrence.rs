//! Variable occurrence extraction
//!
//! Walks every condition and effect block of a [`Script`] and emits one
//! [`Occurrence`] per recognised instruction slot. Recognition goes through a
//! fixed descriptor table keyed by block kind, type code and (for effect
//! type 6) sub-command number. Unrecognised blocks are skipped.
//!
//! Output order: sequence, frame, then conditions before effects, each in
//! declaration order.

use std::fmt;
use std::sync::LazyLock;

use hashbrown::HashMap;

use crate::codec::{Encoding, is_wide_raw};
use crate::script::{BlockKind, Script, SlotRef};

/// Frame-jump offset used by pattern-capable jump slots
pub const PATTERN_JUMP_OFFSET: i32 = 10000;

/// Semantic category of a referenced variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Projectile,
    /// Projectile variable touched with a zero delta
    ProjectileNoChange,
    Extra,
    Dash,
    Assist,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Projectile,
        Category::ProjectileNoChange,
        Category::Extra,
        Category::Dash,
        Category::Assist,
        Category::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Projectile => "Projectile",
            Self::ProjectileNoChange => "Proj. Null",
            Self::Extra => "Extra",
            Self::Dash => "Dash",
            Self::Assist => "Assist",
            Self::Unknown => "Unknown",
        }
    }

    /// Dash and assist registers are implicit; their slots carry an amount
    pub fn has_numeric_id(self) -> bool {
        !matches!(self, Self::Dash | Self::Assist)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recognised instruction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OccurrenceKind {
    IfType2,
    IfType3,
    IfType24,
    IfType25,
    IfType31,
    IfType38,
    EfType1,
    EfType11,
    EfType6No100,
    EfType6No101,
    EfType6No102,
    EfType6No103,
    EfType6No105,
}

impl OccurrenceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::IfType2 => "IF type 2 (Effect despawn var delta)",
            Self::IfType3 => "IF type 3 (Branch on hit var delta)",
            Self::IfType24 => "IF type 24 (Projectile variable check)",
            Self::IfType25 => "IF type 25 (Variable comparison)",
            Self::IfType31 => "IF type 31 (Change variable on command)",
            Self::IfType38 => "IF type 38 (Change variable on hit)",
            Self::EfType1 => "EF type 1/101 (Spawn pattern var delta)",
            Self::EfType11 => "EF type 11/111 (Random spawn var delta)",
            Self::EfType6No100 => "EF type 6 #100 (Increase projectile variable)",
            Self::EfType6No101 => "EF type 6 #101 (Decrease projectile variable)",
            Self::EfType6No102 => "EF type 6 #102 (Increase dash variable)",
            Self::EfType6No103 => "EF type 6 #103 (Decrease dash variable)",
            Self::EfType6No105 => "EF type 6 #105 (Change variable)",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::IfType2 => "IF02",
            Self::IfType3 => "IF03",
            Self::IfType24 => "IF24",
            Self::IfType25 => "IF25",
            Self::IfType31 => "IF31",
            Self::IfType38 => "IF38",
            Self::EfType1 => "EF1",
            Self::EfType11 => "EF11",
            Self::EfType6No100 => "EF6-100",
            Self::EfType6No101 => "EF6-101",
            Self::EfType6No102 => "EF6-102",
            Self::EfType6No103 => "EF6-103",
            Self::EfType6No105 => "EF6-105",
        }
    }

    /// Increase/decrease projectile variable pair
    pub fn is_projectile_register_op(self) -> bool {
        matches!(self, Self::EfType6No100 | Self::EfType6No101)
    }

    /// Kinds whose composite remainder is counted downwards
    pub fn is_decrement(self) -> bool {
        matches!(self, Self::EfType6No101)
    }

    /// Kinds whose remainder may be edited as a delta
    pub fn supports_delta(self) -> bool {
        matches!(
            self,
            Self::EfType6No100
                | Self::EfType6No101
                | Self::IfType2
                | Self::IfType3
                | Self::EfType1
                | Self::EfType11
        )
    }

    /// Kinds whose direct value is an amount rather than an id
    pub fn supports_amount(self) -> bool {
        matches!(self, Self::EfType6No102 | Self::EfType6No103)
    }
}

/// Static description of one recognised instruction slot layout
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub kind: OccurrenceKind,
    pub block: BlockKind,
    pub type_codes: &'static [i32],
    /// Effect sub-command number; `None` matches any number
    pub number: Option<i32>,
    pub category: Category,
    pub encoding: Encoding,
    pub value: usize,
    pub compare_value: Option<usize>,
    pub compare_mode: Option<usize>,
    pub change_value: Option<usize>,
    pub change_mode: Option<usize>,
    pub jump_target: Option<usize>,
    pub jump_supports_pattern: bool,
}

impl KindDescriptor {
    const fn new(
        kind: OccurrenceKind,
        block: BlockKind,
        type_codes: &'static [i32],
        number: Option<i32>,
        category: Category,
        encoding: Encoding,
        value: usize,
    ) -> Self {
        Self {
            kind,
            block,
            type_codes,
            number,
            category,
            encoding,
            value,
            compare_value: None,
            compare_mode: None,
            change_value: None,
            change_mode: None,
            jump_target: None,
            jump_supports_pattern: false,
        }
    }

    const fn compare(mut self, value: usize, mode: usize) -> Self {
        self.compare_value = Some(value);
        self.compare_mode = Some(mode);
        self
    }

    const fn change(mut self, value: Option<usize>, mode: Option<usize>) -> Self {
        self.change_value = value;
        self.change_mode = mode;
        self
    }

    const fn pattern_jump(mut self, slot: usize) -> Self {
        self.jump_target = Some(slot);
        self.jump_supports_pattern = true;
        self
    }
}

use BlockKind::{Condition as IF, Effect as EF};
use Category::{Dash, Extra, Projectile};
use Encoding::{Direct, ProjectileComposite, TensComposite};

/// Number of recognised instruction kinds
pub const KIND_COUNT: usize = 13;

/// Every recognised instruction, in reporting order
pub static KIND_TABLE: [KindDescriptor; KIND_COUNT] = [
    KindDescriptor::new(OccurrenceKind::IfType2, IF, &[2], None, Projectile, TensComposite, 3),
    KindDescriptor::new(OccurrenceKind::IfType3, IF, &[3], None, Projectile, TensComposite, 3)
        .pattern_jump(0),
    KindDescriptor::new(OccurrenceKind::IfType24, IF, &[24], None, Projectile, TensComposite, 1)
        .pattern_jump(0),
    KindDescriptor::new(OccurrenceKind::IfType25, IF, &[25], None, Extra, Direct, 1)
        .compare(2, 3)
        .pattern_jump(0),
    KindDescriptor::new(OccurrenceKind::IfType31, IF, &[31], None, Extra, Direct, 1)
        .change(Some(2), None),
    KindDescriptor::new(OccurrenceKind::IfType38, IF, &[38], None, Extra, Direct, 3)
        .change(Some(0), Some(4)),
    KindDescriptor::new(OccurrenceKind::EfType1, EF, &[1, 101], None, Projectile, TensComposite, 8),
    KindDescriptor::new(OccurrenceKind::EfType11, EF, &[11, 111], None, Projectile, TensComposite, 9),
    KindDescriptor::new(OccurrenceKind::EfType6No100, EF, &[6], Some(100), Projectile, ProjectileComposite, 0),
    KindDescriptor::new(OccurrenceKind::EfType6No101, EF, &[6], Some(101), Projectile, ProjectileComposite, 0),
    KindDescriptor::new(OccurrenceKind::EfType6No102, EF, &[6], Some(102), Dash, Direct, 0),
    KindDescriptor::new(OccurrenceKind::EfType6No103, EF, &[6], Some(103), Dash, Direct, 0),
    KindDescriptor::new(OccurrenceKind::EfType6No105, EF, &[6], Some(105), Extra, Direct, 0)
        .change(Some(1), Some(2)),
];

type LookupKey = (BlockKind, i32, Option<i32>);

static LOOKUP: LazyLock<HashMap<LookupKey, &'static KindDescriptor>> = LazyLock::new(|| {
    let mut map = HashMap::with_capacity(KIND_TABLE.len() + 2);
    for desc in KIND_TABLE.iter() {
        for &code in desc.type_codes {
            map.insert((desc.block, code, desc.number), desc);
        }
    }
    map
});

/// Find the descriptor for a block, or `None` if it references no variable
pub fn lookup(
    block: BlockKind,
    type_code: i32,
    number: Option<i32>,
) -> Option<&'static KindDescriptor> {
    match block {
        BlockKind::Condition => LOOKUP.get(&(block, type_code, None)).copied(),
        BlockKind::Effect => LOOKUP
            .get(&(block, type_code, number))
            .or_else(|| LOOKUP.get(&(block, type_code, None)))
            .copied(),
    }
}

pub fn descriptor(kind: OccurrenceKind) -> &'static KindDescriptor {
    &KIND_TABLE[kind as usize]
}

/// One recognised variable reference inside a script.
///
/// Holds positional slot addresses only; valid until the next structural
/// mutation of the script (see [`Script::generation`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub kind: OccurrenceKind,
    pub category: Category,
    pub encoding: Encoding,
    pub value: SlotRef,
    pub compare_value: Option<SlotRef>,
    pub compare_mode: Option<SlotRef>,
    pub change_value: Option<SlotRef>,
    pub change_mode: Option<SlotRef>,
    pub jump_target: Option<SlotRef>,
    pub jump_supports_pattern: bool,
    /// Effect sub-command number (effects only)
    pub effect_number: Option<i32>,
}

impl Occurrence {
    fn from_descriptor(desc: &KindDescriptor, value: SlotRef, effect_number: Option<i32>) -> Self {
        let at = |param: Option<usize>| param.map(|p| value.with_param(p));
        Self {
            kind: desc.kind,
            category: desc.category,
            encoding: desc.encoding,
            value,
            compare_value: at(desc.compare_value),
            compare_mode: at(desc.compare_mode),
            change_value: at(desc.change_value),
            change_mode: at(desc.change_mode),
            jump_target: at(desc.jump_target),
            jump_supports_pattern: desc.jump_supports_pattern,
            effect_number,
        }
    }

    pub fn sequence(&self) -> usize {
        self.value.sequence
    }

    pub fn frame(&self) -> usize {
        self.value.frame
    }

    pub fn block_index(&self) -> usize {
        self.value.block_index
    }

    pub fn block(&self) -> BlockKind {
        self.value.block
    }

    /// Raw primary value (0 if the slot no longer resolves)
    pub fn raw(&self, script: &Script) -> i32 {
        script.slot(&self.value).unwrap_or(0)
    }

    /// Decoded variable id
    pub fn var_id(&self, script: &Script) -> i32 {
        self.encoding.id(self.raw(script))
    }

    /// Decoded composite remainder (0 for direct slots)
    pub fn remainder(&self, script: &Script) -> i32 {
        self.encoding.remainder(self.raw(script))
    }

    /// Shared projectile register op: increase/decrease pair using the wide base
    pub fn is_global_register_op(&self, script: &Script) -> bool {
        self.kind.is_projectile_register_op()
            && self.encoding == Encoding::ProjectileComposite
            && script.slot(&self.value).is_some_and(is_wide_raw)
    }

    /// Bound for delta edits: `0..delta_base`
    pub fn delta_base(&self, script: &Script) -> i32 {
        self.encoding.delta_base(self.raw(script))
    }

    /// Rewrite the variable id, keeping the remainder. Returns false if the
    /// slot does not resolve.
    pub fn set_var_id(&self, script: &mut Script, new_id: i32) -> bool {
        let Some(raw) = script.slot(&self.value) else {
            return false;
        };
        script.set_slot(&self.value, self.encoding.with_id(raw, new_id))
    }

    /// Decode the jump slot as `(value, is_frame)`
    pub fn jump(&self, script: &Script) -> Option<(i32, bool)> {
        let raw = script.slot(self.jump_target.as_ref()?)?;
        if self.jump_supports_pattern && raw >= PATTERN_JUMP_OFFSET {
            Some(((raw - PATTERN_JUMP_OFFSET).max(0), false))
        } else {
            Some((raw.max(0), true))
        }
    }

    /// Encode a jump target. Slots that cannot address patterns always jump to frames.
    pub fn set_jump(&self, script: &mut Script, target: i32, as_frame: bool) -> bool {
        let Some(slot) = self.jump_target else {
            return false;
        };
        let target = target.max(0);
        let raw = if self.jump_supports_pattern && !as_frame {
            target.saturating_add(PATTERN_JUMP_OFFSET)
        } else {
            target
        };
        script.set_slot(&slot, raw)
    }

    /// Kind description plus block position, e.g. `... [EF #2, no 100]`
    pub fn node_label(&self) -> String {
        match self.block() {
            BlockKind::Condition => format!("{} [IF #{}]", self.kind.label(), self.block_index()),
            BlockKind::Effect => format!(
                "{} [EF #{}, no {}]",
                self.kind.label(),
                self.block_index(),
                self.effect_number.unwrap_or_default()
            ),
        }
    }
}

/// Re-tag zero-delta projectile references
fn apply_category_override(occ: &mut Occurrence, script: &Script) {
    if occ.category != Category::Projectile {
        return;
    }
    if !matches!(occ.encoding, Encoding::TensComposite | Encoding::ProjectileComposite) {
        return;
    }
    let Some(raw) = script.slot(&occ.value) else {
        return;
    };
    let base = occ.encoding.base(raw);
    if base <= 0 {
        return;
    }
    if raw.rem_euclid(base) == 0 {
        occ.category = Category::ProjectileNoChange;
    }
}

/// Collect every variable reference in the script
pub fn collect_occurrences(script: &Script) -> Vec<Occurrence> {
    let mut result = Vec::new();
    for (seq_idx, seq) in script.sequences().iter().enumerate() {
        for (frame_idx, frame) in seq.frames.iter().enumerate() {
            for (if_idx, cond) in frame.conditions.iter().enumerate() {
                let Some(desc) = lookup(BlockKind::Condition, cond.kind, None) else {
                    continue;
                };
                let slot = SlotRef {
                    sequence: seq_idx,
                    frame: frame_idx,
                    block: BlockKind::Condition,
                    block_index: if_idx,
                    param: desc.value,
                };
                let mut occ = Occurrence::from_descriptor(desc, slot, None);
                apply_category_override(&mut occ, script);
                result.push(occ);
            }

            for (ef_idx, effect) in frame.effects.iter().enumerate() {
                let Some(desc) = lookup(BlockKind::Effect, effect.kind, Some(effect.number)) else {
                    continue;
                };
                let slot = SlotRef {
                    sequence: seq_idx,
                    frame: frame_idx,
                    block: BlockKind::Effect,
                    block_index: ef_idx,
                    param: desc.value,
                };
                let mut occ = Occurrence::from_descriptor(desc, slot, Some(effect.number));
                apply_category_override(&mut occ, script);
                result.push(occ);
            }
        }
    }
    tracing::debug!(count = result.len(), "collected variable occurrences");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptBuilder, cond, effect};

    #[test]
    fn test_table_order_matches_kind_discriminants() {
        for (i, desc) in KIND_TABLE.iter().enumerate() {
            assert_eq!(desc.kind as usize, i, "{:?}", desc.kind);
            assert_eq!(descriptor(desc.kind).kind, desc.kind);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(BlockKind::Condition, 24, None).map(|d| d.kind), Some(OccurrenceKind::IfType24));
        assert_eq!(lookup(BlockKind::Effect, 101, Some(7)).map(|d| d.kind), Some(OccurrenceKind::EfType1));
        assert_eq!(lookup(BlockKind::Effect, 111, Some(0)).map(|d| d.kind), Some(OccurrenceKind::EfType11));
        assert_eq!(
            lookup(BlockKind::Effect, 6, Some(103)).map(|d| d.kind),
            Some(OccurrenceKind::EfType6No103)
        );
        assert!(lookup(BlockKind::Effect, 6, Some(104)).is_none());
        assert!(lookup(BlockKind::Condition, 1, None).is_none());
        assert!(lookup(BlockKind::Effect, 24, None).is_none());
    }

    #[test]
    fn test_unrecognised_blocks_skipped() {
        let script = ScriptBuilder::new()
            .sequence("Empty")
            .frame()
            .condition(cond(99, &[]))
            .effect(effect(6, 104, &[5]))
            .effect(effect(42, 0, &[]))
            .build();
        assert!(collect_occurrences(&script).is_empty());
    }

    #[test]
    fn test_extraction_order_and_slots() {
        let script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .effect(effect(6, 100, &[45]))
            .condition(cond(25, &[3, 12, 5, 2]))
            .condition(cond(2, &[0, 0, 0, 41]))
            .frame()
            .effect(effect(101, 3, &[0, 0, 0, 0, 0, 0, 0, 0, 31]))
            .sequence("B")
            .frame()
            .condition(cond(38, &[7, 0, 0, 20, 1]))
            .build();

        let occs = collect_occurrences(&script);
        let kinds: Vec<_> = occs.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OccurrenceKind::IfType25,
                OccurrenceKind::IfType2,
                OccurrenceKind::EfType6No100,
                OccurrenceKind::EfType1,
                OccurrenceKind::IfType38,
            ]
        );

        let if25 = &occs[0];
        assert_eq!(if25.var_id(&script), 12);
        assert_eq!(if25.category, Category::Extra);
        assert_eq!(script.slot(&if25.compare_value.unwrap()), Some(5));
        assert_eq!(script.slot(&if25.compare_mode.unwrap()), Some(2));
        assert_eq!(if25.jump(&script), Some((3, true)));

        let ef1 = &occs[3];
        assert_eq!((ef1.sequence(), ef1.frame(), ef1.block_index()), (0, 1, 0));
        assert_eq!(ef1.var_id(&script), 3);
        assert_eq!(ef1.remainder(&script), 1);
        assert_eq!(ef1.effect_number, Some(3));

        let if38 = &occs[4];
        assert_eq!(if38.sequence(), 1);
        assert_eq!(if38.var_id(&script), 20);
        assert_eq!(script.slot(&if38.change_value.unwrap()), Some(7));
        assert_eq!(script.slot(&if38.change_mode.unwrap()), Some(1));
        assert!(if38.jump_target.is_none());
    }

    #[test]
    fn test_zero_delta_projectile_retagged() {
        let script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(2, &[0, 0, 0, 40]))
            .condition(cond(2, &[0, 0, 0, 41]))
            .effect(effect(6, 100, &[60100]))
            .effect(effect(6, 101, &[60101]))
            .effect(effect(6, 105, &[0]))
            .build();
        let occs = collect_occurrences(&script);
        let cats: Vec<_> = occs.iter().map(|o| o.category).collect();
        assert_eq!(
            cats,
            vec![
                Category::ProjectileNoChange,
                Category::Projectile,
                Category::ProjectileNoChange,
                Category::Projectile,
                Category::Extra,
            ]
        );
    }

    #[test]
    fn test_global_register_detection() {
        let script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(24, &[0, 60125]))
            .effect(effect(6, 100, &[60125]))
            .effect(effect(6, 100, &[45]))
            .effect(effect(6, 101, &[-150]))
            .build();
        let occs = collect_occurrences(&script);

        assert!(!occs[0].is_global_register_op(&script));

        assert!(occs[1].is_global_register_op(&script));
        assert_eq!(occs[1].var_id(&script), 601);
        assert_eq!(occs[1].remainder(&script), 25);

        assert!(!occs[2].is_global_register_op(&script));
        assert_eq!(occs[2].var_id(&script), 4);
        assert_eq!(occs[2].remainder(&script), 5);

        assert!(occs[3].is_global_register_op(&script));
    }

    #[test]
    fn test_jump_encoding() {
        let mut script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(3, &[10007, 0, 0, 51]))
            .build();
        let occ = collect_occurrences(&script).remove(0);
        assert_eq!(occ.jump(&script), Some((7, false)));

        assert!(occ.set_jump(&mut script, 4, true));
        assert_eq!(occ.jump(&script), Some((4, true)));

        assert!(occ.set_jump(&mut script, -3, false));
        assert_eq!(occ.jump(&script), Some((0, false)));
        assert_eq!(script.slot(&occ.jump_target.unwrap()), Some(10000));
    }

    #[test]
    fn test_node_label() {
        let script = ScriptBuilder::new()
            .sequence("A")
            .frame()
            .condition(cond(31, &[0, 5, 1]))
            .effect(effect(6, 102, &[3]))
            .build();
        let occs = collect_occurrences(&script);
        assert_eq!(occs[0].node_label(), "IF type 31 (Change variable on command) [IF #0]");
        assert_eq!(occs[1].node_label(), "EF type 6 #102 (Increase dash variable) [EF #0, no 102]");
    }
}
