//! Sequence / frame script model
//!
//! The script is the in-memory form produced by the chunked file parser:
//! a list of sequences, each holding frames, each holding condition (IF)
//! and effect (EF) blocks with fixed-width integer parameter arrays.
//!
//! Parameter slots are addressed positionally through [`SlotRef`]. Any
//! mutable access that may change the shape of the collection bumps the
//! script's generation counter so that positional indexes built earlier
//! can be recognised as stale.

use serde::{Deserialize, Serialize};

/// Number of parameters carried by a condition (IF) block
pub const CONDITION_PARAMS: usize = 9;

/// Number of parameters carried by an effect (EF) block
pub const EFFECT_PARAMS: usize = 12;

/// Condition block (IF)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Structural type code
    #[serde(rename = "type")]
    pub kind: i32,
    pub params: [i32; CONDITION_PARAMS],
}

impl Condition {
    pub fn new(kind: i32, params: [i32; CONDITION_PARAMS]) -> Self {
        Self { kind, params }
    }
}

/// Effect block (EF)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Structural type code
    #[serde(rename = "type")]
    pub kind: i32,
    /// Sub-command number (meaningful for type 6)
    pub number: i32,
    pub params: [i32; EFFECT_PARAMS],
}

impl Effect {
    pub fn new(kind: i32, number: i32, params: [i32; EFFECT_PARAMS]) -> Self {
        Self {
            kind,
            number,
            params,
        }
    }
}

/// A single animation frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// A sequence (pattern) of frames
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code_name: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Set by editors after any mutation; never cleared here
    #[serde(skip)]
    pub modified: bool,
}

impl Sequence {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Display label: zero-padded index followed by name, code name, or "(unnamed)"
    pub fn label(&self, index: usize) -> String {
        let display = if !self.name.is_empty() {
            self.name.as_str()
        } else if !self.code_name.is_empty() {
            self.code_name.as_str()
        } else {
            "(unnamed)"
        };
        format!("{:03} {}", index, display)
    }
}

/// Which block list of a frame a slot lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    Condition,
    Effect,
}

/// Positional address of one integer parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub sequence: usize,
    pub frame: usize,
    pub block: BlockKind,
    pub block_index: usize,
    pub param: usize,
}

impl SlotRef {
    /// Same block, different parameter
    pub fn with_param(self, param: usize) -> Self {
        Self { param, ..self }
    }
}

/// Whole script: the owning collection of sequences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    sequences: Vec<Sequence>,
    #[serde(skip)]
    generation: u64,
}

impl Script {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self {
            sequences,
            generation: 0,
        }
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Mutable access to the sequence list.
    ///
    /// Treated as a structural mutation: the generation counter is bumped and
    /// any occurrence index built before this call must be rebuilt.
    pub fn sequences_mut(&mut self) -> &mut Vec<Sequence> {
        self.generation += 1;
        &mut self.sequences
    }

    pub fn push_sequence(&mut self, sequence: Sequence) -> usize {
        self.generation += 1;
        self.sequences.push(sequence);
        self.sequences.len() - 1
    }

    pub fn sequence(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Structural generation; changes whenever the shape may have changed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pattern label for a sequence index, or the bare index when out of range
    pub fn decorated_name(&self, index: usize) -> String {
        match self.sequences.get(index) {
            Some(seq) => seq.label(index),
            None => index.to_string(),
        }
    }

    /// Read one parameter slot
    pub fn slot(&self, slot: &SlotRef) -> Option<i32> {
        let frame = self.sequences.get(slot.sequence)?.frames.get(slot.frame)?;
        match slot.block {
            BlockKind::Condition => frame
                .conditions
                .get(slot.block_index)?
                .params
                .get(slot.param)
                .copied(),
            BlockKind::Effect => frame
                .effects
                .get(slot.block_index)?
                .params
                .get(slot.param)
                .copied(),
        }
    }

    /// Write one parameter slot and flag the owning sequence as modified.
    ///
    /// Returns false (and writes nothing) when the address does not resolve.
    pub fn set_slot(&mut self, slot: &SlotRef, value: i32) -> bool {
        let Some(seq) = self.sequences.get_mut(slot.sequence) else {
            return false;
        };
        let Some(frame) = seq.frames.get_mut(slot.frame) else {
            return false;
        };
        let target = match slot.block {
            BlockKind::Condition => frame
                .conditions
                .get_mut(slot.block_index)
                .and_then(|c| c.params.get_mut(slot.param)),
            BlockKind::Effect => frame
                .effects
                .get_mut(slot.block_index)
                .and_then(|e| e.params.get_mut(slot.param)),
        };
        match target {
            Some(param) => {
                *param = value;
                seq.modified = true;
                true
            }
            None => false,
        }
    }
}
