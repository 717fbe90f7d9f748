//! Script construction helpers for unit tests

use crate::script::{
    CONDITION_PARAMS, Condition, EFFECT_PARAMS, Effect, Frame, Script, Sequence,
};

/// Condition block with leading parameters filled from `params`
pub fn cond(kind: i32, params: &[i32]) -> Condition {
    let mut full = [0; CONDITION_PARAMS];
    full[..params.len()].copy_from_slice(params);
    Condition::new(kind, full)
}

/// Effect block with leading parameters filled from `params`
pub fn effect(kind: i32, number: i32, params: &[i32]) -> Effect {
    let mut full = [0; EFFECT_PARAMS];
    full[..params.len()].copy_from_slice(params);
    Effect::new(kind, number, full)
}

/// Builds scripts top-down: each call appends to the most recent sequence/frame
#[derive(Default)]
pub struct ScriptBuilder {
    sequences: Vec<Sequence>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(mut self, name: &str) -> Self {
        self.sequences.push(Sequence::named(name));
        self
    }

    pub fn frame(mut self) -> Self {
        self.last_sequence().frames.push(Frame::default());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.last_frame().conditions.push(condition);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.last_frame().effects.push(effect);
        self
    }

    pub fn build(self) -> Script {
        Script::new(self.sequences)
    }

    fn last_sequence(&mut self) -> &mut Sequence {
        if self.sequences.is_empty() {
            self.sequences.push(Sequence::default());
        }
        self.sequences.last_mut().expect("sequence exists")
    }

    fn last_frame(&mut self) -> &mut Frame {
        let seq = self.last_sequence();
        if seq.frames.is_empty() {
            seq.frames.push(Frame::default());
        }
        seq.frames.last_mut().expect("frame exists")
    }
}
