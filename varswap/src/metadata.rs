//! Per-occurrence derived labels and search text
//!
//! Built in full alongside every occurrence scan and read-only until the
//! next rebuild.

use crate::occurrence::Occurrence;
use crate::script::Script;

/// Ids at or above this value address the shared projectile register bank
pub const GLOBAL_REGISTER_THRESHOLD: i32 = 60000;

/// Whether a bare id falls in the well-known global register range
pub fn is_global_register_id(id: i32) -> bool {
    id >= GLOBAL_REGISTER_THRESHOLD
}

/// Human-readable register bank for a projectile id
pub fn describe_projectile_var(id: i32) -> &'static str {
    match id {
        i32::MIN..GLOBAL_REGISTER_THRESHOLD => "Frame-local projectile variable",
        60000..60100 => "Global projectile register bank A",
        60100..60200 => "Global projectile register bank B",
        61440..61600 => "Extended global projectile register",
        _ => "Global projectile register (shared across all projectiles)",
    }
}

/// Cached derived data for one occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceMetadata {
    pub pattern_label: String,
    pub node_label: String,
    /// Lowercase pattern label, node label, id and global descriptor
    pub search_lower: String,
    /// Increase/decrease projectile op on a wide-base (shared) register
    pub is_global: bool,
    pub global_var: i32,
    pub global_delta: i32,
    pub global_decrement: bool,
}

impl OccurrenceMetadata {
    pub fn build(script: &Script, occ: &Occurrence) -> Self {
        let pattern_label = script.decorated_name(occ.sequence());
        let node_label = occ.node_label();
        let var_id = occ.var_id(script);

        let mut meta = Self {
            pattern_label,
            node_label,
            ..Self::default()
        };
        if occ.is_global_register_op(script) {
            meta.is_global = true;
            meta.global_var = var_id;
            meta.global_delta = occ.remainder(script);
            meta.global_decrement = occ.kind.is_decrement();
        }

        let mut blob = format!("{} {} {}", meta.pattern_label, meta.node_label, var_id);
        if let Some(desc) = meta.global_descriptor() {
            blob.push(' ');
            blob.push_str(&desc);
        }
        meta.search_lower = blob.to_lowercase();
        meta
    }

    /// e.g. `global v601 +25`
    pub fn global_descriptor(&self) -> Option<String> {
        self.is_global.then(|| {
            format!(
                "global v{} {}{:02}",
                self.global_var,
                if self.global_decrement { '-' } else { '+' },
                self.global_delta
            )
        })
    }

    /// Case-insensitive substring match; `needle_lower` must already be lowercase
    pub fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty() || self.search_lower.contains(needle_lower)
    }
}

/// Build metadata for every occurrence, index-aligned with `occurrences`
pub fn build_metadata(script: &Script, occurrences: &[Occurrence]) -> Vec<OccurrenceMetadata> {
    let metadata: Vec<_> = occurrences
        .iter()
        .map(|occ| OccurrenceMetadata::build(script, occ))
        .collect();
    tracing::debug!(
        count = metadata.len(),
        globals = metadata.iter().filter(|m| m.is_global).count(),
        "rebuilt occurrence metadata"
    );
    metadata
}
