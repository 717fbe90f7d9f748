//! Composite value codec
//!
//! Script parameters that reference a variable either store the id
//! directly or pack it together with a small remainder as
//! `id * base + remainder`. Four schemes exist:
//!
//! | Encoding | Base | Remainder correction |
//! |---|---|---|
//! | `Direct` | 1 | none (always 0) |
//! | `TensComposite` | 10 | folded into `0..=9` |
//! | `HundredsComposite` | 100 | none, keeps the sign of `raw % 100` |
//! | `ProjectileComposite` | 100 if `|raw| >= 100`, else 10 | folded into `0..base` |
//!
//! When a negative remainder is folded into range the id borrows one unit,
//! so `id * base + remainder == raw` holds for every folded scheme. Folded
//! schemes floor negative ids (`-125` is id `-2` under `ProjectileComposite`,
//! not the truncated `-1`), so matching a negative id in the planner or in
//! scripted scan/replace selects different slots than a truncating reader.

/// Magnitude at which a projectile composite switches to the wide base
pub const PROJECTILE_WIDE_THRESHOLD: u32 = 100;

/// Narrow projectile base (frame-local register)
pub const NARROW_BASE: i32 = 10;

/// Wide projectile base (shared register)
pub const WIDE_BASE: i32 = 100;

/// How a parameter slot packs its variable id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Direct,
    TensComposite,
    HundredsComposite,
    ProjectileComposite,
}

/// Result of decoding one raw parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub id: i32,
    pub remainder: i32,
    pub base: i32,
}

/// Whether a projectile composite raw value uses the wide base
pub fn is_wide_raw(raw: i32) -> bool {
    raw.unsigned_abs() >= PROJECTILE_WIDE_THRESHOLD
}

/// Base selected by the projectile composite scheme for `raw`
pub fn projectile_base(raw: i32) -> i32 {
    if is_wide_raw(raw) { WIDE_BASE } else { NARROW_BASE }
}

/// Pack an id and remainder. The remainder is clamped into `0..base`.
///
/// Returns `None` for a non-positive base.
pub fn recompose(id: i32, remainder: i32, base: i32) -> Option<i32> {
    if base <= 0 {
        return None;
    }
    let remainder = remainder.clamp(0, base - 1);
    Some(id.saturating_mul(base).saturating_add(remainder))
}

impl Encoding {
    /// Base used to split `raw`
    pub fn base(self, raw: i32) -> i32 {
        match self {
            Self::Direct => 1,
            Self::TensComposite => NARROW_BASE,
            Self::HundredsComposite => WIDE_BASE,
            Self::ProjectileComposite => projectile_base(raw),
        }
    }

    /// Split a raw parameter into id and remainder
    pub fn decode(self, raw: i32) -> Decoded {
        let base = self.base(raw);
        match self {
            Self::Direct => Decoded {
                id: raw,
                remainder: 0,
                base,
            },
            Self::HundredsComposite => Decoded {
                id: raw / base,
                remainder: raw % base,
                base,
            },
            Self::TensComposite | Self::ProjectileComposite => Decoded {
                id: raw.div_euclid(base),
                remainder: raw.rem_euclid(base),
                base,
            },
        }
    }

    /// Decoded variable id
    pub fn id(self, raw: i32) -> i32 {
        self.decode(raw).id
    }

    /// Decoded remainder (0 for `Direct`)
    pub fn remainder(self, raw: i32) -> i32 {
        self.decode(raw).remainder
    }

    /// Replace the id while keeping the stored remainder.
    ///
    /// `HundredsComposite` keeps its signed remainder as is; the other
    /// schemes go through [`recompose`].
    pub fn with_id(self, raw: i32, new_id: i32) -> i32 {
        let decoded = self.decode(raw);
        match self {
            Self::HundredsComposite => new_id
                .saturating_mul(decoded.base)
                .saturating_add(decoded.remainder),
            _ => recompose(new_id, decoded.remainder, decoded.base).unwrap_or(raw),
        }
    }

    /// Base that bounds delta edits on a slot of this encoding
    pub fn delta_base(self, raw: i32) -> i32 {
        match self {
            Self::HundredsComposite => WIDE_BASE,
            Self::ProjectileComposite => projectile_base(raw),
            Self::Direct | Self::TensComposite => NARROW_BASE,
        }
    }

}

/// Replace the remainder of `raw` split at `base`, keeping its quotient.
///
/// The new remainder is clamped into `0..base`; a non-positive base leaves
/// `raw` untouched.
pub fn with_remainder(raw: i32, remainder: i32, base: i32) -> i32 {
    if base <= 0 {
        return raw;
    }
    recompose(raw.div_euclid(base), remainder, base).unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct() {
        let d = Encoding::Direct.decode(-42);
        assert_eq!(d, Decoded { id: -42, remainder: 0, base: 1 });
        assert_eq!(Encoding::Direct.with_id(-42, 17), 17);
    }

    #[test]
    fn test_tens_id_change_keeps_remainder() {
        let d = Encoding::TensComposite.decode(47);
        assert_eq!((d.id, d.remainder), (4, 7));
        assert_eq!(Encoding::TensComposite.with_id(47, 9), 97);
    }

    #[test]
    fn test_tens_negative_remainder_folded() {
        let d = Encoding::TensComposite.decode(-7);
        assert_eq!(d.remainder, 3);
        assert_eq!(d.id, -1);
        assert_eq!(recompose(d.id, d.remainder, d.base), Some(-7));
    }

    #[test]
    fn test_hundreds_remainder_keeps_sign() {
        let d = Encoding::HundredsComposite.decode(-7);
        assert_eq!((d.id, d.remainder), (0, -7));

        let d = Encoding::HundredsComposite.decode(1234);
        assert_eq!((d.id, d.remainder, d.base), (12, 34, 100));
    }

    #[test]
    fn test_projectile_base_selection() {
        assert_eq!(projectile_base(99), 10);
        assert_eq!(projectile_base(100), 100);
        assert_eq!(projectile_base(-99), 10);
        assert_eq!(projectile_base(-100), 100);
        assert_eq!(projectile_base(i32::MIN), 100);

        let d = Encoding::ProjectileComposite.decode(125);
        assert_eq!(d, Decoded { id: 1, remainder: 25, base: 100 });
        assert_eq!(recompose(1, 25, 100), Some(125));

        let d = Encoding::ProjectileComposite.decode(60125);
        assert_eq!((d.id, d.remainder), (601, 25));

        let d = Encoding::ProjectileComposite.decode(45);
        assert_eq!((d.id, d.remainder, d.base), (4, 5, 10));
    }

    #[test]
    fn test_round_trip_unchanged_id() {
        let cases = [
            (Encoding::Direct, -3),
            (Encoding::Direct, 60000),
            (Encoding::TensComposite, 47),
            (Encoding::TensComposite, -7),
            (Encoding::TensComposite, 0),
            (Encoding::HundredsComposite, 1234),
            (Encoding::HundredsComposite, 99),
            (Encoding::ProjectileComposite, 125),
            (Encoding::ProjectileComposite, 60125),
            (Encoding::ProjectileComposite, -125),
            (Encoding::ProjectileComposite, 9),
        ];
        for (encoding, raw) in cases {
            let d = encoding.decode(raw);
            assert_eq!(
                recompose(d.id, d.remainder, d.base),
                Some(raw),
                "{encoding:?} raw={raw}"
            );
            assert_eq!(encoding.with_id(raw, d.id), raw);
        }
    }

    #[test]
    fn test_hundreds_negative_id_change_keeps_signed_remainder() {
        for raw in [-7, -150, -1234, -99, -100] {
            let id = Encoding::HundredsComposite.id(raw);
            assert_eq!(Encoding::HundredsComposite.with_id(raw, id), raw, "raw={raw}");
        }
        assert_eq!(Encoding::HundredsComposite.with_id(-7, 3), 293);
        assert_eq!(Encoding::HundredsComposite.with_id(-1234, -5), -534);
    }

    #[test]
    fn test_recompose_clamps_and_guards_base() {
        assert_eq!(recompose(3, 12, 10), Some(39));
        assert_eq!(recompose(3, -4, 10), Some(30));
        assert_eq!(recompose(3, 4, 0), None);
        assert_eq!(recompose(3, 4, -10), None);
    }

    #[test]
    fn test_with_remainder() {
        assert_eq!(with_remainder(47, 2, 10), 42);
        assert_eq!(with_remainder(60125, 40, 100), 60140);
        assert_eq!(with_remainder(60125, 400, 100), 60199);
        assert_eq!(with_remainder(47, 2, 0), 47);
    }

    #[test]
    fn test_delta_base() {
        assert_eq!(Encoding::TensComposite.delta_base(60125), 10);
        assert_eq!(Encoding::HundredsComposite.delta_base(5), 100);
        assert_eq!(Encoding::ProjectileComposite.delta_base(45), 10);
        assert_eq!(Encoding::ProjectileComposite.delta_base(-145), 100);
    }
}
