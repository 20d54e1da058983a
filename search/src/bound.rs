//! Lower-bound values with explicit infinities.
//!
//! `PosInfinity` replaces the "large sentinel" idiom: an infeasible node and
//! the initial upper bound are both `PosInfinity`, and no sum of finite
//! energies can ever be mistaken for either.

/// A lower bound on energy, totally ordered `NegInfinity < Finite(_) < PosInfinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    /// Bound of a node whose evaluation was skipped. Always worth expanding.
    NegInfinity,
    Finite(i64),
    /// No completion of the node is feasible (or nothing has been found yet).
    PosInfinity,
}

impl Bound {
    pub const ZERO: Bound = Bound::Finite(0);

    /// Margin added to the upper bound when a node is dominated, so that a
    /// dominated node never ties with the best known leaf.
    pub const EPSILON: i64 = 1;

    /// `self + delta`, saturating inside `Finite`; infinities absorb.
    #[must_use]
    pub fn offset(self, delta: i64) -> Bound {
        match self {
            Bound::Finite(v) => Bound::Finite(v.saturating_add(delta)),
            other => other,
        }
    }

    /// Sum of two bounds. `PosInfinity` wins over `NegInfinity`: an
    /// infeasible constant keeps a node infeasible whatever else it carries.
    #[must_use]
    pub fn plus(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::PosInfinity, _) | (_, Bound::PosInfinity) => Bound::PosInfinity,
            (Bound::NegInfinity, _) | (_, Bound::NegInfinity) => Bound::NegInfinity,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_add(b)),
        }
    }

    /// The finite value, if any.
    #[must_use]
    pub fn finite(self) -> Option<i64> {
        match self {
            Bound::Finite(v) => Some(v),
            _ => None,
        }
    }

    /// JSON form used by the search trace: integer, `"-inf"` or `"+inf"`.
    #[must_use]
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Bound::NegInfinity => serde_json::json!("-inf"),
            Bound::Finite(v) => serde_json::json!(v),
            Bound::PosInfinity => serde_json::json!("+inf"),
        }
    }
}

impl From<i64> for Bound {
    fn from(v: i64) -> Self {
        Bound::Finite(v)
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::NegInfinity => f.write_str("-inf"),
            Bound::Finite(v) => write!(f, "{v}"),
            Bound::PosInfinity => f.write_str("+inf"),
        }
    }
}
