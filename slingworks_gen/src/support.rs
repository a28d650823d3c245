// Discrete support model.
//
// Stability is never simulated. An item counts as supported when enough of
// its horizontal probe points (left edge, center, right edge) are covered by
// something beneath it. `Robustness` says which combination of probes must
// be covered; `Coverage` records which were.
//
// Two probe families use this module:
// - Row support (synthesis, row extension, block swapping): probes are
//   x-coordinates, covered when some lower item's horizontal span contains
//   them. Edge probes sit `check_buffer` inside the item's edges. See
//   `row_coverage()` and `supports()`.
// - Collapse support (vulnerability analysis): probes are points just below
//   the item, covered when they fall inside a supporter's box. That module
//   builds its own `Coverage` and asks the same `Robustness` to judge it.
//
// See also: `structure.rs` (row synthesis), `scene.rs` (the scene-wide
// support predicate), `vulnerability.rs` (collapse propagation).

use crate::geometry::round_to;
use serde::{Deserialize, Serialize};

/// Which probe points of an item must be covered for it to stand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Robustness {
    /// Always supported.
    None,
    /// Center covered, or both edges covered.
    CenterOrEdges,
    /// Both edges covered.
    #[default]
    EdgesOnly,
    /// Center and both edges covered.
    EdgesAndCenter,
}

/// Which probe points of one item are covered from below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    pub left: bool,
    pub center: bool,
    pub right: bool,
}

impl Robustness {
    pub fn accepts(self, c: Coverage) -> bool {
        match self {
            Robustness::None => true,
            Robustness::CenterOrEdges => c.center || (c.left && c.right),
            Robustness::EdgesOnly => c.left && c.right,
            Robustness::EdgesAndCenter => c.left && c.center && c.right,
        }
    }
}

/// A closed horizontal interval `[left, right]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub left: f64,
    pub right: f64,
}

impl Span {
    pub fn centered(x: f64, width: f64) -> Self {
        Self {
            left: x - width / 2.0,
            right: x + width / 2.0,
        }
    }

    pub fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Inclusive, compared after rounding so exact edge touches count.
    pub fn covers(&self, x: f64) -> bool {
        let x = round_to(x);
        round_to(self.left) <= x && x <= round_to(self.right)
    }
}

/// Which of `upper`'s probes the `lower` spans cover. Edge probes are
/// pulled `check_buffer` inward.
pub fn row_coverage(lower: &[Span], upper: Span, check_buffer: f64) -> Coverage {
    let left = upper.left + check_buffer;
    let right = upper.right - check_buffer;
    let center = upper.center();
    Coverage {
        left: lower.iter().any(|s| s.covers(left)),
        center: lower.iter().any(|s| s.covers(center)),
        right: lower.iter().any(|s| s.covers(right)),
    }
}

/// Whether `lower` holds `upper` up under `robustness`.
pub fn supports(lower: &[Span], upper: Span, check_buffer: f64, robustness: Robustness) -> bool {
    robustness.accepts(row_coverage(lower, upper, check_buffer))
}
