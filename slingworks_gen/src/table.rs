// Normalized weighted tables over catalog entries.
//
// `ProbabilityTable<T>` holds `(entry, probability)` pairs in catalog order,
// normalized to sum to 1 when built. Tables are immutable once built;
// removing entries (restricted shapes) produces a new, renormalized table
// rather than mutating a shared one.
//
// `choose` walks the table subtracting probabilities from one uniform draw
// until the draw is spent, so a given draw always lands on the same entry
// for a given table. Zero-probability entries are never returned.
//
// See also: `config.rs` which builds the typed tables from JSON id maps.

use crate::prng::RandomSource;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbabilityTable<T> {
    entries: Vec<(T, f64)>,
}

impl<T: Copy + PartialEq> ProbabilityTable<T> {
    /// Build from raw non-negative weights, normalizing to sum 1. Returns
    /// `None` if no weight is positive.
    pub fn from_weights(weights: impl IntoIterator<Item = (T, f64)>) -> Option<Self> {
        let entries: Vec<(T, f64)> = weights.into_iter().collect();
        let total: f64 = entries.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        Some(Self {
            entries: entries
                .into_iter()
                .map(|(t, w)| (t, w.max(0.0) / total))
                .collect(),
        })
    }

    /// Probability of `entry` (0 if absent).
    pub fn probability(&self, entry: T) -> f64 {
        self.entries
            .iter()
            .find(|(t, _)| *t == entry)
            .map_or(0.0, |(_, p)| *p)
    }

    /// Entries in table order, including zero-probability ones.
    pub fn entries(&self) -> &[(T, f64)] {
        &self.entries
    }

    /// A copy with `removed` zeroed and the rest renormalized, or `None` if
    /// nothing positive would remain.
    pub fn without(&self, removed: impl Fn(T) -> bool) -> Option<Self> {
        Self::from_weights(
            self.entries
                .iter()
                .map(|&(t, p)| (t, if removed(t) { 0.0 } else { p })),
        )
    }

    /// Weighted draw. Consumes exactly one uniform value.
    pub fn choose(&self, rng: &mut dyn RandomSource) -> T {
        let mut remaining = rng.uniform(0.0, 1.0);
        let mut last_positive = None;
        for &(entry, p) in &self.entries {
            if p <= 0.0 {
                continue;
            }
            last_positive = Some(entry);
            remaining -= p;
            if remaining <= 0.0 {
                return entry;
            }
        }
        // Rounding left a sliver of the draw unspent; the last live entry
        // owns it. Construction guarantees at least one positive entry.
        match last_positive {
            Some(entry) => entry,
            None => self.entries[0].0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::{LevelRng, ScriptedRng};

    fn abc() -> ProbabilityTable<char> {
        ProbabilityTable::from_weights([('a', 1.0), ('b', 0.0), ('c', 3.0)]).unwrap()
    }

    #[test]
    fn weights_are_normalized() {
        let t = abc();
        assert_eq!(t.probability('a'), 0.25);
        assert_eq!(t.probability('b'), 0.0);
        assert_eq!(t.probability('c'), 0.75);
        assert_eq!(t.probability('z'), 0.0);
    }

    #[test]
    fn all_zero_weights_rejected() {
        assert!(ProbabilityTable::from_weights([('a', 0.0), ('b', 0.0)]).is_none());
    }

    #[test]
    fn draw_maps_to_cumulative_bucket() {
        let t = abc();
        let mut rng = ScriptedRng::from_unit_floats(&[0.1, 0.3, 0.99]);
        assert_eq!(t.choose(&mut rng), 'a');
        assert_eq!(t.choose(&mut rng), 'c');
        assert_eq!(t.choose(&mut rng), 'c');
    }

    #[test]
    fn zero_draw_lands_on_first_live_entry() {
        let t = ProbabilityTable::from_weights([('a', 0.0), ('b', 1.0)]).unwrap();
        let mut rng = ScriptedRng::from_unit_floats(&[0.0]);
        assert_eq!(t.choose(&mut rng), 'b');
    }

    #[test]
    fn zero_weight_entries_never_drawn() {
        let t = abc();
        let mut rng = LevelRng::new(7);
        for _ in 0..2000 {
            assert_ne!(t.choose(&mut rng), 'b');
        }
    }

    #[test]
    fn without_renormalizes() {
        let t = abc().without(|c| c == 'c').unwrap();
        assert_eq!(t.probability('a'), 1.0);
        assert_eq!(t.probability('c'), 0.0);
        assert!(abc().without(|_| true).is_none());
    }
}
