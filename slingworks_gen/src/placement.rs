// Greedy placement optimizer for pigs and TNT.
//
// Both placements share one loop (`greedy_select()`): score every remaining
// candidate against the picks so far, take the best, drop every candidate
// whose footprint overlaps the pick, repeat. The loop stops when enough
// picks are made, the pool is empty, or (for scorers with a threshold) the
// best score does not clear it. Only a strictly positive score can beat
// the first candidate, so an all-zero pool takes its first entry.
//
// Scores are sums of three terms:
// - Pigs: `protection * protection_weight`; dispersion, the product of
//   distances to every pig already placed times `dispersion_weight`,
//   divided by the number placed (0 for the first pig); and a flat bonus
//   for sitting below a floating platform within `edge_bonus_distance`
//   outside one of its ends.
// - TNT: the number of vulnerable blocks and pigs within
//   `proximity_distance`; dispersion as for pigs, but `first_dispersion`
//   before any TNT is placed; and the same platform-edge bonus.
//
// When the pig pool runs dry `place_pigs()` falls back to random positions
// on the level ground, rejecting ones that overlap a block, a platform or
// hill segment, or a pig; `max_attempts` rejections end the search.
//
// See also: `structure.rs` for pig candidates and their protection values,
// `level.rs` for where each placement runs in the level pipeline.
//
// **Critical constraint: determinism.** The greedy loop draws nothing; ties
// go to the earliest candidate. Only the ground fallback draws, one x per
// attempt.

use crate::config::{PigParams, ResolvedConfig, TntParams};
use crate::geometry::{Rect, round_to};
use crate::prng::RandomSource;
use crate::scene::{Platform, Scene, pig_rect, tnt_rect};
use crate::structure::PigCandidate;
use crate::types::{PIG_SIZE, Point, TNT_SIZE};
use log::{debug, warn};

// ---------------------------------------------------------------------------
// Greedy loop
// ---------------------------------------------------------------------------

/// How a greedy placement values its candidates.
pub trait PlacementScorer {
    type Candidate: Clone;

    fn position(&self, candidate: &Self::Candidate) -> Point;

    /// Area a pick blocks for later candidates.
    fn footprint(&self, candidate: &Self::Candidate) -> Rect;

    /// Desirability of `candidate` given the positions already chosen.
    fn score(&self, candidate: &Self::Candidate, chosen: &[Point]) -> f64;

    /// Best score must be strictly above this to pick at all.
    fn threshold(&self) -> Option<f64> {
        None
    }
}

/// Pick up to `wanted` candidates from `pool`.
pub fn greedy_select<S: PlacementScorer>(
    scorer: &S,
    mut pool: Vec<S::Candidate>,
    wanted: usize,
) -> Vec<S::Candidate> {
    let mut picks: Vec<S::Candidate> = Vec::new();
    let mut chosen: Vec<Point> = Vec::new();
    while picks.len() < wanted && !pool.is_empty() {
        let mut best = 0;
        let mut best_score = 0.0;
        for (i, c) in pool.iter().enumerate() {
            let s = scorer.score(c, &chosen);
            if s > best_score {
                best = i;
                best_score = s;
            }
        }
        if scorer.threshold().is_some_and(|t| best_score <= t) {
            break;
        }
        let pick = pool.remove(best);
        let footprint = scorer.footprint(&pick);
        pool.retain(|c| !scorer.footprint(c).overlaps(&footprint));
        chosen.push(scorer.position(&pick));
        picks.push(pick);
    }
    picks
}

/// Product of distances to every chosen point, averaged over the count.
fn dispersion(p: Point, chosen: &[Point], weight: f64) -> Option<f64> {
    if chosen.is_empty() {
        return None;
    }
    let product: f64 = chosen.iter().map(|&c| p.distance(c)).product();
    Some(product * weight / chosen.len() as f64)
}

/// Flat bonus for positions under a floating platform's overhang zone.
struct EdgeBonus<'a> {
    platforms: &'a [Platform],
    distance: f64,
    bonus: f64,
}

impl EdgeBonus<'_> {
    fn of(&self, p: Point) -> f64 {
        let near = self.platforms.iter().any(|platform| {
            let Some(first) = platform.segments.first() else {
                return false;
            };
            let left = platform.left_edge();
            let right = platform.right_edge();
            p.y < first.y
                && ((left - self.distance < p.x && p.x < left)
                    || (right < p.x && p.x < right + self.distance))
        });
        if near { self.bonus } else { 0.0 }
    }
}

// ---------------------------------------------------------------------------
// Pigs
// ---------------------------------------------------------------------------

struct PigScorer<'a> {
    params: &'a PigParams,
    edge: EdgeBonus<'a>,
}

impl PlacementScorer for PigScorer<'_> {
    type Candidate = PigCandidate;

    fn position(&self, c: &PigCandidate) -> Point {
        c.position
    }

    fn footprint(&self, c: &PigCandidate) -> Rect {
        c.rect()
    }

    fn score(&self, c: &PigCandidate, chosen: &[Point]) -> f64 {
        f64::from(c.protection) * self.params.protection_weight
            + dispersion(c.position, chosen, self.params.dispersion_weight).unwrap_or(0.0)
            + self.edge.of(c.position)
    }
}

/// Where the pigs went, and whether any had to be dropped on open ground.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PigPlacement {
    pub pigs: Vec<Point>,
    pub on_ground: bool,
}

/// Place up to `wanted` pigs, best candidates first.
pub fn place_pigs(
    config: &ResolvedConfig,
    wanted: usize,
    candidates: Vec<PigCandidate>,
    scene: &Scene,
    rng: &mut dyn RandomSource,
) -> PigPlacement {
    let params = &config.raw.pig;
    let scorer = PigScorer {
        params,
        edge: EdgeBonus {
            platforms: &scene.platforms,
            distance: params.edge_bonus_distance,
            bonus: params.edge_bonus,
        },
    };
    let mut pigs: Vec<Point> = greedy_select(&scorer, candidates, wanted)
        .into_iter()
        .map(|c| c.position)
        .collect();

    let bounds = &config.raw.bounds;
    let on_ground = pigs.len() < wanted;
    let mut attempts = 0;
    while pigs.len() < wanted && attempts < bounds.max_attempts {
        let x = round_to(rng.uniform(bounds.width_min, bounds.width_max));
        let p = Point::new(x, round_to(scene.ground + PIG_SIZE.height / 2.0));
        let r = pig_rect(p);
        let blocked = scene.blocks().any(|(_, b)| r.overlaps(&b.rect()))
            || scene.support_rects().any(|s| r.overlaps(&s))
            || pigs.iter().any(|&q| r.overlaps(&pig_rect(q)));
        if blocked {
            attempts += 1;
        } else {
            pigs.push(p);
        }
    }
    if on_ground {
        debug!("pig candidates ran out, dropped pigs on the ground");
    }
    if pigs.len() < wanted {
        warn!("placed {} of {wanted} requested pigs", pigs.len());
    }
    PigPlacement { pigs, on_ground }
}

// ---------------------------------------------------------------------------
// TNT
// ---------------------------------------------------------------------------

struct TntScorer<'a> {
    params: &'a TntParams,
    edge: EdgeBonus<'a>,
    /// Vulnerable block centers and pigs.
    targets: Vec<Point>,
}

impl PlacementScorer for TntScorer<'_> {
    type Candidate = Point;

    fn position(&self, c: &Point) -> Point {
        *c
    }

    fn footprint(&self, c: &Point) -> Rect {
        tnt_rect(*c)
    }

    fn score(&self, c: &Point, chosen: &[Point]) -> f64 {
        let near = self
            .targets
            .iter()
            .filter(|&&t| t.distance(*c) < self.params.proximity_distance)
            .count();
        near as f64
            + dispersion(*c, chosen, self.params.dispersion_weight)
                .unwrap_or(self.params.first_dispersion)
            + self.edge.of(*c)
    }

    fn threshold(&self) -> Option<f64> {
        Some(self.params.placement_threshold)
    }
}

/// Place up to `wanted` TNT boxes on pig candidate spots that are still
/// free, preferring spots next to vulnerable blocks and pigs.
pub fn place_tnt(
    config: &ResolvedConfig,
    wanted: usize,
    candidates: &[PigCandidate],
    vulnerable: &[Point],
    scene: &Scene,
) -> Vec<Point> {
    let lift = (TNT_SIZE.height - PIG_SIZE.height) / 2.0;
    let push = config.raw.protection.push_down;
    let pool: Vec<Point> = candidates
        .iter()
        .map(|c| Point::new(c.position.x, round_to(c.position.y + lift)))
        .filter(|&p| {
            let r = tnt_rect(p);
            // A swapped block may have left the spot hanging over a gap.
            scene.rests_on_something(p, TNT_SIZE, push)
                && !scene.pigs.iter().any(|&q| r.overlaps(&pig_rect(q)))
                && !scene.decorations.iter().any(|d| r.overlaps(&d.rect()))
                && !scene.blocks().any(|(_, b)| r.overlaps(&b.rect()))
                && !scene.support_rects().any(|s| r.overlaps(&s))
        })
        .collect();

    let pig = &config.raw.pig;
    let scorer = TntScorer {
        params: &config.raw.tnt,
        edge: EdgeBonus {
            platforms: &scene.platforms,
            distance: pig.edge_bonus_distance,
            bonus: pig.edge_bonus,
        },
        targets: vulnerable.iter().chain(&scene.pigs).copied().collect(),
    };
    let placed = greedy_select(&scorer, pool, wanted);
    if placed.len() < wanted {
        debug!("placed {} of {wanted} requested TNT", placed.len());
    }
    placed
}
