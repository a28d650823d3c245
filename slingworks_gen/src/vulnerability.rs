// Structural importance of reachable blocks.
//
// For each block a shot can reach directly, simulate knocking it out and
// count the damage: every other block that then loses support (and every
// block that loses support because of those, to a fixed point), every
// decoration and every pig left with nothing under it. Blocks whose score
// meets `score_threshold` are vulnerable; the protection engine tries to
// shield them.
//
// ## Collapse model
//
// Collapse support is judged on points, not spans. A block has three probes
// just below its bottom edge (`probe_drop` down): the left and right edges
// pulled `check_buffer` inward, and the center. A probe is covered when it
// lies below the level ground, or inside a remaining block or a platform /
// hill segment. Edge probes count a supporter's box grown by `error_buffer`
// so that flush edges still register; the center probe uses the exact box.
// A block never counts as its own supporter.
// `VulnerabilityParams::robustness` judges the resulting `Coverage`.
//
// Propagation is Jacobi-style: each sweep finds every remaining block that
// fails against the current remaining set, removes them together, and
// repeats until a sweep removes nothing. The order blocks are visited in
// therefore cannot change the result.
//
// A level may already contain blocks the collapse model considers
// unsupported (synthesis uses a different robustness level). Those are
// removed once in a baseline collapse, and a removal is only charged for
// damage beyond that baseline.
//
// See also: `reachability.rs` for `reachable_blocks()`, `protection.rs`
// which consumes `VulnerabilityReport`, `support.rs` for `Robustness`.
//
// **Critical constraint: determinism.** No randomness is drawn here, and
// every set is a `BTreeSet`, so reports are a pure function of the scene.

use crate::config::ResolvedConfig;
use crate::geometry::Rect;
use crate::reachability::reachable_blocks;
use crate::scene::{BlockRef, Scene};
use crate::structure::Block;
use crate::support::Coverage;
use crate::trajectory::ShotFan;
use crate::types::{PIG_SIZE, Point};
use log::debug;
use std::collections::BTreeSet;

/// Damage caused by removing one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemovalScore {
    /// Other blocks that collapse.
    pub collateral: u32,
    /// Decorations left unsupported.
    pub decorations: u32,
    /// Pigs left unsupported.
    pub pigs: u32,
}

impl RemovalScore {
    pub fn total(&self, pig_weight: u32) -> u32 {
        self.collateral + self.decorations + pig_weight * self.pigs
    }
}

/// Result of `analyze()`. `scores[i]` belongs to `reachable[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VulnerabilityReport {
    pub reachable: Vec<BlockRef>,
    pub scores: Vec<RemovalScore>,
    pub vulnerable: Vec<BlockRef>,
}

// ---------------------------------------------------------------------------
// Collapse simulation
// ---------------------------------------------------------------------------

struct Collapse<'a> {
    scene: &'a Scene,
    supports: Vec<Rect>,
    config: &'a ResolvedConfig,
}

impl<'a> Collapse<'a> {
    fn new(config: &'a ResolvedConfig, scene: &'a Scene) -> Self {
        Self {
            scene,
            supports: scene.support_rects().collect(),
            config,
        }
    }

    /// Whether something other than the removed blocks (and `own`, the
    /// block being probed for) occupies `p`.
    fn held(&self, p: Point, grow: f64, gone: &BTreeSet<BlockRef>, own: Option<BlockRef>) -> bool {
        if p.y < self.scene.ground {
            return true;
        }
        self.scene.blocks().any(|(r, b)| {
            Some(r) != own && !gone.contains(&r) && b.rect().expanded(grow).contains(p)
        }) || self.supports.iter().any(|s| s.expanded(grow).contains(p))
    }

    fn stands(&self, at: BlockRef, block: &Block, gone: &BTreeSet<BlockRef>) -> bool {
        let params = &self.config.raw.vulnerability;
        let check = self.config.raw.structure.check_buffer;
        let r = block.rect();
        let y = r.bottom() - params.probe_drop;
        let own = Some(at);
        let coverage = Coverage {
            left: self.held(Point::new(r.left() + check, y), params.error_buffer, gone, own),
            center: self.held(Point::new(block.x, y), 0.0, gone, own),
            right: self.held(Point::new(r.right() - check, y), params.error_buffer, gone, own),
        };
        params.robustness.accepts(coverage)
    }

    /// Whether an object of `height` centered on `p` still rests on
    /// something.
    fn rests(&self, p: Point, height: f64, gone: &BTreeSet<BlockRef>) -> bool {
        let probe = Point::new(p.x, p.y - height / 2.0 - self.config.raw.vulnerability.probe_drop);
        self.held(probe, 0.0, gone, None)
    }

    /// Grow `gone` until every remaining block stands.
    fn settle(&self, mut gone: BTreeSet<BlockRef>) -> BTreeSet<BlockRef> {
        loop {
            let falling: Vec<BlockRef> = self
                .scene
                .blocks()
                .filter(|&(r, b)| !gone.contains(&r) && !self.stands(r, b, &gone))
                .map(|(r, _)| r)
                .collect();
            if falling.is_empty() {
                return gone;
            }
            gone.extend(falling);
        }
    }

    fn score(&self, baseline: &BTreeSet<BlockRef>, removed: BlockRef) -> RemovalScore {
        let mut start = baseline.clone();
        start.insert(removed);
        let gone = self.settle(start);

        let collateral = gone
            .iter()
            .filter(|&&r| r != removed && !baseline.contains(&r))
            .count();
        let newly_loose = |p: Point, h: f64| self.rests(p, h, baseline) && !self.rests(p, h, &gone);
        let decorations = self
            .scene
            .decorations
            .iter()
            .filter(|d| newly_loose(d.position, d.kind.size().height))
            .count();
        let pigs = self
            .scene
            .pigs
            .iter()
            .filter(|&&p| newly_loose(p, PIG_SIZE.height))
            .count();

        RemovalScore {
            collateral: collateral as u32,
            decorations: decorations as u32,
            pigs: pigs as u32,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Blocks that fall on their own, before anything is removed.
pub fn baseline_collapse(config: &ResolvedConfig, scene: &Scene) -> BTreeSet<BlockRef> {
    Collapse::new(config, scene).settle(BTreeSet::new())
}

/// Damage done by removing `block` from `scene`.
pub fn removal_score(config: &ResolvedConfig, scene: &Scene, block: BlockRef) -> RemovalScore {
    let collapse = Collapse::new(config, scene);
    let baseline = collapse.settle(BTreeSet::new());
    collapse.score(&baseline, block)
}

/// Score every reachable block and pick out the vulnerable ones.
pub fn analyze(config: &ResolvedConfig, fan: &ShotFan, scene: &Scene) -> VulnerabilityReport {
    let params = &config.raw.vulnerability;
    let reachable = reachable_blocks(fan, scene);
    let collapse = Collapse::new(config, scene);
    let baseline = collapse.settle(BTreeSet::new());
    if !baseline.is_empty() {
        debug!("{} blocks fall with nothing removed", baseline.len());
    }

    let scores: Vec<RemovalScore> = reachable
        .iter()
        .map(|&r| collapse.score(&baseline, r))
        .collect();
    let vulnerable = reachable
        .iter()
        .zip(&scores)
        .filter(|(_, s)| s.total(params.pig_weight) >= params.score_threshold)
        .map(|(&r, _)| r)
        .collect();

    VulnerabilityReport {
        reachable,
        scores,
        vulnerable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::scene::{Decoration, Platform};
    use crate::structure::{Row, Structure, StructureKind};
    use crate::types::{BlockShape, DecorationKind};

    const GROUND: f64 = -3.5;
    const LEFT_LEG: BlockRef = BlockRef { structure: 0, row: 0, slot: 0 };
    const PLANK: BlockRef = BlockRef { structure: 0, row: 1, slot: 0 };

    fn config_with_threshold(threshold: u32) -> ResolvedConfig {
        let mut raw = GenConfig::default();
        raw.vulnerability.score_threshold = threshold;
        raw.resolve().unwrap()
    }

    fn structure(rows: Vec<Vec<Block>>) -> Structure {
        Structure {
            kind: StructureKind::Ground,
            rows: rows.into_iter().map(Row::new).collect(),
            ground: GROUND,
            center: 0.0,
            budget: None,
        }
    }

    /// Two legs and a plank. Plank top is at GROUND + 1.07.
    fn table() -> Scene {
        let mut scene = Scene::new(GROUND);
        let leg = BlockShape::RectSmallRotated;
        scene.structures.push(structure(vec![
            vec![
                Block::new(leg, -0.7, GROUND + 0.425),
                Block::new(leg, 0.7, GROUND + 0.425),
            ],
            vec![Block::new(BlockShape::RectMedium, 0.0, GROUND + 0.96)],
        ]));
        scene
    }

    fn table_with_pig() -> Scene {
        let mut scene = table();
        scene.pigs.push(Point::new(0.0, GROUND + 1.07 + 0.225));
        scene
    }

    #[test]
    fn removing_top_block_has_no_collateral() {
        let config = ResolvedConfig::standard().unwrap();
        let score = removal_score(&config, &table(), PLANK);
        assert_eq!(score.collateral, 0);
        assert_eq!(score.total(10), 0);
    }

    #[test]
    fn removing_a_leg_drops_the_plank_and_the_pig() {
        let config = ResolvedConfig::standard().unwrap();
        let score = removal_score(&config, &table(), LEFT_LEG);
        assert_eq!(score.collateral, 1);
        assert_eq!(score.pigs, 0);

        let score = removal_score(&config, &table_with_pig(), LEFT_LEG);
        assert_eq!(
            score,
            RemovalScore {
                collateral: 1,
                decorations: 0,
                pigs: 1
            }
        );
        assert_eq!(score.total(10), 11);
    }

    #[test]
    fn shallow_probes_never_find_the_block_itself() {
        // Probes this shallow land inside the plank's own grown box.
        let mut config = ResolvedConfig::standard().unwrap();
        config.raw.vulnerability.probe_drop = 0.005;
        let score = removal_score(&config, &table(), LEFT_LEG);
        assert_eq!(score.collateral, 1);
        assert!(baseline_collapse(&config, &table()).is_empty());
    }

    #[test]
    fn decorations_on_falling_blocks_count() {
        let config = ResolvedConfig::standard().unwrap();
        let mut scene = table();
        scene.decorations.push(Decoration {
            kind: DecorationKind::CircleSmall,
            position: Point::new(0.5, GROUND + 1.07 + 0.225),
        });
        let score = removal_score(&config, &scene, PLANK);
        assert_eq!(score.decorations, 1);
        assert_eq!(score.total(10), 1);
    }

    #[test]
    fn collapse_cascades_through_stacks() {
        let config = ResolvedConfig::standard().unwrap();
        let mut scene = Scene::new(GROUND);
        let cube = BlockShape::SquareSmall;
        scene.structures.push(structure(
            (0..4)
                .map(|i| vec![Block::new(cube, 0.0, GROUND + 0.215 + 0.43 * f64::from(i))])
                .collect(),
        ));
        let bottom = BlockRef { structure: 0, row: 0, slot: 0 };
        assert_eq!(removal_score(&config, &scene, bottom).collateral, 3);
        let second = BlockRef { structure: 0, row: 1, slot: 0 };
        assert_eq!(removal_score(&config, &scene, second).collateral, 2);
    }

    #[test]
    fn platform_holds_blocks_up() {
        let config = ResolvedConfig::standard().unwrap();
        let mut scene = Scene::new(GROUND);
        scene.platforms.push(Platform::new(Point::new(0.0, 0.0), 4));
        let cube = BlockShape::SquareSmall;
        scene.structures.push(Structure {
            kind: StructureKind::Platform(0),
            ground: 0.31,
            ..structure(vec![
                vec![Block::new(cube, 0.0, 0.31 + 0.215)],
                vec![Block::new(cube, 0.0, 0.31 + 0.645)],
            ])
        });
        assert!(baseline_collapse(&config, &scene).is_empty());
        let bottom = BlockRef { structure: 0, row: 0, slot: 0 };
        assert_eq!(removal_score(&config, &scene, bottom).collateral, 1);
    }

    #[test]
    fn already_loose_blocks_are_not_charged() {
        let config = ResolvedConfig::standard().unwrap();
        let mut scene = table();
        // Floating cube, unrelated to the table.
        scene.structures.push(structure(vec![vec![Block::new(
            BlockShape::SquareSmall,
            4.0,
            1.0,
        )]]));
        assert_eq!(
            baseline_collapse(&config, &scene).into_iter().collect::<Vec<_>>(),
            vec![BlockRef { structure: 1, row: 0, slot: 0 }]
        );
        assert_eq!(removal_score(&config, &scene, LEFT_LEG).collateral, 1);
    }

    #[test]
    fn empty_scene_has_nothing_vulnerable() {
        let config = ResolvedConfig::standard().unwrap();
        let fan = ShotFan::new(&config.raw.trajectory);
        let report = analyze(&config, &fan, &Scene::new(GROUND));
        assert_eq!(report, VulnerabilityReport::default());
    }

    #[test]
    fn threshold_selects_vulnerable_blocks() {
        let fan = ShotFan::new(&GenConfig::default().trajectory);
        let scene = table_with_pig();

        // The front leg (11) and the plank (10) are both reachable.
        let report = analyze(&config_with_threshold(11), &fan, &scene);
        assert_eq!(report.reachable, vec![LEFT_LEG, PLANK]);
        assert_eq!(report.scores[0].total(10), 11);
        assert_eq!(report.scores[1].total(10), 10);
        assert_eq!(report.vulnerable, vec![LEFT_LEG]);

        let report = analyze(&config_with_threshold(10), &fan, &scene);
        assert_eq!(report.vulnerable, vec![LEFT_LEG, PLANK]);

        let report = analyze(&ResolvedConfig::standard().unwrap(), &fan, &scene);
        assert!(report.vulnerable.is_empty());
    }
}
