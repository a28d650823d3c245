// Block swapping pass.
//
// Runs once pigs are placed. Every block in the level, structure by
// structure and bottom row first, may be replaced by another catalog shape
// of exactly the same height, so rows keep resting on each other while
// their silhouettes vary.
//
// Candidate shapes are those with a non-zero probability in the block
// table. The candidate list is shuffled, then biased toward likely shapes:
// walking the list, each entry is moved to the front with chance
// `p(shape) / sum(p)`. Candidates are tried in the resulting order until
// one is taken. A candidate is valid when, shrunk by `overlap_shrink`, it
// touches no other block, platform or hill segment (grown by the platform
// distance buffer) or pig; when every block above and below the original
// footprint, and the candidate itself, still passes the scene-wide support
// predicate; when every pig still rests on something; and when its
// structure stays within budget. A valid candidate is taken with chance
// `swap.probability`; otherwise the original shape is restored and the
// next candidate is tried.
//
// See also: `scene.rs` for the support predicates, `protection.rs` whose
// row extension uses the same validity rules.
//
// **Critical constraint: determinism.** Per block: a shuffle over the
// candidate list, one bias draw per candidate, and one acceptance draw per
// valid candidate tried.

use crate::config::ResolvedConfig;
use crate::prng::{RandomSource, shuffle};
use crate::scene::{BlockRef, Clearance, Scene};
use crate::structure::Block;
use crate::types::BlockShape;
use log::debug;

/// Whether the scene is still sound around `at` after its block changed.
fn swap_holds(config: &ResolvedConfig, scene: &Scene, at: BlockRef, original: &Block) -> bool {
    let structure = &config.raw.structure;
    let push = config.raw.protection.push_down;
    let stands = |b: &Block| {
        scene.is_supported(b, structure.robustness, structure.check_buffer, push)
    };

    let footprint = original.rect();
    let neighbours = scene
        .blocks_above(&footprint)
        .into_iter()
        .chain(scene.blocks_below(&footprint))
        .chain([at]);
    for r in neighbours {
        if !stands(scene.block(r)) {
            return false;
        }
    }
    scene.pigs.iter().all(|&p| scene.pig_supported(p, push))
        && scene.structures[at.structure].within_budget()
}

/// Candidate replacement shapes for `current`, in trial order.
fn candidates(config: &ResolvedConfig, current: BlockShape, rng: &mut dyn RandomSource) -> Vec<BlockShape> {
    let mut shapes: Vec<BlockShape> = BlockShape::ALL
        .iter()
        .copied()
        .filter(|&s| {
            s != current && s.height() == current.height() && config.blocks.probability(s) > 0.0
        })
        .collect();
    shuffle(rng, &mut shapes);

    let total: f64 = shapes.iter().map(|&s| config.blocks.probability(s)).sum();
    for k in 0..shapes.len() {
        if rng.uniform(0.0, 1.0) < config.blocks.probability(shapes[k]) / total {
            let moved = shapes.remove(k);
            shapes.insert(0, moved);
        }
    }
    shapes
}

fn swap_one(config: &ResolvedConfig, scene: &mut Scene, at: BlockRef, rng: &mut dyn RandomSource) -> bool {
    let original = *scene.block(at);
    let clearance = Clearance {
        inclusive: true,
        platforms: Some(config.raw.platform.distance_buffer),
        pigs: true,
        decorations: false,
        tnt: false,
    };

    for shape in candidates(config, original.shape, rng) {
        let replacement = Block { shape, ..original };
        let probe = replacement.rect().shrunk(config.raw.protection.overlap_shrink);
        if scene.collides(&probe, &clearance, Some(at)) {
            continue;
        }
        *scene.block_mut(at) = replacement;
        if swap_holds(config, scene, at, &original) && rng.chance(config.raw.swap.probability) {
            return true;
        }
        *scene.block_mut(at) = original;
    }
    false
}

/// Try to swap every block in the scene. Returns how many changed shape.
pub fn swap_blocks(config: &ResolvedConfig, scene: &mut Scene, rng: &mut dyn RandomSource) -> usize {
    if !config.raw.swap.enabled {
        return 0;
    }
    let refs: Vec<BlockRef> = scene.blocks().map(|(r, _)| r).collect();
    let swapped = refs
        .into_iter()
        .filter(|&r| swap_one(config, scene, r, rng))
        .count();
    debug!("swapped {swapped} of {} blocks", scene.block_count());
    swapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::prng::{LevelRng, ScriptedRng};
    use crate::structure::{Budget, Row, Structure, StructureKind, synthesize};
    use crate::types::Point;

    const GROUND: f64 = -3.5;

    /// Shapes 0.43 tall only: RectFat, SquareSmall, RectTinyRotated.
    fn config(probability: f64) -> ResolvedConfig {
        let mut raw = GenConfig::default();
        raw.structure.block_probabilities = [("2", 1.0), ("4", 1.0), ("7", 1.0)]
            .into_iter()
            .map(|(id, w)| (id.to_string(), w))
            .collect();
        raw.swap.probability = probability;
        raw.resolve().unwrap()
    }

    fn lone(shape: BlockShape) -> Scene {
        let mut scene = Scene::new(GROUND);
        scene.structures.push(Structure {
            kind: StructureKind::Ground,
            rows: vec![Row::new([Block::new(shape, 0.0, GROUND + 0.215)])],
            ground: GROUND,
            center: 0.0,
            budget: None,
        });
        scene
    }

    #[test]
    fn disabled_pass_draws_nothing() {
        let mut raw = GenConfig::default();
        raw.swap.enabled = false;
        let config = raw.resolve().unwrap();
        let mut scene = lone(BlockShape::SquareSmall);
        let mut rng = ScriptedRng::new(Vec::new());
        assert_eq!(swap_blocks(&config, &mut scene, &mut rng), 0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn candidates_share_height_and_exclude_current() {
        let config = config(1.0);
        let mut rng = LevelRng::new(2);
        let mut shapes = candidates(&config, BlockShape::SquareSmall, &mut rng);
        shapes.sort_by_key(|s| s.id());
        assert_eq!(shapes, vec![BlockShape::RectFat, BlockShape::RectTinyRotated]);
    }

    #[test]
    fn certain_swap_changes_shape_in_place() {
        let config = config(1.0);
        let mut scene = lone(BlockShape::SquareSmall);
        let mut rng = LevelRng::new(8);
        assert_eq!(swap_blocks(&config, &mut scene, &mut rng), 1);
        let b = scene.structures[0].rows[0].blocks[0];
        assert_ne!(b.shape, BlockShape::SquareSmall);
        assert_eq!(b.shape.height(), 0.43);
        assert_eq!((b.x, b.y), (0.0, GROUND + 0.215));
    }

    #[test]
    fn zero_probability_never_swaps() {
        let config = config(0.0);
        let mut scene = lone(BlockShape::SquareSmall);
        let before = scene.clone();
        let mut rng = LevelRng::new(8);
        assert_eq!(swap_blocks(&config, &mut scene, &mut rng), 0);
        assert_eq!(scene, before);
    }

    #[test]
    fn swap_never_strands_a_pig() {
        let config = config(1.0);
        let mut scene = lone(BlockShape::RectFat);
        // Off-center pig: only a block as wide as RectFat holds it.
        scene.pigs.push(Point::new(0.3, GROUND + 0.43 + 0.225));
        let before = scene.clone();
        for seed in 0..10 {
            let mut rng = LevelRng::new(seed);
            assert_eq!(swap_blocks(&config, &mut scene, &mut rng), 0);
            assert_eq!(scene, before);
        }
    }

    #[test]
    fn swapped_structures_stay_sound() {
        let config = {
            let mut raw = GenConfig::default();
            raw.swap.probability = 1.0;
            raw.resolve().unwrap()
        };
        let structure = &config.raw.structure;
        for seed in 0..15 {
            let mut rng = LevelRng::new(seed);
            let mut scene = Scene::new(GROUND);
            let budget = Budget {
                max_width: 5.0,
                max_height: 4.0,
            };
            scene
                .structures
                .push(synthesize(&config, StructureKind::Ground, 0.0, GROUND, budget, &mut rng).structure);
            let heights: Vec<f64> = scene.blocks().map(|(_, b)| b.shape.height()).collect();
            swap_blocks(&config, &mut scene, &mut rng);

            let after: Vec<f64> = scene.blocks().map(|(_, b)| b.shape.height()).collect();
            assert_eq!(heights, after, "seed {seed}");
            let blocks: Vec<Block> = scene.blocks().map(|(_, b)| *b).collect();
            for (i, a) in blocks.iter().enumerate() {
                assert!(
                    scene.is_supported(a, structure.robustness, structure.check_buffer, 0.01),
                    "seed {seed}: {a:?} unsupported"
                );
                for b in &blocks[i + 1..] {
                    assert!(!a.rect().overlaps(&b.rect()), "seed {seed}: {a:?} overlaps {b:?}");
                }
            }
        }
    }
}
