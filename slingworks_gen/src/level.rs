// Level-wide orchestration.
//
// `generate_level()` runs every stage in dependency order against one
// `Scene`, threading a single random stream through all of them:
//
//  1. counts: ground structures, platforms, pigs, TNT (in that order)
//  2. ground layout: random cut points split the level width into slots
//  3. ground structures, one per slot
//  4. hills under the ground structures
//  5. floating platforms, then a structure on each
//  6. pigs, best pig candidates first
//  7. bird count
//  8. slopes (only when no pig fell back to the ground)
//  9. block swapping
// 10. decorations
// 11. vulnerability analysis and protection
// 12. TNT
// 13. grouping of pigs, TNT and decorations under their structures
// 14. materials
// 15. bird order
//
// Every search in the pipeline is bounded, so generation always terminates
// and degrades (fewer structures, platforms, pigs, TNT) rather than
// failing. The only fallible step is config resolution, which happens
// before this module is reached.
//
// See also: `lib.rs` for the module map, `main.rs` for the `generate`
// binary.
//
// **Critical constraint: determinism.** A `Level` is a pure function of
// `(ResolvedConfig, seed)`. Stages must not be reordered or skipped based on
// anything but config and earlier draws, and nothing here may iterate a
// hashed collection.

use crate::birds::{bird_count, bird_order, bird_targets};
use crate::config::{CountRange, ResolvedConfig};
use crate::decoration::place_decorations;
use crate::materials::assign_materials;
use crate::placement::{place_pigs, place_tnt};
use crate::platform::{place_platforms, platform_budget, structure_intrudes};
use crate::prng::RandomSource;
use crate::protection::protect;
use crate::reachability::{blocks_in_way, hittable_pigs, unprotected_pigs};
use crate::scene::{BlockRef, Scene, Slope, pig_rect};
use crate::structure::{Budget, PigCandidate, StructureKind, synthesize};
use crate::swap::swap_blocks;
use crate::terrain::{bridge_hills, raise_hills};
use crate::trajectory::ShotFan;
use crate::types::{BirdType, Material, PIG_SIZE, Point, TNT_SIZE};
use log::{debug, info};
use serde::Serialize;

/// Indices (into the scene's pig, TNT and decoration lists) of what rests
/// on one structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StructureContents {
    pub pigs: Vec<usize>,
    pub tnt: Vec<usize>,
    pub decorations: Vec<usize>,
}

/// One generated level.
#[derive(Clone, Debug, Serialize)]
pub struct Level {
    pub scene: Scene,
    pub slopes: Vec<Slope>,
    /// Per structure, in `Structure::blocks()` order.
    pub materials: Vec<Vec<Material>>,
    pub birds: Vec<BirdType>,
    /// Blocks protection could not shield.
    pub vulnerable: Vec<BlockRef>,
    /// Per structure, parallel to `scene.structures`.
    pub contents: Vec<StructureContents>,
    /// Whether some pig had to be dropped on open ground.
    pub pigs_on_ground: bool,
}

impl Level {
    pub fn material_of(&self, r: BlockRef) -> Option<Material> {
        let structure = self.scene.structures.get(r.structure)?;
        let before: usize = structure.rows.get(..r.row)?.iter().map(|row| row.blocks.len()).sum();
        self.materials.get(r.structure)?.get(before + r.slot).copied()
    }
}

fn draw_count(range: CountRange, rng: &mut dyn RandomSource) -> usize {
    rng.randint(i64::from(range.min), i64::from(range.max)) as usize
}

/// Split the level width into up to `wanted` slots, each at least
/// `min_ground_width` wide. Drops one slot after every `max_attempts`
/// rejected layouts.
pub fn ground_slots(config: &ResolvedConfig, wanted: usize, rng: &mut dyn RandomSource) -> Vec<(f64, f64)> {
    let bounds = &config.raw.bounds;
    let mut n = wanted;
    let mut attempts = 0;
    while n > 0 {
        let mut cuts: Vec<f64> = (1..n)
            .map(|_| rng.uniform(bounds.width_min, bounds.width_max))
            .collect();
        cuts.sort_by(f64::total_cmp);

        let edges: Vec<f64> = std::iter::once(bounds.width_min)
            .chain(cuts)
            .chain(std::iter::once(bounds.width_max))
            .collect();
        if edges.windows(2).all(|w| w[1] - w[0] >= bounds.min_ground_width) {
            return edges.windows(2).map(|w| (w[0], w[1])).collect();
        }

        attempts += 1;
        if attempts > bounds.max_attempts {
            attempts = 0;
            n -= 1;
            debug!("no layout for {} ground structures, trying {n}", n + 1);
        }
    }
    Vec::new()
}

/// Drop candidates that overlap anything solid outside their own structure.
fn free_candidates(candidates: Vec<PigCandidate>, scene: &Scene) -> Vec<PigCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            let r = c.rect();
            !scene.blocks().any(|(_, b)| r.overlaps(&b.rect()))
                && !scene.support_rects().any(|s| r.overlaps(&s))
        })
        .collect()
}

fn group_contents(scene: &Scene) -> Vec<StructureContents> {
    let mut contents = vec![StructureContents::default(); scene.structures.len()];
    for (i, &p) in scene.pigs.iter().enumerate() {
        if let Some(r) = scene.first_block_below(p, PIG_SIZE) {
            contents[r.structure].pigs.push(i);
        }
    }
    for (i, &t) in scene.tnt.iter().enumerate() {
        if let Some(r) = scene.first_block_below(t, TNT_SIZE) {
            contents[r.structure].tnt.push(i);
        }
    }
    for (i, d) in scene.decorations.iter().enumerate() {
        if let Some(r) = scene.first_block_below(d.position, d.kind.size()) {
            contents[r.structure].decorations.push(i);
        }
    }
    contents
}

/// Generate one level.
pub fn generate_level(config: &ResolvedConfig, rng: &mut dyn RandomSource) -> Level {
    let raw = &config.raw;
    let counts = &raw.counts;
    let ground_count = draw_count(counts.ground_structures, rng);
    let platform_count = draw_count(counts.platforms, rng);
    let pig_count = draw_count(counts.pigs, rng);
    let tnt_count = draw_count(counts.tnt, rng);

    let ground = raw.bounds.absolute_ground;
    let mut scene = Scene::new(ground);

    // Ground structures.
    let slots = ground_slots(config, ground_count, rng);
    let height_limit = raw.ground_structure_height_limit();
    let mut structures = Vec::with_capacity(slots.len());
    let mut candidates = Vec::with_capacity(slots.len());
    for &(lo, hi) in &slots {
        let budget = Budget {
            max_width: hi - lo,
            max_height: height_limit,
        };
        let center = lo + (hi - lo) / 2.0;
        let synth = synthesize(config, StructureKind::Ground, center, ground, budget, rng);
        structures.push(synth.structure);
        candidates.push(synth.pig_candidates);
    }
    scene.hills = raise_hills(config, &slots, &mut structures, &mut candidates, rng);
    scene.structures = structures;
    let mut pig_candidates: Vec<PigCandidate> = candidates.into_iter().flatten().collect();

    // Platforms and their structures.
    scene.platforms = place_platforms(config, platform_count, &scene, &pig_candidates, rng);
    for i in 0..scene.platforms.len() {
        let (top, budget) = platform_budget(config, &scene.platforms, i);
        let center = scene.platforms[i].center.x;
        let mut attempts = 0;
        loop {
            let synth = synthesize(config, StructureKind::Platform(i), center, top, budget, rng);
            if !structure_intrudes(&synth.structure, &scene) {
                scene.structures.push(synth.structure);
                pig_candidates.extend(synth.pig_candidates);
                break;
            }
            attempts += 1;
            if attempts >= raw.platform.structure_attempts {
                debug!("platform {i} left bare after {attempts} intruding structures");
                break;
            }
        }
    }

    // Pigs.
    let pig_candidates = free_candidates(pig_candidates, &scene);
    let placement = place_pigs(config, pig_count, pig_candidates.clone(), &scene, rng);
    scene.pigs = placement.pigs;

    let birds_wanted = bird_count(config, scene.pigs.len(), slots.len(), scene.platforms.len());

    let slopes = if !placement.on_ground && raw.terrain.add_slopes {
        bridge_hills(&scene.hills)
    } else {
        Vec::new()
    };

    swap_blocks(config, &mut scene, rng);
    place_decorations(config, &mut scene, rng);

    let fan = ShotFan::new(&raw.trajectory);
    let vulnerable = if raw.vulnerability.enabled {
        protect(config, &fan, &mut scene, rng).residual
    } else {
        Vec::new()
    };

    // TNT only on pig spots nothing has claimed since.
    let free_spots: Vec<PigCandidate> = pig_candidates
        .into_iter()
        .filter(|c| !scene.pigs.iter().any(|&p| c.rect().overlaps(&pig_rect(p))))
        .collect();
    let targets: Vec<Point> = vulnerable.iter().map(|&r| scene.block(r).center()).collect();
    scene.tnt = place_tnt(config, tnt_count, &free_spots, &targets, &scene);

    let contents = group_contents(&scene);

    let in_way = blocks_in_way(&fan, &scene);
    let materials = assign_materials(config, &scene, &vulnerable, &in_way, rng);

    let hittable = hittable_pigs(&fan, &scene).len();
    let unprotected = unprotected_pigs(&fan, &scene).len();
    let targets = bird_targets(config, &materials, scene.pigs.len(), hittable, unprotected);
    let birds = bird_order(&targets, birds_wanted);

    info!(
        "level: {} structures ({} blocks), {} platforms, {} pigs, {} TNT, {} decorations, {} birds",
        scene.structures.len(),
        scene.block_count(),
        scene.platforms.len(),
        scene.pigs.len(),
        scene.tnt.len(),
        scene.decorations.len(),
        birds.len()
    );

    Level {
        scene,
        slopes,
        materials,
        birds,
        vulnerable,
        contents,
        pigs_on_ground: placement.on_ground,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::prng::LevelRng;

    fn config(edit: impl FnOnce(&mut GenConfig)) -> ResolvedConfig {
        let mut raw = GenConfig::default();
        edit(&mut raw);
        raw.resolve().unwrap()
    }

    #[test]
    fn slots_cover_the_level_width() {
        let config = ResolvedConfig::standard().unwrap();
        let b = &config.raw.bounds;
        for seed in 0..20 {
            let mut rng = LevelRng::new(seed);
            let slots = ground_slots(&config, 3, &mut rng);
            assert!(!slots.is_empty());
            assert_eq!(slots.first().unwrap().0, b.width_min);
            assert_eq!(slots.last().unwrap().1, b.width_max);
            for w in slots.windows(2) {
                assert_eq!(w[0].1, w[1].0);
            }
            assert!(slots.iter().all(|&(lo, hi)| hi - lo >= b.min_ground_width));
        }
    }

    #[test]
    fn impossible_layouts_degrade() {
        let config = config(|raw| {
            raw.bounds.min_ground_width = 100.0;
            raw.bounds.max_attempts = 3;
        });
        let mut rng = LevelRng::new(1);
        assert!(ground_slots(&config, 4, &mut rng).is_empty());
    }

    #[test]
    fn single_slot_spans_everything() {
        let config = ResolvedConfig::standard().unwrap();
        let b = &config.raw.bounds;
        let mut rng = LevelRng::new(5);
        assert_eq!(ground_slots(&config, 1, &mut rng), vec![(b.width_min, b.width_max)]);
    }

    #[test]
    fn same_seed_same_level() {
        let config = ResolvedConfig::standard().unwrap();
        let a = generate_level(&config, &mut LevelRng::new(42));
        let b = generate_level(&config, &mut LevelRng::new(42));
        assert_eq!(a.scene, b.scene);
        assert_eq!(a.materials, b.materials);
        assert_eq!(a.birds, b.birds);
        assert_eq!(a.slopes, b.slopes);
    }

    #[test]
    fn materials_and_contents_line_up_with_structures() {
        let config = ResolvedConfig::standard().unwrap();
        for seed in 0..5 {
            let level = generate_level(&config, &mut LevelRng::new(seed));
            assert_eq!(level.materials.len(), level.scene.structures.len());
            assert_eq!(level.contents.len(), level.scene.structures.len());
            for (m, s) in level.materials.iter().zip(&level.scene.structures) {
                assert_eq!(m.len(), s.block_count());
            }
            let grouped: usize = level.contents.iter().map(|c| c.pigs.len()).sum();
            assert!(grouped <= level.scene.pigs.len());
            assert!(!level.birds.is_empty());
        }
    }

    #[test]
    fn material_of_follows_block_order() {
        let config = ResolvedConfig::standard().unwrap();
        let level = generate_level(&config, &mut LevelRng::new(3));
        for (s, structure) in level.scene.structures.iter().enumerate() {
            let mut flat = 0;
            for (row, r) in structure.rows.iter().enumerate() {
                for slot in 0..r.blocks.len() {
                    let at = BlockRef { structure: s, row, slot };
                    assert_eq!(level.material_of(at), Some(level.materials[s][flat]));
                    flat += 1;
                }
            }
        }
        let missing = BlockRef { structure: 99, row: 0, slot: 0 };
        assert_eq!(level.material_of(missing), None);
    }

    #[test]
    fn ground_pigs_suppress_slopes() {
        let config = config(|raw| {
            raw.counts.pigs.min = 40;
            raw.counts.pigs.max = 40;
        });
        for seed in 0..3 {
            let level = generate_level(&config, &mut LevelRng::new(seed));
            if level.pigs_on_ground {
                assert!(level.slopes.is_empty());
            }
        }
    }
}
