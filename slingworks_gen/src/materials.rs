// Material assignment.
//
// Materials are decided per block in three layers, each only filling
// blocks the earlier layers left unset:
//
// 1. Blocks still vulnerable after protection become the most resistant
//    material (when `harden_vulnerable` is on).
// 2. For every pig some shot reaches, the blocks in front of it take one
//    material from the trajectory table, with chance `trajectory_chance`
//    per pig.
// 3. Every structure then picks one strategy:
//    - cluster (chance `cluster_chance`): start at a random block with a
//      drawn material and repeatedly move to the unset block nearest the
//      cluster's seed. Each time the nearest-so-far improves there is a
//      `cluster_swap_prob` chance to redraw the material and reseed the
//      cluster at that block.
//    - random (chance `random_chance`): one draw per block.
//    - uniform, for structures of at most `small_threshold` blocks.
//    - row bands: a new draw whenever the block height changes.
//
// Blocks are addressed in `Structure::blocks()` order: bottom row first,
// left to right.
//
// See also: `reachability.rs` for `blocks_in_way()`, `protection.rs` for
// the residual vulnerable set, `birds.rs` which reads the material mix.
//
// **Critical constraint: determinism.** Draw order: one `chance` per pig
// group (plus a table draw when it fires), then per structure the strategy
// draws followed by that strategy's material draws.

use crate::config::ResolvedConfig;
use crate::prng::RandomSource;
use crate::scene::{BlockRef, Scene};
use crate::structure::Structure;
use crate::table::ProbabilityTable;
use crate::types::{Material, Point};

/// Position of `r` in its structure's `blocks()` order.
fn flat_index(structure: &Structure, r: BlockRef) -> usize {
    structure.rows[..r.row]
        .iter()
        .map(|row| row.blocks.len())
        .sum::<usize>()
        + r.slot
}

fn fill(slot: &mut Option<Material>, m: Material) {
    slot.get_or_insert(m);
}

fn cluster(
    table: &ProbabilityTable<Material>,
    swap_prob: f64,
    centers: &[Point],
    slots: &mut [Option<Material>],
    rng: &mut dyn RandomSource,
) {
    let n = centers.len();
    let mut current = rng.randint(0, n as i64 - 1) as usize;
    let mut seed = current;
    let mut material = table.choose(rng);
    loop {
        fill(&mut slots[current], material);
        let mut nearest: Option<f64> = None;
        for i in 0..n {
            if slots[i].is_some() {
                continue;
            }
            let d = centers[i].distance(centers[seed]);
            if nearest.is_none_or(|best| d < best) {
                nearest = Some(d);
                current = i;
                if rng.chance(swap_prob) {
                    material = table.choose(rng);
                    seed = current;
                }
            }
        }
        if nearest.is_none() {
            return;
        }
    }
}

fn structure_pass(
    config: &ResolvedConfig,
    structure: &Structure,
    slots: &mut [Option<Material>],
    rng: &mut dyn RandomSource,
) {
    let params = &config.raw.material;
    let table = &config.materials;
    if slots.is_empty() {
        return;
    }

    if rng.chance(params.cluster_chance) {
        let centers: Vec<Point> = structure.blocks().map(|b| b.center()).collect();
        cluster(table, params.cluster_swap_prob, &centers, slots, rng);
    } else if rng.chance(params.random_chance) {
        for slot in slots.iter_mut() {
            let m = table.choose(rng);
            fill(slot, m);
        }
    } else if slots.len() <= params.small_threshold {
        let m = table.choose(rng);
        slots.iter_mut().for_each(|s| fill(s, m));
    } else {
        let mut band: Option<(f64, Material)> = None;
        for (slot, block) in slots.iter_mut().zip(structure.blocks()) {
            let m = match band {
                Some((y, m)) if y == block.y => m,
                _ => {
                    let m = table.choose(rng);
                    band = Some((block.y, m));
                    m
                }
            };
            fill(slot, m);
        }
    }
}

/// Materials for every block, one list per structure in `blocks()` order.
pub fn assign_materials(
    config: &ResolvedConfig,
    scene: &Scene,
    vulnerable: &[BlockRef],
    in_way: &[(usize, Vec<BlockRef>)],
    rng: &mut dyn RandomSource,
) -> Vec<Vec<Material>> {
    let params = &config.raw.material;
    let mut slots: Vec<Vec<Option<Material>>> = scene
        .structures
        .iter()
        .map(|s| vec![None; s.block_count()])
        .collect();

    if config.raw.protection.harden_vulnerable {
        for &r in vulnerable {
            let i = flat_index(&scene.structures[r.structure], r);
            fill(&mut slots[r.structure][i], Material::most_resistant());
        }
    }

    for (_, blocks) in in_way {
        if rng.chance(params.trajectory_chance) {
            let m = config.trajectory_materials.choose(rng);
            for &r in blocks {
                let i = flat_index(&scene.structures[r.structure], r);
                fill(&mut slots[r.structure][i], m);
            }
        }
    }

    for (structure, slots) in scene.structures.iter().zip(slots.iter_mut()) {
        structure_pass(config, structure, slots, rng);
    }

    slots
        .into_iter()
        .map(|s| s.into_iter().map(|m| m.unwrap_or(Material::Wood)).collect())
        .collect()
}
