// Protection engine: shield vulnerable blocks.
//
// Runs after decorations are placed. Two best-effort strategies, each
// followed by a fresh vulnerability analysis when it changed the scene:
//
// 1. Adjacent stack. For each vulnerable block of a ground structure,
//    highest first, build a column of freshly drawn shapes on the level
//    ground just left of it (or left of the whole structure with
//    `far_left`), offset by a random buffer. Blocks are stacked until the
//    column's top passes the vulnerable block's top plus `height_bonus`;
//    only then is the column committed as a new `ProtectionStack`
//    structure. A drawn block that would touch a block, a platform or hill
//    segment (grown by the platform distance buffer), a pig or a decoration
//    costs one attempt per entity it hits; a block that would not stand on
//    the one below costs one attempt. `max_stack_attempts` consecutive
//    failed attempts abandon the column.
// 2. Row extension. For each block resting on a still-vulnerable block,
//    try copies of the vulnerable block's shape at the same height under
//    that block's center, its inset edges and its quarter points. A copy
//    is kept when (shrunk by `overlap_shrink`) it touches nothing, the
//    scene-wide support predicate holds it up, and its structure stays
//    within budget. Kept copies join the vulnerable block's row.
//
// Whatever is still vulnerable afterwards is returned as residual; the
// material pass may harden it.
//
// See also: `vulnerability.rs` for the analysis, `scene.rs` for the
// collision and support predicates, `materials.rs` for hardening.
//
// **Critical constraint: determinism.** Randomness is drawn only while
// building stacks: one buffer draw per attempted column, then one shape
// draw per attempt. Vulnerable blocks are visited in a fixed order (y
// descending, then scene order).

use crate::config::ResolvedConfig;
use crate::geometry::round_to;
use crate::prng::RandomSource;
use crate::scene::{BlockRef, Clearance, Scene};
use crate::structure::{Block, Row, Structure, StructureKind};
use crate::support::supports;
use crate::trajectory::ShotFan;
use crate::vulnerability::analyze;
use log::debug;

/// What `protect()` did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtectionReport {
    /// Stacks committed as new structures.
    pub stacks: usize,
    /// Blocks added to existing rows.
    pub extensions: usize,
    /// Blocks still vulnerable at the end.
    pub residual: Vec<BlockRef>,
}

fn clearance(config: &ResolvedConfig) -> Clearance {
    Clearance {
        inclusive: true,
        platforms: Some(config.raw.platform.distance_buffer),
        pigs: true,
        decorations: true,
        tnt: false,
    }
}

// ---------------------------------------------------------------------------
// Adjacent stacks
// ---------------------------------------------------------------------------

fn build_stack(
    config: &ResolvedConfig,
    scene: &Scene,
    vul: BlockRef,
    rng: &mut dyn RandomSource,
) -> Option<Structure> {
    let params = &config.raw.protection;
    let structure = &config.raw.structure;
    let target = *scene.block(vul);
    let leftmost = if params.far_left {
        scene.structures[vul.structure]
            .bounds()
            .map_or(target.rect().left(), |b| b.min_x)
    } else {
        target.rect().left()
    };
    let buffer = rng.uniform(params.stack_buffer_min, params.stack_buffer_max);
    let limit = target.top() + params.height_bonus;
    let clearance = clearance(config);

    let mut stack: Vec<Block> = Vec::new();
    let mut x = 0.0;
    let mut attempts = 0;
    while attempts < params.max_stack_attempts {
        let shape = config.blocks.choose(rng);
        let block = match stack.last() {
            None => {
                x = round_to(leftmost - shape.width() / 2.0 - buffer);
                Block::new(shape, x, round_to(scene.ground + shape.height() / 2.0))
            }
            Some(below) => Block::new(shape, x, round_to(below.top() + shape.height() / 2.0)),
        };

        let hits = scene.collisions(&block.rect(), &clearance, None);
        if hits > 0 {
            attempts += hits as u32;
            continue;
        }
        if let Some(below) = stack.last() {
            if !supports(&[below.span()], block.span(), structure.check_buffer, structure.robustness) {
                attempts += 1;
                continue;
            }
        }

        stack.push(block);
        if round_to(block.top()) > round_to(limit) {
            return Some(Structure {
                kind: StructureKind::ProtectionStack,
                rows: stack.into_iter().map(|b| Row::new([b])).collect(),
                ground: scene.ground,
                center: x,
                budget: None,
            });
        }
        attempts = 0;
    }
    debug!(
        "stack beside {vul:?} abandoned at height {} of {limit}",
        stack.last().map_or(scene.ground, Block::top)
    );
    None
}

/// Vulnerable blocks, highest first.
fn by_height(scene: &Scene, vulnerable: &[BlockRef]) -> Vec<BlockRef> {
    let mut order = vulnerable.to_vec();
    order.sort_by(|&a, &b| scene.block(b).y.total_cmp(&scene.block(a).y));
    order
}

fn add_stacks(
    config: &ResolvedConfig,
    scene: &mut Scene,
    vulnerable: &[BlockRef],
    rng: &mut dyn RandomSource,
) -> usize {
    let mut built = 0;
    for vul in by_height(scene, vulnerable) {
        if scene.structures[vul.structure].kind != StructureKind::Ground {
            continue;
        }
        if let Some(stack) = build_stack(config, scene, vul, rng) {
            scene.structures.push(stack);
            built += 1;
        }
    }
    built
}

// ---------------------------------------------------------------------------
// Row extension
// ---------------------------------------------------------------------------

/// Try one copy of `target`'s shape at `x`. Returns whether it was kept.
fn try_extend(config: &ResolvedConfig, scene: &mut Scene, target: BlockRef, x: f64) -> bool {
    let params = &config.raw.protection;
    let structure = &config.raw.structure;
    let original = *scene.block(target);
    let candidate = Block::new(original.shape, round_to(x), original.y);

    let probe = candidate.rect().shrunk(params.overlap_shrink);
    if scene.collides(&probe, &clearance(config), None) {
        return false;
    }
    if !scene.is_supported(&candidate, structure.robustness, structure.check_buffer, params.push_down) {
        return false;
    }
    let mut trial = scene.structures[target.structure].clone();
    trial.rows[target.row].insert(candidate);
    if !trial.within_budget() {
        return false;
    }
    scene.structures[target.structure] = trial;
    true
}

/// Where `original` sits in its row now that blocks may have been inserted.
fn relocate(scene: &Scene, at: BlockRef, original: &Block) -> Option<BlockRef> {
    scene.structures[at.structure].rows[at.row]
        .blocks
        .iter()
        .position(|b| b == original)
        .map(|slot| BlockRef { slot, ..at })
}

fn extend_rows(config: &ResolvedConfig, scene: &mut Scene, vulnerable: &[BlockRef]) -> usize {
    let check = config.raw.structure.check_buffer;
    let targets: Vec<(BlockRef, Block)> = vulnerable.iter().map(|&r| (r, *scene.block(r))).collect();
    let mut added = 0;
    for (at, original) in targets {
        let Some(mut target) = relocate(scene, at, &original) else {
            continue;
        };
        let rect = original.rect();
        let above: Vec<Block> = scene
            .blocks_above(&rect)
            .into_iter()
            .map(|r| *scene.block(r))
            .collect();
        for top in above {
            let r = top.rect();
            let w = top.shape.width();
            for x in [top.x, r.left() + check, r.right() - check, top.x - w / 4.0, top.x + w / 4.0] {
                if try_extend(config, scene, target, x) {
                    added += 1;
                    match relocate(scene, target, &original) {
                        Some(moved) => target = moved,
                        None => break,
                    }
                }
            }
        }
    }
    added
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Shield vulnerable blocks in place.
pub fn protect(
    config: &ResolvedConfig,
    fan: &ShotFan,
    scene: &mut Scene,
    rng: &mut dyn RandomSource,
) -> ProtectionReport {
    let params = &config.raw.protection;
    let mut vulnerable = analyze(config, fan, scene).vulnerable;
    let mut report = ProtectionReport::default();

    if params.stack_enabled && !vulnerable.is_empty() {
        report.stacks = add_stacks(config, scene, &vulnerable, rng);
        if report.stacks > 0 {
            vulnerable = analyze(config, fan, scene).vulnerable;
        }
    }

    if params.row_extension_enabled && !vulnerable.is_empty() {
        report.extensions = extend_rows(config, scene, &vulnerable);
        if report.extensions > 0 {
            vulnerable = analyze(config, fan, scene).vulnerable;
        }
    }

    debug!(
        "protection: {} stacks, {} row blocks, {} still vulnerable",
        report.stacks,
        report.extensions,
        vulnerable.len()
    );
    report.residual = vulnerable;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::prng::{LevelRng, ScriptedRng};
    use crate::types::{BlockShape, Point};

    const GROUND: f64 = -3.5;
    const LEFT_LEG: BlockRef = BlockRef { structure: 0, row: 0, slot: 0 };

    /// Threshold low enough that the front leg of the table is vulnerable.
    fn config(stacks: bool, rows: bool) -> ResolvedConfig {
        let mut raw = GenConfig::default();
        raw.vulnerability.score_threshold = 11;
        raw.protection.stack_enabled = stacks;
        raw.protection.row_extension_enabled = rows;
        raw.structure.block_probabilities = [("1".to_string(), 1.0)].into_iter().collect();
        raw.resolve().unwrap()
    }

    fn fan() -> ShotFan {
        ShotFan::new(&GenConfig::default().trajectory)
    }

    /// Two legs, a plank, and a pig on the plank.
    fn table_with_pig() -> Scene {
        let mut scene = Scene::new(GROUND);
        let leg = BlockShape::RectSmallRotated;
        scene.structures.push(Structure {
            kind: StructureKind::Ground,
            rows: vec![
                Row::new([
                    Block::new(leg, -0.7, GROUND + 0.425),
                    Block::new(leg, 0.7, GROUND + 0.425),
                ]),
                Row::new([Block::new(BlockShape::RectMedium, 0.0, GROUND + 0.96)]),
            ],
            ground: GROUND,
            center: 0.0,
            budget: None,
        });
        scene.pigs.push(Point::new(0.0, GROUND + 1.07 + 0.225));
        scene
    }

    #[test]
    fn nothing_vulnerable_draws_nothing() {
        let config = ResolvedConfig::standard().unwrap();
        let mut scene = table_with_pig();
        let before = scene.clone();
        let mut rng = ScriptedRng::new(Vec::new());
        let report = protect(&config, &fan(), &mut scene, &mut rng);
        assert_eq!(report, ProtectionReport::default());
        assert_eq!(scene, before);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn stack_rises_past_the_vulnerable_block() {
        let config = config(true, false);
        let mut scene = table_with_pig();
        let mut rng = LevelRng::new(4);
        let report = protect(&config, &fan(), &mut scene, &mut rng);
        assert_eq!(report.stacks, 1);
        assert_eq!(scene.structures.len(), 2);

        let stack = &scene.structures[1];
        assert_eq!(stack.kind, StructureKind::ProtectionStack);
        // Square holes are 0.84 tall; the leg top plus bonus is GROUND + 1.85.
        assert_eq!(stack.block_count(), 3);
        let blocks: Vec<&Block> = stack.blocks().collect();
        assert_eq!(round_to(blocks[0].bottom()), GROUND);
        for b in &blocks {
            assert!(b.rect().right() < -0.81 - 0.1 + 1e-9);
            assert_eq!(b.x, blocks[0].x);
        }
        assert!(blocks[2].top() > GROUND + 1.85);
        assert!(report.residual.iter().all(|&r| r == LEFT_LEG));
    }

    #[test]
    fn stacks_skip_platform_structures() {
        let config = config(true, false);
        let mut scene = table_with_pig();
        scene.structures[0].kind = StructureKind::Platform(0);
        let mut rng = ScriptedRng::new(Vec::new());
        let report = protect(&config, &fan(), &mut scene, &mut rng);
        assert_eq!(report.stacks, 0);
        assert_eq!(report.residual, vec![LEFT_LEG]);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn row_extension_fills_under_the_plank() {
        let config = config(false, true);
        let mut scene = table_with_pig();
        let mut rng = ScriptedRng::new(Vec::new());
        let report = protect(&config, &fan(), &mut scene, &mut rng);

        // Center and both quarter points fit; the inset edges hit the legs.
        assert_eq!(report.extensions, 3);
        let xs: Vec<f64> = scene.structures[0].rows[0].blocks.iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![-0.7, -0.42, 0.0, 0.42, 0.7]);
        assert!(report.residual.is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn row_extension_respects_budget() {
        let config = config(false, true);
        let mut scene = table_with_pig();
        // The table is already taller than this budget allows.
        scene.structures[0].budget = Some(crate::structure::Budget {
            max_width: 1.68,
            max_height: 1.0,
        });
        let report = protect(&config, &fan(), &mut scene, &mut ScriptedRng::new(Vec::new()));
        assert_eq!(report.extensions, 0);
        assert_eq!(scene.structures[0].block_count(), 3);
    }
}
