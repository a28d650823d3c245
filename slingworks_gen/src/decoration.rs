// Decorative objects on top of blocks.
//
// Candidates are enumerated per enabled kind (in `DecorationKind::ALL`
// order), then per block in scene order. A decoration rests on the block's
// top, at the block's center and, for triangles on blocks at least as wide
// as the triangle, a third of the block's width to either side. Circles
// only ever sit centered. On a block narrower than itself a triangle keeps
// the centered spot and overhangs both edges.
//
// Candidates overlapping a block or a pig are dropped, as are candidates
// that come within the platform distance buffer below or above a platform
// or hill segment. Then decorations are drawn uniformly from the pool, each
// pick removing every remaining candidate it overlaps, until the pool is
// empty.
//
// See also: `scene.rs` for `Decoration`, `vulnerability.rs` which counts
// decorations a removal would knock down.
//
// **Critical constraint: determinism.** One index draw per placed
// decoration; nothing is drawn when the pass is disabled.

use crate::config::{DecorationParams, ResolvedConfig};
use crate::geometry::{Rect, round_to};
use crate::prng::RandomSource;
use crate::scene::{Decoration, Scene, pig_rect};
use crate::types::{DecorationKind, Point, Size};
use log::debug;

fn enabled(params: &DecorationParams, kind: DecorationKind) -> bool {
    match kind {
        DecorationKind::TriangleHole => params.triangle_hole,
        DecorationKind::Triangle => params.triangle,
        DecorationKind::Circle => params.circle,
        DecorationKind::CircleSmall => params.circle_small,
    }
}

fn is_circle(kind: DecorationKind) -> bool {
    matches!(kind, DecorationKind::Circle | DecorationKind::CircleSmall)
}

/// Every position a decoration could rest on, before filtering.
fn candidates(params: &DecorationParams, scene: &Scene) -> Vec<Decoration> {
    let mut out = Vec::new();
    for kind in DecorationKind::ALL {
        if !enabled(params, kind) {
            continue;
        }
        let ks = kind.size();
        for (_, block) in scene.blocks() {
            let bw = block.shape.width();
            let y = round_to(block.y + ks.height / 2.0 + block.shape.height() / 2.0);
            out.push(Decoration {
                kind,
                position: Point::new(block.x, y),
            });
            if !is_circle(kind) && bw >= ks.width {
                for dx in [bw / 3.0, -bw / 3.0] {
                    out.push(Decoration {
                        kind,
                        position: Point::new(round_to(block.x + dx), y),
                    });
                }
            }
        }
    }
    out
}

/// Whether a candidate keeps clear of everything already placed.
fn clear(scene: &Scene, candidate: &Decoration, buffer: f64) -> bool {
    let r = candidate.rect();
    let reach = Rect::new(
        r.center,
        Size::new(r.size.width, r.size.height + 2.0 * buffer),
    );
    !scene.blocks().any(|(_, b)| r.overlaps(&b.rect()))
        && !scene.pigs.iter().any(|&p| r.overlaps(&pig_rect(p)))
        && !scene.support_rects().any(|s| reach.overlaps(&s))
}

/// Place decorations on top of blocks. Returns how many were placed.
pub fn place_decorations(config: &ResolvedConfig, scene: &mut Scene, rng: &mut dyn RandomSource) -> usize {
    let params = &config.raw.decoration;
    if !params.enabled {
        return 0;
    }
    let buffer = config.raw.platform.distance_buffer;
    let mut pool: Vec<Decoration> = candidates(params, scene)
        .into_iter()
        .filter(|c| clear(scene, c, buffer))
        .collect();

    let mut placed = 0;
    while !pool.is_empty() {
        let chosen = pool.remove(rng.index(pool.len()));
        let r = chosen.rect();
        pool.retain(|c| !c.rect().overlaps(&r));
        scene.decorations.push(chosen);
        placed += 1;
    }
    debug!("placed {placed} decorations");
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::prng::{LevelRng, ScriptedRng};
    use crate::scene::Platform;
    use crate::structure::{Block, Row, Structure, StructureKind};
    use crate::types::BlockShape;

    const GROUND: f64 = -3.5;

    fn on_ground(shape: BlockShape) -> Scene {
        let mut scene = Scene::new(GROUND);
        scene.structures.push(Structure {
            kind: StructureKind::Ground,
            rows: vec![Row::new([Block::new(shape, 0.0, GROUND + shape.height() / 2.0)])],
            ground: GROUND,
            center: 0.0,
            budget: None,
        });
        scene
    }

    fn block_top(scene: &Scene) -> f64 {
        scene.structures[0].rows[0].blocks[0].top()
    }

    #[test]
    fn disabled_pass_places_nothing() {
        let mut raw = GenConfig::default();
        raw.decoration.enabled = false;
        let config = raw.resolve().unwrap();
        let mut scene = on_ground(BlockShape::RectBig);
        let mut rng = ScriptedRng::new(Vec::new());
        assert_eq!(place_decorations(&config, &mut scene, &mut rng), 0);
        assert!(scene.decorations.is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn wide_block_offers_thirds_for_triangles_only() {
        let params = GenConfig::default().decoration;
        let scene = on_ground(BlockShape::RectBig);
        let c = candidates(&params, &scene);
        assert_eq!(c.len(), 8);
        let circles: Vec<&Decoration> = c.iter().filter(|d| is_circle(d.kind)).collect();
        assert_eq!(circles.len(), 2);
        assert!(circles.iter().all(|d| d.position.x == 0.0));
    }

    #[test]
    fn decorations_rest_on_top_without_overlap() {
        let config = ResolvedConfig::standard().unwrap();
        for seed in 0..10 {
            let mut scene = on_ground(BlockShape::RectBig);
            let mut rng = LevelRng::new(seed);
            let n = place_decorations(&config, &mut scene, &mut rng);
            assert!(n >= 1);
            let top = round_to(block_top(&scene));
            for (i, d) in scene.decorations.iter().enumerate() {
                assert_eq!(round_to(d.rect().bottom()), top, "seed {seed}");
                for e in &scene.decorations[i + 1..] {
                    assert!(!d.rect().overlaps(&e.rect()), "seed {seed}");
                }
            }
        }
    }

    #[test]
    fn narrow_block_takes_one_centered_decoration() {
        let config = ResolvedConfig::standard().unwrap();
        let scene = on_ground(BlockShape::SquareTiny);
        let kinds: Vec<DecorationKind> = candidates(&config.raw.decoration, &scene)
            .iter()
            .inspect(|d| assert_eq!(d.position.x, 0.0))
            .map(|d| d.kind)
            .collect();
        assert_eq!(kinds, DecorationKind::ALL.to_vec());

        for seed in 0..10 {
            let mut scene = on_ground(BlockShape::SquareTiny);
            let mut rng = LevelRng::new(seed);
            assert_eq!(place_decorations(&config, &mut scene, &mut rng), 1);
            assert_eq!(scene.decorations[0].position.x, 0.0);
        }
    }

    #[test]
    fn pigs_push_decorations_aside() {
        let config = ResolvedConfig::standard().unwrap();
        for seed in 0..10 {
            let mut scene = on_ground(BlockShape::RectBig);
            let pig_y = block_top(&scene) + 0.225;
            scene.pigs.push(Point::new(0.0, pig_y));
            let mut rng = LevelRng::new(seed);
            assert_eq!(place_decorations(&config, &mut scene, &mut rng), 2);
            let mut xs: Vec<f64> = scene.decorations.iter().map(|d| d.position.x).collect();
            xs.sort_by(f64::total_cmp);
            assert_eq!(xs, vec![round_to(-2.06 / 3.0), round_to(2.06 / 3.0)]);
        }
    }

    #[test]
    fn low_platform_leaves_room_for_small_circle_only() {
        let config = ResolvedConfig::standard().unwrap();
        let mut scene = on_ground(BlockShape::RectBig);
        // Platform bottom 1.02 above the block top.
        scene
            .platforms
            .push(Platform::new(Point::new(0.0, GROUND + 0.22 + 1.02 + 0.31), 4));
        let mut rng = LevelRng::new(1);
        assert_eq!(place_decorations(&config, &mut scene, &mut rng), 1);
        assert_eq!(scene.decorations[0].kind, DecorationKind::CircleSmall);
    }
}
