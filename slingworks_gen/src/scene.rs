// The in-memory scene graph every post-synthesis stage works on.
//
// `Scene` owns all placed geometry of one level: structures (and through
// them every block), floating platforms, hill terrain, pigs, TNT and
// decorations. Blocks are addressed by `BlockRef` (structure, row, slot),
// which stays valid as long as no block is inserted before it in its row.
//
// Beyond plain storage the scene answers the geometric questions the later
// stages share:
// - `collisions()` counts entities a candidate rectangle would run into,
//   under a `Clearance` that says which entity kinds count, whether
//   touching counts, and how far platforms are inflated.
// - `support_coverage()` / `is_supported()` is the scene-wide support
//   predicate: a block is held up by blocks directly beneath it in any
//   structure, by a platform or hill segment it rests on (within
//   `push_down`), or by the level ground. Row extension, block swapping and
//   the support invariant checks all use it.
// - `pig_supported()` / `rests_on_something()` ask the same of a pig, TNT
//   box or decoration.
// - `first_block_below()` finds the block an entity sits on, used to group
//   pigs, TNT and decorations under their structures.
//
// See also: `structure.rs` for `Structure`/`Block`, `support.rs` for
// `Robustness` and `Coverage`, `level.rs` which builds the scene stage by
// stage.

use crate::geometry::{Rect, round_to};
use crate::structure::{Block, Structure};
use crate::support::{Coverage, Robustness};
use crate::types::{DecorationKind, PIG_SIZE, PLATFORM_SEGMENT_SIZE, Point, Size, TNT_SIZE};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row of platform segments at one height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub center: Point,
    /// Segment centers, left to right.
    pub segments: Vec<Point>,
}

impl Platform {
    /// `count` segments laid edge to edge, centered on `center`.
    pub fn new(center: Point, count: usize) -> Self {
        let w = PLATFORM_SEGMENT_SIZE.width;
        let first = -(count as f64 - 1.0) / 2.0;
        let segments = (0..count)
            .map(|i| Point::new(center.x + (first + i as f64) * w, center.y))
            .collect();
        Self { center, segments }
    }

    pub fn segment_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.segments
            .iter()
            .map(|&p| Rect::new(p, PLATFORM_SEGMENT_SIZE))
    }

    pub fn width(&self) -> f64 {
        self.segments.len() as f64 * PLATFORM_SEGMENT_SIZE.width
    }

    /// x of the left edge of the leftmost segment.
    pub fn left_edge(&self) -> f64 {
        self.segments
            .first()
            .map_or(self.center.x, |p| p.x - PLATFORM_SEGMENT_SIZE.width / 2.0)
    }

    pub fn right_edge(&self) -> f64 {
        self.segments
            .last()
            .map_or(self.center.x, |p| p.x + PLATFORM_SEGMENT_SIZE.width / 2.0)
    }

    pub fn top(&self) -> f64 {
        self.center.y + PLATFORM_SEGMENT_SIZE.height / 2.0
    }
}

/// Terrain segments raising one ground structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hill {
    /// The raise applied to the structure above.
    pub raise: f64,
    /// Segment centers: the center column first (top to bottom), then
    /// mirrored column pairs outward, ending with the right-edge and
    /// left-edge columns.
    pub segments: Vec<Point>,
}

/// An angled terrain piece between hills. Output only; nothing collides
/// with slopes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slope {
    pub center: Point,
    pub angle_degrees: f64,
    /// Length in platform-segment widths.
    pub width_units: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub position: Point,
}

impl Decoration {
    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.kind.size())
    }
}

pub fn pig_rect(p: Point) -> Rect {
    Rect::new(p, PIG_SIZE)
}

pub fn tnt_rect(p: Point) -> Rect {
    Rect::new(p, TNT_SIZE)
}

/// Address of one block inside a `Scene`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockRef {
    pub structure: usize,
    pub row: usize,
    pub slot: usize,
}

/// Which entities a candidate must stay clear of, and how.
#[derive(Clone, Copy, Debug)]
pub struct Clearance {
    /// Touching counts as a collision.
    pub inclusive: bool,
    /// Platform and hill segments are grown by this much on every side;
    /// `None` ignores them.
    pub platforms: Option<f64>,
    pub pigs: bool,
    pub decorations: bool,
    pub tnt: bool,
}

impl Clearance {
    /// Blocks only, strict.
    pub const BLOCKS: Clearance = Clearance {
        inclusive: false,
        platforms: None,
        pigs: false,
        decorations: false,
        tnt: false,
    };
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// The level's ground line.
    pub ground: f64,
    pub structures: Vec<Structure>,
    pub platforms: Vec<Platform>,
    pub hills: Vec<Hill>,
    pub pigs: Vec<Point>,
    pub tnt: Vec<Point>,
    pub decorations: Vec<Decoration>,
}

impl Scene {
    pub fn new(ground: f64) -> Self {
        Self {
            ground,
            ..Self::default()
        }
    }

    pub fn block(&self, r: BlockRef) -> &Block {
        &self.structures[r.structure].rows[r.row].blocks[r.slot]
    }

    pub fn block_mut(&mut self, r: BlockRef) -> &mut Block {
        &mut self.structures[r.structure].rows[r.row].blocks[r.slot]
    }

    /// Every block with its address, structures in order, each flattened
    /// bottom row first.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockRef, &Block)> + '_ {
        self.structures.iter().enumerate().flat_map(|(s, st)| {
            st.rows.iter().enumerate().flat_map(move |(r, row)| {
                row.blocks.iter().enumerate().map(move |(slot, b)| {
                    (
                        BlockRef {
                            structure: s,
                            row: r,
                            slot,
                        },
                        b,
                    )
                })
            })
        })
    }

    pub fn block_count(&self) -> usize {
        self.structures.iter().map(Structure::block_count).sum()
    }

    /// Floating platform segments followed by hill segments.
    pub fn support_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.platforms
            .iter()
            .flat_map(Platform::segment_rects)
            .chain(
                self.hills
                    .iter()
                    .flat_map(|h| h.segments.iter())
                    .map(|&p| Rect::new(p, PLATFORM_SEGMENT_SIZE)),
            )
    }

    /// How many entities `rect` would collide with under `clearance`,
    /// skipping block `skip`.
    pub fn collisions(&self, rect: &Rect, clearance: &Clearance, skip: Option<BlockRef>) -> usize {
        let hit = |other: &Rect| {
            if clearance.inclusive {
                rect.touches(other)
            } else {
                rect.overlaps(other)
            }
        };
        let mut n = self
            .blocks()
            .filter(|&(r, b)| Some(r) != skip && hit(&b.rect()))
            .count();
        if let Some(grow) = clearance.platforms {
            n += self
                .support_rects()
                .filter(|s| hit(&s.expanded(grow)))
                .count();
        }
        if clearance.pigs {
            n += self.pigs.iter().filter(|&&p| hit(&pig_rect(p))).count();
        }
        if clearance.decorations {
            n += self.decorations.iter().filter(|d| hit(&d.rect())).count();
        }
        if clearance.tnt {
            n += self.tnt.iter().filter(|&&p| hit(&tnt_rect(p))).count();
        }
        n
    }

    pub fn collides(&self, rect: &Rect, clearance: &Clearance, skip: Option<BlockRef>) -> bool {
        self.collisions(rect, clearance, skip) > 0
    }

    /// Blocks lying beneath `rect` and touching it.
    pub fn blocks_below(&self, rect: &Rect) -> Vec<BlockRef> {
        self.blocks()
            .filter(|(_, b)| b.y < rect.bottom() && rect.touches(&b.rect()))
            .map(|(r, _)| r)
            .collect()
    }

    /// Blocks lying above `rect` and touching it.
    pub fn blocks_above(&self, rect: &Rect) -> Vec<BlockRef> {
        self.blocks()
            .filter(|(_, b)| b.y > rect.top() && rect.touches(&b.rect()))
            .map(|(r, _)| r)
            .collect()
    }

    /// The first block (in scene order) an entity of `size` at `p` rests on.
    pub fn first_block_below(&self, p: Point, size: Size) -> Option<BlockRef> {
        self.blocks_below(&Rect::new(p, size)).first().copied()
    }

    /// Which probes of `block` are held up by the scene. `block` itself need
    /// not be part of the scene.
    pub fn support_coverage(&self, block: &Block, check_buffer: f64, push_down: f64) -> Coverage {
        let r = block.rect();
        let (left, center, right) = (r.left() + check_buffer, block.x, r.right() - check_buffer);
        let mut c = Coverage::default();

        for below in self.blocks_below(&r) {
            let span = self.block(below).span();
            c.left |= span.covers(left);
            c.center |= span.covers(center);
            c.right |= span.covers(right);
        }

        let rest = round_to(r.bottom() - push_down);
        for seg in self.support_rects() {
            if block.y > seg.center.y && rest <= round_to(seg.top()) {
                let covers = |x: f64| {
                    let x = round_to(x);
                    round_to(seg.left()) <= x && x <= round_to(seg.right())
                };
                c.center |= covers(block.x);
                c.left |= covers(r.left());
                c.right |= covers(r.right());
            }
        }

        if rest <= round_to(self.ground) {
            c = Coverage {
                left: true,
                center: true,
                right: true,
            };
        }
        c
    }

    pub fn is_supported(
        &self,
        block: &Block,
        robustness: Robustness,
        check_buffer: f64,
        push_down: f64,
    ) -> bool {
        robustness.accepts(self.support_coverage(block, check_buffer, push_down))
    }

    /// Whether something occupies the point just under the pig's center:
    /// a block, a platform or hill segment, or the ground.
    pub fn pig_supported(&self, pig: Point, push_down: f64) -> bool {
        self.rests_on_something(pig, PIG_SIZE, push_down)
    }

    /// `pig_supported()` for any object of `size` centered on `center`.
    pub fn rests_on_something(&self, center: Point, size: Size, push_down: f64) -> bool {
        let probe = Point::new(center.x, center.y - size.height / 2.0 - push_down);
        if round_to(probe.y) <= round_to(self.ground) {
            return true;
        }
        let inside = |r: &Rect| {
            let (x, y) = (round_to(probe.x), round_to(probe.y));
            round_to(r.left()) <= x
                && x <= round_to(r.right())
                && round_to(r.bottom()) <= y
                && y <= round_to(r.top())
        };
        self.blocks().any(|(_, b)| inside(&b.rect())) || self.support_rects().any(|s| inside(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Row, StructureKind};
    use crate::types::BlockShape;

    const CHECK: f64 = 0.05;
    const PUSH: f64 = 0.01;

    fn structure(rows: Vec<Vec<Block>>) -> Structure {
        Structure {
            kind: StructureKind::Ground,
            rows: rows.into_iter().map(Row::new).collect(),
            ground: 0.0,
            center: 0.0,
            budget: None,
        }
    }

    /// Two legs and a plank on ground y = 0.
    fn table_scene() -> Scene {
        let mut scene = Scene::new(0.0);
        let leg = BlockShape::RectSmallRotated; // 0.22 x 0.85
        let plank = BlockShape::RectMedium; // 1.68 x 0.22
        scene.structures.push(structure(vec![
            vec![
                Block::new(leg, -0.7, 0.425),
                Block::new(leg, 0.7, 0.425),
            ],
            vec![Block::new(plank, 0.0, 0.96)],
        ]));
        scene
    }

    #[test]
    fn platform_segments_are_centered() {
        let p = Platform::new(Point::new(1.0, 2.0), 4);
        let xs: Vec<f64> = p.segments.iter().map(|s| round_to(s.x)).collect();
        assert_eq!(xs, vec![0.07, 0.69, 1.31, 1.93]);
        assert_eq!(round_to(p.left_edge()), round_to(1.0 - 1.24));
        assert_eq!(round_to(p.width()), 2.48);
    }

    #[test]
    fn block_refs_follow_scene_order() {
        let scene = table_scene();
        let refs: Vec<BlockRef> = scene.blocks().map(|(r, _)| r).collect();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[2], BlockRef { structure: 0, row: 1, slot: 0 });
        assert_eq!(scene.block(refs[1]).x, 0.7);
    }

    #[test]
    fn plank_on_legs_is_supported_by_edges() {
        let scene = table_scene();
        let plank = *scene.block(BlockRef { structure: 0, row: 1, slot: 0 });
        let c = scene.support_coverage(&plank, CHECK, PUSH);
        assert!(c.left && c.right && !c.center);
        assert!(scene.is_supported(&plank, Robustness::EdgesOnly, CHECK, PUSH));
        assert!(!scene.is_supported(&plank, Robustness::EdgesAndCenter, CHECK, PUSH));
    }

    #[test]
    fn ground_supports_everything_resting_on_it() {
        let scene = Scene::new(0.0);
        let b = Block::new(BlockShape::SquareSmall, 3.0, 0.215);
        assert!(scene.is_supported(&b, Robustness::EdgesAndCenter, CHECK, PUSH));
        let floating = Block::new(BlockShape::SquareSmall, 3.0, 1.0);
        assert!(!scene.is_supported(&floating, Robustness::CenterOrEdges, CHECK, PUSH));
    }

    #[test]
    fn platform_supports_block_resting_on_it() {
        let mut scene = Scene::new(-5.0);
        scene.platforms.push(Platform::new(Point::new(0.0, 0.0), 4));
        let on = Block::new(BlockShape::SquareSmall, 0.0, 0.31 + 0.215);
        assert!(scene.is_supported(&on, Robustness::EdgesAndCenter, CHECK, PUSH));
        let above = Block::new(BlockShape::SquareSmall, 0.0, 1.5);
        assert!(!scene.is_supported(&above, Robustness::CenterOrEdges, CHECK, PUSH));
    }

    #[test]
    fn clearance_controls_what_counts() {
        let mut scene = table_scene();
        scene.pigs.push(Point::new(3.0, 0.225));
        let touching_leg = Rect::new(Point::new(-0.91, 0.425), Size::new(0.2, 0.2));
        assert!(!scene.collides(&touching_leg, &Clearance::BLOCKS, None));
        let inclusive = Clearance {
            inclusive: true,
            ..Clearance::BLOCKS
        };
        assert!(scene.collides(&touching_leg, &inclusive, None));

        let at_pig = pig_rect(Point::new(3.0, 0.225));
        assert!(!scene.collides(&at_pig, &Clearance::BLOCKS, None));
        let with_pigs = Clearance {
            pigs: true,
            ..Clearance::BLOCKS
        };
        assert_eq!(scene.collisions(&at_pig, &with_pigs, None), 1);
    }

    #[test]
    fn skip_ignores_one_block() {
        let scene = table_scene();
        let leg = BlockRef { structure: 0, row: 0, slot: 0 };
        let rect = scene.block(leg).rect();
        assert!(scene.collides(&rect, &Clearance::BLOCKS, None));
        assert!(!scene.collides(&rect, &Clearance::BLOCKS, Some(leg)));
    }

    #[test]
    fn pig_rests_on_plank_and_ground() {
        let scene = table_scene();
        // Plank top is 1.07.
        assert!(scene.pig_supported(Point::new(0.0, 1.07 + 0.225), PUSH));
        assert!(scene.pig_supported(Point::new(5.0, 0.225), PUSH));
        assert!(!scene.pig_supported(Point::new(5.0, 2.0), PUSH));
    }

    #[test]
    fn tnt_over_a_gap_rests_on_nothing() {
        let scene = table_scene();
        let lift = TNT_SIZE.height / 2.0;
        // Over the plank, and past its end above open air.
        assert!(scene.rests_on_something(Point::new(0.5, 1.07 + lift), TNT_SIZE, PUSH));
        assert!(!scene.rests_on_something(Point::new(3.0, 1.07 + lift), TNT_SIZE, PUSH));
    }

    #[test]
    fn pig_groups_under_first_block_below() {
        let scene = table_scene();
        let found = scene.first_block_below(Point::new(0.0, 1.07 + 0.225), PIG_SIZE);
        assert_eq!(found, Some(BlockRef { structure: 0, row: 1, slot: 0 }));
        assert_eq!(scene.first_block_below(Point::new(5.0, 0.225), PIG_SIZE), None);
    }

    #[test]
    fn blocks_above_leg_is_plank() {
        let scene = table_scene();
        let leg = scene.block(BlockRef { structure: 0, row: 0, slot: 1 }).rect();
        assert_eq!(
            scene.blocks_above(&leg),
            vec![BlockRef { structure: 0, row: 1, slot: 0 }]
        );
    }
}
