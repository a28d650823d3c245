// Structure synthesis engine.
//
// A structure is grown top-down and placed bottom-up. Synthesis first lays
// out a peak row (1-5 copies of one drawn shape, symmetric about the
// structure's center), then repeatedly adds a new row *beneath* the current
// bottom row until the structure would exceed its width/height budget or no
// valid row can be found. Only once growth stops are absolute y-coordinates
// assigned, stacking the rows upward from the structure's ground line.
//
// ## Row extension
//
// The current bottom row is partitioned into groupings: for every distinct
// gap between neighbouring blocks, split the row wherever the gap is at
// least that large; the unsplit row is always one more grouping. For each
// grouping, seven placement strategies put copies of a freshly drawn shape
// under each group's center, edges, inner quarter-points, or combinations
// (see `Strategy`). An option (strategy, grouping) is valid when the new
// blocks do not overlap each other and every block of the current bottom
// row is supported by them under the configured `Robustness`. One option
// is drawn uniformly over all valid ones; if there are none, a different
// shape is drawn, up to `max_row_attempts` times.
//
// Rows under construction are `RowPlan`s (one shape plus x-positions) held
// top-first. A row that pushes the structure over budget is discarded by
// truncating the plan list back to the committed length.
//
// After growth, `synthesize()` also enumerates pig candidates: above every
// block (center, and ±1/3 width when the block is at least pig-wide) and
// along the ground strip under the bottom row at `ground_precision` steps.
// Each candidate carries a protection value, min(blocks to the left, to the
// right, above), used by the pig placement scorer.
//
// See also: `support.rs` for the row support predicate, `level.rs` for how
// ground and platform structures are laid out, `protection.rs` which grows
// structures after synthesis.
//
// **Critical constraint: determinism.** Groupings are enumerated in
// ascending gap order and strategies in declaration order, so the flat
// option list (and hence which option a given draw selects) is fixed.

use crate::config::ResolvedConfig;
use crate::geometry::{Bounds, Rect, round_to};
use crate::prng::RandomSource;
use crate::support::{Robustness, Span, supports};
use crate::types::{BlockShape, PIG_SIZE, Point};
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Placed geometry
// ---------------------------------------------------------------------------

/// A block placed in the level. `(x, y)` is the center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub shape: BlockShape,
    pub x: f64,
    pub y: f64,
}

impl Block {
    pub fn new(shape: BlockShape, x: f64, y: f64) -> Self {
        Self { shape, x, y }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.center(), self.shape.size())
    }

    pub fn span(&self) -> Span {
        Span::centered(self.x, self.shape.width())
    }

    pub fn top(&self) -> f64 {
        self.y + self.shape.height() / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y - self.shape.height() / 2.0
    }
}

/// Blocks at one vertical level, sorted by x.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub blocks: SmallVec<[Block; 8]>,
}

impl Row {
    pub fn new(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut row = Self {
            blocks: blocks.into_iter().collect(),
        };
        row.sort();
        row
    }

    /// Insert keeping x order.
    pub fn insert(&mut self, block: Block) {
        let at = self.blocks.partition_point(|b| b.x <= block.x);
        self.blocks.insert(at, block);
    }

    fn sort(&mut self) {
        self.blocks.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
}

/// What a structure stands on and why it exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    /// Synthesized on the level ground (possibly raised by a hill).
    Ground,
    /// Synthesized on floating platform `index`.
    Platform(usize),
    /// A protection stack built beside a vulnerable block.
    ProtectionStack,
}

/// Maximum extent a structure may occupy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub max_width: f64,
    pub max_height: f64,
}

/// An ordered list of rows, bottom row first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub kind: StructureKind,
    pub rows: Vec<Row>,
    /// The line the bottom row rests on.
    pub ground: f64,
    /// Horizontal center the structure was synthesized around.
    pub center: f64,
    pub budget: Option<Budget>,
}

impl Structure {
    /// Every block, bottom row first, each row left to right. Materials and
    /// block references use this order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.rows.iter().flat_map(|r| r.blocks.iter())
    }

    pub fn block_count(&self) -> usize {
        self.rows.iter().map(|r| r.blocks.len()).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let rects: Vec<Rect> = self.blocks().map(Block::rect).collect();
        Bounds::of(&rects)
    }

    pub fn width(&self) -> f64 {
        self.bounds().map_or(0.0, |b| b.width())
    }

    pub fn height(&self) -> f64 {
        self.bounds().map_or(0.0, |b| b.height())
    }

    /// Whether the structure fits its budget (always true without one).
    pub fn within_budget(&self) -> bool {
        self.budget.is_none_or(|b| {
            round_to(self.width()) <= round_to(b.max_width)
                && round_to(self.height()) <= round_to(b.max_height)
        })
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for row in &mut self.rows {
            for block in &mut row.blocks {
                block.x = round_to(block.x + dx);
                block.y = round_to(block.y + dy);
            }
        }
        self.ground = round_to(self.ground + dy);
        self.center = round_to(self.center + dx);
    }
}

/// A position a pig could occupy, with its local shielding score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PigCandidate {
    pub position: Point,
    pub protection: u32,
}

impl PigCandidate {
    pub fn rect(&self) -> Rect {
        Rect::new(self.position, PIG_SIZE)
    }
}

/// Output of one synthesis run.
#[derive(Clone, Debug)]
pub struct Synthesized {
    pub structure: Structure,
    pub pig_candidates: Vec<PigCandidate>,
}

// ---------------------------------------------------------------------------
// Row plans and groupings
// ---------------------------------------------------------------------------

/// A row before y-coordinates are known: one shape, sorted x-positions.
#[derive(Clone, Debug, PartialEq)]
struct RowPlan {
    shape: BlockShape,
    xs: SmallVec<[f64; 8]>,
}

impl RowPlan {
    fn width(&self) -> f64 {
        match (self.xs.first(), self.xs.last()) {
            (Some(first), Some(last)) => round_to(last - first + self.shape.width()),
            _ => 0.0,
        }
    }

    fn spans(&self) -> SmallVec<[Span; 8]> {
        self.xs
            .iter()
            .map(|&x| Span::centered(x, self.shape.width()))
            .collect()
    }
}

/// Partitions of a row into contiguous groups, as index ranges.
type Grouping = SmallVec<[std::ops::Range<usize>; 8]>;

/// Every grouping of `row`: one per distinct neighbour gap (split where the
/// gap is at least that large), ascending, followed by the unsplit row.
fn groupings(row: &RowPlan) -> Vec<Grouping> {
    let gaps: SmallVec<[f64; 8]> = row.xs.windows(2).map(|w| round_to(w[1] - w[0])).collect();
    let mut splits: SmallVec<[f64; 8]> = gaps.clone();
    splits.sort_by(f64::total_cmp);
    splits.dedup();

    let mut out = Vec::with_capacity(splits.len() + 1);
    for &split in &splits {
        let mut grouping = Grouping::new();
        let mut start = 0;
        for (i, &gap) in gaps.iter().enumerate() {
            if gap >= split {
                grouping.push(start..i + 1);
                start = i + 1;
            }
        }
        grouping.push(start..row.xs.len());
        out.push(grouping);
    }
    let mut whole = Grouping::new();
    whole.push(0..row.xs.len());
    out.push(whole);
    out
}

/// Where copies of the new shape go under one group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    Center,
    Edges,
    EdgesAndCenter,
    Inners,
    InnersAndCenter,
    InnersAndEdges,
    All,
}

impl Strategy {
    const ALL: [Strategy; 7] = [
        Strategy::Center,
        Strategy::Edges,
        Strategy::EdgesAndCenter,
        Strategy::Inners,
        Strategy::InnersAndCenter,
        Strategy::InnersAndEdges,
        Strategy::All,
    ];
}

/// Anchor x-positions of one group of the upper row.
struct GroupAnchors {
    center: f64,
    edges: [f64; 2],
    inners: [f64; 2],
}

impl GroupAnchors {
    fn of(xs: &[f64], width: f64, edge_buffer: f64) -> Self {
        let n = xs.len();
        let center = if n % 2 == 1 {
            xs[(n - 1) / 2]
        } else {
            (xs[n / 2] - xs[n / 2 - 1]) / 2.0 + xs[n / 2 - 1]
        };
        let (first, last) = (xs[0], xs[n - 1]);
        Self {
            center,
            edges: [
                first - width / 2.0 + edge_buffer,
                last + width / 2.0 - edge_buffer,
            ],
            inners: [first - width / 4.0, last + width / 4.0],
        }
    }

    fn positions(&self, strategy: Strategy, out: &mut SmallVec<[f64; 8]>) {
        let [e0, e1] = self.edges;
        let [i0, i1] = self.inners;
        let c = self.center;
        match strategy {
            Strategy::Center => out.push(c),
            Strategy::Edges => out.extend([e0, e1]),
            Strategy::EdgesAndCenter => out.extend([e0, c, e1]),
            Strategy::Inners => out.extend([i0, i1]),
            Strategy::InnersAndCenter => out.extend([i0, c, i1]),
            Strategy::InnersAndEdges => out.extend([e0, i0, i1, e1]),
            Strategy::All => out.extend([e0, i0, c, i1, e1]),
        }
    }
}

fn place(
    upper: &RowPlan,
    grouping: &Grouping,
    strategy: Strategy,
    edge_buffer: f64,
) -> SmallVec<[f64; 8]> {
    let mut xs = SmallVec::new();
    for group in grouping {
        GroupAnchors::of(&upper.xs[group.clone()], upper.shape.width(), edge_buffer)
            .positions(strategy, &mut xs);
    }
    xs
}

/// New blocks must not overlap their list neighbours, and must hold up
/// every block of `upper`.
fn row_is_valid(
    upper: &RowPlan,
    shape: BlockShape,
    xs: &[f64],
    check_buffer: f64,
    robustness: Robustness,
) -> bool {
    let half = shape.width() / 2.0;
    if xs
        .windows(2)
        .any(|w| round_to(w[0] + half) > round_to(w[1] - half))
    {
        return false;
    }
    let lower: SmallVec<[Span; 8]> = xs.iter().map(|&x| Span::centered(x, shape.width())).collect();
    upper.spans().iter().all(|&span| supports(&lower, span, check_buffer, robustness))
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Lay out the peak row: 1..=max_peaks copies of one shape, symmetric about
/// `center`, separated by a random extra gap.
fn make_peak(config: &ResolvedConfig, center: f64, rng: &mut dyn RandomSource) -> RowPlan {
    let params = &config.raw.structure;
    let count = rng.randint(1, i64::from(params.max_peaks));
    let shape = config.blocks.choose(rng);
    let w = shape.width();
    let mut xs = SmallVec::new();
    if count == 1 {
        xs.push(center);
    } else {
        let extra = round_to(
            rng.randint(
                i64::from(params.min_peak_split),
                i64::from(params.max_peak_split),
            ) as f64
                / 100.0,
        );
        let offsets: &[(f64, f64)] = match count {
            2 => &[(-0.5, -1.0), (0.5, 1.0)],
            3 => &[(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0)],
            4 => &[(-1.5, -2.0), (-0.5, -1.0), (0.5, 1.0), (1.5, 2.0)],
            _ => &[(-2.0, -2.0), (-1.0, -1.0), (0.0, 0.0), (1.0, 1.0), (2.0, 2.0)],
        };
        for &(widths, gaps) in offsets {
            xs.push(round_to(center + w * widths + extra * gaps));
        }
    }
    RowPlan { shape, xs }
}

/// Draw shapes until one admits a valid row beneath `upper`. `None` once
/// the attempt budget is spent.
fn add_row(
    config: &ResolvedConfig,
    upper: &RowPlan,
    robustness: Robustness,
    rng: &mut dyn RandomSource,
) -> Option<RowPlan> {
    let params = &config.raw.structure;
    let groupings = groupings(upper);
    let mut attempt = 0;
    loop {
        let shape = config.blocks.choose(rng);
        let mut options: Vec<SmallVec<[f64; 8]>> = Vec::new();
        for strategy in Strategy::ALL {
            for grouping in &groupings {
                let xs = place(upper, grouping, strategy, params.edge_buffer);
                if row_is_valid(upper, shape, &xs, params.check_buffer, robustness) {
                    options.push(xs);
                }
            }
        }
        if !options.is_empty() {
            let pick = rng.randint(1, options.len() as i64) as usize - 1;
            let xs = options.swap_remove(pick).into_iter().map(round_to).collect();
            return Some(RowPlan { shape, xs });
        }
        if attempt > params.max_row_attempts {
            debug!("row extension exhausted after {attempt} shape draws");
            return None;
        }
        attempt += 1;
    }
}

/// Convert top-first plans into placed rows, bottom row first, stacked up
/// from `ground`.
fn stack_rows(plans: &[RowPlan], ground: f64) -> Vec<Row> {
    let mut level = ground;
    let mut rows = Vec::with_capacity(plans.len());
    for plan in plans.iter().rev() {
        let h = plan.shape.height();
        let y = round_to(h / 2.0 + level);
        rows.push(Row::new(plan.xs.iter().map(|&x| Block::new(plan.shape, x, y))));
        level += h;
    }
    rows
}

fn measure(plans: &[RowPlan], ground: f64) -> (f64, f64) {
    let rects: Vec<Rect> = stack_rows(plans, ground)
        .iter()
        .flat_map(|r| r.blocks.iter().map(Block::rect))
        .collect();
    Bounds::of(&rects).map_or((0.0, 0.0), |b| (b.width(), b.height()))
}

/// Grow one structure centered on `center`, resting on `ground`, within
/// `budget`.
pub fn synthesize(
    config: &ResolvedConfig,
    kind: StructureKind,
    center: f64,
    ground: f64,
    budget: Budget,
    rng: &mut dyn RandomSource,
) -> Synthesized {
    let params = &config.raw.structure;
    let robustness = params.robustness;

    let mut peak = make_peak(config, center, rng);
    if budget.max_width > 0.0 {
        let mut redraws = 0;
        while peak.width() > budget.max_width && redraws < config.raw.bounds.max_attempts {
            peak = make_peak(config, center, rng);
            redraws += 1;
        }
        if peak.width() > budget.max_width {
            debug!(
                "peak of width {} still exceeds budget {} after {redraws} redraws",
                peak.width(),
                budget.max_width
            );
        }
    }

    let mut width = peak.width();
    let mut height = peak.shape.height() / 2.0;
    let mut plans = vec![peak];

    if budget.max_height > 0.0 || budget.max_width > 0.0 {
        while height < budget.max_height && width < budget.max_width {
            let committed = plans.len();
            let Some(row) = add_row(config, &plans[committed - 1], robustness, rng) else {
                break;
            };
            plans.push(row);
            let (w, h) = measure(&plans, ground);
            if h > budget.max_height || w > budget.max_width {
                debug!("row {committed} exceeds budget ({w} x {h}), rolled back");
                plans.truncate(committed);
                break;
            }
            width = w;
            height = h;
        }
    }

    let structure = Structure {
        kind,
        rows: stack_rows(&plans, ground),
        ground,
        center,
        budget: Some(budget),
    };
    let pig_candidates = pig_candidates(&structure, config.raw.pig.ground_precision);
    Synthesized {
        structure,
        pig_candidates,
    }
}

// ---------------------------------------------------------------------------
// Pig candidates
// ---------------------------------------------------------------------------

fn collides_with_structure(rect: &Rect, structure: &Structure) -> bool {
    structure.blocks().any(|b| rect.overlaps(&b.rect()))
}

/// Positions a pig could rest on: on top of blocks and on the ground
/// strip under the bottom row, minus any that overlap the structure.
fn pig_candidates(structure: &Structure, ground_precision: f64) -> Vec<PigCandidate> {
    let mut points = Vec::new();
    for block in structure.blocks() {
        let y = round_to(block.y + PIG_SIZE.height / 2.0 + block.shape.height() / 2.0);
        points.push(Point::new(round_to(block.x), y));
        if block.shape.width() >= PIG_SIZE.width {
            let third = block.shape.width() / 3.0;
            points.push(Point::new(round_to(block.x + third), y));
            points.push(Point::new(round_to(block.x - third), y));
        }
    }

    if let Some(bottom) = structure.rows.first() {
        if let (Some(first), Some(last)) = (bottom.blocks.first(), bottom.blocks.last()) {
            let y = round_to(structure.ground + PIG_SIZE.height / 2.0);
            let mut x = first.x;
            while x < last.x {
                points.push(Point::new(round_to(x), y));
                x += ground_precision;
            }
        }
    }

    points
        .into_iter()
        .filter(|&p| !collides_with_structure(&Rect::new(p, PIG_SIZE), structure))
        .map(|position| PigCandidate {
            position,
            protection: protection_value(structure, position),
        })
        .collect()
}

/// min(blocks strictly left at pig height, strictly right, directly above).
pub fn protection_value(structure: &Structure, pig: Point) -> u32 {
    let (mut left, mut right, mut above) = (0u32, 0u32, 0u32);
    for block in structure.blocks() {
        let r = block.rect();
        let at_height = r.bottom() < pig.y && r.top() > pig.y;
        if block.x < pig.x && at_height {
            left += 1;
        }
        if block.x > pig.x && at_height {
            right += 1;
        }
        if block.y > pig.y && r.left() < pig.x && r.right() > pig.x {
            above += 1;
        }
    }
    left.min(right).min(above)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::prng::{LevelRng, ScriptedRng};

    fn config_with(shapes: &[(u8, f64)], robustness: Robustness) -> ResolvedConfig {
        let mut config = GenConfig::default();
        config.structure.block_probabilities =
            shapes.iter().map(|&(id, w)| (id.to_string(), w)).collect();
        config.structure.robustness = robustness;
        config.resolve().unwrap()
    }

    fn plan(shape: BlockShape, xs: &[f64]) -> RowPlan {
        RowPlan {
            shape,
            xs: xs.iter().copied().collect(),
        }
    }

    fn budget(w: f64, h: f64) -> Budget {
        Budget {
            max_width: w,
            max_height: h,
        }
    }

    #[test]
    fn single_block_has_one_grouping() {
        let g = groupings(&plan(BlockShape::SquareSmall, &[0.0]));
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].as_slice(), &[0..1]);
    }

    #[test]
    fn groupings_split_at_each_distinct_gap() {
        // Gaps 1.0 and 2.0.
        let g = groupings(&plan(BlockShape::SquareSmall, &[0.0, 1.0, 3.0]));
        assert_eq!(g.len(), 3);
        assert_eq!(g[0].as_slice(), &[0..1, 1..2, 2..3]);
        assert_eq!(g[1].as_slice(), &[0..2, 2..3]);
        assert_eq!(g[2].as_slice(), &[0..3]);
    }

    #[test]
    fn anchors_of_even_and_odd_groups() {
        let odd = GroupAnchors::of(&[0.0, 1.0, 2.0], 0.4, 0.1);
        assert_eq!(odd.center, 1.0);
        assert_eq!(round_to(odd.edges[0]), -0.1);
        assert_eq!(round_to(odd.edges[1]), 2.1);
        assert_eq!(odd.inners, [-0.1, 2.1]);

        let even = GroupAnchors::of(&[0.0, 2.0], 0.4, 0.1);
        assert_eq!(even.center, 1.0);
    }

    #[test]
    fn overlapping_new_blocks_are_invalid() {
        let upper = plan(BlockShape::SquareTiny, &[0.0]);
        assert!(!row_is_valid(
            &upper,
            BlockShape::SquareHole,
            &[0.0, 0.5],
            0.05,
            Robustness::None
        ));
        assert!(row_is_valid(
            &upper,
            BlockShape::SquareHole,
            &[0.0],
            0.05,
            Robustness::EdgesAndCenter
        ));
    }

    #[test]
    fn narrow_center_post_fails_edges_only() {
        let upper = plan(BlockShape::RectBig, &[0.0]);
        assert!(!row_is_valid(
            &upper,
            BlockShape::SquareTiny,
            &[0.0],
            0.05,
            Robustness::EdgesOnly
        ));
        assert!(row_is_valid(
            &upper,
            BlockShape::SquareTiny,
            &[0.0],
            0.05,
            Robustness::CenterOrEdges
        ));
    }

    #[test]
    fn zero_height_budget_yields_single_centered_block() {
        let config = {
            let mut c = GenConfig::default();
            c.structure.block_probabilities = [("5".to_string(), 1.0)].into_iter().collect();
            c.structure.robustness = Robustness::EdgesOnly;
            c.structure.max_peaks = 1;
            c.resolve().unwrap()
        };
        let mut rng = LevelRng::new(3);
        let out = synthesize(
            &config,
            StructureKind::Ground,
            1.25,
            -3.5,
            budget(4.0, 0.0),
            &mut rng,
        );
        assert_eq!(out.structure.rows.len(), 1);
        let blocks: Vec<_> = out.structure.blocks().copied().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].shape.width(), 0.22);
        assert_eq!(blocks[0].x, 1.25);
        assert_eq!(blocks[0].y, round_to(-3.5 + 0.11));
    }

    #[test]
    fn scripted_peak_count_and_split() {
        let config = config_with(&[(4, 1.0)], Robustness::EdgesOnly);
        // randint(1, 5) -> 3, choose -> SquareSmall, randint(10, 50) -> 10.
        let mut rng = ScriptedRng::from_unit_floats(&[0.5, 0.3, 0.0]);
        let peak = make_peak(&config, 0.0, &mut rng);
        assert_eq!(peak.shape, BlockShape::SquareSmall);
        assert_eq!(peak.xs.as_slice(), &[-0.53, 0.0, 0.53]);
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn synthesized_rows_support_the_row_above() {
        let config = config_with(
            &[(1, 1.0), (2, 1.0), (4, 1.0), (8, 1.0), (10, 1.0)],
            Robustness::EdgesOnly,
        );
        for seed in 0..20 {
            let mut rng = LevelRng::new(seed);
            let s = synthesize(
                &config,
                StructureKind::Ground,
                2.0,
                -3.5,
                budget(5.0, 4.0),
                &mut rng,
            )
            .structure;
            for pair in s.rows.windows(2) {
                let lower: Vec<Span> = pair[0].blocks.iter().map(Block::span).collect();
                for upper in &pair[1].blocks {
                    assert!(
                        supports(&lower, upper.span(), 0.05, Robustness::EdgesOnly),
                        "seed {seed}: unsupported block {upper:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn multi_row_structures_respect_budget() {
        let config = ResolvedConfig::standard().unwrap();
        for seed in 0..30 {
            let mut rng = LevelRng::new(seed);
            let s = synthesize(
                &config,
                StructureKind::Ground,
                3.0,
                -3.5,
                budget(4.0, 4.0),
                &mut rng,
            )
            .structure;
            if s.rows.len() > 1 {
                assert!(s.within_budget(), "seed {seed}: {} x {}", s.width(), s.height());
            }
        }
    }

    #[test]
    fn rows_rest_on_each_other() {
        let config = ResolvedConfig::standard().unwrap();
        let mut rng = LevelRng::new(11);
        let s = synthesize(
            &config,
            StructureKind::Ground,
            0.0,
            -3.5,
            budget(5.0, 4.0),
            &mut rng,
        )
        .structure;
        assert_eq!(round_to(s.rows[0].blocks[0].bottom()), -3.5);
        for pair in s.rows.windows(2) {
            assert_eq!(
                round_to(pair[0].blocks[0].top()),
                round_to(pair[1].blocks[0].bottom())
            );
        }
    }

    #[test]
    fn pig_candidates_never_overlap_their_structure() {
        let config = ResolvedConfig::standard().unwrap();
        let mut rng = LevelRng::new(5);
        let out = synthesize(
            &config,
            StructureKind::Ground,
            0.0,
            -3.5,
            budget(5.0, 4.0),
            &mut rng,
        );
        assert!(!out.pig_candidates.is_empty());
        for c in &out.pig_candidates {
            assert!(!collides_with_structure(&c.rect(), &out.structure));
        }
    }

    #[test]
    fn protection_counts_blocks_on_all_sides() {
        let pig_y = 0.0;
        let walls = Row::new([
            Block::new(BlockShape::RectSmallRotated, -1.0, pig_y),
            Block::new(BlockShape::RectSmallRotated, 1.0, pig_y),
        ]);
        let roof = Row::new([Block::new(BlockShape::RectBig, 0.0, 1.0)]);
        let s = Structure {
            kind: StructureKind::Ground,
            rows: vec![walls, roof],
            ground: -0.5,
            center: 0.0,
            budget: None,
        };
        assert_eq!(protection_value(&s, Point::new(0.0, pig_y)), 1);
        assert_eq!(protection_value(&s, Point::new(2.0, pig_y)), 0);
    }

    #[test]
    fn row_insert_keeps_order() {
        let mut row = Row::new([
            Block::new(BlockShape::SquareTiny, 1.0, 0.0),
            Block::new(BlockShape::SquareTiny, -1.0, 0.0),
        ]);
        row.insert(Block::new(BlockShape::SquareTiny, 0.0, 0.0));
        let xs: Vec<f64> = row.blocks.iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![-1.0, 0.0, 1.0]);
    }
}
