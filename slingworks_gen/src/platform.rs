// Floating platforms and the structures built on them.
//
// `place_platforms()` scatters 4-7 segment platforms inside the level box.
// A candidate is rejected if any segment leaves the level's horizontal
// bounds, comes within `distance_buffer` of a block, hill segment, existing
// platform segment or pig candidate, or shares columns with another
// platform closer than `minimum_height_gap` vertically. After
// `max_attempts` rejections in a row the requested count drops by one.
//
// `platform_budget()` sizes the structure a platform can carry: as wide as
// the platform, and tall enough to leave room for a pig and a segment
// below the nearest platform overhead.
//
// See also: `scene.rs` for `Platform`, `structure.rs` for synthesis,
// `level.rs` which places platform structures.
//
// **Critical constraint: determinism.** Each attempt draws exactly three
// values (segment count, x, y) whether or not it is accepted.

use crate::config::ResolvedConfig;
use crate::geometry::Rect;
use crate::prng::RandomSource;
use crate::scene::{Platform, Scene};
use crate::structure::{Budget, PigCandidate, Structure};
use crate::types::{PIG_SIZE, PLATFORM_SEGMENT_SIZE, Point};
use log::{debug, warn};

/// Whether a candidate platform keeps its distance from everything placed.
fn platform_fits(
    config: &ResolvedConfig,
    candidate: &Platform,
    scene: &Scene,
    placed: &[Platform],
    pig_candidates: &[PigCandidate],
) -> bool {
    let bounds = &config.raw.bounds;
    let buffer = config.raw.platform.distance_buffer;
    let gap = config.raw.platform.minimum_height_gap;
    let seg_w = PLATFORM_SEGMENT_SIZE.width;

    for seg in candidate.segment_rects() {
        if seg.left() < bounds.width_min || seg.right() > bounds.width_max {
            return false;
        }
        let grown = seg.expanded(buffer);
        let near = |other: &Rect| grown.touches(other);
        if scene.blocks().any(|(_, b)| near(&b.rect()))
            || scene.support_rects().any(|s| near(&s))
            || placed.iter().flat_map(Platform::segment_rects).any(|s| near(&s))
            || pig_candidates.iter().any(|c| near(&c.rect()))
        {
            return false;
        }
        let stacked = placed.iter().flat_map(|p| p.segments.iter()).any(|other| {
            other.x + seg_w > seg.center.x
                && other.x - seg_w < seg.center.x
                && other.y + gap > seg.center.y
                && other.y - gap < seg.center.y
        });
        if stacked {
            return false;
        }
    }
    true
}

/// Place up to `requested` platforms. Returns fewer when space runs out.
pub fn place_platforms(
    config: &ResolvedConfig,
    requested: usize,
    scene: &Scene,
    pig_candidates: &[PigCandidate],
    rng: &mut dyn RandomSource,
) -> Vec<Platform> {
    let bounds = &config.raw.bounds;
    let params = &config.raw.platform;
    let seg_w = PLATFORM_SEGMENT_SIZE.width;

    let mut target = requested;
    let mut placed: Vec<Platform> = Vec::new();
    let mut attempts = 0;
    while placed.len() < target {
        let count = rng.randint(i64::from(params.segments.min), i64::from(params.segments.max));
        let half = count as f64 * seg_w / 2.0;
        let x = rng.uniform(bounds.width_min + half, bounds.width_max - half);
        let y = rng.uniform(bounds.height_min, bounds.height_max - params.minimum_height_gap);
        let candidate = Platform::new(Point::new(x, y), count as usize);

        if platform_fits(config, &candidate, scene, &placed, pig_candidates) {
            placed.push(candidate);
        }

        attempts += 1;
        if attempts > bounds.max_attempts {
            attempts = 0;
            target -= 1;
            debug!("no room for platform {}, lowering target to {target}", placed.len() + 1);
        }
    }
    if placed.len() < requested {
        warn!("placed {} of {requested} requested platforms", placed.len());
    }
    placed
}

/// Ground line and budget for the structure on `platforms[index]`.
pub fn platform_budget(config: &ResolvedConfig, platforms: &[Platform], index: usize) -> (f64, Budget) {
    let platform = &platforms[index];
    let seg = PLATFORM_SEGMENT_SIZE;
    let first_x = platform.segments.first().map_or(platform.center.x, |p| p.x);
    let last_x = platform.segments.last().map_or(platform.center.x, |p| p.x);

    let min_above = platforms
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != index)
        .flat_map(|(_, p)| p.segments.iter())
        .filter(|s| s.x + seg.width > first_x && s.x - seg.width < last_x && s.y > platform.center.y)
        .map(|s| s.y)
        .fold(config.raw.bounds.height_max, f64::min);

    let ground = platform.center.y + seg.height / 2.0;
    let budget = Budget {
        max_width: platform.width(),
        max_height: (min_above - ground) - PIG_SIZE.height - seg.height,
    };
    (ground, budget)
}

/// Whether a freshly synthesized platform structure runs into anything
/// already in the scene.
pub fn structure_intrudes(structure: &Structure, scene: &Scene) -> bool {
    structure.blocks().any(|b| {
        let r = b.rect();
        scene.blocks().any(|(_, other)| r.overlaps(&other.rect()))
            || scene.support_rects().any(|s| r.overlaps(&s))
    })
}
