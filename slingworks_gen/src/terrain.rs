// Hill terrain under ground structures and slopes between hills.
//
// Ground structures are raised one after another, left to right. Each
// draws a height change uniform in `[-increase/2, increase/2)` that is
// clamped so the step from the previous hill's right edge to this
// structure's left edge stays within `max_slope_angle`, then the running
// height is clamped to `[0, max_slope_height]`. The structure and its pig
// candidates are translated up by the running height, and the hill is
// filled with a grid of platform-sized segments three deep: a center
// column, mirrored column pairs stepping one segment outward, and a final
// pair flush with the structure's edges.
//
// Slopes bridge consecutive hills. Each bridge is two angled pieces (the
// surface and one segment below it) spanning the gap between the right
// edge column of one hill and the left edge column of the next, plus three
// flat filler pieces under the lower side when the hills differ in height.
// Slopes are level output only; nothing collides with them.
//
// See also: `scene.rs` for `Hill` and `Slope`, `level.rs` which only adds
// slopes when no pig fell back to the ground.
//
// **Critical constraint: determinism.** One uniform draw per ground
// structure, and none when hills are disabled.

use crate::config::ResolvedConfig;
use crate::geometry::round_to;
use crate::prng::RandomSource;
use crate::scene::{Hill, Slope};
use crate::structure::{PigCandidate, Structure};
use crate::types::{PLATFORM_SEGMENT_SIZE, Point};

const SEG: f64 = PLATFORM_SEGMENT_SIZE.width;

/// The three segment centers of one hill column.
fn column(x: f64, top: f64) -> [Point; 3] {
    [0.5, 1.5, 2.5].map(|k| Point::new(round_to(x), round_to(top - SEG * k)))
}

fn hill_segments(mid: f64, width: f64, top: f64) -> (Vec<Point>, f64) {
    let mut segments = column(mid, top).to_vec();
    let edge = mid + width / 2.0 - SEG / 2.0;
    let mut right = mid + SEG;
    let mut left = mid - SEG;
    let push_pair = |segments: &mut Vec<Point>, r: f64, l: f64| {
        for (a, b) in column(r, top).into_iter().zip(column(l, top)) {
            segments.push(a);
            segments.push(b);
        }
    };
    while right < edge {
        push_pair(&mut segments, right, left);
        right += SEG;
        left -= SEG;
    }
    right -= SEG;
    left += SEG;
    let jump = edge - right;
    right += jump;
    left -= jump;
    push_pair(&mut segments, right, left);
    (segments, right + SEG / 2.0)
}

/// Raise every ground structure onto a hill. `slots` are the ground slots
/// the structures were synthesized in, in the same order; `candidates` are
/// translated along with their structure.
pub fn raise_hills(
    config: &ResolvedConfig,
    slots: &[(f64, f64)],
    structures: &mut [Structure],
    candidates: &mut [Vec<PigCandidate>],
    rng: &mut dyn RandomSource,
) -> Vec<Hill> {
    let params = &config.raw.terrain;
    if !params.hills_enabled {
        return Vec::new();
    }
    let ground = config.raw.bounds.absolute_ground;
    let increase = params.max_slope_increase;

    let mut hills = Vec::with_capacity(structures.len());
    let mut raise = 0.0;
    let mut previous_end: Option<f64> = None;
    for (i, structure) in structures.iter_mut().enumerate() {
        let (lo, hi) = slots[i];
        let mid = lo + (hi - lo) / 2.0;
        let width = structure.width();

        let max_step = previous_end.map_or(f64::INFINITY, |end| {
            params.max_slope_angle.to_radians().tan() * (mid - width / 2.0 - end)
        });
        let mut step = rng.uniform(0.0, increase) - increase / 2.0;
        // The bound can be negative when structures crowd each other.
        if step > max_step {
            step = max_step;
        }
        if step < -max_step {
            step = -max_step;
        }
        raise += step;
        if raise < 0.0 {
            raise = 0.0;
        }
        if raise > params.max_slope_height {
            raise = params.max_slope_height;
        }

        structure.translate(0.0, raise);
        if let Some(cands) = candidates.get_mut(i) {
            for c in cands {
                c.position.y = round_to(c.position.y + raise);
            }
        }

        let (segments, end) = hill_segments(mid, width, ground + raise);
        previous_end = Some(end);
        hills.push(Hill {
            raise: round_to(raise),
            segments,
        });
    }
    hills
}

/// Angled and filler pieces bridging each pair of consecutive hills.
pub fn bridge_hills(hills: &[Hill]) -> Vec<Slope> {
    let mut slopes = Vec::new();
    for pair in hills.windows(2) {
        let (this, next) = (&pair[0], &pair[1]);
        let (Some(top), Some(next_top)) = (this.segments.first(), next.segments.first()) else {
            continue;
        };
        let (Some(right_col), Some(next_left_col)) = (
            this.segments.len().checked_sub(2).map(|k| this.segments[k]),
            next.segments.last(),
        ) else {
            continue;
        };

        let up = next_top.y - top.y;
        let across = (next_left_col.x - SEG / 2.0) - (right_col.x + SEG / 2.0);
        let angle = up.atan2(across).to_degrees();
        let length = up.hypot(across);
        let width_units = length / SEG;

        let half_diag = (SEG / 2.0).hypot(length / 2.0);
        let corner = angle.abs() + (SEG / 2.0).atan2(length / 2.0).to_degrees();
        let mut shift = across / 2.0 - corner.to_radians().cos() * half_diag;
        if angle < 0.0 {
            shift = -shift;
        }

        let gap_mid = right_col.x + SEG / 2.0 + across / 2.0;
        let surface = Point::new(gap_mid + shift, top.y + up / 2.0);
        for dy in [0.0, SEG] {
            slopes.push(Slope {
                center: Point::new(round_to(surface.x), round_to(surface.y - dy)),
                angle_degrees: angle,
                width_units,
            });
        }

        let filler_top = if up > 0.0 {
            Some(top.y)
        } else if up < 0.0 {
            Some(next_top.y)
        } else {
            None
        };
        if let Some(y) = filler_top {
            for k in 0..3 {
                slopes.push(Slope {
                    center: Point::new(round_to(gap_mid), round_to(y - SEG * k as f64)),
                    angle_degrees: 0.0,
                    width_units,
                });
            }
        }
    }
    slopes
}
