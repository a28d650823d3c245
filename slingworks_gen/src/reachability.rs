// Line-of-fire queries over a scene.
//
// Every query walks each shot of a `ShotFan` segment by segment and tests
// the segment against entity boxes with `Segment::crosses_rect()`. A shot
// stops at the first segment that hits anything the query treats as
// opaque; every hit on that final segment still counts. The four queries
// differ in what is opaque and what they record:
//
// - `reachable_blocks()`: blocks, platform/hill segments, decorations and
//   pigs are opaque. Records every block crossed by the stopping segment.
// - `blocks_in_way()`: only platform/hill segments and pigs stop a shot.
//   Blocks crossed along the way accumulate, and each pig hit is recorded
//   with the blocks in front of it. Used to bias material choice.
// - `unprotected_pigs()`: same opacity as `reachable_blocks()`; records
//   the pigs crossed by the stopping segment, i.e. pigs that are the first
//   thing a shot meets.
// - `hittable_pigs()`: only platform/hill segments and pigs stop a shot.
//   Blocks and decorations are ignored, so this answers "could a shot that
//   smashes through the structure reach this pig".
//
// The two pig queries are kept distinct on purpose: the bird mix uses the
// gap between them.
//
// Pigs are identified by their index in `Scene::pigs`, blocks by
// `BlockRef`. Results are deduplicated, in first-hit order.
//
// See also: `trajectory.rs` for the fan, `vulnerability.rs` which scores
// reachable blocks, `materials.rs` and `birds.rs` which consume the pig
// queries.

use crate::geometry::{Rect, Segment};
use crate::scene::{BlockRef, Scene, pig_rect};
use crate::trajectory::ShotFan;

fn push_unique<T: PartialEq>(out: &mut Vec<T>, item: T) {
    if !out.contains(&item) {
        out.push(item);
    }
}

fn blocks_crossed<'a>(scene: &'a Scene, seg: &'a Segment) -> impl Iterator<Item = BlockRef> + 'a {
    scene
        .blocks()
        .filter(move |(_, b)| seg.crosses_rect(&b.rect()))
        .map(|(r, _)| r)
}

fn pigs_crossed<'a>(scene: &'a Scene, seg: &'a Segment) -> impl Iterator<Item = usize> + 'a {
    scene
        .pigs
        .iter()
        .enumerate()
        .filter(move |&(_, &p)| seg.crosses_rect(&pig_rect(p)))
        .map(|(i, _)| i)
}

fn crosses_support(scene: &Scene, seg: &Segment) -> bool {
    scene.support_rects().any(|s: Rect| seg.crosses_rect(&s))
}

fn crosses_decoration(scene: &Scene, seg: &Segment) -> bool {
    scene.decorations.iter().any(|d| seg.crosses_rect(&d.rect()))
}

/// Blocks some shot hits before anything else.
pub fn reachable_blocks(fan: &ShotFan, scene: &Scene) -> Vec<BlockRef> {
    let mut out = Vec::new();
    for shot in &fan.shots {
        for seg in shot.segments() {
            let mut found = false;
            for r in blocks_crossed(scene, &seg) {
                found = true;
                push_unique(&mut out, r);
            }
            found |= crosses_support(scene, &seg);
            found |= crosses_decoration(scene, &seg);
            found |= pigs_crossed(scene, &seg).next().is_some();
            if found {
                break;
            }
        }
    }
    out
}

/// For every pig some shot reaches, the blocks that shot passes through
/// first. One entry per pig, shots merged in fan order.
pub fn blocks_in_way(fan: &ShotFan, scene: &Scene) -> Vec<(usize, Vec<BlockRef>)> {
    let mut merged: Vec<(usize, Vec<BlockRef>)> = Vec::new();
    for shot in &fan.shots {
        let mut crossed: Vec<BlockRef> = Vec::new();
        for seg in shot.segments() {
            crossed.extend(blocks_crossed(scene, &seg));
            let mut found = false;
            for pig in pigs_crossed(scene, &seg) {
                found = true;
                match merged.iter_mut().find(|(p, _)| *p == pig) {
                    Some((_, blocks)) => {
                        for &b in &crossed {
                            push_unique(blocks, b);
                        }
                    }
                    None => {
                        let mut blocks = Vec::new();
                        for &b in &crossed {
                            push_unique(&mut blocks, b);
                        }
                        merged.push((pig, blocks));
                    }
                }
            }
            found |= crosses_support(scene, &seg);
            if found {
                break;
            }
        }
    }
    merged
}

/// Pigs that are the first thing some shot hits.
pub fn unprotected_pigs(fan: &ShotFan, scene: &Scene) -> Vec<usize> {
    let mut out = Vec::new();
    for shot in &fan.shots {
        for seg in shot.segments() {
            let mut found = blocks_crossed(scene, &seg).next().is_some();
            found |= crosses_support(scene, &seg);
            found |= crosses_decoration(scene, &seg);
            for pig in pigs_crossed(scene, &seg) {
                found = true;
                push_unique(&mut out, pig);
            }
            if found {
                break;
            }
        }
    }
    out
}

/// Pigs some shot reaches when blocks and decorations are ignored.
pub fn hittable_pigs(fan: &ShotFan, scene: &Scene) -> Vec<usize> {
    let mut out = Vec::new();
    for shot in &fan.shots {
        for seg in shot.segments() {
            let mut found = crosses_support(scene, &seg);
            for pig in pigs_crossed(scene, &seg) {
                found = true;
                push_unique(&mut out, pig);
            }
            if found {
                break;
            }
        }
    }
    out
}
