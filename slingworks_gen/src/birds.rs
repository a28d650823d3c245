// Bird count and bird order.
//
// The count grows with the pig count: a third of a bird per pig, one more
// when there are at least that many structures and platforms to break
// through, scaled by `count_weight` and rounded up, plus a spare bird.
//
// The order targets a mix of five bird types, each matched to one feature
// of the level: yellow to wood, blue to ice, black to stone, red to pigs
// that are the first thing some shot hits, white to pigs no shot can reach
// even through blocks. Each feature's share (of blocks or of pigs) is
// normalized over the sum of all five shares and scaled by the type's
// weight. Birds are then chosen one at a time: the type that keeps the
// running proportions closest to the targets in L1 distance, with exact
// ties going to the type used least so far.
//
// See also: `reachability.rs` for the two pig queries, `materials.rs` for
// the material mix.

use crate::config::ResolvedConfig;
use crate::types::{BirdType, Material};

/// Number of birds for a level.
pub fn bird_count(config: &ResolvedConfig, pigs: usize, structures: usize, platforms: usize) -> usize {
    let mut n = pigs as f64 / 3.0;
    if (structures + platforms) as f64 >= n {
        n += 1.0;
    }
    (n * config.raw.bird.count_weight).ceil() as usize + 1
}

/// Target share per bird type, indexed by `BirdType::index()`.
pub fn bird_targets(
    config: &ResolvedConfig,
    materials: &[Vec<Material>],
    pigs: usize,
    hittable: usize,
    unprotected: usize,
) -> [f64; 5] {
    let blocks: Vec<Material> = materials.iter().flatten().copied().collect();
    let share = |count: usize, of: usize| if of == 0 { 0.0 } else { count as f64 / of as f64 };
    let of_material = |m: Material| share(blocks.iter().filter(|&&b| b == m).count(), blocks.len());

    let mut shares = [0.0; 5];
    shares[BirdType::Yellow.index()] = of_material(Material::Wood);
    shares[BirdType::Blue.index()] = of_material(Material::Ice);
    shares[BirdType::Black.index()] = of_material(Material::Stone);
    shares[BirdType::Red.index()] = share(unprotected, pigs);
    shares[BirdType::White.index()] = share(pigs.saturating_sub(hittable), pigs);

    let total: f64 = shares.iter().sum();
    if total <= 0.0 {
        return [0.0; 5];
    }
    let weights = &config.raw.bird.type_weights;
    let mut targets = [0.0; 5];
    for bird in BirdType::ALL {
        let w = weights.get(&bird).copied().unwrap_or(1.0);
        targets[bird.index()] = shares[bird.index()] / total * w;
    }
    targets
}

/// `count` birds whose running mix tracks `targets`.
pub fn bird_order(targets: &[f64; 5], count: usize) -> Vec<BirdType> {
    let mut used = [0usize; 5];
    let mut order = Vec::with_capacity(count);
    for step in 1..=count {
        let n = step as f64;
        let error = |pick: usize| -> f64 {
            (0..5)
                .map(|i| {
                    let c = used[i] + usize::from(i == pick);
                    (c as f64 / n - targets[i]).abs()
                })
                .sum()
        };

        let mut best = 0;
        let mut lowest = error(0);
        for pick in 1..5 {
            let e = error(pick);
            if e < lowest {
                lowest = e;
                best = pick;
            } else if e == lowest && used[best] > used[pick] {
                best = pick;
            }
        }
        used[best] += 1;
        order.push(BirdType::ALL[best]);
    }
    order
}
