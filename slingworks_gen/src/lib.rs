// slingworks_gen: procedural slingshot-puzzle level generator.
//
// This crate builds complete levels: block structures on the ground and on
// floating platforms, hill terrain, pigs, TNT, decorations, per-block
// materials and a bird sequence. It is a pure library with no file I/O;
// the `generate` binary is a thin shell over `level::generate_level()`.
//
// Module overview:
// - `level.rs`:         `generate_level()`, the stage-by-stage pipeline, and `Level`.
// - `config.rs`:        GenConfig, every tunable parameter, grouped per stage; `ResolvedConfig`.
// - `error.rs`:         ConfigError, the only fatal error.
// - `types.rs`:         Point, Size, the block/decoration catalogs, Material, BirdType.
// - `geometry.rs`:      Rect, Bounds, Segment; 10-decimal rounding for comparisons.
// - `table.rs`:         ProbabilityTable, normalized weighted choice.
// - `support.rs`:       Robustness and the row support predicate.
// - `structure.rs`:     Structure synthesis (peak, rows beneath) and pig candidates.
// - `scene.rs`:         Scene, all placed geometry plus collision and support queries.
// - `terrain.rs`:       Hills under ground structures, slopes between them.
// - `platform.rs`:      Floating platforms and the budgets of their structures.
// - `placement.rs`:     Greedy optimizer for pig and TNT placement.
// - `trajectory.rs`:    ShotFan, the sampled sweep of slingshot shots.
// - `reachability.rs`:  Which blocks and pigs shots reach first.
// - `vulnerability.rs`: Collapse scoring for removing one reachable block.
// - `protection.rs`:    Protective stacks and row extension for vulnerable blocks.
// - `swap.rs`:          Same-height block swapping.
// - `decoration.rs`:    Decorative objects on top of blocks.
// - `materials.rs`:     Per-block material assignment.
// - `birds.rs`:         Bird count and bird order.
// - `prng`:             Re-exported from `slingworks_prng`: xoshiro256++ PRNG with SplitMix64 seeding.
//
// **Critical constraint: determinism.** A level is a pure function of
// `(config, seed)`. All randomness comes from one `RandomSource` passed
// explicitly through every stage. No `HashMap`, no system time, no OS
// entropy. Use `BTreeMap` for ordered collections.

pub mod birds;
pub mod config;
pub mod decoration;
pub mod error;
pub mod geometry;
pub mod level;
pub mod materials;
pub mod placement;
pub mod platform;
pub use slingworks_prng as prng;
pub mod protection;
pub mod reachability;
pub mod scene;
pub mod structure;
pub mod support;
pub mod swap;
pub mod table;
pub mod terrain;
pub mod trajectory;
pub mod types;
pub mod vulnerability;
