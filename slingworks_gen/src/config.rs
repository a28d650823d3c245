// Data-driven generator configuration.
//
// Every tunable of the generator lives in `GenConfig`, loaded from JSON or
// built from `Default`. The generator never uses magic numbers for search
// behavior; it reads them from here. Parameters are grouped into nested
// structs by the stage that consumes them: `LevelBounds`, `CountRanges`,
// `StructureParams`, `PlatformParams`, `PigParams`, `TntParams`,
// `TrajectoryParams`, `VulnerabilityParams`, `ProtectionParams`,
// `SwapParams`, `DecorationParams`, `MaterialParams`, `BirdParams` and
// `TerrainParams`.
//
// Probability tables are written in JSON keyed by catalog id strings
// ("1".."13" for block shapes, "1".."3" for materials) so config files
// stay readable next to the shape catalog. `GenConfig::resolve()` turns the
// raw config into a `ResolvedConfig`: tables are checked, restricted shapes
// removed, and everything normalized once. This is the only place a
// `ConfigError` can arise.
//
// See also: `types.rs` for the catalogs the ids refer to, `table.rs` for
// `ProbabilityTable`, `level.rs` which consumes `ResolvedConfig`.
//
// **Critical constraint: determinism.** A config is never mutated during a
// run; identical config + seed must produce an identical level.

use crate::error::ConfigError;
use crate::support::Robustness;
use crate::table::ProbabilityTable;
use crate::types::{BirdType, BlockShape, Material, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// An inclusive integer range `[min, max]` drawn uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// How many of each top-level entity a level asks for. Each stage may
/// deliver fewer when it runs out of room.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountRanges {
    pub pigs: CountRange,
    pub ground_structures: CountRange,
    pub platforms: CountRange,
    pub tnt: CountRange,
}

/// The level's playable box and ground line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelBounds {
    pub width_min: f64,
    pub width_max: f64,
    /// Lowest center height for floating platforms. Ground structures sit
    /// on `absolute_ground` instead.
    pub height_min: f64,
    pub height_max: f64,
    pub absolute_ground: f64,
    /// Narrowest ground slot a ground structure may be given.
    pub min_ground_width: f64,
    /// Ground structures get `1 / ground_height_divisor` of the vertical
    /// space left below the lowest platform band.
    pub ground_height_divisor: f64,
    /// Retry budget shared by ground layout, platform placement and the
    /// pig ground fallback.
    pub max_attempts: u32,
}

/// Structure synthesis parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructureParams {
    /// Relative weight per block shape id ("1".."13").
    pub block_probabilities: BTreeMap<String, f64>,
    /// Shape names (e.g. "RectBig") never used anywhere in the level.
    pub restricted_shapes: Vec<String>,
    /// Support policy every synthesized row must satisfy.
    pub robustness: Robustness,
    /// Peak count is drawn uniformly from `1..=max_peaks` (at most 5).
    pub max_peaks: u32,
    /// Extra gap between peak blocks, in hundredths of a unit.
    pub min_peak_split: u32,
    pub max_peak_split: u32,
    /// Edge placements are pulled this far in from the group's outer edge.
    pub edge_buffer: f64,
    /// Edge support probes sit this far inside a block's edges.
    pub check_buffer: f64,
    /// Shape redraws per row before the structure stops growing.
    pub max_row_attempts: u32,
}

/// Floating platform parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformParams {
    pub segments: CountRange,
    /// Minimum vertical distance between two platforms that share columns.
    pub minimum_height_gap: f64,
    /// Clearance kept between platforms and any block, platform or pig
    /// candidate.
    pub distance_buffer: f64,
    /// Re-synthesis attempts for a platform's structure if it would
    /// overlap existing geometry.
    pub structure_attempts: u32,
}

/// Pig candidate generation and greedy scoring.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PigParams {
    /// Step of the ground scan under each structure.
    pub ground_precision: f64,
    pub protection_weight: f64,
    pub dispersion_weight: f64,
    /// Horizontal reach of the "near a platform edge" bonus.
    pub edge_bonus_distance: f64,
    pub edge_bonus: f64,
}

/// TNT greedy scoring.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TntParams {
    /// Vulnerable blocks and pigs closer than this count toward damage.
    pub proximity_distance: f64,
    /// Dispersion score given to every candidate before the first pick.
    pub first_dispersion: f64,
    pub dispersion_weight: f64,
    /// A pick must score strictly above this.
    pub placement_threshold: f64,
}

/// Ballistic model: shot fan plus the empirical calibration table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrajectoryParams {
    pub number_shots: u32,
    /// x-step between trajectory samples.
    pub sample_step: f64,
    /// Trajectories are sampled for x in `[0, max_x)`.
    pub max_x: f64,
    pub slingshot: Point,
    /// Distance of the virtual release point from the sling.
    pub release_distance: f64,
    pub scale: f64,
    pub velocity_scale: f64,
    /// Calibration brackets: ascending launch angles (radians), the angle
    /// correction for each bracket, and the launch velocity for each.
    pub launch_angles: Vec<f64>,
    pub angle_corrections: Vec<f64>,
    pub launch_velocities: Vec<f64>,
    /// Interpolate linearly between calibration points. When false, each
    /// angle takes the values of the bracket it falls in.
    pub interpolate: bool,
}

/// Vulnerability analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VulnerabilityParams {
    pub enabled: bool,
    /// Support policy used when simulating collapse.
    pub robustness: Robustness,
    /// Support probes sit this far below an object's bottom edge.
    pub probe_drop: f64,
    /// Edge probes count a supporter's box grown by this much.
    pub error_buffer: f64,
    /// Score added per pig left unsupported (blocks and decorations add 1).
    pub pig_weight: u32,
    pub score_threshold: u32,
}

/// Protection engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtectionParams {
    pub stack_enabled: bool,
    pub row_extension_enabled: bool,
    /// Force still-vulnerable blocks to the most resistant material.
    pub harden_vulnerable: bool,
    pub stack_buffer_min: f64,
    pub stack_buffer_max: f64,
    /// Stack must rise this far above the vulnerable block's top.
    pub height_bonus: f64,
    /// Consecutive overlap failures before a stack is abandoned.
    pub max_stack_attempts: u32,
    /// Measure the stack offset from the structure's leftmost extent
    /// instead of the vulnerable block.
    pub far_left: bool,
    /// Resting within this distance above a platform counts as support.
    pub push_down: f64,
    /// Candidates shrink by this much before overlap tests.
    pub overlap_shrink: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwapParams {
    pub enabled: bool,
    /// Chance a valid swap is actually taken.
    pub probability: f64,
}

/// Which decorative kinds may be placed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecorationParams {
    pub enabled: bool,
    pub triangle_hole: bool,
    pub triangle: bool,
    pub circle: bool,
    pub circle_small: bool,
}

/// Material assignment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialParams {
    /// Relative weight per material id ("1".."3").
    pub probabilities: BTreeMap<String, f64>,
    /// Table used for blocks in front of a pig along a trajectory.
    pub trajectory_probabilities: BTreeMap<String, f64>,
    /// Structures with at most this many blocks may be one material.
    pub small_threshold: usize,
    pub random_chance: f64,
    pub cluster_chance: f64,
    pub cluster_swap_prob: f64,
    pub trajectory_chance: f64,
}

/// Bird count and mix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BirdParams {
    /// Multiplier on the base bird count.
    pub count_weight: f64,
    /// Relative preference per bird type.
    pub type_weights: BTreeMap<BirdType, f64>,
}

/// Hills under ground structures and slopes between them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainParams {
    pub hills_enabled: bool,
    pub add_slopes: bool,
    /// Degrees.
    pub max_slope_angle: f64,
    pub max_slope_height: f64,
    pub max_slope_increase: f64,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenConfig {
    pub bounds: LevelBounds,
    pub counts: CountRanges,
    pub structure: StructureParams,
    pub platform: PlatformParams,
    pub pig: PigParams,
    pub tnt: TntParams,
    pub trajectory: TrajectoryParams,
    pub vulnerability: VulnerabilityParams,
    pub protection: ProtectionParams,
    pub swap: SwapParams,
    pub decoration: DecorationParams,
    pub material: MaterialParams,
    pub bird: BirdParams,
    pub terrain: TerrainParams,
}

fn id_map(weights: &[f64]) -> BTreeMap<String, f64> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| ((i + 1).to_string(), w))
        .collect()
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            bounds: LevelBounds {
                width_min: -3.0,
                width_max: 9.0,
                height_min: -2.0,
                height_max: 6.0,
                absolute_ground: -3.5,
                min_ground_width: 2.5,
                ground_height_divisor: 1.5,
                max_attempts: 100,
            },
            counts: CountRanges {
                pigs: CountRange::new(4, 8),
                ground_structures: CountRange::new(1, 3),
                platforms: CountRange::new(0, 2),
                tnt: CountRange::new(0, 3),
            },
            structure: StructureParams {
                block_probabilities: id_map(&[
                    0.118_708_408_637_287_56,
                    0.111_426_392_703_490_3,
                    0.037_753_878_358_891_865,
                    0.050_210_142_536_973_326,
                    0.066_673_006_858_306_99,
                    0.071_072_195_734_869_78,
                    0.074_136_941_131_487_58,
                    0.117_166_192_405_673_61,
                    0.048_982_179_880_264_536,
                    0.115_038_861_327_274_55,
                    0.015_224_307_126_955_784,
                    0.150_796_205_249_233_62,
                    0.022_811_288_049_290_53,
                ]),
                restricted_shapes: Vec::new(),
                robustness: Robustness::EdgesOnly,
                max_peaks: 5,
                min_peak_split: 10,
                max_peak_split: 50,
                edge_buffer: 0.11,
                check_buffer: 0.05,
                max_row_attempts: 100,
            },
            platform: PlatformParams {
                segments: CountRange::new(4, 7),
                minimum_height_gap: 3.5,
                distance_buffer: 0.4,
                structure_attempts: 10,
            },
            pig: PigParams {
                ground_precision: 0.01,
                protection_weight: 3.0,
                dispersion_weight: 0.002,
                edge_bonus_distance: 0.8,
                edge_bonus: 1.0,
            },
            tnt: TntParams {
                proximity_distance: 1.0,
                first_dispersion: 20.0,
                dispersion_weight: 1.0,
                placement_threshold: 0.0,
            },
            trajectory: TrajectoryParams {
                number_shots: 50,
                sample_step: 0.5,
                max_x: 20.0,
                slingshot: Point::new(-7.7, -1.0),
                release_distance: 100.0,
                scale: 1.0,
                velocity_scale: 1.65,
                launch_angles: vec![
                    0.13, 0.215, 0.296, 0.381, 0.476, 0.567, 0.657, 0.741, 0.832, 0.924, 1.014,
                    1.106, 1.197,
                ],
                angle_corrections: vec![
                    0.052, 0.057, 0.063, 0.066, 0.056, 0.054, 0.050, 0.053, 0.042, 0.038, 0.034,
                    0.029, 0.025,
                ],
                launch_velocities: vec![
                    2.9, 2.88, 2.866, 2.838, 2.810, 2.800, 2.790, 2.773, 2.763, 2.745, 2.74,
                    2.735, 2.73,
                ],
                interpolate: true,
            },
            vulnerability: VulnerabilityParams {
                enabled: true,
                robustness: Robustness::CenterOrEdges,
                probe_drop: 0.1,
                error_buffer: 0.01,
                pig_weight: 10,
                score_threshold: 15,
            },
            protection: ProtectionParams {
                stack_enabled: true,
                row_extension_enabled: true,
                harden_vulnerable: true,
                stack_buffer_min: 0.1,
                stack_buffer_max: 0.5,
                height_bonus: 1.0,
                max_stack_attempts: 10,
                far_left: false,
                push_down: 0.01,
                overlap_shrink: 0.01,
            },
            swap: SwapParams {
                enabled: true,
                probability: 0.5,
            },
            decoration: DecorationParams {
                enabled: true,
                triangle_hole: true,
                triangle: true,
                circle: true,
                circle_small: true,
            },
            material: MaterialParams {
                probabilities: id_map(&[0.4, 0.3, 0.3]),
                trajectory_probabilities: id_map(&[0.5, 0.5, 0.0]),
                small_threshold: 10,
                random_chance: 0.3,
                cluster_chance: 0.5,
                cluster_swap_prob: 0.2,
                trajectory_chance: 0.8,
            },
            bird: BirdParams {
                count_weight: 1.0,
                type_weights: BirdType::ALL.iter().map(|&b| (b, 1.0)).collect(),
            },
            terrain: TerrainParams {
                hills_enabled: true,
                add_slopes: true,
                max_slope_angle: 30.0,
                max_slope_height: 1.5,
                max_slope_increase: 1.0,
            },
        }
    }
}

impl GenConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Height budget of every ground structure: a share of the space below
    /// the band reserved for platforms.
    pub fn ground_structure_height_limit(&self) -> f64 {
        ((self.bounds.height_max - self.platform.minimum_height_gap) - self.bounds.absolute_ground)
            / self.bounds.ground_height_divisor
    }

    /// Validate and normalize into the form the generator consumes.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        self.check_ranges()?;

        let blocks = shape_table(&self.structure.block_probabilities)?;
        let mut restricted = Vec::new();
        for name in &self.structure.restricted_shapes {
            if !BlockShape::ALL.iter().any(|s| s.name() == name) {
                return Err(ConfigError::UnknownShapeName(name.clone()));
            }
            restricted.push(name.as_str());
        }
        let blocks = blocks
            .without(|s| restricted.contains(&s.name()))
            .ok_or(ConfigError::EmptyTable("block_probabilities"))?;

        let materials = material_table(&self.material.probabilities, "material.probabilities")?;
        let trajectory_materials = material_table(
            &self.material.trajectory_probabilities,
            "material.trajectory_probabilities",
        )?;

        Ok(ResolvedConfig {
            raw: self.clone(),
            blocks,
            materials,
            trajectory_materials,
        })
    }

    fn check_ranges(&self) -> Result<(), ConfigError> {
        let c = &self.counts;
        for (name, r) in [
            ("counts.pigs", c.pigs),
            ("counts.ground_structures", c.ground_structures),
            ("counts.platforms", c.platforms),
            ("counts.tnt", c.tnt),
            ("platform.segments", self.platform.segments),
        ] {
            if r.min > r.max {
                return Err(ConfigError::InvalidRange {
                    name,
                    detail: format!("min {} > max {}", r.min, r.max),
                });
            }
        }
        if self.platform.segments.min == 0 {
            return Err(ConfigError::InvalidRange {
                name: "platform.segments",
                detail: "platforms need at least one segment".into(),
            });
        }
        let s = &self.structure;
        if !(1..=5).contains(&s.max_peaks) {
            return Err(ConfigError::InvalidRange {
                name: "structure.max_peaks",
                detail: format!("{} is outside 1..=5", s.max_peaks),
            });
        }
        if s.min_peak_split > s.max_peak_split {
            return Err(ConfigError::InvalidRange {
                name: "structure.peak_split",
                detail: format!("min {} > max {}", s.min_peak_split, s.max_peak_split),
            });
        }
        let b = &self.bounds;
        if b.width_min >= b.width_max || b.height_min >= b.height_max {
            return Err(ConfigError::InvalidRange {
                name: "bounds",
                detail: "level box is empty".into(),
            });
        }
        if b.ground_height_divisor <= 0.0 {
            return Err(ConfigError::InvalidRange {
                name: "bounds.ground_height_divisor",
                detail: "must be positive".into(),
            });
        }
        let p = &self.protection;
        if p.stack_buffer_min > p.stack_buffer_max {
            return Err(ConfigError::InvalidRange {
                name: "protection.stack_buffer",
                detail: format!("min {} > max {}", p.stack_buffer_min, p.stack_buffer_max),
            });
        }
        let v = &self.vulnerability;
        if v.probe_drop <= v.error_buffer {
            return Err(ConfigError::InvalidRange {
                name: "vulnerability.probe_drop",
                detail: format!(
                    "{} must exceed error_buffer {}",
                    v.probe_drop, v.error_buffer
                ),
            });
        }
        if self.pig.ground_precision <= 0.0 {
            return Err(ConfigError::InvalidRange {
                name: "pig.ground_precision",
                detail: "must be positive".into(),
            });
        }
        let t = &self.trajectory;
        if t.launch_angles.is_empty()
            || t.launch_angles.len() != t.angle_corrections.len()
            || t.launch_angles.len() != t.launch_velocities.len()
        {
            return Err(ConfigError::MalformedCalibration(format!(
                "{} angles, {} corrections, {} velocities",
                t.launch_angles.len(),
                t.angle_corrections.len(),
                t.launch_velocities.len()
            )));
        }
        if t.launch_angles.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::MalformedCalibration(
                "launch angles must ascend".into(),
            ));
        }
        if t.number_shots < 2 || t.sample_step <= 0.0 {
            return Err(ConfigError::MalformedCalibration(
                "need at least two shots and a positive sample step".into(),
            ));
        }
        Ok(())
    }
}

fn check_weight(id: &str, weight: f64) -> Result<(), ConfigError> {
    if weight < 0.0 || weight.is_nan() {
        return Err(ConfigError::NegativeWeight {
            id: id.to_string(),
            weight,
        });
    }
    Ok(())
}

fn shape_table(raw: &BTreeMap<String, f64>) -> Result<ProbabilityTable<BlockShape>, ConfigError> {
    let mut weights: BTreeMap<BlockShape, f64> = BTreeMap::new();
    for (id, &w) in raw {
        let shape = id
            .parse::<u8>()
            .ok()
            .and_then(BlockShape::from_id)
            .ok_or_else(|| ConfigError::UnknownShapeId(id.clone()))?;
        check_weight(id, w)?;
        weights.insert(shape, w);
    }
    // Catalog order, with absent ids at weight 0.
    ProbabilityTable::from_weights(
        BlockShape::ALL
            .iter()
            .map(|&s| (s, weights.get(&s).copied().unwrap_or(0.0))),
    )
    .ok_or(ConfigError::EmptyTable("block_probabilities"))
}

fn material_table(
    raw: &BTreeMap<String, f64>,
    name: &'static str,
) -> Result<ProbabilityTable<Material>, ConfigError> {
    let mut weights: BTreeMap<Material, f64> = BTreeMap::new();
    for (id, &w) in raw {
        let material = id
            .parse::<u8>()
            .ok()
            .and_then(Material::from_id)
            .ok_or_else(|| ConfigError::UnknownMaterialId(id.clone()))?;
        check_weight(id, w)?;
        weights.insert(material, w);
    }
    ProbabilityTable::from_weights(
        Material::ALL
            .iter()
            .map(|&m| (m, weights.get(&m).copied().unwrap_or(0.0))),
    )
    .ok_or(ConfigError::EmptyTable(name))
}

/// A validated config with its tables typed and normalized.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub raw: GenConfig,
    pub blocks: ProbabilityTable<BlockShape>,
    pub materials: ProbabilityTable<Material>,
    pub trajectory_materials: ProbabilityTable<Material>,
}

impl ResolvedConfig {
    /// Resolve the default config.
    pub fn standard() -> Result<Self, ConfigError> {
        GenConfig::default().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = GenConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: GenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.bounds.absolute_ground, restored.bounds.absolute_ground);
        assert_eq!(config.counts.pigs, restored.counts.pigs);
        assert_eq!(config.structure.robustness, restored.structure.robustness);
        assert_eq!(
            config.structure.block_probabilities,
            restored.structure.block_probabilities
        );
        assert_eq!(
            config.trajectory.launch_angles,
            restored.trajectory.launch_angles
        );
        assert_eq!(restored.bird.type_weights[&BirdType::White], 1.0);
    }

    #[test]
    fn default_resolves_and_normalizes() {
        let resolved = GenConfig::default().resolve().unwrap();
        let total: f64 = resolved.blocks.entries().iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(resolved.materials.probability(Material::Wood), 0.4);
        assert_eq!(
            resolved.trajectory_materials.probability(Material::Stone),
            0.0
        );
    }

    #[test]
    fn ground_height_limit_matches_bounds() {
        let config = GenConfig::default();
        assert_eq!(config.ground_structure_height_limit(), 4.0);
    }

    #[test]
    fn unknown_shape_id_is_rejected() {
        let mut config = GenConfig::default();
        config.structure.block_probabilities.insert("14".into(), 0.5);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::UnknownShapeId(id)) if id == "14"
        ));
    }

    #[test]
    fn unknown_material_id_is_rejected() {
        let mut config = GenConfig::default();
        config.material.probabilities.insert("stone".into(), 0.5);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::UnknownMaterialId(_))
        ));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut config = GenConfig::default();
        config.material.probabilities.insert("2".into(), -0.1);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn restricting_every_shape_empties_the_table() {
        let mut config = GenConfig::default();
        config.structure.restricted_shapes = BlockShape::ALL
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::EmptyTable("block_probabilities"))
        ));
    }

    #[test]
    fn restricted_shapes_are_zeroed_and_rest_renormalized() {
        let mut config = GenConfig::default();
        config.structure.restricted_shapes = vec!["RectBig".into(), "SquareHole".into()];
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.blocks.probability(BlockShape::RectBig), 0.0);
        assert_eq!(resolved.blocks.probability(BlockShape::RectBigRotated), 0.0);
        assert_eq!(resolved.blocks.probability(BlockShape::SquareHole), 0.0);
        let total: f64 = resolved.blocks.entries().iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_restricted_name_is_rejected() {
        let mut config = GenConfig::default();
        config.structure.restricted_shapes = vec!["Hexagon".into()];
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::UnknownShapeName(_))
        ));
    }

    #[test]
    fn inverted_count_range_is_rejected() {
        let mut config = GenConfig::default();
        config.counts.pigs = CountRange::new(5, 2);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidRange { name: "counts.pigs", .. })
        ));
    }

    #[test]
    fn probe_inside_error_buffer_is_rejected() {
        let mut config = GenConfig::default();
        config.vulnerability.probe_drop = config.vulnerability.error_buffer;
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidRange { name: "vulnerability.probe_drop", .. })
        ));
    }

    #[test]
    fn standard_is_the_resolved_default() {
        let standard = ResolvedConfig::standard().unwrap();
        assert_eq!(standard.raw.counts.pigs, GenConfig::default().counts.pigs);
    }

    #[test]
    fn mismatched_calibration_is_rejected() {
        let mut config = GenConfig::default();
        config.trajectory.launch_velocities.pop();
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::MalformedCalibration(_))
        ));
    }

    #[test]
    fn bad_json_surfaces_as_config_error() {
        assert!(matches!(
            GenConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn config_loads_with_overrides_from_json() {
        let mut value = serde_json::to_value(GenConfig::default()).unwrap();
        value["counts"]["pigs"] = serde_json::json!({ "min": 2, "max": 2 });
        value["structure"]["robustness"] = serde_json::json!("EdgesAndCenter");
        value["structure"]["block_probabilities"] = serde_json::json!({ "4": 1.0 });
        let config = GenConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(config.counts.pigs, CountRange::new(2, 2));
        assert_eq!(config.structure.robustness, Robustness::EdgesAndCenter);
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.blocks.probability(BlockShape::SquareSmall), 1.0);
    }
}
