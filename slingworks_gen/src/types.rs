// Core catalog types shared across the generator.
//
// Defines the fixed shape catalog (`BlockShape`, 13 rectangular kinds), the
// decorative shapes (`DecorationKind`, 4 non-rectangular kinds), materials,
// bird types, and the small spatial value types (`Point`, `Size`) every
// other module works in. All catalog entries have a stable numeric id used
// as the JSON key in probability tables (see `config.rs`).
//
// Units are level units: the playable area spans roughly x in [-3, 9] and
// y in [-3.5, 6], with y pointing up.
//
// See also: `geometry.rs` for rectangles built from these sizes,
// `table.rs` for the weighted draws over catalog ids.
//
// **Critical constraint: determinism.** Catalog order (`ALL`) is the order
// every weighted draw walks, so it must never be reshuffled.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial value types
// ---------------------------------------------------------------------------

/// A position in level units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Width and height of an axis-aligned footprint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Footprint of a pig.
pub const PIG_SIZE: Size = Size::new(0.5, 0.45);
/// Footprint of a TNT crate.
pub const TNT_SIZE: Size = Size::new(0.55, 0.55);
/// Footprint of one platform or terrain segment.
pub const PLATFORM_SEGMENT_SIZE: Size = Size::new(0.62, 0.62);

// ---------------------------------------------------------------------------
// Block shapes
// ---------------------------------------------------------------------------

/// The 13 rectangular block kinds. Rotated variants are distinct entries
/// because they have distinct footprints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockShape {
    SquareHole,
    RectFat,
    RectFatRotated,
    SquareSmall,
    SquareTiny,
    RectTiny,
    RectTinyRotated,
    RectSmall,
    RectSmallRotated,
    RectMedium,
    RectMediumRotated,
    RectBig,
    RectBigRotated,
}

impl BlockShape {
    /// Catalog order, matching ids 1..=13.
    pub const ALL: [BlockShape; 13] = [
        BlockShape::SquareHole,
        BlockShape::RectFat,
        BlockShape::RectFatRotated,
        BlockShape::SquareSmall,
        BlockShape::SquareTiny,
        BlockShape::RectTiny,
        BlockShape::RectTinyRotated,
        BlockShape::RectSmall,
        BlockShape::RectSmallRotated,
        BlockShape::RectMedium,
        BlockShape::RectMediumRotated,
        BlockShape::RectBig,
        BlockShape::RectBigRotated,
    ];

    /// Stable catalog id (1-based).
    pub fn id(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn size(self) -> Size {
        match self {
            BlockShape::SquareHole => Size::new(0.84, 0.84),
            BlockShape::RectFat => Size::new(0.85, 0.43),
            BlockShape::RectFatRotated => Size::new(0.43, 0.85),
            BlockShape::SquareSmall => Size::new(0.43, 0.43),
            BlockShape::SquareTiny => Size::new(0.22, 0.22),
            BlockShape::RectTiny => Size::new(0.43, 0.22),
            BlockShape::RectTinyRotated => Size::new(0.22, 0.43),
            BlockShape::RectSmall => Size::new(0.85, 0.22),
            BlockShape::RectSmallRotated => Size::new(0.22, 0.85),
            BlockShape::RectMedium => Size::new(1.68, 0.22),
            BlockShape::RectMediumRotated => Size::new(0.22, 1.68),
            BlockShape::RectBig => Size::new(2.06, 0.22),
            BlockShape::RectBigRotated => Size::new(0.22, 2.06),
        }
    }

    pub fn width(self) -> f64 {
        self.size().width
    }

    pub fn height(self) -> f64 {
        self.size().height
    }

    /// Catalog name. Rotated variants share their unrotated name; restricted
    /// shape lists match on this, so restricting "RectFat" bans both.
    pub fn name(self) -> &'static str {
        match self {
            BlockShape::SquareHole => "SquareHole",
            BlockShape::RectFat | BlockShape::RectFatRotated => "RectFat",
            BlockShape::SquareSmall => "SquareSmall",
            BlockShape::SquareTiny => "SquareTiny",
            BlockShape::RectTiny | BlockShape::RectTinyRotated => "RectTiny",
            BlockShape::RectSmall | BlockShape::RectSmallRotated => "RectSmall",
            BlockShape::RectMedium | BlockShape::RectMediumRotated => "RectMedium",
            BlockShape::RectBig | BlockShape::RectBigRotated => "RectBig",
        }
    }

    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            BlockShape::RectFatRotated
                | BlockShape::RectTinyRotated
                | BlockShape::RectSmallRotated
                | BlockShape::RectMediumRotated
                | BlockShape::RectBigRotated
        )
    }
}

// ---------------------------------------------------------------------------
// Decorative shapes
// ---------------------------------------------------------------------------

/// Non-rectangular decorative pieces placed on top of structures. Their
/// footprint is still treated as an axis-aligned box for overlap purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DecorationKind {
    TriangleHole,
    Triangle,
    Circle,
    CircleSmall,
}

impl DecorationKind {
    pub const ALL: [DecorationKind; 4] = [
        DecorationKind::TriangleHole,
        DecorationKind::Triangle,
        DecorationKind::Circle,
        DecorationKind::CircleSmall,
    ];

    pub fn id(self) -> u8 {
        self as u8 + 1
    }

    pub fn size(self) -> Size {
        match self {
            DecorationKind::TriangleHole | DecorationKind::Triangle => Size::new(0.82, 0.82),
            DecorationKind::Circle => Size::new(0.8, 0.8),
            DecorationKind::CircleSmall => Size::new(0.45, 0.45),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DecorationKind::TriangleHole => "TriangleHole",
            DecorationKind::Triangle => "Triangle",
            DecorationKind::Circle => "Circle",
            DecorationKind::CircleSmall => "CircleSmall",
        }
    }
}

// ---------------------------------------------------------------------------
// Materials and birds
// ---------------------------------------------------------------------------

/// Block material, ordered from weakest to most resistant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Material {
    Wood,
    Ice,
    Stone,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Wood, Material::Ice, Material::Stone];

    pub fn id(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Material::Wood => "wood",
            Material::Ice => "ice",
            Material::Stone => "stone",
        }
    }

    /// The material that best survives a direct hit.
    pub fn most_resistant() -> Self {
        Material::Stone
    }
}

/// The five bird types handed to the player. The declaration order is the
/// tie-break order of the bird-sequence search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BirdType {
    Yellow,
    Blue,
    Black,
    Red,
    White,
}

impl BirdType {
    pub const ALL: [BirdType; 5] = [
        BirdType::Yellow,
        BirdType::Blue,
        BirdType::Black,
        BirdType::Red,
        BirdType::White,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}
