// Deterministic random stream for level generation.
//
// `LevelRng` is xoshiro256++ (Blackman & Vigna, 2019) seeded through
// SplitMix64. Every stochastic decision in `slingworks_gen` draws from one
// stream, and the order of those draws is part of the generator's contract:
// replaying a seed replays the level only if every stage consumes values in
// the same sequence.
//
// Stages never name `LevelRng` directly. They take `&mut dyn RandomSource`,
// so tests can hand in a `ScriptedRng` that replays a fixed list of values
// and pins a particular branch of the search (e.g. "choose exactly one peak").
//
// **Critical constraint: determinism.** The float helpers are derived from
// `next_u64` with fixed bit widths, so identical state yields identical
// floats on every platform. Integer helpers take the high bits of a draw, so
// `randint`/`index` agree with `floor(next_f64() * span)` on scripted input.

use serde::{Deserialize, Serialize};

/// A source of uniformly distributed `u64`s plus the derived helpers the
/// generator uses. Only `next_u64` is required.
pub trait RandomSource {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform `f64` in [0, 1) from the top 53 bits.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform `f64` in `[low, high)`. A degenerate range returns `low`
    /// but still consumes one draw, keeping the stream aligned.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Uniform integer in `[low, high]`, inclusive on both ends.
    ///
    /// Rejection sampling avoids modulo bias. Panics if `low > high`.
    fn randint(&mut self, low: i64, high: i64) -> i64 {
        assert!(low <= high, "randint: low must be <= high");
        let span = (high - low) as u64 + 1;
        low + bounded(self, span) as i64
    }

    /// Uniform index in `[0, len)`. Panics if `len == 0`.
    fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "index: empty range");
        bounded(self, len as u64) as usize
    }

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Uniform value in `[0, span)` (Lemire's widening multiply with rejection).
///
/// The result comes from the high bits of the draw, so a draw that maps to
/// unit float `f` yields `floor(f * span)`. Scripted streams rely on this.
fn bounded<R: RandomSource + ?Sized>(rng: &mut R, span: u64) -> u64 {
    if span == 0 {
        // `span` wrapped: the caller asked for the full u64 range.
        return rng.next_u64();
    }
    let mut m = (rng.next_u64() as u128) * (span as u128);
    let mut low = m as u64;
    if low < span {
        let threshold = span.wrapping_neg() % span; // = (2^64 - span) % span
        while low < threshold {
            m = (rng.next_u64() as u128) * (span as u128);
            low = m as u64;
        }
    }
    (m >> 64) as u64
}

/// Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T, R: RandomSource + ?Sized>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.index(i + 1);
        items.swap(i, j);
    }
}

/// Xoshiro256++ state: the generator's production random stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRng {
    s: [u64; 4],
}

impl LevelRng {
    /// Seed a stream from a single `u64`. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive an independent stream for a sub-run (e.g. level `n` of a
    /// batch) without disturbing this one beyond a single draw.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }
}

impl RandomSource for LevelRng {
    fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

/// SplitMix64 step, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// A recorded stream that replays a fixed list of raw values, cycling when
/// exhausted. Used to steer the generator down a known path in tests.
///
/// An empty script asserts that nothing is drawn: the first draw panics.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    values: Vec<u64>,
    pos: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<u64>) -> Self {
        Self { values, pos: 0 }
    }

    /// Build a stream whose `next_f64` calls return the given unit floats
    /// (each truncated to 53 bits of precision). Integer helpers map the
    /// same value `f` to `floor(f * span)`.
    pub fn from_unit_floats(floats: &[f64]) -> Self {
        let values = floats
            .iter()
            .map(|&f| {
                let clamped = f.clamp(0.0, 1.0 - f64::EPSILON);
                // Never exactly zero: a zero draw is always rejected by
                // `bounded` and a cycling script would spin forever.
                (((clamped * (1u64 << 53) as f64) as u64) << 11).max(1)
            })
            .collect();
        Self::new(values)
    }

    /// Number of values consumed so far.
    pub fn draws(&self) -> usize {
        self.pos
    }
}

impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        assert!(!self.values.is_empty(), "ScriptedRng: draw from an empty script");
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}
