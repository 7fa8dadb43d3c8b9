//! Simulates segment loss on a link.
//!
//! The decision is purely deterministic, driven by a seeded generator, so that a lossy run can be
//! repeated exactly.

/// Simple pseudo-random loss.
///
/// Can simulate burst losses and uniform losses by dropping segments based on a pulse design. A
/// segment is only ever lost while the pulse is high, and then with probability `lossrate`.
#[derive(Copy, Clone, Debug, Hash)]
pub struct PrngLoss {
    /// Segments are only lost while `count` is below the threshold.
    pub threshold: u32,
    /// Position within the pulse, counting down.
    pub count: u32,
    /// Reset value for `count` when it reaches `0`.
    pub reset: u32,
    /// Loss rate as a (0, 32)-bit fixed point number.
    ///
    /// Or `None` for no loss at all, which can be used to temporarily turn loss off.
    pub lossrate: Option<u32>,
    /// The current prng state (or seed at the start).
    pub prng: Xoroshiro256,
}

/// The xoshiro256** generator.
///
/// Far better than what loss decisions need but small and fast.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Xoroshiro256 {
    state: [u64; 4],
}

impl PrngLoss {
    /// A loss simulator that never loses anything.
    pub fn none() -> Self {
        PrngLoss::uniform(None, 0)
    }

    /// A uniform loss simulator.
    pub fn uniform(rate: Option<u32>, seed: u64) -> Self {
        PrngLoss {
            // Threshold always greater than count
            threshold: 1,
            count: 0,
            reset: 0,
            lossrate: rate,
            prng: Xoroshiro256::new(seed),
        }
    }

    /// A uniform loss simulator losing a fraction of all segments.
    ///
    /// The fraction is clamped into `[0, 1]`, a fraction of zero disables loss entirely.
    pub fn with_fraction(fraction: f64, seed: u64) -> Self {
        let rate = if fraction > 0.0 {
            let fixed = fraction.min(1.0) * f64::from(u32::max_value());
            Some(fixed as u32)
        } else {
            None
        };
        PrngLoss::uniform(rate, seed)
    }

    /// Simulate burst losses as pulses.
    ///
    /// Of every `length` segments the last `high` are lost. A `length` of zero is treated as one
    /// and `high` is bounded by the length.
    pub fn pulsed(high: u32, length: u32) -> Self {
        let length = length.max(1);
        PrngLoss {
            threshold: high.min(length),
            count: length - 1,
            reset: length - 1,
            // Segment always lost when pulse condition is true.
            lossrate: Some(u32::max_value()),
            prng: Xoroshiro256::new(0),
        }
    }

    /// Determine if the next segment is lost.
    pub fn lose(&mut self) -> bool {
        let in_window = self.count < self.threshold;
        let fate = Some(self.roll()) <= self.lossrate;

        self.count = self.count.checked_sub(1)
            .unwrap_or(self.reset);

        fate & in_window
    }

    /// Generate the next value of the prng.
    fn roll(&mut self) -> u32 {
        (self.prng.next() & u64::from(!0u32)) as u32
    }
}

impl Default for PrngLoss {
    fn default() -> Self {
        PrngLoss::none()
    }
}

impl Xoroshiro256 {
    /// Seed the generator.
    ///
    /// A seed of `0` would make the all-zero state, which is the single fixed point of the
    /// generator. It is replaced by a constant.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Xoroshiro256 {
            state: [seed, 0, 0, 0],
        }
    }

    /// The next pseudo-random value.
    pub fn next(&mut self) -> u64 {
        let s = &mut self.state;
        let result = s[1]
            .wrapping_mul(5)
            .rotate_left(7)
            .wrapping_mul(9);

        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;

        s[3] = s[3].rotate_left(45);

        result
    }
}
