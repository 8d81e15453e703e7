//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through a `RandomSource`: either a `SubsystemRng`
//! derived from the single master seed stored on the run record, or a
//! `ScriptedRng` that replays fixed draws in tests.
//!
//! Each consumer gets its own stream, seeded deterministically from
//! (master_seed XOR slot_index). This means:
//!   - Adding a new slot never changes existing streams.
//!   - A vote roll never shifts which question is picked next.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// The randomness the simulation is allowed to consume.
pub trait RandomSource: Send {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Roll an index in [0, n). `n` must be > 0.
    fn next_index(&mut self, n: usize) -> usize;
}

/// Fisher-Yates shuffle driven by a `RandomSource`.
pub fn shuffle<T>(rng: &mut dyn RandomSource, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// A named, deterministic RNG for a single consumer.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create an RNG from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl RandomSource for SubsystemRng {
    fn next_f64(&mut self) -> f64 {
        let bits = self.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn next_index(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        (self.next_u64() % n as u64) as usize
    }
}

/// Replays a fixed list of draws in [0.0, 1.0), cycling when exhausted.
///
/// `next_index(n)` maps a draw `u` to `floor(u * n)`, so a draw of 0.0
/// always selects the first candidate.
pub struct ScriptedRng {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "ScriptedRng needs at least one draw");
        Self { draws, cursor: 0 }
    }

    /// Every draw returns `u`.
    pub fn constant(u: f64) -> Self {
        Self::new(vec![u])
    }
}

impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        let u = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        u
    }

    fn next_index(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }
}

/// All RNG streams for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_slot(&self, slot: RngSlot) -> SubsystemRng {
        let rng = SubsystemRng::new(self.master_seed, slot as u64).with_name(slot.name());
        log::debug!("rng stream '{}' seeded (slot {})", rng.name, slot as u64);
        rng
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Quiz = 0,
    Vote = 1,
    /// Simulated player in the headless runner.
    Autoplay = 2,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Vote => "vote",
            Self::Autoplay => "autoplay",
        }
    }
}
