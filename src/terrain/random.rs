//! Seeded lattice lookup table shared by every noise query

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

/// log2 of the lattice table side length
pub const RANDOM_TABLE_BITS: u32 = 5;

/// Lattice table side length; lattice coordinates wrap modulo this value
pub const RANDOM_TABLE_SIDE: usize = 1 << RANDOM_TABLE_BITS;

/// Total number of entries in the lattice table
pub const RANDOM_TABLE_LEN: usize = RANDOM_TABLE_SIDE * RANDOM_TABLE_SIDE * RANDOM_TABLE_SIDE;

const RANDOM_TABLE_MASK: i32 = RANDOM_TABLE_SIDE as i32 - 1;

/// Read-only table of pseudo-random scalars in `[0, 1)`, indexed by
/// integer lattice coordinates.
///
/// Filled once from `seed`; every later lookup is a pure function of the
/// coordinates, so noise evaluation is repeatable from any thread.
#[derive(Clone)]
pub struct RandomContext {
    seed: u64,
    values: Box<[f32]>,
}

impl RandomContext {
    /// Build the lattice table for `seed`
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..RANDOM_TABLE_LEN)
            .map(|_| rng.r#gen::<f32>())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { seed, values }
    }

    /// Seed the table was built from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random value at lattice point, coordinates wrapped by bitmask
    #[inline]
    pub fn lattice(&self, x: i32, y: i32, z: i32) -> f32 {
        let index = (x & RANDOM_TABLE_MASK)
            | ((y & RANDOM_TABLE_MASK) << RANDOM_TABLE_BITS)
            | ((z & RANDOM_TABLE_MASK) << (2 * RANDOM_TABLE_BITS));
        self.values[index as usize]
    }
}

impl std::fmt::Debug for RandomContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomContext")
            .field("seed", &self.seed)
            .field("len", &self.values.len())
            .finish()
    }
}
