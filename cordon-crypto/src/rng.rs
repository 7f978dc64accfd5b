//! A small `Crng` trait alias plus the two RNG implementations the rest of
//! the workspace needs: a real OS-backed RNG and a seeded, deterministic RNG
//! for reproducible tests.

use rand_core::{CryptoRng, OsRng, RngCore, SeedableRng};

/// A trait alias for "a cryptographically secure RNG".
pub trait Crng: RngCore + CryptoRng {}
impl<R: RngCore + CryptoRng> Crng for R {}

/// Extension methods for generating common shapes of random data.
pub trait RngExt: Crng {
    fn gen_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        self.fill_bytes(&mut out);
        out
    }

    fn gen_u64(&mut self) -> u64 {
        self.next_u64()
    }
}
impl<R: Crng> RngExt for R {}

/// The OS-backed RNG used in production.
pub struct SysRng(rand::rngs::StdRng);

impl SysRng {
    pub fn new() -> Self {
        Self(rand::rngs::StdRng::from_rng(OsRng).expect("OS RNG failed"))
    }
}

impl Default for SysRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for SysRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.0.try_fill_bytes(dest)
    }
}
impl CryptoRng for SysRng {}

/// A fast, deterministic, *insecure* RNG for use in tests only, so property
/// tests are reproducible across runs.
pub struct FastRng(rand::rngs::StdRng);

impl FastRng {
    pub fn from_u64(seed: u64) -> Self {
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }
}

impl RngCore for FastRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.0.try_fill_bytes(dest)
    }
}
// Only used in tests, never for real secrets; still sound to mark as such
// since `StdRng` is a CSPRNG, just seeded non-secretly.
impl CryptoRng for FastRng {}

#[cfg(any(test, feature = "test-utils"))]
impl proptest::arbitrary::Arbitrary for FastRng {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::strategy::Strategy;
        proptest::arbitrary::any::<u64>()
            .prop_map(FastRng::from_u64)
            .boxed()
    }
}
