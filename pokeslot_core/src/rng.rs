use hmac::{Hmac, Mac};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::{Digest, Sha256};

// Provably-fair draws: HMAC-SHA256(server_seed, "client_seed:nonce") seeds a byte
// stream; each 4-byte big-endian chunk maps to a float in [0,1). When the stream
// runs dry it is replaced by the SHA-256 of itself.

pub type HmacSha256 = Hmac<Sha256>;

/// Source of uniform draws consumed by the outcome generator.
pub trait RandomSource {
    /// Uniform float in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        let scaled = (self.next_unit() * len as f64).floor() as usize;
        scaled.min(len - 1)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn next_index(&mut self, len: usize) -> usize {
        (**self).next_index(len)
    }
}

pub fn derive_hash_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

pub fn derive_floats(seed_bytes: &[u8], count: usize) -> Vec<f64> {
    let mut stream = FairStream::from_bytes(seed_bytes.to_vec());
    (0..count).map(|_| stream.next_unit()).collect()
}

/// Deterministic stream of draws derived from a seed buffer.
#[derive(Debug, Clone)]
pub struct FairStream {
    buffer: Vec<u8>,
    cursor: usize,
}

impl FairStream {
    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, cursor: 0 }
    }

    fn next_u32(&mut self) -> u32 {
        if self.cursor + 4 > self.buffer.len() {
            self.buffer = Sha256::digest(&self.buffer).to_vec();
            self.cursor = 0;
        }
        let chunk = &self.buffer[self.cursor..self.cursor + 4];
        self.cursor += 4;
        u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
    }
}

impl RandomSource for FairStream {
    fn next_unit(&mut self) -> f64 {
        (self.next_u32() as f64) / (u32::MAX as f64 + 1.0)
    }
}

pub struct ProvablyFairRng {
    pub server_seed: String, // secret
    pub client_seed: String,
    pub nonce: u64,
}

impl ProvablyFairRng {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>, nonce: u64) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
            nonce,
        }
    }

    pub fn server_seed_hash_hex(&self) -> String {
        derive_hash_hex(self.server_seed.as_bytes())
    }

    pub fn hmac_bytes(&self) -> [u8; 32] {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.server_seed.as_bytes())
            .expect("HMAC accepts keys of any length");
        let msg = format!("{}:{}", self.client_seed, self.nonce);
        mac.update(msg.as_bytes());
        let res = mac.finalize().into_bytes();
        let mut out = [0u8; 32];
        out.copy_from_slice(&res);
        out
    }

    pub fn stream(&self) -> FairStream {
        FairStream::from_bytes(self.hmac_bytes().to_vec())
    }

    pub fn next_floats(&self, count: usize) -> Vec<f64> {
        derive_floats(&self.hmac_bytes(), count)
    }
}

/// Non-reproducible draws from the OS, or reproducible ones from a fixed seed.
#[derive(Debug, Clone)]
pub struct EntropySource(StdRng);

impl EntropySource {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for EntropySource {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of draws, cycling.
    struct Scripted(Vec<f64>, usize);

    impl RandomSource for Scripted {
        fn next_unit(&mut self) -> f64 {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v
        }
    }

    #[test]
    fn test_determinism() {
        let rng1 = ProvablyFairRng::new("server", "client", 1);
        let rng2 = ProvablyFairRng::new("server", "client", 1);
        assert_eq!(rng1.server_seed_hash_hex(), rng2.server_seed_hash_hex());
        assert_eq!(rng1.hmac_bytes().to_vec(), rng2.hmac_bytes().to_vec());
        assert_eq!(rng1.next_floats(5), rng2.next_floats(5));
    }

    #[test]
    fn nonce_changes_stream() {
        let a = ProvablyFairRng::new("server", "client", 1).next_floats(4);
        let b = ProvablyFairRng::new("server", "client", 2).next_floats(4);
        assert_ne!(a, b);
    }

    #[test]
    fn stream_extends_past_digest() {
        // 32 bytes give 8 draws; the rest comes from re-hashing.
        let floats = ProvablyFairRng::new("s", "c", 0).next_floats(40);
        assert_eq!(floats.len(), 40);
        assert!(floats.iter().all(|f| (0.0..1.0).contains(f)));
    }

    #[test]
    fn stream_matches_next_floats() {
        let rng = ProvablyFairRng::new("s", "c", 9);
        let mut stream = rng.stream();
        let drawn: Vec<f64> = (0..12).map(|_| stream.next_unit()).collect();
        assert_eq!(drawn, rng.next_floats(12));
    }

    #[test]
    fn index_never_leaves_range() {
        let mut edge = Scripted(vec![0.0, 0.999_999_999_999, 0.5], 0);
        for _ in 0..9 {
            assert!(edge.next_index(6) < 6);
        }
        let mut entropy = EntropySource::seeded(3);
        for _ in 0..1_000 {
            assert!(entropy.next_index(5) < 5);
        }
    }

    #[test]
    fn seeded_entropy_is_reproducible() {
        let mut a = EntropySource::seeded(42);
        let mut b = EntropySource::seeded(42);
        for _ in 0..16 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }
}
