//! Identifier, name and MAC address generation.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const HEX_DIGITS: &[u8] = b"0123456789abcdef";

/// Length of the random part of generated display names.
pub const NAME_LENGTH: usize = 12;

/// Source of resource ids, display names and MAC addresses.
///
/// Ids are UUIDs built from the generator's own RNG, so a seeded generator
/// replays the same sequence. Every id handed out is remembered and never
/// issued twice by the same generator.
#[derive(Debug)]
pub struct IdGenerator {
    rng: StdRng,
    issued: HashSet<String>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            issued: HashSet::new(),
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    /// Allocate a fresh resource id.
    pub fn generate_id(&mut self) -> String {
        loop {
            let id = self.random_uuid();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Tenant id for an emulator that was not given one.
    pub fn generate_tenant_id(&mut self) -> String {
        self.random_uuid()
    }

    /// `prefix` followed by `length` random lowercase letters.
    pub fn generate_name(&mut self, prefix: &str, length: usize) -> String {
        let mut name = String::with_capacity(prefix.len() + length);
        name.push_str(prefix);
        name.push_str(&self.random_string(LOWERCASE, length));
        name
    }

    /// Random MAC address, e.g. `fa:16:3e:0b:9c:41`.
    pub fn generate_mac(&mut self) -> String {
        let digits = self.random_string(HEX_DIGITS, 12);
        digits
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(":")
    }

    fn random_uuid(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes[..]);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    fn random_string(&mut self, alphabet: &[u8], length: usize) -> String {
        (0..length)
            .map(|_| alphabet[self.rng.gen_range(0..alphabet.len())] as char)
            .collect()
    }
}
