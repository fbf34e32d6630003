use crc32fast::Hasher;

/// Derive a stable store id from a store name using CRC32.
pub fn get_store_id(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes within one store.
///
/// Ids are `<seed>-<counter>`. The counter only ever advances, so ids stay
/// unique for the lifetime of the generator even across undo/redo (restored
/// stores never cause id reuse as long as the same generator keeps minting).
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(name: &str) -> Self {
        Self {
            seed: get_store_id(name),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Mint the next id.
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
