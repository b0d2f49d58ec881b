//! blake3 content digests, used to correlate rejected filters across logs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const SHORT_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn of(bytes: &[u8]) -> Self {
        Digest(*blake3::hash(bytes).as_bytes())
    }

    /// Digest of the compact JSON rendering. Object keys come out sorted, so
    /// equal documents digest equally regardless of insertion order.
    pub fn of_json(value: &Value) -> Self {
        Self::of(value.to_string().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// Leading hex characters, enough to tell log lines apart.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_LEN);
        hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
