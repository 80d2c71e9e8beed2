pub mod chain;
pub mod clock;
pub mod constants;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub use chain::{Chain, SharedChain};
pub use clock::{Clock, ManualClock, SystemClock};

/// Reasons a candidate block is refused by the chain.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("structural mismatch: {reason}")]
    StructuralMismatch { reason: String },

    #[error("linkage mismatch on {field}: expected {expected}, found {found}")]
    LinkageMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("hash mismatch: expected {expected}, found {found}")]
    HashMismatch { expected: String, found: String },

    #[error("chain contains no blocks")]
    EmptyChain,

    #[error("first block is not the genesis block")]
    GenesisMismatch,
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Digest of a block's contents: SHA-256 over the decimal index, the previous
/// hash, the decimal timestamp and the payload, in that order with no
/// separators. Returned as lowercase hex.
pub fn compute_hash(index: u64, previous_hash: &str, timestamp: u64, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// One link of the chain. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    hash: String,
    previous_hash: String,
    #[serde(rename = "data")]
    payload: String,
    timestamp: u64,
}

impl Block {
    /// Build a block whose hash is derived from the other four fields.
    pub fn seal(
        index: u64,
        previous_hash: impl Into<String>,
        timestamp: u64,
        payload: impl Into<String>,
    ) -> Self {
        let previous_hash = previous_hash.into();
        let payload = payload.into();
        let hash = compute_hash(index, &previous_hash, timestamp, &payload);
        Self {
            index,
            hash,
            previous_hash,
            payload,
            timestamp,
        }
    }

    /// Build a block from raw fields without deriving the hash. Used for the
    /// genesis seed and for blocks received from elsewhere; the chain decides
    /// whether they are acceptable.
    pub fn from_parts(
        index: u64,
        hash: impl Into<String>,
        previous_hash: impl Into<String>,
        payload: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            index,
            hash: hash.into(),
            previous_hash: previous_hash.into(),
            payload: payload.into(),
            timestamp,
        }
    }

    /// Decode a block from an untyped JSON value, rejecting anything whose
    /// fields are missing or of the wrong type.
    pub fn from_value(value: &Value) -> Result<Self> {
        if let Some(reason) = structure_fault(value) {
            return Err(ChainError::StructuralMismatch { reason });
        }
        serde_json::from_value(value.clone()).map_err(|e| ChainError::StructuralMismatch {
            reason: e.to_string(),
        })
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Hash the block's stated fields again, ignoring the stored hash.
    pub fn recompute_hash(&self) -> String {
        compute_hash(self.index, &self.previous_hash, self.timestamp, &self.payload)
    }

    /// Shape check for a typed block. Every field already has its type fixed
    /// by the struct, so any `Block` passes; untyped input goes through
    /// [`validate_structure`].
    pub fn validate_structure(&self) -> bool {
        true
    }
}

/// Shape check for an untyped block: all five fields present with the
/// expected JSON types. Never panics.
pub fn validate_structure(value: &Value) -> bool {
    structure_fault(value).is_none()
}

fn structure_fault(value: &Value) -> Option<String> {
    let Some(obj) = value.as_object() else {
        return Some("block is not a JSON object".to_string());
    };
    let fields: [(&str, fn(&Value) -> bool, &str); 5] = [
        ("index", Value::is_u64, "a non-negative integer"),
        ("hash", Value::is_string, "a string"),
        ("previous_hash", Value::is_string, "a string"),
        ("data", Value::is_string, "a string"),
        ("timestamp", Value::is_u64, "a non-negative integer"),
    ];
    for (name, check, expected) in fields {
        match obj.get(name) {
            None => return Some(format!("missing field `{name}`")),
            Some(v) if !check(v) => return Some(format!("field `{name}` must be {expected}")),
            Some(_) => {}
        }
    }
    None
}
