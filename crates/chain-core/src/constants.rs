pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

// Genesis seed. The hash is a fixed value, not derived from the other fields.
pub const GENESIS_INDEX: u64 = 0;
pub const GENESIS_HASH: &str = "12345";
pub const GENESIS_PREVIOUS_HASH: &str = "";
pub const GENESIS_PAYLOAD: &str = "Hello";
pub const GENESIS_TIMESTAMP: u64 = 123_456;
