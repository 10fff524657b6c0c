// Unit name used for the fee/base asset of the chain
pub const COIN_UNIT: &str = "coin";

// Byte length of a policy id / script hash / key hash
pub const POLICY_ID_SIZE: usize = 28;
// Hex length of a policy id inside an asset unit
pub const POLICY_ID_HEX_SIZE: usize = POLICY_ID_SIZE * 2;
// Maximum byte length of an asset name
pub const MAX_ASSET_NAME_SIZE: usize = 32;

// Default test-ledger fee model: fee = base + per_byte * size
pub const DEFAULT_BASE_FEE: u64 = 155_381;
pub const DEFAULT_FEE_PER_BYTE: u64 = 44;

// Default execution budgets reported against by the test engine
pub const DEFAULT_MAX_TX_SIZE: usize = 16_384;
pub const DEFAULT_MAX_EX_CPU: u64 = 10_000_000_000;
pub const DEFAULT_MAX_EX_MEM: u64 = 14_000_000;
