/// Monetary constants
///
/// Amounts are whole coins. There is no fee market and no difficulty
/// schedule, so the only rule is the fixed reward a miner credits itself
/// for every solved block.
///
/// Coins minted by every coinbase transaction
pub const MINING_REWARD: u64 = 50;
