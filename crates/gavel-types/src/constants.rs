//! System-wide constants for the Gavel auction engine.

/// Default interval between deadline scheduler scans, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default scheduler lookahead window, in seconds. Auctions whose deadline
/// falls inside the window are candidates for the next scan.
pub const DEFAULT_LOOKAHEAD_SECS: u64 = 60;

/// Default settlement currency for payment holds.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Maximum attempts for a conditional store commit before giving up.
pub const MAX_COMMIT_RETRIES: u32 = 16;

/// Maximum bids retained per auction. Far above any realistic auction;
/// bounds memory for the append-only history.
pub const MAX_BIDS_PER_AUCTION: usize = 10_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Gavel";
