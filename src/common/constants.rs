//! Crate-wide sentinels and build-time constants.

/// Size in bytes of a single page. Every frame, disk read, and disk write
/// deals in units of exactly this many bytes.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel `page_id` meaning "no page" (e.g. an uninitialized slot).
pub const INVALID_PAGE_ID: i64 = -1;

/// Sentinel transaction id, kept for interface parity with the transaction
/// manager this crate's buffer pool is meant to sit underneath. Unused by
/// this crate's own logic.
#[allow(dead_code)]
pub const INVALID_TXN_ID: i64 = -1;
