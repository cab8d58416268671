//! Human-readable sequential codes (`TS00001`, `GT00042`).
//!
//! A code is a fixed prefix followed by a zero-padded decimal suffix. The
//! next code is derived from the highest suffix currently stored; nothing is
//! reserved, so the write path re-checks uniqueness and retries on a lost
//! race.

pub mod allocator;
pub mod format;
pub mod guard;
pub mod scanner;

pub use allocator::{Allocator, DEFAULT_MAX_ATTEMPTS};
pub use format::{CodeFormat, ASSET_CODE, VOUCHER_NO};
pub use guard::{claim, ensure_unused};
pub use scanner::{max_suffix, CodeColumn, CodeStore};
