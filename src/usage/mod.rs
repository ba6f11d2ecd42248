//! Usage accounting: the persisted per-day counter and the quota decision

pub mod gate;
pub mod store;

pub use gate::{QuotaExceeded, QuotaGate};
pub use store::{JsonFileUsageStore, MemoryUsageStore, UsageRecord, UsageStore};
