// FreeTalk Backend - Maintenance Tooling
//
// Membership integrity auditor: reads every club from the document store,
// flags user ids that appear more than once inside a single club's
// membership list, and prints a per-club report plus an aggregate summary.
//
// The audit is read-only. Repairs are handled by the separate
// fix-duplicate-clubs tool.

pub mod clubs;
pub mod config;
pub mod detect;
pub mod driver;
pub mod error;
pub mod report;
pub mod store;

pub use config::Config;
pub use error::AuditError;
