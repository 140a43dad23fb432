//! Core business logic - framework-agnostic fee ledger operations.
//!
//! Every function takes a `SeaORM` connection (or transaction) and returns structured data;
//! nothing here knows about HTTP.

/// Monthly tuition billing run
pub mod billing;
/// Family admission, lookup and seeding
pub mod family;
/// Fee record creation, ids, ordering and reads
pub mod fee;
/// Outstanding dues per family
pub mod ledger;
/// Applying and reversing payments
pub mod payment;
/// Receipt reconstruction
pub mod receipt;
/// Income reports and printable formatting
pub mod report;
/// Student enrolment
pub mod student;
/// Pre-payment vouchers
pub mod voucher;
