//! Route handlers grouped by resource.

/// Families and their students
pub mod families;
/// Fee records, dues, vouchers and payments
pub mod fees;
/// Receipt retrieval (authenticated and public)
pub mod receipts;
/// Income reports and the billing run
pub mod reports;
