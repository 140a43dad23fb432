//! Income reporting and printable formatting.
//!
//! Income is the sum of fee records whose payment date falls in a period. Reversing a
//! payment clears the payment date, so a reversed fee drops out of income automatically.
//! The formatting helpers render receipts as plain text for printing.

use crate::{
    core::receipt::Receipt,
    entities::{Fee, FeeStatus, fee},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Income collected over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeSummary {
    /// Start of the period (inclusive)
    pub from: DateTime<Utc>,
    /// End of the period (exclusive)
    pub to: DateTime<Utc>,
    /// Total collected
    pub total: f64,
    /// Number of distinct receipts
    pub receipt_count: usize,
    /// Number of fee records settled
    pub fee_count: usize,
    /// Total collected per payment method
    pub by_method: BTreeMap<String, f64>,
}

/// Summarises paid records whose payment date lies in `[from, to)`.
#[must_use]
pub fn summarize_income(
    fees: &[fee::Model],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> IncomeSummary {
    let mut receipts = BTreeSet::new();
    let mut by_method: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;
    let mut fee_count = 0;

    for fee in fees.iter().filter(|f| f.status == FeeStatus::Paid) {
        let Some(paid_at) = fee.payment_date else {
            continue;
        };
        if paid_at < from || paid_at >= to {
            continue;
        }

        total += fee.amount;
        fee_count += 1;
        if let Some(receipt_id) = &fee.receipt_id {
            receipts.insert(receipt_id.as_str());
        }
        let method = fee.payment_method.clone().unwrap_or_default();
        *by_method.entry(method).or_default() += fee.amount;
    }

    IncomeSummary {
        from,
        to,
        total,
        receipt_count: receipts.len(),
        fee_count,
        by_method,
    }
}

/// Loads the income collected in `[from, to)`.
pub async fn income_between<C>(
    db: &C,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<IncomeSummary>
where
    C: ConnectionTrait,
{
    if to <= from {
        return Err(Error::Validation {
            message: format!("Report period is empty: {from} to {to}"),
        });
    }

    let fees = Fee::find()
        .filter(fee::Column::Status.eq(FeeStatus::Paid))
        .filter(fee::Column::PaymentDate.gte(from))
        .filter(fee::Column::PaymentDate.lt(to))
        .all(db)
        .await?;

    Ok(summarize_income(&fees, from, to))
}

/// Formats an amount with two decimals and thousands separators, e.g. `12,500.00`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// Formats one fee record as a receipt or voucher line.
#[must_use]
pub fn format_fee_line(fee: &fee::Model) -> String {
    format!("{} {:<16} {:>12}", fee.year, fee.month, format_amount(fee.amount))
}

/// Renders a receipt as printable plain text.
#[must_use]
pub fn format_receipt_text(receipt: &Receipt, school_name: &str) -> String {
    use std::fmt::Write;

    // Writing to a String cannot fail
    let mut text = String::new();
    if !school_name.is_empty() {
        let _ = writeln!(text, "{school_name}");
    }
    let _ = writeln!(text, "Receipt {}", receipt.receipt_id);
    let _ = writeln!(
        text,
        "Family: {} ({}) - {}",
        receipt.family.name, receipt.family.id, receipt.family.guardian_name
    );
    for student in &receipt.students {
        let _ = writeln!(text, "Student: {} - {}", student.name, student.class_name);
    }
    if let Some(date) = receipt.payment_date {
        let _ = writeln!(text, "Paid on: {}", date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(method) = &receipt.payment_method {
        let _ = writeln!(text, "Method: {method}");
    }

    text.push('\n');
    for fee in &receipt.paid_fees {
        let _ = writeln!(text, "{}", format_fee_line(fee));
    }
    text.push('\n');

    let _ = writeln!(text, "Dues before payment: {}", format_amount(receipt.total_dues_before));
    let _ = writeln!(text, "Amount paid:         {}", format_amount(receipt.amount_paid));
    let _ = writeln!(text, "Remaining dues:      {}", format_amount(receipt.remaining_dues));

    text
}
