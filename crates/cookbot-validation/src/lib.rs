//! # cookbot-validation
//!
//! Recipe auditors for the cookbot workshop.
//!
//! This crate provides:
//! - The [`Auditor`] seam and the model-backed auditors (logistics, nutrition)
//! - Tri-state verdict parsing (`Approved | Rejected | Malformed`)

mod auditor;
mod verdict;

pub use auditor::{AuditKind, Auditor, ModelAuditor};
pub use verdict::{Verdict, DEFAULT_REJECTION, UNREADABLE_RESPONSE};
