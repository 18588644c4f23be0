//! `lendtracker-client` is a resilient async HTTP client for the LendTracker
//! loan bookkeeping API.
//!
//! Every call resolves to a value or a classified [`LendTrackerError`]:
//! - reads go through [`LendTrackerClient::send_with_retry`] (timeout, retry
//!   with exponential backoff on timeouts, connection failures and 5xx)
//! - writes go through [`LendTrackerClient::send_once`] (timeout only, one
//!   attempt, fresh `Idempotency-Key`)
//! - [`LendTrackerClient::calculate_interest`] falls back to
//!   [`interest::calculate_locally`] when the server cannot answer

mod client;
mod error;
pub mod interest;
mod options;
mod request;
mod types;
mod wire;

pub use client::{LendTrackerClient, DEFAULT_API_BASE};
pub use error::{ErrorKind, LendTrackerError};
pub use options::RetryPolicy;
pub use request::{RawResponse, RequestDescriptor};
pub use reqwest::Method;
pub use types::{
    AdminStatus, AuthResponse, InterestCalculation, InterestFrequency, Loan, LoanInput,
    LoanSearch, LoanStatus, LoginRequest, PaymentHistoryEntry, PaymentType, ProfileUpdate,
    RegisterRequest,
};

pub type Result<T> = std::result::Result<T, LendTrackerError>;
