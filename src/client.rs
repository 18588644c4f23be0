use std::fmt;
use std::time::Duration;

use reqwest::header;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    interest::calculate_locally,
    wire::{ChangePasswordBody, EmailBody, PaymentBody, ResetPasswordBody, VerifyEmailBody},
    AdminStatus, AuthResponse, InterestCalculation, LendTrackerError, Loan, LoanInput,
    LoanSearch, LoginRequest, PaymentHistoryEntry, ProfileUpdate, RawResponse, RegisterRequest,
    RequestDescriptor, Result, RetryPolicy,
};

/// Base URL of a locally running backend.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

#[derive(Clone)]
/// HTTP client for the LendTracker REST API.
///
/// One instance belongs to one session: the bearer token is fixed at
/// construction. Use [`LendTrackerClient::with_token`] after login and
/// [`LendTrackerClient::without_token`] after logout; both share the
/// underlying connection pool.
///
/// Reads are retried with exponential backoff. Writes are sent exactly once
/// with a timeout and a fresh `Idempotency-Key` header.
pub struct LendTrackerClient {
    http: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
    options: RetryPolicy,
}

impl fmt::Debug for LendTrackerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LendTrackerClient")
            .field("base_url", &self.base_url)
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl LendTrackerClient {
    /// Creates an anonymous client for the API rooted at `base_url`.
    ///
    /// Example: `"https://lend.example.com/api"`. A trailing `/` is ignored.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_owned(),
            authorization: None,
            options: RetryPolicy::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `LENDTRACKER_API_URL` — API base URL (e.g. `http://localhost:8080/api`)
    /// - `LENDTRACKER_TOKEN` — optional session token (Bearer prefix optional)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lendtracker_client::LendTrackerClient;
    ///
    /// let api = LendTrackerClient::from_env().expect("missing LENDTRACKER_API_URL");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = std::env::var("LENDTRACKER_API_URL")
            .map_err(|_| "missing LENDTRACKER_API_URL environment variable".to_owned())?;
        if url.trim().is_empty() {
            return Err("LENDTRACKER_API_URL is set but empty".to_owned());
        }
        let client = Self::new(url);
        match std::env::var("LENDTRACKER_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Ok(client.with_token(token)),
            _ => Ok(client),
        }
    }

    /// Returns a client for the session identified by `token`.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn with_token(self, token: impl AsRef<str>) -> Self {
        Self {
            authorization: Some(normalize_bearer_authorization(token.as_ref())),
            ..self
        }
    }

    /// Returns an anonymous client sharing this client's connection pool.
    pub fn without_token(self) -> Self {
        Self {
            authorization: None,
            ..self
        }
    }

    /// Applies timeout and retry settings used by every endpoint method.
    pub fn with_options(mut self, opts: RetryPolicy) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &RetryPolicy {
        &self.options
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }

    /// Performs a single attempt bounded by `timeout`.
    ///
    /// Any status is returned as a [`RawResponse`]; only transport failures
    /// are errors (`Timeout`, `Network` or `Unknown`). The deadline covers
    /// the response body as well as the headers.
    pub async fn send_once(
        &self,
        descriptor: &RequestDescriptor,
        timeout: Duration,
    ) -> Result<RawResponse> {
        let mut request = self
            .http
            .request(descriptor.method.clone(), self.url(&descriptor.path))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(timeout);

        if !descriptor.query.is_empty() {
            request = request.query(&descriptor.query);
        }
        if descriptor.authenticated {
            if let Some(authorization) = &self.authorization {
                request = request.header(header::AUTHORIZATION, authorization);
            }
        }
        if let Some(key) = &descriptor.idempotency_key {
            request = request.header(IDEMPOTENCY_KEY, key);
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let key = descriptor.idempotency_key();
        let response = request
            .send()
            .await
            .map_err(|err| LendTrackerError::from_transport(err, key))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| LendTrackerError::from_transport(err, key))?;

        Ok(RawResponse { status, body })
    }

    /// Performs up to `policy.max_retries + 1` attempts of [`Self::send_once`].
    ///
    /// Timeouts, connection failures and 5xx statuses are retried after
    /// `retry_delay_ms * 2^attempt`. Any other status, 4xx included, is
    /// returned as-is on the first attempt. When attempts run out the last
    /// failure is returned, 5xx as [`LendTrackerError::Server`].
    ///
    /// Requests are not deduplicated across attempts; meant for reads.
    pub async fn send_with_retry(
        &self,
        descriptor: &RequestDescriptor,
        policy: &RetryPolicy,
    ) -> Result<RawResponse> {
        let mut attempt = 0usize;
        loop {
            let failure = match self.send_once(descriptor, policy.timeout()).await {
                Ok(response) if response.is_server_error() => LendTrackerError::Server {
                    status: response.status,
                    body: response.body,
                },
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempt >= policy.max_retries {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    path = %descriptor.path,
                    attempts = attempt + 1,
                    error = %failure,
                    "giving up on request"
                );
                return Err(failure);
            }

            let delay = policy.backoff_delay(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                path = %descriptor.path,
                attempt = attempt + 1,
                max_attempts = policy.max_attempts(),
                kind = ?failure.kind(),
                "retrying request after {} ms",
                delay.as_millis()
            );

            sleep(delay).await;
            attempt += 1;
        }
    }

    // ==================== AUTH ====================
    //
    // Auth endpoints report success in the body, so the status is not checked.

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let descriptor = RequestDescriptor::post("/auth/register")
            .unauthenticated()
            .json(request)?;
        self.write(descriptor).await?.json()
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let descriptor = RequestDescriptor::post("/auth/login")
            .unauthenticated()
            .json(request)?;
        self.write(descriptor).await?.json()
    }

    pub async fn forgot_password(&self, email: &str) -> Result<serde_json::Value> {
        let descriptor = RequestDescriptor::post("/auth/forgot-password")
            .unauthenticated()
            .json(&EmailBody { email })?;
        self.write(descriptor).await?.json()
    }

    /// Returns `{"valid": bool, ...}`.
    pub async fn validate_reset_token(&self, token: &str) -> Result<serde_json::Value> {
        let descriptor = RequestDescriptor::get("/auth/validate-reset-token")
            .unauthenticated()
            .query("token", token);
        self.read(descriptor).await?.json()
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<serde_json::Value> {
        let descriptor = RequestDescriptor::post("/auth/reset-password")
            .unauthenticated()
            .json(&ResetPasswordBody {
                token,
                new_password,
            })?;
        self.write(descriptor).await?.json()
    }

    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<AuthResponse> {
        let descriptor = RequestDescriptor::post("/auth/verify-email")
            .unauthenticated()
            .json(&VerifyEmailBody { email, otp })?;
        self.write(descriptor).await?.json()
    }

    /// Asks the backend to email a new verification OTP to the session user.
    pub async fn resend_verification_otp(&self) -> Result<AuthResponse> {
        self.write(RequestDescriptor::post("/auth/send-verification-otp"))
            .await?
            .json()
    }

    pub async fn current_user(&self) -> Result<serde_json::Value> {
        self.fetch(RequestDescriptor::get("/auth/me"), "failed to fetch profile")
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<serde_json::Value> {
        let descriptor = RequestDescriptor::put("/auth/profile").json(update)?;
        self.write(descriptor).await?.json()
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<serde_json::Value> {
        let descriptor = RequestDescriptor::put("/auth/password").json(&ChangePasswordBody {
            current_password,
            new_password,
        })?;
        self.write(descriptor).await?.json()
    }

    // ==================== LOANS ====================

    pub async fn get_loans(&self) -> Result<Vec<Loan>> {
        self.fetch(RequestDescriptor::get("/loans"), "failed to fetch loans")
            .await
    }

    pub async fn get_active_loans(&self) -> Result<Vec<Loan>> {
        self.fetch(
            RequestDescriptor::get("/loans/active"),
            "failed to fetch active loans",
        )
        .await
    }

    pub async fn get_loan(&self, id: i64) -> Result<Loan> {
        self.fetch(
            RequestDescriptor::get(format!("/loans/{id}")),
            "failed to fetch loan",
        )
        .await
    }

    pub async fn search_loans(&self, search: &LoanSearch) -> Result<Vec<Loan>> {
        let descriptor = RequestDescriptor::get("/loans/search")
            .query_opt("q", search.q.as_deref().filter(|q| !q.is_empty()))
            .query_opt("status", search.status.map(|status| status.as_str()))
            .query_opt("frequency", search.frequency.map(|frequency| frequency.as_str()))
            .query_opt("minAmount", search.min_amount)
            .query_opt("maxAmount", search.max_amount)
            .query_opt("minRate", search.min_rate)
            .query_opt("maxRate", search.max_rate)
            .query_opt("fromDate", search.from_date.as_deref())
            .query_opt("toDate", search.to_date.as_deref());
        self.fetch(descriptor, "failed to search loans").await
    }

    /// Loan counts grouped by status and by frequency.
    pub async fn get_filter_counts(&self) -> Result<serde_json::Value> {
        self.fetch(
            RequestDescriptor::get("/loans/filter-counts"),
            "failed to get filter counts",
        )
        .await
    }

    pub async fn get_dashboard(&self) -> Result<serde_json::Value> {
        self.fetch(
            RequestDescriptor::get("/loans/dashboard"),
            "failed to fetch dashboard",
        )
        .await
    }

    pub async fn create_loan(&self, loan: &LoanInput) -> Result<Loan> {
        let descriptor = RequestDescriptor::post("/loans").json(loan)?;
        self.mutate(descriptor, "failed to create loan").await
    }

    pub async fn update_loan(&self, id: i64, loan: &LoanInput) -> Result<Loan> {
        let descriptor = RequestDescriptor::put(format!("/loans/{id}")).json(loan)?;
        self.mutate(descriptor, "failed to update loan").await
    }

    pub async fn delete_loan(&self, id: i64) -> Result<()> {
        let response = self
            .write(RequestDescriptor::delete(format!("/loans/{id}")))
            .await?;
        ensure_success(response, "failed to delete loan").map(|_| ())
    }

    /// Records an interest payment; `payment_date` is `YYYY-MM-DD`.
    pub async fn receive_interest(
        &self,
        id: i64,
        amount: f64,
        payment_date: &str,
        notes: Option<&str>,
    ) -> Result<Loan> {
        let descriptor = RequestDescriptor::post(format!("/loans/{id}/receive-interest")).json(
            &PaymentBody {
                amount,
                payment_date,
                notes,
            },
        )?;
        self.mutate(descriptor, "failed to record interest").await
    }

    /// Records a principal repayment; `payment_date` is `YYYY-MM-DD`.
    pub async fn receive_principal(
        &self,
        id: i64,
        amount: f64,
        payment_date: &str,
        notes: Option<&str>,
    ) -> Result<Loan> {
        let descriptor = RequestDescriptor::post(format!("/loans/{id}/receive-principal")).json(
            &PaymentBody {
                amount,
                payment_date,
                notes,
            },
        )?;
        self.mutate(descriptor, "failed to record principal").await
    }

    pub async fn get_payment_history(&self, loan_id: i64) -> Result<Vec<PaymentHistoryEntry>> {
        self.fetch(
            RequestDescriptor::get(format!("/loans/{loan_id}/payment-history")),
            "failed to fetch payment history",
        )
        .await
    }

    pub async fn get_all_payment_history(&self) -> Result<Vec<PaymentHistoryEntry>> {
        self.fetch(
            RequestDescriptor::get("/loans/payment-history/all"),
            "failed to fetch payment history",
        )
        .await
    }

    /// Asks the server for an interest quote, computing it locally when the
    /// server cannot answer.
    ///
    /// Any failure (exhausted retries, non-success status, undecodable body)
    /// degrades to [`crate::interest::calculate_locally`], so this never errors.
    pub async fn calculate_interest(
        &self,
        principal: f64,
        interest_rate: f64,
        frequency: &str,
        days: u32,
    ) -> InterestCalculation {
        let descriptor = RequestDescriptor::get("/loans/calculate-interest")
            .query("principal", principal)
            .query("interestRate", interest_rate)
            .query("frequency", frequency)
            .query("days", days);

        match self
            .fetch::<InterestCalculation>(descriptor, "failed to calculate interest")
            .await
        {
            Ok(result) => result,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::info!(error = %_err, "using local interest calculation");
                calculate_locally(principal, interest_rate, frequency, days)
            }
        }
    }

    // ==================== ADMIN ====================

    pub async fn admin_get_users(&self) -> Result<serde_json::Value> {
        self.fetch(RequestDescriptor::get("/admin/users"), "failed to fetch users")
            .await
    }

    pub async fn admin_get_user(&self, user_id: i64) -> Result<serde_json::Value> {
        self.fetch(
            RequestDescriptor::get(format!("/admin/users/{user_id}")),
            "failed to fetch user",
        )
        .await
    }

    pub async fn admin_get_stats(&self) -> Result<serde_json::Value> {
        self.fetch(RequestDescriptor::get("/admin/stats"), "failed to fetch stats")
            .await
    }

    /// Most recent registrations and loan creations, newest first.
    pub async fn admin_get_activity(&self, limit: u32) -> Result<serde_json::Value> {
        self.fetch(
            RequestDescriptor::get("/admin/activity").query("limit", limit),
            "failed to fetch activity",
        )
        .await
    }

    pub async fn admin_toggle_user_status(&self, user_id: i64) -> Result<serde_json::Value> {
        self.mutate(
            RequestDescriptor::post(format!("/admin/users/{user_id}/toggle-status")),
            "failed to toggle user status",
        )
        .await
    }

    pub async fn admin_make_admin(&self, user_id: i64) -> Result<serde_json::Value> {
        self.mutate(
            RequestDescriptor::post(format!("/admin/users/{user_id}/make-admin")),
            "failed to make admin",
        )
        .await
    }

    pub async fn admin_remove_admin(&self, user_id: i64) -> Result<serde_json::Value> {
        self.mutate(
            RequestDescriptor::post(format!("/admin/users/{user_id}/remove-admin")),
            "failed to remove admin",
        )
        .await
    }

    /// Reports whether the session user is an admin.
    ///
    /// A non-success answer, 5xx included, means "not an admin"; connection
    /// failures are still returned as errors.
    pub async fn admin_check_status(&self) -> Result<AdminStatus> {
        match self.read(RequestDescriptor::get("/admin/check")).await {
            Ok(response) if response.is_success() => response.json(),
            Ok(_) | Err(LendTrackerError::Server { .. }) => Ok(AdminStatus::default()),
            Err(err) => Err(err),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(&self, descriptor: RequestDescriptor) -> Result<RawResponse> {
        debug_assert!(descriptor.is_read(), "retried requests must be reads");
        self.send_with_retry(&descriptor, &self.options).await
    }

    /// Single attempt; mutating calls carry a fresh idempotency key.
    async fn write(&self, descriptor: RequestDescriptor) -> Result<RawResponse> {
        let descriptor = descriptor.idempotent();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            idempotency_key = descriptor.idempotency_key().unwrap_or_default(),
            "sending mutating request"
        );

        self.send_once(&descriptor, self.options.timeout()).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
        message: &'static str,
    ) -> Result<T> {
        let response = self.read(descriptor).await?;
        ensure_success(response, message)?.json()
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
        message: &'static str,
    ) -> Result<T> {
        let response = self.write(descriptor).await?;
        ensure_success(response, message)?.json()
    }
}

fn ensure_success(response: RawResponse, message: &'static str) -> Result<RawResponse> {
    if response.is_success() {
        return Ok(response);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(status = response.status, "{message}");

    Err(LendTrackerError::Rejected {
        message,
        status: response.status,
        body: response.body,
    })
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
