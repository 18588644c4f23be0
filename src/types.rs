use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterestFrequency {
    Daily,
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl InterestFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Biweekly => "BIWEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency name case-insensitively; unknown names map to `Monthly`.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "BIWEEKLY" => Self::Biweekly,
            "QUARTERLY" => Self::Quarterly,
            "YEARLY" => Self::Yearly,
            _ => Self::Monthly,
        }
    }
}

impl fmt::Display for InterestFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    #[default]
    Active,
    Closed,
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
            Self::Defaulted => "DEFAULTED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentType {
    Interest,
    Principal,
}

/// A loan as stored by the backend. Dates are ISO `YYYY-MM-DD` strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i64,
    pub borrower_name: String,
    pub borrower_phone: Option<String>,
    pub borrower_email: Option<String>,
    pub principal_amount: f64,
    pub interest_rate: f64,
    pub lend_date: Option<String>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub interest_frequency: InterestFrequency,
    #[serde(default)]
    pub total_interest_received: f64,
    #[serde(default)]
    pub total_principal_received: f64,
    pub notes: Option<String>,
    pub status: LoanStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fields accepted by create and update.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanInput {
    pub borrower_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower_email: Option<String>,
    pub principal_amount: f64,
    pub interest_rate: f64,
    pub lend_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub interest_frequency: InterestFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LoanStatus>,
}

/// Optional filters for `/loans/search`. Unset filters are not sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoanSearch {
    pub q: Option<String>,
    pub status: Option<LoanStatus>,
    pub frequency: Option<InterestFrequency>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryEntry {
    pub id: i64,
    pub loan_id: i64,
    #[serde(default)]
    pub borrower_name: String,
    pub amount: f64,
    pub payment_type: PaymentType,
    pub payment_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of every auth endpoint. Success is signalled in the body, not the status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthResponse {
    pub token: Option<String>,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub email_verified: Option<bool>,
    pub message: Option<String>,
}

impl AuthResponse {
    /// The backend marks success by returning a session token.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

/// Interest calculator output, from the server or computed locally.
///
/// Only the per-day, per-week and per-payment figures may be absent from a
/// server answer; anything missing the core figures is not a quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestCalculation {
    pub principal: f64,
    pub interest_rate: f64,
    pub frequency: String,
    pub duration_months: u32,
    #[serde(default)]
    pub daily_interest: f64,
    #[serde(default)]
    pub weekly_interest: f64,
    pub monthly_interest: f64,
    pub yearly_interest: f64,
    #[serde(default)]
    pub per_payment_interest: f64,
    pub total_interest: f64,
    pub total_amount: f64,
}

/// Profile fields to change; unset fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminStatus {
    pub is_admin: bool,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{
        AuthResponse, InterestCalculation, InterestFrequency, Loan, LoanStatus,
        PaymentHistoryEntry, PaymentType,
    };

    #[test]
    fn parse_lossy_defaults_to_monthly() {
        assert_eq!(InterestFrequency::parse_lossy("quarterly"), InterestFrequency::Quarterly);
        assert_eq!(InterestFrequency::parse_lossy(" BIWEEKLY "), InterestFrequency::Biweekly);
        assert_eq!(InterestFrequency::parse_lossy("fortnightly"), InterestFrequency::Monthly);
    }

    #[test]
    fn loan_decodes_backend_json_and_ignores_unknown_fields() {
        let loan: Loan = serde_json::from_value(serde_json::json!({
            "id": 7,
            "borrowerName": "Ravi",
            "principalAmount": 50000,
            "interestRate": 18.0,
            "lendDate": "2024-01-15",
            "interestFrequency": "QUARTERLY",
            "status": "CLOSED",
            "somethingNew": true
        }))
        .expect("loan must decode");

        assert_eq!(loan.id, 7);
        assert_eq!(loan.principal_amount, 50_000.0);
        assert_eq!(loan.interest_frequency, InterestFrequency::Quarterly);
        assert_eq!(loan.status, LoanStatus::Closed);
        assert_eq!(loan.total_interest_received, 0.0);
    }

    #[test]
    fn loan_requires_identity_and_amounts() {
        let err = serde_json::from_value::<Loan>(serde_json::json!({"error": "not a loan"}));
        assert!(err.is_err());

        let missing_status = serde_json::from_value::<Loan>(serde_json::json!({
            "id": 1,
            "borrowerName": "Ravi",
            "principalAmount": 1000,
            "interestRate": 12.0
        }));
        assert!(missing_status.is_err());
    }

    #[test]
    fn payment_entry_requires_type_and_amount() {
        let entry: PaymentHistoryEntry = serde_json::from_value(serde_json::json!({
            "id": 3,
            "loanId": 7,
            "amount": 500.0,
            "paymentType": "PRINCIPAL",
            "paymentDate": "2024-02-01"
        }))
        .expect("payment must decode");
        assert_eq!(entry.payment_type, PaymentType::Principal);
        assert_eq!(entry.borrower_name, "");

        let err = serde_json::from_value::<PaymentHistoryEntry>(serde_json::json!({
            "id": 3,
            "loanId": 7
        }));
        assert!(err.is_err());
    }

    #[test]
    fn interest_calculation_rejects_unrelated_object() {
        let err = serde_json::from_value::<InterestCalculation>(serde_json::json!({
            "message": "calculator offline"
        }));
        assert!(err.is_err());

        let quote: InterestCalculation = serde_json::from_value(serde_json::json!({
            "principal": 1000,
            "interestRate": 12.0,
            "frequency": "MONTHLY",
            "durationMonths": 1,
            "monthlyInterest": 10.0,
            "yearlyInterest": 120.0,
            "totalInterest": 10.0,
            "totalAmount": 1010.0
        }))
        .expect("quote without optional figures must decode");
        assert_eq!(quote.per_payment_interest, 0.0);
    }

    #[test]
    fn auth_response_success_requires_token() {
        let failed: AuthResponse =
            serde_json::from_str(r#"{"message":"Invalid credentials"}"#).expect("decode");
        assert!(!failed.is_authenticated());

        let ok: AuthResponse =
            serde_json::from_str(r#"{"token":"jwt","type":"Bearer","userId":1}"#).expect("decode");
        assert!(ok.is_authenticated());
        assert_eq!(ok.token_type.as_deref(), Some("Bearer"));
    }
}
