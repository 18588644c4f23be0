//! Request body shapes that only exist on the wire.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailBody<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody<'a> {
    pub amount: f64,
    pub payment_date: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}
