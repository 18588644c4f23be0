use lendtracker_client::{LendTrackerClient, LoginRequest, DEFAULT_API_BASE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api = LendTrackerClient::from_env().unwrap_or_else(|_| LendTrackerClient::new(DEFAULT_API_BASE));

    let quote = api.calculate_interest(100_000.0, 12.0, "MONTHLY", 360).await;
    println!(
        "12% monthly on 1,00,000 for 360 days: interest {} / total {}",
        quote.total_interest, quote.total_amount
    );

    let email = std::env::var("LENDTRACKER_EMAIL")?;
    let password = std::env::var("LENDTRACKER_PASSWORD")?;
    let session = api.login(&LoginRequest { email, password }).await?;
    let Some(token) = session.token else {
        anyhow::bail!(
            "login failed: {}",
            session.message.unwrap_or_else(|| "no message".to_owned())
        );
    };

    let api = api.with_token(token);
    let (loans, dashboard) = tokio::join!(api.get_loans(), api.get_dashboard());
    let loans = loans?;
    println!("{} loans", loans.len());
    for loan in &loans {
        println!(
            "#{} {} {} @ {}% {}",
            loan.id, loan.borrower_name, loan.principal_amount, loan.interest_rate, loan.status.as_str()
        );
    }
    println!("dashboard: {}", dashboard?);

    Ok(())
}
