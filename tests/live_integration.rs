use lendtracker_client::{interest::round2, LendTrackerClient, LoginRequest};

struct LiveCredentials {
    email: String,
    password: String,
}

fn load_live_credentials() -> Option<LiveCredentials> {
    let email = std::env::var("LENDTRACKER_EMAIL").ok()?;
    let password = std::env::var("LENDTRACKER_PASSWORD").ok()?;
    Some(LiveCredentials { email, password })
}

#[tokio::test]
async fn live_login_and_read_loans() {
    let api = match LendTrackerClient::from_env() {
        Ok(api) => api,
        Err(_) => {
            eprintln!("skipping live test: LENDTRACKER_API_URL not set");
            return;
        }
    };

    let quote = api.calculate_interest(100_000.0, 12.0, "MONTHLY", 360).await;
    assert_eq!(quote.duration_months, 12);
    assert_eq!(
        quote.total_amount,
        round2(quote.principal + quote.total_interest)
    );

    let Some(credentials) = load_live_credentials() else {
        eprintln!("skipping authenticated part: LENDTRACKER_EMAIL/PASSWORD not set");
        return;
    };

    let session = api
        .login(&LoginRequest {
            email: credentials.email,
            password: credentials.password,
        })
        .await
        .expect("login request must complete");
    let token = session
        .token
        .unwrap_or_else(|| panic!("login failed: {:?}", session.message));

    let api = api.with_token(token);
    let loans = api.get_loans().await.expect("loans must load");
    let dashboard = api.get_dashboard().await.expect("dashboard must load");
    assert!(dashboard.is_object());
    eprintln!("live backend returned {} loans", loans.len());
}
