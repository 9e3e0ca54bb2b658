//! Lyceum API client - Main Entry Point
//!
//! Composition root: builds every component in dependency order, then
//! probes the session. Signs in first when `LYCEUM_EMAIL` and
//! `LYCEUM_PASSWORD` are set; otherwise reuses stored tokens.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use lyceum_application::ports::{SessionHandle, TokenStorage};
use lyceum_application::{
    ApiCall, ApiClient, ApplicationResult, AuthService, PaginatedCall, PaginationOptions,
    SubjectService,
};
use lyceum_domain::LoginRequest;
use lyceum_infrastructure::{
    ChannelNavigator, FileTokenStorage, MemoryTokenStorage, ReqwestTransport, Settings, telemetry,
};

const ENV_EMAIL: &str = "LYCEUM_EMAIL";
const ENV_PASSWORD: &str = "LYCEUM_PASSWORD";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(status = ?error.api_status(), error = %error, "lyceum failed");
            eprintln!("lyceum: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ApplicationResult<()> {
    let settings = Settings::from_env()?;
    telemetry::init(&settings.log_level);

    tracing::info!(
        base_url = %settings.client.base_url,
        "Starting Lyceum client v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Storage and navigation first; the client depends on both.
    let storage: Arc<dyn TokenStorage> = match &settings.token_file {
        Some(path) => Arc::new(FileTokenStorage::new(path)),
        None => Arc::new(MemoryTokenStorage::new()),
    };
    let (navigator, mut redirects) = ChannelNavigator::new();
    let transport = Arc::new(ReqwestTransport::new()?);
    let client = Arc::new(ApiClient::new(
        transport,
        storage,
        Arc::new(navigator),
        settings.client.clone(),
    )?);

    let auth = Arc::new(AuthService::new(client.clone()));
    let subjects = SubjectService::new(client.clone());

    if let (Ok(email), Ok(password)) = (std::env::var(ENV_EMAIL), std::env::var(ENV_PASSWORD)) {
        let user = auth.login(&LoginRequest::new(email, password)).await?;
        tracing::info!(user_id = user.id, email = %user.email, "signed in");
    } else if !auth.is_authenticated().await? {
        tracing::info!("no stored session, requests are anonymous");
    }

    let session: Arc<dyn SessionHandle> = auth.clone();
    let whoami = ApiCall::new({
        let auth = auth.clone();
        move |()| {
            let auth = auth.clone();
            async move { auth.current_user().await }
        }
    })
    .with_retry(1, Duration::from_millis(500))
    .with_session(session);

    match whoami.execute(()).await {
        Ok(user) => tracing::info!(user_id = user.id, role = ?user.role, "session is valid"),
        Err(error) => {
            tracing::warn!(status = error.status(), error = %error, "session probe failed");
        }
    }

    let listing = PaginatedCall::start(subjects.fetcher(), PaginationOptions::default()).await;
    let page = listing.state();
    match &page.error {
        Some(error) => tracing::warn!(error = %error, "could not list subjects"),
        None => {
            for subject in &page.items {
                tracing::info!(id = subject.id, name = %subject.name, "subject");
            }
            tracing::info!(count = page.items.len(), has_more = page.has_more, "subjects loaded");
        }
    }

    while let Ok(path) = redirects.try_recv() {
        tracing::warn!(path, "session ended, sign in again");
    }

    Ok(())
}
