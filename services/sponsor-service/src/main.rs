use anyhow::Context;
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use ps_chain_evm::{EvmConfig, EvmWallet};
use ps_store::{DEFAULT_MIN_DONATION, OpError, SponsorStore, StoreSettings};
use serde::Serialize;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

mod donate;
mod notices;
mod session;
mod token;

use notices::{NOTICE_CAPACITY, NoticeBoard};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<SponsorStore>,
    pub(crate) notices: Arc<NoticeBoard>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let notices = Arc::new(NoticeBoard::new(NOTICE_CAPACITY));

    let min_donation =
        env::var("PUPPY_MIN_DONATION").unwrap_or_else(|_| DEFAULT_MIN_DONATION.to_owned());
    let settings = StoreSettings::with_min_donation(&min_donation)
        .with_context(|| format!("PUPPY_MIN_DONATION: invalid amount '{min_donation}'"))?;

    let store = if wallet_disabled() {
        warn!("PUPPY_WALLET_DISABLED set; running without a wallet provider");
        SponsorStore::without_wallet(notices.clone(), settings)
    } else {
        let config = EvmConfig::from_env()?;
        let wallet = Arc::new(EvmWallet::new(&config));
        info!(
            rpc_url = wallet.endpoint(),
            sponsor = %config.contracts.donation,
            token = %config.contracts.token,
            "using json-rpc wallet"
        );
        SponsorStore::with_wallet(wallet, &config.contracts, notices.clone(), settings)
    };

    let state = AppState {
        store: Arc::new(store),
        notices,
    };
    state.store.check_if_wallet_connected().await;

    let app = router(state).layer(CorsLayer::permissive());

    let addr: SocketAddr = env::var("SPONSOR_SERVICE_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_owned())
        .parse()
        .context("SPONSOR_SERVICE_ADDR must be host:port")?;
    info!("sponsor-service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn wallet_disabled() -> bool {
    env::var("PUPPY_WALLET_DISABLED").is_ok_and(|value| value == "1" || value == "true")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", err);
    }
    info!("shutting down");
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/session", get(session::session))
        .route("/wallet/check", post(session::wallet_check))
        .route("/wallet/connect", post(session::wallet_connect))
        .route("/wallet/disconnect", post(session::wallet_disconnect))
        .route("/puppies", get(session::puppies).post(donate::create_puppy))
        .route("/transactions", get(session::transactions))
        .route("/form", post(session::update_form))
        .route("/owner", get(session::owner))
        .route("/refresh", post(session::refresh))
        .route("/notices", get(session::notices))
        .route("/donate/food", post(donate::donate_for_food))
        .route("/donate/puppy/{puppy_id}", post(donate::donate_for_puppy))
        .route("/token/transfer", post(token::transfer))
        .route("/token/mint", post(token::mint))
        .route("/token/burn", post(token::burn))
        .route("/token/transfer-ownership", post(token::transfer_ownership))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "sponsor-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "sponsor-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn forbidden(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    error_response(StatusCode::FORBIDDEN, message)
}

pub(crate) fn op_error(err: OpError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        OpError::Busy(_) => StatusCode::CONFLICT,
        OpError::Validation(_) => StatusCode::BAD_REQUEST,
        OpError::NoProvider | OpError::NoAccount => StatusCode::PRECONDITION_FAILED,
        OpError::Rejected(_) | OpError::Query(_) => StatusCode::BAD_GATEWAY,
        OpError::Reverted(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use ps_api_types::{
        DonationFormData, DonationTransaction, Notice, NoticeLevel, OperationKind, SessionResponse,
        TxReceipt,
    };
    use ps_store::testing::{FakeChain, store_with, store_without_wallet};
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app_with(chain: &Arc<FakeChain>) -> (Router, AppState) {
        let notices = Arc::new(NoticeBoard::new(NOTICE_CAPACITY));
        let state = AppState {
            store: Arc::new(store_with(chain, notices.clone())),
            notices,
        };
        (router(state.clone()), state)
    }

    fn app_without_wallet() -> Router {
        let notices = Arc::new(NoticeBoard::new(NOTICE_CAPACITY));
        router(AppState {
            store: Arc::new(store_without_wallet(notices.clone())),
            notices,
        })
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post_req(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Vec<u8>)> {
        let response = app.clone().oneshot(request).await?;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, body.to_vec()))
    }

    async fn send_json<T: DeserializeOwned>(
        app: &Router,
        request: Request<Body>,
    ) -> anyhow::Result<(StatusCode, T)> {
        let (status, body) = send(app, request).await?;
        Ok((status, serde_json::from_slice(&body)?))
    }

    async fn fill_form(app: &Router, amount: &str, keyword: &str, message: &str) -> anyhow::Result<()> {
        for (field, value) in [("amount", amount), ("keyword", keyword), ("message", message)] {
            let (status, _) = send(app, post_req("/form", json!({ "field": field, "value": value }))).await?;
            assert_eq!(status, StatusCode::OK);
        }
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_ok() -> anyhow::Result<()> {
        let (app, _) = app_with(&FakeChain::shared());

        let (status, body): (_, Value) = send_json(&app, get_req("/health")).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn wallet_check_loads_the_session() -> anyhow::Result<()> {
        let (app, _) = app_with(&FakeChain::shared());

        let (status, _) = send(&app, post_req("/wallet/check", json!({}))).await?;
        assert_eq!(status, StatusCode::OK);

        let (_, session): (_, SessionResponse) = send_json(&app, get_req("/session")).await?;
        assert_eq!(session.account.as_str(), FakeChain::ACCOUNT);
        assert_eq!(session.token.symbol, "PUP");
        assert!(session.is_token_owner);
        assert!(!session.is_loading);

        let (_, transactions): (_, Vec<DonationTransaction>) =
            send_json(&app, get_req("/transactions")).await?;
        assert_eq!(transactions[0].message, "third");
        Ok(())
    }

    #[tokio::test]
    async fn donation_returns_receipt_and_resets_form() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        let (app, state) = app_with(&chain);
        fill_form(&app, "0.01", "x", "hi").await?;

        let (status, receipt): (_, TxReceipt) =
            send_json(&app, post_req("/donate/puppy/42", json!({}))).await?;

        assert_eq!(status, StatusCode::OK);
        assert!(receipt.tx_hash.0.starts_with("0xfake"));
        assert_eq!(state.store.form().await, DonationFormData::default());
        assert_eq!(chain.count("donate_for_puppy"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn store_errors_map_to_status_codes() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        let (app, _) = app_with(&chain);

        let (status, body): (_, Value) =
            send_json(&app, post_req("/donate/food", json!({}))).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());

        chain.with_state(|s| s.revert_writes = true);
        let (status, _) = send(&app, post_req("/token/mint", json!({ "amount": "1" }))).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        chain.with_state(|s| {
            s.revert_writes = false;
            s.reject_writes = true;
        });
        let (status, _) = send(&app, post_req("/token/mint", json!({ "amount": "1" }))).await?;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        Ok(())
    }

    #[tokio::test]
    async fn missing_wallet_is_a_precondition_failure() -> anyhow::Result<()> {
        let app = app_without_wallet();
        fill_form(&app, "0.01", "x", "hi").await?;

        let (status, _) = send(&app, post_req("/donate/food", json!({}))).await?;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        send(&app, post_req("/wallet/connect", json!({}))).await?;
        let (_, notices): (_, Vec<Notice>) = send_json(&app, get_req("/notices")).await?;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_token_transfer_conflicts() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.hold_confirmations = true);
        let (app, state) = app_with(&chain);
        let body = json!({ "to": FakeChain::OTHER, "amount": "5" });

        let first = tokio::spawn({
            let app = app.clone();
            let request = post_req("/token/transfer", body.clone());
            async move { app.oneshot(request).await }
        });
        while !state.store.is_pending(OperationKind::TokenTransfer) || chain.count("transfer") == 0 {
            tokio::task::yield_now().await;
        }

        let (status, _) = send(&app, post_req("/token/transfer", body)).await?;
        assert_eq!(status, StatusCode::CONFLICT);

        chain.release_one();
        let response = first.await??;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(chain.count("transfer"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn only_the_foundation_owner_adds_puppies() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.donation_owner = ps_api_types::Address::new(FakeChain::OTHER));
        let (app, _) = app_with(&chain);
        send(&app, post_req("/wallet/connect", json!({}))).await?;
        let puppy = json!({
            "name": "Mochi",
            "birthday": "2021-02-28",
            "image_url": "https://example.com/mochi.png"
        });

        let (status, _) = send(&app, post_req("/puppies", puppy.clone())).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(chain.count("create_new_puppy"), 0);

        chain.with_state(|s| s.donation_owner = ps_api_types::Address::new(FakeChain::ACCOUNT));
        let (status, _) = send(&app, post_req("/puppies", puppy)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chain.count("create_new_puppy"), 1);

        let (_, owner): (_, Value) = send_json(&app, get_req("/owner")).await?;
        assert_eq!(owner["is_current_account"], true);
        Ok(())
    }

    #[tokio::test]
    async fn adding_a_puppy_reports_why_the_owner_is_unknown() -> anyhow::Result<()> {
        let puppy = json!({
            "name": "Mochi",
            "birthday": "2021-02-28",
            "image_url": "https://example.com/mochi.png"
        });

        let app = app_without_wallet();
        let (status, _) = send(&app, post_req("/puppies", puppy.clone())).await?;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let chain = FakeChain::shared();
        chain.with_state(|s| s.fail_reads = true);
        let (app, _) = app_with(&chain);
        let (status, _) = send(&app, post_req("/puppies", puppy)).await?;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(chain.count("create_new_puppy"), 0);
        Ok(())
    }
}
