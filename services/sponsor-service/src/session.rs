use axum::{Json, extract::State};
use ps_api_types::{
    DonationFormData, DonationTransaction, FormUpdateRequest, Notice, OwnerResponse, Puppy,
    SessionResponse,
};

use crate::{AppState, ApiResult, op_error};

pub(crate) async fn session(State(state): State<AppState>) -> Json<SessionResponse> {
    let snapshot = state.store.snapshot().await;

    Json(SessionResponse {
        account: snapshot.account,
        is_loading: state.store.is_loading(),
        pending: state.store.pending_operations(),
        token: snapshot.token,
        is_token_owner: snapshot.is_token_owner,
        form: snapshot.form,
    })
}

pub(crate) async fn wallet_check(State(state): State<AppState>) -> Json<SessionResponse> {
    state.store.check_if_wallet_connected().await;
    session(State(state)).await
}

pub(crate) async fn wallet_connect(State(state): State<AppState>) -> Json<SessionResponse> {
    state.store.connect_wallet().await;
    session(State(state)).await
}

pub(crate) async fn wallet_disconnect(State(state): State<AppState>) -> Json<SessionResponse> {
    state.store.disconnect_wallet().await;
    session(State(state)).await
}

pub(crate) async fn puppies(State(state): State<AppState>) -> Json<Vec<Puppy>> {
    Json(state.store.puppies().await)
}

/// Most recent first.
pub(crate) async fn transactions(State(state): State<AppState>) -> Json<Vec<DonationTransaction>> {
    Json(state.store.recent_transactions().await)
}

pub(crate) async fn update_form(
    State(state): State<AppState>,
    Json(request): Json<FormUpdateRequest>,
) -> Json<DonationFormData> {
    state.store.handle_change(request.field, request.value).await;
    Json(state.store.form().await)
}

pub(crate) async fn owner(State(state): State<AppState>) -> ApiResult<OwnerResponse> {
    let owner = state.store.owner().await.map_err(op_error)?;
    let account = state.store.account().await;

    Ok(Json(OwnerResponse {
        is_current_account: !owner.is_empty() && owner == account,
        owner,
    }))
}

pub(crate) async fn refresh(State(state): State<AppState>) -> Json<SessionResponse> {
    state.store.update_chain_contents().await;
    session(State(state)).await
}

pub(crate) async fn notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.recent())
}
