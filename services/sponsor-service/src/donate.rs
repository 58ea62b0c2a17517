use axum::{
    Json,
    extract::{Path, State},
};
use ps_api_types::{NewPuppyInfo, TxReceipt};

use crate::{AppState, ApiResult, forbidden, op_error};

/// Donates the current form contents to the food fund.
pub(crate) async fn donate_for_food(State(state): State<AppState>) -> ApiResult<TxReceipt> {
    let receipt = state.store.donate_for_food().await.map_err(op_error)?;
    Ok(Json(receipt))
}

pub(crate) async fn donate_for_puppy(
    State(state): State<AppState>,
    Path(puppy_id): Path<u64>,
) -> ApiResult<TxReceipt> {
    let receipt = state
        .store
        .donate_for_puppy(puppy_id)
        .await
        .map_err(op_error)?;
    Ok(Json(receipt))
}

/// Only the donation contract owner may add puppies.
pub(crate) async fn create_puppy(
    State(state): State<AppState>,
    Json(request): Json<NewPuppyInfo>,
) -> ApiResult<TxReceipt> {
    if !state.store.check_puppy_admin().await.map_err(op_error)? {
        return Err(forbidden("only the foundation owner can add puppies"));
    }

    let receipt = state
        .store
        .create_new_puppy(&request)
        .await
        .map_err(op_error)?;
    Ok(Json(receipt))
}
