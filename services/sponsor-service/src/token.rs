use axum::{Json, extract::State};
use ps_api_types::{
    OwnershipTransferRequest, TokenBurnRequest, TokenMintRequest, TokenTransferRequest, TxReceipt,
};

use crate::{AppState, ApiResult, op_error};

pub(crate) async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TokenTransferRequest>,
) -> ApiResult<TxReceipt> {
    let receipt = state
        .store
        .transfer_puppy_token(&request.to, &request.amount)
        .await
        .map_err(op_error)?;
    Ok(Json(receipt))
}

pub(crate) async fn mint(
    State(state): State<AppState>,
    Json(request): Json<TokenMintRequest>,
) -> ApiResult<TxReceipt> {
    let receipt = state
        .store
        .mint_puppy_token(&request.amount)
        .await
        .map_err(op_error)?;
    Ok(Json(receipt))
}

pub(crate) async fn burn(
    State(state): State<AppState>,
    Json(request): Json<TokenBurnRequest>,
) -> ApiResult<TxReceipt> {
    let receipt = state
        .store
        .burn_puppy_token(&request.address, &request.amount)
        .await
        .map_err(op_error)?;
    Ok(Json(receipt))
}

pub(crate) async fn transfer_ownership(
    State(state): State<AppState>,
    Json(request): Json<OwnershipTransferRequest>,
) -> ApiResult<TxReceipt> {
    let receipt = state
        .store
        .transfer_owner(&request.new_owner)
        .await
        .map_err(op_error)?;
    Ok(Json(receipt))
}
