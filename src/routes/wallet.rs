use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::wallet_dto::{
        CreatePayoutAccountPayload, CreateWithdrawalPayload, EarningsResponse,
        UpdateWithdrawalStatusPayload, WithdrawalListQuery,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::balance::check_minimum,
    services::event_hub::MarketEvent,
    AppState,
};

const RECENT_PAYMENTS: i64 = 50;

#[utoipa::path(
    get,
    path = "/api/earnings",
    responses(
        (status = 200, description = "Balance of the caller and recent payments", body = Json<EarningsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn get_earnings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let balance = state.wallet_service.balance(user_id).await?;
    let recent_payments = state
        .wallet_service
        .recent_payments(user_id, RECENT_PAYMENTS)
        .await?;

    Ok(Json(EarningsResponse {
        balance,
        minimum_withdrawal: state.wallet_service.minimum_withdrawal(),
        recent_payments,
    }))
}

#[utoipa::path(
    post,
    path = "/api/withdrawal-requests",
    request_body = CreateWithdrawalPayload,
    responses(
        (status = 201, description = "Withdrawal request created"),
        (status = 400, description = "Amount out of bounds or payout account missing"),
        (status = 404, description = "Payout account not found")
    )
)]
#[axum::debug_handler]
pub async fn create_withdrawal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateWithdrawalPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    check_minimum(payload.amount, state.wallet_service.minimum_withdrawal())
        .map_err(|rejection| Error::BadRequest(rejection.to_string()))?;
    let target = payload
        .payout_target()
        .ok_or_else(|| Error::BadRequest("payout account required".into()))?;

    let request = state
        .wallet_service
        .request_withdrawal(claims.user_id()?, payload.amount, target, payload.notes)
        .await?;

    state.events.publish(MarketEvent::WithdrawalUpdated {
        request: request.clone(),
    });
    Ok((StatusCode::CREATED, Json(request)))
}

#[axum::debug_handler]
pub async fn list_my_withdrawals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let items = state.wallet_service.list_for_user(claims.user_id()?).await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(query): Query<WithdrawalListQuery>,
) -> Result<impl IntoResponse> {
    let items = state.wallet_service.list(query.status).await?;
    Ok(Json(items))
}

#[utoipa::path(
    patch,
    path = "/api/admin/withdrawal-requests/{id}/status",
    params(("id" = Uuid, Path, description = "Withdrawal request id")),
    request_body = UpdateWithdrawalStatusPayload,
    responses(
        (status = 200, description = "Status changed"),
        (status = 404, description = "Withdrawal request not found"),
        (status = 409, description = "Transition not allowed from the current status")
    )
)]
#[axum::debug_handler]
pub async fn update_withdrawal_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWithdrawalStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let admin_id = claims.user_id()?;

    let request = state
        .wallet_service
        .transition(
            id,
            payload.status,
            Some(admin_id),
            payload.notes.clone(),
            payload.payment_id.clone(),
        )
        .await?;

    state
        .audit_service
        .record(
            admin_id,
            "withdrawal_status_changed",
            "withdrawal_request",
            request.id,
            json!({
                "status": request.status.as_str(),
                "notes": payload.notes,
                "paymentId": payload.payment_id,
            }),
        )
        .await;
    state.events.publish(MarketEvent::WithdrawalUpdated {
        request: request.clone(),
    });

    Ok(Json(request))
}

#[axum::debug_handler]
pub async fn list_payout_accounts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let accounts = state
        .payout_account_service
        .list(claims.user_id()?)
        .await?;
    Ok(Json(accounts))
}

#[utoipa::path(
    post,
    path = "/api/payout-accounts",
    request_body = CreatePayoutAccountPayload,
    responses(
        (status = 201, description = "Payout account stored"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_payout_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePayoutAccountPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let account = state
        .payout_account_service
        .create(claims.user_id()?, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[axum::debug_handler]
pub async fn delete_payout_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .payout_account_service
        .delete(claims.user_id()?, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
