use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value as JsonValue};

use crate::{
    config::get_config,
    dto::wallet_dto::PayoutSettlement,
    error::{Error, Result},
    services::{event_hub::MarketEvent, wallet_service::SettlementOutcome},
    utils::signature::verify_payload,
    AppState,
};

pub const SIGNATURE_HEADER: &str = "x-payout-signature";

/// Settlement callback from the payout processor. The signature covers the
/// raw body, so it is checked before the payload is parsed.
pub async fn handle_payout_settlement(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<JsonValue>)> {
    verify_signature(&headers, &body)?;
    let settlement: PayoutSettlement = serde_json::from_slice(&body)?;

    let outcome = state.wallet_service.settle(&settlement).await?;
    let (request, result) = match outcome {
        SettlementOutcome::Completed(request) => {
            state.events.publish(MarketEvent::WithdrawalUpdated {
                request: request.clone(),
            });
            (request, "completed")
        }
        SettlementOutcome::FailureRecorded(request) => {
            state.events.publish(MarketEvent::WithdrawalUpdated {
                request: request.clone(),
            });
            (request, "failure_recorded")
        }
        SettlementOutcome::AlreadySettled(request) => {
            tracing::info!(withdrawal_id = %request.id, "duplicate payout callback ignored");
            (request, "already_settled")
        }
    };

    Ok((
        StatusCode::OK,
        Json(json!({ "result": result, "withdrawal": request })),
    ))
}

fn verify_signature(headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let Some(secret) = get_config().payout_webhook_secret.as_deref() else {
        return Err(Error::Unavailable("payout_webhook_not_configured".into()));
    };
    let Some(sig_hdr) = headers.get(SIGNATURE_HEADER) else {
        return Err(Error::Unauthorized("missing_payout_signature".into()));
    };
    let provided = sig_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_signature_header".into()))?;
    if verify_payload(secret, body, provided) {
        Ok(())
    } else {
        tracing::warn!("payout callback rejected: signature mismatch");
        Err(Error::Unauthorized("invalid_payout_signature".into()))
    }
}
