use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::db::repo::TradeFilter;
use crate::domain::{ItemId, MutationId, Trade, TradeId, TradeStatus, TraitId, UserId};
use crate::engine::TradeItemDraft;
use crate::error::AppError;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTradesQuery {
    pub status: Option<String>,
    pub offering: Option<String>,
    pub looking_for: Option<String>,
    pub participant: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesResponse {
    pub trades: Vec<Trade>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTradeRequest {
    pub offering: Vec<TradeItemRequest>,
    pub looking_for: Vec<TradeItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeItemRequest {
    pub item_id: String,
    pub mutation_id: Option<String>,
    #[serde(default)]
    pub trait_ids: Vec<String>,
}

impl TradeItemRequest {
    fn into_draft(self) -> TradeItemDraft {
        TradeItemDraft {
            item_id: ItemId::new(self.item_id),
            mutation_id: self.mutation_id.map(MutationId::new),
            trait_ids: self.trait_ids.into_iter().map(TraitId::new).collect(),
        }
    }
}

pub async fn list_trades(
    Query(params): Query<ListTradesQuery>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let status = match params.status.as_deref() {
        Some("") | None => None,
        Some(s) => Some(TradeStatus::parse(s).ok_or_else(|| {
            AppError::Validation(format!("Unknown status filter: {}", s))
        })?),
    };

    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let filter = TradeFilter {
        status,
        participant: params.participant.filter(|p| !p.is_empty()).map(UserId::new),
        offering_name: params.offering.filter(|s| !s.is_empty()),
        looking_for_name: params.looking_for.filter(|s| !s.is_empty()),
        limit,
    };

    let trades = state.engine.list(&filter).await?;
    Ok(Json(TradesResponse { trades }))
}

pub async fn post_trade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PostTradeRequest>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    let caller = require_caller(&headers)?;

    let offering: Vec<TradeItemDraft> = request
        .offering
        .into_iter()
        .map(TradeItemRequest::into_draft)
        .collect();
    let looking_for: Vec<TradeItemDraft> = request
        .looking_for
        .into_iter()
        .map(TradeItemRequest::into_draft)
        .collect();

    let trade = state.engine.post(&caller, &offering, &looking_for).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

pub async fn get_trade(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Trade>, AppError> {
    let id = parse_trade_id(&id)?;
    let trade = state.engine.get(&id).await?;
    Ok(Json(trade))
}

pub async fn join_trade(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Trade>, AppError> {
    let caller = require_caller(&headers)?;
    let id = parse_trade_id(&id)?;
    let trade = state.engine.join(&id, &caller).await?;
    Ok(Json(trade))
}

pub async fn accept_trade(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Trade>, AppError> {
    let caller = require_caller(&headers)?;
    let id = parse_trade_id(&id)?;
    let trade = state.engine.accept(&id, &caller).await?;
    Ok(Json(trade))
}

pub async fn decline_trade(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Trade>, AppError> {
    let caller = require_caller(&headers)?;
    let id = parse_trade_id(&id)?;
    let trade = state.engine.decline(&id, &caller).await?;
    Ok(Json(trade))
}

pub async fn cancel_trade(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Trade>, AppError> {
    let caller = require_caller(&headers)?;
    let id = parse_trade_id(&id)?;
    let trade = state.engine.cancel(&id, &caller).await?;
    Ok(Json(trade))
}

/// Caller identity resolved by the upstream auth layer.
fn require_caller(headers: &HeaderMap) -> Result<UserId, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(UserId::new)
        .ok_or_else(|| AppError::Forbidden("Missing caller identity".to_string()))
}

fn parse_trade_id(raw: &str) -> Result<TradeId, AppError> {
    TradeId::parse(raw).ok_or_else(|| AppError::NotFound(format!("Trade {} not found", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_caller_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_caller(&headers),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_caller_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "u-1".parse().unwrap());
        assert_eq!(require_caller(&headers).unwrap(), UserId::new("u-1"));
    }

    #[test]
    fn test_parse_trade_id_rejects_garbage() {
        assert!(matches!(
            parse_trade_id("not-a-uuid"),
            Err(AppError::NotFound(_))
        ));
    }
}
