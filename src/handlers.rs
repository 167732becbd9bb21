// HTTP request handlers for the prediction market API

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::app_state::SharedState;
use crate::error::EngineError;
use crate::market_resolve::MarketId;
use crate::models::*;
use crate::query::{MarketView, UserStats};

type ApiResult<T> = Result<Json<T>, EngineError>;

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidInput(_) | EngineError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
            EngineError::MarketExpired { .. }
            | EngineError::AlreadyResolved(_)
            | EngineError::MarketNotResolved(_)
            | EngineError::NoClaimableBets { .. } => StatusCode::CONFLICT,
            EngineError::PoolOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        warn!(code = self.code(), status = status.as_u16(), "❌ {}", self);
        let body = ErrorResponse {
            success: false,
            code: self.code(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ===== EXTRACTORS =====
// axum's stock extractors reject with plain text; these answer with the
// same JSON error body as the engine.

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(EngineError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(EngineError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(EngineError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for EngineError {
    fn from(rejection: JsonRejection) -> Self {
        EngineError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for EngineError {
    fn from(rejection: PathRejection) -> Self {
        EngineError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for EngineError {
    fn from(rejection: QueryRejection) -> Self {
        EngineError::InvalidInput(rejection.body_text())
    }
}

// ===== HEALTH =====

pub async fn health_check() -> &'static str {
    "Prediction Market Settlement Engine - Online ✅"
}

// ===== MARKET ENDPOINTS =====

pub async fn get_markets(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<MarketsQuery>,
) -> Json<MarketsResponse> {
    let markets = state.engine.get_markets(query.filter, query.search.as_deref());
    Json(MarketsResponse { count: markets.len(), markets })
}

pub async fn get_market(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MarketId>,
) -> ApiResult<MarketView> {
    Ok(Json(state.engine.get_market(id)?))
}

pub async fn create_market(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<CreateMarketRequest>,
) -> ApiResult<CreateMarketResponse> {
    let market_id = state
        .engine
        .create_market(&payload.question, payload.end_time, &payload.caller)?;
    Ok(Json(CreateMarketResponse { success: true, market_id }))
}

pub async fn resolve_market(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MarketId>,
    ApiJson(payload): ApiJson<ResolveMarketRequest>,
) -> ApiResult<ResolveMarketResponse> {
    state.engine.resolve_market(id, payload.outcome, &payload.caller)?;
    Ok(Json(ResolveMarketResponse {
        success: true,
        market_id: id,
        outcome: payload.outcome,
    }))
}

// ===== BETTING ENDPOINTS =====

pub async fn place_bet(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MarketId>,
    ApiJson(payload): ApiJson<PlaceBetRequest>,
) -> ApiResult<PlaceBetResponse> {
    let amount = payload.amount()?;
    let receipt = state.engine.place_bet(id, &payload.caller, payload.is_yes, amount)?;
    Ok(Json(PlaceBetResponse { success: true, receipt }))
}

pub async fn get_user_bets(
    State(state): State<SharedState>,
    ApiPath((id, identity)): ApiPath<(MarketId, String)>,
) -> Json<UserBetsResponse> {
    let bets = state.engine.get_user_bets(id, &identity);
    Json(UserBetsResponse { market_id: id, identity, bets })
}

// ===== SETTLEMENT ENDPOINTS =====

pub async fn claim_winnings(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<MarketId>,
    ApiJson(payload): ApiJson<ClaimRequest>,
) -> ApiResult<ClaimResponse> {
    let amount = state.engine.claim_winnings(id, &payload.caller)?;
    Ok(Json(ClaimResponse { success: true, market_id: id, amount }))
}

pub async fn get_claimable(
    State(state): State<SharedState>,
    ApiPath((id, identity)): ApiPath<(MarketId, String)>,
) -> ApiResult<ClaimableResponse> {
    let amount = state.engine.claimable(id, &identity)?;
    Ok(Json(ClaimableResponse { market_id: id, identity, amount }))
}

// ===== USER ENDPOINTS =====

pub async fn get_user_stats(
    State(state): State<SharedState>,
    ApiPath(identity): ApiPath<String>,
) -> Json<UserStats> {
    Json(state.engine.get_user_stats(&identity))
}

pub async fn get_user_history(
    State(state): State<SharedState>,
    ApiPath(identity): ApiPath<String>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Json<HistoryResponse> {
    let entries = state.engine.history(&identity, query.resolved());
    Json(HistoryResponse { identity: Some(identity), entries })
}

pub async fn get_leaderboard(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> Json<LeaderboardResponse> {
    let entries = state.engine.leaderboard(query.sort, query.limit);
    Json(LeaderboardResponse { sort: query.sort, entries })
}

pub async fn get_activity(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        identity: None,
        entries: state.engine.recent_activity(query.resolved()),
    })
}
