// Route table for the HTTP API
// Shared by the binary and the integration tests

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app_state::SharedState;
use crate::handlers::*;

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ===== CORE MARKET ENDPOINTS =====
        .route("/markets", get(get_markets).post(create_market))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/resolve", post(resolve_market))

        // ===== BETTING ENDPOINTS =====
        .route("/markets/:id/bets", post(place_bet))
        .route("/markets/:id/bets/:identity", get(get_user_bets))

        // ===== SETTLEMENT ENDPOINTS =====
        .route("/markets/:id/claim", post(claim_winnings))
        .route("/markets/:id/claimable/:identity", get(get_claimable))

        // ===== USER & ACTIVITY ENDPOINTS =====
        .route("/users/:identity/stats", get(get_user_stats))
        .route("/users/:identity/history", get(get_user_history))
        .route("/leaderboard", get(get_leaderboard))
        .route("/activity", get(get_activity))

        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))

        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
