//! Route definitions for the roast companion API

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::require_unlock, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Passcode gate (public)
        .route("/access/unlock", post(handlers::unlock))
        // Everything else sits behind the gate
        .merge(protected_routes(state))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/session", session_routes())
        .nest("/coffees", coffee_routes())
        .nest("/lots", lot_routes())
        .nest("/roasts", roast_routes())
        .route_layer(middleware::from_fn_with_state(state, require_unlock))
}

/// Live session routes
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_session))
        .route("/open", post(handlers::open_pre_roast))
        .route("/cancel", post(handlers::cancel_pre_roast))
        .route("/begin", post(handlers::begin_roast))
        .route("/first-crack", post(handlers::mark_first_crack))
        .route("/drop", post(handlers::mark_drop))
        .route("/stop", post(handlers::stop_roast))
        .route("/post-roast", post(handlers::record_post_roast))
        .route("/notes", post(handlers::set_notes))
        .route("/lot", post(handlers::set_selected_lot))
        .route("/focus", post(handlers::focus_marker))
        .route("/reset", post(handlers::reset_session))
        .route("/discard", post(handlers::discard_session))
        .route("/save", post(handlers::save_session))
        .route("/markers/:event_type", delete(handlers::delete_marker))
}

/// Coffee catalogue routes
fn coffee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_coffees).post(handlers::create_coffee))
        .route("/:coffee_id", get(handlers::get_coffee))
}

/// Lot and adjustment routes
fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lots).post(handlers::create_lot))
        .route("/summary", get(handlers::list_lot_summaries))
        .route(
            "/:lot_id",
            get(handlers::get_lot).patch(handlers::update_lot),
        )
        .route(
            "/:lot_id/adjustments",
            get(handlers::list_adjustments).post(handlers::create_adjustment),
        )
}

/// Roast history routes
fn roast_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_roasts))
        .route("/latest", get(handlers::latest_roast))
        .route(
            "/:roast_id",
            get(handlers::get_roast).delete(handlers::delete_roast),
        )
}
