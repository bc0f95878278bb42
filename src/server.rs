//! The route table and the middleware pipeline around it.
//!
//! Outermost first: recovery, CORS, cookies, route variables, logging, then
//! per route group session authentication and CSRF verification.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::header::InvalidHeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;

use crate::{
    config::Config,
    handlers::{auth, events, users},
    middleware_layer::{
        auth::require_session, cors::cors_layer, csrf::verify_csrf, logging::log_requests,
        recovery::recover, route_vars::extract_route_vars,
    },
    state::AppState,
};

/// The largest request body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the gateway's router with its full middleware pipeline.
pub fn router(state: AppState) -> Result<Router, InvalidHeaderValue> {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/user/{id}", get(users::get_user))
        .route("/user/{id}/subscribers", get(users::get_subscribers))
        .route("/user/{id}/subscribes", get(users::get_subscribes))
        .route(
            "/user/{id}/events/favourite",
            get(events::get_visited_events),
        )
        .route("/user/{id}/events/created", get(events::get_created_events))
        .route("/events", get(events::list_events))
        .route("/events/cities", get(events::get_cities))
        .route("/events/{id}", get(events::get_event))
        .route("/events/{id}/visitors", get(users::get_visitors))
        .with_state(state.clone());

    let session_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/user", get(users::get_profile))
        .route("/user/{id}/subscription", get(users::is_subscribed))
        .route("/events/{id}/visit", get(events::is_visited))
        .route_layer(from_fn_with_state(state.clone(), require_session))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/user/info", post(users::update_info))
        .route("/user/password", post(users::update_password))
        .route(
            "/user/{id}/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/events", post(events::create_event))
        .route(
            "/events/{id}",
            post(events::update_event).delete(events::delete_event),
        )
        .route(
            "/events/{id}/visit",
            post(events::visit).delete(events::unvisit),
        )
        .route_layer(from_fn_with_state(state.clone(), verify_csrf))
        .route_layer(from_fn_with_state(state.clone(), require_session))
        .with_state(state.clone());

    let routes = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(protected_routes)
        .route_layer(from_fn(log_requests))
        .route_layer(from_fn(extract_route_vars));

    with_pipeline(routes, &state.config)
}

/// Wraps routes in the layers every request passes, matched or not.
pub fn with_pipeline(routes: Router, config: &Config) -> Result<Router, InvalidHeaderValue> {
    Ok(routes
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&config.main_host)?)
        .layer(from_fn(recover)))
}
