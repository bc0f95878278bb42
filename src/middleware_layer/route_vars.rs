use axum::{
    extract::{RawPathParams, Request, rejection::RawPathParamsRejection},
    middleware::Next,
    response::Response,
};

use crate::context::{RequestContext, RouteVars};

/// Copies the matched route's path parameters into the [`RequestContext`].
pub async fn extract_route_vars(
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut req: Request,
    next: Next,
) -> Response {
    let route_vars: RouteVars = match &params {
        Ok(params) => params.iter().collect(),
        Err(_) => RouteVars::default(),
    };

    match req.extensions_mut().get_mut::<RequestContext>() {
        Some(ctx) => ctx.route_vars = route_vars,
        None => {
            req.extensions_mut().insert(RequestContext {
                route_vars,
                ..Default::default()
            });
        }
    }

    next.run(req).await
}
