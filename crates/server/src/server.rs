use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use std::sync::Arc;

use crate::{
    ServerError, budgets, cards, categories, panic_response, savings, transactions, users,
};
use engine::{Engine, EngineError};

pub(crate) const SESSION_COOKIE: &str = "budgetly_session";

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub(crate) fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Resolve the session cookie into the calling user.
///
/// The `engine::User` is stored as a request extension for the handlers.
async fn auth(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(EngineError::Unauthorized("missing session".to_string()).into());
    };
    let user = state.engine.session_user(cookie.value()).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Layers shared by every route: panics become a JSON 500 and each request
/// gets a trace span.
fn with_shared_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Build the `/api` router around an engine.
pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    let public = Router::new()
        .route("/users/sign-up", post(users::sign_up))
        .route("/users/sign-in", post(users::sign_in));

    let protected = Router::new()
        .route("/users/sign-out", post(users::sign_out))
        .route("/users/me", get(users::me).patch(users::update_me))
        .route("/users", get(users::list).post(users::create))
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route(
            "/budgets/{id}",
            get(budgets::get).patch(budgets::update).delete(budgets::remove),
        )
        .route("/budgets/{id}/summary", get(budgets::summary))
        .route(
            "/budgets/{id}/income",
            get(budgets::list_incomes).post(budgets::add_income),
        )
        .route(
            "/budgets/{id}/categories/{category_id}",
            put(budgets::allocate).delete(budgets::remove_allocation),
        )
        .route(
            "/income/{id}",
            patch(budgets::update_income).delete(budgets::delete_income),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            patch(categories::update).delete(categories::remove),
        )
        .route("/cards", get(cards::list).post(cards::create))
        .route(
            "/cards/{id}",
            get(cards::get).patch(cards::update).delete(cards::remove),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/card-payment",
            post(transactions::card_payment_new),
        )
        .route(
            "/transactions/card-payment/{id}",
            delete(transactions::card_payment_delete),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::remove),
        )
        .route("/transactions/{id}/copy", post(transactions::copy))
        .route("/savings", get(savings::list).post(savings::create))
        .route(
            "/savings/{id}",
            get(savings::get).patch(savings::update).delete(savings::remove),
        )
        .route(
            "/savings/{id}/pockets",
            get(savings::list_pockets).post(savings::create_pocket),
        )
        .route(
            "/pockets/{id}",
            get(savings::get_pocket)
                .patch(savings::update_pocket)
                .delete(savings::delete_pocket),
        )
        .route(
            "/pockets/{id}/allocations",
            get(savings::list_allocations).post(savings::create_allocation),
        )
        .route(
            "/allocations/{id}",
            patch(savings::update_allocation).delete(savings::delete_allocation),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    with_shared_layers(Router::new().nest("/api", public.merge(protected))).with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn boom() -> StatusCode {
        panic!("summary arithmetic blew up")
    }

    #[tokio::test]
    async fn panicking_handler_becomes_json_500() {
        let app = with_shared_layers(Router::new().route("/boom", get(boom)));
        let request = axum::http::Request::builder()
            .uri("/boom")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "internal server error"}));
    }
}
