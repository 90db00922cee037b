//! Account members, sign-up/sign-in and the session cookie.

use api_types::user::{SignIn, SignUp, UserNew, UserUpdate, UserView, UsersResponse};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;
use engine::{NewUserCmd, SignUpCmd, User};

use crate::{
    ServerError,
    extract::ValidatedJson,
    server::{SESSION_COOKIE, ServerState, removal_cookie, session_cookie},
};

fn map_user(user: User) -> UserView {
    UserView {
        id: user.id,
        account_id: user.account_id,
        email: user.email,
        name: user.name,
        created_at: user.created_at,
    }
}

pub async fn sign_up(
    State(state): State<ServerState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SignUp>,
) -> Result<(StatusCode, CookieJar, Json<UserView>), ServerError> {
    let session = state
        .engine
        .sign_up(SignUpCmd {
            account_name: payload.account_name,
            email: payload.email,
            name: payload.name,
            password: payload.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(session.token)),
        Json(map_user(session.user)),
    ))
}

pub async fn sign_in(
    State(state): State<ServerState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SignIn>,
) -> Result<(CookieJar, Json<UserView>), ServerError> {
    let session = state
        .engine
        .sign_in(&payload.email, &payload.password)
        .await?;

    Ok((
        jar.add(session_cookie(session.token)),
        Json(map_user(session.user)),
    ))
}

pub async fn sign_out(
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), ServerError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.engine.sign_out(cookie.value()).await?;
    }
    Ok((StatusCode::NO_CONTENT, jar.remove(removal_cookie())))
}

pub async fn me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.current_user(user.actor()).await?;
    Ok(Json(map_user(user)))
}

pub async fn update_me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<UserUpdate>,
) -> Result<Json<UserView>, ServerError> {
    if payload.name.is_none() && payload.email.is_none() && payload.password.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name, email or password".to_string(),
        ));
    }

    let user = state
        .engine
        .update_user(
            user.actor(),
            engine::UserUpdate {
                name: payload.name,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;
    Ok(Json(map_user(user)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<UsersResponse>, ServerError> {
    let users = state
        .engine
        .list_users(user.actor())
        .await?
        .into_iter()
        .map(map_user)
        .collect();
    Ok(Json(UsersResponse { users }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let created = state
        .engine
        .add_user(
            user.actor(),
            NewUserCmd {
                email: payload.email,
                name: payload.name,
                password: payload.password,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_user(created))))
}
