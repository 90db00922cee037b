//! Categories API endpoints.

use api_types::category::{CategoriesResponse, CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::User;
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ValidPath, ValidatedJson},
    server::ServerState,
};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        icon: category.icon,
        created_at: category.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<CategoriesResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(user.actor())
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoriesResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(user.actor(), &payload.name, payload.icon.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(category_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_none() && payload.icon.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name or icon".to_string(),
        ));
    }

    let category = state
        .engine
        .update_category(
            user.actor(),
            category_id,
            engine::CategoryUpdate {
                name: payload.name,
                icon: payload.icon,
            },
        )
        .await?;
    Ok(Json(map_category(category)))
}

/// Removes the category along with its allocations in every budget.
pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(category_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(user.actor(), category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
