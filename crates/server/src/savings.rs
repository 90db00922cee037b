//! Savings accounts, their pockets and pocket allocations.

use api_types::savings::{
    AllocationNew, AllocationUpdate, AllocationView, AllocationsResponse, PocketNew,
    PocketUpdate, PocketView, PocketsResponse, SavingsListResponse, SavingsNew, SavingsUpdate,
    SavingsView,
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use engine::{AllocationCmd, PocketCmd, User};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ValidPath, ValidatedJson},
    server::ServerState,
};

fn map_pocket(pocket: engine::Pocket) -> PocketView {
    PocketView {
        goal_progress_percent: pocket.goal_progress_percent(),
        id: pocket.id,
        savings_id: pocket.savings_id,
        name: pocket.name,
        goal_minor: pocket.goal_minor,
        goal_at: pocket.goal_at,
        total_minor: pocket.total.cents(),
        created_at: pocket.created_at,
    }
}

fn map_savings(savings: engine::Savings) -> SavingsView {
    SavingsView {
        id: savings.id,
        name: savings.name,
        total_minor: savings.total.cents(),
        pockets: savings.pockets.into_iter().map(map_pocket).collect(),
        created_at: savings.created_at,
    }
}

fn map_allocation(allocation: engine::Allocation) -> AllocationView {
    AllocationView {
        id: allocation.id,
        pocket_id: allocation.pocket_id,
        amount_minor: allocation.amount_minor,
        withdrawal: allocation.withdrawal,
        note: allocation.note,
        occurred_at: allocation.occurred_at,
        created_at: allocation.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<SavingsListResponse>, ServerError> {
    let savings = state
        .engine
        .list_savings(user.actor())
        .await?
        .into_iter()
        .map(map_savings)
        .collect();
    Ok(Json(SavingsListResponse { savings }))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(savings_id): ValidPath<Uuid>,
) -> Result<Json<SavingsView>, ServerError> {
    let savings = state.engine.savings(user.actor(), savings_id).await?;
    Ok(Json(map_savings(savings)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<SavingsNew>,
) -> Result<(StatusCode, Json<SavingsView>), ServerError> {
    let savings = state
        .engine
        .create_savings(user.actor(), &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(map_savings(savings))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(savings_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<SavingsUpdate>,
) -> Result<Json<SavingsView>, ServerError> {
    let savings = state
        .engine
        .update_savings(user.actor(), savings_id, &payload.name)
        .await?;
    Ok(Json(map_savings(savings)))
}

/// Deletes the savings account with all its pockets and allocations.
pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(savings_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_savings(user.actor(), savings_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pockets(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(savings_id): ValidPath<Uuid>,
) -> Result<Json<PocketsResponse>, ServerError> {
    let pockets = state
        .engine
        .list_pockets(user.actor(), savings_id)
        .await?
        .into_iter()
        .map(map_pocket)
        .collect();
    Ok(Json(PocketsResponse { pockets }))
}

pub async fn get_pocket(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(pocket_id): ValidPath<Uuid>,
) -> Result<Json<PocketView>, ServerError> {
    let pocket = state.engine.pocket(user.actor(), pocket_id).await?;
    Ok(Json(map_pocket(pocket)))
}

pub async fn create_pocket(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(savings_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<PocketNew>,
) -> Result<(StatusCode, Json<PocketView>), ServerError> {
    let pocket = state
        .engine
        .create_pocket(
            user.actor(),
            savings_id,
            PocketCmd {
                name: payload.name,
                goal_minor: payload.goal_minor,
                goal_at: payload.goal_at.map(|dt| dt.with_timezone(&Utc)),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_pocket(pocket))))
}

pub async fn update_pocket(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(pocket_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<PocketUpdate>,
) -> Result<Json<PocketView>, ServerError> {
    let pocket = state
        .engine
        .update_pocket(
            user.actor(),
            pocket_id,
            engine::PocketUpdate {
                name: payload.name,
                goal_minor: payload.goal_minor,
                goal_at: payload
                    .goal_at
                    .map(|goal| goal.map(|dt| dt.with_timezone(&Utc))),
            },
        )
        .await?;
    Ok(Json(map_pocket(pocket)))
}

pub async fn delete_pocket(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(pocket_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_pocket(user.actor(), pocket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_allocations(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(pocket_id): ValidPath<Uuid>,
) -> Result<Json<AllocationsResponse>, ServerError> {
    let allocations = state
        .engine
        .list_allocations(user.actor(), pocket_id)
        .await?
        .into_iter()
        .map(map_allocation)
        .collect();
    Ok(Json(AllocationsResponse { allocations }))
}

pub async fn create_allocation(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(pocket_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<AllocationNew>,
) -> Result<(StatusCode, Json<AllocationView>), ServerError> {
    let allocation = state
        .engine
        .create_allocation(
            user.actor(),
            pocket_id,
            AllocationCmd {
                amount_minor: payload.amount_minor,
                withdrawal: payload.withdrawal,
                note: payload.note,
                occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_allocation(allocation))))
}

pub async fn update_allocation(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(allocation_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<AllocationUpdate>,
) -> Result<Json<AllocationView>, ServerError> {
    let allocation = state
        .engine
        .update_allocation(
            user.actor(),
            allocation_id,
            engine::AllocationUpdate {
                amount_minor: payload.amount_minor,
                withdrawal: payload.withdrawal,
                note: payload.note,
                occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
            },
        )
        .await?;
    Ok(Json(map_allocation(allocation)))
}

pub async fn delete_allocation(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(allocation_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_allocation(user.actor(), allocation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
