use api_types::card::{CardNew, CardType as ApiCardType, CardUpdate, CardView, CardsResponse};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{CardCmd, CardType, User};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ValidPath, ValidatedJson},
    server::ServerState,
};

fn map_card_type(card_type: CardType) -> ApiCardType {
    match card_type {
        CardType::Debit => ApiCardType::Debit,
        CardType::Credit => ApiCardType::Credit,
        CardType::Cash => ApiCardType::Cash,
    }
}

fn card_type_from_api(card_type: ApiCardType) -> CardType {
    match card_type {
        ApiCardType::Debit => CardType::Debit,
        ApiCardType::Credit => CardType::Credit,
        ApiCardType::Cash => CardType::Cash,
    }
}

fn map_card(card: engine::Card) -> CardView {
    CardView {
        id: card.id,
        name: card.name,
        card_type: map_card_type(card.card_type),
        last_four: card.last_four,
        created_at: card.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<CardsResponse>, ServerError> {
    let cards = state
        .engine
        .list_cards(user.actor())
        .await?
        .into_iter()
        .map(map_card)
        .collect();
    Ok(Json(CardsResponse { cards }))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(card_id): ValidPath<Uuid>,
) -> Result<Json<CardView>, ServerError> {
    let card = state.engine.card(user.actor(), card_id).await?;
    Ok(Json(map_card(card)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<CardNew>,
) -> Result<(StatusCode, Json<CardView>), ServerError> {
    let card = state
        .engine
        .create_card(
            user.actor(),
            CardCmd {
                name: payload.name,
                card_type: card_type_from_api(payload.card_type),
                last_four: payload.last_four,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_card(card))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(card_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CardUpdate>,
) -> Result<Json<CardView>, ServerError> {
    let card = state
        .engine
        .update_card(
            user.actor(),
            card_id,
            engine::CardUpdate {
                name: payload.name,
                card_type: payload.card_type.map(card_type_from_api),
                last_four: payload.last_four,
            },
        )
        .await?;
    Ok(Json(map_card(card)))
}

/// Transactions paid with the card keep pointing at it.
pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(card_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_card(user.actor(), card_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
