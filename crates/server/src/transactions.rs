//! Transactions API endpoints

use api_types::transaction::{
    CardPaymentNew, CardPaymentView, TransactionCopy, TransactionList, TransactionListResponse,
    TransactionNew, TransactionType as ApiType, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use engine::{CardPaymentCmd, TransactionCmd, TransactionListFilter, TransactionType, User};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ValidPath, ValidatedJson, ValidatedQuery},
    server::ServerState,
};

const DEFAULT_PAGE_SIZE: u64 = 50;

fn map_type(transaction_type: TransactionType) -> ApiType {
    match transaction_type {
        TransactionType::Regular => ApiType::Regular,
        TransactionType::Return => ApiType::Return,
        TransactionType::Income => ApiType::Income,
    }
}

fn type_from_api(transaction_type: ApiType) -> TransactionType {
    match transaction_type {
        ApiType::Regular => TransactionType::Regular,
        ApiType::Return => TransactionType::Return,
        ApiType::Income => TransactionType::Income,
    }
}

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        amount_minor: tx.amount_minor,
        transaction_type: map_type(tx.transaction_type),
        description: tx.description,
        occurred_at: tx.occurred_at,
        category_id: tx.category_id,
        card_id: tx.card_id,
        card_payment_id: tx.card_payment_id,
        created_by: tx.created_by,
        created_at: tx.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedQuery(query): ValidatedQuery<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionListFilter {
        category_id: query.category_id,
        card_id: query.card_id,
        transaction_type: query.transaction_type.map(type_from_api),
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let (txs, next_cursor) = state
        .engine
        .list_transactions(user.actor(), &filter, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(map_transaction).collect(),
        next_cursor,
    }))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(user.actor(), id).await?;
    Ok(Json(map_transaction(tx)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .create_transaction(
            user.actor(),
            TransactionCmd {
                amount_minor: payload.amount_minor,
                transaction_type: type_from_api(payload.transaction_type),
                description: payload.description,
                occurred_at: payload.occurred_at.with_timezone(&Utc),
                category_id: payload.category_id,
                card_id: payload.card_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .update_transaction(
            user.actor(),
            id,
            engine::TransactionUpdate {
                amount_minor: payload.amount_minor,
                transaction_type: payload.transaction_type.map(type_from_api),
                description: payload.description,
                occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
                category_id: payload.category_id,
                card_id: payload.card_id,
            },
        )
        .await?;

    Ok(Json(map_transaction(tx)))
}

/// Duplicate a transaction. An empty body copies it to now.
pub async fn copy(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(id): ValidPath<Uuid>,
    payload: Option<Json<TransactionCopy>>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let occurred_at = payload
        .and_then(|Json(body)| body.occurred_at)
        .map(|dt| dt.with_timezone(&Utc));
    let tx = state
        .engine
        .copy_transaction(user.actor(), id, occurred_at)
        .await?;

    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn card_payment_new(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<CardPaymentNew>,
) -> Result<(StatusCode, Json<CardPaymentView>), ServerError> {
    let payment = state
        .engine
        .create_card_payment(
            user.actor(),
            CardPaymentCmd {
                from_card_id: payload.from_card_id,
                to_card_id: payload.to_card_id,
                amount_minor: payload.amount_minor,
                occurred_at: payload.occurred_at.with_timezone(&Utc),
                description: payload.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CardPaymentView {
            card_payment_id: payment.card_payment_id,
            from: map_transaction(payment.from),
            to: map_transaction(payment.to),
        }),
    ))
}

/// Removes both rows of a card payment, addressed by `card_payment_id`.
pub async fn card_payment_delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(card_payment_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_card_payment(user.actor(), card_payment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
