use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Actor, CardPaymentCmd, CardType, EngineError, ResultEngine, Transaction, TransactionCmd,
    TransactionType, TransactionUpdate, card_payment_amounts, transactions,
    transactions::check_card_payment_route,
};

use super::{Engine, normalize_optional_text, require_positive, with_tx};

const CARD_PAYMENT_DESCRIPTION: &str = "Card payment";

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub category_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Both sides of a card payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayment {
    pub card_payment_id: Uuid,
    pub from: Transaction,
    pub to: Transaction,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidPeriod(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(category_id) = filter.category_id {
            self = self.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(card_id) = filter.card_id {
            self = self.filter(transactions::Column::CardId.eq(card_id));
        }
        if let Some(kind) = filter.transaction_type {
            self = self.filter(transactions::Column::TransactionType.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredAt.lt(to));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_at: DateTime<Utc>,
    transaction_id: Uuid,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

fn reject_card_payment(model: &transactions::Model, action: &str) -> ResultEngine<()> {
    if model.card_payment_id.is_some() {
        return Err(EngineError::CardPayment(format!(
            "cannot {action} one side of a card payment"
        )));
    }
    Ok(())
}

impl Engine {
    pub async fn create_transaction(
        &self,
        actor: Actor,
        cmd: TransactionCmd,
    ) -> ResultEngine<Transaction> {
        let amount_minor = require_positive(cmd.amount_minor, "transaction amount")?;
        with_tx!(self, |db_tx| {
            self.check_transaction_refs(&db_tx, actor, cmd.category_id, cmd.card_id)
                .await?;
            let tx = Transaction {
                id: Uuid::new_v4(),
                amount_minor,
                transaction_type: cmd.transaction_type,
                description: normalize_optional_text(cmd.description.as_deref()),
                occurred_at: cmd.occurred_at,
                category_id: cmd.category_id,
                card_id: cmd.card_id,
                card_payment_id: None,
                created_by: actor.user_id,
                created_at: Utc::now(),
            };
            transactions::ActiveModel::from_transaction(&tx, actor.account_id)
                .insert(&db_tx)
                .await?;
            Ok(tx)
        })
    }

    pub async fn transaction(&self, actor: Actor, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, actor, transaction_id)
                .await?;
            Transaction::try_from(model)
        })
    }

    /// Lists transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(occurred_at DESC, transaction_id
    /// DESC)`. The returned cursor is `None` on the last page.
    pub async fn list_transactions(
        &self,
        actor: Actor,
        filter: &TransactionListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        validate_list_filter(filter)?;
        if limit == 0 {
            return Err(EngineError::InvalidValue("limit must be > 0".to_string()));
        }
        let cursor = cursor.map(TransactionsCursor::decode).transpose()?;
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(actor.account_id))
                .filter(transactions::Column::Deleted.is_null())
                .apply_tx_filters(filter)
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1));

            if let Some(cursor) = &cursor {
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::OccurredAt.lt(cursor.occurred_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::OccurredAt.eq(cursor.occurred_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }

            let rows = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;
            let out = rows
                .into_iter()
                .take(limit as usize)
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let next_cursor = if has_more {
                out.last()
                    .map(|tx| {
                        TransactionsCursor {
                            occurred_at: tx.occurred_at,
                            transaction_id: tx.id,
                        }
                        .encode()
                    })
                    .transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    /// Edit a regular transaction. Card payment rows are rejected.
    pub async fn update_transaction(
        &self,
        actor: Actor,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> ResultEngine<Transaction> {
        let amount_minor = update
            .amount_minor
            .map(|amount| require_positive(amount, "transaction amount"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, actor, transaction_id)
                .await?;
            reject_card_payment(&model, "update")?;
            self.check_transaction_refs(
                &db_tx,
                actor,
                update.category_id.flatten(),
                update.card_id.flatten(),
            )
            .await?;

            let mut active: transactions::ActiveModel = model.into();
            if let Some(amount_minor) = amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(kind) = update.transaction_type {
                active.transaction_type = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(description) = &update.description {
                active.description =
                    ActiveValue::Set(normalize_optional_text(description.as_deref()));
            }
            if let Some(occurred_at) = update.occurred_at {
                active.occurred_at = ActiveValue::Set(occurred_at);
            }
            if let Some(category_id) = update.category_id {
                active.category_id = ActiveValue::Set(category_id);
            }
            if let Some(card_id) = update.card_id {
                active.card_id = ActiveValue::Set(card_id);
            }
            let model = active.update(&db_tx).await?;
            Transaction::try_from(model)
        })
    }

    /// Duplicate a transaction under a new id.
    ///
    /// The copy happens now unless `occurred_at` is given.
    pub async fn copy_transaction(
        &self,
        actor: Actor,
        transaction_id: Uuid,
        occurred_at: Option<DateTime<Utc>>,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, actor, transaction_id)
                .await?;
            reject_card_payment(&model, "copy")?;
            let source = Transaction::try_from(model)?;
            let now = Utc::now();
            let copy = Transaction {
                id: Uuid::new_v4(),
                occurred_at: occurred_at.unwrap_or(now),
                created_by: actor.user_id,
                created_at: now,
                ..source
            };
            transactions::ActiveModel::from_transaction(&copy, actor.account_id)
                .insert(&db_tx)
                .await?;
            Ok(copy)
        })
    }

    pub async fn delete_transaction(&self, actor: Actor, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, actor, transaction_id)
                .await?;
            reject_card_payment(&model, "delete")?;
            let mut active: transactions::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }

    /// Record a payment from a debit or cash card to a credit card as two
    /// linked transactions.
    pub async fn create_card_payment(
        &self,
        actor: Actor,
        cmd: CardPaymentCmd,
    ) -> ResultEngine<CardPayment> {
        if cmd.from_card_id == cmd.to_card_id {
            return Err(EngineError::CardPayment(
                "source and destination cards must differ".to_string(),
            ));
        }
        let (from_minor, to_minor) = card_payment_amounts(cmd.amount_minor)?;
        let description = normalize_optional_text(cmd.description.as_deref())
            .unwrap_or_else(|| CARD_PAYMENT_DESCRIPTION.to_string());

        with_tx!(self, |db_tx| {
            let from_card = self.reference_card(&db_tx, actor, cmd.from_card_id).await?;
            let to_card = self.reference_card(&db_tx, actor, cmd.to_card_id).await?;
            check_card_payment_route(
                CardType::try_from(from_card.card_type.as_str())?,
                CardType::try_from(to_card.card_type.as_str())?,
            )?;

            let card_payment_id = Uuid::new_v4();
            let now = Utc::now();
            let side = |card_id: Uuid, amount_minor: i64| Transaction {
                id: Uuid::new_v4(),
                amount_minor,
                transaction_type: TransactionType::Regular,
                description: Some(description.clone()),
                occurred_at: cmd.occurred_at,
                category_id: None,
                card_id: Some(card_id),
                card_payment_id: Some(card_payment_id),
                created_by: actor.user_id,
                created_at: now,
            };
            let from = side(cmd.from_card_id, from_minor);
            let to = side(cmd.to_card_id, to_minor);
            for tx in [&from, &to] {
                transactions::ActiveModel::from_transaction(tx, actor.account_id)
                    .insert(&db_tx)
                    .await?;
            }
            tracing::debug!(%card_payment_id, "card payment recorded");
            Ok(CardPayment {
                card_payment_id,
                from,
                to,
            })
        })
    }

    /// Remove both sides of a card payment.
    pub async fn delete_card_payment(&self, actor: Actor, card_payment_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = transactions::Entity::update_many()
                .col_expr(transactions::Column::Deleted, Expr::value(Utc::now()))
                .filter(transactions::Column::AccountId.eq(actor.account_id))
                .filter(transactions::Column::CardPaymentId.eq(card_payment_id))
                .filter(transactions::Column::Deleted.is_null())
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(
                    "card payment not exists".to_string(),
                ));
            }
            Ok(())
        })
    }
}
