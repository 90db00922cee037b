//! Transaction primitives.
//!
//! A `Transaction` is a signed movement of money, optionally tagged with a
//! category and the card it was paid with. Two transactions sharing a
//! `card_payment_id` form a card payment: money moved from one card to
//! another.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CardType, EngineError, MoneyCents, ResultEngine, money::require_in_range};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Regular,
    Return,
    Income,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Return => "RETURN",
            Self::Income => "INCOME",
        }
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "REGULAR" => Ok(Self::Regular),
            "RETURN" => Ok(Self::Return),
            "INCOME" => Ok(Self::Income),
            other => Err(EngineError::InvalidValue(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub amount_minor: i64,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub category_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub card_payment_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_card_payment(&self) -> bool {
        self.card_payment_id.is_some()
    }

    /// Contribution of this transaction to spend: returns count negatively.
    pub fn spend(&self) -> MoneyCents {
        let amount = MoneyCents::new(self.amount_minor);
        match self.transaction_type {
            TransactionType::Return => -amount,
            TransactionType::Regular | TransactionType::Income => amount,
        }
    }
}

/// Spend of a set of transactions: purchases minus returns.
pub fn spent<'a, I>(transactions: I) -> ResultEngine<MoneyCents>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    MoneyCents::try_sum(transactions.into_iter().map(Transaction::spend))
}

/// Signed amounts of the two sides of a card payment: `(from, to)`.
///
/// The source card is debited and the destination card credited by the same
/// amount, so the pair always sums to zero.
pub fn card_payment_amounts(amount_minor: i64) -> ResultEngine<(i64, i64)> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "card payment amount must be > 0".to_string(),
        ));
    }
    let amount_minor = require_in_range(amount_minor, "card payment amount")?;
    Ok((-amount_minor, amount_minor))
}

/// A card payment settles a credit card from a debit or cash card.
pub(crate) fn check_card_payment_route(from: CardType, to: CardType) -> ResultEngine<()> {
    if from == CardType::Credit {
        return Err(EngineError::CardPayment(
            "a card payment cannot be made from a credit card".to_string(),
        ));
    }
    if to != CardType::Credit {
        return Err(EngineError::CardPayment(
            "a card payment must go to a credit card".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub transaction_type: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub category_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub card_payment_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CardId",
        to = "super::cards::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Card,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Card.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_transaction(tx: &Transaction, account_id: Uuid) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            account_id: ActiveValue::Set(account_id),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            transaction_type: ActiveValue::Set(tx.transaction_type.as_str().to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            category_id: ActiveValue::Set(tx.category_id),
            card_id: ActiveValue::Set(tx.card_id),
            card_payment_id: ActiveValue::Set(tx.card_payment_id),
            created_by: ActiveValue::Set(tx.created_by),
            created_at: ActiveValue::Set(tx.created_at),
            deleted: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            amount_minor: model.amount_minor,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            description: model.description,
            occurred_at: model.occurred_at,
            category_id: model.category_id,
            card_id: model.card_id,
            card_payment_id: model.card_payment_id,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(amount_minor: i64, transaction_type: TransactionType) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            amount_minor,
            transaction_type,
            description: None,
            occurred_at: Utc::now(),
            category_id: None,
            card_id: None,
            card_payment_id: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn returns_reduce_spend() {
        let txs = vec![
            tx(50_00, TransactionType::Regular),
            tx(20_00, TransactionType::Return),
        ];
        assert_eq!(spent(&txs).unwrap(), MoneyCents::new(30_00));
    }

    #[test]
    fn non_return_types_increase_spend() {
        let txs = vec![
            tx(10_00, TransactionType::Regular),
            tx(5_00, TransactionType::Income),
        ];
        assert_eq!(spent(&txs).unwrap(), MoneyCents::new(15_00));
    }

    #[test]
    fn spend_keeps_the_stored_sign() {
        let txs = vec![tx(-10_00, TransactionType::Regular)];
        assert_eq!(spent(&txs).unwrap(), MoneyCents::new(-10_00));
    }

    #[test]
    fn card_payment_pair_sums_to_zero() {
        let (from, to) = card_payment_amounts(75_00).unwrap();
        assert_eq!(from, -75_00);
        assert_eq!(to, 75_00);
        assert_eq!(from + to, 0);
    }

    #[test]
    fn card_payment_rejects_non_positive_amounts() {
        assert!(card_payment_amounts(0).is_err());
        assert!(card_payment_amounts(-1).is_err());
        assert!(card_payment_amounts(crate::MAX_AMOUNT_MINOR + 1).is_err());
    }

    #[test]
    fn card_payment_goes_from_debit_or_cash_to_credit() {
        assert!(check_card_payment_route(CardType::Debit, CardType::Credit).is_ok());
        assert!(check_card_payment_route(CardType::Cash, CardType::Credit).is_ok());
        for (from, to) in [
            (CardType::Credit, CardType::Credit),
            (CardType::Credit, CardType::Debit),
            (CardType::Debit, CardType::Cash),
        ] {
            assert!(matches!(
                check_card_payment_route(from, to),
                Err(EngineError::CardPayment(_))
            ));
        }
    }
}
