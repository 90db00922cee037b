//! Deposits into and withdrawals from a pocket.
//!
//! The stored amount is always positive; the `withdrawal` flag carries the
//! sign.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, money::require_in_range};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub pocket_id: Uuid,
    pub amount_minor: i64,
    pub withdrawal: bool,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Allocation {
    /// Signed contribution to the pocket balance.
    pub fn signed(&self) -> MoneyCents {
        let amount = MoneyCents::new(self.amount_minor);
        if self.withdrawal { -amount } else { amount }
    }
}

/// Splits a caller supplied amount into the stored `(amount, withdrawal)`
/// pair.
///
/// A negative amount is a withdrawal regardless of the flag; zero moves
/// nothing and is rejected.
pub fn split_signed_amount(amount_minor: i64, withdrawal: bool) -> ResultEngine<(i64, bool)> {
    if amount_minor == 0 {
        return Err(EngineError::InvalidAmount(
            "allocation amount must not be 0".to_string(),
        ));
    }
    let abs = require_in_range(amount_minor, "allocation amount")?.abs();
    Ok((abs, withdrawal || amount_minor < 0))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub pocket_id: Uuid,
    pub amount_minor: i64,
    pub withdrawal: bool,
    pub note: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pockets::Entity",
        from = "Column::PocketId",
        to = "super::pockets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Pocket,
}

impl Related<super::pockets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pocket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Allocation {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            pocket_id: model.pocket_id,
            amount_minor: model.amount_minor,
            withdrawal: model.withdrawal,
            note: model.note,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
        }
    }
}
