//! Savings accounts. Their balance is the sum of their pockets.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MoneyCents, Pocket, ResultEngine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub id: Uuid,
    pub name: String,
    pub total: MoneyCents,
    pub pockets: Vec<Pocket>,
    pub created_at: DateTime<Utc>,
}

pub fn savings_total<'a, I>(pockets: I) -> ResultEngine<MoneyCents>
where
    I: IntoIterator<Item = &'a Pocket>,
{
    MoneyCents::try_sum(pockets.into_iter().map(|pocket| pocket.total))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub created_at: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pockets::Entity")]
    Pockets,
}

impl Related<super::pockets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pockets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Savings {
    pub(crate) fn from_model(model: Model, pockets: Vec<Pocket>) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            name: model.name,
            total: savings_total(&pockets)?,
            pockets,
            created_at: model.created_at,
        })
    }
}
