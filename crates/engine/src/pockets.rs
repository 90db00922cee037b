//! Pockets: named sub-buckets of a savings account with an optional goal.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Allocation, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub id: Uuid,
    pub savings_id: Uuid,
    pub name: String,
    pub goal_minor: Option<i64>,
    pub goal_at: Option<DateTime<Utc>>,
    pub total: MoneyCents,
    pub created_at: DateTime<Utc>,
}

impl Pocket {
    pub fn goal_progress_percent(&self) -> Option<f64> {
        goal_progress_percent(self.total, self.goal_minor.map(MoneyCents::new))
    }
}

/// Deposits minus withdrawals.
pub fn pocket_total<'a, I>(allocations: I) -> ResultEngine<MoneyCents>
where
    I: IntoIterator<Item = &'a Allocation>,
{
    MoneyCents::try_sum(allocations.into_iter().map(Allocation::signed))
}

/// Progress towards `goal` in percent, capped at 100.
///
/// Returns `None` when there is no goal or the goal is not positive.
pub fn goal_progress_percent(total: MoneyCents, goal: Option<MoneyCents>) -> Option<f64> {
    let goal = goal.filter(|goal| goal.is_positive())?;
    let percent = total.cents() as f64 / goal.cents() as f64 * 100.0;
    Some(percent.min(100.0))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pockets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub savings_id: Uuid,
    pub name: String,
    pub goal_minor: Option<i64>,
    pub goal_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::savings::Entity",
        from = "Column::SavingsId",
        to = "super::savings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Savings,
    #[sea_orm(has_many = "super::allocations::Entity")]
    Allocations,
}

impl Related<super::savings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Savings.def()
    }
}

impl Related<super::allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Pocket {
    pub(crate) fn from_model(model: Model, allocations: &[Allocation]) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            savings_id: model.savings_id,
            name: model.name,
            goal_minor: model.goal_minor,
            goal_at: model.goal_at,
            total: pocket_total(allocations)?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(amount_minor: i64, withdrawal: bool) -> Allocation {
        Allocation {
            id: Uuid::new_v4(),
            pocket_id: Uuid::nil(),
            amount_minor,
            withdrawal,
            note: None,
            occurred_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn total_subtracts_withdrawals() {
        let allocations = vec![allocation(100_00, false), allocation(30_00, true)];
        assert_eq!(pocket_total(&allocations).unwrap(), MoneyCents::new(70_00));
    }

    #[test]
    fn empty_pocket_is_zero() {
        assert_eq!(pocket_total(&[]).unwrap(), MoneyCents::ZERO);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let allocations = vec![allocation(i64::MAX, false), allocation(1, false)];
        assert!(matches!(
            pocket_total(&allocations),
            Err(crate::EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn progress_is_a_percentage_of_goal() {
        let progress =
            goal_progress_percent(MoneyCents::new(25_00), Some(MoneyCents::new(100_00)));
        assert_eq!(progress, Some(25.0));
    }

    #[test]
    fn progress_clamps_at_one_hundred() {
        let progress =
            goal_progress_percent(MoneyCents::new(250_00), Some(MoneyCents::new(100_00)));
        assert_eq!(progress, Some(100.0));
    }

    #[test]
    fn progress_is_hidden_without_a_positive_goal() {
        assert_eq!(goal_progress_percent(MoneyCents::new(10_00), None), None);
        assert_eq!(
            goal_progress_percent(MoneyCents::new(10_00), Some(MoneyCents::ZERO)),
            None
        );
    }
}
