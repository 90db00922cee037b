//! Budgets: a period, an allocation strategy and a validity window.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Frequency};

/// How a budget distributes its income.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStrategy {
    /// Every unit of income must be allocated.
    ZeroSum,
    /// Categories receive shares of income; leftovers are allowed.
    Percentage,
}

impl BudgetStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZeroSum => "ZERO_SUM",
            Self::Percentage => "PERCENTAGE",
        }
    }
}

impl TryFrom<&str> for BudgetStrategy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ZERO_SUM" => Ok(Self::ZeroSum),
            "PERCENTAGE" => Ok(Self::Percentage),
            other => Err(EngineError::InvalidValue(format!(
                "invalid budget strategy: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub period: Frequency,
    pub strategy: BudgetStrategy,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    /// Whether `at` falls inside `[start_at, end_at]`; an open budget never ends.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_at && self.end_at.is_none_or(|end| at <= end)
    }
}

/// Rejects windows whose end is not after their start.
pub(crate) fn validate_window(
    start_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
) -> Result<(), EngineError> {
    if let Some(end_at) = end_at
        && end_at <= start_at
    {
        return Err(EngineError::InvalidPeriod(
            "end_at must be after start_at".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub period: String,
    pub strategy: String,
    pub start_at: DateTimeUtc,
    pub end_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::incomes::Entity")]
    Incomes,
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    BudgetCategories,
}

impl Related<super::incomes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incomes.def()
    }
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            period: Frequency::try_from(model.period.as_str())?,
            strategy: BudgetStrategy::try_from(model.strategy.as_str())?,
            start_at: model.start_at,
            end_at: model.end_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn budget(end_at: Option<DateTime<Utc>>) -> Budget {
        let start_at = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Budget {
            id: Uuid::new_v4(),
            name: "January".to_string(),
            period: Frequency::Monthly,
            strategy: BudgetStrategy::ZeroSum,
            start_at,
            end_at,
            created_at: start_at,
        }
    }

    #[test]
    fn open_budget_covers_everything_after_start() {
        let b = budget(None);
        assert!(b.covers(b.start_at));
        assert!(b.covers(b.start_at + Duration::days(400)));
        assert!(!b.covers(b.start_at - Duration::seconds(1)));
    }

    #[test]
    fn closed_budget_includes_its_end() {
        let start = budget(None).start_at;
        let b = budget(Some(start + Duration::days(30)));
        assert!(b.covers(start + Duration::days(30)));
        assert!(!b.covers(start + Duration::days(31)));
    }

    #[test]
    fn window_must_end_after_start() {
        let start = budget(None).start_at;
        assert!(validate_window(start, None).is_ok());
        assert!(validate_window(start, Some(start + Duration::days(1))).is_ok());
        assert_eq!(
            validate_window(start, Some(start)),
            Err(EngineError::InvalidPeriod(
                "end_at must be after start_at".to_string()
            ))
        );
    }
}
