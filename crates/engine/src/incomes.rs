//! Incomes and the recurrence arithmetic shared with budget periods.
//!
//! An [`Income`] recurs with a [`Frequency`]; a budget covers one period of
//! the same enum. [`normalize_income`] converts an income into the amount it
//! contributes to a single budget period.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, money::overflow};

/// Recurrence of an income, and length of a budget period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    OneTime,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
            Self::OneTime => "ONE_TIME",
        }
    }

    /// Length of one occurrence expressed in weeks.
    ///
    /// `OneTime` has no length and maps to 0.
    pub fn weeks(self) -> f64 {
        match self {
            Self::Weekly => 1.0,
            Self::Monthly => 4.33,
            Self::Quarterly => 13.0,
            Self::Yearly => 52.0,
            Self::OneTime => 0.0,
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "QUARTERLY" => Ok(Self::Quarterly),
            "YEARLY" => Ok(Self::Yearly),
            "ONE_TIME" => Ok(Self::OneTime),
            other => Err(EngineError::InvalidValue(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

/// Returns what `amount`, received every `income_frequency`, is worth over
/// one `budget_period`.
///
/// - same frequency, or a one-time income: the amount is returned unchanged;
/// - income rarer than the period: scaled down by `budget_weeks /
///   income_weeks`, rounded to the cent;
/// - income more frequent than the period: multiplied by the number of
///   occurrences rounded **up**, so a weekly income over a monthly budget
///   counts 5 times, not 4.33.
///
/// Fails with `InvalidAmount` when the scaled amount does not fit in cents.
///
/// # Examples
///
/// ```rust
/// use engine::{Frequency, MoneyCents, normalize_income};
///
/// let weekly = MoneyCents::new(100_00);
/// assert_eq!(
///     normalize_income(weekly, Frequency::Weekly, Frequency::Monthly).unwrap(),
///     MoneyCents::new(500_00)
/// );
/// ```
pub fn normalize_income(
    amount: MoneyCents,
    income_frequency: Frequency,
    budget_period: Frequency,
) -> ResultEngine<MoneyCents> {
    if income_frequency == budget_period || income_frequency == Frequency::OneTime {
        return Ok(amount);
    }

    let income_weeks = income_frequency.weeks();
    let budget_weeks = budget_period.weeks();

    if income_weeks > budget_weeks {
        let scaled = amount.cents() as f64 / income_weeks * budget_weeks;
        Ok(MoneyCents::new(scaled.round() as i64))
    } else {
        let occurrences = (budget_weeks / income_weeks).ceil() as i64;
        amount.checked_times(occurrences).ok_or_else(overflow)
    }
}

/// Sum of every income normalized to `budget_period`.
pub fn normalized_income_total<'a, I>(
    incomes: I,
    budget_period: Frequency,
) -> ResultEngine<MoneyCents>
where
    I: IntoIterator<Item = &'a Income>,
{
    incomes.into_iter().try_fold(MoneyCents::ZERO, |total, income| {
        let normalized = normalize_income(
            MoneyCents::new(income.amount_minor),
            income.frequency,
            budget_period,
        )?;
        total.try_add(normalized)
    })
}

/// Raw sum of income amounts, ignoring their frequency.
pub fn raw_income_total<'a, I>(incomes: I) -> ResultEngine<MoneyCents>
where
    I: IntoIterator<Item = &'a Income>,
{
    MoneyCents::try_sum(
        incomes
            .into_iter()
            .map(|income| MoneyCents::new(income.amount_minor)),
    )
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub source: String,
    pub amount_minor: i64,
    pub frequency: Frequency,
    pub is_planned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub budget_id: Uuid,
    pub source: String,
    pub amount_minor: i64,
    pub frequency: String,
    pub is_planned: bool,
    pub created_at: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Budget,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Income {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            budget_id: model.budget_id,
            source: model.source,
            amount_minor: model.amount_minor,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            is_planned: model.is_planned,
            created_at: model.created_at,
        })
    }
}

pub(crate) fn new_active_model(
    account_id: Uuid,
    budget_id: Uuid,
    source: String,
    amount_minor: i64,
    frequency: Frequency,
    is_planned: bool,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        account_id: ActiveValue::Set(account_id),
        budget_id: ActiveValue::Set(budget_id),
        source: ActiveValue::Set(source),
        amount_minor: ActiveValue::Set(amount_minor),
        frequency: ActiveValue::Set(frequency.as_str().to_string()),
        is_planned: ActiveValue::Set(is_planned),
        created_at: ActiveValue::Set(created_at),
        deleted: ActiveValue::Set(None),
    }
}
