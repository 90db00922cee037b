use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Income, IncomeDraft, IncomeUpdate, ResultEngine, incomes,
    util::normalize_display_name,
};

use super::{Engine, require_non_negative, with_tx};

impl Engine {
    pub async fn list_incomes(&self, actor: Actor, budget_id: Uuid) -> ResultEngine<Vec<Income>> {
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, actor, budget_id).await?;
            self.budget_incomes(&db_tx, budget_id).await
        })
    }

    pub async fn add_income(
        &self,
        actor: Actor,
        budget_id: Uuid,
        draft: IncomeDraft,
    ) -> ResultEngine<Income> {
        let source = normalize_display_name(&draft.source, "income source")?;
        let amount_minor = require_non_negative(draft.amount_minor, "income amount")?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, actor, budget_id).await?;
            let model = incomes::new_active_model(
                actor.account_id,
                budget_id,
                source,
                amount_minor,
                draft.frequency,
                draft.is_planned,
                Utc::now(),
            )
            .insert(&db_tx)
            .await?;
            Income::try_from(model)
        })
    }

    pub async fn update_income(
        &self,
        actor: Actor,
        income_id: Uuid,
        update: IncomeUpdate,
    ) -> ResultEngine<Income> {
        let source = update
            .source
            .as_deref()
            .map(|source| normalize_display_name(source, "income source"))
            .transpose()?;
        let amount_minor = update
            .amount_minor
            .map(|amount| require_non_negative(amount, "income amount"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self.require_income(&db_tx, actor, income_id).await?;
            let mut active: incomes::ActiveModel = model.into();
            if let Some(source) = source {
                active.source = ActiveValue::Set(source);
            }
            if let Some(amount_minor) = amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(frequency) = update.frequency {
                active.frequency = ActiveValue::Set(frequency.as_str().to_string());
            }
            if let Some(is_planned) = update.is_planned {
                active.is_planned = ActiveValue::Set(is_planned);
            }
            let model = active.update(&db_tx).await?;
            Income::try_from(model)
        })
    }

    pub async fn delete_income(&self, actor: Actor, income_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_income(&db_tx, actor, income_id).await?;
            let mut active: incomes::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }
}
