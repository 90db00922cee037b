use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Actor, Budget, BudgetCategory, BudgetDraft, BudgetSummary, BudgetUpdate, EngineError, Income,
    ResultEngine, Transaction, budget_categories, budgets, budgets::validate_window, categories,
    incomes, summarize, transactions,
    util::normalize_display_name,
};

use super::{Engine, require_non_negative, with_tx};

/// A budget with its incomes and category allocations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetDetail {
    pub budget: Budget,
    pub incomes: Vec<Income>,
    pub categories: Vec<BudgetCategory>,
}

impl Engine {
    pub(super) async fn budget_incomes(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<Vec<Income>> {
        incomes::Entity::find()
            .filter(incomes::Column::BudgetId.eq(budget_id))
            .filter(incomes::Column::Deleted.is_null())
            .order_by_asc(incomes::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Income::try_from)
            .collect()
    }

    async fn budget_lines(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<Vec<BudgetCategory>> {
        let rows = budget_categories::Entity::find()
            .filter(budget_categories::Column::BudgetId.eq(budget_id))
            .filter(budget_categories::Column::Deleted.is_null())
            .find_also_related(categories::Entity)
            .filter(categories::Column::Deleted.is_null())
            .order_by_asc(categories::Column::NameNorm)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(line, category)| {
                category.map(|category| BudgetCategory::from_models(line, &category))
            })
            .collect())
    }

    async fn budget_detail(
        &self,
        db: &DatabaseTransaction,
        model: budgets::Model,
    ) -> ResultEngine<BudgetDetail> {
        let incomes = self.budget_incomes(db, model.id).await?;
        let categories = self.budget_lines(db, model.id).await?;
        Ok(BudgetDetail {
            budget: Budget::try_from(model)?,
            incomes,
            categories,
        })
    }

    /// Create a budget with its incomes and category allocations at once.
    ///
    /// Category lines naming an unknown category create it. A category listed
    /// twice keeps the last amount.
    pub async fn create_budget(&self, actor: Actor, draft: BudgetDraft) -> ResultEngine<BudgetDetail> {
        let name = normalize_display_name(&draft.name, "budget")?;
        validate_window(draft.start_at, draft.end_at)?;
        let income_rows = draft
            .incomes
            .iter()
            .map(|income| -> ResultEngine<(String, i64)> {
                Ok((
                    normalize_display_name(&income.source, "income source")?,
                    require_non_negative(income.amount_minor, "income amount")?,
                ))
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        for line in &draft.categories {
            require_non_negative(line.allocated_minor, "allocated amount")?;
        }

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let budget = budgets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                account_id: ActiveValue::Set(actor.account_id),
                name: ActiveValue::Set(name),
                period: ActiveValue::Set(draft.period.as_str().to_string()),
                strategy: ActiveValue::Set(draft.strategy.as_str().to_string()),
                start_at: ActiveValue::Set(draft.start_at),
                end_at: ActiveValue::Set(draft.end_at),
                created_at: ActiveValue::Set(now),
                deleted: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            for ((source, amount_minor), income) in income_rows.into_iter().zip(&draft.incomes) {
                incomes::new_active_model(
                    actor.account_id,
                    budget.id,
                    source,
                    amount_minor,
                    income.frequency,
                    income.is_planned,
                    now,
                )
                .insert(&db_tx)
                .await?;
            }

            for line in &draft.categories {
                let category = self
                    .resolve_category_ref(&db_tx, actor, &line.category)
                    .await?;
                self.upsert_budget_category(
                    &db_tx,
                    actor,
                    budget.id,
                    &category,
                    line.allocated_minor,
                )
                .await?;
            }

            tracing::debug!(budget_id = %budget.id, "budget created");
            self.budget_detail(&db_tx, budget).await
        })
    }

    /// Live budgets of the account, most recent start first.
    pub async fn list_budgets(&self, actor: Actor) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            budgets::Entity::find()
                .filter(budgets::Column::AccountId.eq(actor.account_id))
                .filter(budgets::Column::Deleted.is_null())
                .order_by_desc(budgets::Column::StartAt)
                .order_by_desc(budgets::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Budget::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn budget(&self, actor: Actor, budget_id: Uuid) -> ResultEngine<BudgetDetail> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, actor, budget_id).await?;
            self.budget_detail(&db_tx, model).await
        })
    }

    pub async fn update_budget(
        &self,
        actor: Actor,
        budget_id: Uuid,
        update: BudgetUpdate,
    ) -> ResultEngine<Budget> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_display_name(name, "budget"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, actor, budget_id).await?;
            let start_at = update.start_at.unwrap_or(model.start_at);
            let end_at = update.end_at.unwrap_or(model.end_at);
            validate_window(start_at, end_at)?;

            let mut active: budgets::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(period) = update.period {
                active.period = ActiveValue::Set(period.as_str().to_string());
            }
            if let Some(strategy) = update.strategy {
                active.strategy = ActiveValue::Set(strategy.as_str().to_string());
            }
            active.start_at = ActiveValue::Set(start_at);
            active.end_at = ActiveValue::Set(end_at);
            let model = active.update(&db_tx).await?;
            Budget::try_from(model)
        })
    }

    /// Soft-delete a budget with its incomes and allocations.
    pub async fn delete_budget(&self, actor: Actor, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, actor, budget_id).await?;
            let now = Utc::now();
            incomes::Entity::update_many()
                .col_expr(incomes::Column::Deleted, Expr::value(now))
                .filter(incomes::Column::BudgetId.eq(model.id))
                .filter(incomes::Column::Deleted.is_null())
                .exec(&db_tx)
                .await?;
            budget_categories::Entity::update_many()
                .col_expr(budget_categories::Column::Deleted, Expr::value(now))
                .filter(budget_categories::Column::BudgetId.eq(model.id))
                .filter(budget_categories::Column::Deleted.is_null())
                .exec(&db_tx)
                .await?;
            let mut active: budgets::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(now));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }

    /// Totals, balance and per-category spend of a budget.
    pub async fn budget_summary(&self, actor: Actor, budget_id: Uuid) -> ResultEngine<BudgetSummary> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, actor, budget_id).await?;
            let detail = self.budget_detail(&db_tx, model).await?;
            let category_ids: Vec<Uuid> =
                detail.categories.iter().map(|line| line.category_id).collect();

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(actor.account_id))
                .filter(transactions::Column::Deleted.is_null())
                .filter(transactions::Column::CategoryId.is_in(category_ids))
                .filter(transactions::Column::OccurredAt.gte(detail.budget.start_at));
            if let Some(end_at) = detail.budget.end_at {
                query = query.filter(transactions::Column::OccurredAt.lte(end_at));
            }
            let txs = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            summarize(&detail.budget, &detail.incomes, &detail.categories, &txs)
        })
    }
}
