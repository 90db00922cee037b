//! Budgets API endpoints: budgets, their incomes and category allocations.

use api_types::{
    Frequency as ApiFrequency,
    budget::{
        Allocate, BudgetCategoryView, BudgetDetailView, BudgetNew, BudgetStrategy as ApiStrategy,
        BudgetSummaryView, BudgetUpdate, BudgetView, BudgetsResponse, CategoryLine,
        CategorySummaryView, IncomeNew, IncomeUpdate, IncomeView, IncomesResponse,
    },
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    AllocationLine, BudgetDraft, BudgetStrategy, CategoryRef, Frequency, IncomeDraft, User,
};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ValidPath, ValidatedJson},
    server::ServerState,
};

fn map_frequency(frequency: Frequency) -> ApiFrequency {
    match frequency {
        Frequency::Weekly => ApiFrequency::Weekly,
        Frequency::Monthly => ApiFrequency::Monthly,
        Frequency::Quarterly => ApiFrequency::Quarterly,
        Frequency::Yearly => ApiFrequency::Yearly,
        Frequency::OneTime => ApiFrequency::OneTime,
    }
}

fn frequency_from_api(frequency: ApiFrequency) -> Frequency {
    match frequency {
        ApiFrequency::Weekly => Frequency::Weekly,
        ApiFrequency::Monthly => Frequency::Monthly,
        ApiFrequency::Quarterly => Frequency::Quarterly,
        ApiFrequency::Yearly => Frequency::Yearly,
        ApiFrequency::OneTime => Frequency::OneTime,
    }
}

fn map_strategy(strategy: BudgetStrategy) -> ApiStrategy {
    match strategy {
        BudgetStrategy::ZeroSum => ApiStrategy::ZeroSum,
        BudgetStrategy::Percentage => ApiStrategy::Percentage,
    }
}

fn strategy_from_api(strategy: ApiStrategy) -> BudgetStrategy {
    match strategy {
        ApiStrategy::ZeroSum => BudgetStrategy::ZeroSum,
        ApiStrategy::Percentage => BudgetStrategy::Percentage,
    }
}

fn map_budget(budget: engine::Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        name: budget.name,
        period: map_frequency(budget.period),
        strategy: map_strategy(budget.strategy),
        start_at: budget.start_at,
        end_at: budget.end_at,
        created_at: budget.created_at,
    }
}

fn map_income(income: engine::Income) -> IncomeView {
    IncomeView {
        id: income.id,
        budget_id: income.budget_id,
        source: income.source,
        amount_minor: income.amount_minor,
        frequency: map_frequency(income.frequency),
        is_planned: income.is_planned,
        created_at: income.created_at,
    }
}

fn map_line(line: engine::BudgetCategory) -> BudgetCategoryView {
    BudgetCategoryView {
        id: line.id,
        budget_id: line.budget_id,
        category_id: line.category_id,
        name: line.name,
        allocated_minor: line.allocated_minor,
    }
}

fn map_detail(detail: engine::BudgetDetail) -> BudgetDetailView {
    BudgetDetailView {
        budget: map_budget(detail.budget),
        incomes: detail.incomes.into_iter().map(map_income).collect(),
        categories: detail.categories.into_iter().map(map_line).collect(),
    }
}

fn map_summary(summary: engine::BudgetSummary) -> BudgetSummaryView {
    BudgetSummaryView {
        budget_id: summary.budget_id,
        total_income_minor: summary.total_income.cents(),
        normalized_income_minor: summary.normalized_income.cents(),
        total_allocated_minor: summary.total_allocated.cents(),
        remaining_minor: summary.remaining.cents(),
        balanced: summary.balanced,
        categories: summary
            .categories
            .into_iter()
            .map(|c| CategorySummaryView {
                category_id: c.category_id,
                name: c.name,
                allocated_minor: c.allocated.cents(),
                spent_minor: c.spent.cents(),
                remaining_minor: c.remaining.cents(),
                completed: c.completed,
                over_budget_minor: c.over_budget.map(|m| m.cents()),
            })
            .collect(),
    }
}

fn income_draft(income: IncomeNew) -> IncomeDraft {
    IncomeDraft {
        source: income.source,
        amount_minor: income.amount_minor,
        frequency: frequency_from_api(income.frequency),
        is_planned: income.is_planned,
    }
}

fn allocation_line(line: CategoryLine) -> Result<AllocationLine, ServerError> {
    let category = match (line.category_id, line.name) {
        (Some(id), None) => CategoryRef::Id(id),
        (None, Some(name)) => CategoryRef::Name(name),
        (None, None) => {
            return Err(ServerError::Generic(
                "either category_id or name is required".to_string(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(ServerError::Generic(
                "provide only one of category_id or name".to_string(),
            ));
        }
    };
    Ok(AllocationLine {
        category,
        allocated_minor: line.allocated_minor,
    })
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetsResponse>, ServerError> {
    let budgets = state
        .engine
        .list_budgets(user.actor())
        .await?
        .into_iter()
        .map(map_budget)
        .collect();
    Ok(Json(BudgetsResponse { budgets }))
}

/// Submit a complete budget: window, incomes and category allocations.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetDetailView>), ServerError> {
    let categories = payload
        .categories
        .into_iter()
        .map(allocation_line)
        .collect::<Result<Vec<_>, _>>()?;
    let draft = BudgetDraft {
        name: payload.name,
        period: frequency_from_api(payload.period),
        strategy: strategy_from_api(payload.strategy),
        start_at: payload.start_at.with_timezone(&Utc),
        end_at: payload.end_at.map(|dt| dt.with_timezone(&Utc)),
        incomes: payload.incomes.into_iter().map(income_draft).collect(),
        categories,
    };

    let detail = state.engine.create_budget(user.actor(), draft).await?;
    Ok((StatusCode::CREATED, Json(map_detail(detail))))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(budget_id): ValidPath<Uuid>,
) -> Result<Json<BudgetDetailView>, ServerError> {
    let detail = state.engine.budget(user.actor(), budget_id).await?;
    Ok(Json(map_detail(detail)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(budget_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .update_budget(
            user.actor(),
            budget_id,
            engine::BudgetUpdate {
                name: payload.name,
                period: payload.period.map(frequency_from_api),
                strategy: payload.strategy.map(strategy_from_api),
                start_at: payload.start_at.map(|dt| dt.with_timezone(&Utc)),
                end_at: payload
                    .end_at
                    .map(|end| end.map(|dt| dt.with_timezone(&Utc))),
            },
        )
        .await?;
    Ok(Json(map_budget(budget)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(budget_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(user.actor(), budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(budget_id): ValidPath<Uuid>,
) -> Result<Json<BudgetSummaryView>, ServerError> {
    let summary = state.engine.budget_summary(user.actor(), budget_id).await?;
    Ok(Json(map_summary(summary)))
}

pub async fn list_incomes(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(budget_id): ValidPath<Uuid>,
) -> Result<Json<IncomesResponse>, ServerError> {
    let incomes = state
        .engine
        .list_incomes(user.actor(), budget_id)
        .await?
        .into_iter()
        .map(map_income)
        .collect();
    Ok(Json(IncomesResponse { incomes }))
}

pub async fn add_income(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(budget_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<IncomeNew>,
) -> Result<(StatusCode, Json<IncomeView>), ServerError> {
    let income = state
        .engine
        .add_income(user.actor(), budget_id, income_draft(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_income(income))))
}

pub async fn update_income(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(income_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<IncomeUpdate>,
) -> Result<Json<IncomeView>, ServerError> {
    let income = state
        .engine
        .update_income(
            user.actor(),
            income_id,
            engine::IncomeUpdate {
                source: payload.source,
                amount_minor: payload.amount_minor,
                frequency: payload.frequency.map(frequency_from_api),
                is_planned: payload.is_planned,
            },
        )
        .await?;
    Ok(Json(map_income(income)))
}

pub async fn delete_income(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath(income_id): ValidPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_income(user.actor(), income_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the amount a budget allocates to a category, creating the line if needed.
pub async fn allocate(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath((budget_id, category_id)): ValidPath<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<Allocate>,
) -> Result<Json<BudgetCategoryView>, ServerError> {
    let line = state
        .engine
        .allocate_category(user.actor(), budget_id, category_id, payload.allocated_minor)
        .await?;
    Ok(Json(map_line(line)))
}

pub async fn remove_allocation(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidPath((budget_id, category_id)): ValidPath<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_allocation(user.actor(), budget_id, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
