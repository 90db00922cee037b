//! Budget summary: income and allocation totals plus per-category spend.
//!
//! Two income figures are reported side by side. `total_income` is the raw
//! sum of income amounts and drives `remaining`. `normalized_income` scales
//! every income to the budget period and drives `balanced`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Budget, BudgetCategory, BudgetStrategy, Income, MoneyCents, ResultEngine, Transaction,
    normalized_income_total, raw_income_total, spent,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_id: Uuid,
    pub name: String,
    pub allocated: MoneyCents,
    pub spent: MoneyCents,
    pub remaining: MoneyCents,
    pub completed: bool,
    /// Overspend, present only when `spent > allocated`.
    pub over_budget: Option<MoneyCents>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub budget_id: Uuid,
    pub total_income: MoneyCents,
    pub normalized_income: MoneyCents,
    pub total_allocated: MoneyCents,
    pub remaining: MoneyCents,
    /// `None` for percentage budgets.
    pub balanced: Option<bool>,
    pub categories: Vec<CategorySummary>,
}

impl CategorySummary {
    fn new(line: &BudgetCategory, spent: MoneyCents) -> ResultEngine<Self> {
        let allocated = MoneyCents::new(line.allocated_minor);
        let over_budget = if spent > allocated {
            Some(spent.try_sub(allocated)?)
        } else {
            None
        };
        Ok(Self {
            category_id: line.category_id,
            name: line.name.clone(),
            allocated,
            spent,
            remaining: allocated.try_sub(spent)?,
            completed: spent >= allocated,
            over_budget,
        })
    }
}

/// Aggregate a budget.
///
/// Transactions outside the budget window or without an allocated category
/// are ignored, so callers may pass a superset. Totals too large for cents
/// fail with `InvalidAmount`.
pub fn summarize(
    budget: &Budget,
    incomes: &[Income],
    lines: &[BudgetCategory],
    transactions: &[Transaction],
) -> ResultEngine<BudgetSummary> {
    let mut by_category: HashMap<Uuid, Vec<&Transaction>> = HashMap::new();
    for tx in transactions {
        let Some(category_id) = tx.category_id else {
            continue;
        };
        if budget.covers(tx.occurred_at) {
            by_category.entry(category_id).or_default().push(tx);
        }
    }

    let categories = lines
        .iter()
        .map(|line| {
            let spent = match by_category.get(&line.category_id) {
                Some(txs) => spent(txs.iter().copied())?,
                None => MoneyCents::ZERO,
            };
            CategorySummary::new(line, spent)
        })
        .collect::<ResultEngine<Vec<_>>>()?;

    let total_income = raw_income_total(incomes)?;
    let normalized_income = normalized_income_total(incomes, budget.period)?;
    let total_allocated = MoneyCents::try_sum(categories.iter().map(|c| c.allocated))?;
    let balanced = match budget.strategy {
        BudgetStrategy::ZeroSum => Some(normalized_income == total_allocated),
        BudgetStrategy::Percentage => None,
    };

    Ok(BudgetSummary {
        budget_id: budget.id,
        total_income,
        normalized_income,
        total_allocated,
        remaining: total_income.try_sub(total_allocated)?,
        balanced,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::{Frequency, TransactionType};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn budget(strategy: BudgetStrategy) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            name: "March".to_string(),
            period: Frequency::Monthly,
            strategy,
            start_at: at(1),
            end_at: Some(at(31)),
            created_at: at(1),
        }
    }

    fn income(budget_id: Uuid, amount_minor: i64, frequency: Frequency) -> Income {
        Income {
            id: Uuid::new_v4(),
            budget_id,
            source: "salary".to_string(),
            amount_minor,
            frequency,
            is_planned: true,
            created_at: at(1),
        }
    }

    fn line(budget_id: Uuid, category_id: Uuid, allocated_minor: i64) -> BudgetCategory {
        BudgetCategory {
            id: Uuid::new_v4(),
            budget_id,
            category_id,
            name: "Groceries".to_string(),
            allocated_minor,
        }
    }

    fn tx(
        category_id: Uuid,
        amount_minor: i64,
        kind: TransactionType,
        day: u32,
    ) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            amount_minor,
            transaction_type: kind,
            description: None,
            occurred_at: at(day),
            category_id: Some(category_id),
            card_id: None,
            card_payment_id: None,
            created_by: Uuid::new_v4(),
            created_at: at(day),
        }
    }

    #[test]
    fn category_spend_subtracts_returns() {
        let b = budget(BudgetStrategy::Percentage);
        let groceries = Uuid::new_v4();
        let summary = summarize(
            &b,
            &[],
            &[line(b.id, groceries, 100_00)],
            &[
                tx(groceries, 50_00, TransactionType::Regular, 5),
                tx(groceries, 20_00, TransactionType::Return, 6),
            ],
        )
        .unwrap();
        let cat = &summary.categories[0];
        assert_eq!(cat.spent, MoneyCents::new(30_00));
        assert_eq!(cat.remaining, MoneyCents::new(70_00));
        assert!(!cat.completed);
        assert_eq!(cat.over_budget, None);
        assert_eq!(summary.balanced, None);
    }

    #[test]
    fn overspend_is_reported() {
        let b = budget(BudgetStrategy::ZeroSum);
        let groceries = Uuid::new_v4();
        let summary = summarize(
            &b,
            &[],
            &[line(b.id, groceries, 40_00)],
            &[tx(groceries, 55_00, TransactionType::Regular, 10)],
        )
        .unwrap();
        let cat = &summary.categories[0];
        assert!(cat.completed);
        assert_eq!(cat.over_budget, Some(MoneyCents::new(15_00)));
        assert_eq!(cat.remaining, MoneyCents::new(-15_00));
    }

    #[test]
    fn transactions_outside_window_are_ignored() {
        let mut b = budget(BudgetStrategy::Percentage);
        b.start_at = at(10);
        let groceries = Uuid::new_v4();
        let other = Uuid::new_v4();
        let summary = summarize(
            &b,
            &[],
            &[line(b.id, groceries, 10_00)],
            &[
                tx(groceries, 3_00, TransactionType::Regular, 5),
                tx(groceries, 4_00, TransactionType::Regular, 15),
                tx(other, 9_00, TransactionType::Regular, 15),
            ],
        )
        .unwrap();
        assert_eq!(summary.categories[0].spent, MoneyCents::new(4_00));
    }

    #[test]
    fn zero_sum_balance_uses_normalized_income() {
        let b = budget(BudgetStrategy::ZeroSum);
        let rent = Uuid::new_v4();
        let incomes = [income(b.id, 100_00, Frequency::Weekly)];

        let balanced = summarize(&b, &incomes, &[line(b.id, rent, 500_00)], &[]).unwrap();
        assert_eq!(balanced.total_income, MoneyCents::new(100_00));
        assert_eq!(balanced.normalized_income, MoneyCents::new(500_00));
        assert_eq!(balanced.total_allocated, MoneyCents::new(500_00));
        assert_eq!(balanced.remaining, MoneyCents::new(-400_00));
        assert_eq!(balanced.balanced, Some(true));

        let unbalanced = summarize(&b, &incomes, &[line(b.id, rent, 450_00)], &[]).unwrap();
        assert_eq!(unbalanced.balanced, Some(false));
    }

    #[test]
    fn overflowing_income_is_an_invalid_amount() {
        let mut b = budget(BudgetStrategy::ZeroSum);
        b.period = Frequency::Yearly;
        let incomes = [income(b.id, 9_000_000_000_000_000_000, Frequency::Weekly)];
        assert!(matches!(
            summarize(&b, &incomes, &[], &[]),
            Err(crate::EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn overflowing_spend_is_an_invalid_amount() {
        let b = budget(BudgetStrategy::Percentage);
        let groceries = Uuid::new_v4();
        let result = summarize(
            &b,
            &[],
            &[line(b.id, groceries, 0)],
            &[
                tx(groceries, i64::MAX, TransactionType::Regular, 5),
                tx(groceries, 1, TransactionType::Regular, 6),
            ],
        );
        assert!(matches!(result, Err(crate::EngineError::InvalidAmount(_))));
    }
}
