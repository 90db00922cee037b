//! Initial schema: creates every table of the budgeting service.
//!
//! - `accounts`: tenants owning all other rows
//! - `users`, `sessions`: authentication
//! - `budgets`, `incomes`, `categories`, `budget_categories`: budgeting
//! - `cards`, `transactions`: spending
//! - `savings`, `pockets`, `allocations`: savings goals
//!
//! Ids are UUIDs stored as blobs, money is stored in integer cents and
//! soft-deleted rows carry a `deleted` timestamp.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    AccountId,
    Email,
    Name,
    PasswordHash,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Sessions {
    Table,
    Token,
    UserId,
    CreatedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    AccountId,
    Name,
    Period,
    Strategy,
    StartAt,
    EndAt,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Incomes {
    Table,
    Id,
    AccountId,
    BudgetId,
    Source,
    AmountMinor,
    Frequency,
    IsPlanned,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    AccountId,
    Name,
    NameNorm,
    Icon,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum BudgetCategories {
    Table,
    Id,
    AccountId,
    BudgetId,
    CategoryId,
    AllocatedMinor,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    AccountId,
    Name,
    CardType,
    LastFour,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    AccountId,
    AmountMinor,
    TransactionType,
    Description,
    OccurredAt,
    CategoryId,
    CardId,
    CardPaymentId,
    CreatedBy,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Savings {
    Table,
    Id,
    AccountId,
    Name,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Pockets {
    Table,
    Id,
    AccountId,
    SavingsId,
    Name,
    GoalMinor,
    GoalAt,
    CreatedAt,
    Deleted,
}

#[derive(Iden)]
enum Allocations {
    Table,
    Id,
    AccountId,
    PocketId,
    AmountMinor,
    Withdrawal,
    Note,
    OccurredAt,
    CreatedAt,
    Deleted,
}

fn id_col<T: IntoIden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col).blob().not_null().primary_key().to_owned()
}

fn account_col<T: IntoIden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col).blob().not_null().to_owned()
}

fn timestamp_col<T: IntoIden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn deleted_col<T: IntoIden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col).timestamp_with_time_zone().null().to_owned()
}

fn account_fk<T, C>(name: &str, table: T, col: C) -> ForeignKeyCreateStatement
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(Accounts::Table, Accounts::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts, users and sessions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(id_col(Accounts::Id))
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(timestamp_col(Accounts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(account_col(Users::AccountId))
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(timestamp_col(Users::CreatedAt))
                    .col(deleted_col(Users::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-users-account_id",
                        Users::Table,
                        Users::AccountId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::UserId).blob().not_null())
                    .col(timestamp_col(Sessions::CreatedAt))
                    .col(timestamp_col(Sessions::ExpiresAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-user_id")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Budgets, incomes and categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(id_col(Budgets::Id))
                    .col(account_col(Budgets::AccountId))
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(ColumnDef::new(Budgets::Period).string().not_null())
                    .col(ColumnDef::new(Budgets::Strategy).string().not_null())
                    .col(timestamp_col(Budgets::StartAt))
                    .col(ColumnDef::new(Budgets::EndAt).timestamp_with_time_zone().null())
                    .col(timestamp_col(Budgets::CreatedAt))
                    .col(deleted_col(Budgets::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-budgets-account_id",
                        Budgets::Table,
                        Budgets::AccountId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Incomes::Table)
                    .if_not_exists()
                    .col(id_col(Incomes::Id))
                    .col(account_col(Incomes::AccountId))
                    .col(ColumnDef::new(Incomes::BudgetId).blob().not_null())
                    .col(ColumnDef::new(Incomes::Source).string().not_null())
                    .col(ColumnDef::new(Incomes::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Incomes::Frequency).string().not_null())
                    .col(
                        ColumnDef::new(Incomes::IsPlanned)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp_col(Incomes::CreatedAt))
                    .col(deleted_col(Incomes::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-incomes-account_id",
                        Incomes::Table,
                        Incomes::AccountId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incomes-budget_id")
                            .from(Incomes::Table, Incomes::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(id_col(Categories::Id))
                    .col(account_col(Categories::AccountId))
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string().null())
                    .col(timestamp_col(Categories::CreatedAt))
                    .col(deleted_col(Categories::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-categories-account_id",
                        Categories::Table,
                        Categories::AccountId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-account_id-name_norm")
                    .table(Categories::Table)
                    .col(Categories::AccountId)
                    .col(Categories::NameNorm)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(id_col(BudgetCategories::Id))
                    .col(account_col(BudgetCategories::AccountId))
                    .col(ColumnDef::new(BudgetCategories::BudgetId).blob().not_null())
                    .col(ColumnDef::new(BudgetCategories::CategoryId).blob().not_null())
                    .col(
                        ColumnDef::new(BudgetCategories::AllocatedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(timestamp_col(BudgetCategories::CreatedAt))
                    .col(deleted_col(BudgetCategories::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-budget_categories-account_id",
                        BudgetCategories::Table,
                        BudgetCategories::AccountId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-budget_id")
                            .from(BudgetCategories::Table, BudgetCategories::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-category_id")
                            .from(BudgetCategories::Table, BudgetCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_categories-budget_id-category_id")
                    .table(BudgetCategories::Table)
                    .col(BudgetCategories::BudgetId)
                    .col(BudgetCategories::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Cards and transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(id_col(Cards::Id))
                    .col(account_col(Cards::AccountId))
                    .col(ColumnDef::new(Cards::Name).string().not_null())
                    .col(ColumnDef::new(Cards::CardType).string().not_null())
                    .col(ColumnDef::new(Cards::LastFour).string().null())
                    .col(timestamp_col(Cards::CreatedAt))
                    .col(deleted_col(Cards::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-cards-account_id",
                        Cards::Table,
                        Cards::AccountId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(id_col(Transactions::Id))
                    .col(account_col(Transactions::AccountId))
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string().null())
                    .col(timestamp_col(Transactions::OccurredAt))
                    .col(ColumnDef::new(Transactions::CategoryId).blob().null())
                    .col(ColumnDef::new(Transactions::CardId).blob().null())
                    .col(ColumnDef::new(Transactions::CardPaymentId).blob().null())
                    .col(ColumnDef::new(Transactions::CreatedBy).blob().not_null())
                    .col(timestamp_col(Transactions::CreatedAt))
                    .col(deleted_col(Transactions::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-transactions-account_id",
                        Transactions::Table,
                        Transactions::AccountId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-card_id")
                            .from(Transactions::Table, Transactions::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-created_by")
                            .from(Transactions::Table, Transactions::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-occurred_at-id")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::OccurredAt)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-card_payment_id")
                    .table(Transactions::Table)
                    .col(Transactions::CardPaymentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Savings, pockets and allocations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Savings::Table)
                    .if_not_exists()
                    .col(id_col(Savings::Id))
                    .col(account_col(Savings::AccountId))
                    .col(ColumnDef::new(Savings::Name).string().not_null())
                    .col(timestamp_col(Savings::CreatedAt))
                    .col(deleted_col(Savings::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-savings-account_id",
                        Savings::Table,
                        Savings::AccountId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Pockets::Table)
                    .if_not_exists()
                    .col(id_col(Pockets::Id))
                    .col(account_col(Pockets::AccountId))
                    .col(ColumnDef::new(Pockets::SavingsId).blob().not_null())
                    .col(ColumnDef::new(Pockets::Name).string().not_null())
                    .col(ColumnDef::new(Pockets::GoalMinor).big_integer().null())
                    .col(ColumnDef::new(Pockets::GoalAt).timestamp_with_time_zone().null())
                    .col(timestamp_col(Pockets::CreatedAt))
                    .col(deleted_col(Pockets::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-pockets-account_id",
                        Pockets::Table,
                        Pockets::AccountId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pockets-savings_id")
                            .from(Pockets::Table, Pockets::SavingsId)
                            .to(Savings::Table, Savings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Allocations::Table)
                    .if_not_exists()
                    .col(id_col(Allocations::Id))
                    .col(account_col(Allocations::AccountId))
                    .col(ColumnDef::new(Allocations::PocketId).blob().not_null())
                    .col(
                        ColumnDef::new(Allocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Allocations::Withdrawal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Allocations::Note).string().null())
                    .col(timestamp_col(Allocations::OccurredAt))
                    .col(timestamp_col(Allocations::CreatedAt))
                    .col(deleted_col(Allocations::Deleted))
                    .foreign_key(&mut account_fk(
                        "fk-allocations-account_id",
                        Allocations::Table,
                        Allocations::AccountId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-allocations-pocket_id")
                            .from(Allocations::Table, Allocations::PocketId)
                            .to(Pockets::Table, Pockets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        let statements = [
            Table::drop().table(Allocations::Table).if_exists().to_owned(),
            Table::drop().table(Pockets::Table).if_exists().to_owned(),
            Table::drop().table(Savings::Table).if_exists().to_owned(),
            Table::drop().table(Transactions::Table).if_exists().to_owned(),
            Table::drop().table(Cards::Table).if_exists().to_owned(),
            Table::drop().table(BudgetCategories::Table).if_exists().to_owned(),
            Table::drop().table(Categories::Table).if_exists().to_owned(),
            Table::drop().table(Incomes::Table).if_exists().to_owned(),
            Table::drop().table(Budgets::Table).if_exists().to_owned(),
            Table::drop().table(Sessions::Table).if_exists().to_owned(),
            Table::drop().table(Users::Table).if_exists().to_owned(),
            Table::drop().table(Accounts::Table).if_exists().to_owned(),
        ];
        for statement in statements {
            manager.drop_table(statement).await?;
        }
        Ok(())
    }
}
