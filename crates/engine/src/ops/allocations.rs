use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, Allocation, AllocationCmd, AllocationUpdate, EngineError, ResultEngine, allocations,
    split_signed_amount,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Allocations of a pocket, newest first.
    pub async fn list_allocations(
        &self,
        actor: Actor,
        pocket_id: Uuid,
    ) -> ResultEngine<Vec<Allocation>> {
        with_tx!(self, |db_tx| {
            self.require_pocket(&db_tx, actor, pocket_id).await?;
            let models = allocations::Entity::find()
                .filter(allocations::Column::PocketId.eq(pocket_id))
                .filter(allocations::Column::Deleted.is_null())
                .order_by_desc(allocations::Column::OccurredAt)
                .order_by_desc(allocations::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            Ok::<_, EngineError>(models.into_iter().map(Allocation::from).collect())
        })
    }

    /// Deposit into or withdraw from a pocket.
    pub async fn create_allocation(
        &self,
        actor: Actor,
        pocket_id: Uuid,
        cmd: AllocationCmd,
    ) -> ResultEngine<Allocation> {
        let (amount_minor, withdrawal) = split_signed_amount(cmd.amount_minor, cmd.withdrawal)?;
        with_tx!(self, |db_tx| {
            self.require_pocket(&db_tx, actor, pocket_id).await?;
            let now = Utc::now();
            let model = allocations::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                account_id: ActiveValue::Set(actor.account_id),
                pocket_id: ActiveValue::Set(pocket_id),
                amount_minor: ActiveValue::Set(amount_minor),
                withdrawal: ActiveValue::Set(withdrawal),
                note: ActiveValue::Set(normalize_optional_text(cmd.note.as_deref())),
                occurred_at: ActiveValue::Set(cmd.occurred_at.unwrap_or(now)),
                created_at: ActiveValue::Set(now),
                deleted: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Ok::<_, EngineError>(Allocation::from(model))
        })
    }

    pub async fn update_allocation(
        &self,
        actor: Actor,
        allocation_id: Uuid,
        update: AllocationUpdate,
    ) -> ResultEngine<Allocation> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_allocation(&db_tx, actor, allocation_id)
                .await?;
            let (amount_minor, withdrawal) = split_signed_amount(
                update.amount_minor.unwrap_or(model.amount_minor),
                update.withdrawal.unwrap_or(model.withdrawal),
            )?;

            let mut active: allocations::ActiveModel = model.into();
            active.amount_minor = ActiveValue::Set(amount_minor);
            active.withdrawal = ActiveValue::Set(withdrawal);
            if let Some(note) = &update.note {
                active.note = ActiveValue::Set(normalize_optional_text(note.as_deref()));
            }
            if let Some(occurred_at) = update.occurred_at {
                active.occurred_at = ActiveValue::Set(occurred_at);
            }
            let model = active.update(&db_tx).await?;
            Ok::<_, EngineError>(Allocation::from(model))
        })
    }

    pub async fn delete_allocation(&self, actor: Actor, allocation_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_allocation(&db_tx, actor, allocation_id)
                .await?;
            let mut active: allocations::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }
}
