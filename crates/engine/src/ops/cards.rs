use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, Card, CardCmd, CardUpdate, EngineError, ResultEngine, cards,
    util::normalize_display_name,
};

use super::{Engine, normalize_optional_text, with_tx};

fn normalize_last_four(value: Option<&str>) -> ResultEngine<Option<String>> {
    let Some(digits) = normalize_optional_text(value) else {
        return Ok(None);
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidValue(
            "last_four must be exactly 4 digits".to_string(),
        ));
    }
    Ok(Some(digits))
}

impl Engine {
    pub async fn list_cards(&self, actor: Actor) -> ResultEngine<Vec<Card>> {
        with_tx!(self, |db_tx| {
            cards::Entity::find()
                .filter(cards::Column::AccountId.eq(actor.account_id))
                .filter(cards::Column::Deleted.is_null())
                .order_by_asc(cards::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Card::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn card(&self, actor: Actor, card_id: Uuid) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, actor, card_id).await?;
            Card::try_from(model)
        })
    }

    pub async fn create_card(&self, actor: Actor, cmd: CardCmd) -> ResultEngine<Card> {
        let name = normalize_display_name(&cmd.name, "card")?;
        let last_four = normalize_last_four(cmd.last_four.as_deref())?;
        with_tx!(self, |db_tx| {
            let model = cards::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                account_id: ActiveValue::Set(actor.account_id),
                name: ActiveValue::Set(name),
                card_type: ActiveValue::Set(cmd.card_type.as_str().to_string()),
                last_four: ActiveValue::Set(last_four),
                created_at: ActiveValue::Set(Utc::now()),
                deleted: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Card::try_from(model)
        })
    }

    pub async fn update_card(
        &self,
        actor: Actor,
        card_id: Uuid,
        update: CardUpdate,
    ) -> ResultEngine<Card> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_display_name(name, "card"))
            .transpose()?;
        let last_four = update
            .last_four
            .as_ref()
            .map(|value| normalize_last_four(value.as_deref()))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, actor, card_id).await?;
            let mut active: cards::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(card_type) = update.card_type {
                active.card_type = ActiveValue::Set(card_type.as_str().to_string());
            }
            if let Some(last_four) = last_four {
                active.last_four = ActiveValue::Set(last_four);
            }
            let model = active.update(&db_tx).await?;
            Card::try_from(model)
        })
    }

    /// Soft-delete a card. Its transactions keep pointing at it.
    pub async fn delete_card(&self, actor: Actor, card_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, actor, card_id).await?;
            let mut active: cards::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }
}
