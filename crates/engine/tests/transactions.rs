use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::Database;

use engine::{
    Actor, CardCmd, CardPaymentCmd, CardType, CardUpdate, Engine, EngineError, SignUpCmd,
    TransactionCmd, TransactionListFilter, TransactionType, TransactionUpdate,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_actor() -> (Engine, Actor) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let actor = sign_up(&engine, "alice@example.com").await;
    (engine, actor)
}

async fn sign_up(engine: &Engine, email: &str) -> Actor {
    engine
        .sign_up(SignUpCmd {
            account_name: Some("Home".to_string()),
            email: email.to_string(),
            name: "Alice".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap()
        .user
        .actor()
}

async fn card(engine: &Engine, actor: Actor, name: &str, card_type: CardType) -> Uuid {
    engine
        .create_card(
            actor,
            CardCmd {
                name: name.to_string(),
                card_type,
                last_four: Some("4242".to_string()),
            },
        )
        .await
        .unwrap()
        .id
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 10, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn create_and_fetch_transaction() {
    let (engine, actor) = engine_with_actor().await;
    let category = engine
        .create_category(actor, "Groceries", None)
        .await
        .unwrap();

    let tx = engine
        .create_transaction(
            actor,
            TransactionCmd::new(12_50, TransactionType::Regular, at(9))
                .description("  market ")
                .category_id(category.id),
        )
        .await
        .unwrap();
    assert_eq!(tx.description.as_deref(), Some("market"));
    assert_eq!(tx.created_by, actor.user_id);

    let fetched = engine.transaction(actor, tx.id).await.unwrap();
    assert_eq!(fetched, tx);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let (engine, actor) = engine_with_actor().await;
    let err = engine
        .create_transaction(actor, TransactionCmd::new(0, TransactionType::Regular, at(9)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn foreign_references_are_forbidden() {
    let (engine, alice) = engine_with_actor().await;
    let bob = sign_up(&engine, "bob@example.com").await;
    let bob_card = card(&engine, bob, "Bob debit", CardType::Debit).await;

    let err = engine
        .create_transaction(
            alice,
            TransactionCmd::new(5_00, TransactionType::Regular, at(9)).card_id(bob_card),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .create_transaction(
            alice,
            TransactionCmd::new(5_00, TransactionType::Regular, at(9)).category_id(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn list_pages_newest_first() {
    let (engine, actor) = engine_with_actor().await;
    for hour in 1..=5 {
        engine
            .create_transaction(
                actor,
                TransactionCmd::new(i64::from(hour) * 100, TransactionType::Regular, at(hour)),
            )
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let (first, cursor) = engine
        .list_transactions(actor, &filter, 2, None)
        .await
        .unwrap();
    assert_eq!(
        first.iter().map(|tx| tx.amount_minor).collect::<Vec<_>>(),
        [500, 400]
    );
    let cursor = cursor.unwrap();

    let (second, cursor) = engine
        .list_transactions(actor, &filter, 2, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(
        second.iter().map(|tx| tx.amount_minor).collect::<Vec<_>>(),
        [300, 200]
    );

    let (last, cursor) = engine
        .list_transactions(actor, &filter, 2, cursor.as_deref())
        .await
        .unwrap();
    assert_eq!(last.len(), 1);
    assert!(cursor.is_none());
}

#[tokio::test]
async fn list_applies_filters() {
    let (engine, actor) = engine_with_actor().await;
    let debit = card(&engine, actor, "Debit", CardType::Debit).await;
    engine
        .create_transaction(
            actor,
            TransactionCmd::new(1_00, TransactionType::Regular, at(8)).card_id(debit),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            actor,
            TransactionCmd::new(2_00, TransactionType::Return, at(9)).card_id(debit),
        )
        .await
        .unwrap();
    engine
        .create_transaction(actor, TransactionCmd::new(3_00, TransactionType::Regular, at(10)))
        .await
        .unwrap();

    let by_card = TransactionListFilter {
        card_id: Some(debit),
        ..Default::default()
    };
    let (items, _) = engine
        .list_transactions(actor, &by_card, 10, None)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let returns = TransactionListFilter {
        transaction_type: Some(TransactionType::Return),
        ..Default::default()
    };
    let (items, _) = engine
        .list_transactions(actor, &returns, 10, None)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].amount_minor, 2_00);

    let window = TransactionListFilter {
        from: Some(at(9)),
        to: Some(at(10)),
        ..Default::default()
    };
    let (items, _) = engine
        .list_transactions(actor, &window, 10, None)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);

    let err = engine
        .list_transactions(actor, &TransactionListFilter::default(), 10, Some("garbage"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn update_copy_and_delete() {
    let (engine, actor) = engine_with_actor().await;
    let tx = engine
        .create_transaction(
            actor,
            TransactionCmd::new(10_00, TransactionType::Regular, at(9)).description("lunch"),
        )
        .await
        .unwrap();

    let updated = engine
        .update_transaction(
            actor,
            tx.id,
            TransactionUpdate {
                amount_minor: Some(12_00),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount_minor, 12_00);
    assert_eq!(updated.description, None);

    let copy = engine
        .copy_transaction(actor, tx.id, Some(at(20)))
        .await
        .unwrap();
    assert_ne!(copy.id, tx.id);
    assert_eq!(copy.amount_minor, 12_00);
    assert_eq!(copy.occurred_at, at(20));

    let before = Utc::now();
    let copy_now = engine.copy_transaction(actor, tx.id, None).await.unwrap();
    assert!(copy_now.occurred_at >= before - Duration::seconds(1));

    engine.delete_transaction(actor, tx.id).await.unwrap();
    let err = engine.transaction(actor, tx.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let (items, _) = engine
        .list_transactions(actor, &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn card_payment_moves_money_between_cards() {
    let (engine, actor) = engine_with_actor().await;
    let debit = card(&engine, actor, "Debit", CardType::Debit).await;
    let credit = card(&engine, actor, "Credit", CardType::Credit).await;

    let payment = engine
        .create_card_payment(
            actor,
            CardPaymentCmd {
                from_card_id: debit,
                to_card_id: credit,
                amount_minor: 80_00,
                occurred_at: at(12),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(payment.from.amount_minor, -80_00);
    assert_eq!(payment.to.amount_minor, 80_00);
    assert_eq!(payment.from.card_payment_id, Some(payment.card_payment_id));
    assert_eq!(payment.to.transaction_type, TransactionType::Regular);

    let err = engine
        .delete_transaction(actor, payment.from.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CardPayment(_)));
    let err = engine
        .update_transaction(actor, payment.to.id, TransactionUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CardPayment(_)));
    let err = engine
        .copy_transaction(actor, payment.to.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CardPayment(_)));

    engine
        .delete_card_payment(actor, payment.card_payment_id)
        .await
        .unwrap();
    let (items, _) = engine
        .list_transactions(actor, &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert!(items.is_empty());

    let err = engine
        .delete_card_payment(actor, payment.card_payment_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn card_payment_needs_two_cards() {
    let (engine, actor) = engine_with_actor().await;
    let debit = card(&engine, actor, "Debit", CardType::Debit).await;
    let err = engine
        .create_card_payment(
            actor,
            CardPaymentCmd {
                from_card_id: debit,
                to_card_id: debit,
                amount_minor: 1_00,
                occurred_at: at(12),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CardPayment(_)));
}

#[tokio::test]
async fn card_payment_only_pays_off_credit_cards() {
    let (engine, actor) = engine_with_actor().await;
    let debit = card(&engine, actor, "Debit", CardType::Debit).await;
    let cash = card(&engine, actor, "Wallet", CardType::Cash).await;
    let visa = card(&engine, actor, "Visa", CardType::Credit).await;
    let amex = card(&engine, actor, "Amex", CardType::Credit).await;
    let pay = |from_card_id, to_card_id| CardPaymentCmd {
        from_card_id,
        to_card_id,
        amount_minor: 25_00,
        occurred_at: at(12),
        description: None,
    };

    for (from, to) in [(visa, amex), (visa, debit), (debit, cash)] {
        let err = engine
            .create_card_payment(actor, pay(from, to))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::CardPayment(_)));
    }
    let (items, _) = engine
        .list_transactions(actor, &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert!(items.is_empty());

    let payment = engine.create_card_payment(actor, pay(cash, visa)).await.unwrap();
    assert_eq!(payment.from.card_id, Some(cash));
    assert_eq!(payment.to.card_id, Some(visa));
}

#[tokio::test]
async fn deleted_cards_keep_their_transactions() {
    let (engine, actor) = engine_with_actor().await;
    let debit = card(&engine, actor, "Debit", CardType::Debit).await;
    let tx = engine
        .create_transaction(
            actor,
            TransactionCmd::new(7_00, TransactionType::Regular, at(9)).card_id(debit),
        )
        .await
        .unwrap();

    let renamed = engine
        .update_card(
            actor,
            debit,
            CardUpdate {
                name: Some("Main debit".to_string()),
                last_four: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Main debit");
    assert_eq!(renamed.last_four, None);

    engine.delete_card(actor, debit).await.unwrap();
    assert!(engine.list_cards(actor).await.unwrap().is_empty());
    let fetched = engine.transaction(actor, tx.id).await.unwrap();
    assert_eq!(fetched.card_id, Some(debit));
}
