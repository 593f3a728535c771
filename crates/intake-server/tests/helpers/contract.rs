//! Behaviour shared by every `RecordStore` backend
//!
//! Each check uses freshly generated tokens, so the suite can run against a
//! database or bucket that already holds other records.

use intake_common::{FieldValue, Token};
use intake_server::schema::FieldChanges;
use intake_server::store::{Store, StoreError};
use std::time::Duration;

fn text(s: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(s.to_string()))
}

fn changes(pairs: &[(&str, Option<FieldValue>)]) -> FieldChanges {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub async fn run_store_contract(store: &Store) {
    store.init().await.unwrap();
    store.health().await.unwrap();

    create_and_get(store).await;
    duplicate_token(store).await;
    audited_updates(store).await;
    set_repeat_clear(store).await;
    repeated_update_is_idempotent(store).await;
    clearing_a_field(store).await;
    every_kind_round_trips(store).await;
    unknown_token(store).await;
    overview_ordering(store).await;
}

async fn create_and_get(store: &Store) {
    let token = Token::generate();
    let created = store.create(&token).await.unwrap();

    assert_eq!(created.token, token);
    assert!(created.fields.is_empty());
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(store.get(&token).await.unwrap(), created);
    assert!(store.audit_log(&token).await.unwrap().is_empty());
}

async fn duplicate_token(store: &Store) {
    let token = Token::generate();
    store.create(&token).await.unwrap();

    let err = store.create(&token).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateToken(_)), "{:?}", err);
}

async fn audited_updates(store: &Store) {
    let token = Token::generate();
    let created = store.create(&token).await.unwrap();

    let first = store
        .update(
            &token,
            &changes(&[
                ("firstName", text("Anna")),
                ("age", Some(FieldValue::Integer(21))),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(first.field("firstName"), text("Anna").as_ref());
    assert!(first.updated_at > created.updated_at);
    assert_eq!(first.created_at, created.created_at);
    assert_eq!(store.audit_log(&token).await.unwrap().len(), 2);

    let second = store
        .update(
            &token,
            &changes(&[
                ("firstName", text("Anna")),
                ("age", Some(FieldValue::Integer(22))),
            ]),
        )
        .await
        .unwrap();
    assert!(second.updated_at > first.updated_at);

    let log = store.audit_log(&token).await.unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].field_name, "age");
    assert_eq!(log[0].old_value.as_deref(), Some("21"));
    assert_eq!(log[0].new_value.as_deref(), Some("22"));
    assert_eq!(log[0].changed_at, second.updated_at);
    assert!(log.iter().all(|entry| entry.token == token));
    assert!(log.windows(2).all(|w| w[0].changed_at >= w[1].changed_at));
}

async fn set_repeat_clear(store: &Store) {
    let token = Token::generate();
    store.create(&token).await.unwrap();
    let anna = changes(&[("firstName", text("Anna"))]);

    let record = store.update(&token, &anna).await.unwrap();
    assert_eq!(record.field("firstName"), text("Anna").as_ref());
    let log = store.audit_log(&token).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(
        (log[0].field_name.as_str(), log[0].old_value.as_deref(), log[0].new_value.as_deref()),
        ("firstName", None, Some("Anna"))
    );

    store.update(&token, &anna).await.unwrap();
    assert_eq!(store.audit_log(&token).await.unwrap().len(), 1);

    store
        .update(&token, &changes(&[("firstName", None)]))
        .await
        .unwrap();
    let log = store.audit_log(&token).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(
        (log[0].field_name.as_str(), log[0].old_value.as_deref(), log[0].new_value.as_deref()),
        ("firstName", Some("Anna"), None)
    );
}

async fn repeated_update_is_idempotent(store: &Store) {
    let token = Token::generate();
    store.create(&token).await.unwrap();

    let update = changes(&[("city", text("Batumi")), ("driversLicense", Some(FieldValue::Boolean(true)))]);
    let once = store.update(&token, &update).await.unwrap();
    let twice = store.update(&token, &update).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(store.audit_log(&token).await.unwrap().len(), 2);

    let empty = store.update(&token, &FieldChanges::new()).await.unwrap();
    assert_eq!(empty, once);
}

async fn clearing_a_field(store: &Store) {
    let token = Token::generate();
    store.create(&token).await.unwrap();
    store
        .update(&token, &changes(&[("lastName", text("Beridze"))]))
        .await
        .unwrap();

    let cleared = store
        .update(&token, &changes(&[("lastName", None)]))
        .await
        .unwrap();
    assert!(cleared.field("lastName").is_none());

    let log = store.audit_log(&token).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].old_value.as_deref(), Some("Beridze"));
    assert_eq!(log[0].new_value, None);

    // Clearing an absent field is not a change
    store
        .update(&token, &changes(&[("lastName", None)]))
        .await
        .unwrap();
    assert_eq!(store.audit_log(&token).await.unwrap().len(), 2);
}

async fn every_kind_round_trips(store: &Store) {
    let token = Token::generate();
    store.create(&token).await.unwrap();

    let update = changes(&[
        ("motivationalLetter", text("Ich möchte Deutschland kennenlernen.")),
        ("numberOfSiblings", Some(FieldValue::Integer(0))),
        ("hasChildren", Some(FieldValue::Boolean(false))),
        ("earliestStartDate", text("2026-09-01")),
    ]);
    let updated = store.update(&token, &update).await.unwrap();

    assert_eq!(store.get(&token).await.unwrap(), updated);
    for (name, value) in &update {
        assert_eq!(updated.field(name), value.as_ref(), "field {}", name);
    }
}

async fn unknown_token(store: &Store) {
    let token = Token::generate();

    assert!(matches!(store.get(&token).await, Err(StoreError::NotFound(_))));
    assert!(matches!(
        store.update(&token, &changes(&[("city", text("Gori"))])).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(store.audit_log(&token).await, Err(StoreError::NotFound(_))));
}

async fn overview_ordering(store: &Store) {
    let older = Token::generate();
    let newer = Token::generate();
    store.create(&older).await.unwrap();
    store.create(&newer).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;

    store
        .update(
            &older,
            &changes(&[("country", text("Georgia")), ("age", Some(FieldValue::Integer(19)))]),
        )
        .await
        .unwrap();

    let overview = store.list_overview().await.unwrap();
    assert!(overview
        .windows(2)
        .all(|w| w[0].updated_at >= w[1].updated_at));

    let position = |token: &Token| overview.iter().position(|o| &o.token == token).unwrap();
    assert!(position(&older) < position(&newer));

    let entry = &overview[position(&older)];
    assert_eq!(entry.country.as_deref(), Some("Georgia"));
    assert_eq!(entry.age, Some(19));
    assert_eq!(entry.first_name, None);
}
