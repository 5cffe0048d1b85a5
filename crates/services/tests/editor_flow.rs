use deckflow_core::model::{CardFields, DeckDraft, DeckSettings, ReviewGrade};
use deckflow_core::time::fixed_now;
use services::{AppServices, Clock, ResponseStatus};

const TEMPLATE: &str = r#"<div>{{ card.data.front }}</div>
<div data-role="answer">{{ card.data.back }}</div>"#;

#[tokio::test]
async fn editor_flow_create_import_edit_delete() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_editor_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("connect sqlite");
    let decks = services.deck_service();
    let cards = services.card_service();

    let deck = decks
        .create_deck(DeckDraft {
            name: "Animals".into(),
            card_template: TEMPLATE.into(),
            card_css: "div { color: teal; }".into(),
            ..DeckDraft::with_settings(&DeckSettings::default())
        })
        .await
        .expect("create deck");

    let report = cards
        .import_cards(
            deck.id(),
            r#"[{"front":"犬","back":"dog"},{"front":"猫","back":"cat"}]"#,
        )
        .await
        .expect("import");
    assert_eq!(report.imported, 2);

    let payload = decks.editor_payload(deck.id()).await.expect("payload");
    assert_eq!(
        payload.sample_json.as_deref(),
        Some(r#"{"back":"dog","front":"犬"}"#)
    );

    let listed = cards.list_cards(deck.id()).await.expect("list");
    let first = listed[0].id();

    let rejected = cards
        .edit_card(first, vec![("".into(), "x".into())])
        .await;
    assert_eq!(rejected.status, ResponseStatus::Error);
    assert!(rejected.message.starts_with("Validation failed"));

    let edited = cards
        .edit_card(
            first,
            vec![("front".into(), "狗".into()), ("back".into(), "dog".into())],
        )
        .await;
    assert_eq!(edited.status, ResponseStatus::Success);
    assert_eq!(
        edited.data,
        Some(CardFields::from_pairs([("front", "狗"), ("back", "dog")]).unwrap())
    );

    let deleted = cards.delete_card(listed[1].id()).await;
    assert!(deleted.is_success());
    assert_eq!(cards.list_cards(deck.id()).await.unwrap().len(), 1);

    let overview = decks.deck_overview(deck.id()).await.expect("overview");
    assert_eq!(overview.total_cards, 1);

    assert!(decks.delete_deck(deck.id()).await.is_success());
    assert!(decks.list_decks().await.unwrap().is_empty());
}

#[tokio::test]
async fn study_flow_updates_mastery() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_study_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("connect sqlite");
    let decks = services.deck_service();
    let study = services.study_service();

    let deck = decks
        .create_deck(DeckDraft {
            name: "Numbers".into(),
            card_template: TEMPLATE.into(),
            ..DeckDraft::with_settings(&DeckSettings::default())
        })
        .await
        .unwrap();
    services
        .card_service()
        .import_cards(deck.id(), r#"[{"front":"一","back":"one"},{"front":"二","back":"two"}]"#)
        .await
        .unwrap();

    let next = study.next_card(deck.id()).await.unwrap().expect("card");
    assert!(next.markup.contains("一"));
    study.answer(next.card.id(), ReviewGrade::Easy).await.unwrap();

    assert_eq!(study.reviews_done_today(deck.id()).await.unwrap(), 1);
    let overview = decks.deck_overview(deck.id()).await.unwrap();
    assert_eq!(overview.reviewed_cards, 1);
    assert_eq!(overview.mastery_percent, 50.0);
}
