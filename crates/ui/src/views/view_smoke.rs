use crate::preview::{PLACEHOLDER, SHOW_LABEL};

use super::test_harness::{
    ViewKind, seed_deck, seed_deck_with_template, setup_view_harness, test_services,
};

#[tokio::test(flavor = "current_thread")]
async fn decks_view_smoke_lists_decks_with_counts() {
    let app = test_services();
    seed_deck(&app, "Japanese", &[("犬", "dog"), ("猫", "cat")]).await;

    let mut harness = setup_view_harness(ViewKind::Decks, app);
    let html = harness.settle().await;

    assert!(html.contains("Japanese"), "missing deck name in {html}");
    assert!(html.contains("0.0%"), "missing mastery in {html}");
    assert!(
        html.contains(r#"<td class="deck-due-total">2</td>"#),
        "missing due total in {html}"
    );
    assert!(html.contains("Study"), "missing study link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn decks_view_smoke_renders_empty_state() {
    let mut harness = setup_view_harness(ViewKind::Decks, test_services());
    let html = harness.settle().await;
    assert!(
        html.contains("No decks yet. Create one to get started."),
        "missing empty state in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn new_deck_editor_smoke_shows_placeholder() {
    let mut harness = setup_view_harness(ViewKind::NewDeck, test_services());
    let html = harness.settle().await;

    assert!(html.contains("New deck"), "missing title in {html}");
    assert!(html.contains(PLACEHOLDER), "missing placeholder in {html}");
    assert!(html.contains("Load sample JSON"), "missing file picker in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn deck_editor_smoke_previews_embedded_card() {
    let app = test_services();
    let (deck, _) = seed_deck(&app, "Japanese", &[("犬", "dog")]).await;

    let mut harness = setup_view_harness(ViewKind::EditDeck(deck.id().value()), app);
    let html = harness.settle().await;

    assert!(html.contains("Edit deck"), "missing title in {html}");
    assert!(html.contains(r#"<div class="front">犬</div>"#), "missing front in {html}");
    assert!(html.contains(SHOW_LABEL), "missing toggle label in {html}");
    assert!(html.contains(".card-preview .front"), "missing scoped css in {html}");
    assert!(html.contains("first card"), "missing status in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn deck_editor_smoke_reports_unknown_deck() {
    let mut harness = setup_view_harness(ViewKind::EditDeck(404), test_services());
    let html = harness.settle().await;
    assert!(
        html.contains("That deck or card no longer exists."),
        "missing not-found message in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn cards_view_smoke_lists_rows() {
    let app = test_services();
    let (deck, cards) = seed_deck(&app, "Japanese", &[("犬", "dog"), ("猫", "cat")]).await;

    let mut harness = setup_view_harness(ViewKind::Cards(deck.id().value()), app);
    let html = harness.settle().await;

    assert!(html.contains("back: dog · front: 犬"), "missing first row in {html}");
    assert!(html.contains("back: cat · front: 猫"), "missing second row in {html}");
    let row_id = format!("card-row-{}", cards[0].id());
    assert!(html.contains(&row_id), "missing {row_id} in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn study_view_smoke_hides_answer_until_toggled() {
    let app = test_services();
    let (deck, _) = seed_deck(&app, "Japanese", &[("犬", "dog")]).await;

    let mut harness = setup_view_harness(ViewKind::Study(deck.id().value()), app);
    let html = harness.settle().await;

    assert!(html.contains(r#"<div class="front">犬</div>"#), "missing front in {html}");
    assert!(
        html.contains(r#"<div data-role="answer" hidden>dog</div>"#),
        "answer should start hidden in {html}"
    );
    assert!(html.contains("New 1"), "missing queue count in {html}");
    assert!(html.contains("Due now 1"), "missing queue total in {html}");
    for label in ["Again", "Good", "Easy"] {
        assert!(html.contains(label), "missing {label} button in {html}");
    }
}

#[tokio::test(flavor = "current_thread")]
async fn study_view_smoke_adds_toggle_when_template_has_none() {
    let app = test_services();
    let template = r#"<div class="front">{{ card.data.front }}</div><div data-role="answer">{{ card.data.back }}</div>"#;
    let (deck, _) = seed_deck_with_template(&app, "Bare", template, &[("犬", "dog")]).await;

    let mut harness = setup_view_harness(ViewKind::Study(deck.id().value()), app);
    let html = harness.settle().await;

    assert!(
        html.contains(r#"<div data-role="answer" hidden>dog</div>"#),
        "answer should start hidden in {html}"
    );
    assert!(
        html.contains(&format!(r#"data-role="toggle-answer">{SHOW_LABEL}</button>"#)),
        "missing answer toggle in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn study_view_smoke_reports_done_for_empty_deck() {
    let app = test_services();
    let (deck, _) = seed_deck(&app, "Empty", &[]).await;

    let mut harness = setup_view_harness(ViewKind::Study(deck.id().value()), app);
    let html = harness.settle().await;
    assert!(html.contains("All caught up."), "missing done message in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn settings_view_smoke_shows_current_defaults() {
    let app = test_services();
    app.settings()
        .save_deck_defaults(15, 150)
        .await
        .expect("save defaults");

    let mut harness = setup_view_harness(ViewKind::Settings, app);
    let html = harness.settle().await;

    assert!(html.contains(r#"value="15""#), "missing new-card default in {html}");
    assert!(html.contains(r#"value="150""#), "missing review default in {html}");
}
