use chrono::Utc;
use clap::Parser;
use deckflow_core::model::{Card, CardFields, CardId, DeckDraft, DeckId, DeckSettings};
use storage::repository::Storage;

/// Seeds a database with a small Japanese demo deck.
#[derive(Debug, Parser)]
#[command(name = "seed")]
struct Args {
    /// SQLite URL of the database to seed.
    #[arg(long = "db", env = "DECKFLOW_DB_URL", default_value = "sqlite:dev.sqlite3")]
    db_url: String,

    /// Name of the deck to create.
    #[arg(long, default_value = "Japanese Basics")]
    deck_name: String,

    /// Number of cards to create, cycling through the sample words.
    #[arg(long, default_value_t = 6)]
    cards: u32,
}

const TEMPLATE: &str = r#"<div class="front">{{ card.data.front }}</div>
<button data-role="toggle-answer">Show Answer</button>
<div data-role="answer">
  <div class="reading">{{ card.data.reading }}</div>
  <div class="back">{{ card.data.back }}</div>
</div>"#;

const CSS: &str = ".front { font-size: 4rem; text-align: center; }
.reading { color: #666; }
.back { font-weight: bold; }";

const WORDS: &[(&str, &str, &str)] = &[
    ("犬", "いぬ", "dog"),
    ("猫", "ねこ", "cat"),
    ("水", "みず", "water"),
    ("山", "やま", "mountain"),
    ("川", "かわ", "river"),
    ("火", "ひ", "fire"),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let storage = Storage::sqlite(&args.db_url).await?;
    let now = Utc::now();

    let deck = DeckDraft {
        name: args.deck_name.clone(),
        card_template: TEMPLATE.into(),
        card_css: CSS.into(),
        ..DeckDraft::with_settings(&DeckSettings::default())
    }
    .validate()?
    .assign_id(DeckId::new(0), now);
    let deck = storage.decks.insert_deck(&deck).await?;

    let mut cards = Vec::new();
    for i in 0..args.cards {
        let (front, reading, back) = WORDS[(i as usize) % WORDS.len()];
        let fields =
            CardFields::from_pairs([("front", front), ("reading", reading), ("back", back)])?;
        cards.push(Card::new(CardId::new(0), deck.id(), fields, now));
    }
    storage.cards.insert_cards(&cards).await?;

    println!(
        "Seeded deck {} ({}) with {} cards into {}",
        deck.id(),
        deck.name(),
        cards.len(),
        args.db_url
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
