//! Seeds sample authors and books with valid 10-digit ISBNs.
//!
//! Skips silently when the store already holds data, so it is safe to run
//! on every deploy.
//!
//! ```bash
//! cargo run --bin librarium-seed
//! DATABASE_URL=postgres://... cargo run --bin librarium-seed --features postgres-repo
//! ```

use std::collections::HashMap;
use std::env;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use librarium::db::{self, services, AuthorRepository, NewAuthor, NewBook};

const AUTHORS: &[(&str, &str)] = &[
    ("J. R. R. Tolkien", "tolkien@example.com"),
    ("George R. R. Martin", "grrm@example.com"),
    ("Harper Lee", "harper.lee@example.com"),
    ("Jane Austen", "jane.austen@example.com"),
    ("Agatha Christie", "agatha@example.com"),
];

// 10-digit-only ISBNs, intentionally simple placeholders.
const BOOKS: &[(&str, &str, i32, &str)] = &[
    ("The Hobbit", "1234567890", 1937, "J. R. R. Tolkien"),
    ("The Lord of the Rings", "1111111111", 1954, "J. R. R. Tolkien"),
    ("A Game of Thrones", "2222222222", 1996, "George R. R. Martin"),
    ("A Clash of Kings", "3333333333", 1998, "George R. R. Martin"),
    ("To Kill a Mockingbird", "4444444444", 1960, "Harper Lee"),
    ("Pride and Prejudice", "5555555555", 1813, "Jane Austen"),
    ("Murder on the Orient Express", "6666666666", 1934, "Agatha Christie"),
    ("Emma", "7777777777", 1815, "Jane Austen"),
    ("The Silmarillion", "8888888888", 1977, "J. R. R. Tolkien"),
    ("And Then There Were None", "9999999999", 1939, "Agatha Christie"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .init();

    db::init_repository()?;
    let repo = db::get_repository()?;

    // Prevent duplicate seeding by checking the author count.
    if repo.count_authors(None).await? > 0 {
        info!("Store already has data; skipping seed.");
        return Ok(());
    }

    let mut author_ids: HashMap<&str, i64> = HashMap::new();
    for (name, email) in AUTHORS {
        let author = services::create_author(
            repo.as_ref(),
            NewAuthor {
                name: (*name).to_string(),
                email: (*email).to_string(),
            },
        )
        .await?;
        author_ids.insert(name, author.id);
    }

    for (title, isbn, year, author_name) in BOOKS {
        let author_id = author_ids
            .get(author_name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Unknown author in seed data: {}", author_name))?;
        services::create_book(
            repo.as_ref(),
            NewBook {
                title: (*title).to_string(),
                isbn: (*isbn).to_string(),
                published_year: Some(*year),
                author_id,
            },
        )
        .await?;
    }

    info!("Seeded {} authors and {} books.", AUTHORS.len(), BOOKS.len());
    Ok(())
}
