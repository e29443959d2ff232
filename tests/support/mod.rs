//! Shared fixtures for integration tests.

use librarium::db::models::{NewAuthor, NewBook};
use librarium::db::repositories::LocalRepository;
use librarium::db::services;

pub fn author(name: &str, email: &str) -> NewAuthor {
    NewAuthor {
        name: name.to_string(),
        email: email.to_string(),
    }
}

pub fn book(title: &str, isbn: &str, year: Option<i32>, author_id: i64) -> NewBook {
    NewBook {
        title: title.to_string(),
        isbn: isbn.to_string(),
        published_year: year,
        author_id,
    }
}

/// Seed a five-author, ten-book catalog. Returns the author ids in
/// insertion order: Tolkien (3 books), Martin (2), Lee (1), Austen (2),
/// Christie (2).
pub async fn seed_catalog(repo: &LocalRepository) -> Vec<i64> {
    let authors = [
        ("J. R. R. Tolkien", "tolkien@example.com"),
        ("George R. R. Martin", "grrm@example.com"),
        ("Harper Lee", "harper.lee@example.com"),
        ("Jane Austen", "jane.austen@example.com"),
        ("Agatha Christie", "agatha@example.com"),
    ];
    let mut ids = Vec::new();
    for (name, email) in authors {
        let created = services::create_author(repo, author(name, email))
            .await
            .expect("seed author");
        ids.push(created.id);
    }

    let books = [
        ("The Hobbit", "1234567890", 1937, ids[0]),
        ("The Lord of the Rings", "1111111111", 1954, ids[0]),
        ("A Game of Thrones", "2222222222", 1996, ids[1]),
        ("A Clash of Kings", "3333333333", 1998, ids[1]),
        ("To Kill a Mockingbird", "4444444444", 1960, ids[2]),
        ("Pride and Prejudice", "5555555555", 1813, ids[3]),
        ("Murder on the Orient Express", "6666666666", 1934, ids[4]),
        ("Emma", "7777777777", 1815, ids[3]),
        ("The Silmarillion", "8888888888", 1977, ids[0]),
        ("And Then There Were None", "9999999999", 1939, ids[4]),
    ];
    for (title, isbn, year, author_id) in books {
        services::create_book(repo, book(title, isbn, Some(year), author_id))
            .await
            .expect("seed book");
    }
    ids
}
