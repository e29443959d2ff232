//! Pure field validators shared by the schema layer.
//!
//! These functions are deterministic and side-effect free; they perform no
//! I/O and are safe to call from both the HTTP layer and tests.

/// Returns true iff `isbn` consists of exactly 10 decimal digits.
///
/// No checksum validation is performed; the catalog treats the ISBN as an
/// opaque 10-digit identifier.
pub fn is_valid_isbn10(isbn: &str) -> bool {
    isbn.len() == 10 && isbn.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true when `year` is absent, or present and within `[1000, 2100]`
/// inclusive.
pub fn is_valid_year(year: Option<i32>) -> bool {
    match year {
        None => true,
        Some(y) => (1000..=2100).contains(&y),
    }
}

/// Syntactic email check: one `@`, non-empty local part, and a dotted
/// domain without whitespace. Intentionally not RFC-complete.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
