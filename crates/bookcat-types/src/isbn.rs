use crate::ValidationError;

const ISBN_LENGTHS: [usize; 2] = [10, 13];

fn is_separator(c: char) -> bool {
    c == '-' || c == ' '
}

/// Normalizes ISBN to its bare digits.
///
/// Hyphens and spaces are stripped, what remains must be ASCII digits
/// and exactly 10 or 13 of them. Check digit is not verified.
pub fn validate_isbn(raw: &str) -> Result<String, ValidationError> {
    let isbn: String = raw.chars().filter(|c| !is_separator(*c)).collect();
    if isbn.is_empty() || !isbn.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::IsbnNotDigits);
    }
    if !ISBN_LENGTHS.contains(&isbn.len()) {
        return Err(ValidationError::IsbnLength(isbn.len()));
    }
    Ok(isbn)
}

pub fn validate_authors<T>(authors: Option<&[T]>) -> Result<(), ValidationError> {
    match authors {
        Some(authors) if !authors.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingAuthors),
    }
}
