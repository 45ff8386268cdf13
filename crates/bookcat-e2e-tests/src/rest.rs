use anyhow::{Result, ensure};
use bookcat_dal::{author::Author, book::Book};
use reqwest::Url;
use serde_json::json;
use tracing::info;

pub async fn create_author(
    client: &reqwest::Client,
    base_url: &Url,
    first_name: &str,
    last_name: &str,
    nationality: &str,
) -> Result<Author> {
    let payload =
        json!({"first_name": first_name, "last_name": last_name, "nationality": nationality});
    let api_url = base_url.join("api/authors")?;

    let response = client.post(api_url).json(&payload).send().await?;
    ensure!(
        response.status().as_u16() == 201,
        "Unexpected status {}",
        response.status()
    );

    let new_author: Author = response.json().await?;
    Ok(new_author)
}

pub async fn create_book(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    isbn: &str,
    publication_date: time::Date,
    authors: &[i64],
) -> Result<Book> {
    let payload = json!({
        "title": title,
        "isbn": isbn,
        "publication_date": publication_date,
        "authors": authors,
    });
    let api_url = base_url.join("api/books")?;

    let response = client.post(api_url).json(&payload).send().await?;
    info!("Response: {:#?}", response);
    ensure!(
        response.status().as_u16() == 201,
        "Unexpected status {}",
        response.status()
    );

    let new_book: Book = response.json().await?;
    Ok(new_book)
}
