use bookcat_dal::{
    author::{Author, AuthorShort},
    book::BookShort,
};
use bookcat_e2e_tests::{
    extend_url, prepare_env,
    rest::{create_author, create_book},
    spawn_server,
};
use time::macros::date;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_authors() {
    let (args, _config_guard) = prepare_env("test_authors").await.unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let new_author = create_author(&client, &base_url, "Karel", "Capek", "Czech")
        .await
        .unwrap();
    assert_eq!(new_author.full_name, "Karel Capek");
    assert_eq!(new_author.book_count, 0);

    let api_url = base_url.join("api/authors").unwrap();
    let record_url = extend_url(&api_url, new_author.id);

    let updated_author = serde_json::json!({
        "first_name": "Josef",
        "last_name": "Capek",
        "nationality": "Czech",
        "email": "josef@example.com",
    });
    let response = client
        .put(record_url.clone())
        .json(&updated_author)
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 200);

    let response = client.get(record_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let rec: Author = response.json().await.unwrap();
    assert_eq!(rec.first_name, "Josef");
    assert_eq!(rec.email.as_deref(), Some("josef@example.com"));

    let response = client
        .patch(record_url.clone())
        .json(&serde_json::json!({"biography": "Painter and writer"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let rec: Author = response.json().await.unwrap();
    assert_eq!(rec.biography, "Painter and writer");
    assert_eq!(rec.email.as_deref(), Some("josef@example.com"));

    // trailing slash is accepted
    let response = client
        .get(format!("{}/", api_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let res: serde_json::Value = response.json().await.unwrap();
    let recs: Vec<AuthorShort> = serde_json::from_value(res["rows"].clone()).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].full_name, "Josef Capek");

    let book = create_book(
        &client,
        &base_url,
        "Povidani o pejskovi a kocicce",
        "80-00-00412-5",
        date!(1929 - 01 - 01),
        &[rec.id],
    )
    .await
    .unwrap();

    let books_url = extend_url(&record_url, "books");
    let response = client.get(books_url).send().await.unwrap();
    assert!(response.status().is_success());
    let books: Vec<BookShort> = response.json().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, book.id);

    let response = client.delete(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // book survives without authors
    let book_url = extend_url(&base_url.join("api/books").unwrap(), book.id);
    let response = client.get(book_url).send().await.unwrap();
    assert!(response.status().is_success());
    let res: serde_json::Value = response.json().await.unwrap();
    assert_eq!(res["author_count"], 0);
    assert_eq!(res["author_names"], "");

    let response = client.get(record_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_author_filters() {
    let (args, _config_guard) = prepare_env("test_author_filters").await.unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    for (first, last, nationality) in [
        ("Jane", "Austen", "British"),
        ("Charlotte", "Bronte", "British"),
        ("Victor", "Hugo", "French"),
    ] {
        create_author(&client, &base_url, first, last, nationality)
            .await
            .unwrap();
    }

    let mut url = base_url.join("api/authors").unwrap();
    url.set_query(Some("nationality=British&ordering=-last_name"));
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let res: serde_json::Value = response.json().await.unwrap();
    assert_eq!(res["total"], 2);
    assert_eq!(res["rows"][0]["last_name"], "Bronte");

    let mut url = base_url.join("api/authors").unwrap();
    url.set_query(Some("search=HUGO"));
    let res: serde_json::Value = client.get(url).send().await.unwrap().json().await.unwrap();
    assert_eq!(res["total"], 1);

    let url = base_url.join("api/authors/count").unwrap();
    let count: u64 = client.get(url).send().await.unwrap().json().await.unwrap();
    assert_eq!(count, 3);

    let mut url = base_url.join("api/authors").unwrap();
    url.set_query(Some("ordering=biography"));
    let response = client.get(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
