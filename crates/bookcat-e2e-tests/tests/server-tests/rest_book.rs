use bookcat_dal::book::Book;
use bookcat_e2e_tests::{
    extend_url, prepare_env,
    rest::{create_author, create_book},
    spawn_server, today,
};
use time::macros::date;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_books() {
    let (args, _config_guard) = prepare_env("test_books").await.unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let gaiman = create_author(&client, &base_url, "Neil", "Gaiman", "British")
        .await
        .unwrap();
    let pratchett = create_author(&client, &base_url, "Terry", "Pratchett", "British")
        .await
        .unwrap();

    let book = create_book(
        &client,
        &base_url,
        "Good Omens",
        "978-0-06-085398-3",
        date!(1990 - 05 - 01),
        &[pratchett.id, gaiman.id],
    )
    .await
    .unwrap();
    assert_eq!(book.isbn, "9780060853983");
    assert_eq!(book.author_count, 2);
    assert_eq!(book.author_names, "Neil Gaiman, Terry Pratchett");
    assert_eq!(book.language, "English");

    let api_url = base_url.join("api/books").unwrap();
    let record_url = extend_url(&api_url, book.id);

    let response = client
        .patch(record_url.clone())
        .json(&serde_json::json!({"authors": [gaiman.id], "pages": 288}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 200);
    let updated: Book = response.json().await.unwrap();
    assert_eq!(updated.author_count, 1);
    assert_eq!(updated.pages, Some(288));
    assert_eq!(updated.title, "Good Omens");

    let response = client
        .put(record_url.clone())
        .json(&serde_json::json!({
            "title": "Good Omens",
            "isbn": "9780060853983",
            "publication_date": "1990-05-01",
            "authors": [],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let errors: serde_json::Value = response.json().await.unwrap();
    assert!(errors["authors"].is_array());

    let response = client
        .post(api_url.clone())
        .json(&serde_json::json!({
            "title": "Bad",
            "isbn": "978-0-06-08539",
            "publication_date": "1990-05-01",
            "authors": [gaiman.id],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let errors: serde_json::Value = response.json().await.unwrap();
    assert!(errors["isbn"].is_array());

    let response = client.delete(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);
    let response = client.get(record_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_recent_books() {
    let (args, _config_guard) = prepare_env("test_recent_books").await.unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let author = create_author(&client, &base_url, "Sally", "Rooney", "Irish")
        .await
        .unwrap();
    let today = today();
    let books = [
        ("Last Year", "1111111111", today - time::Duration::days(365)),
        ("Old", "2222222222", today - time::Duration::days(1826)),
        ("Just Now", "3333333333", today),
        ("Edge", "4444444444", today - time::Duration::days(1825)),
    ];
    for (title, isbn, date) in books {
        create_book(&client, &base_url, title, isbn, date, &[author.id])
            .await
            .unwrap();
    }

    let url = base_url.join("api/books/recent").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let res: serde_json::Value = response.json().await.unwrap();
    assert_eq!(res["count"], 3);
    let titles: Vec<_> = res["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Just Now", "Last Year", "Edge"]);
}
