use bookcat_dal::stats::{AuthorStatistics, BookStatistics};
use bookcat_e2e_tests::{
    prepare_env,
    rest::{create_author, create_book},
    spawn_server,
};
use time::macros::date;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_statistics() {
    let (args, _config_guard) = prepare_env("test_statistics").await.unwrap();
    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let a = create_author(&client, &base_url, "Anna", "Alpha", "Czech")
        .await
        .unwrap();
    let b = create_author(&client, &base_url, "Boris", "Beta", "Slovak")
        .await
        .unwrap();
    let c = create_author(&client, &base_url, "Cyril", "Gamma", "Polish")
        .await
        .unwrap();

    create_book(&client, &base_url, "First", "1111111111", date!(2001 - 01 - 01), &[b.id])
        .await
        .unwrap();
    create_book(
        &client,
        &base_url,
        "Second",
        "2222222222",
        date!(2010 - 06 - 15),
        &[b.id, c.id],
    )
    .await
    .unwrap();

    let url = base_url.join("api/authors/statistics").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let stats: AuthorStatistics = response.json().await.unwrap();
    assert_eq!(stats.aggregated_statistics.total_authors, 3);
    assert_eq!(stats.aggregated_statistics.min_books_by_single_author, 0);
    assert_eq!(stats.aggregated_statistics.max_books_by_single_author, 2);
    assert_eq!(stats.aggregated_statistics.average_books_per_author, 1.0);
    assert_eq!(stats.authors_without_books.count, 1);
    assert_eq!(stats.authors_without_books.authors[0].id, a.id);
    assert_eq!(stats.top_authors[0].id, b.id);

    let url = base_url.join("api/books/statistics").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let stats: BookStatistics = response.json().await.unwrap();
    assert_eq!(stats.aggregated_statistics.total_books, 2);
    assert_eq!(stats.aggregated_statistics.average_authors_per_book, 1.5);
    assert_eq!(
        stats.aggregated_statistics.earliest_publication,
        Some(date!(2001 - 01 - 01))
    );
    assert_eq!(stats.collaborative_books.count, 1);
    assert_eq!(stats.books_by_language.len(), 1);
    assert_eq!(stats.books_by_language[0].count, 2);
}
