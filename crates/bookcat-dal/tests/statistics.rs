use bookcat_dal::stats::StatisticsRepositoryImpl;
use futures::TryStreamExt as _;
use sqlx::Executor;
use time::macros::date;

const TEST_DATA: &str = r#"
INSERT INTO author (id, first_name, last_name, nationality)
VALUES (1, 'Anna', 'Alpha', 'Czech');
INSERT INTO author (id, first_name, last_name, nationality)
VALUES (2, 'Boris', 'Beta', 'Slovak');
INSERT INTO author (id, first_name, last_name, nationality)
VALUES (3, 'Cyril', 'Gamma', 'Polish');

INSERT INTO book (id, title, isbn, publication_date, pages, language)
VALUES (1, 'First', '1111111111', '2001-01-01', 100, 'Czech');
INSERT INTO book (id, title, isbn, publication_date, pages, language)
VALUES (2, 'Second', '2222222222', '2010-06-15', 301, 'English');

INSERT INTO book_author (book_id, author_id) VALUES (1, 2);
INSERT INTO book_author (book_id, author_id) VALUES (2, 2);
INSERT INTO book_author (book_id, author_id) VALUES (2, 3);
"#;

// 3 authors share 11 books, 12 authors have none
const CROWDED_DATA: &str = r#"
INSERT INTO author (id, first_name, last_name) VALUES (1, 'Petr', 'Novak');
INSERT INTO author (id, first_name, last_name) VALUES (2, 'Jan', 'Dvorak');
INSERT INTO author (id, first_name, last_name) VALUES (3, 'Adam', 'Dvorak');
INSERT INTO author (id, first_name, last_name) VALUES (4, 'Eva', 'Svoboda');
INSERT INTO author (id, first_name, last_name) VALUES (5, 'Ivan', 'Cerny');
INSERT INTO author (id, first_name, last_name) VALUES (6, 'Olga', 'Bily');

WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 12)
INSERT INTO author (id, first_name, last_name)
SELECT 100 + n, 'Nobody', 'Zeman ' || printf('%02d', 13 - n) FROM seq;

WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 11)
INSERT INTO book (id, title, isbn, publication_date)
SELECT n, 'Joint ' || printf('%02d', n), printf('%010d', n), printf('%04d-01-01', 2000 + n) FROM seq;
INSERT INTO book_author (book_id, author_id)
SELECT b.id, a.id FROM book b, author a WHERE b.id <= 11 AND a.id IN (1, 2, 3);

INSERT INTO book (id, title, isbn, publication_date) VALUES (12, 'Pair A', '0000000012', '2020-01-01');
INSERT INTO book (id, title, isbn, publication_date) VALUES (13, 'Pair B', '0000000013', '2021-01-01');
INSERT INTO book_author (book_id, author_id) VALUES (12, 4);
INSERT INTO book_author (book_id, author_id) VALUES (12, 5);
INSERT INTO book_author (book_id, author_id) VALUES (13, 4);
INSERT INTO book_author (book_id, author_id) VALUES (13, 6);
"#;

async fn init_db(data: Option<&str>) -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    sqlx::migrate!("../../migrations").run(&conn).await.unwrap();

    if let Some(data) = data {
        conn.execute_many(data)
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
    }

    conn
}

#[tokio::test]
async fn test_author_statistics() {
    let conn = init_db(Some(TEST_DATA)).await;
    let repo = StatisticsRepositoryImpl::new(conn);

    let stats = repo.author_statistics().await.unwrap();
    let agg = &stats.aggregated_statistics;
    assert_eq!(agg.total_authors, 3);
    assert_eq!(agg.min_books_by_single_author, 0);
    assert_eq!(agg.max_books_by_single_author, 2);
    assert_eq!(agg.average_books_per_author, 1.0);

    assert_eq!(stats.authors_without_books.count, 1);
    assert_eq!(stats.authors_without_books.authors.len(), 1);
    assert_eq!(stats.authors_without_books.authors[0].name, "Anna Alpha");

    let top: Vec<_> = stats
        .top_authors
        .iter()
        .map(|a| (a.id, a.book_count))
        .collect();
    assert_eq!(top, [(2, 2), (3, 1), (1, 0)]);
}

#[tokio::test]
async fn test_book_statistics() {
    let conn = init_db(Some(TEST_DATA)).await;
    let repo = StatisticsRepositoryImpl::new(conn);

    let stats = repo.book_statistics().await.unwrap();
    let agg = &stats.aggregated_statistics;
    assert_eq!(agg.total_books, 2);
    assert_eq!(agg.average_authors_per_book, 1.5);
    assert_eq!(agg.average_pages, 201.0);
    assert_eq!(agg.max_pages, 301);
    assert_eq!(agg.min_pages, 100);
    assert_eq!(agg.latest_publication, Some(date!(2010 - 06 - 15)));
    assert_eq!(agg.earliest_publication, Some(date!(2001 - 01 - 01)));

    assert_eq!(stats.collaborative_books.count, 1);
    assert_eq!(stats.collaborative_books.books[0].title, "Second");
    assert_eq!(stats.collaborative_books.books[0].author_count, 2);

    let languages: Vec<_> = stats
        .books_by_language
        .iter()
        .map(|l| (l.language.as_str(), l.count))
        .collect();
    assert_eq!(languages, [("Czech", 1), ("English", 1)]);
}

#[tokio::test]
async fn test_author_statistics_limits_and_ties() {
    let conn = init_db(Some(CROWDED_DATA)).await;
    let repo = StatisticsRepositoryImpl::new(conn);

    let stats = repo.author_statistics().await.unwrap();
    let agg = &stats.aggregated_statistics;
    assert_eq!(agg.total_authors, 18);
    assert_eq!(agg.max_books_by_single_author, 11);
    assert_eq!(agg.min_books_by_single_author, 0);
    assert_eq!(agg.average_books_per_author, 2.06);

    let top: Vec<_> = stats
        .top_authors
        .iter()
        .map(|a| (a.id, a.book_count))
        .collect();
    assert_eq!(top, [(3, 11), (2, 11), (1, 11), (4, 2), (6, 1)]);
    assert_eq!(stats.top_authors[0].name, "Adam Dvorak");

    assert_eq!(stats.authors_without_books.count, 12);
    let without: Vec<_> = stats
        .authors_without_books
        .authors
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(without, [112, 111, 110, 109, 108, 107, 106, 105, 104, 103]);
}

#[tokio::test]
async fn test_book_statistics_limits_and_ties() {
    let conn = init_db(Some(CROWDED_DATA)).await;
    let repo = StatisticsRepositoryImpl::new(conn);

    let stats = repo.book_statistics().await.unwrap();
    assert_eq!(stats.aggregated_statistics.total_books, 13);
    assert_eq!(stats.aggregated_statistics.average_authors_per_book, 2.85);

    assert_eq!(stats.collaborative_books.count, 13);
    let books: Vec<_> = stats
        .collaborative_books
        .books
        .iter()
        .map(|b| (b.title.clone(), b.author_count))
        .collect();
    let expected: Vec<_> = (2..=11)
        .rev()
        .map(|n| (format!("Joint {n:02}"), 3))
        .collect();
    assert_eq!(books, expected);
}

#[tokio::test]
async fn test_statistics_of_empty_catalog() {
    let conn = init_db(None).await;
    let repo = StatisticsRepositoryImpl::new(conn);

    let authors = repo.author_statistics().await.unwrap();
    assert_eq!(authors.aggregated_statistics.total_authors, 0);
    assert_eq!(authors.aggregated_statistics.average_books_per_author, 0.0);
    assert!(authors.top_authors.is_empty());
    assert_eq!(authors.authors_without_books.count, 0);

    let books = repo.book_statistics().await.unwrap();
    assert_eq!(books.aggregated_statistics.total_books, 0);
    assert_eq!(books.aggregated_statistics.max_pages, 0);
    assert_eq!(books.aggregated_statistics.latest_publication, None);
    assert!(books.books_by_language.is_empty());
    assert!(books.collaborative_books.books.is_empty());
}
