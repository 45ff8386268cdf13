use crate::{ChosenDB, error::Result};
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool};
use tracing::debug;

const TOP_AUTHORS_LIMIT: i64 = 5;
const AUTHORS_WITHOUT_BOOKS_LIMIT: i64 = 10;
const COLLABORATIVE_BOOKS_LIMIT: i64 = 10;

const AUTHORS_WITH_BOOK_COUNT: &str = "SELECT a.id, a.first_name || ' ' || a.last_name AS name, \
a.nationality, a.first_name, a.last_name, \
(SELECT count(*) FROM book_author x WHERE x.author_id = a.id) AS book_count FROM author a";

const BOOKS_WITH_AUTHOR_COUNT: &str = "SELECT b.id, b.title, b.isbn, b.publication_date, \
(SELECT count(*) FROM book_author x WHERE x.book_id = b.id) AS author_count FROM book b";

/// Rounds half away from zero to given number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorAggregates {
    pub total_authors: u64,
    pub average_books_per_author: f64,
    pub max_books_by_single_author: i64,
    pub min_books_by_single_author: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TopAuthor {
    pub id: i64,
    pub name: String,
    pub nationality: String,
    pub book_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorBrief {
    pub id: i64,
    pub name: String,
    pub nationality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorsWithoutBooks {
    pub count: u64,
    pub authors: Vec<AuthorBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorStatistics {
    pub aggregated_statistics: AuthorAggregates,
    pub top_authors: Vec<TopAuthor>,
    pub authors_without_books: AuthorsWithoutBooks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookAggregates {
    pub total_books: u64,
    pub average_authors_per_book: f64,
    pub average_pages: f64,
    pub max_pages: i64,
    pub min_pages: i64,
    pub latest_publication: Option<time::Date>,
    pub earliest_publication: Option<time::Date>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CollaborativeBook {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub author_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CollaborativeBooks {
    pub count: u64,
    pub books: Vec<CollaborativeBook>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LanguageCount {
    pub language: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookStatistics {
    pub aggregated_statistics: BookAggregates,
    pub collaborative_books: CollaborativeBooks,
    pub books_by_language: Vec<LanguageCount>,
}

pub type StatisticsRepository = StatisticsRepositoryImpl<Pool<ChosenDB>>;

/// Read only aggregates over whole catalog.
///
/// Each report issues its sub-queries concurrently and fails as whole
/// when any of them fails.
pub struct StatisticsRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> StatisticsRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn author_statistics(&self) -> Result<AuthorStatistics> {
        let (aggregated_statistics, top_authors, without_books, without_books_count) = futures::try_join!(
            self.author_aggregates(),
            self.top_authors(),
            self.authors_without_books(),
            self.authors_without_books_count(),
        )?;
        debug!(
            total = aggregated_statistics.total_authors,
            "Author statistics computed"
        );

        Ok(AuthorStatistics {
            aggregated_statistics,
            top_authors,
            authors_without_books: AuthorsWithoutBooks {
                count: without_books_count,
                authors: without_books,
            },
        })
    }

    pub async fn book_statistics(&self) -> Result<BookStatistics> {
        let (average_authors, mut aggregated_statistics, books_by_language, collaborative, collaborative_count) = futures::try_join!(
            self.average_authors_per_book(),
            self.book_aggregates(),
            self.books_by_language(),
            self.collaborative_books(),
            self.collaborative_books_count(),
        )?;
        aggregated_statistics.average_authors_per_book = average_authors;
        debug!(
            total = aggregated_statistics.total_books,
            "Book statistics computed"
        );

        Ok(BookStatistics {
            aggregated_statistics,
            collaborative_books: CollaborativeBooks {
                count: collaborative_count,
                books: collaborative,
            },
            books_by_language,
        })
    }

    async fn author_aggregates(&self) -> Result<AuthorAggregates> {
        let sql = format!(
            "SELECT count(*), AVG(book_count), MAX(book_count), MIN(book_count)
            FROM ({AUTHORS_WITH_BOOK_COUNT})"
        );
        let (total, avg, max, min): (i64, Option<f64>, Option<i64>, Option<i64>) =
            sqlx::query_as(&sql).fetch_one(&self.executor).await?;

        Ok(AuthorAggregates {
            total_authors: total as u64,
            average_books_per_author: round_to(avg.unwrap_or_default(), 2),
            max_books_by_single_author: max.unwrap_or_default(),
            min_books_by_single_author: min.unwrap_or_default(),
        })
    }

    async fn top_authors(&self) -> Result<Vec<TopAuthor>> {
        let sql = format!(
            "SELECT id, name, nationality, book_count FROM ({AUTHORS_WITH_BOOK_COUNT})
            ORDER BY book_count DESC, last_name, first_name, id LIMIT ?"
        );
        let rows = sqlx::query_as(&sql)
            .bind(TOP_AUTHORS_LIMIT)
            .fetch_all(&self.executor)
            .await?;
        Ok(rows)
    }

    async fn authors_without_books(&self) -> Result<Vec<AuthorBrief>> {
        let sql = format!(
            "SELECT id, name, nationality FROM ({AUTHORS_WITH_BOOK_COUNT})
            WHERE book_count = 0
            ORDER BY last_name, first_name, id LIMIT ?"
        );
        let rows = sqlx::query_as(&sql)
            .bind(AUTHORS_WITHOUT_BOOKS_LIMIT)
            .fetch_all(&self.executor)
            .await?;
        Ok(rows)
    }

    async fn authors_without_books_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM author a
            WHERE NOT EXISTS (SELECT 1 FROM book_author x WHERE x.author_id = a.id)",
        )
        .fetch_one(&self.executor)
        .await?;
        Ok(count as u64)
    }

    async fn average_authors_per_book(&self) -> Result<f64> {
        let sql = format!("SELECT AVG(author_count) FROM ({BOOKS_WITH_AUTHOR_COUNT})");
        let avg: Option<f64> = sqlx::query_scalar(&sql)
            .fetch_one(&self.executor)
            .await?;
        Ok(round_to(avg.unwrap_or_default(), 2))
    }

    async fn book_aggregates(&self) -> Result<BookAggregates> {
        #[derive(sqlx::FromRow)]
        struct Row {
            total: i64,
            avg_pages: Option<f64>,
            max_pages: Option<i64>,
            min_pages: Option<i64>,
            latest: Option<time::Date>,
            earliest: Option<time::Date>,
        }

        let row: Row = sqlx::query_as(
            "SELECT count(*) AS total, AVG(pages) AS avg_pages, MAX(pages) AS max_pages,
            MIN(pages) AS min_pages, MAX(publication_date) AS latest,
            MIN(publication_date) AS earliest FROM book",
        )
        .fetch_one(&self.executor)
        .await?;

        Ok(BookAggregates {
            total_books: row.total as u64,
            average_authors_per_book: 0.0,
            average_pages: round_to(row.avg_pages.unwrap_or_default(), 0),
            max_pages: row.max_pages.unwrap_or_default(),
            min_pages: row.min_pages.unwrap_or_default(),
            latest_publication: row.latest,
            earliest_publication: row.earliest,
        })
    }

    async fn books_by_language(&self) -> Result<Vec<LanguageCount>> {
        let rows = sqlx::query_as(
            "SELECT language, count(*) AS count FROM book
            GROUP BY language ORDER BY count DESC, language",
        )
        .fetch_all(&self.executor)
        .await?;
        Ok(rows)
    }

    async fn collaborative_books(&self) -> Result<Vec<CollaborativeBook>> {
        let sql = format!(
            "SELECT id, title, isbn, author_count FROM ({BOOKS_WITH_AUTHOR_COUNT})
            WHERE author_count > 1
            ORDER BY author_count DESC, publication_date DESC, title, id LIMIT ?"
        );
        let rows = sqlx::query_as(&sql)
            .bind(COLLABORATIVE_BOOKS_LIMIT)
            .fetch_all(&self.executor)
            .await?;
        Ok(rows)
    }

    async fn collaborative_books_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM book b
            WHERE (SELECT count(*) FROM book_author x WHERE x.book_id = b.id) > 1",
        )
        .fetch_one(&self.executor)
        .await?;
        Ok(count as u64)
    }
}
