use std::collections::{HashMap, HashSet};

use crate::{
    ChosenDB, Error, ListingParams,
    author::{AUTHOR_SHORT_COLUMNS, AuthorShort},
    error::Result,
    push_search,
};
use bookcat_types::{validate_authors, validate_isbn};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool, QueryBuilder, SqliteConnection};
use tracing::debug;

const VALID_ORDER_FIELDS: &[&str] = &["title", "publication_date", "pages", "created_at"];
const DEFAULT_ORDER: &str = "publication_date DESC, title";
const SEARCH_FIELDS: &[&str] = &["b.title", "b.isbn", "b.description", "b.publisher"];
pub const DEFAULT_LANGUAGE: &str = "English";
/// Ids bound into one `IN (...)` list, well below SQLite variable limit
const MAX_BOUND_IDS: usize = 500;

const BOOK_SHORT_COLUMNS: &str = "b.id, b.title, b.isbn, b.publication_date, b.publisher, b.language, \
(SELECT count(*) FROM book_author x WHERE x.book_id = b.id) AS author_count";

/// List view of a book
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookShort {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub publication_date: time::Date,
    pub publisher: String,
    pub language: String,
    pub author_count: i64,
    #[sqlx(skip)]
    pub authors: Vec<AuthorShort>,
}

/// Detail view of a book
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub publication_date: time::Date,
    pub publisher: String,
    pub pages: Option<i64>,
    pub language: String,
    pub description: String,
    pub author_count: i64,
    #[sqlx(skip)]
    pub author_names: String,
    #[sqlx(skip)]
    pub authors: Vec<AuthorShort>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

impl Book {
    fn set_authors(&mut self, authors: Vec<AuthorShort>) {
        self.author_names = authors
            .iter()
            .map(|a| a.full_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.authors = authors;
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn is_valid_isbn(isbn: &str, _ctx: &()) -> garde::Result {
    validate_isbn(isbn)
        .map(|_| ())
        .map_err(|e| garde::Error::new(e.to_string()))
}

fn has_authors(authors: &[i64], _ctx: &()) -> garde::Result {
    validate_authors(Some(authors)).map_err(|e| garde::Error::new(e.to_string()))
}

/// Write model, used for create and full update
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBook {
    #[garde(length(chars, min = 1, max = 200))]
    pub title: String,
    #[garde(custom(is_valid_isbn))]
    pub isbn: String,
    #[garde(skip)]
    pub publication_date: time::Date,
    #[garde(length(chars, max = 200))]
    #[serde(default)]
    pub publisher: String,
    #[garde(range(min = 0))]
    pub pages: Option<i64>,
    #[garde(length(chars, min = 1, max = 50))]
    #[serde(default = "default_language")]
    pub language: String,
    #[garde(skip)]
    #[serde(default)]
    pub description: String,
    #[garde(custom(has_authors))]
    #[serde(default)]
    pub authors: Vec<i64>,
}

/// Partial update, missing fields keep their current values
#[derive(Debug, Deserialize, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PatchBook {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub publication_date: Option<time::Date>,
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "crate::double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub pages: Option<Option<i64>>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub authors: Option<Vec<i64>>,
}

impl PatchBook {
    /// Merges patch onto current record, result still needs validation
    pub fn apply(self, current: Book) -> Result<CreateBook, garde::Report> {
        Ok(CreateBook {
            title: self.title.unwrap_or(current.title),
            isbn: self.isbn.unwrap_or(current.isbn),
            publication_date: self.publication_date.unwrap_or(current.publication_date),
            publisher: self.publisher.unwrap_or(current.publisher),
            pages: self.pages.unwrap_or(current.pages),
            language: self.language.unwrap_or(current.language),
            description: self.description.unwrap_or(current.description),
            authors: self
                .authors
                .unwrap_or_else(|| current.authors.iter().map(|a| a.id).collect()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct BookFilter {
    #[garde(length(max = 50))]
    pub language: Option<String>,
    #[garde(length(max = 200))]
    pub publisher: Option<String>,
    #[garde(skip)]
    pub publication_date: Option<time::Date>,
}

impl BookFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, ChosenDB>) {
        if let Some(language) = &self.language {
            qb.push(" AND b.language = ").push_bind(language.clone());
        }
        if let Some(publisher) = &self.publisher {
            qb.push(" AND b.publisher = ").push_bind(publisher.clone());
        }
        if let Some(publication_date) = self.publication_date {
            qb.push(" AND b.publication_date = ")
                .push_bind(publication_date);
        }
    }
}

/// Checks all authors exist, returns them deduplicated
async fn check_authors(conn: &mut SqliteConnection, authors: &[i64]) -> Result<Vec<i64>> {
    let mut ids = authors.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut existing = HashSet::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_BOUND_IDS) {
        let mut query = QueryBuilder::<ChosenDB>::new("SELECT id FROM author WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let found: Vec<i64> = query.build_query_scalar().fetch_all(&mut *conn).await?;
        existing.extend(found);
    }

    match ids.iter().find(|id| !existing.contains(*id)) {
        Some(missing) => Err(Error::UnknownAuthor(*missing)),
        None => Ok(ids),
    }
}

async fn replace_authors(conn: &mut SqliteConnection, book_id: i64, authors: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM book_author WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    // two bound values per row
    for chunk in authors.chunks(MAX_BOUND_IDS / 2) {
        let mut query =
            QueryBuilder::<ChosenDB>::new("INSERT INTO book_author (book_id, author_id) ");
        query.push_values(chunk, |mut row, author_id| {
            row.push_bind(book_id).push_bind(*author_id);
        });
        query.build().execute(&mut *conn).await?;
    }
    Ok(())
}

pub type BookRepository = BookRepositoryImpl<Pool<ChosenDB>>;

pub struct BookRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateBook) -> Result<Book> {
        let isbn = validate_isbn(&payload.isbn)?;
        validate_authors(Some(&payload.authors))?;

        let mut tx = self.executor.begin().await?;
        let authors = check_authors(&mut tx, &payload.authors).await?;

        let result = sqlx::query(
            "INSERT INTO book (title, isbn, publication_date, publisher, pages, language, description)
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.title)
        .bind(&isbn)
        .bind(payload.publication_date)
        .bind(&payload.publisher)
        .bind(payload.pages)
        .bind(&payload.language)
        .bind(&payload.description)
        .execute(&mut *tx)
        .await
        .map_err(Error::from_write)?;

        let id = result.last_insert_rowid();
        replace_authors(&mut tx, id, &authors).await?;
        tx.commit().await?;

        debug!(id, ?authors, "Created book");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateBook) -> Result<Book> {
        let isbn = validate_isbn(&payload.isbn)?;
        validate_authors(Some(&payload.authors))?;

        let mut tx = self.executor.begin().await?;
        let authors = check_authors(&mut tx, &payload.authors).await?;

        let result = sqlx::query(
            "UPDATE book SET title = ?, isbn = ?, publication_date = ?, publisher = ?, pages = ?,
            language = ?, description = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&payload.title)
        .bind(&isbn)
        .bind(payload.publication_date)
        .bind(&payload.publisher)
        .bind(payload.pages)
        .bind(&payload.language)
        .bind(&payload.description)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::from_write)?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Book".to_string()));
        }
        replace_authors(&mut tx, id, &authors).await?;
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Book".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM book")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn list(
        &self,
        params: ListingParams,
        filter: &BookFilter,
    ) -> Result<crate::Batch<BookShort>> {
        let order = params.ordering(VALID_ORDER_FIELDS, DEFAULT_ORDER)?;

        let mut count_query = QueryBuilder::new("SELECT count(*) FROM book b WHERE 1 = 1");
        filter.push_conditions(&mut count_query);
        if let Some(term) = params.search_term() {
            push_search(&mut count_query, SEARCH_FIELDS, term);
        }
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.executor)
            .await?;

        let mut query =
            QueryBuilder::new(format!("SELECT {BOOK_SHORT_COLUMNS} FROM book b WHERE 1 = 1"));
        filter.push_conditions(&mut query);
        if let Some(term) = params.search_term() {
            push_search(&mut query, SEARCH_FIELDS, term);
        }
        query
            .push(format!(" ORDER BY {order}, b.id LIMIT "))
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset);
        let rows = query
            .build_query_as::<BookShort>()
            .fetch_all(&self.executor)
            .await?;

        Ok(crate::Batch {
            offset: params.offset,
            limit: params.limit,
            rows: self.with_authors(rows).await?,
            total: total as u64,
        })
    }

    /// All books of an author, in default book order
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<BookShort>> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM author WHERE id = ?")
            .bind(author_id)
            .fetch_optional(&self.executor)
            .await?;
        if exists.is_none() {
            return Err(Error::RecordNotFound("Author".to_string()));
        }

        let sql = format!(
            "SELECT {BOOK_SHORT_COLUMNS} FROM book b
            JOIN book_author ba ON ba.book_id = b.id
            WHERE ba.author_id = ?
            ORDER BY b.publication_date DESC, b.title, b.id"
        );
        let rows = sqlx::query_as::<_, BookShort>(&sql)
            .bind(author_id)
            .fetch_all(&self.executor)
            .await?;
        self.with_authors(rows).await
    }

    /// Books published on `since` or later, newest first
    pub async fn list_recent(&self, since: time::Date) -> Result<Vec<BookShort>> {
        let sql = format!(
            "SELECT {BOOK_SHORT_COLUMNS} FROM book b
            WHERE b.publication_date >= ?
            ORDER BY b.publication_date DESC, b.title, b.id"
        );
        let rows = sqlx::query_as::<_, BookShort>(&sql)
            .bind(since)
            .fetch_all(&self.executor)
            .await?;
        self.with_authors(rows).await
    }

    pub async fn get(&self, id: i64) -> Result<Book> {
        const SQL: &str = r#"
        SELECT b.id, b.title, b.isbn, b.publication_date, b.publisher, b.pages, b.language,
        b.description, (SELECT count(*) FROM book_author x WHERE x.book_id = b.id) AS author_count,
        b.created_at, b.updated_at
        FROM book b
        WHERE b.id = ?
        "#;
        let mut record = sqlx::query_as::<_, Book>(SQL)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("Book".to_string()))?;

        let authors = self
            .authors_of(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        record.set_authors(authors);
        Ok(record)
    }

    async fn with_authors(&self, mut books: Vec<BookShort>) -> Result<Vec<BookShort>> {
        let ids: Vec<i64> = books.iter().map(|b| b.id).collect();
        let mut authors = self.authors_of(&ids).await?;
        for book in books.iter_mut() {
            book.authors = authors.remove(&book.id).unwrap_or_default();
        }
        Ok(books)
    }

    /// Authors of given books in default author order
    async fn authors_of(&self, book_ids: &[i64]) -> Result<HashMap<i64, Vec<AuthorShort>>> {
        #[derive(sqlx::FromRow)]
        struct BookAuthor {
            book_id: i64,
            #[sqlx(flatten)]
            author: AuthorShort,
        }

        let mut map: HashMap<i64, Vec<AuthorShort>> = HashMap::new();
        if book_ids.is_empty() {
            return Ok(map);
        }

        for chunk in book_ids.chunks(MAX_BOUND_IDS) {
            let mut query = QueryBuilder::<ChosenDB>::new(format!(
                "SELECT ba.book_id, {AUTHOR_SHORT_COLUMNS} FROM book_author ba
                JOIN author a ON a.id = ba.author_id
                WHERE ba.book_id IN ("
            ));
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") ORDER BY a.last_name, a.first_name, a.id");

            let rows = query
                .build_query_as::<BookAuthor>()
                .fetch_all(&self.executor)
                .await?;
            for row in rows {
                map.entry(row.book_id).or_default().push(row.author);
            }
        }
        Ok(map)
    }
}
