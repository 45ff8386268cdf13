use crate::{ChosenDB, Error, ListingParams, error::Result, push_search};
use bookcat_types::AuthorEmail;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool, QueryBuilder};
use tracing::{debug, warn};

const VALID_ORDER_FIELDS: &[&str] = &["last_name", "first_name", "birth_date", "created_at"];
const DEFAULT_ORDER: &str = "last_name, first_name";
const SEARCH_FIELDS: &[&str] = &["a.first_name", "a.last_name", "a.email", "a.biography"];

pub(crate) const AUTHOR_SHORT_COLUMNS: &str = "a.id, a.first_name, a.last_name, \
a.first_name || ' ' || a.last_name AS full_name, a.nationality, \
(SELECT count(*) FROM book_author x WHERE x.author_id = a.id) AS book_count";

/// List view of an author
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorShort {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub nationality: String,
    pub book_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub isbn: String,
}

/// Detail view of an author
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub birth_date: Option<time::Date>,
    pub nationality: String,
    pub biography: String,
    pub email: Option<String>,
    pub book_count: i64,
    #[sqlx(skip)]
    pub books: Vec<BookSummary>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// Write model, used for create and full update
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAuthor {
    #[garde(length(chars, min = 2, max = 100))]
    pub first_name: String,
    #[garde(length(chars, min = 2, max = 100))]
    pub last_name: String,
    #[garde(skip)]
    pub birth_date: Option<time::Date>,
    #[garde(length(chars, max = 100))]
    #[serde(default)]
    pub nationality: String,
    #[garde(skip)]
    #[serde(default)]
    pub biography: String,
    #[garde(dive)]
    pub email: Option<AuthorEmail>,
}

/// Partial update, missing fields keep their current values
#[derive(Debug, Deserialize, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PatchAuthor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "crate::double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<time::Date>))]
    pub birth_date: Option<Option<time::Date>>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    #[serde(default, deserialize_with = "crate::double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub email: Option<Option<AuthorEmail>>,
}

impl PatchAuthor {
    /// Merges patch onto current record, result still needs validation
    pub fn apply(self, current: Author) -> Result<CreateAuthor, garde::Report> {
        let email = match self.email {
            Some(email) => email,
            None => current.email.as_deref().map(str::parse).transpose()?,
        };
        Ok(CreateAuthor {
            first_name: self.first_name.unwrap_or(current.first_name),
            last_name: self.last_name.unwrap_or(current.last_name),
            birth_date: self.birth_date.unwrap_or(current.birth_date),
            nationality: self.nationality.unwrap_or(current.nationality),
            biography: self.biography.unwrap_or(current.biography),
            email,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AuthorFilter {
    #[garde(length(max = 100))]
    pub nationality: Option<String>,
    #[garde(skip)]
    pub birth_date: Option<time::Date>,
}

impl AuthorFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, ChosenDB>) {
        if let Some(nationality) = &self.nationality {
            qb.push(" AND a.nationality = ").push_bind(nationality.clone());
        }
        if let Some(birth_date) = self.birth_date {
            qb.push(" AND a.birth_date = ").push_bind(birth_date);
        }
    }
}

pub type AuthorRepository = AuthorRepositoryImpl<Pool<ChosenDB>>;

pub struct AuthorRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> AuthorRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateAuthor) -> Result<Author> {
        let email: Option<&str> = payload.email.as_ref().map(AsRef::as_ref);
        let result = sqlx::query(
            "INSERT INTO author (first_name, last_name, birth_date, nationality, biography, email)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.birth_date)
        .bind(&payload.nationality)
        .bind(&payload.biography)
        .bind(email)
        .execute(&self.executor)
        .await
        .map_err(Error::from_write)?;

        let id = result.last_insert_rowid();
        debug!(id, "Created author");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateAuthor) -> Result<Author> {
        let email: Option<&str> = payload.email.as_ref().map(AsRef::as_ref);
        let result = sqlx::query(
            "UPDATE author SET first_name = ?, last_name = ?, birth_date = ?, nationality = ?,
            biography = ?, email = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.birth_date)
        .bind(&payload.nationality)
        .bind(&payload.biography)
        .bind(email)
        .bind(id)
        .execute(&self.executor)
        .await
        .map_err(Error::from_write)?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound("Author".to_string()))
        } else {
            self.get(id).await
        }
    }

    /// Deletes author and its book relations, books themselves stay
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.executor.begin().await?;

        let orphaned: Vec<i64> = sqlx::query_scalar(
            "SELECT ba.book_id FROM book_author ba WHERE ba.author_id = ?
            AND NOT EXISTS (SELECT 1 FROM book_author o WHERE o.book_id = ba.book_id AND o.author_id <> ba.author_id)",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let res = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Author".to_string()));
        }
        tx.commit().await?;

        if !orphaned.is_empty() {
            warn!(
                author_id = id,
                books = ?orphaned,
                "Books left without any author after author deletion"
            );
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM author")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn list(
        &self,
        params: ListingParams,
        filter: &AuthorFilter,
    ) -> Result<crate::Batch<AuthorShort>> {
        let order = params.ordering(VALID_ORDER_FIELDS, DEFAULT_ORDER)?;

        let mut count_query = QueryBuilder::new("SELECT count(*) FROM author a WHERE 1 = 1");
        filter.push_conditions(&mut count_query);
        if let Some(term) = params.search_term() {
            push_search(&mut count_query, SEARCH_FIELDS, term);
        }
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.executor)
            .await?;

        let mut query =
            QueryBuilder::new(format!("SELECT {AUTHOR_SHORT_COLUMNS} FROM author a WHERE 1 = 1"));
        filter.push_conditions(&mut query);
        if let Some(term) = params.search_term() {
            push_search(&mut query, SEARCH_FIELDS, term);
        }
        query
            .push(format!(" ORDER BY {order}, a.id LIMIT "))
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset);
        let rows = query
            .build_query_as::<AuthorShort>()
            .fetch_all(&self.executor)
            .await?;

        Ok(crate::Batch {
            offset: params.offset,
            limit: params.limit,
            rows,
            total: total as u64,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Author> {
        const SQL: &str = r#"
        SELECT a.id, a.first_name, a.last_name, a.first_name || ' ' || a.last_name AS full_name,
        a.birth_date, a.nationality, a.biography, a.email,
        (SELECT count(*) FROM book_author x WHERE x.author_id = a.id) AS book_count,
        a.created_at, a.updated_at
        FROM author a
        WHERE a.id = ?
        "#;
        let mut record = sqlx::query_as::<_, Author>(SQL)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("Author".to_string()))?;

        record.books = sqlx::query_as::<_, BookSummary>(
            "SELECT b.id, b.title, b.isbn FROM book b
            JOIN book_author ba ON ba.book_id = b.id
            WHERE ba.author_id = ?
            ORDER BY b.publication_date DESC, b.title, b.id",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;

        Ok(record)
    }
}
