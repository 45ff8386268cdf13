use crate::{crud_api, publish_api_docs};
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use bookcat_dal::book::{Book, BookFilter, BookRepository, BookShort, CreateBook, PatchBook};

use crate::state::AppState;
use axum::routing::get;

publish_api_docs!(extra_crud_api::statistics, extra_crud_api::recent);
crud_api!(Book);

crate::repository_from_request!(bookcat_dal::stats::StatisticsRepository);

/// Books published within the recent window
#[derive(Debug, serde::Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecentBooks {
    pub count: usize,
    pub books: Vec<BookShort>,
}

/// First day of the window of `days` days ending `today`
pub fn recent_since(today: time::Date, days: u32) -> time::Date {
    today
        .checked_sub(time::Duration::days(days.into()))
        .unwrap_or(time::Date::MIN)
}

mod extra_crud_api {
    use axum::{extract::State, response::IntoResponse};
    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use bookcat_dal::{
        book::BookRepository,
        stats::{BookStatistics, StatisticsRepository},
    };
    #[allow(unused_imports)]
    use http::StatusCode;
    use tracing::debug;

    use super::{recent_since, RecentBooks};
    use crate::{
        error::ApiResult,
        rest_api::{reply, Operation},
        state::AppState,
    };

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/statistics", tag = "Book", operation_id = "bookStatistics",
        responses((status = StatusCode::OK, description = "Aggregated book statistics", body = BookStatistics))))]
    pub async fn statistics(repository: StatisticsRepository) -> ApiResult<impl IntoResponse> {
        let stats = repository.book_statistics().await?;
        Ok(reply(Operation::Statistics, stats))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/recent", tag = "Book", operation_id = "recentBooks",
        responses((status = StatusCode::OK, description = "Books published in the recent window, newest first", body = RecentBooks))))]
    pub async fn recent(
        repository: BookRepository,
        State(state): State<AppState>,
    ) -> ApiResult<impl IntoResponse> {
        let today = time::OffsetDateTime::now_utc().date();
        let since = recent_since(today, state.config().recent_window_days);
        debug!(%since, "Listing recent books");
        let books = repository.list_recent(since).await?;
        Ok(reply(
            Operation::Recent,
            RecentBooks {
                count: books.len(),
                books,
            },
        ))
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud_api::list).post(crud_api::create))
        .route("/count", get(crud_api::count))
        .route("/statistics", get(extra_crud_api::statistics))
        .route("/recent", get(extra_crud_api::recent))
        .route(
            "/{id}",
            get(crud_api::get)
                .put(crud_api::update)
                .patch(crud_api::patch)
                .delete(crud_api::delete),
        )
}
