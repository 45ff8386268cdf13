use crate::{crud_api, publish_api_docs};
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use bookcat_dal::author::{
    Author, AuthorFilter, AuthorRepository, AuthorShort, CreateAuthor, PatchAuthor,
};

use crate::state::AppState;
use axum::routing::get;

publish_api_docs!(extra_crud_api::statistics, extra_crud_api::list_books);
crud_api!(Author);

mod extra_crud_api {
    use axum::{extract::Path, response::IntoResponse};
    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use bookcat_dal::{
        book::{BookRepository, BookShort},
        stats::{AuthorStatistics, StatisticsRepository},
    };
    #[allow(unused_imports)]
    use http::StatusCode;

    use crate::{
        error::ApiResult,
        rest_api::{reply, Operation},
    };

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/statistics", tag = "Author", operation_id = "authorStatistics",
        responses((status = StatusCode::OK, description = "Aggregated author statistics", body = AuthorStatistics))))]
    pub async fn statistics(repository: StatisticsRepository) -> ApiResult<impl IntoResponse> {
        let stats = repository.author_statistics().await?;
        Ok(reply(Operation::Statistics, stats))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}/books", tag = "Author", operation_id = "listAuthorBooks",
        responses((status = StatusCode::OK, description = "All books of the author", body = Vec<BookShort>))))]
    pub async fn list_books(
        Path(author_id): Path<i64>,
        repository: BookRepository,
    ) -> ApiResult<impl IntoResponse> {
        let books = repository.list_by_author(author_id).await?;
        Ok(reply(Operation::Related, books))
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud_api::list).post(crud_api::create))
        .route("/count", get(crud_api::count))
        .route("/statistics", get(extra_crud_api::statistics))
        .route(
            "/{id}",
            get(crud_api::get)
                .put(crud_api::update)
                .patch(crud_api::patch)
                .delete(crud_api::delete),
        )
        .route("/{id}/books", get(extra_crud_api::list_books))
}
