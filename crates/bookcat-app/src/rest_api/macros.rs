/// Generates `crud_api` module with list, count, get, create, update, patch
/// and delete handlers for an entity.
///
/// Expects `<Entity>Repository`, `<Entity>Short`, `Create<Entity>`,
/// `Patch<Entity>` and `<Entity>Filter` to be in scope.
#[macro_export]
macro_rules! crud_api {
    ($entity:ident) => {
        type EntityRepository = paste::paste! {[<$entity Repository>]};
        crate::repository_from_request!(EntityRepository);
        pub mod crud_api {
            use super::*;
            use crate::error::ApiResult;
            use crate::rest_api::{reply, Operation, Paging};
            use crate::state::AppState;
            use crate::validate::Garde;
            use axum::{
                extract::{rejection::JsonRejection, Path, Query, State},
                response::IntoResponse,
                Json,
            };
            #[allow(unused_imports)]
            use http::StatusCode;
            use garde::Validate as _;
            use tracing::debug;

            #[cfg(feature = "openapi")]
            type EntityShort = paste::paste! {[<$entity Short>]};
            type CreateEntity = paste::paste! {[<Create $entity>]};
            type PatchEntity = paste::paste! {[<Patch $entity>]};
            type EntityFilter = paste::paste! {[<$entity Filter>]};

            #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = stringify!($entity), operation_id = concat!("list", stringify!($entity)),
            params(Paging, EntityFilter), responses((status = StatusCode::OK, description = "List paginated", body = crate::rest_api::Page<EntityShort>))))]
            pub async fn list(
                repository: EntityRepository,
                State(state): State<AppState>,
                Garde(Query(paging)): Garde<Query<Paging>>,
                Garde(Query(filter)): Garde<Query<EntityFilter>>,
            ) -> ApiResult<impl IntoResponse> {
                debug!(entity = stringify!($entity), ?paging, ?filter, "Listing");
                let default_page_size: u32 = state.config().default_page_size;
                let page_size = paging.page_size(default_page_size);
                let listing_params = paging.into_listing_params(default_page_size)?;
                let batch = repository.list(listing_params, &filter).await?;
                Ok(reply(
                    Operation::List,
                    crate::rest_api::Page::from_batch(batch, page_size),
                ))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/count", tag = stringify!($entity), operation_id = concat!("count", stringify!($entity)),
            responses((status = StatusCode::OK, description = "Count", body = u64))))]
            pub async fn count(repository: EntityRepository) -> ApiResult<impl IntoResponse> {
                let count = repository.count().await?;
                Ok(reply(Operation::Count, count))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = stringify!($entity), operation_id = concat!("get", stringify!($entity)),
            responses((status = StatusCode::OK, description = "Get one", body = $entity))))]
            pub async fn get(
                Path(id): Path<i64>,
                repository: EntityRepository,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.get(id).await?;

                Ok(reply(Operation::Retrieve, record))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = stringify!($entity), operation_id = concat!("create", stringify!($entity)),
            request_body = CreateEntity,
            responses((status = StatusCode::CREATED, description = concat!("Created ", stringify!($entity)), body = $entity))))]
            pub async fn create(
                repository: EntityRepository,
                Garde(Json(payload)): Garde<Json<CreateEntity>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.create(payload).await?;

                Ok(reply(Operation::Create, record))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = stringify!($entity), operation_id = concat!("update", stringify!($entity)),
            request_body = CreateEntity,
            responses((status = StatusCode::OK, description = concat!("Updated ", stringify!($entity)), body = $entity))))]
            pub async fn update(
                Path(id): Path<i64>,
                repository: EntityRepository,
                Garde(Json(payload)): Garde<Json<CreateEntity>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.update(id, payload).await?;

                Ok(reply(Operation::Update, record))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(patch, path = "/{id}", tag = stringify!($entity), operation_id = concat!("patch", stringify!($entity)),
            request_body = PatchEntity,
            responses((status = StatusCode::OK, description = concat!("Partially updated ", stringify!($entity)), body = $entity))))]
            pub async fn patch(
                Path(id): Path<i64>,
                repository: EntityRepository,
                payload: Result<Json<PatchEntity>, JsonRejection>,
            ) -> ApiResult<impl IntoResponse> {
                let Json(patch) = payload?;
                let current = repository.get(id).await?;
                let payload = patch.apply(current)?;
                payload.validate()?;
                let record = repository.update(id, payload).await?;

                Ok(reply(Operation::PartialUpdate, record))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = stringify!($entity), operation_id = concat!("delete", stringify!($entity)),
            responses((status = StatusCode::NO_CONTENT, description = concat!("Deleted ", stringify!($entity))))))]
            pub async fn delete(
                Path(id): Path<i64>,
                repository: EntityRepository,
            ) -> ApiResult<impl IntoResponse> {
                repository.delete(id).await?;

                Ok(reply(Operation::Delete, ()))
            }

            #[cfg(feature = "openapi")]
            #[cfg_attr(feature = "openapi", derive(utoipa::OpenApi))]
            #[openapi(paths(list, count, get, create, update, patch, delete))]
            struct ApiDocs;

            #[cfg(feature = "openapi")]
            pub(super) fn api_docs() -> utoipa::openapi::OpenApi {
                use utoipa::OpenApi as _;
                ApiDocs::openapi()
            }
        }
    };
}

#[macro_export]
macro_rules! publish_api_docs {
    ($($end_point:path),+) => {
        #[cfg(feature = "openapi")]
        #[derive(utoipa::OpenApi)]
        #[openapi(paths($($end_point),+))]
        struct ModuleDocs;

        #[cfg(feature = "openapi")]
        pub fn api_docs() -> utoipa::openapi::OpenApi {
            use utoipa::OpenApi as _;
            let docs = ModuleDocs::openapi();
            docs.merge_from(crud_api::api_docs())
        }
    };
}
