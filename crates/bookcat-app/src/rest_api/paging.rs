use crate::error::ApiResult;
use bookcat_dal::{Batch, ListingParams};
use garde::Validate;
use serde::Serialize;

mod parsers;

#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi",into_params(parameter_in = Query))]
#[garde(allow_unvalidated)]
pub struct Paging {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    /// Comma separated field names, `-` prefix for descending order
    #[garde(length(max = 255))]
    ordering: Option<String>,
    /// Case insensitive substring search
    #[garde(length(max = 255))]
    search: Option<String>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(default_page_size);
        let offset = i64::from(page - 1) * i64::from(page_size);
        let mut params = ListingParams::new(offset, page_size.into());
        if let Some(ordering) = self.ordering.as_deref() {
            params = params.with_order(parsers::parse_ordering(ordering)?);
        }
        if let Some(search) = self.search {
            params = params.with_search(search);
        }

        Ok(params)
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Page<T> {
    page: u64,
    page_size: u32,
    total_pages: u64,
    total: u64,
    rows: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let size = u64::from(page_size);
        Self {
            page: batch.offset.max(0) as u64 / size + 1,
            page_size,
            total_pages: batch.total.div_ceil(size),
            total: batch.total,
            rows: batch.rows,
        }
    }
}
