//! Page-number pagination for list endpoints.
//!
//! `?page=` is 1-based, `?limit=` overrides the configured page size. Responses
//! carry absolute `next`/`previous` links built from the incoming request.

use crate::app_config::PaginationConfig;
use crate::error::ApiError;
use actix_web::HttpRequest;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;
use url::{form_urlencoded, Url};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    /// Reads `page` and `limit` from a raw query string.
    ///
    /// A page that is not a positive integer is rejected outright; a bad limit
    /// falls back to the default size and a large one is capped.
    pub fn from_query(query: &str, config: &PaginationConfig) -> Result<Self, ApiError> {
        let max_limit = config.max_page_size.max(1);
        let mut page = 1;
        let mut limit = config.page_size.clamp(1, max_limit);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    page = value
                        .parse::<u64>()
                        .ok()
                        .filter(|p| *p > 0)
                        .ok_or(ApiError::InvalidPage)?;
                }
                "limit" => {
                    if let Some(l) = value.parse::<u64>().ok().filter(|l| *l > 0) {
                        limit = l.min(max_limit);
                    }
                }
                _ => {}
            }
        }

        Ok(Self { page, limit })
    }

    /// Uses the configured page size as the default.
    pub fn from_request(req: &HttpRequest) -> Result<Self, ApiError> {
        Self::from_query(req.query_string(), &crate::app_config::pagination())
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn page_count(&self, count: u64) -> u64 {
        let full = count / self.limit;
        let partial = u64::from(count % self.limit != 0);
        (full + partial).max(1)
    }

    /// Page 1 always exists, even when there are no results.
    pub fn check_bounds(&self, count: u64) -> Result<(), ApiError> {
        if self.page > self.page_count(count) {
            Err(ApiError::InvalidPage)
        } else {
            Ok(())
        }
    }
}

/// Paginated response envelope.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: &HttpRequest, params: &PageParams, count: u64, results: Vec<T>) -> Self {
        let next = if params.page < params.page_count(count) {
            page_url(req, params.page + 1)
        } else {
            None
        };
        let previous = if params.page > 1 {
            page_url(req, params.page - 1)
        } else {
            None
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Counts and fetches one page of a select, rejecting pages past the end.
pub async fn fetch_page<C, E>(
    db: &C,
    select: Select<E>,
    params: &PageParams,
) -> Result<(Vec<E::Model>, u64), ApiError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, params.limit as usize);
    let count = paginator.num_items().await? as u64;
    params.check_bounds(count)?;

    let items = paginator.fetch_page((params.page - 1) as usize).await?;
    Ok((items, count))
}

/// Same URL as the request, with `page` swapped out. Page 1 drops the param.
fn page_url(req: &HttpRequest, page: u64) -> Option<String> {
    let info = req.connection_info();
    let mut url = Url::parse(&format!("{}://{}{}", info.scheme(), info.host(), req.path())).ok()?;

    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(req.query_string().as_bytes())
        .into_owned()
        .filter(|(key, _)| key != "page")
        .collect();
    if page > 1 {
        pairs.push(("page".to_owned(), page.to_string()));
    }

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Some(url.to_string())
}
