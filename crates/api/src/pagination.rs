//! Page-number pagination.
//!
//! List endpoints wrap their results in an envelope with absolute
//! `next`/`previous` links:
//!
//! ```json
//! {"links": {"next": "...?page=3", "previous": "...?page=1"}, "count": 42, "page_size": 16, "results": []}
//! ```

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// Query parameters understood by every paginated endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Page size policy of one endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub default_size: u32,
    /// Largest `page_size` a client may ask for. Equal to `default_size`
    /// when the size is fixed.
    pub max_size: u32,
}

/// Dishes: 16 per page, up to 100 on request.
pub const FOODS: Paginator = Paginator {
    default_size: 16,
    max_size: 100,
};

/// Stores: fixed 5 per page.
pub const STORES: Paginator = Paginator {
    default_size: 5,
    max_size: 5,
};

/// Comments and orders.
pub const DEFAULT: Paginator = Paginator {
    default_size: 16,
    max_size: 100,
};

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Paginator {
    /// Resolve query parameters, clamping the page size to `1..=max_size`.
    ///
    /// # Errors
    ///
    /// Returns 404 for page 0.
    pub fn resolve(&self, params: PageParams) -> Result<PageRequest, AppError> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }
        let page_size = params
            .page_size
            .unwrap_or(self.default_size)
            .clamp(1, self.max_size);
        Ok(PageRequest { page, page_size })
    }
}

impl PageRequest {
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Number of pages for `count` items (at least one).
    #[must_use]
    pub fn page_count(&self, count: i64) -> i64 {
        let size = i64::from(self.page_size);
        ((count + size - 1) / size).max(1)
    }

    /// Build the envelope for one page of results.
    ///
    /// `base` is the public URL of the service and `uri` the request URI;
    /// links keep every query parameter and replace `page`.
    ///
    /// # Errors
    ///
    /// Returns 404 when the page is past the last one.
    pub fn respond<T: Serialize>(
        &self,
        base: &Url,
        uri: &Uri,
        count: i64,
        results: Vec<T>,
    ) -> Result<Paginated<T>, AppError> {
        let last = self.page_count(count);
        if i64::from(self.page) > last {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }

        let next = (i64::from(self.page) < last).then(|| page_link(base, uri, self.page + 1));
        let previous = (self.page > 1).then(|| page_link(base, uri, self.page - 1));

        Ok(Paginated {
            links: Links { next, previous },
            count,
            page_size: self.page_size,
            results,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Links {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub links: Links,
    pub count: i64,
    pub page_size: u32,
    pub results: Vec<T>,
}

fn page_link(base: &Url, uri: &Uri, page: u32) -> String {
    let mut url = base.clone();
    url.set_path(uri.path());
    url.set_query(None);

    let kept: Vec<(String, String)> = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(k, _)| k != "page")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("page", &page.to_string());
    }
    url.into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.foodlocation.vn").unwrap()
    }

    #[test]
    fn test_defaults_and_clamping() {
        let req = FOODS.resolve(PageParams::default()).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: 16 });

        let req = FOODS
            .resolve(PageParams {
                page: Some(2),
                page_size: Some(500),
            })
            .unwrap();
        assert_eq!(req.page_size, 100);
        assert_eq!(req.offset(), 100);

        let req = STORES
            .resolve(PageParams {
                page: None,
                page_size: Some(50),
            })
            .unwrap();
        assert_eq!(req.page_size, 5);
    }

    #[test]
    fn test_page_zero_is_not_found() {
        assert!(matches!(
            FOODS.resolve(PageParams {
                page: Some(0),
                page_size: None
            }),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_page_count() {
        let req = PageRequest { page: 1, page_size: 5 };
        assert_eq!(req.page_count(0), 1);
        assert_eq!(req.page_count(5), 1);
        assert_eq!(req.page_count(6), 2);
    }

    #[test]
    fn test_links_preserve_filters() {
        let uri: Uri = "/api/foods?q=pho&page=2&ordering=-price".parse().unwrap();
        let req = PageRequest { page: 2, page_size: 16 };
        let page = req.respond(&base(), &uri, 40, vec![1, 2, 3]).unwrap();

        assert_eq!(
            page.links.next.as_deref(),
            Some("https://api.foodlocation.vn/api/foods?q=pho&ordering=-price&page=3")
        );
        assert_eq!(
            page.links.previous.as_deref(),
            Some("https://api.foodlocation.vn/api/foods?q=pho&ordering=-price&page=1")
        );
        assert_eq!(page.count, 40);
    }

    #[test]
    fn test_first_and_last_pages_have_one_link() {
        let uri: Uri = "/api/stores".parse().unwrap();
        let first = PageRequest { page: 1, page_size: 5 }
            .respond(&base(), &uri, 7, vec!["a"])
            .unwrap();
        assert!(first.links.previous.is_none());
        assert!(first.links.next.is_some());

        let last = PageRequest { page: 2, page_size: 5 }
            .respond(&base(), &uri, 7, vec!["b"])
            .unwrap();
        assert!(last.links.next.is_none());
        assert_eq!(
            last.links.previous.as_deref(),
            Some("https://api.foodlocation.vn/api/stores?page=1")
        );
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let uri: Uri = "/api/foods?page=4".parse().unwrap();
        let req = PageRequest { page: 4, page_size: 16 };
        assert!(matches!(
            req.respond::<u8>(&base(), &uri, 40, vec![]),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_first_page_is_fine() {
        let uri: Uri = "/api/foods".parse().unwrap();
        let page = PageRequest { page: 1, page_size: 16 }
            .respond::<u8>(&base(), &uri, 0, vec![])
            .unwrap();
        assert_eq!(page.count, 0);
        assert!(page.links.next.is_none());
    }
}
