//! Cursor-following page walker

use super::types::{Page, PageShape, ResultSet};
use crate::error::Result;
use crate::http::{Request, RetryingTransport, Transport, Validation, Validator};
use tracing::{debug, info};

/// Drives a [`RetryingTransport`] across cursor-paginated responses
pub struct PageWalker<'a, T> {
    transport: &'a RetryingTransport<T>,
    shape: &'a PageShape,
    validator: Validator,
}

impl<'a, T: Transport> PageWalker<'a, T> {
    /// Create a walker
    pub fn new(transport: &'a RetryingTransport<T>, shape: &'a PageShape) -> Self {
        Self {
            transport,
            shape,
            validator: Validator::accept_all(),
        }
    }

    /// Validate every page body with `validator`
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Fetch pages until the cursor runs out or `max_pages` is reached
    ///
    /// The first page is always fetched and kept, even when it is empty;
    /// `max_pages` below one is treated as one. Any transport error aborts
    /// the walk and the partial result is dropped.
    pub async fn walk<F>(&self, build_request: F, max_pages: u32) -> Result<ResultSet>
    where
        F: Fn() -> Request,
    {
        let max_pages = max_pages.max(1) as usize;
        let validator = self.validator.clone().and(shape_check(self.shape));
        let mut results = ResultSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = match cursor.as_deref() {
                None => build_request(),
                Some(token) => build_request().with_param(&self.shape.cursor_param, token),
            };

            let body = self.transport.send(&request, &validator).await?;
            let page = Page::parse(body, self.shape)?;
            cursor = page.cursor.clone();

            info!(
                page = results.len() + 1,
                records = page.records.len(),
                has_more = cursor.is_some(),
                "Fetched page"
            );
            results.push(page);

            if cursor.is_none() {
                break;
            }
            if results.len() >= max_pages {
                debug!("Reached page limit ({max_pages}), ignoring remaining cursor");
                break;
            }
        }

        Ok(results)
    }
}

/// Reject bodies that do not parse under `shape` so they are retried
fn shape_check(shape: &PageShape) -> Validator {
    let shape = shape.clone();
    Validator::new(move |body: &str| match Page::parse(body.to_string(), &shape) {
        Ok(_) => Validation::Valid,
        Err(e) => Validation::Invalid(e.to_string()),
    })
}
