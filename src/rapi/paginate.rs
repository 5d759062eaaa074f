//! # Lazy Pagination
//!
//! [`Paginate`] walks a list endpoint page by page, yielding individual
//! items until the collection is exhausted, a short page is seen, or a
//! page cap is reached. It is pull-based and blocking: each page is fetched
//! only when the consumer asks for an item beyond the buffered page, and
//! exactly one page is in flight at a time. Dropping the iterator simply
//! stops further requests.
//!
//! A failed envelope, a missing data key, or a non-list body surface as one
//! `Err` item, after which the iterator is fused.
//!
//! Items are raw `serde_json::Value`s; [`Paginate::typed`] converts each one
//! into a `DeserializeOwned` record as it is yielded.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;

use crate::client::ApiClient;
use crate::entity::to_model;
use crate::error::{RapiError, Result};
use crate::transport::Transport;

pub struct Paginate<'a, T: Transport> {
    client: &'a ApiClient<T>,
    endpoint: String,
    /// Caller-supplied query parameters with the page-size param fixed.
    params: Vec<(String, String)>,
    page_param: String,
    page_size: usize,
    data_key: Option<String>,
    max_pages: Option<usize>,
    page: usize,
    buffer: VecDeque<Value>,
    done: bool,
}

impl<'a, T: Transport> Paginate<'a, T> {
    pub(crate) fn new(
        client: &'a ApiClient<T>,
        endpoint: String,
        params: Vec<(String, String)>,
        page_param: String,
        page_size: usize,
        data_key: Option<String>,
        max_pages: Option<usize>,
    ) -> Self {
        Self {
            client,
            endpoint,
            params,
            page_param,
            page_size,
            data_key,
            max_pages,
            page: 1,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Convert each yielded item into a typed record.
    pub fn typed<M: DeserializeOwned>(self) -> impl Iterator<Item = Result<M>> + 'a {
        self.map(|item| item.and_then(to_model))
    }

    /// Fetch the next page into the buffer, updating termination state.
    fn fetch_page(&mut self) -> Result<()> {
        let mut params = self.params.clone();
        params.push((self.page_param.clone(), self.page.to_string()));

        let response = self.client.get(&self.endpoint, &params);
        if !response.success {
            return Err(RapiError::Pagination(format!(
                "Request for page {} failed: {}",
                self.page,
                response.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        let items = extract_items(response.data.unwrap_or(Value::Null), &self.data_key)?;

        if items.is_empty() {
            self.done = true;
            return Ok(());
        }

        let count = items.len();
        self.buffer.extend(items);

        // A page shorter than requested is the last page; asymmetry between
        // requested and returned size is deliberately read as "done".
        if count < self.page_size {
            self.done = true;
        }
        if self.max_pages == Some(self.page) {
            self.done = true;
        }

        self.page += 1;
        Ok(())
    }
}

impl<T: Transport> Iterator for Paginate<'_, T> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Pull the item collection out of a list response body.
fn extract_items(data: Value, data_key: &Option<String>) -> Result<Vec<Value>> {
    match data_key {
        Some(key) => match data {
            Value::Object(mut map) => match map.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                Some(_) => Err(RapiError::Pagination(format!(
                    "Value under data key `{}` is not a list",
                    key
                ))),
                None => Err(RapiError::Pagination(format!(
                    "Missing data key `{}` in response body",
                    key
                ))),
            },
            _ => Err(RapiError::Pagination(format!(
                "Missing data key `{}`: response body is not an object",
                key
            ))),
        },
        None => match data {
            Value::Array(items) => Ok(items),
            _ => Err(RapiError::Pagination(
                "Response body is not a list".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_bare_list() {
        let items = extract_items(json!([1, 2, 3]), &None).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_extract_under_data_key() {
        let items = extract_items(json!({"data": [1, 2]}), &Some("data".to_string())).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_missing_data_key_names_the_key() {
        let err = extract_items(json!({"items": []}), &Some("data".to_string())).unwrap_err();
        assert!(err.to_string().contains("`data`"));
        assert!(matches!(err, RapiError::Pagination(_)));
    }

    #[test]
    fn test_data_key_on_non_object_body() {
        let err = extract_items(json!([1, 2]), &Some("data".to_string())).unwrap_err();
        assert!(err.to_string().contains("`data`"));
    }

    #[test]
    fn test_non_list_body_without_data_key() {
        let err = extract_items(json!({"a": 1}), &None).unwrap_err();
        assert!(err.to_string().contains("not a list"));
    }

    #[test]
    fn test_data_key_value_not_a_list() {
        let err = extract_items(json!({"data": 42}), &Some("data".to_string())).unwrap_err();
        assert!(err.to_string().contains("not a list"));
    }
}
