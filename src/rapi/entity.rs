//! # Entity Abstraction
//!
//! An [`Entity`] binds static per-resource metadata ([`EntityConfig`]) to a
//! client, providing CRUD, filtered/sorted/paged `list`, custom sub-resource
//! actions, and typed-record conversion.
//!
//! ## Validation Before I/O
//!
//! `list` and `paginate` validate every filter and sort key against the
//! declared field sets *before* any request is issued. A resource with no
//! declared sets is permissive: nothing was declared, so nothing is
//! rejected. Declared sets are enforced strictly.
//!
//! ## Typed Records
//!
//! `to_model::<M>` converts a raw JSON value into any `DeserializeOwned`
//! record through serde — the single schema-construction capability used
//! everywhere in this crate.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::client::ApiClient;
use crate::error::{RapiError, Result};
use crate::paginate::Paginate;
use crate::response::Response;
use crate::transport::{Method, Transport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = RapiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(RapiError::Validation(format!(
                "Invalid sort direction: {} (expected asc or desc)",
                other
            ))),
        }
    }
}

/// Static per-resource metadata. Built once, never mutated at runtime.
///
/// Also deserializable from the profile file's `entities` section, so field
/// sets and pagination defaults can be declared per deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityConfig {
    pub resource: String,

    #[serde(default = "default_id_field")]
    pub id_field: String,

    #[serde(default)]
    pub filterable: BTreeSet<String>,

    #[serde(default)]
    pub sortable: BTreeSet<String>,

    #[serde(default)]
    pub default_sort: Option<String>,

    #[serde(default)]
    pub default_order: SortDirection,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Field under which a list endpoint nests its item array, when the body
    /// is not a bare array.
    #[serde(default)]
    pub data_key: Option<String>,

    #[serde(default = "default_page_param")]
    pub page_param: String,

    #[serde(default = "default_page_size_param")]
    pub page_size_param: String,

    #[serde(default = "default_sort_param")]
    pub sort_param: String,

    #[serde(default = "default_order_param")]
    pub order_param: String,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_page_size_param() -> String {
    "page_size".to_string()
}

fn default_sort_param() -> String {
    "sort".to_string()
}

fn default_order_param() -> String {
    "order".to_string()
}

impl EntityConfig {
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.trim_matches('/').to_string(),
            id_field: default_id_field(),
            filterable: BTreeSet::new(),
            sortable: BTreeSet::new(),
            default_sort: None,
            default_order: SortDirection::Asc,
            page_size: default_page_size(),
            data_key: None,
            page_param: default_page_param(),
            page_size_param: default_page_size_param(),
            sort_param: default_sort_param(),
            order_param: default_order_param(),
        }
    }

    pub fn filterable(mut self, fields: &[&str]) -> Self {
        self.filterable = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn sortable(mut self, fields: &[&str]) -> Self {
        self.sortable = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_default_sort(mut self, field: &str, order: SortDirection) -> Self {
        self.default_sort = Some(field.to_string());
        self.default_order = order;
        self
    }

    pub fn with_data_key(mut self, key: &str) -> Self {
        self.data_key = Some(key.to_string());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_id_field(mut self, field: &str) -> Self {
        self.id_field = field.to_string();
        self
    }
}

/// Options for `list` and `paginate`.
///
/// Filters live in a `BTreeMap` so identical inputs always translate to
/// structurally identical query parameters.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filters: BTreeMap<String, String>,
    pub sort: Option<String>,
    pub order: Option<SortDirection>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: impl ToString) -> Self {
        self.filters.insert(field.to_string(), value.to_string());
        self
    }

    pub fn sort(mut self, field: &str, order: SortDirection) -> Self {
        self.sort = Some(field.to_string());
        self.order = Some(order);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// A typed binding between entity metadata and a client.
pub struct Entity<'a, T: Transport> {
    client: &'a ApiClient<T>,
    config: EntityConfig,
}

impl<'a, T: Transport> Entity<'a, T> {
    pub fn new(client: &'a ApiClient<T>, config: EntityConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// List one page of the resource. Filter and sort keys are checked
    /// against the declared field sets before any request goes out.
    pub fn list(&self, options: &ListOptions) -> Result<Response> {
        let params = self.list_params(options)?;
        Ok(self.client.get(&self.config.resource, &params))
    }

    pub fn get(&self, id: &str) -> Response {
        self.client.get(&format!("{}/{}", self.config.resource, id), &[])
    }

    pub fn create(&self, body: Value) -> Response {
        self.client.post(&self.config.resource, body)
    }

    pub fn update(&self, id: &str, body: Value) -> Response {
        self.client
            .put(&format!("{}/{}", self.config.resource, id), body)
    }

    pub fn delete(&self, id: &str) -> Response {
        self.client.delete(&format!("{}/{}", self.config.resource, id))
    }

    /// Issue a resource-specific verb against `<resource>/<id>/<action>`.
    ///
    /// Returns the envelope; call sites that need a bare value convert it
    /// with `Response::into_result`.
    pub fn custom_action(
        &self,
        id: &str,
        action: &str,
        method: Method,
        body: Option<Value>,
    ) -> Response {
        let endpoint = format!("{}/{}/{}", self.config.resource, id, action);
        self.client.request(method, &endpoint, &[], body)
    }

    /// Lazily iterate every item of the resource, page by page.
    ///
    /// `max_pages` caps how many pages will be fetched; `None` means
    /// iterate until exhaustion.
    pub fn paginate(
        &self,
        options: &ListOptions,
        max_pages: Option<usize>,
    ) -> Result<Paginate<'a, T>> {
        self.validate(options)?;
        let page_size = options.page_size.unwrap_or(self.config.page_size);

        let mut params = self.base_params(options);
        params.push((self.config.page_size_param.clone(), page_size.to_string()));

        Ok(Paginate::new(
            self.client,
            self.config.resource.clone(),
            params,
            self.config.page_param.clone(),
            page_size,
            self.config.data_key.clone(),
            max_pages,
        ))
    }

    /// Convert a raw value into a typed record.
    pub fn to_model<M: DeserializeOwned>(&self, raw: Value) -> Result<M> {
        to_model(raw)
    }

    fn validate(&self, options: &ListOptions) -> Result<()> {
        if !self.config.filterable.is_empty() {
            for field in options.filters.keys() {
                if !self.config.filterable.contains(field) {
                    return Err(RapiError::Validation(format!(
                        "Field `{}` is not filterable on `{}` (allowed: {})",
                        field,
                        self.config.resource,
                        join(&self.config.filterable)
                    )));
                }
            }
        }
        if let Some(field) = &options.sort {
            if !self.config.sortable.is_empty() && !self.config.sortable.contains(field) {
                return Err(RapiError::Validation(format!(
                    "Field `{}` is not sortable on `{}` (allowed: {})",
                    field,
                    self.config.resource,
                    join(&self.config.sortable)
                )));
            }
        }
        Ok(())
    }

    /// Filters and sort translated to query parameters, without paging.
    fn base_params(&self, options: &ListOptions) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = options
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let sort = options.sort.clone().or_else(|| self.config.default_sort.clone());
        if let Some(field) = sort {
            let order = options.order.unwrap_or(self.config.default_order);
            params.push((self.config.sort_param.clone(), field));
            params.push((self.config.order_param.clone(), order.to_string()));
        }

        params
    }

    fn list_params(&self, options: &ListOptions) -> Result<Vec<(String, String)>> {
        self.validate(options)?;
        let mut params = self.base_params(options);
        if let Some(page) = options.page {
            params.push((self.config.page_param.clone(), page.to_string()));
        }
        if let Some(page_size) = options.page_size {
            params.push((self.config.page_size_param.clone(), page_size.to_string()));
        }
        Ok(params)
    }
}

/// The schema-construction capability: raw JSON in, validated record out.
pub fn to_model<M: DeserializeOwned>(raw: Value) -> Result<M> {
    serde_json::from_value(raw)
        .map_err(|e| RapiError::Validation(format!("Record does not match target shape: {}", e)))
}

fn join(fields: &BTreeSet<String>) -> String {
    fields.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MockTransport;
    use serde_json::json;

    fn users_config() -> EntityConfig {
        EntityConfig::new("users")
            .filterable(&["name", "status"])
            .sortable(&["name", "created_at"])
    }

    fn client(transport: MockTransport) -> ApiClient<MockTransport> {
        ApiClient::new(transport, "http://api.test")
    }

    #[test]
    fn test_list_translates_filters_and_sort() {
        let transport = MockTransport::new();
        transport.push_response(200, "[]");
        let client = client(transport);
        let entity = client.entity(users_config());

        let options = ListOptions::new()
            .filter("status", "active")
            .filter("name", "ann")
            .sort("name", SortDirection::Desc)
            .page(3)
            .page_size(25);
        entity.list(&options).unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests[0].url, "http://api.test/users");
        assert_eq!(
            requests[0].query,
            vec![
                ("name".to_string(), "ann".to_string()),
                ("status".to_string(), "active".to_string()),
                ("sort".to_string(), "name".to_string()),
                ("order".to_string(), "desc".to_string()),
                ("page".to_string(), "3".to_string()),
                ("page_size".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_is_idempotent_over_params() {
        let transport = MockTransport::new();
        transport.push_response(200, "[]");
        transport.push_response(200, "[]");
        let client = client(transport);
        let entity = client.entity(users_config());

        let options = ListOptions::new().filter("status", "active").page(1);
        entity.list(&options).unwrap();
        entity.list(&options).unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests[0].query, requests[1].query);
        assert_eq!(requests[0].url, requests[1].url);
    }

    #[test]
    fn test_unknown_filter_rejected_before_request() {
        let transport = MockTransport::new();
        let client = client(transport);
        let entity = client.entity(users_config());

        let options = ListOptions::new().filter("age", "30");
        let err = entity.list(&options).unwrap_err();

        assert!(matches!(err, RapiError::Validation(_)));
        assert!(err.to_string().contains("age"));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[test]
    fn test_unknown_sort_rejected_before_request() {
        let transport = MockTransport::new();
        let client = client(transport);
        let entity = client.entity(users_config());

        let options = ListOptions::new().sort("age", SortDirection::Asc);
        let err = entity.list(&options).unwrap_err();

        assert!(matches!(err, RapiError::Validation(_)));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[test]
    fn test_undeclared_sets_are_permissive() {
        let transport = MockTransport::new();
        transport.push_response(200, "[]");
        let client = client(transport);
        let entity = client.entity(EntityConfig::new("widgets"));

        let options = ListOptions::new().filter("anything", "goes");
        assert!(entity.list(&options).is_ok());
    }

    #[test]
    fn test_default_sort_applied_when_unset() {
        let transport = MockTransport::new();
        transport.push_response(200, "[]");
        let client = client(transport);
        let entity = client.entity(
            users_config().with_default_sort("created_at", SortDirection::Desc),
        );

        entity.list(&ListOptions::new()).unwrap();
        let requests = client.transport().requests();
        assert_eq!(
            requests[0].query,
            vec![
                ("sort".to_string(), "created_at".to_string()),
                ("order".to_string(), "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_crud_endpoints() {
        let transport = MockTransport::new();
        for _ in 0..4 {
            transport.push_response(200, "{}");
        }
        let client = client(transport);
        let entity = client.entity(users_config());

        entity.get("7");
        entity.create(json!({"name": "ann"}));
        entity.update("7", json!({"name": "bob"}));
        entity.delete("7");

        let requests = client.transport().requests();
        assert_eq!(requests[0].url, "http://api.test/users/7");
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[1].url, "http://api.test/users");
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[2].method, Method::Put);
        assert_eq!(requests[3].method, Method::Delete);
    }

    #[test]
    fn test_custom_action_path_and_method() {
        let transport = MockTransport::new();
        transport.push_response(200, r#"{"status": "activated"}"#);
        let client = client(transport);
        let entity = client.entity(users_config());

        let response = entity.custom_action("7", "activate", Method::Post, None);
        assert!(response.success);

        let requests = client.transport().requests();
        assert_eq!(requests[0].url, "http://api.test/users/7/activate");
        assert_eq!(requests[0].method, Method::Post);
    }

    #[test]
    fn test_custom_action_failure_raises_at_call_site() {
        let transport = MockTransport::new();
        transport.push_response(409, r#"{"error": "already active"}"#);
        let client = client(transport);
        let entity = client.entity(users_config());

        let err = entity
            .custom_action("7", "activate", Method::Post, None)
            .into_result()
            .unwrap_err();
        match err {
            RapiError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "already active");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_model() {
        #[derive(Debug, serde::Deserialize)]
        struct User {
            name: String,
        }

        let user: User = to_model(json!({"name": "ann", "extra": true})).unwrap();
        assert_eq!(user.name, "ann");

        let err = to_model::<User>(json!({"nome": "ann"})).unwrap_err();
        assert!(matches!(err, RapiError::Validation(_)));
    }

    #[test]
    fn test_config_from_json_with_defaults() {
        let config: EntityConfig =
            serde_json::from_str(r#"{"resource": "orders", "data_key": "results"}"#).unwrap();
        assert_eq!(config.resource, "orders");
        assert_eq!(config.id_field, "id");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.data_key.as_deref(), Some("results"));
        assert_eq!(config.page_param, "page");
    }
}
