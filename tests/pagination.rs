//! Pagination behavior against the mock transport.
//!
//! Every test asserts both on the yielded items and on the requests the
//! transport actually executed, so termination bugs (an extra page fetch,
//! a missing one) show up directly.

use rapi::client::ApiClient;
use rapi::entity::{EntityConfig, ListOptions};
use rapi::error::RapiError;
use rapi::transport::memory::MockTransport;
use serde_json::{json, Value};

fn client(transport: MockTransport) -> ApiClient<MockTransport> {
    ApiClient::new(transport, "http://api.test")
}

fn page_of(ids: &[u64]) -> String {
    let items: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    Value::Array(items).to_string()
}

/// Query value for a given key on the nth executed request.
fn query_param(transport: &MockTransport, request: usize, key: &str) -> Option<String> {
    transport.requests()[request]
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

#[test]
fn five_items_at_page_size_two_takes_three_requests() {
    let transport = MockTransport::new();
    transport.push_response(200, &page_of(&[1, 2]));
    transport.push_response(200, &page_of(&[3, 4]));
    transport.push_response(200, &page_of(&[5]));

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_page_size(2));

    let items: Vec<Value> = entity
        .paginate(&ListOptions::new(), None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let ids: Vec<u64> = items.iter().map(|v| v["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    // The short third page terminates iteration: no fourth request.
    let transport = client.transport();
    assert_eq!(transport.request_count(), 3);
    for (i, expected) in ["1", "2", "3"].iter().enumerate() {
        assert_eq!(query_param(transport, i, "page").as_deref(), Some(*expected));
        assert_eq!(query_param(transport, i, "page_size").as_deref(), Some("2"));
    }
}

#[test]
fn exact_multiple_requires_one_empty_page_to_terminate() {
    let transport = MockTransport::new();
    transport.push_response(200, &page_of(&[1, 2]));
    transport.push_response(200, &page_of(&[3, 4]));
    transport.push_response(200, "[]");

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_page_size(2));

    let items: Vec<Value> = entity
        .paginate(&ListOptions::new(), None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(client.transport().request_count(), 3);
}

#[test]
fn max_pages_caps_requests_even_with_more_data() {
    let transport = MockTransport::new();
    transport.push_response(200, &page_of(&[1, 2]));
    transport.push_response(200, &page_of(&[3, 4]));
    // A third full page exists but must never be requested.
    transport.push_response(200, &page_of(&[5, 6]));

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_page_size(2));

    let items: Vec<Value> = entity
        .paginate(&ListOptions::new(), Some(2))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(client.transport().request_count(), 2);
}

#[test]
fn empty_first_page_yields_nothing() {
    let transport = MockTransport::new();
    transport.push_response(200, "[]");

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users"));

    let mut pager = entity.paginate(&ListOptions::new(), None).unwrap();
    assert!(pager.next().is_none());
    assert_eq!(client.transport().request_count(), 1);
}

#[test]
fn items_nested_under_data_key() {
    let transport = MockTransport::new();
    transport.push_response(200, r#"{"data": [{"id": 1}], "total": 1}"#);

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_data_key("data").with_page_size(5));

    let items: Vec<Value> = entity
        .paginate(&ListOptions::new(), None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 1);
}

#[test]
fn missing_data_key_fails_naming_the_key() {
    let transport = MockTransport::new();
    transport.push_response(200, r#"{"items": [{"id": 1}]}"#);

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_data_key("data"));

    let mut pager = entity.paginate(&ListOptions::new(), None).unwrap();
    let err = pager.next().unwrap().unwrap_err();
    assert!(matches!(err, RapiError::Pagination(_)));
    assert!(err.to_string().contains("`data`"));

    // Zero items and the iterator is fused.
    assert!(pager.next().is_none());
    assert_eq!(client.transport().request_count(), 1);
}

#[test]
fn non_list_body_without_data_key_fails() {
    let transport = MockTransport::new();
    transport.push_response(200, r#"{"id": 1}"#);

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users"));

    let mut pager = entity.paginate(&ListOptions::new(), None).unwrap();
    let err = pager.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("not a list"));
    assert!(pager.next().is_none());
}

#[test]
fn failed_response_stops_pagination_with_the_server_message() {
    let transport = MockTransport::new();
    transport.push_response(200, &page_of(&[1, 2]));
    transport.push_response(500, r#"{"error": "database on fire"}"#);

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_page_size(2));

    let mut pager = entity.paginate(&ListOptions::new(), None).unwrap();
    assert!(pager.next().unwrap().is_ok());
    assert!(pager.next().unwrap().is_ok());

    let err = pager.next().unwrap().unwrap_err();
    assert!(matches!(err, RapiError::Pagination(_)));
    assert!(err.to_string().contains("database on fire"));
    assert!(err.to_string().contains("page 2"));

    assert!(pager.next().is_none());
    assert_eq!(client.transport().request_count(), 2);
}

#[test]
fn filters_rejected_before_any_page_is_fetched() {
    let transport = MockTransport::new();
    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").filterable(&["name"]));

    let options = ListOptions::new().filter("age", "30");
    let err = entity.paginate(&options, None).map(|_| ()).unwrap_err();
    assert!(matches!(err, RapiError::Validation(_)));
    assert_eq!(client.transport().request_count(), 0);
}

#[test]
fn filters_and_sort_carry_into_every_page_request() {
    let transport = MockTransport::new();
    transport.push_response(200, &page_of(&[1, 2]));
    transport.push_response(200, &page_of(&[3]));

    let client = client(transport);
    let entity = client.entity(
        EntityConfig::new("users")
            .filterable(&["status"])
            .sortable(&["name"])
            .with_page_size(2),
    );

    let options = ListOptions::new()
        .filter("status", "active")
        .sort("name", rapi::SortDirection::Asc);
    let count = entity
        .paginate(&options, None)
        .unwrap()
        .filter(|item| item.is_ok())
        .count();
    assert_eq!(count, 3);

    let transport = client.transport();
    for i in 0..2 {
        assert_eq!(query_param(transport, i, "status").as_deref(), Some("active"));
        assert_eq!(query_param(transport, i, "sort").as_deref(), Some("name"));
        assert_eq!(query_param(transport, i, "order").as_deref(), Some("asc"));
    }
}

#[test]
fn typed_pagination_validates_each_record() {
    #[derive(Debug, serde::Deserialize)]
    struct User {
        id: u64,
    }

    let transport = MockTransport::new();
    transport.push_response(200, r#"[{"id": 1}, {"id": "not a number"}]"#);

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_page_size(5));

    let mut pager = entity
        .paginate(&ListOptions::new(), None)
        .unwrap()
        .typed::<User>();

    assert_eq!(pager.next().unwrap().unwrap().id, 1);
    let err = pager.next().unwrap().unwrap_err();
    assert!(matches!(err, RapiError::Validation(_)));
}

#[test]
fn each_paginate_call_starts_fresh() {
    let transport = MockTransport::new();
    transport.push_response(200, &page_of(&[1]));
    transport.push_response(200, &page_of(&[1]));

    let client = client(transport);
    let entity = client.entity(EntityConfig::new("users").with_page_size(2));
    let options = ListOptions::new();

    let first: Vec<_> = entity.paginate(&options, None).unwrap().collect();
    let second: Vec<_> = entity.paginate(&options, None).unwrap().collect();
    assert_eq!(first.len(), second.len());

    let transport = client.transport();
    assert_eq!(query_param(transport, 0, "page").as_deref(), Some("1"));
    assert_eq!(query_param(transport, 1, "page").as_deref(), Some("1"));
}
