//! Verify request building and response handling against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each build vector names a path, resource, method and payload together
//! with the expected request; each response vector pairs a simulated
//! response with the expected entity or error. Bodies are compared as
//! strings on purpose: the POST body must be the serializer output,
//! unmodified.

use std::sync::Mutex;

use restfully::{ApiError, ApiRequest, ApiResponse, ApiService, HttpMethod, JsonSerializer, Transport};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

const BASE_URL: &str = "http://localhost:3000/";

/// Answers every request with a response taken from `next`.
struct ReplayTransport {
    next: Mutex<Option<ApiResponse>>,
}

impl ReplayTransport {
    fn new(response: ApiResponse) -> Self {
        Self {
            next: Mutex::new(Some(response)),
        }
    }
}

impl Transport for ReplayTransport {
    fn send(&self, _request: &ApiRequest) -> ApiResponse {
        self.next.lock().unwrap().take().expect("one response per vector")
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    name: String,
    quantity: u32,
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let serializer = JsonSerializer::new().omit_nulls(case["omit_nulls"].as_bool().unwrap_or(false));
        let svc = ApiService::new(
            Url::parse(BASE_URL).unwrap(),
            case["path"].as_str().unwrap(),
            ReplayTransport::new(ApiResponse::ok("{}")),
            serializer,
        );
        let method = parse_method(case["method"].as_str().unwrap());
        let data = &case["data"];
        let data = (!data.is_null()).then_some(data);

        let req = svc.build_request(case["resource"].as_str().unwrap(), method, data).unwrap();
        let expected = &case["expected_request"];

        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.endpoint, expected["endpoint"].as_str().unwrap(), "{name}: endpoint");
        assert_eq!(
            req.url().unwrap().as_str(),
            format!("{}{}", BASE_URL.trim_end_matches('/'), expected["url"].as_str().unwrap()),
            "{name}: url"
        );
        assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");

        let parameters: Value = serde_json::to_value(&req.parameters).unwrap();
        assert_eq!(parameters, expected["parameters"], "{name}: parameters");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let content = sim["content"].as_str().unwrap().to_string();
        let response = ApiResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            content_length: content.len() as u64,
            content,
            error_message: sim["error_message"].as_str().map(str::to_string),
            ..ApiResponse::default()
        };

        let svc = ApiService::new(
            Url::parse(BASE_URL).unwrap(),
            "api/items",
            ReplayTransport::new(response),
            JsonSerializer::new(),
        );
        let result = svc.get_request::<Item, Value>("", None);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error["kind"].as_str().unwrap() {
                "Status" => {
                    let ApiError::Status { status, message } = err else {
                        panic!("{name}: expected Status, got {err:?}");
                    };
                    assert_eq!(Some(status as u64), expected_error["status"].as_u64(), "{name}: status");
                    assert_eq!(message, expected_error["message"].as_str().unwrap(), "{name}: message");
                }
                "Deserialization" => {
                    assert!(matches!(err, ApiError::Deserialization(_)), "{name}: expected Deserialization");
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let item = result.unwrap();
            let expected: Item = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(item, expected, "{name}: parsed result");
        }
    }
}
