//! Integration tests for request binding.
//!
//! These run the derive macro, the binder and the handler wrappers together
//! the way a service would wire them.

use bytes::Bytes;
use hermes_bind::response::JsonResponse;
use hermes_bind::{
    Bind, BindConfig, Binder, Bound, ConfigLoader, DecodePolicy, ExtractionContext, FieldKind,
    FromRequest, JsonBodyPreset, MismatchPolicy, PathInjection, QueryPreset,
};
use http::{Method, Response, StatusCode, Uri};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Record used by the handler tests.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize, Bind)]
#[serde(default)]
struct TestRequest {
    #[bind(query = "id")]
    id: String,
    #[bind(query = "start")]
    start: String,
    #[bind(query = "stop")]
    stop: String,
    name: String,
}

/// Record capturing the raw body.
#[derive(Debug, Default, Deserialize, Serialize, Bind)]
#[serde(default)]
struct UpsertRequest {
    id: String,
    kind: String,
    data: Map<String, Value>,
}

/// Record exercising renamed and aliased fields.
#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct MemberRequest {
    #[bind(path = "team")]
    team_slug: String,
    #[bind(rename = "UserName")]
    user: String,
    #[bind(query = "verbose")]
    verbose: bool,
    #[bind(readonly)]
    role: String,
}

/// Record whose alias collides with the identifier field.
#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct ChildRequest {
    #[bind(path = "id")]
    parent: String,
    id: String,
    #[bind(path = "parent_id")]
    owner: String,
}

/// A shared service passed to handlers.
struct TaskStore {
    calls: AtomicUsize,
}

impl TaskStore {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn describe(&self, req: &TestRequest) -> Value {
        self.calls.fetch_add(1, Ordering::SeqCst);
        json!({ "task": req.id, "name": req.name })
    }
}

fn request(uri: &'static str, body: &'static str) -> ExtractionContext {
    ExtractionContext::builder()
        .method(Method::POST)
        .uri(Uri::from_static(uri))
        .json(body)
        .path_param("id", "123")
        .build()
}

fn echo(_ctx: &ExtractionContext, req: TestRequest) -> Response<Bytes> {
    JsonResponse::new(req).into_response()
}

fn body_json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[test]
fn test_derived_table() {
    let fields = TestRequest::fields();
    let names: Vec<_> = fields.iter().map(|f| f.name).collect();
    assert_eq!(names, ["id", "start", "stop", "name"]);
    assert_eq!(fields[1].query_key, Some("start"));
    assert!(fields[3].query_key.is_none());

    let bag = UpsertRequest::data_bag().unwrap();
    assert_eq!(bag.name, "data");
    assert_eq!(bag.kind, FieldKind::DataBag);

    let members = MemberRequest::fields();
    assert_eq!(members[0].path_key, Some("team"));
    assert_eq!(members[1].name, "UserName");
    assert_eq!(members[2].kind, FieldKind::Scalar);
    assert!(!members[3].is_settable());
}

#[test]
fn test_merges_body_query_and_path() {
    let handler = Binder::new(BindConfig::path()).wrap(echo);
    let response = handler(&request(
        "/test/123?start=2020-01-01&stop=2025-01-01",
        r#"{"name":"test-name"}"#,
    ));

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({
            "id": "123",
            "start": "2020-01-01",
            "stop": "2025-01-01",
            "name": "test-name",
        })
    );
}

#[test]
fn test_strict_truncated_body_skips_handler() {
    let calls = AtomicUsize::new(0);
    let binder = Binder::new(BindConfig::json_body());
    let handler = binder.wrap(|ctx: &ExtractionContext, req: TestRequest| {
        calls.fetch_add(1, Ordering::SeqCst);
        echo(ctx, req)
    });

    let response = handler(&request("/test/123", r#"{"name":"#));

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(body_json(&response)["error"].is_string());
}

#[test]
fn test_best_effort_malformed_body_still_calls_handler() {
    let calls = AtomicUsize::new(0);
    let binder = Binder::new(BindConfig::path());
    let handler = binder.wrap(|ctx: &ExtractionContext, req: TestRequest| {
        calls.fetch_add(1, Ordering::SeqCst);
        echo(ctx, req)
    });

    let response = handler(&request("/test/123?start=2020-01-01", r#"{"name":"#));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        body_json(&response),
        json!({ "id": "123", "start": "2020-01-01", "stop": "", "name": "" })
    );
}

#[test]
fn test_identifier_override_wins_for_every_variant() {
    let ctx = request("/test/123?id=from-query", r#"{"id": "from-body"}"#);
    let configs = [
        BindConfig::path(),
        BindConfig::json_body(),
        BindConfig::query(),
        BindConfig::path_with_body(),
        BindConfig::json_body().with_query(DecodePolicy::BestEffort),
    ];

    for config in configs {
        let req: TestRequest = Binder::new(config).bind(&ctx).unwrap();
        assert_eq!(req.id, "123", "{config:?}");
    }
}

#[test]
fn test_data_bag_is_verbatim() {
    let body = r#"{"kind": "widget", "size": 3, "tags": ["a", "b"], "meta": {"x": null}}"#;
    let binder = Binder::new(BindConfig::json_body());
    let handler = binder.wrap(|_: &ExtractionContext, req: UpsertRequest| {
        JsonResponse::new(req).into_response()
    });

    let echoed = body_json(&handler(&request("/upsert/123", body)));

    assert_eq!(echoed["id"], "123");
    assert_eq!(echoed["kind"], "");
    assert_eq!(echoed["data"], serde_json::from_str::<Value>(body).unwrap());
}

#[test]
fn test_service_handler() {
    let store = Arc::new(TaskStore::new());
    let handler = Binder::new(BindConfig::json_body()).wrap_with_service(
        |_: &ExtractionContext, req: TestRequest, store: &TaskStore| {
            JsonResponse::new(store.describe(&req)).into_response()
        },
        Arc::clone(&store),
    );

    let ok = handler(&request("/test/123", r#"{"name": "n"}"#));
    let bad = handler(&request("/test/123", "{"));

    assert_eq!(body_json(&ok), json!({ "task": "123", "name": "n" }));
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_aliases_and_read_only_fields() {
    let ctx = ExtractionContext::builder()
        .uri(Uri::from_static("/teams/core/members/ada?verbose=true"))
        .path_param("team", "core")
        .path_param("username", "ada")
        .path_param("role", "admin")
        .build();

    let req: MemberRequest = Binder::new(BindConfig::path()).bind(&ctx).unwrap();

    assert_eq!(req.team_slug, "core");
    assert_eq!(req.user, "ada");
    assert!(req.verbose);
    assert_eq!(req.role, "");
}

#[test]
fn test_alias_never_shadows_identifier() {
    let ctx = ExtractionContext::builder()
        .path_param("id", "123")
        .path_param("parent_id", "9")
        .build();

    let req: ChildRequest = Binder::new(BindConfig::path()).bind(&ctx).unwrap();

    assert_eq!(req.id, "123");
    assert_eq!(req.parent, "");
    assert_eq!(req.owner, "9");
}

#[test]
fn test_reject_mismatches() {
    let ctx = ExtractionContext::builder().path_param("role", "admin").build();
    let binder = Binder::new(BindConfig::path().with_mismatches(MismatchPolicy::Reject));

    let response = binder.handle(&ctx, |_, _: MemberRequest| Response::new(Bytes::new()));

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(&response)["error"],
        "path parameter 'role' not bound: field is read-only"
    );
}

#[test]
fn test_no_path_injection() {
    let ctx = request("/test/123", r#"{"name": "n"}"#);
    let binder = Binder::new(BindConfig::path().with_path(PathInjection::None));

    let req: TestRequest = binder.bind(&ctx).unwrap();
    assert_eq!(req.id, "");
    assert_eq!(req.name, "n");
}

#[test]
fn test_bound_presets() {
    let ctx = request("/test/123?start=s", r#"{"name": "n"}"#);

    let by_query = Bound::<TestRequest, QueryPreset>::from_request(&ctx).unwrap();
    assert_eq!(by_query.id, "123");
    assert_eq!(by_query.start, "s");
    assert_eq!(by_query.name, "");

    let by_body = Bound::<TestRequest, JsonBodyPreset>::from_request(&ctx).unwrap();
    assert_eq!((by_body.start.as_str(), by_body.name.as_str()), ("", "n"));
}

#[test]
fn test_loaded_config_drives_binder() {
    let config = ConfigLoader::new()
        .with_string(
            r#"
            body = "strict"
            query = "ignore"
            path = "identifier-only"
            max_body_size = 16
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let binder = Binder::new(config);
    let too_big = request("/test/123", r#"{"name": "a name longer than sixteen bytes"}"#);
    let response = binder.handle(&too_big, echo);

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

proptest! {
    #[test]
    fn prop_path_params_match_any_casing(
        value in "[a-z0-9-]{0,16}",
        upper in proptest::collection::vec(any::<bool>(), 4),
    ) {
        let param: String = "name"
            .chars()
            .zip(&upper)
            .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();

        let ctx = ExtractionContext::builder().path_param(param, value.clone()).build();
        let req: TestRequest = Binder::new(BindConfig::path()).bind(&ctx).unwrap();

        prop_assert_eq!(req.name, value);
    }

    #[test]
    fn prop_identifier_override_beats_body(body_id in "[a-z]{1,8}", path_id in "[0-9]{1,8}") {
        let body = Bytes::from(json!({ "id": body_id }).to_string());
        let ctx = ExtractionContext::builder()
            .json(body)
            .path_param("id", path_id.clone())
            .build();

        let req: TestRequest = Binder::new(BindConfig::json_body()).bind(&ctx).unwrap();
        prop_assert_eq!(req.id, path_id);
    }
}
