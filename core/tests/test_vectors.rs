//! Verify build methods against the JSON test vectors in `test-vectors/`.
//!
//! Each case names an operation, its arguments, and the bridge argument
//! object the builder must produce. Comparing parsed JSON (not raw strings)
//! avoids false negatives from field ordering.

use force_net_core::{ClientConfig, RequestBuilder, RequestDescriptor};
use serde_json::{Map, Value};

fn arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args[key].as_str().unwrap_or_else(|| panic!("missing argument {key}"))
}

fn opt_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn fields(args: &Value) -> Map<String, Value> {
    args["fields"].as_object().cloned().unwrap_or_default()
}

/// Dispatch a vector case to the matching builder method.
fn build(b: &RequestBuilder, operation: &str, args: &Value) -> Option<RequestDescriptor> {
    let req = match operation {
        "versions" => b.versions(),
        "resources" => b.resources(),
        "describe_global" => b.describe_global(),
        "metadata" => b.metadata(arg(args, "objtype")),
        "describe" => b.describe(arg(args, "objtype")),
        "describe_layout" => b.describe_layout(arg(args, "objtype"), opt_arg(args, "record_type_id")),
        "create" => b.create(arg(args, "objtype"), fields(args)),
        "retrieve" => b.retrieve(arg(args, "objtype"), arg(args, "id"), opt_arg(args, "field_list")),
        "upsert" => b.upsert(
            arg(args, "objtype"),
            arg(args, "external_id_field"),
            opt_arg(args, "external_id"),
            fields(args),
        ),
        "update" => b.update(arg(args, "objtype"), arg(args, "id"), fields(args)),
        "del" => b.del(arg(args, "objtype"), arg(args, "id")),
        "query" => b.query(arg(args, "soql")),
        "query_more" => return b.query_more(arg(args, "url")),
        "search" => b.search(arg(args, "sosl")),
        "get_attachment" => b.get_attachment(arg(args, "id")),
        other => panic!("unknown operation: {other}"),
    };
    Some(req)
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let config = ClientConfig::with_api_version(vectors["api_version"].as_str().unwrap());
    let b = RequestBuilder::new(&config);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let expected = &case["expected_request"];

        let built = build(&b, operation, &case["args"]);
        if expected.is_null() {
            assert!(built.is_none(), "{name}: expected no request");
            continue;
        }

        let req = serde_json::to_value(built.unwrap_or_else(|| panic!("{name}: no request built"))).unwrap();
        for key in ["endPoint", "path", "method", "queryParams", "returnBinary"] {
            assert_eq!(req[key], expected[key], "{name}: {key}");
        }
        assert_eq!(req["headerParams"], serde_json::json!({}), "{name}: headerParams");
        assert_eq!(req["fileParams"], serde_json::json!({}), "{name}: fileParams");
        assert_eq!(req["doesNotRequireAuthentication"], false, "{name}: auth");
    }
}

#[test]
fn every_versioned_path_follows_set_api_version() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let mut b = RequestBuilder::default();
    b.set_api_version("v99.0");

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        if matches!(operation, "versions" | "query_more") {
            continue;
        }
        let req = build(&b, operation, &case["args"]).unwrap();
        assert!(req.path.starts_with("/v99.0/"), "{name}: {}", req.path);
    }
}
