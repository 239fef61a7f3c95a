use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Records returned per query page before a `nextRecordsUrl` is issued.
pub const QUERY_PAGE_SIZE: usize = 2;

/// Object types that exist before anything is created.
pub const DEFAULT_SOBJECTS: &[&str] = &["Account", "Contact", "Attachment"];

pub type Record = Map<String, Value>;

#[derive(Debug)]
pub struct Store {
    sobjects: BTreeMap<String, BTreeMap<String, Record>>,
    query_results: HashMap<String, Vec<Value>>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            sobjects: DEFAULT_SOBJECTS
                .iter()
                .map(|name| (name.to_string(), BTreeMap::new()))
                .collect(),
            query_results: HashMap::new(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/services/data/", get(versions))
        .route("/services/data/{version}/", get(resources))
        .route("/services/data/{version}/sobjects/", get(describe_global))
        .route(
            "/services/data/{version}/sobjects/{objtype}/",
            get(metadata).post(create_record),
        )
        .route("/services/data/{version}/sobjects/{objtype}/describe/", get(describe))
        .route(
            "/services/data/{version}/sobjects/{objtype}/describe/layouts/",
            get(describe_layouts),
        )
        .route(
            "/services/data/{version}/sobjects/{objtype}/describe/layouts/{record_type_id}",
            get(describe_record_type_layout),
        )
        .route(
            "/services/data/{version}/sobjects/{objtype}/{key}",
            get(retrieve_record).patch(update_record).delete(delete_record),
        )
        .route("/services/data/{version}/sobjects/{objtype}/{key}/", post(insert_by_external_id))
        .route(
            "/services/data/{version}/sobjects/{objtype}/{key}/{value}",
            get(record_blob).patch(upsert_by_external_id),
        )
        .route("/services/data/{version}/query", get(query))
        .route("/services/data/{version}/query/{locator}", get(query_more))
        .route("/services/data/{version}/search", get(search))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!([{ "errorCode": code, "message": message }])))
}

fn not_found() -> (StatusCode, Json<Value>) {
    error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        "The requested resource does not exist",
    )
}

fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()[..18].to_string()
}

fn record_url(version: &str, objtype: &str, id: &str) -> String {
    format!("/services/data/{version}/sobjects/{objtype}/{id}")
}

fn with_attributes(version: &str, objtype: &str, record: &Record) -> Value {
    let mut out = Map::new();
    let id = record.get("Id").and_then(Value::as_str).unwrap_or_default();
    out.insert(
        "attributes".to_string(),
        json!({ "type": objtype, "url": record_url(version, objtype, id) }),
    );
    out.extend(record.clone());
    Value::Object(out)
}

async fn versions() -> Json<Value> {
    Json(json!([
        { "label": "Summer '19", "url": "/services/data/v46.0", "version": "46.0" },
        { "label": "Winter '20", "url": "/services/data/v47.0", "version": "47.0" },
    ]))
}

async fn resources(Path(version): Path<String>) -> Json<Value> {
    let base = format!("/services/data/{version}");
    Json(json!({
        "sobjects": format!("{base}/sobjects"),
        "query": format!("{base}/query"),
        "search": format!("{base}/search"),
    }))
}

async fn describe_global(State(db): State<Db>, Path(version): Path<String>) -> Json<Value> {
    let store = db.read().await;
    let sobjects: Vec<Value> = store
        .sobjects
        .keys()
        .map(|name| {
            json!({
                "name": name,
                "urls": { "sobject": format!("/services/data/{version}/sobjects/{name}") },
            })
        })
        .collect();
    Json(json!({ "encoding": "UTF-8", "maxBatchSize": 200, "sobjects": sobjects }))
}

async fn metadata(
    State(db): State<Db>,
    Path((version, objtype)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let records = store.sobjects.get(&objtype).ok_or_else(not_found)?;
    let recent: Vec<Value> = records
        .values()
        .map(|r| with_attributes(&version, &objtype, r))
        .collect();
    Ok(Json(json!({
        "objectDescribe": { "name": objtype, "createable": true, "queryable": true },
        "recentItems": recent,
    })))
}

async fn describe(
    State(db): State<Db>,
    Path((_version, objtype)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let records = store.sobjects.get(&objtype).ok_or_else(not_found)?;
    let mut names: Vec<&str> = vec!["Id"];
    for record in records.values() {
        for key in record.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key.as_str());
            }
        }
    }
    let fields: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
    Ok(Json(json!({ "name": objtype, "layoutable": true, "fields": fields })))
}

fn layouts_for(objtype: &str, record_type_id: &str) -> Value {
    json!({
        "layouts": [{ "id": format!("00h{objtype}"), "recordTypeId": record_type_id }],
    })
}

async fn describe_layouts(
    State(db): State<Db>,
    Path((_version, objtype)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    if !db.read().await.sobjects.contains_key(&objtype) {
        return Err(not_found());
    }
    Ok(Json(layouts_for(&objtype, "012000000000000AAA")))
}

async fn describe_record_type_layout(
    State(db): State<Db>,
    Path((_version, objtype, record_type_id)): Path<(String, String, String)>,
) -> ApiResult<Json<Value>> {
    if !db.read().await.sobjects.contains_key(&objtype) {
        return Err(not_found());
    }
    Ok(Json(layouts_for(&objtype, &record_type_id)))
}

async fn insert(db: &Db, objtype: &str, mut fields: Record) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let records = store.sobjects.get_mut(objtype).ok_or_else(not_found)?;
    let id = new_record_id();
    fields.insert("Id".to_string(), Value::String(id.clone()));
    records.insert(id.clone(), fields);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "success": true, "errors": [], "created": true })),
    ))
}

async fn create_record(
    State(db): State<Db>,
    Path((_version, objtype)): Path<(String, String)>,
    Json(fields): Json<Record>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    insert(&db, &objtype, fields).await
}

async fn retrieve_record(
    State(db): State<Db>,
    Path((version, objtype, id)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let record = store
        .sobjects
        .get(&objtype)
        .and_then(|records| records.get(&id))
        .ok_or_else(not_found)?;
    let record: Record = match params.get("fields") {
        Some(list) => {
            let wanted: Vec<&str> = list.split(',').map(str::trim).collect();
            record
                .iter()
                .filter(|(k, _)| k.as_str() == "Id" || wanted.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
        None => record.clone(),
    };
    Ok(Json(with_attributes(&version, &objtype, &record)))
}

async fn update_record(
    State(db): State<Db>,
    Path((_version, objtype, id)): Path<(String, String, String)>,
    Json(fields): Json<Record>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let record = store
        .sobjects
        .get_mut(&objtype)
        .and_then(|records| records.get_mut(&id))
        .ok_or_else(not_found)?;
    for (key, value) in fields {
        if key != "Id" {
            record.insert(key, value);
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_record(
    State(db): State<Db>,
    Path((_version, objtype, id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store
        .sobjects
        .get_mut(&objtype)
        .and_then(|records| records.remove(&id))
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

async fn insert_by_external_id(
    State(db): State<Db>,
    Path((_version, objtype, _field)): Path<(String, String, String)>,
    Json(fields): Json<Record>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    insert(&db, &objtype, fields).await
}

async fn upsert_by_external_id(
    State(db): State<Db>,
    Path((_version, objtype, field, value)): Path<(String, String, String, String)>,
    Json(mut fields): Json<Record>,
) -> ApiResult<Response> {
    {
        let mut store = db.write().await;
        let records = store.sobjects.get_mut(&objtype).ok_or_else(not_found)?;
        let existing = records
            .values_mut()
            .find(|r| r.get(&field).and_then(Value::as_str) == Some(value.as_str()));
        if let Some(record) = existing {
            for (key, v) in fields {
                if key != "Id" {
                    record.insert(key, v);
                }
            }
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    }
    fields.insert(field, Value::String(value));
    Ok(insert(&db, &objtype, fields).await?.into_response())
}

/// Only `Attachment/{id}/Body` is served; other blob fields do not exist.
async fn record_blob(
    State(db): State<Db>,
    Path((_version, objtype, id, field)): Path<(String, String, String, String)>,
) -> ApiResult<Response> {
    if objtype != "Attachment" || field != "Body" {
        return Err(not_found());
    }
    let store = db.read().await;
    let record = store
        .sobjects
        .get(&objtype)
        .and_then(|records| records.get(&id))
        .ok_or_else(not_found)?;
    let body = record
        .get("Body")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .as_bytes()
        .to_vec();
    let content_type = record
        .get("ContentType")
        .and_then(Value::as_str)
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Parse `SELECT a, b FROM Object ...` into the field list and object name.
pub fn parse_soql(soql: &str) -> Option<(Vec<String>, String)> {
    let words: Vec<&str> = soql.split_whitespace().collect();
    if !words.first()?.eq_ignore_ascii_case("select") {
        return None;
    }
    let from = words.iter().position(|w| w.eq_ignore_ascii_case("from"))?;
    let fields: Vec<String> = words[1..from]
        .join(" ")
        .split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    let objtype = words.get(from + 1)?.to_string();
    if fields.is_empty() {
        return None;
    }
    Some((fields, objtype))
}

fn page(version: &str, query_id: &str, results: &[Value], offset: usize) -> Value {
    let end = offset.saturating_add(QUERY_PAGE_SIZE).min(results.len());
    let done = end >= results.len();
    let mut body = json!({
        "totalSize": results.len(),
        "done": done,
        "records": results[offset.min(results.len())..end].to_vec(),
    });
    if !done {
        body["nextRecordsUrl"] = json!(format!("/services/data/{version}/query/{query_id}-{end}"));
    }
    body
}

async fn query(
    State(db): State<Db>,
    Path(version): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let soql = params.get("q").ok_or_else(|| {
        error(StatusCode::BAD_REQUEST, "MALFORMED_QUERY", "missing q parameter")
    })?;
    let (fields, objtype) = parse_soql(soql)
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "MALFORMED_QUERY", "unable to parse query"))?;
    let mut store = db.write().await;
    let records = store.sobjects.get(&objtype).ok_or_else(|| {
        error(
            StatusCode::BAD_REQUEST,
            "INVALID_TYPE",
            &format!("sObject type '{objtype}' is not supported"),
        )
    })?;
    let results: Vec<Value> = records
        .values()
        .map(|record| {
            let mut projected: Record = record
                .iter()
                .filter(|(k, _)| fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if let Some(id) = record.get("Id") {
                projected.entry("Id".to_string()).or_insert_with(|| id.clone());
            }
            with_attributes(&version, &objtype, &projected)
        })
        .collect();
    let query_id = Uuid::new_v4().simple().to_string();
    let body = page(&version, &query_id, &results, 0);
    if body["done"] == false {
        store.query_results.insert(query_id, results);
    }
    Ok(Json(body))
}

async fn query_more(
    State(db): State<Db>,
    Path((version, locator)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let (query_id, offset) = locator
        .rsplit_once('-')
        .and_then(|(id, offset)| offset.parse::<usize>().ok().map(|o| (id, o)))
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "INVALID_QUERY_LOCATOR", "invalid query locator"))?;
    let mut store = db.write().await;
    let results = store
        .query_results
        .get(query_id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "INVALID_QUERY_LOCATOR", "invalid query locator"))?;
    let body = page(&version, query_id, results, offset);
    // The cursor is released once its last page has been served.
    if body["done"] == true {
        store.query_results.remove(query_id);
    }
    Ok(Json(body))
}

/// Extract the term from `FIND {term} ...`.
pub fn parse_sosl(sosl: &str) -> Option<String> {
    let rest = sosl.trim_start();
    if !rest.get(..4)?.eq_ignore_ascii_case("find") {
        return None;
    }
    let start = rest.find('{')? + 1;
    let end = start + rest[start..].find('}')?;
    let term = rest[start..end].trim();
    if term.is_empty() {
        return None;
    }
    Some(term.to_string())
}

async fn search(
    State(db): State<Db>,
    Path(version): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let term = params
        .get("q")
        .and_then(|q| parse_sosl(q))
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "MALFORMED_SEARCH", "unable to parse search"))?
        .to_lowercase();
    let store = db.read().await;
    let mut hits = Vec::new();
    for (objtype, records) in &store.sobjects {
        for record in records.values() {
            let matched = record
                .iter()
                .filter(|(k, _)| k.as_str() != "Id")
                .any(|(_, v)| v.as_str().is_some_and(|s| s.to_lowercase().contains(&term)));
            if matched {
                let id = record.get("Id").cloned().unwrap_or(Value::Null);
                let mut hit = Record::new();
                hit.insert("Id".to_string(), id);
                hits.push(with_attributes(&version, objtype, &hit));
            }
        }
    }
    Ok(Json(json!({ "searchRecords": hits })))
}
