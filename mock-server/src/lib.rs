//! In-memory stand-in for the Logo Objects REST service.
//!
//! Every entity path is accepted; tables are created on first use. Records
//! are plain JSON objects keyed by `INTERNAL_REFERENCE`, assigned from 1.

pub mod filter;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

use crate::filter::Filter;

pub const REFERENCE_FIELD: &str = "INTERNAL_REFERENCE";

#[derive(Debug, Default)]
pub struct Table {
    next_ref: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
    tracked: bool,
}

pub type Db = Arc<RwLock<HashMap<String, Table>>>;

/// List options, from the query string or a `readwithbodyparamters` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub q: Option<String>,
    pub fields: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub with_count: Option<bool>,
}

/// Error response carrying a `Message` body, the shape the real service uses.
pub struct Failure(StatusCode, String);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "Message": self.1 }))).into_response()
    }
}

fn not_found(entity: &str, id: i64) -> Failure {
    Failure(StatusCode::NOT_FOUND, format!("{entity}/{id} not found"))
}

fn parse_id(raw: &str) -> Result<i64, Failure> {
    raw.parse()
        .map_err(|_| Failure(StatusCode::BAD_REQUEST, format!("invalid id {raw:?}")))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/{entity}", get(list_records).post(create_record))
        .route("/{entity}/readwithbodyparamters", post(read_with_body))
        .route("/{entity}/dbcolumns", get(db_columns))
        .route("/{entity}/track", post(track))
        .route("/{entity}/untrack", post(untrack))
        .route("/{entity}/checktrack", get(check_track))
        .route(
            "/{entity}/{segment}",
            get(get_or_action)
                .put(update_record)
                .patch(patch_record)
                .delete(delete_record)
                .post(post_action),
        )
        .route("/{entity}/{segment}/{action}", get(action).post(action))
        .route(
            "/{entity}/{segment}/{action}/{*params}",
            get(action_with_params).post(action_with_params),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

async fn list_records(
    State(db): State<Db>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, Failure> {
    select(&db, &entity, &params).await.map(Json)
}

async fn read_with_body(
    State(db): State<Db>,
    Path(entity): Path<String>,
    Json(params): Json<ListParams>,
) -> Result<Json<Value>, Failure> {
    select(&db, &entity, &params).await.map(Json)
}

async fn select(db: &Db, entity: &str, params: &ListParams) -> Result<Value, Failure> {
    let filter = Filter::parse(params.q.as_deref().unwrap_or(""))
        .map_err(|e| Failure(StatusCode::BAD_REQUEST, e.to_string()))?;
    let fields: Option<BTreeSet<&str>> = params
        .fields
        .as_deref()
        .map(|f| f.split(',').map(str::trim).collect());

    let tables = db.read().await;
    let matching: Vec<&Map<String, Value>> = tables
        .get(entity)
        .map(|t| t.rows.values().filter(|r| filter.matches(r)).collect())
        .unwrap_or_default();
    let count = matching.len();

    let items: Vec<Value> = matching
        .into_iter()
        .skip(params.offset.unwrap_or(0))
        .take(params.limit.unwrap_or(usize::MAX))
        .map(|row| match &fields {
            Some(keep) => Value::Object(
                row.iter()
                    .filter(|(k, _)| k.as_str() == REFERENCE_FIELD || keep.contains(k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            None => Value::Object(row.clone()),
        })
        .collect();
    tracing::debug!(entity, returned = items.len(), matched = count, "list");

    let mut page = json!({ "items": items });
    if params.with_count.unwrap_or(false) {
        page["count"] = json!(count);
    }
    Ok(page)
}

// ---------------------------------------------------------------------------
// Single records
// ---------------------------------------------------------------------------

async fn create_record(
    State(db): State<Db>,
    Path(entity): Path<String>,
    Json(mut record): Json<Map<String, Value>>,
) -> (StatusCode, Json<Map<String, Value>>) {
    let mut tables = db.write().await;
    let table = tables.entry(entity.clone()).or_default();
    table.next_ref += 1;
    let id = table.next_ref;
    record.insert(REFERENCE_FIELD.to_string(), json!(id));
    table.rows.insert(id, record.clone());
    tracing::info!(entity = %entity, id, "created");
    (StatusCode::CREATED, Json(record))
}

async fn get_or_action(
    State(db): State<Db>,
    Path((entity, segment)): Path<(String, String)>,
) -> Result<Response, Failure> {
    let Ok(id) = segment.parse::<i64>() else {
        return run_action(&db, &entity, None, &segment, Vec::new(), None).await;
    };
    let tables = db.read().await;
    tables
        .get(&entity)
        .and_then(|t| t.rows.get(&id))
        .cloned()
        .map(|r| Json(r).into_response())
        .ok_or_else(|| not_found(&entity, id))
}

async fn update_record(
    State(db): State<Db>,
    Path((entity, segment)): Path<(String, String)>,
    Json(mut record): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, Failure> {
    let id = parse_id(&segment)?;
    let mut tables = db.write().await;
    let row = tables
        .get_mut(&entity)
        .and_then(|t| t.rows.get_mut(&id))
        .ok_or_else(|| not_found(&entity, id))?;
    record.insert(REFERENCE_FIELD.to_string(), json!(id));
    *row = record;
    Ok(Json(row.clone()))
}

async fn patch_record(
    State(db): State<Db>,
    Path((entity, segment)): Path<(String, String)>,
    Json(changes): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, Failure> {
    let id = parse_id(&segment)?;
    let mut tables = db.write().await;
    let row = tables
        .get_mut(&entity)
        .and_then(|t| t.rows.get_mut(&id))
        .ok_or_else(|| not_found(&entity, id))?;
    for (key, value) in changes {
        if key != REFERENCE_FIELD {
            row.insert(key, value);
        }
    }
    Ok(Json(row.clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path((entity, segment)): Path<(String, String)>,
) -> Result<StatusCode, Failure> {
    let id = parse_id(&segment)?;
    let mut tables = db.write().await;
    tables
        .get_mut(&entity)
        .and_then(|t| t.rows.remove(&id))
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found(&entity, id))
}

// ---------------------------------------------------------------------------
// Ancillary endpoints
// ---------------------------------------------------------------------------

async fn db_columns(State(db): State<Db>, Path(entity): Path<String>) -> Json<Vec<Value>> {
    let tables = db.read().await;
    let mut columns: BTreeMap<&str, &'static str> = BTreeMap::new();
    for row in tables.get(&entity).into_iter().flat_map(|t| t.rows.values()) {
        for (name, value) in row {
            columns.entry(name.as_str()).or_insert_with(|| type_name(value));
        }
    }
    let columns: Vec<Value> = columns
        .into_iter()
        .map(|(name, ty)| json!({ "Name": name, "Type": ty, "Nullable": name != REFERENCE_FIELD }))
        .collect();
    Json(columns)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

async fn track(State(db): State<Db>, Path(entity): Path<String>) -> StatusCode {
    db.write().await.entry(entity).or_default().tracked = true;
    StatusCode::NO_CONTENT
}

async fn untrack(State(db): State<Db>, Path(entity): Path<String>) -> StatusCode {
    db.write().await.entry(entity).or_default().tracked = false;
    StatusCode::NO_CONTENT
}

async fn check_track(State(db): State<Db>, Path(entity): Path<String>) -> Json<Value> {
    let tracked = db.read().await.get(&entity).is_some_and(|t| t.tracked);
    Json(json!({ "Tracked": tracked }))
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

async fn post_action(
    State(db): State<Db>,
    Path((entity, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, Failure> {
    let body = parse_body(&body)?;
    run_action(&db, &entity, None, &name, Vec::new(), body).await
}

async fn action(
    State(db): State<Db>,
    Path((entity, segment, name)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<Response, Failure> {
    let body = parse_body(&body)?;
    dispatch(&db, &entity, segment, name, Vec::new(), body).await
}

async fn action_with_params(
    State(db): State<Db>,
    Path((entity, segment, name, params)): Path<(String, String, String, String)>,
    body: Bytes,
) -> Result<Response, Failure> {
    let body = parse_body(&body)?;
    let params = params.split('/').map(str::to_string).collect();
    dispatch(&db, &entity, segment, name, params, body).await
}

/// Actions that only exist on a single record.
const RECORD_ACTIONS: [&str; 2] = ["ExportToXML", "ApplyCampaign"];

/// `/{entity}/{id}/{name}/...` when the first segment is numeric, otherwise
/// `/{entity}/{name}/{param}/...`. A record action under a non-numeric id
/// names a record that cannot exist.
async fn dispatch(
    db: &Db,
    entity: &str,
    segment: String,
    second: String,
    mut params: Vec<String>,
    body: Option<Value>,
) -> Result<Response, Failure> {
    match segment.parse::<i64>() {
        Ok(id) => run_action(db, entity, Some(id), &second, params, body).await,
        Err(_) if RECORD_ACTIONS.contains(&second.as_str()) => Err(Failure(
            StatusCode::NOT_FOUND,
            format!("{entity}/{segment} not found"),
        )),
        Err(_) => {
            params.insert(0, second);
            run_action(db, entity, None, &segment, params, body).await
        }
    }
}

fn parse_body(raw: &Bytes) -> Result<Option<Value>, Failure> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| Failure(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")))
}

async fn run_action(
    db: &Db,
    entity: &str,
    id: Option<i64>,
    name: &str,
    params: Vec<String>,
    body: Option<Value>,
) -> Result<Response, Failure> {
    tracing::info!(entity, ?id, name, ?params, "action");
    match (name, id) {
        ("ExportToXML", Some(id)) => {
            let tables = db.read().await;
            let row = tables
                .get(entity)
                .and_then(|t| t.rows.get(&id))
                .ok_or_else(|| not_found(entity, id))?;
            Ok(Json(json!([{ "Key": "XML", "Value": to_xml(entity, row) }])).into_response())
        }
        ("ApplyCampaign", Some(id)) => {
            let mut tables = db.write().await;
            let row = tables
                .get_mut(entity)
                .and_then(|t| t.rows.get_mut(&id))
                .ok_or_else(|| not_found(entity, id))?;
            let code = params.first().cloned().unwrap_or_else(|| "AUTO".to_string());
            row.insert("CAMPAIGN_CODE".to_string(), json!(code));
            Ok(Json(row.clone()).into_response())
        }
        _ => {
            let mut echo = vec![
                json!({ "Key": "Action", "Value": name }),
                json!({ "Key": "Id", "Value": id }),
                json!({ "Key": "Params", "Value": params }),
            ];
            if let Some(body) = body {
                echo.push(json!({ "Key": "Body", "Value": body }));
            }
            Ok(Json(echo).into_response())
        }
    }
}

fn to_xml(entity: &str, row: &Map<String, Value>) -> String {
    let mut xml = format!("<{entity}>");
    for (name, value) in row {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        xml.push_str(&format!("<{name}>{}</{name}>", escape_xml(&text)));
    }
    xml.push_str(&format!("</{entity}>"));
    xml
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
