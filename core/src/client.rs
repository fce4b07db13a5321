//! Stateless HTTP request builder and response parser for the Logo Objects
//! REST service.
//!
//! # Design
//! `LogoClient` holds only a base URL and a set of default headers. Every
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`; the caller runs
//! the round-trip in between. All builders funnel through `request`, the one
//! place where URL, headers and body are put together.
//!
//! The methods here take the entity path as a string. `EntityClient` in
//! `entity.rs` wraps them with typed records for the entities in
//! `entities`.

use std::fmt::Display;

use percent_encoding::utf8_percent_encode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::entity::{Entity, EntityClient};
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::model::{DbColumn, Page, Parameter, TrackStatus};
use crate::query::{validate_field, ListQuery, QueryString, SearchQuery, COMPONENT};

const NO_BODY: Option<&()> = None;

/// Synchronous, stateless client for the Logo Objects API.
#[derive(Debug, Clone)]
pub struct LogoClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl LogoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            default_headers: Vec::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        config
            .headers
            .iter()
            .fold(Self::new(&config.base_url), |client, (name, value)| {
                client.with_header(name, value)
            })
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `/{entity}/{seg}/...` relative to the base URL, each segment
    /// percent-encoded. Empty segments are rejected.
    pub fn path<I, S>(&self, entity: &str, segments: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        entity_path(entity, segments.into_iter().map(|s| s.to_string()))
    }

    /// Typed view over one entity.
    pub fn entity<E: Entity>(&self) -> EntityClient<'_, E> {
        EntityClient::new(self)
    }

    /// Build a request for `path` (relative to the base URL, query string
    /// included). A body is serialized as JSON.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers.extend(self.default_headers.iter().cloned());

        let separator = if path.starts_with('/') { "" } else { "/" };
        let url = format!("{}{separator}{path}", self.base_url);
        tracing::debug!(%method, url = %url, has_body = body.is_some(), "built request");

        Ok(HttpRequest {
            method,
            path: url,
            headers,
            body,
        })
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub fn build_list(&self, entity: &str, query: &ListQuery) -> Result<HttpRequest> {
        let path = format!("{}{}", entity_path(entity, [])?, query.to_query_string());
        self.request(HttpMethod::Get, &path, NO_BODY)
    }

    /// `query` carries the per-record options (`fields`, `expandLevel`).
    pub fn build_get(&self, entity: &str, id: impl Display, query: &ListQuery) -> Result<HttpRequest> {
        let path = format!(
            "{}{}",
            entity_path(entity, [id.to_string()])?,
            query.to_query_string()
        );
        self.request(HttpMethod::Get, &path, NO_BODY)
    }

    pub fn build_create<B: Serialize + ?Sized>(&self, entity: &str, body: &B) -> Result<HttpRequest> {
        self.request(HttpMethod::Post, &entity_path(entity, [])?, Some(body))
    }

    pub fn build_update<B: Serialize + ?Sized>(
        &self,
        entity: &str,
        id: impl Display,
        body: &B,
    ) -> Result<HttpRequest> {
        let path = entity_path(entity, [id.to_string()])?;
        self.request(HttpMethod::Put, &path, Some(body))
    }

    pub fn build_patch<B: Serialize + ?Sized>(
        &self,
        entity: &str,
        id: impl Display,
        body: &B,
    ) -> Result<HttpRequest> {
        let path = entity_path(entity, [id.to_string()])?;
        self.request(HttpMethod::Patch, &path, Some(body))
    }

    pub fn build_delete(&self, entity: &str, id: impl Display) -> Result<HttpRequest> {
        let path = entity_path(entity, [id.to_string()])?;
        self.request(HttpMethod::Delete, &path, NO_BODY)
    }

    /// List filtered by `search`. A non-empty search replaces `query.q`.
    pub fn build_search(
        &self,
        entity: &str,
        search: &SearchQuery,
        query: &ListQuery,
    ) -> Result<HttpRequest> {
        let mut query = query.clone();
        if let Some(expression) = search.to_expression()? {
            query.q = Some(expression);
        }
        self.build_list(entity, &query)
    }

    /// Same as a list, with the options sent as a JSON body instead of the
    /// query string. Used when the filter is too long for a URL.
    pub fn build_read_with_body(&self, entity: &str, query: &ListQuery) -> Result<HttpRequest> {
        let path = entity_path(entity, ["readwithbodyparamters".to_string()])?;
        self.request(HttpMethod::Post, &path, Some(query))
    }

    // -----------------------------------------------------------------------
    // Actions and ancillary endpoints
    // -----------------------------------------------------------------------

    /// `METHOD /{entity}[/{id}]/{name}[/{param}...][?query]`
    pub fn build_action(&self, entity: &str, call: &ActionCall) -> Result<HttpRequest> {
        if call.method == HttpMethod::Get && call.body.is_some() {
            return Err(ApiError::InvalidArgument(format!(
                "GET action {} cannot carry a body",
                call.name
            )));
        }
        let segments = call
            .id
            .iter()
            .cloned()
            .chain(std::iter::once(call.name.clone()))
            .chain(call.params.iter().cloned());
        let path = format!("{}{}", entity_path(entity, segments)?, call.query);
        self.request(call.method, &path, call.body.as_ref())
    }

    pub fn build_db_columns(&self, entity: &str) -> Result<HttpRequest> {
        let path = entity_path(entity, ["dbcolumns".to_string()])?;
        self.request(HttpMethod::Get, &path, NO_BODY)
    }

    pub fn build_track(&self, entity: &str) -> Result<HttpRequest> {
        let path = entity_path(entity, ["track".to_string()])?;
        self.request(HttpMethod::Post, &path, NO_BODY)
    }

    pub fn build_untrack(&self, entity: &str) -> Result<HttpRequest> {
        let path = entity_path(entity, ["untrack".to_string()])?;
        self.request(HttpMethod::Post, &path, NO_BODY)
    }

    pub fn build_check_track(&self, entity: &str) -> Result<HttpRequest> {
        let path = entity_path(entity, ["checktrack".to_string()])?;
        self.request(HttpMethod::Get, &path, NO_BODY)
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    pub fn parse_record<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_page<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<Page<T>> {
        check_status(&response)?;
        decode(&response.body)
    }

    /// An empty body (e.g. 204) is an empty parameter list.
    pub fn parse_parameters(&self, response: HttpResponse) -> Result<Vec<Parameter>> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        decode(&response.body)
    }

    pub fn parse_empty(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    pub fn parse_db_columns(&self, response: HttpResponse) -> Result<Vec<DbColumn>> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_track_status(&self, response: HttpResponse) -> Result<TrackStatus> {
        check_status(&response)?;
        decode(&response.body)
    }
}

/// One call to a verb-named endpoint such as `ApplyCampaign`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub method: HttpMethod,
    pub id: Option<String>,
    pub name: String,
    pub params: Vec<String>,
    pub query: QueryString,
    pub body: Option<serde_json::Value>,
}

impl ActionCall {
    pub fn new(method: HttpMethod, name: impl Into<String>) -> Self {
        Self {
            method,
            id: None,
            name: name.into(),
            params: Vec::new(),
            query: QueryString::new(),
            body: None,
        }
    }

    pub fn get(name: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, name)
    }

    pub fn post(name: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, name)
    }

    /// Target a single record.
    pub fn on(mut self, id: impl Display) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Append a trailing path parameter.
    pub fn param(mut self, param: impl Display) -> Self {
        self.params.push(param.to_string());
        self
    }

    pub fn query(mut self, name: &str, value: impl Display) -> Self {
        self.query.push(name, value);
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// `/{entity}/{seg}/...` with every segment percent-encoded.
fn entity_path(entity: &str, segments: impl IntoIterator<Item = String>) -> Result<String> {
    let entity = entity.trim_matches('/');
    if entity.is_empty() {
        return Err(ApiError::InvalidArgument("empty entity path".to_string()));
    }
    if entity
        .split('/')
        .any(|part| validate_field(part).is_err() || part.chars().all(|c| c == '.'))
    {
        return Err(ApiError::InvalidArgument(format!("entity path {entity:?}")));
    }
    let mut path = format!("/{entity}");
    for segment in segments {
        if segment.trim().is_empty() {
            return Err(ApiError::InvalidArgument(format!(
                "empty path segment under /{entity}"
            )));
        }
        path.push('/');
        path.extend(utf8_percent_encode(&segment, COMPONENT));
    }
    Ok(path)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    tracing::warn!(status = response.status, "request failed");
    match response.status {
        404 => Err(ApiError::NotFound),
        401 | 403 => Err(ApiError::Unauthorized {
            status: response.status,
        }),
        status => Err(ApiError::HttpError {
            status,
            message: error_message(&response.body),
            body: response.body.clone(),
        }),
    }
}

/// Pull the server's message out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["Message", "message", "error"]
        .iter()
        .find_map(|key| value.get(key)?.as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LogoClient {
        LogoClient::new("http://localhost:3000/api/v1")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_list_produces_correct_request() {
        let req = client().build_list("items", &ListQuery::new()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/v1/items");
        assert!(req.body.is_none());
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn build_list_appends_query_string() {
        let query = ListQuery::new().limit(10).offset(5);
        let req = client().build_list("items", &query).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/v1/items?limit=10&offset=5");
    }

    #[test]
    fn build_get_encodes_id_segment() {
        let req = client().build_get("items", "A/B C", &ListQuery::new()).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/v1/items/A%2FB%20C");
    }

    #[test]
    fn path_joins_and_validates_segments() {
        let c = client();
        assert_eq!(c.path("items", [7]).unwrap(), "/items/7");
        assert_eq!(
            c.path("/salesOrders/", ["1", "ApplyCampaign"]).unwrap(),
            "/salesOrders/1/ApplyCampaign"
        );
        assert!(matches!(c.path("items", [""]), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn malformed_entity_paths_are_rejected() {
        let c = client();
        for entity in ["a b", "items?x=1", "items/../x", "items#frag", "items//1"] {
            assert!(
                matches!(c.build_list(entity, &ListQuery::new()), Err(ApiError::InvalidArgument(_))),
                "{entity} accepted"
            );
        }
        assert_eq!(c.path("custom/nested_path", [1]).unwrap(), "/custom/nested_path/1");
    }

    #[test]
    fn build_get_with_expand_level() {
        let req = client()
            .build_get("salesOrders", 42, &ListQuery::new().expand_level(1))
            .unwrap();
        assert_eq!(
            req.path,
            "http://localhost:3000/api/v1/salesOrders/42?expandLevel=1"
        );
    }

    #[test]
    fn build_create_produces_json_post() {
        let body = serde_json::json!({"CODE": "A1", "TITLE": "First"});
        let req = client().build_create("items", &body).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/v1/items");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let sent: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn build_update_and_patch_target_the_record() {
        let body = serde_json::json!({"TITLE": "Renamed"});
        let put = client().build_update("items", 7, &body).unwrap();
        let patch = client().build_patch("items", 7, &body).unwrap();
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(patch.method, HttpMethod::Patch);
        assert_eq!(put.path, patch.path);
        assert_eq!(put.path, "http://localhost:3000/api/v1/items/7");
    }

    #[test]
    fn build_delete_has_no_body() {
        let req = client().build_delete("items", 7).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = client().build_delete("items", "").unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        let err = client().build_list("", &ListQuery::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn build_search_replaces_filter() {
        let search = SearchQuery::new().and(crate::query::Criterion::starts_with("CODE", "A"));
        let query = ListQuery::new().filter("STATUS eq 1").limit(2);
        let req = client().build_search("items", &search, &query).unwrap();
        assert_eq!(
            req.path,
            "http://localhost:3000/api/v1/items?q=CODE%20like%20%27A%2A%27&limit=2"
        );
    }

    #[test]
    fn build_search_without_criteria_keeps_existing_filter() {
        let query = ListQuery::new().filter("STATUS eq 1");
        let req = client().build_search("items", &SearchQuery::new(), &query).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/v1/items?q=STATUS%20eq%201");
    }

    #[test]
    fn build_read_with_body_posts_query() {
        let query = ListQuery::new().filter("CODE eq 'X'").limit(1);
        let req = client().build_read_with_body("items", &query).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.path,
            "http://localhost:3000/api/v1/items/readwithbodyparamters"
        );
        let sent: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({"q": "CODE eq 'X'", "limit": 1}));
    }

    #[test]
    fn build_action_assembles_id_name_and_params() {
        let call = ActionCall::post("ApplyCampaign").on(12).param("SUMMER");
        let req = client().build_action("salesOrders", &call).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.path,
            "http://localhost:3000/api/v1/salesOrders/12/ApplyCampaign/SUMMER"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_action_without_id_with_query() {
        let call = ActionCall::get("GetDefaults").query("type", 1);
        let req = client().build_action("items", &call).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/v1/items/GetDefaults?type=1");
    }

    #[test]
    fn get_action_with_body_is_rejected() {
        let call = ActionCall::get("ExportToXML").json(serde_json::json!({}));
        assert!(matches!(
            client().build_action("items", &call),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn ancillary_endpoints() {
        let c = client();
        let columns = c.build_db_columns("items").unwrap();
        assert_eq!(columns.method, HttpMethod::Get);
        assert_eq!(columns.path, "http://localhost:3000/api/v1/items/dbcolumns");
        assert_eq!(c.build_track("items").unwrap().method, HttpMethod::Post);
        assert_eq!(
            c.build_untrack("items").unwrap().path,
            "http://localhost:3000/api/v1/items/untrack"
        );
        assert_eq!(
            c.build_check_track("items").unwrap().path,
            "http://localhost:3000/api/v1/items/checktrack"
        );
    }

    #[test]
    fn default_headers_are_attached() {
        let c = client().with_header("Accept-Language", "tr-TR");
        let req = c.build_list("items", &ListQuery::new()).unwrap();
        assert_eq!(req.header("accept-language"), Some("tr-TR"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = LogoClient::new("http://localhost:3000/api/v1/");
        let req = c.build_list("/items/", &ListQuery::new()).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/v1/items");
    }

    #[test]
    fn parse_page_success() {
        let page: Page<serde_json::Value> = client()
            .parse_page(response(200, r#"{"items":[{"CODE":"A"}],"count":1}"#))
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.count, Some(1));
    }

    #[test]
    fn parse_record_not_found() {
        let err = client()
            .parse_record::<serde_json::Value>(response(404, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_record_unauthorized() {
        let err = client()
            .parse_record::<serde_json::Value>(response(401, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 401 }));

        let err = client()
            .parse_record::<serde_json::Value>(response(403, r#"{"Message":"forbidden"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 403 }));
    }

    #[test]
    fn parse_error_lifts_server_message() {
        let err = client()
            .parse_record::<serde_json::Value>(response(400, r#"{"Message":"CODE is required"}"#))
            .unwrap_err();
        match err {
            ApiError::HttpError { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("CODE is required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_error_with_plain_body() {
        let err = client()
            .parse_empty(response(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, message: None, .. }));
        assert_eq!(err.to_string(), "HTTP 500: internal error");
    }

    #[test]
    fn parse_record_empty_body_is_deserialization_error() {
        let err = client()
            .parse_record::<serde_json::Value>(response(204, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_parameters_empty_body() {
        let params = client().parse_parameters(response(204, "")).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn parse_parameters_list() {
        let params = client()
            .parse_parameters(response(200, r#"[{"Key":"XML","Value":"<a/>"}]"#))
            .unwrap();
        assert_eq!(params, vec![Parameter::new("XML", "<a/>")]);
    }

    #[test]
    fn parse_track_status_and_empty() {
        let status = client()
            .parse_track_status(response(200, r#"{"Tracked":true}"#))
            .unwrap();
        assert!(status.tracked);
        assert!(client().parse_empty(response(204, "")).is_ok());
    }
}
