//! C-ABI wrapper around `logo-core`.
//!
//! # Overview
//! Exposes the Logo Objects client through `extern "C"` functions so any
//! language with a C FFI can build requests and parse responses without
//! linking to Rust's serde or HTTP stacks directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Entities are addressed by their path segment (`"items"`,
//!   `"salesOrders"`), so one set of functions covers the whole catalogue.
//! - Structured inputs (records, list options, action bodies) and parsed
//!   outputs are JSON C strings.
//! - The C caller owns all returned pointers and must call the matching
//!   `logo_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use logo_core::{ActionCall, HttpResponse, ListQuery, Page, Parameter, Result};

use types::*;

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Borrow a C string as `&str`; null or invalid UTF-8 gives `None`.
fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Decode optional JSON list options; null means defaults.
fn read_query(ptr: *const c_char) -> Option<ListQuery> {
    if ptr.is_null() {
        return Some(ListQuery::new());
    }
    serde_json::from_str(read_str(ptr)?).ok()
}

fn read_json(ptr: *const c_char) -> Option<serde_json::Value> {
    serde_json::from_str(read_str(ptr)?).ok()
}

/// Convert a core build result into an owned request pointer, null on error.
fn into_request(req: Result<logo_core::HttpRequest>) -> *mut FfiHttpRequest {
    match req {
        Ok(req) => FfiHttpRequest::from_core(req),
        Err(_) => std::ptr::null_mut(),
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `LogoClient` bound to `base_url` (e.g.
/// `http://erp:32001/api/v1`).
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `logo_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn logo_client_new(base_url: *const c_char) -> *mut FfiLogoClient {
    catch_unwind(|| match read_str(base_url) {
        Some(url) => {
            let client = logo_core::LogoClient::new(url);
            Box::into_raw(Box::new(FfiLogoClient { inner: client }))
        }
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Add a header sent with every request built by `client` (for example an
/// `authorization` token obtained by the caller). Returns false on null or
/// non-UTF-8 input.
#[unsafe(no_mangle)]
pub extern "C" fn logo_client_set_header(
    client: *mut FfiLogoClient,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    catch_unwind(|| {
        if client.is_null() {
            return false;
        }
        let (Some(name), Some(value)) = (read_str(name), read_str(value)) else {
            return false;
        };
        let client = unsafe { &mut *client };
        client.inner = client.inner.clone().with_header(name, value);
        true
    })
    .unwrap_or(false)
}

/// Free a `LogoClient` created by `logo_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn logo_client_free(client: *mut FfiLogoClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build `GET /{entity}` with optional JSON list options
/// (`{"q": "...", "limit": 10, "withCount": true}`); `query_json` may be null.
///
/// Returns null on null/invalid arguments.
/// The caller must free the returned pointer with `logo_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_list(
    client: *const FfiLogoClient,
    entity: *const c_char,
    query_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(query)) = (read_str(entity), read_query(query_json)) else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_list(entity, &query))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build `GET /{entity}/{id}`; `query_json` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_get(
    client: *const FfiLogoClient,
    entity: *const c_char,
    id: *const c_char,
    query_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(id), Some(query)) =
            (read_str(entity), read_str(id), read_query(query_json))
        else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_get(entity, id, &query))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build `POST /{entity}` with `record_json` as the body.
///
/// Returns null if any argument is null or `record_json` is not valid JSON.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_create(
    client: *const FfiLogoClient,
    entity: *const c_char,
    record_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(record)) = (read_str(entity), read_json(record_json)) else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_create(entity, &record))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build `PUT /{entity}/{id}` replacing the record with `record_json`.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_update(
    client: *const FfiLogoClient,
    entity: *const c_char,
    id: *const c_char,
    record_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(id), Some(record)) =
            (read_str(entity), read_str(id), read_json(record_json))
        else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_update(entity, id, &record))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build `PATCH /{entity}/{id}` with the partial record `changes_json`.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_patch(
    client: *const FfiLogoClient,
    entity: *const c_char,
    id: *const c_char,
    changes_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(id), Some(changes)) =
            (read_str(entity), read_str(id), read_json(changes_json))
        else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_patch(entity, id, &changes))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build `DELETE /{entity}/{id}`.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_delete(
    client: *const FfiLogoClient,
    entity: *const c_char,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(id)) = (read_str(entity), read_str(id)) else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_delete(entity, id))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a filtered list. `filter` is a ready `q` expression such as
/// `CODE like 'KB*' and STATUS eq 0`; it overrides any `q` in `query_json`.
/// A blank filter lists without one.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_search(
    client: *const FfiLogoClient,
    entity: *const c_char,
    filter: *const c_char,
    query_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(filter), Some(query)) =
            (read_str(entity), read_str(filter), read_query(query_json))
        else {
            return std::ptr::null_mut();
        };
        into_request(client.inner.build_list(entity, &query.filter(filter)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an action call `METHOD /{entity}[/{id}]/{action}[/{param}...]`.
///
/// `id` and `body_json` may be null. `params` points to `params_len` C
/// strings (may be null when `params_len` is 0). Returns null when a GET
/// action is given a body.
#[unsafe(no_mangle)]
pub extern "C" fn logo_build_action(
    client: *const FfiLogoClient,
    entity: *const c_char,
    method: FfiHttpMethod,
    id: *const c_char,
    action: *const c_char,
    params: *const *const c_char,
    params_len: u32,
    body_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || (params.is_null() && params_len > 0) {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(entity), Some(action)) = (read_str(entity), read_str(action)) else {
            return std::ptr::null_mut();
        };

        let mut call = ActionCall::new(method.into(), action);
        if !id.is_null() {
            match read_str(id) {
                Some(id) => call = call.on(id),
                None => return std::ptr::null_mut(),
            }
        }
        if params_len > 0 {
            let raw = unsafe { std::slice::from_raw_parts(params, params_len as usize) };
            for &param in raw {
                match read_str(param) {
                    Some(param) => call = call.param(param),
                    None => return std::ptr::null_mut(),
                }
            }
        }
        if !body_json.is_null() {
            match read_json(body_json) {
                Some(body) => call = call.json(body),
                None => return std::ptr::null_mut(),
            }
        }
        into_request(client.inner.build_action(entity, &call))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is an
/// empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: read_str(resp.body).unwrap_or("").to_string(),
    }
}

/// Shared null checks and unwinding for the `logo_parse_*` functions.
fn parse_with(
    name: &str,
    client: *const FfiLogoClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&logo_core::LogoClient, HttpResponse) -> *mut FfiLogoResult
        + std::panic::UnwindSafe,
) -> *mut FfiLogoResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiLogoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiLogoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        parse(&client.inner, ffi_response_to_core(resp))
    })
    .unwrap_or_else(|_| FfiLogoResult::panic(&format!("panic in {name}")))
}

/// Parse a single-record response (get, create, update, patch, or a
/// record-returning action). `data_tag = Record` on success.
#[unsafe(no_mangle)]
pub extern "C" fn logo_parse_record(
    client: *const FfiLogoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLogoResult {
    parse_with("logo_parse_record", client, response, |client, resp| {
        match client.parse_record::<serde_json::Value>(resp) {
            Ok(record) => FfiLogoResult::ok_json(FfiDataTag::Record, &record),
            Err(e) => FfiLogoResult::from_error(e),
        }
    })
}

/// Parse a list or search response. `data_tag = Page` on success; the JSON
/// is always the `items` envelope, even when the server sent a bare array.
#[unsafe(no_mangle)]
pub extern "C" fn logo_parse_page(
    client: *const FfiLogoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLogoResult {
    parse_with("logo_parse_page", client, response, |client, resp| {
        match client.parse_page::<serde_json::Value>(resp) {
            Ok(page) => FfiLogoResult::ok_json::<Page<serde_json::Value>>(FfiDataTag::Page, &page),
            Err(e) => FfiLogoResult::from_error(e),
        }
    })
}

/// Parse an action response carrying `Key`/`Value` pairs.
/// `data_tag = Parameters` on success.
#[unsafe(no_mangle)]
pub extern "C" fn logo_parse_parameters(
    client: *const FfiLogoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLogoResult {
    parse_with("logo_parse_parameters", client, response, |client, resp| {
        match client.parse_parameters(resp) {
            Ok(params) => FfiLogoResult::ok_json::<Vec<Parameter>>(FfiDataTag::Parameters, &params),
            Err(e) => FfiLogoResult::from_error(e),
        }
    })
}

/// Parse a response whose body is ignored (delete, track, untrack).
/// `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn logo_parse_empty(
    client: *const FfiLogoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLogoResult {
    parse_with("logo_parse_empty", client, response, |client, resp| {
        match client.parse_empty(resp) {
            Ok(()) => FfiLogoResult::ok_empty(),
            Err(e) => FfiLogoResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `logo_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn logo_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.path.is_null() {
            drop(unsafe { CString::from_raw(req.path) });
        }
        if !req.body.is_null() {
            drop(unsafe { CString::from_raw(req.body) });
        }
        unsafe { free_headers(req.headers, req.headers_len) };
    });
}

/// Free an `FfiLogoResult` returned by any `logo_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn logo_free_result(result: *mut FfiLogoResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            drop(unsafe { CString::from_raw(result.data) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn logo_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
