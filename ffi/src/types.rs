//! C-layout structs and enums exchanged with `logo_*` callers.
//!
//! # Design
//! Requests mirror the core `HttpRequest` with C strings and a raw header
//! array. Parsed payloads cross the boundary as JSON text rather than one
//! struct per entity: the record shapes are open-ended (`extra` columns), and
//! every C caller already has a JSON parser for the HTTP body anyway.

use std::ffi::CString;
use std::os::raw::c_char;

use logo_core::{ApiError, HttpMethod, HttpRequest};

/// Opaque `LogoClient` handle; C sees only `FfiLogoClient *`.
pub struct FfiLogoClient {
    pub(crate) inner: logo_core::LogoClient,
}

/// Copy `s` into a heap C string owned by the caller. Interior NULs cannot be
/// represented and yield an empty string.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request verb, numbered for C switch statements.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Patch => HttpMethod::Patch,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// One `name: value` header, both owned C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A request ready to send: absolute URL, headers and optional JSON body.
///
/// Produced by `logo_build_*`, released with `logo_free_request`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Move a core request onto the C heap.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input
// ---------------------------------------------------------------------------

/// Status and body of an executed request, filled in by the C caller.
///
/// Borrowed for the duration of a `logo_parse_*` call and never freed here.
/// A null `body` reads as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiLogoResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Unauthorized = 2,
    Http = 3,
    Deserialization = 4,
    Serialization = 5,
    InvalidArgument = 6,
    Panic = 7,
    NullArg = 8,
}

/// What the JSON in `FfiLogoResult::data` describes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// A single record object.
    Record = 1,
    /// `{"items": [...], "count": n, "next": "..."}`
    Page = 2,
    /// `[{"Key": ..., "Value": ...}, ...]`
    Parameters = 3,
}

/// Outcome of a `logo_parse_*` call, released with `logo_free_result`.
///
/// `error_code == Ok` means `data` holds JSON shaped per `data_tag` (null
/// when the tag is `None`). Any other code leaves `data` null and sets
/// `error_message`; `http_status` is filled for status-derived errors.
#[repr(C)]
pub struct FfiLogoResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_char,
}

impl FfiLogoResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut c_char,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiLogoResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    /// Success with `value` encoded as JSON text.
    pub(crate) fn ok_json<T: serde::Serialize>(tag: FfiDataTag, value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, tag, c_string(json)),
            Err(e) => Self::from_error(ApiError::SerializationError(e.to_string())),
        }
    }

    /// Success without payload: delete, track, untrack.
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Failure carrying the category and message of `err`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404u16),
            ApiError::Unauthorized { status } => (FfiErrorCode::Unauthorized, *status),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
            ApiError::InvalidArgument(_) => (FfiErrorCode::InvalidArgument, 0),
        };
        Self::boxed(
            error_code,
            c_string(err.to_string()),
            http_status,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// A required pointer argument was null.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            c_string(format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// A panic was caught before reaching C.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            c_string(msg),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }
}

/// Reclaim the header array allocated by `FfiHttpRequest::from_core`.
///
/// # Safety
/// `headers` must come from `from_core` with the same `len`.
pub(crate) unsafe fn free_headers(headers: *mut FfiHeader, len: u32) {
    if headers.is_null() || len == 0 {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(headers, len as usize);
    let headers = unsafe { Box::from_raw(slice) };
    for h in headers.iter() {
        if !h.key.is_null() {
            drop(unsafe { CString::from_raw(h.key) });
        }
        if !h.value.is_null() {
            drop(unsafe { CString::from_raw(h.value) });
        }
    }
}
