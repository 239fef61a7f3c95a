//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! `FfiRequestDescriptor` mirrors the core `RequestDescriptor` with C
//! strings in place of `String`. The map fields cross as JSON object
//! strings (always present, `"{}"` when empty) so the host can hand them
//! straight to its HTTP stack. Conversion helpers live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use force_net_core::{FileParam, HttpMethod, RequestBuilder, RequestDescriptor};
use serde_json::{Map, Value};

/// Opaque handle to a `RequestBuilder`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiForceClient {
    pub(crate) inner: RequestBuilder,
}

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
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
            FfiHttpMethod::Patch => HttpMethod::Patch,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A normalized request described as C-compatible plain data.
///
/// Built by `force_build_*` functions and released with
/// `force_free_request`. `params` goes in the query string for GET/DELETE
/// and in the JSON body for POST/PATCH.
#[repr(C)]
pub struct FfiRequestDescriptor {
    pub method: FfiHttpMethod,
    pub endpoint: *mut c_char,
    pub path: *mut c_char,
    pub params_json: *mut c_char,
    pub header_params_json: *mut c_char,
    pub file_params_json: *mut c_char,
    pub return_binary: bool,
    pub skip_authentication: bool,
    /// The whole descriptor as the bridge argument object.
    pub descriptor_json: *mut c_char,
}

impl FfiRequestDescriptor {
    /// Convert a core `RequestDescriptor` into a heap-allocated `FfiRequestDescriptor`.
    pub(crate) fn from_core(req: RequestDescriptor) -> *mut Self {
        let descriptor_json = json_c_string(&req);
        let ffi_req = Box::new(FfiRequestDescriptor {
            method: req.method.into(),
            endpoint: to_c_string(req.endpoint),
            path: to_c_string(req.path),
            params_json: json_c_string(&req.params),
            header_params_json: json_c_string(&req.header_params),
            file_params_json: json_c_string(&req.file_params),
            return_binary: req.return_binary,
            skip_authentication: req.skip_authentication,
            descriptor_json,
        });
        Box::into_raw(ffi_req)
    }

    /// Release every string owned by this descriptor.
    pub(crate) fn free_fields(&self) {
        for s in [
            self.endpoint,
            self.path,
            self.params_json,
            self.header_params_json,
            self.file_params_json,
            self.descriptor_json,
        ] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
    }
}

/// Move a Rust string into a heap C string. Interior NULs yield an empty string.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn json_c_string<T: serde::Serialize + ?Sized>(value: &T) -> *mut c_char {
    to_c_string(serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()))
}

/// Borrow a C string argument. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Borrow an optional C string argument.
///
/// `Some(None)` for null, `Some(Some(_))` for valid UTF-8 and `None` for
/// invalid UTF-8, which callers must reject rather than treat as absent.
///
/// # Safety
/// Same contract as [`c_str`].
pub(crate) unsafe fn opt_c_str<'a>(ptr: *const c_char) -> Option<Option<&'a str>> {
    if ptr.is_null() {
        return Some(None);
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(Some)
}

/// Parse an optional JSON object argument. Null means an empty object;
/// anything that is not a JSON object yields `None`.
///
/// # Safety
/// Same contract as [`c_str`].
pub(crate) unsafe fn json_object(ptr: *const c_char) -> Option<Map<String, Value>> {
    if ptr.is_null() {
        return Some(Map::new());
    }
    match serde_json::from_str::<Value>(unsafe { c_str(ptr) }?).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Parse an optional JSON object of file params, keyed by form field name.
///
/// # Safety
/// Same contract as [`c_str`].
pub(crate) unsafe fn file_params(ptr: *const c_char) -> Option<BTreeMap<String, FileParam>> {
    if ptr.is_null() {
        return Some(BTreeMap::new());
    }
    serde_json::from_str(unsafe { c_str(ptr) }?).ok()
}
