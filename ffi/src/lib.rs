//! C-ABI wrapper around `force-net-core`.
//!
//! # Overview
//! Exposes the request builder through `extern "C"` functions so a native
//! bridge (the component that owns transport and authentication) can obtain
//! fully normalized request descriptors without reimplementing path
//! templates or defaults.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `force_build_*` function per builder operation. Each returns null
//!   when a required argument is null, any string argument is not valid
//!   UTF-8, a JSON argument is not an object, or (for `query_more`) the url
//!   is malformed.
//! - The C caller owns all returned pointers and must call the matching
//!   `force_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use force_net_core::{ClientConfig, RequestBuilder, RequestDescriptor, RequestOptions};
use tracing_subscriber::EnvFilter;

use types::*;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a global subscriber that writes log events to stderr.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`. Until this is
/// called the library's log events (including the error for a malformed
/// `query_more` url) go nowhere. Returns false if a global subscriber is
/// already installed.
#[unsafe(no_mangle)]
pub extern "C" fn force_init_logging() -> bool {
    catch_unwind(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client using `api_version`, or the default version when
/// `api_version` is null. Returns null if `api_version` is not valid UTF-8.
///
/// The caller must free the returned pointer with `force_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn force_client_new(api_version: *const c_char) -> *mut FfiForceClient {
    catch_unwind(|| {
        let config = match unsafe { opt_c_str(api_version) } {
            Some(Some(version)) => ClientConfig::with_api_version(version),
            Some(None) => ClientConfig::default(),
            None => return std::ptr::null_mut(),
        };
        let client = FfiForceClient {
            inner: RequestBuilder::new(&config),
        };
        Box::into_raw(Box::new(client))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `force_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn force_client_free(client: *mut FfiForceClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Change the API version used by every later `force_build_*` call.
///
/// Returns false if `client` or `version` is null.
#[unsafe(no_mangle)]
pub extern "C" fn force_client_set_api_version(client: *mut FfiForceClient, version: *const c_char) -> bool {
    catch_unwind(|| {
        if client.is_null() {
            return false;
        }
        let Some(version) = (unsafe { c_str(version) }) else {
            return false;
        };
        let client = unsafe { &mut *client };
        client.inner.set_api_version(version);
        true
    })
    .unwrap_or(false)
}

/// Current API version. Free the result with `force_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn force_client_api_version(client: *const FfiForceClient) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        to_c_string(client.inner.api_version())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

fn build_with(
    client: *const FfiForceClient,
    build: impl FnOnce(&RequestBuilder) -> Option<RequestDescriptor>,
) -> *mut FfiRequestDescriptor {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiRequestDescriptor::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build an arbitrary request. `params_json`, `header_params_json` and
/// `file_params_json` may be null (empty).
#[unsafe(no_mangle)]
pub extern "C" fn force_build_send_request(
    client: *const FfiForceClient,
    endpoint: *const c_char,
    path: *const c_char,
    method: FfiHttpMethod,
    params_json: *const c_char,
    header_params_json: *const c_char,
    file_params_json: *const c_char,
    return_binary: bool,
    skip_authentication: bool,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| {
        let mut options = RequestOptions::new()
            .method(method.into())
            .params(unsafe { json_object(params_json) }?)
            .return_binary(return_binary)
            .skip_authentication(skip_authentication);
        options.header_params = unsafe { json_object(header_params_json) }?;
        options.file_params = unsafe { file_params(file_params_json) }?;
        Some(b.send_request(unsafe { c_str(endpoint) }?, unsafe { c_str(path) }?, options))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_versions(client: *const FfiForceClient) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.versions()))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_resources(client: *const FfiForceClient) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.resources()))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_describe_global(client: *const FfiForceClient) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.describe_global()))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_metadata(
    client: *const FfiForceClient,
    objtype: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.metadata(unsafe { c_str(objtype) }?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_describe(
    client: *const FfiForceClient,
    objtype: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.describe(unsafe { c_str(objtype) }?)))
}

/// `record_type_id` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn force_build_describe_layout(
    client: *const FfiForceClient,
    objtype: *const c_char,
    record_type_id: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| {
        Some(b.describe_layout(unsafe { c_str(objtype) }?, unsafe { opt_c_str(record_type_id) }?))
    })
}

/// `fields_json` must be a JSON object.
#[unsafe(no_mangle)]
pub extern "C" fn force_build_create(
    client: *const FfiForceClient,
    objtype: *const c_char,
    fields_json: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| {
        let fields = unsafe { json_object(fields_json) }?;
        Some(b.create(unsafe { c_str(objtype) }?, fields))
    })
}

/// `field_list` (e.g. `Name,Industry`) may be null.
#[unsafe(no_mangle)]
pub extern "C" fn force_build_retrieve(
    client: *const FfiForceClient,
    objtype: *const c_char,
    id: *const c_char,
    field_list: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| {
        Some(b.retrieve(
            unsafe { c_str(objtype) }?,
            unsafe { c_str(id) }?,
            unsafe { opt_c_str(field_list) }?,
        ))
    })
}

/// `external_id` may be null, which inserts instead of upserting.
#[unsafe(no_mangle)]
pub extern "C" fn force_build_upsert(
    client: *const FfiForceClient,
    objtype: *const c_char,
    external_id_field: *const c_char,
    external_id: *const c_char,
    fields_json: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| {
        let fields = unsafe { json_object(fields_json) }?;
        Some(b.upsert(
            unsafe { c_str(objtype) }?,
            unsafe { c_str(external_id_field) }?,
            unsafe { opt_c_str(external_id) }?,
            fields,
        ))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_update(
    client: *const FfiForceClient,
    objtype: *const c_char,
    id: *const c_char,
    fields_json: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| {
        let fields = unsafe { json_object(fields_json) }?;
        Some(b.update(unsafe { c_str(objtype) }?, unsafe { c_str(id) }?, fields))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_del(
    client: *const FfiForceClient,
    objtype: *const c_char,
    id: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.del(unsafe { c_str(objtype) }?, unsafe { c_str(id) }?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_query(
    client: *const FfiForceClient,
    soql: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.query(unsafe { c_str(soql) }?)))
}

/// Returns null for a malformed url; no request should be sent. The error
/// event is only visible after `force_init_logging` (or a host-installed
/// subscriber).
#[unsafe(no_mangle)]
pub extern "C" fn force_build_query_more(
    client: *const FfiForceClient,
    url: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| b.query_more(unsafe { c_str(url) }?))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_search(
    client: *const FfiForceClient,
    sosl: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.search(unsafe { c_str(sosl) }?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn force_build_get_attachment(
    client: *const FfiForceClient,
    id: *const c_char,
) -> *mut FfiRequestDescriptor {
    build_with(client, |b| Some(b.get_attachment(unsafe { c_str(id) }?)))
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a descriptor returned by a `force_build_*` function. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn force_free_request(req: *mut FfiRequestDescriptor) {
    if !req.is_null() {
        let _ = catch_unwind(|| {
            let req = unsafe { Box::from_raw(req) };
            req.free_fields();
        });
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn force_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { std::ffi::CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
