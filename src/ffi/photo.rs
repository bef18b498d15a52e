// src/ffi/photo.rs
// ============================================================================
// FFI bindings for the `PhotoService`. Photos are linked to a rotary year but
// never change its stats.
// ----------------------------------------------------------------------------

use crate::domains::photo::types::{NewPhoto, UpdatePhoto};
use crate::ffi::{block_on_async, ensure_ptr, handle_status_result, parse_payload, write_json};
use crate::globals;

use serde::Deserialize;
use std::os::raw::{c_char, c_int};
use uuid::Uuid;

#[derive(Deserialize)]
struct IdPayload {
    id: Uuid,
}

/// Expected JSON payload:
/// { "photo": { NewPhoto } }
/// Response: { "entity": Photo, "linkage": LinkageOutcome }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photo_create(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            photo: NewPhoto,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_photo_service()?;
        let outcome = block_on_async(svc.create_photo(p.photo))?;
        write_json(result, &outcome)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn photo_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_photo_service()?;
        let photo = block_on_async(svc.get_photo(p.id))?;
        write_json(result, &photo)
    })
}

/// Expected JSON payload:
/// { "id": "uuid", "update": { UpdatePhoto } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photo_update(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            id: Uuid,
            update: UpdatePhoto,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_photo_service()?;
        let outcome = block_on_async(svc.update_photo(p.id, p.update))?;
        write_json(result, &outcome)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn photo_delete(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_photo_service()?;
        let outcome = block_on_async(svc.delete_photo(p.id))?;
        write_json(result, &outcome)
    })
}

/// A year's gallery
/// Expected JSON payload:
/// { "rotary_year_id": "uuid" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn photo_list_for_year(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            rotary_year_id: Uuid,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_photo_service()?;
        let photos = block_on_async(svc.list_photos_for_year(p.rotary_year_id))?;
        write_json(result, &photos)
    })
}
