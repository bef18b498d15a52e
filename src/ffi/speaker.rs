// src/ffi/speaker.rs
// ============================================================================
// FFI bindings for the `SpeakerService`.
// ----------------------------------------------------------------------------

use crate::domains::speaker::types::{NewSpeaker, UpdateSpeaker};
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
/// { "speaker": { NewSpeaker } }
/// Response: { "entity": Speaker, "linkage": LinkageOutcome }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn speaker_create(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            speaker: NewSpeaker,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_speaker_service()?;
        let outcome = block_on_async(svc.create_speaker(p.speaker))?;
        write_json(result, &outcome)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn speaker_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_speaker_service()?;
        let speaker = block_on_async(svc.get_speaker(p.id))?;
        write_json(result, &speaker)
    })
}

/// Expected JSON payload:
/// { "id": "uuid", "update": { UpdateSpeaker } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn speaker_update(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            id: Uuid,
            update: UpdateSpeaker,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_speaker_service()?;
        let outcome = block_on_async(svc.update_speaker(p.id, p.update))?;
        write_json(result, &outcome)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn speaker_delete(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_speaker_service()?;
        let outcome = block_on_async(svc.delete_speaker(p.id))?;
        write_json(result, &outcome)
    })
}

/// Expected JSON payload:
/// { "rotary_year_id": "uuid" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn speaker_list_for_year(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            rotary_year_id: Uuid,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_speaker_service()?;
        let speakers = block_on_async(svc.list_speakers_for_year(p.rotary_year_id))?;
        write_json(result, &speakers)
    })
}
