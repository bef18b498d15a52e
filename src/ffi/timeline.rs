// src/ffi/timeline.rs
// ============================================================================
// FFI bindings for the `TimelineService`: hooks for hosts that write entity
// rows themselves and only need the year linkage and stats refreshed.
// ----------------------------------------------------------------------------

use crate::domains::timeline::types::EntitySavedEvent;
use crate::ffi::{block_on_async, ensure_ptr, handle_status_result, parse_payload, write_json};
use crate::globals;
use crate::types::EntityKind;

use serde::Deserialize;
use std::os::raw::{c_char, c_int};
use uuid::Uuid;

/// React to an entity save
/// Expected JSON payload (EntitySavedEvent):
/// {
///   "entity": { "entity_type": "service_project", "id": "uuid", "status": "Completed",
///               "date": "2025-08-15", "rotary_year_id": null },
///   "previous": { ...same shape... } | null
/// }
/// Response: LinkageOutcome
#[unsafe(no_mangle)]
pub unsafe extern "C" fn timeline_on_entity_saved(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let event: EntitySavedEvent = parse_payload(payload_json)?;
        let svc = globals::get_timeline_service()?;
        let outcome = block_on_async(svc.on_entity_saved(event))?;
        write_json(result, &outcome)
    })
}

/// React to an entity delete
/// Expected JSON payload:
/// { "entity_type": "speaker", "rotary_year_id": "uuid" | null }
/// Response: LinkageOutcome
#[unsafe(no_mangle)]
pub unsafe extern "C" fn timeline_on_entity_deleted(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            entity_type: EntityKind,
            #[serde(default)]
            rotary_year_id: Option<Uuid>,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_timeline_service()?;
        let outcome = block_on_async(svc.on_entity_deleted(p.entity_type, p.rotary_year_id))?;
        write_json(result, &outcome)
    })
}

/// The "recalculate" action on a year page: backfill missing links, then
/// recompute stats
/// Expected JSON payload:
/// { "rotary_year_id": "uuid" }
/// Response: BackfillOutcome
#[unsafe(no_mangle)]
pub unsafe extern "C" fn timeline_recalculate_year(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            rotary_year_id: Uuid,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_rotary_year_service()?;
        let outcome = block_on_async(svc.recalculate_year(p.rotary_year_id))?;
        write_json(result, &outcome)
    })
}

/// Recompute stats only, without touching links
/// Expected JSON payload:
/// { "rotary_year_id": "uuid" }
/// Response: the year's stats object
#[unsafe(no_mangle)]
pub unsafe extern "C" fn timeline_recompute_stats(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            rotary_year_id: Uuid,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_timeline_service()?;
        let stats = block_on_async(svc.recompute_stats(p.rotary_year_id))?;
        write_json(result, &stats)
    })
}
