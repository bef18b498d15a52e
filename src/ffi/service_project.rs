// src/ffi/service_project.rs
// ============================================================================
// FFI bindings for the `ServiceProjectService`.
// Saves and deletes return the linkage outcome next to the entity so the host
// can surface warnings such as an unprovisioned fiscal year.
// ----------------------------------------------------------------------------

use crate::domains::service_project::types::{NewServiceProject, UpdateServiceProject};
use crate::ffi::{block_on_async, ensure_ptr, handle_status_result, parse_payload, write_json};
use crate::globals;

use serde::Deserialize;
use std::os::raw::{c_char, c_int};
use uuid::Uuid;

#[derive(Deserialize)]
struct IdPayload {
    id: Uuid,
}

/// Create a service project
/// Expected JSON payload:
/// { "project": { NewServiceProject } }
/// Response: { "entity": ServiceProject, "linkage": LinkageOutcome }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn service_project_create(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            project: NewServiceProject,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_service_project_service()?;
        let outcome = block_on_async(svc.create_project(p.project))?;
        write_json(result, &outcome)
    })
}

/// Expected JSON payload:
/// { "id": "uuid" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn service_project_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_service_project_service()?;
        let project = block_on_async(svc.get_project(p.id))?;
        write_json(result, &project)
    })
}

/// Expected JSON payload:
/// { "id": "uuid", "update": { UpdateServiceProject } }
/// Response: { "entity": ServiceProject, "linkage": LinkageOutcome }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn service_project_update(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            id: Uuid,
            update: UpdateServiceProject,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_service_project_service()?;
        let outcome = block_on_async(svc.update_project(p.id, p.update))?;
        write_json(result, &outcome)
    })
}

/// Expected JSON payload:
/// { "id": "uuid" }
/// Response: LinkageOutcome
#[unsafe(no_mangle)]
pub unsafe extern "C" fn service_project_delete(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_service_project_service()?;
        let outcome = block_on_async(svc.delete_project(p.id))?;
        write_json(result, &outcome)
    })
}

/// Projects linked to a rotary year
/// Expected JSON payload:
/// { "rotary_year_id": "uuid" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn service_project_list_for_year(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            rotary_year_id: Uuid,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_service_project_service()?;
        let projects = block_on_async(svc.list_projects_for_year(p.rotary_year_id))?;
        write_json(result, &projects)
    })
}
