// src/ffi/impact.rs
// ============================================================================
// FFI bindings for the `ImpactService`. Every call takes the dashboard
// filters; an empty object means "all time, every area, every status".
// ----------------------------------------------------------------------------

use crate::domains::impact::types::ImpactFilters;
use crate::ffi::{block_on_async, ensure_ptr, handle_status_result, parse_payload, write_json};
use crate::globals;

use std::os::raw::{c_char, c_int};

/// Expected JSON payload (ImpactFilters):
/// { "fiscal_year": "2025-2026" | null, "area_of_focus": "environment" | null, "status": "Completed" | null }
/// Response: DashboardData
#[unsafe(no_mangle)]
pub unsafe extern "C" fn impact_dashboard_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let filters: ImpactFilters = parse_payload(payload_json)?;
        let svc = globals::get_impact_service()?;
        let dashboard = block_on_async(svc.dashboard(&filters))?;
        write_json(result, &dashboard)
    })
}

/// Response: LifetimeImpact
#[unsafe(no_mangle)]
pub unsafe extern "C" fn impact_lifetime_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let filters: ImpactFilters = parse_payload(payload_json)?;
        let svc = globals::get_impact_service()?;
        let impact = block_on_async(svc.lifetime_impact(&filters))?;
        write_json(result, &impact)
    })
}

/// Response: [AreaImpact], highest project value first
#[unsafe(no_mangle)]
pub unsafe extern "C" fn impact_by_area_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let filters: ImpactFilters = parse_payload(payload_json)?;
        let svc = globals::get_impact_service()?;
        let areas = block_on_async(svc.impact_by_area_of_focus(&filters))?;
        write_json(result, &areas)
    })
}

/// Response: [YearImpact], most recent fiscal year first
#[unsafe(no_mangle)]
pub unsafe extern "C" fn impact_over_time_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let filters: ImpactFilters = parse_payload(payload_json)?;
        let svc = globals::get_impact_service()?;
        let years = block_on_async(svc.impact_over_time(&filters))?;
        write_json(result, &years)
    })
}
