// src/ffi/rotary_year.rs
// ============================================================================
// FFI bindings for the `RotaryYearService` and the fiscal-year calendar.
// Wrappers decode the JSON payload, forward to the service on the shared
// runtime and write the JSON response into `result`. Strings written to
// `result` must be released with `free_string`.
// ----------------------------------------------------------------------------

use crate::domains::rotary_year::calendar::{self, fiscal_year_of, FiscalYear};
use crate::domains::rotary_year::types::{NewRotaryYear, UpdateRotaryYear};
use crate::domains::settings::TimelineSettings;
use crate::ffi::{block_on_async, c_str, ensure_ptr, handle_status_result, parse_payload, write_json};
use crate::globals;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::os::raw::{c_char, c_int};
use uuid::Uuid;

#[derive(Deserialize)]
struct IdPayload {
    id: Uuid,
}

#[derive(Deserialize)]
struct LabelPayload {
    label: String,
}

/// Offset of the initialized library, or the default club offset before init
fn club_offset() -> chrono::FixedOffset {
    globals::get_settings().unwrap_or_default().club_offset()
}

// ---------------------------------------------------------------------------
// Rotary year rows
// ---------------------------------------------------------------------------

/// Provision a rotary year
/// Expected JSON payload:
/// { "year": { NewRotaryYear } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_create(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            year: NewRotaryYear,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_rotary_year_service()?;
        let year = block_on_async(svc.create_year(p.year))?;
        write_json(result, &year)
    })
}

/// Expected JSON payload:
/// { "id": "uuid" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_rotary_year_service()?;
        let year = block_on_async(svc.get_year(p.id))?;
        write_json(result, &year)
    })
}

/// Expected JSON payload:
/// { "label": "2025-2026" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_get_by_label(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: LabelPayload = parse_payload(payload_json)?;
        let svc = globals::get_rotary_year_service()?;
        let year = block_on_async(svc.get_year_by_label(&p.label))?;
        write_json(result, &year)
    })
}

/// The club's current fiscal year and its provisioned row, if any
/// Response: { "fiscal_year": "2025-2026", "year": RotaryYear | null }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_current(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(result);

        #[derive(Serialize)]
        struct Response {
            fiscal_year: FiscalYear,
            year: Option<crate::domains::rotary_year::types::RotaryYear>,
        }

        let svc = globals::get_rotary_year_service()?;
        let year = block_on_async(svc.current_year())?;
        write_json(result, &Response { fiscal_year: svc.current_fiscal_year(), year })
    })
}

/// All provisioned years, most recent first
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_list(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(result);

        let svc = globals::get_rotary_year_service()?;
        let years = block_on_async(svc.list_years())?;
        write_json(result, &years)
    })
}

/// Expected JSON payload:
/// { "id": "uuid", "update": { UpdateRotaryYear } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_update(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            id: Uuid,
            update: UpdateRotaryYear,
        }

        let p: Payload = parse_payload(payload_json)?;
        let svc = globals::get_rotary_year_service()?;
        let year = block_on_async(svc.update_year(p.id, p.update))?;
        write_json(result, &year)
    })
}

/// Backfill links for a year and recompute its stats
/// Expected JSON payload:
/// { "id": "uuid" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotary_year_recalculate(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_rotary_year_service()?;
        let outcome = block_on_async(svc.recalculate_year(p.id))?;
        write_json(result, &outcome)
    })
}

// ---------------------------------------------------------------------------
// Calendar helpers. These do not need an initialized library.
// ---------------------------------------------------------------------------

/// Expected JSON payload:
/// { "date": "2025-08-15" }
/// Response: "2025-2026"
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_of_date(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            date: NaiveDate,
        }

        let p: Payload = parse_payload(payload_json)?;
        write_json(result, &fiscal_year_of(p.date))
    })
}

/// The club's current fiscal year label
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_current(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(result);
        write_json(result, &calendar::current_fiscal_year(club_offset()))
    })
}

/// Expected JSON payload:
/// { "label": "2025-2026" }
/// Response: { "start": "2025-07-01", "end": "2026-06-30" }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_bounds(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: LabelPayload = parse_payload(payload_json)?;
        write_json(result, &calendar::bounds_of(&p.label)?)
    })
}

/// Expected JSON payload:
/// { "label": "2025-2026", "date": "2026-06-30" }
/// Response: true | false
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_contains(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            label: String,
            date: NaiveDate,
        }

        let p: Payload = parse_payload(payload_json)?;
        write_json(result, &calendar::contains(p.date, &p.label)?)
    })
}

/// Expected JSON payload:
/// { "label": "2025-2026" }
/// Response: "2024-2025"
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_previous(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: LabelPayload = parse_payload(payload_json)?;
        write_json(result, &calendar::previous(&p.label)?)
    })
}

/// Expected JSON payload:
/// { "label": "2025-2026" }
/// Response: "2026-2027"
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_next(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: LabelPayload = parse_payload(payload_json)?;
        write_json(result, &calendar::next(&p.label)?)
    })
}

/// Plain label check; a null or non-UTF-8 pointer is not a valid label
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_is_valid(label: *const c_char) -> bool {
    if label.is_null() {
        return false;
    }
    unsafe { c_str(label) }.map(calendar::is_valid).unwrap_or(false)
}

/// Expected JSON payload:
/// { "from_start_year": 2020, "to_start_year": 2025 }
/// `to_start_year` defaults to the current fiscal year.
/// Response: ["2025-2026", ..., "2020-2021"]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fiscal_year_list(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            from_start_year: i32,
            #[serde(default)]
            to_start_year: Option<i32>,
        }

        let p: Payload = parse_payload(payload_json)?;
        let years = match p.to_start_year {
            Some(to) => calendar::list_years(p.from_start_year, to)?,
            None => calendar::list_years_until_current(p.from_start_year, club_offset())?,
        };
        write_json(result, &years)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::error::ErrorCode;
    use std::ffi::CString;

    fn call(f: unsafe extern "C" fn(*const c_char, *mut *mut c_char) -> c_int, payload: &str) -> (c_int, String) {
        let payload = CString::new(payload).unwrap();
        let mut out: *mut c_char = std::ptr::null_mut();
        let code = unsafe { f(payload.as_ptr(), &mut out) };
        let body = if out.is_null() {
            String::new()
        } else {
            unsafe { CString::from_raw(out) }.into_string().unwrap()
        };
        (code, body)
    }

    #[test]
    fn test_calendar_entry_points() {
        assert_eq!(call(fiscal_year_of_date, r#"{"date":"2025-08-15"}"#), (0, r#""2025-2026""#.to_string()));
        assert_eq!(call(fiscal_year_of_date, r#"{"date":"2025-06-30"}"#).1, r#""2024-2025""#);
        assert_eq!(
            call(fiscal_year_bounds, r#"{"label":"2025-2026"}"#).1,
            r#"{"start":"2025-07-01","end":"2026-06-30"}"#
        );
        assert_eq!(call(fiscal_year_contains, r#"{"label":"2025-2026","date":"2026-06-30"}"#).1, "true");
        assert_eq!(call(fiscal_year_previous, r#"{"label":"2025-2026"}"#).1, r#""2024-2025""#);
        assert_eq!(call(fiscal_year_next, r#"{"label":"2025-2026"}"#).1, r#""2026-2027""#);
        assert_eq!(
            call(fiscal_year_list, r#"{"from_start_year":2022,"to_start_year":2024}"#).1,
            r#"["2024-2025","2023-2024","2022-2023"]"#
        );
    }

    #[test]
    fn test_malformed_label_returns_fiscal_year_code() {
        let (code, body) = call(fiscal_year_bounds, r#"{"label":"2025-2027"}"#);
        assert_eq!(code, ErrorCode::InvalidFiscalYear as c_int);
        assert!(body.is_empty());
    }

    #[test]
    fn test_is_valid() {
        let ok = CString::new("2025-2026").unwrap();
        let bad = CString::new("2025/2026").unwrap();
        assert!(unsafe { fiscal_year_is_valid(ok.as_ptr()) });
        assert!(!unsafe { fiscal_year_is_valid(bad.as_ptr()) });
        assert!(!unsafe { fiscal_year_is_valid(std::ptr::null()) });
    }

    #[test]
    fn test_null_result_pointer() {
        let payload = CString::new(r#"{"date":"2025-08-15"}"#).unwrap();
        let code = unsafe { fiscal_year_of_date(payload.as_ptr(), std::ptr::null_mut()) };
        assert_eq!(code, ErrorCode::NullPointer as c_int);
    }
}
