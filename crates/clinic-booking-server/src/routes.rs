//! Request handlers.
//!
//! Storage work runs on the blocking pool, each request on its own SQLite
//! connection. Handlers never hold locks of their own; conflicting writes
//! are settled by the database.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use clinic_booking_core::db::Database;
use clinic_booking_core::models::{
    normalize_date, Appointment, BookingRequest, DoctorCalendar, Slot, TimeRange,
};
use clinic_booking_core::{
    ActivityEvent, AppointmentStatus, AvailabilityManager, BookingCoordinator, BookingError, Doctor,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{Caller, Role};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;
const MAX_ACTIVITY_LIMIT: usize = 500;

/// Run `f` against a fresh connection on the blocking pool.
async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
{
    let path = state.database_path.clone();
    let busy_timeout = state.busy_timeout;
    tokio::task::spawn_blocking(move || {
        let db = Database::connect(path.as_path(), busy_timeout)?;
        f(&db)
    })
    .await?
}

// =========================================================================
// Appointments
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentBody {
    pub doctor_id: String,
    pub appointment_date: String,
    /// "HH:MM - HH:MM"
    pub time_slot: Option<String>,
    /// Alternative to `time_slot`
    pub start_time: Option<String>,
    #[serde(default)]
    pub consultation_type: String,
    #[serde(default)]
    pub reason_for_visit: String,
}

fn booking_request(patient_id: &str, body: BookAppointmentBody) -> Result<BookingRequest, ApiError> {
    let time_slot = body
        .time_slot
        .or(body.start_time)
        .ok_or_else(|| ApiError::BadRequest("timeSlot is required".to_string()))?;
    Ok(BookingRequest::parse(
        patient_id,
        &body.doctor_id,
        &body.appointment_date,
        &time_slot,
        &body.consultation_type,
        &body.reason_for_visit,
    )?)
}

pub async fn book_appointment(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<BookAppointmentBody>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    caller.require(&[Role::Patient])?;
    let request = booking_request(&caller.user_id, body)?;

    let appointment = with_db(&state, move |db| {
        Ok(BookingCoordinator::new(db).book(&request)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub message: String,
    pub appointment: Appointment,
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    caller: Caller,
    Path(appointment_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    caller.require(&[Role::Patient, Role::Doctor, Role::Admin])?;

    let appointment = with_db(&state, move |db| {
        let coordinator = BookingCoordinator::new(db);
        ensure_participant(&caller, &coordinator.get(&appointment_id)?)?;
        Ok(coordinator.cancel(&appointment_id, Some(caller.user_id.as_str()))?)
    })
    .await?;

    Ok(Json(CancelResponse {
        message: "Appointment cancelled and slot released".to_string(),
        appointment,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(appointment_id): Path<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Appointment>, ApiError> {
    caller.require(&[Role::Doctor, Role::Admin])?;

    let appointment = with_db(&state, move |db| {
        let coordinator = BookingCoordinator::new(db);
        ensure_participant(&caller, &coordinator.get(&appointment_id)?)?;
        Ok(coordinator.update_status(&appointment_id, &body.status, Some(caller.user_id.as_str()))?)
    })
    .await?;

    Ok(Json(appointment))
}

pub async fn list_patient_appointments(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    caller.require(&[Role::Patient])?;
    let appointments =
        with_db(&state, move |db| Ok(db.list_appointments_for_patient(&caller.user_id)?)).await?;
    Ok(Json(appointments))
}

pub async fn list_doctor_appointments(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    caller.require(&[Role::Doctor])?;
    let appointments =
        with_db(&state, move |db| Ok(db.list_appointments_for_doctor(&caller.user_id)?)).await?;
    Ok(Json(appointments))
}

/// Patients may only touch their own appointments, doctors only their own schedule.
fn ensure_participant(caller: &Caller, appointment: &Appointment) -> Result<(), ApiError> {
    let allowed = match caller.role {
        Role::Admin => true,
        Role::Patient => appointment.patient_id == caller.user_id,
        Role::Doctor => appointment.doctor_id == caller.user_id,
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}

// =========================================================================
// Doctors and availability
// =========================================================================

pub async fn list_doctors(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    let doctors = with_db(&state, |db| Ok(AvailabilityManager::new(db).list_doctors()?)).await?;
    Ok(Json(doctors))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Only days on or after this date
    pub from: Option<String>,
}

pub async fn get_availability(
    State(state): State<AppState>,
    _caller: Caller,
    Path(doctor_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DoctorCalendar>, ApiError> {
    let from = query.from.as_deref().map(normalize_date).transpose()?;

    let calendar = with_db(&state, move |db| {
        let manager = AvailabilityManager::new(db);
        Ok(match from {
            Some(from) => manager.calendar_from(&doctor_id, from)?,
            None => manager.calendar(&doctor_id)?,
        })
    })
    .await?;

    Ok(Json(calendar))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBody {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct AddSlotBody {
    pub date: String,
    pub slot: SlotBody,
}

pub async fn add_availability(
    State(state): State<AppState>,
    caller: Caller,
    Path(doctor_id): Path<String>,
    ApiJson(body): ApiJson<AddSlotBody>,
) -> Result<(StatusCode, Json<Slot>), ApiError> {
    caller.require_doctor_or_admin(&doctor_id)?;

    let date = normalize_date(&body.date)?;
    let range = TimeRange::parse(&body.slot.start_time, &body.slot.end_time)?;

    let slot = with_db(&state, move |db| {
        Ok(AvailabilityManager::new(db).add_slot(&doctor_id, date, range, Some(caller.user_id.as_str()))?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn remove_availability(
    State(state): State<AppState>,
    caller: Caller,
    Path((doctor_id, slot_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    caller.require_doctor_or_admin(&doctor_id)?;

    with_db(&state, move |db| {
        Ok(AvailabilityManager::new(db).remove_slot(&doctor_id, &slot_id, Some(caller.user_id.as_str()))?)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Admin
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterDoctorBody {
    pub name: String,
    pub specialization: Option<String>,
}

pub async fn register_doctor(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<RegisterDoctorBody>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    caller.require(&[Role::Admin])?;

    let doctor = with_db(&state, move |db| {
        Ok(AvailabilityManager::new(db).register_doctor(&body.name, body.specialization.as_deref())?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(doctor)))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    caller: Caller,
    Path(doctor_id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    caller.require(&[Role::Admin])?;
    let doctor = with_db(&state, move |db| Ok(AvailabilityManager::new(db).get_doctor(&doctor_id)?)).await?;
    Ok(Json(doctor))
}

#[derive(Debug, Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
}

pub async fn list_all_appointments(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    caller.require(&[Role::Admin])?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<AppointmentStatus>)
        .transpose()
        .map_err(BookingError::from)?;

    let appointments = with_db(&state, move |db| Ok(db.list_appointments(status)?)).await?;
    Ok(Json(appointments))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    caller: Caller,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    caller.require(&[Role::Admin])?;
    let appointment =
        with_db(&state, move |db| Ok(BookingCoordinator::new(db).get(&appointment_id)?)).await?;
    Ok(Json(appointment))
}

/// Staff booking on behalf of a patient; held as `pending` until confirmed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookingBody {
    pub patient_id: String,
    #[serde(flatten)]
    pub booking: BookAppointmentBody,
}

pub async fn create_pending_appointment(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<AdminBookingBody>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    caller.require(&[Role::Admin])?;
    let request = booking_request(&body.patient_id, body.booking)?;

    let appointment = with_db(&state, move |db| {
        Ok(BookingCoordinator::new(db).book_pending(&request)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

pub async fn recent_activity(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEvent>>, ApiError> {
    caller.require(&[Role::Admin])?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .min(MAX_ACTIVITY_LIMIT);

    let events = with_db(&state, move |db| Ok(db.list_recent_activity(limit)?)).await?;
    Ok(Json(events))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header::CONTENT_TYPE, Request};
    use axum::response::IntoResponse;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        state: AppState,
        doctor_id: String,
    }

    /// A migrated database with one doctor and one free slot on 2024-03-10 09:00.
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clinic.db");

        let db = Database::open(&path).unwrap();
        let manager = AvailabilityManager::new(&db);
        let doctor = manager.register_doctor("Dr. Lee", None).unwrap();
        manager
            .add_slot(
                &doctor.doctor_id,
                normalize_date("2024-03-10").unwrap(),
                TimeRange::parse("09:00", "09:30").unwrap(),
                None,
            )
            .unwrap();

        Fixture {
            _dir: dir,
            state: AppState::new(path, clinic_booking_core::db::DEFAULT_BUSY_TIMEOUT),
            doctor_id: doctor.doctor_id,
        }
    }

    fn booking_body(doctor_id: &str) -> BookAppointmentBody {
        BookAppointmentBody {
            doctor_id: doctor_id.to_string(),
            appointment_date: "2024-03-10T00:00:00.000Z".to_string(),
            time_slot: Some("09:00 - 09:30".to_string()),
            start_time: None,
            consultation_type: "in-person".to_string(),
            reason_for_visit: "Checkup".to_string(),
        }
    }

    async fn message(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_book_and_conflict() {
        let fx = fixture();

        let (status, Json(appointment)) = book_appointment(
            State(fx.state.clone()),
            Caller::new("patient-a", Role::Patient),
            ApiJson(booking_body(&fx.doctor_id)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(appointment.patient_id, "patient-a");

        let err = book_appointment(
            State(fx.state.clone()),
            Caller::new("patient-b", Role::Patient),
            ApiJson(booking_body(&fx.doctor_id)),
        )
        .await
        .unwrap_err();
        let (status, body) = message(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("already booked"));
    }

    #[tokio::test]
    async fn test_only_patients_book() {
        let fx = fixture();
        let err = book_appointment(
            State(fx.state.clone()),
            Caller::new(fx.doctor_id.clone(), Role::Doctor),
            ApiJson(booking_body(&fx.doctor_id)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cancel_flow() {
        let fx = fixture();
        let (_, Json(appointment)) = book_appointment(
            State(fx.state.clone()),
            Caller::new("patient-a", Role::Patient),
            ApiJson(booking_body(&fx.doctor_id)),
        )
        .await
        .unwrap();

        // Someone else's appointment
        let err = cancel_appointment(
            State(fx.state.clone()),
            Caller::new("patient-b", Role::Patient),
            Path(appointment.id.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let Json(response) = cancel_appointment(
            State(fx.state.clone()),
            Caller::new("patient-a", Role::Patient),
            Path(appointment.id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Appointment cancelled and slot released");
        assert_eq!(response.appointment.status.as_str(), "cancelled");

        let Json(calendar) = get_availability(
            State(fx.state.clone()),
            Caller::new("patient-b", Role::Patient),
            Path(fx.doctor_id.clone()),
            Query(AvailabilityQuery { from: None }),
        )
        .await
        .unwrap();
        assert_eq!(calendar.free_slot_count(), 1);

        let err = cancel_appointment(
            State(fx.state.clone()),
            Caller::new("patient-a", Role::Patient),
            Path(appointment.id.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_status_update_validation() {
        let fx = fixture();
        let (_, Json(appointment)) = book_appointment(
            State(fx.state.clone()),
            Caller::new("patient-a", Role::Patient),
            ApiJson(booking_body(&fx.doctor_id)),
        )
        .await
        .unwrap();
        let doctor = Caller::new(fx.doctor_id.clone(), Role::Doctor);

        let err = update_appointment_status(
            State(fx.state.clone()),
            doctor.clone(),
            Path(appointment.id.clone()),
            ApiJson(StatusBody { status: "bogus".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(updated) = update_appointment_status(
            State(fx.state.clone()),
            doctor.clone(),
            Path(appointment.id.clone()),
            ApiJson(StatusBody { status: "completed".into() }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status.as_str(), "completed");

        let Json(mine) = list_doctor_appointments(State(fx.state.clone()), doctor)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_appointment_is_404() {
        let fx = fixture();
        let err = cancel_appointment(
            State(fx.state.clone()),
            Caller::new("admin", Role::Admin),
            Path("nope".into()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_availability_writes() {
        let fx = fixture();
        let doctor = Caller::new(fx.doctor_id.clone(), Role::Doctor);

        let err = add_availability(
            State(fx.state.clone()),
            Caller::new("other-doctor", Role::Doctor),
            Path(fx.doctor_id.clone()),
            ApiJson(AddSlotBody {
                date: "2024-03-10".into(),
                slot: SlotBody { start_time: "10:00".into(), end_time: "10:30".into() },
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = add_availability(
            State(fx.state.clone()),
            doctor.clone(),
            Path(fx.doctor_id.clone()),
            ApiJson(AddSlotBody {
                date: "2024-03-10".into(),
                slot: SlotBody { start_time: "09:15".into(), end_time: "09:45".into() },
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let (status, Json(slot)) = add_availability(
            State(fx.state.clone()),
            doctor.clone(),
            Path(fx.doctor_id.clone()),
            ApiJson(AddSlotBody {
                date: "2024-03-10".into(),
                slot: SlotBody { start_time: "10:00".into(), end_time: "10:30".into() },
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let status = remove_availability(
            State(fx.state.clone()),
            doctor,
            Path((fx.doctor_id.clone(), slot.slot_id)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(events) = recent_activity(
            State(fx.state.clone()),
            Caller::new("root", Role::Admin),
            Query(ActivityQuery { limit: Some(2) }),
        )
        .await
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].metadata["op"], "remove");
    }

    async fn extract_json<T: serde::de::DeserializeOwned>(body: &'static str) -> Result<T, ApiError> {
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let ApiJson(value) = ApiJson::<T>::from_request(request, &()).await?;
        Ok(value)
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = extract_json::<BookAppointmentBody>(
            r#"{"appointmentDate":"2024-03-10","timeSlot":"09:00 - 09:30"}"#,
        )
        .await
        .unwrap_err();
        let (status, body) = message(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("doctorId"));

        let err = extract_json::<StatusBody>("{not json").await.unwrap_err();
        let (status, body) = message(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let parsed = extract_json::<StatusBody>(r#"{"status":"completed"}"#).await.unwrap();
        assert_eq!(parsed.status, "completed");
    }

    #[tokio::test]
    async fn test_admin_manages_doctors() {
        let fx = fixture();
        let admin = Caller::new("root", Role::Admin);

        let err = register_doctor(
            State(fx.state.clone()),
            Caller::new(fx.doctor_id.clone(), Role::Doctor),
            ApiJson(RegisterDoctorBody { name: "Dr. Abara".into(), specialization: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let (status, Json(doctor)) = register_doctor(
            State(fx.state.clone()),
            admin.clone(),
            ApiJson(RegisterDoctorBody {
                name: "Dr. Abara".into(),
                specialization: Some("dermatology".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(fetched) = get_doctor(State(fx.state.clone()), admin.clone(), Path(doctor.doctor_id.clone()))
            .await
            .unwrap();
        assert_eq!(fetched, doctor);

        let err = get_doctor(State(fx.state.clone()), admin.clone(), Path("ghost".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = register_doctor(
            State(fx.state.clone()),
            admin,
            ApiJson(RegisterDoctorBody { name: " ".into(), specialization: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(doctors) = list_doctors(State(fx.state.clone()), Caller::new("p", Role::Patient))
            .await
            .unwrap();
        assert_eq!(doctors.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_manages_appointments() {
        let fx = fixture();
        let admin = Caller::new("root", Role::Admin);
        let body = AdminBookingBody {
            patient_id: "patient-a".into(),
            booking: booking_body(&fx.doctor_id),
        };

        let err = create_pending_appointment(
            State(fx.state.clone()),
            Caller::new("patient-a", Role::Patient),
            ApiJson(AdminBookingBody {
                patient_id: "patient-a".into(),
                booking: booking_body(&fx.doctor_id),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let (status, Json(pending)) =
            create_pending_appointment(State(fx.state.clone()), admin.clone(), ApiJson(body))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(pending.status, AppointmentStatus::Pending);
        assert_eq!(pending.patient_id, "patient-a");

        // The pending appointment holds the slot
        let err = book_appointment(
            State(fx.state.clone()),
            Caller::new("patient-b", Role::Patient),
            ApiJson(booking_body(&fx.doctor_id)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let Json(fetched) = get_appointment(State(fx.state.clone()), admin.clone(), Path(pending.id.clone()))
            .await
            .unwrap();
        assert_eq!(fetched, pending);

        let Json(all) = list_all_appointments(
            State(fx.state.clone()),
            admin.clone(),
            Query(AppointmentsQuery { status: None }),
        )
        .await
        .unwrap();
        assert_eq!(all.len(), 1);

        let Json(confirmed) = list_all_appointments(
            State(fx.state.clone()),
            admin.clone(),
            Query(AppointmentsQuery { status: Some("confirmed".into()) }),
        )
        .await
        .unwrap();
        assert!(confirmed.is_empty());

        let err = list_all_appointments(
            State(fx.state.clone()),
            admin.clone(),
            Query(AppointmentsQuery { status: Some("bogus".into()) }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = get_appointment(State(fx.state.clone()), admin, Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_admin_booking_body_flattens() {
        let body: AdminBookingBody = serde_json::from_str(
            r#"{"patientId":"p1","doctorId":"d1","appointmentDate":"2024-03-10","startTime":"09:00"}"#,
        )
        .unwrap();
        assert_eq!(body.patient_id, "p1");
        assert_eq!(body.booking.doctor_id, "d1");
        assert_eq!(body.booking.start_time.as_deref(), Some("09:00"));
        assert_eq!(body.booking.consultation_type, "");
    }
}
