use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use futures::future::join_all;
use uuid::Uuid;

use appointment_cell::handlers::*;
use appointment_cell::models::*;
use appointment_cell::{AppointmentState, AppointmentStore};
use auth_cell::{UserAccount, UserDirectory};
use provider_cell::{Provider, ProviderDirectory, ProviderService, ServiceType, WorkingHours};
use shared_models::{auth::User, error::AppError};
use shared_utils::extractor::JsonBody;
use shared_utils::test_utils::{TestConfig, TestUser};

const DATE: &str = "2025-03-01";

fn create_test_state() -> AppointmentState {
    AppointmentState::from_config(TestConfig::default().to_arc())
}

fn create_strict_state() -> AppointmentState {
    AppointmentState::from_config(TestConfig::strict().to_arc())
}

async fn seed_provider(state: &AppointmentState) -> Provider {
    ProviderService::new(state.providers.clone())
        .seed_default()
        .await
        .unwrap()
        .provider
}

fn book_request(provider_id: Uuid, time: &str, service: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        provider_id: Some(provider_id.to_string()),
        date: Some(DATE.to_string()),
        time: Some(time.to_string()),
        service_type: Some(service.to_string()),
    }
}

async fn book(state: &AppointmentState, user: &User, request: BookAppointmentRequest) -> Result<Appointment, AppError> {
    let (status, Json(body)) = book_appointment(
        State(state.clone()),
        Extension(user.clone()),
        JsonBody(request),
    ).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(serde_json::from_value(body).unwrap())
}

async fn availability(state: &AppointmentState, provider_id: &str, service: &str) -> Result<Vec<String>, AppError> {
    let Json(response) = get_availability(
        State(state.clone()),
        Query(AvailabilityQuery {
            provider_id: Some(provider_id.to_string()),
            date: Some(DATE.to_string()),
            service_type: Some(service.to_string()),
        }),
    ).await?;
    Ok(response.available_slots)
}

async fn cancel(state: &AppointmentState, user: &User, appointment_id: &str) -> Result<Appointment, AppError> {
    let Json(body) = cancel_appointment(
        State(state.clone()),
        Extension(user.clone()),
        Path(appointment_id.to_string()),
    ).await?;
    Ok(serde_json::from_value(body).unwrap())
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[tokio::test]
async fn test_availability_full_grid() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;

    let slots = availability(&state, &provider.id.to_string(), "Consultation").await.unwrap();
    assert_eq!(slots.len(), 16);
    assert_eq!(slots.first().map(String::as_str), Some("09:00"));
    assert_eq!(slots.last().map(String::as_str), Some("16:30"));

    let visits = availability(&state, &provider.id.to_string(), "Site Visit").await.unwrap();
    assert_eq!(visits.len(), 8);
}

#[tokio::test]
async fn test_availability_excludes_confirmed_only() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;
    let user = TestUser::user("grower@example.com").to_user();

    book(&state, &user, book_request(provider.id, "10:00", "Consultation")).await.unwrap();
    let cancelled = book(&state, &user, book_request(provider.id, "11:00", "Consultation")).await.unwrap();
    cancel(&state, &user, &cancelled.id.to_string()).await.unwrap();

    let slots = availability(&state, &provider.id.to_string(), "Consultation").await.unwrap();
    assert_eq!(slots.len(), 15);
    assert!(!slots.contains(&"10:00".to_string()));
    assert!(slots.contains(&"11:00".to_string()));

    let mut sorted = slots.clone();
    sorted.sort();
    assert_eq!(slots, sorted);
}

#[tokio::test]
async fn test_availability_errors() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;

    let result = availability(&state, &Uuid::new_v4().to_string(), "Consultation").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = availability(&state, "not-a-uuid", "Consultation").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = availability(&state, &provider.id.to_string(), "Harvest").await;
    match result.unwrap_err() {
        AppError::BadRequest(msg) => assert_eq!(msg, "Service type not found for this provider"),
        other => panic!("Expected BadRequest, got {:?}", other),
    }

    let result = get_availability(
        State(state.clone()),
        Query(AvailabilityQuery { provider_id: Some(provider.id.to_string()), ..Default::default() }),
    ).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = get_availability(
        State(state.clone()),
        Query(AvailabilityQuery {
            provider_id: Some(provider.id.to_string()),
            date: Some("   ".to_string()),
            service_type: Some("Consultation".to_string()),
        }),
    ).await;
    match result.unwrap_err() {
        AppError::BadRequest(msg) => assert_eq!(msg, "providerId, date, serviceType required"),
        other => panic!("Expected BadRequest, got {:?}", other),
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn test_double_booking_conflicts() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;

    let first = book(&state, &TestUser::user("a@example.com").to_user(), book_request(provider.id, "09:30", "Consultation"))
        .await
        .unwrap();
    assert_eq!(first.status, AppointmentStatus::Confirmed);

    let second = book(&state, &TestUser::user("b@example.com").to_user(), book_request(provider.id, "09:30", "Consultation")).await;
    match second.unwrap_err() {
        AppError::Conflict(msg) => assert_eq!(msg, "Slot already booked"),
        other => panic!("Expected Conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_booking_confirms_exactly_one() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;

    let handles = (0..16).map(|i| {
        let state = state.clone();
        let user = TestUser::user(&format!("user{}@example.com", i)).to_user();
        let request = book_request(provider.id, "13:00", "Consultation");
        tokio::spawn(async move { state.booking().book(request, &user).await })
    });

    let results = join_all(handles).await;
    let confirmed = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(AppointmentError::SlotUnavailable))))
        .count();

    assert_eq!(confirmed, 1);
    assert_eq!(conflicts, 15);

    let booked = state.store.confirmed_for(provider.id, DATE).await.unwrap();
    assert_eq!(booked.len(), 1);
}

#[tokio::test]
async fn test_lenient_booking_accepts_unchecked_values() {
    let state = create_test_state();
    let user = TestUser::default().to_user();

    let appointment = book(&state, &user, BookAppointmentRequest {
        provider_id: Some(Uuid::new_v4().to_string()),
        date: Some("someday".to_string()),
        time: Some("09:07".to_string()),
        service_type: Some("Anything".to_string()),
    }).await.unwrap();

    assert_eq!(appointment.time, "09:07");
    assert_eq!(appointment.user_id.to_string(), user.id);
}

#[tokio::test]
async fn test_booking_missing_fields() {
    let state = create_test_state();
    let result = book(&state, &TestUser::default().to_user(), BookAppointmentRequest {
        provider_id: Some(Uuid::new_v4().to_string()),
        ..Default::default()
    }).await;

    match result.unwrap_err() {
        AppError::BadRequest(msg) => assert_eq!(msg, "providerId, date, time, serviceType required"),
        other => panic!("Expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_strict_booking_validation() {
    let state = create_strict_state();
    let provider = seed_provider(&state).await;
    let user = TestUser::default().to_user();

    let off_grid = book(&state, &user, book_request(provider.id, "09:15", "Consultation")).await;
    assert!(matches!(off_grid, Err(AppError::BadRequest(_))));

    // 09:30 is on the 30 minute grid but not the 60 minute one.
    let wrong_duration = book(&state, &user, book_request(provider.id, "09:30", "Site Visit")).await;
    assert!(matches!(wrong_duration, Err(AppError::BadRequest(_))));

    let unknown_service = book(&state, &user, book_request(provider.id, "09:00", "Harvest")).await;
    assert!(matches!(unknown_service, Err(AppError::BadRequest(_))));

    let unknown_provider = book(&state, &user, book_request(Uuid::new_v4(), "09:00", "Consultation")).await;
    assert!(matches!(unknown_provider, Err(AppError::NotFound(_))));

    let bad_date = book(&state, &user, BookAppointmentRequest {
        date: Some("2025-02-30".to_string()),
        ..book_request(provider.id, "09:00", "Consultation")
    }).await;
    assert!(matches!(bad_date, Err(AppError::BadRequest(_))));

    assert!(book(&state, &user, book_request(provider.id, "10:00", "Site Visit")).await.is_ok());
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

#[tokio::test]
async fn test_cancel_rules() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;
    let owner = TestUser::user("owner@example.com").to_user();
    let stranger = TestUser::user("stranger@example.com").to_user();

    let appointment = book(&state, &owner, book_request(provider.id, "15:00", "Consultation")).await.unwrap();
    let id = appointment.id.to_string();

    let result = cancel(&state, &stranger, &id).await;
    match result.unwrap_err() {
        AppError::Forbidden(msg) => assert_eq!(msg, "Not allowed to cancel this appointment"),
        other => panic!("Expected Forbidden, got {:?}", other),
    }

    let cancelled = cancel(&state, &owner, &id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let again = cancel(&state, &owner, &id).await.unwrap();
    assert_eq!(again.status, AppointmentStatus::Cancelled);

    assert!(matches!(cancel(&state, &owner, &Uuid::new_v4().to_string()).await, Err(AppError::NotFound(_))));
    assert!(matches!(cancel(&state, &owner, "garbage").await, Err(AppError::NotFound(_))));

    // The freed slot can be booked again.
    assert!(book(&state, &stranger, book_request(provider.id, "15:00", "Consultation")).await.is_ok());
}

#[tokio::test]
async fn test_admin_can_cancel_any() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;
    let owner = TestUser::user("owner@example.com").to_user();
    let admin = TestUser::admin("admin@example.com").to_user();

    let appointment = book(&state, &owner, book_request(provider.id, "09:00", "Consultation")).await.unwrap();
    let cancelled = cancel(&state, &admin, &appointment.id.to_string()).await.unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.user_id, appointment.user_id);
}

// ==============================================================================
// LISTINGS
// ==============================================================================

#[tokio::test]
async fn test_my_appointments_sorted_with_provider() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;
    let me = TestUser::user("me@example.com").to_user();
    let other = TestUser::user("other@example.com").to_user();

    book(&state, &me, BookAppointmentRequest {
        date: Some("2025-03-02".to_string()),
        ..book_request(provider.id, "09:00", "Consultation")
    }).await.unwrap();
    book(&state, &me, book_request(provider.id, "14:00", "Consultation")).await.unwrap();
    book(&state, &me, book_request(provider.id, "10:00", "Consultation")).await.unwrap();
    book(&state, &other, book_request(provider.id, "11:00", "Consultation")).await.unwrap();

    let Json(body) = get_my_appointments(State(state.clone()), Extension(me)).await.unwrap();
    let items = body.as_array().unwrap();

    let order: Vec<(&str, &str)> = items
        .iter()
        .map(|a| (a["date"].as_str().unwrap(), a["time"].as_str().unwrap()))
        .collect();
    assert_eq!(order, vec![(DATE, "10:00"), (DATE, "14:00"), ("2025-03-02", "09:00")]);
    assert_eq!(items[0]["provider"]["name"], provider.name);
    assert_eq!(items[0]["provider"]["id"], provider.id.to_string());
}

#[tokio::test]
async fn test_dangling_provider_is_null() {
    let state = create_test_state();
    let me = TestUser::default().to_user();

    book(&state, &me, book_request(Uuid::new_v4(), "09:00", "Consultation")).await.unwrap();

    let Json(body) = get_my_appointments(State(state), Extension(me)).await.unwrap();
    assert!(body[0]["provider"].is_null());
}

#[tokio::test]
async fn test_admin_list_filters_and_enriches() {
    let state = create_test_state();
    let provider = seed_provider(&state).await;
    let second = state.providers.insert_provider(Provider {
        id: Uuid::new_v4(),
        name: "North Plot".to_string(),
        default_working_hours: WorkingHours::default(),
        service_types: vec![ServiceType { name: "Consultation".to_string(), duration_minutes: 30 }],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }).await.unwrap();

    let grower = TestUser::user("grower@example.com");
    state.users.insert(UserAccount {
        id: grower.uuid(),
        name: "Grower".to_string(),
        email: grower.email.clone(),
        role: "user".to_string(),
        password_hash: "unused".to_string(),
        created_at: Utc::now(),
    }).await.unwrap();
    let grower = grower.to_user();

    book(&state, &grower, book_request(provider.id, "16:00", "Consultation")).await.unwrap();
    book(&state, &grower, book_request(second.id, "09:00", "Consultation")).await.unwrap();
    book(&state, &TestUser::default().to_user(), BookAppointmentRequest {
        date: Some("2025-04-01".to_string()),
        ..book_request(provider.id, "09:00", "Consultation")
    }).await.unwrap();

    let admin = Extension(TestUser::admin("admin@example.com").to_user());

    let Json(all) = list_all_appointments(State(state.clone()), admin.clone(), Query(AdminListQuery::default()))
        .await
        .unwrap();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["provider"]["name"], "North Plot");
    assert_eq!(all[0]["user"]["email"], "grower@example.com");
    assert_eq!(all[1]["time"], "16:00");
    assert!(all[2]["user"].is_null());

    let Json(filtered) = list_all_appointments(State(state.clone()), admin, Query(AdminListQuery {
        provider_id: Some(provider.id.to_string()),
        date: Some(DATE.to_string()),
    })).await.unwrap();
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["time"], "16:00");
}

#[tokio::test]
async fn test_admin_list_requires_admin() {
    let state = create_test_state();
    let result = list_all_appointments(
        State(state),
        Extension(TestUser::user("user@example.com").to_user()),
        Query(AdminListQuery::default()),
    ).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
