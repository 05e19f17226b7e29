use axum::{
    Router,
    routing::{get, post, patch},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: AppointmentState) -> Router {
    let public_routes = Router::new()
        .route("/availability", get(handlers::get_availability));

    let protected_routes = Router::new()
        .route("/book", post(handlers::book_appointment))
        .route("/my", get(handlers::get_my_appointments))
        .route("/admin/list", get(handlers::list_all_appointments)) // Admin only
        .route("/cancel/{appointment_id}", patch(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
