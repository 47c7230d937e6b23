//! Marking a monthly payment as paid or unpaid by hand.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    monthly_payment::{MonthlyPaymentId, TrackingUpdate, get_monthly_payment, upsert_tracking_record},
    period::PeriodQuery,
    timezone::get_local_today,
};

/// The state needed to toggle whether a payment has been paid.
#[derive(Debug, Clone)]
pub struct TogglePaymentState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TogglePaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Mark a payment as paid today for the period in the query string.
pub async fn mark_payment_paid(
    Path(payment_id): Path<MonthlyPaymentId>,
    State(state): State<TogglePaymentState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    set_paid(payment_id, state, user_id, query, true)
}

/// Clear the paid status of a payment for the period in the query string.
pub async fn mark_payment_unpaid(
    Path(payment_id): Path<MonthlyPaymentId>,
    State(state): State<TogglePaymentState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    set_paid(payment_id, state, user_id, query, false)
}

fn set_paid(
    payment_id: MonthlyPaymentId,
    state: TogglePaymentState,
    user_id: UserID,
    query: PeriodQuery,
    paid: bool,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let period = match query.period_or_current(today) {
        Ok(period) => period,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = get_monthly_payment(user_id, payment_id, &connection) {
        return error.into_alert_response();
    }

    let update = if paid {
        TrackingUpdate::paid_manually(today)
    } else {
        TrackingUpdate::unpaid()
    };

    match upsert_tracking_record(payment_id, period, update, &connection) {
        Ok(_) => (
            HxRedirect(format!("{}?period={period}", endpoints::MONTHLY_PAYMENTS_VIEW)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update payment {payment_id} for {period}: {error}");
            error.into_alert_response()
        }
    }
}
