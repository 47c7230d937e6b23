use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    monthly_payment::{MonthlyPaymentId, Removal, delete_or_deactivate_monthly_payment},
};

/// The state needed to delete a monthly payment.
#[derive(Debug, Clone)]
pub struct DeleteMonthlyPaymentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteMonthlyPaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a monthly payment, keeping it as inactive when it has payment history.
pub async fn delete_monthly_payment_endpoint(
    Path(payment_id): Path<MonthlyPaymentId>,
    State(state): State<DeleteMonthlyPaymentState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_or_deactivate_monthly_payment(user_id, payment_id, &connection) {
        Ok(Removal::Deleted) => Alert::SuccessSimple {
            message: "Monthly payment deleted".to_owned(),
        }
        .into_response(),
        Ok(Removal::Deactivated) => Alert::Success {
            message: "Monthly payment deactivated".to_owned(),
            details: "It has payment history, so it was kept as an inactive payment.".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete monthly payment {payment_id}: {error}");
            error.into_alert_response()
        }
    }
}
