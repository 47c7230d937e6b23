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
    budget::{BudgetId, delete_budget},
};

/// The state needed for deleting a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn delete_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<DeleteBudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(user_id, budget_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Budget deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        budget::{get_budgets_with_spending, upsert_budget},
        category::CategoryKind,
        test_utils::{
            assert_alert_message, get_test_db_connection, insert_test_category, insert_test_user,
            parse_html_fragment,
        },
    };

    use super::{DeleteBudgetState, delete_budget_endpoint};

    #[tokio::test]
    async fn deletes_budget() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let category_id =
            insert_test_category(user_id, "Groceries", CategoryKind::Expense, &connection);
        let period = "2025-03".parse().unwrap();
        let budget = upsert_budget(user_id, category_id, period, 50.0, &connection).unwrap();
        let state = DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_budget_endpoint(Path(budget.id), State(state.clone()), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_alert_message(&html, "Budget deleted successfully");
        let budgets =
            get_budgets_with_spending(user_id, period, &state.db_connection.lock().unwrap())
                .unwrap();
        assert!(budgets.is_empty());
    }

    #[tokio::test]
    async fn missing_budget_returns_not_found() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let state = DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_budget_endpoint(Path(9), State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_alert_message(&html, "Could not delete budget");
    }
}
