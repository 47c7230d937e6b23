//! The new transaction page and the endpoint that records a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles, link},
    monthly_payment::reconcile_transaction_best_effort,
    navigation::NavBar,
    period::Period,
    timezone::get_local_today,
    transaction::{
        create_transaction,
        form::{FormAction, TransactionForm, load_options, transaction_form_view},
        list::transactions_url,
    },
};

/// The state needed to show the form and create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let (categories, accounts) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_options(user_id, &connection)?
    };

    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            @if accounts.is_empty() {
                p
                {
                    "You need an account before you can record transactions. Add one "
                    (link(endpoints::NEW_ACCOUNT_VIEW, "here"))
                    "."
                }
            } @else {
                (transaction_form_view(FormAction::Create, None, today, &categories, &accounts))
            }
        }
    };

    Ok(base("New Transaction", &[dollar_input_styles()], &content).into_response())
}

/// A route handler for creating a new transaction, redirects to the transactions view on success.
///
/// New expenses are matched against the user's monthly payments after they are saved.
/// When one is marked paid, the redirect goes to the month of the transaction and names
/// the payment so the page can say so.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let builder = match form.into_builder(today) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let transaction = match create_transaction(user_id, builder, &connection) {
        Ok(transaction) => transaction,
        Err(
            error @ (Error::NonPositiveAmount(_)
            | Error::InvalidCategory(_)
            | Error::InvalidAccount(_)),
        ) => return error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a transaction: {error}");
            return error.into_alert_response();
        }
    };

    let redirect_url = match reconcile_transaction_best_effort(&transaction, &connection) {
        Some(result) => transactions_url(
            Period::from_date(transaction.date),
            Some(result.payment_id),
        ),
        None => endpoints::TRANSACTIONS_VIEW.to_owned(),
    };

    (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
}


#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        category::CategoryKind,
        endpoints,
        monthly_payment::{
            DayOfMonth, MonthlyPaymentBuilder, create_monthly_payment, get_tracking_records,
        },
        period::Period,
        test_utils::{
            assert_alert_message, assert_hx_redirect, get_test_db_connection,
            insert_test_account, insert_test_category, insert_test_user, parse_html_fragment,
        },
        transaction::{TransactionFilter, TransactionKind, get_transactions},
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    #[tokio::test]
    async fn can_create_transaction() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let state = CreateTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = TransactionForm {
            kind: TransactionKind::Expense,
            amount: 12.3,
            date: date!(2025 - 03 - 07),
            description: "test transaction".to_owned(),
            category_id: None,
            account_id,
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let rows = get_transactions(
            user_id,
            &TransactionFilter::for_period(Period::from_date(date!(2025 - 03 - 01))),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction.amount, 12.3);
        assert_eq!(rows[0].transaction.description, "test transaction");
    }

    #[tokio::test]
    async fn marks_matching_monthly_payment_paid() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let rent = insert_test_category(user_id, "Rent", CategoryKind::Expense, &connection);
        let payment = create_monthly_payment(
            user_id,
            MonthlyPaymentBuilder::new("Rent", 100.0, DayOfMonth::new(5).unwrap())
                .unwrap()
                .category_id(Some(rent)),
            &connection,
        )
        .unwrap();
        let state = CreateTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = TransactionForm {
            kind: TransactionKind::Expense,
            amount: 100.0,
            date: date!(2025 - 03 - 07),
            description: "Rent".to_owned(),
            category_id: Some(rent),
            account_id,
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format!("/transactions?period=2025-03&reconciled={}", payment.id),
        );
        let records = get_tracking_records(
            Period::from_date(date!(2025 - 03 - 07)),
            &[payment.id],
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].paid);
        assert_eq!(records[0].paid_date, Some(date!(2025 - 03 - 07)));
        assert!(records[0].transaction_id.is_some());
    }

    #[tokio::test]
    async fn rejects_future_date() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let state = CreateTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(2);
        let form = TransactionForm {
            kind: TransactionKind::Income,
            amount: 1.0,
            date: tomorrow,
            description: String::new(),
            category_id: None,
            account_id,
        };

        let response =
            create_transaction_endpoint(State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_alert_message(&html, "Invalid transaction date");
    }

    #[tokio::test]
    async fn rejects_zero_amount() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let state = CreateTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = TransactionForm {
            kind: TransactionKind::Expense,
            amount: 0.0,
            date: date!(2025 - 01 - 01),
            description: String::new(),
            category_id: None,
            account_id,
        };

        let response =
            create_transaction_endpoint(State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_alert_message(&html, "Invalid amount");
    }
}
