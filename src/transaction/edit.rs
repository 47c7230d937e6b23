//! The edit transaction page and the endpoint that saves the changes.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::html;

use crate::{
    Error,
    auth::UserID,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    period::Period,
    timezone::get_local_today,
    transaction::{
        TransactionId,
        create::CreateTransactionState,
        form::{FormAction, TransactionForm, load_options, transaction_form_view},
        get_transaction,
        list::transactions_url,
        update_transaction,
    },
};

/// Renders the page for editing one of the user's transactions.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let (transaction, categories, accounts) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction = get_transaction(user_id, transaction_id, &connection)?;
        let (categories, accounts) = load_options(user_id, &connection)?;

        (transaction, categories, accounts)
    };

    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let form = transaction_form_view(
        FormAction::Edit(transaction_id),
        Some(&transaction),
        today,
        &categories,
        &accounts,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Transaction" }
            (form)
        }
    };

    Ok(base("Edit Transaction", &[dollar_input_styles()], &content).into_response())
}

/// A route handler for saving changes to a transaction.
///
/// Redirects to the month the transaction now falls in. Monthly payments are
/// not matched again, tracking records keep the transaction they were paid by.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
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

    match update_transaction(user_id, transaction_id, builder, &connection) {
        Ok(transaction) => (
            HxRedirect(transactions_url(Period::from_date(transaction.date), None)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::NonPositiveAmount(_)
            | Error::InvalidCategory(_)
            | Error::InvalidAccount(_)
            | Error::UpdateMissingTransaction),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating transaction {transaction_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
