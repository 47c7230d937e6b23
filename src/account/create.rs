//! Account creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{Account, AccountKind, create_account},
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
};

/// The state needed for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountFormData {
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: f64,
}

/// Render the account creation page.
pub async fn get_new_account_page() -> Response {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (account_form_view(None)) }
    };

    base("Add Account", &[dollar_input_styles()], &content).into_response()
}

/// Handle account creation form submission.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AccountFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(
        user_id,
        &form.name,
        form.kind,
        form.initial_balance,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyAccountName | Error::DuplicateAccountName(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an account: {error}");
            error.into_alert_response()
        }
    }
}

/// The form for adding an account, or for editing `account` when given.
pub(super) fn account_form_view(account: Option<&Account>) -> Markup {
    let name = account.map(|account| account.name.as_str());
    let selected_kind = account.map(|account| account.kind);
    let initial_balance = account.map_or(0.0, |account| account.initial_balance);

    let form_body = html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Account Name" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Everyday"
                value=[name]
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

            select id="kind" name="kind" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for kind in AccountKind::ALL {
                    option value=(kind.as_str()) selected[selected_kind == Some(kind)]
                    {
                        (kind.label())
                    }
                }
            }
        }

        div
        {
            label for="initial_balance" class=(FORM_LABEL_STYLE) { "Starting Balance" }

            div class="input-wrapper"
            {
                input
                    id="initial_balance"
                    type="number"
                    name="initial_balance"
                    step="0.01"
                    value=(initial_balance)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    match account {
        None => html! {
            form
                hx-post=(endpoints::ACCOUNTS_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Account" }
            }
        },
        Some(account) => html! {
            form
                hx-put=(format_endpoint(endpoints::ACCOUNT, account.id))
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
            }
        },
    }
}
