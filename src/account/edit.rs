//! Account editing page and endpoint.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;

use crate::{
    Error,
    account::{AccountId, get_account, update_account},
    auth::UserID,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
};

use super::create::{AccountFormData, CreateAccountState, account_form_view};

/// Render the page for editing one of the user's accounts.
pub async fn get_edit_account_page(
    Path(account_id): Path<AccountId>,
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let account = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_account(user_id, account_id, &connection)?
    };

    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Account" }
            (account_form_view(Some(&account)))
        }
    };

    Ok(base("Edit Account", &[dollar_input_styles()], &content).into_response())
}

/// Handle the form for editing an account.
pub async fn update_account_endpoint(
    Path(account_id): Path<AccountId>,
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

    match update_account(
        user_id,
        account_id,
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
        Err(
            error @ (Error::EmptyAccountName
            | Error::DuplicateAccountName(_)
            | Error::UpdateMissingAccount),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod update_account_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        account::{AccountKind, create_account, get_account},
        endpoints,
        test_utils::{
            assert_alert_message, assert_hx_redirect, get_test_db_connection, insert_test_user,
            parse_html_fragment,
        },
    };

    use super::{AccountFormData, CreateAccountState, update_account_endpoint};

    #[tokio::test]
    async fn can_update_account() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account =
            create_account(user_id, "Wallet", AccountKind::Cash, 0.0, &connection).unwrap();
        let state = CreateAccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = AccountFormData {
            name: "Savings Jar".to_owned(),
            kind: AccountKind::Savings,
            initial_balance: 40.0,
        };

        let response = update_account_endpoint(
            Path(account.id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);
        let updated = get_account(user_id, account.id, &state.db_connection.lock().unwrap())
            .unwrap();
        assert_eq!(updated.name, "Savings Jar");
        assert_eq!(updated.kind, AccountKind::Savings);
        assert_eq!(updated.initial_balance, 40.0);
    }

    #[tokio::test]
    async fn missing_account_returns_alert() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let state = CreateAccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = AccountFormData {
            name: "Wallet".to_owned(),
            kind: AccountKind::Cash,
            initial_balance: 0.0,
        };

        let response =
            update_account_endpoint(Path(12), State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_alert_message(&html, "Could not update account");
    }
}
