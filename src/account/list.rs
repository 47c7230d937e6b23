//! The page listing a user's accounts and their balances.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{AccountBalance, get_account_balances},
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency, link,
    },
    navigation::NavBar,
};

/// The state needed for the accounts page.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's accounts with their current balances.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_account_balances(user_id, &connection)?
    };

    Ok(accounts_view(&accounts).into_response())
}

fn accounts_view(accounts: &[AccountBalance]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let total: f64 = accounts.iter().map(|row| row.balance).sum();

    let table_row = |row: &AccountBalance| {
        let account = &row.account;
        let edit_url = format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id);
        let delete_url = format_endpoint(endpoints::ACCOUNT, account.id);
        let confirm_message = format!(
            "Are you sure you want to delete the account '{}'?",
            account.name
        );

        html! {
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) { (account.kind.label()) }
                }

                td class="px-6 py-4 text-right" data-balance { (format_currency(row.balance)) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex items-center gap-4"
                    {
                        (edit_delete_action_links(&edit_url, &delete_url, &confirm_message, "closest tr"))
                    }
                }
            }
        }
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "Add Account" }
                }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class="px-6 py-3 text-right" { "Balance" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in accounts {
                            (table_row(row))
                        }

                        @if accounts.is_empty() {
                            tr
                            {
                                td colspan="4" class="px-6 py-4 text-center"
                                {
                                    "No accounts yet. Add an account "
                                    (link(endpoints::NEW_ACCOUNT_VIEW, "here"))
                                    "."
                                }
                            }
                        }
                    }

                    tfoot
                    {
                        tr class="font-semibold text-gray-900 dark:text-white"
                        {
                            th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total" }
                            td class="px-6 py-4 text-right" data-total { (format_currency(total)) }
                            td {}
                        }
                    }
                }
            }
        }
    };

    base("Accounts", &[], &content)
}
