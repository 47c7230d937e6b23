//! The page listing a user's transactions for a month.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// axum_extra's Query treats the empty values of an unset filter as None.
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_accounts},
    auth::UserID,
    category::{Category, CategoryId, get_categories},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, period_nav,
    },
    monthly_payment::{MonthlyPayment, MonthlyPaymentId, get_monthly_payment},
    navigation::NavBar,
    period::{Period, PeriodQuery},
    timezone::get_local_today,
    transaction::{TransactionFilter, TransactionKind, TransactionRow, get_transactions},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// The month to show as YYYY-MM, defaults to the current month.
    pub period: Option<String>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
    pub search: Option<String>,
    /// A monthly payment that was just marked paid by a new transaction.
    pub reconciled: Option<MonthlyPaymentId>,
}

impl TransactionsQuery {
    fn filter(&self, today: Date) -> Result<TransactionFilter, Error> {
        let period = PeriodQuery {
            period: self.period.clone(),
        }
        .period_or_current(today)?;

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_owned);

        Ok(TransactionFilter {
            period,
            kind: self.kind,
            category_id: self.category_id,
            account_id: self.account_id,
            search,
        })
    }
}

/// The transactions page for `period`, optionally naming a monthly payment that was just paid.
pub(crate) fn transactions_url(period: Period, reconciled: Option<MonthlyPaymentId>) -> String {
    match reconciled {
        Some(payment_id) => format!(
            "{}?period={period}&reconciled={payment_id}",
            endpoints::TRANSACTIONS_VIEW
        ),
        None => format!("{}?period={period}", endpoints::TRANSACTIONS_VIEW),
    }
}

struct PageData {
    rows: Vec<TransactionRow>,
    categories: Vec<Category>,
    accounts: Vec<Account>,
    reconciled: Option<MonthlyPayment>,
}

/// Render the user's transactions for the requested month, defaulting to the current one.
///
/// The list can be narrowed by kind, category, account and a search of the descriptions.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let filter = query.filter(today)?;

    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let reconciled = match query.reconciled {
            Some(payment_id) => match get_monthly_payment(user_id, payment_id, &connection) {
                Ok(payment) => Some(payment),
                Err(Error::NotFound) => None,
                Err(error) => return Err(error),
            },
            None => None,
        };

        PageData {
            rows: get_transactions(user_id, &filter, &connection)?,
            categories: get_categories(user_id, &connection)?,
            accounts: get_accounts(user_id, &connection)?,
            reconciled,
        }
    };

    Ok(transactions_view(&filter, &data).into_response())
}

fn filter_form(filter: &TransactionFilter, categories: &[Category], accounts: &[Account]) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid grid-cols-2 md:grid-cols-5 gap-4 items-end"
            aria-label="Filter transactions"
        {
            input type="hidden" name="period" value=(filter.period);

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

                select id="kind" name="kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for kind in TransactionKind::ALL {
                        option value=(kind.as_str()) selected[filter.kind == Some(kind)]
                        {
                            (kind.label())
                        }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select id="category_id" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for category in categories {
                        option value=(category.id) selected[filter.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                select id="account_id" name="account_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for account in accounts {
                        option value=(account.id) selected[filter.account_id == Some(account.id)]
                        {
                            (account.name)
                        }
                    }
                }
            }

            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }

                input
                    id="search"
                    type="search"
                    name="search"
                    placeholder="Description"
                    value=[filter.search.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }

                a href=(transactions_url(filter.period, None)) class=(LINK_STYLE) { "Clear" }
            }
        }
    }
}

fn transactions_view(filter: &TransactionFilter, data: &PageData) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let period = filter.period;

    let table_row = |row: &TransactionRow| {
        let transaction = &row.transaction;
        let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
        let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

        html! {
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(name) = &row.category_name {
                        span class=(BADGE_STYLE) { (name) }
                    } @else {
                        span class="text-gray-400" { "Uncategorized" }
                    }
                }
                td class=(TABLE_CELL_STYLE) { (row.account_name) }
                td class="px-6 py-4 text-right" data-kind=(transaction.kind.as_str())
                {
                    (transaction.formatted_amount())
                }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex items-center gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            "Are you sure you want to delete this transaction?",
                            "closest tr",
                        ))
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
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    (period_nav(endpoints::TRANSACTIONS_VIEW, period))

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Add Transaction"
                    }
                }

                @if let Some(payment) = &data.reconciled {
                    div
                        role="status"
                        data-reconciled=(payment.id)
                        class="p-4 text-sm rounded-lg text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400"
                    {
                        "Marked the monthly payment "
                        strong { (payment.description) }
                        " as paid for " (period) "."
                    }
                }

                (filter_form(filter, &data.categories, &data.accounts))

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in &data.rows {
                            (table_row(row))
                        }

                        @if data.rows.is_empty() {
                            tr
                            {
                                td colspan="6" class="px-6 py-4 text-center"
                                {
                                    "No matching transactions in " (period) "."
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}
