//! The budgets page and the form for setting a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{BudgetProgress, get_budgets_with_spending, upsert_budget},
    category::{Category, CategoryId, CategoryKind, get_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_button,
        dollar_input_styles, format_currency, link, period_nav,
    },
    navigation::NavBar,
    period::{Period, PeriodQuery},
    timezone::get_local_today,
};

/// The state needed for the budgets page and form.
#[derive(Debug, Clone)]
pub struct BudgetsState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for setting a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    pub category_id: CategoryId,
    /// The month in the format `YYYY-MM`.
    pub period: String,
    pub amount: f64,
}

/// Render the user's budgets for the requested month, defaulting to the current one.
pub async fn get_budgets_page(
    State(state): State<BudgetsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let period = query.period_or_current(today)?;

    let (budgets, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_budgets_with_spending(user_id, period, &connection)?,
            get_categories(user_id, &connection)?,
        )
    };

    Ok(budgets_view(period, &budgets, &categories).into_response())
}

/// Create or update the budget for a category and month.
pub async fn set_budget_endpoint(
    State(state): State<BudgetsState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let period: Period = match form.period.parse() {
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

    match upsert_budget(user_id, form.category_id, period, form.amount, &connection) {
        Ok(_) => (
            HxRedirect(format!("{}?period={period}", endpoints::BUDGETS_VIEW)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::NonPositiveAmount(_) | Error::InvalidCategory(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while setting a budget: {error}");
            error.into_alert_response()
        }
    }
}

fn progress_bar(progress: &BudgetProgress) -> Markup {
    let width = progress.percent_used().clamp(0.0, 100.0);
    let colour = if progress.is_exceeded() {
        "bg-red-600"
    } else if progress.percent_used() >= 80.0 {
        "bg-yellow-400"
    } else {
        "bg-green-600"
    };

    html! {
        div class="w-full h-2 bg-gray-200 rounded-full dark:bg-gray-700"
        {
            div class={ "h-2 rounded-full " (colour) } style={ "width: " (format!("{width:.0}")) "%" } {}
        }
    }
}

fn budget_form(period: Period, categories: &[Category]) -> Markup {
    html! {
        form
            hx-post=(endpoints::BUDGETS_API)
            hx-target-error="#alert-container"
            class="grid grid-cols-1 md:grid-cols-4 gap-4 items-end w-full"
        {
            input type="hidden" name="period" value=(period);

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select id="category_id" name="category_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in categories.iter().filter(|category| category.kind == CategoryKind::Expense) {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper"
                {
                    input
                        id="amount"
                        type="number"
                        name="amount"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Set Budget" }
        }
    }
}

fn budgets_view(period: Period, budgets: &[BudgetProgress], categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let has_expense_categories = categories
        .iter()
        .any(|category| category.kind == CategoryKind::Expense);

    let table_row = |progress: &BudgetProgress| {
        let delete_url = format_endpoint(endpoints::DELETE_BUDGET, progress.budget.id);
        let confirm_message = format!(
            "Are you sure you want to delete the budget for '{}'?",
            progress.category_name
        );
        let remaining_style = if progress.remaining() < 0.0 {
            "px-6 py-4 text-right text-red-600 dark:text-red-400"
        } else {
            "px-6 py-4 text-right"
        };

        html! {
            tr class=(TABLE_ROW_STYLE) data-budget-id=(progress.budget.id)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (progress.category_name)
                }

                td class="px-6 py-4 text-right" { (format_currency(progress.budget.amount)) }
                td class="px-6 py-4 text-right" data-spent { (format_currency(progress.spent)) }
                td class=(remaining_style) data-remaining { (format_currency(progress.remaining())) }

                td class=(TABLE_CELL_STYLE)
                {
                    span data-percent { (format!("{:.0}%", progress.percent_used())) }
                    (progress_bar(progress))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (delete_button(&delete_url, &confirm_message, "closest tr"))
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
                    h1 class="text-xl font-bold" { "Budgets" }
                    (period_nav(endpoints::BUDGETS_VIEW, period))
                }

                @if has_expense_categories {
                    (budget_form(period, categories))
                } @else {
                    p
                    {
                        "Add an expense category "
                        (link(endpoints::NEW_CATEGORY_VIEW, "here"))
                        " before setting a budget."
                    }
                }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class="px-6 py-3 text-right" { "Budget" }
                            th scope="col" class="px-6 py-3 text-right" { "Spent" }
                            th scope="col" class="px-6 py-3 text-right" { "Remaining" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Used" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for progress in budgets {
                            (table_row(progress))
                        }

                        @if budgets.is_empty() {
                            tr
                            {
                                td colspan="6" class="px-6 py-4 text-center" { "No budgets set for " (period) "." }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Budgets", &[dollar_input_styles()], &content)
}
