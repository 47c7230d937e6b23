//! The reports page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountBalance, get_account_balances},
    auth::UserID,
    dashboard::{
        CategoryTotal, MonthSummary, MonthlyTotals, get_category_totals, get_monthly_comparison,
        get_monthly_totals,
    },
    endpoints,
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, CARD_TITLE_STYLE, CARD_VALUE_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency, period_nav,
    },
    navigation::NavBar,
    period::{Period, PeriodQuery},
    report::comparison::{ComparisonStats, MONTH_OPTIONS, clamp_months},
    timezone::get_local_today,
    transaction::TransactionKind,
};

/// The state needed for the reports page.
#[derive(Debug, Clone)]
pub struct ReportsPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the reports page, e.g. `?period=2025-03&months=12`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    /// The month to report on as YYYY-MM, defaults to the current month.
    pub period: Option<String>,
    /// How many months, ending with `period`, to compare.
    pub months: Option<u32>,
}

struct ReportData {
    period: Period,
    months: u32,
    totals: MonthlyTotals,
    expenses: Vec<CategoryTotal>,
    income: Vec<CategoryTotal>,
    comparison: Vec<MonthSummary>,
    accounts: Vec<AccountBalance>,
}

/// Display the reports for the requested month.
pub async fn get_reports_page(
    State(state): State<ReportsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportsQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        build_report_data(user_id, &query, today, &connection)?
    };

    Ok(reports_view(&data).into_response())
}

fn build_report_data(
    user_id: UserID,
    query: &ReportsQuery,
    today: Date,
    connection: &Connection,
) -> Result<ReportData, Error> {
    let period = PeriodQuery {
        period: query.period.clone(),
    }
    .period_or_current(today)?;
    let months = clamp_months(query.months);

    Ok(ReportData {
        period,
        months,
        totals: get_monthly_totals(user_id, period, connection)?,
        expenses: get_category_totals(user_id, period, TransactionKind::Expense, connection)?,
        income: get_category_totals(user_id, period, TransactionKind::Income, connection)?,
        comparison: get_monthly_comparison(user_id, period, months, connection)?,
        accounts: get_account_balances(user_id, connection)?,
    })
}

fn share_of(total: f64, whole: f64) -> f64 {
    if whole <= 0.0 { 0.0 } else { total / whole * 100.0 }
}

fn income_vs_expense(totals: MonthlyTotals) -> Markup {
    let stat = |name: &str, title: &str, value: String| {
        html! {
            div class=(CARD_STYLE) data-stat=(name)
            {
                p class=(CARD_TITLE_STYLE) { (title) }
                p class=(CARD_VALUE_STYLE) data-value { (value) }
            }
        }
    };

    html! {
        section class="space-y-2" data-section="income-vs-expense"
        {
            h2 class="text-lg font-semibold" { "Income vs Expenses" }

            div class="grid grid-cols-2 md:grid-cols-4 gap-4"
            {
                (stat("income", "Income", format_currency(totals.income)))
                (stat("expense", "Expenses", format_currency(totals.expense)))
                (stat("balance", "Balance", format_currency(totals.balance())))
                (stat("savings-rate", "Savings Rate", format!("{:.1}%", totals.savings_rate())))
            }
        }
    }
}

fn category_table(section: &str, title: &str, rows: &[CategoryTotal], whole: f64) -> Markup {
    html! {
        section class="space-y-2" data-section=(section)
        {
            h2 class="text-lg font-semibold" { (title) }

            @if rows.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Nothing recorded this month." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class="px-6 py-3 text-right" { "Total" }
                            th scope="col" class="px-6 py-3 text-right" { "Share" }
                        }
                    }

                    tbody
                    {
                        @for row in rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                                {
                                    (row.category_name)
                                }
                                td class="px-6 py-4 text-right" data-total { (format_currency(row.total)) }
                                td class="px-6 py-4 text-right" data-share
                                {
                                    (format!("{:.1}%", share_of(row.total, whole)))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn monthly_comparison(months: &[MonthSummary]) -> Markup {
    let stats = ComparisonStats::new(months);

    html! {
        section class="space-y-2" data-section="monthly-comparison"
        {
            h2 class="text-lg font-semibold" { "Monthly Comparison" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                        th scope="col" class="px-6 py-3 text-right" { "Income" }
                        th scope="col" class="px-6 py-3 text-right" { "Expenses" }
                        th scope="col" class="px-6 py-3 text-right" { "Balance" }
                    }
                }

                tbody
                {
                    @for month in months {
                        tr class=(TABLE_ROW_STYLE) data-month=(month.period)
                        {
                            th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                            {
                                (month.period)
                            }
                            td class="px-6 py-4 text-right" { (format_currency(month.totals.income)) }
                            td class="px-6 py-4 text-right" { (format_currency(month.totals.expense)) }
                            td class="px-6 py-4 text-right" data-balance
                            {
                                (format_currency(month.totals.balance()))
                            }
                        }
                    }
                }

                @if let Some(stats) = stats {
                    tfoot
                    {
                        tr class="font-semibold text-gray-900 dark:text-white" data-average
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { "Average" }
                            td class="px-6 py-4 text-right" { (format_currency(stats.average_income)) }
                            td class="px-6 py-4 text-right" { (format_currency(stats.average_expense)) }
                            td class="px-6 py-4 text-right" data-balance
                            {
                                (format_currency(stats.average_balance()))
                            }
                        }
                    }
                }
            }

            @if let Some(stats) = stats {
                p class="text-sm" data-best-month
                {
                    "Best month: " (stats.best.period)
                    " (" (format_currency(stats.best.totals.balance())) ")"
                }
                p class="text-sm" data-worst-month
                {
                    "Worst month: " (stats.worst.period)
                    " (" (format_currency(stats.worst.totals.balance())) ")"
                }
            } @else {
                p class="text-sm text-gray-500 dark:text-gray-400" { "No transactions in these months." }
            }
        }
    }
}

fn account_status(accounts: &[AccountBalance]) -> Markup {
    let total: f64 = accounts.iter().map(|row| row.balance).sum();

    html! {
        section class="space-y-2" data-section="account-status"
        {
            h2 class="text-lg font-semibold" { "Account Status" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class="px-6 py-3 text-right" { "Balance" }
                    }
                }

                tbody
                {
                    @for row in accounts {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                            {
                                (row.account.name)
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                span class=(BADGE_STYLE) { (row.account.kind.label()) }
                            }
                            td class="px-6 py-4 text-right" data-balance { (format_currency(row.balance)) }
                        }
                    }
                }

                tfoot
                {
                    tr class="font-semibold text-gray-900 dark:text-white"
                    {
                        th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total" }
                        td class="px-6 py-4 text-right" data-total { (format_currency(total)) }
                    }
                }
            }
        }
    }
}

fn months_form(period: Period, months: u32) -> Markup {
    html! {
        form method="get" action=(endpoints::REPORTS_VIEW) class="flex items-center gap-2"
        {
            input type="hidden" name="period" value=(period);

            label for="months" class="text-sm" { "Compare" }

            select id="months" name="months" class=(FORM_TEXT_INPUT_STYLE)
            {
                @for option in MONTH_OPTIONS {
                    option value=(option) selected[option == months] { (option) " months" }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Show" }
        }
    }
}

fn reports_view(data: &ReportData) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-5xl space-y-6"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Reports" }

                    (period_nav(endpoints::REPORTS_VIEW, data.period))

                    (months_form(data.period, data.months))
                }

                (income_vs_expense(data.totals))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (category_table("expense-categories", "Expenses by Category", &data.expenses, data.totals.expense))
                    (category_table("income-categories", "Income by Category", &data.income, data.totals.income))
                }

                (monthly_comparison(&data.comparison))
                (account_status(&data.accounts))
            }
        }
    };

    base("Reports", &[], &content)
}
