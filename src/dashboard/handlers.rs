//! The dashboard page: an overview of the current month.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountBalance, get_account_balances},
    auth::UserID,
    budget::{BudgetProgress, get_budgets_with_spending},
    dashboard::{
        CategoryTotal, MonthlyTotals,
        cards::{
            account_balances_list, budget_alerts, category_spending_table, payment_summary_card,
            recent_transactions_list, totals_cards,
        },
        get_category_totals, get_monthly_totals,
    },
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    monthly_payment::{PaymentSummary, load_current_period, summarize},
    navigation::NavBar,
    period::Period,
    settings::get_notification_preferences,
    timezone::get_local_today,
    transaction::{TransactionKind, TransactionRow, get_recent_transactions},
};

/// How many transactions the dashboard lists.
const RECENT_TRANSACTION_COUNT: u32 = 5;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Everything shown on the dashboard.
struct DashboardData {
    period: Period,
    totals: MonthlyTotals,
    spending: Vec<CategoryTotal>,
    accounts: Vec<AccountBalance>,
    payments: PaymentSummary,
    /// Empty when the user has turned budget alerts off.
    exceeded_budgets: Vec<BudgetProgress>,
    recent: Vec<TransactionRow>,
}

/// Display a page with an overview of the user's current month.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        build_dashboard_data(user_id, today, &connection)?
    };

    Ok(dashboard_view(&data).into_response())
}

fn build_dashboard_data(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<DashboardData, Error> {
    let period = Period::from_date(today);
    let (payments, tracking) = load_current_period(user_id, today, connection)?;
    let preferences = get_notification_preferences(user_id, connection)?;

    let exceeded_budgets = if preferences.budget_alerts {
        get_budgets_with_spending(user_id, period, connection)?
            .into_iter()
            .filter(BudgetProgress::is_exceeded)
            .collect()
    } else {
        Vec::new()
    };

    Ok(DashboardData {
        period,
        totals: get_monthly_totals(user_id, period, connection)?,
        spending: get_category_totals(user_id, period, TransactionKind::Expense, connection)?,
        accounts: get_account_balances(user_id, connection)?,
        payments: summarize(&payments, &tracking, today),
        exceeded_budgets,
        recent: get_recent_transactions(user_id, RECENT_TRANSACTION_COUNT, connection)?,
    })
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-5xl space-y-6"
            {
                header class="flex justify-between items-baseline"
                {
                    h1 class="text-xl font-bold" { "Dashboard" }
                    span class="text-sm text-gray-500 dark:text-gray-400" data-period { (data.period) }
                }

                (budget_alerts(&data.exceeded_budgets))
                (totals_cards(data.totals))
                (payment_summary_card(data.payments))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (category_spending_table(&data.spending))
                    (account_balances_list(&data.accounts))
                }

                (recent_transactions_list(&data.recent))
            }
        }
    };

    base("Dashboard", &[], &content)
}
