//! The monthly payments page: a checklist of the user's payments for one month.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::get_accounts,
    auth::UserID,
    category::get_categories,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, CARD_TITLE_STYLE, CARD_VALUE_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency, link, period_nav,
    },
    monthly_payment::{
        DueState, MonthlyPayment, PaymentSummary, TrackingRecord, classify,
        get_all_monthly_payments, get_tracking_records, reference_date, summarize,
    },
    navigation::NavBar,
    period::{Period, PeriodQuery},
    timezone::get_local_today,
};

/// The state needed for the monthly payments page.
#[derive(Debug, Clone)]
pub struct MonthlyPaymentsPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MonthlyPaymentsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

struct PageData {
    payments: Vec<MonthlyPayment>,
    tracking: Vec<TrackingRecord>,
    category_names: HashMap<i64, String>,
    account_names: HashMap<i64, String>,
}

fn load_page_data(user_id: UserID, period: Period, connection: &Connection) -> Result<PageData, Error> {
    let payments = get_all_monthly_payments(user_id, connection)?;
    let ids: Vec<i64> = payments.iter().map(|payment| payment.id).collect();
    let tracking = get_tracking_records(period, &ids, connection)?;

    let category_names = get_categories(user_id, connection)?
        .into_iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();
    let account_names = get_accounts(user_id, connection)?
        .into_iter()
        .map(|account| (account.id, account.name))
        .collect();

    Ok(PageData {
        payments,
        tracking,
        category_names,
        account_names,
    })
}

/// Render the user's monthly payments for the requested month, defaulting to the current one.
pub async fn get_monthly_payments_page(
    State(state): State<MonthlyPaymentsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let period = query.period_or_current(today)?;

    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_page_data(user_id, period, &connection)?
    };

    Ok(monthly_payments_view(period, reference_date(period, today), &data).into_response())
}

fn badge_style(state: &DueState) -> &'static str {
    match state {
        DueState::Paid { .. } => "text-green-800 bg-green-100 dark:bg-green-900 dark:text-green-300",
        DueState::Overdue { .. } => "text-red-800 bg-red-100 dark:bg-red-900 dark:text-red-300",
        DueState::DueSoon { .. } => {
            "text-yellow-800 bg-yellow-100 dark:bg-yellow-900 dark:text-yellow-300"
        }
        DueState::Scheduled { .. } => "text-gray-800 bg-gray-100 dark:bg-gray-700 dark:text-gray-300",
    }
}

fn summary_cards(summary: &PaymentSummary) -> Markup {
    html! {
        div class="grid grid-cols-1 md:grid-cols-3 gap-4"
        {
            div class=(CARD_STYLE) data-card="paid"
            {
                p class=(CARD_TITLE_STYLE) { "Paid" }
                p class=(CARD_VALUE_STYLE) { (summary.paid_count) " / " (summary.total_count) }
                p class="text-sm text-gray-500 dark:text-gray-400 mt-1"
                {
                    @if summary.total_count == 0 {
                        "No monthly payments yet"
                    } @else if summary.pending_count() == 0 {
                        "All paid"
                    } @else {
                        (summary.pending_count()) " left to pay"
                    }
                }
            }

            div class=(CARD_STYLE) data-card="pending"
            {
                p class=(CARD_TITLE_STYLE) { "Pending" }
                p class=(CARD_VALUE_STYLE) { (format_currency(summary.pending_amount)) }
            }

            div class=(CARD_STYLE) data-card="overdue"
            {
                p class=(CARD_TITLE_STYLE) { "Overdue" }
                p class=(CARD_VALUE_STYLE) { (summary.overdue_count) }
                p class="text-sm text-gray-500 dark:text-gray-400 mt-1"
                {
                    @if summary.overdue_count == 0 { "Nothing overdue" } @else { "Needs attention" }
                }
            }
        }
    }
}

fn payment_card(
    payment: &MonthlyPayment,
    tracking: Option<&TrackingRecord>,
    period: Period,
    date: Date,
    data: &PageData,
) -> Markup {
    let state = classify(payment, tracking, date);
    let paid_url = format!(
        "{}?period={period}",
        format_endpoint(endpoints::MONTHLY_PAYMENT_PAID, payment.id)
    );
    let edit_url = format_endpoint(endpoints::EDIT_MONTHLY_PAYMENT_VIEW, payment.id);
    let delete_url = format_endpoint(endpoints::MONTHLY_PAYMENT, payment.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? Payments with history are deactivated instead.",
        payment.description
    );
    let category = payment
        .category_id
        .and_then(|id| data.category_names.get(&id));
    let account = payment.account_id.and_then(|id| data.account_names.get(&id));

    html! {
        article class={ (CARD_STYLE) " space-y-2" } data-payment-id=(payment.id)
        {
            header class="flex justify-between items-start gap-2"
            {
                h2 class="font-semibold text-gray-900 dark:text-white" { (payment.description) }
                span class={ (BADGE_STYLE) " " (badge_style(&state)) } data-state=(state.as_str())
                {
                    (state)
                }
            }

            p class=(CARD_VALUE_STYLE) { (format_currency(payment.amount.get())) }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Due on day " (payment.due_day_in(period))
                @if let Some(category) = category { " · " (category) }
                @if let Some(account) = account { " · " (account) }
            }

            @if let Some(notes) = &payment.notes {
                p class="text-sm italic text-gray-500 dark:text-gray-400" { (notes) }
            }

            footer class="flex items-center justify-between gap-4 pt-2"
            {
                @if matches!(state, DueState::Paid { .. }) {
                    button
                        type="button"
                        hx-delete=(paid_url)
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Mark unpaid"
                    }
                } @else {
                    button
                        type="button"
                        hx-post=(paid_url)
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Mark paid"
                    }
                }

                div class="flex gap-4"
                {
                    (edit_delete_action_links(&edit_url, &delete_url, &confirm_message, "closest article"))
                }
            }
        }
    }
}

fn monthly_payments_view(period: Period, date: Date, data: &PageData) -> Markup {
    let nav_bar = NavBar::new(endpoints::MONTHLY_PAYMENTS_VIEW).into_html();
    let (active, inactive): (Vec<&MonthlyPayment>, Vec<&MonthlyPayment>) =
        data.payments.iter().partition(|payment| payment.active);
    let summary = summarize(&data.payments, &data.tracking, date);
    let tracking_for = |payment: &MonthlyPayment| {
        data.tracking
            .iter()
            .find(|record| record.payment_id == payment.id)
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Monthly Payments" }

                    (period_nav(endpoints::MONTHLY_PAYMENTS_VIEW, period))

                    a href=(endpoints::NEW_MONTHLY_PAYMENT_VIEW) class=(LINK_STYLE)
                    {
                        "Add Monthly Payment"
                    }
                }

                (summary_cards(&summary))

                div class="grid grid-cols-1 md:grid-cols-2 gap-4" id="active-payments"
                {
                    @for &payment in &active {
                        (payment_card(payment, tracking_for(payment), period, date, data))
                    }
                }

                @if active.is_empty() {
                    p class="text-center"
                    {
                        "No monthly payments yet. Add one "
                        (link(endpoints::NEW_MONTHLY_PAYMENT_VIEW, "here"))
                        "."
                    }
                }

                @if !inactive.is_empty() {
                    h2 class="text-lg font-semibold" { "Inactive" }

                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" id="inactive-payments"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due day" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for &payment in &inactive {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (payment.description) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(payment.amount.get())) }
                                    td class=(TABLE_CELL_STYLE) { (payment.day_of_month.get()) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::EDIT_MONTHLY_PAYMENT_VIEW, payment.id))
                                            class=(LINK_STYLE)
                                        {
                                            "Edit"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Monthly Payments", &[], &content)
}

#[cfg(test)]
mod monthly_payments_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        monthly_payment::{
            DayOfMonth, MonthlyPaymentBuilder, TrackingUpdate, create_monthly_payment,
            upsert_tracking_record,
        },
        period::{Period, PeriodQuery},
        test_utils::{
            assert_valid_html, get_test_db_connection, insert_test_user, parse_html_document,
        },
    };

    use super::{MonthlyPaymentsPageState, get_monthly_payments_page};

    fn texts(html: &Html, selector: &str) -> Vec<String> {
        html.select(&Selector::parse(selector).unwrap())
            .map(|element| element.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn past_period_shows_paid_and_overdue_payments() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let rent = create_monthly_payment(
            user_id,
            MonthlyPaymentBuilder::new("Rent", 1000.0, DayOfMonth::new(1).unwrap()).unwrap(),
            &connection,
        )
        .unwrap();
        create_monthly_payment(
            user_id,
            MonthlyPaymentBuilder::new("Gym", 30.0, DayOfMonth::new(31).unwrap()).unwrap(),
            &connection,
        )
        .unwrap();
        create_monthly_payment(
            user_id,
            MonthlyPaymentBuilder::new("Old phone", 20.0, DayOfMonth::new(3).unwrap())
                .unwrap()
                .active(false),
            &connection,
        )
        .unwrap();
        upsert_tracking_record(
            rent.id,
            Period::from_date(date!(2020 - 02 - 01)),
            TrackingUpdate::paid_manually(date!(2020 - 02 - 02)),
            &connection,
        )
        .unwrap();
        let state = MonthlyPaymentsPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let query = PeriodQuery {
            period: Some("2020-02".to_owned()),
        };

        let response = get_monthly_payments_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        // February 2020 is seen from its last day, the 29th.
        assert_eq!(
            texts(&html, "#active-payments [data-state]"),
            ["Paid on 2020-02-02", "Due today"]
        );
        assert_eq!(texts(&html, "#inactive-payments tbody td:first-child"), ["Old phone"]);
        assert_eq!(texts(&html, "[data-card=paid] p:nth-child(2)"), ["1 / 2"]);
        assert_eq!(texts(&html, "[data-period]"), ["2020-02"]);
    }
}
