//! Counting the monthly payments that need the user's attention, and the
//! notification bell that shows the count.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{LINK_STYLE, format_currency},
    monthly_payment::{
        MonthlyPayment, TrackingRecord, classify, get_active_monthly_payments,
        get_tracking_records,
    },
    period::Period,
    timezone::get_local_today,
};

/// Unpaid payments due within this many days are upcoming.
///
/// This is wider than the window for the "due soon" badge so the bell gives
/// more warning than the payment list.
pub const UPCOMING_WINDOW_DAYS: u8 = 7;

/// How many payments are overdue or coming up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentNotifications {
    pub overdue: usize,
    pub upcoming: usize,
    /// Always `overdue + upcoming`.
    pub total: usize,
}

enum Attention {
    Overdue,
    Upcoming,
}

fn needs_attention(
    payment: &MonthlyPayment,
    tracking: &HashMap<i64, &TrackingRecord>,
    today: Date,
) -> Option<Attention> {
    if !payment.active {
        return None;
    }

    if tracking.get(&payment.id).is_some_and(|record| record.paid) {
        return None;
    }

    let due_day = payment.due_day_in(Period::from_date(today));
    let day = today.day();

    if day > due_day {
        Some(Attention::Overdue)
    } else if due_day - day <= UPCOMING_WINDOW_DAYS {
        Some(Attention::Upcoming)
    } else {
        None
    }
}

fn index_by_payment(tracking: &[TrackingRecord]) -> HashMap<i64, &TrackingRecord> {
    tracking
        .iter()
        .map(|record| (record.payment_id, record))
        .collect()
}

/// Count the unpaid payments that are overdue or due within [UPCOMING_WINDOW_DAYS] of `today`.
///
/// `tracking` should hold the records for the period containing `today`, a
/// payment without a record is unpaid.
pub fn aggregate(
    payments: &[MonthlyPayment],
    tracking: &[TrackingRecord],
    today: Date,
) -> PaymentNotifications {
    let tracking = index_by_payment(tracking);
    let mut notifications = PaymentNotifications::default();

    for payment in payments {
        match needs_attention(payment, &tracking, today) {
            Some(Attention::Overdue) => notifications.overdue += 1,
            Some(Attention::Upcoming) => notifications.upcoming += 1,
            None => {}
        }
    }

    notifications.total = notifications.overdue + notifications.upcoming;
    notifications
}

/// The payments counted by [aggregate], in the order given.
pub fn pending_payments<'a>(
    payments: &'a [MonthlyPayment],
    tracking: &[TrackingRecord],
    today: Date,
) -> Vec<&'a MonthlyPayment> {
    let tracking = index_by_payment(tracking);

    payments
        .iter()
        .filter(|payment| needs_attention(payment, &tracking, today).is_some())
        .collect()
}

/// Remembers the newest notification poll issued by each user.
///
/// The bell sends the time it issued each poll. A poll that finishes after a
/// newer one was issued is stale and its result is dropped.
#[derive(Debug, Default)]
pub struct PollSequence {
    latest: Mutex<HashMap<UserID, u64>>,
}

/// A poll that has been registered with a [PollSequence].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    user_id: UserID,
    issued_at: u64,
}

impl PollSequence {
    /// Register a poll issued at `issued_at` milliseconds since the epoch.
    pub fn issue(&self, user_id: UserID, issued_at: u64) -> PollTicket {
        match self.latest.lock() {
            Ok(mut latest) => {
                let newest = latest.entry(user_id).or_insert(issued_at);
                *newest = (*newest).max(issued_at);
            }
            Err(error) => tracing::error!("could not acquire poll sequence lock: {error}"),
        }

        PollTicket { user_id, issued_at }
    }

    /// Whether no newer poll has been issued by the same user since `ticket`.
    pub fn is_latest(&self, ticket: PollTicket) -> bool {
        match self.latest.lock() {
            Ok(latest) => latest
                .get(&ticket.user_id)
                .is_none_or(|&newest| newest <= ticket.issued_at),
            Err(error) => {
                tracing::error!("could not acquire poll sequence lock: {error}");
                true
            }
        }
    }
}

/// The state needed for the notification bell.
#[derive(Debug, Clone)]
pub struct NotificationsState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
    pub poll_sequence: Arc<PollSequence>,
}

impl FromRef<AppState> for NotificationsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            poll_sequence: state.poll_sequence.clone(),
        }
    }
}

/// The query string sent by the notification bell.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsQuery {
    /// When the bell issued the request, in milliseconds since the epoch.
    pub issued_at: Option<u64>,
}

/// The placeholder for the notification bell, which loads itself and then refreshes every minute.
///
/// `hx-sync` cancels a poll still in flight when the next one starts.
pub fn notification_bell() -> Markup {
    html! {
        div
            id="notification-bell"
            hx-get=(endpoints::PAYMENT_NOTIFICATIONS)
            hx-trigger="load, every 60s"
            hx-sync="this:replace"
            hx-vals="js:{issued_at: Date.now()}"
            hx-swap="innerHTML"
            class="relative"
        {}
    }
}

/// Render the contents of the notification bell.
///
/// Responds with 204 No Content if a newer poll has been issued, so htmx leaves the bell alone.
pub async fn get_payment_notifications(
    State(state): State<NotificationsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NotificationsQuery>,
) -> Response {
    let ticket = query
        .issued_at
        .map(|issued_at| state.poll_sequence.issue(user_id, issued_at));

    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let (payments, tracking) = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match load_current_period(user_id, today, &connection) {
            Ok(loaded) => loaded,
            Err(error) => {
                tracing::error!("could not load payment notifications: {error}");
                return error.into_alert_response();
            }
        }
    };

    if ticket.is_some_and(|ticket| !state.poll_sequence.is_latest(ticket)) {
        return StatusCode::NO_CONTENT.into_response();
    }

    let notifications = aggregate(&payments, &tracking, today);
    let pending = pending_payments(&payments, &tracking, today);

    bell_view(notifications, &pending, &tracking, today).into_response()
}

/// The user's active payments and their tracking records for the period containing `today`.
pub(crate) fn load_current_period(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<(Vec<MonthlyPayment>, Vec<TrackingRecord>), Error> {
    let payments = get_active_monthly_payments(user_id, connection)?;
    let ids: Vec<i64> = payments.iter().map(|payment| payment.id).collect();
    let tracking = get_tracking_records(Period::from_date(today), &ids, connection)?;

    Ok((payments, tracking))
}

fn bell_view(
    notifications: PaymentNotifications,
    pending: &[&MonthlyPayment],
    tracking: &[TrackingRecord],
    today: Date,
) -> Markup {
    let badge_style = if notifications.overdue > 0 {
        "absolute -top-2 -right-2 rounded-full bg-red-600 px-1.5 text-xs text-white"
    } else {
        "absolute -top-2 -right-2 rounded-full bg-blue-600 px-1.5 text-xs text-white"
    };

    html! {
        details class="relative"
        {
            summary
                class="list-none cursor-pointer relative text-gray-700 dark:text-gray-200"
                aria-label="Payment notifications"
            {
                "🔔"

                @if notifications.total > 0 {
                    span class=(badge_style) data-total { (notifications.total) }
                }
            }

            div class="absolute right-0 z-10 mt-2 w-72 rounded-lg bg-white p-4 shadow-lg dark:bg-gray-800"
            {
                @if notifications.total == 0 {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "No payments need attention." }
                } @else {
                    p class="text-sm font-semibold" data-summary
                    {
                        (notifications.overdue) " overdue, " (notifications.upcoming) " upcoming"
                    }

                    ul class="mt-2 space-y-1 text-sm"
                    {
                        @for payment in pending {
                            @let record = tracking.iter().find(|record| record.payment_id == payment.id);
                            li class="flex justify-between gap-2"
                            {
                                span { (payment.description) " " (format_currency(payment.amount.get())) }
                                span class="text-gray-500" { (classify(payment, record, today)) }
                            }
                        }
                    }
                }

                a href=(endpoints::MONTHLY_PAYMENTS_VIEW) class={ "block mt-3 text-sm " (LINK_STYLE) }
                {
                    "View monthly payments"
                }
            }
        }
    }
}



#[cfg(test)]
mod notifications_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::Selector;

    use crate::{
        monthly_payment::{DayOfMonth, MonthlyPaymentBuilder, create_monthly_payment},
        test_utils::{get_test_db_connection, insert_test_user, parse_html_fragment},
    };

    use super::{NotificationsQuery, NotificationsState, PollSequence, get_payment_notifications};

    fn state(connection: rusqlite::Connection) -> NotificationsState {
        NotificationsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
            poll_sequence: Arc::new(PollSequence::default()),
        }
    }

    #[tokio::test]
    async fn renders_bell_with_count() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        // Due on day 1 so it is overdue or due today whatever the current date.
        create_monthly_payment(
            user_id,
            MonthlyPaymentBuilder::new("Rent", 1000.0, DayOfMonth::new(1).unwrap()).unwrap(),
            &connection,
        )
        .unwrap();

        let response = get_payment_notifications(
            State(state(connection)),
            Extension(user_id),
            Query(NotificationsQuery { issued_at: Some(1) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let total = html
            .select(&Selector::parse("[data-total]").unwrap())
            .next()
            .expect("want a count badge")
            .text()
            .collect::<String>();
        assert_eq!(total.trim(), "1");
    }

    #[tokio::test]
    async fn stale_poll_gets_no_content() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let state = state(connection);
        state.poll_sequence.issue(user_id, 120_000);

        let response = get_payment_notifications(
            State(state),
            Extension(user_id),
            Query(NotificationsQuery {
                issued_at: Some(60_000),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
