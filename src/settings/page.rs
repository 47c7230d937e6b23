//! The settings page for notification preferences.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{UserID, get_user_by_id},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    settings::{NotificationPreferences, get_notification_preferences, save_notification_preferences},
};

/// The state needed for the settings page.
#[derive(Debug, Clone)]
pub struct SettingsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The submitted checkboxes. Unticked boxes are not sent at all.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub budget_alerts: Option<String>,
    #[serde(default)]
    pub transaction_reminders: Option<String>,
    #[serde(default)]
    pub weekly_summary: Option<String>,
    #[serde(default)]
    pub monthly_report: Option<String>,
}

impl From<SettingsForm> for NotificationPreferences {
    fn from(form: SettingsForm) -> Self {
        Self {
            budget_alerts: form.budget_alerts.is_some(),
            transaction_reminders: form.transaction_reminders.is_some(),
            weekly_summary: form.weekly_summary.is_some(),
            monthly_report: form.monthly_report.is_some(),
        }
    }
}

pub async fn get_settings_page(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (user, preferences) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_user_by_id(user_id, &connection)?,
            get_notification_preferences(user_id, &connection)?,
        )
    };

    Ok(settings_view(user.email.as_str(), preferences).into_response())
}

pub async fn update_settings_endpoint(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match save_notification_preferences(user_id, form.into(), &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Settings saved".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not save notification preferences: {error}");
            error.into_alert_response()
        }
    }
}

fn checkbox(name: &str, label: &str, description: &str, checked: bool) -> Markup {
    html! {
        div class="flex items-start gap-3"
        {
            input id=(name) type="checkbox" name=(name) checked[checked] class={ "mt-1 " (FORM_CHECKBOX_STYLE) };

            div
            {
                label for=(name) class="text-sm font-medium text-gray-900 dark:text-white" { (label) }
                p class="text-sm text-gray-500 dark:text-gray-400" { (description) }
            }
        }
    }
}

fn settings_view(email: &str, preferences: NotificationPreferences) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-2" { "Settings" }
            p class="text-sm text-gray-500 dark:text-gray-400 mb-4"
            {
                "Signed in as " span data-email { (email) }
            }

            form
                hx-post=(endpoints::SETTINGS_API)
                hx-swap="none"
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                h2 class="font-semibold" { "Notifications" }

                (checkbox(
                    "budget_alerts",
                    "Budget alerts",
                    "Show budgets you have used up on the dashboard.",
                    preferences.budget_alerts,
                ))
                (checkbox(
                    "transaction_reminders",
                    "Transaction reminders",
                    "Remind me to record my transactions.",
                    preferences.transaction_reminders,
                ))
                (checkbox(
                    "weekly_summary",
                    "Weekly summary",
                    "A summary of the past week's spending.",
                    preferences.weekly_summary,
                ))
                (checkbox(
                    "monthly_report",
                    "Monthly report",
                    "A report at the end of each month.",
                    preferences.monthly_report,
                ))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Settings" }
            }
        }
    };

    base("Settings", &[], &content)
}
