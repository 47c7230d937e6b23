//! Which notifications a user wants to receive.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{Error, auth::UserID};

/// A user's notification settings, stored as one row per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPreferences {
    /// Show budgets that have been used up on the dashboard.
    pub budget_alerts: bool,
    pub transaction_reminders: bool,
    pub weekly_summary: bool,
    pub monthly_report: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            budget_alerts: true,
            transaction_reminders: true,
            weekly_summary: false,
            monthly_report: true,
        }
    }
}

/// Create the notification preferences table.
pub fn create_notification_preferences_table(
    connection: &Connection,
) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification_preferences (
            user_id INTEGER PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
            budget_alerts INTEGER NOT NULL,
            transaction_reminders INTEGER NOT NULL,
            weekly_summary INTEGER NOT NULL,
            monthly_report INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Store the default preferences for a new user.
pub fn create_default_notification_preferences(
    user_id: UserID,
    connection: &Connection,
) -> Result<NotificationPreferences, Error> {
    save_notification_preferences(user_id, NotificationPreferences::default(), connection)
}

/// Replace the user's preferences.
pub fn save_notification_preferences(
    user_id: UserID,
    preferences: NotificationPreferences,
    connection: &Connection,
) -> Result<NotificationPreferences, Error> {
    let saved = connection.query_row(
        "INSERT INTO notification_preferences
            (user_id, budget_alerts, transaction_reminders, weekly_summary, monthly_report)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id) DO UPDATE SET
            budget_alerts = excluded.budget_alerts,
            transaction_reminders = excluded.transaction_reminders,
            weekly_summary = excluded.weekly_summary,
            monthly_report = excluded.monthly_report
        RETURNING budget_alerts, transaction_reminders, weekly_summary, monthly_report",
        (
            user_id.as_i64(),
            preferences.budget_alerts,
            preferences.transaction_reminders,
            preferences.weekly_summary,
            preferences.monthly_report,
        ),
        map_row,
    )?;

    Ok(saved)
}

/// The user's preferences, or the defaults if they have never been saved.
pub fn get_notification_preferences(
    user_id: UserID,
    connection: &Connection,
) -> Result<NotificationPreferences, Error> {
    let preferences = connection
        .query_row(
            "SELECT budget_alerts, transaction_reminders, weekly_summary, monthly_report
            FROM notification_preferences WHERE user_id = ?1",
            [user_id.as_i64()],
            map_row,
        )
        .optional()?;

    Ok(preferences.unwrap_or_default())
}

fn map_row(row: &Row) -> Result<NotificationPreferences, rusqlite::Error> {
    Ok(NotificationPreferences {
        budget_alerts: row.get(0)?,
        transaction_reminders: row.get(1)?,
        weekly_summary: row.get(2)?,
        monthly_report: row.get(3)?,
    })
}

#[cfg(test)]
mod notification_preferences_tests {
    use crate::test_utils::{get_test_db_connection, insert_test_user};

    use super::{
        NotificationPreferences, create_default_notification_preferences,
        get_notification_preferences, save_notification_preferences,
    };

    #[test]
    fn missing_row_gives_defaults() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);

        let preferences = get_notification_preferences(user_id, &connection).unwrap();

        assert_eq!(preferences, NotificationPreferences::default());
    }

    #[test]
    fn defaults_match_new_user_settings() {
        let defaults = NotificationPreferences::default();

        assert!(defaults.budget_alerts);
        assert!(defaults.transaction_reminders);
        assert!(!defaults.weekly_summary);
        assert!(defaults.monthly_report);
    }

    #[test]
    fn save_overwrites_previous_preferences() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        create_default_notification_preferences(user_id, &connection).unwrap();
        let want = NotificationPreferences {
            budget_alerts: false,
            transaction_reminders: false,
            weekly_summary: true,
            monthly_report: false,
        };

        save_notification_preferences(user_id, want, &connection).unwrap();

        let got = get_notification_preferences(user_id, &connection).unwrap();
        assert_eq!(got, want);
    }
}
