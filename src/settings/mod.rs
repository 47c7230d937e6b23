//! User settings.

mod page;
mod preferences;

pub use page::{get_settings_page, update_settings_endpoint};
pub use preferences::{
    NotificationPreferences, create_default_notification_preferences,
    create_notification_preferences_table, get_notification_preferences,
    save_notification_preferences,
};
