//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element of the base page
//! with an htmx out-of-band swap, so any endpoint can return one no matter
//! which element triggered the request.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message to show to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation succeeded, with extra details.
    Success { message: String, details: String },
    /// An operation succeeded.
    SuccessSimple { message: String },
    /// An operation failed, with details on what to do about it.
    Error { message: String, details: String },
}

impl Alert {
    /// Render the alert as an out-of-band swap for the alert container.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    fn into_markup(self) -> Markup {
        let (is_success, message, details) = match self {
            Alert::Success { message, details } => (true, message, details),
            Alert::SuccessSimple { message } => (true, message, String::new()),
            Alert::Error { message, details } => (false, message, details),
        };

        let style = if is_success {
            "flex items-start gap-3 p-4 mb-4 text-sm rounded-lg shadow-lg \
            text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400"
        } else {
            "flex items-start gap-3 p-4 mb-4 text-sm rounded-lg shadow-lg \
            text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400"
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(style) role="alert"
                {
                    div class="flex-1"
                    {
                        p class="font-semibold alert-message" { (message) }

                        @if !details.is_empty() {
                            p class="alert-details" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="font-bold"
                        aria-label="Dismiss"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use scraper::{Html, Selector};

    use super::Alert;

    fn text_of(html: &Html, selector: &str) -> Option<String> {
        html.select(&Selector::parse(selector).unwrap())
            .next()
            .map(|element| element.text().collect::<String>().trim().to_owned())
    }

    #[test]
    fn renders_message_and_details() {
        let alert = Alert::Error {
            message: "Could not delete".to_owned(),
            details: "Try again".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        assert!(html.errors.is_empty(), "{:?}", html.errors);
        assert_eq!(text_of(&html, ".alert-message").as_deref(), Some("Could not delete"));
        assert_eq!(text_of(&html, ".alert-details").as_deref(), Some("Try again"));
    }

    #[test]
    fn simple_alert_omits_details() {
        let alert = Alert::SuccessSimple {
            message: "Saved".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        assert_eq!(text_of(&html, ".alert-message").as_deref(), Some("Saved"));
        assert_eq!(text_of(&html, ".alert-details"), None);
    }
}
