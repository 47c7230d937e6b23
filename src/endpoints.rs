//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing a transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page listing accounts and their balances.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page listing categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing a category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page for setting and reviewing monthly budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The monthly payment checklist for a period.
pub const MONTHLY_PAYMENTS_VIEW: &str = "/monthly-payments";
/// The page for creating a new monthly payment.
pub const NEW_MONTHLY_PAYMENT_VIEW: &str = "/monthly-payments/new";
/// The page for editing a monthly payment.
pub const EDIT_MONTHLY_PAYMENT_VIEW: &str = "/monthly-payments/{payment_id}/edit";
/// Income, spending and account reports with a month by month comparison.
pub const REPORTS_VIEW: &str = "/reports";
/// The page for notification preferences.
pub const SETTINGS_VIEW: &str = "/settings";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to update or delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to create categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update or delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to set a budget.
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to delete a single budget.
pub const DELETE_BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to create monthly payments.
pub const MONTHLY_PAYMENTS_API: &str = "/api/monthly-payments";
/// The route to update or delete a monthly payment.
pub const MONTHLY_PAYMENT: &str = "/api/monthly-payments/{payment_id}";
/// The route to mark a monthly payment paid (POST) or unpaid (DELETE) for a period.
pub const MONTHLY_PAYMENT_PAID: &str = "/api/monthly-payments/{payment_id}/paid";
/// The route polled by the notification bell.
pub const PAYMENT_NOTIFICATIONS: &str = "/api/monthly-payments/notifications";
/// The route to save notification preferences.
pub const SETTINGS_API: &str = "/api/settings";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::NEW_ACCOUNT_VIEW,
            endpoints::EDIT_ACCOUNT_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::NEW_CATEGORY_VIEW,
            endpoints::EDIT_CATEGORY_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::MONTHLY_PAYMENTS_VIEW,
            endpoints::NEW_MONTHLY_PAYMENT_VIEW,
            endpoints::EDIT_MONTHLY_PAYMENT_VIEW,
            endpoints::REPORTS_VIEW,
            endpoints::SETTINGS_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::TRANSACTIONS_API,
            endpoints::TRANSACTION,
            endpoints::ACCOUNTS_API,
            endpoints::ACCOUNT,
            endpoints::CATEGORIES_API,
            endpoints::CATEGORY,
            endpoints::BUDGETS_API,
            endpoints::DELETE_BUDGET,
            endpoints::MONTHLY_PAYMENTS_API,
            endpoints::MONTHLY_PAYMENT,
            endpoints::MONTHLY_PAYMENT_PAID,
            endpoints::PAYMENT_NOTIFICATIONS,
            endpoints::SETTINGS_API,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::MONTHLY_PAYMENT_PAID, 42);

        assert_eq!(formatted_path, "/api/monthly-payments/42/paid");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
