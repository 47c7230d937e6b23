//! Tally is a web app for tracking personal finances.
//!
//! Users record income, expenses and transfers against their accounts, sort
//! them into categories, set monthly budgets and keep track of recurring
//! monthly payments. New expenses are matched against outstanding monthly
//! payments so that rent, subscriptions and the like are ticked off without
//! any extra clicks.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod budget;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod monthly_payment;
mod navigation;
mod not_found;
mod period;
mod report;
mod routing;
mod settings;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;

pub use account::{AccountKind, create_account};
pub use category::{CategoryKind, CategoryName, create_category};
pub use monthly_payment::{DayOfMonth, MonthlyPaymentBuilder, create_monthly_payment};
pub use transaction::{TransactionBuilder, TransactionKind, create_transaction};

use crate::{
    account::AccountId, alert::Alert, category::CategoryId,
    internal_server_error::InternalServerError, not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// A user with the email address is already registered.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create an account name.
    #[error("Account name cannot be empty")]
    EmptyAccountName,

    /// An empty string was used to describe a monthly payment.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// The category ID does not refer to one of the user's categories.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The account ID does not refer to one of the user's accounts.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount(Option<AccountId>),

    /// Amounts of money must be greater than zero, the direction of the money
    /// is given by the transaction kind.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    NonPositiveAmount(f64),

    /// A day of the month outside of 1 to 31.
    ///
    /// This indicates a data integrity problem upstream and is never
    /// recovered from silently.
    #[error("{0} is not a valid day of the month, it must be between 1 and 31")]
    InvalidDayOfMonth(i64),

    /// A period that is not a valid year and month in the format YYYY-MM.
    #[error("\"{0}\" is not a valid period, expected a year and month like 2025-03")]
    InvalidPeriod(String),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The specified category name already exists for the user.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The specified account name already exists for the user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// Tried to delete an account that still has transactions.
    #[error("the account has transactions and cannot be deleted")]
    AccountInUse,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to update a monthly payment that does not exist
    #[error("tried to update a monthly payment that is not in the database")]
    UpdateMissingMonthlyPayment,

    /// Tried to delete a monthly payment that does not exist
    #[error("tried to delete a monthly payment that is not in the database")]
    DeleteMissingMonthlyPayment,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::InvalidPeriod(period) => (
                StatusCode::BAD_REQUEST,
                InternalServerError {
                    description: "Invalid Month",
                    fix: &format!("\"{period}\" is not a valid month, use the format YYYY-MM."),
                }
                .into_html(),
            )
                .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status_code, message, details) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                "Invalid transaction date",
                format!("{date} is a date in the future, which is not allowed."),
            ),
            Error::NonPositiveAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount",
                format!("{amount} is not a valid amount. Enter an amount greater than zero."),
            ),
            Error::InvalidDayOfMonth(day) => (
                StatusCode::BAD_REQUEST,
                "Invalid due day",
                format!("{day} is not a valid day of the month. Choose a day from 1 to 31."),
            ),
            Error::InvalidPeriod(period) => (
                StatusCode::BAD_REQUEST,
                "Invalid month",
                format!("\"{period}\" is not a valid month, use the format YYYY-MM."),
            ),
            Error::EmptyCategoryName => (
                StatusCode::BAD_REQUEST,
                "Invalid category name",
                "The category name cannot be empty.".to_owned(),
            ),
            Error::EmptyAccountName => (
                StatusCode::BAD_REQUEST,
                "Invalid account name",
                "The account name cannot be empty.".to_owned(),
            ),
            Error::EmptyDescription => (
                StatusCode::BAD_REQUEST,
                "Invalid description",
                "The description cannot be empty.".to_owned(),
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid category",
                format!("Could not find a category with the ID {category_id:?}"),
            ),
            Error::InvalidAccount(account_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid account",
                format!("Could not find an account with the ID {account_id:?}"),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not delete transaction",
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            ),
            Error::DeleteMissingAccount => (
                StatusCode::NOT_FOUND,
                "Could not delete account",
                "The account could not be found. \
                Try refreshing the page to see if the account has already been deleted."
                    .to_owned(),
            ),
            Error::AccountInUse => (
                StatusCode::CONFLICT,
                "Could not delete account",
                "The account still has transactions. Delete or move them first.".to_owned(),
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                "Could not delete category",
                "The category could not be found. \
                Try refreshing the page to see if the category has already been deleted."
                    .to_owned(),
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                "Could not delete budget",
                "The budget could not be found. \
                Try refreshing the page to see if the budget has already been deleted."
                    .to_owned(),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "Not found",
                "The requested item could not be found.".to_owned(),
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not update transaction",
                "The transaction could not be found.".to_owned(),
            ),
            Error::UpdateMissingAccount => (
                StatusCode::NOT_FOUND,
                "Could not update account",
                "The account could not be found.".to_owned(),
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                "Could not update category",
                "The category could not be found.".to_owned(),
            ),
            Error::UpdateMissingMonthlyPayment => (
                StatusCode::NOT_FOUND,
                "Could not update monthly payment",
                "The monthly payment could not be found.".to_owned(),
            ),
            Error::DeleteMissingMonthlyPayment => (
                StatusCode::NOT_FOUND,
                "Could not delete monthly payment",
                "The monthly payment could not be found. \
                Try refreshing the page to see if it has already been deleted."
                    .to_owned(),
            ),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                "Duplicate Category Name",
                format!(
                    "The category {name} already exists. \
                    Choose a different category name, or delete the existing category.",
                ),
            ),
            Error::DuplicateAccountName(name) => (
                StatusCode::BAD_REQUEST,
                "Duplicate Account Name",
                format!(
                    "The account {name} already exists. \
                    Choose a different account name, or delete the existing account.",
                ),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        };

        (
            status_code,
            Alert::Error {
                message: message.to_owned(),
                details,
            }
            .into_html(),
        )
            .into_response()
    }
}
