//! Pages and endpoints for creating and editing monthly payments.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_accounts},
    auth::UserID,
    category::{Category, CategoryId, CategoryKind, get_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, dollar_input_styles,
    },
    monthly_payment::{
        DayOfMonth, MonthlyPayment, MonthlyPaymentBuilder, MonthlyPaymentId,
        create_monthly_payment, get_monthly_payment, update_monthly_payment,
    },
    navigation::NavBar,
};

/// The state needed to show and submit the monthly payment forms.
#[derive(Debug, Clone)]
pub struct MonthlyPaymentFormState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MonthlyPaymentFormState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a monthly payment.
#[derive(Debug, Deserialize)]
pub struct MonthlyPaymentForm {
    pub description: String,
    pub amount: f64,
    pub day_of_month: i64,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub notes: String,
    /// Checkbox, only present when ticked. Ignored when creating.
    #[serde(default)]
    pub active: Option<String>,
}

impl MonthlyPaymentForm {
    fn into_builder(self, active: bool) -> Result<MonthlyPaymentBuilder, Error> {
        Ok(
            MonthlyPaymentBuilder::new(
                &self.description,
                self.amount,
                DayOfMonth::new(self.day_of_month)?,
            )?
            .category_id(self.category_id)
            .account_id(self.account_id)
            .notes(Some(&self.notes))
            .active(active),
        )
    }
}

enum FormAction {
    Create,
    Edit(MonthlyPaymentId),
}

fn payment_form_view(
    action: FormAction,
    payment: Option<&MonthlyPayment>,
    categories: &[Category],
    accounts: &[Account],
) -> Markup {
    let description = payment.map(|payment| payment.description.as_str());
    let amount = payment.map(|payment| payment.amount.get());
    let day = payment.map(|payment| payment.day_of_month.get());
    let category_id = payment.and_then(|payment| payment.category_id);
    let account_id = payment.and_then(|payment| payment.account_id);
    let notes = payment.and_then(|payment| payment.notes.as_deref());

    let form_body = html! {
        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                id="description"
                type="text"
                name="description"
                placeholder="Rent"
                value=[description]
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper"
            {
                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[amount]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="day_of_month" class=(FORM_LABEL_STYLE) { "Due day of the month" }

            input
                id="day_of_month"
                type="number"
                name="day_of_month"
                min="1"
                max="31"
                value=[day]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select id="category_id" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "None" }

                @for category in categories.iter().filter(|category| category.kind == CategoryKind::Expense) {
                    option value=(category.id) selected[category_id == Some(category.id)]
                    {
                        (category.name)
                    }
                }
            }
        }

        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select id="account_id" name="account_id" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "None" }

                @for account in accounts {
                    option value=(account.id) selected[account_id == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }
        }

        div
        {
            label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

            textarea id="notes" name="notes" rows="2" class=(FORM_TEXT_INPUT_STYLE)
            {
                @if let Some(notes) = notes { (notes) }
            }
        }
    };

    match action {
        FormAction::Create => html! {
            form
                hx-post=(endpoints::MONTHLY_PAYMENTS_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Monthly Payment" }
            }
        },
        FormAction::Edit(payment_id) => html! {
            form
                hx-put=(format_endpoint(endpoints::MONTHLY_PAYMENT, payment_id))
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)

                div class="flex items-center gap-2"
                {
                    input
                        id="active"
                        type="checkbox"
                        name="active"
                        checked[payment.is_none_or(|payment| payment.active)]
                        class=(FORM_CHECKBOX_STYLE);
                    label for="active" class="text-sm text-gray-900 dark:text-white" { "Active" }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
            }
        },
    }
}

fn form_page(title: &str, form: Markup) -> Response {
    let nav_bar = NavBar::new(endpoints::MONTHLY_PAYMENTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { (title) }
            (form)
        }
    };

    base(title, &[dollar_input_styles()], &content).into_response()
}

fn load_options(
    user_id: UserID,
    connection: &Connection,
) -> Result<(Vec<Category>, Vec<Account>), Error> {
    Ok((
        get_categories(user_id, connection)?,
        get_accounts(user_id, connection)?,
    ))
}

/// Render the page for creating a monthly payment.
pub async fn get_new_monthly_payment_page(
    State(state): State<MonthlyPaymentFormState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (categories, accounts) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_options(user_id, &connection)?
    };

    let form = payment_form_view(FormAction::Create, None, &categories, &accounts);

    Ok(form_page("Add Monthly Payment", form))
}

/// Render the page for editing one of the user's monthly payments.
pub async fn get_edit_monthly_payment_page(
    Path(payment_id): Path<MonthlyPaymentId>,
    State(state): State<MonthlyPaymentFormState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (payment, categories, accounts) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let payment = get_monthly_payment(user_id, payment_id, &connection)?;
        let (categories, accounts) = load_options(user_id, &connection)?;

        (payment, categories, accounts)
    };

    let form = payment_form_view(
        FormAction::Edit(payment_id),
        Some(&payment),
        &categories,
        &accounts,
    );

    Ok(form_page("Edit Monthly Payment", form))
}

fn saved_response() -> Response {
    (
        HxRedirect(endpoints::MONTHLY_PAYMENTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn save_error_response(error: Error, action: &str) -> Response {
    match error {
        Error::EmptyDescription
        | Error::NonPositiveAmount(_)
        | Error::InvalidDayOfMonth(_)
        | Error::InvalidCategory(_)
        | Error::InvalidAccount(_)
        | Error::UpdateMissingMonthlyPayment => error.into_alert_response(),
        error => {
            tracing::error!("An unexpected error occurred while {action} a monthly payment: {error}");
            error.into_alert_response()
        }
    }
}

/// Handle the form for creating a monthly payment.
pub async fn create_monthly_payment_endpoint(
    State(state): State<MonthlyPaymentFormState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<MonthlyPaymentForm>,
) -> Response {
    let builder = match form.into_builder(true) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_monthly_payment(user_id, builder, &connection) {
        Ok(_) => saved_response(),
        Err(error) => save_error_response(error, "creating"),
    }
}

/// Handle the form for editing a monthly payment.
pub async fn update_monthly_payment_endpoint(
    Path(payment_id): Path<MonthlyPaymentId>,
    State(state): State<MonthlyPaymentFormState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<MonthlyPaymentForm>,
) -> Response {
    let active = form.active.is_some();
    let builder = match form.into_builder(active) {
        Ok(builder) => builder,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_monthly_payment(user_id, payment_id, builder, &connection) {
        Ok(_) => saved_response(),
        Err(error) => save_error_response(error, "updating"),
    }
}

#[cfg(test)]
mod form_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        Error,
        category::CategoryKind,
        endpoints::{self, format_endpoint},
        monthly_payment::{DayOfMonth, MonthlyPaymentBuilder, create_monthly_payment},
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_form_select,
            assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            get_test_db_connection, insert_test_category, insert_test_user, must_get_form,
            parse_html_document,
        },
    };

    use super::{
        MonthlyPaymentFormState, get_edit_monthly_payment_page, get_new_monthly_payment_page,
    };

    #[tokio::test]
    async fn new_page_offers_expense_categories() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let rent = insert_test_category(user_id, "Rent", CategoryKind::Expense, &connection);
        insert_test_category(user_id, "Salary", CategoryKind::Income, &connection);
        let state = MonthlyPaymentFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_new_monthly_payment_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::MONTHLY_PAYMENTS_API, "hx-post");
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "day_of_month", "number");
        assert_form_select(&form, "category_id", &[&rent.to_string()]);
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn edit_page_is_filled_in() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let payment = create_monthly_payment(
            user_id,
            MonthlyPaymentBuilder::new("Gym", 30.5, DayOfMonth::new(12).unwrap()).unwrap(),
            &connection,
        )
        .unwrap();
        let state = MonthlyPaymentFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_edit_monthly_payment_page(Path(payment.id), State(state), Extension(user_id))
                .await
                .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::MONTHLY_PAYMENT, payment.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "description", "text", "Gym");
        assert_form_input_with_value(&form, "amount", "number", "30.5");
        assert_form_input_with_value(&form, "day_of_month", "number", "12");
    }

    #[tokio::test]
    async fn edit_page_for_missing_payment_is_not_found() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let state = MonthlyPaymentFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let result = get_edit_monthly_payment_page(Path(3), State(state), Extension(user_id)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
