//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{CategoryId, CategoryKind, CategoryName, create_category, domain::CategoryFormData},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();
    let form = new_category_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &[], &content).into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => {
            return new_category_form_view(&format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(user_id, name, form.kind, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::DuplicateCategoryName(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_alert_response()
        }
    }
}

fn new_category_form_view(error_message: &str) -> Markup {
    category_form_view(None, "", CategoryKind::Expense, error_message)
}

/// The category form, it edits the category with `category_id` when given.
pub(super) fn category_form_view(
    category_id: Option<CategoryId>,
    name: &str,
    kind: CategoryKind,
    error_message: &str,
) -> Markup {
    let form_body = html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Category Name" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Groceries"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

            select id="kind" name="kind" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for option_kind in [CategoryKind::Expense, CategoryKind::Income] {
                    option value=(option_kind.as_str()) selected[option_kind == kind]
                    {
                        (option_kind.label())
                    }
                }
            }
        }

        @if !error_message.is_empty() {
            p class="text-red-600 dark:text-red-400" { (error_message) }
        }
    };

    match category_id {
        None => html! {
            form
                hx-post=(endpoints::CATEGORIES_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
            }
        },
        Some(category_id) => html! {
            form
                hx-put=(format_endpoint(endpoints::CATEGORY, category_id))
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Category" }
            }
        },
    }
}

#[cfg(test)]
mod new_category_page_tests {
    use axum::http::StatusCode;

    use crate::{
        category::get_new_category_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_select, assert_form_submit_button,
            assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_category_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CATEGORIES_API, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_select(&form, "kind", &["expense", "income"]);
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        category::{
            CategoryKind, CategoryName, create::CreateCategoryState, create_category_endpoint,
            domain::CategoryFormData, get_categories,
        },
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html,
            get_test_db_connection, insert_test_user, must_get_form, parse_html_fragment,
        },
    };

    #[tokio::test]
    async fn can_create_category() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = CategoryFormData {
            name: "Groceries".to_owned(),
            kind: CategoryKind::Expense,
        };

        let response =
            create_category_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let categories = get_categories(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, CategoryName::new_unchecked("Groceries"));
    }

    #[tokio::test]
    async fn create_category_fails_on_empty_name() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = CategoryFormData {
            name: " ".to_owned(),
            kind: CategoryKind::Income,
        };

        let response = create_category_endpoint(State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Category name cannot be empty");
    }
}
