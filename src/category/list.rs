//! The page listing a user's categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{CategoryKind, db::CategoryWithCount, get_categories_with_counts},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links, link,
    },
    navigation::NavBar,
};

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the list of the user's categories.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_categories_with_counts(user_id, &connection)?
    };

    Ok(categories_view(&categories).into_response())
}

fn categories_view(categories: &[CategoryWithCount]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryWithCount| {
        let category = &row.category;
        let edit_url = format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
        let delete_url = format_endpoint(endpoints::CATEGORY, category.id);
        let confirm_message = format!(
            "Are you sure you want to delete the category '{}'? \
            Its transactions will be left uncategorized.",
            category.name
        );

        html! {
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (category.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) data-kind=(category.kind.as_str())
                    {
                        (category.kind.label())
                    }
                }

                td class="px-6 py-4 text-right" { (row.transaction_count) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex items-center gap-4"
                    {
                        (edit_delete_action_links(&edit_url, &delete_url, &confirm_message, "closest tr"))
                    }
                }
            }
        }
    };

    let income_count = categories
        .iter()
        .filter(|row| row.category.kind == CategoryKind::Income)
        .count();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Add Category"
                    }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (income_count) " income, " (categories.len() - income_count) " expense"
                }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class="px-6 py-3 text-right" { "Transactions" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in categories {
                            (table_row(row))
                        }

                        @if categories.is_empty() {
                            tr
                            {
                                td colspan="4" class="px-6 py-4 text-center"
                                {
                                    "No categories yet. Create a category "
                                    (link(endpoints::NEW_CATEGORY_VIEW, "here"))
                                    "."
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Categories", &[], &content)
}
