//! User-defined categories for grouping income and expenses.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    create_category, create_category_table, get_categories, get_categories_with_counts,
    update_category, validate_category_id,
};
pub use delete::delete_category_endpoint;
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use domain::{Category, CategoryId, CategoryKind, CategoryName};
pub use list::get_categories_page;

pub(crate) use db::{delete_category, get_category};
