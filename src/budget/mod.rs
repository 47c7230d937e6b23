//! Monthly spending limits per category.

mod core;
mod delete;
mod page;

pub use core::{
    BudgetId, BudgetProgress, create_budget_table, delete_budget, get_budgets_with_spending,
    upsert_budget,
};
pub use delete::delete_budget_endpoint;
pub use page::{get_budgets_page, set_budget_endpoint};
