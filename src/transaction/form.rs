//! The form shared by the new and edit transaction pages.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, get_accounts},
    auth::UserID,
    category::{Category, CategoryId, get_categories},
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::{Transaction, TransactionBuilder, TransactionId, TransactionKind},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Whether the money came in, went out or moved between accounts.
    pub kind: TransactionKind,
    /// The value of the transaction in dollars.
    pub amount: f64,
    /// When the transaction occurred.
    pub date: Date,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
    /// The category, an empty selection leaves the transaction uncategorized.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
}

impl TransactionForm {
    /// Check the date against `today` and turn the form into a builder.
    ///
    /// # Errors
    ///
    /// Returns [Error::FutureDate] if the date is after `today`.
    pub(super) fn into_builder(self, today: Date) -> Result<TransactionBuilder, Error> {
        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(TransactionBuilder::new(self.kind, self.amount, self.account_id)
            .date(self.date)
            .description(&self.description)
            .category_id(self.category_id))
    }
}

pub(super) enum FormAction {
    Create,
    Edit(TransactionId),
}

pub(super) fn load_options(
    user_id: UserID,
    connection: &Connection,
) -> Result<(Vec<Category>, Vec<Account>), Error> {
    Ok((
        get_categories(user_id, connection)?,
        get_accounts(user_id, connection)?,
    ))
}

/// The transaction form, filled in with `transaction` when given.
///
/// New transactions default to `max_date`, dates after it cannot be picked.
pub(super) fn transaction_form_view(
    action: FormAction,
    transaction: Option<&Transaction>,
    max_date: Date,
    categories: &[Category],
    accounts: &[Account],
) -> Markup {
    let kind = transaction.map(|transaction| transaction.kind);
    let amount = transaction.map(|transaction| transaction.amount);
    let date = transaction.map_or(max_date, |transaction| transaction.date);
    let description = transaction.map(|transaction| transaction.description.as_str());
    let category_id = transaction.and_then(|transaction| transaction.category_id);
    let account_id = transaction.map(|transaction| transaction.account_id);

    let form_body = html! {
        div
        {
            label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

            select id="kind" name="kind" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for option_kind in TransactionKind::ALL {
                    option value=(option_kind.as_str()) selected[kind == Some(option_kind)]
                    {
                        (option_kind.label())
                    }
                }
            }
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
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                id="date"
                type="date"
                name="date"
                value=(date)
                max=(max_date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                id="description"
                type="text"
                name="description"
                placeholder="Description"
                value=[description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select id="category_id" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Uncategorized" }

                @for category in categories {
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

            select id="account_id" name="account_id" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for account in accounts {
                    option value=(account.id) selected[account_id == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }
        }
    };

    match action {
        FormAction::Create => html! {
            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Transaction" }
            }
        },
        FormAction::Edit(transaction_id) => html! {
            form
                hx-put=(format_endpoint(endpoints::TRANSACTION, transaction_id))
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
            }
        },
    }
}

#[cfg(test)]
mod transaction_form_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{TransactionKind, form::TransactionForm},
    };

    fn form(date: time::Date) -> TransactionForm {
        TransactionForm {
            kind: TransactionKind::Expense,
            amount: 5.0,
            date,
            description: String::new(),
            category_id: None,
            account_id: 1,
        }
    }

    #[test]
    fn accepts_today() {
        assert!(form(date!(2025 - 03 - 07)).into_builder(date!(2025 - 03 - 07)).is_ok());
    }

    #[test]
    fn rejects_tomorrow() {
        let result = form(date!(2025 - 03 - 08)).into_builder(date!(2025 - 03 - 07));

        assert!(matches!(result, Err(Error::FutureDate(_))));
    }
}
