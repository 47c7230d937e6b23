//! The sections of the dashboard.

use maud::{Markup, html};

use crate::{
    account::AccountBalance,
    budget::BudgetProgress,
    dashboard::{CategoryTotal, MonthlyTotals},
    endpoints,
    html::{
        CARD_STYLE, CARD_TITLE_STYLE, CARD_VALUE_STYLE, LINK_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency, link,
    },
    monthly_payment::PaymentSummary,
    transaction::TransactionRow,
};

fn card(name: &str, title: &str, value: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-card=(name)
        {
            p class=(CARD_TITLE_STYLE) { (title) }
            p class=(CARD_VALUE_STYLE) data-value { (value) }
        }
    }
}

pub(super) fn totals_cards(totals: MonthlyTotals) -> Markup {
    html! {
        div class="grid grid-cols-2 md:grid-cols-4 gap-4"
        {
            (card("income", "Income", &format_currency(totals.income)))
            (card("expense", "Expenses", &format_currency(totals.expense)))
            (card("balance", "Balance", &format_currency(totals.balance())))
            (card("savings-rate", "Savings Rate", &format!("{:.1}%", totals.savings_rate())))
        }
    }
}

pub(super) fn payment_summary_card(summary: PaymentSummary) -> Markup {
    html! {
        section class={ (CARD_STYLE) " space-y-2" } data-section="monthly-payments"
        {
            header class="flex justify-between items-baseline"
            {
                h2 class="text-lg font-semibold" { "Monthly Payments" }
                (link(endpoints::MONTHLY_PAYMENTS_VIEW, "View all"))
            }

            @if summary.total_count == 0 {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No monthly payments yet. Add one "
                    (link(endpoints::NEW_MONTHLY_PAYMENT_VIEW, "here"))
                    "."
                }
            } @else {
                dl class="grid grid-cols-3 gap-2 text-sm"
                {
                    div
                    {
                        dt class=(CARD_TITLE_STYLE) { "Paid" }
                        dd class="font-semibold" data-paid { (summary.paid_count) " / " (summary.total_count) }
                    }
                    div
                    {
                        dt class=(CARD_TITLE_STYLE) { "Pending" }
                        dd class="font-semibold" data-pending { (format_currency(summary.pending_amount)) }
                    }
                    div
                    {
                        dt class=(CARD_TITLE_STYLE) { "Overdue" }
                        dd class="font-semibold" data-overdue { (summary.overdue_count) }
                    }
                }
            }
        }
    }
}

pub(super) fn category_spending_table(spending: &[CategoryTotal]) -> Markup {
    html! {
        section class="space-y-2" data-section="spending"
        {
            h2 class="text-lg font-semibold" { "Spending by Category" }

            @if spending.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400" { "No expenses this month." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class="px-6 py-3 text-right" { "Spent" }
                        }
                    }

                    tbody
                    {
                        @for row in spending {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                                {
                                    (row.category_name)
                                }
                                td class="px-6 py-4 text-right" data-spent { (format_currency(row.total)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn account_balances_list(accounts: &[AccountBalance]) -> Markup {
    html! {
        section class="space-y-2" data-section="accounts"
        {
            h2 class="text-lg font-semibold" { "Accounts" }

            @if accounts.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No accounts yet. Add one "
                    (link(endpoints::NEW_ACCOUNT_VIEW, "here"))
                    "."
                }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for row in accounts {
                        li class="flex justify-between py-2"
                        {
                            span { (row.account.name) }
                            span class="font-semibold" data-balance { (format_currency(row.balance)) }
                        }
                    }
                }
            }
        }
    }
}

/// Budgets that have been used up. Renders nothing when there are none.
pub(super) fn budget_alerts(exceeded: &[BudgetProgress]) -> Markup {
    if exceeded.is_empty() {
        return html! {};
    }

    html! {
        section
            class="p-4 rounded-lg text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400"
            data-section="budget-alerts"
            role="alert"
        {
            h2 class="font-semibold" { "Budget alerts" }

            ul class="mt-2 text-sm list-disc list-inside"
            {
                @for progress in exceeded {
                    li data-budget-alert
                    {
                        (progress.category_name) ": "
                        (format_currency(progress.spent)) " of "
                        (format_currency(progress.budget.amount))
                        " (" (format!("{:.0}%", progress.percent_used())) ")"
                    }
                }
            }

            a href=(endpoints::BUDGETS_VIEW) class={ "block mt-2 text-sm " (LINK_STYLE) } { "Review budgets" }
        }
    }
}

pub(super) fn recent_transactions_list(rows: &[TransactionRow]) -> Markup {
    html! {
        section class="space-y-2" data-section="recent-transactions"
        {
            header class="flex justify-between items-baseline"
            {
                h2 class="text-lg font-semibold" { "Recent Transactions" }
                (link(endpoints::TRANSACTIONS_VIEW, "View all"))
            }

            @if rows.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No transactions yet. Add one "
                    (link(endpoints::NEW_TRANSACTION_VIEW, "here"))
                    "."
                }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    tbody
                    {
                        @for row in rows {
                            tr class=(TABLE_ROW_STYLE) data-recent
                            {
                                td class=(TABLE_CELL_STYLE) { (row.transaction.date) }
                                td class=(TABLE_CELL_STYLE) { (row.transaction.description) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (row.category_name.as_deref().unwrap_or("Uncategorized"))
                                }
                                td class="px-6 py-4 text-right" data-amount
                                {
                                    (row.transaction.formatted_amount())
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
