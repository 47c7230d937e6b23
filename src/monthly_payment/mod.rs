//! Recurring monthly payments and whether they have been paid each month.
//!
//! A [MonthlyPayment] is a template for a bill that falls due on the same day
//! every month. Each month gets at most one [TrackingRecord] per payment,
//! written either when the user ticks the payment off or when a matching
//! expense is recorded.

mod delete;
mod due_state;
mod form;
mod notifications;
mod page;
mod reconcile;
mod summary;
mod template;
mod toggle;
mod tracking;

pub use delete::delete_monthly_payment_endpoint;
pub use due_state::{DueState, classify};
pub use form::{
    create_monthly_payment_endpoint, get_edit_monthly_payment_page, get_new_monthly_payment_page,
    update_monthly_payment_endpoint,
};
pub use notifications::{PollSequence, get_payment_notifications, notification_bell};
pub use page::get_monthly_payments_page;
pub use reconcile::reconcile_transaction_best_effort;
pub use summary::{PaymentSummary, reference_date, summarize};
pub use template::{
    DayOfMonth, MonthlyPayment, MonthlyPaymentBuilder, MonthlyPaymentId, Removal,
    create_monthly_payment, create_monthly_payment_table, delete_or_deactivate_monthly_payment,
    get_active_monthly_payments, get_active_monthly_payments_in_category,
    get_all_monthly_payments, get_monthly_payment, update_monthly_payment,
};
pub use toggle::{mark_payment_paid, mark_payment_unpaid};
pub use tracking::{
    TrackingRecord, TrackingUpdate, create_payment_tracking_table, get_tracking_records,
    upsert_tracking_record,
};

pub(crate) use notifications::load_current_period;
