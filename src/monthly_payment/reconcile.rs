//! Matching new expenses to the monthly payments they pay for.
//!
//! When the user records an expense that looks like one of their monthly
//! payments (same category, practically the same amount and close to the due
//! day) the payment is marked as paid for the month of the expense. A match
//! must be unambiguous: if two payments fit the expense, neither is marked.

use rusqlite::Connection;

use crate::{
    Error,
    monthly_payment::{
        MonthlyPayment, MonthlyPaymentId, TrackingRecord, TrackingUpdate,
        get_active_monthly_payments_in_category, upsert_tracking_record,
    },
    period::Period,
    transaction::{Transaction, TransactionKind},
};

/// The largest difference in dollars between a payment and an expense that still matches.
///
/// The difference must be strictly less than this.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// The most days an expense may be from the due day and still match.
pub const DAY_TOLERANCE: u8 = 5;

/// A monthly payment that was marked paid by a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub payment_id: MonthlyPaymentId,
    pub description: String,
    pub tracking: TrackingRecord,
}

/// Whether `transaction` looks like a payment of `payment` in the month of the transaction.
///
/// Days are compared within the month, a transaction on the 30th is 28 days
/// from a payment due on the 2nd, not 3.
pub fn is_match(payment: &MonthlyPayment, transaction: &Transaction) -> bool {
    let due_day = payment.due_day_in(Period::from_date(transaction.date));

    (payment.amount.get() - transaction.amount).abs() < AMOUNT_TOLERANCE
        && transaction.date.day().abs_diff(due_day) <= DAY_TOLERANCE
}

/// The only candidate that matches `transaction`, if there is exactly one.
pub fn find_unique_match<'a>(
    candidates: &'a [MonthlyPayment],
    transaction: &Transaction,
) -> Option<&'a MonthlyPayment> {
    let mut matches = candidates
        .iter()
        .filter(|payment| is_match(payment, transaction));

    match (matches.next(), matches.next()) {
        (Some(payment), None) => Some(payment),
        _ => None,
    }
}

/// Mark the monthly payment that `transaction` pays for as paid.
///
/// Only expenses with a category are considered, and only active payments in
/// the same category are candidates. Returns `Ok(None)` when there is no
/// unambiguous match.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the candidates could not be read or the
/// tracking record could not be written.
pub fn reconcile_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<Option<MatchResult>, Error> {
    if transaction.kind != TransactionKind::Expense {
        return Ok(None);
    }

    let Some(category_id) = transaction.category_id else {
        return Ok(None);
    };

    let candidates =
        get_active_monthly_payments_in_category(transaction.user_id, category_id, connection)?;

    let Some(payment) = find_unique_match(&candidates, transaction) else {
        let match_count = candidates
            .iter()
            .filter(|payment| is_match(payment, transaction))
            .count();

        if match_count > 1 {
            tracing::debug!(
                "transaction {} matches {match_count} monthly payments, leaving them for the user",
                transaction.id
            );
        }

        return Ok(None);
    };

    let tracking = upsert_tracking_record(
        payment.id,
        Period::from_date(transaction.date),
        TrackingUpdate::paid_by_transaction(transaction.date, transaction.id),
        connection,
    )?;

    Ok(Some(MatchResult {
        payment_id: payment.id,
        description: payment.description.clone(),
        tracking,
    }))
}

/// Run [reconcile_transaction], logging the outcome instead of returning errors.
///
/// The transaction has already been saved by the time this runs, a failure
/// here only means the user has to mark the payment as paid themselves.
pub fn reconcile_transaction_best_effort(
    transaction: &Transaction,
    connection: &Connection,
) -> Option<MatchResult> {
    match reconcile_transaction(transaction, connection) {
        Ok(Some(result)) => {
            tracing::info!(
                "transaction {} paid monthly payment \"{}\" for {}",
                transaction.id,
                result.description,
                result.tracking.period
            );
            Some(result)
        }
        Ok(None) => None,
        Err(error) => {
            tracing::warn!(
                "could not match transaction {} to a monthly payment: {error}",
                transaction.id
            );
            None
        }
    }
}

#[cfg(test)]
mod is_match_tests {
    use time::{Date, macros::date};

    use crate::{
        auth::UserID,
        monthly_payment::{DayOfMonth, MonthlyPayment, template::PaymentAmount},
        transaction::{Transaction, TransactionKind},
    };

    use super::{find_unique_match, is_match};

    fn payment(id: i64, amount: f64, day: i64) -> MonthlyPayment {
        MonthlyPayment {
            id,
            user_id: UserID::new(1),
            description: format!("Payment {id}"),
            amount: PaymentAmount::new(amount).unwrap(),
            day_of_month: DayOfMonth::new(day).unwrap(),
            category_id: Some(1),
            account_id: None,
            active: true,
            notes: None,
        }
    }

    fn expense(amount: f64, date: Date) -> Transaction {
        Transaction {
            id: 1,
            user_id: UserID::new(1),
            kind: TransactionKind::Expense,
            amount,
            date,
            description: String::new(),
            category_id: Some(1),
            account_id: 1,
        }
    }

    #[test]
    fn matches_same_amount_two_days_late() {
        assert!(is_match(&payment(1, 100.0, 5), &expense(100.0, date!(2025 - 03 - 07))));
    }

    #[test]
    fn rejects_amount_two_cents_off() {
        assert!(!is_match(&payment(1, 100.0, 5), &expense(100.02, date!(2025 - 03 - 07))));
    }

    #[test]
    fn accepts_amount_within_a_cent() {
        assert!(is_match(&payment(1, 100.0, 5), &expense(100.005, date!(2025 - 03 - 05))));
    }

    #[test]
    fn day_tolerance_is_inclusive() {
        let payment = payment(1, 50.0, 10);

        assert!(is_match(&payment, &expense(50.0, date!(2025 - 03 - 05))));
        assert!(is_match(&payment, &expense(50.0, date!(2025 - 03 - 15))));
        assert!(!is_match(&payment, &expense(50.0, date!(2025 - 03 - 04))));
        assert!(!is_match(&payment, &expense(50.0, date!(2025 - 03 - 16))));
    }

    #[test]
    fn does_not_wrap_across_month_boundaries() {
        assert!(!is_match(&payment(1, 50.0, 2), &expense(50.0, date!(2025 - 03 - 30))));
    }

    #[test]
    fn uses_last_day_of_short_months() {
        let payment = payment(1, 50.0, 31);

        // Due on the 28th in February 2025.
        assert!(is_match(&payment, &expense(50.0, date!(2025 - 02 - 23))));
        assert!(!is_match(&payment, &expense(50.0, date!(2025 - 01 - 23))));
    }

    #[test]
    fn unique_match_requires_exactly_one_candidate() {
        let transaction = expense(100.0, date!(2025 - 03 - 07));
        let one = [payment(1, 100.0, 5), payment(2, 20.0, 5)];
        let two = [payment(1, 100.0, 5), payment(2, 100.0, 8)];
        let none = [payment(1, 100.0, 20)];

        assert_eq!(find_unique_match(&one, &transaction).map(|p| p.id), Some(1));
        assert_eq!(find_unique_match(&two, &transaction), None);
        assert_eq!(find_unique_match(&none, &transaction), None);
        assert_eq!(find_unique_match(&[], &transaction), None);
    }
}

#[cfg(test)]
mod reconcile_transaction_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        auth::UserID,
        category::{CategoryId, CategoryKind},
        monthly_payment::{
            DayOfMonth, MonthlyPaymentBuilder, TrackingUpdate, create_monthly_payment,
            get_tracking_records, upsert_tracking_record,
        },
        period::Period,
        test_utils::{
            get_test_db_connection, insert_test_account, insert_test_category, insert_test_user,
        },
        transaction::{Transaction, TransactionBuilder, TransactionKind, create_transaction},
    };

    use super::{reconcile_transaction, reconcile_transaction_best_effort};

    struct Fixture {
        connection: Connection,
        user_id: UserID,
        account_id: i64,
        subscriptions: CategoryId,
    }

    fn fixture() -> Fixture {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let subscriptions =
            insert_test_category(user_id, "Subscriptions", CategoryKind::Expense, &connection);

        Fixture {
            connection,
            user_id,
            account_id,
            subscriptions,
        }
    }

    fn insert_payment(fixture: &Fixture, amount: f64, day: i64) -> i64 {
        create_monthly_payment(
            fixture.user_id,
            MonthlyPaymentBuilder::new("Streaming", amount, DayOfMonth::new(day).unwrap())
                .unwrap()
                .category_id(Some(fixture.subscriptions)),
            &fixture.connection,
        )
        .unwrap()
        .id
    }

    fn insert_transaction(fixture: &Fixture, kind: TransactionKind, amount: f64) -> Transaction {
        create_transaction(
            fixture.user_id,
            TransactionBuilder::new(kind, amount, fixture.account_id)
                .date(date!(2025 - 03 - 07))
                .category_id(Some(fixture.subscriptions)),
            &fixture.connection,
        )
        .unwrap()
    }

    fn march_records(fixture: &Fixture, payment_ids: &[i64]) -> Vec<crate::monthly_payment::TrackingRecord> {
        get_tracking_records(
            Period::from_date(date!(2025 - 03 - 01)),
            payment_ids,
            &fixture.connection,
        )
        .unwrap()
    }

    #[test]
    fn single_match_marks_payment_paid() {
        let fixture = fixture();
        let payment_id = insert_payment(&fixture, 100.0, 5);
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.0);

        let result = reconcile_transaction(&transaction, &fixture.connection)
            .unwrap()
            .expect("want a match");

        assert_eq!(result.payment_id, payment_id);
        assert_eq!(result.description, "Streaming");
        let records = march_records(&fixture, &[payment_id]);
        assert_eq!(records, vec![result.tracking]);
        assert_eq!(records[0].period.to_string(), "2025-03");
        assert!(records[0].paid);
        assert_eq!(records[0].paid_date, Some(date!(2025 - 03 - 07)));
        assert_eq!(records[0].transaction_id, Some(transaction.id));
    }

    #[test]
    fn amount_outside_tolerance_writes_nothing() {
        let fixture = fixture();
        let payment_id = insert_payment(&fixture, 100.0, 5);
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.02);

        let result = reconcile_transaction(&transaction, &fixture.connection);

        assert_eq!(result, Ok(None));
        assert!(march_records(&fixture, &[payment_id]).is_empty());
    }

    #[test]
    fn two_matches_write_nothing() {
        let fixture = fixture();
        let first = insert_payment(&fixture, 100.0, 5);
        let second = insert_payment(&fixture, 100.0, 9);
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.0);

        let result = reconcile_transaction(&transaction, &fixture.connection);

        assert_eq!(result, Ok(None));
        assert!(march_records(&fixture, &[first, second]).is_empty());
    }

    #[test]
    fn income_and_transfers_never_match() {
        let fixture = fixture();
        let payment_id = insert_payment(&fixture, 100.0, 5);

        for kind in [TransactionKind::Income, TransactionKind::Transfer] {
            let transaction = insert_transaction(&fixture, kind, 100.0);

            assert_eq!(reconcile_transaction(&transaction, &fixture.connection), Ok(None));
        }

        assert!(march_records(&fixture, &[payment_id]).is_empty());
    }

    #[test]
    fn uncategorized_transaction_never_matches() {
        let fixture = fixture();
        let payment_id = insert_payment(&fixture, 100.0, 5);
        let transaction = create_transaction(
            fixture.user_id,
            TransactionBuilder::new(TransactionKind::Expense, 100.0, fixture.account_id)
                .date(date!(2025 - 03 - 07)),
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(reconcile_transaction(&transaction, &fixture.connection), Ok(None));
        assert!(march_records(&fixture, &[payment_id]).is_empty());
    }

    #[test]
    fn uncategorized_template_never_matches() {
        let fixture = fixture();
        let payment_id = create_monthly_payment(
            fixture.user_id,
            MonthlyPaymentBuilder::new("Streaming", 100.0, DayOfMonth::new(5).unwrap()).unwrap(),
            &fixture.connection,
        )
        .unwrap()
        .id;
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.0);

        assert_eq!(reconcile_transaction(&transaction, &fixture.connection), Ok(None));
        assert!(march_records(&fixture, &[payment_id]).is_empty());
    }

    #[test]
    fn inactive_payments_are_not_candidates() {
        let fixture = fixture();
        let payment_id = create_monthly_payment(
            fixture.user_id,
            MonthlyPaymentBuilder::new("Old", 100.0, DayOfMonth::new(5).unwrap())
                .unwrap()
                .category_id(Some(fixture.subscriptions))
                .active(false),
            &fixture.connection,
        )
        .unwrap()
        .id;
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.0);

        assert_eq!(reconcile_transaction(&transaction, &fixture.connection), Ok(None));
        assert!(march_records(&fixture, &[payment_id]).is_empty());
    }

    #[test]
    fn match_overwrites_manual_mark() {
        let fixture = fixture();
        let payment_id = insert_payment(&fixture, 100.0, 5);
        upsert_tracking_record(
            payment_id,
            Period::from_date(date!(2025 - 03 - 01)),
            TrackingUpdate::paid_manually(date!(2025 - 03 - 02)),
            &fixture.connection,
        )
        .unwrap();
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.0);

        reconcile_transaction(&transaction, &fixture.connection).unwrap();

        let records = march_records(&fixture, &[payment_id]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].paid_date, Some(date!(2025 - 03 - 07)));
        assert_eq!(records[0].transaction_id, Some(transaction.id));
    }

    #[test]
    fn best_effort_swallows_errors() {
        let fixture = fixture();
        insert_payment(&fixture, 100.0, 5);
        let transaction = insert_transaction(&fixture, TransactionKind::Expense, 100.0);
        fixture
            .connection
            .execute("DROP TABLE payment_tracking", ())
            .unwrap();

        assert_eq!(
            reconcile_transaction_best_effort(&transaction, &fixture.connection),
            None
        );
    }
}
