use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    account::{AccountId, AccountKind, create_account},
    auth::{PasswordHash, UserID, create_user},
    category::{CategoryId, CategoryKind, CategoryName, create_category},
    db::initialize,
};

/// An in-memory database with every table created.
pub(crate) fn get_test_db_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection) -> UserID {
    create_user(
        EmailAddress::from_str("test@test.com").unwrap(),
        PasswordHash::new_unchecked("not a real hash"),
        connection,
    )
    .expect("Could not create test user")
    .id
}

#[track_caller]
pub(crate) fn insert_test_category(
    user_id: UserID,
    name: &str,
    kind: CategoryKind,
    connection: &Connection,
) -> CategoryId {
    create_category(user_id, CategoryName::new_unchecked(name), kind, connection)
        .expect("Could not create test category")
        .id
}

#[track_caller]
pub(crate) fn insert_test_account(user_id: UserID, connection: &Connection) -> AccountId {
    create_account(user_id, "Everyday", AccountKind::Debit, 0.0, connection)
        .expect("Could not create test account")
        .id
}
