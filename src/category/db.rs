//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryKind, CategoryName},
};

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the user already has a category called `name`.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    let id = connection
        .query_row(
            "INSERT INTO category (user_id, name, kind) VALUES (?1, ?2, ?3) RETURNING id",
            (user_id.as_i64(), name.as_ref(), kind),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateCategoryName(name.to_string())
            }
            error => error.into(),
        })?;

    Ok(Category {
        id,
        user_id,
        name,
        kind,
    })
}

/// Retrieve one of the user's categories by ID.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, user_id, name, kind FROM category WHERE id = ?1 AND user_id = ?2")?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Rename one of the user's categories and change its kind.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateCategoryName] if another of the user's categories is called `name`,
/// - [Error::UpdateMissingCategory] if the category does not exist.
pub fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, kind = ?2 WHERE id = ?3 AND user_id = ?4",
            (name.as_ref(), kind, category_id, user_id.as_i64()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateCategoryName(name.to_string())
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(Category {
        id: category_id,
        user_id,
        name,
        kind,
    })
}

/// Retrieve all of the user's categories, income first, then alphabetically by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category WHERE user_id = ?1
            ORDER BY kind DESC, name ASC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// A category along with how many transactions use it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithCount {
    pub category: Category,
    pub transaction_count: i64,
}

/// Retrieve the user's categories with the number of transactions in each.
pub fn get_categories_with_counts(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CategoryWithCount>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.user_id, c.name, c.kind, COUNT(t.id)
            FROM category c
            LEFT JOIN \"transaction\" t ON t.category_id = c.id
            WHERE c.user_id = ?1
            GROUP BY c.id
            ORDER BY c.kind DESC, c.name ASC",
        )?
        .query_map([user_id.as_i64()], |row| {
            Ok(CategoryWithCount {
                category: map_row(row)?,
                transaction_count: row.get(4)?,
            })
        })?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Check that `category_id`, if given, refers to one of the user's categories.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category does not exist or belongs to another user.
pub fn validate_category_id(
    user_id: UserID,
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(id) = category_id else {
        return Ok(());
    };

    match get_category(user_id, id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidCategory(category_id)),
        Err(error) => Err(error),
    }
}

/// Delete one of the user's categories.
///
/// Transactions, budgets and monthly payments that used the category are
/// handled by the foreign key clauses on their tables.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCategory] if the category doesn't exist.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            UNIQUE(user_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let raw_name: String = row.get(2)?;
    let kind = row.get(3)?;

    Ok(Category {
        id,
        user_id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
    })
}

#[cfg(test)]
mod category_query_tests {
    use crate::{
        Error,
        auth::UserID,
        category::{
            CategoryKind, CategoryName, create_category, delete_category, get_categories,
            get_categories_with_counts, get_category, update_category, validate_category_id,
        },
        test_utils::{get_test_db_connection, insert_test_account, insert_test_user},
        transaction::{TransactionBuilder, TransactionKind, create_transaction},
    };

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let name = CategoryName::new("Rent").unwrap();

        let category = create_category(user_id, name.clone(), CategoryKind::Expense, &connection)
            .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, name);
        assert_eq!(category.kind, CategoryKind::Expense);
        assert_eq!(get_category(user_id, category.id, &connection), Ok(category));
    }

    #[test]
    fn create_category_fails_on_duplicate_name() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        let result = create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateCategoryName("Rent".to_owned())));
    }

    #[test]
    fn categories_are_isolated_per_user() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let other_user_id = UserID::new(user_id.as_i64() + 1);
        connection
            .execute(
                "INSERT INTO user (id, email, password) VALUES (?1, 'other@test.com', 'hash')",
                [other_user_id.as_i64()],
            )
            .unwrap();
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_category(other_user_id, category.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_categories(other_user_id, &connection), Ok(vec![]));
        assert_eq!(
            validate_category_id(other_user_id, Some(category.id), &connection),
            Err(Error::InvalidCategory(Some(category.id)))
        );
        assert_eq!(
            delete_category(other_user_id, category.id, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn validate_accepts_no_category() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);

        assert_eq!(validate_category_id(user_id, None, &connection), Ok(()));
    }

    #[test]
    fn counts_transactions_per_category() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let rent = create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        let salary = create_category(
            user_id,
            CategoryName::new_unchecked("Salary"),
            CategoryKind::Income,
            &connection,
        )
        .unwrap();
        for _ in 0..2 {
            create_transaction(
                user_id,
                TransactionBuilder::new(TransactionKind::Expense, 100.0, account_id)
                    .category_id(Some(rent.id)),
                &connection,
            )
            .unwrap();
        }

        let got = get_categories_with_counts(user_id, &connection).unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].category, salary);
        assert_eq!(got[0].transaction_count, 0);
        assert_eq!(got[1].category, rent);
        assert_eq!(got[1].transaction_count, 2);
    }

    #[test]
    fn delete_category_clears_transaction_category() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let account_id = insert_test_account(user_id, &connection);
        let rent = create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        let transaction = create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 100.0, account_id)
                .category_id(Some(rent.id)),
            &connection,
        )
        .unwrap();

        delete_category(user_id, rent.id, &connection).unwrap();

        let category_id: Option<i64> = connection
            .query_row(
                "SELECT category_id FROM \"transaction\" WHERE id = ?1",
                [transaction.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(category_id, None);
    }

    #[test]
    fn update_category_succeeds() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Bonus"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        let updated = update_category(
            user_id,
            category.id,
            CategoryName::new_unchecked("Side Income"),
            CategoryKind::Income,
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, CategoryName::new_unchecked("Side Income"));
        assert_eq!(updated.kind, CategoryKind::Income);
        assert_eq!(get_category(user_id, category.id, &connection), Ok(updated));
    }

    #[test]
    fn update_category_fails_on_duplicate_name() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        let food = create_category(
            user_id,
            CategoryName::new_unchecked("Food"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        let result = update_category(
            user_id,
            food.id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateCategoryName("Rent".to_owned())));
    }

    #[test]
    fn update_category_fails_on_other_users_category() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection);
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Rent"),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        let result = update_category(
            UserID::new(user_id.as_i64() + 1),
            category.id,
            CategoryName::new_unchecked("Mortgage"),
            CategoryKind::Expense,
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }
}
