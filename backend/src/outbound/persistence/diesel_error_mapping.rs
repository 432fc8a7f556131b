//! Shared Diesel error mapping for the entity store repositories.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// `NotFound` and query-builder failures map to query errors; a closed
/// connection maps to the transient connection error.
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    log_diesel_error(&error);

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DeserializationError(_) => query("stored row could not be decoded"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Like [`map_basic_diesel_error`], but a serialisation failure or deadlock
/// in a transaction maps to the transient contention error so callers retry.
pub fn map_transactional_diesel_error<E, Q, C, R>(
    error: diesel::result::Error,
    query: Q,
    connection: C,
    contention: R,
) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
    R: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, ref info) => {
            debug!(message = info.message(), "transaction lost a race");
            contention("transaction conflicted with a concurrent writer")
        }
        other => map_basic_diesel_error(other, query, connection),
    }
}

fn log_diesel_error(error: &diesel::result::Error) {
    use diesel::result::Error as DieselError;

    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
        Contention(String),
    }

    fn transactional(error: DieselError) -> Mapped {
        map_transactional_diesel_error(
            error,
            |m| Mapped::Query(m.to_owned()),
            |m| Mapped::Connection(m.to_owned()),
            |m| Mapped::Contention(m.to_owned()),
        )
    }

    fn database_error(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new("boom".to_owned()))
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let mapped = map_basic_pool_error(PoolError::checkout("timed out"), Mapped::Connection);
        assert_eq!(mapped, Mapped::Connection("timed out".to_owned()));
    }

    #[rstest]
    #[case(DieselError::NotFound, Mapped::Query("record not found".to_owned()))]
    #[case(
        database_error(DatabaseErrorKind::ClosedConnection),
        Mapped::Connection("database connection error".to_owned())
    )]
    #[case(
        database_error(DatabaseErrorKind::UniqueViolation),
        Mapped::Query("database error".to_owned())
    )]
    #[case(
        DieselError::DeserializationError("bad status".into()),
        Mapped::Query("stored row could not be decoded".to_owned())
    )]
    fn diesel_errors_map_by_kind(#[case] error: DieselError, #[case] expected: Mapped) {
        assert_eq!(transactional(error), expected);
    }

    #[rstest]
    fn serialisation_failures_are_contention() {
        let mapped = transactional(database_error(DatabaseErrorKind::SerializationFailure));
        assert!(matches!(mapped, Mapped::Contention(_)));
    }
}
