//! User repository trait definition.

use clara_types::catalog::{NewUser, User};
use clara_types::error::RepositoryError;

/// Repository trait for customer records.
pub trait UserRepository: Send + Sync {
    /// Get a user by id.
    fn get_user(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by email (case-insensitive).
    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Create a user. Fails with `Conflict` if the email is taken.
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Add `delta_points` (may be negative) to the user's balance.
    ///
    /// The balance never drops below zero. Returns the new balance, or
    /// `NotFound` if the user does not exist.
    fn update_loyalty(
        &self,
        id: i64,
        delta_points: i64,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}
