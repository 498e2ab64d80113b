//! User directory - the minimal platform user record the affiliate system reads.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};

/// Creates a platform user, optionally recording the referral code they signed up with.
///
/// The code is stored as given; callers validate it first (see `core::referral`).
pub async fn create_user<C>(
    db: &C,
    user_id: String,
    name: String,
    email: Option<String>,
    referred_by_code: Option<String>,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if user_id.trim().is_empty() {
        return Err(Error::Config {
            message: "User id cannot be empty".to_string(),
        });
    }
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "User name cannot be empty".to_string(),
        });
    }

    let user = user::ActiveModel {
        id: Set(user_id.trim().to_string()),
        name: Set(name.trim().to_string()),
        email: Set(email),
        referred_by_code: Set(referred_by_code),
        created_at: Set(chrono::Utc::now()),
    };
    user.insert(db).await.map_err(Into::into)
}

/// Finds a user by id.
pub async fn get_user<C>(db: &C, user_id: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a user by id, failing with `UserNotFound` if absent.
pub async fn require_user<C>(db: &C, user_id: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_user(&db, "  ".to_string(), "Ann".to_string(), None, None).await;
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = create_user(&db, "u1".to_string(), String::new(), None, None).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_find_user() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_user(
            &db,
            "u1".to_string(),
            " Ann Lee ".to_string(),
            Some("ann@example.com".to_string()),
            Some("XEN-ANU1-0001".to_string()),
        )
        .await?;
        assert_eq!(created.name, "Ann Lee");

        let found = get_user(&db, "u1").await?.unwrap();
        assert_eq!(found, created);
        assert!(get_user(&db, "missing").await?.is_none());
        assert!(matches!(
            require_user(&db, "missing").await,
            Err(Error::UserNotFound { .. })
        ));
        Ok(())
    }
}
