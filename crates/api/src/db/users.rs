//! User repository: accounts and their customer/staff extensions.

use fk_designers_core::{Email, PageRequest, UserId};
use tracing::instrument;

use super::{Database, RepositoryError};
use crate::models::{
    CustomerProfile, CustomerSummary, NewUser, Profile, StaffProfile, StaffSummary, UserRecord,
};

const INSERT_USER: &str = r"
    INSERT INTO users (first_name, last_name, email, phone, password_hash, role, is_active)
    VALUES ($1, $2, $3, $4, $5, $6, TRUE)
    RETURNING user_id, first_name, last_name, email, phone, password_hash, role,
              is_active, created_at, updated_at
";

const INSERT_STAFF: &str = r"
    INSERT INTO staff (user_id, position, department, start_date)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (user_id) DO NOTHING
";

/// Repository for account operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Look up an account by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, RepositoryError> {
        self.db
            .run("find_user_by_email", |pool| async move {
                sqlx::query_as::<_, UserRecord>(
                    r"
                    SELECT user_id, first_name, last_name, email, phone, password_hash, role,
                           is_active, created_at, updated_at
                    FROM users
                    WHERE LOWER(email) = LOWER($1)
                    ",
                )
                .bind(email.as_str())
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        self.db
            .run("find_user_by_id", |pool| async move {
                sqlx::query_as::<_, UserRecord>(
                    r"
                    SELECT user_id, first_name, last_name, email, phone, password_hash, role,
                           is_active, created_at, updated_at
                    FROM users
                    WHERE user_id = $1
                    ",
                )
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    /// Insert a customer account and its `customers` row in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_customer(
        &self,
        user: &NewUser,
        profile: &CustomerProfile,
    ) -> Result<UserRecord, RepositoryError> {
        self.db
            .run("create_customer", |pool| async move {
                let mut tx = pool.begin().await?;
                let record = insert_user(&mut tx, user).await?;
                sqlx::query(
                    r"
                    INSERT INTO customers (user_id, date_of_birth, address_1, address_2)
                    VALUES ($1, $2, $3, $4)
                    ",
                )
                .bind(record.user_id)
                .bind(profile.date_of_birth)
                .bind(profile.address_1.as_deref())
                .bind(profile.address_2.as_deref())
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(record)
            })
            .await
    }

    /// Insert a staff or admin account and its `staff` row in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_staff(
        &self,
        user: &NewUser,
        staff: &StaffProfile,
    ) -> Result<UserRecord, RepositoryError> {
        self.db
            .run("create_staff", |pool| async move {
                let mut tx = pool.begin().await?;
                let record = insert_user(&mut tx, user).await?;
                insert_staff(&mut tx, record.user_id, staff).await?;
                tx.commit().await?;
                Ok(record)
            })
            .await
    }

    /// Make sure `user.email` is an active admin with `user.password_hash`.
    ///
    /// An existing account (any role) is promoted in place; otherwise a new
    /// account and `staff` row are inserted. Returns the account and whether
    /// it was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    #[instrument(skip(self, user, staff), fields(email = %user.email))]
    pub async fn ensure_admin(
        &self,
        user: &NewUser,
        staff: &StaffProfile,
    ) -> Result<(UserRecord, bool), RepositoryError> {
        self.db
            .run("ensure_admin", |pool| async move {
                let mut tx = pool.begin().await?;
                let promoted = sqlx::query_as::<_, UserRecord>(
                    r"
                    UPDATE users
                    SET password_hash = $2, role = 'admin', is_active = TRUE, updated_at = NOW()
                    WHERE LOWER(email) = LOWER($1)
                    RETURNING user_id, first_name, last_name, email, phone, password_hash, role,
                              is_active, created_at, updated_at
                    ",
                )
                .bind(user.email.as_str())
                .bind(user.password_hash.as_str())
                .fetch_optional(&mut *tx)
                .await?;

                let (record, created) = match promoted {
                    Some(record) => (record, false),
                    None => (insert_user(&mut tx, user).await?, true),
                };
                insert_staff(&mut tx, record.user_id, staff).await?;
                tx.commit().await?;
                Ok((record, created))
            })
            .await
    }

    /// Account joined with its customer details, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        self.db
            .run("user_profile", |pool| async move {
                sqlx::query_as::<_, Profile>(
                    r"
                    SELECT u.user_id, u.first_name, u.last_name, u.email, u.phone, u.role,
                           u.is_active, u.created_at,
                           c.date_of_birth, c.address_1, c.address_2
                    FROM users u
                    LEFT JOIN customers c ON c.user_id = u.user_id
                    WHERE u.user_id = $1
                    ",
                )
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    /// One page of customers, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_customers(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<CustomerSummary>, i64), RepositoryError> {
        let limit = i64::from(page.limit());
        let offset = page.offset();

        let rows = self.db.run("list_customers", |pool| async move {
            sqlx::query_as::<_, CustomerSummary>(
                r"
                SELECT u.user_id, u.first_name, u.last_name, u.email, u.phone, u.is_active,
                       u.created_at, c.customer_id, c.date_of_birth, c.address_1, c.address_2
                FROM users u
                JOIN customers c ON c.user_id = u.user_id
                WHERE u.role = 'customer'
                ORDER BY u.created_at DESC
                LIMIT $1 OFFSET $2
                ",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&pool)
            .await
        });
        let total = self.db.run("count_customers", |pool| async move {
            sqlx::query_scalar::<_, i64>(
                r"
                SELECT COUNT(*)
                FROM users u
                JOIN customers c ON c.user_id = u.user_id
                WHERE u.role = 'customer'
                ",
            )
            .fetch_one(&pool)
            .await
        });

        tokio::try_join!(rows, total)
    }

    /// Every staff and admin account with its staff record, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_staff(&self) -> Result<Vec<StaffSummary>, RepositoryError> {
        self.db
            .run("list_staff", |pool| async move {
                sqlx::query_as::<_, StaffSummary>(
                    r"
                    SELECT u.user_id, u.first_name, u.last_name, u.email, u.phone, u.role,
                           u.is_active, u.created_at,
                           s.staff_id, s.position, s.department, s.start_date
                    FROM users u
                    JOIN staff s ON s.user_id = u.user_id
                    WHERE u.role IN ('staff', 'admin')
                    ORDER BY u.created_at DESC
                    ",
                )
                .fetch_all(&pool)
                .await
            })
            .await
    }

    /// Activate or deactivate an account. `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        user_id: UserId,
        is_active: bool,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        self.db
            .run("set_user_active", |pool| async move {
                sqlx::query_as::<_, UserRecord>(
                    r"
                    UPDATE users
                    SET is_active = $2, updated_at = NOW()
                    WHERE user_id = $1
                    RETURNING user_id, first_name, last_name, email, phone, password_hash, role,
                              is_active, created_at, updated_at
                    ",
                )
                .bind(user_id)
                .bind(is_active)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    /// [`UserRepository::set_active`] keyed by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_active_by_email(
        &self,
        email: &Email,
        is_active: bool,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        self.set_active(user.user_id, is_active).await
    }
}

async fn insert_user(
    tx: &mut sqlx::PgConnection,
    user: &NewUser,
) -> Result<UserRecord, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(INSERT_USER)
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.email.as_str())
        .bind(user.phone.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await
}

async fn insert_staff(
    tx: &mut sqlx::PgConnection,
    user_id: UserId,
    staff: &StaffProfile,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_STAFF)
        .bind(user_id)
        .bind(staff.position.as_str())
        .bind(staff.department.as_str())
        .bind(staff.start_date)
        .execute(&mut *tx)
        .await?;
    Ok(())
}
