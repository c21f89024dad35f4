//! Database helpers for identity lookup, provisioning and login state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::types::Role;
use super::utils::is_unique_violation;

/// Identity fields needed to reconcile a verified credential.
pub(super) struct IdentityRow {
    pub(super) user_id: i64,
    pub(super) role: Role,
    pub(super) external_subject_id: Option<String>,
}

/// Outcome when provisioning a provider-verified user.
#[derive(Debug)]
pub(super) enum ProvisionOutcome {
    Created {
        user_id: i64,
        salon_id: Option<i64>,
    },
    Conflict,
}

/// Outcome when creating a manual-credential user.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created { user_id: i64 },
    Conflict,
}

/// Fields needed to check a manual login attempt.
pub(super) struct ManualAuthRow {
    pub(super) user_id: i64,
    pub(super) role: Role,
    pub(super) password_hash: String,
}

pub(super) struct ProfileRow {
    pub(super) user_id: i64,
    pub(super) full_name: Option<String>,
    pub(super) email: String,
    pub(super) phone: Option<String>,
    pub(super) role: Role,
    pub(super) profile_pic: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

fn role_from_column(row: &sqlx::postgres::PgRow, column: &str) -> Result<Role> {
    let value: String = row.get(column);
    Role::parse(&value).with_context(|| format!("unknown role in database: {value}"))
}

/// Find a user by external subject id or email. Subject-id matches take
/// priority so an email change at the provider cannot shadow an existing
/// linked account. `IS TRUE` folds the NULL comparison on unlinked rows to
/// false; without it `DESC` sorts those NULLs first and the priority flips.
pub(super) async fn lookup_identity(
    pool: &PgPool,
    external_subject_id: &str,
    email: &str,
) -> Result<Option<IdentityRow>> {
    let query = r"
        SELECT user_id, user_role, external_subject_id
        FROM users
        WHERE external_subject_id = $1 OR email = $2
        ORDER BY (external_subject_id = $1) IS TRUE DESC
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(external_subject_id)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup identity")?;

    row.map(|row| {
        Ok(IdentityRow {
            user_id: row.get("user_id"),
            role: role_from_column(&row, "user_role")?,
            external_subject_id: row.get("external_subject_id"),
        })
    })
    .transpose()
}

/// Link a provider subject id to a user matched by email only. The NULL guard
/// makes the backfill idempotent and keeps it from overwriting an existing
/// link.
pub(super) async fn backfill_subject_id(
    pool: &PgPool,
    user_id: i64,
    external_subject_id: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET external_subject_id = $2,
            updated_at = NOW()
        WHERE user_id = $1
          AND external_subject_id IS NULL
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(external_subject_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to backfill subject id")?;
    Ok(())
}

/// Create a provider-verified user and, for owners with a business name, the
/// pending salon in the same transaction.
pub(super) async fn insert_provider_user(
    pool: &PgPool,
    external_subject_id: &str,
    email: &str,
    role: Role,
    full_name: Option<&str>,
    phone: Option<&str>,
    business_name: Option<&str>,
) -> Result<ProvisionOutcome> {
    let mut tx = pool.begin().await.context("begin provision transaction")?;

    let query = r"
        INSERT INTO users
            (external_subject_id, email, full_name, phone, user_role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(external_subject_id)
        .bind(email)
        .bind(full_name)
        .bind(phone)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: i64 = match row {
        Ok(row) => row.get("user_id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(ProvisionOutcome::Conflict);
            }
            return Err(err).context("failed to insert user");
        }
    };

    let mut salon_id = None;
    if role == Role::Owner {
        if let Some(name) = business_name {
            let query = r"
                INSERT INTO salons (owner_id, name, status)
                VALUES ($1, $2, 'pending')
                RETURNING salon_id
            ";
            let span = tracing::info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = query
            );
            let row = sqlx::query(query)
                .bind(user_id)
                .bind(name)
                .fetch_one(&mut *tx)
                .instrument(span)
                .await
                .context("failed to insert salon")?;
            salon_id = Some(row.get("salon_id"));
        }
    }

    tx.commit().await.context("commit provision transaction")?;

    Ok(ProvisionOutcome::Created { user_id, salon_id })
}

/// Create a manual-credential user and their auth record in one transaction.
pub(super) async fn insert_manual_user(
    pool: &PgPool,
    full_name: &str,
    phone: &str,
    email: &str,
    password_hash: &str,
) -> Result<SignupOutcome> {
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = r"
        INSERT INTO users (email, full_name, phone, user_role)
        VALUES ($1, $2, $3, 'customer')
        RETURNING user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(full_name)
        .bind(phone)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: i64 = match row {
        Ok(row) => row.get("user_id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(SignupOutcome::Conflict);
            }
            return Err(err).context("failed to insert user");
        }
    };

    let query = r"
        INSERT INTO auth (user_id, email, password_hash)
        VALUES ($1, $2, $3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .execute(&mut *tx)
        .instrument(span)
        .await;

    if let Err(err) = result {
        if is_unique_violation(&err) {
            let _ = tx.rollback().await;
            return Ok(SignupOutcome::Conflict);
        }
        return Err(err).context("failed to insert auth record");
    }

    tx.commit().await.context("commit signup transaction")?;

    Ok(SignupOutcome::Created { user_id })
}

/// Look up the password hash and role for a manual login attempt.
pub(super) async fn lookup_manual_auth(pool: &PgPool, email: &str) -> Result<Option<ManualAuthRow>> {
    let query = r"
        SELECT auth.user_id, auth.password_hash, users.user_role
        FROM auth
        JOIN users ON users.user_id = auth.user_id
        WHERE auth.email = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup manual auth record")?;

    row.map(|row| {
        Ok(ManualAuthRow {
            user_id: row.get("user_id"),
            role: role_from_column(&row, "user_role")?,
            password_hash: row.get("password_hash"),
        })
    })
    .transpose()
}

/// Record a successful manual login for audit visibility.
pub(super) async fn record_login(pool: &PgPool, user_id: i64) -> Result<()> {
    let query = r"
        UPDATE auth
        SET last_login = NOW(),
            login_count = login_count + 1
        WHERE user_id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record login")?;
    Ok(())
}

pub(super) async fn fetch_profile(pool: &PgPool, user_id: i64) -> Result<Option<ProfileRow>> {
    let query = r"
        SELECT user_id, full_name, email, phone, user_role, profile_pic, created_at
        FROM users
        WHERE user_id = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch profile")?;

    row.map(|row| {
        Ok(ProfileRow {
            user_id: row.get("user_id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            role: role_from_column(&row, "user_role")?,
            profile_pic: row.get("profile_pic"),
            created_at: row.get("created_at"),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::{ManualAuthRow, ProvisionOutcome, SignupOutcome};
    use crate::api::handlers::auth::types::Role;

    #[test]
    fn provision_outcome_debug_names() {
        let created = ProvisionOutcome::Created {
            user_id: 1,
            salon_id: Some(2),
        };
        assert!(format!("{created:?}").starts_with("Created"));
        assert_eq!(format!("{:?}", ProvisionOutcome::Conflict), "Conflict");
    }

    #[test]
    fn signup_outcome_debug_names() {
        let created = SignupOutcome::Created { user_id: 1 };
        assert!(format!("{created:?}").starts_with("Created"));
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn manual_auth_row_holds_values() {
        let row = ManualAuthRow {
            user_id: 9,
            role: Role::Customer,
            password_hash: "$argon2id$...".to_string(),
        };
        assert_eq!(row.user_id, 9);
        assert_eq!(row.role, Role::Customer);
        assert!(row.password_hash.starts_with("$argon2id$"));
    }
}
