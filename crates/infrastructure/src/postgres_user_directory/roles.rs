use sqlx::{Postgres, Transaction};

use super::*;

impl PostgresUserDirectory {
    /// Creates any of `names` that do not exist yet.
    pub async fn ensure_roles(&self, names: &BTreeSet<RoleName>) -> AppResult<()> {
        for name in names {
            sqlx::query(
                r#"
                INSERT INTO directory_roles (id, name)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to ensure role '{name}': {error}")))?;
        }

        Ok(())
    }

    pub(super) async fn update_user_roles_impl(
        &self,
        user_id: UserId,
        roles: &BTreeSet<RoleName>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start role transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            DELETE FROM directory_user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear user roles: {error}")))?;

        Self::assign_roles(&mut transaction, user_id.as_uuid(), roles).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role transaction: {error}"))
        })
    }

    pub(super) async fn assign_roles(
        transaction: &mut Transaction<'_, Postgres>,
        user_id: uuid::Uuid,
        roles: &BTreeSet<RoleName>,
    ) -> AppResult<()> {
        if roles.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO directory_user_roles (user_id, role_id)
            SELECT $1, id
            FROM directory_roles
            WHERE name = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_names(roles))
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign user roles: {error}")))?;

        Ok(())
    }
}
