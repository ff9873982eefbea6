use super::*;

impl PostgresUserDirectory {
    pub(super) async fn add_user_impl(&self, user: NewUser) -> AppResult<User> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start user transaction: {error}"))
        })?;

        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO directory_users (id, username, first_name, last_name, email, active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| username_conflict_or_internal(error, "add user"))?;

        Self::assign_roles(&mut transaction, id, &user.roles).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit user transaction: {error}"))
        })?;

        Ok(User::new(
            UserId::from_uuid(id),
            user.username,
            user.first_name,
            user.last_name,
            user.email,
            user.roles,
        ))
    }

    pub(super) async fn record_login_impl(&self, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE directory_users
            SET last_login = now(), login_count = login_count + 1
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record login: {error}")))?;

        Ok(())
    }
}
