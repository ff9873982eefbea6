use super::*;

impl PostgresUserDirectory {
    pub(super) async fn find_user_by_username_impl(
        &self,
        username: &str,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.active,
                   COALESCE(
                       ARRAY_AGG(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
                       ARRAY[]::TEXT[]
                   ) AS roles
            FROM directory_users u
            LEFT JOIN directory_user_roles ur ON ur.user_id = u.id
            LEFT JOIN directory_roles r ON r.id = ur.role_id
            WHERE LOWER(u.username) = LOWER($1)
            GROUP BY u.id
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find user by username: {error}"))
        })?;

        row.map(User::try_from).transpose()
    }

    pub(super) async fn existing_roles_impl(
        &self,
        names: &BTreeSet<RoleName>,
    ) -> AppResult<BTreeSet<RoleName>> {
        if names.is_empty() {
            return Ok(BTreeSet::new());
        }

        let found = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM directory_roles
            WHERE name = ANY($1)
            "#,
        )
        .bind(role_names(names))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up roles: {error}")))?;

        found.into_iter().map(RoleName::new).collect()
    }
}
