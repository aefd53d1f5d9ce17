use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;

use warden_application::{CreateRoleInput, RoleRepository};
use warden_core::{AppError, AppResult, RoleId};
use warden_domain::{AccessLevel, FieldRule, Role, RuleSet, Scope, ScopeRule};

/// PostgreSQL-backed repository for roles and their scope rules.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Role, scope rule and field rule reads must observe one commit.
    async fn begin_snapshot(&self) -> AppResult<Transaction<'_, Postgres>> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to set snapshot isolation: {error}"))
            })?;

        Ok(transaction)
    }
}

async fn finish_snapshot(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to finish read snapshot: {error}")))
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    name: String,
    description: Option<String>,
    is_super: bool,
}

#[derive(Debug, FromRow)]
struct ScopeRuleRow {
    role_id: uuid::Uuid,
    scope: String,
    access_level: String,
}

#[derive(Debug, FromRow)]
struct FieldRuleRow {
    role_id: uuid::Uuid,
    scope: String,
    field_name: String,
    access_level: String,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let mut transaction = self.begin_snapshot().await?;

        let Some(role_row) = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, is_super
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?
        else {
            return Ok(None);
        };

        let scope_rows = sqlx::query_as::<_, ScopeRuleRow>(
            r#"
            SELECT role_id, scope, access_level
            FROM rbac_scope_rules
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load scope rules: {error}")))?;

        let field_rows = sqlx::query_as::<_, FieldRuleRow>(
            r#"
            SELECT role_id, scope, field_name, access_level
            FROM rbac_field_rules
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load field rules: {error}")))?;

        finish_snapshot(transaction).await?;

        let rules = build_rule_set(role_id, scope_rows, field_rows)?;
        Ok(Some(role_from_row(role_row, rules)?))
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut transaction = self.begin_snapshot().await?;

        let role_rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, is_super
            FROM rbac_roles
            ORDER BY lower(name)
            "#,
        )
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let scope_rows = sqlx::query_as::<_, ScopeRuleRow>(
            r#"
            SELECT role_id, scope, access_level
            FROM rbac_scope_rules
            "#,
        )
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list scope rules: {error}")))?;

        let field_rows = sqlx::query_as::<_, FieldRuleRow>(
            r#"
            SELECT role_id, scope, field_name, access_level
            FROM rbac_field_rules
            "#,
        )
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list field rules: {error}")))?;

        finish_snapshot(transaction).await?;

        let mut scope_rows_by_role: HashMap<uuid::Uuid, Vec<ScopeRuleRow>> = HashMap::new();
        for row in scope_rows {
            scope_rows_by_role.entry(row.role_id).or_default().push(row);
        }
        let mut field_rows_by_role: HashMap<uuid::Uuid, Vec<FieldRuleRow>> = HashMap::new();
        for row in field_rows {
            field_rows_by_role.entry(row.role_id).or_default().push(row);
        }

        role_rows
            .into_iter()
            .map(|role_row| {
                let role_id = RoleId::from_uuid(role_row.id);
                let rules = build_rule_set(
                    role_id,
                    scope_rows_by_role.remove(&role_row.id).unwrap_or_default(),
                    field_rows_by_role.remove(&role_row.id).unwrap_or_default(),
                )?;
                role_from_row(role_row, rules)
            })
            .collect()
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let role = Role::new(
            RoleId::new(),
            input.name,
            input.description,
            input.is_super,
            input.rules,
        )?;

        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, name, description, is_super)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.description())
        .bind(role.is_super())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, role.name()))?;

        insert_rules(&mut transaction, role.id(), role.rules()).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(role)
    }

    async fn save_role_rules(&self, role_id: RoleId, rules: &RuleSet) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM rbac_roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        sqlx::query(
            r#"
            DELETE FROM rbac_scope_rules
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear scope rules: {error}")))?;

        insert_rules(&mut transaction, role_id, rules).await?;

        sqlx::query(
            r#"
            UPDATE rbac_roles
            SET updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to touch role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(role = %role_id, rules = rules.len(), "replaced role rule set");
        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23503")
            {
                return AppError::Conflict(format!(
                    "role '{role_id}' is still assigned to actors"
                ));
            }

            AppError::Internal(format!("failed to delete role: {error}"))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }
}

async fn insert_rules(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: RoleId,
    rules: &RuleSet,
) -> AppResult<()> {
    for rule in rules.iter() {
        sqlx::query(
            r#"
            INSERT INTO rbac_scope_rules (role_id, scope, access_level)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(rule.scope().as_str())
        .bind(rule.access_level().as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist scope rule: {error}")))?;

        for field_rule in rule.field_rules() {
            sqlx::query(
                r#"
                INSERT INTO rbac_field_rules (role_id, scope, field_name, access_level)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(role_id.as_uuid())
            .bind(rule.scope().as_str())
            .bind(field_rule.field_name.as_str())
            .bind(field_rule.access_level.as_str())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist field rule: {error}"))
            })?;
        }
    }

    Ok(())
}

fn build_rule_set(
    role_id: RoleId,
    scope_rows: Vec<ScopeRuleRow>,
    field_rows: Vec<FieldRuleRow>,
) -> AppResult<RuleSet> {
    let invalid = |error: warden_domain::RbacError| {
        AppError::Internal(format!("invalid stored rule for role '{role_id}': {error}"))
    };

    let mut fields_by_scope: HashMap<Scope, Vec<FieldRule>> = HashMap::new();
    for row in field_rows {
        let scope = Scope::from_str(row.scope.as_str()).map_err(invalid)?;
        let access_level = AccessLevel::from_str(row.access_level.as_str()).map_err(invalid)?;
        fields_by_scope
            .entry(scope)
            .or_default()
            .push(FieldRule::new(row.field_name, access_level));
    }

    let rules = scope_rows
        .into_iter()
        .map(|row| {
            let scope = Scope::from_str(row.scope.as_str()).map_err(invalid)?;
            let access_level =
                AccessLevel::from_str(row.access_level.as_str()).map_err(invalid)?;
            ScopeRule::new(
                scope,
                access_level,
                fields_by_scope.remove(&scope).unwrap_or_default(),
            )
            .map_err(invalid)
        })
        .collect::<AppResult<Vec<_>>>()?;

    RuleSet::new(rules).map_err(invalid)
}

fn role_from_row(row: RoleRow, rules: RuleSet) -> AppResult<Role> {
    Role::new(
        RoleId::from_uuid(row.id),
        row.name,
        row.description,
        row.is_super,
        rules,
    )
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}
