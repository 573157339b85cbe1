// src/services/user_service.rs
use crate::{
    config::BootstrapAdmin,
    error::{is_unique_violation, AppError, AppResult, FieldErrors},
    models::user::{PublicUser, Role, User},
};
use sqlx::{SqliteExecutor, SqlitePool};

const USER_COLUMNS: &str = "id, name, email, password_hash, role";

/// Busca um utilizador pelo ID.
pub async fn find_user_by_id<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}

/// Busca um utilizador pelo email (sem distinguir maiúsculas).
pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por email: {}", email);
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
        USER_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Lista as contas com algum dos papéis indicados.
pub async fn find_users_by_roles(db_pool: &SqlitePool, roles: &[Role]) -> AppResult<Vec<PublicUser>> {
    tracing::debug!("Buscando utilizadores com papéis {:?}", roles);
    let mut users = Vec::new();
    for role in roles {
        let mut batch = sqlx::query_as::<_, PublicUser>(
            "SELECT id, name, email, role FROM users WHERE role = ?1 ORDER BY name ASC, id ASC",
        )
        .bind(role)
        .fetch_all(db_pool)
        .await?;
        users.append(&mut batch);
    }
    tracing::debug!("Encontrados {} utilizadores.", users.len());
    Ok(users)
}

/// IDs de todos os administradores.
pub async fn find_admin_ids<'e>(executor: impl SqliteExecutor<'e>) -> AppResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE role = ?1 ORDER BY id")
        .bind(Role::Admin)
        .fetch_all(executor)
        .await?;
    Ok(ids)
}

/// Cria um utilizador com a senha já convertida em hash.
pub async fn create_user(
    db_pool: &SqlitePool,
    name: &str,
    email: &str,
    raw_password: &str,
    role: Role,
) -> AppResult<PublicUser> {
    tracing::info!("Tentando criar utilizador: {} ({})", email, role);
    let password_hash = crate::services::auth_service::hash_password(raw_password).await?;

    let insert = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .bind(role)
    .execute(db_pool)
    .await;

    let id = match insert {
        Ok(result) => result.last_insert_rowid(),
        // Dois registos simultâneos com o mesmo email
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Falha ao criar user: email '{}' já existe.", email);
            return Err(AppError::Validation(FieldErrors::single(
                "email",
                "Este email já está registado.",
            )));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("✅ Utilizador '{}' criado com sucesso (id {}).", email, id);
    Ok(PublicUser {
        id,
        name: name.to_string(),
        email: email.to_string(),
        role,
    })
}

/// Cria o primeiro administrador a partir da configuração, se ainda não existir nenhum.
pub async fn ensure_bootstrap_admin(db_pool: &SqlitePool, admin: &BootstrapAdmin) -> AppResult<bool> {
    if !find_admin_ids(db_pool).await?.is_empty() {
        tracing::debug!("Já existe pelo menos um administrador; nada a criar.");
        return Ok(false);
    }
    if find_user_by_email(db_pool, &admin.email).await?.is_some() {
        tracing::warn!(
            "⚠️ O email de bootstrap '{}' já pertence a uma conta não-admin.",
            admin.email
        );
        return Ok(false);
    }
    create_user(db_pool, &admin.name, &admin.email, &admin.password, Role::Admin).await?;
    tracing::info!("👤 Administrador inicial '{}' criado.", admin.email);
    Ok(true)
}
