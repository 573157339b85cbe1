// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::user::{AuthResponse, Caller, LoginPayload, PublicUser, RegisterPayload, Role},
    services::user_service,
    validation::{is_valid_email, required_text, MAX_TEXT_LEN},
};
use chrono::{Duration, NaiveDateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

// Custo do bcrypt (reduzido nos testes para não os tornar lentos)
#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

pub const MIN_PASSWORD_LEN: usize = 4;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, HASH_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Emite um novo token de acesso para o utilizador. `ttl_hours == 0` = sem expiração.
pub async fn issue_token<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
    ttl_hours: i64,
) -> AppResult<String> {
    let token = Uuid::new_v4().simple().to_string();
    let expires_at: Option<NaiveDateTime> =
        (ttl_hours > 0).then(|| (Utc::now() + Duration::hours(ttl_hours)).naive_utc());

    sqlx::query("INSERT INTO api_tokens (user_id, token, expires_at) VALUES (?1, ?2, ?3)")
        .bind(user_id)
        .bind(&token)
        .bind(expires_at)
        .execute(executor)
        .await?;

    tracing::debug!("Token emitido para user {}", user_id);
    Ok(token)
}

/// Resolve um token para a identidade do seu dono. `None` se inválido ou expirado.
pub async fn resolve_token(db_pool: &SqlitePool, token: &str) -> AppResult<Option<Caller>> {
    let now = Utc::now().naive_utc();
    let caller = sqlx::query_as::<_, Caller>(
        r#"
        SELECT u.id, u.name, u.email, u.role
        FROM api_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token = ?1
          AND (t.expires_at IS NULL OR t.expires_at > ?2)
        "#,
    )
    .bind(token)
    .bind(now)
    .fetch_optional(db_pool)
    .await?;
    Ok(caller)
}

/// Revoga um token (logout).
pub async fn revoke_token(db_pool: &SqlitePool, token: &str) -> AppResult<()> {
    let rows = sqlx::query("DELETE FROM api_tokens WHERE token = ?1")
        .bind(token)
        .execute(db_pool)
        .await?
        .rows_affected();
    tracing::debug!("Token revogado ({} linha(s)).", rows);
    Ok(())
}

/// Verifica email + senha e devolve o utilizador. Falhas dão sempre a mesma resposta.
pub async fn authenticate(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<PublicUser> {
    let Some(user) = user_service::find_user_by_email(db_pool, email).await? else {
        tracing::warn!("Utilizador não encontrado: {}", email);
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash).await? {
        tracing::warn!("Senha incorreta para: {}", email);
        return Err(AppError::InvalidCredentials);
    }

    Ok(user.into())
}

/// POST /login
pub async fn login(db_pool: &SqlitePool, payload: &LoginPayload, ttl_hours: i64) -> AppResult<AuthResponse> {
    let mut errors = FieldErrors::new();
    let email = required_text(&mut errors, "email", payload.email.as_deref(), MAX_TEXT_LEN);
    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.add("email", "O email não é válido.");
        }
    }
    let password = match payload.password.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => {
            errors.add("password", "O campo password é obrigatório.");
            ""
        }
    };
    errors.into_result()?;
    let email = email.unwrap_or_default();

    tracing::info!("Tentativa de login para: {}", email);
    let user = authenticate(db_pool, &email, password).await?;
    let token = issue_token(db_pool, user.id, ttl_hours).await?;

    tracing::info!("✅ Login bem-sucedido para: {} ({})", user.email, user.role);
    Ok(AuthResponse { token, user })
}

/// POST /register. Só cria contas teacher/student; os admins vêm da configuração.
pub async fn register(
    db_pool: &SqlitePool,
    payload: &RegisterPayload,
    ttl_hours: i64,
) -> AppResult<AuthResponse> {
    let mut errors = FieldErrors::new();
    let name = required_text(&mut errors, "name", payload.name.as_deref(), MAX_TEXT_LEN);
    let email = required_text(&mut errors, "email", payload.email.as_deref(), MAX_TEXT_LEN);
    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.add("email", "O email não é válido.");
        } else if user_service::find_user_by_email(db_pool, email).await?.is_some() {
            errors.add("email", "Este email já está registado.");
        }
    }

    let password = payload.password.as_deref().unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("A password deve ter pelo menos {} caracteres.", MIN_PASSWORD_LEN),
        );
    }

    let role = match payload.role.as_deref().and_then(Role::parse) {
        Some(role @ (Role::Teacher | Role::Student)) => Some(role),
        _ => {
            errors.add("role", "O papel deve ser 'teacher' ou 'student'.");
            None
        }
    };
    errors.into_result()?;

    let (Some(name), Some(email), Some(role)) = (name, email, role) else {
        return Err(AppError::InternalServerError);
    };

    let user = user_service::create_user(db_pool, &name, &email, password, role).await?;
    let token = issue_token(db_pool, user.id, ttl_hours).await?;
    Ok(AuthResponse { token, user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn hash_and_verify() {
        let hash = hash_password("segredo").await.unwrap();
        assert!(verify_password("segredo", &hash).await.unwrap());
        assert!(!verify_password("outro", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn token_lifecycle() {
        let pool = create_test_pool().await;
        let user = user_service::create_user(&pool, "Ana", "ana@iut.fr", "pass", Role::Teacher)
            .await
            .unwrap();

        let token = issue_token(&pool, user.id, 1).await.unwrap();
        let caller = resolve_token(&pool, &token).await.unwrap().unwrap();
        assert_eq!(caller.id, user.id);
        assert_eq!(caller.role, Role::Teacher);

        revoke_token(&pool, &token).await.unwrap();
        assert!(resolve_token(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let pool = create_test_pool().await;
        let user = user_service::create_user(&pool, "Rui", "rui@iut.fr", "pass", Role::Student)
            .await
            .unwrap();
        let token = issue_token(&pool, user.id, 1).await.unwrap();

        let past = (Utc::now() - Duration::hours(2)).naive_utc();
        sqlx::query("UPDATE api_tokens SET expires_at = ?1 WHERE token = ?2")
            .bind(past)
            .bind(&token)
            .execute(&pool)
            .await
            .unwrap();

        assert!(resolve_token(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_rejects_admin_role_and_duplicates() {
        let pool = create_test_pool().await;
        let payload = RegisterPayload {
            name: Some("Eva".into()),
            email: Some("eva@iut.fr".into()),
            password: Some("abcd".into()),
            role: Some("admin".into()),
        };
        match register(&pool, &payload, 1).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("role")),
            other => panic!("esperava validação, obtive {:?}", other.map(|r| r.user)),
        }

        let payload = RegisterPayload { role: Some("student".into()), ..payload };
        let created = register(&pool, &payload, 1).await.unwrap();
        assert_eq!(created.user.role, Role::Student);

        match register(&pool, &payload, 1).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("email")),
            other => panic!("esperava validação, obtive {:?}", other.map(|r| r.user)),
        }
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let pool = create_test_pool().await;
        user_service::create_user(&pool, "Ana", "ana@iut.fr", "certa", Role::Teacher)
            .await
            .unwrap();

        let bad = LoginPayload {
            email: Some("ana@iut.fr".into()),
            password: Some("errada".into()),
        };
        assert!(matches!(login(&pool, &bad, 1).await, Err(AppError::InvalidCredentials)));

        let good = LoginPayload {
            email: Some("ana@iut.fr".into()),
            password: Some("certa".into()),
        };
        let response = login(&pool, &good, 1).await.unwrap();
        assert!(!response.token.is_empty());
        assert_eq!(response.user.email, "ana@iut.fr");
    }
}
