// src/state.rs
use crate::config::AppConfig;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_cookies::Key;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<AppConfig>,
    // Chave que assina o cookie do frontend
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: AppConfig) -> Self {
        let cookie_key = cookie_key_from(config.session_secret.as_deref());
        Self {
            db_pool,
            config: Arc::new(config),
            cookie_key,
        }
    }
}

/// `Key::from` exige pelo menos 64 bytes; abaixo disso gera-se uma chave
/// aleatória (os cookies deixam de valer quando o servidor reinicia).
pub fn cookie_key_from(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
        Some(_) => {
            tracing::warn!("⚠️ SESSION_SECRET tem menos de 64 bytes; a usar uma chave aleatória.");
            Key::generate()
        }
        None => {
            tracing::warn!("⚠️ SESSION_SECRET não definida; a usar uma chave aleatória.");
            Key::generate()
        }
    }
}

// Permite extrair o pool da DB diretamente
impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}
