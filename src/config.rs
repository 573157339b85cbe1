// src/config.rs
//! Configuração do servidor lida das variáveis de ambiente (e do `.env`).
//!
//! Todos os valores têm um default razoável para desenvolvimento local.

use std::net::SocketAddr;

/// Configuração da aplicação.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URL da base de dados SQLite.
    /// Env: `DATABASE_URL`
    /// Default: `sqlite://presencas.db`
    pub database_url: String,

    /// Endereço onde o servidor HTTP escuta.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Segredo usado para assinar o cookie do frontend.
    /// Env: `SESSION_SECRET` (pelo menos 64 bytes)
    pub session_secret: Option<String>,

    /// Validade dos tokens de acesso, em horas (0 = sem expiração).
    /// Env: `TOKEN_TTL_HOURS`
    /// Default: `168` (uma semana)
    pub token_ttl_hours: i64,

    /// Primeiro administrador, criado no arranque se ainda não existir nenhum.
    /// Env: `BOOTSTRAP_ADMIN_EMAIL`, `BOOTSTRAP_ADMIN_PASSWORD`, `BOOTSTRAP_ADMIN_NAME`
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://presencas.db".to_string(),
            http_addr: ([0, 0, 0, 0], 3000).into(),
            session_secret: None,
            token_ttl_hours: 168,
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    /// Lê a configuração do ambiente, caindo nos defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Constrói a configuração a partir de uma função de lookup (facilita os testes).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "HTTP_ADDR inválido, usando o default"),
            }
        }

        if let Some(secret) = lookup("SESSION_SECRET") {
            if !secret.is_empty() {
                config.session_secret = Some(secret);
            }
        }

        if let Some(val) = lookup("TOKEN_TTL_HOURS") {
            match val.parse::<i64>() {
                Ok(hours) if hours >= 0 => config.token_ttl_hours = hours,
                _ => tracing::warn!(value = %val, "TOKEN_TTL_HOURS inválido, usando o default"),
            }
        }

        // Vazio conta como não definido
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let (Some(email), Some(password)) = (
            non_empty("BOOTSTRAP_ADMIN_EMAIL"),
            non_empty("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            config.bootstrap_admin = Some(BootstrapAdmin {
                name: non_empty("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
                email,
                password,
            });
        }

        // RUST_LOG é tratado diretamente pelo EnvFilter do tracing-subscriber.

        config
    }
}
