use std::{env, time::Duration};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
/// Tiempo que se guarda un job terminado antes de borrarlo (1 hora)
pub const DEFAULT_RESULT_TTL_SECS: u64 = 3600;

/// Configuración del server, leída de variables de entorno:
/// - BIND_ADDR: dirección donde escucha (default 0.0.0.0:8080)
/// - PUBLIC_BASE_URL: base pública para armar `self_url`
///   (en Docker sería algo como http://nbexec:8080)
/// - RESULT_TTL_SECS: segundos que se conserva un job terminal
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub public_base_url: String,
    pub result_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            result_ttl: Duration::from_secs(DEFAULT_RESULT_TTL_SECS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_base_url: non_empty("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            result_ttl: non_empty("RESULT_TTL_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.result_ttl),
        }
    }

    /// URL pública de un job.
    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/api/v1/notebooks/{}", self.public_base_url, job_id)
    }
}
