use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Páginas del campus que se pueden desactivar por entorno
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampusPage {
    Roadmap,
    Cursos,
    Certificaciones,
    Procesos,
    Foro,
    Perfil,
    Comunidad,
    Favoritos,
    Register,
}

impl CampusPage {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "roadmap" => Some(Self::Roadmap),
            "cursos" => Some(Self::Cursos),
            "certificaciones" => Some(Self::Certificaciones),
            "procesos" => Some(Self::Procesos),
            "foro" => Some(Self::Foro),
            "perfil" => Some(Self::Perfil),
            "comunidad" => Some(Self::Comunidad),
            "favoritos" => Some(Self::Favoritos),
            "register" => Some(Self::Register),
            _ => None,
        }
    }
}

/// Lista separada por espacios, p.ej. `"foro comunidad"`. Ids desconocidos se ignoran.
pub fn parse_disabled_pages(raw: &str) -> HashSet<CampusPage> {
    raw.split_whitespace()
        .filter_map(|id| {
            let page = CampusPage::from_id(id);
            if page.is_none() {
                log::warn!("⚠️ Página desactivada desconocida: {}", id);
            }
            page
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url_development: String,
    pub backend_url_production: String,
    pub environment: String,
    /// Namespace lógico del cliente para la caché de entidades
    pub client: String,
    pub disabled_pages: String,
    pub progress_config: ProgressConfig,
    pub session_config: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url_development: "http://localhost:3333".to_string(),
            backend_url_production: "https://api.campus.example".to_string(),
            environment: "development".to_string(),
            client: "campus".to_string(),
            disabled_pages: String::new(),
            progress_config: ProgressConfig::default(),
            session_config: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Segundos de reproducción entre volcados de la posición del vídeo
    pub flush_interval_seconds: f64,
    /// Espera entre DESBLOQUEADA y SIGUIENTE al completar una lección
    pub unlock_delay_ms: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            flush_interval_seconds: 300.0,
            unlock_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub durable_days: i64,
    pub expiring_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            durable_days: 7,
            expiring_minutes: 60,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend_url_development: option_env!("CAMPUS_BACKEND_URL_DEVELOPMENT")
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_development),
            backend_url_production: option_env!("CAMPUS_BACKEND_URL_PRODUCTION")
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_production),
            environment: option_env!("CAMPUS_ENVIRONMENT")
                .unwrap_or("development").to_string(),
            client: option_env!("CAMPUS_CLIENT")
                .unwrap_or("campus").to_string(),
            disabled_pages: option_env!("CAMPUS_DISABLED_PAGES")
                .unwrap_or("").to_string(),
            progress_config: ProgressConfig {
                flush_interval_seconds: option_env!("CAMPUS_PROGRESS_FLUSH_SECONDS")
                    .unwrap_or("300").parse().unwrap_or(300.0),
                unlock_delay_ms: option_env!("CAMPUS_UNLOCK_DELAY_MS")
                    .unwrap_or("1000").parse().unwrap_or(1000),
            },
            session_config: SessionConfig {
                durable_days: option_env!("CAMPUS_SESSION_DURABLE_DAYS")
                    .unwrap_or("7").parse().unwrap_or(7),
                expiring_minutes: option_env!("CAMPUS_SESSION_EXPIRING_MINUTES")
                    .unwrap_or("60").parse().unwrap_or(60),
            },
        }
    }

    /// Obtiene la URL del backend según el entorno actual
    pub fn backend_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.backend_url_production,
            _ => &self.backend_url_development,
        }
    }

    pub fn disabled_pages(&self) -> HashSet<CampusPage> {
        parse_disabled_pages(&self.disabled_pages)
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_disabled_pages() {
        let pages = parse_disabled_pages("foro  Comunidad register desconocida");
        assert_eq!(pages.len(), 3);
        assert!(pages.contains(&CampusPage::Foro));
        assert!(pages.contains(&CampusPage::Comunidad));
        assert!(pages.contains(&CampusPage::Register));
        assert!(parse_disabled_pages("").is_empty());
    }

    #[test]
    fn test_backend_url_by_environment() {
        let mut config = AppConfig::default();
        assert_eq!(config.backend_url(), "http://localhost:3333");
        config.environment = "production".to_string();
        assert_eq!(config.backend_url(), "https://api.campus.example");
    }
}
