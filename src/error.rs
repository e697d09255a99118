// ============================================================================
// ERRORES DEL CAMPUS
// ============================================================================
// `Clone` es obligatorio: los errores viajan dentro de futuros compartidos
// (ver `services::entity_cache`).
// ============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CampusError {
    /// Login rechazado: token/usuario ausente o el usuario no se pudo cargar
    #[error("Error de autenticación: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// El backend respondió con el campo `error` relleno
    #[error("Error de la API: {0}")]
    Api(String),

    #[error("No encontrado: {0}")]
    NotFound(String),

    #[error("Error de almacenamiento: {0}")]
    Storage(String),

    /// Una entidad requerida por la acción es indefinida (p.ej. la lección actual)
    #[error("Entidad indefinida: {0}")]
    UndefinedEntity(String),
}

impl CampusError {
    pub fn is_auth(&self) -> bool {
        matches!(self, CampusError::Auth(_))
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(e: serde_json::Error) -> Self {
        CampusError::Parse(e.to_string())
    }
}

pub type CampusResult<T> = Result<T, CampusError>;
