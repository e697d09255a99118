pub mod user;
pub mod progreso;
pub mod favorito;
pub mod curso;
pub mod ruta;
pub mod session;

pub use user::{User, UserPatch, Preferencias, ThemeMode, Proceso, ProcesoInscripcion};
pub use progreso::{ProgresoGlobal, ProgresoGlobalPatch, ProgresoLecciones, ProgresoMeta, Progreso, ProgresoTipo};
pub use favorito::{Favorito, FavoritoTipo};
pub use curso::{Curso, CursoMeta, Modulo, Leccion, LeccionMeta, LeccionTipo, Certificacion, CertificacionMeta};
pub use ruta::{Ruta, RutaMeta, filter_cursos_by_ruta, cursos_fuera_de_ruta};
pub use session::{Session, Credentials, LoginData};

/// Identificador numérico de la API
pub type Id = u64;

/// Respuesta de listado de la API: `{ data, error? }`
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ListResponse<T> {
    /// Un campo `error` presente cuenta como fallo aunque el HTTP fuera 2xx
    pub fn into_result(self) -> crate::error::CampusResult<Vec<T>> {
        match self.error {
            Some(error) => Err(crate::error::CampusError::Api(error)),
            None => Ok(self.data),
        }
    }
}
