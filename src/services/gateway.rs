// ============================================================================
// DATA GATEWAY - Contrato con la API REST
// ============================================================================

use async_trait::async_trait;

use crate::error::CampusResult;
use crate::models::{
    Certificacion, Curso, Favorito, Id, Leccion, Progreso, ProgresoGlobal, ProgresoGlobalPatch, Ruta, User,
    UserPatch,
};
use crate::services::query::Query;

/// Operaciones CRUD por entidad. Los `get_*_by_id` devuelven `None` si la entidad no existe.
#[async_trait(?Send)]
pub trait DataGateway {
    /// Token de autorización para las siguientes peticiones
    fn set_token(&self, _token: Option<String>) {}

    async fn get_user_by_id(&self, id: Id) -> CampusResult<Option<User>>;
    async fn update_user(&self, id: Id, patch: &UserPatch) -> CampusResult<User>;

    async fn get_progreso_global_by_id(&self, id: Id) -> CampusResult<Option<ProgresoGlobal>>;
    async fn update_progreso_global(&self, id: Id, patch: &ProgresoGlobalPatch) -> CampusResult<ProgresoGlobal>;

    async fn get_progresos(&self, query: &Query) -> CampusResult<Vec<Progreso>>;
    async fn add_progreso(&self, progreso: &Progreso) -> CampusResult<Progreso>;

    async fn get_favoritos(&self, query: &Query) -> CampusResult<Vec<Favorito>>;
    async fn add_favorito(&self, favorito: &Favorito) -> CampusResult<Favorito>;
    async fn remove_favorito(&self, id: Id) -> CampusResult<()>;

    /// Inscripción del usuario del token en un proceso de selección
    async fn apply_to_proceso(&self, proceso_id: Id) -> CampusResult<()>;
    async fn remove_from_proceso(&self, proceso_id: Id) -> CampusResult<()>;

    async fn get_cursos(&self, query: &Query) -> CampusResult<Vec<Curso>>;
    /// Con `user_id` el backend calcula `meta` (completado/bloqueado) para ese alumno
    async fn get_curso(&self, id: Id, user_id: Option<Id>) -> CampusResult<Option<Curso>>;
    async fn get_leccion_by_id(&self, id: Id) -> CampusResult<Option<Leccion>>;
    async fn get_certificaciones(&self, query: &Query) -> CampusResult<Vec<Certificacion>>;
    async fn get_rutas(&self, query: &Query) -> CampusResult<Vec<Ruta>>;
}
