// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP
// ============================================================================
// Implementación de `DataGateway` sobre gloo-net. Sin lógica de negocio.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::CONFIG;
use crate::error::{CampusError, CampusResult};
use crate::models::{
    Certificacion, Curso, Favorito, Id, Leccion, ListResponse, Progreso, ProgresoGlobal, ProgresoGlobalPatch,
    Ruta, User, UserPatch,
};
use crate::services::gateway::DataGateway;
use crate::services::query::Query;

/// Cliente API. Los clones comparten el token.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Rc<RefCell<Option<String>>>,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(CONFIG.backend_url())
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Rc::new(RefCell::new(None)),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = RequestBuilder::new(&url).method(method);
        match self.token.borrow().as_deref() {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn check(response: Response) -> CampusResult<Response> {
        if response.ok() {
            return Ok(response);
        }
        let status = response.status();
        let message = response.text().await.unwrap_or_else(|_| response.status_text());
        if status == 401 || status == 403 {
            return Err(CampusError::Auth(format!("HTTP {}: {}", status, message)));
        }
        Err(CampusError::Http { status, message })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> CampusResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| CampusError::Parse(e.to_string()))
    }

    /// GET de una entidad; 404 se traduce a `None`
    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> CampusResult<Option<T>> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| CampusError::Network(e.to_string()))?;

        if response.status() == 404 {
            log::debug!("GET {} -> 404", path);
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Self::parse(response).await.map(Some)
    }

    /// Ruta con los filtros como `?k=v&k=v`, en orden y con claves repetidas
    fn list_path(path: &str, query: &Query) -> String {
        let query_string = query.to_query_string();
        match query_string.strip_prefix('&') {
            Some(filters) => format!("{}?{}", path, filters),
            None => path.to_string(),
        }
    }

    /// GET de un listado `{ data, error? }`
    async fn get_list<T: DeserializeOwned>(&self, path: &str, query: &Query) -> CampusResult<Vec<T>> {
        let response = self
            .request(Method::GET, &Self::list_path(path, query))
            .send()
            .await
            .map_err(|e| CampusError::Network(e.to_string()))?;

        let response = Self::check(response).await?;
        Self::parse::<ListResponse<T>>(response).await?.into_result()
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(&self, method: Method, path: &str, body: &B) -> CampusResult<T> {
        let response = self
            .request(method, path)
            .json(body)
            .map_err(|e| CampusError::Parse(format!("Serialization error: {}", e)))?
            .send()
            .await
            .map_err(|e| CampusError::Network(e.to_string()))?;

        let response = Self::check(response).await?;
        Self::parse(response).await
    }

    /// Petición sin cuerpo cuya respuesta se descarta
    async fn send_empty(&self, method: Method, path: &str) -> CampusResult<()> {
        let response = self
            .request(method, path)
            .send()
            .await
            .map_err(|e| CampusError::Network(e.to_string()))?;
        Self::check(response).await.map(|_| ())
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl DataGateway for ApiClient {
    fn set_token(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }

    async fn get_user_by_id(&self, id: Id) -> CampusResult<Option<User>> {
        self.get_one(&format!("users/{}", id)).await
    }

    async fn update_user(&self, id: Id, patch: &UserPatch) -> CampusResult<User> {
        log::info!("👤 Actualizando usuario {}", id);
        self.send_json(Method::PUT, &format!("users/{}", id), patch).await
    }

    async fn get_progreso_global_by_id(&self, id: Id) -> CampusResult<Option<ProgresoGlobal>> {
        self.get_one(&format!("progresos-globales/{}", id)).await
    }

    async fn update_progreso_global(&self, id: Id, patch: &ProgresoGlobalPatch) -> CampusResult<ProgresoGlobal> {
        self.send_json(Method::PUT, &format!("progresos-globales/{}", id), patch).await
    }

    async fn get_progresos(&self, query: &Query) -> CampusResult<Vec<Progreso>> {
        self.get_list("progresos", query).await
    }

    async fn add_progreso(&self, progreso: &Progreso) -> CampusResult<Progreso> {
        log::info!("📈 Creando progreso {} para lección {}", progreso.tipo.as_str(), progreso.leccion_id);
        self.send_json(Method::POST, "progresos", progreso).await
    }

    async fn get_favoritos(&self, query: &Query) -> CampusResult<Vec<Favorito>> {
        self.get_list("favoritos", query).await
    }

    async fn add_favorito(&self, favorito: &Favorito) -> CampusResult<Favorito> {
        self.send_json(Method::POST, "favoritos", favorito).await
    }

    async fn remove_favorito(&self, id: Id) -> CampusResult<()> {
        self.send_empty(Method::DELETE, &format!("favoritos/{}", id)).await
    }

    async fn apply_to_proceso(&self, proceso_id: Id) -> CampusResult<()> {
        log::info!("📝 Inscripción en el proceso {}", proceso_id);
        self.send_empty(Method::POST, &format!("procesos/{}/inscripcion", proceso_id)).await
    }

    async fn remove_from_proceso(&self, proceso_id: Id) -> CampusResult<()> {
        log::info!("📝 Baja del proceso {}", proceso_id);
        self.send_empty(Method::DELETE, &format!("procesos/{}/inscripcion", proceso_id)).await
    }

    async fn get_cursos(&self, query: &Query) -> CampusResult<Vec<Curso>> {
        self.get_list("cursos", query).await
    }

    async fn get_curso(&self, id: Id, user_id: Option<Id>) -> CampusResult<Option<Curso>> {
        let path = match user_id {
            Some(user_id) => format!("cursos/{}?user_id={}", id, user_id),
            None => format!("cursos/{}", id),
        };
        self.get_one(&path).await
    }

    async fn get_leccion_by_id(&self, id: Id) -> CampusResult<Option<Leccion>> {
        self.get_one(&format!("lecciones/{}", id)).await
    }

    async fn get_certificaciones(&self, query: &Query) -> CampusResult<Vec<Certificacion>> {
        self.get_list("certificaciones", query).await
    }

    async fn get_rutas(&self, query: &Query) -> CampusResult<Vec<Ruta>> {
        self.get_list("rutas", query).await
    }
}
