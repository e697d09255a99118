// ============================================================================
// CATALOG SERVICE - Vistas de solo lectura servidas por la caché de entidades
// ============================================================================
// Cursos, lecciones, certificaciones y rutas. Las certificaciones se anotan
// con el progreso global al leerlas; lo cacheado es siempre la respuesta cruda.
// ============================================================================

use std::rc::Rc;

use crate::config::CampusPage;
use crate::error::CampusResult;
use crate::models::{Certificacion, Curso, Id, Leccion, Ruta};
use crate::services::entity_cache::{CacheStatus, EntityCache};
use crate::services::gateway::DataGateway;
use crate::services::query::{FetchStrategy, Query};
use crate::state::{AppState, Loadable};
use crate::utils::runtime::Runtime;

#[derive(Clone)]
pub struct CatalogService {
    gateway: Rc<dyn DataGateway>,
    state: AppState,
    cursos: EntityCache<Vec<Curso>>,
    curso: EntityCache<Option<Curso>>,
    leccion: EntityCache<Option<Leccion>>,
    certificaciones: EntityCache<Vec<Certificacion>>,
    rutas: EntityCache<Vec<Ruta>>,
}

impl CatalogService {
    pub fn new(namespace: &str, gateway: Rc<dyn DataGateway>, state: AppState, runtime: Runtime) -> Self {
        Self {
            gateway,
            state,
            cursos: EntityCache::new(namespace, "cursos", runtime.clone()),
            curso: EntityCache::new(namespace, "curso", runtime.clone()),
            leccion: EntityCache::new(namespace, "leccion", runtime.clone()),
            certificaciones: EntityCache::new(namespace, "certificaciones", runtime.clone()),
            rutas: EntityCache::new(namespace, "rutas", runtime),
        }
    }

    /// Query de un curso calculado para el alumno. Sin usuario aún, no está lista.
    fn curso_query(&self, id: Option<Id>) -> Query {
        Query::new()
            .maybe("id", id)
            .maybe("user_id", self.state.session.get_user_id())
    }

    pub fn cursos(&self, query: &Query) -> CacheStatus<Vec<Curso>> {
        let gateway = self.gateway.clone();
        self.cursos.fetch(query, FetchStrategy::Default, move |q| async move {
            gateway.get_cursos(&q).await
        })
    }

    pub async fn load_cursos(&self, query: &Query) -> CampusResult<Vec<Curso>> {
        let gateway = self.gateway.clone();
        let cursos = self
            .cursos
            .load(query, FetchStrategy::Default, move |q| async move {
                gateway.get_cursos(&q).await
            })
            .await?;
        Ok(cursos.unwrap_or_default())
    }

    pub fn curso(&self, id: Option<Id>) -> CacheStatus<Option<Curso>> {
        let gateway = self.gateway.clone();
        let (curso_id, user_id) = (id, self.state.session.get_user_id());
        self.curso.fetch(&self.curso_query(id), FetchStrategy::InvalidateOnUndefined, move |_| async move {
            match curso_id {
                Some(curso_id) => gateway.get_curso(curso_id, user_id).await,
                None => Ok(None),
            }
        })
    }

    /// `Ok(None)` si el curso no existe o la query aún no está lista
    pub async fn load_curso(&self, id: Id) -> CampusResult<Option<Curso>> {
        let gateway = self.gateway.clone();
        let user_id = self.state.session.get_user_id();
        let curso = self
            .curso
            .load(&self.curso_query(Some(id)), FetchStrategy::InvalidateOnUndefined, move |_| async move {
                gateway.get_curso(id, user_id).await
            })
            .await?;
        Ok(curso.flatten())
    }

    /// Tras completar una lección la `meta` del curso cambia
    pub fn invalidate_curso(&self, id: Id) {
        self.curso
            .invalidate(&self.curso_query(Some(id)), FetchStrategy::InvalidateOnUndefined);
    }

    pub async fn load_leccion(&self, id: Id) -> CampusResult<Option<Leccion>> {
        let gateway = self.gateway.clone();
        let query = Query::new().eq("id", id);
        let leccion = self
            .leccion
            .load(&query, FetchStrategy::InvalidateOnUndefined, move |_| async move {
                gateway.get_leccion_by_id(id).await
            })
            .await?;
        Ok(leccion.flatten())
    }

    /// Certificaciones con `iniciada` / `completada` según el progreso global
    pub fn certificaciones(&self, query: &Query) -> CacheStatus<Vec<Certificacion>> {
        let gateway = self.gateway.clone();
        let mut status = self.certificaciones.fetch(query, FetchStrategy::Default, move |q| async move {
            gateway.get_certificaciones(&q).await
        });
        status.data = status.data.map(|list| self.annotate(list));
        status
    }

    pub async fn load_certificaciones(&self, query: &Query) -> CampusResult<Vec<Certificacion>> {
        let gateway = self.gateway.clone();
        let list = self
            .certificaciones
            .load(query, FetchStrategy::Default, move |q| async move {
                gateway.get_certificaciones(&q).await
            })
            .await?;
        Ok(self.annotate(list.unwrap_or_default()))
    }

    fn annotate(&self, mut list: Vec<Certificacion>) -> Vec<Certificacion> {
        if let Loadable::Loaded(progreso) = self.state.progreso.get() {
            for certificacion in list.iter_mut() {
                certificacion.meta.iniciada = progreso.is_certificacion_iniciada(certificacion.id);
                certificacion.meta.completada = progreso.is_certificacion_completada(certificacion.id);
            }
        }
        list
    }

    pub fn rutas(&self) -> CacheStatus<Vec<Ruta>> {
        let gateway = self.gateway.clone();
        self.rutas.fetch(&Query::new(), FetchStrategy::Default, move |q| async move {
            gateway.get_rutas(&q).await
        })
    }

    /// Cursos de la ruta actual (en su orden) y el resto
    pub fn cursos_por_ruta(&self) -> CacheStatus<(Vec<Curso>, Vec<Curso>)> {
        if self.state.ruta.get().is_unknown() {
            return CacheStatus::loading();
        }
        let status = self.cursos(&Query::new());
        CacheStatus {
            data: status.data.map(|cursos| {
                (self.state.ruta.cursos_en_ruta(&cursos), self.state.ruta.cursos_fuera_de_ruta(&cursos))
            }),
            is_loading: status.is_loading,
            is_error: status.is_error,
        }
    }

    /// Precarga los listados de las áreas activas. Devuelve los tipos precargados.
    pub fn prefetch(&self) -> Vec<&'static str> {
        let mut prefetched = Vec::new();
        let ui = &self.state.ui;

        if !ui.is_page_disabled(CampusPage::Cursos) {
            self.cursos(&Query::new());
            prefetched.push(self.cursos.kind());
        }
        if !ui.is_page_disabled(CampusPage::Certificaciones) {
            self.certificaciones(&Query::new());
            prefetched.push(self.certificaciones.kind());
        }
        if !ui.is_page_disabled(CampusPage::Roadmap) {
            self.rutas();
            prefetched.push(self.rutas.kind());
        }
        log::debug!("Precarga: {:?}", prefetched);
        prefetched
    }

    /// Vacía todas las cachés (logout)
    pub fn clear(&self) {
        self.cursos.clear();
        self.curso.clear();
        self.leccion.clear();
        self.certificaciones.clear();
        self.rutas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::curso::fixtures::curso;
    use crate::models::{CertificacionMeta, RutaMeta};
    use crate::testing::{progreso_global, user, TestEnv};

    fn service(env: &TestEnv) -> (CatalogService, AppState) {
        let state = AppState::new(env.data_gateway(), env.runtime.clone());
        let catalog = CatalogService::new("campus", env.data_gateway(), state.clone(), env.runtime.clone());
        (catalog, state)
    }

    #[test]
    fn test_curso_waits_for_user() {
        let mut env = TestEnv::new();
        env.gateway.seed_cursos(vec![curso(4, &[(1, &[10])])]);
        let (catalog, state) = service(&env);

        assert!(catalog.curso(Some(4)).is_loading);
        env.pool.run_until_stalled();
        assert_eq!(env.gateway.calls("get_curso"), 0);

        state.session.set_session("tok".to_string(), user(7, None));
        catalog.curso(Some(4));
        env.pool.run_until_stalled();

        let status = catalog.curso(Some(4));
        assert_eq!(env.gateway.calls("get_curso"), 1);
        assert_eq!(status.data.flatten().map(|c| c.id), Some(4));
    }

    #[test]
    fn test_certificaciones_annotated_with_progreso() {
        let env = TestEnv::new();
        let certificacion = |id| Certificacion { id, nombre: format!("C{}", id), meta: CertificacionMeta::default() };
        env.gateway.seed_certificaciones(vec![certificacion(1), certificacion(2)]);
        let (catalog, state) = service(&env);

        let mut progreso = progreso_global(1, None);
        progreso.meta.certificaciones_iniciadas = vec![1, 2];
        progreso.meta.certificaciones_completadas = vec![2];
        state.progreso.set_progreso_global(Some(progreso));

        let list = futures::executor::block_on(catalog.load_certificaciones(&Query::new())).unwrap();
        assert!(list[0].meta.iniciada && !list[0].meta.completada);
        assert!(list[1].meta.iniciada && list[1].meta.completada);
    }

    #[test]
    fn test_failed_cursos_are_fetched_again_once_the_api_recovers() {
        let mut env = TestEnv::new();
        env.gateway.seed_cursos(vec![curso(1, &[])]);
        env.gateway.fail("get_cursos");
        let (catalog, _state) = service(&env);

        catalog.cursos(&Query::new());
        env.pool.run_until_stalled();
        assert_eq!(env.gateway.calls("get_cursos"), 1);

        env.gateway.recover("get_cursos");
        // Una entrada fallida se vuelve a pedir en la siguiente lectura
        assert!(catalog.cursos(&Query::new()).is_loading);
        env.pool.run_until_stalled();
        let status = catalog.cursos(&Query::new());
        assert_eq!(status.data.map(|c| c.len()), Some(1));
        assert_eq!(env.gateway.calls("get_cursos"), 2);
    }

    #[test]
    fn test_prefetch_skips_disabled_pages() {
        let mut env = TestEnv::new();
        let (catalog, state) = service(&env);
        state.ui.set_disabled_pages(crate::config::parse_disabled_pages("certificaciones roadmap"));

        assert_eq!(catalog.prefetch(), vec!["cursos"]);
        env.pool.run_until_stalled();

        assert_eq!(env.gateway.calls("get_cursos"), 1);
        assert_eq!(env.gateway.calls("get_certificaciones"), 0);
        assert_eq!(env.gateway.calls("get_rutas"), 0);
    }

    #[test]
    fn test_cursos_por_ruta() {
        let mut env = TestEnv::new();
        env.gateway.seed_cursos(vec![curso(1, &[]), curso(2, &[]), curso(3, &[])]);
        let (catalog, state) = service(&env);

        assert!(catalog.cursos_por_ruta().is_loading);
        state.ruta.set_ruta(Some(Ruta {
            id: 1,
            nombre: "Backend".to_string(),
            itinerario: "backend".to_string(),
            privada: None,
            meta: RutaMeta { itinerario: vec![3, 1] },
        }));
        catalog.cursos_por_ruta();
        env.pool.run_until_stalled();

        let (en_ruta, fuera) = catalog.cursos_por_ruta().data.unwrap();
        assert_eq!(en_ruta.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(fuera.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(env.gateway.calls("get_cursos"), 1);
    }
}
