// ============================================================================
// LECCION VIEWMODEL - Completar y avanzar lecciones
// ============================================================================
// Máquina de estados del botón "siguiente":
//   Bloqueada --avanzar--> Cargando --completada--> Desbloqueada --espera--> Siguiente
//   Siguiente --avanzar--> navega si la siguiente lección no está bloqueada
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::CONFIG;
use crate::error::{CampusError, CampusResult};
use crate::models::{Curso, Id, Leccion, Progreso, ProgresoTipo};
use crate::services::catalog_service::CatalogService;
use crate::services::gateway::DataGateway;
use crate::services::notifier::{Notifier, Toast};
use crate::services::query::Query;
use crate::state::{AppState, ReactiveState};
use crate::utils::runtime::Runtime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeccionMode {
    Bloqueada,
    Desbloqueada,
    Cargando,
    Siguiente,
}

/// Destino al que la vista debe navegar
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Inicio,
    Curso(Id),
    Leccion { curso_id: Id, leccion_id: Id },
}

#[derive(Default)]
struct LeccionView {
    curso: Option<Curso>,
    leccion: Option<Leccion>,
    /// Cambia con cada lección mostrada; las tareas de una visita anterior no tocan la vista
    visit: u64,
}

#[derive(Clone)]
pub struct LeccionViewModel {
    state: AppState,
    gateway: Rc<dyn DataGateway>,
    catalog: CatalogService,
    runtime: Runtime,
    notifier: Rc<dyn Notifier>,
    unlock_delay_ms: u32,
    view: Rc<RefCell<LeccionView>>,
    mode: ReactiveState<LeccionMode>,
}

impl LeccionViewModel {
    pub fn new(
        state: AppState,
        gateway: Rc<dyn DataGateway>,
        catalog: CatalogService,
        runtime: Runtime,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            state,
            gateway,
            catalog,
            runtime,
            notifier,
            unlock_delay_ms: CONFIG.progress_config.unlock_delay_ms,
            view: Rc::new(RefCell::new(LeccionView::default())),
            mode: ReactiveState::new(LeccionMode::Bloqueada),
        }
    }

    pub fn with_unlock_delay(mut self, unlock_delay_ms: u32) -> Self {
        self.unlock_delay_ms = unlock_delay_ms;
        self
    }

    pub fn mode(&self) -> LeccionMode {
        self.mode.get()
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.mode.subscribe(callback);
    }

    pub fn curso(&self) -> Option<Curso> {
        self.view.borrow().curso.clone()
    }

    pub fn leccion(&self) -> Option<Leccion> {
        self.view.borrow().leccion.clone()
    }

    /// Carga curso (calculado para el alumno) y lección y los muestra
    pub async fn open(&self, curso_id: Id, leccion_id: Id) -> CampusResult<Option<Navigation>> {
        let Some(curso) = self.catalog.load_curso(curso_id).await? else {
            log::warn!("⚠️ Curso {} no encontrado", curso_id);
            return Ok(Some(Navigation::Inicio));
        };
        let leccion = self.catalog.load_leccion(leccion_id).await?;
        Ok(self.show(curso, leccion))
    }

    /// Muestra una lección. Si el curso la marca bloqueada se redirige a la portada.
    pub fn show(&self, curso: Curso, leccion: Option<Leccion>) -> Option<Navigation> {
        let en_curso = leccion.as_ref().and_then(|l| curso.find_leccion(l.id)).cloned();
        let curso_id = curso.id;
        {
            let mut view = self.view.borrow_mut();
            view.visit += 1;
            view.curso = Some(curso);
            view.leccion = leccion;
        }

        if en_curso.as_ref().is_some_and(|l| l.meta.is_blocked) {
            self.notifier.notify(Toast::warning(
                "Redirigiendo a la portada del curso",
                "Has intentado entrar en una lección bloqueada",
            ));
            return Some(Navigation::Curso(curso_id));
        }

        let completed = en_curso.is_some_and(|l| l.meta.is_completed);
        self.mode.set(if completed { LeccionMode::Siguiente } else { LeccionMode::Bloqueada });
        None
    }

    /// Lección actual con la `meta` que trae el curso
    fn current(&self) -> Option<(Curso, Leccion)> {
        let view = self.view.borrow();
        let curso = view.curso.clone()?;
        let leccion = view.leccion.as_ref()?;
        let leccion = curso.find_leccion(leccion.id).cloned().unwrap_or_else(|| leccion.clone());
        Some((curso, leccion))
    }

    pub fn next_leccion(&self) -> Option<Leccion> {
        let (curso, leccion) = self.current()?;
        curso.next_leccion(&leccion).cloned()
    }

    pub fn prev_leccion(&self) -> Option<Leccion> {
        let (curso, leccion) = self.current()?;
        curso.prev_leccion(&leccion).cloned()
    }

    pub fn next_is_blocked(&self) -> bool {
        self.next_leccion().map_or(true, |l| l.meta.is_blocked)
    }

    pub fn prev_is_blocked(&self) -> bool {
        self.prev_leccion().map_or(true, |l| l.meta.is_blocked)
    }

    pub fn go_prev(&self) -> Option<Navigation> {
        let curso_id = self.view.borrow().curso.as_ref()?.id;
        let prev = self.prev_leccion()?;
        Some(Navigation::Leccion { curso_id, leccion_id: prev.id })
    }

    pub fn warn_undefined_leccion(&self) {
        self.notifier.notify(Toast::warning(
            "Error al guardar el progreso",
            "La lección es indefinida. Actualice la página y contacte con soporte si el error persiste.",
        ));
    }

    /// Pulsación del botón "siguiente". Devuelve la navegación a realizar, si la hay.
    pub async fn advance(&self) -> Option<Navigation> {
        let Some((curso, leccion)) = self.current() else {
            self.warn_undefined_leccion();
            return None;
        };
        let next = curso.next_leccion(&leccion).cloned();

        match self.mode.get() {
            LeccionMode::Siguiente => next
                .filter(|n| !n.meta.is_blocked)
                .map(|n| Navigation::Leccion { curso_id: curso.id, leccion_id: n.id }),
            LeccionMode::Bloqueada => {
                // Sin lección siguiente no hay nada que desbloquear
                let next = next?;
                self.complete(leccion, next.id).await;
                None
            }
            LeccionMode::Cargando | LeccionMode::Desbloqueada => None,
        }
    }

    async fn complete(&self, leccion: Leccion, next_id: Id) {
        let visit = self.view.borrow().visit;
        self.mode.set(LeccionMode::Cargando);

        if let Err(e) = self.record_completed(&leccion).await {
            log::error!("❌ Error al completar la lección {}: {}", leccion.id, e);
            if self.view.borrow().visit == visit {
                self.mode.set(LeccionMode::Bloqueada);
            }
            return;
        }
        if self.view.borrow().visit != visit {
            return;
        }

        if let Some(curso) = self.view.borrow_mut().curso.as_mut() {
            for l in curso.modulos.iter_mut().flat_map(|m| m.lecciones.iter_mut()) {
                if l.id == leccion.id {
                    l.meta.is_completed = true;
                }
                if l.id == next_id {
                    l.meta.is_blocked = false;
                }
            }
        }
        self.mode.set(LeccionMode::Desbloqueada);

        self.runtime.sleep(self.unlock_delay_ms).await;
        if self.view.borrow().visit == visit {
            self.mode.set(LeccionMode::Siguiente);
        }
    }

    fn progreso_for(&self, leccion: &Leccion, tipo: ProgresoTipo) -> Option<Progreso> {
        Some(Progreso {
            id: None,
            user_id: self.state.session.get_user_id()?,
            curso_id: self.view.borrow().curso.as_ref()?.id,
            leccion_id: leccion.id,
            modulo_id: leccion.modulo_id,
            tipo,
        })
    }

    /// Crea el registro salvo que ya exista uno igual. La comprobación no es
    /// transaccional: dos pestañas a la vez aún pueden duplicar.
    async fn create_if_missing(&self, progreso: Progreso) -> CampusResult<bool> {
        let query = Query::new()
            .eq("user_id", progreso.user_id)
            .eq("leccion_id", progreso.leccion_id)
            .eq("tipo", progreso.tipo.as_str());
        let existing = self.gateway.get_progresos(&query).await?;
        if !existing.is_empty() {
            log::debug!("Progreso {} ya existe para la lección {}", progreso.tipo.as_str(), progreso.leccion_id);
            return Ok(false);
        }
        self.gateway.add_progreso(&progreso).await?;
        Ok(true)
    }

    /// Registro `visto` al empezar la lección
    pub async fn record_started(&self, leccion: &Leccion) -> CampusResult<bool> {
        let Some(progreso) = self.progreso_for(leccion, ProgresoTipo::Visto) else {
            return Ok(false);
        };
        self.create_if_missing(progreso).await
    }

    /// Registro `completado`. Si es nuevo refresca el curso y, en la primera o
    /// última lección del curso, también el progreso global.
    pub async fn record_completed(&self, leccion: &Leccion) -> CampusResult<bool> {
        let Some(progreso) = self.progreso_for(leccion, ProgresoTipo::Completado) else {
            return Err(CampusError::UndefinedEntity("usuario o curso".to_string()));
        };
        let curso_id = progreso.curso_id;
        if !self.create_if_missing(progreso).await? {
            return Ok(false);
        }

        self.catalog.invalidate_curso(curso_id);
        let visit = self.view.borrow().visit;
        let Some(curso) = self.catalog.load_curso(curso_id).await? else {
            return Ok(true);
        };
        let first_or_last = curso.is_first_or_last(leccion.id);
        if self.view.borrow().visit == visit {
            self.view.borrow_mut().curso = Some(curso);
        }

        if first_or_last {
            if let Some(id) = self.state.progreso.id() {
                log::info!("📈 Curso empezado o terminado, refrescando progreso global");
                self.state
                    .progreso
                    .commit(self.gateway.get_progreso_global_by_id(id))
                    .await?;
            }
        }
        Ok(true)
    }
}
