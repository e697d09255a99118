// ============================================================================
// RUTA STATE - Hoja de ruta actual del alumno
// ============================================================================
// Se sustituye entera al cambiar; nunca se modifica en sitio.
// ============================================================================

use crate::models::{Curso, Id, Ruta, cursos_fuera_de_ruta, filter_cursos_by_ruta};
use crate::state::{Loadable, ReactiveState};

#[derive(Clone)]
pub struct RutaState {
    ruta: ReactiveState<Loadable<Ruta>>,
}

impl RutaState {
    pub fn new() -> Self {
        Self {
            ruta: ReactiveState::new(Loadable::Unknown),
        }
    }

    pub fn get(&self) -> Loadable<Ruta> {
        self.ruta.get()
    }

    pub fn set_ruta(&self, ruta: Option<Ruta>) {
        self.ruta.set(ruta.into());
    }

    pub fn reset(&self) {
        self.ruta.set(Loadable::Absent);
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.ruta.subscribe(callback);
    }

    pub fn itinerario(&self) -> Vec<Id> {
        self.ruta
            .with(|r| r.loaded().map(|r| r.meta.itinerario.clone()).unwrap_or_default())
    }

    pub fn cursos_en_ruta(&self, cursos: &[Curso]) -> Vec<Curso> {
        filter_cursos_by_ruta(&self.itinerario(), cursos)
    }

    pub fn cursos_fuera_de_ruta(&self, cursos: &[Curso]) -> Vec<Curso> {
        cursos_fuera_de_ruta(&self.itinerario(), cursos)
    }
}

impl Default for RutaState {
    fn default() -> Self {
        Self::new()
    }
}
