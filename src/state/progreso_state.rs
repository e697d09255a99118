// ============================================================================
// PROGRESO STATE - Progreso global del alumno (única fuente de verdad)
// ============================================================================
// Cada escritura recibe un número de secuencia al emitirse. Un resultado solo
// se aplica si su secuencia es más nueva que la ya aplicada: una respuesta lenta
// de una petición antigua nunca pisa un valor más reciente.
// ============================================================================

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use crate::error::CampusResult;
use crate::models::{Id, ProgresoGlobal, ProgresoLecciones};
use crate::state::{Loadable, ReactiveState};

/// Secuencia asignada a una escritura al emitirla
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct WriteTicket(u64);

#[derive(Clone)]
pub struct ProgresoState {
    progreso: ReactiveState<Loadable<ProgresoGlobal>>,
    issued: Rc<Cell<u64>>,
    applied: Rc<Cell<u64>>,
}

impl ProgresoState {
    pub fn new() -> Self {
        Self {
            progreso: ReactiveState::new(Loadable::Unknown),
            issued: Rc::new(Cell::new(0)),
            applied: Rc::new(Cell::new(0)),
        }
    }

    pub fn get(&self) -> Loadable<ProgresoGlobal> {
        self.progreso.get()
    }

    pub fn id(&self) -> Option<Id> {
        self.progreso.with(|p| p.loaded().map(|p| p.id))
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.progreso.subscribe(callback);
    }

    /// Reserva la siguiente secuencia. Llamar antes de lanzar la petición.
    pub fn begin_write(&self) -> WriteTicket {
        let next = self.issued.get() + 1;
        self.issued.set(next);
        WriteTicket(next)
    }

    /// Aplica el valor si el ticket es más nuevo que el último aplicado
    pub fn apply(&self, ticket: WriteTicket, value: Loadable<ProgresoGlobal>) -> bool {
        if ticket.0 <= self.applied.get() {
            log::debug!("Escritura de progreso obsoleta descartada (#{} <= #{})", ticket.0, self.applied.get());
            return false;
        }
        self.applied.set(ticket.0);
        self.progreso.set(value);
        true
    }

    /// Escritura inmediata con el valor autoritativo devuelto por el servidor
    pub fn set_progreso_global(&self, value: Option<ProgresoGlobal>) {
        let ticket = self.begin_write();
        self.apply(ticket, value.into());
    }

    /// Emite la secuencia antes de esperar y aplica el resultado al terminar.
    /// Devuelve `false` si otra escritura más nueva se aplicó mientras tanto.
    pub async fn commit<Fut>(&self, request: Fut) -> CampusResult<bool>
    where
        Fut: Future<Output = CampusResult<Option<ProgresoGlobal>>>,
    {
        let ticket = self.begin_write();
        let value = request.await?;
        Ok(self.apply(ticket, value.into()))
    }

    /// Vuelve a "cargando" (p.ej. al iniciar la hidratación)
    pub fn mark_loading(&self) {
        let ticket = self.begin_write();
        self.apply(ticket, Loadable::Unknown);
    }

    /// Centinela de sesión cerrada. Descarta cualquier escritura en vuelo.
    pub fn reset(&self) {
        let ticket = self.begin_write();
        self.apply(ticket, Loadable::Absent);
    }

    /// Actualización local de la posición del vídeo. Devuelve el estado a volcar.
    pub fn record_playback(&self, leccion_id: Id, segundos: f64) -> Option<ProgresoLecciones> {
        let mut progreso = self.progreso.with(|p| p.loaded().cloned())?;
        progreso.progreso_lecciones.registrar(leccion_id, segundos);
        let lecciones = progreso.progreso_lecciones.clone();

        let ticket = self.begin_write();
        self.apply(ticket, Loadable::Loaded(progreso));
        Some(lecciones)
    }

    pub fn segundos_de(&self, leccion_id: Id) -> Option<Option<f64>> {
        self.progreso
            .with(|p| p.derive(|p| p.and_then(|p| p.progreso_lecciones.segundos_de(leccion_id))))
    }

    pub fn is_leccion_started(&self, leccion_id: Id) -> Option<bool> {
        self.segundos_de(leccion_id).map(|s| s.is_some())
    }

    pub fn last_played(&self) -> Option<Option<Id>> {
        self.progreso
            .with(|p| p.derive(|p| p.and_then(|p| p.progreso_lecciones.last_played)))
    }

    pub fn is_certificacion_completada(&self, certificacion_id: Id) -> Option<bool> {
        self.progreso
            .with(|p| p.derive(|p| p.is_some_and(|p| p.is_certificacion_completada(certificacion_id))))
    }

    pub fn is_certificacion_iniciada(&self, certificacion_id: Id) -> Option<bool> {
        self.progreso
            .with(|p| p.derive(|p| p.is_some_and(|p| p.is_certificacion_iniciada(certificacion_id))))
    }

    pub fn progreso_cursos(&self) -> Option<f64> {
        self.progreso.with(|p| p.loaded().map(|p| p.meta.progreso_cursos))
    }
}

impl Default for ProgresoState {
    fn default() -> Self {
        Self::new()
    }
}
