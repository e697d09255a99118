// ============================================================================
// PLAYER VIEWMODEL - Posición del vídeo y eventos de reproducción
// ============================================================================
// Cada tick actualiza el progreso global en local. Al servidor solo se vuelca
// cada `flush_interval_seconds` de reproducción, al pausar y al terminar.
// El tiempo llega como segundos de reproducción: no hay temporizadores aquí.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::CONFIG;
use crate::error::CampusResult;
use crate::models::{Id, Leccion, ProgresoGlobalPatch};
use crate::services::events::{EventBus, PlayerEvent};
use crate::services::gateway::DataGateway;
use crate::state::AppState;
use crate::viewmodels::leccion_viewmodel::LeccionViewModel;

#[derive(Default)]
struct Playback {
    leccion_id: Option<Id>,
    last_position: Option<f64>,
    since_flush: f64,
}

#[derive(Clone)]
pub struct PlayerProgressTracker {
    state: AppState,
    gateway: Rc<dyn DataGateway>,
    leccion_vm: LeccionViewModel,
    events: EventBus,
    flush_interval: f64,
    playback: Rc<RefCell<Playback>>,
}

impl PlayerProgressTracker {
    pub fn new(state: AppState, gateway: Rc<dyn DataGateway>, leccion_vm: LeccionViewModel, events: EventBus) -> Self {
        Self {
            state,
            gateway,
            leccion_vm,
            events,
            flush_interval: CONFIG.progress_config.flush_interval_seconds,
            playback: Rc::new(RefCell::new(Playback::default())),
        }
    }

    pub fn with_flush_interval(mut self, seconds: f64) -> Self {
        self.flush_interval = seconds;
        self
    }

    /// Lección en reproducción. Al cambiar de lección se reinicia el contador.
    fn current(&self) -> Option<Leccion> {
        let leccion = self.leccion_vm.leccion()?;
        let mut playback = self.playback.borrow_mut();
        if playback.leccion_id != Some(leccion.id) {
            *playback = Playback {
                leccion_id: Some(leccion.id),
                ..Playback::default()
            };
        }
        Some(leccion)
    }

    pub async fn on_start(&self) {
        let Some(leccion) = self.current() else {
            return;
        };
        if let Err(e) = self.leccion_vm.record_started(&leccion).await {
            log::error!("❌ Error registrando inicio de la lección {}: {}", leccion.id, e);
        }
        if self.state.progreso.is_leccion_started(leccion.id) == Some(false) {
            self.state.progreso.record_playback(leccion.id, 0.0);
            self.flush_logged().await;
        }
    }

    /// Tick del reproductor con la posición actual en segundos
    pub async fn on_progress(&self, played_seconds: f64) {
        let Some(leccion) = self.current() else {
            return;
        };
        self.state.progreso.record_playback(leccion.id, played_seconds);

        let due = {
            let mut playback = self.playback.borrow_mut();
            if let Some(last) = playback.last_position {
                let delta = played_seconds - last;
                if delta > 0.0 {
                    playback.since_flush += delta;
                }
            }
            playback.last_position = Some(played_seconds);
            playback.since_flush >= self.flush_interval
        };
        if due {
            self.flush_logged().await;
        }
    }

    /// Un salto no cuenta como tiempo reproducido
    pub fn on_seek(&self, position: f64) {
        if self.current().is_some() {
            self.playback.borrow_mut().last_position = Some(position);
        }
    }

    pub fn on_play(&self) {
        self.events.emit(PlayerEvent::VideoPlay);
    }

    pub async fn on_pause(&self) {
        self.events.emit(PlayerEvent::VideoPause);
        self.flush_logged().await;
    }

    pub async fn on_ended(&self) {
        let Some(leccion) = self.current() else {
            self.leccion_vm.warn_undefined_leccion();
            return;
        };
        // Primero la posición: completar puede refrescar el progreso global
        self.flush_logged().await;
        if let Err(e) = self.leccion_vm.record_completed(&leccion).await {
            log::error!("❌ Error completando la lección {}: {}", leccion.id, e);
        }
    }

    /// Vuelca `progreso_lecciones` al servidor. `Ok(false)` si no hay nada que
    /// volcar o si una escritura más nueva ya se aplicó.
    pub async fn flush(&self) -> CampusResult<bool> {
        let Some(id) = self.state.progreso.id() else {
            return Ok(false);
        };
        let Some(lecciones) = self
            .state
            .progreso
            .get()
            .loaded()
            .map(|p| p.progreso_lecciones.clone())
        else {
            return Ok(false);
        };
        self.playback.borrow_mut().since_flush = 0.0;

        let patch = ProgresoGlobalPatch::lecciones(lecciones);
        let gateway = self.gateway.clone();
        self.state
            .progreso
            .commit(async move { gateway.update_progreso_global(id, &patch).await.map(Some) })
            .await
    }

    async fn flush_logged(&self) {
        if let Err(e) = self.flush().await {
            log::error!("❌ Error al guardar el progreso del vídeo: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::curso::fixtures::curso;
    use crate::services::catalog_service::CatalogService;
    use crate::testing::{progreso_global, user, TestEnv};
    use futures::executor::block_on;

    struct Fixture {
        env: TestEnv,
        state: AppState,
        vm: LeccionViewModel,
        player: PlayerProgressTracker,
        events: Rc<RefCell<Vec<PlayerEvent>>>,
    }

    fn fixture() -> Fixture {
        let env = TestEnv::new();
        env.gateway.seed_cursos(vec![curso(1, &[(10, &[1, 2])])]);
        env.gateway.seed_progreso_global(progreso_global(1, Some(1)));

        let state = AppState::new(env.data_gateway(), env.runtime.clone());
        state.session.set_session("tok".to_string(), user(7, Some(1)));
        state.progreso.set_progreso_global(Some(progreso_global(1, Some(1))));

        let catalog = CatalogService::new("campus", env.data_gateway(), state.clone(), env.runtime.clone());
        let vm = LeccionViewModel::new(
            state.clone(),
            env.data_gateway(),
            catalog,
            env.runtime.clone(),
            Rc::new(env.notifier.clone()),
        );

        let bus = EventBus::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        bus.subscribe(move |e| sink.borrow_mut().push(e));

        let player = PlayerProgressTracker::new(state.clone(), env.data_gateway(), vm.clone(), bus)
            .with_flush_interval(300.0);
        Fixture { env, state, vm, player, events }
    }

    fn show_leccion(f: &Fixture, id: Id) {
        let curso = curso(1, &[(10, &[1, 2])]);
        let leccion = curso.find_leccion(id).cloned();
        f.vm.show(curso, leccion);
    }

    #[test]
    fn test_flushes_every_interval_and_on_pause() {
        let f = fixture();
        show_leccion(&f, 1);

        for secs in [0.0, 100.0, 200.0, 299.0] {
            block_on(f.player.on_progress(secs));
        }
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 0);
        assert_eq!(f.state.progreso.segundos_de(1), Some(Some(299.0)));

        block_on(f.player.on_progress(300.0));
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 1);
        let server = f.env.gateway.progreso_global(1).unwrap();
        assert_eq!(server.progreso_lecciones.segundos_de(1), Some(300.0));
        assert_eq!(server.progreso_lecciones.last_played, Some(1));

        block_on(f.player.on_progress(450.0));
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 1);

        block_on(f.player.on_pause());
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 2);
        assert_eq!(*f.events.borrow(), vec![PlayerEvent::VideoPause]);
    }

    #[test]
    fn test_seek_does_not_count_as_playback() {
        let f = fixture();
        show_leccion(&f, 1);

        block_on(f.player.on_progress(10.0));
        f.player.on_seek(1000.0);
        block_on(f.player.on_progress(1010.0));
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 0);

        block_on(f.player.on_progress(1310.0));
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 1);
    }

    #[test]
    fn test_start_posts_progress_once_for_unseen_lesson() {
        let f = fixture();
        show_leccion(&f, 2);

        block_on(f.player.on_start());
        assert_eq!(f.env.gateway.calls("add_progreso"), 1);
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 1);
        assert_eq!(f.state.progreso.is_leccion_started(2), Some(true));

        block_on(f.player.on_start());
        assert_eq!(f.env.gateway.progresos().len(), 1);
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 1);
    }

    #[test]
    fn test_play_emits_event() {
        let f = fixture();
        f.player.on_play();
        assert_eq!(*f.events.borrow(), vec![PlayerEvent::VideoPlay]);
    }

    #[test]
    fn test_ended_without_lesson_warns() {
        let f = fixture();
        f.vm.show(curso(1, &[(10, &[1, 2])]), None);

        block_on(f.player.on_ended());

        assert_eq!(f.env.notifier.toasts().len(), 1);
        assert_eq!(f.env.gateway.calls("add_progreso"), 0);
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 0);
    }

    #[test]
    fn test_ended_completes_and_flushes() {
        let f = fixture();
        show_leccion(&f, 1);

        block_on(f.player.on_progress(42.0));
        block_on(f.player.on_ended());

        let completados = f
            .env
            .gateway
            .progresos()
            .into_iter()
            .filter(|p| p.tipo == crate::models::ProgresoTipo::Completado)
            .count();
        assert_eq!(completados, 1);
        assert_eq!(f.env.gateway.calls("update_progreso_global"), 1);
    }
}
