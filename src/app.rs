// ============================================================================
// APP - Raíz de composición del cliente
// ============================================================================
// Crea una única instancia de cada store y servicio y la inyecta en los
// ViewModels. En el navegador: ApiClient, storage del navegador, spawn_local.
// ============================================================================

use std::rc::Rc;

use crate::config::CONFIG;
use crate::services::api_client::ApiClient;
use crate::services::catalog_service::CatalogService;
use crate::services::events::EventBus;
use crate::services::gateway::DataGateway;
use crate::services::notifier::{LogNotifier, Notifier};
use crate::state::AppState;
use crate::utils::runtime::Runtime;
use crate::utils::storage::SessionStorage;
use crate::viewmodels::{LeccionViewModel, PlayerProgressTracker, SessionViewModel};

/// Aplicación principal
#[derive(Clone)]
pub struct CampusApp {
    state: AppState,
    gateway: Rc<dyn DataGateway>,
    runtime: Runtime,
    notifier: Rc<dyn Notifier>,
    events: EventBus,
    catalog: CatalogService,
    session: SessionViewModel,
}

impl CampusApp {
    pub fn new(
        gateway: Rc<dyn DataGateway>,
        runtime: Runtime,
        storage: SessionStorage,
        notifier: Rc<dyn Notifier>,
        events: EventBus,
    ) -> Self {
        let state = AppState::new(gateway.clone(), runtime.clone());
        let catalog = CatalogService::new(&CONFIG.client, gateway.clone(), state.clone(), runtime.clone());
        let session = SessionViewModel::new(
            state.clone(),
            gateway.clone(),
            storage,
            catalog.clone(),
            notifier.clone(),
        );
        Self {
            state,
            gateway,
            runtime,
            notifier,
            events,
            catalog,
            session,
        }
    }

    pub fn browser() -> Self {
        Self::new(
            Rc::new(ApiClient::new()),
            Runtime::browser(),
            SessionStorage::browser(CONFIG.session_config.clone()),
            Rc::new(LogNotifier),
            EventBus::browser(),
        )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn session(&self) -> &SessionViewModel {
        &self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Un ViewModel por pantalla de lección
    pub fn leccion_viewmodel(&self) -> LeccionViewModel {
        LeccionViewModel::new(
            self.state.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
            self.runtime.clone(),
            self.notifier.clone(),
        )
    }

    pub fn player(&self, leccion_vm: LeccionViewModel) -> PlayerProgressTracker {
        PlayerProgressTracker::new(self.state.clone(), self.gateway.clone(), leccion_vm, self.events.clone())
    }

    /// Restauración silenciosa de la sesión persistida, en segundo plano
    pub fn start(&self) {
        let session = self.session.clone();
        self.runtime.spawn(async move {
            match session.restore().await {
                Ok(Some(user)) => log::info!("✅ Sesión restaurada: {}", user.email),
                Ok(None) => log::info!("ℹ️ Sin sesión guardada"),
                Err(e) => log::warn!("⚠️ No se pudo restaurar la sesión: {}", e),
            }
        });
    }
}
