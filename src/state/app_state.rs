// ============================================================================
// APP STATE - Estado global de la aplicación
// ============================================================================
// Una instancia por proceso. Se inyecta en los ViewModels; nadie la busca
// de forma ambiental.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::config::CampusPage;
use crate::models::ThemeMode;
use crate::services::gateway::DataGateway;
use crate::state::{FavoritosState, ProgresoState, RutaState, SessionState};
use crate::utils::runtime::Runtime;

/// Preferencias de UI que dependen del usuario o del entorno
#[derive(Clone)]
pub struct UiState {
    pub theme: Rc<RefCell<ThemeMode>>,
    pub disabled_pages: Rc<RefCell<HashSet<CampusPage>>>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            theme: Rc::new(RefCell::new(ThemeMode::default())),
            disabled_pages: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub fn set_theme(&self, theme: ThemeMode) {
        *self.theme.borrow_mut() = theme;
    }

    pub fn get_theme(&self) -> ThemeMode {
        *self.theme.borrow()
    }

    pub fn set_disabled_pages(&self, pages: HashSet<CampusPage>) {
        *self.disabled_pages.borrow_mut() = pages;
    }

    pub fn is_page_disabled(&self, page: CampusPage) -> bool {
        self.disabled_pages.borrow().contains(&page)
    }

    pub fn reset(&self) {
        self.set_theme(ThemeMode::default());
        self.disabled_pages.borrow_mut().clear();
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Estado global de la aplicación
#[derive(Clone)]
pub struct AppState {
    pub session: SessionState,
    pub progreso: ProgresoState,
    pub favoritos: FavoritosState,
    pub ruta: RutaState,
    pub ui: UiState,
}

impl AppState {
    pub fn new(gateway: Rc<dyn DataGateway>, runtime: Runtime) -> Self {
        Self {
            session: SessionState::new(),
            progreso: ProgresoState::new(),
            favoritos: FavoritosState::new(gateway, runtime),
            ruta: RutaState::new(),
            ui: UiState::new(),
        }
    }

    /// Deja todos los stores en el centinela de "sesión cerrada"
    pub fn tear_down(&self) {
        self.session.clear();
        self.progreso.reset();
        self.favoritos.reset();
        self.ruta.reset();
        self.ui.reset();
    }
}
