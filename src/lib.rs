// ============================================================================
// CAMPUS STATE - Estado de cliente del campus (RUST PURO + WASM)
// ============================================================================
// Arquitectura MVVM:
// - ViewModels: sesión, lección y reproductor
// - Services: API, caché de entidades, avisos y eventos
// - State: stores con Rc<RefCell> + notificaciones
// - Models: Estructuras compartidas con backend
// ============================================================================

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;
pub mod app;

#[cfg(test)]
pub(crate) mod testing;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_logger::Config;

pub use app::CampusApp;
pub use error::{CampusError, CampusResult};

// Instancia global de la aplicación
thread_local! {
    static APP: RefCell<Option<CampusApp>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Inicializar panic hook para mejor debugging
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // Inicializar logging
    wasm_logger::init(Config::default());
    log::info!("🚀 Campus State - Rust Puro + MVVM ({})", config::CONFIG.environment);

    let app = CampusApp::browser();
    app.start();

    APP.with(|cell| {
        *cell.borrow_mut() = Some(app);
    });
    Ok(())
}

/// Acceso a la instancia creada en `main`
pub fn with_app<R>(f: impl FnOnce(&CampusApp) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow().as_ref().map(f))
}

/// Cierre de sesión llamable desde JavaScript
#[wasm_bindgen]
pub fn logout() {
    if with_app(|app| app.session().logout()).is_none() {
        log::warn!("⚠️ App no está inicializada");
    }
}
