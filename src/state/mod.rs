// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod reactivity;
pub mod loadable;
pub mod session_state;
pub mod progreso_state;
pub mod favoritos_state;
pub mod ruta_state;
pub mod app_state;

pub use reactivity::*;
pub use loadable::*;
pub use session_state::*;
pub use progreso_state::*;
pub use favoritos_state::*;
pub use ruta_state::*;
pub use app_state::*;
