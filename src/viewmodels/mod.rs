pub mod session_viewmodel;
pub mod leccion_viewmodel;
pub mod player_viewmodel;

pub use session_viewmodel::SessionViewModel;
pub use leccion_viewmodel::{LeccionMode, LeccionViewModel, Navigation};
pub use player_viewmodel::PlayerProgressTracker;
