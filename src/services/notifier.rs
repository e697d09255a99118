// ============================================================================
// NOTIFIER - Canal único de avisos al usuario (toasts)
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

/// Duración de los avisos de error importantes
pub const LONG_TOAST_MS: u32 = 8000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
    pub duration_ms: Option<u32>,
}

impl Toast {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            title: title.into(),
            description: description.into(),
            duration_ms: None,
        }
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Warning,
            title: title.into(),
            description: description.into(),
            duration_ms: None,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            description: description.into(),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// La capa de UI decide cómo pintar el aviso
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Implementación por defecto: solo consola
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Info => log::info!("ℹ️ {}: {}", toast.title, toast.description),
            ToastKind::Warning => log::warn!("⚠️ {}: {}", toast.title, toast.description),
            ToastKind::Error => log::error!("❌ {}: {}", toast.title, toast.description),
        }
    }
}

/// Guarda los avisos emitidos
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    toasts: Rc<RefCell<Vec<Toast>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.borrow_mut().push(toast);
    }
}
