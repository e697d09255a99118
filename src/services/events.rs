// ============================================================================
// EVENTS - Señales globales de reproducción (video-play / video-pause)
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    VideoPlay,
    VideoPause,
}

impl PlayerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::VideoPlay => "video-play",
            PlayerEvent::VideoPause => "video-pause",
        }
    }
}

type Listener = Rc<dyn Fn(PlayerEvent)>;

/// Bus de eventos sin payload ni confirmación
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Vec<Listener>>>,
    mirror_to_window: bool,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Además de los listeners internos, lanza un `Event` en `window`
    pub fn browser() -> Self {
        Self {
            listeners: Rc::default(),
            mirror_to_window: true,
        }
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(PlayerEvent) + 'static,
    {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn emit(&self, event: PlayerEvent) {
        // Copia para que un listener pueda suscribir a otros sin reentrar en el borrow
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }

        if self.mirror_to_window {
            dispatch_window_event(event.name());
        }
    }
}

fn dispatch_window_event(name: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    match web_sys::Event::new(name) {
        Ok(event) => {
            if window.dispatch_event(&event).is_err() {
                log::warn!("⚠️ No se pudo emitir {}", name);
            }
        }
        Err(_) => log::warn!("⚠️ No se pudo crear el evento {}", name),
    }
}
