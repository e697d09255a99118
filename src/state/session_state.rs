// ============================================================================
// SESSION STATE - Sesión en memoria (token + usuario)
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::{Id, Session, User};

/// Estado de sesión
#[derive(Clone)]
pub struct SessionState {
    pub session: Rc<RefCell<Session>>,
    /// Activo hasta que termina la primera hidratación tras el login.
    /// Mientras esté activo la UI no debe pintar el contenido principal.
    pub first_load: Rc<RefCell<bool>>,
    pub loading: Rc<RefCell<bool>>,
    pub error: Rc<RefCell<Option<String>>>,
}

impl SessionState {
    /// Crear nuevo estado de sesión
    pub fn new() -> Self {
        Self {
            session: Rc::new(RefCell::new(Session::default())),
            first_load: Rc::new(RefCell::new(true)),
            loading: Rc::new(RefCell::new(false)),
            error: Rc::new(RefCell::new(None)),
        }
    }

    /// Establecer sesión
    pub fn set_session(&self, token: String, user: User) {
        *self.session.borrow_mut() = Session {
            token: Some(token),
            user: Some(user),
        };
    }

    /// Obtener sesión
    pub fn get_session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn get_user(&self) -> Option<User> {
        self.session.borrow().user.clone()
    }

    pub fn get_user_id(&self) -> Option<Id> {
        self.session.borrow().user_id()
    }

    pub fn get_token(&self) -> Option<String> {
        self.session.borrow().token.clone()
    }

    /// Sustituye el usuario completo (tras cada refetch)
    pub fn set_user(&self, user: User) {
        self.session.borrow_mut().user = Some(user);
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.borrow().is_logged_in()
    }

    /// Vacía la sesión y rearma `first_load` para el siguiente login
    pub fn clear(&self) {
        *self.session.borrow_mut() = Session::default();
        *self.first_load.borrow_mut() = true;
        *self.loading.borrow_mut() = false;
    }

    pub fn set_first_load(&self, first_load: bool) {
        *self.first_load.borrow_mut() = first_load;
    }

    pub fn get_first_load(&self) -> bool {
        *self.first_load.borrow()
    }

    /// Establecer loading
    pub fn set_loading(&self, loading: bool) {
        *self.loading.borrow_mut() = loading;
    }

    /// Obtener loading
    pub fn get_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Establecer error
    pub fn set_error(&self, error: Option<String>) {
        *self.error.borrow_mut() = error;
    }

    /// Obtener error
    pub fn get_error(&self) -> Option<String> {
        self.error.borrow().clone()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
