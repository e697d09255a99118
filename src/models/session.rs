// ============================================================================
// SESSION - Sesión del alumno
// ============================================================================

use serde::{Deserialize, Serialize};

use super::{Id, User};

/// Credenciales que devuelve el formulario de login (o el storage al arrancar)
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct Credentials {
    pub token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

/// Sesión en memoria. Un único valor vivo por proceso.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn user_id(&self) -> Option<Id> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Par persistido bajo `LOGIN_TOKEN` / `LOGIN_USER`
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct LoginData {
    pub token: String,
    pub user: User,
}
