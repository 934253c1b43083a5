//! Session gate: the local "authenticated" flag and the route guard in
//! front of the dashboard views.

pub mod form;

use chrono::Utc;

use crate::error::{ClientError, Result};
use crate::logging::{log_form_rejected, log_guard, log_login, log_logout, log_signup};
use crate::storage::{SessionStore, AUTH_KEY};
use form::{validate, Credentials, FormMode};

/// What the caller should do after a successful form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NavigateToDashboard,
    /// Signup is local only; the caller switches the form back to login.
    AccountCreated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
    Data,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Data => "data",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, View::Login)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Render(View),
    Redirect(View),
}

pub struct Session {
    store: SessionStore,
}

impl Session {
    pub fn open(path: &str) -> Result<Self> {
        let mut store = SessionStore::new(path)?;
        store.init()?;
        Ok(Self { store })
    }

    pub fn in_memory() -> Result<Self> {
        let mut store = SessionStore::in_memory()?;
        store.init()?;
        Ok(Self { store })
    }

    pub fn submit(&mut self, mode: FormMode, creds: &Credentials) -> Result<Outcome> {
        match mode {
            FormMode::Login => self.login(creds),
            FormMode::Signup => self.signup(creds),
        }
    }

    pub fn login(&mut self, creds: &Credentials) -> Result<Outcome> {
        check(FormMode::Login, creds)?;
        self.store.set(AUTH_KEY, "true", Utc::now().timestamp())?;
        log_login();
        Ok(Outcome::NavigateToDashboard)
    }

    pub fn signup(&mut self, creds: &Credentials) -> Result<Outcome> {
        check(FormMode::Signup, creds)?;
        log_signup();
        Ok(Outcome::AccountCreated)
    }

    pub fn logout(&mut self) -> Result<()> {
        let was = self.store.remove(AUTH_KEY)?;
        log_logout(was);
        Ok(())
    }

    /// Storage failures read as logged out.
    pub fn is_authenticated(&self) -> bool {
        self.store.auth_flag().unwrap_or(false)
    }

    /// Unix seconds at which the flag was last set.
    pub fn authenticated_since(&self) -> Option<i64> {
        self.store.auth_since().ok().flatten()
    }
}

fn check(mode: FormMode, creds: &Credentials) -> Result<()> {
    validate(mode, creds).map_err(|errs| {
        let fields: Vec<&str> = errs.iter().map(|(f, _)| f.as_str()).collect();
        log_form_rejected(mode.as_str(), &fields);
        ClientError::Validation(errs)
    })
}

pub fn guard(session: &Session, view: View) -> Route {
    if !view.requires_auth() {
        return Route::Render(view);
    }
    let allowed = session.is_authenticated();
    log_guard(view.as_str(), allowed);
    if allowed {
        Route::Render(view)
    } else {
        Route::Redirect(View::Login)
    }
}
