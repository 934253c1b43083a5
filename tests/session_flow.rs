use fraudboard::error::ClientError;
use fraudboard::session::form::{Credentials, Field, FormMode};
use fraudboard::session::{guard, Outcome, Route, Session, View};
use fraudboard::state::{AppContext, Config};
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> Config {
    Config {
        session_db: dir.path().join("session.sqlite").to_string_lossy().to_string(),
        ..Config::default()
    }
}

#[test]
fn login_persists_across_processes_until_logout() {
    let dir = TempDir::new().unwrap();
    let cfg = config_in(&dir);

    {
        let ctx = AppContext::open(cfg.clone()).unwrap();
        assert_eq!(guard(&ctx.session, View::Dashboard), Route::Redirect(View::Login));
    }
    {
        let mut ctx = AppContext::open(cfg.clone()).unwrap();
        let out = ctx
            .session
            .submit(FormMode::Login, &Credentials::login("ann@example.com", "secret1"))
            .unwrap();
        assert_eq!(out, Outcome::NavigateToDashboard);
    }
    {
        let mut ctx = AppContext::open(cfg.clone()).unwrap();
        assert_eq!(guard(&ctx.session, View::Dashboard), Route::Render(View::Dashboard));
        ctx.session.logout().unwrap();
    }
    let ctx = AppContext::open(cfg).unwrap();
    assert!(!ctx.session.is_authenticated());
    assert_eq!(guard(&ctx.session, View::Data), Route::Redirect(View::Login));
}

#[test]
fn signup_then_login() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(&config_in(&dir).session_db).unwrap();

    let mut mode = FormMode::Signup;
    let creds = Credentials::signup("Ann Example", "ann@example.com", "secret1", "secret1");
    assert_eq!(session.submit(mode, &creds).unwrap(), Outcome::AccountCreated);
    assert!(!session.is_authenticated());

    mode = mode.toggle();
    assert_eq!(mode, FormMode::Login);
    session
        .submit(mode, &Credentials::login("ann@example.com", "secret1"))
        .unwrap();
    assert!(session.is_authenticated());
}

#[test]
fn rejected_signup_reports_every_field() {
    let mut session = Session::in_memory().unwrap();
    let err = session
        .submit(FormMode::Signup, &Credentials::signup("", "nope", "123", "456"))
        .unwrap_err();
    let ClientError::Validation(errs) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errs.get(Field::FullName), Some("Full name is required"));
    assert_eq!(errs.get(Field::Email), Some("Please enter a valid email"));
    assert_eq!(errs.get(Field::Password), Some("Password must be at least 6 characters"));
    assert_eq!(errs.get(Field::ConfirmPassword), Some("Passwords do not match"));
}
