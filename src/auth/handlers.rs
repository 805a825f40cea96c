use std::path::Path;

use axum::{
    extract::{rejection::FormRejection, Request, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, get_service},
    Form, Json, Router,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthRedirect, LoginForm, SignupForm},
        extractors::{AuthContext, AuthUser},
        password,
        repo_types::{NewUser, PublicProfile},
        session,
    },
    error::AppError,
    state::AppState,
};

pub const LANDING_PAGE: &str = "TodoSysLand.html";
pub const LOGIN_PAGE: &str = "login.html";
pub const SIGNUP_PAGE: &str = "Signup.html";
pub const APP_PAGE: &str = "TodoSys.html";

pub fn page_routes(public_dir: &str) -> Router<AppState> {
    let page = |file: &str| ServeFile::new(Path::new(public_dir).join(file));
    Router::new()
        .route("/", get_service(page(LANDING_PAGE)))
        .route("/login", get_service(page(LOGIN_PAGE)).post(login))
        .route("/signup", get_service(page(SIGNUP_PAGE)).post(signup))
        .route("/home", get(home))
        .route("/logout", get(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(get_me))
}

#[instrument(skip_all)]
pub async fn home(auth: AuthContext, State(state): State<AppState>, req: Request) -> Response {
    if auth.user_id().is_none() {
        return Redirect::to("/login").into_response();
    }
    let file = Path::new(&state.config.public_dir).join(APP_PAGE);
    match ServeFile::new(file).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Redirect {
    let form = match form {
        Ok(Form(f)) => f,
        Err(e) => {
            warn!(error = %e, "unreadable signup form");
            return AuthRedirect::Missing.redirect();
        }
    };

    match register(&state, form).await {
        Ok(user_id) => {
            info!(user_id, "user registered");
            Redirect::to("/login")
        }
        Err(outcome) => outcome.redirect(),
    }
}

async fn register(state: &AppState, form: SignupForm) -> Result<i64, AuthRedirect> {
    let valid = form.validate().inspect_err(|outcome| {
        warn!(classifier = outcome.classifier(), "signup rejected");
    })?;

    let password_digest = password::hash(valid.password).await.map_err(|e| {
        error!(error = %e, "password hash failed");
        AuthRedirect::Failed
    })?;

    let new_user = NewUser {
        name: valid.name,
        surname: valid.surname,
        email: valid.email,
        password_digest,
    };

    match state.users.create(new_user).await {
        Ok(user) => Ok(user.id),
        Err(AppError::DuplicateEmail) => {
            warn!("email already registered");
            Err(AuthRedirect::Exists)
        }
        Err(e) => {
            error!(error = ?e, "create user failed");
            Err(AuthRedirect::Failed)
        }
    }
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    current: Session,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Redirect {
    let Ok(Form(form)) = form else {
        warn!("unreadable login form");
        return AuthRedirect::Invalid.redirect();
    };

    let user = match state.users.find_by_email(&form.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %form.email, "login unknown email");
            return AuthRedirect::Invalid.redirect();
        }
        Err(e) => {
            error!(error = ?e, "find_by_email failed");
            return AuthRedirect::Invalid.redirect();
        }
    };

    match password::verify(form.password, user.password.clone()).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = user.id, "login invalid password");
            return AuthRedirect::Invalid.redirect();
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "password verify failed");
            return AuthRedirect::Invalid.redirect();
        }
    }

    if let Err(e) = session::establish(&current, user.id).await {
        error!(error = ?e, "session establish failed");
        return AuthRedirect::Invalid.redirect();
    }

    info!(user_id = user.id, "user logged in");
    Redirect::to("/home")
}

#[instrument(skip_all)]
pub async fn logout(current: Session) -> Redirect {
    if let Err(e) = session::destroy(&current).await {
        error!(error = ?e, "session destroy failed");
    }
    Redirect::to("/")
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicProfile>, AppError> {
    let profile = state
        .users
        .find_public_profile(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    Ok(Json(profile))
}
