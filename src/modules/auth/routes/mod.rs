use axum::{
    extract::State,
    response::Html,
    routing::get,
    Router,
};
use axum_extra::extract::{CookieJar, Form, WithRejection};

use shelf_authz::CurrentUser;
use shelf_http::error::{AppError, FormBody};

use super::models::{ChangePasswordForm, CredentialsForm, User};
use super::repo;
use crate::state::AppState;
use crate::utils::{escape, message, page};

/// Confirmation shown after a successful sign-in.
pub const LOGGED_IN_MARKER: &str = "logged in";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/signUp", get(sign_up_page).post(sign_up))
        .route("/login", get(login_page).post(login))
        .route("/changePassword", get(change_password_page).post(change_password))
        .route("/logout", get(logout))
        .with_state(state)
}

fn credentials_form(action: &str, button: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\
         <label>Username <input name=\"userName\"></label>\
         <label>Password <input type=\"password\" name=\"password\"></label>\
         <button type=\"submit\">{button}</button></form>"
    )
}

fn change_password_form() -> String {
    "<form method=\"post\" action=\"/changePassword\">\
     <label>Username <input name=\"userName\"></label>\
     <label>Old password <input type=\"password\" name=\"oldPassword\"></label>\
     <label>New password <input type=\"password\" name=\"newPassword\"></label>\
     <button type=\"submit\">Change password</button></form>"
        .to_string()
}

async fn sign_up_page() -> Html<String> {
    page("Sign up", &credentials_form("/signUp", "Sign up"))
}

async fn login_page() -> Html<String> {
    page("Log in", &credentials_form("/login", "Log in"))
}

async fn change_password_page() -> Html<String> {
    page("Change password", &change_password_form())
}

async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Form(form), _): FormBody<CredentialsForm>,
) -> Html<String> {
    let form_html = credentials_form("/signUp", "Sign up");

    if form.user_name.is_empty() || form.password.is_empty() {
        return page(
            "Sign up",
            &format!("{}{form_html}", message("Username and password are required")),
        );
    }

    let user = User::new(form.user_name, form.password);
    match repo::create_user(&state.db, &user).await {
        Ok(()) => {
            tracing::info!(user_name = %user.user_name, "user signed up");
            page(
                "Sign up",
                &format!(
                    "{}<p><a href=\"/login\">Continue to log in</a></p>",
                    message(&format!("Account created for {}", user.user_name))
                ),
            )
        }
        Err(error) => {
            tracing::warn!(user_name = %user.user_name, error = %format!("{error:#}"), "sign up rolled back");
            page(
                "Sign up",
                &format!("{}{form_html}", message("That username is not available")),
            )
        }
    }
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Form(form), _): FormBody<CredentialsForm>,
) -> Result<(CookieJar, Html<String>), AppError> {
    let form_html = credentials_form("/login", "Log in");

    if !repo::verify_credentials(&state.db, &form.user_name, &form.password).await? {
        tracing::info!(user_name = %form.user_name, "login rejected");
        return Ok((
            jar,
            page(
                "Log in",
                &format!("{}{form_html}", message("Incorrect username or password")),
            ),
        ));
    }

    let session = match state.sessions.create(&form.user_name).await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!(user_name = %form.user_name, error = %format!("{error:#}"), "session not stored");
            return Ok((
                jar,
                page(
                    "Log in",
                    &format!("{}{form_html}", message("Please try again")),
                ),
            ));
        }
    };

    tracing::info!(user_name = %session.user_name, "user logged in");
    let body = format!(
        "<p class=\"message\">You are now {LOGGED_IN_MARKER} as {}.</p>\
         <p><a href=\"/viewbooks\">See your books</a></p>",
        escape(&session.user_name)
    );
    let cookie = state.sessions.cookie(&session);
    Ok((jar.add(cookie), page("Log in", &body)))
}

async fn change_password(
    State(state): State<AppState>,
    WithRejection(Form(form), _): FormBody<ChangePasswordForm>,
) -> Html<String> {
    let form_html = change_password_form();

    if form.new_password.is_empty() {
        return page(
            "Change password",
            &format!("{}{form_html}", message("newPassword is required")),
        );
    }

    let changed = repo::change_password(
        &state.db,
        &form.user_name,
        &form.old_password,
        &form.new_password,
    )
    .await;

    match changed {
        Ok(true) => {
            tracing::info!(user_name = %form.user_name, "password changed");
            page("Change password", &message("Password changed"))
        }
        Ok(false) => {
            tracing::info!(user_name = %form.user_name, "password change rejected");
            page(
                "Change password",
                &format!("{}{form_html}", message("Incorrect username or password")),
            )
        }
        Err(error) => {
            tracing::warn!(user_name = %form.user_name, error = %format!("{error:#}"), "password change rolled back");
            page(
                "Change password",
                &format!("{}{form_html}", message("Please try again")),
            )
        }
    }
}

async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    state.sessions.revoke(&user.token).await?;
    tracing::info!(user_name = %user.user_name, "user logged out");
    Ok((
        jar.remove(state.sessions.removal_cookie()),
        page("Log out", &message("You have been signed out")),
    ))
}
