use axum::{extract::State, response::Html, routing::get, Router};
use axum_extra::extract::{Form, WithRejection};

use shelf_authz::CurrentUser;
use shelf_http::error::{AppError, FormBody};

use super::models::{GenreForm, NewGenre};
use super::repo;
use crate::state::AppState;
use crate::utils::{escape, message, page, problems};

/// Confirmation shown after a genre is stored.
pub const GENRE_CREATED_MARKER: &str = "New Genre Created";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/newgenre", get(new_genre_page).post(new_genre))
        .route("/viewgenres", get(view_genres))
        .with_state(state)
}

fn genre_form() -> String {
    "<form method=\"post\" action=\"/newgenre\">\
     <label>Name <input name=\"genreName\"></label>\
     <label>Description <textarea name=\"genreDescription\"></textarea></label>\
     <button type=\"submit\">Add genre</button></form>"
        .to_string()
}

async fn new_genre_page(_user: CurrentUser) -> Html<String> {
    page("New genre", &genre_form())
}

async fn new_genre(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Form(form), _): FormBody<GenreForm>,
) -> Html<String> {
    let genre = match NewGenre::from_form(form) {
        Ok(genre) => genre,
        Err(errors) => {
            return page("New genre", &format!("{}{}", problems(&errors), genre_form()));
        }
    };

    match repo::create_genre(&state.db, &genre).await {
        Ok(id) => {
            tracing::info!(user_name = %user.user_name, genre_id = id, genre_name = %genre.genre_name, "genre created");
            page(
                "New genre",
                &format!(
                    "{}{}",
                    message(&format!("{GENRE_CREATED_MARKER}: {}", genre.genre_name)),
                    genre_form()
                ),
            )
        }
        Err(error) => {
            tracing::warn!(genre_name = %genre.genre_name, error = %format!("{error:#}"), "genre insert rolled back");
            page(
                "New genre",
                &format!("{}{}", message("The genre could not be saved"), genre_form()),
            )
        }
    }
}

async fn view_genres(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Html<String>, AppError> {
    let listing = repo::all_genres_with_books(&state.db).await?;

    if listing.is_empty() {
        return Ok(page(
            "Genres",
            "<p>No genres yet. <a href=\"/newgenre\">Add one</a>.</p>",
        ));
    }

    let mut body = String::from("<dl class=\"genres\">");
    for entry in &listing {
        let books = entry
            .books
            .iter()
            .map(|book| escape(&book.book_name))
            .collect::<Vec<_>>()
            .join(", ");
        body.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd><dd class=\"books\">{}</dd>",
            escape(&entry.genre.genre_name),
            escape(&entry.genre.genre_description),
            books
        ));
    }
    body.push_str("</dl>");

    Ok(page("Genres", &body))
}
