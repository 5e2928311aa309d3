use axum::{extract::State, response::Html, routing::get, Router};
use axum_extra::extract::{Form, WithRejection};

use shelf_authz::CurrentUser;
use shelf_http::error::{AppError, FormBody};

use crate::modules::books::models::{BookForm, NewBook};
use crate::modules::books::repo;
use crate::modules::genres::{models::Genre, repo as genres};
use crate::state::AppState;
use crate::utils::{escape, message, page, problems};

/// Confirmation shown after a book is stored.
pub const BOOK_CREATED_MARKER: &str = "New Book Created";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/newbook", get(new_book_page).post(new_book))
        .route("/viewbooks", get(view_books))
        .with_state(state)
}

fn book_form(genres: &[Genre]) -> String {
    let choices: String = genres
        .iter()
        .map(|genre| {
            format!(
                "<label><input type=\"checkbox\" name=\"genres\" value=\"{}\"> {}</label>",
                genre.id,
                escape(&genre.genre_name)
            )
        })
        .collect();

    format!(
        "<form method=\"post\" action=\"/newbook\">\
         <label>Title <input name=\"bookName\"></label>\
         <label>Rating <input type=\"number\" name=\"bookRating\"></label>\
         <label>Notes <textarea name=\"bookNotes\"></textarea></label>\
         <label>Finished <input type=\"date\" name=\"dateFinished\"></label>\
         <fieldset><legend>Genres</legend>{choices}</fieldset>\
         <button type=\"submit\">Add book</button></form>"
    )
}

async fn new_book_page(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Html<String>, AppError> {
    let genres = genres::all_genres(&state.db).await?;
    Ok(page("New book", &book_form(&genres)))
}

async fn new_book(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Form(form), _): FormBody<BookForm>,
) -> Result<Html<String>, AppError> {
    let outcome = match NewBook::from_form(form, &user.user_name) {
        Ok(book) => match repo::create_book(&state.db, &book).await {
            Ok(book_id) => {
                tracing::info!(
                    user_name = %user.user_name,
                    book_id,
                    genres = book.genre_ids.len(),
                    "book created"
                );
                message(&format!("{BOOK_CREATED_MARKER}: {}", book.book_name))
            }
            Err(error) => {
                tracing::warn!(
                    user_name = %user.user_name,
                    error = %format!("{error:#}"),
                    "book insert rolled back"
                );
                message("The book could not be saved")
            }
        },
        Err(errors) => problems(&errors),
    };

    let genres = genres::all_genres(&state.db).await?;
    Ok(page("New book", &format!("{outcome}{}", book_form(&genres))))
}

async fn view_books(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Html<String>, AppError> {
    let books = repo::books_by_reader(&state.db, &user.user_name).await?;

    if books.is_empty() {
        return Ok(page(
            "My books",
            "<p>No books yet. <a href=\"/newbook\">Add one</a>.</p>",
        ));
    }

    let mut body = String::from(
        "<table class=\"books\"><tr><th>Title</th><th>Rating</th><th>Notes</th>\
         <th>Finished</th><th>Genres</th></tr>",
    );
    for entry in &books {
        let genres = entry
            .genres
            .iter()
            .map(|genre| escape(&genre.genre_name))
            .collect::<Vec<_>>()
            .join(", ");
        let finished = entry
            .book
            .date_finished
            .map(|date| date.to_string())
            .unwrap_or_default();
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&entry.book.book_name),
            entry.book.book_rating,
            escape(&entry.book.book_notes),
            finished,
            genres
        ));
    }
    body.push_str("</table>");

    Ok(page("My books", &body))
}
