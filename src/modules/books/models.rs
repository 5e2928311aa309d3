use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::modules::genres::models::Genre;
use crate::validation::{self, FieldError};

/// A book someone has finished reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub book_name: String,
    pub book_rating: i64,
    pub book_notes: String,
    pub date_finished: Option<Date>,
    /// Name of the user who read it
    pub book_reader: String,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Book {}>", self.book_name)
    }
}

/// A book together with its genres, in the order they were attached.
#[derive(Debug, Clone, Serialize)]
pub struct BookWithGenres {
    pub book: Book,
    pub genres: Vec<Genre>,
}

/// Body of `POST /newbook`. `genres` repeats once per ticked genre id.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookForm {
    pub book_name: String,
    pub book_rating: String,
    pub book_notes: String,
    pub date_finished: String,
    pub genres: Vec<String>,
}

/// A validated book ready to insert, with the genres to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub book_name: String,
    pub book_rating: i64,
    pub book_notes: String,
    pub date_finished: Option<Date>,
    pub book_reader: String,
    pub genre_ids: Vec<i64>,
}

impl NewBook {
    /// Validate `form` for `reader`, collecting every problem at once.
    pub fn from_form(form: BookForm, reader: &str) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let book_name = validation::required("bookName", &form.book_name)
            .map_err(|e| errors.push(e))
            .ok();
        let book_rating = validation::integer("bookRating", &form.book_rating)
            .map_err(|e| errors.push(e))
            .ok();
        let book_notes = validation::required("bookNotes", &form.book_notes)
            .map_err(|e| errors.push(e))
            .ok();
        let date_finished = validation::optional_date("dateFinished", &form.date_finished)
            .map_err(|e| errors.push(e))
            .ok();
        let genre_ids: Vec<i64> = form
            .genres
            .iter()
            .filter_map(|raw| {
                validation::integer("genres", raw)
                    .map_err(|e| errors.push(e))
                    .ok()
            })
            .collect();

        match (book_name, book_rating, book_notes, date_finished) {
            (Some(book_name), Some(book_rating), Some(book_notes), Some(date_finished))
                if errors.is_empty() =>
            {
                Ok(Self {
                    book_name,
                    book_rating,
                    book_notes,
                    date_finished,
                    book_reader: reader.to_string(),
                    genre_ids,
                })
            }
            _ => Err(errors),
        }
    }
}
