use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::books::models::Book;
use crate::validation::{self, FieldError};

/// A genre books can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub genre_name: String,
    pub genre_description: String,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Genre {}>", self.genre_name)
    }
}

/// A genre together with the books tagged with it, in tagging order.
#[derive(Debug, Clone, Serialize)]
pub struct GenreWithBooks {
    pub genre: Genre,
    pub books: Vec<Book>,
}

/// Body of `POST /newgenre`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenreForm {
    pub genre_name: String,
    pub genre_description: String,
}

/// A validated genre ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGenre {
    pub genre_name: String,
    pub genre_description: String,
}

impl NewGenre {
    pub fn new(genre_name: impl Into<String>, genre_description: impl Into<String>) -> Self {
        Self {
            genre_name: genre_name.into(),
            genre_description: genre_description.into(),
        }
    }

    pub fn from_form(form: GenreForm) -> Result<Self, Vec<FieldError>> {
        let genre_name = validation::required("genreName", &form.genre_name).map_err(|e| vec![e])?;
        Ok(Self {
            genre_name,
            genre_description: form.genre_description,
        })
    }
}
