//! Queries against the `genres` table and the genre side of `book_genres`.

use anyhow::Context;
use sqlx::SqlitePool;

use super::models::{Genre, GenreWithBooks, NewGenre};
use crate::modules::books::models::Book;

/// Insert a genre and return its id.
pub async fn create_genre(pool: &SqlitePool, genre: &NewGenre) -> anyhow::Result<i64> {
    let result =
        sqlx::query("INSERT INTO genres (genre_name, genre_description) VALUES (?, ?)")
            .bind(&genre.genre_name)
            .bind(&genre.genre_description)
            .execute(pool)
            .await
            .with_context(|| format!("failed to insert genre '{}'", genre.genre_name))?;
    Ok(result.last_insert_rowid())
}

/// First genre (by creation) with this exact name.
pub async fn find_by_name(pool: &SqlitePool, genre_name: &str) -> anyhow::Result<Option<Genre>> {
    sqlx::query_as::<_, Genre>(
        "SELECT id, genre_name, genre_description FROM genres WHERE genre_name = ? ORDER BY id LIMIT 1",
    )
    .bind(genre_name)
    .fetch_optional(pool)
    .await
    .context("failed to look up genre")
}

/// Every genre, in creation order.
pub async fn all_genres(pool: &SqlitePool) -> anyhow::Result<Vec<Genre>> {
    sqlx::query_as::<_, Genre>("SELECT id, genre_name, genre_description FROM genres ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to list genres")
}

#[derive(sqlx::FromRow)]
struct TaggedBook {
    genre_id: i64,
    #[sqlx(flatten)]
    book: Book,
}

/// Every genre in creation order, each with the books tagged with it in
/// tagging order.
pub async fn all_genres_with_books(pool: &SqlitePool) -> anyhow::Result<Vec<GenreWithBooks>> {
    let genres = all_genres(pool).await?;

    let tagged: Vec<TaggedBook> = sqlx::query_as(
        r#"
        SELECT bg.genre_id,
               b.id, b.book_name, b.book_rating, b.book_notes, b.date_finished, b.book_reader
        FROM book_genres bg
        JOIN books b ON b.id = bg.book_id
        ORDER BY bg.id
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to list tagged books")?;

    let mut listing: Vec<GenreWithBooks> = genres
        .into_iter()
        .map(|genre| GenreWithBooks {
            genre,
            books: Vec::new(),
        })
        .collect();

    for TaggedBook { genre_id, book } in tagged {
        if let Some(entry) = listing.iter_mut().find(|entry| entry.genre.id == genre_id) {
            entry.books.push(book);
        }
    }

    Ok(listing)
}
