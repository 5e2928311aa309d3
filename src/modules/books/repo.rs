//! Queries against `books` and the book side of `book_genres`.

use anyhow::Context;
use sqlx::SqlitePool;

use super::models::{Book, BookWithGenres, NewBook};
use crate::modules::genres::models::Genre;

/// Insert a book and attach its genres, all or nothing. Returns the book id.
///
/// An unknown genre id fails the foreign key check and rolls the whole
/// insert back.
pub async fn create_book(pool: &SqlitePool, book: &NewBook) -> anyhow::Result<i64> {
    let mut tx = pool.begin().await.context("failed to open transaction")?;

    let book_id = sqlx::query(
        r#"
        INSERT INTO books (book_name, book_rating, book_notes, date_finished, book_reader)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.book_name)
    .bind(book.book_rating)
    .bind(&book.book_notes)
    .bind(book.date_finished)
    .bind(&book.book_reader)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("failed to insert book '{}'", book.book_name))?
    .last_insert_rowid();

    for genre_id in &book.genre_ids {
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to tag book {book_id} with genre {genre_id}"))?;
    }

    tx.commit().await.context("failed to commit book")?;
    Ok(book_id)
}

/// Append `genre_id` to the end of a book's genre list.
pub async fn attach_genre(pool: &SqlitePool, book_id: i64, genre_id: i64) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
        .bind(book_id)
        .bind(genre_id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to tag book {book_id} with genre {genre_id}"))?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct BookGenre {
    book_id: i64,
    #[sqlx(flatten)]
    genre: Genre,
}

/// Books read by `reader` in creation order, each with its genres in the
/// order they were attached.
pub async fn books_by_reader(
    pool: &SqlitePool,
    reader: &str,
) -> anyhow::Result<Vec<BookWithGenres>> {
    let books: Vec<Book> = sqlx::query_as(
        r#"
        SELECT id, book_name, book_rating, book_notes, date_finished, book_reader
        FROM books
        WHERE book_reader = ?
        ORDER BY id
        "#,
    )
    .bind(reader)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list books for '{reader}'"))?;

    let tags: Vec<BookGenre> = sqlx::query_as(
        r#"
        SELECT bg.book_id, g.id, g.genre_name, g.genre_description
        FROM book_genres bg
        JOIN genres g ON g.id = bg.genre_id
        JOIN books b ON b.id = bg.book_id
        WHERE b.book_reader = ?
        ORDER BY bg.id
        "#,
    )
    .bind(reader)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list genres for '{reader}'"))?;

    let mut listing: Vec<BookWithGenres> = books
        .into_iter()
        .map(|book| BookWithGenres {
            book,
            genres: Vec::new(),
        })
        .collect();

    for BookGenre { book_id, genre } in tags {
        if let Some(entry) = listing.iter_mut().find(|entry| entry.book.id == book_id) {
            entry.genres.push(genre);
        }
    }

    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::{models::User, repo as users};
    use crate::modules::genres::{models::NewGenre, repo as genres};
    use crate::test_support::migrated_pool;

    fn new_book(name: &str, notes: &str, reader: &str, genre_ids: Vec<i64>) -> NewBook {
        NewBook {
            book_name: name.to_string(),
            book_rating: 103,
            book_notes: notes.to_string(),
            date_finished: None,
            book_reader: reader.to_string(),
            genre_ids,
        }
    }

    fn listed<T: std::fmt::Display>(items: &[T]) -> String {
        let shown: Vec<String> = items.iter().map(ToString::to_string).collect();
        format!("[{}]", shown.join(", "))
    }

    #[tokio::test]
    async fn books_and_genres_keep_insertion_and_attachment_order() {
        let pool = migrated_pool().await;
        users::create_user(&pool, &User::new("testUser3", "123"))
            .await
            .unwrap();
        let genre1 = genres::create_genre(&pool, &NewGenre::new("genre1", "no1"))
            .await
            .unwrap();
        let genre2 = genres::create_genre(&pool, &NewGenre::new("genre2", "no2"))
            .await
            .unwrap();

        create_book(
            &pool,
            &new_book("testBook01", "it was not very good", "testUser3", vec![genre1, genre2]),
        )
        .await
        .unwrap();
        create_book(
            &pool,
            &new_book("testBook02", "it was very good", "testUser3", vec![genre2]),
        )
        .await
        .unwrap();

        let books = books_by_reader(&pool, "testUser3").await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].book.book_name, "testBook01");
        assert_eq!(books[0].book.book_rating, 103);
        assert_eq!(listed(&books[0].genres), "[<Genre genre1>, <Genre genre2>]");
        assert_eq!(books[1].book.book_name, "testBook02");
        assert_eq!(books[1].book.book_notes, "it was very good");
        assert_eq!(listed(&books[1].genres), "[<Genre genre2>]");

        let by_genre = genres::all_genres_with_books(&pool).await.unwrap();
        assert_eq!(by_genre.len(), 2);
        assert_eq!(by_genre[0].genre.genre_name, "genre1");
        assert_eq!(by_genre[0].genre.genre_description, "no1");
        assert_eq!(listed(&by_genre[0].books), "[<Book testBook01>]");
        assert_eq!(by_genre[1].genre.genre_name, "genre2");
        assert_eq!(by_genre[1].genre.genre_description, "no2");
        assert_eq!(
            listed(&by_genre[1].books),
            "[<Book testBook01>, <Book testBook02>]"
        );
    }

    #[tokio::test]
    async fn attach_genre_appends_to_the_end() {
        let pool = migrated_pool().await;
        let genre1 = genres::create_genre(&pool, &NewGenre::new("genre1", ""))
            .await
            .unwrap();
        let genre2 = genres::create_genre(&pool, &NewGenre::new("genre2", ""))
            .await
            .unwrap();
        let book_id = create_book(&pool, &new_book("b", "n", "reader", vec![genre2]))
            .await
            .unwrap();

        attach_genre(&pool, book_id, genre1).await.unwrap();

        let books = books_by_reader(&pool, "reader").await.unwrap();
        assert_eq!(listed(&books[0].genres), "[<Genre genre2>, <Genre genre1>]");
    }

    #[tokio::test]
    async fn unknown_genre_rolls_the_book_back() {
        let pool = migrated_pool().await;
        let genre1 = genres::create_genre(&pool, &NewGenre::new("genre1", ""))
            .await
            .unwrap();

        let result = create_book(&pool, &new_book("b", "n", "reader", vec![genre1, 999])).await;
        assert!(result.is_err());
        assert!(books_by_reader(&pool, "reader").await.unwrap().is_empty());

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_genres")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn schema_rejects_empty_notes() {
        let pool = migrated_pool().await;

        let result = create_book(&pool, &new_book("b", "", "reader", vec![])).await;
        assert!(result.is_err());
        assert!(books_by_reader(&pool, "reader").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn readers_only_see_their_own_books() {
        let pool = migrated_pool().await;
        create_book(&pool, &new_book("mine", "n", "alice", vec![]))
            .await
            .unwrap();
        create_book(&pool, &new_book("theirs", "n", "bob", vec![]))
            .await
            .unwrap();

        let books = books_by_reader(&pool, "alice").await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].book.book_name, "mine");
    }
}
