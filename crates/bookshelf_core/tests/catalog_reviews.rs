use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::model::review::now_epoch_ms;
use bookshelf_core::model::validation::{FIELD_COMMENT, FIELD_RATING};
use bookshelf_core::{
    BookDraft, BookPatch, BookRepository, CatalogService, RepoError, ReviewDraft, ReviewPatch,
    ReviewRepository, SqliteCatalogRepository,
};
use rusqlite::Connection;

fn review_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM reviews;", [], |row| row.get(0))
        .unwrap()
}

fn set_created_at(conn: &Connection, review_id: i64, created_at: i64) {
    conn.execute(
        "UPDATE reviews SET created_at = ?2 WHERE id = ?1;",
        rusqlite::params![review_id, created_at],
    )
    .unwrap();
}

#[test]
fn create_review_attaches_to_book() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();

    let review = repo
        .create_review(book.id(), &ReviewDraft::new(5, "Spice must flow"))
        .unwrap();
    assert_eq!(review.book_id(), Some(book.id()));
    assert_eq!(review.rating(), 5);
    assert!(review.created_at() > 0);

    let loaded = repo.get_review(review.id()).unwrap();
    assert_eq!(loaded, review);
    let detail = repo.get_book(book.id()).unwrap();
    assert_eq!(detail.book.reviews(), &[review.id()]);
}

#[test]
fn out_of_range_ratings_are_rejected_and_not_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();

    for rating in [0, 6] {
        let err = repo
            .create_review(book.id(), &ReviewDraft::new(rating, "out of range"))
            .unwrap_err();
        match err {
            RepoError::Validation(errors) => {
                assert_eq!(
                    errors.get(FIELD_RATING),
                    Some("rating must be between 1 and 5")
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    for rating in [1, 5] {
        repo.create_review(book.id(), &ReviewDraft::new(rating, "edge"))
            .unwrap();
    }
    assert_eq!(review_count(&conn), 2);
}

#[test]
fn blank_comment_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();

    let err = repo
        .create_review(book.id(), &ReviewDraft::new(3, "  "))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref errors) if errors.contains(FIELD_COMMENT)));
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn review_for_missing_book_is_not_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let err = repo
        .create_review(404, &ReviewDraft::new(3, "nobody home"))
        .unwrap_err();
    assert!(matches!(err, RepoError::BookNotFound(404)));
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn detail_orders_reviews_most_recent_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Emma", "Jane Austen", 1815))
        .unwrap();

    let a = repo
        .create_review(book.id(), &ReviewDraft::new(3, "A"))
        .unwrap();
    let b = repo
        .create_review(book.id(), &ReviewDraft::new(4, "B"))
        .unwrap();
    let c = repo
        .create_review(book.id(), &ReviewDraft::new(5, "C"))
        .unwrap();
    set_created_at(&conn, a.id(), 1_000);
    set_created_at(&conn, b.id(), 2_000);
    set_created_at(&conn, c.id(), 3_000);

    let detail = repo.get_book(book.id()).unwrap();
    let comments: Vec<&str> = detail.reviews.iter().map(|review| review.comment()).collect();
    assert_eq!(comments, ["C", "B", "A"]);
    assert_eq!(detail.book.reviews(), &[c.id(), b.id(), a.id()]);

    let listed = repo.list_reviews(book.id()).unwrap();
    assert_eq!(listed, detail.reviews);
}

#[test]
fn equal_timestamps_keep_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Emma", "Jane Austen", 1815))
        .unwrap();

    let first = repo
        .create_review(book.id(), &ReviewDraft::new(3, "first"))
        .unwrap();
    let second = repo
        .create_review(book.id(), &ReviewDraft::new(4, "second"))
        .unwrap();
    set_created_at(&conn, first.id(), 5_000);
    set_created_at(&conn, second.id(), 5_000);

    let ids: Vec<i64> = repo
        .list_reviews(book.id())
        .unwrap()
        .iter()
        .map(|review| review.id())
        .collect();
    assert_eq!(ids, [first.id(), second.id()]);
}

#[test]
fn update_review_keeps_book_and_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();
    let review = repo
        .create_review(book.id(), &ReviewDraft::new(2, "meh"))
        .unwrap();

    let updated = repo
        .update_review(
            review.id(),
            &ReviewPatch {
                rating: Some(4),
                comment: None,
            },
        )
        .unwrap();
    assert_eq!(updated.rating(), 4);
    assert_eq!(updated.comment(), "meh");
    assert_eq!(updated.book_id(), Some(book.id()));
    assert_eq!(updated.created_at(), review.created_at());

    let err = repo
        .update_review(
            review.id(),
            &ReviewPatch {
                rating: Some(7),
                comment: Some("changed".to_string()),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    let stored = repo.get_review(review.id()).unwrap();
    assert_eq!(stored.rating(), 4);
    assert_eq!(stored.comment(), "meh");
}

#[test]
fn delete_review_detaches_it_from_book() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();
    let kept = repo
        .create_review(book.id(), &ReviewDraft::new(5, "keep"))
        .unwrap();
    let dropped = repo
        .create_review(book.id(), &ReviewDraft::new(1, "drop"))
        .unwrap();

    repo.delete_review(dropped.id()).unwrap();

    assert!(matches!(
        repo.get_review(dropped.id()),
        Err(RepoError::ReviewNotFound(_))
    ));
    let detail = repo.get_book(book.id()).unwrap();
    assert_eq!(detail.book.reviews(), &[kept.id()]);
    assert_eq!(detail.average_rating, Some(5.0));
    assert!(matches!(
        repo.delete_review(dropped.id()),
        Err(RepoError::ReviewNotFound(_))
    ));
}

#[test]
fn deleting_book_cascades_to_its_reviews_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let doomed = repo
        .create_book(&BookDraft::new("Doomed", "Author", 2000))
        .unwrap();
    let survivor = repo
        .create_book(&BookDraft::new("Survivor", "Author", 2001))
        .unwrap();
    let doomed_reviews = [
        repo.create_review(doomed.id(), &ReviewDraft::new(2, "gone soon"))
            .unwrap(),
        repo.create_review(doomed.id(), &ReviewDraft::new(3, "also gone"))
            .unwrap(),
    ];
    let survivor_review = repo
        .create_review(survivor.id(), &ReviewDraft::new(4, "stays"))
        .unwrap();

    repo.delete_book(doomed.id()).unwrap();

    for review in &doomed_reviews {
        assert!(matches!(
            repo.get_review(review.id()),
            Err(RepoError::ReviewNotFound(id)) if id == review.id()
        ));
    }
    assert_eq!(review_count(&conn), 1);
    assert_eq!(repo.get_review(survivor_review.id()).unwrap(), survivor_review);
    assert!(matches!(
        repo.list_reviews(doomed.id()),
        Err(RepoError::BookNotFound(_))
    ));
}

#[test]
fn catalog_walkthrough_reports_half_star_average() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());

    let book = service
        .create_book(&BookDraft::new("Refactoring", "Martin Fowler", 1999))
        .unwrap();
    let first = service
        .create_review(book.id(), &ReviewDraft::new(4, "Solid"))
        .unwrap();
    service
        .create_review(book.id(), &ReviewDraft::new(3, "Dated"))
        .unwrap();

    let detail = service.get_book(book.id()).unwrap();
    assert_eq!(detail.review_count(), 2);
    assert_eq!(detail.average_rating, Some(3.5));

    let rejected = service.create_review(book.id(), &ReviewDraft::new(6, "Too good"));
    assert!(matches!(rejected, Err(RepoError::Validation(_))));

    service.delete_book(book.id()).unwrap();
    assert!(matches!(
        service.get_review(first.id()),
        Err(RepoError::ReviewNotFound(_))
    ));
    assert!(service.list_books().unwrap().is_empty());
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteCatalogRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn repository_rejects_missing_column() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "DROP TABLE reviews;
         CREATE TABLE reviews (id INTEGER PRIMARY KEY, book_id INTEGER, rating INTEGER);",
    )
    .unwrap();

    let err = SqliteCatalogRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "reviews",
            column: "comment",
        }
    ));
}

#[test]
fn stored_rating_out_of_range_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();
    let review = repo
        .create_review(book.id(), &ReviewDraft::new(3, "fine"))
        .unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute("UPDATE reviews SET rating = 9 WHERE id = ?1;", [review.id()])
        .unwrap();

    assert!(matches!(
        repo.get_review(review.id()),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn write_timestamps_use_millisecond_clock() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let book = repo
        .create_book(&BookDraft::new("Dune", "Frank Herbert", 1965))
        .unwrap();
    let review = repo
        .create_review(book.id(), &ReviewDraft::new(3, "fine"))
        .unwrap();

    let (created_at, updated_at) = review_timestamps(&conn, review.id());
    assert_eq!(created_at, review.created_at());
    assert_eq!(updated_at, created_at);

    let before_update = now_epoch_ms();
    repo.update_review(
        review.id(),
        &ReviewPatch {
            rating: Some(4),
            comment: None,
        },
    )
    .unwrap();
    let (created_after, updated_after) = review_timestamps(&conn, review.id());
    assert_eq!(created_after, created_at);
    assert!(updated_after >= before_update);

    let before_book_update = now_epoch_ms();
    repo.update_book(
        book.id(),
        &BookPatch {
            title: Some("Dune Messiah".to_string()),
            ..BookPatch::default()
        },
    )
    .unwrap();
    let book_updated_at: i64 = conn
        .query_row(
            "SELECT updated_at FROM books WHERE id = ?1;",
            [book.id()],
            |row| row.get(0),
        )
        .unwrap();
    assert!(book_updated_at >= before_book_update);
}

fn review_timestamps(conn: &Connection, review_id: i64) -> (i64, i64) {
    conn.query_row(
        "SELECT created_at, updated_at FROM reviews WHERE id = ?1;",
        [review_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap()
}
