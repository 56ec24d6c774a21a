//! Demo catalog used by the `seed` command.

use bookshelf_core::{
    BookDraft, BookRepository, CatalogService, RepoResult, ReviewDraft, ReviewRepository,
};

struct DemoBook {
    title: &'static str,
    author: &'static str,
    published_year: i64,
    reviews: &'static [(i64, &'static str)],
}

const DEMO_BOOKS: &[DemoBook] = &[
    DemoBook {
        title: "The Art of Computer Programming",
        author: "Donald Knuth",
        published_year: 1968,
        reviews: &[
            (5, "Foundational reading for any programmer. Very thorough."),
            (4, "Excellent material, though dense for beginners."),
            (5, "The bible of programming. Essential."),
        ],
    },
    DemoBook {
        title: "Clean Code",
        author: "Robert C. Martin",
        published_year: 2008,
        reviews: &[
            (4, "Changed the way I write code. Highly recommended."),
            (3, "Good principles, although some examples are repetitive."),
        ],
    },
    DemoBook {
        title: "Refactoring",
        author: "Martin Fowler",
        published_year: 1999,
        reviews: &[(5, "Essential techniques for improving existing code.")],
    },
];

/// Counts of rows written by [`seed_demo_catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub books: usize,
    pub reviews: usize,
}

/// Stores the demo books and their reviews.
///
/// Not idempotent: every call adds another copy of the catalog.
pub fn seed_demo_catalog<R>(service: &CatalogService<R>) -> RepoResult<SeedSummary>
where
    R: BookRepository + ReviewRepository,
{
    let mut summary = SeedSummary {
        books: 0,
        reviews: 0,
    };
    for demo in DEMO_BOOKS {
        let book = service.create_book(&BookDraft::new(
            demo.title,
            demo.author,
            demo.published_year,
        ))?;
        summary.books += 1;
        for &(rating, comment) in demo.reviews {
            service.create_review(book.id(), &ReviewDraft::new(rating, comment))?;
            summary.reviews += 1;
        }
    }
    Ok(summary)
}
