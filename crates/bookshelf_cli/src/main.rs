//! Bookshelf command-line entry point.
//!
//! # Responsibility
//! - Probe core linkage (`ping`, `version`).
//! - Seed and inspect a catalog database resolved from the environment.

mod seed;

use bookshelf_api::api;
use bookshelf_api::ApiResponse;
use bookshelf_core::db::{open_db, DbError};
use bookshelf_core::{
    core_version, init_logging, ping, CatalogConfig, CatalogService, RepoError,
    SqliteCatalogRepository,
};
use log::info;
use seed::seed_demo_catalog;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

const USAGE: &str = "usage: bookshelf_cli <ping|version|seed|list|show <book-id>>";

#[derive(Debug)]
enum CliError {
    Usage(String),
    Db(DbError),
    Repo(RepoError),
    Json(serde_json::Error),
    /// An endpoint answered with a non-success status.
    Response(ApiResponse),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "{message}\n{USAGE}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "failed to render JSON: {err}"),
            Self::Response(response) => {
                write!(f, "request failed with status {}: {}", response.status, response.body)
            }
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Usage(_) | Self::Response(_) => None,
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

fn main() -> ExitCode {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("ignoring .env file: {err}");
        }
    }

    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ CliError::Usage(_)) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CatalogConfig, args: &[String]) -> Result<(), CliError> {
    let command = args
        .first()
        .ok_or_else(|| CliError::Usage("missing command".to_string()))?;

    match command.as_str() {
        "ping" => println!("bookshelf_core ping={}", ping()),
        "version" => println!("bookshelf_core version={}", core_version()),
        "seed" => {
            let conn = open_db(&config.db_path)?;
            let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn)?);
            let summary = seed_demo_catalog(&service)?;
            info!(
                "event=catalog_seed module=cli status=ok books={} reviews={}",
                summary.books, summary.reviews
            );
            println!(
                "seeded {} books and {} reviews into {}",
                summary.books,
                summary.reviews,
                config.db_path.display()
            );
        }
        "list" => {
            let conn = open_db(&config.db_path)?;
            print_response(api::list_books(&conn))?;
        }
        "show" => {
            let raw_id = args
                .get(1)
                .ok_or_else(|| CliError::Usage("show requires a book id".to_string()))?;
            let id = raw_id
                .parse::<i64>()
                .map_err(|_| CliError::Usage(format!("invalid book id `{raw_id}`")))?;
            let conn = open_db(&config.db_path)?;
            print_response(api::get_book(&conn, id))?;
        }
        other => return Err(CliError::Usage(format!("unknown command `{other}`"))),
    }
    Ok(())
}

fn print_response(response: ApiResponse) -> Result<(), CliError> {
    if !response.is_success() {
        return Err(CliError::Response(response));
    }
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}
