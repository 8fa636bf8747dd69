//! # seed
//!
//! Loads the classic yamdb CSV dump (`static/data/*.csv`) into the store.
//! Without a database URL the dump is loaded into memory and only checked.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use domains::{CatalogRepo, ReviewRepo, UserRepo};
use serde::de::DeserializeOwned;
use services::{ImportBundle, ImportReport, ImportService};
use storage_adapters::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Import the yamdb CSV dump")]
struct Args {
    /// Directory holding users.csv, category.csv, genre.csv, ...
    #[arg(long, default_value = "static/data")]
    data_dir: PathBuf,

    /// Postgres URL; omit for a dry run against an in-memory store.
    #[arg(long, env = "YAMDB__DATABASE__URL")]
    database_url: Option<String>,
}

/// Rows that could not be decoded, per file.
#[derive(Debug, Default)]
struct ParseIssues(Vec<String>);

fn parse_rows<T: DeserializeOwned, R: Read>(
    source: &str,
    reader: R,
    issues: &mut ParseIssues,
) -> Vec<T> {
    let mut rows = Vec::new();
    let mut reader = csv::Reader::from_reader(reader);
    for (i, record) in reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => issues.0.push(format!("{source} row {}: {e}", i + 1)),
        }
    }
    rows
}

fn read_file<T: DeserializeOwned>(dir: &Path, file: &str, issues: &mut ParseIssues) -> Vec<T> {
    let path = dir.join(file);
    match File::open(&path) {
        Ok(handle) => parse_rows(file, handle, issues),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "file skipped");
            Vec::new()
        }
    }
}

fn read_bundle(dir: &Path, issues: &mut ParseIssues) -> ImportBundle {
    ImportBundle {
        users: read_file(dir, "users.csv", issues),
        categories: read_file(dir, "category.csv", issues),
        genres: read_file(dir, "genre.csv", issues),
        titles: read_file(dir, "titles.csv", issues),
        genre_titles: read_file(dir, "genre_title.csv", issues),
        reviews: read_file(dir, "review.csv", issues),
        comments: read_file(dir, "comments.csv", issues),
    }
}

type Ports = (Arc<dyn UserRepo>, Arc<dyn CatalogRepo>, Arc<dyn ReviewRepo>);

#[cfg(feature = "db-postgres")]
async fn open_store(url: Option<&str>) -> anyhow::Result<Ports> {
    if let Some(url) = url {
        let store = storage_adapters::PgStore::connect(url, 2)
            .await
            .context("failed to connect to postgres")?;
        store.migrate().await?;
        let store = Arc::new(store);
        return Ok((store.clone(), store.clone(), store));
    }
    Ok(memory_store())
}

#[cfg(not(feature = "db-postgres"))]
async fn open_store(url: Option<&str>) -> anyhow::Result<Ports> {
    if url.is_some() {
        anyhow::bail!("built without the db-postgres feature");
    }
    Ok(memory_store())
}

fn memory_store() -> Ports {
    tracing::info!("dry run: importing into memory");
    let store = Arc::new(MemoryStore::new());
    (store.clone(), store.clone(), store)
}

fn print_report(report: &ImportReport, parse: &ParseIssues) {
    for (source, count) in &report.counts {
        println!("{source:<12} inserted {:>6}  skipped {:>6}", count.inserted, count.skipped);
    }
    for line in &parse.0 {
        println!("unreadable: {line}");
    }
    for issue in &report.issues {
        println!("skipped: {} row {}: {}", issue.source, issue.row, issue.reason);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut parse_issues = ParseIssues::default();
    let bundle = read_bundle(&args.data_dir, &mut parse_issues);
    let (users, catalog, reviews) = open_store(args.database_url.as_deref()).await?;

    let report = ImportService::new(users, catalog, reviews).import(bundle).await;
    print_report(&report, &parse_issues);

    if report.is_clean() && parse_issues.0.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
