//! CSV ingestion of service transactions using Polars, plus a dataset summary

use std::collections::HashSet;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::basket::TransactionRecord;
use crate::error::RecommendError;

pub const USER_COLUMN: &str = "UserId";
pub const SERVICE_COLUMN: &str = "ServiceId";
pub const CATEGORY_COLUMN: &str = "CategoryId";
pub const DATE_COLUMN: &str = "CreateDate";

/// Load transaction records from a CSV file with a header row.
///
/// Expected columns: `UserId`, `ServiceId`, `CategoryId`, `CreateDate`.
/// Extra columns are ignored. A null cell or an unparseable date fails the
/// whole load with an invalid-record error naming the row.
pub fn load_transactions(file_path: &str) -> crate::Result<Vec<TransactionRecord>> {
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.into()))
        .with_context(|| format!("failed to open transaction file {}", file_path))?
        .finish()
        .with_context(|| format!("failed to parse transaction file {}", file_path))?;

    // Ids may be inferred as integers; normalise everything to strings.
    let df = raw
        .lazy()
        .select([
            col(USER_COLUMN).cast(DataType::String),
            col(SERVICE_COLUMN).cast(DataType::String),
            col(CATEGORY_COLUMN).cast(DataType::String),
            col(DATE_COLUMN).cast(DataType::String),
        ])
        .collect()
        .context("transaction file is missing required columns")?;

    debug!(rows = df.height(), path = file_path, "read transaction csv");

    let users = df.column(USER_COLUMN)?.str()?;
    let services = df.column(SERVICE_COLUMN)?.str()?;
    let categories = df.column(CATEGORY_COLUMN)?.str()?;
    let dates = df.column(DATE_COLUMN)?.str()?;

    let mut records = Vec::with_capacity(df.height());
    let rows = users
        .into_iter()
        .zip(services)
        .zip(categories)
        .zip(dates)
        .enumerate();

    for (row, (((user, service), category), date)) in rows {
        let field = |value: Option<&str>, name: &str| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| RecommendError::invalid_record(row, format!("missing {}", name)))
        };

        let user_id = field(user, USER_COLUMN)?;
        let item_id = field(service, SERVICE_COLUMN)?;
        let category_id = field(category, CATEGORY_COLUMN)?;
        let raw_date = field(date, DATE_COLUMN)?;
        let timestamp = parse_timestamp(&raw_date).ok_or_else(|| {
            RecommendError::invalid_record(row, format!("unparseable {} `{}`", DATE_COLUMN, raw_date))
        })?;

        records.push(TransactionRecord {
            user_id,
            item_id,
            category_id,
            timestamp,
        });
    }

    info!(records = records.len(), path = file_path, "transactions loaded");
    Ok(records)
}

/// Parse the date formats seen in transaction exports
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Descriptive overview of a transaction dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub users: usize,
    pub services: usize,
    pub categories: usize,
    pub item_categories: usize,
    pub first_date: Option<NaiveDateTime>,
    pub last_date: Option<NaiveDateTime>,
}

impl DatasetSummary {
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let users: HashSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
        let services: HashSet<&str> = records.iter().map(|r| r.item_id.as_str()).collect();
        let categories: HashSet<&str> = records.iter().map(|r| r.category_id.as_str()).collect();
        let item_categories: HashSet<String> = records.iter().map(TransactionRecord::item_category).collect();

        Self {
            records: records.len(),
            users: users.len(),
            services: services.len(),
            categories: categories.len(),
            item_categories: item_categories.len(),
            first_date: records.iter().map(|r| r.timestamp).min(),
            last_date: records.iter().map(|r| r.timestamp).max(),
        }
    }
}
