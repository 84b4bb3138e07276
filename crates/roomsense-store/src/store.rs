//! Main store implementation.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use rusqlite::Connection;
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::{debug, info};

use roomsense_types::RawReading;

use crate::error::{Error, Result};
use crate::models::{HistoryRecord, HourlyStats};
use crate::queries::HistoryQuery;
use crate::schema;

/// Default cap on stored records.
pub const DEFAULT_MAX_RECORDS: usize = 1000;

/// Column headers of the CSV export.
pub const CSV_HEADERS: [&str; 7] = [
    "Timestamp",
    "Temp (°C)",
    "Humidity (%)",
    "MQ135",
    "Light",
    "Sound",
    "MQ2",
];

/// SQLite-based store for RoomSense history.
///
/// The store is capped: after every append, records beyond
/// [`max_records`](Store::max_records) are evicted oldest first.
pub struct Store {
    conn: Connection,
    max_records: usize,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn,
            max_records: DEFAULT_MAX_RECORDS,
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            max_records: DEFAULT_MAX_RECORDS,
        })
    }

    /// Maximum number of records kept.
    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Change the record cap and evict immediately if needed.
    ///
    /// A cap of zero is raised to one. Returns the number of evicted records.
    pub fn set_max_records(&mut self, max_records: usize) -> Result<usize> {
        self.max_records = max_records.max(1);
        self.evict_overflow()
    }

    /// Append a reading taken at `at`, then enforce the cap.
    ///
    /// Returns the new record's row ID.
    pub fn append(&self, reading: &RawReading, at: OffsetDateTime) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO history (timestamp, temp, hum, mq135, light, sound, mq2)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                at.unix_timestamp(),
                reading.temperature(),
                reading.humidity(),
                reading.gas_quality_raw,
                reading.light_deficient,
                reading.noise_present,
                reading.gas_or_smoke_detected,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        let evicted = self.evict_overflow()?;
        if evicted > 0 {
            debug!("Evicted {} oldest history records", evicted);
        }

        Ok(id)
    }

    fn evict_overflow(&self) -> Result<usize> {
        let keep = i64::try_from(self.max_records).unwrap_or(i64::MAX);
        let evicted = self.conn.execute(
            "DELETE FROM history WHERE id NOT IN (
                SELECT id FROM history ORDER BY timestamp DESC, id DESC LIMIT ?1
             )",
            [keep],
        )?;
        Ok(evicted)
    }

    /// Query history records with filters.
    pub fn query(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_ref.as_slice(), record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// The `limit` most recent records, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<HistoryRecord>> {
        self.query(&HistoryQuery::new().limit(limit))
    }

    /// All records of one calendar day in the given offset, newest first.
    pub fn by_date(&self, date: Date, offset: UtcOffset) -> Result<Vec<HistoryRecord>> {
        let start = PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset);
        let end = start + Duration::days(1) - Duration::seconds(1);
        self.query(&HistoryQuery::new().since(start).until(end))
    }

    /// Per-hour averages for one calendar day, sorted by hour.
    ///
    /// Hours without records are omitted. Missing temperature and humidity
    /// values are left out of their averages.
    pub fn hourly_stats(&self, date: Date, offset: UtcOffset) -> Result<Vec<HourlyStats>> {
        #[derive(Default)]
        struct Acc {
            temp_sum: f64,
            temp_n: u64,
            hum_sum: f64,
            hum_n: u64,
            mq135_sum: f64,
            count: u64,
        }

        let mut hours: BTreeMap<u8, Acc> = BTreeMap::new();
        for record in self.by_date(date, offset)? {
            let acc = hours
                .entry(record.timestamp.to_offset(offset).hour())
                .or_default();
            if let Some(t) = record.temp {
                acc.temp_sum += t;
                acc.temp_n += 1;
            }
            if let Some(h) = record.hum {
                acc.hum_sum += h;
                acc.hum_n += 1;
            }
            acc.mq135_sum += f64::from(record.mq135);
            acc.count += 1;
        }

        let mean = |sum: f64, n: u64| (n > 0).then(|| sum / n as f64);

        Ok(hours
            .into_iter()
            .map(|(hour, acc)| HourlyStats {
                hour,
                avg_temp: mean(acc.temp_sum, acc.temp_n),
                avg_hum: mean(acc.hum_sum, acc.hum_n),
                avg_mq135: acc.mq135_sum / acc.count as f64,
                count: acc.count,
            })
            .collect())
    }

    /// Total number of stored records.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete every record. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM history", [])?;
        info!("Cleared {} history records", removed);
        Ok(removed)
    }

    /// Write all records as CSV, newest first.
    ///
    /// Missing temperature and humidity are written as `N/A`. Returns the
    /// number of data rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.query(&HistoryQuery::new())?;

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADERS)?;

        for record in &records {
            let timestamp = record
                .timestamp
                .format(&Rfc3339)
                .map_err(|e| Error::InvalidTimestamp(e.to_string()))?;
            let na = || "N/A".to_string();

            wtr.write_record([
                timestamp,
                record.temp.map_or_else(na, |t| t.to_string()),
                record.hum.map_or_else(na, |h| h.to_string()),
                record.mq135.to_string(),
                u8::from(record.light).to_string(),
                u8::from(record.sound).to_string(),
                u8::from(record.mq2).to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(records.len())
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRecord> {
    let ts: i64 = row.get(1)?;
    let timestamp = OffsetDateTime::from_unix_timestamp(ts).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Integer, Box::new(e))
    })?;

    Ok(HistoryRecord {
        id: row.get(0)?,
        timestamp,
        temp: row.get(2)?,
        hum: row.get(3)?,
        mq135: row.get(4)?,
        light: row.get(5)?,
        sound: row.get(6)?,
        mq2: row.get(7)?,
    })
}
