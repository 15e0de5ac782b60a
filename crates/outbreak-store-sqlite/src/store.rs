//! [`SqliteStore`], the SQLite implementation of [`HistoryStore`].

use std::{collections::HashMap, path::Path};

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;

use outbreak_core::{
  record::{Country, CountryHistory, DayRecord},
  store::{HistoryStore, HistoryWindow},
};

use crate::{
  Error, Result,
  encode::{COUNTRY_COLUMNS, decode_day, encode_date, encode_day, encode_dt, raw_country},
  schema::SCHEMA,
};

/// Columns a country reference is resolved against, in order.
const LOOKUP_COLUMNS: [&str; 3] = ["name", "iso2", "iso3"];

// ─── Store ───────────────────────────────────────────────────────────────────

/// A history store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, as used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection. Clones of this store fail from here on.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn limit_param(window: HistoryWindow) -> i64 {
  // SQLite treats a negative LIMIT as "no limit".
  window.limit().map_or(-1, |n| n as i64)
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for SqliteStore {
  type Error = Error;

  // ── Reconciliation ────────────────────────────────────────────────────────

  async fn days_on(&self, date: NaiveDate) -> Result<HashMap<String, DayRecord>> {
    let date_str = encode_date(date);

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT country_name, record_json FROM history WHERE date = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(name, json)| Ok((name, decode_day(&json)?)))
      .collect()
  }

  async fn insert_day(&self, country: Country, day: DayRecord) -> Result<()> {
    let date_str    = encode_date(day.date);
    let record_json = encode_day(&day)?;
    let now_str     = encode_dt(Utc::now());
    let Country { name, info } = country;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO countries (
             name, iso2, iso3, latitude, longitude, flag_url, continent, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (name) DO NOTHING",
          rusqlite::params![
            name,
            info.iso2,
            info.iso3,
            info.latitude,
            info.longitude,
            info.flag_url,
            info.continent,
            now_str,
          ],
        )?;
        // Store under the canonical spelling of the country name.
        tx.execute(
          "INSERT INTO history (country_name, date, record_json, recorded_at)
           SELECT name, ?2, ?3, ?4 FROM countries WHERE name = ?1
           ON CONFLICT (country_name, date) DO UPDATE
             SET record_json = excluded.record_json,
                 recorded_at = excluded.recorded_at",
          rusqlite::params![name, date_str, record_json, now_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn replace_day(&self, country_name: String, day: DayRecord) -> Result<()> {
    let date_str    = encode_date(day.date);
    let record_json = encode_day(&day)?;
    let now_str     = encode_dt(Utc::now());
    let name        = country_name.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE history SET record_json = ?3, recorded_at = ?4
           WHERE country_name = ?1 AND date = ?2",
          rusqlite::params![name, date_str, record_json, now_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::DayNotFound {
        country: country_name,
        date:    day.date,
      });
    }
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_country_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM countries ORDER BY name")?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn find_country<'a>(&'a self, query: &'a str) -> Result<Option<Country>> {
    let query = query.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        for column in LOOKUP_COLUMNS {
          let sql = format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries
             WHERE {column} = ?1 COLLATE NOCASE
             ORDER BY name LIMIT 1"
          );
          let found = conn
            .query_row(&sql, rusqlite::params![query], raw_country)
            .optional()?;
          if found.is_some() {
            return Ok(found);
          }
        }
        Ok(None)
      })
      .await?;

    Ok(raw.map(|r| r.into_country()))
  }

  async fn history(
    &self,
    country_name: String,
    window:       HistoryWindow,
  ) -> Result<Vec<DayRecord>> {
    let limit = limit_param(window);

    let rows: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_json FROM (
             SELECT date, record_json FROM history
             WHERE country_name = ?1
             ORDER BY date DESC
             LIMIT ?2
           )
           ORDER BY date ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![country_name, limit], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.iter().map(|json| decode_day(json)).collect()
  }

  async fn all_histories(&self, window: HistoryWindow) -> Result<Vec<CountryHistory>> {
    let limit = limit_param(window);

    let rows: Vec<(String, Option<String>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.name, h.record_json
           FROM countries c
           LEFT JOIN (
             SELECT country_name, date, record_json,
                    ROW_NUMBER() OVER (
                      PARTITION BY country_name ORDER BY date DESC
                    ) AS age
             FROM history
           ) h ON h.country_name = c.name AND (?1 < 0 OR h.age <= ?1)
           ORDER BY c.name, h.date",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut histories: Vec<CountryHistory> = Vec::new();
    for (name, json) in rows {
      let day = json.as_deref().map(decode_day).transpose()?;
      match histories.last_mut() {
        Some(last) if last.country == name => last.history.extend(day),
        _ => histories.push(CountryHistory {
          country: name,
          history: day.into_iter().collect(),
        }),
      }
    }
    Ok(histories)
  }
}
