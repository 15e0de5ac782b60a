//! SQL schema for the outbreak SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per country. Info columns are written once, on first sighting.
CREATE TABLE IF NOT EXISTS countries (
    name        TEXT PRIMARY KEY COLLATE NOCASE,
    iso2        TEXT,
    iso3        TEXT,
    latitude    REAL,
    longitude   REAL,
    flag_url    TEXT,
    continent   TEXT,
    created_at  TEXT NOT NULL      -- RFC 3339 UTC
);

-- One row per (country, date). Rows are replaced whole, never patched.
CREATE TABLE IF NOT EXISTS history (
    country_name TEXT NOT NULL COLLATE NOCASE REFERENCES countries(name),
    date         TEXT NOT NULL,    -- YYYY-MM-DD
    record_json  TEXT NOT NULL,    -- serialised DayRecord
    recorded_at  TEXT NOT NULL,    -- RFC 3339 UTC; last write
    PRIMARY KEY (country_name, date)
);

CREATE INDEX IF NOT EXISTS history_date_idx ON history(date);

PRAGMA user_version = 1;
";
