//! SQL schema for the canteen SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (identity, date). Writes are single-statement upserts.
CREATE TABLE IF NOT EXISTS meal_preferences (
    identity_id   TEXT    NOT NULL,
    date          TEXT    NOT NULL,   -- YYYY-MM-DD
    breakfast     INTEGER NOT NULL DEFAULT 0,
    lunch         INTEGER NOT NULL DEFAULT 0,
    snacks        INTEGER NOT NULL DEFAULT 0,
    display_name  TEXT    NOT NULL DEFAULT '',
    department    TEXT    NOT NULL DEFAULT '',
    last_updated  TEXT    NOT NULL,   -- RFC 3339 in the civil zone
    PRIMARY KEY (identity_id, date)
);

-- Derived cache; may be dropped and rebuilt from meal_preferences.
CREATE TABLE IF NOT EXISTS meal_counts (
    date            TEXT    PRIMARY KEY,
    breakfast_count INTEGER NOT NULL DEFAULT 0,
    lunch_count     INTEGER NOT NULL DEFAULT 0,
    snacks_count    INTEGER NOT NULL DEFAULT 0,
    total_employees INTEGER NOT NULL DEFAULT 0,
    computed_at     TEXT
);

CREATE TABLE IF NOT EXISTS menus (
    date        TEXT PRIMARY KEY,
    day         TEXT NOT NULL DEFAULT '',
    breakfast   TEXT NOT NULL DEFAULT '[]',   -- JSON array of item names
    lunch       TEXT NOT NULL DEFAULT '[]',
    snacks      TEXT NOT NULL DEFAULT '[]',
    updated_at  TEXT NOT NULL,
    updated_by  TEXT
);

CREATE INDEX IF NOT EXISTS meal_preferences_date_idx ON meal_preferences(date);

PRAGMA user_version = 1;
";
