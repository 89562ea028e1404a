//! SQL schema for the Conform SQLite store.
//!
//! Applied at connection startup when `PRAGMA user_version` is behind; the
//! batch itself bumps the version, so reopening an initialised database
//! skips it. Future migrations key off the same number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS assessments (
    assessment_id TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    col           TEXT NOT NULL,   -- workflow column: 'backlog' | 'inprogress' | 'review' | 'finished' | 'archived'
    due_in        TEXT NOT NULL,
    framework     TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    assigned_to   TEXT NOT NULL DEFAULT '',
    template      TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- At most one saved questionnaire structure per assessment; overrides the
-- framework template when present.
CREATE TABLE IF NOT EXISTS structure_overrides (
    assessment_id  TEXT PRIMARY KEY REFERENCES assessments(assessment_id),
    structure_json TEXT NOT NULL
);

-- One row per answered subsection; the value is an arbitrary JSON document
-- keyed by field id within the subsection.
CREATE TABLE IF NOT EXISTS answers (
    assessment_id TEXT NOT NULL,
    subsection_id TEXT NOT NULL,
    value_json    TEXT NOT NULL,
    PRIMARY KEY (assessment_id, subsection_id)
);

CREATE TABLE IF NOT EXISTS memberships (
    user_id   TEXT NOT NULL,
    org_id    TEXT NOT NULL,
    role      TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    PRIMARY KEY (user_id, org_id)
);

CREATE TABLE IF NOT EXISTS collaborators (
    assessment_id TEXT NOT NULL,
    user_id       TEXT NOT NULL,
    role          TEXT NOT NULL,   -- 'viewer' | 'editor'
    PRIMARY KEY (assessment_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    message_id    TEXT PRIMARY KEY,
    assessment_id TEXT NOT NULL,
    author        TEXT NOT NULL,
    posted_at     TEXT NOT NULL,
    body          TEXT NOT NULL,
    parent_id     TEXT,            -- NULL for roots; a root's message_id for replies
    sections      TEXT NOT NULL DEFAULT '[]',
    attachments   TEXT NOT NULL DEFAULT '[]',
    mentions      TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS attachments (
    attachment_id TEXT PRIMARY KEY,
    assessment_id TEXT NOT NULL,
    name          TEXT NOT NULL,
    created       TEXT NOT NULL,
    modified      TEXT NOT NULL,
    size          INTEGER NOT NULL DEFAULT 0
);

-- Links between a subsection and an attachment; insertion order is the
-- display order.
CREATE TABLE IF NOT EXISTS section_links (
    assessment_id TEXT NOT NULL,
    subsection_id TEXT NOT NULL,
    attachment_id TEXT NOT NULL,
    PRIMARY KEY (assessment_id, subsection_id, attachment_id)
);

CREATE INDEX IF NOT EXISTS answers_assessment_idx     ON answers(assessment_id);
CREATE INDEX IF NOT EXISTS messages_assessment_idx    ON messages(assessment_id);
CREATE INDEX IF NOT EXISTS attachments_assessment_idx ON attachments(assessment_id);
CREATE INDEX IF NOT EXISTS memberships_user_idx       ON memberships(user_id);

PRAGMA user_version = 1;
";
