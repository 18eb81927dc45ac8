//! Database schema SQL.
//!
//! The layout is fixed: existing archives must keep opening and ranking the same way.

/// `PRAGMA application_id` tag identifying a faldone file ("fald").
pub const APPLICATION_ID: i64 = 0x6661_6c64;

/// Primary document table.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE documents (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    title     TEXT,
    labels    TEXT,
    mime      TEXT,
    text_data TEXT,
    raw_data  BLOB
);
"#;

/// FTS4 external-content index over the searchable columns.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE documents_idx USING fts4(title, labels, text_data, content="documents");
"#;

/// Triggers coupling index entries to document rows.
///
/// The delete trigger must fire BEFORE the row goes away: an external-content
/// FTS4 table reads the old column values from `documents` to unindex them.
pub const FTS_TRIGGERS_SQL: &str = r#"
CREATE TRIGGER documents_after_insert AFTER INSERT ON documents BEGIN
    INSERT INTO documents_idx (docid, title, labels, text_data)
    VALUES (new.id, new.title, new.labels, new.text_data);
END;

CREATE TRIGGER documents_before_delete BEFORE DELETE ON documents BEGIN
    DELETE FROM documents_idx WHERE docid = old.id;
END;
"#;

/// Shadow table holding one row per indexed document.
pub const FTS_DOCSIZE_TABLE: &str = "documents_idx_docsize";
