//! In-memory library fixtures for unit tests.

use crate::importer::Library;
use rusqlite::{Connection, params};

pub const SCHEMA_PLAIN: &str = r#"
    CREATE TABLE ZGROUP (
        Z_PK INTEGER PRIMARY KEY,
        ZTITLE TEXT,
        ZTYPE TEXT,
        ZPARENTGROUP INTEGER,
        ZDISPLAYORDER INTEGER
    );
    CREATE TABLE ZTASKNOTES (
        Z_PK INTEGER PRIMARY KEY,
        ZSTRING TEXT
    );
    CREATE TABLE ZTASK (
        Z_PK INTEGER PRIMARY KEY,
        ZPRIORITY INTEGER,
        ZTITLE TEXT,
        ZNOTES INTEGER,
        ZCREATEDDATE REAL,
        ZPARENTLIST INTEGER,
        ZPARENTTASK INTEGER,
        ZDISPLAYORDER INTEGER
    );
"#;

pub struct LibraryBuilder {
    conn: Connection,
    anchor: i64,
}

impl LibraryBuilder {
    /// A library with a root group and a `Folders` anchor under it.
    pub fn new(with_status: bool) -> Self {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_PLAIN).unwrap();
        if with_status {
            conn.execute_batch("ALTER TABLE ZTASK ADD COLUMN ZSTATUS TEXT;")
                .unwrap();
        }
        conn.execute(
            "INSERT INTO ZGROUP (ZTITLE, ZTYPE, ZPARENTGROUP, ZDISPLAYORDER) VALUES ('Root', 'folder', NULL, 0)",
            [],
        )
        .unwrap();
        let root = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO ZGROUP (ZTITLE, ZTYPE, ZPARENTGROUP, ZDISPLAYORDER) VALUES ('Folders', 'folder', ?, 0)",
            [root],
        )
        .unwrap();
        let anchor = conn.last_insert_rowid();
        Self { conn, anchor }
    }

    pub fn anchor(&self) -> i64 {
        self.anchor
    }

    pub fn group(&mut self, parent: i64, title: &str, kind: &str, order: i64) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZGROUP (ZTITLE, ZTYPE, ZPARENTGROUP, ZDISPLAYORDER) VALUES (?, ?, ?, ?)",
                params![title, kind, parent, order],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn folder(&mut self, parent: i64, title: &str, order: i64) -> i64 {
        self.group(parent, title, "folder", order)
    }

    pub fn list(&mut self, parent: i64, title: &str, order: i64) -> i64 {
        self.group(parent, title, "list", order)
    }

    pub fn task(&mut self, list: i64, title: &str, order: i64) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZTASK (ZPRIORITY, ZTITLE, ZCREATEDDATE, ZPARENTLIST, ZPARENTTASK, ZDISPLAYORDER) \
                 VALUES (0, ?, 0.0, ?, NULL, ?)",
                params![title, list, order],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn subtask(&mut self, parent: i64, title: &str, order: i64) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZTASK (ZPRIORITY, ZTITLE, ZCREATEDDATE, ZPARENTLIST, ZPARENTTASK, ZDISPLAYORDER) \
                 VALUES (0, ?, 0.0, NULL, ?, ?)",
                params![title, parent, order],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn notes(&mut self, task: i64, text: &str) {
        self.conn
            .execute("INSERT INTO ZTASKNOTES (ZSTRING) VALUES (?)", [text])
            .unwrap();
        let note = self.conn.last_insert_rowid();
        self.conn
            .execute("UPDATE ZTASK SET ZNOTES = ? WHERE Z_PK = ?", [note, task])
            .unwrap();
    }

    pub fn status(&mut self, task: i64, status: &str) {
        self.conn
            .execute(
                "UPDATE ZTASK SET ZSTATUS = ? WHERE Z_PK = ?",
                params![status, task],
            )
            .unwrap();
    }

    /// Point an existing task at another parent task.
    pub fn reparent(&mut self, task: i64, parent: i64) {
        self.conn
            .execute(
                "UPDATE ZTASK SET ZPARENTLIST = NULL, ZPARENTTASK = ? WHERE Z_PK = ?",
                [parent, task],
            )
            .unwrap();
    }

    pub fn into_library(self) -> Library {
        Library::from_connection(self.conn).unwrap()
    }
}
