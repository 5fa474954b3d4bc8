#![allow(dead_code)]

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A library file on disk, laid out like `library.sqlite3`.
pub struct Fixture {
    pub dir: TempDir,
    pub db_path: PathBuf,
    conn: Connection,
    pub anchor: i64,
}

impl Fixture {
    pub fn new(with_status: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("library.sqlite3");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE ZGROUP (Z_PK INTEGER PRIMARY KEY, ZTITLE TEXT, ZTYPE TEXT,
                                 ZPARENTGROUP INTEGER, ZDISPLAYORDER INTEGER);
            CREATE TABLE ZTASKNOTES (Z_PK INTEGER PRIMARY KEY, ZSTRING TEXT);
            CREATE TABLE ZTASK (Z_PK INTEGER PRIMARY KEY, ZPRIORITY INTEGER, ZTITLE TEXT,
                                ZNOTES INTEGER, ZCREATEDDATE REAL, ZPARENTLIST INTEGER,
                                ZPARENTTASK INTEGER, ZDISPLAYORDER INTEGER);
            INSERT INTO ZGROUP VALUES (1, 'Library', 'folder', NULL, 0);
            INSERT INTO ZGROUP VALUES (2, 'Folders', 'folder', 1, 0);
            INSERT INTO ZGROUP VALUES (3, 'Inbox', 'list', 1, 1);
            "#,
        )
        .unwrap();
        if with_status {
            conn.execute_batch("ALTER TABLE ZTASK ADD COLUMN ZSTATUS TEXT;")
                .unwrap();
        }
        Self {
            dir,
            db_path,
            conn,
            anchor: 2,
        }
    }

    /// A fresh, not yet existing destination inside the fixture's temp dir.
    pub fn target(&self) -> PathBuf {
        self.dir.path().join("export")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn group(&self, parent: i64, title: &str, kind: &str, order: i64) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZGROUP (ZTITLE, ZTYPE, ZPARENTGROUP, ZDISPLAYORDER) VALUES (?, ?, ?, ?)",
                params![title, kind, parent, order],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn task(
        &self,
        list: Option<i64>,
        parent: Option<i64>,
        title: &str,
        order: i64,
        notes: Option<&str>,
    ) -> i64 {
        let note_id = notes.map(|text| {
            self.conn
                .execute("INSERT INTO ZTASKNOTES (ZSTRING) VALUES (?)", [text])
                .unwrap();
            self.conn.last_insert_rowid()
        });
        self.conn
            .execute(
                "INSERT INTO ZTASK (ZPRIORITY, ZTITLE, ZNOTES, ZCREATEDDATE, ZPARENTLIST, ZPARENTTASK, ZDISPLAYORDER) \
                 VALUES (1, ?, ?, 731064600.0, ?, ?, ?)",
                params![title, note_id, list, parent, order],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn rename(&self, group: i64, title: &str) {
        self.conn
            .execute(
                "UPDATE ZGROUP SET ZTITLE = ? WHERE Z_PK = ?",
                params![title, group],
            )
            .unwrap();
    }

    pub fn set_status(&self, task: i64, status: &str) {
        self.conn
            .execute(
                "UPDATE ZTASK SET ZSTATUS = ? WHERE Z_PK = ?",
                params![status, task],
            )
            .unwrap();
    }

    /// One folder "Personal" with the list "Errands": task 1 nests two levels,
    /// task 2 has notes. Returns the list id.
    pub fn errands(&self) -> i64 {
        let folder = self.group(self.anchor, "Personal", "folder", 0);
        let list = self.group(folder, "Errands", "list", 0);
        let first = self.task(Some(list), None, "Task 1", 0, None);
        let sub = self.task(None, Some(first), "Sub", 0, None);
        self.task(None, Some(sub), "SubSub", 0, None);
        self.task(Some(list), None, "Task 2", 1, Some("Buy milk"));
        list
    }
}
