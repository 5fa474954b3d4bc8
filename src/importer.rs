//! Read side of a The Hit List library (`library.sqlite3`).
//!
//! The library is a Core Data store. Only three tables matter here:
//! ```sql
//! ZGROUP     (Z_PK, ZTITLE, ZTYPE, ZPARENTGROUP, ZDISPLAYORDER)  -- ZTYPE: 'folder' | 'list' | ...
//! ZTASK      (Z_PK, ZPRIORITY, ZTITLE, ZNOTES, ZCREATEDDATE,
//!             ZPARENTLIST, ZPARENTTASK, ZDISPLAYORDER [, ZSTATUS])
//! ZTASKNOTES (Z_PK, ZSTRING)
//! ```
//!
//! A top-level task points at its list through `ZPARENTLIST`; a subtask has
//! `ZPARENTLIST IS NULL` and points at its parent through `ZPARENTTASK`.
//! Older libraries have no `ZSTATUS` column.
use crate::utils::{backup_database, core_data_date};
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, OpenFlags, Row, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Which flavour of the `ZTASK` table the library carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVariant {
    /// No status column.
    Plain,
    /// `ZTASK.ZSTATUS` exists; every task carries a (possibly empty) status.
    WithStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Folder,
    List,
}

impl GroupKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "folder" => Some(GroupKind::Folder),
            "list" => Some(GroupKind::List),
            _ => None,
        }
    }
}

/// A folder or list row from `ZGROUP`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub kind: GroupKind,
}

/// One task row, named the way it is written to JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Priority")]
    pub priority: Option<i64>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "Task")]
    pub title: String,
    #[serde(rename = "Notes")]
    pub notes: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "OriginalCreatedDate")]
    pub original_created_date: Option<f64>,
    #[serde(rename = "ParentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl Task {
    /// A task with a non-empty status is finished.
    pub fn is_done(&self) -> bool {
        self.status.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let original_created_date: Option<f64> = row.get(5)?;
        Ok(Task {
            id: row.get(0)?,
            priority: row.get(1)?,
            status: row.get(2)?,
            title: row.get(3)?,
            notes: row.get(4)?,
            date: original_created_date.and_then(core_data_date),
            original_created_date,
            parent_id: row.get(6)?,
        })
    }
}

/// Owns the single connection used for a whole export run.
pub struct Library {
    conn: Connection,
    variant: SchemaVariant,
    // Declared after `conn` so the connection closes before the file is removed.
    _snapshot: Option<NamedTempFile>,
}

impl Library {
    /// Open the library file directly, read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_read_only(path)?;
        Self::with_snapshot(conn, None)
    }

    /// Copy the library to a temporary file and read from the copy.
    pub fn open_snapshot(path: &Path) -> Result<Self> {
        let snapshot = backup_database(path)?;
        let conn = open_read_only(snapshot.path())?;
        Self::with_snapshot(conn, Some(snapshot))
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        Self::with_snapshot(conn, None)
    }

    fn with_snapshot(conn: Connection, snapshot: Option<NamedTempFile>) -> Result<Self> {
        let variant = detect_variant(&conn)?;
        debug!(?variant, "Detected task schema");
        Ok(Self {
            conn,
            variant,
            _snapshot: snapshot,
        })
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// The group with no parent. Every other group descends from it.
    pub fn root_group_id(&self) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare("SELECT Z_PK FROM ZGROUP WHERE ZPARENTGROUP IS NULL ORDER BY Z_PK")
            .wrap_err("Failed to prepare root group query")?;
        let ids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()
            .wrap_err("Failed to read root groups")?;

        match ids.as_slice() {
            [] => Err(eyre!("Library has no root group")),
            [id] => Ok(*id),
            [id, ..] => {
                warn!(count = ids.len(), "Several root groups found, using the first");
                Ok(*id)
            }
        }
    }

    /// The group titled `title` directly under the root group.
    pub fn anchor_folder_id(&self, title: &str) -> Result<i64> {
        let root = self.root_group_id()?;
        let mut stmt = self
            .conn
            .prepare("SELECT Z_PK FROM ZGROUP WHERE ZPARENTGROUP = ? AND ZTITLE = ? ORDER BY ZDISPLAYORDER")
            .wrap_err("Failed to prepare anchor query")?;
        let mut rows = stmt.query(params![root, title])?;
        match rows.next().wrap_err("Failed to read anchor group")? {
            Some(row) => Ok(row.get(0)?),
            None => Err(eyre!(
                "Couldn't find the top-level folder {:?}. It may be localized; pass its title with --anchor.",
                title
            )),
        }
    }

    /// Folders and lists directly inside `group_id`, in display order.
    pub fn child_groups(&self, group_id: i64) -> Result<Vec<Group>> {
        self.query_groups(
            "SELECT Z_PK, ZTITLE, ZTYPE FROM ZGROUP \
             WHERE ZPARENTGROUP = ? AND (ZTYPE = 'folder' OR ZTYPE = 'list') \
             ORDER BY ZDISPLAYORDER",
            group_id,
        )
    }

    /// Folders directly inside `group_id`, in display order.
    pub fn child_folders(&self, group_id: i64) -> Result<Vec<Group>> {
        self.query_groups(
            "SELECT Z_PK, ZTITLE, ZTYPE FROM ZGROUP \
             WHERE ZPARENTGROUP = ? AND ZTYPE = 'folder' \
             ORDER BY ZDISPLAYORDER",
            group_id,
        )
    }

    fn query_groups(&self, sql: &str, group_id: i64) -> Result<Vec<Group>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .wrap_err("Failed to prepare group query")?;
        let rows = stmt
            .query_map([group_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .wrap_err_with(|| format!("Failed to read groups inside {}", group_id))?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, title, kind)| {
                GroupKind::parse(&kind).map(|kind| Group {
                    id,
                    title: title.unwrap_or_default(),
                    kind,
                })
            })
            .collect())
    }

    /// Tasks that belong directly to the list `list_id`, in display order.
    pub fn top_level_tasks(&self, list_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT ZTASK.Z_PK, ZTASK.ZPRIORITY, {status}, COALESCE(ZTASK.ZTITLE, ''), \
                    ZTASKNOTES.ZSTRING, ZTASK.ZCREATEDDATE, NULL \
             FROM ZTASK LEFT JOIN ZTASKNOTES ON ZTASK.ZNOTES = ZTASKNOTES.Z_PK \
             WHERE ZTASK.ZPARENTLIST = ? \
             ORDER BY ZTASK.ZDISPLAYORDER ASC",
            status = self.status_column()
        );
        self.query_tasks(&sql, list_id)
            .wrap_err_with(|| format!("Failed to read tasks of list {}", list_id))
    }

    /// Direct subtasks of `task_id`, in display order.
    pub fn subtasks(&self, task_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT ZTASK.Z_PK, ZTASK.ZPRIORITY, {status}, COALESCE(ZTASK.ZTITLE, ''), \
                    ZTASKNOTES.ZSTRING, ZTASK.ZCREATEDDATE, ZTASK.ZPARENTTASK \
             FROM ZTASK LEFT JOIN ZTASKNOTES ON ZTASK.ZNOTES = ZTASKNOTES.Z_PK \
             WHERE ZTASK.ZPARENTLIST IS NULL AND ZTASK.ZPARENTTASK = ? \
             ORDER BY ZTASK.ZDISPLAYORDER ASC",
            status = self.status_column()
        );
        self.query_tasks(&sql, task_id)
            .wrap_err_with(|| format!("Failed to read subtasks of task {}", task_id))
    }

    fn status_column(&self) -> &'static str {
        match self.variant {
            SchemaVariant::Plain => "NULL",
            SchemaVariant::WithStatus => "COALESCE(CAST(ZTASK.ZSTATUS AS TEXT), '')",
        }
    }

    fn query_tasks(&self, sql: &str, id: i64) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let tasks = stmt
            .query_map([id], Task::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .wrap_err_with(|| format!("Failed to open database: {}", path.display()))
}

fn detect_variant(conn: &Connection) -> Result<SchemaVariant> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('ZTASK')")
        .wrap_err("Failed to inspect ZTASK schema")?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()
        .wrap_err("Failed to read ZTASK columns")?;

    if columns.is_empty() {
        return Err(eyre!(
            "Not a The Hit List library: table ZTASK is missing"
        ));
    }
    if columns.iter().any(|c| c.eq_ignore_ascii_case("ZSTATUS")) {
        Ok(SchemaVariant::WithStatus)
    } else {
        Ok(SchemaVariant::Plain)
    }
}
