use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use pitwall_core::{Championship, CustomRace, RaceWeekend, ServerOptions};
use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
enum Table {
    CustomRaces,
    Championships,
    RaceWeekends,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::CustomRaces => "custom_races",
            Table::Championships => "championships",
            Table::RaceWeekends => "race_weekends",
        }
    }
}

/// An aggregate stored as one JSON document row.
trait Document: Serialize + DeserializeOwned {
    const TABLE: Table;
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
}

macro_rules! impl_document {
    ($ty:ty, $table:expr) => {
        impl Document for $ty {
            const TABLE: Table = $table;
            fn id(&self) -> Uuid {
                self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn deleted_at(&self) -> Option<DateTime<Utc>> {
                self.deleted_at
            }
        }
    };
}

impl_document!(CustomRace, Table::CustomRaces);
impl_document!(Championship, Table::Championships);
impl_document!(RaceWeekend, Table::RaceWeekends);

/// [`Store`] backed by a single SQLite connection behind a `Mutex`.
///
/// Each subsystem that needs its own handle opens its own connection to the
/// same file; WAL mode keeps readers and the writer out of each other's way.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an open connection, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }

    fn list_docs<T: Document>(&self) -> Result<Vec<T>> {
        let table = T::TABLE.name();
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!("SELECT data FROM {table} ORDER BY rowid"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for data in rows {
            docs.push(serde_json::from_str(&data?)?);
        }
        debug!(table, count = docs.len(), "documents listed");
        Ok(docs)
    }

    fn load_doc<T: Document>(&self, id: Uuid) -> Result<Option<T>> {
        let db = self.conn()?;
        read_doc(&db, id)
    }

    fn upsert_doc<T: Document>(&self, doc: &T) -> Result<()> {
        let db = self.conn()?;
        write_doc(&db, doc)
    }

    /// Read, modify, and write back while holding the connection lock, inside
    /// one transaction.
    fn update_doc<T: Document>(&self, id: Uuid, f: &mut dyn FnMut(&mut T) -> bool) -> Result<Option<T>> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;
        let Some(mut doc) = read_doc::<T>(&tx, id)? else {
            return Ok(None);
        };
        if f(&mut doc) {
            write_doc(&tx, &doc)?;
            tx.commit()?;
        }
        Ok(Some(doc))
    }
}

fn read_doc<T: Document>(db: &Connection, id: Uuid) -> Result<Option<T>> {
    let data: Option<String> = db
        .query_row(
            &format!("SELECT data FROM {} WHERE id = ?1", T::TABLE.name()),
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    data.map(|d| serde_json::from_str(&d))
        .transpose()
        .map_err(StoreError::from)
}

fn write_doc<T: Document>(db: &Connection, doc: &T) -> Result<()> {
    let table = T::TABLE.name();
    let id = doc.id();
    let data = serde_json::to_string(doc)?;
    let now = Utc::now().to_rfc3339();
    let deleted = doc.deleted_at().map(|t| t.to_rfc3339());

    db.execute(
        &format!(
            "INSERT INTO {table} (id, name, data, deleted_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                data = excluded.data,
                deleted_at = excluded.deleted_at,
                updated_at = excluded.updated_at"
        ),
        rusqlite::params![id.to_string(), doc.name(), data, deleted, now],
    )?;
    debug!(table, %id, "document upserted");
    Ok(())
}

impl Store for SqliteStore {
    fn list_custom_races(&self) -> Result<Vec<CustomRace>> {
        self.list_docs()
    }

    fn load_custom_race(&self, id: Uuid) -> Result<Option<CustomRace>> {
        self.load_doc(id)
    }

    #[instrument(skip_all, fields(id = %race.id))]
    fn upsert_custom_race(&self, race: &CustomRace) -> Result<()> {
        self.upsert_doc(race)
    }

    #[instrument(skip(self, f))]
    fn update_custom_race(&self, id: Uuid, f: &mut dyn FnMut(&mut CustomRace) -> bool) -> Result<Option<CustomRace>> {
        self.update_doc(id, f)
    }

    fn list_championships(&self) -> Result<Vec<Championship>> {
        self.list_docs()
    }

    fn load_championship(&self, id: Uuid) -> Result<Option<Championship>> {
        self.load_doc(id)
    }

    #[instrument(skip_all, fields(id = %championship.id))]
    fn upsert_championship(&self, championship: &Championship) -> Result<()> {
        self.upsert_doc(championship)
    }

    #[instrument(skip(self, f))]
    fn update_championship(
        &self,
        id: Uuid,
        f: &mut dyn FnMut(&mut Championship) -> bool,
    ) -> Result<Option<Championship>> {
        self.update_doc(id, f)
    }

    fn list_race_weekends(&self) -> Result<Vec<RaceWeekend>> {
        self.list_docs()
    }

    fn load_race_weekend(&self, id: Uuid) -> Result<Option<RaceWeekend>> {
        self.load_doc(id)
    }

    #[instrument(skip_all, fields(id = %race_weekend.id))]
    fn upsert_race_weekend(&self, race_weekend: &RaceWeekend) -> Result<()> {
        self.upsert_doc(race_weekend)
    }

    #[instrument(skip(self, f))]
    fn update_race_weekend(
        &self,
        id: Uuid,
        f: &mut dyn FnMut(&mut RaceWeekend) -> bool,
    ) -> Result<Option<RaceWeekend>> {
        self.update_doc(id, f)
    }

    fn load_server_options(&self) -> Result<ServerOptions> {
        let db = self.conn()?;
        let data: Option<String> = db
            .query_row("SELECT data FROM server_options WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        match data {
            Some(d) => Ok(serde_json::from_str(&d)?),
            None => Ok(ServerOptions::default()),
        }
    }

    fn upsert_server_options(&self, options: &ServerOptions) -> Result<()> {
        let data = serde_json::to_string(options)?;
        let now = Utc::now().to_rfc3339();
        let db = self.conn()?;
        db.execute(
            "INSERT INTO server_options (id, data, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            rusqlite::params![data, now],
        )?;
        Ok(())
    }
}
