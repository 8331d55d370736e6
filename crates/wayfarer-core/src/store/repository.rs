use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::marker::PhantomData;
use tracing::debug;

use super::sql::is_duplicate_key;
use super::Store;
use crate::{Error, Result};

/// Fixed mapping between one entity type and its table
///
/// `from_row` must read every column listed in `COLUMNS`, in order.
pub trait Record: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;

    fn id(&self) -> &str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn insert_row(&self, conn: &Connection) -> Result<usize>;

    /// Replace every mutable column. `created_at` is never touched.
    fn update_row(&self, conn: &Connection) -> Result<usize>;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// What an upsert ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

/// Typed CRUD over one table
pub struct Repository<E> {
    pub(crate) store: Store,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Record> Repository<E> {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Every row, in the entity's stable order
    pub fn get_all(&self) -> Result<Vec<E>> {
        self.select("", [])
    }

    /// The row with this id, or `None`
    pub fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", E::COLUMNS, E::TABLE);
        self.store.with_conn(|conn| {
            let record = conn.query_row(&sql, params![id], E::from_row).optional()?;
            Ok(record)
        })
    }

    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        self.store.with_conn(|conn| {
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }

    /// Insert a new row; an existing id fails with `DuplicateKey`
    pub fn insert(&self, record: &E) -> Result<()> {
        record.validate()?;
        self.store.with_conn(|conn| insert_with(conn, record))?;
        debug!("Inserted {} {}", E::TABLE, record.id());
        Ok(())
    }

    /// Full-row replace of an existing row, keeping its original `created_at`
    pub fn update(&self, record: &E) -> Result<()> {
        record.validate()?;
        let changed = self.store.with_conn(|conn| record.update_row(conn))?;

        if changed == 0 {
            return Err(Error::NotFound(format!("{} {}", E::TABLE, record.id())));
        }

        debug!("Updated {} {}", E::TABLE, record.id());
        Ok(())
    }

    /// Insert when absent, update when present
    pub fn upsert(&self, record: &E) -> Result<WriteOutcome> {
        record.validate()?;
        let exists_sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", E::TABLE);

        self.store.with_conn(|conn| {
            let exists: bool = conn.query_row(&exists_sql, params![record.id()], |row| row.get(0))?;
            if exists {
                record.update_row(conn)?;
                Ok(WriteOutcome::Updated)
            } else {
                insert_with(conn, record)?;
                Ok(WriteOutcome::Inserted)
            }
        })
    }

    /// Returns whether a row was removed
    pub fn delete(&self, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", E::TABLE);
        let removed = self
            .store
            .with_conn(|conn| Ok(conn.execute(&sql, params![id])?))?;
        Ok(removed > 0)
    }

    /// Rows matching a fixed `WHERE` clause, in the entity's stable order
    pub(crate) fn select<P: Params>(&self, filter: &str, params: P) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY {}",
            E::COLUMNS,
            E::TABLE,
            filter,
            E::ORDER_BY
        );

        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params, E::from_row)?
                .collect::<rusqlite::Result<Vec<E>>>()?;
            Ok(rows)
        })
    }
}

fn insert_with<E: Record>(conn: &Connection, record: &E) -> Result<()> {
    match record.insert_row(conn) {
        Ok(_) => Ok(()),
        Err(Error::DatabaseError(e)) if is_duplicate_key(&e) => Err(Error::DuplicateKey {
            table: E::TABLE,
            id: record.id().to_string(),
        }),
        Err(e) => Err(e),
    }
}
