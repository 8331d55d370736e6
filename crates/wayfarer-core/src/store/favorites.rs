use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::sql::{is_duplicate_key, iso_column, to_iso};
use super::Store;
use crate::models::{Favorite, FavoriteKey, FavoriteKind};
use crate::{Error, Result};

const FAVORITE_COLUMNS: &str = "id, item_type, item_id, created_at";

/// Rows of the `favorites` table, addressed by their `(item_type, item_id)` pair
#[derive(Clone, Debug)]
pub struct FavoriteRepository {
    store: Store,
}

impl FavoriteRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Newest first
    pub fn get_all(&self) -> Result<Vec<Favorite>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FAVORITE_COLUMNS} FROM favorites ORDER BY created_at DESC, id"
            ))?;
            let rows = stmt
                .query_map([], favorite_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_by_type(&self, kind: FavoriteKind) -> Result<Vec<Favorite>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE item_type = ?1
                 ORDER BY created_at DESC, id"
            ))?;
            let rows = stmt
                .query_map(params![kind], favorite_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn find(&self, key: &FavoriteKey) -> Result<Option<Favorite>> {
        self.store.with_conn(|conn| {
            let favorite = conn
                .query_row(
                    &format!(
                        "SELECT {FAVORITE_COLUMNS} FROM favorites
                         WHERE item_type = ?1 AND item_id = ?2"
                    ),
                    params![key.kind, key.item_id],
                    favorite_from_row,
                )
                .optional()?;
            Ok(favorite)
        })
    }

    /// Fails with `DuplicateKey` when the pair is already a favorite
    pub fn insert(&self, favorite: &Favorite) -> Result<()> {
        let result = self.store.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO favorites (id, item_type, item_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    favorite.id,
                    favorite.item_type,
                    favorite.item_id,
                    to_iso(&favorite.created_at),
                ],
            )?)
        });

        match result {
            Ok(_) => {
                debug!("Favorited {} {}", favorite.item_type, favorite.item_id);
                Ok(())
            }
            Err(Error::DatabaseError(e)) if is_duplicate_key(&e) => {
                Err(Error::DuplicateKey {
                    table: "favorites",
                    id: format!("{}/{}", favorite.item_type, favorite.item_id),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Returns whether a row was removed
    pub fn delete(&self, key: &FavoriteKey) -> Result<bool> {
        let removed = self.store.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM favorites WHERE item_type = ?1 AND item_id = ?2",
                params![key.kind, key.item_id],
            )?)
        })?;

        if removed > 0 {
            debug!("Unfavorited {} {}", key.kind, key.item_id);
        }
        Ok(removed > 0)
    }
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: row.get(0)?,
        item_type: row.get(1)?,
        item_id: row.get(2)?,
        created_at: iso_column(row, 3)?,
    })
}
