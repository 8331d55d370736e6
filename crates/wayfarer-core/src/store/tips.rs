use rusqlite::{params, Connection, Row};

use super::repository::{Record, Repository};
use super::sql::{iso_column, to_iso};
use crate::models::{PracticalTip, TipCategory};
use crate::Result;

impl Record for PracticalTip {
    const TABLE: &'static str = "tips";
    const COLUMNS: &'static str = "id, category, title, content, icon, priority, updated_at";
    const ORDER_BY: &'static str = "priority DESC, title COLLATE NOCASE, id";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PracticalTip {
            id: row.get(0)?,
            category: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            icon: row.get(4)?,
            priority: row.get(5)?,
            updated_at: iso_column(row, 6)?,
        })
    }

    fn insert_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "INSERT INTO tips (id, category, title, content, icon, priority, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.id,
                self.category,
                self.title,
                self.content,
                self.icon,
                self.priority,
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn update_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE tips SET
                category = ?2, title = ?3, content = ?4, icon = ?5, priority = ?6,
                updated_at = ?7
             WHERE id = ?1",
            params![
                self.id,
                self.category,
                self.title,
                self.content,
                self.icon,
                self.priority,
                to_iso(&self.updated_at),
            ],
        )?)
    }
}

impl Repository<PracticalTip> {
    /// Tips of one category, highest priority first
    pub fn get_by_category(&self, category: TipCategory) -> Result<Vec<PracticalTip>> {
        self.select("WHERE category = ?1", params![category])
    }
}
