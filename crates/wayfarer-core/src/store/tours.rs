use rusqlite::{params, Connection, Row};

use super::repository::{Record, Repository};
use super::sql::{iso_column, to_iso};
use crate::models::Tour;
use crate::Result;

impl Record for Tour {
    const TABLE: &'static str = "tours";
    const COLUMNS: &'static str = "id, title, short_description, description, duration, \
         price_range, affiliate_link, provider, category, rating, image_url, requires_online, \
         created_at, updated_at";
    const ORDER_BY: &'static str = "title COLLATE NOCASE, id";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Tour {
            id: row.get(0)?,
            title: row.get(1)?,
            short_description: row.get(2)?,
            description: row.get(3)?,
            duration: row.get(4)?,
            price_range: row.get(5)?,
            affiliate_link: row.get(6)?,
            provider: row.get(7)?,
            category: row.get(8)?,
            rating: row.get(9)?,
            image_url: row.get(10)?,
            requires_online: row.get(11)?,
            created_at: iso_column(row, 12)?,
            updated_at: iso_column(row, 13)?,
        })
    }

    fn insert_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "INSERT INTO tours (
                id, title, short_description, description, duration, price_range,
                affiliate_link, provider, category, rating, image_url, requires_online,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                self.id,
                self.title,
                self.short_description,
                self.description,
                self.duration,
                self.price_range,
                self.affiliate_link,
                self.provider,
                self.category,
                self.rating,
                self.image_url,
                self.requires_online,
                to_iso(&self.created_at),
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn update_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE tours SET
                title = ?2, short_description = ?3, description = ?4, duration = ?5,
                price_range = ?6, affiliate_link = ?7, provider = ?8, category = ?9,
                rating = ?10, image_url = ?11, requires_online = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                self.id,
                self.title,
                self.short_description,
                self.description,
                self.duration,
                self.price_range,
                self.affiliate_link,
                self.provider,
                self.category,
                self.rating,
                self.image_url,
                self.requires_online,
                to_iso(&self.updated_at),
            ],
        )?)
    }
}

impl Repository<Tour> {
    pub fn get_by_category(&self, category: &str) -> Result<Vec<Tour>> {
        self.select("WHERE category = ?1", params![category])
    }
}
