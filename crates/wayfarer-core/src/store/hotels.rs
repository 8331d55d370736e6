use rusqlite::{params, Connection, Row};

use super::repository::{Record, Repository};
use super::sql::{iso_column, json_column_or_default, to_iso, to_json};
use crate::models::Hotel;
use crate::Result;

impl Record for Hotel {
    const TABLE: &'static str = "hotels";
    const COLUMNS: &'static str = "id, name, area, description, price_range, affiliate_link, \
         image_url, rating, features, created_at, updated_at";
    const ORDER_BY: &'static str = "name COLLATE NOCASE, id";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Hotel {
            id: row.get(0)?,
            name: row.get(1)?,
            area: row.get(2)?,
            description: row.get(3)?,
            price_range: row.get(4)?,
            affiliate_link: row.get(5)?,
            image_url: row.get(6)?,
            rating: row.get(7)?,
            features: json_column_or_default(row, 8)?,
            created_at: iso_column(row, 9)?,
            updated_at: iso_column(row, 10)?,
        })
    }

    fn insert_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "INSERT INTO hotels (
                id, name, area, description, price_range, affiliate_link, image_url,
                rating, features, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.id,
                self.name,
                self.area,
                self.description,
                self.price_range,
                self.affiliate_link,
                self.image_url,
                self.rating,
                to_json(&self.features)?,
                to_iso(&self.created_at),
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn update_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE hotels SET
                name = ?2, area = ?3, description = ?4, price_range = ?5,
                affiliate_link = ?6, image_url = ?7, rating = ?8, features = ?9,
                updated_at = ?10
             WHERE id = ?1",
            params![
                self.id,
                self.name,
                self.area,
                self.description,
                self.price_range,
                self.affiliate_link,
                self.image_url,
                self.rating,
                to_json(&self.features)?,
                to_iso(&self.updated_at),
            ],
        )?)
    }
}

impl Repository<Hotel> {
    pub fn get_by_area(&self, area: &str) -> Result<Vec<Hotel>> {
        self.select("WHERE area = ?1", params![area])
    }
}
