use rusqlite::{params, Connection, Row};

use super::repository::{Record, Repository};
use super::sql::{iso_column, json_column, opt_json_column, opt_to_json, to_iso, to_json};
use crate::models::{Category, Place};
use crate::Result;

impl Record for Place {
    const TABLE: &'static str = "places";
    const COLUMNS: &'static str = "id, name, short_description, description, practical_tips, \
         category, latitude, longitude, opening_hours, images, address, \
         estimated_visit_duration, price_range, is_premium, created_at, updated_at";
    const ORDER_BY: &'static str = "name COLLATE NOCASE, id";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Place {
            id: row.get(0)?,
            name: row.get(1)?,
            short_description: row.get(2)?,
            description: row.get(3)?,
            practical_tips: row.get(4)?,
            category: row.get(5)?,
            latitude: row.get(6)?,
            longitude: row.get(7)?,
            opening_hours: opt_json_column(row, 8)?,
            images: json_column(row, 9)?,
            address: row.get(10)?,
            estimated_visit_duration: row.get(11)?,
            price_range: row.get(12)?,
            is_premium: row.get(13)?,
            created_at: iso_column(row, 14)?,
            updated_at: iso_column(row, 15)?,
        })
    }

    fn insert_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "INSERT INTO places (
                id, name, short_description, description, practical_tips,
                category, latitude, longitude, opening_hours, images, address,
                estimated_visit_duration, price_range, is_premium, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                self.id,
                self.name,
                self.short_description,
                self.description,
                self.practical_tips,
                self.category,
                self.latitude,
                self.longitude,
                opt_to_json(self.opening_hours.as_ref())?,
                to_json(&self.images)?,
                self.address,
                self.estimated_visit_duration,
                self.price_range,
                self.is_premium,
                to_iso(&self.created_at),
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn update_row(&self, conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "UPDATE places SET
                name = ?2, short_description = ?3, description = ?4, practical_tips = ?5,
                category = ?6, latitude = ?7, longitude = ?8, opening_hours = ?9,
                images = ?10, address = ?11, estimated_visit_duration = ?12,
                price_range = ?13, is_premium = ?14, updated_at = ?15
             WHERE id = ?1",
            params![
                self.id,
                self.name,
                self.short_description,
                self.description,
                self.practical_tips,
                self.category,
                self.latitude,
                self.longitude,
                opt_to_json(self.opening_hours.as_ref())?,
                to_json(&self.images)?,
                self.address,
                self.estimated_visit_duration,
                self.price_range,
                self.is_premium,
                to_iso(&self.updated_at),
            ],
        )?)
    }

    fn validate(&self) -> Result<()> {
        Place::validate(self)
    }
}

impl Repository<Place> {
    pub fn get_by_category(&self, category: Category) -> Result<Vec<Place>> {
        self.select("WHERE category = ?1", params![category])
    }

    pub fn get_premium(&self, is_premium: bool) -> Result<Vec<Place>> {
        self.select("WHERE is_premium = ?1", params![is_premium])
    }

    /// Remove every place. Only full-replace ingestion calls this.
    pub fn delete_all(&self) -> Result<usize> {
        self.store
            .with_conn(|conn| Ok(conn.execute("DELETE FROM places", [])?))
    }
}
