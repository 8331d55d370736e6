//! Geospatial Ingestion Pipeline: placemark documents in, Place rows out.
//!
//! Parsing is done by one structured XML reader ([`kml::parse_document`]),
//! normalization turns each raw placemark into a validated [`Place`], and
//! the [`Importer`] commits the batch in replace or merge mode. A bad
//! placemark is skipped and counted; it never aborts the batch.
//!
//! [`Place`]: crate::models::Place

mod category;
mod identity;
mod import;
mod kml;
mod normalize;

pub use category::infer_category;
pub use identity::place_id;
pub use import::{ImportMode, ImportReport, Importer};
pub use kml::{parse_document, RawPlacemark};
pub use normalize::{normalize_placemark, parse_coordinates, strip_html};
