use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use super::category::infer_category;
use super::identity::place_id;
use super::kml::RawPlacemark;
use crate::models::place::validate_coordinates;
use crate::models::{OpeningHours, Place, PriceRange};
use crate::{Error, Result};

const SHORT_DESCRIPTION_CHARS: usize = 160;

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"(?i)<br\s*/?>|</p>|<[^>]*>").expect("static regex"))
}

fn comma_regex() -> &'static Regex {
    static COMMAS: OnceLock<Regex> = OnceLock::new();
    COMMAS.get_or_init(|| Regex::new(r"\s*,\s*").expect("static regex"))
}

fn space_regex() -> &'static Regex {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    SPACES.get_or_init(|| Regex::new(r"[ \t\r\f]+").expect("static regex"))
}

/// Plain text from an HTML fragment: tags dropped, line breaks kept, common
/// entities decoded, runs of spaces collapsed
pub fn strip_html(html: &str) -> String {
    let text = tag_regex().replace_all(html, |caps: &regex::Captures<'_>| {
        let tag = caps[0].to_lowercase();
        if tag.starts_with("<br") || tag == "</p>" {
            "\n"
        } else {
            " "
        }
    });

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(|line| space_regex().replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `longitude,latitude[,altitude]` into `(latitude, longitude)`.
/// Tuples are separated by whitespace; spaces next to a comma stay inside
/// the tuple. Only the first tuple of a multi-point string is read.
pub fn parse_coordinates(raw: &str) -> Result<(f64, f64)> {
    let joined = comma_regex().replace_all(raw.trim(), ",");
    let tuple = joined
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::ValidationError("empty coordinates".into()))?;

    let mut parts = tuple.split(',').map(str::trim);
    let (Some(lon), Some(lat)) = (parts.next(), parts.next()) else {
        return Err(Error::ValidationError(format!(
            "coordinates {:?} are not a longitude,latitude pair",
            raw
        )));
    };

    let parse = |value: &str, axis: &str| {
        value.parse::<f64>().map_err(|_| {
            Error::ValidationError(format!("{} {:?} is not a number", axis, value))
        })
    };
    let longitude = parse(lon, "longitude")?;
    let latitude = parse(lat, "latitude")?;

    validate_coordinates(latitude, longitude)?;
    Ok((latitude, longitude))
}

/// Turn a raw placemark into a validated Place stamped with `now`.
///
/// Missing name or bad coordinates and non-numeric durations are
/// `ValidationError`s; an unrecognised price tier is only logged.
pub fn normalize_placemark(raw: &RawPlacemark, now: DateTime<Utc>) -> Result<Place> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::ValidationError("placemark has no name".into()))?
        .to_string();

    let coordinates = raw.coordinates.as_deref().ok_or_else(|| {
        Error::ValidationError(format!("placemark {:?} has no coordinates", name))
    })?;
    let (latitude, longitude) = parse_coordinates(coordinates)
        .map_err(|e| Error::ValidationError(format!("placemark {:?}: {}", name, e)))?;

    let description = raw.description.as_deref().map(strip_html).unwrap_or_default();
    let short_description = raw
        .extended_value(&["short_description", "summary"])
        .map(str::to_string)
        .unwrap_or_else(|| summarize(&description));

    let estimated_visit_duration = raw
        .extended_value(&["estimated_visit_duration", "visit_duration", "duration"])
        .map(|value| {
            value.parse::<u32>().map_err(|_| {
                Error::ValidationError(format!(
                    "placemark {:?}: visit duration {:?} is not a whole number of minutes",
                    name, value
                ))
            })
        })
        .transpose()?;

    let price_range = raw
        .extended_value(&["price_range", "price"])
        .and_then(|value| {
            let tier = PriceRange::parse_loose(value);
            if tier.is_none() {
                warn!("Ignoring unknown price range {:?} on {:?}", value, name);
            }
            tier
        });

    let is_premium = raw
        .extended_value(&["is_premium", "premium"])
        .map(is_truthy)
        .unwrap_or(false);

    let opening_hours = raw
        .extended_value(&["opening_hours", "hours"])
        .map(|notes| OpeningHours {
            schedule: Default::default(),
            notes: Some(notes.to_string()),
        });

    let images = raw
        .extended_value(&["images", "gx_media_links"])
        .map(|links| {
            links
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|link| !link.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let address = raw
        .address
        .clone()
        .or_else(|| raw.extended_value(&["address"]).map(str::to_string));

    let place = Place {
        id: place_id(&name, latitude, longitude),
        category: infer_category(
            raw.extended_value(&["category", "type"]),
            raw.folder.as_deref(),
        ),
        short_description,
        description,
        practical_tips: raw
            .extended_value(&["practical_tips", "tips"])
            .unwrap_or_default()
            .to_string(),
        name,
        latitude,
        longitude,
        opening_hours,
        images,
        address,
        estimated_visit_duration,
        price_range,
        is_premium,
        created_at: now,
        updated_at: now,
    };

    place.validate()?;
    Ok(place)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "y")
}

/// First sentence or line of a description, capped in length
fn summarize(description: &str) -> String {
    let first_line = description.lines().next().unwrap_or_default();
    let sentence = match first_line.find(". ") {
        Some(end) => &first_line[..=end],
        None => first_line,
    };

    if sentence.chars().count() <= SHORT_DESCRIPTION_CHARS {
        return sentence.to_string();
    }

    let mut clipped: String = sentence.chars().take(SHORT_DESCRIPTION_CHARS - 1).collect();
    clipped.push('…');
    clipped
}
