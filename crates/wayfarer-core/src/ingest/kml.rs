use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{Error, Result};

/// One placemark exactly as the document states it, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPlacemark {
    pub name: Option<String>,
    /// Raw description, possibly HTML
    pub description: Option<String>,
    /// The first `<coordinates>` text inside the placemark
    pub coordinates: Option<String>,
    pub address: Option<String>,
    /// Name of the innermost enclosing folder that has one
    pub folder: Option<String>,
    /// Extended data keyed by [`extended_key`] spelling
    pub extended: BTreeMap<String, String>,
}

impl RawPlacemark {
    /// Look up the first present, non-blank extended value among aliases
    pub fn extended_value(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.extended.get(&extended_key(alias)))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

/// Case- and separator-insensitive spelling of an extended-data key, so
/// `short_description`, `shortDescription` and `Short Description` agree
pub fn extended_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse a placemark document into raw placemarks, in document order.
///
/// Malformed XML fails the whole document with `ParseError`. Placemarks with
/// missing pieces are still returned; deciding what is usable is left to
/// normalization.
pub fn parse_document(xml: &str) -> Result<Vec<RawPlacemark>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parser = DocumentParser::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::ParseError(format!(
                "at byte {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => parser.open(&e)?,
            Event::End(_) => parser.close(),
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close();
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::ParseError(e.to_string()))?;
                parser.text.push_str(&text);
            }
            Event::CData(e) => {
                parser.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !parser.stack.is_empty() {
        return Err(Error::ParseError(format!(
            "document ended inside <{}>",
            parser.stack.join("><")
        )));
    }

    debug!("Parsed {} placemarks", parser.placemarks.len());
    Ok(parser.placemarks)
}

#[derive(Default)]
struct DocumentParser {
    /// Open element local names, outermost first
    stack: Vec<String>,
    /// One entry per open `<Folder>`
    folders: Vec<Option<String>>,
    current: Option<RawPlacemark>,
    data_key: Option<String>,
    text: String,
    placemarks: Vec<RawPlacemark>,
}

impl DocumentParser {
    fn in_description(&self) -> bool {
        self.stack.iter().any(|name| name == "description")
    }

    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();

        // Unescaped HTML inside a description arrives as child elements;
        // keep accumulating its text instead of treating it as structure
        if self.in_description() {
            self.text.push(' ');
            self.stack.push(name);
            return Ok(());
        }

        self.text.clear();

        match name.as_str() {
            "Folder" => self.folders.push(None),
            "Placemark" => {
                self.current = Some(RawPlacemark {
                    folder: self.folders.iter().rev().flatten().next().cloned(),
                    ..Default::default()
                });
            }
            "Data" | "SimpleData" => {
                self.data_key = name_attribute(element)?;
            }
            _ => {}
        }

        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };

        if self.in_description() {
            self.text.push(' ');
            return;
        }

        let text = std::mem::take(&mut self.text).trim().to_string();
        let parent = self.stack.last().map(String::as_str);

        match (name.as_str(), parent) {
            ("name", Some("Placemark")) => {
                if let Some(current) = self.current.as_mut() {
                    current.name = non_empty(text);
                }
            }
            ("name", Some("Folder")) => {
                if let Some(folder) = self.folders.last_mut() {
                    *folder = non_empty(text);
                }
            }
            ("description", Some("Placemark")) => {
                if let Some(current) = self.current.as_mut() {
                    current.description = non_empty(text);
                }
            }
            ("address", Some("Placemark")) => {
                if let Some(current) = self.current.as_mut() {
                    current.address = non_empty(text);
                }
            }
            ("coordinates", _) => {
                if let Some(current) = self.current.as_mut() {
                    if current.coordinates.is_none() {
                        current.coordinates = non_empty(text);
                    }
                }
            }
            ("value", Some("Data")) | ("SimpleData", _) => {
                if let (Some(current), Some(key)) = (self.current.as_mut(), self.data_key.as_ref()) {
                    current.extended.insert(extended_key(key), text);
                }
            }
            ("Data", _) => self.data_key = None,
            ("Placemark", _) => {
                if let Some(done) = self.current.take() {
                    self.placemarks.push(done);
                }
            }
            ("Folder", _) => {
                self.folders.pop();
            }
            _ => {}
        }

        if name == "SimpleData" {
            self.data_key = None;
        }
    }
}

fn name_attribute(element: &BytesStart<'_>) -> Result<Option<String>> {
    let attribute = element
        .try_get_attribute("name")
        .map_err(|e| Error::ParseError(e.to_string()))?;

    match attribute {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::ParseError(e.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Lisbon</name>
    <Folder>
      <name>Hidden Gems &amp; Local Spots</name>
      <Placemark>
        <name>Jardim do Torel</name>
        <description><![CDATA[<p>Quiet garden <b>above</b> the city</p>]]></description>
        <Point><coordinates>-9.1427,38.7191,0</coordinates></Point>
        <ExtendedData>
          <Data name="short_description"><value>Quiet garden</value></Data>
          <Data name="Price Range"><value>free</value></Data>
        </ExtendedData>
      </Placemark>
      <Folder>
        <Placemark>
          <name>Nested</name>
          <Point><coordinates>-9.14,38.71</coordinates></Point>
        </Placemark>
      </Folder>
    </Folder>
    <Placemark>
      <name>Loose</name>
      <address>Rua Augusta 1</address>
      <Point><coordinates>-9.1366,38.7077</coordinates></Point>
      <ExtendedData>
        <SchemaData schemaUrl="#s">
          <SimpleData name="isPremium">yes</SimpleData>
        </SchemaData>
      </ExtendedData>
    </Placemark>
  </Document>
</kml>"##;

    #[test]
    fn test_parses_placemarks_in_order() {
        let placemarks = parse_document(DOC).unwrap();
        let names: Vec<_> = placemarks.iter().map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Jardim do Torel"), Some("Nested"), Some("Loose")]);
    }

    #[test]
    fn test_folder_names_flow_to_placemarks() {
        let placemarks = parse_document(DOC).unwrap();
        assert_eq!(placemarks[0].folder.as_deref(), Some("Hidden Gems & Local Spots"));
        // Unnamed inner folder inherits the outer name
        assert_eq!(placemarks[1].folder.as_deref(), Some("Hidden Gems & Local Spots"));
        assert_eq!(placemarks[2].folder, None);
    }

    #[test]
    fn test_description_and_coordinates() {
        let placemarks = parse_document(DOC).unwrap();
        assert_eq!(
            placemarks[0].coordinates.as_deref(),
            Some("-9.1427,38.7191,0")
        );
        assert!(placemarks[0]
            .description
            .as_deref()
            .unwrap()
            .contains("<b>above</b>"));
    }

    #[test]
    fn test_extended_data_both_forms() {
        let placemarks = parse_document(DOC).unwrap();
        assert_eq!(
            placemarks[0].extended_value(&["shortDescription"]),
            Some("Quiet garden")
        );
        assert_eq!(placemarks[0].extended_value(&["price_range"]), Some("free"));
        assert_eq!(placemarks[2].extended_value(&["premium", "is_premium"]), Some("yes"));
        assert_eq!(placemarks[2].address.as_deref(), Some("Rua Augusta 1"));
    }

    #[test]
    fn test_inline_html_description() {
        let doc = r#"<kml><Placemark><name>A</name>
            <description>Open <b>daily</b> until late</description>
            <Point><coordinates>1,2</coordinates></Point></Placemark></kml>"#;
        let placemarks = parse_document(doc).unwrap();
        let description = placemarks[0].description.as_deref().unwrap();
        assert!(description.contains("daily"));
        assert!(description.contains("until late"));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_document("<kml><Placemark><name>x</Placemark></kml>").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));

        let err = parse_document("<kml><Placemark>").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_document("<kml><Document/></kml>").unwrap().is_empty());
    }
}
