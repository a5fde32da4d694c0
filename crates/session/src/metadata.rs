//! Metadata request and object list documents.
//!
//! Only the subset needed by the session is modelled: requesting a handful of
//! fields at a level, and reading field values back from the objects the
//! server returns.

use serde::Deserialize;

use crate::{DocumentError, FieldLevel, FieldName};

/// Field holding the extension configuration on the settings object.
pub const EXTENSION_CONFIGURATION_FIELD: &str = "FISHEXTENSIONCONFIG";

/// Profile field holding the user's display name.
pub const USER_NAME_FIELD: &str = "USERNAME";

/// Profile field holding the user's working language.
pub const USER_LANGUAGE_FIELD: &str = "FISHUSERLANGUAGE";

/// Which representation of a field value is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Display value.
    Value,
    /// Internal element name (for list-of-values fields).
    Element,
    /// Internal id.
    Id,
}

impl ValueType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Element => "element",
            Self::Id => "id",
        }
    }
}

/// One field in a metadata request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestedField {
    /// Field name.
    pub name: FieldName,
    /// Level to read the field at.
    pub level: FieldLevel,
    /// Requested representation.
    pub value_type: ValueType,
}

impl RequestedField {
    /// Requests the display value of `name` at `level`.
    pub fn value(name: FieldName, level: FieldLevel) -> Self {
        Self {
            name,
            level,
            value_type: ValueType::Value,
        }
    }
}

/// A set of requested fields, serialized as an `<ishfields>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedFields {
    fields: Vec<RequestedField>,
}

impl RequestedFields {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, ignoring exact duplicates.
    #[must_use]
    pub fn with(mut self, field: RequestedField) -> Self {
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
        self
    }

    /// Requested fields in insertion order.
    pub fn fields(&self) -> &[RequestedField] {
        &self.fields
    }

    /// Serializes the request document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<ishfields>");
        for field in &self.fields {
            xml.push_str(&format!(
                "<ishfield name=\"{}\" level=\"{}\" ishvaluetype=\"{}\"/>",
                quick_xml::escape::escape(field.name.as_str()),
                field.level.as_str(),
                field.value_type.as_str()
            ));
        }
        xml.push_str("</ishfields>");
        xml
    }
}

impl FromIterator<RequestedField> for RequestedFields {
    fn from_iter<I: IntoIterator<Item = RequestedField>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}

// ---------------------------------------------------------------------------
// Object lists
// ---------------------------------------------------------------------------

/// One field value of a returned object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Field name.
    pub name: String,
    /// Level the value belongs to.
    pub level: FieldLevel,
    /// Value text (unescaped).
    pub value: String,
}

/// One object of an `<ishobjects>` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataObject {
    /// Object type, when the server reports one.
    pub object_type: Option<String>,
    /// Field values in document order.
    pub fields: Vec<FieldValue>,
}

impl MetadataObject {
    /// Returns the value of `name` at `level`, if present.
    pub fn field_value(&self, name: &str, level: FieldLevel) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.level == level && f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ObjectsDocument {
    #[serde(rename = "ishobject", default)]
    objects: Vec<ObjectElement>,
}

#[derive(Debug, Deserialize)]
struct ObjectElement {
    #[serde(rename = "@ishtype", default)]
    object_type: Option<String>,
    #[serde(default)]
    ishfields: FieldsElement,
}

#[derive(Debug, Default, Deserialize)]
struct FieldsElement {
    #[serde(rename = "ishfield", default)]
    fields: Vec<FieldElement>,
}

#[derive(Debug, Deserialize)]
struct FieldElement {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@level", default)]
    level: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parses an `<ishobjects>` document.
pub fn parse_objects(xml: &str) -> Result<Vec<MetadataObject>, DocumentError> {
    let document: ObjectsDocument =
        quick_xml::de::from_str(xml).map_err(|e| DocumentError::new("object list", e))?;

    document
        .objects
        .into_iter()
        .map(|object| {
            let fields = object
                .ishfields
                .fields
                .into_iter()
                .map(|field| {
                    let raw_level = field.level.unwrap_or_default();
                    let level = FieldLevel::parse(&raw_level).ok_or_else(|| {
                        DocumentError::new("object list", format!("unknown level '{raw_level}'"))
                    })?;
                    Ok(FieldValue {
                        name: field.name,
                        level,
                        value: field.value,
                    })
                })
                .collect::<Result<Vec<_>, DocumentError>>()?;
            Ok(MetadataObject {
                object_type: object.object_type,
                fields,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_fields_serialize_with_escaping_and_dedup() {
        let name = FieldName::new("F<A&B>").unwrap();
        let request = RequestedFields::new()
            .with(RequestedField::value(name.clone(), FieldLevel::None))
            .with(RequestedField::value(name, FieldLevel::None));
        assert_eq!(
            request.to_xml(),
            "<ishfields><ishfield name=\"F&lt;A&amp;B&gt;\" level=\"none\" ishvaluetype=\"value\"/></ishfields>"
        );
    }

    #[test]
    fn parses_objects_and_unescapes_values() {
        let xml = r#"<ishobjects>
            <ishobject ishtype="ISHUser" ishref="VUSERADMIN">
              <ishfields>
                <ishfield name="USERNAME" level="none" ishvaluetype="value">Admin &amp; Co</ishfield>
                <ishfield name="FISHUSERLANGUAGE" level="none" ishvaluetype="value">en</ishfield>
              </ishfields>
            </ishobject>
          </ishobjects>"#;
        let objects = parse_objects(xml).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].object_type.as_deref(), Some("ISHUser"));
        assert_eq!(objects[0].field_value(USER_NAME_FIELD, FieldLevel::None), Some("Admin & Co"));
        assert_eq!(objects[0].field_value("fishuserlanguage", FieldLevel::None), Some("en"));
        assert_eq!(objects[0].field_value(USER_NAME_FIELD, FieldLevel::Logical), None);
    }

    #[test]
    fn empty_field_and_empty_list_are_accepted() {
        let objects = parse_objects(
            r#"<ishobjects><ishobject><ishfields><ishfield name="X" level="none"/></ishfields></ishobject></ishobjects>"#,
        )
        .unwrap();
        assert_eq!(objects[0].field_value("X", FieldLevel::None), Some(""));

        assert!(parse_objects("<ishobjects/>").unwrap().is_empty());
    }
}
