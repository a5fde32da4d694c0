//! Type field setup: which metadata fields exist per object type.
//!
//! A [`TypeFieldSetup`] maps `(object type, field name, level)` to a
//! [`FieldDefinition`]. It is built from one of two sources that share the same
//! document format:
//!
//! - the field setup document returned by the server (13 and later), or
//! - a static snapshot bundled with this crate for older servers.
//!
//! Either may afterwards receive an extension configuration overlay that adds
//! definitions or rebinds fields to a metadata binding source.
//!
//! ```xml
//! <ishfieldsetup>
//!   <ishtypedefinition name="ISHUser">
//!     <ishfielddefinition name="FISHUSERLANGUAGE" level="none" datatype="lov"
//!                         referencelov="DLANGUAGE" isbasic="true">
//!       <description>Working language</description>
//!     </ishfielddefinition>
//!   </ishtypedefinition>
//! </ishfieldsetup>
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::metadata::{RequestedField, RequestedFields};
use crate::{
    DocumentError, FieldLevel, FieldName, RequestedMetadataGroup, SessionError,
    StrictMetadataPreference, TypeName,
};

/// Field setup snapshot of the last server generation without dynamic
/// retrieval (12.0.1).
const LEGACY_SNAPSHOT: &str = include_str!("../resources/legacy_field_setup.xml");

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Kind of data a field holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldDataType {
    /// Single-line text.
    Text,
    /// Multi-line text.
    LongText,
    /// Integer or decimal number.
    Number,
    /// Date and time.
    DateTime,
    /// Value from a named list of values.
    ListOfValues,
    /// Reference to objects of other types.
    TypeReference,
    /// Value supplied by an external metadata binding source.
    MetadataBinding,
    /// A kind this client does not model; kept verbatim.
    Other(String),
}

impl FieldDataType {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "string" | "text" => Self::Text,
            "longtext" | "multilinetext" => Self::LongText,
            "number" | "integer" | "float" => Self::Number,
            "datetime" | "date" => Self::DateTime,
            "lov" | "listofvalues" => Self::ListOfValues,
            "typereference" | "ishtype" | "reference" => Self::TypeReference,
            "metadatabinding" => Self::MetadataBinding,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Identity of a field definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey {
    /// Object type the field belongs to.
    pub object_type: TypeName,
    /// Field name.
    pub name: FieldName,
    /// Level the field is stored at.
    pub level: FieldLevel,
}

/// Metadata describing one field of one object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Object type the field belongs to.
    pub object_type: TypeName,
    /// Field name.
    pub name: FieldName,
    /// Level the field is stored at.
    pub level: FieldLevel,
    /// Kind of data held.
    pub data_type: FieldDataType,
    /// Whether the field holds several values.
    pub multi_value: bool,
    /// Whether the field must be set on create.
    pub mandatory: bool,
    /// Part of the basic metadata group.
    pub basic: bool,
    /// Part of the descriptive metadata group.
    pub descriptive: bool,
    /// List of values the field draws from, for list-of-values fields.
    pub reference_list: Option<String>,
    /// Types the field may reference, for type-reference fields.
    pub reference_types: Vec<TypeName>,
    /// Explicit allowed values, when the server enumerates them.
    pub allowed_values: Vec<String>,
    /// Binding source, for metadata-bound fields.
    pub binding_source: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
}

impl FieldDefinition {
    /// Key of this definition.
    pub fn key(&self) -> FieldKey {
        FieldKey {
            object_type: self.object_type.clone(),
            name: self.name.clone(),
            level: self.level,
        }
    }

    fn belongs_to(&self, group: RequestedMetadataGroup) -> bool {
        match group {
            RequestedMetadataGroup::All => true,
            RequestedMetadataGroup::Basic => self.basic || self.descriptive,
            RequestedMetadataGroup::Descriptive => self.descriptive,
        }
    }
}

// ---------------------------------------------------------------------------
// Document shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FieldSetupDocument {
    #[serde(rename = "ishtypedefinition", default)]
    types: Vec<TypeDefinitionElement>,
}

#[derive(Debug, Deserialize)]
struct TypeDefinitionElement {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "ishfielddefinition", default)]
    fields: Vec<FieldDefinitionElement>,
}

#[derive(Debug, Deserialize)]
struct FieldDefinitionElement {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@level", default)]
    level: Option<String>,
    #[serde(rename = "@datatype", default)]
    data_type: Option<String>,
    #[serde(rename = "@ismandatory", default)]
    mandatory: bool,
    #[serde(rename = "@ismultivalue", default)]
    multi_value: bool,
    #[serde(rename = "@isbasic", default)]
    basic: bool,
    #[serde(rename = "@isdescriptive", default)]
    descriptive: bool,
    #[serde(rename = "@referencelov", default)]
    reference_list: Option<String>,
    #[serde(rename = "@referencetypes", default)]
    reference_types: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "allowedvalue", default)]
    allowed_values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OverlayDocument {
    #[serde(default)]
    metadatabindings: BindingsElement,
    #[serde(rename = "ishtypedefinition", default)]
    types: Vec<TypeDefinitionElement>,
}

#[derive(Debug, Default, Deserialize)]
struct BindingsElement {
    #[serde(rename = "metadatabinding", default)]
    bindings: Vec<BindingElement>,
}

#[derive(Debug, Deserialize)]
struct BindingElement {
    #[serde(rename = "@ishfieldname")]
    field: String,
    #[serde(rename = "@sourceref", default)]
    source: Option<String>,
}

fn convert_types(
    document: &'static str,
    types: Vec<TypeDefinitionElement>,
) -> Result<Vec<FieldDefinition>, DocumentError> {
    let mut definitions = Vec::new();
    for type_element in types {
        let object_type = TypeName::new(type_element.name.trim())
            .ok_or_else(|| DocumentError::new(document, "type definition without a name"))?;
        for field in type_element.fields {
            let name = FieldName::new(field.name.trim()).ok_or_else(|| {
                DocumentError::new(document, format!("field without a name on type '{object_type}'"))
            })?;
            let raw_level = field.level.unwrap_or_default();
            let level = FieldLevel::parse(&raw_level).ok_or_else(|| {
                DocumentError::new(document, format!("unknown level '{raw_level}' for field '{name}'"))
            })?;
            let reference_types = field
                .reference_types
                .unwrap_or_default()
                .split_whitespace()
                .filter_map(TypeName::new)
                .collect();
            definitions.push(FieldDefinition {
                object_type: object_type.clone(),
                name,
                level,
                data_type: FieldDataType::parse(field.data_type.as_deref().unwrap_or_default()),
                multi_value: field.multi_value,
                mandatory: field.mandatory,
                basic: field.basic,
                descriptive: field.descriptive,
                reference_list: field.reference_list.filter(|s| !s.trim().is_empty()),
                reference_types,
                allowed_values: field.allowed_values,
                binding_source: None,
                description: field.description.filter(|s| !s.trim().is_empty()),
            });
        }
    }
    Ok(definitions)
}

// ---------------------------------------------------------------------------
// Field setup
// ---------------------------------------------------------------------------

/// Counts of what an overlay merge changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlaySummary {
    /// Definitions that did not exist before.
    pub added: usize,
    /// Definitions replaced by the overlay.
    pub overridden: usize,
    /// Definitions rebound to a metadata binding source.
    pub rebound: usize,
    /// Bindings naming a field that no type defines.
    pub unmatched_bindings: usize,
}

/// Mapping from `(object type, field name, level)` to field definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFieldSetup {
    definitions: BTreeMap<FieldKey, FieldDefinition>,
}

impl TypeFieldSetup {
    /// Builds a setup from definitions; later duplicates replace earlier ones.
    pub fn from_definitions(definitions: impl IntoIterator<Item = FieldDefinition>) -> Self {
        let mut setup = Self::default();
        for definition in definitions {
            setup.insert(definition);
        }
        setup
    }

    /// Parses a field setup document.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let document: FieldSetupDocument =
            quick_xml::de::from_str(xml).map_err(|e| DocumentError::new("field setup", e))?;
        Ok(Self::from_definitions(convert_types("field setup", document.types)?))
    }

    /// The bundled snapshot used for servers without dynamic retrieval.
    ///
    /// It only knows the standard fields; custom fields added on a server are
    /// absent.
    pub fn legacy_snapshot() -> Result<Self, DocumentError> {
        Self::parse(LEGACY_SNAPSHOT)
    }

    /// Inserts or replaces a definition, returning the replaced one.
    pub fn insert(&mut self, definition: FieldDefinition) -> Option<FieldDefinition> {
        self.definitions.insert(definition.key(), definition)
    }

    /// Looks up one definition.
    pub fn get(&self, object_type: &TypeName, name: &FieldName, level: FieldLevel) -> Option<&FieldDefinition> {
        self.definitions.get(&FieldKey {
            object_type: object_type.clone(),
            name: name.clone(),
            level,
        })
    }

    /// All definitions, ordered by type, name and level.
    pub fn definitions(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.definitions.values()
    }

    /// Definitions of one object type.
    pub fn definitions_for<'a>(&'a self, object_type: &'a TypeName) -> impl Iterator<Item = &'a FieldDefinition> + 'a {
        self.definitions
            .values()
            .filter(move |d| &d.object_type == object_type)
    }

    /// Distinct object types, sorted.
    pub fn object_types(&self) -> Vec<&TypeName> {
        let mut types: Vec<&TypeName> = self.definitions.keys().map(|k| &k.object_type).collect();
        types.dedup();
        types
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if there are no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Merges an extension configuration document.
    ///
    /// Type definitions in the overlay add or replace entries. Each metadata
    /// binding turns every definition of the named field, on any type and
    /// level, into a [`FieldDataType::MetadataBinding`] field. A blank document
    /// changes nothing.
    pub fn merge_overlay(&mut self, xml: &str) -> Result<OverlaySummary, DocumentError> {
        let mut summary = OverlaySummary::default();
        if xml.trim().is_empty() {
            return Ok(summary);
        }

        let document: OverlayDocument =
            quick_xml::de::from_str(xml).map_err(|e| DocumentError::new("extension configuration", e))?;

        for definition in convert_types("extension configuration", document.types)? {
            if self.insert(definition).is_some() {
                summary.overridden += 1;
            } else {
                summary.added += 1;
            }
        }

        for binding in document.metadatabindings.bindings {
            let field = binding.field.trim();
            let mut matched = false;
            for definition in self
                .definitions
                .values_mut()
                .filter(|d| d.name.as_str().eq_ignore_ascii_case(field))
            {
                definition.data_type = FieldDataType::MetadataBinding;
                definition.binding_source = binding.source.clone();
                summary.rebound += 1;
                matched = true;
            }
            if !matched {
                debug!(field = field, "Metadata binding names a field unknown to the field setup");
                summary.unmatched_bindings += 1;
            }
        }

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Resolved setup
// ---------------------------------------------------------------------------

/// How a [`ResolvedFieldSetup`] was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSetupSource {
    /// Retrieved from the server.
    Dynamic,
    /// Bundled snapshot for servers without dynamic retrieval.
    StaticFallback,
    /// Supplied by the caller through
    /// [`crate::Session::replace_type_field_setup`].
    Explicit,
}

/// A field setup ready for use, with the strictness policy applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFieldSetup {
    source: FieldSetupSource,
    overlay_merged: bool,
    strictness: StrictMetadataPreference,
    setup: TypeFieldSetup,
}

impl ResolvedFieldSetup {
    /// Wraps a setup retrieved from the server.
    pub fn dynamic(setup: TypeFieldSetup, preference: StrictMetadataPreference) -> Self {
        Self {
            source: FieldSetupSource::Dynamic,
            overlay_merged: false,
            strictness: preference,
            setup,
        }
    }

    /// Wraps the static snapshot. Strictness is forced to
    /// [`StrictMetadataPreference::Off`]: the snapshot does not know custom
    /// fields, and filtering against it would discard legitimate data.
    pub fn static_fallback(setup: TypeFieldSetup) -> Self {
        Self {
            source: FieldSetupSource::StaticFallback,
            overlay_merged: false,
            strictness: StrictMetadataPreference::Off,
            setup,
        }
    }

    /// Wraps a caller-supplied setup.
    pub fn explicit(setup: TypeFieldSetup, preference: StrictMetadataPreference) -> Self {
        Self {
            source: FieldSetupSource::Explicit,
            overlay_merged: false,
            strictness: preference,
            setup,
        }
    }

    /// Merges an overlay and marks the setup as merged.
    pub(crate) fn merge_overlay(&mut self, xml: &str) -> Result<OverlaySummary, DocumentError> {
        let summary = self.setup.merge_overlay(xml)?;
        self.overlay_merged = true;
        Ok(summary)
    }

    /// Adopts a new session preference. Ignored for the static fallback.
    pub(crate) fn apply_preference(&mut self, preference: StrictMetadataPreference) {
        if self.source != FieldSetupSource::StaticFallback {
            self.strictness = preference;
        }
    }

    /// Construction path.
    pub fn source(&self) -> FieldSetupSource {
        self.source
    }

    /// Whether an extension configuration overlay was merged.
    pub fn overlay_merged(&self) -> bool {
        self.overlay_merged
    }

    /// Effective strictness policy.
    pub fn strictness(&self) -> StrictMetadataPreference {
        self.strictness
    }

    /// The underlying definitions.
    pub fn setup(&self) -> &TypeFieldSetup {
        &self.setup
    }

    /// Applies the strictness policy to a request for `object_type`.
    ///
    /// Known fields always pass. Unknown fields are kept ([`Off`]), dropped
    /// ([`Continue`]), dropped with a warning ([`Warn`]) or rejected
    /// ([`Reject`]).
    ///
    /// [`Off`]: StrictMetadataPreference::Off
    /// [`Continue`]: StrictMetadataPreference::Continue
    /// [`Warn`]: StrictMetadataPreference::Warn
    /// [`Reject`]: StrictMetadataPreference::Reject
    pub fn filter_fields(
        &self,
        object_type: &TypeName,
        requested: RequestedFields,
    ) -> Result<RequestedFields, SessionError> {
        if self.strictness == StrictMetadataPreference::Off {
            return Ok(requested);
        }

        let mut kept = RequestedFields::new();
        for field in requested.fields() {
            if self.setup.get(object_type, &field.name, field.level).is_some() {
                kept = kept.with(field.clone());
                continue;
            }
            match self.strictness {
                StrictMetadataPreference::Off => kept = kept.with(field.clone()),
                StrictMetadataPreference::Continue => {
                    debug!(object_type = %object_type, field = %field.name, level = %field.level, "Dropping unknown field");
                }
                StrictMetadataPreference::Warn => {
                    warn!(object_type = %object_type, field = %field.name, level = %field.level, "Dropping field unknown to the field setup");
                }
                StrictMetadataPreference::Reject => {
                    return Err(SessionError::UnknownFieldPolicyViolation {
                        object_type: object_type.clone(),
                        field: field.name.clone(),
                        level: field.level,
                    });
                }
            }
        }
        Ok(kept)
    }

    /// Fields of `object_type` belonging to `group`, as a request.
    pub fn requested_fields(&self, object_type: &TypeName, group: RequestedMetadataGroup) -> RequestedFields {
        self.setup
            .definitions_for(object_type)
            .filter(|d| d.belongs_to(group))
            .map(|d| RequestedField::value(d.name.clone(), d.level))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETUP: &str = r#"<ishfieldsetup>
  <ishtypedefinition name="ISHModule">
    <ishfielddefinition name="FTITLE" level="logical" datatype="string" ismandatory="true" isbasic="true" isdescriptive="true"/>
    <ishfielddefinition name="FSTATUS" level="lng" datatype="lov" referencelov="DSTATUS" isbasic="true">
      <description>Workflow status</description>
      <allowedvalue>Draft</allowedvalue>
      <allowedvalue>Released</allowedvalue>
    </ishfielddefinition>
    <ishfielddefinition name="FCUSTOMER" level="logical" datatype="string"/>
  </ishtypedefinition>
  <ishtypedefinition name="ISHPublication">
    <ishfielddefinition name="FISHMASTERREF" level="version" datatype="typereference" referencetypes="ISHMasterDoc"/>
    <ishfielddefinition name="FCUSTOMER" level="logical" datatype="string" ismultivalue="true"/>
  </ishtypedefinition>
</ishfieldsetup>"#;

    fn name(s: &str) -> FieldName {
        FieldName::new(s).unwrap()
    }

    fn type_name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    #[test]
    fn parses_definitions_with_attributes_and_children() {
        let setup = TypeFieldSetup::parse(SETUP).unwrap();
        assert_eq!(setup.len(), 5);

        let status = setup
            .get(&type_name("ISHModule"), &name("FSTATUS"), FieldLevel::Lng)
            .unwrap();
        assert_eq!(status.data_type, FieldDataType::ListOfValues);
        assert_eq!(status.reference_list.as_deref(), Some("DSTATUS"));
        assert_eq!(status.allowed_values, vec!["Draft", "Released"]);
        assert_eq!(status.description.as_deref(), Some("Workflow status"));

        let master = setup
            .get(&type_name("ISHPublication"), &name("FISHMASTERREF"), FieldLevel::Version)
            .unwrap();
        assert_eq!(master.reference_types, vec![type_name("ISHMasterDoc")]);

        let title = setup
            .get(&type_name("ISHModule"), &name("FTITLE"), FieldLevel::Logical)
            .unwrap();
        assert!(title.mandatory && title.basic && title.descriptive && !title.multi_value);
    }

    #[test]
    fn unknown_level_is_a_document_error() {
        let xml = r#"<ishfieldsetup><ishtypedefinition name="X"><ishfielddefinition name="F" level="galaxy"/></ishtypedefinition></ishfieldsetup>"#;
        let err = TypeFieldSetup::parse(xml).unwrap_err();
        assert!(err.message.contains("galaxy"));
    }

    #[test]
    fn legacy_snapshot_has_standard_types() {
        let setup = TypeFieldSetup::legacy_snapshot().unwrap();
        let types: Vec<&str> = setup.object_types().into_iter().map(TypeName::as_str).collect();
        for expected in ["ISHFolder", "ISHModule", "ISHPublication", "ISHUser"] {
            assert!(types.contains(&expected), "missing {expected} in {types:?}");
        }
        assert!(setup
            .get(&type_name("ISHUser"), &name("FISHUSERLANGUAGE"), FieldLevel::None)
            .is_some());
    }

    #[test]
    fn overlay_adds_overrides_and_rebinds() {
        let mut setup = TypeFieldSetup::parse(SETUP).unwrap();
        let overlay = r#"<infoshareextensionconfig version="1.0">
  <metadatabindings>
    <metadatabinding ishfieldname="FCUSTOMER" sourceref="CustomerRepository"/>
    <metadatabinding ishfieldname="FNOWHERE" sourceref="Ghost"/>
  </metadatabindings>
  <ishtypedefinition name="ISHModule">
    <ishfielddefinition name="FTITLE" level="logical" datatype="longtext"/>
    <ishfielddefinition name="FPRODUCT" level="logical" datatype="string" isbasic="true"/>
  </ishtypedefinition>
</infoshareextensionconfig>"#;

        let summary = setup.merge_overlay(overlay).unwrap();
        assert_eq!(
            summary,
            OverlaySummary {
                added: 1,
                overridden: 1,
                rebound: 2,
                unmatched_bindings: 1
            }
        );

        let title = setup
            .get(&type_name("ISHModule"), &name("FTITLE"), FieldLevel::Logical)
            .unwrap();
        assert_eq!(title.data_type, FieldDataType::LongText);

        for object_type in ["ISHModule", "ISHPublication"] {
            let customer = setup
                .get(&type_name(object_type), &name("FCUSTOMER"), FieldLevel::Logical)
                .unwrap();
            assert_eq!(customer.data_type, FieldDataType::MetadataBinding);
            assert_eq!(customer.binding_source.as_deref(), Some("CustomerRepository"));
        }
    }

    #[test]
    fn blank_overlay_is_a_no_op() {
        let mut setup = TypeFieldSetup::parse(SETUP).unwrap();
        let before = setup.clone();
        assert_eq!(setup.merge_overlay("  ").unwrap(), OverlaySummary::default());
        assert_eq!(setup, before);
    }

    fn request(fields: &[(&str, FieldLevel)]) -> RequestedFields {
        fields
            .iter()
            .map(|(n, l)| RequestedField::value(name(n), *l))
            .collect()
    }

    #[test]
    fn strictness_policies_handle_unknown_fields() {
        let setup = TypeFieldSetup::parse(SETUP).unwrap();
        let module = type_name("ISHModule");
        let requested = request(&[("FTITLE", FieldLevel::Logical), ("FMADEUP", FieldLevel::Logical)]);

        let off = ResolvedFieldSetup::dynamic(setup.clone(), StrictMetadataPreference::Off);
        assert_eq!(off.filter_fields(&module, requested.clone()).unwrap().fields().len(), 2);

        for preference in [StrictMetadataPreference::Continue, StrictMetadataPreference::Warn] {
            let resolved = ResolvedFieldSetup::dynamic(setup.clone(), preference);
            let kept = resolved.filter_fields(&module, requested.clone()).unwrap();
            assert_eq!(kept.fields().len(), 1);
            assert_eq!(kept.fields()[0].name.as_str(), "FTITLE");
        }

        let reject = ResolvedFieldSetup::dynamic(setup, StrictMetadataPreference::Reject);
        let err = reject.filter_fields(&module, requested).unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnknownFieldPolicyViolation { ref field, level: FieldLevel::Logical, .. } if field.as_str() == "FMADEUP"
        ));
    }

    #[test]
    fn static_fallback_ignores_preference_changes() {
        let mut resolved = ResolvedFieldSetup::static_fallback(TypeFieldSetup::parse(SETUP).unwrap());
        resolved.apply_preference(StrictMetadataPreference::Reject);
        assert_eq!(resolved.strictness(), StrictMetadataPreference::Off);

        let mut dynamic = ResolvedFieldSetup::dynamic(TypeFieldSetup::default(), StrictMetadataPreference::Off);
        dynamic.apply_preference(StrictMetadataPreference::Warn);
        assert_eq!(dynamic.strictness(), StrictMetadataPreference::Warn);
    }

    #[test]
    fn requested_fields_follow_metadata_group() {
        let resolved = ResolvedFieldSetup::dynamic(TypeFieldSetup::parse(SETUP).unwrap(), StrictMetadataPreference::Off);
        let module = type_name("ISHModule");

        let names = |group| -> Vec<String> {
            resolved
                .requested_fields(&module, group)
                .fields()
                .iter()
                .map(|f| f.name.to_string())
                .collect()
        };
        assert_eq!(names(RequestedMetadataGroup::Descriptive), vec!["FTITLE"]);
        assert_eq!(names(RequestedMetadataGroup::Basic), vec!["FSTATUS", "FTITLE"]);
        assert_eq!(names(RequestedMetadataGroup::All), vec!["FCUSTOMER", "FSTATUS", "FTITLE"]);
    }
}
