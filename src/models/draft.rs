use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::SchemaError, models::template::TemplateVersion};

/// The in-progress content of a template version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub variables_schema: VariablesSchema,
}

impl From<&TemplateVersion> for Draft {
    fn from(version: &TemplateVersion) -> Self {
        Self {
            subject: version.subject.clone(),
            body_html: version.body_html.clone(),
            body_text: version.body_text.clone(),
            variables_schema: version.variables_schema.clone(),
        }
    }
}

impl Draft {
    pub fn apply(&mut self, update: DraftUpdate) {
        match update {
            DraftUpdate::Subject(value) => self.subject = value,
            DraftUpdate::BodyHtml(value) => self.body_html = value,
            DraftUpdate::BodyText(value) => self.body_text = value,
            DraftUpdate::VariablesSchema(value) => self.variables_schema = value,
        }
    }

    /// Returns the template text held by `field`, or `None` for the schema.
    pub fn text(&self, field: DraftField) -> Option<&str> {
        match field {
            DraftField::Subject => Some(&self.subject),
            DraftField::BodyHtml => Some(&self.body_html),
            DraftField::BodyText => Some(&self.body_text),
            DraftField::VariablesSchema => None,
        }
    }

    /// True when every draft field equals the corresponding field of `version`.
    pub fn matches(&self, version: &TemplateVersion) -> bool {
        self.subject == version.subject
            && self.body_html == version.body_html
            && self.body_text == version.body_text
            && self.variables_schema == version.variables_schema
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Subject,
    BodyHtml,
    BodyText,
    VariablesSchema,
}

impl DraftField {
    pub const TEMPLATES: [DraftField; 3] =
        [DraftField::Subject, DraftField::BodyHtml, DraftField::BodyText];
}

impl Display for DraftField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DraftField::Subject => write!(f, "subject"),
            DraftField::BodyHtml => write!(f, "body_html"),
            DraftField::BodyText => write!(f, "body_text"),
            DraftField::VariablesSchema => write!(f, "variables_schema"),
        }
    }
}

/// A single field write into a [`Draft`].
#[derive(Debug, Clone, PartialEq)]
pub enum DraftUpdate {
    Subject(String),
    BodyHtml(String),
    BodyText(String),
    VariablesSchema(VariablesSchema),
}

impl DraftUpdate {
    pub fn field(&self) -> DraftField {
        match self {
            DraftUpdate::Subject(_) => DraftField::Subject,
            DraftUpdate::BodyHtml(_) => DraftField::BodyHtml,
            DraftUpdate::BodyText(_) => DraftField::BodyText,
            DraftUpdate::VariablesSchema(_) => DraftField::VariablesSchema,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl VariableType {
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "string" => Some(VariableType::String),
            "number" => Some(VariableType::Number),
            "boolean" => Some(VariableType::Boolean),
            "array" => Some(VariableType::Array),
            "object" => Some(VariableType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::Array => "array",
            VariableType::Object => "object",
        }
    }

    /// Interprets a raw test value typed into the editor.
    ///
    /// Falls back to the raw string when the text is not JSON of this type.
    pub fn coerce(&self, raw: &str) -> Value {
        if *self == VariableType::String {
            return Value::String(raw.to_string());
        }

        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) if self.accepts(&value) => value,
            _ => Value::String(raw.to_string()),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            VariableType::String => value.is_string(),
            VariableType::Number => value.is_number(),
            VariableType::Boolean => value.is_boolean(),
            VariableType::Array => value.is_array(),
            VariableType::Object => value.is_object(),
        }
    }
}

/// Declared template variables, stored as a JSON-schema style object.
///
/// Declarations live under `properties` in insertion order, which is also the
/// display order. Any other keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariablesSchema {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl VariablesSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Declared variables in display order. Missing or unknown types read as string.
    pub fn variables(&self) -> impl Iterator<Item = (&str, VariableType)> {
        self.properties
            .iter()
            .map(|(name, spec)| (name.as_str(), Self::type_of(spec)))
    }

    pub fn declared_type(&self, name: &str) -> Option<VariableType> {
        self.properties.get(name).map(Self::type_of)
    }

    /// Declares `name`, or changes its type in place if already declared.
    pub fn declare(&mut self, name: &str, kind: VariableType) -> Result<(), SchemaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }

        self.properties
            .insert(name.to_string(), Self::spec_for(kind));
        Ok(())
    }

    /// Declares a fresh `new_var_<n>` string variable and returns its name.
    pub fn add_variable(&mut self) -> String {
        let mut index = self.properties.len() + 1;
        let mut name = format!("new_var_{}", index);

        while self.properties.contains_key(&name) {
            index += 1;
            name = format!("new_var_{}", index);
        }

        self.properties
            .insert(name.clone(), Self::spec_for(VariableType::String));
        name
    }

    pub fn set_type(&mut self, name: &str, kind: VariableType) -> Result<(), SchemaError> {
        match self.properties.get_mut(name) {
            Some(Value::Object(spec)) => {
                spec.insert("type".to_string(), Value::String(kind.as_str().to_string()));
                Ok(())
            }
            Some(spec) => {
                *spec = Self::spec_for(kind);
                Ok(())
            }
            None => Err(SchemaError::UnknownVariable(name.to_string())),
        }
    }

    /// Renames a declaration. The renamed entry moves to the end of the listing.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), SchemaError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if !self.properties.contains_key(old) {
            return Err(SchemaError::UnknownVariable(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.properties.contains_key(new) {
            return Err(SchemaError::DuplicateName(new.to_string()));
        }

        if let Some(spec) = self.properties.shift_remove(old) {
            self.properties.insert(new.to_string(), spec);
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), SchemaError> {
        self.properties
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| SchemaError::UnknownVariable(name.to_string()))
    }

    fn type_of(spec: &Value) -> VariableType {
        spec.get("type")
            .and_then(Value::as_str)
            .and_then(VariableType::from_string)
            .unwrap_or_default()
    }

    fn spec_for(kind: VariableType) -> Value {
        serde_json::json!({ "type": kind.as_str() })
    }
}
