use anyhow::Result;
use serde_json::json;
use template_editor::{
    error::SchemaError,
    models::{
        draft::{VariableType, VariablesSchema},
        template::TemplateVersion,
    },
};

/// Test: Declarations keep insertion order
#[test]
fn test_schema_preserves_declaration_order() -> Result<()> {
    let mut schema = VariablesSchema::new();
    schema.declare("zeta", VariableType::String)?;
    schema.declare("alpha", VariableType::Number)?;
    schema.declare("mid", VariableType::Boolean)?;

    let names: Vec<&str> = schema.names().collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert_eq!(schema.declared_type("alpha"), Some(VariableType::Number));

    Ok(())
}

/// Test: Generated names skip ones already taken
#[test]
fn test_add_variable_names() -> Result<()> {
    let mut schema = VariablesSchema::new();
    assert_eq!(schema.add_variable(), "new_var_1");
    assert_eq!(schema.add_variable(), "new_var_2");

    schema.rename("new_var_1", "greeting")?;
    schema.declare("new_var_3", VariableType::String)?;

    assert_eq!(schema.add_variable(), "new_var_4");
    assert_eq!(schema.declared_type("new_var_4"), Some(VariableType::String));

    Ok(())
}

/// Test: Renaming moves the entry to the end and keeps its type
#[test]
fn test_rename_variable() -> Result<()> {
    let mut schema = VariablesSchema::new();
    schema.declare("first", VariableType::Array)?;
    schema.declare("second", VariableType::String)?;

    schema.rename("first", "renamed")?;

    let names: Vec<&str> = schema.names().collect();
    assert_eq!(names, vec!["second", "renamed"]);
    assert_eq!(schema.declared_type("renamed"), Some(VariableType::Array));
    assert!(!schema.contains("first"));

    Ok(())
}

/// Test: Invalid schema edits are rejected without changes
#[test]
fn test_schema_edit_errors() -> Result<()> {
    let mut schema = VariablesSchema::new();
    schema.declare("a", VariableType::String)?;
    schema.declare("b", VariableType::String)?;
    let before = schema.clone();

    assert_eq!(schema.rename("a", "  "), Err(SchemaError::EmptyName));
    assert_eq!(
        schema.rename("a", "b"),
        Err(SchemaError::DuplicateName("b".to_string()))
    );
    assert_eq!(
        schema.rename("missing", "c"),
        Err(SchemaError::UnknownVariable("missing".to_string()))
    );
    assert_eq!(
        schema.remove("missing"),
        Err(SchemaError::UnknownVariable("missing".to_string()))
    );
    assert_eq!(
        schema.set_type("missing", VariableType::Number),
        Err(SchemaError::UnknownVariable("missing".to_string()))
    );
    assert_eq!(schema.declare("", VariableType::String), Err(SchemaError::EmptyName));
    assert_eq!(schema, before);

    Ok(())
}

/// Test: Type changes keep the declaration in place
#[test]
fn test_set_type_in_place() -> Result<()> {
    let mut schema = VariablesSchema::new();
    schema.declare("a", VariableType::String)?;
    schema.declare("b", VariableType::String)?;

    schema.set_type("a", VariableType::Object)?;
    schema.remove("b")?;

    let variables: Vec<(&str, VariableType)> = schema.variables().collect();
    assert_eq!(variables, vec![("a", VariableType::Object)]);

    Ok(())
}

/// Test: Schemas round-trip the JSON-schema layout used by the template service
#[test]
fn test_schema_wire_format() -> Result<()> {
    let version: TemplateVersion = serde_json::from_value(json!({
        "id": "6f1c1a64-2a8e-4bfb-9f0e-3d6f5f8a2b10",
        "template_id": "0d3a8a43-58c6-4e55-9b43-8c1b7f0a9e21",
        "version": 2,
        "subject": "Hi {{ name }}",
        "body_html": "<p>{{ name }}</p>",
        "body_text": "{{ name }}",
        "variables_schema": {
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "total": { "type": "number" },
                "odd": { "type": "unknown" }
            }
        },
        "language": "en-US",
        "is_published": true,
        "created_at": "2025-01-01T00:00:00Z"
    }))?;

    let schema = &version.variables_schema;
    assert_eq!(version.version_number, 2);
    assert_eq!(schema.len(), 3);
    assert_eq!(schema.declared_type("total"), Some(VariableType::Number));
    assert_eq!(schema.declared_type("odd"), Some(VariableType::String));

    let encoded = serde_json::to_value(schema)?;
    assert_eq!(encoded["type"], json!("object"));
    assert_eq!(encoded["properties"]["name"], json!({ "type": "string" }));

    let empty: VariablesSchema = serde_json::from_value(json!({}))?;
    assert!(empty.is_empty());

    Ok(())
}

/// Test: Raw test values coerce only when they parse to the declared kind
#[test]
fn test_variable_type_coercion() {
    assert_eq!(VariableType::Number.coerce(" 2.5 "), json!(2.5));
    assert_eq!(VariableType::Number.coerce("true"), json!("true"));
    assert_eq!(VariableType::Boolean.coerce("false"), json!(false));
    assert_eq!(VariableType::Object.coerce(r#"{"a":1}"#), json!({ "a": 1 }));
    assert_eq!(VariableType::Array.coerce("[oops"), json!("[oops"));
    assert_eq!(VariableType::String.coerce("[1]"), json!("[1]"));
}
