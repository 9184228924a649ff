use anyhow::Context as _;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use unrelated_openapi_schema::naming::MAX_TOOL_NAME_LEN;
use unrelated_openapi_schema::{
    ConverterConfig, Diagnostic, SchemaDocument, ToolSet, ToolSetBuilder,
};

const LONG_A: &str =
    "retrieveTheCompleteListOfAllDatabaseEntriesThatMatchTheGivenFilterAndSortCriteri";
const LONG_B: &str =
    "retrieveTheCompleteListOfAllDatabaseEntriesThatMatchTheGivenFilterAndSortSetting";

fn document() -> anyhow::Result<SchemaDocument> {
    let text = format!(
        r##"
openapi: "3.1.0"
info: {{ title: Notion API, version: "2022-06-28" }}
paths:
  /pages/{{id}}:
    parameters:
      - {{ name: id, in: path, schema: {{ type: string }} }}
    get:
      operationId: getPage
      summary: Retrieve a page
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {{ $ref: "#/components/schemas/Page" }}
        "404": {{ description: Not found }}
    patch:
      operationId: updatePage
      requestBody:
        content:
          application/json:
            schema: {{ $ref: "#/components/schemas/PageUpdate" }}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {{ $ref: "#/components/schemas/Page" }}
  /blocks/{{id}}/children:
    get:
      operationId: listBlockChildren
      parameters:
        - {{ name: id, in: path, schema: {{ type: string }} }}
        - {{ name: page_size, in: query, schema: {{ type: integer, format: int32 }} }}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  results: {{ type: array, items: {{ $ref: "#/components/schemas/Block" }} }}
  /files:
    post:
      operationId: uploadFile
      requestBody:
        content:
          multipart/form-data:
            schema:
              type: object
              properties:
                file: {{ type: string, format: binary, description: File to upload }}
      responses:
        "201":
          description: created
          content:
            image/png: {{}}
  /databases/query:
    post:
      operationId: {LONG_A}
      responses: {{}}
    put:
      operationId: {LONG_B}
      responses: {{}}
  /anonymous:
    get:
      responses: {{}}
components:
  schemas:
    Page:
      type: object
      properties:
        id: {{ type: string }}
        parent: {{ $ref: "#/components/schemas/Parent" }}
        properties:
          type: object
          additionalProperties: {{ $ref: "#/components/schemas/PropertyValue" }}
    PageUpdate:
      type: object
      properties:
        archived: {{ type: boolean }}
        icon: {{ $ref: "#/components/schemas/Icon" }}
    Parent:
      oneOf:
        - {{ $ref: "#/components/schemas/PageParent" }}
        - {{ type: object, properties: {{ workspace: {{ type: boolean }} }} }}
    PageParent:
      type: object
      properties:
        page_id: {{ type: string }}
    PropertyValue:
      type: object
      additionalProperties: true
      properties:
        range:
          type: array
          items: [{{ type: number }}, {{ $ref: "#/components/schemas/Icon" }}]
    Icon:
      type: object
      additionalProperties: false
      properties:
        emoji: {{ type: string }}
    Block:
      type: object
      properties:
        children: {{ type: array, items: {{ $ref: "#/components/schemas/Block" }} }}
        owner: {{ $ref: "#/components/schemas/User" }}
    User:
      type: object
      properties:
        pinned: {{ $ref: "#/components/schemas/Block" }}
"##
    );
    SchemaDocument::from_yaml_str(&text).context("parse fixture document")
}

fn build(doc: &SchemaDocument) -> (ToolSet, Vec<Diagnostic>) {
    let config = ConverterConfig::default();
    let mut sink: Vec<Diagnostic> = Vec::new();
    let set = ToolSetBuilder::new(doc, &config).build(&mut sink);
    (set, sink)
}

fn schema_values(set: &ToolSet) -> Vec<Value> {
    set.tools()
        .flat_map(|tool| {
            std::iter::once(tool.input_schema().to_value())
                .chain(tool.return_schema().map(|s| s.to_value()))
        })
        .collect()
}

fn local_refs(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(name) = obj
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|p| p.strip_prefix("#/$defs/"))
            {
                out.insert(name.to_string());
            }
            for (key, child) in obj {
                if key != "$defs" {
                    local_refs(child, out);
                }
            }
        }
        Value::Array(list) => list.iter().for_each(|v| local_refs(v, out)),
        _ => {}
    }
}

#[test]
fn conversion_is_deterministic() -> anyhow::Result<()> {
    let doc = document()?;
    let (first, first_diags) = build(&doc);
    let (second, second_diags) = build(&doc);

    assert_eq!(
        serde_json::to_string(&first.registry())?,
        serde_json::to_string(&second.registry())?
    );
    assert_eq!(
        serde_json::to_string(&first.function_tools())?,
        serde_json::to_string(&second.function_tools())?
    );
    assert_eq!(first_diags, second_diags);
    Ok(())
}

#[test]
fn every_local_pointer_resolves_and_every_def_is_reachable() -> anyhow::Result<()> {
    let doc = document()?;
    let (set, _) = build(&doc);

    for schema in schema_values(&set) {
        let defs = schema
            .get("$defs")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if schema.get("$defs").is_some() {
            assert!(!defs.is_empty(), "empty $defs attached: {schema}");
        }

        // Walk the reachable set from the root, following definitions.
        let mut reachable = BTreeSet::new();
        local_refs(&schema, &mut reachable);
        let mut frontier: Vec<String> = reachable.iter().cloned().collect();
        while let Some(name) = frontier.pop() {
            let body = defs
                .get(&name)
                .with_context(|| format!("pointer to '{name}' has no definition in {schema}"))?;
            let mut found = BTreeSet::new();
            local_refs(body, &mut found);
            for next in found {
                if reachable.insert(next.clone()) {
                    frontier.push(next);
                }
            }
        }

        let keys: BTreeSet<String> = defs.keys().cloned().collect();
        assert_eq!(keys, reachable, "defs are not minimal in {schema}");
    }
    Ok(())
}

#[test]
fn names_are_bounded_and_unique() -> anyhow::Result<()> {
    let doc = document()?;
    let (set, _) = build(&doc);

    let names: Vec<&str> = set.tools().map(|t| t.name()).collect();
    let unique: BTreeSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());
    assert!(names.iter().all(|n| n.chars().count() <= MAX_TOOL_NAME_LEN));

    assert_eq!(LONG_A.len(), 80);
    assert!(names.contains(&format!("{}-0001", &LONG_A[..59]).as_str()));
    assert!(names.contains(&format!("{}-0002", &LONG_B[..59]).as_str()));
    Ok(())
}

#[test]
fn recursive_components_terminate_with_local_pointers() -> anyhow::Result<()> {
    let doc = document()?;
    let (set, diags) = build(&doc);

    let tool = set
        .function_tools()
        .into_iter()
        .find(|t| t.name == "listBlockChildren")
        .context("listBlockChildren compiled")?;
    assert_eq!(
        tool.parameters,
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "page_size": { "type": "integer" }
            },
            "required": ["id"]
        })
    );

    let registry = set.registry();
    let block_tool = &registry.pairing["API-listBlockChildren"].tool;
    let output = block_tool
        .return_schema()
        .context("return schema")?
        .to_value();
    let defs = output["$defs"].as_object().context("$defs")?;
    let keys: Vec<&str> = defs.keys().map(String::as_str).collect();
    assert_eq!(keys, ["Block", "User"]);

    // Only the missing operationId is worth a diagnostic; cycles are not errors.
    let kinds: Vec<&str> = diags.iter().map(Diagnostic::kind).collect();
    assert_eq!(kinds, ["missing_operation_id"]);
    Ok(())
}

#[test]
fn descriptions_and_file_uploads() -> anyhow::Result<()> {
    let doc = document()?;
    let (set, _) = build(&doc);
    let tools = set.tool_use_tools();

    let get_page = tools
        .iter()
        .find(|t| t.name == "getPage")
        .context("getPage")?;
    assert_eq!(
        get_page.description,
        "Notion | Retrieve a page\nError Responses:\n404: Not found"
    );

    let upload = tools
        .iter()
        .find(|t| t.name == "uploadFile")
        .context("uploadFile")?;
    assert_eq!(
        upload.input_schema["properties"]["file"],
        json!({
            "type": "string",
            "format": "uri-reference",
            "description": "File to upload (absolute paths to local files)"
        })
    );
    Ok(())
}

#[test]
fn densely_connected_components_convert_quickly() -> anyhow::Result<()> {
    const N: usize = 16;
    let schemas: serde_json::Map<String, Value> = (0..N)
        .map(|i| {
            let properties: serde_json::Map<String, Value> = (0..N)
                .filter(|&j| j != i)
                .map(|j| {
                    let pointer = format!("#/components/schemas/C{j}");
                    (format!("c{j}"), json!({ "$ref": pointer }))
                })
                .collect();
            (format!("C{i}"), json!({ "type": "object", "properties": properties }))
        })
        .collect();
    let doc = SchemaDocument::from_value(json!({
        "openapi": "3.1.0",
        "info": { "title": "Graph", "version": "1" },
        "paths": {
            "/nodes/first": {
                "get": {
                    "operationId": "getFirst",
                    "responses": { "200": { "description": "ok", "content": {
                        "application/json": { "schema": { "$ref": "#/components/schemas/C0" } }
                    } } }
                }
            }
        },
        "components": { "schemas": schemas }
    }))
    .context("parse graph document")?;

    let started = std::time::Instant::now();
    let (set, diags) = build(&doc);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert!(diags.is_empty(), "{diags:?}");

    let tool = set.tools().next().context("getFirst compiled")?;
    let output = tool.return_schema().context("return schema")?.to_value();
    let defs = output["$defs"].as_object().context("$defs")?;
    assert_eq!(defs.len(), N);
    for (name, body) in defs {
        let mut refs = BTreeSet::new();
        local_refs(body, &mut refs);
        assert_eq!(refs.len(), N - 1, "{name} should point at each neighbour once");
        assert!(!refs.contains(name));
        assert_eq!(body.to_string().matches("$ref").count(), N - 1);
    }
    Ok(())
}
