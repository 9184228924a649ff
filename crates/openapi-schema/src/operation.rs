//! Operation -> tool compilation.
//!
//! One [`OperationCompiler::compile`] call turns one `(method, path, operation)` into a
//! [`ToolMethod`]:
//! - the input schema is one flat object: merged parameters first, then request body fields;
//! - the description is the summary (or description) plus the error responses;
//! - the return schema comes from the first of `200`, `201`, `202`, `204`.
//!
//! Both schemas are converted in local mode and carry their own minimal `$defs`.

use crate::closure::{compute_closure, select_defs};
use crate::context::ConversionContext;
use crate::convert::{ConversionMode, SchemaConverter};
use crate::diagnostics::Diagnostic;
use crate::document::{
    HttpMethod, Operation, Parameter, ParameterLocation, ReferenceOr, RequestBody,
    has_image_media_type, json_media_type, multipart_media_type,
};
use crate::resolver::{Resolution, VisitedPath};
use crate::schema::{Concrete, SchemaNode, SchemaType};
use crate::tool::{ToolMethod, ToolSchema};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Success codes considered for the return schema, in preference order.
const SUCCESS_CODES: [&str; 4] = ["200", "201", "202", "204"];

/// Argument holding a request body that is not a flat object.
const BODY_ARGUMENT: &str = "body";

/// Everything needed to compile one operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationTarget<'o> {
    pub method: HttpMethod,
    pub path: &'o str,
    pub operation: &'o Operation,
    /// Parameters declared on the enclosing path item.
    pub path_parameters: &'o [ReferenceOr<Parameter>],
}

#[derive(Default)]
struct Arguments {
    properties: IndexMap<String, SchemaNode>,
    required: Vec<String>,
}

pub struct OperationCompiler<'c, 'a> {
    ctx: &'c mut ConversionContext<'a>,
}

impl<'c, 'a> OperationCompiler<'c, 'a> {
    pub fn new(ctx: &'c mut ConversionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Compile one operation. Returns `None` (after reporting a diagnostic) when the operation
    /// has no `operationId`.
    pub fn compile(&mut self, target: &OperationTarget<'_>) -> Option<ToolMethod> {
        let Some(operation_id) = target
            .operation
            .operation_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        else {
            self.ctx.report(Diagnostic::MissingOperationId {
                method: target.method.to_string(),
                path: target.path.to_string(),
            });
            return None;
        };

        let name = self.ctx.reserve_name(operation_id);
        let mut dangling = BTreeSet::new();

        let input = self.input_schema(&name, target);
        let input_schema = self.attach_defs(&name, input, &mut dangling);
        let return_schema = self
            .return_schema(target.operation)
            .map(|schema| self.attach_defs(&name, schema, &mut dangling));
        let description = self.description(target.operation);

        Some(ToolMethod::new(name, description, input_schema, return_schema))
    }

    fn input_schema(&mut self, tool: &str, target: &OperationTarget<'_>) -> SchemaNode {
        let mut args = Arguments::default();

        for param in self.merge_parameters(target) {
            let mut schema = match &param.schema {
                Some(schema) => self.convert_local(schema),
                None => SchemaNode::of_type("string"),
            };
            if let Some(desc) = param.description.as_deref().filter(|d| !d.is_empty()) {
                schema.set_description(desc);
            }
            let required = param.required || param.location == ParameterLocation::Path;
            self.insert_argument(tool, &mut args, param.name, schema, required);
        }

        if let Some(body) = &target.operation.request_body {
            self.body_arguments(tool, target, body, &mut args);
        }

        SchemaNode::Concrete(Box::new(Concrete {
            schema_type: Some(SchemaType::Single("object".to_string())),
            properties: Some(args.properties),
            required: args.required,
            ..Concrete::default()
        }))
    }

    /// Path-item parameters followed by operation parameters; an operation parameter with the
    /// same `(in, name)` replaces the path-item one in place.
    fn merge_parameters(&mut self, target: &OperationTarget<'_>) -> Vec<Parameter> {
        let resolver = self.ctx.resolver();
        let mut merged: Vec<Parameter> = Vec::new();
        let mut index: HashMap<(ParameterLocation, String), usize> = HashMap::new();

        for item in target
            .path_parameters
            .iter()
            .chain(&target.operation.parameters)
        {
            let param = match resolver.resolve_item(item, "parameter") {
                Ok(param) => param,
                Err(diagnostic) => {
                    self.ctx.report(diagnostic);
                    continue;
                }
            };
            let key = (param.location, param.name.clone());
            if let Some(&i) = index.get(&key) {
                merged[i] = param;
            } else {
                index.insert(key, merged.len());
                merged.push(param);
            }
        }

        merged
    }

    fn body_arguments(
        &mut self,
        tool: &str,
        target: &OperationTarget<'_>,
        body: &ReferenceOr<RequestBody>,
        args: &mut Arguments,
    ) {
        let body = match self.ctx.resolver().resolve_item(body, "request body") {
            Ok(body) => body,
            Err(diagnostic) => {
                self.ctx.report(diagnostic);
                return;
            }
        };

        let Some(media) =
            multipart_media_type(&body.content).or_else(|| json_media_type(&body.content))
        else {
            if !body.content.is_empty() {
                let types: Vec<&str> = body.content.keys().map(String::as_str).collect();
                self.report_unsupported_body(target, types.join(", "));
            }
            return;
        };
        let Some(schema) = &media.schema else {
            self.report_unsupported_body(target, "media type has no schema".to_string());
            return;
        };

        match self.dereference(schema) {
            Some(object) if object.is_flat_object() => {
                let SchemaNode::Concrete(converted) = self.convert_local(&object) else {
                    return;
                };
                let Concrete {
                    properties,
                    required,
                    ..
                } = *converted;
                for (name, property) in properties.unwrap_or_default() {
                    let is_required = required.contains(&name);
                    self.insert_argument(tool, args, name, property, is_required);
                }
            }
            _ => {
                let mut converted = self.convert_local(schema);
                if converted.description().is_none()
                    && let Some(desc) = body.description.as_deref().filter(|d| !d.is_empty())
                {
                    converted.set_description(desc);
                }
                self.insert_argument(tool, args, BODY_ARGUMENT.to_string(), converted, true);
            }
        }
    }

    fn insert_argument(
        &mut self,
        tool: &str,
        args: &mut Arguments,
        name: String,
        schema: SchemaNode,
        required: bool,
    ) {
        if args.properties.contains_key(&name) {
            self.ctx.report(Diagnostic::ParameterCollision {
                tool: tool.to_string(),
                name,
            });
            return;
        }
        if required {
            args.required.push(name.clone());
        }
        args.properties.insert(name, schema);
    }

    fn report_unsupported_body(&mut self, target: &OperationTarget<'_>, detail: String) {
        self.ctx.report(Diagnostic::UnsupportedBody {
            method: target.method.to_string(),
            path: target.path.to_string(),
            detail,
        });
    }

    fn description(&mut self, operation: &Operation) -> String {
        let base = [&operation.summary, &operation.description]
            .into_iter()
            .find_map(|text| text.as_deref().filter(|t| !t.trim().is_empty()))
            .unwrap_or_default();

        let resolver = self.ctx.resolver();
        let mut errors = Vec::new();
        for (code, response) in &operation.responses {
            if !(code.starts_with('4') || code.starts_with('5')) {
                continue;
            }
            match resolver.resolve_item(response, "error response") {
                Ok(response) => errors.push(format!("{code}: {}", response.description)),
                Err(diagnostic) => self.ctx.report(diagnostic),
            }
        }

        let mut text = base.to_string();
        if !errors.is_empty() {
            text.push_str("\nError Responses:\n");
            text.push_str(&errors.join("\n"));
        }

        let config = self.ctx.config();
        match config.branding_label(self.ctx.document().title()) {
            Some(label) if text.is_empty() => label.to_string(),
            Some(label) => format!("{label} | {text}"),
            None => text,
        }
    }

    fn return_schema(&mut self, operation: &Operation) -> Option<SchemaNode> {
        let item = SUCCESS_CODES
            .iter()
            .find_map(|code| operation.responses.get(*code))?;
        let response = match self.ctx.resolver().resolve_item(item, "success response") {
            Ok(response) => response,
            Err(diagnostic) => {
                self.ctx.report(diagnostic);
                return None;
            }
        };

        if let Some(schema) = json_media_type(&response.content).and_then(|m| m.schema.as_ref()) {
            return Some(self.convert_local(schema));
        }

        let format = has_image_media_type(&response.content).then(|| "binary".to_string());
        let description = Some(response.description).filter(|d| !d.is_empty());
        Some(SchemaNode::Concrete(Box::new(Concrete {
            schema_type: Some(SchemaType::Single("string".to_string())),
            format,
            description,
            ..Concrete::default()
        })))
    }

    /// Follow a top-level `$ref` chain to the concrete schema it names.
    fn dereference(&self, schema: &SchemaNode) -> Option<SchemaNode> {
        let resolver = self.ctx.resolver();
        let mut seen = VisitedPath::new();
        let mut current = schema.clone();
        loop {
            match current {
                SchemaNode::Concrete(_) => return Some(current),
                SchemaNode::Reference(reference) => {
                    match resolver.resolve(&reference.pointer, &mut seen) {
                        Resolution::Found(target) => current = SchemaNode::from_value(target),
                        Resolution::Cycle | Resolution::Missing => return None,
                    }
                }
            }
        }
    }

    fn convert_local(&mut self, schema: &SchemaNode) -> SchemaNode {
        SchemaConverter::new(&mut *self.ctx).convert(
            schema,
            &mut VisitedPath::new(),
            ConversionMode::Local,
        )
    }

    /// Wrap `schema` with its minimal `$defs`, reporting each dangling name once per tool.
    fn attach_defs(
        &mut self,
        tool: &str,
        schema: SchemaNode,
        dangling: &mut BTreeSet<String>,
    ) -> ToolSchema {
        let components = self.ctx.components();
        let closure = compute_closure(&schema, components);
        let defs = select_defs(&closure, components);
        let missing: Vec<String> = closure
            .into_iter()
            .filter(|name| !components.contains_key(name))
            .collect();

        for name in missing {
            if dangling.insert(name.clone()) {
                self.ctx.report(Diagnostic::DanglingDefinition {
                    tool: tool.to_string(),
                    name,
                });
            }
        }

        ToolSchema { schema, defs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::document::{SchemaDocument, path_item_parameters};
    use serde_json::{Value, json};

    fn compile_with(
        doc: &SchemaDocument,
        config: &ConverterConfig,
        method: HttpMethod,
        path: &str,
    ) -> (Option<ToolMethod>, Vec<Diagnostic>) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let tool = {
            let mut ctx = ConversionContext::new(doc, config, &mut sink);
            SchemaConverter::new(&mut ctx).build_component_table();

            let (_, item) = doc.paths().find(|(p, _)| *p == path).unwrap();
            let operation: Operation =
                serde_json::from_value(item[method.as_str()].clone()).unwrap();
            let path_parameters = path_item_parameters(item);
            OperationCompiler::new(&mut ctx).compile(&OperationTarget {
                method,
                path,
                operation: &operation,
                path_parameters: &path_parameters,
            })
        };
        (tool, sink)
    }

    fn compile(
        doc: &str,
        method: HttpMethod,
        path: &str,
    ) -> (Option<ToolMethod>, Vec<Diagnostic>) {
        let doc = SchemaDocument::from_yaml_str(doc).unwrap();
        compile_with(&doc, &ConverterConfig::default(), method, path)
    }

    fn input(tool: &ToolMethod) -> Value {
        tool.input_schema().to_value()
    }

    fn output(tool: &ToolMethod) -> Option<Value> {
        tool.return_schema().map(ToolSchema::to_value)
    }

    #[test]
    fn compiles_get_page_example() {
        let (tool, diags) = compile(
            r#"
openapi: "3.1.0"
info: { title: Pages, version: "1" }
paths:
  /pages/{id}:
    get:
      operationId: getPage
      parameters:
        - name: id
          in: path
          required: true
          schema: { type: string }
      responses:
        "200":
          description: The page
          content:
            application/json:
              schema:
                type: object
                properties:
                  title: { type: string }
"#,
            HttpMethod::Get,
            "/pages/{id}",
        );
        let tool = tool.unwrap();
        assert!(diags.is_empty());
        assert_eq!(tool.name(), "getPage");
        assert_eq!(tool.description(), "");
        assert_eq!(
            input(&tool),
            json!({
                "type": "object",
                "properties": { "id": { "type": "string" } },
                "required": ["id"]
            })
        );
        assert_eq!(
            output(&tool),
            Some(json!({ "type": "object", "properties": { "title": { "type": "string" } } }))
        );
    }

    #[test]
    fn merges_path_item_parameters_and_overrides() {
        let (tool, _) = compile(
            r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /items/{id}:
    parameters:
      - name: id
        in: path
        schema: { type: integer }
      - $ref: "#/components/parameters/Limit"
    get:
      operationId: getItem
      parameters:
        - name: limit
          in: query
          description: Max results
          schema: { type: integer, description: ignored }
        - name: filter
          in: query
          content:
            application/json: {}
        - name: X-Trace
          in: header
          required: true
          schema: { type: string, format: uuid }
      responses: {}
components:
  parameters:
    Limit:
      name: limit
      in: query
      schema: { type: string }
"##,
            HttpMethod::Get,
            "/items/{id}",
        );
        assert_eq!(
            input(&tool.unwrap()),
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer" },
                    "limit": { "type": "integer", "description": "Max results" },
                    "filter": { "type": "string" },
                    "X-Trace": { "type": "string" }
                },
                "required": ["id", "X-Trace"]
            })
        );
    }

    #[test]
    fn flattens_object_bodies_through_refs() {
        let (tool, diags) = compile(
            r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /pages:
    post:
      operationId: createPage
      requestBody:
        $ref: "#/components/requestBodies/NewPage"
      responses: {}
components:
  requestBodies:
    NewPage:
      required: true
      content:
        application/json:
          schema: { $ref: "#/components/schemas/NewPage" }
  schemas:
    NewPage:
      type: object
      required: [title]
      properties:
        title: { type: string }
        parent: { $ref: "#/components/schemas/Parent" }
    Parent:
      type: object
      properties:
        id: { type: string }
"##,
            HttpMethod::Post,
            "/pages",
        );
        assert!(diags.is_empty());
        assert_eq!(
            input(&tool.unwrap()),
            json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "parent": { "$ref": "#/$defs/Parent" }
                },
                "required": ["title"],
                "$defs": {
                    "Parent": { "type": "object", "properties": { "id": { "type": "string" } } }
                }
            })
        );
    }

    #[test]
    fn nests_non_object_bodies_under_body() {
        let (tool, _) = compile(
            r#"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /tags:
    put:
      operationId: setTags
      requestBody:
        description: All tags
        content:
          application/json:
            schema: { type: array, items: { type: string } }
      responses: {}
"#,
            HttpMethod::Put,
            "/tags",
        );
        assert_eq!(
            input(&tool.unwrap()),
            json!({
                "type": "object",
                "properties": {
                    "body": {
                        "type": "array",
                        "description": "All tags",
                        "items": { "type": "string" }
                    }
                },
                "required": ["body"]
            })
        );
    }

    #[test]
    fn multipart_wins_over_json_and_files_become_paths() {
        let (tool, _) = compile(
            r#"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /upload:
    post:
      operationId: upload
      requestBody:
        content:
          application/json:
            schema: { type: object, properties: { url: { type: string } } }
          multipart/form-data:
            schema:
              type: object
              required: [file]
              properties:
                file: { type: string, format: binary }
      responses: {}
"#,
            HttpMethod::Post,
            "/upload",
        );
        assert_eq!(
            input(&tool.unwrap()),
            json!({
                "type": "object",
                "properties": {
                    "file": {
                        "type": "string",
                        "format": "uri-reference",
                        "description": "absolute paths to local files"
                    }
                },
                "required": ["file"]
            })
        );
    }

    #[test]
    fn unsupported_body_and_collisions_are_diagnostics() {
        let doc = SchemaDocument::from_yaml_str(
            r#"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /raw/{id}:
    parameters:
      - { name: id, in: path, schema: { type: string } }
    post:
      operationId: postRaw
      requestBody:
        content:
          text/plain: {}
      responses: {}
    put:
      operationId: putRaw
      requestBody:
        content:
          application/json:
            schema: { type: object, properties: { id: { type: integer } } }
      responses: {}
"#,
        )
        .unwrap();
        let config = ConverterConfig::default();

        let (tool, diags) = compile_with(&doc, &config, HttpMethod::Post, "/raw/{id}");
        assert!(tool.is_some());
        assert_eq!(
            diags,
            vec![Diagnostic::UnsupportedBody {
                method: "POST".to_string(),
                path: "/raw/{id}".to_string(),
                detail: "text/plain".to_string(),
            }]
        );

        let (tool, diags) = compile_with(&doc, &config, HttpMethod::Put, "/raw/{id}");
        assert_eq!(
            input(&tool.unwrap())["properties"]["id"],
            json!({"type": "string"})
        );
        assert_eq!(
            diags,
            vec![Diagnostic::ParameterCollision {
                tool: "putRaw".to_string(),
                name: "id".to_string(),
            }]
        );
    }

    #[test]
    fn missing_operation_id_is_skipped() {
        let (tool, diags) = compile(
            r#"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /anon:
    delete:
      responses: {}
"#,
            HttpMethod::Delete,
            "/anon",
        );
        assert!(tool.is_none());
        assert_eq!(
            diags,
            vec![Diagnostic::MissingOperationId {
                method: "DELETE".to_string(),
                path: "/anon".to_string(),
            }]
        );
    }

    #[test]
    fn description_appends_error_responses_and_branding() {
        let text = r##"
openapi: "3.0.3"
info: { title: Notion API, version: "1" }
paths:
  /pages:
    get:
      operationId: listPages
      summary: List pages
      description: Not used when a summary exists
      responses:
        "200": { description: ok }
        "400": { description: Bad request }
        "404": { $ref: "#/components/responses/NotFound" }
        "500": { $ref: "#/components/responses/Gone" }
components:
  responses:
    NotFound: { description: Not found }
"##;
        let doc = SchemaDocument::from_yaml_str(text).unwrap();

        let (tool, diags) =
            compile_with(&doc, &ConverterConfig::default(), HttpMethod::Get, "/pages");
        assert_eq!(
            tool.unwrap().description(),
            "Notion | List pages\nError Responses:\n400: Bad request\n404: Not found"
        );
        assert!(matches!(
            diags.as_slice(),
            [Diagnostic::UnresolvedReference { pointer, .. }] if pointer == "#/components/responses/Gone"
        ));

        let unbranded = ConverterConfig {
            branding: Vec::new(),
            ..ConverterConfig::default()
        };
        let (tool, _) = compile_with(&doc, &unbranded, HttpMethod::Get, "/pages");
        assert!(tool.unwrap().description().starts_with("List pages\n"));
    }

    #[test]
    fn return_schema_fallbacks() {
        let text = r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /created:
    post:
      operationId: create
      responses:
        "202": { description: later }
        "201":
          description: made
          content:
            application/json:
              schema: { $ref: "#/components/schemas/Thing" }
  /image:
    get:
      operationId: image
      responses:
        "200":
          description: A PNG
          content:
            image/png: {}
  /text:
    get:
      operationId: text
      responses:
        "204": { description: "" }
  /none:
    get:
      operationId: none
      responses:
        "302": { description: moved }
components:
  schemas:
    Thing: { type: object, properties: { id: { type: string } } }
"##;
        let doc = SchemaDocument::from_yaml_str(text).unwrap();
        let config = ConverterConfig::default();

        let (tool, _) = compile_with(&doc, &config, HttpMethod::Post, "/created");
        assert_eq!(
            output(&tool.unwrap()),
            Some(json!({
                "$ref": "#/$defs/Thing",
                "$defs": { "Thing": { "type": "object", "properties": { "id": { "type": "string" } } } }
            }))
        );

        let (tool, _) = compile_with(&doc, &config, HttpMethod::Get, "/image");
        assert_eq!(
            output(&tool.unwrap()),
            Some(json!({ "type": "string", "format": "binary", "description": "A PNG" }))
        );

        let (tool, _) = compile_with(&doc, &config, HttpMethod::Get, "/text");
        assert_eq!(output(&tool.unwrap()), Some(json!({ "type": "string" })));

        let (tool, _) = compile_with(&doc, &config, HttpMethod::Get, "/none");
        assert_eq!(output(&tool.unwrap()), None);
    }

    #[test]
    fn dangling_definitions_are_reported_once_per_tool() {
        let (tool, diags) = compile(
            r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /ghost:
    post:
      operationId: ghost
      requestBody:
        content:
          application/json:
            schema: { type: array, items: { $ref: "#/components/schemas/Ghost" } }
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: "#/components/schemas/Ghost" }
"##,
            HttpMethod::Post,
            "/ghost",
        );
        let tool = tool.unwrap();
        assert_eq!(tool.input_schema().defs, None);
        assert_eq!(
            diags,
            vec![Diagnostic::DanglingDefinition {
                tool: "ghost".to_string(),
                name: "Ghost".to_string(),
            }]
        );
    }
}
