#![deny(missing_docs)]

//! # OpenAPI Driver
//!
//! Issues the top-level resolution requests for an OpenAPI root document:
//! every `components/schemas` entry, then the inline request body, response and
//! parameter schemas of every operation, in document order.
//!
//! A failing artifact is reported and skipped; the rest of the run continues
//! against the same context, so shared references still de-duplicate.

use crate::error::{AppError, AppResult};
use crate::oas::context::ResolutionContext;
use crate::oas::generator::resolve_reference;
use crate::oas::ir::TypeIr;
use crate::oas::naming::{
    derive_operation_name, ComponentNaming, NamingPolicy, OperationArtifact, OperationNaming,
    SharedComponentNaming,
};
use crate::oas::reference::Reference;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::warn;

const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// What a top-level request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A `components/schemas` entry.
    Component(String),
    /// An inline schema attached to an operation.
    Operation {
        /// `operationId` or derived name.
        operation: String,
        /// Which part of the operation.
        artifact: OperationArtifact,
    },
}

/// The result of one successful top-level request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArtifact {
    /// Where the schema lives.
    pub location: Reference,
    /// What it was resolved for.
    pub kind: ArtifactKind,
    /// The resolved type, usually an `Identifier`.
    pub ty: TypeIr,
}

/// Outcome of a driver run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Artifacts resolved successfully, in request order.
    pub artifacts: Vec<ResolvedArtifact>,
    /// Artifacts that failed, with their error.
    pub failures: Vec<(Reference, AppError)>,
}

impl GenerationReport {
    /// Whether every request succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Looks up the artifact resolved at `location`.
    pub fn artifact(&self, location: &str) -> Option<&ResolvedArtifact> {
        self.artifacts
            .iter()
            .find(|a| a.location.canonical() == location)
    }

    fn record(&mut self, location: Reference, kind: ArtifactKind, result: AppResult<TypeIr>) {
        match result {
            Ok(ty) => self.artifacts.push(ResolvedArtifact { location, kind, ty }),
            Err(err) => {
                warn!(location = %location, error = %err, "skipping artifact");
                self.failures.push((location, err));
            }
        }
    }
}

/// Resolves every component schema and every operation artifact of the root
/// document.
pub fn generate_all(ctx: &mut ResolutionContext<'_>) -> GenerationReport {
    let mut report = GenerationReport::default();
    generate_components_into(ctx, &mut report);
    generate_operations_into(ctx, &mut report);
    report
}

/// Resolves every `components/schemas/*` entry of the root document with
/// component naming.
pub fn generate_components(ctx: &mut ResolutionContext<'_>) -> GenerationReport {
    let mut report = GenerationReport::default();
    generate_components_into(ctx, &mut report);
    report
}

/// Resolves the inline schemas of every operation under `paths`.
pub fn generate_operations(ctx: &mut ResolutionContext<'_>) -> GenerationReport {
    let mut report = GenerationReport::default();
    generate_operations_into(ctx, &mut report);
    report
}

fn generate_components_into(ctx: &mut ResolutionContext<'_>, report: &mut GenerationReport) {
    let root = Reference::root(ctx.root_document());
    let schemas_ref = root.child("components").child("schemas");
    let Some(schemas) = ctx
        .store()
        .resolve(&schemas_ref)
        .ok()
        .and_then(Value::as_object)
    else {
        return;
    };

    for name in schemas.keys() {
        let location = schemas_ref.child(name.as_str());
        let result = resolve_reference(ctx, &location, Some(Rc::new(ComponentNaming)));
        report.record(location, ArtifactKind::Component(name.clone()), result);
    }
}

fn generate_operations_into(ctx: &mut ResolutionContext<'_>, report: &mut GenerationReport) {
    let root = Reference::root(ctx.root_document());
    let paths_ref = root.child("paths");
    let Some(paths) = ctx
        .store()
        .resolve(&paths_ref)
        .ok()
        .and_then(Value::as_object)
    else {
        return;
    };

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let item_ref = paths_ref.child(path.as_str());
        for method in METHODS {
            let Some(operation) = item.get(method).and_then(Value::as_object) else {
                continue;
            };
            let op_ref = item_ref.child(method);
            let name = operation
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| derive_operation_name(method, path));
            let parameters = operation_parameters(ctx, (&item_ref, item), (&op_ref, operation));
            generate_operation(ctx, report, &name, operation, &op_ref, parameters);
        }
    }
}

fn generate_operation(
    ctx: &mut ResolutionContext<'_>,
    report: &mut GenerationReport,
    operation: &str,
    node: &Map<String, Value>,
    op_ref: &Reference,
    parameters: Vec<AppResult<Reference>>,
) {
    let mut requests: Vec<(OperationArtifact, AppResult<Reference>)> = Vec::new();

    for (index, parameter) in parameters.into_iter().enumerate() {
        let location = match parameter {
            Ok(parameter) => media_schema(ctx, parameter).transpose(),
            Err(err) => Some(Err(err)),
        };
        if let Some(location) = location {
            requests.push((OperationArtifact::Parameter(index), location));
        }
    }

    if node.contains_key("requestBody") {
        if let Some(location) = locate(ctx, op_ref.child("requestBody")).transpose() {
            requests.push((OperationArtifact::RequestBody, location));
        }
    }

    if let Some(responses) = node.get("responses").and_then(Value::as_object) {
        let base = op_ref.child("responses");
        for code in responses.keys() {
            if let Some(location) = locate(ctx, base.child(code.as_str())).transpose() {
                requests.push((OperationArtifact::Response(code.clone()), location));
            }
        }
    }

    let suffix = ctx.config().schema_suffix.clone();
    for (artifact, location) in requests {
        let kind = ArtifactKind::Operation {
            operation: operation.to_string(),
            artifact: artifact.clone(),
        };
        match location {
            Ok(location) => {
                let naming: Rc<dyn NamingPolicy> = if SharedComponentNaming::applies_to(&location) {
                    Rc::new(SharedComponentNaming::new(&suffix))
                } else {
                    Rc::new(OperationNaming::new(operation, artifact, &suffix))
                };
                let result = resolve_reference(ctx, &location, Some(naming));
                report.record(location, kind, result);
            }
            Err(err) => report.record(op_ref.clone(), kind, Err(err)),
        }
    }
}

/// Parameter objects that apply to an operation, in order: the path item's list,
/// with entries replaced in place by operation entries of the same `name` and
/// `in`, then the remaining operation entries.
fn operation_parameters(
    ctx: &ResolutionContext<'_>,
    path_item: (&Reference, &Map<String, Value>),
    operation: (&Reference, &Map<String, Value>),
) -> Vec<AppResult<Reference>> {
    let mut merged: Vec<(Option<(String, String)>, AppResult<Reference>)> = Vec::new();
    for (owner, node) in [path_item, operation] {
        let Some(params) = node.get("parameters").and_then(Value::as_array) else {
            continue;
        };
        let base = owner.child("parameters");
        for index in 0..params.len() {
            let Some(entry) = follow(ctx, base.child(index.to_string())).transpose() else {
                continue;
            };
            let key = entry.as_ref().ok().and_then(|p| parameter_key(ctx, p));
            let existing = key
                .as_ref()
                .and_then(|key| merged.iter().position(|(k, _)| k.as_ref() == Some(key)));
            match existing {
                Some(position) => merged[position] = (key, entry),
                None => merged.push((key, entry)),
            }
        }
    }
    merged.into_iter().map(|(_, entry)| entry).collect()
}

/// `(name, in)` of the parameter object at `location`.
fn parameter_key(ctx: &ResolutionContext<'_>, location: &Reference) -> Option<(String, String)> {
    let node = ctx.store().resolve(location).ok()?;
    let name = node.get("name").and_then(Value::as_str)?;
    let place = node.get("in").and_then(Value::as_str)?;
    Some((name.to_string(), place.to_string()))
}

/// Location of the schema carried by a parameter, body or response, if any.
fn locate(ctx: &ResolutionContext<'_>, owner: Reference) -> AppResult<Option<Reference>> {
    match follow(ctx, owner)? {
        Some(owner) => media_schema(ctx, owner),
        None => Ok(None),
    }
}

/// Follows `$ref` chains on non-schema objects (parameters, bodies, responses) and
/// returns the location of the concrete object, or `None` if nothing is there.
fn follow(ctx: &ResolutionContext<'_>, location: Reference) -> AppResult<Option<Reference>> {
    let store = ctx.store();
    let mut current = location;
    let mut seen = Vec::new();
    loop {
        let node = match store.resolve(&current) {
            Ok(node) => node,
            Err(AppError::UnresolvedReference(_)) if seen.is_empty() => return Ok(None),
            Err(err) => return Err(err),
        };
        let Some(raw) = node.get("$ref").and_then(Value::as_str) else {
            return Ok(Some(current));
        };
        if seen.contains(&current) {
            return Err(AppError::malformed(&current, "reference cycle between components"));
        }
        let next = Reference::parse(raw, current.document())?;
        seen.push(current);
        current = next;
    }
}

/// Location of the schema under `content`: preferred media types first, then the
/// first media type that declares one. Falls back to a direct `schema` key.
fn media_schema(ctx: &ResolutionContext<'_>, owner: Reference) -> AppResult<Option<Reference>> {
    let node = ctx.store().resolve(&owner)?;
    let Some(content) = node.get("content").and_then(Value::as_object) else {
        return Ok(node.get("schema").map(|_| owner.child("schema")));
    };
    let preferred = ctx
        .config()
        .preferred_media_types
        .iter()
        .find(|media| {
            content
                .get(media.as_str())
                .is_some_and(|m| m.get("schema").is_some())
        });
    let media = match preferred {
        Some(media) => Some(media.as_str()),
        None => content
            .iter()
            .find(|(_, m)| m.get("schema").is_some())
            .map(|(media, _)| media.as_str()),
    };
    Ok(media.map(|m| owner.child("content").child(m).child("schema")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::store::DocumentStore;

    const API: &str = r#"
openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
        - $ref: '#/components/parameters/Filter'
      responses:
        '200':
          description: ok
          content:
            text/plain:
              schema:
                type: string
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name:
                  type: string
      responses:
        '201':
          $ref: '#/components/responses/Created'
        default:
          description: error
components:
  parameters:
    Filter:
      name: filter
      in: query
      schema:
        type: object
        properties:
          tag:
            type: string
  responses:
    Created:
      description: created
      content:
        application/json:
          schema:
            $ref: '#/components/schemas/Pet'
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
    Id:
      type: string
"#;

    fn run() -> (GenerationReport, Vec<String>) {
        let mut store = DocumentStore::new();
        store.insert_yaml("api.yaml", API).unwrap();
        let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
        let report = generate_all(&mut ctx);
        let names = ctx.registry().models().map(|m| m.name.clone()).collect();
        (report, names)
    }

    #[test]
    fn test_generate_all_names() {
        let (report, names) = run();
        assert!(report.is_complete(), "{:?}", report.failures);
        assert_eq!(
            names,
            [
                "Pet",
                "FilterParameterSchema",
                "PostPetsRequestBodySchema"
            ]
        );
    }

    #[test]
    fn test_component_artifacts() {
        let (report, _) = run();
        let pet = report.artifact("api.yaml#/components/schemas/Pet").unwrap();
        assert_eq!(pet.ty, TypeIr::identifier("Pet", None));
        let id = report.artifact("api.yaml#/components/schemas/Id").unwrap();
        assert_eq!(id.ty, TypeIr::string());
    }

    #[test]
    fn test_operation_artifacts() {
        let (report, _) = run();
        let ok = report
            .artifact("api.yaml#/paths/~1pets/get/responses/200/content/application~1json/schema")
            .unwrap();
        assert_eq!(ok.ty, TypeIr::array(TypeIr::identifier("Pet", None)));

        let limit = report
            .artifact("api.yaml#/paths/~1pets/get/parameters/0/schema")
            .unwrap();
        assert_eq!(limit.ty, TypeIr::number());

        let created = report
            .artifact("api.yaml#/components/responses/Created/content/application~1json/schema")
            .unwrap();
        assert_eq!(created.ty, TypeIr::identifier("Pet", None));
        assert_eq!(
            created.kind,
            ArtifactKind::Operation {
                operation: "post_pets".into(),
                artifact: OperationArtifact::Response("201".into()),
            }
        );
        // `default` has no content and yields no request.
        assert_eq!(report.artifacts.len(), 2 + 5);
    }

    #[test]
    fn test_path_level_parameters_apply_to_every_operation() {
        let mut store = DocumentStore::new();
        store
            .insert_yaml(
                "api.yaml",
                r#"
paths:
  '/a/{id}':
    parameters:
      - name: id
        in: path
        required: true
        schema:
          type: object
          properties:
            raw:
              type: string
      - name: trace
        in: header
        schema:
          type: object
          properties:
            span:
              type: string
    get:
      operationId: getA
      responses: {}
    put:
      operationId: putA
      parameters:
        - name: trace
          in: header
          schema:
            type: string
        - name: dryRun
          in: query
          schema:
            type: boolean
      responses: {}
"#,
            )
            .unwrap();
        let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
        let report = generate_operations(&mut ctx);
        assert!(report.is_complete(), "{:?}", report.failures);

        let resolved: Vec<_> = report
            .artifacts
            .iter()
            .map(|a| match &a.kind {
                ArtifactKind::Operation {
                    operation,
                    artifact,
                } => (operation.as_str(), artifact.clone(), a.ty.clone()),
                ArtifactKind::Component(_) => unreachable!(),
            })
            .collect();
        assert_eq!(
            resolved,
            [
                (
                    "getA",
                    OperationArtifact::Parameter(0),
                    TypeIr::identifier("GetAParameter0Schema", None)
                ),
                (
                    "getA",
                    OperationArtifact::Parameter(1),
                    TypeIr::identifier("GetAParameter1Schema", None)
                ),
                (
                    "putA",
                    OperationArtifact::Parameter(0),
                    TypeIr::identifier("GetAParameter0Schema", None)
                ),
                ("putA", OperationArtifact::Parameter(1), TypeIr::string()),
                ("putA", OperationArtifact::Parameter(2), TypeIr::boolean()),
            ]
        );
        assert_eq!(ctx.registry().len(), 2);
    }

    #[test]
    fn test_shared_component_names_do_not_depend_on_operation_order() {
        let mut store = DocumentStore::new();
        store.insert_yaml("api.yaml", API).unwrap();
        let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
        let report = generate_operations(&mut ctx);
        let filter = report
            .artifact("api.yaml#/components/parameters/Filter/schema")
            .unwrap();
        assert_eq!(filter.ty, TypeIr::identifier("FilterParameterSchema", None));
    }

    #[test]
    fn test_failures_are_collected() {
        let mut store = DocumentStore::new();
        store
            .insert_yaml(
                "api.yaml",
                r#"
paths:
  /a:
    get:
      operationId: getA
      responses:
        '200':
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Missing'
components:
  schemas:
    Ok:
      type: object
      properties:
        x:
          type: string
"#,
            )
            .unwrap();
        let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
        let report = generate_all(&mut ctx);
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].1,
            AppError::UnresolvedReference(_)
        ));
        assert_eq!(ctx.registry().len(), 1);
    }
}
