use cdd_typemodel::{
    generate_all, resolve_schema, AppError, ComponentNaming, DocumentStore, EngineConfig, Field,
    ModelDump, OperationArtifact, OperationNaming, ResolutionContext, TypeIr,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

const API: &str = r#"
openapi: 3.1.0
info:
  title: Shop
  version: "1.0"
paths:
  /orders:
    post:
      operationId: createOrder
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [items]
              properties:
                items:
                  type: array
                  items:
                    $ref: '#/components/schemas/Item'
      responses:
        '201':
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Order'
components:
  schemas:
    Order:
      type: object
      required: [id, items]
      properties:
        id:
          type: string
        placedAt:
          type: string
          format: date-time
        total:
          $ref: 'common/types.yaml#/Money'
        items:
          type: array
          items:
            $ref: '#/components/schemas/Item'
        note:
          $ref: '#/components/schemas/Note'
    Item:
      type: object
      properties:
        sku:
          type: string
        price:
          $ref: 'common/types.yaml#/Money'
    Note:
      type: string
      nullable: true
    Status:
      type: string
      enum: [open, closed]
    MaybeItem:
      nullable: true
      allOf:
        - $ref: '#/components/schemas/Item'
"#;

const TYPES: &str = r##"
Money:
  type: object
  required: [amount]
  properties:
    amount:
      type: number
    currency:
      $ref: '#/Currency'
Currency:
  type: object
  properties:
    code:
      type: string
"##;

fn store() -> DocumentStore {
    let mut store = DocumentStore::new();
    store.insert_yaml("api.yaml", API).unwrap();
    store.insert_yaml("common/types.yaml", TYPES).unwrap();
    store
}

fn full_run(store: &DocumentStore) -> ModelDump {
    let mut ctx = ResolutionContext::new(store, "api.yaml").unwrap();
    let report = generate_all(&mut ctx);
    assert!(report.is_complete(), "{:?}", report.failures);
    ctx.finish()
}

fn external(name: &str) -> TypeIr {
    TypeIr::identifier(name, Some("external/common_types".to_string()))
}

#[test]
fn test_repeated_requests_emit_one_declaration() {
    let store = store();
    let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
    let first = resolve_schema(&mut ctx, "#/components/schemas/Item", ComponentNaming).unwrap();
    let models = ctx.registry().len();
    for _ in 0..5 {
        let again = resolve_schema(&mut ctx, "#/components/schemas/Item", ComponentNaming).unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(ctx.registry().len(), models);
}

#[test]
fn test_runs_are_deterministic() {
    let store = store();
    let first = full_run(&store);
    let second = full_run(&store);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_full_run_declarations() {
    let store = store();
    let dump = full_run(&store);
    let names: Vec<_> = dump
        .models
        .values()
        .map(|m| (m.name.as_str(), m.import_path.as_deref()))
        .collect();
    assert_eq!(
        names,
        [
            ("Currency", Some("external/common_types")),
            ("Money", Some("external/common_types")),
            ("Item", None),
            ("Order", None),
            ("CreateOrderRequestBodySchema", None),
        ]
    );
    // Primitive and enum targets never become declarations.
    assert!(dump.models.get("api.yaml#/components/schemas/Note").is_none());
    assert!(dump.models.get("api.yaml#/components/schemas/Status").is_none());
    assert!(dump.models.get("api.yaml#/components/schemas/MaybeItem").is_none());
}

#[test]
fn test_shared_reference_from_two_sites_has_one_name() {
    let store = store();
    let dump = full_run(&store);
    let order = &dump.models["api.yaml#/components/schemas/Order"];
    let item = &dump.models["api.yaml#/components/schemas/Item"];
    let TypeIr::Record(order_fields) = &order.declaration else {
        panic!("Order should be a record");
    };
    let TypeIr::Record(item_fields) = &item.declaration else {
        panic!("Item should be a record");
    };
    let total = order_fields.iter().find(|f| f.name == "total").unwrap();
    let price = item_fields.iter().find(|f| f.name == "price").unwrap();
    assert_eq!(total.ty, external("Money"));
    assert_eq!(price.ty, external("Money"));
    let money_count = dump.models.values().filter(|m| m.name == "Money").count();
    assert_eq!(money_count, 1);
}

#[test]
fn test_required_fields_and_order() {
    let store = store();
    let dump = full_run(&store);
    let order = &dump.models["api.yaml#/components/schemas/Order"];
    assert_eq!(
        order.declaration,
        TypeIr::Record(vec![
            Field {
                name: "id".into(),
                ty: TypeIr::string(),
                optional: false,
            },
            Field {
                name: "placedAt".into(),
                ty: TypeIr::Opaque {
                    display_name: "Date".into(),
                    backing_name: "DateString".into(),
                },
                optional: true,
            },
            Field {
                name: "total".into(),
                ty: external("Money"),
                optional: true,
            },
            Field {
                name: "items".into(),
                ty: TypeIr::array(TypeIr::identifier("Item", None)),
                optional: false,
            },
            Field {
                name: "note".into(),
                ty: TypeIr::union(vec![TypeIr::string(), TypeIr::null()]),
                optional: true,
            },
        ])
    );
}

#[test]
fn test_relative_references_follow_current_document() {
    let store = store();
    let dump = full_run(&store);
    let money = &dump.models["common/types.yaml#/Money"];
    assert_eq!(
        money.declaration,
        TypeIr::Record(vec![
            Field {
                name: "amount".into(),
                ty: TypeIr::number(),
                optional: false,
            },
            Field {
                name: "currency".into(),
                ty: external("Currency"),
                optional: true,
            },
        ])
    );
}

#[test]
fn test_context_returns_to_root_after_external_reference() {
    let store = store();
    let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
    resolve_schema(&mut ctx, "common/types.yaml#/Money", ComponentNaming).unwrap();
    assert_eq!(ctx.current_document(), "api.yaml");
    // `#/...` must resolve against api.yaml again.
    let item = resolve_schema(&mut ctx, "#/components/schemas/Item", ComponentNaming).unwrap();
    assert_eq!(item, TypeIr::identifier("Item", None));
}

#[test]
fn test_enum_and_nullable_targets_are_inline() {
    let store = store();
    let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
    let status = resolve_schema(&mut ctx, "#/components/schemas/Status", ComponentNaming).unwrap();
    assert_eq!(
        status,
        TypeIr::union(vec![
            TypeIr::string_literal("open"),
            TypeIr::string_literal("closed"),
        ])
    );
    let maybe =
        resolve_schema(&mut ctx, "#/components/schemas/MaybeItem", ComponentNaming).unwrap();
    assert_eq!(
        maybe,
        TypeIr::Union(vec![TypeIr::identifier("Item", None), TypeIr::null()])
    );
}

#[test]
fn test_opaque_imports_are_collected() {
    let store = store();
    let dump = full_run(&store);
    let backing: BTreeSet<String> = ["DateString".to_string()].into();
    assert_eq!(dump.opaque_imports.get("runtime/temporal"), Some(&backing));
}

#[test]
fn test_custom_config_changes_suffix_and_temporal_binding() {
    let store = store();
    let config = EngineConfig::from_yaml(
        r#"
schemaSuffix: Dto
temporalFormats: []
"#,
    )
    .unwrap();
    let mut ctx = ResolutionContext::with_config(&store, "api.yaml", config).unwrap();
    let report = generate_all(&mut ctx);
    assert!(report.is_complete());
    let dump = ctx.finish();
    assert!(dump.opaque_imports.is_empty());
    assert!(dump
        .models
        .values()
        .any(|m| m.name == "CreateOrderRequestBodyDto"));
}

#[test]
fn test_operation_naming_is_caller_supplied() {
    let store = store();
    let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
    let naming = OperationNaming::new(
        "getOrder",
        OperationArtifact::Response("200".into()),
        "Schema",
    );
    let ty = resolve_schema(&mut ctx, "#/components/schemas/Item", naming).unwrap();
    assert_eq!(ty, TypeIr::identifier("GetOrderResponse200Schema", None));
}

#[test]
fn test_self_referencing_document_root() {
    let mut store = DocumentStore::new();
    store
        .insert_json_str(
            "tree.json",
            r##"{"type":"object","properties":{"child":{"$ref":"#"}}}"##,
        )
        .unwrap();
    let mut ctx = ResolutionContext::new(&store, "tree.json").unwrap();
    let ty = resolve_schema(&mut ctx, "#", ComponentNaming).unwrap();
    assert!(ty.is_identifier_of("Tree"));

    let root = ctx.reference("#").unwrap();
    let tree = ctx.registry().lookup(&root).unwrap();
    assert_eq!(
        tree.declaration,
        TypeIr::Recursive {
            name: "Tree".into(),
            body: Box::new(TypeIr::Record(vec![Field {
                name: "child".into(),
                ty: TypeIr::identifier("Tree", None),
                optional: true,
            }])),
        }
    );
}

#[test]
fn test_unknown_document_and_missing_target() {
    let store = store();
    assert!(matches!(
        ResolutionContext::new(&store, "missing.yaml"),
        Err(AppError::UnknownDocument(_))
    ));

    let mut ctx = ResolutionContext::new(&store, "api.yaml").unwrap();
    let err = resolve_schema(&mut ctx, "other.yaml#/X", ComponentNaming).unwrap_err();
    assert!(matches!(err, AppError::UnknownDocument(_)));
    let err = resolve_schema(&mut ctx, "#/components/schemas/Nope", ComponentNaming).unwrap_err();
    assert!(matches!(err, AppError::UnresolvedReference(_)));
    assert!(ctx.registry().is_empty());
}
