//! OpenAPI 3.1 document built from the route table
//!
//! Model components come from the derived `ToSchema` impls; paths, parameters
//! and request bodies are assembled from the route records with utoipa's
//! builders. The document is generated once at startup and served as bytes.

use hyper::Method;
use std::collections::BTreeMap;
use utoipa::openapi::example::ExampleBuilder;
use utoipa::openapi::path::{
    Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn, PathItem,
};
use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, OneOfBuilder, SchemaType, Type};
use utoipa::openapi::{
    Components, ContentBuilder, OpenApi as Document, PathsBuilder, Ref, RefOr, Required,
    ResponseBuilder, Responses, ResponsesBuilder, Schema,
};
use utoipa::{Modify, OpenApi};

use crate::dispatch::{BodyField, BodyKind, ParamSource, ParamSpec, RouteSpec};
use crate::models::{Image, Item, Offer, User};

const JSON: &str = "application/json";

/// Registers the error records every 422 response refers to
struct ValidationSchemas;

impl Modify for ValidationSchemas {
    fn modify(&self, openapi: &mut Document) {
        let components = openapi.components.get_or_insert_with(Components::default);
        components
            .schemas
            .insert("ValidationError".to_string(), validation_error_schema());
        components
            .schemas
            .insert("HTTPValidationError".to_string(), http_validation_error_schema());
    }
}

/// Static part of the document: the shared components
#[derive(OpenApi)]
#[openapi(
    components(schemas(Image, Item, Offer, User)),
    modifiers(&ValidationSchemas)
)]
struct ApiDoc;

/// Build the full document for `routes`
pub fn document(routes: &[RouteSpec], title: &str, version: &str) -> Document {
    let mut doc = ApiDoc::openapi();
    doc.info.title = title.to_string();
    doc.info.version = version.to_string();

    let mut bodies = BTreeMap::new();
    let mut items: BTreeMap<&str, PathItem> = BTreeMap::new();
    for route in routes {
        let operation = operation(route, &mut bodies);
        let item = items.entry(route.path).or_default();
        let slot = match route.method {
            Method::GET => &mut item.get,
            Method::POST => &mut item.post,
            Method::PUT => &mut item.put,
            Method::DELETE => &mut item.delete,
            Method::PATCH => &mut item.patch,
            Method::HEAD => &mut item.head,
            Method::OPTIONS => &mut item.options,
            Method::TRACE => &mut item.trace,
            _ => {
                tracing::warn!(
                    method = %route.method,
                    path = route.path,
                    "method has no OpenAPI operation slot"
                );
                continue;
            }
        };
        *slot = Some(operation);
    }

    doc.paths = items
        .into_iter()
        .fold(PathsBuilder::new(), |paths, (path, item)| paths.path(path, item))
        .build();
    doc.components
        .get_or_insert_with(Components::default)
        .schemas
        .extend(bodies);
    doc
}

fn operation(route: &RouteSpec, bodies: &mut BTreeMap<String, RefOr<Schema>>) -> Operation {
    let mut builder = OperationBuilder::new()
        .summary(Some(route.summary))
        .operation_id(Some(route.operation_id))
        .responses(responses(route));

    if !route.params.is_empty() {
        builder = builder.parameters(Some(route.params.iter().map(parameter)));
    }
    if !route.body.is_empty() {
        builder = builder.request_body(Some(request_body(route, bodies)));
    }
    builder.build()
}

fn responses(route: &RouteSpec) -> Responses {
    let ok = ResponseBuilder::new().description("Successful Response").build();
    let mut responses = ResponsesBuilder::new().response("200", RefOr::T(ok));

    if !route.params.is_empty() || !route.body.is_empty() {
        let invalid = ResponseBuilder::new()
            .description("Validation Error")
            .content(
                JSON,
                ContentBuilder::new()
                    .schema(Some(component("HTTPValidationError")))
                    .build(),
            )
            .build();
        responses = responses.response("422", RefOr::T(invalid));
    }
    responses.build()
}

const fn location(source: ParamSource) -> ParameterIn {
    match source {
        ParamSource::Path => ParameterIn::Path,
        ParamSource::Query => ParameterIn::Query,
        ParamSource::Header => ParameterIn::Header,
        ParamSource::Cookie => ParameterIn::Cookie,
    }
}

fn parameter(param: &ParamSpec) -> Parameter {
    ParameterBuilder::new()
        .name(param.wire_name())
        .parameter_in(location(param.source))
        .required(required(param.required))
        .description(param.description)
        .schema(Some(parameter_schema(param)))
        .build()
}

fn parameter_schema(param: &ParamSpec) -> RefOr<Schema> {
    let title = param.title.map_or_else(|| title_case(param.name), str::to_string);
    let schema = param
        .constraints
        .describe(param.kind.schema())
        .title(Some(title))
        .description(param.description);

    if !param.required && param.default.is_null() {
        nullable(object(schema))
    } else {
        let default = (!param.default.is_null()).then(|| param.default.clone());
        object(schema.default(default))
    }
}

fn field_schema(field: &BodyField) -> RefOr<Schema> {
    match field.kind {
        BodyKind::Model(descriptor) => (descriptor.schema)(),
        BodyKind::Scalar(kind) => object(field.constraints.describe(kind.schema())),
    }
}

fn request_body(route: &RouteSpec, bodies: &mut BTreeMap<String, RefOr<Schema>>) -> RequestBody {
    let schema = if route.is_embedded() {
        let name = format!("Body_{}", route.operation_id);
        let embedded = route.body.iter().fold(
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .title(Some(name.as_str())),
            |schema, field| {
                if field.required {
                    schema
                        .property(field.name, field_schema(field))
                        .required(field.name)
                } else {
                    schema.property(field.name, nullable(field_schema(field)))
                }
            },
        );
        bodies.insert(name.clone(), object(embedded));
        component(&name)
    } else {
        route
            .body
            .first()
            .map_or_else(|| object(ObjectBuilder::new()), field_schema)
    };

    let examples: Vec<_> = route
        .body
        .iter()
        .flat_map(|field| &field.examples)
        .map(|example| {
            let mut builder = ExampleBuilder::new()
                .summary(example.summary)
                .value(Some(example.value.clone()));
            if let Some(description) = example.description {
                builder = builder.description(description);
            }
            (example.name.to_string(), RefOr::T(builder.build()))
        })
        .collect();

    let mut content = ContentBuilder::new().schema(Some(schema));
    if !examples.is_empty() {
        content = content.examples_from_iter(examples);
    }

    RequestBodyBuilder::new()
        .content(JSON, content.build())
        .required(Some(required(route.body.iter().any(|field| field.required))))
        .build()
}

const fn required(flag: bool) -> Required {
    if flag {
        Required::True
    } else {
        Required::False
    }
}

fn component(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn object(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

/// `oneOf [schema, null]` for optional inputs
fn nullable(schema: RefOr<Schema>) -> RefOr<Schema> {
    let null = object(ObjectBuilder::new().schema_type(Type::Null));
    RefOr::T(Schema::OneOf(
        OneOfBuilder::new().item(schema).item(null).build(),
    ))
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn validation_error_schema() -> RefOr<Schema> {
    let loc_part = OneOfBuilder::new()
        .item(object(ObjectBuilder::new().schema_type(Type::String)))
        .item(object(ObjectBuilder::new().schema_type(Type::Integer)))
        .build();
    let loc = ArrayBuilder::new()
        .title(Some("Location"))
        .items(RefOr::T(Schema::OneOf(loc_part)))
        .build();

    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .title(Some("ValidationError"))
            .property("loc", RefOr::T(Schema::Array(loc)))
            .required("loc")
            .property(
                "msg",
                object(ObjectBuilder::new().schema_type(Type::String).title(Some("Message"))),
            )
            .required("msg")
            .property(
                "type",
                object(ObjectBuilder::new().schema_type(Type::String).title(Some("Error Type"))),
            )
            .required("type")
            .property(
                "input",
                object(ObjectBuilder::new().schema_type(SchemaType::AnyValue).title(Some("Input"))),
            )
            .property(
                "ctx",
                object(ObjectBuilder::new().schema_type(Type::Object).title(Some("Context"))),
            ),
    )
}

fn http_validation_error_schema() -> RefOr<Schema> {
    let detail = ArrayBuilder::new()
        .title(Some("Detail"))
        .items(component("ValidationError"))
        .build();
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .title(Some("HTTPValidationError"))
            .property("detail", RefOr::T(Schema::Array(detail))),
    )
}
