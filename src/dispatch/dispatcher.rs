use std::collections::BTreeSet;

use super::decoder::{decode, validate, RequestParts};
use super::spec::{ParamSource, RouteSpec};
use super::DispatchError;
use crate::routing::{Resolution, RouteError, Router};
use serde_json::Value;

/// Successful dispatch result
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Reply(Value),
    /// Same resource under the toggled trailing slash; carries the full target
    Redirect(String),
}

/// Interprets the route table: resolve, decode, validate, then call the handler.
/// The first failing stage ends the request.
#[derive(Debug)]
pub struct Dispatcher {
    routes: Vec<RouteSpec>,
    router: Router<usize>,
}

impl Dispatcher {
    pub fn new(routes: Vec<RouteSpec>) -> Result<Self, RouteError> {
        let mut router = Router::new();
        for (index, route) in routes.iter().enumerate() {
            router.insert(route.method.clone(), route.path, index)?;
        }

        for (method, template, &index) in router.iter() {
            let declared: BTreeSet<&str> = routes[index]
                .params
                .iter()
                .filter(|param| param.source == ParamSource::Path)
                .map(|param| param.name)
                .collect();
            let captured: BTreeSet<&str> = template.param_names().collect();
            if let Some(name) = declared.symmetric_difference(&captured).next() {
                return Err(RouteError::PathParamMismatch {
                    method: method.to_string(),
                    path: template.as_str().to_string(),
                    name: (*name).to_string(),
                });
            }
        }

        Ok(Self { routes, router })
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    pub fn dispatch(&self, parts: &RequestParts) -> Result<Outcome, DispatchError> {
        match self.router.resolve(&parts.method, &parts.path) {
            Resolution::Found { route, params } => {
                let route = &self.routes[*route];
                let inputs = decode(route, &params, parts)?;
                validate(route, &inputs)?;
                (route.handler)(&inputs).map(Outcome::Reply)
            }
            Resolution::MethodNotAllowed { allowed } => {
                Err(DispatchError::MethodNotAllowed { allowed })
            }
            Resolution::RedirectSlash(target) => Ok(Outcome::Redirect(
                match parts.query.as_deref().filter(|q| !q.is_empty()) {
                    Some(query) => format!("{target}?{query}"),
                    None => target,
                },
            )),
            Resolution::NotFound => Err(DispatchError::NotFound),
        }
    }
}
