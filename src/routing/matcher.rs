//! Route matching module
//!
//! Resolves a method and path against the declared templates.

use hyper::Method;

use super::{PathTemplate, RouteError};

/// Outcome of resolving a request against the route table
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, T> {
    Found {
        route: &'a T,
        params: Vec<(String, String)>,
    },
    /// The path exists under other methods
    MethodNotAllowed { allowed: Vec<Method> },
    /// The path with its trailing slash toggled exists
    RedirectSlash(String),
    NotFound,
}

#[derive(Debug)]
struct Entry<T> {
    method: Method,
    template: PathTemplate,
    route: T,
}

/// Method + path template table
#[derive(Debug)]
pub struct Router<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, method: Method, path: &str, route: T) -> Result<(), RouteError> {
        let template = PathTemplate::parse(path)?;
        if self
            .entries
            .iter()
            .any(|entry| entry.method == method && entry.template == template)
        {
            return Err(RouteError::Duplicate {
                method: method.to_string(),
                path: path.to_string(),
            });
        }

        self.entries.push(Entry {
            method,
            template,
            route,
        });
        Ok(())
    }

    /// Find the route for a request.
    ///
    /// `HEAD` is served by `GET` routes. Among several matching templates the
    /// one with the most literal segments wins; ties go to the earliest.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, T> {
        let mut best: Option<(&Entry<T>, Vec<(String, String)>)> = None;
        let mut allowed: Vec<Method> = Vec::new();

        for entry in &self.entries {
            let Some(params) = entry.template.matches(path) else {
                continue;
            };

            if accepts(&entry.method, method) {
                let better = best.as_ref().is_none_or(|(current, _)| {
                    entry.template.specificity() > current.template.specificity()
                });
                if better {
                    best = Some((entry, params));
                }
            } else if !allowed.contains(&entry.method) {
                allowed.push(entry.method.clone());
            }
        }

        if let Some((entry, params)) = best {
            return Resolution::Found {
                route: &entry.route,
                params,
            };
        }

        if !allowed.is_empty() {
            allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            return Resolution::MethodNotAllowed { allowed };
        }

        if let Some(toggled) = toggle_trailing_slash(path) {
            if self
                .entries
                .iter()
                .any(|entry| entry.template.matches(&toggled).is_some())
            {
                return Resolution::RedirectSlash(toggled);
            }
        }

        Resolution::NotFound
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Method, &PathTemplate, &T)> {
        self.entries
            .iter()
            .map(|entry| (&entry.method, &entry.template, &entry.route))
    }
}

fn accepts(declared: &Method, requested: &Method) -> bool {
    declared == requested || (*declared == Method::GET && *requested == Method::HEAD)
}

fn toggle_trailing_slash(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    Some(match path.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => format!("{path}/"),
    })
}
