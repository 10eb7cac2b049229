//! Endpoint catalog: named operations described as data.
//!
//! # Design
//! An `EndpointDescriptor` is everything needed to turn a map of named
//! arguments into a `RequestSpec`: method, a path template with `{name}`
//! placeholders, and the required and optional parameter names. Adding an
//! operation means registering a descriptor, not writing code.
//!
//! Descriptors are checked when registered, so a template placeholder that is
//! not a required parameter is a registration error rather than a runtime
//! surprise. `prepare` performs all argument validation before anything is
//! sent, and `classify_status` applies one status policy to every endpoint.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::error::{CatalogError, ClientError, RegistrationError};
use crate::http::{HttpMethod, ParsedResponse, RequestSpec};

/// One logical upstream operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    name: String,
    method: HttpMethod,
    path_template: String,
    required: BTreeSet<String>,
    /// Optional parameter name -> value sent when the caller omits it.
    optional: BTreeMap<String, Option<String>>,
}

impl EndpointDescriptor {
    pub fn new(name: impl Into<String>, method: HttpMethod, path_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path_template: path_template.into(),
            required: BTreeSet::new(),
            optional: BTreeMap::new(),
        }
    }

    pub fn get(name: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Get, path_template)
    }

    #[must_use]
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Optional parameter that is omitted from the request unless supplied.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.optional.insert(name.into(), None);
        self
    }

    /// Optional parameter that falls back to `default` when not supplied.
    #[must_use]
    pub fn optional_or(mut self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.optional.insert(name.into(), Some(default.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn optional_params(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.optional.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.required.contains(name) || self.optional.contains_key(name)
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> Result<Vec<&str>, RegistrationError> {
        parse_template(&self.path_template)
            .map(|segments| {
                segments
                    .into_iter()
                    .filter_map(|segment| match segment {
                        Segment::Placeholder(name) => Some(name),
                        Segment::Literal(_) => None,
                    })
                    .collect()
            })
            .map_err(|reason| self.template_error(reason))
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        if !self.path_template.starts_with('/') {
            return Err(self.template_error("must start with '/'"));
        }
        for placeholder in self.placeholders()? {
            if !self.required.contains(placeholder) {
                return Err(RegistrationError::UnboundPlaceholder {
                    endpoint: self.name.clone(),
                    placeholder: placeholder.to_string(),
                });
            }
        }
        if let Some(both) = self.required.iter().find(|name| self.optional.contains_key(*name)) {
            return Err(self.template_error(&format!(
                "parameter {both:?} is both required and optional"
            )));
        }
        Ok(())
    }

    fn template_error(&self, reason: &str) -> RegistrationError {
        RegistrationError::InvalidTemplate {
            endpoint: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    /// Validate `args` and resolve them into a request.
    ///
    /// Placeholder values are percent-encoded into the path; every other
    /// supplied argument, plus the defaults of omitted optionals, goes into
    /// the query string. An empty placeholder value counts as missing.
    pub fn prepare(&self, args: &BTreeMap<String, String>) -> Result<RequestSpec, CatalogError> {
        if let Some(missing) = self.required.iter().find(|name| !args.contains_key(*name)) {
            return Err(CatalogError::MissingParameter {
                endpoint: self.name.clone(),
                name: missing.clone(),
            });
        }
        if let Some(unknown) = args.keys().find(|name| !self.accepts(name)) {
            return Err(CatalogError::UnknownParameter {
                endpoint: self.name.clone(),
                name: unknown.clone(),
            });
        }

        // Validated at registration; a failure here means the descriptor was
        // never registered.
        let segments = parse_template(&self.path_template).map_err(|reason| {
            CatalogError::Client(ClientError::InvalidRequest(format!(
                "{}: invalid path template: {reason}",
                self.name
            )))
        })?;

        let mut path = String::with_capacity(self.path_template.len());
        let mut in_path = BTreeSet::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => {
                    // An empty segment would address a different resource.
                    let value = args.get(name).filter(|v| !v.is_empty()).ok_or_else(|| {
                        CatalogError::MissingParameter {
                            endpoint: self.name.clone(),
                            name: name.to_string(),
                        }
                    })?;
                    path.push_str(&urlencoding::encode(value));
                    in_path.insert(name);
                }
            }
        }

        let mut spec = RequestSpec::new(self.method, path);
        for (name, value) in args {
            if !in_path.contains(name.as_str()) {
                spec.query.insert(name.clone(), value.clone());
            }
        }
        for (name, default) in &self.optional {
            if let Some(default) = default {
                spec.query
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        Ok(spec)
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn parse_template(template: &str) -> Result<Vec<Segment<'_>>, &'static str> {
    let mut segments = Vec::new();
    let mut rest = template;
    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                segments.push(Segment::Literal(rest));
                break;
            }
            Some(idx) if rest.as_bytes()[idx] == b'}' => return Err("unbalanced '}'"),
            Some(idx) => {
                if idx > 0 {
                    segments.push(Segment::Literal(&rest[..idx]));
                }
                let after = &rest[idx + 1..];
                let close = after.find('}').ok_or("unterminated placeholder")?;
                let name = &after[..close];
                if name.is_empty() {
                    return Err("empty placeholder");
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err("placeholder names may only contain [A-Za-z0-9_]");
                }
                segments.push(Segment::Placeholder(name));
                rest = &after[close + 1..];
            }
        }
    }
    Ok(segments)
}

/// Registered endpoints, keyed by name. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    endpoints: BTreeMap<String, EndpointDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: EndpointDescriptor) -> Result<(), RegistrationError> {
        descriptor.validate()?;
        if self.endpoints.contains_key(descriptor.name()) {
            return Err(RegistrationError::DuplicateEndpoint(descriptor.name));
        }
        self.endpoints.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Look up `endpoint` and resolve `args` into a request.
    pub fn prepare(
        &self,
        endpoint: &str,
        args: &BTreeMap<String, String>,
    ) -> Result<(&EndpointDescriptor, RequestSpec), CatalogError> {
        let descriptor = self
            .get(endpoint)
            .ok_or_else(|| CatalogError::UnknownEndpoint(endpoint.to_string()))?;
        let spec = descriptor.prepare(args)?;
        Ok((descriptor, spec))
    }
}

/// Apply the uniform status policy to a response from `endpoint`.
pub fn classify_status(endpoint: &str, response: ParsedResponse) -> Result<ParsedResponse, CatalogError> {
    let endpoint = endpoint.to_string();
    match response.status {
        200..=299 => Ok(response),
        status @ (401 | 403) => Err(CatalogError::AuthFailed { endpoint, status }),
        status @ 404 => Err(CatalogError::NotFound { endpoint, status }),
        status @ 429 => {
            let retry_after = response
                .header("retry-after")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(CatalogError::RateLimited {
                endpoint,
                status,
                retry_after,
            })
        }
        status @ 500..=u16::MAX => Err(CatalogError::UpstreamError {
            endpoint,
            status,
            body: response.raw_text,
        }),
        status => Err(CatalogError::UnexpectedStatus {
            endpoint,
            status,
            body: response.raw_text,
        }),
    }
}
