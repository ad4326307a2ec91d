//! Single-use request builders.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderName, HeaderValue};
use serde::Serialize;

use crate::dispatch::{Completion, Handlers};
use crate::error::{BodyKind, Result, TransportError, TransportFailure, UsageError};
use crate::logging::targets;
use crate::request::{HttpMethod, Request, RequestBody, RequestId};
use crate::response::{EmptyResponse, JsonResponse, RawResponse, Response, ResponseData};
use crate::session::Session;

/// Lifecycle of a builder entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuilderState {
    /// Still accepting configuration.
    Building,
    /// A verb was chosen and the request was handed to the transport.
    Dispatched(HttpMethod),
}

/// The accumulated state of one request, owned by the session.
pub(crate) struct BuilderEntry {
    state: BuilderState,
    url: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    headers: Vec<(HeaderName, HeaderValue)>,
    handlers: Handlers,
}

impl BuilderEntry {
    pub(crate) fn new(url: String) -> Self {
        Self {
            state: BuilderState::Building,
            url,
            query: Vec::new(),
            body: RequestBody::None,
            headers: Vec::new(),
            handlers: Handlers::default(),
        }
    }

    fn building(&mut self) -> Result<&mut Self> {
        match self.state {
            BuilderState::Building => Ok(self),
            BuilderState::Dispatched(verb) => Err(UsageError::AlreadyDispatched { verb }),
        }
    }

    fn set_body(&mut self, body: RequestBody, attempted: BodyKind) -> Result<()> {
        let existing = match &self.body {
            RequestBody::None => {
                self.body = body;
                return Ok(());
            }
            RequestBody::Json(_) => BodyKind::Json,
            RequestBody::Raw(_) => BodyKind::Raw,
        };
        Err(UsageError::BodyAlreadySet {
            existing,
            attempted,
        })
    }
}

/// Accumulates one request and dispatches it with a verb.
///
/// Created by [`Session::request`]. Every method takes `&self` and returns
/// `Result<&Self>`, so configuration chains with `?`:
///
/// ```ignore
/// session
///     .request("/users")
///     .with_json_body(&serde_json::json!({"name": "a"}))?
///     .on_json_response(|created| {
///         println!("created {}", created.json());
///         created.respond().ok();
///     })?
///     .on_error(|err| eprintln!("{}", err.verbose()))?
///     .post()?;
/// ```
///
/// A builder is single-use. After a verb was called every method fails with
/// [`UsageError::AlreadyDispatched`]; after the request completed, with
/// [`UsageError::Settled`]. Dropping a builder that never dispatched
/// releases it from the session.
pub struct RequestBuilder {
    session: Session,
    id: RequestId,
}

impl RequestBuilder {
    pub(crate) fn new(session: Session, id: RequestId) -> Self {
        Self { session, id }
    }

    /// The ID identifying this request in its session.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The session this builder belongs to.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Append query arguments, keeping their order.
    pub fn with_args<I, K, V>(&self, args: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.session.with_entry(self.id, |entry| {
            let entry = entry.building()?;
            entry
                .query
                .extend(args.into_iter().map(|(k, v)| (k.into(), v.into())));
            Ok(())
        })?;
        Ok(self)
    }

    /// Append a single query argument.
    pub fn with_arg(&self, key: impl Into<String>, value: impl Into<String>) -> Result<&Self> {
        self.with_args([(key.into(), value.into())])
    }

    /// Set a JSON body.
    ///
    /// The body can only be set once.
    pub fn with_json_body<T: Serialize + ?Sized>(&self, body: &T) -> Result<&Self> {
        let value = serde_json::to_value(body).map_err(|e| UsageError::InvalidBody(e.to_string()));
        self.session.with_entry(self.id, |entry| {
            let entry = entry.building()?;
            entry.set_body(RequestBody::Json(value?), BodyKind::Json)
        })?;
        Ok(self)
    }

    /// Set a raw body, sent as-is.
    ///
    /// The body can only be set once.
    pub fn with_body(&self, body: impl Into<Bytes>) -> Result<&Self> {
        let body = body.into();
        self.session.with_entry(self.id, |entry| {
            entry
                .building()?
                .set_body(RequestBody::Raw(body), BodyKind::Raw)
        })?;
        Ok(self)
    }

    /// Add a header for this request only.
    ///
    /// The first per-request value of a key replaces the session's defaults
    /// for that key; further values of the same key are appended.
    pub fn with_header(&self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<&Self> {
        let key = key.as_ref();
        let header = HeaderName::try_from(key)
            .map_err(|e| UsageError::invalid_header(key, e))
            .and_then(|name| {
                HeaderValue::try_from(value.as_ref())
                    .map(|value| (name, value))
                    .map_err(|e| UsageError::invalid_header(key, e))
            });
        self.session.with_entry(self.id, |entry| {
            let entry = entry.building()?;
            entry.headers.push(header?);
            Ok(())
        })?;
        Ok(self)
    }

    /// Register the handler for transport failures.
    pub fn on_error<F>(&self, handler: F) -> Result<&Self>
    where
        F: FnOnce(TransportError) + Send + 'static,
    {
        self.session.with_entry(self.id, |entry| {
            entry.building()?.handlers.error = Some(Box::new(handler));
            Ok(())
        })?;
        Ok(self)
    }

    /// Register the handler for every response.
    pub fn on_response<F>(&self, handler: F) -> Result<&Self>
    where
        F: FnOnce(Response) + Send + 'static,
    {
        self.session.with_entry(self.id, |entry| {
            entry.building()?.handlers.response = Some(Box::new(handler));
            Ok(())
        })?;
        Ok(self)
    }

    /// Register the handler for responses with an empty body.
    pub fn on_empty_response<F>(&self, handler: F) -> Result<&Self>
    where
        F: FnOnce(EmptyResponse) + Send + 'static,
    {
        self.session.with_entry(self.id, |entry| {
            entry.building()?.handlers.empty = Some(Box::new(handler));
            Ok(())
        })?;
        Ok(self)
    }

    /// Register the handler for responses whose body is JSON.
    pub fn on_json_response<F>(&self, handler: F) -> Result<&Self>
    where
        F: FnOnce(JsonResponse) + Send + 'static,
    {
        self.session.with_entry(self.id, |entry| {
            entry.building()?.handlers.json = Some(Box::new(handler));
            Ok(())
        })?;
        Ok(self)
    }

    /// Dispatch as GET.
    pub fn get(&self) -> Result<()> {
        self.go(HttpMethod::Get)
    }

    /// Dispatch as POST.
    pub fn post(&self) -> Result<()> {
        self.go(HttpMethod::Post)
    }

    /// Dispatch as PATCH.
    pub fn patch(&self) -> Result<()> {
        self.go(HttpMethod::Patch)
    }

    /// Dispatch as PUT.
    pub fn put(&self) -> Result<()> {
        self.go(HttpMethod::Put)
    }

    /// Dispatch as DELETE.
    pub fn delete(&self) -> Result<()> {
        self.go(HttpMethod::Delete)
    }

    /// Dispatch with `method`.
    ///
    /// Returns once the request is handed to the transport. Handlers run
    /// later, when the transport completes.
    pub fn go(&self, method: HttpMethod) -> Result<()> {
        let (mut request, handlers) = self.session.with_entry(self.id, |entry| {
            let entry = entry.building()?;
            entry.state = BuilderState::Dispatched(method);
            let request = self.assemble(entry, method);
            Ok((request, std::mem::take(&mut entry.handlers)))
        })?;
        let release = Release {
            session: self.session.clone(),
            id: self.id,
        };

        for filter in &self.session.config().request_filters {
            filter(&mut request);
        }

        tracing::debug!(
            target: targets::BUILDER,
            id = ?self.id,
            %method,
            url = %request.url,
            "dispatching request"
        );

        let request = Arc::new(request);
        let origin = request.clone();
        let completion = Completion::new(request.clone(), move |outcome| {
            settle(release, handlers, origin, outcome);
        });
        self.session.transport().execute(request, completion);
        Ok(())
    }

    fn assemble(&self, entry: &mut BuilderEntry, method: HttpMethod) -> Request {
        let mut headers = self.session.default_headers().clone();
        let mut replaced = HashSet::new();
        for (name, value) in entry.headers.drain(..) {
            if replaced.insert(name.clone()) {
                headers.insert(name, value);
            } else {
                headers.append(name, value);
            }
        }

        Request {
            id: self.id,
            method,
            url: self.session.resolve_url(&entry.url),
            headers,
            query: std::mem::take(&mut entry.query),
            body: std::mem::take(&mut entry.body),
            timeout: self.session.timeout(),
        }
    }
}

impl Drop for RequestBuilder {
    fn drop(&mut self) {
        let building = self
            .session
            .with_entry(self.id, |entry| Ok(entry.state == BuilderState::Building))
            .unwrap_or(false);
        if building {
            tracing::trace!(target: targets::BUILDER, id = ?self.id, "builder dropped before dispatch");
            self.session.release(self.id);
        }
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("id", &self.id)
            .field("outstanding", &self.session.is_outstanding(self.id))
            .finish()
    }
}

/// Releases a request from its session, also when a handler panics.
struct Release {
    session: Session,
    id: RequestId,
}

impl Drop for Release {
    fn drop(&mut self) {
        self.session.release(self.id);
    }
}

fn settle(
    release: Release,
    handlers: Handlers,
    request: Arc<Request>,
    outcome: std::result::Result<RawResponse, TransportFailure>,
) {
    match outcome {
        Ok(raw) => {
            tracing::debug!(
                target: targets::DISPATCH,
                id = ?release.id,
                status = raw.status,
                url = %request.url,
                "request completed"
            );
            let fallback = release.session.response_handler();
            handlers.route_response(ResponseData::new(raw, request), fallback);
        }
        Err(failure) => {
            tracing::debug!(
                target: targets::DISPATCH,
                id = ?release.id,
                kind = %failure.kind,
                url = %request.url,
                "request failed"
            );
            handlers.route_failure(TransportError::new(failure, request));
        }
    }
}
