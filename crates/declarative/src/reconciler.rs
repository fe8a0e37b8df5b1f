//! Generic create/read/update/delete over a resource schema

use serde_json::{Map, Value as Json};

use crate::context::ReconcileContext;
use crate::diff::{SpecDiff, diff};
use crate::error::{Error, RemoteError, Result};
use crate::poller::wait_until_ready;
use crate::schema::ResourceSchema;
use crate::translate::{from_remote_payload, to_remote_payload};
use crate::types::{RemoteResourceState, ResourceSpec};

/// Filter for [`Reconciler::list`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub region: Option<String>,
    /// Raw status, compared case-insensitively
    pub status: Option<String>,
}

impl ListFilter {
    fn matches(&self, state: &RemoteResourceState) -> bool {
        if let Some(region) = &self.region
            && state.attributes.get_str("region") != Some(region.as_str())
        {
            return false;
        }
        if let Some(status) = &self.status
            && !state
                .raw_status
                .as_deref()
                .is_some_and(|raw| raw.eq_ignore_ascii_case(status))
        {
            return false;
        }
        true
    }
}

/// Reconciler for one resource kind
///
/// Holds no state of its own; every call receives the client and polling
/// settings through the [`ReconcileContext`].
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'s> {
    schema: &'s ResourceSchema,
}

impl<'s> Reconciler<'s> {
    pub fn new(schema: &'s ResourceSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'s ResourceSchema {
        self.schema
    }

    pub fn kind(&self) -> &'s str {
        &self.schema.kind
    }

    /// Create the resource and wait until it is ready.
    ///
    /// If the resource is created but polling fails, the error carries the
    /// remote ID (see [`Error::remote_id`]) and the resource is left in place.
    pub fn create(&self, ctx: &ReconcileContext<'_>, spec: &ResourceSpec) -> Result<RemoteResourceState> {
        let payload = to_remote_payload(self.schema, spec)?;
        let path = &self.schema.collection;

        log::info!(
            "Creating {} {}",
            self.kind(),
            spec.get_str("name").unwrap_or("(unnamed)")
        );
        let response = ctx
            .client
            .post(path, &Json::Object(payload))
            .map_err(|e| Error::remote("POST", path, e))?;

        let id = response
            .get("id")
            .and_then(Json::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::remote(
                    "POST",
                    path,
                    RemoteError::Malformed("response has no resource id".to_string()),
                )
            })?
            .to_string();

        log::info!("Created {} {id}, waiting for readiness", self.kind());
        wait_until_ready(ctx, &id, || self.read(ctx, &id))
    }

    /// Read the resource; `None` when the control plane no longer has it
    pub fn read(&self, ctx: &ReconcileContext<'_>, id: &str) -> Result<Option<RemoteResourceState>> {
        let path = self.schema.item_path(id);
        match ctx.client.get(&path) {
            Ok(body) => self
                .state_from_json(Some(id), body)
                .map(Some)
                .map_err(|e| Error::remote("GET", &path, e)),
            Err(e) if e.is_not_found() => {
                log::debug!("{} {id} not found", self.kind());
                Ok(None)
            }
            Err(e) => Err(Error::remote("GET", &path, e)),
        }
    }

    /// Diff desired against last-known attributes without touching the remote
    pub fn plan_update(&self, desired: &ResourceSpec, last_known: &ResourceSpec) -> SpecDiff {
        diff(self.schema, desired, last_known)
    }

    /// Apply the minimal in-place update and wait until ready again.
    ///
    /// `desired` is validated first. Returns `last_known` unchanged without
    /// any remote call when nothing differs. A change to a force-replace
    /// attribute fails with [`Error::ImmutableFieldChanged`] before any
    /// remote call.
    pub fn update(
        &self,
        ctx: &ReconcileContext<'_>,
        id: &str,
        desired: &ResourceSpec,
        last_known: &RemoteResourceState,
    ) -> Result<RemoteResourceState> {
        self.schema.validate(desired)?;
        let changes = self.plan_update(desired, &last_known.attributes);

        if let Some(attribute) = changes.replace_fields.first() {
            return Err(Error::ImmutableFieldChanged {
                kind: self.schema.kind.clone(),
                attribute: attribute.clone(),
            });
        }
        if changes.changed.is_empty() {
            log::debug!("{} {id} is up to date", self.kind());
            return Ok(last_known.clone());
        }

        let path = self.schema.item_path(id);
        log::info!(
            "Updating {} {id}: {}",
            self.kind(),
            changes.changed.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        let body: Map<String, Json> = changes.changed.into_iter().collect();
        ctx.client
            .put(&path, &Json::Object(body))
            .map_err(|e| Error::remote("PUT", &path, e))?;

        wait_until_ready(ctx, id, || self.read(ctx, id))
    }

    /// Delete the resource; an already-absent resource is success
    pub fn delete(&self, ctx: &ReconcileContext<'_>, id: &str) -> Result<()> {
        let path = self.schema.item_path(id);
        log::info!("Deleting {} {id}", self.kind());
        match ctx.client.delete(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                log::debug!("{} {id} already absent", self.kind());
                Ok(())
            }
            Err(e) => Err(Error::remote("DELETE", &path, e)),
        }
    }

    /// Adopt an existing resource by ID
    pub fn import(&self, ctx: &ReconcileContext<'_>, id: &str) -> Result<RemoteResourceState> {
        self.read(ctx, id)?.ok_or_else(|| Error::NotFound {
            kind: self.schema.kind.clone(),
            id: id.to_string(),
        })
    }

    /// List the collection, keeping entries that match `filter`
    pub fn list(&self, ctx: &ReconcileContext<'_>, filter: &ListFilter) -> Result<Vec<RemoteResourceState>> {
        let path = &self.schema.collection;
        let body = ctx
            .client
            .get(path)
            .map_err(|e| Error::remote("GET", path, e))?;

        let Json::Array(items) = body else {
            return Err(Error::remote(
                "GET",
                path,
                RemoteError::Malformed("expected a JSON array".to_string()),
            ));
        };

        let mut states = Vec::with_capacity(items.len());
        for item in items {
            match self.state_from_json(None, item) {
                Ok(state) if filter.matches(&state) => states.push(state),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping {} list entry: {e}", self.kind()),
            }
        }
        Ok(states)
    }

    fn state_from_json(
        &self,
        id: Option<&str>,
        body: Json,
    ) -> std::result::Result<RemoteResourceState, RemoteError> {
        let Json::Object(payload) = body else {
            return Err(RemoteError::Malformed("expected a JSON object".to_string()));
        };

        let id = payload
            .get("id")
            .and_then(Json::as_str)
            .filter(|id| !id.is_empty())
            .or(id)
            .ok_or_else(|| RemoteError::Malformed("resource has no id".to_string()))?
            .to_string();

        let raw_status = payload
            .get(&self.schema.status.field)
            .and_then(Json::as_str)
            .map(str::to_string);
        let status = self.schema.status.classify(raw_status.as_deref());
        let attributes = from_remote_payload(self.schema, &payload);

        Ok(RemoteResourceState {
            id,
            status,
            raw_status,
            attributes,
            payload,
        })
    }
}
