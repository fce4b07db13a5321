//! Typed per-entity façade over `LogoClient`.
//!
//! # Design
//! Every entity exposes the same CRUD, search and ancillary operations and
//! differs only in its path and record type. `Entity` captures those two
//! facts; `EntityClient<E>` supplies the shared operations once. Endpoints
//! that exist on a single entity are inherent impls on
//! `EntityClient<ThatEntity>` next to the entity's record type.

use std::fmt::{self, Display};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::{ActionCall, LogoClient};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{DbColumn, Page, Parameter, TrackStatus};
use crate::query::{ListQuery, SearchQuery};

/// A resource exposed by the Logo Objects API.
pub trait Entity {
    /// Path segment under the base URL, e.g. `items`.
    const PATH: &'static str;

    type Record: Serialize + DeserializeOwned;
}

pub struct EntityClient<'a, E> {
    client: &'a LogoClient,
    entity: PhantomData<E>,
}

impl<E> Clone for EntityClient<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EntityClient<'_, E> {}

impl<E: Entity> fmt::Debug for EntityClient<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityClient")
            .field("path", &E::PATH)
            .field("base_url", &self.client.base_url())
            .finish()
    }
}

impl<'a, E: Entity> EntityClient<'a, E> {
    pub fn new(client: &'a LogoClient) -> Self {
        Self {
            client,
            entity: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        E::PATH
    }

    pub fn build_list(&self, query: &ListQuery) -> Result<HttpRequest> {
        self.client.build_list(E::PATH, query)
    }

    pub fn build_get(&self, id: impl Display, query: &ListQuery) -> Result<HttpRequest> {
        self.client.build_get(E::PATH, id, query)
    }

    pub fn build_create(&self, record: &E::Record) -> Result<HttpRequest> {
        self.client.build_create(E::PATH, record)
    }

    pub fn build_update(&self, id: impl Display, record: &E::Record) -> Result<HttpRequest> {
        self.client.build_update(E::PATH, id, record)
    }

    /// Partial update; `changes` usually carries only the modified fields.
    pub fn build_patch<B: Serialize + ?Sized>(&self, id: impl Display, changes: &B) -> Result<HttpRequest> {
        self.client.build_patch(E::PATH, id, changes)
    }

    pub fn build_delete(&self, id: impl Display) -> Result<HttpRequest> {
        self.client.build_delete(E::PATH, id)
    }

    pub fn build_search(&self, search: &SearchQuery, query: &ListQuery) -> Result<HttpRequest> {
        self.client.build_search(E::PATH, search, query)
    }

    pub fn build_read_with_body(&self, query: &ListQuery) -> Result<HttpRequest> {
        self.client.build_read_with_body(E::PATH, query)
    }

    pub fn build_db_columns(&self) -> Result<HttpRequest> {
        self.client.build_db_columns(E::PATH)
    }

    pub fn build_track(&self) -> Result<HttpRequest> {
        self.client.build_track(E::PATH)
    }

    pub fn build_untrack(&self) -> Result<HttpRequest> {
        self.client.build_untrack(E::PATH)
    }

    pub fn build_check_track(&self) -> Result<HttpRequest> {
        self.client.build_check_track(E::PATH)
    }

    /// `GET /{entity}/{id}/ExportToXML`; the XML comes back as a parameter.
    pub fn build_export_to_xml(&self, id: impl Display) -> Result<HttpRequest> {
        self.build_action(&ActionCall::get("ExportToXML").on(id))
    }

    pub fn build_action(&self, call: &ActionCall) -> Result<HttpRequest> {
        self.client.build_action(E::PATH, call)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Page<E::Record>> {
        self.client.parse_page(response)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<E::Record> {
        self.client.parse_record(response)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<E::Record> {
        self.client.parse_record(response)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<E::Record> {
        self.client.parse_record(response)
    }

    pub fn parse_patch(&self, response: HttpResponse) -> Result<E::Record> {
        self.client.parse_record(response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<()> {
        self.client.parse_empty(response)
    }

    pub fn parse_search(&self, response: HttpResponse) -> Result<Page<E::Record>> {
        self.client.parse_page(response)
    }

    pub fn parse_read_with_body(&self, response: HttpResponse) -> Result<Page<E::Record>> {
        self.client.parse_page(response)
    }

    pub fn parse_db_columns(&self, response: HttpResponse) -> Result<Vec<DbColumn>> {
        self.client.parse_db_columns(response)
    }

    pub fn parse_track(&self, response: HttpResponse) -> Result<()> {
        self.client.parse_empty(response)
    }

    pub fn parse_untrack(&self, response: HttpResponse) -> Result<()> {
        self.client.parse_empty(response)
    }

    pub fn parse_check_track(&self, response: HttpResponse) -> Result<TrackStatus> {
        self.client.parse_track_status(response)
    }

    pub fn parse_export_to_xml(&self, response: HttpResponse) -> Result<Vec<Parameter>> {
        self.client.parse_parameters(response)
    }

    /// For actions answering with the entity shape.
    pub fn parse_action_record(&self, response: HttpResponse) -> Result<E::Record> {
        self.client.parse_record(response)
    }

    /// For actions answering with a key/value list.
    pub fn parse_action_parameters(&self, response: HttpResponse) -> Result<Vec<Parameter>> {
        self.client.parse_parameters(response)
    }
}
