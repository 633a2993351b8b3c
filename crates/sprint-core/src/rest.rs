//! PostgREST-style HTTP backend.
//!
//! Every table lives under `{url}/rest/v1/{table}`. Requests carry the
//! project key both as `apikey` and as a bearer token.

use crate::config::RemoteConfig;
use crate::error::{PlanError, Result};
use crate::remote::{Remote, RemoteOp};
use crate::rows::{assemble_state, MemberRow, SettingsRow, StoryRow, SubTaskRow, Table, SETTINGS_ROW_ID};
use crate::store::PlanningState;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct RestRemote {
    client: Client,
    base: String,
    api_key: String,
    schema: Option<String>,
}

impl RestRemote {
    pub fn new(url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base: url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            schema: None,
        }
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_config(cfg: &RemoteConfig) -> Result<Self> {
        let key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PlanError::ApiKeyMissing(cfg.api_key_env.clone()))?;
        let mut remote = Self::new(&cfg.url, key);
        remote.schema = cfg.schema.clone();
        Ok(remote)
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn request(&self, method: reqwest::Method, table: Table) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);
        if let Some(schema) = &self.schema {
            req = req
                .header("Accept-Profile", schema)
                .header("Content-Profile", schema);
        }
        req
    }

    fn get<T: DeserializeOwned>(&self, table: Table, query: &[(&str, String)]) -> Result<Vec<T>> {
        let op = format!("select {table}");
        let resp = self
            .request(reqwest::Method::GET, table)
            .query(&[("select", "*")])
            .query(query)
            .send()?;
        Ok(check(resp, &op)?.json()?)
    }
}

fn check(resp: Response, op: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(PlanError::remote(op, format!("{status}: {}", body.trim())))
}

/// Server ids may come back as strings or numbers.
fn returned_id(rows: &Value) -> Option<String> {
    match rows.get(0)?.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Remote for RestRemote {
    fn execute(&mut self, op: &RemoteOp) -> Result<Option<String>> {
        let describe = op.describe();
        tracing::debug!(op = %describe, "remote request");
        match op {
            RemoteOp::Insert { table, row, .. } => {
                let resp = self
                    .request(reqwest::Method::POST, *table)
                    .header("Prefer", "return=representation")
                    .json(row)
                    .send()?;
                let rows: Value = check(resp, &describe)?.json()?;
                Ok(returned_id(&rows))
            }
            RemoteOp::Upsert { table, row } => {
                let resp = self
                    .request(reqwest::Method::POST, *table)
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(row)
                    .send()?;
                check(resp, &describe)?;
                Ok(None)
            }
            RemoteOp::Update {
                table,
                filter,
                patch,
            } => {
                let resp = self
                    .request(reqwest::Method::PATCH, *table)
                    .query(&[(filter.column, filter.query_value())])
                    .json(patch)
                    .send()?;
                check(resp, &describe)?;
                Ok(None)
            }
            RemoteOp::Delete { table, filter } => {
                let resp = self
                    .request(reqwest::Method::DELETE, *table)
                    .query(&[(filter.column, filter.query_value())])
                    .send()?;
                check(resp, &describe)?;
                Ok(None)
            }
        }
    }

    fn fetch(&mut self) -> Result<PlanningState> {
        let members: Vec<MemberRow> = self.get(Table::Members, &[("order", "name".into())])?;
        let settings: Vec<SettingsRow> =
            self.get(Table::Settings, &[("id", format!("eq.{SETTINGS_ROW_ID}"))])?;
        let stories: Vec<StoryRow> =
            self.get(Table::Stories, &[("order", "created_at.asc".into())])?;
        let sub_tasks: Vec<SubTaskRow> = self.get(Table::SubTasks, &[])?;
        tracing::debug!(
            members = members.len(),
            stories = stories.len(),
            sub_tasks = sub_tasks.len(),
            "fetched remote state"
        );
        Ok(assemble_state(
            members,
            settings.into_iter().next(),
            stories,
            sub_tasks,
        ))
    }
}
