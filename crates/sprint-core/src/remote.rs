//! Remote collaborators: the operations a mutation issues and the backends
//! that execute them.

use crate::error::{PlanError, Result};
use crate::rows::{assemble_state, MemberRow, SettingsRow, StoryRow, SubTaskRow, Table};
use crate::store::PlanningState;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    /// PostgREST query value, e.g. `eq.abc`.
    pub fn query_value(&self) -> String {
        match &self.value {
            Value::String(s) => format!("eq.{s}"),
            other => format!("eq.{other}"),
        }
    }

    fn matches(&self, row: &Map<String, Value>) -> bool {
        row.get(self.column) == Some(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    /// `temp_id` is the local id the server id should replace.
    Insert {
        table: Table,
        row: Value,
        temp_id: Option<String>,
    },
    Upsert {
        table: Table,
        row: Value,
    },
    Update {
        table: Table,
        filter: Filter,
        patch: Value,
    },
    Delete {
        table: Table,
        filter: Filter,
    },
}

impl RemoteOp {
    pub fn insert(table: Table, row: Value, temp_id: &str) -> Self {
        RemoteOp::Insert {
            table,
            row,
            temp_id: Some(temp_id.to_string()),
        }
    }

    pub fn table(&self) -> Table {
        match self {
            RemoteOp::Insert { table, .. }
            | RemoteOp::Upsert { table, .. }
            | RemoteOp::Update { table, .. }
            | RemoteOp::Delete { table, .. } => *table,
        }
    }

    pub fn describe(&self) -> String {
        let verb = match self {
            RemoteOp::Insert { .. } => "insert",
            RemoteOp::Upsert { .. } => "upsert",
            RemoteOp::Update { .. } => "update",
            RemoteOp::Delete { .. } => "delete",
        };
        format!("{verb} {}", self.table())
    }
}

// ---------------------------------------------------------------------------
// Remote trait
// ---------------------------------------------------------------------------

pub trait Remote {
    /// Execute one operation. Inserts return the id the server assigned.
    fn execute(&mut self, op: &RemoteOp) -> Result<Option<String>>;

    /// Read the full planning state.
    fn fetch(&mut self) -> Result<PlanningState>;
}

/// Backend for a workspace with no remote: every operation is accepted
/// as-is and nothing can be fetched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Offline;

impl Remote for Offline {
    fn execute(&mut self, _op: &RemoteOp) -> Result<Option<String>> {
        Ok(None)
    }

    fn fetch(&mut self) -> Result<PlanningState> {
        Err(PlanError::RemoteNotConfigured)
    }
}

// ---------------------------------------------------------------------------
// In-memory tables
// ---------------------------------------------------------------------------

/// Table store held in process. Rows inserted without an id receive
/// `srv-<n>`.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    tables: BTreeMap<Table, Vec<Map<String, Value>>>,
    next_id: u64,
    failing: Option<Table>,
    log: Vec<String>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent operation touching `table`.
    pub fn fail_on(&mut self, table: Table) {
        self.failing = Some(table);
    }

    pub fn heal(&mut self) {
        self.failing = None;
    }

    /// Descriptions of every operation executed so far.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn rows(&self, table: Table) -> &[Map<String, Value>] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("srv-{}", self.next_id)
    }

    fn object(op: &RemoteOp, v: &Value) -> Result<Map<String, Value>> {
        v.as_object()
            .cloned()
            .ok_or_else(|| PlanError::remote(op.describe(), "row is not a JSON object"))
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, table: Table) -> Result<Vec<T>> {
        self.rows(table)
            .iter()
            .map(|r| Ok(serde_json::from_value(Value::Object(r.clone()))?))
            .collect()
    }
}

impl Remote for MemoryRemote {
    fn execute(&mut self, op: &RemoteOp) -> Result<Option<String>> {
        if self.failing == Some(op.table()) {
            return Err(PlanError::remote(op.describe(), "injected failure"));
        }
        self.log.push(op.describe());

        match op {
            RemoteOp::Insert { table, row, .. } => {
                let mut row = Self::object(op, row)?;
                let id = match row.get("id").and_then(Value::as_str) {
                    Some(id) => id.to_string(),
                    None => {
                        let id = self.assign_id();
                        row.insert("id".into(), Value::String(id.clone()));
                        id
                    }
                };
                self.tables.entry(*table).or_default().push(row);
                Ok(Some(id))
            }
            RemoteOp::Upsert { table, row } => {
                let row = Self::object(op, row)?;
                let rows = self.tables.entry(*table).or_default();
                match rows.iter_mut().find(|r| r.get("id") == row.get("id")) {
                    Some(existing) => existing.extend(row),
                    None => rows.push(row),
                }
                Ok(None)
            }
            RemoteOp::Update {
                table,
                filter,
                patch,
            } => {
                let patch = Self::object(op, patch)?;
                let rows = self.tables.entry(*table).or_default();
                let mut hit = false;
                for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                    row.extend(patch.clone());
                    hit = true;
                }
                // The settings row is created on first write.
                if !hit && *table == Table::Settings {
                    let mut row = patch;
                    row.insert(filter.column.to_string(), filter.value.clone());
                    rows.push(row);
                }
                Ok(None)
            }
            RemoteOp::Delete { table, filter } => {
                if let Some(rows) = self.tables.get_mut(table) {
                    rows.retain(|r| !filter.matches(r));
                }
                Ok(None)
            }
        }
    }

    fn fetch(&mut self) -> Result<PlanningState> {
        let members: Vec<MemberRow> = self.decode(Table::Members)?;
        let settings: Vec<SettingsRow> = self.decode(Table::Settings)?;
        let stories: Vec<StoryRow> = self.decode(Table::Stories)?;
        let sub_tasks: Vec<SubTaskRow> = self.decode(Table::SubTasks)?;
        Ok(assemble_state(
            members,
            settings.into_iter().next(),
            stories,
            sub_tasks,
        ))
    }
}
