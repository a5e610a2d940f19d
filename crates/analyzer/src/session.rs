//! Mnemonic session bindings for discovered nodes.
//!
//! Every rendered node gets an id like `n0`, and every service role it
//! plays gets an id like `kv0` or `index3`. Ids are handed out in render
//! order and never reused: a second run in the same session continues
//! numbering where the first one stopped.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Prefix of plain node ids.
pub const NODE_PREFIX: &str = "n";

/// Suffix of the id lists exposed to the host (`nAll`, `kvAll`, ...).
pub const LIST_SUFFIX: &str = "All";

/// Bindings accumulated over one interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionBindings {
    node_ids: Vec<String>,
    service_ids: BTreeMap<String, Vec<String>>,
    targets: BTreeMap<String, String>,
}

impl SessionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the next node id to `node`.
    pub fn bind_node(&mut self, node: &str) -> String {
        let id = self.next_free(NODE_PREFIX, self.node_ids.len());
        self.targets.insert(id.clone(), node.to_string());
        self.node_ids.push(id.clone());
        id
    }

    /// Make sure a service has an id list, even if nothing is bound yet.
    pub fn declare_service(&mut self, service: &str) {
        self.service_ids.entry(service.to_string()).or_default();
    }

    /// Bind the next id of `service` to `node`.
    pub fn bind_service_role(&mut self, service: &str, node: &str) -> String {
        let start = self.service_ids(service).len();
        let id = self.next_free(service, start);
        self.targets.insert(id.clone(), node.to_string());
        self.service_ids
            .entry(service.to_string())
            .or_default()
            .push(id.clone());
        id
    }

    // Ids share one namespace, so a prefix that collides with another
    // (service "n", or "kv" vs "kv1") skips ahead instead of rebinding.
    fn next_free(&self, prefix: &str, start: usize) -> String {
        (start..)
            .map(|k| format!("{}{}", prefix, k))
            .find(|id| !self.targets.contains_key(id))
            .unwrap_or_default()
    }

    /// Node bound to an id.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.targets.get(id).map(String::as_str)
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    pub fn service_ids(&self, service: &str) -> &[String] {
        self.service_ids
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Services seen so far, sorted.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.service_ids.keys().map(String::as_str)
    }

    /// Number of bound ids.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Drop every binding and restart numbering.
    pub fn reset(&mut self) {
        self.node_ids.clear();
        self.service_ids.clear();
        self.targets.clear();
    }

    /// The bindings as host variables: id lists plus one entry per id.
    pub fn namespace(&self) -> Map<String, Value> {
        self.namespace_beside(&Map::new())
    }

    /// The bindings as host variables placed next to the `taken` ones.
    ///
    /// An id already present in `taken` is left out. An id list whose
    /// name is in use moves to the next free `<prefix>All<k>`, so `nAll`
    /// always holds the node ids.
    pub fn namespace_beside(&self, taken: &Map<String, Value>) -> Map<String, Value> {
        let mut vars = Map::new();
        for (id, node) in &self.targets {
            if taken.contains_key(id) {
                warn!("Id {} is already a variable; not exported", id);
                continue;
            }
            vars.insert(id.clone(), Value::from(node.clone()));
        }

        let lists = std::iter::once((NODE_PREFIX, &self.node_ids)).chain(
            self.service_ids
                .iter()
                .map(|(service, ids)| (service.as_str(), ids)),
        );
        for (prefix, ids) in lists {
            let name = (0..)
                .map(|k| list_name(prefix, k))
                .find(|name| !taken.contains_key(name) && !vars.contains_key(name))
                .unwrap_or_default();
            if name != list_name(prefix, 0) {
                debug!("Id list of {} exported as {}", prefix, name);
            }
            vars.insert(name, Value::from(ids.clone()));
        }
        vars
    }
}

fn list_name(prefix: &str, k: usize) -> String {
    match k {
        0 => format!("{}{}", prefix, LIST_SUFFIX),
        k => format!("{}{}{}", prefix, LIST_SUFFIX, k),
    }
}
