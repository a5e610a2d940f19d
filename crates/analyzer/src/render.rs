//! Per-cluster topology tables.

use crate::clusters::ClusterRecord;
use crate::collaborators::ServiceLookup;
use crate::session::SessionBindings;
use crate::settings::Settings;
use crate::table::Table;
use crate::topology::ServiceTopology;
use regex::Regex;
use std::sync::LazyLock;

/// `ns_1@` style node prefix.
static NODE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]*@").unwrap());

/// Strip the `<prefix>@` part of a node name.
pub fn short_node_name(node: &str) -> &str {
    match NODE_PREFIX_PATTERN.find(node) {
        Some(m) => &node[m.end()..],
        None => node,
    }
}

/// Render the node x service matrix of a cluster.
///
/// Returns `None` for clusters without service support. With a session
/// attached, the `n#` column carries node ids and every membership is
/// bound to a service id.
pub fn render_cluster(
    record: &ClusterRecord,
    lookup: &dyn ServiceLookup,
    settings: &Settings,
    session: Option<&mut SessionBindings>,
) -> Option<String> {
    let topology = ServiceTopology::build(record, lookup)?;
    Some(membership_table(record, &topology, settings, session).render())
}

/// The matrix for a cluster whose topology is already known.
pub fn membership_table(
    record: &ClusterRecord,
    topology: &ServiceTopology,
    settings: &Settings,
    mut session: Option<&mut SessionBindings>,
) -> Table {
    let mut table = Table::new(
        format!("Cluster ({}) (nodes: {})", record.name, record.node_count()),
        true,
    );
    table.set_padding(settings.padding);

    let service_names: Vec<&str> = topology.service_names().collect();
    table.add_headings(["node", "n#", "services:"]);
    table.add_headings(service_names.iter().copied());

    for (i, node) in record.sorted_nodes().iter().enumerate() {
        let label = match session.as_deref_mut() {
            Some(bindings) => bindings.bind_node(node),
            None => i.to_string(),
        };

        let mut row = vec![node.clone(), label, String::new()];
        for service in &service_names {
            if let Some(bindings) = session.as_deref_mut() {
                bindings.declare_service(service);
            }
            if topology.is_member(service, node) {
                row.push(settings.member_marker.clone());
                if let Some(bindings) = session.as_deref_mut() {
                    bindings.bind_service_role(service, node);
                }
            } else {
                row.push(settings.non_member_marker.clone());
            }
        }
        table.add_row(row);
    }

    table
}

/// Render one row per service with its member count.
///
/// Single members are shown by short name; larger groups by the cluster's
/// summary name for them.
pub fn render_service_summary(
    record: &ClusterRecord,
    lookup: &dyn ServiceLookup,
    settings: &Settings,
) -> Option<String> {
    let topology = ServiceTopology::build(record, lookup)?;

    let mut table = Table::new(format!("Cluster ({})", record.name), true);
    table.set_padding(settings.padding);
    table.add_headings(["Service", "Total", "Nodes"]);

    for service in topology.service_names() {
        let members = topology.members(service);
        let nodes = match members {
            [only] => short_node_name(only).to_string(),
            _ => record.cluster.summarize_name(members),
        };
        table.add_row(vec![service.to_string(), members.len().to_string(), nodes]);
    }

    Some(table.render())
}
