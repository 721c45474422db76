//! Voltage grouping of lines and parallel index assignment.
//!
//! Lines are first split by nominal voltage (highest first), then clustered
//! by the unordered pair of substations they connect. Members of a cluster
//! are fanned out symmetrically around the straight substation-to-substation
//! axis: a cluster of `n` lines gets indices `-(n-1)/2, ..., (n-1)/2` in
//! units of the configured spacing between lines.

use std::collections::HashMap;

use gridmap_core::{Diagnostics, Kilovolts, NetworkIndex, Side};
use serde::Serialize;
use tracing::{debug, warn};

/// Members of a cluster beyond this count are not fanned out further.
pub const MAX_PARALLEL_LINES: usize = 32;

/// The running index stops increasing once it reaches this value.
pub const MAX_PARALLEL_INDEX: f64 = 15.0;

/// Swap-invariant key of a pair of substations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMember {
    pub line_id: String,
    /// Index in the cluster frame, oriented like the cluster's first member.
    pub slot: f64,
    /// Index in the line's own side 1 to side 2 frame; this is the value the
    /// lateral offset is computed from.
    pub parallel_index: f64,
    /// The line runs against the cluster frame (side 1 away from `origin`).
    pub reversed: bool,
}

/// Lines of one voltage group connecting the same two substations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub key: PairKey,
    /// Side 1 substation of the first member.
    pub origin: String,
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn line_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.line_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoltageGroup {
    pub nominal_v: Kilovolts,
    /// Every line of this voltage, in network order, clustered or not.
    pub line_ids: Vec<String>,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Membership {
    group: usize,
    cluster: Option<(usize, usize)>,
}

/// Result of [`group_lines`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    /// Voltage groups ordered by decreasing nominal voltage.
    pub groups: Vec<VoltageGroup>,
    memberships: HashMap<String, Membership>,
}

impl Grouping {
    pub fn line_count(&self) -> usize {
        self.memberships.len()
    }

    pub fn contains(&self, line_id: &str) -> bool {
        self.memberships.contains_key(line_id)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.groups.iter().flat_map(|g| g.clusters.iter())
    }

    pub fn group_of(&self, line_id: &str) -> Option<&VoltageGroup> {
        let m = self.memberships.get(line_id)?;
        self.groups.get(m.group)
    }

    pub fn cluster_of(&self, line_id: &str) -> Option<&Cluster> {
        let m = self.memberships.get(line_id)?;
        let (cluster, _) = m.cluster?;
        self.groups.get(m.group)?.clusters.get(cluster)
    }

    pub fn member(&self, line_id: &str) -> Option<&ClusterMember> {
        let m = self.memberships.get(line_id)?;
        let (cluster, member) = m.cluster?;
        self.groups
            .get(m.group)?
            .clusters
            .get(cluster)?
            .members
            .get(member)
    }

    /// Parallel index of a line; 0 for self-loops and unclustered lines.
    pub fn parallel_index(&self, line_id: &str) -> f64 {
        self.member(line_id).map_or(0.0, |m| m.parallel_index)
    }
}

/// Parallel indices for a cluster of `size` lines, in member order.
pub fn parallel_indices(size: usize, enabled: bool) -> Vec<f64> {
    if !enabled {
        return vec![0.0; size];
    }
    let truncated = size.min(MAX_PARALLEL_LINES);
    let mut index = -(truncated as f64 - 1.0) / 2.0;
    let mut indices = Vec::with_capacity(size);
    for _ in 0..size {
        indices.push(index);
        if index < MAX_PARALLEL_INDEX {
            index += 1.0;
        }
    }
    indices
}

/// Group every line of `network` by voltage and substation pair.
///
/// The nominal voltage comes from the side 1 voltage level when it resolves,
/// from side 2 otherwise; a line with neither is skipped and reported. Lines
/// whose two ends sit in the same substation, or whose substations cannot be
/// resolved, belong to their voltage group without joining a cluster.
pub fn group_lines<N: NetworkIndex>(
    network: &N,
    parallel_enabled: bool,
    diagnostics: &mut Diagnostics,
) -> Grouping {
    let mut groups: Vec<VoltageGroup> = Vec::new();
    // (group, pair) -> cluster position
    let mut cluster_slots: HashMap<(usize, PairKey), usize> = HashMap::new();
    let mut placements: Vec<(String, usize, Option<(PairKey, String)>)> = Vec::new();

    for line in network.lines() {
        let vl1 = network.voltage_level(line.voltage_level_id(Side::One));
        let vl2 = network.voltage_level(line.voltage_level_id(Side::Two));
        let Some(nominal_v) = vl1.or(vl2).map(|vl| vl.nominal_v) else {
            warn!(line = %line.id, "no voltage level resolves, line left out of grouping");
            diagnostics.add_warning_with_entity(
                "grouping",
                "neither endpoint voltage level is known",
                &line.id,
            );
            continue;
        };

        let group = match groups.iter().position(|g| g.nominal_v == nominal_v) {
            Some(i) => i,
            None => {
                groups.push(VoltageGroup {
                    nominal_v,
                    line_ids: Vec::new(),
                    clusters: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[group].line_ids.push(line.id.clone());

        let ends = match (vl1, vl2) {
            (Some(a), Some(b))
                if network.substation(&a.substation_id).is_some()
                    && network.substation(&b.substation_id).is_some() =>
            {
                Some((a.substation_id.as_str(), b.substation_id.as_str()))
            }
            _ => None,
        };
        let cluster = match ends {
            Some((from, to)) if from != to => Some((PairKey::new(from, to), from.to_string())),
            _ => None,
        };
        placements.push((line.id.clone(), group, cluster));
    }

    // Sort groups by decreasing voltage, remapping the indices recorded above.
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by(|&a, &b| groups[b].nominal_v.0.total_cmp(&groups[a].nominal_v.0));
    let mut remap = vec![0; groups.len()];
    for (new, &old) in order.iter().enumerate() {
        remap[old] = new;
    }
    let mut slots: Vec<Option<VoltageGroup>> = groups.into_iter().map(Some).collect();
    let mut groups: Vec<VoltageGroup> = order.iter().filter_map(|&old| slots[old].take()).collect();

    let mut memberships = HashMap::with_capacity(placements.len());
    for (line_id, old_group, cluster) in placements {
        let group = remap[old_group];
        let cluster = cluster.map(|(key, from)| {
            let clusters = &mut groups[group].clusters;
            let position = *cluster_slots.entry((group, key.clone())).or_insert_with(|| {
                clusters.push(Cluster {
                    key,
                    origin: from.clone(),
                    members: Vec::new(),
                });
                clusters.len() - 1
            });
            let cluster = &mut clusters[position];
            let reversed = cluster.origin != from;
            cluster.members.push(ClusterMember {
                line_id: line_id.clone(),
                slot: 0.0,
                parallel_index: 0.0,
                reversed,
            });
            (position, cluster.members.len() - 1)
        });
        memberships.insert(line_id, Membership { group, cluster });
    }

    for group in &mut groups {
        for cluster in &mut group.clusters {
            if cluster.len() > MAX_PARALLEL_LINES {
                warn!(
                    pair = %cluster.key,
                    size = cluster.len(),
                    "more than {} parallel lines, extra lines will overlap",
                    MAX_PARALLEL_LINES
                );
            }
            let indices = parallel_indices(cluster.len(), parallel_enabled);
            for (member, slot) in cluster.members.iter_mut().zip(indices) {
                member.slot = slot;
                member.parallel_index = if member.reversed && slot != 0.0 {
                    -slot
                } else {
                    slot
                };
            }
        }
    }

    debug!(
        groups = groups.len(),
        lines = memberships.len(),
        "grouped lines by voltage and substation pair"
    );
    Grouping {
        groups,
        memberships,
    }
}
