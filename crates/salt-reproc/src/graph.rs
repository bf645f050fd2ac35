// ─────────────────────────────────────────────────────────────────────
// SCPN Salt Loop — Process Flow Graph
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Directed flow network of extraction processes.
//!
//! Parsed from a DOT subset:
//!
//! ```text
//! digraph saltloop {
//!     core -> sparger;
//!     sparger -> entrainment_separator [label="0.9"];
//!     entrainment_separator -> core;
//! }
//! ```
//!
//! Nodes live in an arena indexed by declaration order; edges are index
//! pairs with a split fraction. The node named `core` is the reactor
//! source; edges pointing back into `core` are return lanes and carry no
//! topological constraint. The executable subgraph must be acyclic and
//! fully reachable from `core`.

use std::collections::HashMap;

use salt_types::error::{SaltError, SaltResult};

use crate::process::ProcessLibrary;

pub type NodeIndex = usize;

/// Reserved name of the reactor-core source/sink node.
pub const CORE_NODE: &str = "core";

/// Split-fraction bookkeeping tolerance.
const FRACTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
struct RawEdge {
    from: NodeIndex,
    to: NodeIndex,
    fraction: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowEdge {
    pub to: NodeIndex,
    pub fraction: f64,
}

#[derive(Debug, Clone)]
pub struct ProcessGraph {
    nodes: Vec<String>,
    core: NodeIndex,
    /// Outgoing edges per node, declaration order, fractions resolved.
    outgoing: Vec<Vec<FlowEdge>>,
}

impl ProcessGraph {
    pub fn parse(text: &str) -> SaltResult<Self> {
        let body = extract_body(text)?;
        let mut nodes: Vec<String> = Vec::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        let mut raw_edges: Vec<RawEdge> = Vec::new();

        let mut intern = |name: &str, nodes: &mut Vec<String>,
                          index: &mut HashMap<String, NodeIndex>|
         -> NodeIndex {
            if let Some(&i) = index.get(name) {
                return i;
            }
            let i = nodes.len();
            nodes.push(name.to_string());
            index.insert(name.to_string(), i);
            i
        };

        for statement in split_statements(&body) {
            let (chain_text, fraction) = split_attributes(&statement)?;
            let names: Vec<String> = chain_text
                .split("->")
                .map(|part| unquote(part.trim()))
                .collect::<SaltResult<_>>()?;
            if names.iter().any(|n| n.is_empty()) {
                return Err(SaltError::Graph(format!(
                    "Malformed statement '{statement}'"
                )));
            }
            if names.len() == 1 {
                intern(&names[0], &mut nodes, &mut index);
                continue;
            }
            for pair in names.windows(2) {
                let from = intern(&pair[0], &mut nodes, &mut index);
                let to = intern(&pair[1], &mut nodes, &mut index);
                raw_edges.push(RawEdge { from, to, fraction });
            }
        }

        let core = *index.get(CORE_NODE).ok_or_else(|| {
            SaltError::Graph(format!(
                "Flow graph must declare a '{CORE_NODE}' source node"
            ))
        })?;

        let outgoing = resolve_fractions(&nodes, &raw_edges)?;
        Ok(ProcessGraph {
            nodes,
            core,
            outgoing,
        })
    }

    pub fn core(&self) -> NodeIndex {
        self.core
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_name(&self, node: NodeIndex) -> &str {
        &self.nodes[node]
    }

    pub fn outgoing(&self, node: NodeIndex) -> &[FlowEdge] {
        &self.outgoing[node]
    }

    /// Every non-core node must name a configured process.
    pub fn validate_processes(&self, library: &ProcessLibrary) -> SaltResult<()> {
        for (i, name) in self.nodes.iter().enumerate() {
            if i == self.core {
                continue;
            }
            if !library.contains(name) {
                return Err(SaltError::Graph(format!(
                    "Flow graph references undeclared process '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Deterministic topological order of the process nodes.
    ///
    /// Kahn's algorithm over the subgraph reachable from `core`; return
    /// edges into `core` are ignored. Ties break by declaration order,
    /// so repeated parses of the same description execute identically.
    pub fn resolve(&self) -> SaltResult<Vec<NodeIndex>> {
        // Reachability from core, ignoring return edges.
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![self.core];
        reachable[self.core] = true;
        while let Some(node) = stack.pop() {
            for edge in &self.outgoing[node] {
                if edge.to != self.core && !reachable[edge.to] {
                    reachable[edge.to] = true;
                    stack.push(edge.to);
                }
            }
        }
        if let Some(orphan) = (0..self.nodes.len()).find(|&i| !reachable[i]) {
            return Err(SaltError::Graph(format!(
                "Process '{}' is not reachable from '{CORE_NODE}'",
                self.nodes[orphan]
            )));
        }

        let mut indegree = vec![0usize; self.nodes.len()];
        for edges in &self.outgoing {
            for edge in edges {
                if edge.to != self.core {
                    indegree[edge.to] += 1;
                }
            }
        }

        // Ready set as a sorted list over declaration indices: pop the
        // lowest index first for the stable tie-break.
        let mut ready: Vec<NodeIndex> = indegree
            .iter()
            .enumerate()
            .filter(|&(i, &d)| d == 0 && reachable[i])
            .map(|(i, _)| i)
            .collect();
        ready.sort_unstable();

        let mut order = Vec::with_capacity(self.nodes.len());
        while !ready.is_empty() {
            let node = ready.remove(0);
            order.push(node);
            for edge in &self.outgoing[node] {
                if edge.to == self.core {
                    continue;
                }
                indegree[edge.to] -= 1;
                if indegree[edge.to] == 0 {
                    let pos = ready.binary_search(&edge.to).unwrap_or_else(|p| p);
                    ready.insert(pos, edge.to);
                }
            }
        }

        // A node the sort never released sits on a cycle.
        if let Some(stuck) = (0..self.nodes.len()).find(|i| !order.contains(i)) {
            return Err(SaltError::Graph(format!(
                "Flow graph contains a cycle through '{}'",
                self.nodes[stuck]
            )));
        }

        // Core is the source, not an executable process.
        Ok(order.into_iter().filter(|&i| i != self.core).collect())
    }
}

/// Resolve per-node split fractions: labeled edges keep their label,
/// unlabeled edges share the remainder equally. The labeled sum must not
/// exceed 1; any final remainder stays with (or returns to) the core.
fn resolve_fractions(nodes: &[String], raw: &[RawEdge]) -> SaltResult<Vec<Vec<FlowEdge>>> {
    let mut outgoing: Vec<Vec<RawEdge>> = vec![Vec::new(); nodes.len()];
    for edge in raw {
        outgoing[edge.from].push(edge.clone());
    }
    let mut resolved = Vec::with_capacity(nodes.len());
    for (node, edges) in outgoing.into_iter().enumerate() {
        let labeled_sum: f64 = edges.iter().filter_map(|e| e.fraction).sum();
        if labeled_sum > 1.0 + FRACTION_TOLERANCE {
            return Err(SaltError::Graph(format!(
                "Split fractions out of '{}' sum to {labeled_sum}, must not exceed 1",
                nodes[node]
            )));
        }
        let unlabeled = edges.iter().filter(|e| e.fraction.is_none()).count();
        let share = if unlabeled > 0 {
            (1.0 - labeled_sum) / unlabeled as f64
        } else {
            0.0
        };
        resolved.push(
            edges
                .into_iter()
                .map(|e| FlowEdge {
                    to: e.to,
                    fraction: e.fraction.unwrap_or(share),
                })
                .collect(),
        );
    }
    Ok(resolved)
}

/// Strip comments and pull out the `digraph { ... }` body.
fn extract_body(text: &str) -> SaltResult<String> {
    let mut cleaned = String::with_capacity(text.len());
    for line in text.lines() {
        let line = match line.find("//") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        cleaned.push_str(line);
        cleaned.push('\n');
    }
    let open = cleaned
        .find('{')
        .ok_or_else(|| SaltError::Graph("Missing '{' in graph description".to_string()))?;
    let close = cleaned
        .rfind('}')
        .ok_or_else(|| SaltError::Graph("Missing '}' in graph description".to_string()))?;
    let header = cleaned[..open].trim();
    if !header.starts_with("digraph") {
        return Err(SaltError::Graph(format!(
            "Flow graph must be a digraph, found header '{header}'"
        )));
    }
    Ok(cleaned[open + 1..close].to_string())
}

fn split_statements(body: &str) -> Vec<String> {
    body.replace('\n', ";")
        .split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a statement into its node chain and the optional
/// `[label="f"]` split fraction; other attributes are ignored.
fn split_attributes(statement: &str) -> SaltResult<(String, Option<f64>)> {
    let Some(open) = statement.find('[') else {
        return Ok((statement.to_string(), None));
    };
    let close = statement.rfind(']').ok_or_else(|| {
        SaltError::Graph(format!("Unclosed attribute block in '{statement}'"))
    })?;
    let attrs = &statement[open + 1..close];
    let chain = format!(
        "{}{}",
        &statement[..open],
        &statement[(close + 1).min(statement.len())..]
    );
    let mut fraction = None;
    for attr in attrs.split(',') {
        let Some((key, value)) = attr.split_once('=') else {
            continue;
        };
        if key.trim() == "label" {
            let raw = value.trim().trim_matches('"');
            let parsed: f64 = raw.parse().map_err(|_| {
                SaltError::Graph(format!("Split fraction '{raw}' is not a number"))
            })?;
            if !(0.0..=1.0).contains(&parsed) {
                return Err(SaltError::Graph(format!(
                    "Split fraction {parsed} must be in [0, 1]"
                )));
            }
            fraction = Some(parsed);
        }
    }
    Ok((chain, fraction))
}

fn unquote(token: &str) -> SaltResult<String> {
    let token = token.trim();
    if let Some(inner) = token.strip_prefix('"') {
        let inner = inner.strip_suffix('"').ok_or_else(|| {
            SaltError::Graph(format!("Unterminated quoted name '{token}'"))
        })?;
        return Ok(inner.to_string());
    }
    if token
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
    {
        return Err(SaltError::Graph(format!("Invalid node name '{token}'")));
    }
    Ok(token.to_string())
}
