//! Construction and validation of netlists

use std::collections::VecDeque;

use fxhash::FxHashSet;

use crate::netlist::netlist::Topology;
use crate::netlist::node::{
    default_input_port, AssignSource, Assignment, Driver, Node, NodeId, Port, WireId,
    DEFAULT_OUTPUT_PORT,
};
use crate::{Netlist, NetlistError};

#[derive(Clone, Debug)]
struct NodeDecl {
    cell: String,
    var: String,
    inputs: Vec<(String, String)>,
    outputs: Vec<(String, String)>,
}

#[derive(Clone, Debug)]
enum SourceDecl {
    Wire(String),
    Constant(bool),
}

/// Collect the declarations of a netlist, then validate them into a [`Netlist`]
///
/// ```
/// # use axprune::NetlistBuilder;
/// let mut b = NetlistBuilder::new();
/// b.add_input("a").add_input("b").add_output("y");
/// b.add_node("NAND2_X1", "g1", &[("A1", "a"), ("A2", "b")], &[("ZN", "y")]);
/// let netlist = b.build().unwrap();
/// assert_eq!(netlist.nb_nodes(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct NetlistBuilder {
    inputs: Vec<String>,
    outputs: Vec<String>,
    nodes: Vec<NodeDecl>,
    assignments: Vec<(String, SourceDecl)>,
}

impl NetlistBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a primary input
    pub fn add_input(&mut self, name: &str) -> &mut Self {
        self.inputs.push(name.to_owned());
        self
    }

    /// Declare a primary output
    pub fn add_output(&mut self, name: &str) -> &mut Self {
        self.outputs.push(name.to_owned());
        self
    }

    /// Declare a cell instance with named port bindings `(port, wire)`
    pub fn add_node(
        &mut self,
        cell: &str,
        var: &str,
        inputs: &[(&str, &str)],
        outputs: &[(&str, &str)],
    ) -> &mut Self {
        let own = |v: &[(&str, &str)]| -> Vec<(String, String)> {
            v.iter()
                .map(|(p, w)| (p.to_string(), w.to_string()))
                .collect()
        };
        self.nodes.push(NodeDecl {
            cell: cell.to_owned(),
            var: var.to_owned(),
            inputs: own(inputs),
            outputs: own(outputs),
        });
        self
    }

    /// Declare a single-output cell instance with default port names, named after its output wire
    pub fn add_gate(&mut self, cell: &str, output: &str, inputs: &[&str]) -> &mut Self {
        self.nodes.push(NodeDecl {
            cell: cell.to_owned(),
            var: output.to_owned(),
            inputs: inputs
                .iter()
                .enumerate()
                .map(|(i, w)| (default_input_port(i), w.to_string()))
                .collect(),
            outputs: vec![(DEFAULT_OUTPUT_PORT.to_owned(), output.to_owned())],
        });
        self
    }

    /// Declare an assignment copying a wire
    pub fn add_assign(&mut self, target: &str, source: &str) -> &mut Self {
        self.assignments
            .push((target.to_owned(), SourceDecl::Wire(source.to_owned())));
        self
    }

    /// Declare an assignment of a constant
    pub fn add_constant(&mut self, target: &str, value: bool) -> &mut Self {
        self.assignments
            .push((target.to_owned(), SourceDecl::Constant(value)));
        self
    }

    /// Return the number of nodes declared so far
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Validate the declarations and build the netlist
    pub fn build(&self) -> Result<Netlist, NetlistError> {
        let mut topo = Topology::default();

        // Interning
        let intern = |topo: &mut Topology, name: &str| -> WireId {
            if let Some(w) = topo.wire_ids.get(name) {
                return *w;
            }
            let w = WireId::from_index(topo.wire_names.len());
            topo.wire_names.push(name.to_owned());
            topo.wire_ids.insert(name.to_owned(), w);
            w
        };
        for name in &self.inputs {
            if topo.wire_ids.contains_key(name.as_str()) {
                return Err(NetlistError::DuplicateInput(name.clone()));
            }
            let w = intern(&mut topo, name);
            topo.inputs.push(w);
        }
        let mut seen_outputs = FxHashSet::default();
        for name in &self.outputs {
            if !seen_outputs.insert(name.as_str()) {
                return Err(NetlistError::DuplicateOutput(name.clone()));
            }
            let w = intern(&mut topo, name);
            topo.outputs.push(w);
        }
        for decl in &self.nodes {
            if topo.node_ids.contains_key(decl.var.as_str()) {
                return Err(NetlistError::DuplicateInstance(decl.var.clone()));
            }
            if decl.outputs.is_empty() {
                return Err(NetlistError::NoOutput(decl.var.clone()));
            }
            let mut port_names = FxHashSet::default();
            for (port, wire) in decl.inputs.iter().chain(decl.outputs.iter()) {
                if port.is_empty() || wire.is_empty() {
                    return Err(NetlistError::EmptyBinding(decl.var.clone()));
                }
                if !port_names.insert(port.as_str()) {
                    return Err(NetlistError::DuplicatePort {
                        var: decl.var.clone(),
                        port: port.clone(),
                    });
                }
            }
            let mut bind = |v: &Vec<(String, String)>| -> Vec<Port> {
                v.iter()
                    .map(|(port, wire)| Port {
                        name: port.clone(),
                        wire: intern(&mut topo, wire),
                    })
                    .collect()
            };
            let inputs = bind(&decl.inputs);
            let outputs = bind(&decl.outputs);
            let id = NodeId::from_index(topo.nodes.len());
            topo.node_ids.insert(decl.var.clone(), id);
            topo.nodes.push(Node {
                cell: decl.cell.clone(),
                var: decl.var.clone(),
                inputs,
                outputs,
            });
        }
        for (target, source) in &self.assignments {
            let target = intern(&mut topo, target);
            let source = match source {
                SourceDecl::Wire(s) => AssignSource::Wire(intern(&mut topo, s)),
                SourceDecl::Constant(b) => AssignSource::Constant(*b),
            };
            topo.assignments.push(Assignment { target, source });
        }

        // Drivers
        let nb_wires = topo.wire_names.len();
        let mut drivers: Vec<Option<Driver>> = vec![None; nb_wires];
        let mut set_driver = |w: WireId, d: Driver| -> Result<(), NetlistError> {
            if drivers[w.index()].is_some() {
                return Err(NetlistError::MultipleDrivers(
                    topo.wire_names[w.index()].clone(),
                ));
            }
            drivers[w.index()] = Some(d);
            Ok(())
        };
        for (i, w) in topo.inputs.iter().enumerate() {
            set_driver(*w, Driver::Input(i))?;
        }
        for (i, node) in topo.nodes.iter().enumerate() {
            for w in node.output_wires() {
                set_driver(w, Driver::Node(NodeId::from_index(i)))?;
            }
        }
        for a in &topo.assignments {
            let d = match a.source {
                AssignSource::Wire(s) => Driver::Alias(s),
                AssignSource::Constant(b) => Driver::Constant(b),
            };
            set_driver(a.target, d)?;
        }
        for node in &topo.nodes {
            for w in node.input_wires() {
                if drivers[w.index()].is_none() {
                    return Err(NetlistError::DanglingWire {
                        wire: topo.wire_names[w.index()].clone(),
                        var: node.var.clone(),
                    });
                }
            }
        }
        for a in &topo.assignments {
            if let AssignSource::Wire(s) = a.source {
                if drivers[s.index()].is_none() {
                    return Err(NetlistError::DanglingAssignment {
                        target: topo.wire_names[a.target.index()].clone(),
                        copied: topo.wire_names[s.index()].clone(),
                    });
                }
            }
        }
        for w in &topo.outputs {
            if drivers[w.index()].is_none() {
                return Err(NetlistError::UndrivenOutput(
                    topo.wire_names[w.index()].clone(),
                ));
            }
        }
        // Every wire is now driven: interned wires are either inputs, outputs, node ports or
        // assignment endpoints, and all of these were checked above
        topo.drivers = drivers
            .into_iter()
            .map(|d| d.unwrap_or(Driver::Constant(false)))
            .collect();

        topo.roots = compute_roots(&topo)?;
        compute_reach(&mut topo);
        compute_adjacency(&mut topo);
        topo.order = topological_order(&topo)?;

        Ok(Netlist::from_topology(topo))
    }
}

/// Follow assignment chains to the wire that actually carries the value
fn compute_roots(topo: &Topology) -> Result<Vec<WireId>, NetlistError> {
    let nb_wires = topo.wire_names.len();
    let mut roots = Vec::with_capacity(nb_wires);
    for i in 0..nb_wires {
        let mut w = WireId::from_index(i);
        let mut steps = 0;
        while let Driver::Alias(s) = topo.drivers[w.index()] {
            w = s;
            steps += 1;
            if steps > nb_wires {
                return Err(NetlistError::AssignmentCycle(topo.wire_names[i].clone()));
            }
        }
        roots.push(w);
    }
    Ok(roots)
}

/// Propagate consumers and output positions up the assignment chains
fn compute_reach(topo: &mut Topology) {
    let nb_wires = topo.wire_names.len();
    let mut consumers = vec![Vec::new(); nb_wires];
    let mut positions = vec![Vec::new(); nb_wires];
    for (i, node) in topo.nodes.iter().enumerate() {
        for w in node.input_wires() {
            consumers[w.index()].push(NodeId::from_index(i));
        }
    }
    for (i, w) in topo.outputs.iter().enumerate() {
        positions[w.index()].push(i);
    }

    let mut reach_consumers = consumers.clone();
    let mut reach_positions = positions.clone();
    for i in 0..nb_wires {
        if consumers[i].is_empty() && positions[i].is_empty() {
            continue;
        }
        let mut w = WireId::from_index(i);
        while let Driver::Alias(s) = topo.drivers[w.index()] {
            reach_consumers[s.index()].extend_from_slice(&consumers[i]);
            reach_positions[s.index()].extend_from_slice(&positions[i]);
            w = s;
        }
    }
    for v in reach_consumers.iter_mut() {
        v.sort();
        v.dedup();
    }
    for v in reach_positions.iter_mut() {
        v.sort();
        v.dedup();
    }
    topo.consumers = reach_consumers;
    topo.output_positions = reach_positions;
}

fn compute_adjacency(topo: &mut Topology) {
    let nb_nodes = topo.nodes.len();
    let mut parents = vec![Vec::new(); nb_nodes];
    let mut children = vec![Vec::new(); nb_nodes];
    for (i, node) in topo.nodes.iter().enumerate() {
        for w in node.input_wires() {
            if let Driver::Node(d) = topo.drivers[topo.roots[w.index()].index()] {
                parents[i].push(d);
                children[d.index()].push(NodeId::from_index(i));
            }
        }
    }
    for v in parents.iter_mut().chain(children.iter_mut()) {
        v.sort();
        v.dedup();
    }
    topo.parents = parents;
    topo.children = children;
}

/// Sort the nodes so that each comes after its drivers, lowest index first among ready nodes
fn topological_order(topo: &Topology) -> Result<Vec<NodeId>, NetlistError> {
    let nb_nodes = topo.nodes.len();
    let mut remaining: Vec<usize> = topo.parents.iter().map(|f| f.len()).collect();
    let mut ready: VecDeque<NodeId> = (0..nb_nodes)
        .filter(|i| remaining[*i] == 0)
        .map(NodeId::from_index)
        .collect();
    let mut order = Vec::with_capacity(nb_nodes);
    while let Some(n) = ready.pop_front() {
        order.push(n);
        for c in &topo.children[n.index()] {
            remaining[c.index()] -= 1;
            if remaining[c.index()] == 0 {
                ready.push_back(*c);
            }
        }
    }
    if order.len() != nb_nodes {
        let stuck = remaining.iter().position(|r| *r != 0).unwrap_or(0);
        return Err(NetlistError::CombinationalLoop(
            topo.nodes[stuck].var.clone(),
        ));
    }
    Ok(order)
}
