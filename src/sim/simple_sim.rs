use crate::netlist::{cell_family, Driver, Node, NodeId, WireId};
use crate::{EvalError, Netlist};

/// Logic function of a cell, evaluated on 64 patterns at once
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Function {
    /// And of all inputs, with optional inversion of the inputs and the output
    Andn { inv_in: bool, inv_out: bool },
    /// Xor of all inputs, with optional inversion of the output
    Xorn { inv_out: bool },
    Buf,
    Not,
    /// Select first: `s ? a : b`
    Mux,
    /// Select last, with ports A, B, S: `S ? B : A`
    Mux2,
    Maj,
    /// Sum and carry on ports S and CO
    FullAdder,
    /// Sum and carry on ports S and CO
    HalfAdder,
    Const(bool),
}

impl Function {
    /// Find the function of a node from its cell type and ports
    fn from_node(node: &Node) -> Option<Function> {
        use Function::*;
        let upper = node.cell().to_ascii_uppercase();
        if upper.starts_with("LOGIC0") || upper.starts_with("TIELO") {
            return Some(Const(false));
        }
        if upper.starts_with("LOGIC1") || upper.starts_with("TIEHI") {
            return Some(Const(true));
        }
        let nb = node.inputs().len();
        let f = match cell_family(node.cell()).as_str() {
            "AND" => Andn {
                inv_in: false,
                inv_out: false,
            },
            "NAND" => Andn {
                inv_in: false,
                inv_out: true,
            },
            "OR" => Andn {
                inv_in: true,
                inv_out: true,
            },
            "NOR" => Andn {
                inv_in: true,
                inv_out: false,
            },
            "XOR" => Xorn { inv_out: false },
            "XNOR" => Xorn { inv_out: true },
            "BUF" | "CLKBUF" if nb == 1 => Buf,
            "NOT" | "INV" if nb == 1 => Not,
            "MUX" if nb == 3 => {
                if node.inputs().iter().any(|p| p.name.eq_ignore_ascii_case("S")) {
                    Mux2
                } else {
                    Mux
                }
            }
            "MAJ" if nb == 3 => Maj,
            "FA" if nb == 3 => FullAdder,
            "HA" if nb == 2 => HalfAdder,
            _ => return None,
        };
        if nb == 0 {
            return None;
        }
        Some(f)
    }
}

fn maj(a: u64, b: u64, c: u64) -> u64 {
    (b & c) | (a & (b | c))
}

fn mux(s: u64, a: u64, b: u64) -> u64 {
    (s & a) | (!s & b)
}

fn const_word(b: bool) -> u64 {
    if b {
        !0
    } else {
        0
    }
}

/// Returns whether an output port of an adder cell carries the carry
fn is_carry_port(name: &str) -> bool {
    name.to_ascii_uppercase().starts_with('C')
}

/// Structure for simulation based directly on the netlist representation, honoring deletion marks
pub struct SimpleSimulator<'a> {
    netlist: &'a Netlist,
    functions: Vec<Option<Function>>,
    input_values: Vec<u64>,
    wire_values: Vec<u64>,
}

impl<'a> SimpleSimulator<'a> {
    /// Prepare the simulation; fails if a live node has no known logic function
    pub fn from_netlist(netlist: &'a Netlist) -> Result<SimpleSimulator<'a>, EvalError> {
        let mut functions = Vec::with_capacity(netlist.nb_nodes());
        for n in netlist.node_ids() {
            if netlist.is_deleted(n) {
                functions.push(None);
                continue;
            }
            let node = netlist.node(n);
            match Function::from_node(node) {
                Some(f) => functions.push(Some(f)),
                None => {
                    return Err(EvalError::UnsupportedCell {
                        cell: node.cell().to_owned(),
                        var: node.var().to_owned(),
                    })
                }
            }
        }
        Ok(SimpleSimulator {
            netlist,
            functions,
            input_values: vec![0; netlist.nb_inputs()],
            wire_values: vec![0; netlist.nb_wires()],
        })
    }

    /// Simulate 64 patterns; return one word per primary output
    pub fn run_comb(&mut self, inputs: &[u64]) -> Vec<u64> {
        self.copy_inputs(inputs);
        let netlist = self.netlist;
        for n in netlist.topological_order() {
            self.run_node(*n);
        }
        self.get_output_values()
    }

    /// Value of a wire after the last run
    pub fn get_value(&self, w: WireId) -> u64 {
        let r = self.netlist.root(w);
        match self.netlist.driver(r) {
            Driver::Input(i) => self.input_values[i],
            Driver::Constant(b) => const_word(b),
            Driver::Node(_) | Driver::Alias(_) => self.wire_values[r.index()],
        }
    }

    fn copy_inputs(&mut self, inputs: &[u64]) {
        assert_eq!(inputs.len(), self.input_values.len());
        self.input_values.copy_from_slice(inputs);
    }

    fn run_node(&mut self, n: NodeId) {
        let netlist = self.netlist;
        let node = netlist.node(n);
        let f = match self.functions[n.index()] {
            Some(f) => f,
            None => {
                let v = const_word(netlist.replacement_value(n));
                for w in node.output_wires() {
                    self.wire_values[w.index()] = v;
                }
                return;
            }
        };
        let ins: Vec<u64> = node.input_wires().map(|w| self.get_value(w)).collect();
        for port in node.outputs() {
            let v = match f {
                Function::Andn { inv_in, inv_out } => compute_andn(&ins, inv_in, inv_out),
                Function::Xorn { inv_out } => compute_xorn(&ins, inv_out),
                Function::Buf => ins[0],
                Function::Not => !ins[0],
                Function::Mux => mux(ins[0], ins[1], ins[2]),
                Function::Mux2 => {
                    // Data inputs in declaration order, wherever the select is
                    let mut data = Vec::new();
                    let mut sel = 0;
                    for (p, v) in node.inputs().iter().zip(&ins) {
                        if p.name.eq_ignore_ascii_case("S") {
                            sel = *v;
                        } else {
                            data.push(*v);
                        }
                    }
                    mux(sel, data[1], data[0])
                }
                Function::Maj => maj(ins[0], ins[1], ins[2]),
                Function::FullAdder => {
                    if is_carry_port(&port.name) {
                        maj(ins[0], ins[1], ins[2])
                    } else {
                        ins[0] ^ ins[1] ^ ins[2]
                    }
                }
                Function::HalfAdder => {
                    if is_carry_port(&port.name) {
                        ins[0] & ins[1]
                    } else {
                        ins[0] ^ ins[1]
                    }
                }
                Function::Const(b) => const_word(b),
            };
            self.wire_values[port.wire.index()] = v;
        }
    }

    fn get_output_values(&self) -> Vec<u64> {
        let mut ret = Vec::new();
        for o in 0..self.netlist.nb_outputs() {
            ret.push(self.get_value(self.netlist.output(o)));
        }
        ret
    }
}

fn compute_andn(v: &[u64], inv_in: bool, inv_out: bool) -> u64 {
    let inv = const_word(inv_in);
    let mut ret = !0u64;
    for s in v {
        ret &= s ^ inv;
    }
    if inv_out {
        !ret
    } else {
        ret
    }
}

fn compute_xorn(v: &[u64], inv_out: bool) -> u64 {
    let mut ret = 0u64;
    for s in v {
        ret ^= s;
    }
    if inv_out {
        !ret
    } else {
        ret
    }
}
