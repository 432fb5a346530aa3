use std::fmt;

/// Index of a node (cell instance) in a netlist
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in declaration order
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(i: usize) -> NodeId {
        NodeId(i as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Index of a wire (named net) in a netlist
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct WireId(pub(crate) u32);

impl WireId {
    /// Position of the wire in the order it was first seen
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(i: usize) -> WireId {
        WireId(i as u32)
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// A named port of a node, bound to a wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    /// Name of the port on the cell
    pub name: String,
    /// Wire connected to the port
    pub wire: WireId,
}

/// Switching activity of a node output, obtained from simulation
///
/// Percentages are truncated, so `t0 + t1` may be slightly below 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Activity {
    /// Percentage of time the output is 0
    pub t0: u32,
    /// Percentage of time the output is 1
    pub t1: u32,
    /// Number of toggles
    pub toggles: u64,
}

impl Activity {
    /// Value the output takes most of the time; ties resolve to 0
    pub fn majority(&self) -> bool {
        self.t1 > self.t0
    }

    /// Percentage of time the output takes its majority value
    pub fn majority_percent(&self) -> u32 {
        self.t0.max(self.t1)
    }
}

/// A cell instance: type, instance name and port bindings
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) cell: String,
    pub(crate) var: String,
    pub(crate) inputs: Vec<Port>,
    pub(crate) outputs: Vec<Port>,
}

impl Node {
    /// Cell type of the node, such as AND or NAND2_X1
    pub fn cell(&self) -> &str {
        &self.cell
    }

    /// Unique instance name
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Input ports, in declaration order
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// Output ports, in declaration order
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Iterate over the wires read by the node
    pub fn input_wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.inputs.iter().map(|p| p.wire)
    }

    /// Iterate over the wires driven by the node
    pub fn output_wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.outputs.iter().map(|p| p.wire)
    }
}

/// Source of an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignSource {
    /// Copy of another wire
    Wire(WireId),
    /// Constant value
    Constant(bool),
}

/// Continuous assignment `target = source`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    /// Assigned wire
    pub target: WireId,
    /// Value copied to the wire
    pub source: AssignSource,
}

/// What drives a wire
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Driver {
    /// Primary input at this position
    Input(usize),
    /// Output of a node
    Node(NodeId),
    /// Constant assignment
    Constant(bool),
    /// Copy of another wire
    Alias(WireId),
}

/// Name of the i-th input port for cells without named ports, as in bench files
pub fn default_input_port(i: usize) -> String {
    if i < 26 {
        char::from(b'A' + i as u8).to_string()
    } else {
        format!("I{}", i)
    }
}

/// Name of the output port for cells without named ports, as in bench files
pub const DEFAULT_OUTPUT_PORT: &str = "Z";

/// Split a bus wire name such as `a[3]` into its base name and bit index
///
/// Names without an index are bit 0 of their own bus.
pub fn bit_index(name: &str) -> (&str, usize) {
    if let Some(stripped) = name.strip_suffix(']') {
        if let Some(pos) = stripped.rfind('[') {
            if let Ok(i) = stripped[pos + 1..].trim().parse::<usize>() {
                return (name[..pos].trim_end(), i);
            }
        }
    }
    (name, 0)
}

/// Logic family of a cell type, without drive strength and arity: `NAND2_X1` is `NAND`
pub fn cell_family(cell: &str) -> String {
    let upper = cell.to_ascii_uppercase();
    let base = match upper.rfind("_X") {
        Some(pos) if upper[pos + 2..].chars().all(|c| c.is_ascii_digit()) => &upper[..pos],
        _ => upper.as_str(),
    };
    base.trim_end_matches(|c: char| c.is_ascii_digit()).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_index() {
        assert_eq!(bit_index("a[3]"), ("a", 3));
        assert_eq!(bit_index("sum [12]"), ("sum", 12));
        assert_eq!(bit_index("carry"), ("carry", 0));
        assert_eq!(bit_index("x[y]"), ("x[y]", 0));
        assert_eq!(bit_index("b[0][1]"), ("b[0]", 1));
    }

    #[test]
    fn test_cell_family() {
        assert_eq!(cell_family("NAND2_X1"), "NAND");
        assert_eq!(cell_family("xor"), "XOR");
        assert_eq!(cell_family("INV_X4"), "INV");
        assert_eq!(cell_family("MUX2"), "MUX");
        assert_eq!(cell_family("FA_X1"), "FA");
        assert_eq!(cell_family("AOI21_X1"), "AOI");
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(default_input_port(0), "A");
        assert_eq!(default_input_port(2), "C");
        assert_eq!(default_input_port(30), "I30");
    }

    #[test]
    fn test_activity_majority() {
        let a = Activity {
            t0: 50,
            t1: 50,
            toggles: 3,
        };
        assert!(!a.majority());
        let b = Activity {
            t0: 20,
            t1: 80,
            toggles: 3,
        };
        assert!(b.majority());
        assert_eq!(b.majority_percent(), 80);
    }
}
