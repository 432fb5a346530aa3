//! Structural Verilog output

use std::io::Write;

use itertools::Itertools;

use crate::netlist::{AssignSource, WireId};
use crate::{FileError, Netlist};

/// Escape a name if it is not a simple Verilog identifier
///
/// Bit-indexed names such as `a[3]` are escaped as well, since each wire is a scalar.
fn escape(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if simple {
        name.to_owned()
    } else {
        format!("\\{} ", name)
    }
}

fn verilog_constant(value: bool) -> &'static str {
    if value {
        "1'b1"
    } else {
        "1'b0"
    }
}

/// Write the pruned netlist as a structural Verilog module
///
/// Deleted nodes are omitted; the wires they still drive are assigned their replacement constant.
pub fn write_verilog<W: Write>(
    w: &mut W,
    netlist: &Netlist,
    module: &str,
) -> Result<(), FileError> {
    let emission = netlist.emission();
    let name = |wire: WireId| escape(netlist.wire_name(wire));

    let mut ports: Vec<WireId> = netlist.inputs().to_vec();
    for o in netlist.outputs() {
        if !ports.contains(o) {
            ports.push(*o);
        }
    }
    let port_list = ports.iter().map(|p| name(*p)).join(", ");
    writeln!(w, "// Generated by axprune")?;
    writeln!(w, "module {} ({});", escape(module), port_list)?;
    for i in netlist.inputs() {
        writeln!(w, "  input {};", name(*i))?;
    }
    for o in netlist.outputs() {
        if !netlist.is_primary_input(*o) {
            writeln!(w, "  output {};", name(*o))?;
        }
    }
    for wire in &emission.wires {
        writeln!(w, "  wire {};", name(*wire))?;
    }
    writeln!(w)?;
    for n in &emission.nodes {
        let node = netlist.node(*n);
        let bindings = node
            .inputs()
            .iter()
            .chain(node.outputs())
            .map(|p| format!(".{}({})", p.name, name(p.wire)))
            .join(", ");
        writeln!(w, "  {} {} ({});", node.cell(), escape(node.var()), bindings)?;
    }
    for (wire, value) in &emission.constants {
        writeln!(w, "  assign {} = {};", name(*wire), verilog_constant(*value))?;
    }
    for a in &emission.assignments {
        let source = match a.source {
            AssignSource::Wire(s) => name(s),
            AssignSource::Constant(b) => verilog_constant(b).to_owned(),
        };
        writeln!(w, "  assign {} = {};", name(a.target), source)?;
    }
    writeln!(w, "endmodule")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{escape, write_verilog};
    use crate::netlist::generators::adder;

    #[test]
    fn test_escape() {
        assert_eq!(escape("n1"), "n1");
        assert_eq!(escape("_x$2"), "_x$2");
        assert_eq!(escape("a[3]"), "\\a[3] ");
        assert_eq!(escape("1abc"), "\\1abc ");
    }

    #[test]
    fn test_write() {
        let mut nl = adder::full_adder();
        nl.delete("a2");
        let mut buf = Vec::new();
        write_verilog(&mut buf, &nl, "fa").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("// Generated by axprune\nmodule fa (a, b, cin, s, cout);"));
        assert!(text.contains("  XOR x1 (.A(a), .B(b), .Z(p));"));
        assert!(text.contains("  assign t = 1'b0;"));
        assert!(!text.contains("a2"));
        assert!(text.trim_end().ends_with("endmodule"));
    }
}
