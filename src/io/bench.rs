//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read, Write};

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::netlist::AssignSource;
use crate::{FileError, Netlist, NetlistBuilder};

/// ABC-style names for constant signals
const CONSTANT_NAMES: [(&str, bool); 2] = [("gnd", false), ("vdd", true)];

fn parse_error(line: usize, message: String) -> FileError {
    FileError::Parse { line, message }
}

/// Read a netlist in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, gnd)
///     x3 = vdd
///     OUTPUT(x2)
/// ```
///
/// Each gate becomes a node named after its output wire, with input ports `A`, `B`, ... and
/// output port `Z`. Constants `gnd` and `vdd` become constant assignments.
pub fn read_bench<R: Read>(r: R) -> Result<Netlist, FileError> {
    let mut builder = NetlistBuilder::new();
    let mut defined = FxHashSet::default();
    let mut used = FxHashSet::default();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let line = i + 1;
        let s = l?;
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if !t.contains('=') {
            let parts: Vec<_> = t
                .split(&['(', ')'])
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return Err(parse_error(line, format!("malformed statement {}", t)));
            }
            match parts[0].to_uppercase().as_str() {
                "INPUT" | "PINPUT" => {
                    builder.add_input(parts[1]);
                    defined.insert(parts[1].to_owned());
                }
                "OUTPUT" | "POUTPUT" => {
                    builder.add_output(parts[1]);
                    used.insert(parts[1].to_owned());
                }
                _ => return Err(parse_error(line, format!("unknown keyword {}", parts[0]))),
            }
            continue;
        }
        let parts: Vec<_> = t
            .split(&['=', '(', ',', ')'])
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() < 2 {
            return Err(parse_error(line, format!("malformed statement {}", t)));
        }
        let (target, op, deps) = (parts[0], parts[1], &parts[2..]);
        defined.insert(target.to_owned());
        if let Some((_, value)) = CONSTANT_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(op))
        {
            if !deps.is_empty() {
                return Err(parse_error(line, format!("constant {} takes no input", op)));
            }
            builder.add_constant(target, *value);
            continue;
        }
        if op.to_uppercase().starts_with("LUT") {
            return Err(parse_error(line, "LUT gates are not supported".to_owned()));
        }
        if deps.is_empty() {
            return Err(parse_error(line, format!("gate {} has no input", op)));
        }
        used.extend(deps.iter().map(|d| d.to_string()));
        builder.add_gate(&op.to_uppercase(), target, deps);
    }
    for (name, value) in CONSTANT_NAMES {
        if used.contains(name) && !defined.contains(name) {
            builder.add_constant(name, value);
        }
    }
    Ok(builder.build()?)
}

fn bench_constant(value: bool) -> &'static str {
    if value {
        "vdd"
    } else {
        "gnd"
    }
}

/// Write the pruned netlist in .bench format
///
/// Deleted nodes are omitted, and the wires they still drive are assigned their replacement
/// constant. Wire-to-wire assignments are written as buffers.
pub fn write_bench<W: Write>(w: &mut W, netlist: &Netlist) -> Result<(), FileError> {
    let emission = netlist.emission();
    for n in &emission.nodes {
        if netlist.node(*n).outputs().len() != 1 {
            return Err(FileError::MultipleOutputs(netlist.var(*n).to_owned()));
        }
    }
    writeln!(w, "# .bench (ISCAS) file")?;
    writeln!(w, "# Generated by axprune")?;
    for i in netlist.inputs() {
        writeln!(w, "INPUT({})", netlist.wire_name(*i))?;
    }
    writeln!(w)?;
    for o in netlist.outputs() {
        writeln!(w, "OUTPUT({})", netlist.wire_name(*o))?;
    }
    writeln!(w)?;
    for n in &emission.nodes {
        let node = netlist.node(*n);
        let deps = node.input_wires().map(|i| netlist.wire_name(i)).join(", ");
        for o in node.output_wires() {
            writeln!(w, "{} = {}({})", netlist.wire_name(o), node.cell(), deps)?;
        }
    }
    for (wire, value) in &emission.constants {
        writeln!(w, "{} = {}", netlist.wire_name(*wire), bench_constant(*value))?;
    }
    for a in &emission.assignments {
        let target = netlist.wire_name(a.target);
        match a.source {
            AssignSource::Wire(s) => writeln!(w, "{} = BUF({})", target, netlist.wire_name(s))?,
            // Implicit when read back
            AssignSource::Constant(b) if target == bench_constant(b) => (),
            AssignSource::Constant(b) => writeln!(w, "{} = {}", target, bench_constant(b))?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_bench, write_bench};
    use crate::FileError;

    const EXAMPLE: &str = "# .bench (ISCAS) file
INPUT(i0)
INPUT(i1)

OUTPUT(x0)
OUTPUT(x4)
OUTPUT(x6)

x0 = AND(i0, i1)
x1 = NAND(i0, i1)
x2 = OR(x0, gnd)
x3 = NOR(i0, x1)
x4 = XOR(  x3, x2 )
x5 = BUF(x4)
x6   =  NOT(x5)
x7 = vdd
";

    #[test]
    fn test_basic_readwrite() {
        let nl = read_bench(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(nl.nb_inputs(), 2);
        assert_eq!(nl.nb_outputs(), 3);
        assert_eq!(nl.nb_nodes(), 7);
        // x7 and the implicit gnd
        assert_eq!(nl.assignments().len(), 2);
        let x4 = nl.node(nl.node_id("x4").unwrap());
        assert_eq!(x4.cell(), "XOR");
        assert_eq!(x4.inputs()[1].name, "B");

        let mut buf = Vec::new();
        write_bench(&mut buf, &nl).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let back = read_bench(text.as_bytes()).unwrap();
        assert_eq!(back.nb_nodes(), 7);
        assert_eq!(back.nb_outputs(), 3);
    }

    #[test]
    fn test_write_pruned() {
        let mut nl = read_bench(EXAMPLE.as_bytes()).unwrap();
        // x1 is still read by x3: it becomes a constant
        nl.delete("x1");
        nl.set_constant(nl.node_id("x1").unwrap(), Some(true));
        let mut buf = Vec::new();
        write_bench(&mut buf, &nl).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("x1 = vdd"));
        assert!(!text.contains("NAND"));
        let back = read_bench(text.as_bytes()).unwrap();
        assert_eq!(back.nb_nodes(), 6);
    }

    #[test]
    fn test_errors() {
        let undriven = "INPUT(a)\nOUTPUT(y)\ny = AND(a, b)\n";
        assert!(matches!(
            read_bench(undriven.as_bytes()),
            Err(FileError::Netlist(_))
        ));
        let keyword = "INPUT(a)\nWIRE(b)\n";
        assert!(matches!(
            read_bench(keyword.as_bytes()),
            Err(FileError::Parse { line: 2, .. })
        ));
        let lut = "INPUT(a)\nINPUT(b)\ny = LUT 0x6 (a, b)\n";
        assert!(matches!(
            read_bench(lut.as_bytes()),
            Err(FileError::Parse { line: 3, .. })
        ));
    }
}
