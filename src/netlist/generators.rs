//! Netlist generators and templates

/// Adder generators
pub mod adder {
    use crate::{Netlist, NetlistBuilder};

    fn gate(b: &mut NetlistBuilder, cell: &str, var: &str, x: &str, y: &str, out: &str) {
        b.add_node(cell, var, &[("A", x), ("B", y)], &[("Z", out)]);
    }

    /// A one-bit full adder with inputs `a`, `b`, `cin` and outputs `s`, `cout`
    pub fn full_adder() -> Netlist {
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_input("b").add_input("cin");
        b.add_output("s").add_output("cout");
        gate(&mut b, "XOR", "x1", "a", "b", "p");
        gate(&mut b, "XOR", "x2", "p", "cin", "s");
        gate(&mut b, "AND", "a1", "a", "b", "g");
        gate(&mut b, "AND", "a2", "p", "cin", "t");
        gate(&mut b, "OR", "o1", "g", "t", "cout");
        // Only valid declarations
        b.build().unwrap()
    }

    /// A simple and slow ripple-carry adder
    ///
    /// Inputs are `a[i]` and `b[i]`, outputs are `s[i]` with the carry as `s[len]`.
    /// The lowest bit is a half adder.
    pub fn ripple_carry(len: usize) -> Netlist {
        let mut b = NetlistBuilder::new();
        for i in 0..len {
            b.add_input(&format!("a[{}]", i));
            b.add_input(&format!("b[{}]", i));
        }
        for i in 0..=len {
            b.add_output(&format!("s[{}]", i));
        }
        if len == 0 {
            b.add_constant("s[0]", false);
        }
        let carry_name = |i: usize| {
            if i + 1 == len {
                format!("s[{}]", len)
            } else {
                format!("c{}", i)
            }
        };
        for i in 0..len {
            let a = format!("a[{}]", i);
            let bb = format!("b[{}]", i);
            let s = format!("s[{}]", i);
            let c = carry_name(i);
            if i == 0 {
                gate(&mut b, "XOR", "xor0", &a, &bb, &s);
                gate(&mut b, "AND", "and0", &a, &bb, &c);
            } else {
                let prev = carry_name(i - 1);
                let p = format!("p{}", i);
                let g = format!("g{}", i);
                let t = format!("t{}", i);
                gate(&mut b, "XOR", &format!("pxor{}", i), &a, &bb, &p);
                gate(&mut b, "XOR", &format!("xor{}", i), &p, &prev, &s);
                gate(&mut b, "AND", &format!("gand{}", i), &a, &bb, &g);
                gate(&mut b, "AND", &format!("pand{}", i), &p, &prev, &t);
                gate(&mut b, "OR", &format!("or{}", i), &g, &t, &c);
            }
        }
        b.build().unwrap()
    }
}

/// Simple generators to test functionality
pub mod testcases {
    use crate::{Netlist, NetlistBuilder};

    /// `y = (a & b) | c`, with instances `g1` (AND) and `g2` (OR) and internal wire `n1`
    pub fn and_or() -> Netlist {
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_input("b").add_input("c").add_output("y");
        b.add_node("AND", "g1", &[("A", "a"), ("B", "b")], &[("Z", "n1")]);
        b.add_node("OR", "g2", &[("A", "n1"), ("B", "c")], &[("Z", "y")]);
        b.build().unwrap()
    }

    /// A chain of inverters from input `a` to output `y`
    pub fn inverter_chain(len: usize) -> Netlist {
        assert!(len > 0);
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_output("y");
        let mut prev = "a".to_owned();
        for i in 0..len {
            let out = if i + 1 == len {
                "y".to_owned()
            } else {
                format!("n{}", i)
            };
            b.add_node("NOT", &format!("inv{}", i), &[("A", &prev)], &[("Z", &out)]);
            prev = out;
        }
        b.build().unwrap()
    }
}
