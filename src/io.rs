//! Read and write netlists to files

mod bench;
mod verilog;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub use bench::{read_bench, write_bench};
pub use verilog::write_verilog;

use crate::{FileError, Netlist};

fn extension(path: &Path) -> String {
    path.extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Read a netlist from a file
///
/// Following extensions are supported: .bench
pub fn read_network_file(path: &Path) -> Result<Netlist, FileError> {
    let ext = extension(path);
    if ext == "bench" {
        let f = File::open(path)?;
        read_bench(f)
    } else {
        Err(FileError::UnsupportedExtension(ext))
    }
}

/// Write a pruned netlist to a file
///
/// Following extensions are supported: .bench, .v
pub fn write_network_file(path: &Path, netlist: &Netlist) -> Result<(), FileError> {
    let ext = extension(path);
    if ext != "bench" && ext != "v" {
        return Err(FileError::UnsupportedExtension(ext));
    }
    let mut f = BufWriter::new(File::create(path)?);
    if ext == "bench" {
        write_bench(&mut f, netlist)
    } else {
        let module = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "top".to_owned());
        write_verilog(&mut f, netlist, &module)
    }
}
