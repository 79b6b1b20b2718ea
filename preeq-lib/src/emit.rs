// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Header Output
//!
//! Coefficients are handed to the consumer as a C++ fragment that is `#include`d directly:
//!
//! ```text
//! const int fir_shift = 24;
//! std::vector<int32_t> coeff = {
//!      -177713,
//!   ...
//! };
//! ```
//!
//! Values are right-justified to ten columns after a two space indent.  Downstream tooling diffs
//! these files, so the layout is fixed.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::PreeqError;

/// Default header file name, what the consumer `#include`s.
pub const DEFAULT_HEADER: &str = "fir_coeff.h";

/// Write the header fragment into `w`.
pub fn write_header<W: Write>(w: &mut W, fir_shift: u32, coefficients: &[i32]) -> io::Result<()> {
    writeln!(w, "const int fir_shift = {fir_shift};")?;
    writeln!(w, "std::vector<int32_t> coeff = {{")?;
    for c in coefficients {
        writeln!(w, "  {c:>10},")?;
    }
    writeln!(w, "}};")
}

/// Header fragment as a string.
pub fn render_header(fir_shift: u32, coefficients: &[i32]) -> String {
    let mut out = Vec::with_capacity(64 + 14 * coefficients.len());
    // Writing into a Vec cannot fail.
    let _ = write_header(&mut out, fir_shift, coefficients);
    String::from_utf8_lossy(&out).into_owned()
}

/// Create `path` and write the header fragment to it.  Nothing is written unless the file could be
/// created.  The file is closed when this returns, error or not.
pub fn write_header_file(
    path: &Path,
    fir_shift: u32,
    coefficients: &[i32],
) -> Result<(), PreeqError> {
    let name = path.display().to_string();
    let file = File::create(path).map_err(|e| PreeqError::output(&name, e))?;
    let mut w = BufWriter::new(file);

    write_header(&mut w, fir_shift, coefficients).map_err(|e| PreeqError::output(&name, e))?;
    w.flush().map_err(|e| PreeqError::output(&name, e))?;

    log::info!("wrote {} coefficients to {name}", coefficients.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_header_exact() {
        let text = render_header(24, &[1000, -2000, 1000]);
        let expected = concat!(
            "const int fir_shift = 24;\n",
            "std::vector<int32_t> coeff = {\n",
            "        1000,\n",
            "       -2000,\n",
            "        1000,\n",
            "};\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_header_columns() {
        let text = render_header(0, &[i32::MIN, i32::MAX, 0]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "const int fir_shift = 0;");
        // `-2147483648` is eleven wide and simply overflows the column
        assert_eq!(lines[2], "  -2147483648,");
        assert_eq!(lines[3], "  2147483647,");
        assert_eq!(lines[4], "           0,");
        assert_eq!(lines[5], "};");
    }

    #[test]
    fn test_render_header_empty() {
        assert_eq!(
            render_header(24, &[]),
            "const int fir_shift = 24;\nstd::vector<int32_t> coeff = {\n};\n"
        );
    }

    #[test]
    fn test_write_header_file_unopenable() {
        let dir = std::env::temp_dir().join("preeq-missing-dir-for-header-test");
        let _ = std::fs::remove_dir_all(&dir);
        let err = write_header_file(&dir.join("fir_coeff.h"), 24, &[1]).unwrap_err();
        assert!(matches!(err, PreeqError::OutputWriteFailure { .. }));
    }

    #[test]
    fn test_write_header_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("preeq-header-{}.h", std::process::id()));
        write_header_file(&path, 24, &[1000, -2000, 1000]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text, render_header(24, &[1000, -2000, 1000]));
    }
}
