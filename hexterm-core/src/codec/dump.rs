//! Console rendering of traffic.
//!
//! Decorated hex dump:
//!
//! ```text
//! /-----------Begin 3 bytes of Received Hex Data-----------\
//! | 0000: 41 42 0a                                         AB.
//! \-----------End 3 bytes of Received Hex Data-------------/
//! ```
//!
//! Plain hex mode prints only the byte line; plain ascii mode writes the
//! received bytes through untouched.

use crate::checksum::checksum_line;
use crate::codec::{bytes_to_hex, push_hex_byte};
use crate::config::{DisplayMode, SessionConfig};

const ROW_WIDTH: usize = 16;

/// Renders byte buffers according to a [`SessionConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DumpFormatter {
    display: DisplayMode,
    decorate: bool,
    print_checksums: bool,
}

impl DumpFormatter {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            display: config.display,
            decorate: config.decorate,
            print_checksums: config.print_checksums,
        }
    }

    /// Render `bytes` with an optional description such as `"Sent"`.
    ///
    /// Returns raw bytes because plain ascii output is not necessarily UTF-8.
    pub fn render(&self, bytes: &[u8], desc: Option<&str>) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len() * 4 + 128);
        match self.display {
            DisplayMode::Hex => self.render_hex(&mut out, bytes, desc),
            DisplayMode::Ascii => self.render_ascii(&mut out, bytes, desc),
        }
        out
    }

    fn render_hex(&self, out: &mut Vec<u8>, bytes: &[u8], desc: Option<&str>) {
        if !self.decorate {
            out.extend_from_slice(bytes_to_hex(bytes).as_bytes());
            out.push(b'\n');
            self.push_checksum(out, bytes);
            return;
        }

        out.extend_from_slice(begin_border(bytes.len(), desc, "Hex").as_bytes());
        for (row, chunk) in bytes.chunks(ROW_WIDTH).enumerate() {
            out.extend_from_slice(hex_row(row * ROW_WIDTH, chunk).as_bytes());
        }
        self.push_checksum(out, bytes);
        out.extend_from_slice(end_border(bytes.len(), desc, "Hex").as_bytes());
    }

    fn render_ascii(&self, out: &mut Vec<u8>, bytes: &[u8], desc: Option<&str>) {
        if !self.decorate {
            out.extend_from_slice(bytes);
            self.push_checksum(out, bytes);
            return;
        }

        out.extend_from_slice(begin_border(bytes.len(), desc, "Ascii").as_bytes());
        let mut at_front = true;
        for &b in bytes {
            if at_front {
                out.extend_from_slice(b"| ");
                at_front = false;
            }
            out.push(b);
            if b == b'\n' {
                at_front = true;
            }
        }
        if at_front {
            out.extend_from_slice(b"| ");
        }
        out.push(b'\n');
        self.push_checksum(out, bytes);
        out.extend_from_slice(end_border(bytes.len(), desc, "Ascii").as_bytes());
    }

    fn push_checksum(&self, out: &mut Vec<u8>, bytes: &[u8]) {
        if self.print_checksums {
            out.extend_from_slice(checksum_line(bytes).as_bytes());
            out.push(b'\n');
        }
    }
}

fn label(desc: Option<&str>) -> String {
    desc.map(|d| format!("{d} ")).unwrap_or_default()
}

fn begin_border(len: usize, desc: Option<&str>, kind: &str) -> String {
    format!("/-----------Begin {len} bytes of {}{kind} Data-----------\\\n", label(desc))
}

fn end_border(len: usize, desc: Option<&str>, kind: &str) -> String {
    format!("\\-----------End {len} bytes of {}{kind} Data-------------/\n", label(desc))
}

fn hex_row(offset: usize, chunk: &[u8]) -> String {
    let mut line = format!("| {offset:04x}: ");
    for (i, &b) in chunk.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        push_hex_byte(&mut line, b);
    }
    // Pad short rows so the gutter lines up.
    let hex_width = ROW_WIDTH * 3 - 1;
    let used = chunk.len() * 3 - usize::from(!chunk.is_empty());
    line.extend(std::iter::repeat_n(' ', hex_width - used + 2));
    line.extend(chunk.iter().map(|&b| {
        if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '.'
        }
    }));
    line.push('\n');
    line
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter(display: DisplayMode, decorate: bool, checksums: bool) -> DumpFormatter {
        DumpFormatter::new(&SessionConfig {
            display,
            decorate,
            print_checksums: checksums,
            ..SessionConfig::default()
        })
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn plain_hex_is_single_line() {
        let f = formatter(DisplayMode::Hex, false, false);
        assert_eq!(text(f.render(&[0x41, 0x42, 0x0a], Some("Received"))), "41 42 0a\n");
    }

    #[test]
    fn decorated_hex_has_border_and_gutter() {
        let f = formatter(DisplayMode::Hex, true, false);
        let out = text(f.render(&[0x41, 0x42, 0x0a], Some("Sent")));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("/-----------Begin 3 bytes of Sent Hex Data"));
        assert!(lines[1].starts_with("| 0000: 41 42 0a "));
        assert!(lines[1].ends_with("AB."));
        assert!(lines[2].starts_with("\\-----------End 3 bytes of Sent Hex Data"));
    }

    #[test]
    fn decorated_hex_wraps_every_sixteen_bytes() {
        let f = formatter(DisplayMode::Hex, true, false);
        let bytes: Vec<u8> = (0..40).collect();
        let out = text(f.render(&bytes, None));
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with("| ")).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("| 0010: 10 11"));
        assert!(rows[2].starts_with("| 0020: 20 21"));
        // Gutter column is aligned on the short last row.
        assert_eq!(rows[0].len() - 16, rows[2].len() - 8);
        assert!(out.contains("Begin 40 bytes of Hex Data"));
    }

    #[test]
    fn checksum_line_follows_dump() {
        let f = formatter(DisplayMode::Hex, false, true);
        let out = text(f.render(&[0x41, 0x42, 0x0a], None));
        assert_eq!(
            out,
            format!("41 42 0a\n{}\n", checksum_line(&[0x41, 0x42, 0x0a]))
        );
    }

    #[test]
    fn decorated_ascii_borders_each_line() {
        let f = formatter(DisplayMode::Ascii, true, false);
        let out = text(f.render(b"hi\nthere\n", Some("Received")));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("Begin 9 bytes of Received Ascii Data"));
        assert_eq!(lines[1], "| hi");
        assert_eq!(lines[2], "| there");
        assert_eq!(lines[3], "| ");
        assert!(lines[4].contains("End 9 bytes of Received Ascii Data"));
    }

    #[test]
    fn decorated_ascii_without_trailing_newline() {
        let f = formatter(DisplayMode::Ascii, true, false);
        let out = text(f.render(b"hi", None));
        assert_eq!(out.lines().nth(1), Some("| hi"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn plain_ascii_passes_bytes_through() {
        let f = formatter(DisplayMode::Ascii, false, false);
        assert_eq!(f.render(&[b'h', 0xff, b'\n'], None), vec![b'h', 0xff, b'\n']);
    }
}
