use std::io;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};

use record_api::Value;

use crate::config::EncodeOptions;

// ═══════════════════════════════════════════════════════════════
//  EscapingFormatter
// ═══════════════════════════════════════════════════════════════

/// Wraps a serde_json formatter and applies the optional escapes serde_json
/// never emits on its own: `\uXXXX` for non-ASCII and `\/` for slashes.
///
/// serde_json already escapes quotes, backslashes and control characters
/// before a fragment reaches `write_string_fragment`.
struct EscapingFormatter<F> {
    inner: F,
    escape_unicode: bool,
    escape_slashes: bool,
}

impl<F: Formatter> EscapingFormatter<F> {
    fn new(inner: F, opts: &EncodeOptions) -> Self {
        Self {
            inner,
            escape_unicode: opts.escape_unicode,
            escape_slashes: opts.escape_slashes,
        }
    }
}

impl<F: Formatter> Formatter for EscapingFormatter<F> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.escape_unicode && !self.escape_slashes {
            return self.inner.write_string_fragment(writer, fragment);
        }

        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escape_slash = self.escape_slashes && ch == '/';
            let escape_char = self.escape_unicode && !ch.is_ascii();
            if !escape_slash && !escape_char {
                continue;
            }
            if start < i {
                writer.write_all(&fragment.as_bytes()[start..i])?;
            }
            if escape_slash {
                writer.write_all(b"\\/")?;
            } else {
                // Astral characters become a surrogate pair.
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
            start = i + ch.len_utf8();
        }
        if start < fragment.len() {
            writer.write_all(&fragment.as_bytes()[start..])?;
        }
        Ok(())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Encoding
// ═══════════════════════════════════════════════════════════════

/// Render `value` as JSON text according to `opts`.
///
/// Fails on non-finite floats anywhere inside `value`.
pub fn to_json_string(value: &Value, opts: &EncodeOptions) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    if opts.pretty_print {
        let formatter = EscapingFormatter::new(PrettyFormatter::with_indent(b"    "), opts);
        value.serialize(&mut serde_json::Serializer::with_formatter(&mut buf, formatter))?;
    } else {
        let formatter = EscapingFormatter::new(CompactFormatter, opts);
        value.serialize(&mut serde_json::Serializer::with_formatter(&mut buf, formatter))?;
    }
    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}
