use std::fmt;
use std::str::from_utf8;

use byteorder::{BigEndian, ByteOrder};

use super::Error;

/// Pointer chains this deep are hostile, not compressed.
const MAX_POINTER_JUMPS: usize = 126;

/// An owned domain name, stored as its labels. Decoded names own their
/// labels so messages can outlive the receive buffer they were read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    labels: Vec<String>,
}

impl Name {
    /// Parses a dotted name. A trailing dot is accepted and ignored, so
    /// `"_foo._tcp.local."` and `"_foo._tcp.local"` are the same name.
    pub fn from_str(name: &str) -> Result<Name, Error> {
        let mut labels = Vec::new();
        for part in name.split('.') {
            if part.is_empty() {
                continue;
            }
            if part.len() > 63 {
                return Err(Error::LabelTooLong(part.to_owned()));
            }
            labels.push(part.to_owned());
        }
        Ok(Name { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Reads a possibly-compressed name starting at `pos` within the whole
    /// message buffer. Returns the name and the position just past its
    /// in-place encoding. Pointers must refer strictly backwards.
    pub(crate) fn scan(data: &[u8], start: usize) -> Result<(Name, usize), Error> {
        let mut labels = Vec::new();
        let mut pos = start;
        let mut end = None;
        let mut jumps = 0;
        loop {
            let byte = *data.get(pos).ok_or(Error::UnexpectedEOF)?;
            if byte == 0 {
                return Ok((Name { labels }, end.unwrap_or(pos + 1)));
            } else if byte & 0b1100_0000 == 0b1100_0000 {
                if pos + 2 > data.len() {
                    return Err(Error::UnexpectedEOF);
                }
                let off = (BigEndian::read_u16(&data[pos..pos + 2]) & 0b0011_1111_1111_1111) as usize;
                if off >= pos {
                    return Err(Error::BadPointer);
                }
                jumps += 1;
                if jumps > MAX_POINTER_JUMPS {
                    return Err(Error::BadPointer);
                }
                if end.is_none() {
                    end = Some(pos + 2);
                }
                pos = off;
            } else if byte & 0b1100_0000 == 0 {
                let label_end = pos + 1 + byte as usize;
                if label_end > data.len() {
                    return Err(Error::UnexpectedEOF);
                }
                let label = from_utf8(&data[pos + 1..label_end]).map_err(|_| Error::LabelIsNotAscii)?;
                labels.push(label.to_owned());
                pos = label_end;
            } else {
                return Err(Error::UnknownLabelFormat);
            }
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.labels.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_ignores_trailing_dot() {
        let a = Name::from_str("_test-mdns._tcp.local.").unwrap();
        let b = Name::from_str("_test-mdns._tcp.local").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "_test-mdns._tcp.local");
    }

    #[test]
    fn from_str_rejects_long_labels() {
        let label = "x".repeat(64);
        assert!(matches!(
            Name::from_str(&label),
            Err(Error::LabelTooLong(_))
        ));
    }

    #[test]
    fn scan_follows_backward_pointers() {
        // "local" at offset 0, then "host" + pointer at offset 7.
        let data = b"\x05local\x00\x04host\xc0\x00";
        let (name, end) = Name::scan(data, 7).unwrap();
        assert_eq!(name.to_string(), "host.local");
        assert_eq!(end, data.len());
    }

    #[test]
    fn scan_rejects_forward_and_self_pointers() {
        assert_eq!(Name::scan(b"\xc0\x00", 0), Err(Error::BadPointer));
        assert_eq!(Name::scan(b"\x00\xc0\x05", 1), Err(Error::BadPointer));
    }

    #[test]
    fn scan_rejects_truncated_label() {
        assert_eq!(Name::scan(b"\x05loc", 0), Err(Error::UnexpectedEOF));
    }
}
