use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder};

use super::{Error, Name, QueryType};

/// Typed record data for the record types the engine speaks, plus a raw
/// fallback so foreign records on the shared multicast port decode instead
/// of failing the whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    PTR(Name),
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    /// Ordered character strings, each at most 255 bytes on the wire.
    TXT(Vec<Vec<u8>>),
    Unknown {
        typ: u16,
        data: Vec<u8>,
    },
}

impl RRData {
    pub fn typ(&self) -> QueryType {
        match *self {
            RRData::A(..) => QueryType::A,
            RRData::AAAA(..) => QueryType::AAAA,
            RRData::PTR(..) => QueryType::PTR,
            RRData::SRV { .. } => QueryType::SRV,
            RRData::TXT(..) => QueryType::TXT,
            RRData::Unknown { typ, .. } => QueryType::Unknown(typ),
        }
    }

    /// Parses RDATA occupying `original[start..end]`. `original` is the whole
    /// message so compressed names inside the RDATA can be followed.
    pub(crate) fn parse(typ: u16, original: &[u8], start: usize, end: usize) -> Result<RRData, Error> {
        let rdata = &original[start..end];
        match QueryType::from_value(typ) {
            QueryType::A => {
                if rdata.len() != 4 {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::A(Ipv4Addr::from(BigEndian::read_u32(rdata))))
            }
            QueryType::AAAA => {
                if rdata.len() != 16 {
                    return Err(Error::WrongRdataLength);
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(rdata);
                Ok(RRData::AAAA(Ipv6Addr::from(octets)))
            }
            QueryType::PTR => Ok(RRData::PTR(Name::scan(original, start)?.0)),
            QueryType::SRV => {
                if rdata.len() < 7 {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::SRV {
                    priority: BigEndian::read_u16(&rdata[..2]),
                    weight: BigEndian::read_u16(&rdata[2..4]),
                    port: BigEndian::read_u16(&rdata[4..6]),
                    target: Name::scan(original, start + 6)?.0,
                })
            }
            QueryType::TXT => {
                let mut strings = Vec::new();
                let mut pos = 0;
                while pos < rdata.len() {
                    let len = rdata[pos] as usize;
                    let string_end = pos + 1 + len;
                    if string_end > rdata.len() {
                        return Err(Error::WrongRdataLength);
                    }
                    strings.push(rdata[pos + 1..string_end].to_vec());
                    pos = string_end;
                }
                Ok(RRData::TXT(strings))
            }
            _ => Ok(RRData::Unknown {
                typ,
                data: rdata.to_vec(),
            }),
        }
    }
}
