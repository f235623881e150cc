//! DNS wire codec with the mDNS class-bit extensions.
//!
//! Messages are modelled as plain owned values: a header, the question
//! section and three resource-record sections. `Message::encode` produces
//! the exact byte layout mDNS peers expect, including name compression;
//! `Message::decode` validates the wire format and nothing more (a PTR
//! record with an empty target is structurally fine).

mod builder;
mod error;
mod name;
mod parser;
mod rrdata;
mod structs;

pub use error::Error;
pub use name::Name;
pub use rrdata::RRData;
pub use structs::{Header, Message, Question, ResourceRecord};

/// Top bit of the class field: "please reply unicast" on questions
/// (RFC 6762 §18.12), "cache flush" on records (RFC 6762 §10.2).
pub const CLASS_TOP_BIT: u16 = 0x8000;

/// Record and question types this engine works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    A,
    AAAA,
    PTR,
    TXT,
    SRV,
    /// Query-only wildcard.
    Any,
    Unknown(u16),
}

impl QueryType {
    pub fn value(self) -> u16 {
        match self {
            QueryType::A => 1,
            QueryType::PTR => 12,
            QueryType::TXT => 16,
            QueryType::AAAA => 28,
            QueryType::SRV => 33,
            QueryType::Any => 255,
            QueryType::Unknown(v) => v,
        }
    }

    pub fn from_value(value: u16) -> QueryType {
        match value {
            1 => QueryType::A,
            12 => QueryType::PTR,
            16 => QueryType::TXT,
            28 => QueryType::AAAA,
            33 => QueryType::SRV,
            255 => QueryType::Any,
            v => QueryType::Unknown(v),
        }
    }
}

/// DNS class with the top bit already masked off. Unknown classes decode
/// without error; rejecting them is the responder's call, not the parser's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    IN,
    Any,
    Unknown(u16),
}

impl Class {
    pub fn value(self) -> u16 {
        match self {
            Class::IN => 1,
            Class::Any => 255,
            Class::Unknown(v) => v,
        }
    }

    pub fn from_value(value: u16) -> Class {
        match value {
            1 => Class::IN,
            255 => Class::Any,
            v => Class::Unknown(v),
        }
    }
}

/// Composes the wire class from a base class and the mDNS top bit
/// (unicast-response on questions, cache-flush on records).
pub fn class_value(cls: Class, top_bit: bool) -> u16 {
    if top_bit {
        cls.value() | CLASS_TOP_BIT
    } else {
        cls.value()
    }
}
