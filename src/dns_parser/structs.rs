use super::{Class, Name, QueryType, RRData};

/// Message header without the section counts (those are derived from the
/// section vectors on encode and checked on decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    /// True for queries (QR bit clear).
    pub query: bool,
    pub opcode: u8,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: u8,
}

impl Header {
    /// A query header with every flag clear, as mDNS queries are sent.
    pub fn query(id: u16) -> Header {
        Header {
            id,
            query: true,
            opcode: 0,
            authoritative: false,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            response_code: 0,
        }
    }

    /// An authoritative response header (flags word 0x8400).
    pub fn response(id: u16) -> Header {
        Header {
            query: false,
            authoritative: true,
            ..Header::query(id)
        }
    }

    /// The 16-bit flags word. Zero exactly when no flag is set, which is
    /// what a plain meta-discovery query looks like.
    pub fn flags_word(&self) -> u16 {
        let mut flags = 0u16;
        if !self.query {
            flags |= 0x8000;
        }
        flags |= u16::from(self.opcode & 0x0f) << 11;
        if self.authoritative {
            flags |= 0x0400;
        }
        if self.truncated {
            flags |= 0x0200;
        }
        if self.recursion_desired {
            flags |= 0x0100;
        }
        if self.recursion_available {
            flags |= 0x0080;
        }
        flags |= u16::from(self.response_code & 0x0f);
        flags
    }
}

/// One entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: Name,
    pub qtype: QueryType,
    pub qclass: Class,
    /// The querier asked for a unicast response (top class bit).
    pub qu: bool,
}

/// One resource record of the answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub cls: Class,
    /// Top class bit: this record set replaces cached copies.
    pub cache_flush: bool,
    pub ttl: u32,
    pub data: RRData,
}

/// A complete DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    pub fn query() -> Message {
        Message::with_header(Header::query(0))
    }

    pub fn response() -> Message {
        Message::with_header(Header::response(0))
    }

    fn with_header(header: Header) -> Message {
        Message {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            nameservers: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn add_question(&mut self, qname: Name, qtype: QueryType, qu: bool) {
        self.questions.push(Question {
            qname,
            qtype,
            qclass: Class::IN,
            qu,
        });
    }

    pub fn add_answer(&mut self, name: Name, ttl: u32, cache_flush: bool, data: RRData) {
        self.answers.push(record(name, ttl, cache_flush, data));
    }

    pub fn add_additional(&mut self, name: Name, ttl: u32, cache_flush: bool, data: RRData) {
        self.additional.push(record(name, ttl, cache_flush, data));
    }
}

fn record(name: Name, ttl: u32, cache_flush: bool, data: RRData) -> ResourceRecord {
    ResourceRecord {
        name,
        cls: Class::IN,
        cache_flush,
        ttl,
        data,
    }
}
