use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::{class_value, Message, Name, Question, RRData, ResourceRecord};

impl Message {
    /// Encodes the message: header, then the question, answer, authority and
    /// additional sections in wire order, with name compression.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();

        writer.buf.write_u16::<BigEndian>(self.header.id).unwrap();
        writer
            .buf
            .write_u16::<BigEndian>(self.header.flags_word())
            .unwrap();
        for section in &[
            self.questions.len(),
            self.answers.len(),
            self.nameservers.len(),
            self.additional.len(),
        ] {
            writer.buf.write_u16::<BigEndian>(*section as u16).unwrap();
        }

        for question in &self.questions {
            writer.write_question(question);
        }
        for rr in self
            .answers
            .iter()
            .chain(&self.nameservers)
            .chain(&self.additional)
        {
            writer.write_rr(rr);
        }

        writer.buf
    }
}

/// Accumulates the packet and the offsets of every name suffix written so
/// far, so later names can point back at them.
struct MessageWriter {
    buf: Vec<u8>,
    names: HashMap<Vec<String>, u16>,
}

impl MessageWriter {
    fn new() -> MessageWriter {
        MessageWriter {
            buf: Vec::with_capacity(512),
            names: HashMap::new(),
        }
    }

    /// Writes a name label by label. At each label the remaining suffix is
    /// looked up: a hit becomes a back-reference pointer and ends the name.
    /// Suffix offsets are recorded (while they still fit in a pointer) even
    /// when `compress` is off, so SRV targets, which RFC 2782 forbids
    /// compressing, still serve as pointer targets for later names.
    fn write_name(&mut self, name: &Name, compress: bool) {
        let labels = name.labels();
        for i in 0..labels.len() {
            let suffix = &labels[i..];
            if compress {
                if let Some(&off) = self.names.get(suffix) {
                    self.buf
                        .write_u16::<BigEndian>(0b1100_0000_0000_0000 | off)
                        .unwrap();
                    return;
                }
            }
            if self.buf.len() < 0x4000 {
                self.names.insert(suffix.to_vec(), self.buf.len() as u16);
            }
            debug_assert!(labels[i].len() <= 63);
            self.buf.write_u8(labels[i].len() as u8).unwrap();
            self.buf.extend_from_slice(labels[i].as_bytes());
        }
        self.buf.write_u8(0).unwrap();
    }

    fn write_question(&mut self, question: &Question) {
        self.write_name(&question.qname, true);
        self.buf
            .write_u16::<BigEndian>(question.qtype.value())
            .unwrap();
        self.buf
            .write_u16::<BigEndian>(class_value(question.qclass, question.qu))
            .unwrap();
    }

    fn write_rr(&mut self, rr: &ResourceRecord) {
        self.write_name(&rr.name, true);
        self.buf.write_u16::<BigEndian>(rr.data.typ().value()).unwrap();
        self.buf
            .write_u16::<BigEndian>(class_value(rr.cls, rr.cache_flush))
            .unwrap();
        self.buf.write_u32::<BigEndian>(rr.ttl).unwrap();

        let size_offset = self.buf.len();
        self.buf.write_u16::<BigEndian>(0).unwrap();
        let data_offset = self.buf.len();
        self.write_rrdata(&rr.data);
        let data_size = self.buf.len() - data_offset;
        BigEndian::write_u16(&mut self.buf[size_offset..size_offset + 2], data_size as u16);
    }

    fn write_rrdata(&mut self, data: &RRData) {
        match *data {
            RRData::A(ip) => self.buf.write_u32::<BigEndian>(ip.into()).unwrap(),
            RRData::AAAA(ip) => self.buf.extend_from_slice(&ip.octets()),
            RRData::PTR(ref target) => self.write_name(target, true),
            RRData::SRV {
                priority,
                weight,
                port,
                ref target,
            } => {
                self.buf.write_u16::<BigEndian>(priority).unwrap();
                self.buf.write_u16::<BigEndian>(weight).unwrap();
                self.buf.write_u16::<BigEndian>(port).unwrap();
                self.write_name(target, false);
            }
            RRData::TXT(ref strings) => {
                for string in strings {
                    debug_assert!(string.len() <= 255);
                    self.buf.write_u8(string.len() as u8).unwrap();
                    self.buf.extend_from_slice(string);
                }
            }
            RRData::Unknown { ref data, .. } => self.buf.extend_from_slice(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Message, Name, QueryType, RRData};

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn encodes_ptr_query() {
        let mut query = Message::query();
        query.add_question(name("_test-mdns._tcp.local"), QueryType::PTR, true);
        let expected = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\
                         \x0a_test-mdns\x04_tcp\x05local\x00\x00\x0c\x80\x01";
        assert_eq!(query.encode(), expected.to_vec());
    }

    #[test]
    fn encodes_a_query_without_unicast_bit() {
        let mut query = Message::query();
        query.add_question(name("example.local"), QueryType::A, false);
        let expected = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\
                         \x07example\x05local\x00\x00\x01\x00\x01";
        assert_eq!(query.encode(), expected.to_vec());
    }

    #[test]
    fn compresses_shared_suffixes() {
        let mut msg = Message::response();
        msg.add_answer(
            name("_a._tcp.local"),
            60,
            false,
            RRData::PTR(name("one._a._tcp.local")),
        );
        msg.add_answer(
            name("_b._tcp.local"),
            60,
            false,
            RRData::PTR(name("two._b._tcp.local")),
        );
        let encoded = msg.encode();
        // "_a._tcp.local" fully at 12; "one" + pointer to 12; "_b" + pointer
        // to "_tcp.local" at 15; "two" + pointer to the "_b..." owner.
        let expected = b"\x00\x00\x84\x00\x00\x00\x00\x02\x00\x00\x00\x00\
                         \x02_a\x04_tcp\x05local\x00\x00\x0c\x00\x01\x00\x00\x00\x3c\
                         \x00\x06\x03one\xc0\x0c\
                         \x02_b\xc0\x0f\x00\x0c\x00\x01\x00\x00\x00\x3c\
                         \x00\x06\x03two\xc0\x2b";
        assert_eq!(encoded, expected.to_vec());
    }

    #[test]
    fn srv_target_is_not_compressed() {
        let mut msg = Message::response();
        msg.add_answer(
            name("host.local"),
            60,
            false,
            RRData::SRV {
                priority: 0,
                weight: 0,
                port: 80,
                target: name("host.local"),
            },
        );
        let expected = b"\x00\x00\x84\x00\x00\x00\x00\x01\x00\x00\x00\x00\
                         \x04host\x05local\x00\x00\x21\x00\x01\x00\x00\x00\x3c\
                         \x00\x12\x00\x00\x00\x00\x00\x50\x04host\x05local\x00";
        assert_eq!(msg.encode(), expected.to_vec());
    }
}
