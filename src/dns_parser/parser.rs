use byteorder::{BigEndian, ByteOrder};

use super::{Class, Error, Header, Message, Name, QueryType, Question, RRData, ResourceRecord, CLASS_TOP_BIT};

impl Message {
    /// Decodes a wire-format message. This is the only validation layer:
    /// truncated data, malformed labels, bad compression pointers and
    /// section counts that outrun the buffer all fail here, while
    /// application-level oddities (unknown types, foreign classes) decode
    /// fine and are left for the caller to judge.
    pub fn decode(data: &[u8]) -> Result<Message, Error> {
        if data.len() < 12 {
            return Err(Error::HeaderTooShort);
        }
        let flags = BigEndian::read_u16(&data[2..4]);
        let header = Header {
            id: BigEndian::read_u16(&data[0..2]),
            query: flags & 0x8000 == 0,
            opcode: ((flags >> 11) & 0x0f) as u8,
            authoritative: flags & 0x0400 != 0,
            truncated: flags & 0x0200 != 0,
            recursion_desired: flags & 0x0100 != 0,
            recursion_available: flags & 0x0080 != 0,
            response_code: (flags & 0x0f) as u8,
        };
        let question_count = BigEndian::read_u16(&data[4..6]);
        let answer_count = BigEndian::read_u16(&data[6..8]);
        let nameserver_count = BigEndian::read_u16(&data[8..10]);
        let additional_count = BigEndian::read_u16(&data[10..12]);

        let mut pos = 12;
        let mut questions = Vec::new();
        for _ in 0..question_count {
            let (question, next) = read_question(data, pos)?;
            questions.push(question);
            pos = next;
        }
        let mut sections = [Vec::new(), Vec::new(), Vec::new()];
        for (section, &count) in sections
            .iter_mut()
            .zip(&[answer_count, nameserver_count, additional_count])
        {
            for _ in 0..count {
                let (rr, next) = read_record(data, pos)?;
                section.push(rr);
                pos = next;
            }
        }
        let [answers, nameservers, additional] = sections;

        Ok(Message {
            header,
            questions,
            answers,
            nameservers,
            additional,
        })
    }
}

fn read_question(data: &[u8], pos: usize) -> Result<(Question, usize), Error> {
    let (qname, pos) = Name::scan(data, pos)?;
    if pos + 4 > data.len() {
        return Err(Error::UnexpectedEOF);
    }
    let qtype = BigEndian::read_u16(&data[pos..pos + 2]);
    let qclass = BigEndian::read_u16(&data[pos + 2..pos + 4]);
    Ok((
        Question {
            qname,
            qtype: QueryType::from_value(qtype),
            qclass: Class::from_value(qclass & !CLASS_TOP_BIT),
            qu: qclass & CLASS_TOP_BIT != 0,
        },
        pos + 4,
    ))
}

fn read_record(data: &[u8], pos: usize) -> Result<(ResourceRecord, usize), Error> {
    let (name, pos) = Name::scan(data, pos)?;
    if pos + 10 > data.len() {
        return Err(Error::UnexpectedEOF);
    }
    let typ = BigEndian::read_u16(&data[pos..pos + 2]);
    let cls = BigEndian::read_u16(&data[pos + 2..pos + 4]);
    let ttl = BigEndian::read_u32(&data[pos + 4..pos + 8]);
    let rdlength = BigEndian::read_u16(&data[pos + 8..pos + 10]) as usize;
    let rd_start = pos + 10;
    let rd_end = rd_start + rdlength;
    if rd_end > data.len() {
        return Err(Error::UnexpectedEOF);
    }
    Ok((
        ResourceRecord {
            name,
            cls: Class::from_value(cls & !CLASS_TOP_BIT),
            cache_flush: cls & CLASS_TOP_BIT != 0,
            ttl,
            data: RRData::parse(typ, data, rd_start, rd_end)?,
        },
        rd_end,
    ))
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::super::{Class, Error, Message, Name, QueryType, RRData};

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    // A live announcement capture: PTR answer, then cache-flush SRV, A and
    // AAAA additionals, with compressed owner names and an uncompressed SRV
    // target.
    const ANNOUNCEMENT: &[u8] =
        b"\x00\x00\x84\x00\x00\x00\x00\x01\x00\x00\x00\x03\
          \x0a_test-mdns\x04_tcp\x05local\x00\x00\x0c\x00\x01\x00\x00\x00\x3c\
          \x00\x15\x0etc-lan-adapter\x03lan\xc0\x0c\
          \xc0\x2d\x00\x21\x80\x01\x00\x00\x00\x3c\x00\x20\
          \x00\x00\x00\x00\xa5\xb8\x0etc-lan-adapter\x03lan\x05local\x00\
          \xc0\x54\x00\x01\x80\x01\x00\x00\x00\x3c\x00\x04\x0a\x00\x01\x95\
          \xc0\x54\x00\x1c\x80\x01\x00\x00\x00\x3c\x00\x10\
          \xfd\xda\x85\x6b\x09\x4c\x00\x00\x10\xf6\x89\x32\xea\xbb\x5c\x48";

    #[test]
    fn decodes_announcement_capture() {
        let msg = Message::decode(ANNOUNCEMENT).unwrap();
        assert_eq!(msg.header.flags_word(), 0x8400);
        assert_eq!(msg.questions.len(), 0);
        assert_eq!(msg.answers.len(), 1);
        assert_eq!(msg.additional.len(), 3);

        let ptr = &msg.answers[0];
        assert_eq!(ptr.name, name("_test-mdns._tcp.local"));
        assert_eq!(ptr.ttl, 60);
        assert!(!ptr.cache_flush);
        assert_eq!(
            ptr.data,
            RRData::PTR(name("tc-lan-adapter.lan._test-mdns._tcp.local"))
        );

        let srv = &msg.additional[0];
        assert!(srv.cache_flush);
        assert_eq!(srv.cls, Class::IN);
        assert_eq!(
            srv.data,
            RRData::SRV {
                priority: 0,
                weight: 0,
                port: 42424,
                target: name("tc-lan-adapter.lan.local"),
            }
        );
        assert_eq!(
            msg.additional[1].data,
            RRData::A(Ipv4Addr::new(10, 0, 1, 149))
        );
        assert_eq!(
            msg.additional[2].data,
            RRData::AAAA("fdda:856b:94c::10f6:8932:eabb:5c48".parse::<Ipv6Addr>().unwrap())
        );
    }

    #[test]
    fn reencoding_announcement_capture_is_byte_identical() {
        let msg = Message::decode(ANNOUNCEMENT).unwrap();
        assert_eq!(msg.encode(), ANNOUNCEMENT.to_vec());
    }

    #[test]
    fn round_trips_every_record_type() {
        let mut msg = Message::response();
        msg.add_question(name("_svc._udp.local"), QueryType::Any, true);
        msg.add_answer(
            name("_svc._udp.local"),
            60,
            false,
            RRData::PTR(name("box._svc._udp.local")),
        );
        msg.add_additional(
            name("box._svc._udp.local"),
            60,
            true,
            RRData::SRV {
                priority: 1,
                weight: 2,
                port: 4242,
                target: name("box.local"),
            },
        );
        msg.add_additional(name("box.local"), 60, true, RRData::A(Ipv4Addr::new(192, 168, 0, 7)));
        msg.add_additional(
            name("box.local"),
            60,
            true,
            RRData::AAAA(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)),
        );
        msg.add_additional(
            name("box._svc._udp.local"),
            60,
            false,
            RRData::TXT(vec![b"a=1".to_vec(), b"".to_vec()]),
        );
        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn round_trips_without_compressible_suffixes() {
        let mut msg = Message::response();
        msg.add_answer(name("alpha.local"), 30, false, RRData::PTR(name("beta.lan")));
        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Message::decode(b"not a valid DNS message").is_err());
        assert_eq!(Message::decode(b"\x00\x00\x84"), Err(Error::HeaderTooShort));
    }

    #[test]
    fn rejects_counts_past_end_of_buffer() {
        // Claims one question but carries none.
        let data = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00";
        assert_eq!(Message::decode(data), Err(Error::UnexpectedEOF));
    }

    #[test]
    fn rejects_truncated_rdata() {
        // A record declaring 4 bytes of RDATA but providing 2.
        let data = b"\x00\x00\x84\x00\x00\x00\x00\x01\x00\x00\x00\x00\
                     \x04host\x05local\x00\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x04\x0a\x00";
        assert_eq!(Message::decode(data), Err(Error::UnexpectedEOF));
    }

    #[test]
    fn rejects_pointer_cycles() {
        // Question name is a pointer chain that can never terminate.
        let data = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\xc0\x0c\x00\x0c\x00\x01";
        assert_eq!(Message::decode(data), Err(Error::BadPointer));
    }
}
