use crate::bail;
use crate::io::{DNSReadExt, SeekExt};
use crate::types::*;
use byteorder::{ReadBytesExt, BE};
use num_traits::FromPrimitive;
use std::io;
use std::io::Cursor;
use std::io::Read;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

// A helper class to hold state while the parsing is happening.
pub(crate) struct MessageParser<'a> {
    cur: Cursor<&'a [u8]>,

    m: Message,
}

#[derive(Copy, Clone, PartialEq)]
enum RecordSection {
    Answers,
    Authorities,
    Additionals,
}

impl<'a> MessageParser<'a> {
    fn new(buf: &'a [u8]) -> MessageParser<'a> {
        MessageParser {
            cur: Cursor::new(buf),
            m: Message::default(),
        }
    }

    /// Consume the MessageParser and returned the resulting Message.
    fn parse(mut self) -> io::Result<Message> {
        self.m.id = self.cur.read_u16::<BE>()?;

        let b = self.cur.read_u8()?;
        self.m.qr = QR::from_bool(0b1000_0000 & b != 0);
        let opcode = (0b0111_1000 & b) >> 3;
        self.m.aa = (0b0000_0100 & b) != 0;
        self.m.tc = (0b0000_0010 & b) != 0;
        self.m.rd = (0b0000_0001 & b) != 0;

        self.m.opcode = match FromPrimitive::from_u8(opcode) {
            Some(t) => t,
            None => bail!(InvalidData, "invalid Opcode({})", opcode),
        };

        let b = self.cur.read_u8()?;
        self.m.ra = (0b1000_0000 & b) != 0;
        let rcode = 0b0000_1111 & b;

        self.m.rcode = match FromPrimitive::from_u8(rcode) {
            Some(t) => t,
            None => bail!(InvalidData, "invalid RCode({})", rcode),
        };

        let qd_count = self.cur.read_u16::<BE>()?;
        let an_count = self.cur.read_u16::<BE>()?;
        let ns_count = self.cur.read_u16::<BE>()?;
        let ar_count = self.cur.read_u16::<BE>()?;

        self.read_questions(qd_count)?;
        self.read_records(an_count, RecordSection::Answers)?;
        self.read_records(ns_count, RecordSection::Authorities)?;
        self.read_records(ar_count, RecordSection::Additionals)?;

        if self.cur.remaining()? > 0 {
            bail!(
                Other,
                "finished parsing with {} bytes left over",
                self.cur.remaining()?
            );
        }

        Ok(self.m)
    }

    fn read_questions(&mut self, count: u16) -> io::Result<()> {
        self.m.questions.reserve_exact(count.into());

        for _ in 0..count {
            let name = self.cur.read_qname()?;
            let r#type = self.cur.read_type()?;
            let r#type = match FromPrimitive::from_u16(r#type) {
                Some(t) => t,
                None => bail!(InvalidData, "invalid question Type({})", r#type),
            };
            let class = self.cur.read_class()?;

            self.m.questions.push(Question {
                name,
                r#type,
                class,
            });
        }

        Ok(())
    }

    fn read_records(&mut self, count: u16, section: RecordSection) -> io::Result<()> {
        for _ in 0..count {
            let name = self.cur.read_qname()?;
            let r#type = self.cur.read_type()?;

            if section == RecordSection::Additionals && r#type == Type::OPT as u16 {
                if self.m.extension.is_some() {
                    bail!(
                        InvalidData,
                        "multiple EDNS(0) extensions. Expected only one."
                    );
                }

                self.m.extension = Some(self.read_extension()?);
                continue;
            }

            let class = self.cur.read_class()?;
            let ttl = Duration::from_secs(self.cur.read_u32::<BE>()?.into());
            let len = self.cur.read_u16::<BE>()?;

            let mut rdata = vec![0; len.into()];
            let start = self.cur.position();
            self.cur.read_exact(&mut rdata)?;

            let resource = self.read_resource(r#type, start, len)?;
            let record = Record {
                name: name.trim_end_matches('.').to_string(),
                class,
                ttl,
                resource,
            };

            match section {
                RecordSection::Answers => self.m.answers.push(record),
                RecordSection::Authorities => self.m.authoritys.push(record),
                RecordSection::Additionals => self.m.additionals.push(record),
            }
        }

        Ok(())
    }

    /// Reads the OPT pseudo-record. The name and type have already been read.
    fn read_extension(&mut self) -> io::Result<Extension> {
        let payload_size = self.cur.read_u16::<BE>()?;
        let extend_rcode = self.cur.read_u8()?;
        let version = self.cur.read_u8()?;
        let flags = self.cur.read_u16::<BE>()?;
        let len = self.cur.read_u16::<BE>()?;

        // We don't use any of the options, so skip them.
        let mut options = vec![0; len.into()];
        self.cur.read_exact(&mut options)?;

        Ok(Extension {
            payload_size,
            extend_rcode,
            version,
            dnssec_ok: flags & 0x8000 != 0,
        })
    }

    /// Decodes the rdata found at `start..start+len`. Domain names may point
    /// anywhere earlier in the message, so this reads from the full buffer.
    fn read_resource(&self, r#type: u16, start: u64, len: u16) -> io::Result<Resource> {
        let buf = *self.cur.get_ref();
        let mut cur = Cursor::new(buf);
        cur.set_position(start);

        let resource = match FromPrimitive::from_u16(r#type) {
            Some(Type::A) => {
                if len != 4 {
                    bail!(InvalidData, "invalid A record length ({}) expected 4", len);
                }
                let mut ip = [0; 4];
                cur.read_exact(&mut ip)?;
                Resource::A(Ipv4Addr::from(ip))
            }
            Some(Type::AAAA) => {
                if len != 16 {
                    bail!(InvalidData, "invalid AAAA record length ({}) expected 16", len);
                }
                let mut ip = [0; 16];
                cur.read_exact(&mut ip)?;
                Resource::AAAA(Ipv6Addr::from(ip))
            }
            Some(Type::NS) => Resource::NS(cur.read_qname()?),
            Some(Type::CNAME) => Resource::CNAME(cur.read_qname()?),
            Some(Type::PTR) => Resource::PTR(cur.read_qname()?),
            Some(Type::MX) => Resource::MX(MX {
                preference: cur.read_u16::<BE>()?,
                exchange: cur.read_qname()?,
            }),
            Some(Type::SRV) => Resource::SRV(SRV {
                priority: cur.read_u16::<BE>()?,
                weight: cur.read_u16::<BE>()?,
                port: cur.read_u16::<BE>()?,
                name: cur.read_qname()?,
            }),
            Some(Type::SOA) => Resource::SOA(SOA {
                mname: cur.read_qname()?,
                rname: cur.read_qname()?,
                serial: cur.read_u32::<BE>()?,
                refresh: Duration::from_secs(cur.read_u32::<BE>()?.into()),
                retry: Duration::from_secs(cur.read_u32::<BE>()?.into()),
                expire: Duration::from_secs(cur.read_u32::<BE>()?.into()),
                minimum: Duration::from_secs(cur.read_u32::<BE>()?.into()),
            }),
            Some(Type::TXT) => {
                let mut txts = Vec::new();
                let end = start + u64::from(len);
                while cur.position() < end {
                    let n = cur.read_u8()?;
                    let mut txt = vec![0; n.into()];
                    cur.read_exact(&mut txt)?;
                    txts.push(String::from_utf8_lossy(&txt).into_owned());
                }
                Resource::TXT(TXT(txts))
            }
            _ => Resource::Unknown(format!("TYPE{}", r#type)),
        };

        Ok(resource)
    }
}

impl Message {
    pub fn from_slice(buf: &[u8]) -> io::Result<Message> {
        MessageParser::new(buf).parse()
    }

    /// Adds a question for `domain`. The domain is normalised through IDNA,
    /// so unicode names are accepted.
    pub fn add_question(&mut self, domain: &str, r#type: Type, class: Class) -> io::Result<()> {
        let domain = match idna::domain_to_ascii(domain) {
            Ok(d) => d,
            Err(e) => bail!(InvalidInput, "invalid domain '{}': {}", domain, e),
        };

        self.questions.push(Question {
            name: domain,
            r#type,
            class,
        });

        Ok(())
    }

    /// Adds an EDNS(0) extension record, as defined by [rfc6891](https://datatracker.ietf.org/doc/html/rfc6891).
    pub fn add_extension(&mut self, ext: Extension) {
        self.extension = Some(ext);
    }

    /// Returns this DNS Message as a Vec<u8> ready to be sent, as defined by [rfc1035](https://datatracker.ietf.org/doc/html/rfc1035).
    ///
    /// Only queries are supported, so any answer records are an error.
    pub fn to_vec(&self) -> io::Result<Vec<u8>> {
        if !self.answers.is_empty() || !self.authoritys.is_empty() || !self.additionals.is_empty()
        {
            bail!(InvalidInput, "encoding answer records is not supported");
        }

        let mut req = Vec::<u8>::with_capacity(512);

        req.extend_from_slice(&self.id.to_be_bytes());

        let mut b = 0_u8;
        b |= if self.qr.to_bool() { 0b1000_0000 } else { 0 };
        b |= ((self.opcode as u8) << 3) & 0b0111_1000;
        b |= if self.aa { 0b0000_0100 } else { 0 };
        b |= if self.tc { 0b0000_0010 } else { 0 };
        b |= if self.rd { 0b0000_0001 } else { 0 };
        req.push(b);

        let mut b = 0_u8;
        b |= if self.ra { 0b1000_0000 } else { 0 };
        b |= (self.rcode as u8) & 0b0000_1111;
        req.push(b);

        let ar_count = self.extension.is_some() as u16;

        req.extend_from_slice(&(self.questions.len() as u16).to_be_bytes());
        req.extend_from_slice(&0_u16.to_be_bytes());
        req.extend_from_slice(&0_u16.to_be_bytes());
        req.extend_from_slice(&ar_count.to_be_bytes());

        for question in &self.questions {
            Message::write_qname(&mut req, &question.name)?;

            req.extend_from_slice(&(question.r#type as u16).to_be_bytes());
            req.extend_from_slice(&(question.class as u16).to_be_bytes());
        }

        if let Some(e) = &self.extension {
            req.push(0); // Root name
            req.extend_from_slice(&(Type::OPT as u16).to_be_bytes());
            req.extend_from_slice(&e.payload_size.to_be_bytes());
            req.push(e.extend_rcode);
            req.push(e.version);
            let flags: u16 = if e.dnssec_ok { 0x8000 } else { 0 };
            req.extend_from_slice(&flags.to_be_bytes());
            req.extend_from_slice(&0_u16.to_be_bytes()); // No options
        }

        Ok(req)
    }

    /// Writes a domain name into the supplied `Vec<u8>`, without compression.
    fn write_qname(buf: &mut Vec<u8>, domain: &str) -> io::Result<()> {
        let domain = match idna::domain_to_ascii(domain) {
            Err(e) => {
                bail!(InvalidData, "invalid dns name '{0}': {1}", domain, e);
            }
            Ok(domain) => domain,
        };

        if !domain.is_empty() && domain != "." {
            for label in domain.split_terminator('.') {
                if label.is_empty() {
                    bail!(InvalidData, "empty label in domain name '{}'", domain);
                }

                if label.len() > 63 {
                    bail!(InvalidData, "label '{0}' longer than 63 characters", label);
                }

                buf.push(label.len() as u8);
                buf.extend_from_slice(label.as_bytes());
            }
        }

        buf.push(0);

        Ok(())
    }
}
