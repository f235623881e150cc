use std::net::IpAddr;

use crate::client::discovery_name;
use crate::dns_parser::{Message, Name, QueryType, RRData};
use crate::{Error, DEFAULT_TTL, UNICAST_TTL};

/// Everything a responder advertises: the service type, the instance it
/// offers, the host carrying it and the addresses that host answers on.
///
/// Validation happens here, before any socket is opened: the instance name
/// must not contain a dot (it is a single DNS label) and TXT entries must
/// fit their one-byte length prefix.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    service_type: Name,
    instance: String,
    host: String,
    port: u16,
    txt: Vec<String>,
    addresses: Vec<IpAddr>,
    service_name: Name,
    qualified_host: Name,
}

impl ServiceDescriptor {
    /// Builds a descriptor for `service_type` (e.g. `_foo._tcp.local.`)
    /// served by `host` on `port`. Any trailing `.local.` or `.local` is
    /// stripped from the host name; the instance name defaults to the host
    /// name. An empty `txt` becomes the single empty string mDNS expects.
    pub fn new(
        service_type: &str,
        host: &str,
        port: u16,
        addresses: Vec<IpAddr>,
        txt: &[&str],
    ) -> Result<ServiceDescriptor, Error> {
        let host = strip_local(host).to_owned();
        let instance = host.clone();
        validate_instance(&instance)?;
        let txt: Vec<String> = if txt.is_empty() {
            vec![String::new()]
        } else {
            txt.iter().map(|entry| (*entry).to_owned()).collect()
        };
        for entry in &txt {
            if entry.len() > 255 {
                return Err(Error::TxtTooLong(entry.len()));
            }
        }

        let service_type = Name::from_str(service_type)?;
        let service_name = Name::from_str(&format!("{}.{}", instance, service_type))?;
        let qualified_host = Name::from_str(&format!("{}.local", host))?;
        Ok(ServiceDescriptor {
            service_type,
            instance,
            host,
            port,
            txt,
            addresses,
            service_name,
            qualified_host,
        })
    }

    /// Replaces the default instance name.
    pub fn instance(mut self, instance: &str) -> Result<ServiceDescriptor, Error> {
        validate_instance(instance)?;
        self.instance = instance.to_owned();
        self.service_name = Name::from_str(&format!("{}.{}", instance, self.service_type))?;
        Ok(self)
    }

    pub fn service_type(&self) -> &Name {
        &self.service_type
    }

    /// `instance.service_type`, the name SRV and TXT records live under.
    pub fn service_name(&self) -> &Name {
        &self.service_name
    }

    /// `host.local.`
    pub fn qualified_host(&self) -> &Name {
        &self.qualified_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// The unsolicited record set: SRV plus one address record per
    /// advertised interface, all cache-flush, and the PTR answer mapping
    /// the service type to this instance. TTL 60 announces; TTL 0 is the
    /// goodbye that retracts the same records.
    pub fn announcement(&self, ttl: u32) -> Message {
        let mut msg = Message::response();
        msg.add_additional(self.service_name.clone(), ttl, true, self.srv_data());
        self.add_address_records(&mut msg, ttl, true);
        msg.add_answer(
            self.service_type.clone(),
            ttl,
            false,
            RRData::PTR(self.service_name.clone()),
        );
        msg
    }

    /// Answer for the meta-discovery name: one PTR pointing at our service
    /// type. The unicast variant re-asks the question so legacy unicast
    /// resolvers can chain on the reply (RFC 6762 §6.7).
    pub fn dnssd_answer(&self, unicast: bool) -> Message {
        let ttl = answer_ttl(unicast);
        let mut msg = Message::response();
        msg.add_answer(
            discovery_name(),
            ttl,
            false,
            RRData::PTR(self.service_type.clone()),
        );
        if unicast {
            msg.add_question(discovery_name(), QueryType::PTR, true);
        }
        msg
    }

    /// Answer for a PTR query on the service type: the PTR to the instance,
    /// with SRV, addresses and TXT as additionals.
    pub fn service_answer(&self, unicast: bool) -> Message {
        let ttl = answer_ttl(unicast);
        let mut msg = Message::response();
        msg.add_additional(self.service_name.clone(), ttl, false, self.srv_data());
        self.add_address_records(&mut msg, ttl, false);
        msg.add_additional(self.service_name.clone(), ttl, false, self.txt_data());
        msg.add_answer(
            self.service_type.clone(),
            ttl,
            false,
            RRData::PTR(self.service_name.clone()),
        );
        if unicast {
            msg.add_question(self.service_type.clone(), QueryType::PTR, true);
        }
        msg
    }

    /// Answer for a query on the service instance: the SRV record, with
    /// addresses and TXT as additionals.
    pub fn instance_answer(&self, unicast: bool) -> Message {
        let ttl = answer_ttl(unicast);
        let mut msg = Message::response();
        self.add_address_records(&mut msg, ttl, false);
        msg.add_additional(self.service_name.clone(), ttl, false, self.txt_data());
        msg.add_answer(self.service_name.clone(), ttl, false, self.srv_data());
        if unicast {
            msg.add_question(self.service_name.clone(), QueryType::SRV, true);
        }
        msg
    }

    /// Answer for an address query on the qualified host name: the first
    /// advertised address is the answer, the rest ride along as additionals.
    pub fn host_answer(&self, unicast: bool) -> Message {
        let ttl = answer_ttl(unicast);
        let mut msg = Message::response();
        let mut addresses = self.addresses.iter();
        if let Some(&first) = addresses.next() {
            msg.add_answer(self.qualified_host.clone(), ttl, false, address_data(first));
        }
        for &addr in addresses {
            msg.add_additional(self.qualified_host.clone(), ttl, false, address_data(addr));
        }
        msg.add_additional(self.service_name.clone(), ttl, false, self.txt_data());
        if unicast {
            msg.add_question(self.qualified_host.clone(), QueryType::A, true);
        }
        msg
    }

    fn srv_data(&self) -> RRData {
        RRData::SRV {
            priority: 0,
            weight: 0,
            port: self.port,
            target: self.qualified_host.clone(),
        }
    }

    fn txt_data(&self) -> RRData {
        RRData::TXT(self.txt.iter().map(|entry| entry.clone().into_bytes()).collect())
    }

    fn add_address_records(&self, msg: &mut Message, ttl: u32, cache_flush: bool) {
        for &addr in &self.addresses {
            msg.add_additional(self.qualified_host.clone(), ttl, cache_flush, address_data(addr));
        }
    }
}

fn address_data(addr: IpAddr) -> RRData {
    match addr {
        IpAddr::V4(ip) => RRData::A(ip),
        IpAddr::V6(ip) => RRData::AAAA(ip),
    }
}

fn answer_ttl(unicast: bool) -> u32 {
    if unicast {
        UNICAST_TTL
    } else {
        DEFAULT_TTL
    }
}

fn validate_instance(instance: &str) -> Result<(), Error> {
    if instance.contains('.') {
        return Err(Error::InvalidInstanceName(instance.to_owned()));
    }
    Ok(())
}

fn strip_local(host: &str) -> &str {
    host.strip_suffix(".local.")
        .or_else(|| host.strip_suffix(".local"))
        .unwrap_or(host)
}
