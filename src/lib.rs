//! A small mDNS/DNS-SD engine: a wire codec for the DNS subset multicast
//! DNS uses, a query client for browsing, resolving and service discovery,
//! and a responder that advertises one service instance on the local
//! network.
//!
//! The client side is one-shot: build a query, multicast it, collect the
//! replies that arrive before a deadline. The responder side runs until
//! shut down:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), zeroconf::Error> {
//!     let descriptor = zeroconf::ServiceDescriptor::new(
//!         "_http._tcp.local.",
//!         &zeroconf::net::hostname()?,
//!         8080,
//!         zeroconf::net::interfaces()?,
//!         &["path=/"],
//!     )?;
//!     let (service, handle) = zeroconf::register_service(descriptor, false);
//!     let server = tokio::spawn(service.run());
//!
//!     tokio::time::sleep(Duration::from_secs(60)).await;
//!     handle.shutdown();
//!     server.await.unwrap()
//! }
//! ```

use std::io;
use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error as ThisError;

pub mod dns_parser;
pub mod net;

mod address_family;
mod client;
mod fsm;
mod service;

pub use client::QueryAction;
pub use dns_parser::{
    Class, Header, Message, Name, QueryType, Question, RRData, ResourceRecord,
};
pub use fsm::{register_service, Service, ServiceHandle};
pub use service::ServiceDescriptor;

pub const MDNS_PORT: u16 = 5353;

/// TTL on multicast answers and announcements.
pub const DEFAULT_TTL: u32 = 60;

/// TTL on answers to unicast-requested (QU) questions.
pub const UNICAST_TTL: u32 = 10;

/// The DNS-SD meta-query name: a PTR query here enumerates service types.
pub const DISCOVERY_NAME: &str = "_services._dns-sd._udp.local.";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("malformed DNS message: {0}")]
    Decode(#[from] dns_parser::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("instance name {0:?} must be a single label")]
    InvalidInstanceName(String),
    #[error("TXT entry is {0} bytes, limit is 255")]
    TxtTooLong(usize),
}

/// Multicasts a PTR query for `service_type` and collects the replies that
/// arrive before `timeout` elapses.
pub async fn browse(
    service_type: &str,
    interfaces: &[IpAddr],
    timeout: Duration,
) -> Result<Vec<Message>, Error> {
    let name = Name::from_str(service_type)?;
    let query = client::browse_query(&name);
    client::collect(&query, interfaces, timeout, |_| true).await
}

/// Like [`browse`], but streams each matching response through `on_message`
/// as it arrives. Returning [`QueryAction::Done`] ends the call early with
/// that message; otherwise `None` comes back at the deadline.
pub async fn browse_with<F>(
    service_type: &str,
    interfaces: &[IpAddr],
    timeout: Duration,
    on_message: F,
) -> Result<Option<Message>, Error>
where
    F: FnMut(&Message) -> QueryAction,
{
    let name = Name::from_str(service_type)?;
    let query = client::browse_query(&name);
    client::run(&query, interfaces, timeout, |_| true, on_message).await
}

/// Multicasts an A query for `host` (e.g. `box.local.`) and collects the
/// replies that arrive before `timeout` elapses.
pub async fn resolve(
    host: &str,
    interfaces: &[IpAddr],
    timeout: Duration,
) -> Result<Vec<Message>, Error> {
    let name = Name::from_str(host)?;
    let query = client::resolve_query(&name);
    client::collect(&query, interfaces, timeout, |_| true).await
}

/// Streaming variant of [`resolve`].
pub async fn resolve_with<F>(
    host: &str,
    interfaces: &[IpAddr],
    timeout: Duration,
    on_message: F,
) -> Result<Option<Message>, Error>
where
    F: FnMut(&Message) -> QueryAction,
{
    let name = Name::from_str(host)?;
    let query = client::resolve_query(&name);
    client::run(&query, interfaces, timeout, |_| true, on_message).await
}

/// Service-type enumeration: multicasts the meta-discovery PTR query and
/// collects every response to it.
pub async fn discover(interfaces: &[IpAddr], timeout: Duration) -> Result<Vec<Message>, Error> {
    let query = client::discovery_query();
    client::collect(&query, interfaces, timeout, client::is_discovery_reply).await
}

/// Streaming variant of [`discover`].
pub async fn discover_with<F>(
    interfaces: &[IpAddr],
    timeout: Duration,
    on_message: F,
) -> Result<Option<Message>, Error>
where
    F: FnMut(&Message) -> QueryAction,
{
    let query = client::discovery_query();
    client::run(&query, interfaces, timeout, client::is_discovery_reply, on_message).await
}

/// Runs [`discover`] and flattens the replies into the distinct service
/// type names seen, in arrival order.
pub async fn find_services(
    interfaces: &[IpAddr],
    timeout: Duration,
) -> Result<Vec<String>, Error> {
    let mut services = Vec::new();
    for msg in discover(interfaces, timeout).await? {
        collect_service_types(&mut services, &msg);
    }
    Ok(services)
}

fn collect_service_types(services: &mut Vec<String>, msg: &Message) {
    let discovery = client::discovery_name();
    for rr in &msg.answers {
        if rr.name != discovery {
            continue;
        }
        if let RRData::PTR(ref target) = rr.data {
            let target = target.to_string();
            if !services.contains(&target) {
                services.push(target);
            }
        }
    }
}
