use std::io;
use std::net::{IpAddr, SocketAddr};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::poll_fn;
use log::{trace, warn};
use tokio::io::ReadBuf;
use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::address_family::{multicast_send, open_socket};
use crate::dns_parser::{Message, Name, QueryType};
use crate::{Error, DISCOVERY_NAME};

/// What a streaming callback wants next: keep listening, or end the call
/// and hand back the message it just saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
    Continue,
    Done,
}

pub(crate) fn browse_query(service_type: &Name) -> Message {
    let mut query = Message::query();
    query.add_question(service_type.clone(), QueryType::PTR, true);
    query
}

pub(crate) fn resolve_query(host: &Name) -> Message {
    let mut query = Message::query();
    query.add_question(host.clone(), QueryType::A, true);
    query
}

pub(crate) fn discovery_query() -> Message {
    browse_query(&discovery_name())
}

pub(crate) fn discovery_name() -> Name {
    Name::from_str(DISCOVERY_NAME).expect("discovery name is a valid name")
}

/// Replies count as discovery traffic only when their first question is the
/// meta-discovery PTR question itself; everything else on the shared port is
/// cross-talk.
pub(crate) fn is_discovery_reply(msg: &Message) -> bool {
    msg.questions.first().map_or(false, |q| {
        q.qtype == QueryType::PTR && q.qu && q.qname == discovery_name()
    })
}

/// Collects every interest-matching reply until the deadline.
pub(crate) async fn collect<P>(
    query: &Message,
    interfaces: &[IpAddr],
    timeout: Duration,
    mut interested: P,
) -> Result<Vec<Message>, Error>
where
    P: FnMut(&Message) -> bool,
{
    let mut messages = Vec::new();
    run(query, interfaces, timeout, &mut interested, |msg| {
        messages.push(msg.clone());
        QueryAction::Continue
    })
    .await?;
    Ok(messages)
}

/// One query/response cycle: open a socket per interface, multicast the
/// query on all of them, then hand every interest-matching reply to the
/// callback until it answers `Done` or the deadline passes. Sockets are
/// owned locally, so every exit path closes them.
pub(crate) async fn run<P, F>(
    query: &Message,
    interfaces: &[IpAddr],
    timeout: Duration,
    mut interested: P,
    mut on_message: F,
) -> Result<Option<Message>, Error>
where
    P: FnMut(&Message) -> bool,
    F: FnMut(&Message) -> QueryAction,
{
    let mut sockets = Vec::new();
    for &addr in interfaces {
        if let Some(socket) = open_socket(addr, 0)? {
            sockets.push(socket);
        }
    }
    if sockets.is_empty() {
        warn!("no usable interface for query");
        return Ok(None);
    }

    let encoded = query.encode();
    for socket in &sockets {
        multicast_send(socket, &encoded).await?;
    }

    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; 65536];
    loop {
        // Remaining time is recomputed against one fixed deadline so short
        // reads cannot stretch the overall timeout.
        let remaining = match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) => remaining,
            None => return Ok(None),
        };
        let received =
            tokio::time::timeout(remaining, poll_fn(|cx| poll_recv_any(cx, &sockets, &mut buf)))
                .await;
        let (size, addr) = match received {
            Err(_elapsed) => return Ok(None),
            Ok(result) => result?,
        };

        let msg = match Message::decode(&buf[..size]) {
            Ok(msg) => msg,
            Err(err) => {
                trace!("dropping undecodable packet from {:?}: {}", addr, err);
                continue;
            }
        };
        if interested(&msg) {
            if let QueryAction::Done = on_message(&msg) {
                return Ok(Some(msg));
            }
        }
    }
}

/// Polls the sockets in index order and yields the first datagram any of
/// them has ready.
fn poll_recv_any(
    cx: &mut Context,
    sockets: &[UdpSocket],
    buf: &mut [u8],
) -> Poll<io::Result<(usize, SocketAddr)>> {
    for socket in sockets {
        let mut read_buf = ReadBuf::new(buf);
        match socket.poll_recv_from(cx, &mut read_buf) {
            Poll::Ready(Ok(addr)) => {
                return Poll::Ready(Ok((read_buf.filled().len(), addr)))
            }
            Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
            Poll::Pending => continue,
        }
    }
    Poll::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_parser::RRData;

    #[test]
    fn discovery_reply_filter_requires_the_meta_question() {
        let mut reply = Message::response();
        reply.add_question(discovery_name(), QueryType::PTR, true);
        reply.add_answer(
            discovery_name(),
            10,
            false,
            RRData::PTR(Name::from_str("_test-mdns._tcp.local").unwrap()),
        );
        assert!(is_discovery_reply(&reply));

        // The outgoing discovery query matches its own filter too.
        assert!(is_discovery_reply(&discovery_query()));

        let mut unrelated = Message::response();
        unrelated.add_question(
            Name::from_str("_http._tcp.local").unwrap(),
            QueryType::PTR,
            true,
        );
        assert!(!is_discovery_reply(&unrelated));
        assert!(!is_discovery_reply(&Message::response()));
    }

    #[test]
    fn query_shapes_ask_one_unicast_question() {
        let service = Name::from_str("_test-mdns._tcp.local").unwrap();
        let browse = browse_query(&service);
        assert_eq!(browse.header.flags_word(), 0);
        assert_eq!(browse.questions.len(), 1);
        assert_eq!(browse.questions[0].qtype, QueryType::PTR);
        assert!(browse.questions[0].qu);

        let host = Name::from_str("box.local").unwrap();
        let resolve = resolve_query(&host);
        assert_eq!(resolve.questions[0].qtype, QueryType::A);
        assert_eq!(resolve.questions[0].qname, host);
    }
}
