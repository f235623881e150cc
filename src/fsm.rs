use std::net::SocketAddr;

use log::{trace, warn};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};

use crate::address_family::{multicast_send, open_service_socket, unicast_send};
use crate::dns_parser::{Class, Message, Name};
use crate::service::ServiceDescriptor;
use crate::{Error, DEFAULT_TTL};

pub(crate) enum Command {
    Shutdown,
}

/// The responder half of a registration. Owns the socket lifecycle: it
/// announces on startup, answers queries until shut down, and sends the
/// goodbye on the way out.
pub struct Service {
    descriptor: ServiceDescriptor,
    strict: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    started: watch::Sender<bool>,
}

/// The caller's half: signal shutdown and wait for the announcement to be
/// on the wire. Cloneable so several tasks can hold one.
#[derive(Clone)]
pub struct ServiceHandle {
    commands: mpsc::UnboundedSender<Command>,
    started: watch::Receiver<bool>,
}

impl ServiceHandle {
    /// Asks the responder to send its goodbye and stop. Safe to call more
    /// than once; calls after the responder is gone are no-ops, and a call
    /// before [`Service::run`] cancels the startup so nothing ever goes on
    /// the air.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Resolves once the responder has announced and is answering queries.
    pub async fn started(&mut self) {
        let _ = self.started.wait_for(|started| *started).await;
    }
}

/// Pairs a descriptor with a run mode. `strict` makes the responder treat
/// an undecodable datagram as fatal; otherwise such traffic is dropped.
pub fn register_service(descriptor: ServiceDescriptor, strict: bool) -> (Service, ServiceHandle) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (started_tx, started_rx) = watch::channel(false);
    (
        Service {
            descriptor,
            strict,
            commands: command_rx,
            started: started_tx,
        },
        ServiceHandle {
            commands: command_tx,
            started: started_rx,
        },
    )
}

impl Service {
    /// Announce, serve, say goodbye. Returns when the handle signals
    /// shutdown (or every handle is dropped), or with an error if the
    /// socket dies or strict mode meets a malformed packet.
    pub async fn run(mut self) -> Result<(), Error> {
        // A stop requested before startup means never going on the air.
        loop {
            match self.commands.try_recv() {
                Ok(Command::Shutdown) => return Ok(()),
                Err(mpsc::error::TryRecvError::Disconnected) => return Ok(()),
                Err(mpsc::error::TryRecvError::Empty) => break,
            }
        }

        let socket = open_service_socket(self.descriptor.addresses())?;
        let announcement = self.descriptor.announcement(DEFAULT_TTL).encode();
        multicast_send(&socket, &announcement).await?;
        let _ = self.started.send(true);

        let mut buf = vec![0u8; 65536];
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    if command.is_none() {
                        warn!("all service handles dropped, shutting down");
                    }
                    break;
                }
                received = socket.recv_from(&mut buf) => {
                    let (size, from) = received?;
                    let msg = match Message::decode(&buf[..size]) {
                        Ok(msg) => msg,
                        Err(err) if self.strict => return Err(Error::Decode(err)),
                        Err(err) => {
                            trace!("dropping undecodable packet from {}: {}", from, err);
                            continue;
                        }
                    };
                    self.handle_message(&socket, &msg, from).await?;
                }
            }
        }

        let goodbye = self.descriptor.announcement(0).encode();
        multicast_send(&socket, &goodbye).await?;
        Ok(())
    }

    /// Answers each question in arrival order, each with its own datagram.
    /// Questions that are not for us are skipped; a meta-discovery question
    /// carrying non-zero header flags abandons the rest of the message.
    /// Send failures surface, like the announce and goodbye sends.
    async fn handle_message(
        &self,
        socket: &UdpSocket,
        msg: &Message,
        from: SocketAddr,
    ) -> Result<(), Error> {
        let has_flags = msg.header.flags_word() != 0;
        for question in &msg.questions {
            match question.qclass {
                Class::IN | Class::Any => {}
                Class::Unknown(cls) => {
                    trace!("ignoring question with class {:#06x} from {}", cls, from);
                    break;
                }
            }
            let target = match classify(&self.descriptor, &question.qname) {
                Some(target) => target,
                None => continue,
            };
            if let QueryTarget::MetaDiscovery = target {
                if has_flags {
                    break;
                }
            }
            let answer = match target {
                QueryTarget::MetaDiscovery => self.descriptor.dnssd_answer(question.qu),
                QueryTarget::ServiceType => self.descriptor.service_answer(question.qu),
                QueryTarget::ServiceInstance => self.descriptor.instance_answer(question.qu),
                QueryTarget::Host => self.descriptor.host_answer(question.qu),
            };
            let encoded = answer.encode();
            if question.qu {
                unicast_send(socket, &encoded, from).await?;
            } else {
                multicast_send(socket, &encoded).await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryTarget {
    MetaDiscovery,
    ServiceType,
    ServiceInstance,
    Host,
}

fn classify(descriptor: &ServiceDescriptor, qname: &Name) -> Option<QueryTarget> {
    if *qname == crate::client::discovery_name() {
        Some(QueryTarget::MetaDiscovery)
    } else if qname == descriptor.service_type() {
        Some(QueryTarget::ServiceType)
    } else if qname == descriptor.service_name() {
        Some(QueryTarget::ServiceInstance)
    } else if qname == descriptor.qualified_host() {
        Some(QueryTarget::Host)
    } else {
        None
    }
}
