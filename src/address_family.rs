use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use log::debug;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::UdpSocket;

use crate::MDNS_PORT;

pub enum Inet {}

pub enum Inet6 {}

pub trait AddressFamily {
    type Addr: Into<IpAddr> + Copy;

    const MDNS_GROUP: Self::Addr;

    const DOMAIN: Domain;

    /// Multicast options scoped to one interface address: loopback on,
    /// non-zero TTL, group membership, and outgoing multicast pinned to
    /// the interface.
    fn configure_multicast(socket: &Socket, iface: &Self::Addr) -> io::Result<()>;

    fn udp_socket() -> io::Result<Socket> {
        Socket::new(Self::DOMAIN, Type::DGRAM, Some(Protocol::UDP))
    }

    /// One socket bound to `(iface, port)`, joined to the mDNS group for
    /// this family, ready for the tokio reactor.
    fn bind(iface: Self::Addr, port: u16) -> io::Result<std::net::UdpSocket> {
        let socket = Self::udp_socket()?;
        socket.set_reuse_address(true)?;
        #[cfg(not(windows))]
        socket.set_reuse_port(true)?;
        Self::configure_multicast(&socket, &iface)?;
        let addr: SockAddr = SocketAddr::new(iface.into(), port).into();
        socket.bind(&addr)?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    }
}

impl AddressFamily for Inet {
    type Addr = Ipv4Addr;

    const MDNS_GROUP: Self::Addr = Ipv4Addr::new(224, 0, 0, 251);

    const DOMAIN: Domain = Domain::IPV4;

    fn configure_multicast(socket: &Socket, iface: &Self::Addr) -> io::Result<()> {
        socket.set_multicast_loop_v4(true)?;
        socket.set_multicast_ttl_v4(255)?;
        socket.join_multicast_v4(&Self::MDNS_GROUP, iface)?;
        socket.set_multicast_if_v4(iface)
    }
}

impl AddressFamily for Inet6 {
    type Addr = Ipv6Addr;

    const MDNS_GROUP: Self::Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);

    const DOMAIN: Domain = Domain::IPV6;

    fn configure_multicast(socket: &Socket, _iface: &Self::Addr) -> io::Result<()> {
        socket.set_multicast_loop_v6(true)?;
        socket.set_multicast_hops_v6(255)?;
        // Joining by interface index would need the index for the address;
        // index 0 lets the kernel pick, which is as far as IPv6 support goes.
        socket.join_multicast_v6(&Self::MDNS_GROUP, 0)
    }
}

/// Opens one query socket on the given interface address. IPv6 group joins
/// fail on plenty of platforms, so a failed IPv6 setup skips the interface
/// (`Ok(None)`) instead of failing the whole query; IPv4 errors surface.
///
/// Must be called from within a tokio runtime.
pub fn open_socket(addr: IpAddr, port: u16) -> io::Result<Option<UdpSocket>> {
    let std_socket = match addr {
        IpAddr::V4(v4) => Inet::bind(v4, port)?,
        IpAddr::V6(v6) => match Inet6::bind(v6, port) {
            Ok(socket) => socket,
            Err(err) => {
                debug!("skipping IPv6 interface {}: {}", v6, err);
                return Ok(None);
            }
        },
    };
    Ok(Some(UdpSocket::from_std(std_socket)?))
}

/// The responder's socket: IPv4 wildcard on the mDNS port so queries sent to
/// 5353 arrive, joined to the group once per advertised IPv4 interface, with
/// outgoing multicast leaving on the first of them.
///
/// Must be called from within a tokio runtime.
pub fn open_service_socket(interfaces: &[IpAddr]) -> io::Result<UdpSocket> {
    let socket = Inet::udp_socket()?;
    socket.set_reuse_address(true)?;
    #[cfg(not(windows))]
    socket.set_reuse_port(true)?;
    socket.set_multicast_loop_v4(true)?;
    socket.set_multicast_ttl_v4(255)?;

    let v4_interfaces: Vec<Ipv4Addr> = interfaces
        .iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
        .collect();
    if v4_interfaces.is_empty() {
        socket.join_multicast_v4(&Inet::MDNS_GROUP, &Ipv4Addr::UNSPECIFIED)?;
    } else {
        for iface in &v4_interfaces {
            socket.join_multicast_v4(&Inet::MDNS_GROUP, iface)?;
        }
        socket.set_multicast_if_v4(&v4_interfaces[0])?;
    }

    let addr: SockAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), MDNS_PORT).into();
    socket.bind(&addr)?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

/// Sends to the mDNS group and port matching the socket's family.
pub async fn multicast_send(socket: &UdpSocket, data: &[u8]) -> io::Result<()> {
    let group = match socket.local_addr()? {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Inet::MDNS_GROUP), MDNS_PORT),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Inet6::MDNS_GROUP), MDNS_PORT),
    };
    socket.send_to(data, group).await.map(|_| ())
}

/// Sends straight back to a querier, for unicast-requested responses.
pub async fn unicast_send(socket: &UdpSocket, data: &[u8], to: SocketAddr) -> io::Result<()> {
    socket.send_to(data, to).await.map(|_| ())
}
