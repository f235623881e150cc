use std::io;
use std::net::IpAddr;

use log::debug;

/// Addresses worth doing mDNS on: every non-loopback interface address,
/// minus IPv6 link-local ones, which need a scope id we do not carry.
pub fn interfaces() -> io::Result<Vec<IpAddr>> {
    let mut addrs = Vec::new();
    for iface in if_addrs::get_if_addrs()? {
        if iface.is_loopback() {
            continue;
        }
        let addr = iface.ip();
        if let IpAddr::V6(v6) = addr {
            if (v6.segments()[0] & 0xffc0) == 0xfe80 {
                debug!("skipping link-local {} on {}", v6, iface.name);
                continue;
            }
        }
        addrs.push(addr);
    }
    Ok(addrs)
}

/// One address per family: the first usable IPv4 and the first usable
/// IPv6. Enough for a responder's record set without advertising every
/// alias an interface carries.
pub fn service_interfaces() -> io::Result<Vec<IpAddr>> {
    let all = interfaces()?;
    let mut picked = Vec::with_capacity(2);
    if let Some(&v4) = all.iter().find(|addr| addr.is_ipv4()) {
        picked.push(v4);
    }
    if let Some(&v6) = all.iter().find(|addr| addr.is_ipv6()) {
        picked.push(v6);
    }
    Ok(picked)
}

/// The machine's hostname, as a single label suitable for `.local`
/// registration (anything after the first dot is dropped).
pub fn hostname() -> io::Result<String> {
    let name = hostname::get()?;
    let name = name.to_string_lossy();
    let label = name.split('.').next().unwrap_or(&name);
    Ok(label.to_owned())
}
