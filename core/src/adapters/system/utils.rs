use std::collections::HashMap;

use crate::domain::Protocol;

pub struct Utils;

impl Utils {
    /// Parse an address:port string.
    ///
    /// Handles multiple address formats:
    /// - IPv4: "127.0.0.1:3000" or "*:8080"
    /// - IPv6: "\[::1]:3000" or "\[fe80::1%eth0]:8080"
    /// - Zoned IPv4: "127.0.0.53%lo:53"
    ///
    /// A peer column such as "0.0.0.0:*" has no numeric port and yields `None`.
    pub fn parse_address(address: &str) -> Option<(String, u16)> {
        if address.starts_with('[') {
            let bracket_end = address.find(']')?;
            if bracket_end + 1 >= address.len() || address.as_bytes()[bracket_end + 1] != b':' {
                return None;
            }
            let addr = &address[..=bracket_end];
            let port: u16 = address[bracket_end + 2..].parse().ok()?;
            Some((addr.to_string(), port))
        } else {
            let last_colon = address.rfind(':')?;
            let addr = &address[..last_colon];
            let port: u16 = address[last_colon + 1..].parse().ok()?;
            let addr = if addr.is_empty() { "*" } else { addr };
            Some((addr.to_string(), port))
        }
    }

    /// The systemd unit a process runs under, from `/proc/<pid>/cgroup`.
    ///
    /// Returns the innermost `.service` segment and whether it belongs to
    /// the system manager (as opposed to a per-user manager). The
    /// `user@<uid>.service` manager unit itself is never reported.
    pub fn parse_cgroup_unit(cgroup: &str) -> Option<(String, bool)> {
        for line in cgroup.lines() {
            // hierarchy-ID:controller-list:cgroup-path
            let Some(path) = line.splitn(3, ':').nth(2) else {
                continue;
            };
            let unit = path
                .split('/')
                .filter(|segment| segment.ends_with(".service") && !segment.starts_with("user@"))
                .last();
            if let Some(unit) = unit {
                let system = path.starts_with("/system.slice/");
                return Some((unit.to_string(), system));
            }
        }
        None
    }

    /// `systemctl show` key=value output.
    pub fn parse_properties(output: &str) -> HashMap<String, String> {
        output
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect()
    }

    /// Binary path from an `ExecStart` property
    /// (`{ path=/usr/sbin/sshd ; argv[]=/usr/sbin/sshd -D ; ... }`).
    pub fn exec_start_path(exec_start: &str) -> Option<String> {
        let rest = exec_start.split("path=").nth(1)?;
        let path = rest.split([' ', ';']).next()?.trim();
        if path.is_empty() {
            None
        } else {
            Some(path.to_string())
        }
    }

    /// Readlink output of `/proc/<pid>/exe` without the unlinked marker.
    pub fn clean_exe_path(link: &str) -> String {
        link.strip_suffix(" (deleted)").unwrap_or(link).to_string()
    }

    /// State of a socket that is a listener on `protocol`, or `None` for
    /// connected and transient sockets.
    pub fn listening_state(protocol: Protocol, state: &str) -> Option<&'static str> {
        match (protocol, state) {
            (Protocol::Tcp, "LISTEN") => Some("LISTEN"),
            (Protocol::Udp, "UNCONN") => Some("UNCONN"),
            _ => None,
        }
    }
}
