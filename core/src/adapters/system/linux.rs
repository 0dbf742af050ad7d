//! Linux listener source and identity resolver using ss, procfs and systemd.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::{ProcessDetails, Protocol, RawListener, ServiceBinding, SignatureStatus};
use crate::error::{Error, Result};
use crate::ports::{IdentityResolver, ListenerSource};

use super::utils::Utils;

static USERS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\("(.*?)",pid=(\d+),fd=(\d+)\)"#).expect("users pattern is valid")
});

/// Linux listener source backed by `ss -Htulnp`.
pub struct LinuxListenerSource {
    ss_binary: String,
}

impl LinuxListenerSource {
    pub fn new() -> Self {
        Self {
            ss_binary: "ss".to_string(),
        }
    }

    /// Parse `ss -Htulnp` output.
    ///
    /// Columns: Netid State Recv-Q Send-Q Local Peer Process. Only TCP
    /// `LISTEN` and UDP `UNCONN` rows are listeners; connected sockets are
    /// skipped even if the output contains them. A socket shared by several
    /// processes yields one listener per pid. Sockets we cannot attribute to
    /// a process are dropped.
    pub(crate) fn parse_ss_output(output: &str) -> Vec<RawListener> {
        let mut listeners = Vec::new();
        let mut seen: HashSet<(Protocol, String, u16, u32)> = HashSet::new();
        let mut unattributed = 0usize;

        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            let protocol = match components[0] {
                "tcp" => Protocol::Tcp,
                "udp" => Protocol::Udp,
                _ => continue,
            };
            let Some(state) = Utils::listening_state(protocol, components[1]) else {
                continue;
            };
            let Some((address, port)) = Utils::parse_address(components[4]) else {
                warn!(line = line, "Unparsable local address in ss output");
                continue;
            };
            let remote = Utils::parse_address(components[5]);

            let Some(process) = components.get(6) else {
                unattributed += 1;
                continue;
            };

            for caps in USERS_REGEX.captures_iter(process) {
                let pid: u32 = match caps[2].parse() {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                if !seen.insert((protocol, address.clone(), port, pid)) {
                    continue;
                }

                let mut listener = RawListener::listening(protocol, address.clone(), port, pid)
                    .with_state(state);
                if let Some((remote_address, remote_port)) = &remote {
                    listener = listener.with_remote(remote_address.clone(), *remote_port);
                }
                listeners.push(listener);
            }
        }

        if unattributed > 0 {
            debug!(
                count = unattributed,
                "Sockets without an owning process (run as root for full attribution)"
            );
        }

        listeners
    }
}

impl Default for LinuxListenerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerSource for LinuxListenerSource {
    async fn enumerate(&self) -> Result<Vec<RawListener>> {
        let output = Command::new(&self.ss_binary)
            .args(["-Htulnp"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ss: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandFailed(format!(
                "ss exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ss output: {}", e)))?;

        let listeners = Self::parse_ss_output(&stdout);
        debug!(count = listeners.len(), "Enumerated listeners");
        Ok(listeners)
    }
}

/// Linux identity resolver backed by procfs, ps and systemctl.
pub struct LinuxIdentityResolver {
    proc_root: PathBuf,
}

impl LinuxIdentityResolver {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Read process information from an alternate procfs mount.
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    fn proc_path(&self, pid: u32, entry: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(entry)
    }

    async fn process_user(&self, pid: u32) -> Option<String> {
        let output = Command::new("ps")
            .args(["-o", "user=", "-p", &pid.to_string()])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;
        let user = String::from_utf8(output.stdout).ok()?;
        let user = user.trim();
        if user.is_empty() {
            None
        } else {
            Some(user.to_string())
        }
    }

    async fn unit_properties(&self, unit: &str) -> Option<std::collections::HashMap<String, String>> {
        let output = Command::new("systemctl")
            .args([
                "show",
                unit,
                "-p",
                "Description",
                "-p",
                "ExecStart",
                "-p",
                "UnitFileState",
                "-p",
                "ActiveState",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8(output.stdout).ok()?;
        Some(Utils::parse_properties(&stdout))
    }
}

impl Default for LinuxIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver for LinuxIdentityResolver {
    async fn resolve_process(&self, pid: u32) -> Option<ProcessDetails> {
        let name = match tokio::fs::read_to_string(self.proc_path(pid, "comm")).await {
            Ok(comm) => comm.trim().to_string(),
            Err(e) => {
                debug!(pid = pid, error = %e, "Process not readable");
                return None;
            }
        };

        // Reading another user's exe link needs privileges; keep the name.
        let path = match tokio::fs::read_link(self.proc_path(pid, "exe")).await {
            Ok(link) => Utils::clean_exe_path(&link.to_string_lossy()),
            Err(e) => {
                debug!(pid = pid, error = %e, "Executable path unavailable");
                String::new()
            }
        };

        let user = self
            .process_user(pid)
            .await
            .unwrap_or_else(|| "Unknown".to_string());

        Some(ProcessDetails::new(name, path, user))
    }

    async fn resolve_signature(&self, path: &str) -> SignatureStatus {
        match tokio::fs::metadata(Path::new(path)).await {
            Ok(_) => SignatureStatus::NotApplicable,
            Err(e) if e.kind() == ErrorKind::NotFound => SignatureStatus::PathNotFound,
            Err(e) => {
                debug!(path = path, error = %e, "Executable not inspectable");
                SignatureStatus::Error
            }
        }
    }

    async fn resolve_service(&self, pid: u32) -> Option<ServiceBinding> {
        let cgroup = tokio::fs::read_to_string(self.proc_path(pid, "cgroup")).await.ok()?;
        let (unit, is_system) = Utils::parse_cgroup_unit(&cgroup)?;

        let display_name = unit.trim_end_matches(".service").to_string();
        let mut binding = ServiceBinding {
            service_name: Some(unit.clone()),
            display_name,
            binary_path: String::new(),
            description: String::new(),
            start_type: "N/A".to_string(),
            state: "active".to_string(),
            is_system_service: is_system,
        };

        // User units live in another manager; the cgroup is all we have.
        if !is_system {
            return Some(binding);
        }

        if let Some(props) = self.unit_properties(&unit).await {
            if let Some(description) = props.get("Description") {
                binding.description = description.clone();
            }
            if let Some(path) = props.get("ExecStart").and_then(|s| Utils::exec_start_path(s)) {
                binding.binary_path = path;
            }
            if let Some(start) = props.get("UnitFileState").filter(|s| !s.is_empty()) {
                binding.start_type = start.clone();
            }
            if let Some(state) = props.get("ActiveState").filter(|s| !s.is_empty()) {
                binding.state = state.clone();
            }
        } else {
            debug!(unit = %unit, "systemctl unavailable, using cgroup only");
        }

        Some(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SS_OUTPUT: &str = r#"udp   UNCONN 0      0      127.0.0.53%lo:53        0.0.0.0:*    users:(("systemd-resolve",pid=650,fd=13))
udp   UNCONN 0      0            0.0.0.0:5353      0.0.0.0:*    users:(("avahi-daemon",pid=700,fd=12))
tcp   LISTEN 0      4096         0.0.0.0:22        0.0.0.0:*    users:(("sshd",pid=900,fd=3))
tcp   LISTEN 0      4096            [::]:22           [::]:*    users:(("sshd",pid=900,fd=4))
tcp   LISTEN 0      511          0.0.0.0:80        0.0.0.0:*    users:(("nginx",pid=1201,fd=6),("nginx",pid=1200,fd=6))
tcp   ESTAB  0      0        10.0.0.5:22      10.0.0.9:51514   users:(("sshd",pid=4242,fd=4))
tcp   ESTAB  0      0     192.168.1.5:54321 93.184.216.34:443 users:(("firefox",pid=3000,fd=80))
udp   ESTAB  0      0     192.168.1.5:41000    1.1.1.1:53     users:(("resolver",pid=3100,fd=7))
tcp   TIME-WAIT 0   0        10.0.0.5:443     10.0.0.9:51000
tcp   LISTEN 0      128        127.0.0.1:631       0.0.0.0:*
"#;

    #[test]
    fn test_parse_ss_output() {
        let listeners = LinuxListenerSource::parse_ss_output(SS_OUTPUT);
        assert_eq!(listeners.len(), 6);

        let dns = &listeners[0];
        assert_eq!(dns.protocol, Protocol::Udp);
        assert_eq!(dns.local_address, "127.0.0.53%lo");
        assert_eq!(dns.local_port, 53);
        assert_eq!(dns.state, "UNCONN");
        assert_eq!(dns.owning_pid, 650);
        assert_eq!(dns.remote_address, None);

        let ssh_v6 = listeners
            .iter()
            .find(|l| l.local_address == "[::]" && l.local_port == 22)
            .unwrap();
        assert_eq!(ssh_v6.owning_pid, 900);
    }

    #[test]
    fn test_parse_ss_shared_socket_yields_each_pid() {
        let listeners = LinuxListenerSource::parse_ss_output(SS_OUTPUT);
        let nginx: Vec<u32> = listeners
            .iter()
            .filter(|l| l.local_port == 80)
            .map(|l| l.owning_pid)
            .collect();
        assert_eq!(nginx, vec![1201, 1200]);
    }

    #[test]
    fn test_parse_ss_excludes_connected_sockets() {
        let listeners = LinuxListenerSource::parse_ss_output(SS_OUTPUT);
        for pid in [4242, 3000, 3100] {
            assert!(
                listeners.iter().all(|l| l.owning_pid != pid),
                "connected socket of pid {} reported as a listener",
                pid
            );
        }
        assert!(listeners.iter().all(|l| l.state == "LISTEN" || l.state == "UNCONN"));
        assert!(listeners.iter().all(|l| l.remote_port.is_none()));
    }

    #[test]
    fn test_parse_ss_skips_noise() {
        let listeners = LinuxListenerSource::parse_ss_output("\nraw UNCONN 0 0 *:1 *:*\nshort line\n");
        assert!(listeners.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_reads_procfs() {
        let proc = tempfile::tempdir().unwrap();
        let pid_dir = proc.path().join("1234");
        std::fs::create_dir(&pid_dir).unwrap();
        std::fs::write(pid_dir.join("comm"), "nginx\n").unwrap();
        std::fs::write(pid_dir.join("cgroup"), "0::/user.slice/user-1000.slice/user@1000.service/app.slice/web.service\n").unwrap();

        let binary = proc.path().join("nginx-bin");
        std::fs::write(&binary, b"").unwrap();
        std::os::unix::fs::symlink(&binary, pid_dir.join("exe")).unwrap();

        let resolver = LinuxIdentityResolver::with_proc_root(proc.path());
        let details = resolver.resolve_process(1234).await.unwrap();
        assert_eq!(details.name, "nginx");
        assert_eq!(details.path, binary.to_string_lossy());

        let service = resolver.resolve_service(1234).await.unwrap();
        assert_eq!(service.service_name.as_deref(), Some("web.service"));
        assert_eq!(service.display_name, "web");
        assert!(!service.is_system_service);

        assert!(resolver.resolve_process(999_999).await.is_none());
        assert!(resolver.resolve_service(999_999).await.is_none());
    }

    #[tokio::test]
    async fn test_resolver_signature_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("daemon");
        std::fs::write(&binary, b"").unwrap();

        let resolver = LinuxIdentityResolver::new();
        assert_eq!(
            resolver.resolve_signature(&binary.to_string_lossy()).await,
            SignatureStatus::NotApplicable
        );
        assert_eq!(
            resolver
                .resolve_signature(&dir.path().join("gone").to_string_lossy())
                .await,
            SignatureStatus::PathNotFound
        );
    }
}
