//! Builtin well-known port table.

use super::{PortCategory, PortKnowledgeEntry};
use crate::domain::RiskLevel;

use PortCategory::*;
use RiskLevel::{Critical, High, Low, Medium};

struct Known {
    port: u16,
    name: &'static str,
    service_hint: &'static str,
    baseline: RiskLevel,
    category: PortCategory,
    purpose: &'static str,
    recommendation: &'static str,
}

const KNOWN_PORTS: &[Known] = &[
    // -- Remote access --
    Known { port: 22, name: "SSH", service_hint: "sshd", baseline: Medium, category: RemoteAccess, purpose: "Secure remote shell", recommendation: "Use key authentication and disable root login" },
    Known { port: 23, name: "Telnet", service_hint: "telnetd", baseline: Critical, category: RemoteAccess, purpose: "Cleartext remote shell", recommendation: "Disable Telnet and use SSH" },
    Known { port: 3389, name: "RDP", service_hint: "TermService", baseline: High, category: RemoteAccess, purpose: "Remote Desktop Protocol", recommendation: "Restrict to VPN and enable Network Level Authentication" },
    Known { port: 5900, name: "VNC", service_hint: "vncserver", baseline: High, category: RemoteAccess, purpose: "Remote framebuffer desktop sharing", recommendation: "Tunnel over SSH and require a strong password" },
    Known { port: 5985, name: "WinRM", service_hint: "WinRM", baseline: High, category: Management, purpose: "Windows Remote Management over HTTP", recommendation: "Use HTTPS (5986) and restrict source addresses" },
    Known { port: 5986, name: "WinRM-HTTPS", service_hint: "WinRM", baseline: Medium, category: Management, purpose: "Windows Remote Management over HTTPS", recommendation: "Restrict to management networks" },
    // -- File sharing and transfer --
    Known { port: 21, name: "FTP", service_hint: "ftpd", baseline: High, category: FileTransfer, purpose: "Cleartext file transfer", recommendation: "Replace with SFTP or FTPS" },
    Known { port: 69, name: "TFTP", service_hint: "tftpd", baseline: High, category: FileTransfer, purpose: "Unauthenticated file transfer", recommendation: "Disable unless required for network boot" },
    Known { port: 111, name: "RPCbind", service_hint: "rpcbind", baseline: High, category: Infrastructure, purpose: "ONC RPC port mapper", recommendation: "Block externally; disable when NFS is unused" },
    Known { port: 135, name: "MS-RPC", service_hint: "RpcSs", baseline: High, category: Infrastructure, purpose: "Microsoft RPC endpoint mapper", recommendation: "Never expose to untrusted networks" },
    Known { port: 137, name: "NetBIOS-NS", service_hint: "netbt", baseline: High, category: FileSharing, purpose: "NetBIOS name service", recommendation: "Disable NetBIOS over TCP/IP" },
    Known { port: 138, name: "NetBIOS-DGM", service_hint: "netbt", baseline: High, category: FileSharing, purpose: "NetBIOS datagram service", recommendation: "Disable NetBIOS over TCP/IP" },
    Known { port: 139, name: "NetBIOS-SSN", service_hint: "netbt", baseline: High, category: FileSharing, purpose: "NetBIOS session service", recommendation: "Disable NetBIOS over TCP/IP" },
    Known { port: 445, name: "SMB", service_hint: "LanmanServer", baseline: Critical, category: FileSharing, purpose: "Windows file and printer sharing", recommendation: "Block at the perimeter and disable SMBv1" },
    Known { port: 2049, name: "NFS", service_hint: "nfsd", baseline: High, category: FileSharing, purpose: "Network File System", recommendation: "Restrict exports to trusted hosts" },
    // -- Mail --
    Known { port: 25, name: "SMTP", service_hint: "smtpd", baseline: Medium, category: Mail, purpose: "Mail transfer", recommendation: "Disable open relay and require STARTTLS" },
    Known { port: 110, name: "POP3", service_hint: "pop3d", baseline: Medium, category: Mail, purpose: "Cleartext mailbox retrieval", recommendation: "Use POP3S (995)" },
    Known { port: 143, name: "IMAP", service_hint: "imapd", baseline: Medium, category: Mail, purpose: "Cleartext mailbox access", recommendation: "Use IMAPS (993)" },
    Known { port: 465, name: "SMTPS", service_hint: "smtpd", baseline: Low, category: Mail, purpose: "Mail submission over TLS", recommendation: "Require authentication" },
    Known { port: 587, name: "Submission", service_hint: "smtpd", baseline: Low, category: Mail, purpose: "Mail submission", recommendation: "Require authentication and STARTTLS" },
    Known { port: 993, name: "IMAPS", service_hint: "imapd", baseline: Low, category: Mail, purpose: "Mailbox access over TLS", recommendation: "Keep TLS configuration current" },
    Known { port: 995, name: "POP3S", service_hint: "pop3d", baseline: Low, category: Mail, purpose: "Mailbox retrieval over TLS", recommendation: "Keep TLS configuration current" },
    // -- Directory --
    Known { port: 88, name: "Kerberos", service_hint: "kdc", baseline: Medium, category: Directory, purpose: "Kerberos authentication", recommendation: "Expose only on domain controllers" },
    Known { port: 389, name: "LDAP", service_hint: "slapd", baseline: Medium, category: Directory, purpose: "Cleartext directory access", recommendation: "Require LDAPS or StartTLS" },
    Known { port: 636, name: "LDAPS", service_hint: "slapd", baseline: Low, category: Directory, purpose: "Directory access over TLS", recommendation: "Restrict to internal networks" },
    // -- Databases --
    Known { port: 1433, name: "MSSQL", service_hint: "MSSQLSERVER", baseline: Medium, category: Database, purpose: "Microsoft SQL Server", recommendation: "Bind to internal interfaces only" },
    Known { port: 1434, name: "MSSQL-Browser", service_hint: "SQLBrowser", baseline: Medium, category: Database, purpose: "SQL Server browser service", recommendation: "Disable when named instances are unused" },
    Known { port: 3306, name: "MySQL", service_hint: "mysqld", baseline: Medium, category: Database, purpose: "MySQL / MariaDB server", recommendation: "Bind to localhost or a private interface" },
    Known { port: 5432, name: "PostgreSQL", service_hint: "postgres", baseline: Medium, category: Database, purpose: "PostgreSQL server", recommendation: "Bind to localhost and restrict pg_hba.conf" },
    Known { port: 6379, name: "Redis", service_hint: "redis-server", baseline: Medium, category: Database, purpose: "Redis key-value store", recommendation: "Enable protected mode and require a password" },
    Known { port: 9200, name: "Elasticsearch", service_hint: "elasticsearch", baseline: Medium, category: Database, purpose: "Elasticsearch HTTP API", recommendation: "Enable security features and bind privately" },
    Known { port: 11211, name: "Memcached", service_hint: "memcached", baseline: High, category: Database, purpose: "Memcached cache", recommendation: "Disable UDP and bind to localhost" },
    Known { port: 27017, name: "MongoDB", service_hint: "mongod", baseline: Medium, category: Database, purpose: "MongoDB server", recommendation: "Enable authentication and bind privately" },
    // -- Web --
    Known { port: 80, name: "HTTP", service_hint: "httpd", baseline: Medium, category: Web, purpose: "Cleartext web server", recommendation: "Redirect to HTTPS" },
    Known { port: 443, name: "HTTPS", service_hint: "httpd", baseline: Low, category: Web, purpose: "Web server over TLS", recommendation: "Keep TLS configuration current" },
    Known { port: 8080, name: "HTTP-Alt", service_hint: "http-proxy", baseline: Low, category: Web, purpose: "Alternate HTTP / proxy", recommendation: "Confirm the service is intended to be reachable" },
    Known { port: 8443, name: "HTTPS-Alt", service_hint: "https-alt", baseline: Low, category: Web, purpose: "Alternate HTTPS", recommendation: "Confirm the service is intended to be reachable" },
    // -- Infrastructure --
    Known { port: 53, name: "DNS", service_hint: "named", baseline: Medium, category: Infrastructure, purpose: "Domain name resolution", recommendation: "Disable recursion for external clients" },
    Known { port: 67, name: "DHCP", service_hint: "dhcpd", baseline: Low, category: Infrastructure, purpose: "Dynamic host configuration", recommendation: "Run only on designated DHCP servers" },
    Known { port: 123, name: "NTP", service_hint: "ntpd", baseline: Low, category: Infrastructure, purpose: "Time synchronization", recommendation: "Disable monlist and restrict queries" },
    Known { port: 161, name: "SNMP", service_hint: "snmpd", baseline: High, category: Management, purpose: "Network management", recommendation: "Use SNMPv3 and change community strings" },
    Known { port: 500, name: "IKE", service_hint: "charon", baseline: Low, category: Infrastructure, purpose: "IPsec key exchange", recommendation: "Expected on VPN gateways only" },
    Known { port: 514, name: "Syslog", service_hint: "rsyslogd", baseline: Medium, category: Infrastructure, purpose: "Remote log collection", recommendation: "Accept logs only from known senders" },
    Known { port: 631, name: "IPP", service_hint: "cupsd", baseline: Low, category: Infrastructure, purpose: "Printing (CUPS)", recommendation: "Bind to localhost unless sharing printers" },
    Known { port: 1900, name: "SSDP", service_hint: "upnp", baseline: Low, category: Infrastructure, purpose: "UPnP discovery", recommendation: "Disable UPnP on servers" },
    Known { port: 5353, name: "mDNS", service_hint: "avahi-daemon", baseline: Low, category: Infrastructure, purpose: "Multicast DNS discovery", recommendation: "Disable on servers that do not need discovery" },
    Known { port: 2375, name: "Docker-API", service_hint: "dockerd", baseline: Critical, category: Management, purpose: "Unauthenticated Docker daemon API", recommendation: "Use the Unix socket or TLS on 2376" },
    // -- Development --
    Known { port: 3000, name: "Dev-Server", service_hint: "node", baseline: Low, category: Development, purpose: "Common development web server", recommendation: "Bind to localhost while developing" },
    Known { port: 5000, name: "Dev-Server-Alt", service_hint: "flask", baseline: Low, category: Development, purpose: "Common development web server", recommendation: "Bind to localhost while developing" },
    Known { port: 8000, name: "Dev-HTTP", service_hint: "python", baseline: Low, category: Development, purpose: "Common development HTTP server", recommendation: "Bind to localhost while developing" },
];

/// Owned copies of the builtin table.
pub(super) fn entries() -> impl Iterator<Item = PortKnowledgeEntry> {
    KNOWN_PORTS.iter().map(|k| PortKnowledgeEntry {
        port: k.port,
        name: k.name.to_string(),
        service_hint: k.service_hint.to_string(),
        baseline_risk: k.baseline,
        purpose: k.purpose.to_string(),
        recommendation: k.recommendation.to_string(),
        category: k.category,
    })
}
