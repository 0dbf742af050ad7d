//! Process and service identity domain models.

use serde::{Deserialize, Serialize};

/// Code-signature verdict for a listener's executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SignatureStatus {
    Valid,
    NotSigned,
    Invalid,
    #[default]
    Unknown,
    /// The platform or process has no signature concept (kernel, Linux ELF).
    NotApplicable,
    PathNotFound,
    Error,
}

impl SignatureStatus {
    /// Statuses that do not raise suspicion on their own.
    pub fn is_trusted(self) -> bool {
        matches!(
            self,
            SignatureStatus::Valid | SignatureStatus::NotApplicable | SignatureStatus::Unknown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Valid => "Valid",
            SignatureStatus::NotSigned => "NotSigned",
            SignatureStatus::Invalid => "Invalid",
            SignatureStatus::Unknown => "Unknown",
            SignatureStatus::NotApplicable => "NotApplicable",
            SignatureStatus::PathNotFound => "PathNotFound",
            SignatureStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a resolver reports for a live process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetails {
    pub name: String,
    /// Absolute executable path, empty when it could not be read.
    pub path: String,
    pub user: String,
}

impl ProcessDetails {
    pub fn new(name: impl Into<String>, path: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            user: user.into(),
        }
    }
}

/// Resolved identity of the process owning a listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub process_name: String,
    pub executable_path: String,
    pub owning_user: String,
    pub signature_status: SignatureStatus,
}

/// Pid of the idle/kernel pseudo-process.
pub const IDLE_PID: u32 = 0;
/// Pid of the `System` pseudo-process.
pub const SYSTEM_PID: u32 = 4;

impl ProcessIdentity {
    /// Fixed identity for pids that are never handed to a resolver.
    pub fn sentinel(pid: u32) -> Option<Self> {
        let name = match pid {
            IDLE_PID => "System Idle Process",
            SYSTEM_PID => "System",
            _ => return None,
        };
        Some(Self {
            pid,
            process_name: name.to_string(),
            executable_path: String::new(),
            owning_user: "SYSTEM".to_string(),
            signature_status: SignatureStatus::NotApplicable,
        })
    }

    pub fn from_details(pid: u32, details: ProcessDetails, signature_status: SignatureStatus) -> Self {
        Self {
            pid,
            process_name: details.name,
            executable_path: details.path,
            owning_user: details.user,
            signature_status,
        }
    }

    /// Degraded identity for a process that exited or could not be inspected.
    pub fn unavailable(pid: u32) -> Self {
        Self {
            pid,
            process_name: "Unknown".to_string(),
            executable_path: String::new(),
            owning_user: "Unknown".to_string(),
            signature_status: SignatureStatus::Unknown,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.pid, IDLE_PID | SYSTEM_PID)
    }
}

/// The service-manager unit owning a process, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub service_name: Option<String>,
    pub display_name: String,
    pub binary_path: String,
    pub description: String,
    pub start_type: String,
    pub state: String,
    /// Owned by the host service manager (SCM on Windows, systemd on Linux).
    pub is_system_service: bool,
}

impl ServiceBinding {
    /// Implicit binding for kernel-owned sockets (sentinel pids).
    pub fn kernel() -> Self {
        Self {
            service_name: None,
            display_name: "Operating system kernel".to_string(),
            binary_path: String::new(),
            description: "Kernel-owned network endpoint".to_string(),
            start_type: "Boot".to_string(),
            state: "Running".to_string(),
            is_system_service: true,
        }
    }
}
