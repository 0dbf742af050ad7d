//! Ordered scoring rules.
//!
//! Each rule reads the immutable [`RuleContext`] and updates the running
//! [`AssessmentState`]. Order matters: later rules see, and may override,
//! what earlier rules decided.

use crate::domain::{BindingScope, RiskLevel, ServiceBinding, SignatureStatus};

use super::DevToolAllowList;

/// Ports whose public exposure is always Critical.
pub const HIGH_VALUE_PORTS: &[u16] = &[135, 139, 445, 3389, 23];
/// Cleartext legacy protocols.
pub const LEGACY_PORTS: &[u16] = &[21, 23, 80, 25];
/// Database engines' default ports.
pub const DATABASE_PORTS: &[u16] = &[1433, 3306, 5432, 27017, 6379];

/// Inputs shared by every rule.
pub struct RuleContext<'a> {
    pub port: u16,
    pub scope: BindingScope,
    pub process_path: &'a str,
    pub signature: SignatureStatus,
    pub service: Option<&'a ServiceBinding>,
    pub dev_tools: &'a DevToolAllowList,
}

/// Running result of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentState {
    pub base_risk: RiskLevel,
    pub final_risk: RiskLevel,
    pub suspicious: bool,
    pub factors: Vec<String>,
}

impl AssessmentState {
    pub fn new(base_risk: RiskLevel) -> Self {
        Self {
            base_risk,
            final_risk: base_risk,
            suspicious: false,
            factors: Vec::new(),
        }
    }

    fn factor(&mut self, text: impl Into<String>) {
        self.factors.push(text.into());
    }
}

pub type RuleFn = fn(&RuleContext<'_>, &mut AssessmentState);

/// The pipeline, in evaluation order.
pub const RULES: &[(&str, RuleFn)] = &[
    ("exposure", exposure),
    ("signature", signature),
    ("non_service", non_service),
    ("high_value_target", high_value_target),
    ("amplification", amplification),
    ("legacy_protocol", legacy_protocol),
    ("database_exposure", database_exposure),
];

/// Public binds escalate, loopback binds contain.
pub fn exposure(ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if ctx.scope.is_public() {
        match state.final_risk {
            RiskLevel::Medium => {
                state.final_risk = RiskLevel::High;
                state.factor("Listening on all interfaces (risk escalated)");
            }
            RiskLevel::High => {
                state.final_risk = RiskLevel::Critical;
                state.factor("Listening on all interfaces (risk escalated)");
            }
            RiskLevel::Unknown if ctx.port > 1024 => {
                state.suspicious = true;
                state.factor("Unrecognized high port exposed on all interfaces");
            }
            _ => state.factor("Listening on all interfaces"),
        }
    } else if ctx.scope.is_localhost() {
        let reduced = match state.final_risk {
            RiskLevel::Critical => Some(RiskLevel::High),
            RiskLevel::High => Some(RiskLevel::Medium),
            _ => None,
        };
        if let Some(level) = reduced {
            state.final_risk = level;
            state.factor("Bound to loopback only (risk reduced)");
        }
    }
}

pub fn signature(ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if ctx.signature.is_trusted() {
        return;
    }
    state.suspicious = true;
    state.factor(format!("Executable signature: {}", ctx.signature));
    if state.final_risk == RiskLevel::Unknown {
        state.final_risk = RiskLevel::Medium;
    }
}

/// Standalone processes on unusual ports, unless they are known dev tools.
pub fn non_service(ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if ctx.service.is_some() {
        return;
    }
    if let Some(tool) = ctx.dev_tools.matches(ctx.process_path) {
        state.factor(format!("Developer tool ({})", tool));
        return;
    }
    let port = ctx.port;
    if port > 10000 || (port > 1024 && port < 5000) {
        state.suspicious = true;
        state.factor("Standalone process on unusual port");
    }
}

pub fn high_value_target(ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if HIGH_VALUE_PORTS.contains(&ctx.port) && ctx.scope.is_public() {
        state.final_risk = RiskLevel::Critical;
        state.factor("High-value target exposed publicly");
    }
}

/// Several independent anomalies together raise low verdicts.
pub fn amplification(_ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if !state.suspicious || state.factors.len() < 2 {
        return;
    }
    state.final_risk = match state.final_risk {
        RiskLevel::Unknown => RiskLevel::High,
        RiskLevel::Low => RiskLevel::Medium,
        other => other,
    };
}

/// Informational only; the risk level is left alone.
pub fn legacy_protocol(ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if LEGACY_PORTS.contains(&ctx.port) && ctx.scope.is_public() {
        state.factor("Legacy cleartext protocol exposed");
    }
}

pub fn database_exposure(ctx: &RuleContext<'_>, state: &mut AssessmentState) {
    if DATABASE_PORTS.contains(&ctx.port) && ctx.scope.is_public() {
        state.factor("Database port exposed publicly");
        if state.final_risk == RiskLevel::Medium {
            state.final_risk = RiskLevel::High;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(port: u16, address: &str, dev_tools: &'a DevToolAllowList) -> RuleContext<'a> {
        RuleContext {
            port,
            scope: BindingScope::classify(address),
            process_path: "/usr/bin/daemon",
            signature: SignatureStatus::Valid,
            service: None,
            dev_tools,
        }
    }

    #[test]
    fn test_exposure_public_escalates() {
        let tools = DevToolAllowList::default();
        let mut state = AssessmentState::new(RiskLevel::Medium);
        exposure(&ctx(22, "0.0.0.0", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::High);

        let mut state = AssessmentState::new(RiskLevel::High);
        exposure(&ctx(3389, "::", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::Critical);
        assert!(!state.suspicious);
    }

    #[test]
    fn test_exposure_public_unknown_high_port_is_suspicious() {
        let tools = DevToolAllowList::default();
        let mut state = AssessmentState::new(RiskLevel::Unknown);
        exposure(&ctx(31337, "0.0.0.0", &tools), &mut state);
        assert!(state.suspicious);
        assert_eq!(state.final_risk, RiskLevel::Unknown);
        assert_eq!(state.factors.len(), 1);
    }

    #[test]
    fn test_exposure_localhost_contains() {
        let tools = DevToolAllowList::default();
        let mut state = AssessmentState::new(RiskLevel::Critical);
        exposure(&ctx(445, "127.0.0.1", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::High);

        let mut state = AssessmentState::new(RiskLevel::Medium);
        exposure(&ctx(5432, "::1", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::Medium);
        assert!(state.factors.is_empty());
    }

    #[test]
    fn test_exposure_specific_interface_unchanged() {
        let tools = DevToolAllowList::default();
        let mut state = AssessmentState::new(RiskLevel::High);
        exposure(&ctx(3389, "192.168.1.10", &tools), &mut state);
        assert_eq!(state, AssessmentState::new(RiskLevel::High));
    }

    #[test]
    fn test_signature_rule() {
        let tools = DevToolAllowList::default();
        let mut c = ctx(9999, "10.0.0.1", &tools);
        c.signature = SignatureStatus::Invalid;
        let mut state = AssessmentState::new(RiskLevel::Unknown);
        signature(&c, &mut state);
        assert!(state.suspicious);
        assert_eq!(state.final_risk, RiskLevel::Medium);
        assert_eq!(state.factors, vec!["Executable signature: Invalid".to_string()]);

        c.signature = SignatureStatus::Unknown;
        let mut state = AssessmentState::new(RiskLevel::Unknown);
        signature(&c, &mut state);
        assert!(!state.suspicious);
    }

    #[test]
    fn test_non_service_port_ranges() {
        let tools = DevToolAllowList::default();
        for (port, expected) in [(1024, false), (1025, true), (4999, true), (5000, false), (10000, false), (10001, true)] {
            let mut state = AssessmentState::new(RiskLevel::Unknown);
            non_service(&ctx(port, "10.0.0.1", &tools), &mut state);
            assert_eq!(state.suspicious, expected, "port {}", port);
        }
    }

    #[test]
    fn test_non_service_dev_tool_is_informational() {
        let tools = DevToolAllowList::default();
        let mut c = ctx(3001, "0.0.0.0", &tools);
        c.process_path = "/usr/local/bin/node";
        let mut state = AssessmentState::new(RiskLevel::Unknown);
        non_service(&c, &mut state);
        assert!(!state.suspicious);
        assert_eq!(state.factors, vec!["Developer tool (node)".to_string()]);
    }

    #[test]
    fn test_non_service_skipped_for_services() {
        let tools = DevToolAllowList::default();
        let binding = ServiceBinding::kernel();
        let mut c = ctx(12345, "0.0.0.0", &tools);
        c.service = Some(&binding);
        let mut state = AssessmentState::new(RiskLevel::Unknown);
        non_service(&c, &mut state);
        assert!(state.factors.is_empty());
    }

    #[test]
    fn test_amplification_needs_two_factors() {
        let tools = DevToolAllowList::default();
        let c = ctx(12345, "0.0.0.0", &tools);

        let mut state = AssessmentState::new(RiskLevel::Unknown);
        state.suspicious = true;
        state.factors.push("one".into());
        amplification(&c, &mut state);
        assert_eq!(state.final_risk, RiskLevel::Unknown);

        state.factors.push("two".into());
        amplification(&c, &mut state);
        assert_eq!(state.final_risk, RiskLevel::High);

        let mut state = AssessmentState::new(RiskLevel::Low);
        state.suspicious = true;
        state.factors = vec!["a".into(), "b".into()];
        amplification(&c, &mut state);
        assert_eq!(state.final_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_legacy_is_informational() {
        let tools = DevToolAllowList::default();
        let mut state = AssessmentState::new(RiskLevel::Medium);
        legacy_protocol(&ctx(80, "0.0.0.0", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::Medium);
        assert_eq!(state.factors.len(), 1);
    }

    #[test]
    fn test_database_exposure() {
        let tools = DevToolAllowList::default();
        let mut state = AssessmentState::new(RiskLevel::Medium);
        database_exposure(&ctx(6379, "0.0.0.0", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::High);

        let mut state = AssessmentState::new(RiskLevel::Medium);
        database_exposure(&ctx(6379, "127.0.0.1", &tools), &mut state);
        assert_eq!(state.final_risk, RiskLevel::Medium);
        assert!(state.factors.is_empty());
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = RULES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "exposure",
                "signature",
                "non_service",
                "high_value_target",
                "amplification",
                "legacy_protocol",
                "database_exposure"
            ]
        );
    }
}
