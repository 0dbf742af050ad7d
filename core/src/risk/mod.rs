//! Risk assessment engine.
//!
//! A pure, deterministic scoring function: knowledge-base baseline plus
//! bind exposure, signature, service ownership and port heuristics. The
//! engine never returns an error; an internal fault degrades to an
//! `Unknown`, suspicious assessment.

mod allowlist;
pub mod rules;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{BindingScope, RiskLevel, ServiceBinding, SignatureStatus};
use crate::knowledge::PortKnowledgeBase;

pub use allowlist::{DevToolAllowList, DEFAULT_DEV_TOOLS};
use rules::{AssessmentState, RuleContext, RuleFn, RULES};

/// Reason reported when no rule contributed a factor.
pub const STANDARD_CONFIGURATION: &str = "Standard configuration";
/// Reason reported when the pipeline itself failed.
pub const ASSESSMENT_ERROR: &str = "Error during risk assessment";

/// Outcome of assessing one listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub final_risk: RiskLevel,
    pub base_risk: RiskLevel,
    pub is_suspicious: bool,
    /// Contributing factors in rule order.
    pub factors: Vec<String>,
    pub is_publicly_exposed: bool,
}

impl RiskAssessment {
    /// Factors joined for display, or the standard-configuration note.
    pub fn reason(&self) -> String {
        if self.factors.is_empty() {
            STANDARD_CONFIGURATION.to_string()
        } else {
            self.factors.join("; ")
        }
    }

    fn degraded(is_publicly_exposed: bool) -> Self {
        Self {
            final_risk: RiskLevel::Unknown,
            base_risk: RiskLevel::Unknown,
            is_suspicious: true,
            factors: vec![ASSESSMENT_ERROR.to_string()],
            is_publicly_exposed,
        }
    }
}

/// Scores listeners against the port knowledge base.
#[derive(Clone)]
pub struct RiskAssessmentEngine {
    knowledge: Arc<PortKnowledgeBase>,
    dev_tools: DevToolAllowList,
    rules: &'static [(&'static str, RuleFn)],
}

impl std::fmt::Debug for RiskAssessmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule_names: Vec<&str> = self.rules.iter().map(|(name, _)| *name).collect();
        f.debug_struct("RiskAssessmentEngine")
            .field("known_ports", &self.knowledge.len())
            .field("dev_tools", &self.dev_tools.names().len())
            .field("rules", &rule_names)
            .finish()
    }
}

impl RiskAssessmentEngine {
    pub fn new(knowledge: Arc<PortKnowledgeBase>) -> Self {
        Self {
            knowledge,
            dev_tools: DevToolAllowList::default(),
            rules: RULES,
        }
    }

    pub fn with_dev_tools(mut self, dev_tools: DevToolAllowList) -> Self {
        self.dev_tools = dev_tools;
        self
    }

    pub fn knowledge(&self) -> &PortKnowledgeBase {
        &self.knowledge
    }

    /// Assess one listener.
    pub fn assess(
        &self,
        port: u16,
        local_address: &str,
        process_path: &str,
        signature: SignatureStatus,
        service: Option<&ServiceBinding>,
    ) -> RiskAssessment {
        let scope = BindingScope::classify(local_address);
        let is_public = scope.is_public();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let ctx = RuleContext {
                port,
                scope,
                process_path,
                signature,
                service,
                dev_tools: &self.dev_tools,
            };
            let mut state = AssessmentState::new(self.knowledge.lookup(port).baseline_risk);
            for (_, rule) in self.rules {
                rule(&ctx, &mut state);
            }
            state
        }));

        match outcome {
            Ok(state) => RiskAssessment {
                final_risk: state.final_risk,
                base_risk: state.base_risk,
                is_suspicious: state.suspicious,
                factors: state.factors,
                is_publicly_exposed: is_public,
            },
            Err(_) => {
                warn!(port = port, address = local_address, "Risk assessment failed");
                RiskAssessment::degraded(is_public)
            }
        }
    }
}
