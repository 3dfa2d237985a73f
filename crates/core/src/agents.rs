use crate::llm::{CompletionRequest, LlmClient};
use anyhow::Context;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Fundamental,
    Technical,
    Risk,
    Market,
    Coordinator,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::Fundamental => "fundamental",
            AgentRole::Technical => "technical",
            AgentRole::Risk => "risk",
            AgentRole::Market => "market",
            AgentRole::Coordinator => "coordinator",
        };
        f.write_str(s)
    }
}

/// A role-scoped model call: fixed description and instructions, no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct Agent {
    pub role: AgentRole,
    pub description: &'static str,
    pub instructions: &'static [&'static str],
}

pub const FUNDAMENTAL_ANALYST: Agent = Agent {
    role: AgentRole::Fundamental,
    description: "Performs fundamental analysis using financial statements and valuation ratios.",
    instructions: &[
        "Analyze revenue, net income, assets, and debt.",
        "Comment on profitability trends and balance sheet strength.",
        "If data is missing, note assumptions clearly.",
        "Output concise paragraphs with bullet key points and a 1-10 fundamental score.",
    ],
};

pub const TECHNICAL_ANALYST: Agent = Agent {
    role: AgentRole::Technical,
    description: "Analyzes technical indicators like SMA and RSI for momentum and trend.",
    instructions: &[
        "Interpret SMA(20), SMA(50), RSI(14), and volume to infer trend and momentum.",
        "Flag overbought/oversold zones and crossover signals.",
        "Output key signals and a 1-10 technical score.",
    ],
};

pub const RISK_ANALYST: Agent = Agent {
    role: AgentRole::Risk,
    description: "Evaluates idiosyncratic, sector, market, and regulatory risks.",
    instructions: &[
        "Assess leverage, cyclicality, competitive pressure, and macro sensitivity.",
        "Identify top 3 risks and potential mitigants.",
        "Output a 1-10 risk score (lower is riskier).",
    ],
};

pub const MARKET_ANALYST: Agent = Agent {
    role: AgentRole::Market,
    description: "Analyzes and compares stock performance.",
    instructions: &["Answer in one short paragraph."],
};

pub const COORDINATOR: Agent = Agent {
    role: AgentRole::Coordinator,
    description: "Aggregates all insights into a final report.",
    instructions: &[],
};

impl Agent {
    pub fn system_prompt(&self) -> String {
        if self.instructions.is_empty() {
            return self.description.to_string();
        }

        let mut out = String::from(self.description);
        out.push_str("\n\nInstructions:");
        for line in self.instructions {
            out.push_str("\n- ");
            out.push_str(line);
        }
        out
    }

    pub async fn run(&self, llm: &dyn LlmClient, prompt: String) -> anyhow::Result<String> {
        let prompt_chars = prompt.len();
        let text = llm
            .complete(CompletionRequest {
                system: Some(self.system_prompt()),
                prompt,
            })
            .await
            .with_context(|| format!("{} agent call failed", self.role))?;

        tracing::debug!(
            role = %self.role,
            provider = %llm.provider(),
            prompt_chars,
            response_chars = text.len(),
            "agent completed"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedLlm;

    #[test]
    fn system_prompt_lists_instructions() {
        let s = RISK_ANALYST.system_prompt();
        assert!(s.starts_with("Evaluates idiosyncratic"));
        assert!(s.contains("\n- Identify top 3 risks and potential mitigants."));
        assert_eq!(COORDINATOR.system_prompt(), COORDINATOR.description);
    }

    #[tokio::test]
    async fn run_sends_role_system_prompt() {
        let llm = ScriptedLlm::new(|_, _| Ok("ok".to_string()));
        let out = TECHNICAL_ANALYST
            .run(&llm, "Technical analysis for AAPL".to_string())
            .await
            .unwrap();
        assert_eq!(out, "ok");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "Technical analysis for AAPL");
        assert_eq!(calls[0].system.as_deref(), Some(TECHNICAL_ANALYST.system_prompt().as_str()));
    }

    #[tokio::test]
    async fn run_failure_names_the_role() {
        let llm = ScriptedLlm::new(|_, _| anyhow::bail!("quota exceeded"));
        let err = FUNDAMENTAL_ANALYST
            .run(&llm, "x".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fundamental agent call failed");
        assert!(format!("{err:#}").contains("quota exceeded"));
    }
}
