//! Event model shared by the pipeline, the fallback simulator, and the SSE
//! layer. Events are immutable once constructed; the order of emission is the
//! only meaningful sequence.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentName {
    ProfileAnalyst,
    MarketResearcher,
    MatchScorer,
    ResumeTailor,
    InterviewCoach,
    Orchestrator,
}

impl AgentName {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentName::ProfileAnalyst => "profile-analyst",
            AgentName::MarketResearcher => "market-researcher",
            AgentName::MatchScorer => "match-scorer",
            AgentName::ResumeTailor => "resume-tailor",
            AgentName::InterviewCoach => "interview-coach",
            AgentName::Orchestrator => "orchestrator",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "profile-analyst" => Some(AgentName::ProfileAnalyst),
            "market-researcher" => Some(AgentName::MarketResearcher),
            "match-scorer" => Some(AgentName::MatchScorer),
            "resume-tailor" => Some(AgentName::ResumeTailor),
            "interview-coach" => Some(AgentName::InterviewCoach),
            "orchestrator" => Some(AgentName::Orchestrator),
            _ => None,
        }
    }

    /// The five prompt-driven workers, in pipeline order. Excludes the
    /// orchestrator, which never produces domain output itself.
    pub fn workers() -> [AgentName; 5] {
        [
            AgentName::ProfileAnalyst,
            AgentName::MarketResearcher,
            AgentName::MatchScorer,
            AgentName::ResumeTailor,
            AgentName::InterviewCoach,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Executing,
    WaitingForHuman,
    Error,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Thought,
    ToolCall,
    ToolResult,
    Message,
    Error,
    HumanRequest,
    StatusChange,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Thought => "thought",
            EventType::ToolCall => "tool-call",
            EventType::ToolResult => "tool-result",
            EventType::Message => "message",
            EventType::Error => "error",
            EventType::HumanRequest => "human-request",
            EventType::StatusChange => "status-change",
        }
    }
}

/// Per-call inference measurement. Produced by the LLM collaborator, folded
/// into event metadata and the run's stats aggregator; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceStats {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_duration_ms: u64,
    pub tokens_per_second: f64,
}

/// Event payloads, one shape per event kind instead of an open map. The wire
/// representation stays flat (untagged) so the dashboard contract is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventMetadata {
    #[serde(rename_all = "camelCase")]
    PipelineSummary {
        pipeline_summary: bool,
        total_input_tokens: u64,
        total_output_tokens: u64,
        total_duration_ms: u64,
        agent_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Inference {
        model: String,
        input_tokens: u64,
        output_tokens: u64,
        duration_ms: u64,
        tokens_per_second: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        structured_data: Option<serde_json::Value>,
    },
    Status { status: AgentStatus },
}

impl EventMetadata {
    pub fn inference(stats: &InferenceStats, structured_data: Option<serde_json::Value>) -> Self {
        EventMetadata::Inference {
            model: stats.model.clone(),
            input_tokens: stats.input_tokens,
            output_tokens: stats.output_tokens,
            duration_ms: stats.total_duration_ms,
            tokens_per_second: stats.tokens_per_second,
            structured_data,
        }
    }

    pub fn structured_data(&self) -> Option<&serde_json::Value> {
        match self {
            EventMetadata::Inference {
                structured_data, ..
            } => structured_data.as_ref(),
            _ => None,
        }
    }
}

/// Atomic unit of observable pipeline activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    pub id: String,
    pub agent_name: AgentName,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
    pub timestamp: String,
}

impl AgentEvent {
    pub fn new(agent_name: AgentName, kind: EventType, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_name,
            kind,
            content: content.into(),
            metadata: None,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }

    pub fn with_metadata(
        agent_name: AgentName,
        kind: EventType,
        content: impl Into<String>,
        metadata: EventMetadata,
    ) -> Self {
        let mut event = Self::new(agent_name, kind, content);
        event.metadata = Some(metadata);
        event
    }

    pub fn status_change(
        agent_name: AgentName,
        content: impl Into<String>,
        status: AgentStatus,
    ) -> Self {
        Self::with_metadata(
            agent_name,
            EventType::StatusChange,
            content,
            EventMetadata::Status { status },
        )
    }
}
