//! Pipeline control flow: the routing state machine and the reply parsing
//! that turns the orchestrator LLM's free-text decision into a transition.
//!
//! All inter-agent sequencing is centralized: every worker hands control back
//! to the router, which re-evaluates the whole state after each step. A
//! failure anywhere halts the run instead of propagating stale state forward.

pub mod runner;
pub mod stats;
pub mod steps;

use crate::core::events::AgentName;
use crate::core::state::PipelineState;

/// Hard ceiling on router decisions per run. The routing decision comes from
/// a language model and is not schema-constrained, so without a ceiling a
/// worker could be revisited indefinitely.
pub const MAX_ROUTER_STEPS: usize = 16;

/// Nodes of the pipeline graph. `Done` is the single terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Router,
    ProfileAnalyst,
    MarketResearcher,
    MatchScorer,
    ResumeTailor,
    InterviewCoach,
    HumanApproval,
    Done,
}

impl Node {
    pub fn for_worker(agent: AgentName) -> Node {
        match agent {
            AgentName::ProfileAnalyst => Node::ProfileAnalyst,
            AgentName::MarketResearcher => Node::MarketResearcher,
            AgentName::MatchScorer => Node::MatchScorer,
            AgentName::ResumeTailor => Node::ResumeTailor,
            AgentName::InterviewCoach => Node::InterviewCoach,
            AgentName::Orchestrator => Node::Done,
        }
    }
}

/// Transition applied after the router node runs. Approval pre-empts
/// everything else; a recorded error terminates; otherwise dispatch on the
/// agent the router selected. Anything unrecognized terminates rather than
/// looping.
pub fn route_after_orchestrator(state: &PipelineState) -> Node {
    if state.human_approval_needed {
        return Node::HumanApproval;
    }
    if state.error.is_some() {
        return Node::Done;
    }
    Node::for_worker(state.current_agent)
}

/// Transition applied after any worker node runs: errors terminate, success
/// returns to the central decision point.
pub fn route_after_agent(state: &PipelineState) -> Node {
    if state.error.is_some() {
        return Node::Done;
    }
    Node::Router
}

/// Transition applied after the human-approval node. Rejection is terminal
/// for the run, not retryable.
pub fn route_after_human_approval(state: &PipelineState) -> Node {
    if state.human_approval_response.as_deref() == Some("rejected") {
        return Node::Done;
    }
    Node::Router
}

/// The router LLM's reply, validated against the closed tag set. The reply is
/// untrusted free text; anything outside the vocabulary maps to Unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterReply {
    Worker(AgentName),
    Done,
    HumanApproval,
    Unrecognized,
}

impl RouterReply {
    pub fn parse(reply: &str) -> Self {
        let token = reply.trim().to_lowercase();
        match token.as_str() {
            "done" => RouterReply::Done,
            "human_approval" => RouterReply::HumanApproval,
            other => match AgentName::parse(other) {
                Some(AgentName::Orchestrator) | None => RouterReply::Unrecognized,
                Some(worker) => RouterReply::Worker(worker),
            },
        }
    }
}

/// System prompt for the orchestrator's routing decision. Summarizes the
/// current state so the model can pick the next agent or a sentinel.
pub fn router_system_prompt(state: &PipelineState) -> String {
    let completed = if state.completed_steps.is_empty() {
        "nothing yet".to_string()
    } else {
        state
            .completed_steps
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "You are the orchestrator agent for CareerPilot, a job profile optimization platform.\n\
         Your role is to analyze user requests and determine which agent(s) should handle them.\n\n\
         Available agents:\n\
         - profile-analyst: Parse resumes, extract skills, build profiles\n\
         - market-researcher: Search jobs, analyze market trends, salary data\n\
         - match-scorer: Score profile-job fit, identify gaps, rank jobs\n\
         - resume-tailor: Tailor resumes for specific jobs, optimize keywords\n\
         - interview-coach: Generate interview questions, evaluate answers, coaching\n\n\
         Based on the user's message and current state, respond with ONLY the next agent name to route to.\n\
         If the task is complete, respond with \"DONE\".\n\
         If you need human approval, respond with \"HUMAN_APPROVAL\".\n\n\
         Consider what has already been completed: {completed}\n\
         Current profile: {profile}\n\
         Jobs found: {jobs}\n\
         Matches scored: {matches}",
        completed = completed,
        profile = if state.profile.is_some() {
            "loaded"
        } else {
            "not loaded"
        },
        jobs = state.jobs.len(),
        matches = state.matches.len(),
    )
}
