//! Mutable pipeline state threaded through a single run. One instance per
//! conversation turn, owned exclusively by that run; never shared.

use std::collections::{BTreeSet, HashMap};

use crate::core::events::{AgentEvent, AgentName, AgentStatus};

#[derive(Debug, Clone)]
pub struct PipelineState {
    pub conversation_id: String,
    pub user_id: String,
    pub user_message: String,
    pub current_agent: AgentName,
    pub agent_statuses: HashMap<AgentName, AgentStatus>,
    pub events: Vec<AgentEvent>,
    pub profile: Option<serde_json::Value>,
    pub jobs: Vec<serde_json::Value>,
    pub matches: Vec<serde_json::Value>,
    pub tailored_resume: Option<String>,
    pub human_approval_needed: bool,
    pub human_approval_response: Option<String>,
    pub error: Option<String>,
    pub completed_steps: BTreeSet<String>,
    /// Raw response of each executed step, threaded into downstream builders.
    pub step_outputs: HashMap<AgentName, String>,
    pub response: String,
}

/// Partial update produced by a node. Merge semantics mirror the state's
/// reducers: events concatenate, completed steps union, statuses merge per
/// agent, everything else is last-write-wins.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub current_agent: Option<AgentName>,
    pub agent_statuses: Vec<(AgentName, AgentStatus)>,
    pub events: Vec<AgentEvent>,
    pub profile: Option<serde_json::Value>,
    pub jobs: Option<Vec<serde_json::Value>>,
    pub matches: Option<Vec<serde_json::Value>>,
    pub tailored_resume: Option<String>,
    pub human_approval_needed: Option<bool>,
    pub human_approval_response: Option<Option<String>>,
    pub error: Option<String>,
    pub completed_steps: Vec<String>,
    pub step_output: Option<(AgentName, String)>,
    pub response: Option<String>,
}

impl PipelineState {
    pub fn new(conversation_id: String, user_id: String, user_message: String) -> Self {
        let mut agent_statuses = HashMap::new();
        for worker in AgentName::workers() {
            agent_statuses.insert(worker, AgentStatus::Idle);
        }
        agent_statuses.insert(AgentName::Orchestrator, AgentStatus::Idle);

        Self {
            conversation_id,
            user_id,
            user_message,
            current_agent: AgentName::Orchestrator,
            agent_statuses,
            events: Vec::new(),
            profile: None,
            jobs: Vec::new(),
            matches: Vec::new(),
            tailored_resume: None,
            human_approval_needed: false,
            human_approval_response: None,
            error: None,
            completed_steps: BTreeSet::new(),
            step_outputs: HashMap::new(),
            response: String::new(),
        }
    }

    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(agent) = update.current_agent {
            self.current_agent = agent;
        }
        for (agent, status) in update.agent_statuses {
            self.agent_statuses.insert(agent, status);
        }
        self.events.extend(update.events);
        if let Some(profile) = update.profile {
            self.profile = Some(profile);
        }
        if let Some(jobs) = update.jobs {
            self.jobs = jobs;
        }
        if let Some(matches) = update.matches {
            self.matches = matches;
        }
        if let Some(resume) = update.tailored_resume {
            self.tailored_resume = Some(resume);
        }
        if let Some(needed) = update.human_approval_needed {
            self.human_approval_needed = needed;
        }
        if let Some(response) = update.human_approval_response {
            self.human_approval_response = response;
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        for step in update.completed_steps {
            self.completed_steps.insert(step);
        }
        if let Some((agent, output)) = update.step_output {
            self.step_outputs.insert(agent, output);
        }
        if let Some(response) = update.response {
            self.response = response;
        }
    }

    pub fn status_of(&self, agent: AgentName) -> AgentStatus {
        self.agent_statuses
            .get(&agent)
            .copied()
            .unwrap_or(AgentStatus::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventType;

    fn fresh_state() -> PipelineState {
        PipelineState::new(
            "conv-1".to_string(),
            "user-1".to_string(),
            "Find me a senior backend role".to_string(),
        )
    }

    #[test]
    fn all_agents_start_idle() {
        let state = fresh_state();
        for worker in AgentName::workers() {
            assert_eq!(state.status_of(worker), AgentStatus::Idle);
        }
        assert_eq!(state.status_of(AgentName::Orchestrator), AgentStatus::Idle);
    }

    #[test]
    fn completed_steps_union_and_never_shrink() {
        let mut state = fresh_state();
        state.apply(StateUpdate {
            completed_steps: vec!["profile-analysis".to_string()],
            ..Default::default()
        });
        state.apply(StateUpdate {
            completed_steps: vec![
                "profile-analysis".to_string(),
                "market-research".to_string(),
            ],
            ..Default::default()
        });
        assert_eq!(state.completed_steps.len(), 2);
        assert!(state.completed_steps.contains("profile-analysis"));
    }

    #[test]
    fn events_concatenate_in_apply_order() {
        let mut state = fresh_state();
        state.apply(StateUpdate {
            events: vec![AgentEvent::new(
                AgentName::Orchestrator,
                EventType::Message,
                "first",
            )],
            ..Default::default()
        });
        state.apply(StateUpdate {
            events: vec![AgentEvent::new(
                AgentName::ProfileAnalyst,
                EventType::Message,
                "second",
            )],
            ..Default::default()
        });
        let contents: Vec<&str> = state.events.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn scalar_fields_are_last_write_wins() {
        let mut state = fresh_state();
        state.apply(StateUpdate {
            jobs: Some(vec![serde_json::json!({"title": "A"})]),
            response: Some("one".to_string()),
            ..Default::default()
        });
        state.apply(StateUpdate {
            jobs: Some(vec![serde_json::json!({"title": "B"})]),
            response: Some("two".to_string()),
            ..Default::default()
        });
        assert_eq!(state.jobs.len(), 1);
        assert_eq!(state.jobs[0]["title"], "B");
        assert_eq!(state.response, "two");
    }

    #[test]
    fn status_merge_is_per_agent() {
        let mut state = fresh_state();
        state.apply(StateUpdate {
            agent_statuses: vec![(AgentName::ProfileAnalyst, AgentStatus::Complete)],
            ..Default::default()
        });
        state.apply(StateUpdate {
            agent_statuses: vec![(AgentName::MarketResearcher, AgentStatus::Thinking)],
            ..Default::default()
        });
        assert_eq!(
            state.status_of(AgentName::ProfileAnalyst),
            AgentStatus::Complete
        );
        assert_eq!(
            state.status_of(AgentName::MarketResearcher),
            AgentStatus::Thinking
        );
    }
}
