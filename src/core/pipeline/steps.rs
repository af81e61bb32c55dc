//! Static per-agent configuration: the system prompt, the user-message
//! builder reading prior step outputs, and the output-shape hint. Nothing
//! here mutates at runtime.

use std::collections::HashMap;

use crate::core::events::AgentName;

pub struct StepContext<'a> {
    pub user_message: &'a str,
    pub step_outputs: &'a HashMap<AgentName, String>,
}

impl StepContext<'_> {
    fn output_of(&self, agent: AgentName) -> &str {
        self.step_outputs
            .get(&agent)
            .map(|s| s.as_str())
            .unwrap_or("N/A")
    }
}

pub struct AgentStep {
    pub name: AgentName,
    pub system_prompt: &'static str,
    pub build_user_message: fn(&StepContext) -> String,
    pub max_tokens: Option<u32>,
    /// Output must be parsed as structured JSON rather than display prose.
    pub json_agent: bool,
}

impl AgentStep {
    /// Identifier recorded in `completed_steps` when this step finishes.
    pub fn step_id(&self) -> &'static str {
        match self.name {
            AgentName::ProfileAnalyst => "profile-analysis",
            AgentName::MarketResearcher => "market-research",
            AgentName::MatchScorer => "match-scoring",
            AgentName::ResumeTailor => "resume-tailoring",
            AgentName::InterviewCoach => "interview-coaching",
            AgentName::Orchestrator => "orchestration",
        }
    }
}

pub fn step_for(agent: AgentName) -> Option<&'static AgentStep> {
    AGENT_PIPELINE.iter().find(|s| s.name == agent)
}

pub static AGENT_PIPELINE: [AgentStep; 5] = [
    AgentStep {
        name: AgentName::ProfileAnalyst,
        system_prompt: "You are the Profile Analyst agent for CareerPilot. Analyze career profiles and extract key information.\n\
            Identify skills, strengths, experience level, and areas for growth. Be specific and actionable.\n\
            Keep your response concise (2-3 paragraphs).",
        build_user_message: |ctx| ctx.user_message.to_string(),
        max_tokens: None,
        json_agent: false,
    },
    AgentStep {
        name: AgentName::MarketResearcher,
        system_prompt: "You are the Market Researcher agent for CareerPilot. Search for relevant jobs and analyze market trends.\n\
            Based on the profile analysis, recommend matching job opportunities.\n\n\
            You MUST respond with valid JSON in the following format:\n\
            {\n\
              \"summary\": \"Brief 1-2 sentence summary of findings\",\n\
              \"jobs\": [\n\
                {\n\
                  \"title\": \"Job Title\",\n\
                  \"company\": \"Company Name\",\n\
                  \"location\": \"City, State or Remote\",\n\
                  \"remote\": true,\n\
                  \"description\": \"Brief job description\",\n\
                  \"salaryMin\": 150000,\n\
                  \"salaryMax\": 250000,\n\
                  \"skills\": [\"Skill1\", \"Skill2\"],\n\
                  \"requirements\": [\"Requirement 1\", \"Requirement 2\"],\n\
                  \"experienceLevel\": \"senior\",\n\
                  \"employmentType\": \"full-time\"\n\
                }\n\
              ]\n\
            }\n\n\
            experienceLevel must be one of: entry, mid, senior, lead, executive\n\
            employmentType must be one of: full-time, part-time, contract, freelance, internship\n\
            Return 2-4 jobs. Respond ONLY with JSON, no other text.",
        build_user_message: |ctx| {
            format!(
                "Profile Analysis:\n{}\n\nOriginal request: {}",
                ctx.output_of(AgentName::ProfileAnalyst),
                ctx.user_message
            )
        },
        max_tokens: Some(2048),
        json_agent: true,
    },
    AgentStep {
        name: AgentName::MatchScorer,
        system_prompt: "You are the Match Scorer agent for CareerPilot. Score how well profiles match job postings.\n\n\
            You MUST respond with valid JSON in the following format:\n\
            {\n\
              \"summary\": \"Brief 1-2 sentence summary of match results\",\n\
              \"matches\": [\n\
                {\n\
                  \"jobTitle\": \"Exact Job Title from jobs list\",\n\
                  \"overallScore\": 85,\n\
                  \"skillMatchScore\": 90,\n\
                  \"experienceMatchScore\": 80,\n\
                  \"educationMatchScore\": 75,\n\
                  \"cultureFitScore\": 88,\n\
                  \"skillGaps\": [\n\
                    {\n\
                      \"skill\": \"Skill Name\",\n\
                      \"required\": true,\n\
                      \"profileLevel\": \"intermediate\",\n\
                      \"requiredLevel\": \"advanced\",\n\
                      \"gapSeverity\": \"moderate\",\n\
                      \"suggestion\": \"How to close the gap\"\n\
                    }\n\
                  ],\n\
                  \"strengths\": [\"Strength 1\", \"Strength 2\"],\n\
                  \"reasoning\": \"Brief explanation of the match\"\n\
                }\n\
              ]\n\
            }\n\n\
            All scores are 0-100. profileLevel: none|beginner|intermediate|advanced|expert. requiredLevel: beginner|intermediate|advanced|expert. gapSeverity: none|minor|moderate|major.\n\
            Respond ONLY with JSON, no other text.",
        build_user_message: |ctx| {
            format!(
                "Profile:\n{}\n\nJobs:\n{}\n\nRequest: {}",
                ctx.output_of(AgentName::ProfileAnalyst),
                ctx.output_of(AgentName::MarketResearcher),
                ctx.user_message
            )
        },
        max_tokens: Some(2048),
        json_agent: true,
    },
    AgentStep {
        name: AgentName::ResumeTailor,
        system_prompt: "You are the Resume Tailor agent for CareerPilot. Optimize resumes for specific job applications.\n\
            Suggest specific improvements, keyword optimizations for ATS, and section rewrites.\n\
            Keep your response concise (2-3 paragraphs).",
        build_user_message: |ctx| {
            format!(
                "Profile:\n{}\n\nTop Match:\n{}\n\nRequest: {}",
                ctx.output_of(AgentName::ProfileAnalyst),
                ctx.output_of(AgentName::MatchScorer),
                ctx.user_message
            )
        },
        max_tokens: None,
        json_agent: false,
    },
    AgentStep {
        name: AgentName::InterviewCoach,
        system_prompt: "You are the Interview Coach agent for CareerPilot. Help prepare for interviews.\n\n\
            You MUST respond with valid JSON in the following format:\n\
            {\n\
              \"summary\": \"Brief 1-2 sentence summary of interview prep\",\n\
              \"topics\": [\n\
                {\n\
                  \"title\": \"Topic Title\",\n\
                  \"category\": \"technical\",\n\
                  \"difficulty\": \"medium\",\n\
                  \"questions\": [\n\
                    {\n\
                      \"question\": \"Interview question text\",\n\
                      \"tip\": \"Coaching tip for answering\"\n\
                    }\n\
                  ]\n\
                }\n\
              ]\n\
            }\n\n\
            category must be one of: behavioral, technical, situational, company\n\
            difficulty must be one of: easy, medium, hard\n\
            Return 3-5 topics with 2-4 questions each. Respond ONLY with JSON, no other text.",
        build_user_message: |ctx| {
            format!(
                "Profile:\n{}\n\nTarget Role:\n{}\n\nRequest: {}",
                ctx.output_of(AgentName::ProfileAnalyst),
                ctx.output_of(AgentName::MatchScorer),
                ctx.user_message
            )
        },
        max_tokens: Some(2048),
        json_agent: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_covers_each_worker_exactly_once() {
        let names: Vec<AgentName> = AGENT_PIPELINE.iter().map(|s| s.name).collect();
        assert_eq!(names, AgentName::workers());
        for worker in AgentName::workers() {
            assert!(step_for(worker).is_some());
        }
        assert!(step_for(AgentName::Orchestrator).is_none());
    }

    #[test]
    fn builders_fall_back_to_na_for_missing_prior_outputs() {
        let outputs = HashMap::new();
        let ctx = StepContext {
            user_message: "find roles",
            step_outputs: &outputs,
        };
        let msg = (step_for(AgentName::MatchScorer).unwrap().build_user_message)(&ctx);
        assert!(msg.starts_with("Profile:\nN/A"));
        assert!(msg.contains("Jobs:\nN/A"));
        assert!(msg.ends_with("Request: find roles"));
    }

    #[test]
    fn builders_thread_prior_step_outputs_downstream() {
        let mut outputs = HashMap::new();
        outputs.insert(
            AgentName::ProfileAnalyst,
            "Senior backend engineer, 8y Rust".to_string(),
        );
        let ctx = StepContext {
            user_message: "find roles",
            step_outputs: &outputs,
        };
        let msg = (step_for(AgentName::MarketResearcher)
            .unwrap()
            .build_user_message)(&ctx);
        assert!(msg.contains("Senior backend engineer, 8y Rust"));
        assert!(msg.contains("Original request: find roles"));
    }

    #[test]
    fn structured_steps_are_flagged_and_size_hinted() {
        for step in &AGENT_PIPELINE {
            if step.json_agent {
                assert_eq!(step.max_tokens, Some(2048));
                assert!(step.system_prompt.contains("ONLY with JSON"));
            }
        }
        assert!(!step_for(AgentName::ProfileAnalyst).unwrap().json_agent);
        assert!(!step_for(AgentName::ResumeTailor).unwrap().json_agent);
    }
}
