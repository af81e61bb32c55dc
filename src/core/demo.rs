//! Scripted fallback when no LLM backend is reachable. Produces a fixed,
//! finite run that exercises the full event contract, so the dashboard
//! behaves identically in demo mode and against a live backend.

use regex::Regex;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::core::events::{
    AgentEvent, AgentName, AgentStatus, EventMetadata, EventType, InferenceStats,
};

const DEMO_MODEL: &str = "qwen2.5-coder:14b";

/// One scripted tick: wait `delay_ms`, deliver `event`, and apply the status
/// transition if one rides along.
pub struct SimulationStep {
    pub delay_ms: u64,
    pub event: AgentEvent,
    pub status_update: Option<(AgentName, AgentStatus)>,
}

fn demo_stats(input: u64, output: u64, duration_ms: u64, tps: f64) -> InferenceStats {
    InferenceStats {
        model: DEMO_MODEL.to_string(),
        input_tokens: input,
        output_tokens: output,
        total_duration_ms: duration_ms,
        tokens_per_second: tps,
    }
}

fn intro_framing(user_message: &str) -> &'static str {
    let profile = Regex::new(r"(?i)profile|resume|skill|experience|background").unwrap();
    let job = Regex::new(r"(?i)job|search|find|opportunit|role|position").unwrap();
    let interview = Regex::new(r"(?i)interview|prep|practice|question").unwrap();

    if profile.is_match(user_message) {
        "Starting with a profile analysis."
    } else if job.is_match(user_message) {
        "Searching for matching opportunities first."
    } else if interview.is_match(user_message) {
        "Setting up interview preparation."
    } else {
        "Running the full agent pipeline."
    }
}

fn sample_jobs() -> serde_json::Value {
    json!({
        "summary": "Found 3 strong openings: Senior Frontend at Stripe ($200-320K, remote), Full-Stack Growth at Vercel ($180-280K, remote), and Staff Product Engineer at Figma ($240-380K). Demand for your stack is high right now.",
        "jobs": [
            {
                "title": "Senior Frontend Engineer",
                "company": "Stripe",
                "location": "Remote",
                "remote": true,
                "description": "Build the merchant dashboard surfaces: live transaction views, reporting, and the component system behind them.",
                "salaryMin": 200000,
                "salaryMax": 320000,
                "skills": ["TypeScript", "React", "GraphQL"],
                "requirements": ["5+ years frontend experience", "Design-system ownership"],
                "experienceLevel": "senior",
                "employmentType": "full-time"
            },
            {
                "title": "Full-Stack Engineer, Growth",
                "company": "Vercel",
                "location": "Remote",
                "remote": true,
                "description": "Own experiments across signup, onboarding, and billing; ship across the Next.js stack end to end.",
                "salaryMin": 180000,
                "salaryMax": 280000,
                "skills": ["TypeScript", "Next.js", "Node.js"],
                "requirements": ["Full-stack product experience", "Comfort with A/B infrastructure"],
                "experienceLevel": "senior",
                "employmentType": "full-time"
            },
            {
                "title": "Staff Product Engineer",
                "company": "Figma",
                "location": "San Francisco, CA",
                "remote": false,
                "description": "Lead multiplayer editing performance work: realtime sync, canvas rendering, and large-document scaling.",
                "salaryMin": 240000,
                "salaryMax": 380000,
                "skills": ["TypeScript", "WebGL", "Distributed Systems"],
                "requirements": ["8+ years experience", "Realtime collaboration background"],
                "experienceLevel": "lead",
                "employmentType": "full-time"
            }
        ]
    })
}

fn sample_matches() -> serde_json::Value {
    json!({
        "summary": "Scoring complete. Stripe Senior Frontend leads at 92% on your React and TypeScript depth; Vercel Growth follows at 88% on full-stack range; Figma Staff lands at 78%, held back by distributed-systems depth.",
        "matches": [
            {
                "jobTitle": "Senior Frontend Engineer",
                "overallScore": 92,
                "skillMatchScore": 95,
                "experienceMatchScore": 90,
                "educationMatchScore": 85,
                "cultureFitScore": 91,
                "skillGaps": [],
                "strengths": ["Component-library ownership", "Realtime dashboard work"],
                "reasoning": "Frontend depth exceeds the bar; dashboard background maps directly onto the team's charter."
            },
            {
                "jobTitle": "Full-Stack Engineer, Growth",
                "overallScore": 88,
                "skillMatchScore": 90,
                "experienceMatchScore": 88,
                "educationMatchScore": 85,
                "cultureFitScore": 86,
                "skillGaps": [
                    {
                        "skill": "Experimentation platforms",
                        "required": false,
                        "profileLevel": "beginner",
                        "requiredLevel": "intermediate",
                        "gapSeverity": "minor",
                        "suggestion": "Ship one A/B-tested feature end to end and write up the analysis."
                    }
                ],
                "strengths": ["Full-stack range", "Next.js production experience"],
                "reasoning": "Strong stack alignment; growth-specific tooling is learnable on the job."
            },
            {
                "jobTitle": "Staff Product Engineer",
                "overallScore": 78,
                "skillMatchScore": 75,
                "experienceMatchScore": 78,
                "educationMatchScore": 85,
                "cultureFitScore": 80,
                "skillGaps": [
                    {
                        "skill": "Distributed systems",
                        "required": true,
                        "profileLevel": "intermediate",
                        "requiredLevel": "advanced",
                        "gapSeverity": "moderate",
                        "suggestion": "Take ownership of a replication or sync component in your current role."
                    }
                ],
                "strengths": ["Rendering performance work", "Technical leadership"],
                "reasoning": "Great trajectory fit, but the realtime-sync bar wants deeper distributed-systems experience."
            }
        ]
    })
}

fn sample_interview_prep() -> serde_json::Value {
    json!({
        "summary": "Interview prep ready for the Stripe role. Three areas to drill: dashboard system design, React rendering performance, and leadership stories. 3 practice topics with 3 questions each.",
        "topics": [
            {
                "title": "System Design: Live Transaction Dashboard",
                "category": "technical",
                "difficulty": "hard",
                "questions": [
                    {
                        "question": "Design a merchant dashboard that streams live transaction updates to tens of thousands of concurrent sessions.",
                        "tip": "Pin down latency and freshness requirements first, then compare SSE and WebSockets, and sketch the fan-out and aggregation layers."
                    },
                    {
                        "question": "The dashboard shows numbers that lag the payment ledger by a few seconds. How do you keep the UI honest?",
                        "tip": "Talk about eventual consistency, surfacing data age in the UI, and reconciliation jobs rather than pretending the lag away."
                    },
                    {
                        "question": "Search and filtering over millions of historical transactions is slow. Where do you attack first?",
                        "tip": "Walk through indexing, pre-aggregation, cursor pagination, and what belongs client-side versus server-side."
                    }
                ]
            },
            {
                "title": "React Rendering Performance",
                "category": "technical",
                "difficulty": "medium",
                "questions": [
                    {
                        "question": "A large form re-renders on every keystroke. Walk through how you find and fix the problem.",
                        "tip": "Start from the profiler, then memoization boundaries, state colocation, and splitting context providers."
                    },
                    {
                        "question": "How do you render a 100K-row table with live updates without scroll jank?",
                        "tip": "Cover windowing, stable row keys, batching updates, and handling dynamic row heights."
                    },
                    {
                        "question": "What goes into a component library that stays tree-shakeable as it grows?",
                        "tip": "Discuss module boundaries, avoiding barrel-file side effects, and verifying bundle output in CI."
                    }
                ]
            },
            {
                "title": "Leadership and Collaboration",
                "category": "behavioral",
                "difficulty": "medium",
                "questions": [
                    {
                        "question": "Tell me about a project where the technical approach you inherited was wrong. What did you do?",
                        "tip": "Use a concrete arc: evidence gathered, how you built agreement, and the measured outcome."
                    },
                    {
                        "question": "Describe a trade-off you made under deadline pressure that you later revisited.",
                        "tip": "Show that the shortcut was deliberate, documented, and scheduled for payback, not silent debt."
                    },
                    {
                        "question": "How do you mentor without becoming the bottleneck for every decision?",
                        "tip": "Structured reviews, delegated ownership with guardrails, and examples of people you grew."
                    }
                ]
            }
        ]
    })
}

struct WorkerScript {
    agent: AgentName,
    thought: &'static str,
    message: &'static str,
    stats: InferenceStats,
    structured: Option<serde_json::Value>,
    activation_delay_ms: u64,
    thought_delay_ms: u64,
    message_delay_ms: u64,
}

fn worker_scripts() -> Vec<WorkerScript> {
    vec![
        WorkerScript {
            agent: AgentName::ProfileAnalyst,
            thought: "Reading the profile: senior full-stack engineer, seven years in. Mapping the skills matrix against the experience timeline...",
            message: "Profile analyzed. Standout strengths: deep TypeScript and React (6 years), solid Node.js and Python backend work, and a real technical-leadership track record. Growth areas: distributed-systems depth and hands-on ML infrastructure.",
            stats: demo_stats(142, 87, 2340, 37.2),
            structured: None,
            activation_delay_ms: 500,
            thought_delay_ms: 1200,
            message_delay_ms: 1000,
        },
        WorkerScript {
            agent: AgentName::MarketResearcher,
            thought: "Scanning current openings for senior full-stack and frontend platform roles. Filtering to the $180K-$400K band...",
            message: "Found 3 strong openings: Senior Frontend at Stripe ($200-320K, remote), Full-Stack Growth at Vercel ($180-280K, remote), and Staff Product Engineer at Figma ($240-380K). Demand for your stack is high right now.",
            stats: demo_stats(256, 104, 2810, 36.8),
            structured: Some(sample_jobs()),
            activation_delay_ms: 400,
            thought_delay_ms: 1100,
            message_delay_ms: 900,
        },
        WorkerScript {
            agent: AgentName::MatchScorer,
            thought: "Scoring each opening with the weighted model: skills 35%, experience 30%, education 15%, culture fit 20%...",
            message: "Scoring complete. Stripe Senior Frontend leads at 92% on your React and TypeScript depth; Vercel Growth follows at 88% on full-stack range; Figma Staff lands at 78%, held back by distributed-systems depth.",
            stats: demo_stats(384, 118, 3120, 38.1),
            structured: Some(sample_matches()),
            activation_delay_ms: 400,
            thought_delay_ms: 1300,
            message_delay_ms: 800,
        },
        WorkerScript {
            agent: AgentName::ResumeTailor,
            thought: "Tailoring the resume toward the top match. Pulling the realtime dashboard work and component-library ownership to the front...",
            message: "Resume tailored for the Stripe role. Moved the realtime dashboard project to the top, reframed the component-library work as design-system ownership, and added concrete performance numbers. Keyword coverage for the posting rose from 72% to 91%.",
            stats: demo_stats(412, 132, 3480, 37.9),
            structured: None,
            activation_delay_ms: 400,
            thought_delay_ms: 1000,
            message_delay_ms: 900,
        },
        WorkerScript {
            agent: AgentName::InterviewCoach,
            thought: "Building an interview plan for the Stripe Senior Frontend loop. Weighting system design and rendering performance...",
            message: "Interview prep ready. Three areas to drill: (1) system design for a live transaction dashboard, (2) React rendering performance and virtualized lists, (3) behavioral stories about leading cross-functional work. Practice topics are attached.",
            stats: demo_stats(468, 145, 3890, 37.5),
            structured: Some(sample_interview_prep()),
            activation_delay_ms: 400,
            thought_delay_ms: 1100,
            message_delay_ms: 800,
        },
    ]
}

/// The fixed 17-step script: one orchestrator intro, three steps per worker,
/// one pipeline summary. Deterministic apart from event ids and timestamps.
pub fn build_simulation_steps(user_message: &str) -> Vec<SimulationStep> {
    let mut steps = Vec::with_capacity(17);

    steps.push(SimulationStep {
        delay_ms: 300,
        event: AgentEvent::new(
            AgentName::Orchestrator,
            EventType::Message,
            format!(
                "I'll coordinate the agents to help you. {}",
                intro_framing(user_message)
            ),
        ),
        status_update: Some((AgentName::Orchestrator, AgentStatus::Executing)),
    });

    for script in worker_scripts() {
        let label = script.agent.as_str();
        steps.push(SimulationStep {
            delay_ms: script.activation_delay_ms,
            event: AgentEvent::status_change(
                script.agent,
                format!("{label} activated"),
                AgentStatus::Thinking,
            ),
            status_update: Some((script.agent, AgentStatus::Thinking)),
        });
        steps.push(SimulationStep {
            delay_ms: script.thought_delay_ms,
            event: AgentEvent::new(script.agent, EventType::Thought, script.thought),
            status_update: Some((script.agent, AgentStatus::Executing)),
        });
        steps.push(SimulationStep {
            delay_ms: script.message_delay_ms,
            event: AgentEvent::with_metadata(
                script.agent,
                EventType::Message,
                script.message,
                EventMetadata::inference(&script.stats, script.structured),
            ),
            status_update: Some((script.agent, AgentStatus::Complete)),
        });
    }

    steps.push(SimulationStep {
        delay_ms: 500,
        event: AgentEvent::with_metadata(
            AgentName::Orchestrator,
            EventType::Message,
            "Pipeline complete. Summary:\n\n\
             • Profile analyzed: strong full-stack base with clear growth areas\n\
             • 3 jobs matched: Stripe (92%), Vercel (88%), Figma (78%)\n\
             • Resume tailored for Stripe: keyword coverage up to 91%\n\
             • Interview prep ready: 3 topics, 9 questions\n\n\
             Check the matches and interview prep above for the details.",
            EventMetadata::PipelineSummary {
                pipeline_summary: true,
                total_input_tokens: 1662,
                total_output_tokens: 586,
                total_duration_ms: 15640,
                agent_count: 5,
            },
        ),
        status_update: Some((AgentName::Orchestrator, AgentStatus::Complete)),
    });

    steps
}

/// Streams the script with each step's delay honored. The producer task exits
/// as soon as the receiver is dropped.
pub fn demo_stream(user_message: String) -> UnboundedReceiverStream<SimulationStep> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for step in build_simulation_steps(&user_message) {
            tokio::time::sleep(std::time::Duration::from_millis(step.delay_ms)).await;
            if tx.send(step).is_err() {
                break;
            }
        }
    });
    UnboundedReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn script_is_exactly_seventeen_steps() {
        let steps = build_simulation_steps("find me a job");
        assert_eq!(steps.len(), 17);
        assert_eq!(steps[0].event.agent_name, AgentName::Orchestrator);
        assert_eq!(steps[0].event.kind, EventType::Message);
        let last = steps.last().unwrap();
        assert_eq!(last.event.agent_name, AgentName::Orchestrator);
        assert_eq!(
            last.status_update,
            Some((AgentName::Orchestrator, AgentStatus::Complete))
        );
    }

    #[test]
    fn each_worker_contributes_its_three_step_block() {
        let steps = build_simulation_steps("anything at all");
        for (i, worker) in AgentName::workers().into_iter().enumerate() {
            let block = &steps[1 + i * 3..1 + i * 3 + 3];
            assert_eq!(block[0].event.kind, EventType::StatusChange);
            assert_eq!(block[1].event.kind, EventType::Thought);
            assert_eq!(block[2].event.kind, EventType::Message);
            for step in block {
                assert_eq!(step.event.agent_name, worker);
            }
            assert!(matches!(
                block[2].event.metadata,
                Some(EventMetadata::Inference { .. })
            ));
        }
    }

    #[test]
    fn summary_totals_are_the_fixed_script_values() {
        let steps = build_simulation_steps("prep me");
        match steps.last().unwrap().event.metadata.as_ref().unwrap() {
            EventMetadata::PipelineSummary {
                pipeline_summary,
                total_input_tokens,
                total_output_tokens,
                total_duration_ms,
                agent_count,
            } => {
                assert!(pipeline_summary);
                assert_eq!(*total_input_tokens, 1662);
                assert_eq!(*total_output_tokens, 586);
                assert_eq!(*total_duration_ms, 15640);
                assert_eq!(*agent_count, 5);
            }
            other => panic!("expected pipeline summary metadata, got {:?}", other),
        }
    }

    #[test]
    fn per_step_stats_sum_to_the_summary_totals() {
        let steps = build_simulation_steps("prep me");
        let mut input = 0u64;
        let mut output = 0u64;
        for step in &steps {
            if let Some(EventMetadata::Inference {
                input_tokens,
                output_tokens,
                ..
            }) = step.event.metadata.as_ref()
            {
                input += input_tokens;
                output += output_tokens;
            }
        }
        assert_eq!(input, 1662);
        assert_eq!(output, 586);
    }

    #[test]
    fn intro_framing_tracks_request_keywords() {
        let profile = &build_simulation_steps("please review my resume")[0];
        assert!(profile.event.content.contains("profile analysis"));

        let job = &build_simulation_steps("find me open positions")[0];
        assert!(job.event.content.contains("matching opportunities"));

        let interview = &build_simulation_steps("help me practice")[0];
        assert!(interview.event.content.contains("interview preparation"));

        let fallback = &build_simulation_steps("hello there")[0];
        assert!(fallback.event.content.contains("full agent pipeline"));
    }

    #[test]
    fn structured_payloads_carry_three_samples_each() {
        let steps = build_simulation_steps("x");
        let structured_of = |agent: AgentName| {
            steps
                .iter()
                .find(|s| s.event.agent_name == agent && s.event.kind == EventType::Message)
                .and_then(|s| s.event.metadata.as_ref())
                .and_then(|m| m.structured_data())
                .cloned()
                .unwrap()
        };
        assert_eq!(
            structured_of(AgentName::MarketResearcher)["jobs"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            structured_of(AgentName::MatchScorer)["matches"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
        let topics = structured_of(AgentName::InterviewCoach);
        let topics = topics["topics"].as_array().unwrap();
        assert_eq!(topics.len(), 3);
        for topic in topics {
            assert_eq!(topic["questions"].as_array().unwrap().len(), 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stream_delivers_all_steps_in_order_with_paused_time() {
        let mut stream = demo_stream("find me a job".to_string());
        let mut seen = Vec::new();
        while let Some(step) = stream.next().await {
            seen.push((step.event.agent_name, step.event.kind));
        }
        assert_eq!(seen.len(), 17);
        assert_eq!(seen[0], (AgentName::Orchestrator, EventType::Message));
        assert_eq!(seen[1], (AgentName::ProfileAnalyst, EventType::StatusChange));
        assert_eq!(
            *seen.last().unwrap(),
            (AgentName::Orchestrator, EventType::Message)
        );
    }
}
