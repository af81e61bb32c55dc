//! Single-run execution loop: router decision, worker step execution, stats
//! aggregation, and event emission. Strictly sequential: every worker hands
//! control back to the router, and at most one LLM call is in flight.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::events::{AgentEvent, AgentName, AgentStatus, EventMetadata, EventType};
use crate::core::extract::extract_json;
use crate::core::llm::{LlmClient, LlmError};
use crate::core::pipeline::stats::StatsAggregator;
use crate::core::pipeline::steps::{AgentStep, StepContext, step_for};
use crate::core::pipeline::{
    MAX_ROUTER_STEPS, Node, RouterReply, route_after_agent, route_after_human_approval,
    route_after_orchestrator, router_system_prompt,
};
use crate::core::state::{PipelineState, StateUpdate};

/// Terminal condition of one pipeline run.
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Turn ended at the human-approval interrupt; resuming is a fresh
    /// invocation carrying the human's response.
    AwaitingApproval,
    Rejected,
    Cancelled,
    Failed(String),
}

/// Why a step (or router decision) stopped the run early.
enum Abort {
    /// Client cancelled or disconnected; emit nothing further.
    Cancelled,
    Llm(LlmError),
}

pub async fn run_pipeline(
    llm: &dyn LlmClient,
    state: &mut PipelineState,
    events_tx: &mpsc::UnboundedSender<AgentEvent>,
    cancel: &CancellationToken,
) -> RunOutcome {
    if state.human_approval_response.is_some() {
        if route_after_human_approval(state) == Node::Done {
            let rejected = AgentEvent::status_change(
                AgentName::Orchestrator,
                "Request rejected, workflow closed",
                AgentStatus::Complete,
            );
            let _ = emit(state, events_tx, rejected);
            state.apply(StateUpdate {
                agent_statuses: vec![(AgentName::Orchestrator, AgentStatus::Complete)],
                ..Default::default()
            });
            return RunOutcome::Rejected;
        }
        // Approval consumed; clear the interrupt so routing resumes.
        state.apply(StateUpdate {
            human_approval_needed: Some(false),
            ..Default::default()
        });
    }

    let mut agg = StatsAggregator::start();

    let opening = AgentEvent::status_change(
        AgentName::Orchestrator,
        "Orchestrator analyzing request",
        AgentStatus::Thinking,
    );
    if emit(state, events_tx, opening).is_err() {
        return RunOutcome::Cancelled;
    }
    state.apply(StateUpdate {
        agent_statuses: vec![(AgentName::Orchestrator, AgentStatus::Thinking)],
        ..Default::default()
    });

    let mut router_calls = 0usize;
    if let Err(abort) = decide_next(llm, state, cancel, &mut router_calls).await {
        return fail(state, events_tx, abort);
    }

    let intro = AgentEvent::new(
        AgentName::Orchestrator,
        EventType::Message,
        "Processing your request. Coordinating the agent pipeline...",
    );
    if emit(state, events_tx, intro).is_err() {
        return RunOutcome::Cancelled;
    }
    let routing = AgentEvent::status_change(
        AgentName::Orchestrator,
        "Orchestrator routing",
        AgentStatus::Executing,
    );
    if emit(state, events_tx, routing).is_err() {
        return RunOutcome::Cancelled;
    }
    state.apply(StateUpdate {
        agent_statuses: vec![(AgentName::Orchestrator, AgentStatus::Executing)],
        ..Default::default()
    });

    loop {
        match route_after_orchestrator(state) {
            Node::Done => break,
            Node::HumanApproval => {
                let request = AgentEvent::new(
                    AgentName::Orchestrator,
                    EventType::HumanRequest,
                    "Waiting for human approval",
                );
                if emit(state, events_tx, request).is_err() {
                    return RunOutcome::Cancelled;
                }
                let waiting = AgentEvent::status_change(
                    AgentName::Orchestrator,
                    "Orchestrator waiting for approval",
                    AgentStatus::WaitingForHuman,
                );
                let _ = emit(state, events_tx, waiting);
                state.apply(StateUpdate {
                    agent_statuses: vec![(AgentName::Orchestrator, AgentStatus::WaitingForHuman)],
                    ..Default::default()
                });
                return RunOutcome::AwaitingApproval;
            }
            Node::Router => unreachable!("router never routes to itself"),
            node => {
                let Some(step) = worker_step(node) else {
                    break;
                };
                if let Err(abort) =
                    execute_step(llm, state, events_tx, cancel, step, &mut agg).await
                {
                    return fail(state, events_tx, abort);
                }
                if route_after_agent(state) == Node::Done {
                    break;
                }
                if let Err(abort) = decide_next(llm, state, cancel, &mut router_calls).await {
                    return fail(state, events_tx, abort);
                }
            }
        }
    }

    let complete = AgentEvent::status_change(
        AgentName::Orchestrator,
        "Orchestrator complete",
        AgentStatus::Complete,
    );
    if emit(state, events_tx, complete).is_err() {
        return RunOutcome::Cancelled;
    }
    state.apply(StateUpdate {
        agent_statuses: vec![(AgentName::Orchestrator, AgentStatus::Complete)],
        ..Default::default()
    });

    let summary_meta = agg.summary();
    if let EventMetadata::PipelineSummary {
        total_input_tokens,
        total_output_tokens,
        total_duration_ms,
        agent_count,
        ..
    } = &summary_meta
    {
        info!(
            agents = *agent_count,
            input_tokens = *total_input_tokens,
            output_tokens = *total_output_tokens,
            avg_tokens_per_second =
                StatsAggregator::average_tokens_per_second(*total_output_tokens, *total_duration_ms),
            "pipeline complete"
        );
    }
    let summary = AgentEvent::with_metadata(
        AgentName::Orchestrator,
        EventType::Message,
        "All agents have completed. Check the results above for your personalized career analysis.",
        summary_meta,
    );
    if emit(state, events_tx, summary).is_err() {
        return RunOutcome::Cancelled;
    }

    RunOutcome::Completed
}

fn worker_step(node: Node) -> Option<&'static AgentStep> {
    let agent = match node {
        Node::ProfileAnalyst => AgentName::ProfileAnalyst,
        Node::MarketResearcher => AgentName::MarketResearcher,
        Node::MatchScorer => AgentName::MatchScorer,
        Node::ResumeTailor => AgentName::ResumeTailor,
        Node::InterviewCoach => AgentName::InterviewCoach,
        _ => return None,
    };
    step_for(agent)
}

/// Push an event onto both the transcript and the live stream. A closed
/// stream means the client is gone; the caller stops issuing LLM calls.
fn emit(
    state: &mut PipelineState,
    events_tx: &mpsc::UnboundedSender<AgentEvent>,
    event: AgentEvent,
) -> Result<(), ()> {
    state.events.push(event.clone());
    events_tx.send(event).map_err(|_| ())
}

fn fail(
    state: &mut PipelineState,
    events_tx: &mpsc::UnboundedSender<AgentEvent>,
    abort: Abort,
) -> RunOutcome {
    match abort {
        Abort::Cancelled => RunOutcome::Cancelled,
        Abort::Llm(err) => {
            let message = err.to_string();
            tracing::error!(error = %message, "pipeline run failed");
            state.apply(StateUpdate {
                error: Some(message.clone()),
                agent_statuses: vec![(AgentName::Orchestrator, AgentStatus::Error)],
                ..Default::default()
            });
            let event = AgentEvent::new(AgentName::Orchestrator, EventType::Error, &message);
            let _ = emit(state, events_tx, event);
            RunOutcome::Failed(message)
        }
    }
}

/// Ask the orchestrator LLM which node runs next and fold the validated
/// decision into the state. Unrecognized replies terminate the run; so does
/// exceeding the router-step ceiling.
async fn decide_next(
    llm: &dyn LlmClient,
    state: &mut PipelineState,
    cancel: &CancellationToken,
    router_calls: &mut usize,
) -> Result<(), Abort> {
    *router_calls += 1;
    if *router_calls > MAX_ROUTER_STEPS {
        warn!(
            limit = MAX_ROUTER_STEPS,
            "router step ceiling reached, forcing completion"
        );
        state.apply(StateUpdate {
            current_agent: Some(AgentName::Orchestrator),
            ..Default::default()
        });
        return Ok(());
    }

    let system_prompt = router_system_prompt(state);
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(Abort::Cancelled),
        res = llm.chat(&system_prompt, &state.user_message, None) => res.map_err(Abort::Llm)?,
    };

    let reply = RouterReply::parse(&response.content);
    info!(reply = response.content.trim(), "routing decision");

    let update = match reply {
        RouterReply::Worker(worker) => StateUpdate {
            current_agent: Some(worker),
            human_approval_needed: Some(false),
            ..Default::default()
        },
        RouterReply::HumanApproval => StateUpdate {
            human_approval_needed: Some(true),
            ..Default::default()
        },
        RouterReply::Done => StateUpdate {
            current_agent: Some(AgentName::Orchestrator),
            ..Default::default()
        },
        RouterReply::Unrecognized => {
            warn!(
                reply = response.content.trim(),
                "unrecognized routing reply, terminating run"
            );
            StateUpdate {
                current_agent: Some(AgentName::Orchestrator),
                ..Default::default()
            }
        }
    };
    state.apply(update);
    Ok(())
}

/// Run one worker step: exactly one LLM call, the surrounding lifecycle
/// events, structured extraction for JSON steps, and the state effects.
async fn execute_step(
    llm: &dyn LlmClient,
    state: &mut PipelineState,
    events_tx: &mpsc::UnboundedSender<AgentEvent>,
    cancel: &CancellationToken,
    step: &'static AgentStep,
    agg: &mut StatsAggregator,
) -> Result<(), Abort> {
    let name = step.name;

    let activated = AgentEvent::status_change(
        name,
        format!("{} activated", name.as_str()),
        AgentStatus::Thinking,
    );
    emit(state, events_tx, activated).map_err(|_| Abort::Cancelled)?;
    state.apply(StateUpdate {
        agent_statuses: vec![(name, AgentStatus::Thinking)],
        ..Default::default()
    });

    let thought = AgentEvent::new(
        name,
        EventType::Thought,
        format!("{} analyzing...", name.as_str()),
    );
    emit(state, events_tx, thought).map_err(|_| Abort::Cancelled)?;

    let user_message = {
        let ctx = StepContext {
            user_message: &state.user_message,
            step_outputs: &state.step_outputs,
        };
        (step.build_user_message)(&ctx)
    };

    // The in-flight call is discarded on cancellation: select drops the
    // future, and no event is emitted for it.
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(Abort::Cancelled),
        res = llm.chat(step.system_prompt, &user_message, step.max_tokens) => {
            res.map_err(Abort::Llm)?
        }
    };

    let executing = AgentEvent::status_change(
        name,
        format!("{} executing", name.as_str()),
        AgentStatus::Executing,
    );
    emit(state, events_tx, executing).map_err(|_| Abort::Cancelled)?;
    state.apply(StateUpdate {
        agent_statuses: vec![(name, AgentStatus::Executing)],
        ..Default::default()
    });

    // Extraction failure never aborts the run: the raw text is still
    // emitted, just without structured metadata.
    let structured = if step.json_agent {
        extract_json(&response.content)
    } else {
        None
    };
    let display = structured
        .as_ref()
        .and_then(|v| v.get("summary"))
        .and_then(|s| s.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| response.content.clone());

    let message = AgentEvent::with_metadata(
        name,
        EventType::Message,
        display,
        EventMetadata::inference(&response.stats, structured.clone()),
    );
    emit(state, events_tx, message).map_err(|_| Abort::Cancelled)?;

    let complete = AgentEvent::status_change(
        name,
        format!("{} complete", name.as_str()),
        AgentStatus::Complete,
    );
    emit(state, events_tx, complete).map_err(|_| Abort::Cancelled)?;

    agg.record(&response.stats);

    let mut update = StateUpdate {
        agent_statuses: vec![(name, AgentStatus::Complete)],
        completed_steps: vec![step.step_id().to_string()],
        step_output: Some((name, response.content.clone())),
        response: Some(response.content.clone()),
        ..Default::default()
    };
    match name {
        AgentName::MarketResearcher => {
            update.jobs = structured
                .as_ref()
                .and_then(|v| v.get("jobs"))
                .and_then(|j| j.as_array())
                .cloned();
        }
        AgentName::MatchScorer => {
            update.matches = structured
                .as_ref()
                .and_then(|v| v.get("matches"))
                .and_then(|m| m.as_array())
                .cloned();
        }
        AgentName::ResumeTailor => {
            update.tailored_resume = Some(response.content);
        }
        _ => {}
    }
    state.apply(update);

    Ok(())
}
