// =============================================================================
// chat.rs: THE BRIDGE
// =============================================================================
//
// One chat session = one transcript. Each question goes through the same
// pipeline:
//
//   classify -> execute -> narrate -> append a ChatTurn
//
// Failed lookups skip the language model entirely. The failure message is
// the reply, because there is nothing for the model to summarize.
//
// The transcript is append-only and lives exactly as long as the session.
// Nothing is written to disk.
// =============================================================================

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::executor::{QueryExecutor, QueryResult};
use crate::intent::{self, QueryIntent};
use crate::llm::LanguageModel;
use crate::metrics::MetricsCollector;
use crate::narrative::NarrativeGenerator;
use crate::providers::ShipDataProvider;

/// One question and everything that came of it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub asked_at: DateTime<Utc>,
    pub question: String,
    pub intent: QueryIntent,
    pub result: QueryResult,
    pub reply: String,
    /// True when the reply is not the language model's (fallback or error).
    pub degraded: bool,
}

/// What a line typed at the chat prompt means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    History,
    Stats,
    Regions,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        if !line.starts_with('/') {
            return ChatCommand::Ask(line.to_string());
        }
        match line.to_lowercase().as_str() {
            "/history" => ChatCommand::History,
            "/stats" => ChatCommand::Stats,
            "/regions" => ChatCommand::Regions,
            "/help" | "/?" => ChatCommand::Help,
            "/quit" | "/exit" | "/q" => ChatCommand::Quit,
            _ => ChatCommand::Unknown(line.to_string()),
        }
    }
}

pub const HELP_TEXT: &str = "Ask about ports, vessels or maritime regions, in Portuguese or English.
Examples:
  porto de santos
  navios no porto de Santos
  mmsi 710000001
  buscar navio Nordic Star
  navios no canal de suez
  navios tipo petroleiro
  bandeira da Libéria
Commands: /history /stats /regions /help /quit";

pub struct ChatSession {
    provider: Arc<dyn ShipDataProvider>,
    model: Arc<dyn LanguageModel>,
    metrics: Arc<MetricsCollector>,
    search_limit: usize,
    default_radius: f64,
    transcript: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn ShipDataProvider>,
        model: Arc<dyn LanguageModel>,
        metrics: Arc<MetricsCollector>,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            model,
            metrics,
            search_limit: config.search_limit,
            default_radius: config.default_area_radius,
            transcript: Vec::new(),
        }
    }

    /// Answer `question` and append the turn to the transcript.
    pub async fn ask(&mut self, question: &str) -> &ChatTurn {
        let question = question.trim();
        let (intent, rule) = intent::classify(question);
        self.metrics.increment_intent(intent.kind);

        let executor = QueryExecutor::new(self.provider.as_ref(), self.search_limit, self.default_radius);
        let result = executor.execute(&intent).await;
        self.metrics.record_result(&result);

        let (reply, degraded) = match &result {
            QueryResult::Failed { message, .. } => (format!("Sorry, the data could not be retrieved: {message}"), true),
            _ => {
                let narrative = NarrativeGenerator::new(self.model.as_ref()).narrate(question, &result).await;
                if narrative.degraded {
                    self.metrics.increment_degraded();
                }
                (narrative.text, narrative.degraded)
            }
        };

        let turn = ChatTurn {
            id: Uuid::new_v4(),
            asked_at: Utc::now(),
            question: question.to_string(),
            intent,
            result,
            reply,
            degraded,
        };

        info!(
            turn = %turn.id,
            intent = %turn.intent.kind,
            rule = rule.unwrap_or("none"),
            failed = turn.result.is_failed(),
            degraded = turn.degraded,
            transcript_len = self.transcript.len() + 1,
            "Chat turn answered"
        );

        self.transcript.push(turn);
        let index = self.transcript.len() - 1;
        &self.transcript[index]
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// The transcript as plain text, oldest first.
    pub fn render_history(&self) -> String {
        if self.transcript.is_empty() {
            return "No questions yet.".to_string();
        }
        let mut out = String::new();
        for (i, turn) in self.transcript.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{}] {} ({})\n  > {}\n  {}",
                i + 1,
                turn.asked_at.format("%H:%M:%S"),
                turn.intent.kind,
                turn.question,
                turn.reply.replace('\n', "\n  "),
            );
        }
        out.trim_end().to_string()
    }
}
