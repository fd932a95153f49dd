use std::time::Duration;
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tracing::debug;
use crate::app::ChatMessage;

/// Source of interviewer replies. Given the conversation so far, produce
/// the next agent message. Implementations may take as long as a real
/// model would; the app treats the call as an in-flight reply until it
/// resolves.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    async fn next_message(&self, history: &[ChatMessage]) -> Result<String>;
}

pub const GENERAL_QUESTIONS: &[&str] = &[
    "Tell me about your experience with this technology.",
    "What challenges did you face in your previous project?",
    "How would you handle a scenario where requirements change mid-project?",
    "Can you explain your approach to problem-solving?",
    "What interests you about this position?",
];

pub const BEHAVIORAL_QUESTIONS: &[&str] = &[
    "Tell me about a time you disagreed with a teammate. How did you resolve it?",
    "Describe a situation where you had to deliver under a tight deadline.",
    "Give me an example of a goal you set for yourself and how you reached it.",
    "Tell me about a mistake you made at work and what you learned from it.",
    "How do you handle feedback you don't agree with?",
];

pub const TECHNICAL_QUESTIONS: &[&str] = &[
    "How would you design a rate limiter for a public API?",
    "Walk me through how you would debug a service that suddenly got slow.",
    "What trade-offs do you weigh when choosing between SQL and NoSQL storage?",
    "How do you approach writing tests for a legacy codebase?",
    "Explain how you would scale a system from one server to many.",
];

/// Canned interviewer. Waits out a fixed "thinking" delay, then picks a
/// question from its bank uniformly at random. The history is ignored.
pub struct ScriptedInterviewer {
    questions: &'static [&'static str],
    think_delay: Duration,
}

impl ScriptedInterviewer {
    pub fn new(kind: &str, think_delay: Duration) -> Self {
        let questions = match kind {
            "behavioral" => BEHAVIORAL_QUESTIONS,
            "technical" => TECHNICAL_QUESTIONS,
            _ => GENERAL_QUESTIONS,
        };
        Self {
            questions,
            think_delay,
        }
    }
}

#[async_trait]
impl ResponseProvider for ScriptedInterviewer {
    async fn next_message(&self, history: &[ChatMessage]) -> Result<String> {
        tokio::time::sleep(self.think_delay).await;
        let idx = rand::rng().random_range(0..self.questions.len());
        debug!(history_len = history.len(), "picked canned question {idx}");
        Ok(self.questions[idx].to_string())
    }
}
