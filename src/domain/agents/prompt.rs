//! Prompt assembly shared by the model-backed agents.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain::conversation::{Speaker, Turn};
use crate::domain::knowledge::{best_relevance, KnowledgeSnippet};
use crate::domain::routing::Task;
use crate::ports::{
    AIProvider, CompletionRequest, FinishReason, Message, RequestMetadata,
};

use super::{AgentContext, AgentError, AgentResponse};

/// Generation settings for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.4,
        }
    }
}

/// Human-readable name of a language code.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "sw" => "Kiswahili",
        other => other,
    }
}

/// Builds the system prompt: role, goals, reply language, then knowledge.
pub fn system_prompt(
    role: &str,
    goals: &[&str],
    extra_guidance: Option<&str>,
    language: &str,
    knowledge: &[KnowledgeSnippet],
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{}", role);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Goals:");
    for goal in goals {
        let _ = writeln!(prompt, "- {}", goal);
    }
    if let Some(guidance) = extra_guidance {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "{}", guidance);
    }
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Reply in {}. Keep replies short enough for a WhatsApp message.",
        language_name(language)
    );

    if !knowledge.is_empty() {
        let _ = writeln!(prompt);
        let _ = writeln!(
            prompt,
            "Use the following LipaChat knowledge where relevant. Do not invent facts that are not in it."
        );
        for snippet in knowledge {
            let _ = writeln!(prompt, "[{}] {}", snippet.source_id, snippet.text);
        }
    }

    prompt
}

/// Maps stored turns to model messages. System turns are bookkeeping and
/// are left out.
pub fn history_messages(history: &[Turn]) -> Vec<Message> {
    history
        .iter()
        .filter_map(|turn| match turn.speaker() {
            Speaker::Customer => Some(Message::user(turn.text())),
            Speaker::Agent => Some(Message::assistant(turn.text())),
            Speaker::System => None,
        })
        .collect()
}

/// Confidence from the best knowledge match and how the model stopped.
pub fn confidence(knowledge: &[KnowledgeSnippet], finish_reason: FinishReason) -> f64 {
    let base = 0.5 + 0.4 * best_relevance(knowledge).unwrap_or(0.0);
    let factor = match finish_reason {
        FinishReason::Stop => 1.0,
        FinishReason::Length => 0.7,
        FinishReason::ContentFilter | FinishReason::Error => 0.3,
    };
    (base * factor).clamp(0.0, 1.0)
}

/// One model round-trip for an agent.
pub(crate) async fn complete(
    provider: &Arc<dyn AIProvider>,
    settings: &ModelSettings,
    purpose: &str,
    system: String,
    task: &Task,
    context: &AgentContext,
    knowledge: &[KnowledgeSnippet],
) -> Result<AgentResponse, AgentError> {
    let trace_id = uuid::Uuid::new_v4().to_string();
    let request = CompletionRequest::new(RequestMetadata::new(
        context.conversation_id.clone(),
        purpose,
        trace_id,
    ))
    .with_system_prompt(system)
    .with_messages(history_messages(&context.history))
    .with_message(crate::ports::MessageRole::User, task.payload.clone())
    .with_max_tokens(settings.max_tokens)
    .with_temperature(settings.temperature);

    let response = provider.complete(request).await?;
    let text = response.content.trim();
    if text.is_empty() {
        return Err(AgentError::EmptyReply);
    }

    Ok(AgentResponse {
        text: text.to_string(),
        confidence: confidence(knowledge, response.finish_reason),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::AgentKind;
    use crate::domain::foundation::Timestamp;
    use crate::domain::routing::TaskCategory;

    #[test]
    fn system_prompt_includes_language_and_sources() {
        let knowledge = vec![KnowledgeSnippet::new("faq-reset-password", "Tap Forgot Password.", 0.8)];
        let prompt = system_prompt("You are support.", &["Help"], None, "sw", &knowledge);

        assert!(prompt.contains("Reply in Kiswahili"));
        assert!(prompt.contains("[faq-reset-password] Tap Forgot Password."));
        assert!(prompt.contains("- Help"));
    }

    #[test]
    fn system_prompt_without_knowledge_has_no_knowledge_section() {
        let prompt = system_prompt("Role", &[], Some("Extra"), "en", &[]);
        assert!(!prompt.contains("LipaChat knowledge"));
        assert!(prompt.contains("Extra"));
    }

    #[test]
    fn history_skips_system_turns() {
        let now = Timestamp::now();
        let history = vec![
            Turn::customer("hi", now, None, TaskCategory::GeneralInquiry),
            Turn::system("resolved", now, None),
            Turn::agent("hello", now, AgentKind::General),
        ];
        let messages = history_messages(&history);
        assert_eq!(messages, vec![Message::user("hi"), Message::assistant("hello")]);
    }

    #[test]
    fn confidence_rewards_relevant_knowledge() {
        let strong = vec![KnowledgeSnippet::new("a", "t", 1.0)];
        assert!((confidence(&strong, FinishReason::Stop) - 0.9).abs() < 1e-9);
        assert!((confidence(&[], FinishReason::Stop) - 0.5).abs() < 1e-9);
        assert!(confidence(&strong, FinishReason::Length) < confidence(&strong, FinishReason::Stop));
    }

    #[test]
    fn unknown_language_code_is_used_verbatim() {
        assert_eq!(language_name("fr"), "fr");
        assert_eq!(language_name("en"), "English");
    }
}
