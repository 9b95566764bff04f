//! Provider-native request bodies.
//!
//! `format_body` is a pure function from (turn list, profile, generation
//! config) to the JSON body a provider's documented REST API expects. No
//! per-attempt material goes in here: auth headers, URL query keys, and
//! signatures are applied later during envelope assembly, so formatting the
//! same inputs twice yields structurally identical bodies.

use crate::profile::{ProviderProfile, WireFormat};
use mux_core::{ChatTurn, ContentPart, MuxError, MuxResult, TurnContent, TurnRole};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Output-token ceiling used where a provider requires the field and the
/// caller left it unset.
const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Extra output room granted on top of a thinking budget.
const THINKING_HEADROOM: u32 = 4096;

/// Per-call generation parameters.
///
/// Every sampling field is optional and absent fields are omitted from the
/// provider body outright, never defaulted to zero: providers treat
/// "absent" and "0" differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider-side model identifier. Required, non-blank.
    pub model: String,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling cutoff, for providers that accept one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Frequency penalty, OpenAI-family and Gemini only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty, OpenAI-family and Gemini only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Output token ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Thinking budget in tokens. A positive value enables the provider's
    /// reasoning mode, drops `temperature`, and floors `max_tokens` at
    /// budget + 4096.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
}

impl GenerationConfig {
    /// Config with the given model and no sampling parameters.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            max_tokens: None,
            stop: None,
            thinking_budget: None,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the nucleus sampling cutoff.
    #[must_use]
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the top-k sampling cutoff.
    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the frequency penalty.
    #[must_use]
    pub fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Set the presence penalty.
    #[must_use]
    pub fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Set the output token ceiling.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the stop sequences.
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Set the thinking budget.
    #[must_use]
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

/// Sampling values after the thinking-budget policy is applied.
struct Sampling {
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    thinking_budget: Option<u32>,
}

impl Sampling {
    fn from_config(config: &GenerationConfig) -> Self {
        match config.thinking_budget {
            Some(budget) if budget > 0 => {
                // Reasoning output competes with visible output, so the
                // ceiling must clear the budget with headroom to spare.
                let max_tokens = match config.max_tokens {
                    Some(requested) if requested > budget => requested,
                    _ => budget + THINKING_HEADROOM,
                };
                Self {
                    temperature: None,
                    max_tokens: Some(max_tokens),
                    thinking_budget: Some(budget),
                }
            }
            _ => Self {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                thinking_budget: None,
            },
        }
    }
}

/// Build the provider-native request body.
///
/// System turns move into the provider's dedicated top-level slot when the
/// profile's `system_field_separate` flag is set; otherwise they stay
/// inline in the turn list.
///
/// # Errors
/// [`MuxError::Configuration`] for a blank model id, an empty turn list, or
/// a Bedrock model id outside the supported families. Never a retry
/// trigger.
pub fn format_body(
    profile: &ProviderProfile,
    turns: &[ChatTurn],
    config: &GenerationConfig,
) -> MuxResult<Value> {
    if config.model.trim().is_empty() {
        return Err(MuxError::configuration(format!(
            "no model configured for {}",
            profile.display_name
        )));
    }
    if turns.is_empty() {
        return Err(MuxError::configuration("cannot send an empty turn list"));
    }

    let sampling = Sampling::from_config(config);
    let (system, rest) = if profile.system_field_separate {
        split_system(turns)
    } else {
        (None, turns.iter().collect())
    };
    match profile.wire {
        WireFormat::OpenAiSse => Ok(openai_body(&rest, config, &sampling)),
        WireFormat::AnthropicSse => Ok(anthropic_body(system, &rest, config, &sampling)),
        WireFormat::GeminiSse => Ok(gemini_body(system, &rest, config, &sampling)),
        WireFormat::AwsEventStream => bedrock_body(system, &rest, config, &sampling),
    }
}

fn insert_opt(body: &mut Value, key: &str, value: Option<Value>) {
    if let (Some(object), Some(value)) = (body.as_object_mut(), value) {
        object.insert(key.to_owned(), value);
    }
}

/// System turns joined into one string, and the remaining turns in order.
fn split_system(turns: &[ChatTurn]) -> (Option<String>, Vec<&ChatTurn>) {
    let mut system = Vec::new();
    let mut rest = Vec::new();
    for turn in turns {
        match turn.role {
            TurnRole::System => system.push(turn.flattened_text()),
            TurnRole::User | TurnRole::Assistant => rest.push(turn),
        }
    }
    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, rest)
}

/// Content in the tagged-parts shape shared by the OpenAI and Anthropic
/// message schemas. Attachments pass through in whatever shape the host
/// captured them.
fn tagged_content(content: &TurnContent) -> Value {
    match content {
        TurnContent::Text(text) => json!(text),
        TurnContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => json!({"type": "text", "text": text}),
                    ContentPart::Attachment { payload } => payload.clone(),
                })
                .collect(),
        ),
    }
}

fn openai_body(turns: &[&ChatTurn], config: &GenerationConfig, sampling: &Sampling) -> Value {
    let messages: Vec<Value> = turns
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role.as_str(),
                "content": tagged_content(&turn.content),
            })
        })
        .collect();

    let mut body = json!({
        "model": config.model,
        "messages": messages,
        "stream": true,
    });
    insert_opt(&mut body, "temperature", sampling.temperature.map(Value::from));
    insert_opt(&mut body, "top_p", config.top_p.map(Value::from));
    insert_opt(
        &mut body,
        "frequency_penalty",
        config.frequency_penalty.map(Value::from),
    );
    insert_opt(
        &mut body,
        "presence_penalty",
        config.presence_penalty.map(Value::from),
    );
    insert_opt(&mut body, "max_tokens", sampling.max_tokens.map(Value::from));
    insert_opt(&mut body, "stop", config.stop.clone().map(Value::from));
    if let Some(budget) = sampling.thinking_budget {
        body["reasoning"] = json!({ "max_tokens": budget });
    }
    body
}

fn anthropic_messages(turns: &[&ChatTurn]) -> Vec<Value> {
    turns
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role.as_str(),
                "content": tagged_content(&turn.content),
            })
        })
        .collect()
}

fn anthropic_body(
    system: Option<String>,
    turns: &[&ChatTurn],
    config: &GenerationConfig,
    sampling: &Sampling,
) -> Value {
    let mut body = json!({
        "model": config.model,
        // The messages API rejects bodies without max_tokens.
        "max_tokens": sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": anthropic_messages(turns),
        "stream": true,
    });
    insert_opt(&mut body, "system", system.map(Value::from));
    insert_opt(&mut body, "temperature", sampling.temperature.map(Value::from));
    insert_opt(&mut body, "top_p", config.top_p.map(Value::from));
    insert_opt(&mut body, "top_k", config.top_k.map(Value::from));
    insert_opt(
        &mut body,
        "stop_sequences",
        config.stop.clone().map(Value::from),
    );
    if let Some(budget) = sampling.thinking_budget {
        body["thinking"] = json!({ "type": "enabled", "budget_tokens": budget });
    }
    body
}

fn gemini_role(role: TurnRole) -> &'static str {
    match role {
        TurnRole::Assistant => "model",
        TurnRole::System | TurnRole::User => "user",
    }
}

fn gemini_parts(content: &TurnContent) -> Value {
    match content {
        TurnContent::Text(text) => json!([{ "text": text }]),
        TurnContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => json!({ "text": text }),
                    ContentPart::Attachment { payload } => payload.clone(),
                })
                .collect(),
        ),
    }
}

fn gemini_body(
    system: Option<String>,
    turns: &[&ChatTurn],
    config: &GenerationConfig,
    sampling: &Sampling,
) -> Value {
    let contents: Vec<Value> = turns
        .iter()
        .map(|turn| {
            json!({
                "role": gemini_role(turn.role),
                "parts": gemini_parts(&turn.content),
            })
        })
        .collect();

    let mut generation = json!({});
    insert_opt(
        &mut generation,
        "temperature",
        sampling.temperature.map(Value::from),
    );
    insert_opt(&mut generation, "topP", config.top_p.map(Value::from));
    insert_opt(&mut generation, "topK", config.top_k.map(Value::from));
    insert_opt(
        &mut generation,
        "frequencyPenalty",
        config.frequency_penalty.map(Value::from),
    );
    insert_opt(
        &mut generation,
        "presencePenalty",
        config.presence_penalty.map(Value::from),
    );
    insert_opt(
        &mut generation,
        "maxOutputTokens",
        sampling.max_tokens.map(Value::from),
    );
    insert_opt(
        &mut generation,
        "stopSequences",
        config.stop.clone().map(Value::from),
    );
    if let Some(budget) = sampling.thinking_budget {
        generation["thinkingConfig"] = json!({ "thinkingBudget": budget });
    }

    let mut body = json!({ "contents": contents });
    if let Some(system) = system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if generation.as_object().is_some_and(|map| !map.is_empty()) {
        body["generationConfig"] = generation;
    }
    body
}

/// Bedrock model families with distinct invoke-body shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFamily {
    Claude,
    Titan,
    Llama,
    Mistral,
}

impl ModelFamily {
    fn from_model_id(model_id: &str) -> Option<Self> {
        // Cross-region inference profiles prefix the bare model id.
        let id = model_id
            .strip_prefix("us.")
            .or_else(|| model_id.strip_prefix("eu."))
            .or_else(|| model_id.strip_prefix("apac."))
            .unwrap_or(model_id);
        if id.starts_with("anthropic.") {
            Some(Self::Claude)
        } else if id.starts_with("amazon.titan") {
            Some(Self::Titan)
        } else if id.starts_with("meta.llama") {
            Some(Self::Llama)
        } else if id.starts_with("mistral.") {
            Some(Self::Mistral)
        } else {
            None
        }
    }
}

fn bedrock_body(
    system: Option<String>,
    turns: &[&ChatTurn],
    config: &GenerationConfig,
    sampling: &Sampling,
) -> MuxResult<Value> {
    let family = ModelFamily::from_model_id(config.model.trim()).ok_or_else(|| {
        MuxError::configuration(format!(
            "unsupported Bedrock model family for `{}`",
            config.model.trim()
        ))
    })?;

    Ok(match family {
        ModelFamily::Claude => bedrock_claude_body(system, turns, config, sampling),
        ModelFamily::Titan => bedrock_titan_body(system.as_deref(), turns, config, sampling),
        ModelFamily::Llama => bedrock_llama_body(system.as_deref(), turns, sampling),
        ModelFamily::Mistral => bedrock_mistral_body(system.as_deref(), turns, config, sampling),
    })
}

fn bedrock_claude_body(
    system: Option<String>,
    turns: &[&ChatTurn],
    config: &GenerationConfig,
    sampling: &Sampling,
) -> Value {
    let mut body = json!({
        "anthropic_version": "bedrock-2023-05-31",
        "max_tokens": sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": anthropic_messages(turns),
    });
    insert_opt(&mut body, "system", system.map(Value::from));
    insert_opt(&mut body, "temperature", sampling.temperature.map(Value::from));
    insert_opt(&mut body, "top_p", config.top_p.map(Value::from));
    insert_opt(&mut body, "top_k", config.top_k.map(Value::from));
    insert_opt(
        &mut body,
        "stop_sequences",
        config.stop.clone().map(Value::from),
    );
    if let Some(budget) = sampling.thinking_budget {
        body["thinking"] = json!({ "type": "enabled", "budget_tokens": budget });
    }
    body
}

/// Labeled transcript for the prompt-in/text-out families.
fn labeled_transcript(system: Option<&str>, turns: &[&ChatTurn]) -> String {
    let mut prompt = String::new();
    if let Some(system) = system {
        prompt.push_str("System: ");
        prompt.push_str(system);
        prompt.push_str("\n\n");
    }
    for turn in turns {
        let label = match turn.role {
            TurnRole::System => "System",
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        };
        prompt.push_str(label);
        prompt.push_str(": ");
        prompt.push_str(&turn.flattened_text());
        prompt.push_str("\n\n");
    }
    prompt.push_str("Assistant:");
    prompt
}

/// Instruction-tagged prompt for the Llama and Mistral families. System
/// text folds into the first instruction block.
fn inst_transcript(system: Option<&str>, turns: &[&ChatTurn]) -> String {
    let mut pending_system = system;
    let mut prompt = String::new();
    for turn in turns {
        let text = turn.flattened_text();
        match turn.role {
            TurnRole::User => {
                prompt.push_str("<s>[INST] ");
                if let Some(system) = pending_system.take() {
                    prompt.push_str(system);
                    prompt.push_str("\n\n");
                }
                prompt.push_str(&text);
                prompt.push_str(" [/INST]");
            }
            TurnRole::Assistant => {
                prompt.push(' ');
                prompt.push_str(&text);
                prompt.push_str(" </s>");
            }
            TurnRole::System => {}
        }
    }
    prompt
}

fn bedrock_titan_body(
    system: Option<&str>,
    turns: &[&ChatTurn],
    config: &GenerationConfig,
    sampling: &Sampling,
) -> Value {
    let mut generation = json!({
        "maxTokenCount": sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    });
    insert_opt(
        &mut generation,
        "temperature",
        sampling.temperature.map(Value::from),
    );
    insert_opt(&mut generation, "topP", config.top_p.map(Value::from));
    insert_opt(
        &mut generation,
        "stopSequences",
        config.stop.clone().map(Value::from),
    );
    json!({
        "inputText": labeled_transcript(system, turns),
        "textGenerationConfig": generation,
    })
}

fn bedrock_llama_body(system: Option<&str>, turns: &[&ChatTurn], sampling: &Sampling) -> Value {
    let mut body = json!({
        "prompt": inst_transcript(system, turns),
        "max_gen_len": sampling.max_tokens.unwrap_or(2048),
    });
    insert_opt(&mut body, "temperature", sampling.temperature.map(Value::from));
    body
}

fn bedrock_mistral_body(
    system: Option<&str>,
    turns: &[&ChatTurn],
    config: &GenerationConfig,
    sampling: &Sampling,
) -> Value {
    let mut body = json!({
        "prompt": inst_transcript(system, turns),
        "max_tokens": sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    });
    insert_opt(&mut body, "temperature", sampling.temperature.map(Value::from));
    insert_opt(&mut body, "top_p", config.top_p.map(Value::from));
    insert_opt(&mut body, "stop", config.stop.clone().map(Value::from));
    body
}
