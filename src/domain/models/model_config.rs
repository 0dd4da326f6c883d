use serde::{Deserialize, Serialize};

use super::{HarmBlockThreshold, HarmCategory, SafetySetting};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a friendly and helpful chatbot.";

/// Static configuration passed through verbatim to the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    model: String,
    system_instruction: String,
    safety_settings: Vec<SafetySetting>,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            safety_settings: SafetySetting::uniform(HarmBlockThreshold::BlockNone),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_uniform_threshold(mut self, threshold: HarmBlockThreshold) -> Self {
        self.safety_settings = SafetySetting::uniform(threshold);
        self
    }

    /// Overrides the threshold of a single category, leaving the others alone.
    pub fn with_threshold(mut self, category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        match self
            .safety_settings
            .iter_mut()
            .find(|s| s.category == category)
        {
            Some(setting) => setting.threshold = threshold,
            None => self
                .safety_settings
                .push(SafetySetting::new(category, threshold)),
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn safety_settings(&self) -> &[SafetySetting] {
        &self.safety_settings
    }

    pub fn threshold_for(&self, category: HarmCategory) -> Option<HarmBlockThreshold> {
        self.safety_settings
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.threshold)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
