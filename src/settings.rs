use chat_backend::InferenceRequest;

pub const DEFAULT_MODEL: &str = "qwen2.5:0.5b";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const TEMPERATURE_MIN: f64 = 0.0;
pub const TEMPERATURE_MAX: f64 = 1.0;
pub const MAX_TOKENS_MIN: u32 = 64;
pub const MAX_TOKENS_MAX: u32 = 4096;

/// Per-send model parameters. Values are kept within their bounds by the
/// setters, so any instance is valid to send.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceSettings {
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl InferenceSettings {
    #[must_use]
    pub fn new(model: &str, temperature: f64, max_tokens: u32) -> Self {
        let mut settings = Self::default();
        settings.set_model(model);
        settings.set_temperature(temperature);
        settings.set_max_tokens(max_tokens);
        settings
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// A blank model name falls back to the default model.
    pub fn set_model(&mut self, model: &str) {
        let model = model.trim();
        self.model = if model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            model.to_string()
        };
    }

    /// Clamps into `[0.0, 1.0]`. NaN resets to the default.
    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX)
        };
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        self.max_tokens = max_tokens.clamp(MAX_TOKENS_MIN, MAX_TOKENS_MAX);
    }

    pub(crate) fn apply(&self, request: InferenceRequest) -> InferenceRequest {
        request
            .with_model(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}
