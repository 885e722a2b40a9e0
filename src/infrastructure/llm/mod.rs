mod anthropic;
mod gemini;

pub use anthropic::AnthropicLlm;
pub use gemini::GeminiLlm;
