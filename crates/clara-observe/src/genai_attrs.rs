//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! `tracing` field names in macros must be literals, so spans declare these
//! fields inline (`gen_ai.usage.input_tokens = field::Empty`) and the
//! constants are used with `Span::record` once the response is in.

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Why generation stopped (e.g., "end_turn", "max_tokens").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";
