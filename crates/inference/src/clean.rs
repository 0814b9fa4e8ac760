/// Returned instead of an empty success value.
pub const NO_RESPONSE_SENTINEL: &str = "I could not generate a response.";

const ENGINE_LOG_PREFIX: &str = "llama_";
const STDERR_NOISE_MARKERS: [&str; 3] = ["llama_", "load:", "print_info"];

/// Stdout lines the engine emits about itself rather than as generated text.
pub fn is_engine_log_line(line: &str) -> bool {
    line.starts_with(ENGINE_LOG_PREFIX)
}

/// Whether an stderr chunk is worth logging at all.
pub fn should_surface_stderr(chunk: &str) -> bool {
    !STDERR_NOISE_MARKERS.iter().any(|m| chunk.contains(m))
}

/// Turns raw engine stdout into the final answer text. Never returns an empty string.
pub fn clean_output(raw: &str) -> String {
    let joined = raw
        .lines()
        .filter(|line| !is_engine_log_line(line) && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = joined
        .trim()
        .trim_end_matches(|c: char| c == '>' || c.is_whitespace());

    if cleaned.is_empty() {
        NO_RESPONSE_SENTINEL.to_string()
    } else {
        cleaned.to_string()
    }
}
