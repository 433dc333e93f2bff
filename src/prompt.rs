use std::fmt::Write;

use crate::config::AnalysisProfile;
use crate::models::AnalyzeRequest;

/// Builds the instruction text sent as the first model part.
pub fn build_prompt(profile: &AnalysisProfile, req: &AnalyzeRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str(profile.preamble);
    prompt.push_str("\n\nReturn ONLY a valid JSON object.\n");
    prompt.push_str("Do not include markdown, comments, or explanations.\n\n");
    prompt.push_str(&schema_block(profile));

    let fields = [
        ("messages_text", req.messages_text.as_str()),
        ("user_context", req.user_context.as_str()),
        ("link_url", req.link_url.as_str()),
        ("extra_notes", req.extra_notes.as_str()),
    ];
    for (name, value) in fields {
        let _ = write!(prompt, "\n\n{name}:\n{value}");
    }

    prompt.trim().to_string()
}

/// Appends an `IMAGE_NOTE` line to the prompt after a blank line.
pub fn annotate(prompt: &mut String, note: &str) {
    let _ = write!(prompt, "\n\nIMAGE_NOTE: {note}");
}

fn schema_block(profile: &AnalysisProfile) -> String {
    let mut lines = vec![
        "  \"summary\": string".to_string(),
        "  \"risk_level\": \"low\" | \"medium\" | \"high\"".to_string(),
        "  \"confidence\": number".to_string(),
    ];
    lines.extend(
        profile
            .list_fields
            .iter()
            .map(|field| format!("  \"{field}\": string[]")),
    );
    format!("Schema:\n{{\n{}\n}}", lines.join(",\n"))
}
