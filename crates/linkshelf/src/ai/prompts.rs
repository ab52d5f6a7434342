//! Fixed instruction prompts sent as the system message.

pub const SUMMARY_SYSTEM_PROMPT: &str = "You summarize web pages for a bookmark manager. \
Read the page content supplied by the user and write a single dense paragraph of plain prose \
describing what the page is about and why it is useful. Keep it under 400 words. \
Do not add a preamble, a heading, bullet points or any commentary about the task.";

/// Prompt demanding exactly `count` comma-separated kebab-case tags.
pub fn tags_system_prompt(count: usize) -> String {
    format!(
        "You categorize web pages for a bookmark manager. \
Read the page content supplied by the user and reply with exactly {count} tags that describe it. \
Each tag must be lowercase kebab-case (for example: machine-learning, web-development). \
Reply with the tags separated by commas on a single line, \
with no preamble, numbering or explanation."
    )
}
