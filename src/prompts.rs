//! Prompts for per-page term extraction.
//!
//! Every prompt lives here so the wording can change without touching retry
//! or parsing logic, and so tests can inspect the exact text sent.
//!
//! Callers can override the system role via
//! [`crate::config::IndexerConfig::system_prompt`] and the per-page
//! instructions via [`crate::config::IndexerConfig::instructions`].

/// Default system role for the indexing assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledgeable assistant helping to index a book.";

/// Default per-page instructions.
///
/// `{focus}` is replaced by the subject clause built from
/// [`crate::config::IndexerConfig::focus`] (empty when no focus is set).
/// The response format requested here (term, comma, definition) is the last
/// rung of the parser's delimiter ladder; colon and " - " answers are still
/// accepted because models do not always comply.
pub const DEFAULT_INSTRUCTIONS: &str = "I'll be providing you one page from a book at a time, and I want you to identify the most important term or concept on the page{focus}, in order to create an index of the book. \
Some pages may not have an important term or phrase at all, especially title pages or pages without much content; in these cases just say none. \
Please ensure the terms are concise, relevant and key to the page's content. Each page should have at most a single term identified. \
List the term along with a short (5-15 word) definition for the term, separated by a comma, with no additional text. \
The selected terms should be concrete concepts or succinct phrases of no more than 3-4 words, and only if the term is discussed in depth on that page, not simply mentioned in passing. \
Avoid phrases that are complex or overly descriptive. \
Exclude people's names (including the authors of the book), anything about page numbers or licensing, the course or book title, and any terms that are too generic or broad. \
If a term is a MITRE ATT&CK technique, include only the T-code and the short name of the technique, not 'MITRE ATT&CK'.";

/// Build the user prompt for one page.
///
/// Custom `instructions` replace [`DEFAULT_INSTRUCTIONS`] verbatim (no focus
/// substitution). The page text always comes last.
pub fn page_prompt(page_text: &str, instructions: Option<&str>, focus: Option<&str>) -> String {
    let instructions = match instructions {
        Some(custom) => custom.to_string(),
        None => DEFAULT_INSTRUCTIONS.replace("{focus}", &focus_clause(focus)),
    };
    format!("{instructions} Here is the next page: \n\n{page_text}")
}

fn focus_clause(focus: Option<&str>) -> String {
    match focus.map(str::trim) {
        Some(f) if !f.is_empty() => format!(" as it relates to {f}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_ends_with_page_text() {
        let p = page_prompt("Zero Trust architectures ...", None, None);
        assert!(p.ends_with("\n\nZero Trust architectures ..."));
        assert!(!p.contains("{focus}"));
        assert!(!p.contains("as it relates to"));
    }

    #[test]
    fn focus_is_woven_into_instructions() {
        let p = page_prompt("text", None, Some("Cloud Security"));
        assert!(p.contains("on the page as it relates to Cloud Security, in order"));
    }

    #[test]
    fn blank_focus_is_ignored() {
        let p = page_prompt("text", None, Some("   "));
        assert!(!p.contains("as it relates to"));
    }

    #[test]
    fn custom_instructions_replace_default() {
        let p = page_prompt("body", Some("Name one term."), Some("ignored"));
        assert!(p.starts_with("Name one term."));
        assert!(!p.contains("ignored"));
        assert!(p.ends_with("body"));
    }
}
