//! Modification-prompt assembly (spec.md §9 design notes: "pluggable
//! prompt assembler"). The loop never hardcodes the re-prompt text; it asks
//! an assembler to build one from the original prompt plus the failed
//! criteria, so a caller can swap in a project-specific template without
//! touching [`crate::ReviewLoop`].
//!
//! Built as render-from-fields rather than a template file: a single trait
//! method, since there is no template file format to parse here.

/// Builds the prompt sent back to the executor for another iteration.
pub trait ModificationPromptAssembler: Send + Sync {
    fn build(&self, original_prompt: &str, failed_criteria: &[String]) -> String;
}

/// The loop's built-in assembler when the caller supplies none.
pub struct DefaultModificationPromptAssembler;

impl ModificationPromptAssembler for DefaultModificationPromptAssembler {
    fn build(&self, original_prompt: &str, failed_criteria: &[String]) -> String {
        let mut prompt = String::new();
        prompt.push_str("Your previous attempt at this task was rejected during review.\n\n");
        prompt.push_str("Original task:\n");
        prompt.push_str(original_prompt);
        prompt.push_str("\n\nThe following issues must be fixed:\n");
        for (index, issue) in failed_criteria.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", index + 1, issue));
        }
        prompt.push_str("\nAddress every issue above and complete the original task.\n");
        prompt
    }
}
