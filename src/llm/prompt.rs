//! Prompt construction
//!
//! One fixed template. The trailing `Answer:` cue must stay exactly as-is:
//! generation relies on stop sequences (`User:` / `Assistant:`) and the model
//! is conditioned to continue directly after the cue.

/// Build the instruction prompt from retrieved context and the user question.
///
/// Pure and deterministic: preamble, context block, blank line, labeled
/// question, then the bare `Answer:` cue with no trailing content.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the question using only the \
         company information below. If the information is not there, say so.\n\n\
         {context}\n\n\
         Question: {query}\n\
         Answer:"
    )
}
