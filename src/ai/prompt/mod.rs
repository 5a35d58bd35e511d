//! Prompt Templates
//!
//! Fixed instructions for the two generation stages.
//!
//! - Drafting: a short backend-process instruction that embeds the raw user
//!   request; extracted file context follows it as separate parts.
//! - Refining: a system instruction with a mandatory five-section layout,
//!   paired with a user message carrying intent, draft and context.

/// Section headings the refiner must produce, in order
pub const SECTION_HEADINGS: [&str; 5] = [
    "# 1. Core Product Intent",
    "# 2. Key Functional Requirements",
    "# 3. Technical Constraints",
    "# 4. Expected Deliverables",
    "# 5. Refined LLM Prompt",
];

/// System instruction for the refining call
pub const REFINER_SYSTEM: &str = r##"You are a Technical Specification Architect.
Your goal is to refine the user's input into a standardized Technical Prompt.

STRICT OUTPUT FORMAT (Do not deviate):

# 1. Core Product Intent
[One sentence summary of what the user wants to build]

# 2. Key Functional Requirements
[Bulleted list of features and user actions]

# 3. Technical Constraints
[Tech stack, platform limits, or performance needs]

# 4. Expected Deliverables
[What exactly should be produced? Code, text, diagrams?]

# 5. Refined LLM Prompt
[The final, polished prompt to copy-paste]

Start immediately with "# 1. Core Product Intent"."##;

/// Headings absent from a refined prompt, in layout order
pub fn missing_sections(refined: &str) -> Vec<&'static str> {
    SECTION_HEADINGS
        .into_iter()
        .filter(|heading| !refined.contains(heading))
        .collect()
}

/// Leading instruction for the drafting call
pub fn draft_instruction(user_prompt: &str) -> String {
    format!(
        "You are a backend process.\n\
         Analyze the User Request and Context.\n\
         Draft a comprehensive prompt.\n\
         User Request: {}\n",
        user_prompt
    )
}

/// User message for the refining call.
///
/// `context` must already be truncated to the refine-context limit.
pub fn refiner_user_message(user_prompt: &str, draft: &str, context: &str) -> String {
    format!(
        "Refine this.\nUser Intent: {}\nGemini Draft: {}\nContext: {}\n",
        user_prompt, draft, context
    )
}
