//! Prompt templates for submission review

use crate::catalog::Challenge;

/// Prompt for reviewing one submission
pub struct ReviewPrompt;

impl ReviewPrompt {
    /// Generate the review prompt for a submission
    pub fn generate(challenge: &Challenge, code: &str, language: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(REVIEW_SYSTEM_PROMPT);
        prompt.push('\n');

        prompt.push_str("## Challenge\n\n");
        prompt.push_str(&format!("**Title:** {}\n", challenge.title));
        prompt.push_str(&format!("**Difficulty:** {}\n", challenge.difficulty));
        prompt.push_str(&format!("**Problem:** {}\n\n", challenge.description));

        prompt.push_str("## Reference Solution\n\n");
        prompt.push_str(
            "The reference below shows the intended behavior. The submission may use any \
             language or approach; judge behavior, not style.\n\n",
        );
        prompt.push_str(&format!("```\n{}\n```\n\n", challenge.reference_solution));

        prompt.push_str("## Submission\n\n");
        prompt.push_str(&format!("**Detected language:** {}\n\n", language));
        prompt.push_str(&format!("```\n{}\n```\n\n", code));

        prompt.push_str(REVIEW_INSTRUCTIONS);

        prompt
    }
}

const REVIEW_SYSTEM_PROMPT: &str = r#"You are a code challenge reviewer for a programming community. Your task is to judge whether a submitted solution solves the stated challenge.

You will be given:
1. The challenge description
2. A reference solution showing the intended behavior
3. The user's submitted code and its detected language
"#;

const REVIEW_INSTRUCTIONS: &str = r#"## Instructions

Review the submission and respond with a JSON object containing exactly these fields:

```json
{
  "is_correct": true,
  "confidence": 0.95,
  "explanation": "One or two sentences on why the submission does or does not solve the challenge"
}
```

Guidelines:
- is_correct is true only if the code would produce correct results for the challenge
- Minor style issues do not make a submission incorrect
- Confidence should be between 0.0 and 1.0
- If the code is incomplete, pseudo-code, or unrelated to the challenge, mark it incorrect

Respond ONLY with the JSON object, no additional text.
"#;
