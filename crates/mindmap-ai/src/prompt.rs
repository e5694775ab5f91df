//! Fixed instruction template for mind-map generation.

use crate::llm_provider::Message;

pub const SYSTEM_PROMPT: &str = r#"Create a mind map structure for studying. Format the response as JSON with the following structure:
{
  "nodes": [
    { "id": "string", "label": "string" }
  ],
  "edges": [
    { "id": "string", "source": "string", "target": "string" }
  ]
}
Follow these guidelines:
1. Keep node labels concise and clear
2. Create a hierarchical structure
3. Use meaningful relationships
4. Include 5-10 key concepts
5. Ensure all node IDs are unique
6. Ensure all edges connect existing nodes
Respond with the JSON object only."#;

pub fn generate_messages(topic: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Create a mind map for studying {topic}. Include main concepts and their relationships."
        )),
    ]
}

pub fn refine_messages(topic: &str, feedback: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!("Create a mind map for studying {topic}. {feedback}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_provider::MessageRole;

    #[test]
    fn generate_prompt_embeds_topic() {
        let messages = generate_messages("Photosynthesis");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        assert!(messages[1].content.contains("studying Photosynthesis."));
    }

    #[test]
    fn refine_prompt_appends_feedback() {
        let messages = refine_messages("Rust", "Focus on ownership.");
        assert_eq!(
            messages[1].content,
            "Create a mind map for studying Rust. Focus on ownership."
        );
        assert!(messages[0].content.contains("5-10 key concepts"));
    }
}
