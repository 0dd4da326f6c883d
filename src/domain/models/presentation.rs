use serde::Serialize;

pub const APP_TITLE: &str = "✨ Gemini Chatbot";
pub const APP_DESCRIPTION: &str = "Talk with a conversational AI powered by Google's \
**Gemini-1.5-Flash** model. This chatbot maintains conversation history for more natural \
interactions.";

/// Static data the chat widget renders around the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPresentation {
    pub title: String,
    pub description: String,
    pub examples: Vec<String>,
    pub placeholder: String,
    pub chatbot_label: String,
    pub chatbot_height: u32,
}

impl Default for ChatPresentation {
    fn default() -> Self {
        Self {
            title: APP_TITLE.to_string(),
            description: APP_DESCRIPTION.to_string(),
            examples: vec![
                "What are some fun things to do in St. Louis, Missouri?".to_string(),
                "Write a short, funny poem about a robot who loves to cook.".to_string(),
                "Explain the concept of zero-shot learning in simple terms.".to_string(),
            ],
            placeholder: "Type your message here...".to_string(),
            chatbot_label: "💬 Gemini Chatbot".to_string(),
            chatbot_height: 500,
        }
    }
}
