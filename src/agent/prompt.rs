// file: src/agent/prompt.rs
// description: system prompt construction for the assistant persona

use std::fmt::Write;

/// Persona line, goal sentence, and any retrieved memories as a numbered list.
pub fn build_system_prompt(agent_name: &str, relevant_memories: &[String]) -> String {
    let mut prompt = format!(
        "You are {}, a helpful, friendly, and knowledgeable assistant.\n\n\
         Your goal is to provide helpful, accurate, and thoughtful responses to user queries.",
        agent_name
    );

    if !relevant_memories.is_empty() {
        prompt.push_str("\n\nRelevant context from past interactions and knowledge:\n");
        for (i, memory) in relevant_memories.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", i + 1, memory);
        }
    }

    prompt
}

pub fn greeting(agent_name: &str) -> String {
    format!(
        "Hello! I'm {}, your personal assistant. How can I help you today?",
        agent_name
    )
}

pub const FAREWELL: &str = "Goodbye! Have a great day!";
