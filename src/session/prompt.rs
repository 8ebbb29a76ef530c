//! System and follow-up prompt templates.
//!
//! The system prompt advertises the aggregated tool list and pins the strict
//! JSON-only tool-call contract. The follow-up instruction is appended
//! ephemerally after each assistant reply to ask whether a tool should run
//! next — it is never persisted into the transcript.

/// Ephemeral instruction for the "should a tool run now" follow-up call.
pub const FOLLOW_UP_INSTRUCTION: &str = "If a tool should now be called based on the previous \
     message, respond ONLY with a JSON object like:\n\
     { \"tool\": \"tool-name\", \"arguments\": { \"arg1\": \"value1\" } }\n\n\
     Otherwise, respond with null.";

/// Prefix for retrieved-context system messages.
pub const CONTEXT_PREFIX: &str =
    "The following context may help you answer the user's question:";

/// Prefix for tool result system messages.
pub const TOOL_RESULT_PREFIX: &str = "Tool execution result:";

/// Render the session system prompt around the aggregated tool block.
pub fn render_system_prompt(tools_block: &str) -> String {
    format!(
        "You are a helpful assistant with access to these tools:\n\
         \n\
         {tools_block}\n\
         \n\
         Choose the appropriate tool based on the user's question. If no tool is needed, \
         reply directly.\n\
         \n\
         IMPORTANT: You MUST respond with ONLY a valid JSON object when calling a tool.\n\
         Never respond in plain text if a tool can be used.\n\
         DO NOT include any explanation, comments, or natural language before or after the \
         JSON.\n\
         Your response must begin with '{{' and end with '}}'. Use the format below:\n\
         {{\n\
         \x20   \"tool\": \"tool-name\",\n\
         \x20   \"arguments\": {{\n\
         \x20       \"argument-name\": \"value\"\n\
         \x20   }}\n\
         }}\n\
         \n\
         When constructing tool arguments:\n\
         - Normalize input values when needed. For example, lowercase usernames or trim \
         extra whitespace.\n\
         - Do not include arguments unless you are confident they are required by the tool.\n\
         \n\
         After receiving a tool's result:\n\
         1. If the result contains an error message, explain to the user what went wrong \
         and how they might fix it.\n\
         2. Transform the raw data into a natural, conversational response.\n\
         3. Keep responses concise but informative.\n\
         4. Focus on the most relevant information.\n\
         5. Use appropriate context from the user's question.\n\
         6. Avoid simply repeating the raw data.\n\
         \n\
         IMPORTANT: Never return tool call JSON to the user. Only use tool call JSON when \
         explicitly prompted by the system to do so. All other responses should be natural, \
         helpful replies to the user.\n\
         \n\
         Please use only the tools that are explicitly defined above."
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_tool_block() {
        let prompt = render_system_prompt("Tool: get_weather\nDescription: weather");
        assert!(prompt.contains("Tool: get_weather"));
    }

    #[test]
    fn test_system_prompt_pins_json_contract() {
        let prompt = render_system_prompt("");
        assert!(prompt.contains("ONLY a valid JSON object"));
        assert!(prompt.contains("\"tool\": \"tool-name\""));
        assert!(prompt.contains("Never return tool call JSON to the user"));
    }

    #[test]
    fn test_follow_up_offers_null() {
        assert!(FOLLOW_UP_INSTRUCTION.contains("respond with null"));
        assert!(FOLLOW_UP_INSTRUCTION.contains("\"tool\""));
        assert!(FOLLOW_UP_INSTRUCTION.contains("\"arguments\""));
    }
}
