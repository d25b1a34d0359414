pub mod context;
pub mod generator;
pub mod prompts;

pub use context::{
    format_graph_rag_context, format_query_recipe, format_retrieved_context,
    format_text_rag_context,
};
pub use generator::{GenerationOutput, Generator, Strategy, TextGenerator};
pub use prompts::{baseline_prompt, grounded_prompt, rag_prompt};
