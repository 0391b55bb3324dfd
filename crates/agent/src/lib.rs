pub mod cep;
pub mod llm;
pub mod pipeline;

pub use cep::{CepError, CepLookup, ViaCepClient};
pub use llm::{CompletionClient, CompletionError, OpenAiGateway, FALLBACK_REPLY};
pub use pipeline::{
    MessagePipeline, PipelineError, PipelineReply, ReplyKind, CONFIG_ERROR_REPLY,
    UPSTREAM_ERROR_REPLY,
};
