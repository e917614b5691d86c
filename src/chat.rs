//! # Chat surface
//!
//! Wires the retrieval service and the responder together: a one-shot
//! [`ask`] and the interactive [`interactive_mode`] loop.
//!
//! The loop reads one query per line, retrieves context, invokes the model,
//! and prints the answer behind an `AI:` label. Typing `exit` ends the loop;
//! any retrieval or invocation failure is reported and the loop keeps
//! accepting queries.

use crossterm::style::Stylize;
use std::io::{Write, stdout};
use tracing::error;

use crate::config::LorekeeperConfig;
use crate::embedder::Embedder;
use crate::error::{LoreError, Result};
use crate::responder::ConversationalResponder;
use crate::retrieval::RetrievalQueryService;
use crate::vector_store::VectorStore;

/// Answer a single question against the ingested records.
pub async fn ask(
    config: &LorekeeperConfig,
    embedder: &dyn Embedder,
    store: &VectorStore,
    responder: &mut ConversationalResponder,
    question: &str,
) -> Result<String> {
    let service = RetrievalQueryService::new(embedder, store, &config.collection_name);
    let context = service.retrieve(question, config.retrieval_limit)?;
    responder.invoke(question, &context).await
}

/// Enter the interactive query loop.
///
/// Reads queries until the user types `exit` (or stdin closes). Failures are
/// printed and logged; the loop continues with the next query rather than
/// terminating the process.
pub async fn interactive_mode(
    config: &LorekeeperConfig,
    embedder: &dyn Embedder,
    store: &VectorStore,
    responder: &mut ConversationalResponder,
) -> Result<()> {
    let service = RetrievalQueryService::new(embedder, store, &config.collection_name);

    loop {
        print!("\n{} ", "You:".green().bold());
        stdout()
            .flush()
            .map_err(|e| LoreError::io(e, "flushing stdout"))?;

        let mut input = String::new();
        let bytes_read = std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| LoreError::io(e, "reading from stdin"))?;
        if bytes_read == 0 {
            break;
        }

        let query = input.trim();
        if query.is_empty() {
            continue;
        }
        if query.to_lowercase() == "exit" {
            break;
        }

        let context = match service.retrieve(query, config.retrieval_limit) {
            Ok(context) => context,
            Err(err) => {
                error!("Retrieval failed: {err}");
                eprintln!("Error: {err}");
                continue;
            }
        };

        match responder.invoke(query, &context).await {
            Ok(answer) => {
                println!("{} {answer}", "AI:".blue().bold());
            }
            Err(err) => {
                error!("Response generation failed: {err}");
                eprintln!("Error: {err}");
                continue;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::stub::StubEmbedder;
    use crate::pipeline::IngestionPipeline;
    use crate::records::Record;
    use crate::vector_store::Distance;
    use httpmock::prelude::*;
    use serde_json::json;

    const DIM: usize = 16;

    #[tokio::test]
    async fn test_end_to_end_ingest_retrieve_respond() {
        let embedder = StubEmbedder::new(DIM);
        let mut store = VectorStore::new();
        store.create_collection("knowledge_base", DIM, Distance::Cosine);

        let records = vec![Record {
            id: 1,
            name: "Intro to CS".into(),
            slug: "intro-to-cs".into(),
            about: "basics of computer science".into(),
            tags: None,
            institute: "Acme U".into(),
        }];
        IngestionPipeline::new(&embedder, &mut store, "knowledge_base")
            .ingest(&records)
            .unwrap();

        // The rendered context must surface the payload's passthrough fields.
        let service = RetrievalQueryService::new(&embedder, &store, "knowledge_base");
        let context = service
            .retrieve("What is computer science basics?", 1)
            .unwrap();
        assert!(context.contains("Acme U"));
        assert!(!context.is_empty());

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "id": "chatcmpl-1",
                        "object": "chat.completion",
                        "created": 1700000000,
                        "model": "mock-model",
                        "choices": [{
                            "index": 0,
                            "message": {
                                "role": "assistant",
                                "content": "Acme U's Intro to CS covers the basics."
                            },
                            "finish_reason": "stop",
                            "logprobs": null
                        }]
                    }));
            })
            .await;

        let config = LorekeeperConfig {
            api_key: "test_key".into(),
            api_base: server.url("/v1"),
            model: "mock-model".into(),
            ..LorekeeperConfig::default()
        };
        let mut responder = ConversationalResponder::new(&config);

        let answer = ask(
            &config,
            &embedder,
            &store,
            &mut responder,
            "What is computer science basics?",
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(answer, "Acme U's Intro to CS covers the basics.");
        assert_eq!(responder.history().len(), 2);
    }

    #[tokio::test]
    async fn test_ask_against_empty_collection_still_reaches_the_model() {
        let embedder = StubEmbedder::new(DIM);
        let mut store = VectorStore::new();
        store.create_collection("knowledge_base", DIM, Distance::Cosine);

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "id": "chatcmpl-2",
                        "object": "chat.completion",
                        "created": 1700000000,
                        "model": "mock-model",
                        "choices": [{
                            "index": 0,
                            "message": { "role": "assistant", "content": "I don't know." },
                            "finish_reason": "stop",
                            "logprobs": null
                        }]
                    }));
            })
            .await;

        let config = LorekeeperConfig {
            api_key: "test_key".into(),
            api_base: server.url("/v1"),
            model: "mock-model".into(),
            ..LorekeeperConfig::default()
        };
        let mut responder = ConversationalResponder::new(&config);

        let answer = ask(&config, &embedder, &store, &mut responder, "anything?")
            .await
            .unwrap();

        assert_eq!(answer, "I don't know.");
    }
}
