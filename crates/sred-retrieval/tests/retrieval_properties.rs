//! Property tests for retrieval ranking and filtering

use proptest::prelude::*;
use sred_core::{ChunkStatus, ExampleChunk, GenerationRequest, Topic};
use sred_retrieval::{ChunkFilter, ExampleStore, JsonExampleStore, Retriever};
use std::sync::Arc;

fn topic_strategy() -> impl Strategy<Value = Topic> {
    prop_oneof![
        Just(Topic::Uncertainty),
        Just(Topic::SystematicInvestigation),
        Just(Topic::TechnologicalAdvancement),
    ]
}

fn status_strategy() -> impl Strategy<Value = ChunkStatus> {
    prop_oneof![Just(ChunkStatus::Approved), Just(ChunkStatus::Rejected)]
}

fn chunk_strategy() -> impl Strategy<Value = ExampleChunk> {
    (
        "[a-z]{4,12}",
        proptest::collection::vec("[a-z]{2,8}", 3..12),
        topic_strategy(),
        status_strategy(),
        prop_oneof![Just("pharmacy"), Just("mining"), Just("software")],
        prop_oneof![Just("01.01"), Just("02.02")],
    )
        .prop_map(|(id, words, topic, status, industry, tech_code)| ExampleChunk {
            id,
            text: words.join(" "),
            topic,
            status,
            industry: industry.to_string(),
            tech_code: tech_code.to_string(),
            project_title: None,
            embedding: Vec::new(),
        })
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn retrieval_never_surfaces_rejected_chunks(
        chunks in proptest::collection::vec(chunk_strategy(), 0..40),
        top_k in 1usize..8,
    ) {
        let retriever = Retriever::new(
            Arc::new(JsonExampleStore::from_chunks(chunks)),
            top_k,
        );
        let request = GenerationRequest::new(
            "pharmacy",
            "01.01",
            "predict drug shortages with machine learning",
        ).unwrap();

        for topic in Topic::ALL {
            let result = block_on(retriever.retrieve(topic, &request)).unwrap();
            prop_assert!(result.chunks.len() <= top_k);
            for chunk in &result.chunks {
                prop_assert_eq!(chunk.status, ChunkStatus::Approved);
                prop_assert_eq!(chunk.topic, topic);
            }
        }
    }

    #[test]
    fn query_similarity_is_non_increasing(
        chunks in proptest::collection::vec(chunk_strategy(), 1..40),
        query_words in proptest::collection::vec("[a-z]{2,8}", 3..10),
    ) {
        let store = JsonExampleStore::from_chunks(chunks);
        let query = block_on(store.embed(&query_words.join(" "))).unwrap();
        let results = block_on(store.query(&query, 10, &ChunkFilter::new())).unwrap();

        for pair in results.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn retrieval_is_deterministic(
        chunks in proptest::collection::vec(chunk_strategy(), 0..30),
    ) {
        let retriever = Retriever::new(
            Arc::new(JsonExampleStore::from_chunks(chunks)),
            5,
        );
        let request = GenerationRequest::new(
            "software",
            "02.02",
            "distributed cache invalidation research",
        ).unwrap();

        let first = block_on(retriever.retrieve(Topic::Uncertainty, &request)).unwrap();
        let second = block_on(retriever.retrieve(Topic::Uncertainty, &request)).unwrap();

        let first_ids: Vec<_> = first.chunks.iter().map(|c| &c.id).collect();
        let second_ids: Vec<_> = second.chunks.iter().map(|c| &c.id).collect();
        prop_assert_eq!(first_ids, second_ids);
    }
}
