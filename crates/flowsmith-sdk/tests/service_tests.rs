//! Service requests, catalog loading and concurrency

mod common;

use common::{service_with_script, valid_candidate, write_catalog};
use flowsmith_llm::{LlmAstGenerator, MockProvider};
use flowsmith_sdk::{
    CancellationToken, CatalogRetriever, EntryType, ErrorKind, GenerateRequest, GenerateStatus,
    PipelineServiceBuilder, ReferenceCatalog, Retriever, SdkError,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_ast_request_skips_generation() {
    let (service, provider) = service_with_script(vec![]);
    let ast: serde_json::Value = serde_json::from_str(&valid_candidate()).unwrap();

    let response = service
        .generate(GenerateRequest::ast(ast), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.status, GenerateStatus::Succeeded);
    assert_eq!(response.retries, 0);
    assert!(response.diagram_text.unwrap().starts_with("flowchart TD"));
    assert_eq!(provider.call_count().await, 0);
}

#[tokio::test]
async fn test_invalid_ast_request_reports_error() {
    let (service, _) = service_with_script(vec![]);
    let response = service
        .generate(
            GenerateRequest::ast(json!({"main_workflow": {"name": "MAIN", "body": [
                {"type": "conditional", "condition": "params.a = 1", "body": []}
            ]}})),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, GenerateStatus::Failed);
    assert_eq!(response.error.unwrap().kind, ErrorKind::ConditionSyntaxError);
}

#[tokio::test]
async fn test_malformed_requests() {
    let (service, _) = service_with_script(vec![]);

    let empty = service
        .generate(GenerateRequest::default(), CancellationToken::new())
        .await;
    assert!(matches!(empty, Err(SdkError::InvalidRequest(_))));

    let blank = service
        .generate(GenerateRequest::query("   "), CancellationToken::new())
        .await;
    assert!(matches!(blank, Err(SdkError::InvalidRequest(_))));

    let both = service
        .generate(
            GenerateRequest {
                query: Some("qc".to_string()),
                ast: Some(json!({})),
            },
            CancellationToken::new(),
        )
        .await;
    assert!(matches!(both, Err(SdkError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_catalog_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    let catalog = ReferenceCatalog::load(dir.path()).unwrap();
    assert!(catalog.component("tool_bwa").is_some());
    assert_eq!(catalog.code("module_read_qc"), Some("workflow { step_fastqc(reads) }"));

    let retriever = CatalogRetriever::new(Arc::new(catalog));
    assert!(retriever.is_ready());

    let entries = retriever.retrieve("read quality control module", 5).await.unwrap();
    assert_eq!(entries[0].entry_type, EntryType::Template);
    assert_eq!(entries[0].id, "module_read_qc");
    assert_eq!(entries[1].id, "tool_fastqc");
    assert!(entries.iter().filter(|e| e.id == "tool_fastqc").count() == 1);
}

#[tokio::test]
async fn test_malformed_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("components.json"), "{ broken").unwrap();

    let result = ReferenceCatalog::load(dir.path());
    assert!(matches!(result, Err(SdkError::CatalogError(_))));
}

#[tokio::test]
async fn test_retrieved_context_reaches_generator() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    let provider = Arc::new(MockProvider::with_script([valid_candidate()]));
    let service = PipelineServiceBuilder::new()
        .with_generator(Arc::new(LlmAstGenerator::with_defaults(provider.clone())))
        .with_catalog_dir(dir.path())
        .build()
        .unwrap();

    assert!(service.health().retriever_ready);

    let response = service
        .generate(GenerateRequest::query("align reads to the genome"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status, GenerateStatus::Succeeded);

    let requests = provider.requests().await;
    let first_turn = &requests[0].messages[1].content;
    assert!(first_turn.contains("align reads to the genome"));
    assert!(first_turn.contains("--- COMPONENT: tool_bwa ---"));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let provider = Arc::new(MockProvider::with_response(valid_candidate()));
    let service = Arc::new(
        PipelineServiceBuilder::new()
            .with_generator(Arc::new(LlmAstGenerator::with_defaults(provider.clone())))
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .generate(GenerateRequest::query(format!("request {}", i)), CancellationToken::new())
                .await
        }));
    }

    let mut programs = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status, GenerateStatus::Succeeded);
        assert_eq!(response.retries, 0);
        programs.push(response.program_text.unwrap());
    }
    assert!(programs.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(provider.call_count().await, 8);
}
