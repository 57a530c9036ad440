use ragdb_llm::mock::MockChat;
use ragdb_llm::{ChatModel, LlmError, PromptTemplate};

#[tokio::test]
async fn mock_chat_replays_script_then_default() {
    let chat = MockChat::with_responses(vec![Ok("first".into()), Err(LlmError::Other("boom".into()))]);
    assert_eq!(chat.complete("a").await.unwrap(), "first");
    assert!(chat.complete("b").await.is_err());
    assert_eq!(chat.complete("c").await.unwrap(), "mock response");
    assert_eq!(chat.prompts(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn rendered_prompt_reaches_model_verbatim() {
    let chat = MockChat::default();
    let prompt = PromptTemplate::default().render("[Source: a.R | Type: R]\nx <- 1", "What is x?");
    chat.complete(&prompt).await.unwrap();
    let seen = &chat.prompts()[0];
    assert!(seen.contains("Context:\n[Source: a.R | Type: R]\nx <- 1\n\nQuestion:\nWhat is x?"));
}
