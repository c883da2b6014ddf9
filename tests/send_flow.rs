mod support;

use assert_matches::assert_matches;
use chat_backend::{BackendError, MessageRole};
use chat_backend_mock::{MockCall, MockOperation};
use pretty_assertions::assert_eq;
use roognis_client::{
    ClientConfig, ClientError, Delivery, NoticeKind, SessionPhase, ValidationError,
};

use support::{contents, notices_of, Harness};

#[tokio::test]
async fn new_account_first_send_creates_exactly_one_conversation() {
    let harness = Harness::new();
    harness.add_user("alice");
    harness.sign_in("alice").await;
    assert!(harness.client.conversations().is_empty());

    let response = harness.client.send("hello").await.expect("send");

    assert!(!response.conversation_id.is_nil());
    let conversations = harness.client.conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].id, response.conversation_id);
    assert_eq!(
        harness.client.selected_conversation(),
        Some(response.conversation_id)
    );
}

#[tokio::test]
async fn successful_send_adds_one_user_and_one_assistant_turn() {
    let harness = Harness::new();
    let alice = harness.add_user("alice");
    let conversation = harness.add_exchange(&alice, "Fractions", "1/2 + 1/4?", "3/4");
    harness.sign_in("alice").await;
    harness.backend.queue_reply("It is 5/8.");
    let before = harness.client.transcript().len();

    let response = harness.client.send("And 1/2 + 1/8?").await.expect("send");

    let transcript = harness.client.transcript();
    assert_eq!(transcript.len(), before + 2);
    let added = &transcript.messages()[before..];
    assert_eq!(added[0].role, MessageRole::User);
    assert_eq!(added[0].content, "And 1/2 + 1/8?");
    assert_eq!(added[0].delivery, Delivery::Confirmed);
    assert_eq!(added[1].role, MessageRole::Assistant);
    assert_eq!(added[1].content, "It is 5/8.");
    assert_eq!(added[1].model_used.as_deref(), Some("qwen2.5:0.5b"));
    assert_eq!(added[1].conversation_id, Some(conversation.id));
    assert_eq!(response.conversation_id, conversation.id);
    assert_eq!(
        harness.client.selected_conversation(),
        added[1].conversation_id
    );
    assert!(transcript.messages().iter().all(|message| !message.is_pending()));
}

#[tokio::test]
async fn failed_send_restores_the_transcript_exactly() {
    let harness = Harness::new();
    let alice = harness.add_user("alice");
    harness.add_exchange(&alice, "Fractions", "1/2 + 1/4?", "3/4");
    harness.sign_in("alice").await;
    harness.client.drain_notices();
    let before = harness.client.transcript();
    harness.backend.fail_next(
        MockOperation::Complete,
        BackendError::api(503, "model unavailable"),
    );

    let error = harness.client.send("retry me").await.expect_err("send fails");

    assert_eq!(error.status(), Some(503));
    let after = harness.client.transcript();
    assert_eq!(after.messages(), before.messages());
    assert_eq!(after.conversation_id(), before.conversation_id());
    assert!(!harness.client.is_sending());
    assert_eq!(harness.client.phase(), SessionPhase::Authenticated);
    assert_eq!(harness.error_notices(), vec!["model unavailable"]);
}

#[tokio::test]
async fn pending_turn_is_visible_while_the_send_is_in_flight() {
    let harness = Harness::new();
    harness.add_user("alice");
    harness.sign_in("alice").await;
    let gate = harness.backend.gate(MockOperation::Complete);

    let send = harness.client.send("  hello  ");

    let transcript = harness.client.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript.messages()[0].content, "hello");
    assert!(transcript.messages()[0].is_pending());
    assert!(harness.client.is_sending());
    assert_eq!(harness.client.send("again").await, Err(ClientError::Busy));

    gate.open();
    send.await.expect("send");

    assert!(!harness.client.is_sending());
    assert_eq!(contents(&harness.client), vec!["hello", "You said: hello"]);
}

#[tokio::test]
async fn logout_while_sending_discards_the_reply() {
    let harness = Harness::new();
    harness.add_user("alice");
    harness.sign_in("alice").await;
    let gate = harness.backend.gate(MockOperation::Complete);

    let (result, ()) = tokio::join!(harness.client.send("hello"), async {
        tokio::task::yield_now().await;
        harness.client.logout();
        gate.open();
    });

    assert_matches!(result, Err(ClientError::Superseded));
    assert!(harness.client.transcript().is_empty());
    assert!(harness.client.conversations().is_empty());
    assert_eq!(harness.client.selected_conversation(), None);
    assert!(!harness.client.is_sending());
    assert_eq!(harness.backend.call_count(MockOperation::Complete), 1);
}

#[tokio::test]
async fn send_without_a_token_fails_fast() {
    let harness = Harness::new();

    let error = harness.client.send("hello").await.expect_err("signed out");

    assert_eq!(error, ClientError::AuthenticationMissing);
    assert!(harness.client.transcript().is_empty());
    assert!(harness.backend.calls().is_empty());
    assert_eq!(harness.error_notices(), vec!["Missing authentication token"]);
}

#[tokio::test]
async fn invalid_prompts_never_reach_the_backend() {
    let harness = Harness::with_config(ClientConfig::default().with_prompt_limit(5));
    harness.add_user("alice");
    harness.sign_in("alice").await;
    let calls = harness.backend.calls().len();

    assert_eq!(
        harness.client.send(" \n\t ").await,
        Err(ClientError::Validation(ValidationError::EmptyPrompt))
    );
    assert_eq!(
        harness.client.send("toolong").await,
        Err(ClientError::Validation(ValidationError::PromptTooLong {
            length: 7,
            limit: 5,
        }))
    );

    assert!(harness.client.transcript().is_empty());
    assert_eq!(harness.backend.calls().len(), calls);
}

#[tokio::test]
async fn cached_reply_raises_an_info_notice() {
    let harness = Harness::new();
    harness.add_user("alice");
    harness.sign_in("alice").await;

    let first = harness.client.send("hello").await.expect("first send");
    let second = harness.client.send("hello").await.expect("second send");

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.content, first.content);
    let transcript = harness.client.transcript();
    assert_eq!(transcript.len(), 4);
    assert!(transcript.messages()[3].cached);
    assert_eq!(
        notices_of(&harness.client.drain_notices(), NoticeKind::Info),
        vec!["Served from cache"]
    );
}

#[tokio::test]
async fn settings_are_forwarded_with_every_send() {
    let harness = Harness::new();
    harness.add_user("alice");
    harness.sign_in("alice").await;
    harness.client.set_model("llama3.2");
    harness.client.set_temperature(0.2);
    harness.client.set_max_tokens(256);

    harness.client.send("hi").await.expect("send");

    let request = harness
        .backend
        .calls()
        .into_iter()
        .find_map(|call| match call {
            MockCall::Complete { request, .. } => Some(request),
            _ => None,
        })
        .expect("complete call");
    assert_eq!(request.prompt, "hi");
    assert_eq!(request.conversation_id, None);
    assert_eq!(request.model.as_deref(), Some("llama3.2"));
    assert_eq!(request.temperature, Some(0.2));
    assert_eq!(request.max_tokens, Some(256));
    assert!(!request.stream);
}

#[tokio::test]
async fn list_refresh_failure_after_send_keeps_the_session() {
    let harness = Harness::new();
    harness.add_user("alice");
    harness.sign_in("alice").await;
    harness.client.drain_notices();
    harness.backend.fail_next(
        MockOperation::ListConversations,
        BackendError::api(502, "Request failed: 502"),
    );

    let response = harness.client.send("hello").await.expect("send");

    assert_eq!(harness.client.phase(), SessionPhase::Authenticated);
    assert_eq!(
        harness.client.selected_conversation(),
        Some(response.conversation_id)
    );
    assert_eq!(harness.client.transcript().len(), 2);
    assert_eq!(harness.error_notices(), vec!["Request failed: 502"]);
}

#[tokio::test]
async fn send_is_busy_while_history_is_loading() {
    let harness = Harness::new();
    let alice = harness.add_user("alice");
    harness.add_exchange(&alice, "Fractions", "1/2 + 1/4?", "3/4");
    let gate = harness.backend.gate(MockOperation::ListMessages);

    let (login, busy) = tokio::join!(harness.sign_in("alice"), async {
        tokio::task::yield_now().await;
        assert!(harness.client.is_loading_history());
        let busy = harness.client.send("too early").await;
        gate.open();
        busy
    });

    assert_eq!(login.username, "alice");
    assert_eq!(busy, Err(ClientError::Busy));
    assert_eq!(contents(&harness.client), vec!["1/2 + 1/4?", "3/4"]);
    harness.client.send("now").await.expect("send after load");
}

#[tokio::test]
async fn reply_for_a_conversation_left_mid_send_is_not_shown() {
    let harness = Harness::new();
    let alice = harness.add_user("alice");
    let fractions = harness.add_exchange(&alice, "Fractions", "1/2 + 1/4?", "3/4");
    let biology = harness.add_exchange(&alice, "Biology", "what is a cell?", "the unit of life");
    harness.sign_in("alice").await;
    assert_eq!(harness.client.selected_conversation(), Some(biology.id));
    let gate = harness.backend.gate(MockOperation::Complete);

    let (result, ()) = tokio::join!(harness.client.send("and an organ?"), async {
        tokio::task::yield_now().await;
        harness
            .client
            .select_conversation(Some(fractions.id))
            .await
            .expect("switch conversations");
        gate.open();
    });

    let response = result.expect("send still succeeds on the server");
    assert_eq!(response.conversation_id, biology.id);
    assert_eq!(harness.client.selected_conversation(), Some(fractions.id));
    assert_eq!(contents(&harness.client), vec!["1/2 + 1/4?", "3/4"]);
    assert!(!harness.client.is_sending());
    assert_eq!(harness.backend.stored_messages(biology.id).len(), 4);
}

#[tokio::test]
async fn failed_send_after_switching_conversations_leaves_the_new_one_alone() {
    let harness = Harness::new();
    let alice = harness.add_user("alice");
    let fractions = harness.add_exchange(&alice, "Fractions", "1/2 + 1/4?", "3/4");
    harness.add_exchange(&alice, "Biology", "what is a cell?", "the unit of life");
    harness.sign_in("alice").await;
    harness.client.drain_notices();
    harness.backend.fail_next(
        MockOperation::Complete,
        BackendError::api(503, "model unavailable"),
    );
    let gate = harness.backend.gate(MockOperation::Complete);

    let (result, ()) = tokio::join!(harness.client.send("and an organ?"), async {
        tokio::task::yield_now().await;
        harness
            .client
            .select_conversation(Some(fractions.id))
            .await
            .expect("switch conversations");
        gate.open();
    });

    assert_eq!(
        result.map(|_| ()),
        Err(ClientError::Api {
            status: 503,
            message: "model unavailable".to_string(),
        })
    );
    assert_eq!(harness.client.selected_conversation(), Some(fractions.id));
    assert_eq!(contents(&harness.client), vec!["1/2 + 1/4?", "3/4"]);
    assert!(harness
        .client
        .transcript()
        .messages()
        .iter()
        .all(|message| !message.is_pending()));
    assert!(!harness.client.is_sending());
    assert_eq!(harness.error_notices(), vec!["model unavailable"]);
}
