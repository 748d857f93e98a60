//! End-to-end pipeline tests.

use crate::core::Message;
use crate::pipeline::Pipeline;
use crate::script::{Node, Script, TransitionCnd};
use crate::service::{extra_handler_fn, GlobalExtraHandlerKind, Service, ServiceGroup};
use crate::storage::{ContextStorage, MemoryContextStorage};
use crate::testing::fixtures::{check_happy_path, toy_script};
use crate::testing::mocks::shared_log;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn ack_pipeline() -> Pipeline {
    let script = Script::new().with_node(
        ("flow", "start"),
        Node::new("ack").with_transition(("flow", "start"), TransitionCnd::True),
    );
    Pipeline::builder(script, ("flow", "start"))
        .build()
        .expect("ack pipeline must build")
}

#[tokio::test]
async fn test_two_turns_accumulate_history() {
    let pipeline = ack_pipeline();

    let first = pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();
    assert_eq!(first.history().requests().len(), 1);
    assert!(first.history().requests().contains_key(&0));
    assert_eq!(first.last_response(), Some(Message::from("ack")));

    let second = pipeline
        .run_turn(Message::from("hi again"), Some("u1"), None)
        .await
        .unwrap();
    assert_eq!(second.history().requests().len(), 2);
    assert!(second.history().requests().contains_key(&1));
    assert_eq!(second.last_response(), Some(Message::from("ack")));
}

#[tokio::test]
async fn test_transient_state_is_cleared_after_turn() {
    let pipeline = ack_pipeline();
    let ctx = pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    assert!(ctx.framework().execution_states_empty());
    assert!(ctx.framework().turn_config().is_none());
}

#[tokio::test]
async fn test_context_is_persisted_under_its_key() {
    let storage = Arc::new(MemoryContextStorage::new());
    let (script, start, fallback) = toy_script();
    let pipeline = Pipeline::builder(script, start)
        .fallback_label(fallback)
        .storage(storage.clone())
        .build()
        .unwrap();

    pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    let stored = storage.get("u1").await.unwrap().expect("persisted context");
    assert_eq!(stored.history().requests().len(), 1);
    assert_eq!(stored.last_response(), Some(Message::from("Hi, how are you?")));
}

#[tokio::test]
async fn test_missing_ctx_id_creates_fresh_context() {
    let storage = Arc::new(MemoryContextStorage::new());
    let (script, start, _) = toy_script();
    let pipeline = Pipeline::builder(script, start)
        .storage(storage.clone())
        .build()
        .unwrap();

    let ctx = pipeline.run_turn(Message::from("hi"), None, None).await.unwrap();

    assert!(!ctx.id().is_empty());
    assert!(storage.get(ctx.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_misc_overrides_are_merged() {
    let pipeline = ack_pipeline();
    let overrides = std::collections::HashMap::from([(
        "locale".to_string(),
        serde_json::json!("en"),
    )]);

    let ctx = pipeline
        .run_turn(Message::from("hi"), Some("u1"), Some(overrides))
        .await
        .unwrap();

    assert_eq!(ctx.misc_get("locale"), Some(serde_json::json!("en")));
}

#[tokio::test]
async fn test_happy_path_through_toy_script() {
    let (script, start, fallback) = toy_script();
    let pipeline = Pipeline::builder(script, start)
        .fallback_label(fallback)
        .build()
        .unwrap();

    check_happy_path(
        &pipeline,
        &[
            (Message::from("hi"), Message::from("Hi, how are you?")),
            (
                Message::from("i'm fine"),
                Message::from("Good. What do you want to talk about?"),
            ),
            (Message::from("unexpected"), Message::from("Ooops")),
            (Message::from("hi"), Message::from("Hi, how are you?")),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_global_handler_respects_whitelist_and_blacklist() {
    let (script, start, _) = toy_script();
    let mut pipeline = Pipeline::builder(script, start)
        .pre_service(Service::from_fn(|_| Ok(())).with_name("metrics"))
        .pre_service(Service::from_fn(|_| Ok(())).with_name("enrich"))
        .build()
        .unwrap();

    let log = shared_log();
    let sink = log.clone();
    pipeline.add_global_handler(
        GlobalExtraHandlerKind::Before,
        extra_handler_fn(move |_, runtime| {
            sink.lock().push(runtime.component.name.clone());
            Ok(())
        }),
        Some(vec!["metrics".to_string(), "enrich".to_string()]),
        Some(vec!["enrich".to_string()]),
    );

    pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    assert_eq!(*log.lock(), vec!["metrics"]);
}

#[tokio::test]
async fn test_before_all_attaches_to_root_only() {
    let (script, start, _) = toy_script();
    let mut pipeline = Pipeline::builder(script, start)
        .pre_service(Service::from_fn(|_| Ok(())).with_name("prep"))
        .build()
        .unwrap();

    let log = shared_log();
    let sink = log.clone();
    pipeline.add_global_handler(
        GlobalExtraHandlerKind::BeforeAll,
        extra_handler_fn(move |_, runtime| {
            sink.lock().push(runtime.component.name.clone());
            Ok(())
        }),
        None,
        None,
    );

    pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    assert_eq!(*log.lock(), vec!["pipeline"]);
}

#[tokio::test]
async fn test_after_all_observes_states_before_clear() {
    let (script, start, _) = toy_script();
    let mut pipeline = Pipeline::builder(script, start).build().unwrap();

    let log = shared_log();
    let sink = log.clone();
    pipeline.add_global_handler(
        GlobalExtraHandlerKind::AfterAll,
        extra_handler_fn(move |_, runtime| {
            let actor_state = runtime
                .component
                .execution_state
                .get(".pipeline.actor")
                .copied()
                .unwrap_or_default();
            sink.lock().push(actor_state.to_string());
            Ok(())
        }),
        None,
        None,
    );

    pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    assert_eq!(*log.lock(), vec!["finished"]);
}

#[tokio::test]
async fn test_failed_actor_leaves_no_response() {
    // The fallback label is validated at build time, so break the actor
    // by pointing a transition at a node that only exists as a
    // transition target.
    let script = Script::new().with_node(
        ("flow", "start"),
        Node::new("ack").with_transition(("flow", "gone"), TransitionCnd::True),
    );
    let pipeline = Pipeline::builder(script, ("flow", "start")).build().unwrap();

    let ctx = pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    // The turn itself succeeds; the missing response signals the failure.
    assert_eq!(ctx.last_response(), None);
}

#[tokio::test]
async fn test_nested_groups_execute_around_actor() {
    let (script, start, fallback) = toy_script();
    let log = shared_log();

    let tagged = |tag: &str| {
        let sink = log.clone();
        let tag = tag.to_string();
        Service::from_fn(move |_| {
            sink.lock().push(tag.clone());
            Ok(())
        })
    };

    let pipeline = Pipeline::builder(script, start)
        .fallback_label(fallback)
        .pre_service(
            ServiceGroup::new(vec![tagged("pre_1").into(), tagged("pre_2").into()])
                .with_name("preprocessing"),
        )
        .post_service(tagged("post").with_name("postprocessing"))
        .build()
        .unwrap();

    let ctx = pipeline
        .run_turn(Message::from("hi"), Some("u1"), None)
        .await
        .unwrap();

    assert_eq!(*log.lock(), vec!["pre_1", "pre_2", "post"]);
    assert_eq!(ctx.last_response(), Some(Message::from("Hi, how are you?")));
}
