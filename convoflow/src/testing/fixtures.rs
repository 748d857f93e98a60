//! Ready-made scripts and pipelines for tests and examples.

use crate::core::{Message, NodeLabel};
use crate::pipeline::Pipeline;
use crate::script::{Node, Script, TransitionCnd};

/// A small greeting dialog: start → node1 → node2, with a fallback that
/// offers a way back in.
///
/// Returns the script together with its start and fallback labels.
#[must_use]
pub fn toy_script() -> (Script, NodeLabel, NodeLabel) {
    let script = Script::new()
        .with_node(
            ("greeting_flow", "start_node"),
            Node::new(Message::default()).with_transition(
                ("greeting_flow", "node1"),
                TransitionCnd::ExactMatch(Message::from("hi")),
            ),
        )
        .with_node(
            ("greeting_flow", "node1"),
            Node::new("Hi, how are you?").with_transition(
                ("greeting_flow", "node2"),
                TransitionCnd::ExactMatch(Message::from("i'm fine")),
            ),
        )
        .with_node(
            ("greeting_flow", "node2"),
            Node::new("Good. What do you want to talk about?").with_transition(
                ("greeting_flow", "node1"),
                TransitionCnd::ExactMatch(Message::from("hi")),
            ),
        )
        .with_node(
            ("greeting_flow", "fallback_node"),
            Node::new("Ooops").with_transition(
                ("greeting_flow", "node1"),
                TransitionCnd::ExactMatch(Message::from("hi")),
            ),
        );

    (
        script,
        NodeLabel::new("greeting_flow", "start_node"),
        NodeLabel::new("greeting_flow", "fallback_node"),
    )
}

/// A pipeline whose actor answers `"ack"` to every request.
///
/// Handy as the pipeline argument in component-level tests that do not
/// care about dialog behavior.
///
/// # Panics
///
/// Panics if the trivial pipeline fails to build, which would be a bug
/// in the framework itself.
#[must_use]
#[allow(clippy::expect_used)]
pub fn minimal_pipeline() -> Pipeline {
    let script = Script::new().with_node(
        ("flow", "start"),
        Node::new("ack").with_transition(("flow", "start"), TransitionCnd::True),
    );
    Pipeline::builder(script, ("flow", "start"))
        .build()
        .expect("trivial pipeline must build")
}

/// Runs each request through the pipeline under one conversation key
/// and asserts the produced responses.
///
/// # Panics
///
/// Panics if a turn fails or a response differs from the expectation.
#[allow(clippy::expect_used)]
pub async fn check_happy_path(pipeline: &Pipeline, happy_path: &[(Message, Message)]) {
    let ctx_id = uuid::Uuid::new_v4().to_string();
    for (step, (request, expected)) in happy_path.iter().enumerate() {
        let ctx = pipeline
            .run_turn(request.clone(), Some(&ctx_id), None)
            .await
            .expect("turn must not fail");
        let actual = ctx.last_response();
        assert_eq!(
            actual.as_ref(),
            Some(expected),
            "unexpected response at step {step}",
        );
    }
}
