//! Session glue: drives engine updates through the renderer.
//!
//! One frame per engine update. A frame carries either the freshly built
//! render tree or the parse error for this prefix; reveal timing and
//! rendering stay decoupled, so a failed parse never stops the stream and
//! the next, longer prefix gets an independent chance. The last successful
//! tree stays available for hosts that keep showing it across a failure.

use tokio::sync::mpsc;
use tracing::debug;
use unveil_core::parser::DocumentParser;
use unveil_core::registry::ComponentRegistry;
use unveil_core::render::{DocumentRenderer, RenderTree};

use crate::config::EngineOptions;
use crate::engine::RevealEngine;
use crate::events::{RevealState, RevealUpdate};

/// What a frame displays.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameView {
    /// The render tree for this frame's prefix.
    Content(RenderTree),
    /// This frame's prefix failed to parse.
    Error { message: String },
}

/// One rendered step of the reveal.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFrame {
    pub state: RevealState,
    /// Percentage of the document this frame's prefix covers.
    pub progress: f64,
    pub view: FrameView,
}

/// Couples a reveal engine with a renderer and a component registry.
pub struct RevealSession {
    engine: RevealEngine,
    updates: mpsc::UnboundedReceiver<RevealUpdate>,
    renderer: DocumentRenderer,
    registry: ComponentRegistry,
    last_tree: Option<RenderTree>,
}

impl RevealSession {
    pub fn new(
        source: impl Into<String>,
        options: EngineOptions,
        parser: impl DocumentParser + 'static,
        registry: ComponentRegistry,
    ) -> Self {
        let engine = RevealEngine::new(source, options);
        let updates = engine.subscribe();
        Self {
            engine,
            updates,
            renderer: DocumentRenderer::new(parser),
            registry,
            last_tree: None,
        }
    }

    /// The engine, for driving `start`/`pause`/`resume`/`reset`/`complete`.
    pub fn engine(&self) -> &RevealEngine {
        &self.engine
    }

    /// The most recent successfully rendered tree, surviving parse errors.
    pub fn last_tree(&self) -> Option<&RenderTree> {
        self.last_tree.as_ref()
    }

    /// Waits for the next engine update and renders its prefix.
    ///
    /// Returns `None` once the update stream is closed. Frames arrive in
    /// strictly non-decreasing prefix order within a run.
    pub async fn next_frame(&mut self) -> Option<SessionFrame> {
        let update = self.updates.recv().await?;
        let progress = self.progress_of(&update);
        let view = match self.renderer.render(&update.prefix, &self.registry) {
            Ok(tree) => {
                self.last_tree = Some(tree.clone());
                FrameView::Content(tree)
            }
            Err(err) => {
                debug!(error = %err, "prefix failed to parse");
                FrameView::Error {
                    message: err.message,
                }
            }
        };
        Some(SessionFrame {
            state: update.state,
            progress,
            view,
        })
    }

    /// Progress is derived from the update's own prefix, so a frame and its
    /// percentage always agree even if the engine has ticked further since.
    fn progress_of(&self, update: &RevealUpdate) -> f64 {
        let total = self.engine.source_len();
        if total == 0 {
            return 0.0;
        }
        update.prefix.chars().count() as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use unveil_core::markdown::MarkdownParser;
    use unveil_core::render::Instruction;

    use super::*;

    fn markdown_session(source: &str) -> RevealSession {
        RevealSession::new(
            source,
            EngineOptions {
                seed: Some(11),
                ..EngineOptions::default()
            },
            MarkdownParser::new(),
            ComponentRegistry::new(),
        )
    }

    async fn run_to_completion(session: &mut RevealSession) -> Vec<SessionFrame> {
        session.engine().start();
        let mut frames = Vec::new();
        loop {
            let frame = session.next_frame().await.expect("stream open");
            let done = frame.state.is_complete();
            frames.push(frame);
            if done {
                break;
            }
        }
        frames
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_progress_to_final_tree() {
        let mut session = markdown_session("# Hi\n\nHello **world**");
        let frames = run_to_completion(&mut session).await;

        for pair in frames.windows(2) {
            assert!(pair[1].progress >= pair[0].progress);
        }
        let last = frames.last().expect("frames");
        assert_eq!(last.progress, 100.0);

        let FrameView::Content(tree) = &last.view else {
            panic!("final frame should render, got {:?}", last.view);
        };
        assert!(matches!(
            tree.root.children[0].instruction,
            Instruction::Heading { .. }
        ));
        assert_eq!(tree.root.children[1].instruction, Instruction::Paragraph);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_frame_of_markdown_stream_renders() {
        let mut session = markdown_session("Some *emphasis*, `code`, and\n\n- a list\n- item two");
        let frames = run_to_completion(&mut session).await;

        assert!(frames
            .iter()
            .all(|frame| matches!(frame.view, FrameView::Content(_))));
        assert!(session.last_tree().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_accumulate_across_frames() {
        let mut session = markdown_session("# Title\n\nBody text with **bold** words.");
        let frames = run_to_completion(&mut session).await;

        let mut previous: Vec<String> = Vec::new();
        for frame in &frames {
            let FrameView::Content(tree) = &frame.view else {
                continue;
            };
            let keys = tree.keys();
            for key in &previous {
                assert!(keys.contains(key), "key {key} disappeared mid-stream");
            }
            previous = keys;
        }
    }
}
