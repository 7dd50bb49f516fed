//! Test utilities for provider tests.
//!
//! This module provides a scripted generator and request helpers.

use async_trait::async_trait;
use odyssey_core::{ChatMessage, GenerateRequest, GenerateResponse};
use odyssey_error::{GenerationError, GenerationErrorKind, OdysseyResult};
use odyssey_interface::TextGeneration;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Succeed with the given content
    Reply(String),
    /// Fail with the given generation error
    Fail(GenerationErrorKind),
}

/// Generator that plays back a fixed script and records when it was called.
///
/// Once the script is exhausted the last entry repeats.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    calls: Mutex<Vec<Instant>>,
}

#[allow(dead_code)]
impl ScriptedGenerator {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(kind: GenerationErrorKind) -> Self {
        Self::new([Scripted::Fail(kind)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGeneration for ScriptedGenerator {
    async fn generate(&self, _req: &GenerateRequest) -> OdysseyResult<GenerateResponse> {
        self.calls.lock().unwrap().push(Instant::now());

        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match script.pop_front() {
                Some(entry) => {
                    *last = Some(entry.clone());
                    Some(entry)
                }
                None => last.clone(),
            }
        };

        match next {
            Some(Scripted::Reply(content)) => Ok(GenerateResponse::text(content)),
            Some(Scripted::Fail(kind)) => Err(GenerationError::new(kind).into()),
            None => Err(GenerationError::new(GenerationErrorKind::EmptyContent).into()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

/// Helper to create a single-message request.
pub fn create_test_request(prompt: &str) -> GenerateRequest {
    GenerateRequest::builder()
        .messages(vec![ChatMessage::user(prompt)])
        .build()
        .expect("Failed to build test request")
}
