#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use sluice::data::Artifact;
use sluice::processor::{Processor, ProcessorError};

/// Artifact that always exists.
#[derive(Debug, Clone)]
pub struct PresentArtifact;

impl Artifact for PresentArtifact {
    fn exists(&self) -> bool {
        true
    }
}

/// Artifact that never exists.
#[derive(Debug, Clone)]
pub struct AbsentArtifact;

impl Artifact for AbsentArtifact {
    fn exists(&self) -> bool {
        false
    }
}

/// Processor that counts how many times it ran.
#[derive(Debug, Clone)]
pub struct CountingProcessor {
    name: String,
    runs: Arc<AtomicUsize>,
}

impl CountingProcessor {
    pub fn new(name: impl Into<String>, runs: Arc<AtomicUsize>) -> Self {
        Self {
            name: name.into(),
            runs,
        }
    }
}

#[async_trait]
impl Processor for CountingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), ProcessorError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Processor that always fails with an injected spawn error.
#[derive(Debug, Clone)]
pub struct FailingProcessor {
    name: String,
}

impl FailingProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Processor for FailingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), ProcessorError> {
        Err(ProcessorError::Spawn {
            command: "injected".to_string(),
            source: std::io::Error::other("injected failure"),
        })
    }
}
