use crate::extract::{ExtractRequest, Extractor};
use crate::RuntimeError;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Mutex;

/// In-process extractor for tests and dry runs.
///
/// Writes a small deterministic Turtle document listing the Markdown files
/// under the input directory, and records every request it receives.
pub struct MockExtractor {
    calls: Mutex<Vec<ExtractRequest>>,
    failure: Option<String>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
        }
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.to_owned()),
        }
    }

    pub fn calls(&self) -> Vec<ExtractRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Extractor for MockExtractor {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn extract(&self, request: &ExtractRequest) -> Result<(), RuntimeError> {
        self.calls
            .lock()
            .map_err(|e| RuntimeError::ExtractFailed {
                extractor: "mock".to_owned(),
                message: format!("mutex poisoned: {e}"),
            })?
            .push(request.clone());

        if let Some(message) = &self.failure {
            return Err(RuntimeError::ExtractFailed {
                extractor: "mock".to_owned(),
                message: message.clone(),
            });
        }

        let mut documents = Vec::new();
        if request.input.is_dir() {
            collect_markdown(&request.input, &request.input, &mut documents)?;
        }
        documents.sort();

        let mut ttl = String::from("@prefix pw: <urn:pagewright:> .\n");
        for doc in &documents {
            let _ = writeln!(ttl, "<urn:pagewright:doc:{doc}> a pw:Document .");
        }
        std::fs::write(&request.output, ttl)?;
        Ok(())
    }
}

fn collect_markdown(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_markdown(root, &path, out)?;
        } else if path.extension().is_some_and(|e| e == "md") {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}
