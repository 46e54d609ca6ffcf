//! Async convenience API built on top of the sync codec.

use crate::{IssueError, IssueRequest, IssuedCode, ValidationResult, issue, lookup, validate};

/// Issue one code in async contexts.
pub async fn async_issue(req: &IssueRequest) -> Result<IssuedCode, IssueError> {
    issue(req)
}

/// Issue `count` codes for the same request, each with its own random fragment.
pub async fn async_issue_batch(
    req: &IssueRequest,
    count: usize,
) -> Result<Vec<IssuedCode>, IssueError> {
    (0..count).map(|_| issue(req)).collect()
}

/// Validate a display-form code in async contexts.
pub async fn async_validate(input: &str) -> ValidationResult {
    validate(input)
}

/// Resolve free text from any surface in async contexts.
pub async fn async_lookup(input: &str) -> ValidationResult {
    lookup(input)
}
