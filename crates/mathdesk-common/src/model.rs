//! Wire types shared by the request handler, the solvers and the tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /solve`.
///
/// `problem` is accepted as an alias for `question` so older front-ends keep
/// working. The field is optional at the decoding layer; presence is checked
/// by [`Query::validated_question`] so a missing field reports the same
/// validation error as an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, alias = "problem")]
    pub question: Option<String>,
}

impl Query {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: Some(question.into()) }
    }

    /// Returns the question when it contains something other than whitespace.
    pub fn validated_question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .filter(|q| !q.trim().is_empty())
    }
}

/// What a solver hands back for a question.
///
/// `result` is opaque to the request handler. `None` means the solver ran to
/// completion without finding an answer; it is serialized as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub result: Option<Value>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

impl Solution {
    pub fn solved(result: impl Into<Value>, steps: Vec<String>, confidence: f64) -> Self {
        Self {
            result: Some(result.into()),
            steps,
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn unsolved(steps: Vec<String>) -> Self {
        Self { result: None, steps, confidence: 0.0 }
    }

    pub fn is_solved(&self) -> bool {
        self.result.is_some()
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// One (question, solution) pair recorded by a successful solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub solution: Solution,
}

impl HistoryEntry {
    pub fn new(question: impl Into<String>, solution: Solution) -> Self {
        Self { question: question.into(), solution }
    }
}
