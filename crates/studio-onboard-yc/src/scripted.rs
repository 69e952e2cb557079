//! Scripted invoker
//!
//! Replies to `yc` calls from a script instead of spawning processes, and
//! records every call it receives.

use crate::invoker::{CliInvoker, Output};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Reply {
    output: Output,
    delay: Option<Duration>,
}

#[derive(Debug)]
struct Rule {
    pattern: Vec<String>,
    replies: VecDeque<Reply>,
}

impl Rule {
    fn matches(&self, args: &[String]) -> bool {
        contains_window(args, &self.pattern)
    }

    /// Replies are consumed in order; the last one is repeated forever.
    fn next_reply(&mut self) -> Option<Reply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

fn contains_window(args: &[String], pattern: &[String]) -> bool {
    pattern.is_empty() || args.windows(pattern.len()).any(|w| w == pattern)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock CLI invoker
///
/// A call is answered by the first rule whose pattern appears as a
/// contiguous run of its arguments. Calls without a matching rule fail with
/// exit code 127.
#[derive(Debug)]
pub struct ScriptedInvoker {
    installed: bool,
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl Default for ScriptedInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self {
            installed: true,
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An invoker whose program never resolves
    pub fn not_installed() -> Self {
        Self {
            installed: false,
            ..Self::new()
        }
    }

    /// Queue `output` as the next reply to calls matching `pattern`
    pub fn on(&self, pattern: &[&str], output: Output) -> &Self {
        self.push(
            pattern,
            Reply {
                output,
                delay: None,
            },
        )
    }

    /// Like [`ScriptedInvoker::on`], but the reply arrives after `delay`
    pub fn on_delayed(&self, pattern: &[&str], output: Output, delay: Duration) -> &Self {
        self.push(
            pattern,
            Reply {
                output,
                delay: Some(delay),
            },
        )
    }

    fn push(&self, pattern: &[&str], reply: Reply) -> &Self {
        let pattern: Vec<String> = pattern.iter().map(|s| s.to_string()).collect();
        let mut rules = lock(&self.rules);
        match rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(Rule {
                pattern,
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }

    /// Number of calls whose arguments contain `pattern`
    pub fn count(&self, pattern: &[&str]) -> usize {
        let pattern: Vec<String> = pattern.iter().map(|s| s.to_string()).collect();
        lock(&self.calls)
            .iter()
            .filter(|args| contains_window(args, &pattern))
            .count()
    }
}

#[async_trait]
impl CliInvoker for ScriptedInvoker {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.installed.then(|| PathBuf::from(program))
    }

    async fn invoke(&self, _program: &Path, args: &[String]) -> std::io::Result<Output> {
        lock(&self.calls).push(args.to_vec());

        let reply = lock(&self.rules)
            .iter_mut()
            .find(|rule| rule.matches(args))
            .and_then(Rule::next_reply);

        let Some(reply) = reply else {
            return Ok(Output::failed(
                127,
                format!("no scripted reply for: {}", args.join(" ")),
            ));
        };

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(reply.output)
    }
}
