// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation side effects triggered by the client.

use std::sync::{Mutex, MutexGuard};

/// Where the UI currently is, and how to move it.
pub trait Navigator: Send + Sync {
    /// Current location (path plus optional query).
    fn current_path(&self) -> String;

    /// Move to `path`.
    fn navigate(&self, path: &str);
}

/// Navigator that records every move in memory.
pub struct MemoryNavigator {
    inner: Mutex<History>,
}

struct History {
    current: String,
    visited: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(History {
                current: start.into(),
                visited: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every location navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.lock().visited.clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.lock().current.clone()
    }

    fn navigate(&self, path: &str) {
        let mut history = self.lock();
        history.current = path.to_string();
        history.visited.push(path.to_string());
    }
}

/// True if `location` is `login_path`, ignoring any query string.
pub fn is_at(location: &str, login_path: &str) -> bool {
    location.split('?').next() == Some(login_path)
}
