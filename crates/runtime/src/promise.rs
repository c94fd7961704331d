//! Single-settlement completion handle for asynchronous native methods.

use std::fmt;

type Settle<T> = Box<dyn FnOnce(Result<T, String>) + Send>;

/// Completion handle passed to asynchronous native methods.
///
/// `resolve` and `reject` consume the handle, so a promise settles at most
/// once. A promise dropped without being settled rejects itself.
pub struct Promise<T> {
    settle: Option<Settle<T>>,
}

impl<T: 'static> Promise<T> {
    /// Wrap the callback that receives the outcome.
    pub fn new(settle: impl FnOnce(Result<T, String>) + Send + 'static) -> Self {
        Self {
            settle: Some(Box::new(settle)),
        }
    }

    /// Settle successfully.
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Settle with a rejection reason.
    pub fn reject(self, reason: impl Into<String>) {
        self.settle(Err(reason.into()));
    }

    /// Settle with either outcome.
    pub fn settle(mut self, result: Result<T, String>) {
        if let Some(settle) = self.settle.take() {
            settle(result);
        }
    }

    /// Adapt the handle to accept a different success type, converting it with `f`.
    pub fn map<U: 'static>(mut self, f: impl FnOnce(U) -> T + Send + 'static) -> Promise<U> {
        match self.settle.take() {
            Some(settle) => Promise::new(move |result: Result<U, String>| settle(result.map(f))),
            None => Promise { settle: None },
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(settle) = self.settle.take() {
            tracing::warn!("Promise dropped without being settled");
            settle(Err("Promise dropped without being settled".to_string()));
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("settled", &self.settle.is_none())
            .finish()
    }
}
