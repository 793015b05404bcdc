/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Thread-safe callback type shared by the live client and its embedders.
//!
//! The live session runs on a multi-threaded `tokio` runtime, so callbacks
//! handed to it must be `Send + Sync`. Cloning is cheap (`Arc`).

use std::fmt;
use std::sync::Arc;

/// Cloneable, thread-safe callback.
pub struct Callback<IN, OUT = ()> {
    cb: Arc<dyn Fn(IN) -> OUT + Send + Sync>,
}

impl<IN, OUT, F: Fn(IN) -> OUT + Send + Sync + 'static> From<F> for Callback<IN, OUT> {
    fn from(func: F) -> Self {
        Callback { cb: Arc::new(func) }
    }
}

impl<IN, OUT> Clone for Callback<IN, OUT> {
    fn clone(&self) -> Self {
        Self {
            cb: self.cb.clone(),
        }
    }
}

impl<IN, OUT> PartialEq for Callback<IN, OUT> {
    fn eq(&self, other: &Callback<IN, OUT>) -> bool {
        Arc::ptr_eq(&self.cb, &other.cb)
    }
}

impl<IN, OUT> fmt::Debug for Callback<IN, OUT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback<_>")
    }
}

impl<IN, OUT> Callback<IN, OUT> {
    /// Calls the callback's function.
    pub fn emit(&self, value: IN) -> OUT {
        (*self.cb)(value)
    }
}

impl<IN> Callback<IN> {
    /// A callback that ignores its input.
    pub fn noop() -> Self {
        Self::from(|_| ())
    }
}

impl<IN> Default for Callback<IN> {
    fn default() -> Self {
        Self::noop()
    }
}

impl<IN: 'static, OUT: 'static> Callback<IN, OUT> {
    /// Wraps this callback so that `func` maps the input first.
    pub fn reform<F, T>(&self, func: F) -> Callback<T, OUT>
    where
        F: Fn(T) -> IN + Send + Sync + 'static,
    {
        let this = self.clone();
        Callback::from(move |input| this.emit(func(input)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emits_to_wrapped_function() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb = Callback::from(move |v: u32| sink.lock().unwrap().push(v));
        cb.emit(1);
        cb.clone().emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn reform_maps_input() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb = Callback::from(move |v: String| sink.lock().unwrap().push(v));
        let numeric = cb.reform(|n: u8| format!("attempt {n}"));
        numeric.emit(3);
        assert_eq!(*seen.lock().unwrap(), vec!["attempt 3".to_string()]);
    }

    #[test]
    fn clones_compare_equal() {
        let cb: Callback<()> = Callback::noop();
        assert_eq!(cb, cb.clone());
        assert_ne!(cb, Callback::noop());
    }
}
