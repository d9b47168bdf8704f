//! Lifecycle hooks
//!
//! Hook keys are free-form strings following the `before.<command>.<phase>` /
//! `after.<command>.<phase>` convention, plus the `error` key fired on fatal
//! pipeline failures. Handlers for a key run sequentially in subscription
//! order; a failing handler aborts the remaining handlers and propagates.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

pub type HookFn = Arc<dyn Fn(&Value) -> Result<()>>;

#[derive(Default, Clone)]
pub struct LifecycleHooks {
    hooks: HashMap<String, Vec<HookFn>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, key: impl Into<String>, handler: HookFn) {
        self.hooks.entry(key.into()).or_default().push(handler);
    }

    pub fn apply(&self, key: &str, payload: &Value) -> Result<()> {
        let handlers = match self.hooks.get(key) {
            Some(handlers) => handlers,
            None => return Ok(()),
        };
        debug!("applying hook '{}' to {} handler(s)", key, handlers.len());
        for handler in handlers {
            handler(payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_handlers_fire_in_subscription_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = LifecycleHooks::new();
        for id in 1..=3 {
            let order = order.clone();
            hooks.on(
                "before.start.load",
                Arc::new(move |_| {
                    order.lock().unwrap().push(id);
                    Ok(())
                }),
            );
        }

        hooks.apply("before.start.load", &json!({})).unwrap();
        hooks.apply("unknown.key", &json!({})).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_failing_handler_propagates() {
        let mut hooks = LifecycleHooks::new();
        hooks.on(
            "error",
            Arc::new(|_| Err(crate::error::Error::Other("hook failed".into()))),
        );
        assert!(hooks.apply("error", &json!({})).is_err());
    }
}
