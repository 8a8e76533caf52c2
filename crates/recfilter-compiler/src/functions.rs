//! The built-in function table: a caller-extensible map from name to
//! implementation rather than a fixed match arm, so a host application can
//! register its own functions alongside `utcnow`/`size`.

use crate::error::EvalError;
use chrono::Utc;
use recfilter_parser::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type Function = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Holds named function implementations. Unknown names are a hard error
/// rather than silently evaluating to absent.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = FunctionRegistry {
            functions: HashMap::new(),
        };
        registry.register("utcnow", Arc::new(|_args| Value::Datetime(Utc::now())));
        registry.register(
            "size",
            Arc::new(|args| {
                let len = match args.first() {
                    Some(Value::Absent) | None => 0,
                    Some(other) => other.clone().into_seq().len(),
                };
                Value::Int(len as i64)
            }),
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, f: Function) {
        self.functions.insert(name.into(), f);
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        match self.functions.get(name) {
            Some(f) => Ok(f(args)),
            None => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
