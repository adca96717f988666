use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{Arguments, ParamKind, ReturnKind, Tool, ToolDescriptor};

/// Trial division up to floor(sqrt(n)).
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    let mut i: i64 = 2;
    // i <= n / i avoids overflowing i * i near i64::MAX
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// Tool wrapper around [`is_prime`]
pub struct IsPrimeTool {
    descriptor: ToolDescriptor,
}

impl IsPrimeTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new("is_prime", "Check if a number is a prime number.")
                .param("n", ParamKind::Integer, "The number to check.")
                .returns(
                    ReturnKind::Boolean,
                    "True if n is a prime number, False otherwise.",
                ),
        }
    }
}

impl Default for IsPrimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for IsPrimeTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let n = args.int("n")?;
        Ok(Value::Bool(is_prime(n)))
    }
}
