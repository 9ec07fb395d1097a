//! Evaluator settings.

/// Environment variable enabling the compile pass in [`EvalConfig::from_env`].
pub const COMPILE_ENV_VAR: &str = "SABLE_COMPILE";

/// Evaluator settings.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EvalConfig {
    /// Run [`Evaluator::compile`](crate::Evaluator::compile) on every
    /// expression before `evaluate` steps it.
    pub compile: bool,
}

impl EvalConfig {
    /// Settings from the process environment. `SABLE_COMPILE` set to `1`,
    /// `true` or `yes` enables the compile pass.
    pub fn from_env() -> Self {
        let compile = std::env::var(COMPILE_ENV_VAR)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self { compile }
    }

    #[must_use]
    pub fn with_compile(mut self, compile: bool) -> Self {
        self.compile = compile;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
