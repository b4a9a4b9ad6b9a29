use crate::CoreError;
use pagewright_schema::{
    resolve, validate, CliInputs, ConfigFile, Environment, ResolvedConfig, Variant,
};
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Resolving,
    Validating,
    Extracting,
    Building,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Building => "building",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

pub fn validate_transition(from: PipelineState, to: PipelineState) -> Result<(), CoreError> {
    use PipelineState::{Building, Done, Extracting, Failed, Idle, Resolving, Validating};

    let valid = matches!(
        (from, to),
        (Idle, Resolving)
            | (Resolving, Validating)
            | (Validating, Extracting)
            | (Extracting, Building)
            | (Building, Done)
            | (Resolving | Validating | Extracting | Building, Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// State of a single invocation, with every state it has passed through.
#[derive(Debug, Clone)]
pub struct Invocation {
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for Invocation {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn advance(&mut self, to: PipelineState) -> Result<(), CoreError> {
        validate_transition(self.state, to)?;
        debug!("state: {} -> {to}", self.state);
        self.state = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed` and hand the error back for propagation.
    pub fn fail(&mut self, err: CoreError) -> CoreError {
        if let Err(bad) = self.advance(PipelineState::Failed) {
            debug!("not recording failure: {bad}");
        }
        err
    }

    /// Idle -> Resolving -> Validating. On success the invocation is left in
    /// `Validating` with a configuration every stage may rely on.
    pub fn resolve(
        &mut self,
        variant: Variant,
        cli: &CliInputs,
        env: &Environment,
        file: Option<&ConfigFile>,
    ) -> Result<ResolvedConfig, CoreError> {
        self.advance(PipelineState::Resolving)?;
        let config = match resolve(variant, cli, env, file) {
            Ok(c) => c,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.advance(PipelineState::Validating)?;
        if let Err(e) = validate(&config, variant.fields()) {
            return Err(self.fail(e.into()));
        }
        Ok(config)
    }
}
