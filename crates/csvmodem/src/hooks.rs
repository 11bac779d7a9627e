//! User callbacks run on each row before it is emitted.

use core::fmt;

use crate::{error::CallbackError, event::Row};

/// Outcome of validating a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The row goes on to the transform and is emitted.
    Valid,
    /// The row is dropped and reported as
    /// [`ParseEvent::Invalid`](crate::ParseEvent::Invalid).
    Invalid { reason: Option<String> },
}

impl Verdict {
    /// Rejects the row with a reason reported in the
    /// [`ValidationFailure`](crate::ValidationFailure).
    pub fn invalid(reason: impl Into<String>) -> Self {
        Verdict::Invalid {
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid {
            Verdict::Valid
        } else {
            Verdict::Invalid { reason: None }
        }
    }
}

pub(crate) type ValidateFn = Box<dyn FnMut(&Row) -> Result<Verdict, CallbackError> + Send>;
pub(crate) type TransformFn = Box<dyn FnMut(Row) -> Result<Row, CallbackError> + Send>;
/// Receives the first row and returns column names; `None` drops a column.
pub(crate) type HeaderFn = Box<dyn FnMut(Vec<String>) -> Vec<Option<String>> + Send>;

#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) validate: Option<ValidateFn>,
    pub(crate) transform: Option<TransformFn>,
    pub(crate) headers: Option<HeaderFn>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("validate", &self.validate.is_some())
            .field("transform", &self.transform.is_some())
            .field("headers", &self.headers.is_some())
            .finish()
    }
}

impl Hooks {
    /// Runs validation then transformation.
    pub(crate) fn apply(&mut self, row: Row) -> Result<Applied, Stage> {
        if let Verdict::Invalid { reason } = self.check(&row).map_err(Stage::Validate)? {
            return Ok(Applied::Rejected { row, reason });
        }
        self.reshape(row).map(Applied::Accepted).map_err(Stage::Transform)
    }

    pub(crate) fn check(&mut self, row: &Row) -> Result<Verdict, CallbackError> {
        match self.validate.as_mut() {
            Some(validate) => validate(row),
            None => Ok(Verdict::Valid),
        }
    }

    pub(crate) fn reshape(&mut self, row: Row) -> Result<Row, CallbackError> {
        match self.transform.as_mut() {
            Some(transform) => transform(row),
            None => Ok(row),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Applied {
    Accepted(Row),
    Rejected { row: Row, reason: Option<String> },
}

/// Which callback failed.
#[derive(Debug)]
pub(crate) enum Stage {
    Validate(CallbackError),
    Transform(CallbackError),
}
