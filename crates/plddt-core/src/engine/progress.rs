use super::error::PassStep;

#[derive(Debug, Clone)]
pub enum Progress {
    PassStart { total_steps: u64 },
    StepStart { step: PassStep },
    StepFinish { step: PassStep, succeeded: bool },
    /// A planned step that did not run because its input was empty or unavailable.
    StepSkipped { step: PassStep },
    PassFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
