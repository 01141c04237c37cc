use std::iter;

use structopt::{clap, StructOpt};
use thiserror::Error;

use crate::{new_model::NewModelOptions, train::TrainOptions};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no task specified! (\"train\", \"new_model\")")]
    NoTask,
    #[error("unknown task '{0}'")]
    UnknownTask(String),
    #[error(transparent)]
    Arguments(#[from] clap::Error),
}

/// First positional argument selects the task, the rest belong to it.
pub enum Task {
    NewModel(NewModelOptions),
    Train(TrainOptions),
}

impl Task {
    pub fn from_args() -> Result<Self, TaskError> {
        Self::from_iter_safe(std::env::args())
    }

    pub fn from_iter_safe<I>(args: I) -> Result<Self, TaskError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().unwrap_or_else(|| String::from("schafkopf-nn"));
        let task = args.next().ok_or(TaskError::NoTask)?;
        let task_args = iter::once(format!("{program} {task}")).chain(args);

        match task.as_str() {
            "new_model" => Ok(Self::NewModel(NewModelOptions::from_iter_safe(task_args)?)),
            "train" => Ok(Self::Train(TrainOptions::from_iter_safe(task_args)?)),
            _ => Err(TaskError::UnknownTask(task)),
        }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match self {
            Self::NewModel(options) => options.run().map(|_| ()),
            Self::Train(options) => options.run(),
        }
    }
}
