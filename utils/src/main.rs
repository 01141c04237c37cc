mod new_model;
mod task;
mod train;

use task::{Task, TaskError};

fn main() -> anyhow::Result<()> {
    let task = match Task::from_args() {
        Ok(task) => task,
        Err(TaskError::Arguments(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };

    task.run()
}
