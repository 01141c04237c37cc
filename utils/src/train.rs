use schafkopf_nn::logger;
use structopt::{clap::AppSettings, StructOpt};

#[derive(StructOpt)]
#[structopt(setting = AppSettings::TrailingVarArg, setting = AppSettings::AllowLeadingHyphen)]
pub struct TrainOptions {
    /// Accepted for forward compatibility, currently ignored. Flags are taken verbatim.
    #[structopt(name = "ARGS")]
    args: Vec<String>,
}

impl TrainOptions {
    /// Training is a declared extension point: it writes nothing and always succeeds.
    pub fn run(&self) -> anyhow::Result<()> {
        logger::report_training_unimplemented();

        if !self.args.is_empty() {
            println!("Ignoring arguments: {}", self.args.join(" "));
        }

        Ok(())
    }
}
