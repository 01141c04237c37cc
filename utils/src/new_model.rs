use std::path::PathBuf;

use anyhow::Context;
use schafkopf_nn::{create_model_with_seed, export_model_as_pb, logger, ExportSettings};
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct NewModelOptions {
    /// Where to write the frozen graph. A missing `.pb` extension is added.
    #[structopt(parse(from_os_str), default_value = "./model.pb")]
    output: PathBuf,
    /// Seed for weight initialisation, random if omitted.
    #[structopt(long)]
    seed: Option<u64>,
    /// Use the colour-blind friendly colour scheme.
    #[structopt(long)]
    cbcs: bool,
}

impl NewModelOptions {
    pub fn settings(&self) -> anyhow::Result<ExportSettings> {
        ExportSettings::from_output_path(&self.output).with_context(|| "Provide a correct path!")
    }

    pub fn run(&self) -> anyhow::Result<PathBuf> {
        logger::set_cbcs(self.cbcs);
        logger::clear_colours();

        let settings = self.settings()?;
        settings.display();

        let model = create_model_with_seed(self.seed);
        logger::report_model(&model);

        export_model_as_pb(&model, &settings.output_directory, &settings.file_name)
            .with_context(|| format!("Failed to export model to {}.", settings.target_path().display()))
    }
}
