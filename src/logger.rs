use std::{
    fmt::Display,
    path::Path,
    sync::atomic::{AtomicBool, Ordering::SeqCst},
};

use crate::model::Sequential;

static COLOUR_BLIND: AtomicBool = AtomicBool::new(false);

/// Colour for numbers, and the escape restoring the base colour after a span.
fn scheme_for(colour_blind: bool) -> (u8, &'static str) {
    if colour_blind {
        (35, "\x1b[38;5;225m")
    } else {
        (36, "")
    }
}

fn scheme() -> (u8, &'static str) {
    scheme_for(COLOUR_BLIND.load(SeqCst))
}

pub fn ansi<T: Display, U: Display>(x: T, y: U) -> String {
    format!("\x1b[{y}m{x}\x1b[0m{}", scheme().1)
}

pub fn clear_colours() {
    print!("{}", scheme().1);
}

/// Switches to the colour-blind friendly scheme.
pub fn set_cbcs(val: bool) {
    COLOUR_BLIND.store(val, SeqCst)
}

pub fn num_cs() -> u8 {
    scheme().0
}

/// Colour for file paths in reports.
pub(crate) const PATH_CS: &str = "32;1";

pub fn report_model(model: &Sequential) {
    let num_cs = num_cs();

    print!("Network Architecture   : {}", ansi(model.input_dim(), num_cs));
    for layer in model.layers() {
        print!(" -> {} ({})", ansi(layer.units(), num_cs), layer.activation());
    }
    println!();

    println!("{model}");
}

pub fn report_export_finished(path: &Path, bytes: usize, seconds: f32) {
    let num_cs = num_cs();

    println!(
        "Written frozen graph to [{}] | {} bytes | {}s",
        ansi(path.display(), PATH_CS),
        ansi(bytes, num_cs),
        ansi(format!("{seconds:.3}"), num_cs),
    );
}

pub fn report_training_unimplemented() {
    println!("{}", ansi("Training is not implemented yet, nothing to do.", "33;1"));
}
