use tracing::info;

/// The surface the participant is looking at. Phase boundaries are defined
/// exactly by these calls; renderers live outside this crate.
pub trait Display: Send {
    fn show(&mut self, tag: &str, text: &str);
    fn clear(&mut self);
}

/// Plain terminal display for console runs.
pub struct ConsoleDisplay;

impl Display for ConsoleDisplay {
    fn show(&mut self, tag: &str, text: &str) {
        info!(tag, "display");
        println!("\n{text}\n");
    }

    fn clear(&mut self) {
        println!();
    }
}

/// Display that drops everything; useful when a phase runs headless.
pub struct NullDisplay;

impl Display for NullDisplay {
    fn show(&mut self, _tag: &str, _text: &str) {}
    fn clear(&mut self) {}
}
