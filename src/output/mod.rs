mod progress;
mod styling;

pub use progress::Progress;
use styling::{dim, magenta_bold};

/// Prints the woodlens banner to stderr.
///
/// Goes to stderr so stdout carries nothing but the report.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔍 woodlens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Woodpecker CI failure diagnosis")
    );
}
