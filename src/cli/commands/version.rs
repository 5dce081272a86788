//! Version information display.

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::generator::Variant;

/// Print version information and the supported protocol variants.
pub fn run(args: &VersionArgs) {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match args.format {
        OutputFormat::Human => {
            println!("{name} {version}");
            println!("variants: {}", Variant::ALL.map(Variant::name).join(", "));
        }
        OutputFormat::Json => {
            let info = serde_json::json!({
                "name": name,
                "version": version,
                "variants": Variant::ALL.map(Variant::name),
            });
            println!("{info}");
        }
    }
}
