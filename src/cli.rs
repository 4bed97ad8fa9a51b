//! CLI definitions using clap derive API

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};

/// osc-installer - build and install Open Stage Control on Apple Silicon
///
/// Takes no arguments. Run it again after any manual step it asks for; it
/// picks up from whatever the previous run left on the machine.
#[derive(Parser, Debug)]
#[command(
    name = "osc-installer",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Build Open Stage Control from source and install it on Apple Silicon Macs",
    long_about = "Checks for the Xcode Command Line Tools, Homebrew and Node.js, installs \
                  whatever is missing, fetches the Open Stage Control source, builds it with \
                  npm and installs the app under /Applications/Open Stage Control.",
    after_help = "\x1b[1m\x1b[32mEnvironment:\x1b[0m\n   \
                  OSC_INSTALLER_CONFIG   \x1b[90m# Optional YAML file overriding the defaults\x1b[0m\n   \
                  RUST_LOG               \x1b[90m# Diagnostic log filter (default: warn)\x1b[0m\n"
)]
pub struct Cli {}
