// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "banter",
    about = "Chat with Gemini from the terminal, with streamed markdown rendering",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use, e.g. "gemini-2.5-pro"
    #[arg(long, short = 'M', env = "BANTER_MODEL")]
    pub model: Option<String>,

    /// Provider override: "gemini" or "mock" (offline echo, no API key)
    #[arg(long)]
    pub provider: Option<String>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Use plain ASCII characters for UI glyphs
    #[arg(long)]
    pub ascii: bool,

    /// Increase log verbosity (-v debug, -vv trace); logs go to stderr
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the merged configuration and exit
    ShowConfig,
}
