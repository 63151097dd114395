use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (defaults to ./scorm-localizer.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a SCORM zip into the library
    Import {
        /// SCORM package (.zip)
        file: PathBuf,
    },

    /// Translate an imported package into another language
    Translate {
        /// Package id as shown by `list`
        package: String,

        /// Target language name or code (e.g. "French" or "fr")
        #[arg(short, long)]
        language: String,

        /// Also replace narration audio
        #[arg(long)]
        audio: bool,
    },

    /// Print the launch page of a package or one of its translations
    Launch {
        /// Package id
        package: String,

        /// Language code; the source package is "en"
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// List imported packages and their translations
    List,

    /// Delete a package with all of its translations
    Delete {
        /// Package id
        package: String,
    },

    /// Translate a single piece of text
    Text {
        /// Text to translate
        text: String,

        /// Target language name or code
        #[arg(short, long)]
        language: String,
    },

    /// Create the workspace and check ffmpeg, translation and transcription
    Check,

    /// Write the default configuration to a file
    Init {
        /// Destination file
        #[arg(short, long, default_value = "scorm-localizer.toml")]
        output: PathBuf,
    },

    /// Manage the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// List cached translations
    List,

    /// Clear all cached translations
    Clear,
}
