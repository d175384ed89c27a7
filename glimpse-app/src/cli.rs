//! Command line arguments

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use glimpse_core::Config;

/// Glimpse - Multi-window log viewer
#[derive(Parser, Debug)]
#[command(name = "glimpse")]
#[command(version)]
#[command(about = "Glimpse - Multi-window log viewer")]
pub struct Cli {
    /// Files to open
    pub files: Vec<PathBuf>,

    /// Allow multiple instances
    #[arg(short, long)]
    pub multi: bool,

    /// Do not restore the previous session
    #[arg(short = 'n', long)]
    pub new_session: bool,

    /// Write logs to a file in the data directory
    #[arg(short, long)]
    pub log: bool,

    /// Increase log verbosity (-d debug, -dd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Data directory (database, logs)
    #[arg(long, env = "GLIMPSE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    pub fn config(&self) -> Config {
        match &self.data_dir {
            Some(dir) => Config::new(dir.clone()),
            None => Config::default(),
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.debug {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// File arguments made absolute against `cwd`, so a primary started
    /// elsewhere opens the same files
    pub fn absolute_files(&self, cwd: &Path) -> Vec<String> {
        self.files
            .iter()
            .map(|file| {
                if file.is_absolute() {
                    file.clone()
                } else {
                    cwd.join(file)
                }
            })
            .map(|file| file.to_string_lossy().into_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let cli = Cli::parse_from(["glimpse", "-m", "-n", "-dd", "a.log", "/var/log/b.log"]);

        assert!(cli.multi);
        assert!(cli.new_session);
        assert!(!cli.log);
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Cli::parse_from(["glimpse"]).log_level(), "info");
        assert_eq!(Cli::parse_from(["glimpse", "-d"]).log_level(), "debug");
        assert_eq!(
            Cli::parse_from(["glimpse", "--debug", "--debug", "--debug"]).log_level(),
            "trace"
        );
    }

    #[test]
    fn test_files_made_absolute() {
        let cli = Cli::parse_from(["glimpse", "a.log", "/var/log/b.log"]);
        let files = cli.absolute_files(Path::new("/home/user"));

        assert_eq!(files, vec!["/home/user/a.log", "/var/log/b.log"]);
    }

    #[test]
    fn test_data_dir_flag_wins() {
        let cli = Cli::parse_from(["glimpse", "--data-dir", "/tmp/glimpse-cli"]);
        let config = cli.config();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/glimpse-cli"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/glimpse-cli/logs"));
    }
}
