use clap::Parser;
use std::path::PathBuf;

use crate::settings::Config;

#[derive(Debug, Parser)]
#[command(name = "virtual-mouse")]
#[command(about = "Gesture controlled virtual mouse running on top of the system pointer.")]
pub struct Cli {
    /// Start capturing immediately instead of waiting for activation.
    #[arg(long)]
    pub auto_start: bool,
    /// Override the configured logging level (e.g. DEBUG, INFO).
    #[arg(long)]
    pub log_level: Option<String>,
    /// JSON settings file; a missing file means defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Replay still images from this directory instead of a camera.
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,
    /// Landmark helper program followed by its arguments.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub detector: Vec<String>,
    /// Write the effective settings to this path and exit.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of file and environment settings.
    pub fn apply(&self, config: &mut Config) {
        if self.auto_start {
            config.app.auto_start = true;
        }
        if let Some(level) = &self.log_level {
            config.override_logging_level(level);
        }
        if let Some(dir) = &self.frames_dir {
            config.camera.frames_dir = Some(dir.display().to_string());
        }
        if !self.detector.is_empty() {
            config.app.detector_command = Some(self.detector.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_settings() {
        let cli = Cli::parse_from([
            "virtual-mouse",
            "--auto-start",
            "--log-level",
            "debug",
            "--frames-dir",
            "/tmp/frames",
            "--detector",
            "python3",
            "hands.py",
            "--model-complexity=0",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert!(config.app.auto_start);
        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.camera.frames_dir.as_deref(), Some("/tmp/frames"));
        assert_eq!(
            config.app.detector_command,
            Some(vec![
                "python3".to_string(),
                "hands.py".to_string(),
                "--model-complexity=0".to_string()
            ])
        );
    }

    #[test]
    fn no_flags_leave_settings_alone() {
        let cli = Cli::parse_from(["virtual-mouse"]);
        let mut config = Config::default();
        config.app.detector_command = Some(vec!["helper".into()]);
        cli.apply(&mut config);

        assert!(!config.app.auto_start);
        assert_eq!(config.logging.level, "INFO");
        assert_eq!(config.app.detector_command, Some(vec!["helper".to_string()]));
    }
}
