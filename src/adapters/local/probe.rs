use crate::ports::media::MediaProbe;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::warn;

/// Reads container metadata with the `ffprobe` command line tool.
#[derive(Clone, Debug)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self::with_program("ffprobe")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> Option<f64> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                parse_duration(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(
                    "ffprobe failed for {:?}: {}",
                    path,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                warn!("Could not run {}: {}", self.program, e);
                None
            }
        }
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("125.400000\n"), Some(125.4));
        assert_eq!(parse_duration("\n  42\n"), Some(42.0));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[tokio::test]
    async fn test_missing_program_yields_none() {
        let probe = FfprobeProbe::with_program("definitely-not-ffprobe-binary");
        assert_eq!(probe.duration(Path::new("/tmp/none.mp4")).await, None);
    }
}
