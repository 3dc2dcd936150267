use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{info, warn};

/// Program and leading arguments used to open a URL.
fn launcher(override_command: Option<&str>) -> (String, Vec<String>) {
    if let Some(command) = override_command.filter(|value| !value.trim().is_empty()) {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        return (program, parts.collect());
    }
    if cfg!(target_os = "macos") {
        ("open".to_string(), Vec::new())
    } else if cfg!(target_os = "windows") {
        (
            "cmd".to_string(),
            vec!["/C".to_string(), "start".to_string(), String::new()],
        )
    } else {
        ("xdg-open".to_string(), Vec::new())
    }
}

/// Open `url` in the system browser without waiting for it.
pub fn open_external(url: &str, override_command: Option<&str>) -> Result<()> {
    let (program, args) = launcher(override_command);
    Command::new(&program)
        .args(&args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to launch {program}"))?;
    info!(%url, %program, "Opened external link");
    Ok(())
}

/// Like [`open_external`], but failures are only logged.
pub fn open_external_or_log(url: &str, override_command: Option<&str>) -> bool {
    match open_external(url, override_command) {
        Ok(()) => true,
        Err(err) => {
            warn!(?err, %url, "Opening external link failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_command_is_split_into_arguments() {
        let (program, args) = launcher(Some("firefox --new-tab"));
        assert_eq!(program, "firefox");
        assert_eq!(args, vec!["--new-tab".to_string()]);
    }

    #[test]
    fn blank_override_falls_back_to_platform_default() {
        let (program, _) = launcher(Some("   "));
        assert!(!program.is_empty());
        assert_ne!(program, "   ");
    }

    #[tokio::test]
    async fn missing_launcher_is_reported_not_raised() {
        assert!(!open_external_or_log(
            "https://example.com",
            Some("definitely-not-a-real-browser-binary")
        ));
    }
}
