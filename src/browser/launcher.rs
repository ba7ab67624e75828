use crate::config::schema::BrowserSettings;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Per-launch Chrome parameters.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub extra_args: Vec<String>,
    /// Throwaway profile directory; every scenario gets its own.
    pub user_data_dir: PathBuf,
    pub cdp_port: u16,
}

impl LaunchOptions {
    pub fn from_settings(settings: &BrowserSettings, cdp_port: u16) -> Self {
        Self {
            headless: settings.headless,
            window_width: settings.window_width,
            window_height: settings.window_height,
            extra_args: settings.extra_args.clone(),
            user_data_dir: temp_profile_dir(),
            cdp_port,
        }
    }
}

/// Allocate a unique temporary user-data-dir for Chrome.
pub fn temp_profile_dir() -> PathBuf {
    std::env::temp_dir().join(format!("uiscout-{}", uuid::Uuid::new_v4()))
}

/// Locate a Chrome binary: explicit path, then `CHROME_PATH`, then common
/// install locations, then PATH.
pub fn find_chrome(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Ok(p) = std::env::var("CHROME_PATH") {
        let pb = PathBuf::from(&p);
        if pb.exists() {
            return Some(pb);
        }
    }

    let candidates: &[&str] = {
        #[cfg(target_os = "linux")]
        {
            &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium-browser",
                "/usr/bin/chromium",
                "/usr/local/bin/google-chrome",
                "/snap/bin/chromium",
            ]
        }
        #[cfg(target_os = "macos")]
        {
            &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ]
        }
        #[cfg(target_os = "windows")]
        {
            &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ]
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            &[]
        }
    };

    for path in candidates {
        let pb = PathBuf::from(path);
        if pb.exists() {
            return Some(pb);
        }
    }

    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
            let pb = dir.join(name);
            if pb.is_file() {
                return Some(pb);
            }
        }
    }

    None
}

/// Build the Chrome launch command.
pub fn build_command(chrome_path: &Path, options: &LaunchOptions) -> Command {
    let mut cmd = Command::new(chrome_path);

    cmd.arg(format!(
        "--user-data-dir={}",
        options.user_data_dir.display()
    ));
    cmd.arg(format!("--remote-debugging-port={}", options.cdp_port));

    if options.headless {
        cmd.arg("--headless=new");
        cmd.arg("--disable-gpu");
    }

    cmd.arg(format!(
        "--window-size={},{}",
        options.window_width, options.window_height
    ));

    // Keep first-run UI and background traffic out of the way
    cmd.arg("--no-first-run");
    cmd.arg("--no-default-browser-check");
    cmd.arg("--disable-background-networking");
    cmd.arg("--disable-sync");
    cmd.arg("--disable-default-apps");
    cmd.arg("--disable-dev-shm-usage");

    for arg in &options.extra_args {
        cmd.arg(arg);
    }

    cmd.arg("about:blank");

    cmd.stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}
