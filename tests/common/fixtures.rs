//! Fake external tools and configurations built around them

use std::path::{Path, PathBuf};
use std::time::Duration;
use subnode::Config;
use subnode::config::{NotificationConfig, ProbeConfig, ToolsConfig, WebhookConfig};

/// Enumerator printing two hosts of `ex.com`, domains as argument
pub const AMASS: &str = "#!/bin/sh\necho www.ex.com\necho api.ex.com\n";

/// Enumerator reading its domains on stdin and repeating a host in another case
pub const FINDOMAIN: &str = "#!/bin/sh\ncat > /dev/null\necho WWW.ex.com\n";

/// Enumerator that finds nothing
pub const SUBFINDER: &str = "#!/bin/sh\nexit 0\n";

/// DNS probe reporting only `www.ex.com` as resolving
pub const DNSX_WWW_ONLY: &str =
    "#!/bin/sh\nwhile read h; do if [ \"$h\" = \"www.ex.com\" ]; then echo \"$h\"; fi; done\n";

/// DNS probe reporting nothing as resolving
pub const DNSX_NOTHING: &str = "#!/bin/sh\ncat > /dev/null\n";

/// HTTP probe answering with a URL for `www.ex.com`
pub const HTTPX_WWW_ONLY: &str =
    "#!/bin/sh\nwhile read h; do if [ \"$h\" = \"www.ex.com\" ]; then echo \"https://$h\"; fi; done\n";

/// Write an executable shell script
///
/// Written to a temporary name and renamed so a running copy is never modified.
#[cfg(unix)]
pub fn write_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let staging = dir.join(format!(".{name}.tmp"));
    std::fs::write(&staging, script).unwrap();
    std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755)).unwrap();

    let path = dir.join(name);
    std::fs::rename(&staging, &path).unwrap();
    path
}

/// Configuration using the fake tools in `dir` and one webhook
#[cfg(unix)]
pub fn fake_tool_config(dir: &Path, webhook_url: String) -> Config {
    let mut config = Config::default();

    config.tools = ToolsConfig {
        amass: Some(write_tool(dir, "amass", AMASS)),
        findomain: Some(write_tool(dir, "findomain", FINDOMAIN)),
        subfinder: Some(write_tool(dir, "subfinder", SUBFINDER)),
        dnsx: Some(write_tool(dir, "dnsx", DNSX_WWW_ONLY)),
        httpx: Some(write_tool(dir, "httpx", HTTPX_WWW_ONLY)),
        search_path: false,
    };
    config.probe = ProbeConfig {
        http_threads: 5,
        process_timeout: Duration::from_secs(10),
    };
    config.notifications = NotificationConfig {
        discord: None,
        webhooks: vec![WebhookConfig {
            url: webhook_url,
            auth_header: None,
            timeout: Duration::from_secs(5),
        }],
    };
    config.persistence.database_path = dir.join("subnode.db");

    config
}
