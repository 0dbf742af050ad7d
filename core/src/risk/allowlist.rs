//! Developer tool allow-list.

use serde::{Deserialize, Serialize};

/// Executables that commonly open ad-hoc listeners during development.
pub const DEFAULT_DEV_TOOLS: &[&str] = &[
    "node", "npm", "yarn", "pnpm", "bun", "deno", "python", "ruby", "php", "java",
    "dotnet", "go", "cargo", "rustc", "swift", "vite", "webpack", "esbuild", "next",
    "nuxt", "remix", "astro", "turbo", "parcel", "code", "docker-proxy", "jupyter",
    "rails", "uvicorn", "gunicorn", "flask",
];

/// Case-insensitive set of allow-listed executable names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevToolAllowList {
    names: Vec<String>,
}

impl Default for DevToolAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_DEV_TOOLS.iter().copied())
    }
}

impl DevToolAllowList {
    pub fn new<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The allow-listed tool an executable path belongs to, if any.
    ///
    /// Matches the file stem with any `.exe` suffix and trailing version
    /// digits removed, so `/usr/bin/python3.11` matches `python`.
    pub fn matches(&self, executable_path: &str) -> Option<&str> {
        let stem = normalized_stem(executable_path)?;
        self.names
            .iter()
            .find(|name| **name == stem)
            .map(String::as_str)
    }
}

fn normalized_stem(path: &str) -> Option<String> {
    let file = path.rsplit(['/', '\\']).next()?.trim().to_lowercase();
    let file = file.strip_suffix(".exe").unwrap_or(&file);
    let stem = file.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_unix_and_windows_paths() {
        let list = DevToolAllowList::default();
        assert_eq!(list.matches("/usr/local/bin/node"), Some("node"));
        assert_eq!(list.matches("/usr/bin/python3.11"), Some("python"));
        assert_eq!(list.matches(r"C:\Program Files\nodejs\node.exe"), Some("node"));
        assert_eq!(list.matches("/usr/sbin/sshd"), None);
    }

    #[test]
    fn test_exact_stem_only() {
        let list = DevToolAllowList::default();
        // "go" must not match "mongod"
        assert_eq!(list.matches("/usr/bin/mongod"), None);
        assert_eq!(list.matches(""), None);
    }

    #[test]
    fn test_custom_list_normalizes() {
        let list = DevToolAllowList::new([" Ollama ", "ollama", ""]);
        assert_eq!(list.names(), &["ollama".to_string()]);
        assert_eq!(list.matches("/opt/ollama/OLLAMA"), Some("ollama"));
    }
}
