//! `gerrit query` command construction.

/// Base of the query command sent to Gerrit.
pub const QUERY_COMMAND: &str = "gerrit query";

/// A Gerrit query and the optional result sections to include.
///
/// Flags are always emitted in the same order so command strings are
/// reproducible in logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    text: String,
    patch_sets: bool,
    current_patch_set: bool,
    files: bool,
    comments: bool,
    commit_message: bool,
}

impl Query {
    /// Create a query with no optional sections.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Include all patch sets (`--patch-sets`).
    #[must_use]
    pub fn patch_sets(mut self, enabled: bool) -> Self {
        self.patch_sets = enabled;
        self
    }

    /// Include the current patch set (`--current-patch-set`).
    #[must_use]
    pub fn current_patch_set(mut self, enabled: bool) -> Self {
        self.current_patch_set = enabled;
        self
    }

    /// Include the patch set file lists (`--files`).
    #[must_use]
    pub fn files(mut self, enabled: bool) -> Self {
        self.files = enabled;
        self
    }

    /// Include review comments (`--comments`).
    #[must_use]
    pub fn comments(mut self, enabled: bool) -> Self {
        self.comments = enabled;
        self
    }

    /// Include full commit messages (`--commit-message`).
    #[must_use]
    pub fn commit_message(mut self, enabled: bool) -> Self {
        self.commit_message = enabled;
        self
    }

    /// Get the query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Build the command line to execute on the server.
    #[must_use]
    pub fn build_command(&self) -> String {
        let mut command = String::from(QUERY_COMMAND);
        command.push_str(" --format=JSON");

        let flags = [
            (self.patch_sets, " --patch-sets"),
            (self.current_patch_set, " --current-patch-set"),
            (self.files, " --files"),
            (self.comments, " --comments"),
            (self.commit_message, " --commit-message"),
        ];
        for (enabled, flag) in flags {
            if enabled {
                command.push_str(flag);
            }
        }

        command.push_str(" \"");
        command.push_str(&self.text.replace('"', "\\\""));
        command.push('"');
        command
    }
}
