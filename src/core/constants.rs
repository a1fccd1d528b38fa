/// Application-wide constants to avoid magic values throughout the codebase.
///
/// File classification constants
pub mod classify {
    /// Files larger than this are sniffed from a prefix before being read fully
    pub const LARGE_FILE_THRESHOLD: u64 = 50_000;
    /// Number of bytes inspected when sniffing content
    pub const SNIFF_LEN: usize = 512;

    /// Extensions that are always treated as binary (compared lowercased, without the dot)
    pub const BINARY_EXTENSIONS: [&str; 30] = [
        "a", "bin", "bz2", "class", "dll", "exe", "gif", "gpg", "gz", "ico", "jar", "jpeg",
        "jpg", "mp3", "mp4", "mpeg", "o", "pdf", "png", "pyc", "pyo", "so", "swp", "tar",
        "tiff", "woff", "woff2", "xz", "z", "zip",
    ];

    /// Version-control metadata directory names
    pub const SCM_DIRECTORIES: [&str; 5] = [".bzr", ".git", ".hg", ".svn", "CVS"];

    /// Files whose base name contains this are scanned even inside SCM directories
    pub const COMMIT_MESSAGE_MARKER: &str = "EDITMSG";
}

/// Pipeline sizing
pub mod pipeline {
    /// Smallest usable worker budget: one producer and one consumer
    pub const MIN_WORKERS: usize = 2;
    /// Paths the walk may queue ahead of the producers
    pub const PATH_QUEUE_CAPACITY: usize = 64;
    /// Unchecked matches the producers may queue ahead of the consumers
    pub const MATCH_QUEUE_CAPACITY: usize = 8;
    /// Completed matches buffered between the consumers and the output writer
    pub const OUTPUT_QUEUE_CAPACITY: usize = 64;
}

/// Input constants
pub mod input {
    /// Source name used for matches read from standard input
    pub const STDIN_SOURCE: &str = "stdin";
}

/// Output constants
pub mod output {
    /// Default line template
    pub const DEFAULT_TEMPLATE: &str = "{file}:{line}:{column}: {url} -> {result}";
    /// Status line hidden by `--hide-ok`
    pub const OK_STATUS: &str = "200 OK";
    /// Destinations that mean standard output
    pub const STDOUT_NAMES: [&str; 4] = ["", "-", "stdout", "/dev/stdout"];
    /// Destinations that mean standard error
    pub const STDERR_NAMES: [&str; 2] = ["stderr", "/dev/stderr"];
}

/// Configuration file constants
pub mod config_files {
    /// Name of the configuration file looked up in the working directory and its parents
    pub const FILE_NAME: &str = ".urlscan.toml";
    /// How many parent directories are searched
    pub const MAX_PARENT_DEPTH: usize = 3;
}
