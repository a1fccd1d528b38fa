//! Output formatting for checked links

use serde::Serialize;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::core::constants::output::{OK_STATUS, STDERR_NAMES, STDOUT_NAMES};
use crate::core::error::{Result, UrlScanError};
use crate::core::types::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    Line,
    Column,
    Url,
    Result,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "file" => Some(Self::File),
            "line" => Some(Self::Line),
            "column" => Some(Self::Column),
            "url" => Some(Self::Url),
            "result" => Some(Self::Result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed output line template such as `{file}:{line}: {url} -> {result}`.
///
/// Templates are parsed once at startup so an unknown placeholder is a
/// configuration error rather than a per-line failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    segments: Vec<Segment>,
}

impl OutputTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = raw;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                UrlScanError::Config(format!("Unclosed placeholder in output format '{raw}'"))
            })?;

            let name = &after[..close];
            let field = Field::from_name(name.trim()).ok_or_else(|| {
                UrlScanError::Config(format!(
                    "Unknown placeholder '{{{name}}}' in output format. Expected one of: {{file}}, {{line}}, {{column}}, {{url}}, {{result}}."
                ))
            })?;
            segments.push(Segment::Field(field));
            rest = &after[close + 1..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Render one line, without a trailing newline.
    pub fn render(&self, m: &Match) -> String {
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(Field::File) => line.push_str(m.source()),
                Segment::Field(Field::Line) => line.push_str(&m.line().to_string()),
                Segment::Field(Field::Column) => line.push_str(&m.column().to_string()),
                Segment::Field(Field::Url) => line.push_str(m.url()),
                Segment::Field(Field::Result) => {
                    line.push_str(m.result().map(|r| r.as_str()).unwrap_or_default())
                }
            }
        }
        line
    }
}

/// Where results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl Destination {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Stdout,
            Some(name) if STDOUT_NAMES.contains(&name) => Self::Stdout,
            Some(name) if STDERR_NAMES.contains(&name) => Self::Stderr,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }

    /// Open the destination, creating or truncating a file target.
    pub fn open(&self) -> Result<Box<dyn Write + Send>> {
        match self {
            Self::Stdout => Ok(Box::new(io::stdout())),
            Self::Stderr => Ok(Box::new(io::stderr())),
            Self::File(path) => {
                let file = File::create(path).map_err(|e| {
                    UrlScanError::Io(io::Error::new(
                        e.kind(),
                        format!("unable to create output file '{}': {e}", path.display()),
                    ))
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    file: &'a str,
    line: usize,
    column: usize,
    url: &'a str,
    result: Option<&'a str>,
}

impl<'a> From<&'a Match> for JsonRecord<'a> {
    fn from(m: &'a Match) -> Self {
        Self {
            file: m.source(),
            line: m.line(),
            column: m.column(),
            url: m.url(),
            result: m.result().map(|r| r.as_str()),
        }
    }
}

/// Totals gathered while writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    pub written: usize,
    pub hidden: usize,
    pub broken: usize,
}

/// Writes checked matches in arrival order.
pub struct ResultWriter<W: Write> {
    out: W,
    template: OutputTemplate,
    json: bool,
    hide_ok: bool,
    stats: OutputStats,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W, template: OutputTemplate) -> Self {
        Self {
            out,
            template,
            json: false,
            hide_ok: false,
            stats: OutputStats::default(),
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Skip results that are exactly `200 OK`.
    pub fn with_hide_ok(mut self, hide_ok: bool) -> Self {
        self.hide_ok = hide_ok;
        self
    }

    pub fn write(&mut self, m: &Match) -> Result<()> {
        let result = m.result();
        if !result.is_some_and(|r| r.is_success()) {
            self.stats.broken += 1;
        }

        if self.hide_ok && result.is_some_and(|r| r.as_str() == OK_STATUS) {
            self.stats.hidden += 1;
            return Ok(());
        }

        if self.json {
            let line = serde_json::to_string(&JsonRecord::from(m))
                .map_err(|e| UrlScanError::Io(io::Error::other(e)))?;
            writeln!(self.out, "{line}")?;
        } else {
            writeln!(self.out, "{}", self.template.render(m))?;
        }
        self.stats.written += 1;
        Ok(())
    }

    pub fn stats(&self) -> OutputStats {
        self.stats
    }

    /// Flush buffered output and return the totals.
    pub fn finish(mut self) -> Result<OutputStats> {
        self.out.flush()?;
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::core::constants::output::DEFAULT_TEMPLATE;
    use crate::core::types::CheckOutcome;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn checked(url: &str, code: u16, text: &str) -> Match {
        Match::new("README.md", 3, 7, url)
            .unwrap()
            .complete(CheckOutcome::Status {
                code,
                text: text.to_string(),
            })
    }

    #[test]
    fn test_output_template__default() -> TestResult {
        let template = OutputTemplate::parse(DEFAULT_TEMPLATE)?;

        assert_eq!(
            template.render(&checked("https://example.com", 200, "200 OK")),
            "README.md:3:7: https://example.com -> 200 OK"
        );
        Ok(())
    }

    #[test]
    fn test_output_template__custom_and_literals() -> TestResult {
        let template = OutputTemplate::parse("[{result}] {url} } trailing")?;

        assert_eq!(
            template.render(&checked("https://example.com/x", 404, "404 Not Found")),
            "[404 Not Found] https://example.com/x } trailing"
        );
        Ok(())
    }

    #[test]
    fn test_output_template__unchecked_result_is_empty() -> TestResult {
        let template = OutputTemplate::parse("{url}={result}")?;
        let unchecked = Match::new("stdin", 1, 0, "https://example.com")?;

        assert_eq!(template.render(&unchecked), "https://example.com=");
        Ok(())
    }

    #[test]
    fn test_output_template__unknown_placeholder() {
        let result = OutputTemplate::parse("{file} {status}");

        match result {
            Err(UrlScanError::Config(msg)) => assert!(msg.contains("{status}")),
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_output_template__unclosed_placeholder() {
        assert!(matches!(
            OutputTemplate::parse("{file"),
            Err(UrlScanError::Config(_))
        ));
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse(None), Destination::Stdout);
        for name in ["", "-", "stdout", "/dev/stdout"] {
            assert_eq!(Destination::parse(Some(name)), Destination::Stdout);
        }
        for name in ["stderr", "/dev/stderr"] {
            assert_eq!(Destination::parse(Some(name)), Destination::Stderr);
        }
        assert_eq!(
            Destination::parse(Some("out.txt")),
            Destination::File(PathBuf::from("out.txt"))
        );
    }

    #[test]
    fn test_destination_open__file_is_truncated() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "stale content\n")?;

        let mut out = Destination::File(path.clone()).open()?;
        writeln!(out, "fresh")?;
        out.flush()?;
        drop(out);

        assert_eq!(std::fs::read_to_string(&path)?, "fresh\n");
        Ok(())
    }

    #[test]
    fn test_destination_open__missing_directory() {
        let dest = Destination::File(PathBuf::from("/definitely/not/here/report.txt"));
        assert!(matches!(dest.open(), Err(UrlScanError::Io(_))));
    }

    #[test]
    fn test_result_writer__hide_ok() -> TestResult {
        let template = OutputTemplate::parse("{url} -> {result}")?;
        let mut writer = ResultWriter::new(Vec::new(), template).with_hide_ok(true);

        writer.write(&checked("https://ok.example.com", 200, "200 OK"))?;
        writer.write(&checked("https://gone.example.com", 404, "404 Not Found"))?;
        writer.write(&checked("https://new.example.com", 201, "201 Created"))?;

        let stats = writer.stats();
        assert_eq!(stats.written, 2);
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.broken, 1);
        assert_eq!(
            String::from_utf8(writer.out)?,
            "https://gone.example.com -> 404 Not Found\nhttps://new.example.com -> 201 Created\n"
        );
        Ok(())
    }

    #[test]
    fn test_result_writer__json() -> TestResult {
        let template = OutputTemplate::parse(DEFAULT_TEMPLATE)?;
        let mut writer = ResultWriter::new(Vec::new(), template).with_json(true);
        let failed = Match::new("docs/a.md", 2, 4, "https://x.invalid")?
            .complete(CheckOutcome::Error("dns error".to_string()));

        writer.write(&failed)?;

        let line = String::from_utf8(writer.out)?;
        let value: serde_json::Value = serde_json::from_str(line.trim_end())?;
        assert_eq!(value["file"], "docs/a.md");
        assert_eq!(value["line"], 2);
        assert_eq!(value["column"], 4);
        assert_eq!(value["url"], "https://x.invalid");
        assert_eq!(value["result"], "dns error");
        Ok(())
    }

    #[test]
    fn test_result_writer__finish_returns_stats() -> TestResult {
        let template = OutputTemplate::parse(DEFAULT_TEMPLATE)?;
        let mut writer = ResultWriter::new(Vec::new(), template);

        writer.write(&checked("https://example.com", 500, "500 Internal Server Error"))?;

        let stats = writer.finish()?;
        assert_eq!(stats.written, 1);
        assert_eq!(stats.broken, 1);
        Ok(())
    }
}
