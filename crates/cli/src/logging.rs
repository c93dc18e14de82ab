use engine::config::LoggingConfig;
use regex::Regex;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

struct RedactingWriter<W> {
    inner: W,
    patterns: Vec<(Regex, String)>,
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let mut redacted = s.to_string();
        for (re, replacement) in &self.patterns {
            redacted = re.replace_all(&redacted, replacement.as_str()).to_string();
        }
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter {
    patterns: Vec<(Regex, String)>,
}

impl<'a> fmt::MakeWriter<'a> for RedactingMakeWriter {
    // stderr so JSON on stdout stays parseable
    type Writer = RedactingWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: io::stderr(),
            patterns: self.patterns.clone(),
        }
    }
}

fn compile_patterns(config: &LoggingConfig) -> Vec<(Regex, String)> {
    let mut patterns = Vec::new();
    if !config.redaction.enabled {
        return patterns;
    }
    for p in &config.redaction.patterns {
        match Regex::new(&p.regex) {
            Ok(re) => patterns.push((re, p.placeholder.clone())),
            Err(e) => eprintln!("warning: skipping redaction pattern {}: {}", p.name, e),
        }
    }
    patterns
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.levels.directive()));

    let show_file = config.format.show_file;
    let show_line = config.format.show_line;
    let make_writer = RedactingMakeWriter {
        patterns: compile_patterns(config),
    };

    let fmt_layer = if !config.format.show_time {
        fmt::layer()
            .with_writer(make_writer)
            .with_target(show_file)
            .with_file(show_file)
            .with_line_number(show_line)
            .without_time()
            .boxed()
    } else {
        fmt::layer()
            .with_writer(make_writer)
            .with_target(show_file)
            .with_file(show_file)
            .with_line_number(show_line)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::config::RedactionPattern;
    use std::io::Write;

    fn config_with(pattern: &str) -> LoggingConfig {
        let mut config = LoggingConfig::default();
        config.redaction.patterns.push(RedactionPattern {
            name: "serial".into(),
            regex: pattern.into(),
            placeholder: "[REDACTED]".into(),
        });
        config
    }

    #[test]
    fn test_redacting_writer_replaces_matches() {
        let patterns = compile_patterns(&config_with(r"serial=\w+"));
        let mut w = RedactingWriter {
            inner: Vec::new(),
            patterns,
        };
        w.write_all(b"device BAT0 serial=ABC123 ok").unwrap();
        assert_eq!(String::from_utf8(w.inner).unwrap(), "device BAT0 [REDACTED] ok");
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        assert!(compile_patterns(&config_with("(")).is_empty());
    }

    #[test]
    fn test_redaction_disabled() {
        let mut config = config_with(r"\d+");
        config.redaction.enabled = false;
        assert!(compile_patterns(&config).is_empty());
    }
}
