use std::fmt;
use std::io::Write;

/// Tag prefixed to every line the alias setter writes to a build log.
pub const LOG_TAG: &str = "alias-setter";

/// Operator-facing, line-oriented build console.
///
/// Separate from `tracing`: lines written here end up in the build's own
/// output, next to whatever the build itself prints.
pub trait BuildLog {
	fn line(&mut self, line: &str);
}

impl BuildLog for Vec<String> {
	fn line(&mut self, line: &str) {
		self.push(line.to_owned());
	}
}

impl<L: BuildLog + ?Sized> BuildLog for &mut L {
	fn line(&mut self, line: &str) {
		(**self).line(line);
	}
}

/// [`BuildLog`] over any [`Write`] sink.
///
/// Write errors are reported through `tracing` and otherwise ignored.
#[derive(Debug)]
pub struct WriterLog<W> {
	inner: W,
}

impl<W: Write> WriterLog<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}

	pub fn into_inner(self) -> W {
		self.inner
	}
}

impl<W: Write> BuildLog for WriterLog<W> {
	fn line(&mut self, line: &str) {
		if let Err(error) = writeln!(self.inner, "{line}") {
			tracing::warn!(%error, "build log write failed");
		}
	}
}

/// Writes one tagged line.
pub(crate) fn tagged(log: &mut dyn BuildLog, message: fmt::Arguments<'_>) {
	log.line(&format!("{LOG_TAG}: {message}"));
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tagged_lines_carry_component_prefix() {
		let mut lines: Vec<String> = Vec::new();
		tagged(&mut lines, format_args!("no build aliases set"));
		assert_eq!(lines, vec!["alias-setter: no build aliases set".to_string()]);
	}

	#[test]
	fn writer_log_appends_newlines() {
		let mut log = WriterLog::new(Vec::new());
		log.line("one");
		log.line("two");
		assert_eq!(String::from_utf8(log.into_inner()).unwrap(), "one\ntwo\n");
	}
}
